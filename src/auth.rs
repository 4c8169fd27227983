//! Auth-domain identifiers, accounts, scope sets, and token models.

pub mod account;
pub mod id;
pub mod scope;
pub mod token;

pub use account::*;
pub use id::*;
pub use scope::*;
pub use token::{entity::*, expiry::*, secret::*};
