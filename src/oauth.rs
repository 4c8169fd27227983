//! Token endpoint collaborator: wire format, response parsing, and error classification.
//!
//! The acquisition flow only depends on [`TokenNetworkClient`]. [`HttpTokenNetwork`] is the
//! default implementation; it posts the encoded form through a [`TokenHttpClient`], parses
//! successful bodies into [`ServerTokenResponse`] via `serde_path_to_error`, and maps OAuth
//! error bodies onto [`Error`] variants.

pub mod form;

pub use oauth2;

// crates.io
use oauth2::{
	HttpRequest, HttpResponse,
	basic::BasicErrorResponse,
	http::{
		HeaderValue, Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use serde::{Deserializer, de::Error as _};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransientError, TransportError},
	http::{self, TokenHttpClient},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Boxed future returned by [`TokenNetworkClient::send_token_request`].
pub type NetworkFuture<'a> = Pin<Box<dyn Future<Output = Result<ServerTokenResponse>> + 'a + Send>>;

/// Default network collaborator for the crate's reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestTokenNetwork = HttpTokenNetwork<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Sends encoded grant bodies to a token endpoint.
pub trait TokenNetworkClient
where
	Self: Send + Sync,
{
	/// Posts `body` (already form-encoded) to `endpoint` and parses the token response.
	///
	/// `requested_at` is the acquiring client's clock reading for this request; relative
	/// deadlines such as an HTTP-date `Retry-After` resolve against it.
	fn send_token_request<'a>(
		&'a self,
		endpoint: &'a Url,
		body: String,
		requested_at: OffsetDateTime,
	) -> NetworkFuture<'a>;
}

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport into a crate error.
	fn map_transport_error(&self, error: E) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: ReqwestError) -> Error {
		if err.is_builder() {
			return ConfigError::from(err).into();
		}
		if err.is_timeout() {
			return TransientError::TokenEndpoint {
				message: "Request timed out while calling the token endpoint".into(),
				status: err.status().map(|code| code.as_u16()),
				retry_after: None,
			}
			.into();
		}

		TransportError::from(err).into()
	}
}

/// Successful token endpoint response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ServerTokenResponse {
	/// Issued access token.
	pub access_token: TokenSecret,
	/// Token type; `Bearer` when omitted.
	#[serde(default = "default_token_type")]
	pub token_type: String,
	/// Lifetime in seconds; numbers and numeric strings are both accepted.
	#[serde(default, deserialize_with = "lenient_seconds")]
	pub expires_in: Option<i64>,
	/// Extended lifetime in seconds.
	#[serde(default, deserialize_with = "lenient_seconds")]
	pub ext_expires_in: Option<i64>,
	/// Granted scopes, space-delimited.
	#[serde(default)]
	pub scope: Option<String>,
}
impl ServerTokenResponse {
	/// Creates a bearer response with the given lifetime.
	pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			token_type: default_token_type(),
			expires_in: Some(expires_in),
			ext_expires_in: None,
			scope: None,
		}
	}

	/// Sets the granted scope string.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the extended lifetime.
	pub fn with_ext_expires_in(mut self, ext_expires_in: i64) -> Self {
		self.ext_expires_in = Some(ext_expires_in);

		self
	}

	/// Overrides the token type.
	pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = token_type.into();

		self
	}

	/// Validated `(expires_in, ext_expires_in)` pair in seconds.
	///
	/// A missing or non-positive `expires_in` is a [`ConfigError`]; a non-positive
	/// `ext_expires_in` is ignored.
	pub fn lifetimes(&self) -> Result<(u64, Option<u64>)> {
		let expires_in = self.expires_in.ok_or(ConfigError::MissingExpiresIn)?;
		let expires_in = u64::try_from(expires_in)
			.ok()
			.filter(|secs| *secs > 0)
			.ok_or(ConfigError::NonPositiveExpiresIn)?;
		let ext_expires_in =
			self.ext_expires_in.and_then(|secs| u64::try_from(secs).ok()).filter(|secs| *secs > 0);

		Ok((expires_in, ext_expires_in))
	}
}

/// [`TokenNetworkClient`] backed by a [`TokenHttpClient`] transport.
pub struct HttpTokenNetwork<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> HttpTokenNetwork<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Pairs a transport with the mapper that classifies its failures.
	pub fn new(http_client: impl Into<Arc<C>>, error_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), error_mapper: error_mapper.into() }
	}

	fn build_request(endpoint: &Url, body: String) -> Result<HttpRequest> {
		Request::builder()
			.method(Method::POST)
			.uri(endpoint.as_str())
			.header(CONTENT_TYPE, HeaderValue::from_static(form::FORM_CONTENT_TYPE))
			.header(ACCEPT, HeaderValue::from_static("application/json"))
			.body(body.into_bytes())
			.map_err(|e| ConfigError::from(e).into())
	}
}
#[cfg(feature = "reqwest")]
impl Default for HttpTokenNetwork<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	fn default() -> Self {
		Self::new(ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> TokenNetworkClient for HttpTokenNetwork<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn send_token_request<'a>(
		&'a self,
		endpoint: &'a Url,
		body: String,
		requested_at: OffsetDateTime,
	) -> NetworkFuture<'a> {
		Box::pin(async move {
			let request = Self::build_request(endpoint, body)?;
			let response = self
				.http_client
				.execute(request)
				.await
				.map_err(|e| self.error_mapper.map_transport_error(e))?;

			map_token_response(response, requested_at)
		})
	}
}
impl<C, M> Debug for HttpTokenNetwork<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("HttpTokenNetwork(..)")
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ServerErrorKind {
	InvalidGrant,
	InvalidClient,
	InsufficientScope,
	Transient,
}

/// Interprets a raw token endpoint response.
///
/// 2xx bodies become [`ServerTokenResponse`]; anything else is classified from the OAuth
/// `error` code, the description, the body, and finally the HTTP status.
pub fn map_token_response(response: HttpResponse, now: OffsetDateTime) -> Result<ServerTokenResponse> {
	let status = response.status();

	if status.is_success() {
		let mut de = serde_json::Deserializer::from_slice(response.body());

		return serde_path_to_error::deserialize(&mut de).map_err(|source| {
			TransientError::TokenResponseParse { source, status: Some(status.as_u16()) }.into()
		});
	}

	let retry_after = http::parse_retry_after(response.headers(), now);
	let body = String::from_utf8_lossy(response.body());
	let parsed = serde_json::from_slice::<BasicErrorResponse>(response.body()).ok();
	let oauth_error = parsed.as_ref().map(|r| r.error().as_ref().to_owned());
	let description = parsed.as_ref().and_then(|r| r.error_description().cloned());
	let kind = classify_oauth_error(oauth_error.as_deref(), description.as_deref())
		.or_else(|| classify_body(Some(body.as_ref())))
		.unwrap_or_else(|| classify_status(status.as_u16()));
	let message = match (&description, &oauth_error) {
		(Some(description), _) => format!("Token endpoint returned an OAuth error: {description}"),
		(None, Some(code)) => format!("Token endpoint returned an OAuth error: {code}"),
		(None, None) => format!("Token endpoint returned HTTP {}", status.as_u16()),
	};

	Err(match kind {
		ServerErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ServerErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ServerErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ServerErrorKind::Transient =>
			TransientError::TokenEndpoint { message, status: Some(status.as_u16()), retry_after }
				.into(),
	})
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<ServerErrorKind> {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
		.or_else(|| classify_body(error_description))
}

fn match_exact_value(value: &str) -> Option<ServerErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(ServerErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ServerErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(ServerErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(ServerErrorKind::Transient)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<ServerErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") => Some(ServerErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(ServerErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(ServerErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") => Some(ServerErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: u16) -> ServerErrorKind {
	match status {
		400 | 404 | 410 => ServerErrorKind::InvalidGrant,
		401 => ServerErrorKind::InvalidClient,
		403 => ServerErrorKind::InsufficientScope,
		_ => ServerErrorKind::Transient,
	}
}

fn default_token_type() -> String {
	crate::auth::AccessTokenEntity::DEFAULT_TOKEN_TYPE.into()
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Seconds {
		Integer(i64),
		Text(String),
	}

	match Option::<Seconds>::deserialize(deserializer)? {
		None => Ok(None),
		Some(Seconds::Integer(secs)) => Ok(Some(secs)),
		Some(Seconds::Text(raw)) => raw
			.trim()
			.parse()
			.map(Some)
			.map_err(|_| D::Error::custom(format!("expected seconds, found {raw:?}"))),
	}
}
