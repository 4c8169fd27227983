// crates.io
use httpmock::prelude::*;
// self
use oauth2_app_cache::{
	_preludet::*,
	authority::Authority,
	cache::{CacheStore, MemoryStore},
	error::{TransientError, TransportError},
	flows::{ClientCredentialClient, ClientCredentialRequest},
	http::{HttpFuture, TokenHttpClient},
	oauth::{
		HttpTokenNetwork, TransportErrorMapper,
		form::FORM_CONTENT_TYPE,
		oauth2::{HttpRequest, HttpResponse},
	},
};

fn token_endpoint(server: &MockServer) -> Url {
	Url::parse(&server.url("/token")).expect("Mock token endpoint should parse successfully.")
}

#[tokio::test]
async fn reqwest_transport_fetches_then_serves_from_cache() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(token_endpoint(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", FORM_CONTENT_TYPE)
				.body_includes("grant_type=client_credentials")
				.body_includes(format!("client_id={TEST_CLIENT_ID}"))
				.body_includes(format!("client_secret={TEST_CLIENT_SECRET}"))
				.body_includes("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"an_access_token\",\"token_type\":\"Bearer\",\"expires_in\":3599,\"ext_expires_in\":3599}",
			);
		})
		.await;
	let request = ClientCredentialRequest::new([GRAPH_DEFAULT_SCOPE]);
	let first = client
		.acquire_token(request.clone())
		.await
		.expect("Initial client_credentials request should succeed.");
	let second = client
		.acquire_token(request)
		.await
		.expect("Cached client_credentials request should succeed.");

	assert!(!first.from_cache);
	assert!(second.from_cache);
	assert_eq!(first.access_token.expose(), "an_access_token");
	assert_eq!(second.access_token.expose(), "an_access_token");
	assert_eq!(store.len(), 1);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn reqwest_transport_maps_invalid_client() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(token_endpoint(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401).header("content-type", "application/json").body(
				"{\"error\":\"invalid_client\",\"error_description\":\"AADSTS7000215: Invalid client secret provided.\"}",
			);
		})
		.await;
	let err = client
		.acquire_token(ClientCredentialRequest::new([GRAPH_DEFAULT_SCOPE]))
		.await
		.expect_err("Invalid client errors should surface to the caller.");

	assert!(matches!(err, Error::InvalidClient { ref reason } if reason.contains("AADSTS7000215")));
	assert!(store.is_empty());

	mock.assert_async().await;
}

#[tokio::test]
async fn reqwest_transport_maps_throttling_to_transient() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_reqwest_test_client(token_endpoint(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(429)
				.header("content-type", "application/json")
				.header("retry-after", "30")
				.body("{\"error\":\"temporarily_unavailable\"}");
		})
		.await;
	let err = client
		.acquire_token(ClientCredentialRequest::new([GRAPH_DEFAULT_SCOPE]))
		.await
		.expect_err("Throttled responses should fail.");

	match err {
		Error::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(Duration::seconds(30)));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	mock.assert_async().await;
}

#[tokio::test]
async fn reqwest_transport_reports_malformed_success_bodies() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(token_endpoint(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"Bearer\",\"expires_in\":3600}");
		})
		.await;
	let err = client
		.acquire_token(ClientCredentialRequest::new([GRAPH_DEFAULT_SCOPE]))
		.await
		.expect_err("A body without access_token must fail.");

	assert!(matches!(err, Error::Transient(TransientError::TokenResponseParse { .. })));
	assert!(store.is_empty());

	mock.assert_async().await;
}

#[derive(Debug)]
struct ConnectionRefused;
impl Display for ConnectionRefused {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Connection refused.")
	}
}
impl StdError for ConnectionRefused {}

struct RefusingHttpClient;
impl TokenHttpClient for RefusingHttpClient {
	type TransportError = ConnectionRefused;

	fn execute(&self, _request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		Box::pin(async { Err::<HttpResponse, _>(ConnectionRefused) })
	}
}

#[derive(Clone, Default)]
struct RecordingMapper {
	seen: Arc<Mutex<Vec<String>>>,
}
impl TransportErrorMapper<ConnectionRefused> for RecordingMapper {
	fn map_transport_error(&self, error: ConnectionRefused) -> Error {
		self.seen.lock().push(error.to_string());

		TransportError::network(error).into()
	}
}

#[tokio::test]
async fn custom_transport_errors_flow_through_the_mapper() {
	let mapper = RecordingMapper::default();
	let network =
		HttpTokenNetwork::<RefusingHttpClient, RecordingMapper>::new(RefusingHttpClient, mapper.clone());
	let store = MemoryStore::default();
	let authority = Authority::builder(test_tenant_id())
		.environment(TEST_ENVIRONMENT)
		.build()
		.expect("Authority fixture should build.");
	let shared: Arc<dyn CacheStore> = Arc::new(store.clone());
	let client = ClientCredentialClient::with_network(
		test_client_id(),
		authority,
		shared,
		Arc::new(network),
	)
	.with_client_secret(TEST_CLIENT_SECRET);
	let err = client
		.acquire_token(ClientCredentialRequest::new([GRAPH_DEFAULT_SCOPE]))
		.await
		.expect_err("Refused connections should fail.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(err.code(), "network_error");
	assert_eq!(mapper.seen.lock().as_slice(), ["Connection refused."]);
	assert!(store.is_empty());
}
