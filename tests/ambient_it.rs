#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use bearer_interceptor::{
	ambient::{self, AmbientTransport},
	auth::Credential,
	config::InterceptorConfig,
	error::ConfigError,
	http::{HttpRequest, ReqwestTransport, Transport},
	http_types::{Request, StatusCode},
	interceptor::Interceptor,
	reqwest::Client,
	store::MemoryStore,
};

fn test_transport() -> color_eyre::Result<ReqwestTransport> {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()?;

	Ok(ReqwestTransport::with_client(client))
}

fn get(server: &MockServer) -> HttpRequest {
	Request::get(server.url("/api/models"))
		.body(Vec::new())
		.expect("GET request fixture should build.")
}

#[tokio::test]
async fn global_install_routes_sends_through_interceptor() -> color_eyre::Result<()> {
	let global = ambient::init(AmbientTransport::new(Arc::new(test_transport()?)))?;
	let again = ambient::init(AmbientTransport::new(Arc::new(test_transport()?)));

	assert!(matches!(again, Err(ConfigError::AmbientAlreadyInitialized)));
	assert!(std::ptr::eq(global, ambient::global()));

	let server = MockServer::start_async().await;
	let authorized = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/models").header("authorization", "Bearer global");
			then.status(200);
		})
		.await;
	let anonymous = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/models").header_missing("authorization");
			then.status(401);
		})
		.await;
	let store = Arc::new(MemoryStore::with_credential(Credential::new("global")));
	let config = InterceptorConfig::from_refresh_url(&server.url("/oauth/refresh"))?;
	let interceptor =
		<Interceptor<dyn Transport>>::new(ambient::global().original(), store, config)?;

	ambient::install(Arc::new(interceptor));

	let response = ambient::send(get(&server)).await?;

	assert_eq!(response.status(), StatusCode::OK);

	ambient::uninstall();

	let response = ambient::send(get(&server)).await?;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert!(!ambient::global().is_installed());

	authorized.assert_calls_async(1).await;
	anonymous.assert_calls_async(1).await;

	Ok(())
}
