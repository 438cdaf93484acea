//! [`Refresher`] that calls a JSON refresh endpoint over a [`Transport`].

// crates.io
use http::{
	HeaderName, HeaderValue, Method, Request,
	header::{ACCEPT, CONTENT_TYPE},
};
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::InterceptorConfig,
	error::{ConfigError, RefreshError},
	http::{HttpRequest, HttpResponse, Transport},
	refresh::{RefreshFuture, RefreshOutcome, Refresher},
};

/// Body returned by the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
	#[serde(default)]
	success: bool,
	#[serde(default)]
	token: Option<String>,
	#[serde(default)]
	expires_at: Option<ExpiresAt>,
}

/// Expiry as either Unix seconds or an RFC 3339 timestamp.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresAt {
	Unix(i64),
	Rfc3339(String),
}
impl ExpiresAt {
	fn resolve(self) -> Result<OffsetDateTime, RefreshError> {
		match self {
			Self::Unix(secs) => OffsetDateTime::from_unix_timestamp(secs).map_err(|e| {
				RefreshError::Malformed { path: "expires_at".into(), message: e.to_string() }
			}),
			Self::Rfc3339(raw) => OffsetDateTime::parse(&raw, &Rfc3339).map_err(|e| {
				RefreshError::Malformed { path: "expires_at".into(), message: e.to_string() }
			}),
		}
	}
}

/// Posts to the configured refresh endpoint and parses `{success, token, expires_at?}`.
///
/// The call goes straight to the wrapped transport, never through an interceptor, so a `401`
/// from the refresh endpoint is a plain refresh failure.
pub struct HttpRefresher<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	url: Url,
	headers: Vec<(HeaderName, HeaderValue)>,
}
impl<T> HttpRefresher<T>
where
	T: ?Sized + Transport,
{
	/// Creates a refresher for `config.refresh_url` with `config.refresh_headers` attached.
	pub fn new(
		transport: impl Into<Arc<T>>,
		config: &InterceptorConfig,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			transport: transport.into(),
			url: config.refresh_url.clone(),
			headers: config.refresh_header_pairs()?,
		})
	}

	fn build_request(&self) -> Result<HttpRequest, RefreshError> {
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(self.url.as_str())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json");

		for (name, value) in &self.headers {
			builder = builder.header(name, value);
		}

		builder.body(Vec::new()).map_err(|e| RefreshError::Request { message: e.to_string() })
	}

	async fn call(&self) -> RefreshOutcome {
		let request = self.build_request()?;
		let response = self.transport.send(request).await?;

		parse_response(&response)
	}
}
impl<T> Refresher for HttpRefresher<T>
where
	T: ?Sized + Transport,
{
	fn refresh(&self) -> RefreshFuture<'_> {
		Box::pin(self.call())
	}
}
impl<T> Debug for HttpRefresher<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpRefresher")
			.field("url", &self.url.as_str())
			.field("extra_headers", &self.headers.len())
			.finish()
	}
}

fn parse_response(response: &HttpResponse) -> RefreshOutcome {
	let status = response.status();

	if !status.is_success() {
		return Err(RefreshError::Status { status: status.as_u16() });
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let body: RefreshResponse = serde_path_to_error::deserialize(&mut deserializer).map_err(
		|e| RefreshError::Malformed { path: e.path().to_string(), message: e.inner().to_string() },
	)?;

	if !body.success {
		return Err(RefreshError::Rejected { reason: "endpoint reported success=false".into() });
	}

	let token = body
		.token
		.filter(|token| !token.is_empty())
		.ok_or_else(|| RefreshError::Rejected { reason: "response omitted the token".into() })?;
	let mut credential = Credential::new(token);

	if credential.authorization_value().is_err() {
		return Err(RefreshError::Malformed {
			path: "token".into(),
			message: "token is not a valid header value".into(),
		});
	}
	if let Some(expires_at) = body.expires_at {
		credential = credential.with_expires_at(expires_at.resolve()?);
	}

	Ok(credential)
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::{Response, StatusCode};
	use time::macros::datetime;
	// self
	use super::*;
	use crate::{error::TransportError, http::TransportFuture};

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = Response::new(body.as_bytes().to_vec());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Status fixture should be valid.");

		response
	}

	struct RecordingTransport {
		seen: Mutex<Vec<HttpRequest>>,
		reply: fn() -> Result<HttpResponse, TransportError>,
	}
	impl Transport for RecordingTransport {
		fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
			self.seen.lock().push(request);

			let reply = (self.reply)();

			Box::pin(async move { reply })
		}
	}

	#[test]
	fn parses_token_and_unix_expiry() {
		let credential = parse_response(&response(
			200,
			r#"{"success":true,"token":"xyz","expires_at":1749556800}"#,
		))
		.expect("Well-formed refresh responses should parse.");

		assert_eq!(credential.token.expose(), "xyz");
		assert_eq!(credential.expires_at, Some(datetime!(2025-06-10 12:00 UTC)));
	}

	#[test]
	fn parses_rfc3339_expiry_and_missing_expiry() {
		let credential = parse_response(&response(
			200,
			r#"{"success":true,"token":"xyz","expires_at":"2025-06-10T12:00:00Z"}"#,
		))
		.expect("RFC 3339 expiries should parse.");

		assert_eq!(credential.expires_at, Some(datetime!(2025-06-10 12:00 UTC)));

		let credential =
			parse_response(&response(200, r#"{"success":true,"token":"xyz","expires_at":null}"#))
				.expect("Null expiries should be accepted.");

		assert_eq!(credential.expires_at, None);
	}

	#[test]
	fn classifies_failures() {
		assert!(matches!(
			parse_response(&response(500, "oops")),
			Err(RefreshError::Status { status: 500 })
		));
		assert!(matches!(
			parse_response(&response(200, r#"{"success":false,"token":"xyz"}"#)),
			Err(RefreshError::Rejected { .. })
		));
		assert!(matches!(
			parse_response(&response(200, r#"{"success":true}"#)),
			Err(RefreshError::Rejected { .. })
		));
		assert!(matches!(
			parse_response(&response(200, r#"{"success":true,"token":""}"#)),
			Err(RefreshError::Rejected { .. })
		));
		assert!(matches!(
			parse_response(&response(200, "<html>")),
			Err(RefreshError::Malformed { .. })
		));

		match parse_response(&response(200, r#"{"success":"yes","token":"xyz"}"#)) {
			Err(RefreshError::Malformed { path, .. }) => assert_eq!(path, "success"),
			other => panic!("Type mismatches should report their JSON path, got {other:?}."),
		}
	}

	#[test]
	fn rejects_tokens_unusable_as_headers() {
		assert!(matches!(
			parse_response(&response(200, "{\"success\":true,\"token\":\"a\\nb\"}")),
			Err(RefreshError::Malformed { .. })
		));
	}

	#[tokio::test]
	async fn posts_json_with_configured_headers() {
		let transport = Arc::new(RecordingTransport {
			seen: Mutex::new(Vec::new()),
			reply: || Ok(response(200, r#"{"success":true,"token":"fresh"}"#)),
		});
		let config = InterceptorConfig::builder(
			Url::parse("https://chat.example.com/oauth/refresh")
				.expect("Refresh URL fixture should parse."),
		)
		.refresh_header("cookie", "oauth_session=abc")
		.build()
		.expect("Config fixture should validate.");
		let refresher = <HttpRefresher<RecordingTransport>>::new(transport.clone(), &config)
			.expect("Refresher should accept validated config.");
		let credential = refresher.refresh().await.expect("Refresh should succeed.");

		assert_eq!(credential.token.expose(), "fresh");

		let seen = transport.seen.lock();
		let request = &seen[0];

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.uri(), "https://chat.example.com/oauth/refresh");
		assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
		assert_eq!(request.headers()[http::header::COOKIE], "oauth_session=abc");
		assert!(request.body().is_empty());
	}

	#[tokio::test]
	async fn transport_failures_become_refresh_errors() {
		let transport = Arc::new(RecordingTransport {
			seen: Mutex::new(Vec::new()),
			reply: || Err(TransportError::Io(std::io::Error::other("connection reset"))),
		});
		let config = InterceptorConfig::from_refresh_url("http://localhost/oauth/refresh")
			.expect("Config fixture should validate.");
		let refresher = <HttpRefresher<RecordingTransport>>::new(transport, &config)
			.expect("Refresher should accept validated config.");
		let err = refresher.refresh().await.expect_err("Transport errors should fail the refresh.");

		assert!(matches!(err, RefreshError::Transport(_)));
	}
}
