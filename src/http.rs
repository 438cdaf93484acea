//! Request/response model and the transport seam the interceptor wraps.
//!
//! Requests and responses are plain `http` crate types with buffered bodies, so any client that
//! can translate to and from them can sit behind [`Transport`]. The crate ships a reqwest
//! implementation behind the `reqwest` feature.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use http::{HeaderMap, Request, Response, StatusCode};
// self
use crate::{_prelude::*, error::TransportError};

/// Outbound request with a buffered body.
pub type HttpRequest = Request<Vec<u8>>;
/// Inbound response with a buffered body.
pub type HttpResponse = Response<Vec<u8>>;
/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP clients capable of sending a single request.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back both the
/// interceptor and the refresh call, and must not retry or follow authentication challenges
/// on their own: a `401` has to reach the caller untouched.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves once the full response body is buffered.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}
impl<T> Transport for Arc<T>
where
	T: ?Sized + Transport,
{
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		(**self).send(request)
	}
}

/// Copies method, URI, version, headers, and body of `request`.
///
/// Extensions are not carried over because they are not required to be cloneable.
pub fn clone_request(request: &HttpRequest) -> HttpRequest {
	let mut copy = Request::new(request.body().clone());

	*copy.method_mut() = request.method().clone();
	*copy.uri_mut() = request.uri().clone();
	*copy.version_mut() = request.version();
	*copy.headers_mut() = request.headers().clone();

	copy
}

/// Returns the path plus query of `request`, e.g. `/chats?page=2`.
pub fn path_and_query(request: &HttpRequest) -> String {
	request.uri().path_and_query().map(|pq| pq.as_str().to_owned()).unwrap_or_else(|| "/".into())
}

/// Returns `true` when `status` signals a rejected credential.
pub fn is_unauthorized(status: StatusCode) -> bool {
	status == StatusCode::UNAUTHORIZED
}

/// Reqwest-backed [`Transport`].
///
/// Redirect handling and cookies follow the wrapped [`ReqwestClient`]'s configuration; use
/// [`ReqwestTransport::with_cookie_store`] when the refresh endpoint authenticates through a
/// session cookie.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that keeps cookies between requests, so session cookies set by the
	/// server are sent along with the refresh call.
	pub fn with_cookie_store() -> Result<Self, crate::error::ConfigError> {
		Ok(Self(ReqwestClient::builder().cookie_store(true).build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let response = client.execute(request).await?;
			let status = response.status();
			let version = response.version();
			let headers: HeaderMap = response.headers().to_owned();
			let mut response_new = Response::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.version_mut() = version;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
