//! Process-level install surface for the interceptor.
//!
//! Code that sends requests through [`AmbientTransport::send`] (or the free [`send`] function
//! backed by [`global`]) does not need to know whether an interceptor is active. Call [`init`]
//! once at startup to choose the original transport, e.g. a cookie-keeping
//! [`ReqwestTransport::with_cookie_store`] so session cookies reach the refresh endpoint. [`install`]
//! routes those sends through an [`Interceptor`]; [`uninstall`] restores the original transport.
//! Both are idempotent and never stack interceptors: the interceptor itself must wrap
//! [`AmbientTransport::original`], not the ambient transport, so the refresh call and the retry
//! bypass interception.

// std
#[cfg(feature = "reqwest")] use std::sync::OnceLock;
// self
use crate::{
	_prelude::*,
	http::{HttpRequest, HttpResponse, Transport},
	interceptor::Interceptor,
	obs,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

/// Boxed future returned by [`Dispatch::dispatch`].
pub type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + 'a + Send>>;

/// Object-safe view of an installed interceptor.
pub trait Dispatch
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` through the interceptor.
	fn dispatch(&self, request: HttpRequest) -> DispatchFuture<'_>;
}
impl<T> Dispatch for Interceptor<T>
where
	T: ?Sized + Transport,
{
	fn dispatch(&self, request: HttpRequest) -> DispatchFuture<'_> {
		Box::pin(self.intercept(request))
	}
}

/// Swappable transport: either the original transport or an installed interceptor.
pub struct AmbientTransport {
	original: Arc<dyn Transport>,
	installed: RwLock<Option<Arc<dyn Dispatch>>>,
}
impl AmbientTransport {
	/// Creates an ambient transport that sends through `original` until an interceptor is
	/// installed.
	pub fn new(original: Arc<dyn Transport>) -> Self {
		Self { original, installed: RwLock::new(None) }
	}

	/// Returns the un-intercepted transport interceptors should wrap.
	pub fn original(&self) -> Arc<dyn Transport> {
		Arc::clone(&self.original)
	}

	/// Routes ambient sends through `interceptor`, replacing any previously installed one.
	pub fn install(&self, interceptor: Arc<dyn Dispatch>) {
		let mut installed = self.installed.write();

		if installed.as_ref().is_some_and(|current| Arc::ptr_eq(current, &interceptor)) {
			return;
		}

		*installed = Some(interceptor);

		obs::interceptor_toggled(true);
	}

	/// Restores the original transport. Does nothing when no interceptor is installed.
	pub fn uninstall(&self) {
		if self.installed.write().take().is_some() {
			obs::interceptor_toggled(false);
		}
	}

	/// Returns `true` while an interceptor is installed.
	pub fn is_installed(&self) -> bool {
		self.installed.read().is_some()
	}

	/// Sends `request` through the installed interceptor, or the original transport.
	pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		let installed = self.installed.read().clone();

		match installed {
			Some(interceptor) => interceptor.dispatch(request).await,
			None => Ok(self.original.send(request).await?),
		}
	}
}
impl Debug for AmbientTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AmbientTransport").field("installed", &self.is_installed()).finish()
	}
}

#[cfg(feature = "reqwest")]
static GLOBAL: OnceLock<AmbientTransport> = OnceLock::new();

/// Sets the process-wide ambient transport.
///
/// Fails once the global transport exists, whether from an earlier `init` or from a call that
/// fell back to the default.
#[cfg(feature = "reqwest")]
pub fn init(ambient: AmbientTransport) -> Result<&'static AmbientTransport, ConfigError> {
	GLOBAL.set(ambient).map_err(|_| ConfigError::AmbientAlreadyInitialized)?;

	Ok(global())
}

/// Returns the process-wide ambient transport, falling back to a default [`ReqwestTransport`]
/// when [`init`] was never called.
#[cfg(feature = "reqwest")]
pub fn global() -> &'static AmbientTransport {
	GLOBAL.get_or_init(|| AmbientTransport::new(Arc::new(ReqwestTransport::default())))
}

/// Installs `interceptor` on the process-wide ambient transport.
#[cfg(feature = "reqwest")]
pub fn install(interceptor: Arc<dyn Dispatch>) {
	global().install(interceptor)
}

/// Restores the process-wide ambient transport to its original transport.
#[cfg(feature = "reqwest")]
pub fn uninstall() {
	global().uninstall()
}

/// Sends `request` through the process-wide ambient transport.
#[cfg(feature = "reqwest")]
pub async fn send(request: HttpRequest) -> Result<HttpResponse> {
	global().send(request).await
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::{Request, Response, StatusCode, header::AUTHORIZATION};
	// self
	use super::*;
	use crate::{
		auth::Credential, config::InterceptorConfig, http::TransportFuture, store::MemoryStore,
	};

	#[derive(Default)]
	struct Recorder(Mutex<Vec<Option<String>>>);
	impl Transport for Recorder {
		fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
			self.0.lock().push(
				request
					.headers()
					.get(AUTHORIZATION)
					.and_then(|value| value.to_str().ok())
					.map(str::to_owned),
			);

			Box::pin(async {
				let mut response = Response::new(Vec::new());

				*response.status_mut() = StatusCode::NO_CONTENT;

				Ok(response)
			})
		}
	}

	fn request() -> HttpRequest {
		Request::get("https://chat.example.com/api/chats")
			.body(Vec::new())
			.expect("Request fixture should build.")
	}

	fn interceptor(ambient: &AmbientTransport) -> Arc<dyn Dispatch> {
		let store = Arc::new(MemoryStore::with_credential(Credential::new("abc")));
		let config = InterceptorConfig::from_refresh_url("https://chat.example.com/oauth/refresh")
			.expect("Config fixture should validate.");
		let interceptor = <Interceptor<dyn Transport>>::new(ambient.original(), store, config)
			.expect("Interceptor fixture should build.");

		Arc::new(interceptor)
	}

	#[tokio::test]
	async fn install_and_uninstall_toggle_interception() {
		let recorder = Arc::new(Recorder::default());
		let ambient = AmbientTransport::new(recorder.clone());

		ambient.send(request()).await.expect("Original transport should send.");

		let interceptor = interceptor(&ambient);

		ambient.install(interceptor.clone());
		ambient.install(interceptor);
		assert!(ambient.is_installed());
		ambient.send(request()).await.expect("Interceptor should send.");

		ambient.uninstall();
		ambient.uninstall();
		assert!(!ambient.is_installed());
		ambient.send(request()).await.expect("Original transport should send again.");

		assert_eq!(*recorder.0.lock(), vec![None, Some("Bearer abc".to_owned()), None]);
	}

	#[tokio::test]
	async fn reinstall_replaces_instead_of_stacking() {
		let recorder = Arc::new(Recorder::default());
		let ambient = AmbientTransport::new(recorder.clone());

		ambient.install(interceptor(&ambient));
		ambient.install(interceptor(&ambient));
		ambient.send(request()).await.expect("Interceptor should send.");

		assert_eq!(*recorder.0.lock(), vec![Some("Bearer abc".to_owned())]);
	}
}
