//! Credential injection and one-shot retry around a [`Transport`].
//!
//! [`Interceptor::intercept`] attaches `Authorization: Bearer <token>` when the caller did not
//! set one, sends the request, and on `401` joins the shared refresh held by the
//! [`RefreshCoordinator`]. A successful refresh resends the request once with the new token and
//! returns that response whatever its status; a failed refresh clears the stored credential,
//! signals the [`UnauthenticatedHandler`], and returns the original `401`.

// crates.io
use http::{
	HeaderValue,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::InterceptorConfig,
	error::ConfigError,
	http::{HttpRequest, HttpResponse, Transport, clone_request, is_unauthorized, path_and_query},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	refresh::{HttpRefresher, RefreshCoordinator},
	store::CredentialStore,
};

/// Source of the caller's current navigable location (path + query).
pub type LocationSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Re-authentication hint handed to the [`UnauthenticatedHandler`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginRedirect {
	/// Location the user should return to after logging in.
	pub location: String,
	/// Login surface URL with the location encoded as the redirect parameter.
	pub target: String,
}
impl LoginRedirect {
	/// Builds the redirect for `location` using the configured login path and parameter.
	pub fn new(config: &InterceptorConfig, location: impl Into<String>) -> Self {
		let location = location.into();
		let query = form_urlencoded::Serializer::new(String::new())
			.append_pair(&config.redirect_param, &location)
			.finish();
		let separator = if config.login_path.contains('?') { '&' } else { '?' };
		let target = format!("{}{separator}{query}", config.login_path);

		Self { location, target }
	}
}

/// Host hook invoked when a rejected credential could not be refreshed.
///
/// The interceptor never navigates; it only reports where the user was so the host can send
/// them to a login surface and back.
pub trait UnauthenticatedHandler
where
	Self: 'static + Send + Sync,
{
	/// Called after the stored credential has been cleared.
	fn on_unauthenticated(&self, redirect: &LoginRedirect);
}
impl<F> UnauthenticatedHandler for F
where
	F: 'static + Send + Sync + Fn(&LoginRedirect),
{
	fn on_unauthenticated(&self, redirect: &LoginRedirect) {
		self(redirect)
	}
}

/// Wraps a [`Transport`] with bearer injection and single-flight refresh-and-retry.
pub struct Interceptor<T>
where
	T: ?Sized + Transport,
{
	/// Un-intercepted transport used for the original send, the retry, and the refresh call.
	pub transport: Arc<T>,
	/// Store the credential is read from and cleared in.
	pub store: Arc<dyn CredentialStore>,
	/// Refresh gate shared with every interceptor using the same store.
	pub coordinator: Arc<RefreshCoordinator>,
	/// Validated configuration.
	pub config: InterceptorConfig,
	unauthenticated: Option<Arc<dyn UnauthenticatedHandler>>,
	location: Option<LocationSource>,
}
impl<T> Interceptor<T>
where
	T: ?Sized + Transport,
{
	/// Creates an interceptor whose coordinator refreshes through an [`HttpRefresher`] on the
	/// same transport.
	pub fn new(
		transport: impl Into<Arc<T>>,
		store: Arc<dyn CredentialStore>,
		config: InterceptorConfig,
	) -> Result<Self, ConfigError> {
		let transport = transport.into();
		let refresher = <HttpRefresher<T>>::new(Arc::clone(&transport), &config)?;
		let coordinator = RefreshCoordinator::new(Arc::new(refresher), Arc::clone(&store));

		Ok(Self::with_coordinator(transport, store, Arc::new(coordinator), config))
	}

	/// Creates an interceptor that shares an existing coordinator.
	pub fn with_coordinator(
		transport: impl Into<Arc<T>>,
		store: Arc<dyn CredentialStore>,
		coordinator: Arc<RefreshCoordinator>,
		config: InterceptorConfig,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			coordinator,
			config,
			unauthenticated: None,
			location: None,
		}
	}

	/// Sets the hook invoked when re-authentication is required.
	pub fn with_unauthenticated_handler(mut self, handler: impl UnauthenticatedHandler) -> Self {
		self.unauthenticated = Some(Arc::new(handler));

		self
	}

	/// Sets where the current location comes from; falls back to the failing request's path
	/// and query when unset or when the source yields `None`.
	pub fn with_location_source(
		mut self,
		source: impl 'static + Send + Sync + Fn() -> Option<String>,
	) -> Self {
		self.location = Some(Arc::new(source));

		self
	}

	/// Sends `request` with the stored credential, refreshing and retrying once on `401`.
	///
	/// Transport failures of the original send and of the retry propagate. Refresh failures do
	/// not: they resolve to the original `401` response after the unauthenticated signal.
	pub async fn intercept(&self, request: HttpRequest) -> Result<HttpResponse> {
		const KIND: FlowKind = FlowKind::Intercept;

		let span = FlowSpan::new(KIND, "intercept");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_with_refresh(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Refreshes the credential now, joining any refresh already in flight.
	pub async fn manual_refresh(&self) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::ManualRefresh;

		let span = FlowSpan::new(KIND, "manual_refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.coordinator.refresh()).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result.map_err(Error::from)
	}

	async fn send_with_refresh(&self, mut request: HttpRequest) -> Result<HttpResponse> {
		self.authorize(&mut request).await?;

		let replay =
			(!self.config.is_refresh_target(request.uri())).then(|| clone_request(&request));
		let response = self.transport.send(request).await?;
		let Some(mut replay) = replay.filter(|_| is_unauthorized(response.status())) else {
			return Ok(response);
		};

		match self.coordinator.refresh().await {
			Ok(credential) => {
				replay.headers_mut().insert(AUTHORIZATION, credential.authorization_value()?);

				Ok(self.transport.send(replay).await?)
			},
			Err(_) => {
				self.signal_unauthenticated(&replay).await;

				Ok(response)
			},
		}
	}

	async fn authorize(&self, request: &mut HttpRequest) -> Result<()> {
		if request.headers().contains_key(AUTHORIZATION) {
			return Ok(());
		}

		let Some(credential) = self.store.get().await? else {
			return Ok(());
		};

		if credential.token.is_empty() {
			return Ok(());
		}

		let headers = request.headers_mut();

		headers.insert(AUTHORIZATION, credential.authorization_value()?);

		if self.config.default_json_content_type && !headers.contains_key(CONTENT_TYPE) {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		}

		Ok(())
	}

	async fn signal_unauthenticated(&self, request: &HttpRequest) {
		if let Err(e) = self.store.clear().await {
			obs::store_failed("clear", &e);
		}

		let location = self
			.location
			.as_ref()
			.and_then(|source| source())
			.unwrap_or_else(|| path_and_query(request));
		let redirect = LoginRedirect::new(&self.config, location);

		obs::unauthenticated(&redirect.location);

		if let Some(handler) = self.unauthenticated.as_ref() {
			handler.on_unauthenticated(&redirect);
		}
	}
}
impl<T> Debug for Interceptor<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Interceptor")
			.field("config", &self.config)
			.field("coordinator", &self.coordinator)
			.field("unauthenticated_handler_set", &self.unauthenticated.is_some())
			.field("location_source_set", &self.location.is_some())
			.finish()
	}
}
