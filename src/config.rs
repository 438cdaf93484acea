//! Validated interceptor configuration.

// crates.io
use http::{HeaderName, HeaderValue, Uri};
// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_LOGIN_PATH: &str = "/auth";
const DEFAULT_REDIRECT_PARAM: &str = "redirect";

/// Immutable configuration consumed by [`Interceptor`](crate::interceptor::Interceptor) and
/// [`HttpRefresher`](crate::refresh::HttpRefresher).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptorConfig {
	/// Absolute URL of the refresh endpoint. Requests to this endpoint never trigger a refresh.
	pub refresh_url: Url,
	/// Path of the login surface used to build [`LoginRedirect`] targets.
	///
	/// [`LoginRedirect`]: crate::interceptor::LoginRedirect
	#[serde(default = "InterceptorConfig::default_login_path")]
	pub login_path: String,
	/// Query parameter carrying the return location on the login surface.
	#[serde(default = "InterceptorConfig::default_redirect_param")]
	pub redirect_param: String,
	/// Adds `Content-Type: application/json` when a credential is injected into a request that
	/// has no content type.
	#[serde(default = "InterceptorConfig::default_json_content_type")]
	pub default_json_content_type: bool,
	/// Extra headers sent with every refresh call (e.g. a session `Cookie`).
	#[serde(default)]
	pub refresh_headers: Vec<(String, String)>,
}
impl InterceptorConfig {
	/// Creates a builder targeting `refresh_url`.
	pub fn builder(refresh_url: Url) -> InterceptorConfigBuilder {
		InterceptorConfigBuilder::new(refresh_url)
	}

	/// Parses `refresh_url` and returns a validated configuration with default settings.
	pub fn from_refresh_url(refresh_url: &str) -> Result<Self, ConfigError> {
		let url = Url::parse(refresh_url)
			.map_err(|source| ConfigError::InvalidRefreshUrl { source })?;

		Self::builder(url).build()
	}

	/// Returns `true` if `uri` targets the refresh endpoint itself.
	///
	/// The path must match exactly. Absolute URIs must also share the refresh URL's scheme, host,
	/// and port; origin-relative URIs are matched on the path alone.
	pub fn is_refresh_target(&self, uri: &Uri) -> bool {
		if uri.path() != self.refresh_url.path() {
			return false;
		}

		let Some(host) = uri.host() else {
			return true;
		};
		let scheme = uri.scheme_str().unwrap_or("http");
		let port = uri.port_u16().or(match scheme {
			"http" => Some(80),
			"https" => Some(443),
			_ => None,
		});

		scheme.eq_ignore_ascii_case(self.refresh_url.scheme())
			&& self.refresh_url.host_str().is_some_and(|refresh| refresh.eq_ignore_ascii_case(host))
			&& port == self.refresh_url.port_or_known_default()
	}

	/// Parses [`refresh_headers`](Self::refresh_headers) into typed header pairs.
	pub fn refresh_header_pairs(&self) -> Result<Vec<(HeaderName, HeaderValue)>, ConfigError> {
		self.refresh_headers
			.iter()
			.map(|(name, value)| {
				let header = HeaderName::try_from(name.as_str())
					.map_err(|_| ConfigError::InvalidHeaderName { name: name.clone() })?;
				let value = HeaderValue::try_from(value.as_str())
					.map_err(|_| ConfigError::InvalidHeaderValue { name: name.clone() })?;

				Ok((header, value))
			})
			.collect()
	}

	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		match self.refresh_url.scheme() {
			"http" | "https" => {},
			_ => return Err(ConfigError::UnsupportedScheme { url: self.refresh_url.to_string() }),
		}

		if !self.login_path.starts_with('/') {
			return Err(ConfigError::InvalidLoginPath { path: self.login_path.clone() });
		}
		if self.redirect_param.is_empty() {
			return Err(ConfigError::EmptyRedirectParam);
		}

		self.refresh_header_pairs()?;

		Ok(())
	}

	fn default_login_path() -> String {
		DEFAULT_LOGIN_PATH.into()
	}

	fn default_redirect_param() -> String {
		DEFAULT_REDIRECT_PARAM.into()
	}

	fn default_json_content_type() -> bool {
		true
	}
}

/// Builder for [`InterceptorConfig`] values.
#[derive(Debug)]
pub struct InterceptorConfigBuilder {
	config: InterceptorConfig,
}
impl InterceptorConfigBuilder {
	/// Creates a new builder with default login settings.
	pub fn new(refresh_url: Url) -> Self {
		Self {
			config: InterceptorConfig {
				refresh_url,
				login_path: InterceptorConfig::default_login_path(),
				redirect_param: InterceptorConfig::default_redirect_param(),
				default_json_content_type: InterceptorConfig::default_json_content_type(),
				refresh_headers: Vec::new(),
			},
		}
	}

	/// Overrides the login surface path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.config.login_path = path.into();

		self
	}

	/// Overrides the redirect query parameter name.
	pub fn redirect_param(mut self, param: impl Into<String>) -> Self {
		self.config.redirect_param = param.into();

		self
	}

	/// Toggles the default JSON content type on credentialed requests.
	pub fn default_json_content_type(mut self, enabled: bool) -> Self {
		self.config.default_json_content_type = enabled;

		self
	}

	/// Adds a header sent with every refresh call.
	pub fn refresh_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.config.refresh_headers.push((name.into(), value.into()));

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<InterceptorConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}
