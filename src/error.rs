//! Interceptor-level error types shared across the transport, refresh, and store layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) while sending a request.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The shared refresh operation failed.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Refresh endpoint URL cannot be parsed.
	#[error("Refresh URL is invalid.")]
	InvalidRefreshUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Refresh endpoint must be reachable over HTTP(S).
	#[error("The refresh endpoint must use http or https: {url}.")]
	UnsupportedScheme {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Login path must be an absolute path.
	#[error("Login path must start with `/`: {path:?}.")]
	InvalidLoginPath {
		/// Path that failed validation.
		path: String,
	},
	/// Redirect query parameter name must not be empty.
	#[error("Redirect parameter name must not be empty.")]
	EmptyRedirectParam,
	/// The process-wide ambient transport was already set or already in use.
	#[error("The process-wide ambient transport is already initialized.")]
	AmbientAlreadyInitialized,
	/// Header name supplied in configuration is invalid.
	#[error("Header name `{name}` is invalid.")]
	InvalidHeaderName {
		/// Offending header name.
		name: String,
	},
	/// Header value (configured or derived from a credential) is invalid.
	#[error("Header value for `{name}` is invalid.")]
	InvalidHeaderValue {
		/// Header whose value failed validation.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failure of the shared refresh operation.
///
/// Every caller joined to the same refresh observes a clone of the same value, so the variants
/// keep their payloads cheaply cloneable.
#[derive(Clone, Debug, ThisError)]
pub enum RefreshError {
	/// The refresh request could not be constructed.
	#[error("Refresh request could not be built: {message}.")]
	Request {
		/// Builder failure message.
		message: String,
	},
	/// The refresh request never produced a response.
	#[error("Refresh request failed to reach the endpoint.")]
	Transport(#[source] Arc<TransportError>),
	/// The refresh endpoint answered with a non-success status.
	#[error("Refresh failed with status {status}.")]
	Status {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
	},
	/// The refresh response body could not be parsed.
	#[error("Refresh response is malformed at `{path}`: {message}.")]
	Malformed {
		/// JSON path where parsing failed (`.` for the document root).
		path: String,
		/// Parser message.
		message: String,
	},
	/// The refresh endpoint reported failure or omitted the token.
	#[error("Refresh endpoint rejected the request: {reason}.")]
	Rejected {
		/// Short description of what was missing or refused.
		reason: String,
	},
	/// The refreshed credential could not be persisted.
	#[error("Refreshed credential could not be stored: {0}.")]
	Storage(#[source] crate::store::StoreError),
}
impl From<TransportError> for RefreshError {
	fn from(e: TransportError) -> Self {
		Self::Transport(Arc::new(e))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn refresh_error_clones_share_transport_source() {
		let err = RefreshError::from(TransportError::Io(std::io::Error::other("reset")));
		let cloned = err.clone();

		match (&err, &cloned) {
			(RefreshError::Transport(a), RefreshError::Transport(b)) => assert!(Arc::ptr_eq(a, b)),
			_ => panic!("Transport failures should stay transport failures after cloning."),
		}

		let source = StdError::source(&cloned)
			.expect("Refresh transport errors should expose the transport failure as source.");

		assert!(source.to_string().contains("I/O error"));
	}

	#[test]
	fn refresh_error_converts_into_crate_error() {
		let err: Error = RefreshError::Status { status: 500 }.into();

		assert!(matches!(err, Error::Refresh(RefreshError::Status { status: 500 })));
		assert_eq!(err.to_string(), "Refresh failed with status 500.");
	}

	#[test]
	fn store_error_keeps_message_through_refresh_error() {
		let err = RefreshError::Storage(StoreError::Backend { message: "disk full".into() });

		assert!(err.to_string().contains("disk full"));
	}
}
