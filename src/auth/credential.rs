//! Bearer credential record and `Authorization` header rendering.

// crates.io
use http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Bearer credential as persisted by a [`CredentialStore`](crate::store::CredentialStore).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Opaque bearer token; callers must avoid logging it.
	pub token: TokenSecret,
	/// Expiry reported by the refresh endpoint, when known.
	pub expires_at: Option<OffsetDateTime>,
}
impl Credential {
	/// Wraps a bearer token with no known expiry.
	pub fn new(token: impl Into<TokenSecret>) -> Self {
		Self { token: token.into(), expires_at: None }
	}

	/// Sets or replaces the expiry instant.
	pub fn with_expires_at(mut self, expires_at: OffsetDateTime) -> Self {
		self.expires_at = Some(expires_at);

		self
	}

	/// Renders the `Authorization: Bearer <token>` header value, flagged as sensitive.
	pub fn authorization_value(&self) -> Result<HeaderValue, ConfigError> {
		let mut value = HeaderValue::try_from(format!("Bearer {}", self.token.expose()))
			.map_err(|_| ConfigError::InvalidHeaderValue { name: AUTHORIZATION.to_string() })?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token", &self.token)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authorization_value_uses_bearer_scheme_and_is_sensitive() {
		let value = Credential::new("abc")
			.authorization_value()
			.expect("Plain ASCII tokens should render as header values.");

		assert_eq!(value.to_str().expect("Header value should be ASCII."), "Bearer abc");
		assert!(value.is_sensitive());
	}

	#[test]
	fn authorization_value_rejects_control_characters() {
		let err = Credential::new("bad\ntoken")
			.authorization_value()
			.expect_err("Tokens with newlines must not become header values.");

		assert!(matches!(err, ConfigError::InvalidHeaderValue { .. }));
	}

	#[test]
	fn debug_output_redacts_token() {
		let rendered = format!("{:?}", Credential::new("super-secret"));

		assert!(!rendered.contains("super-secret"));
		assert!(rendered.contains("<redacted>"));
	}
}
