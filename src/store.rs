//! Storage contract and built-in credential store implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend holding the single bearer credential the interceptor attaches.
///
/// The interceptor never caches the value itself: every request reads through [`get`], and
/// the refresh coordinator writes through [`set`] or [`clear`].
///
/// [`get`]: CredentialStore::get
/// [`set`]: CredentialStore::set
/// [`clear`]: CredentialStore::clear
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the current credential, if any.
	fn get(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Persists or replaces the credential.
	fn set(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Removes the credential. Clearing an empty store is not an error.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
