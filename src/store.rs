//! Storage contracts and built-in store implementations for realm access tokens.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Realm},
};

/// Boxed future returned by [`AccessTokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Keyed persistence for access tokens, shared by every negotiation in a process.
///
/// Reads and writes are single atomic calls; a get-then-put sequence is not transactional, so
/// two negotiations may both mint and store a token for one realm. The last write wins.
pub trait AccessTokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the token for a realm.
	fn put(&self, realm: Realm, token: AccessToken) -> StoreFuture<'_, ()>;

	/// Fetches the usable token for a realm, if present.
	fn get<'a>(&'a self, realm: &'a Realm) -> StoreFuture<'a, Option<AccessToken>>;

	/// Drops the token for a realm, returning it if present.
	fn remove<'a>(&'a self, realm: &'a Realm) -> StoreFuture<'a, Option<AccessToken>>;
}

/// Error type produced by [`AccessTokenStore`] implementations.
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
