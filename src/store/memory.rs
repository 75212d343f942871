//! Thread-safe in-memory [`AccessTokenStore`] for viewers, local development, and tests.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Realm},
	store::{AccessTokenStore, StoreError, StoreFuture},
};

type TokenMap = Arc<RwLock<HashMap<Realm, AccessToken>>>;

/// In-process token store; clones share the same map.
///
/// Expired tokens are evicted on read and reported as absent.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(TokenMap);
impl MemoryStore {
	/// Number of tokens currently held, expired ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` if no token is held.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: TokenMap, realm: &Realm, now: OffsetDateTime) -> Option<AccessToken> {
		{
			let guard = map.read();

			match guard.get(realm) {
				Some(token) if !token.is_expired_at(now) => return Some(token.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut guard = map.write();

		// Another writer may have replaced the expired token between the two locks.
		match guard.get(realm) {
			Some(token) if !token.is_expired_at(now) => Some(token.clone()),
			Some(_) => {
				guard.remove(realm);

				None
			},
			None => None,
		}
	}
}
impl AccessTokenStore for MemoryStore {
	fn put(&self, realm: Realm, token: AccessToken) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(realm, token);

			Ok::<_, StoreError>(())
		})
	}

	fn get<'a>(&'a self, realm: &'a Realm) -> StoreFuture<'a, Option<AccessToken>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, realm, OffsetDateTime::now_utc())) })
	}

	fn remove<'a>(&'a self, realm: &'a Realm) -> StoreFuture<'a, Option<AccessToken>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(realm)) })
	}
}
