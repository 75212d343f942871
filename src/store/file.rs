//! File-backed [`AccessTokenStore`] that keeps tokens across process restarts.

// std
use std::{
	fs::{self, File},
	io::{self, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Realm},
	store::{AccessTokenStore, StoreError, StoreFuture},
};

type TokenMap = HashMap<Realm, AccessToken>;

/// Persists realm tokens to a JSON file after each mutation.
///
/// Mutations are staged on a copy of the map and only become visible once the snapshot is on
/// disk, so a failed write leaves the store as it was. Expired tokens are dropped from memory on
/// read and from the file on the next write.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<TokenMap>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing tokens.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let tokens = read_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(tokens)) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn commit<T>(&self, edit: impl FnOnce(&mut TokenMap) -> T) -> Result<T, StoreError> {
		let mut tokens = self.inner.write();
		let mut staged = tokens.clone();
		let output = edit(&mut staged);

		write_snapshot(&self.path, &staged)?;
		*tokens = staged;

		Ok(output)
	}
}
impl AccessTokenStore for FileStore {
	fn put(&self, realm: Realm, token: AccessToken) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			self.commit(|tokens| {
				tokens.retain(|_, held| !held.is_expired_at(now));
				tokens.insert(realm, token);
			})
		})
	}

	fn get<'a>(&'a self, realm: &'a Realm) -> StoreFuture<'a, Option<AccessToken>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			match self.inner.read().get(realm) {
				Some(token) if !token.is_expired_at(now) => return Ok(Some(token.clone())),
				Some(_) => {},
				None => return Ok(None),
			}

			let mut tokens = self.inner.write();

			if tokens.get(realm).is_some_and(|token| token.is_expired_at(now)) {
				tokens.remove(realm);
			}

			Ok(tokens.get(realm).cloned())
		})
	}

	fn remove<'a>(&'a self, realm: &'a Realm) -> StoreFuture<'a, Option<AccessToken>> {
		Box::pin(async move {
			if !self.inner.read().contains_key(realm) {
				return Ok(None);
			}

			self.commit(|tokens| tokens.remove(realm))
		})
	}
}

fn backend_error(action: &str, path: &Path, e: io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {e}", path.display()) }
}

fn read_snapshot(path: &Path) -> Result<TokenMap, StoreError> {
	let bytes = match fs::read(path) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(TokenMap::new()),
		Err(e) => return Err(backend_error("read", path, e)),
	};

	if bytes.is_empty() {
		return Ok(TokenMap::new());
	}

	let mut de = serde_json::Deserializer::from_slice(&bytes);
	let entries: Vec<(Realm, AccessToken)> =
		serde_path_to_error::deserialize(&mut de).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {} at `{}`: {}", path.display(), e.path(), e.inner()),
		})?;

	Ok(entries.into_iter().collect())
}

/// Writes the snapshot next to `path` and renames it into place.
fn write_snapshot(path: &Path, tokens: &TokenMap) -> Result<(), StoreError> {
	if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
		fs::create_dir_all(dir).map_err(|e| backend_error("create directory", dir, e))?;
	}

	let mut entries = tokens.iter().collect::<Vec<_>>();

	entries.sort_by(|a, b| a.0.cmp(b.0));

	let bytes = serde_json::to_vec_pretty(&entries).map_err(|e| StoreError::Serialization {
		message: format!("Failed to serialize token snapshot: {e}"),
	})?;
	let staging = path.with_extension("tmp");
	let mut file = File::create(&staging).map_err(|e| backend_error("create", &staging, e))?;

	file.write_all(&bytes).map_err(|e| backend_error("write", &staging, e))?;
	file.sync_all().map_err(|e| backend_error("sync", &staging, e))?;
	drop(file);

	fs::rename(&staging, path).map_err(|e| backend_error("replace", path, e))
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;

	fn temp_path(label: &str) -> PathBuf {
		let unique = format!(
			"iiif_access_file_store_{label}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn realm() -> Realm {
		Realm::new("https://images.example.org").expect("Realm fixture should be valid.")
	}

	#[test]
	fn put_and_reload_round_trip() {
		let path = temp_path("reload");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.put(realm(), AccessToken::new("persisted")))
			.expect("Failed to save token into file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let realm = realm();
		let fetched = rt
			.block_on(reopened.get(&realm))
			.expect("Failed to fetch token from file store.")
			.expect("File store lost token after reopen.");

		assert_eq!(fetched.expose(), "persisted");

		let removed = rt
			.block_on(reopened.remove(&realm))
			.expect("Failed to remove token from file store.");

		assert!(removed.is_some());
		assert!(FileStore::open(&path).expect("Failed to reopen store.").inner.read().is_empty());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn expired_tokens_are_not_returned() {
		let path = temp_path("expired");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let expired = AccessToken::new("stale")
			.with_issued_at(OffsetDateTime::now_utc() - Duration::hours(2))
			.with_expires_in(Duration::hours(1));
		let realm = realm();

		rt.block_on(store.put(realm.clone(), expired)).expect("Failed to save expired token.");

		let fetched = rt.block_on(store.get(&realm)).expect("Fetching should not fail.");

		assert!(fetched.is_none());
		assert!(store.inner.read().is_empty());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_snapshots_report_the_failing_path() {
		let path = temp_path("corrupt");

		fs::write(&path, br#"[["https://images.example.org", {"secret": 7}]]"#)
			.expect("Failed to write corrupt snapshot.");

		let err = FileStore::open(&path).expect_err("Corrupt snapshot should not open.");

		assert!(matches!(
			&err,
			Error::Storage(StoreError::Serialization { message }) if message.contains("[0][1].secret")
		));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_writes_leave_the_store_unchanged() {
		let dir = temp_path("unwritable");
		let path = dir.join("tokens.json");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let realm = realm();

		// A plain file where the snapshot directory should be makes every write fail.
		fs::write(&dir, b"").expect("Failed to block the snapshot directory.");

		let err = rt
			.block_on(store.put(realm.clone(), AccessToken::new("unsaved")))
			.expect_err("Writing under a file should fail.");

		assert!(matches!(err, StoreError::Backend { .. }));
		assert!(rt.block_on(store.get(&realm)).expect("Fetching should not fail.").is_none());
		assert!(store.inner.read().is_empty());

		fs::remove_file(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove blocking file {}: {e}", dir.display())
		});
	}
}
