//! Entity Lock (§4.8, C8): SET-if-absent-with-TTL mutual exclusion for
//! callers that need to hold a record across more than one write, where
//! the write path's own optimistic-concurrency race check (§4.4 step 1)
//! isn't enough on its own.
//!
//! Grounded the same way the writer's atomic script is: one primitive
//! [`BackingStore`] call to acquire (`set_nx`), one to release
//! (`delete_if_matches`), with the release gated on a random token so a
//! lock that outlived its TTL and was reacquired by someone else never
//! gets deleted out from under its new holder.

use rom_backend::BackingStore;
use std::fmt;
use uuid::Uuid;

/// Key prefix every entity lock is stored under, namespaced beneath the
/// model's own namespace so a lock can never collide with a record or
/// index key.
const LOCK_KEY_SUFFIX: &str = ":lock";

/// Failure modes for [`EntityLock::acquire`] / [`LockHandle::release`].
#[derive(Debug)]
pub enum LockError {
    /// Another holder already has the lock.
    Contended,
    /// The backing store rejected the call.
    Backend(String),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Contended => write!(f, "entity lock is held by another writer"),
            LockError::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for LockError {}

/// A held lock. Dropping this without calling [`LockHandle::release`]
/// leaves the lock in place until its TTL expires — there is no `Drop`-time
/// release, since that would require blocking in a destructor.
#[derive(Debug)]
pub struct LockHandle {
    key: String,
    token: String,
}

impl LockHandle {
    /// Release the lock, but only if this handle's token still matches
    /// the stored value — if the TTL already expired and someone else
    /// acquired it, this is a no-op rather than a release of their lock.
    pub fn release<S: BackingStore>(&self, store: &S) -> Result<bool, LockError> {
        store
            .delete_if_matches(&self.key, &self.token)
            .map_err(|e| LockError::Backend(e.to_string()))
    }

    /// The key this handle's lock is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// SET-if-absent-with-TTL lock over one entity key.
pub struct EntityLock {
    key: String,
}

impl EntityLock {
    /// Name a lock over `namespace:id`, e.g. `"User:42"`.
    pub fn new(namespace: &str, id: u64) -> Self {
        EntityLock {
            key: format!("{namespace}:{id}{LOCK_KEY_SUFFIX}"),
        }
    }

    /// Attempt to acquire the lock, holding it for `ttl_secs` unless
    /// released first. Fails with [`LockError::Contended`] if another
    /// holder currently has it.
    pub fn acquire<S: BackingStore>(&self, store: &S, ttl_secs: u64) -> Result<LockHandle, LockError> {
        let token = Uuid::new_v4().to_string();
        let acquired = store
            .set_nx(&self.key, &token, ttl_secs)
            .map_err(|e| LockError::Backend(e.to_string()))?;
        if acquired {
            Ok(LockHandle {
                key: self.key.clone(),
                token,
            })
        } else {
            Err(LockError::Contended)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rom_backend::InMemoryBackend;

    #[test]
    fn second_acquire_is_contended_until_released() {
        let be = InMemoryBackend::default();
        let lock = EntityLock::new("User", 1);
        let handle = lock.acquire(&be, 30).unwrap();
        assert!(matches!(
            lock.acquire(&be, 30).unwrap_err(),
            LockError::Contended
        ));
        assert!(handle.release(&be).unwrap());
        let reacquired = lock.acquire(&be, 30);
        assert!(reacquired.is_ok());
    }

    #[test]
    fn release_with_stale_token_is_a_no_op() {
        let be = InMemoryBackend::default();
        let lock = EntityLock::new("User", 2);
        let first = lock.acquire(&be, 30).unwrap();
        assert!(first.release(&be).unwrap());
        let second = lock.acquire(&be, 30).unwrap();
        assert!(!first.release(&be).unwrap());
        assert!(second.release(&be).unwrap());
    }

    #[test]
    fn locks_on_different_ids_do_not_contend() {
        let be = InMemoryBackend::default();
        let a = EntityLock::new("User", 1);
        let b = EntityLock::new("User", 2);
        let _ha = a.acquire(&be, 30).unwrap();
        let hb = b.acquire(&be, 30).unwrap();
        assert!(hb.release(&be).unwrap());
    }
}
