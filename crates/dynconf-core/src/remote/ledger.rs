//! Process-wide ledger of subscribed remote keys
//!
//! The remote service delivers one change stream per `dataID:group`. Two
//! registrations on the same key, even from different registries, would
//! double-dispatch, so remote registrations claim their key here first.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::traits::RemoteKey;

static REGISTERED: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Check whether `key` has been claimed in this process
pub fn is_registered(key: &RemoteKey) -> bool {
    REGISTERED.lock().contains(&key.to_string())
}

/// Claim `key`; returns `false` if it was already claimed
pub fn mark_registered(key: &RemoteKey) -> bool {
    REGISTERED.lock().insert(key.to_string())
}

/// Give `key` back so a later registration can claim it
pub(crate) fn release(key: &RemoteKey) {
    REGISTERED.lock().remove(&key.to_string());
}

/// Claim on a key held while a registration is in flight
///
/// Dropping the claim releases the key; `keep` makes it permanent.
#[must_use]
pub(crate) struct Claim {
    key: Option<RemoteKey>,
}

impl Claim {
    pub(crate) fn keep(mut self) {
        self.key = None;
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            release(&key);
        }
    }
}

/// Claim `key` for an in-flight registration; `None` if already claimed
pub(crate) fn claim(key: &RemoteKey) -> Option<Claim> {
    mark_registered(key).then(|| Claim {
        key: Some(key.clone()),
    })
}

/// Number of claimed keys
pub fn registered_count() -> usize {
    REGISTERED.lock().len()
}

/// Forget every claimed key so isolated scenarios can be re-run
#[cfg(any(test, feature = "test-util"))]
pub fn clear() {
    REGISTERED.lock().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_mark_and_check() {
        let key = RemoteKey::new("ledger-mark", "test");
        assert!(!is_registered(&key));
        assert!(mark_registered(&key));
        assert!(is_registered(&key));
        assert!(!mark_registered(&key));
    }

    #[test]
    #[serial]
    fn test_clear_forgets_everything() {
        let key = RemoteKey::new("ledger-clear", "test");
        mark_registered(&key);
        assert!(registered_count() >= 1);

        clear();
        assert!(!is_registered(&key));
        assert_eq!(registered_count(), 0);
    }

    #[test]
    #[serial]
    fn test_dropped_claim_is_released() {
        let key = RemoteKey::new("ledger-claim-drop", "test");
        {
            let claim = claim(&key).unwrap();
            assert!(is_registered(&key));
            assert!(super::claim(&key).is_none());
            drop(claim);
        }
        assert!(!is_registered(&key));
    }

    #[test]
    #[serial]
    fn test_kept_claim_stays() {
        let key = RemoteKey::new("ledger-claim-keep", "test");
        claim(&key).unwrap().keep();
        assert!(is_registered(&key));
        assert!(claim(&key).is_none());
    }

    #[test]
    #[serial]
    fn test_group_is_part_of_key() {
        let a = RemoteKey::new("ledger-group", "a");
        let b = RemoteKey::new("ledger-group", "b");
        mark_registered(&a);
        assert!(!is_registered(&b));
    }
}
