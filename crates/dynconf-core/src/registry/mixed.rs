//! Mixed-mode contract

use std::any::Any;
use std::sync::Arc;

use super::error::HookResult;
use crate::codec::ConfigShape;
use crate::remote::ChangeEvent;

/// A configuration type that seeds from a file and follows remote changes
///
/// Every remote change received by the registry's mixed dispatcher is offered to
/// every mixed entry, whichever key it subscribed with. Implementations must
/// ignore events whose `data_id`/`group` they do not own.
///
/// Both hooks run while the registry holds its write lock; they must not call
/// back into the registry.
///
/// # Example
///
/// ```
/// use dynconf_core::{ChangeEvent, HookResult, MixedConfig};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Gateway {
///     port: u16,
///     upstream: String,
/// }
///
/// impl MixedConfig for Gateway {
///     fn update_after_register(&mut self) {
///         if self.port == 0 {
///             self.port = 8080;
///         }
///     }
///
///     fn on_remote_changed(&mut self, event: &ChangeEvent) -> HookResult {
///         if event.data_id == "gateway.upstream" {
///             self.upstream = event.content.trim().to_string();
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait MixedConfig: ConfigShape {
    /// Called once after the initial file + remote merge
    fn update_after_register(&mut self);

    /// Apply a remote change; an error leaves the entry as it was
    fn on_remote_changed(&mut self, event: &ChangeEvent) -> HookResult;
}

/// Type-erased mixed entry held by the registry
pub(crate) trait MixedSlot: Send + Sync {
    fn snapshot(&self) -> Arc<dyn Any + Send + Sync>;

    fn as_any(&self) -> &dyn Any;

    fn apply(&mut self, event: &ChangeEvent) -> HookResult;
}

pub(crate) struct Slot<T>(pub(crate) T);

impl<T: MixedConfig> MixedSlot for Slot<T> {
    fn snapshot(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::new(self.0.clone())
    }

    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn apply(&mut self, event: &ChangeEvent) -> HookResult {
        // Hooks edit a copy so a failure halfway through never leaks out
        let mut next = self.0.clone();
        next.on_remote_changed(event)?;
        self.0 = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HookError;
    use crate::remote::RemoteKey;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Limits {
        soft: u32,
        hard: u32,
    }

    impl MixedConfig for Limits {
        fn update_after_register(&mut self) {}

        fn on_remote_changed(&mut self, event: &ChangeEvent) -> HookResult {
            // Writes one field before validating the other
            self.soft = event.content.len() as u32;
            let hard: u32 = event
                .content
                .parse()
                .map_err(|_| HookError::rejected("hard limit must be a number"))?;
            self.hard = hard;
            Ok(())
        }
    }

    #[test]
    fn test_failed_hook_leaves_slot_untouched() {
        let mut slot = Slot(Limits { soft: 1, hard: 2 });
        let key = RemoteKey::new("limits", "g");

        assert!(slot.apply(&ChangeEvent::new("ns", &key, "lots")).is_err());
        assert_eq!(slot.0, Limits { soft: 1, hard: 2 });

        slot.apply(&ChangeEvent::new("ns", &key, "500")).unwrap();
        assert_eq!(slot.0, Limits { soft: 3, hard: 500 });
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut slot = Slot(Limits { soft: 1, hard: 2 });
        let before = slot.snapshot();

        slot.apply(&ChangeEvent::new("ns", &RemoteKey::new("limits", "g"), "9")).unwrap();

        let before = before.downcast::<Limits>().unwrap();
        assert_eq!(before.hard, 2);
        assert_eq!(slot.as_any().downcast_ref::<Limits>().unwrap().hard, 9);
    }
}
