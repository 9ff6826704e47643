//! Shared value slots
//!
//! Each registration gets a typed slot owned by the registry and a
//! `FlagHandle` the caller keeps. The handle only exposes a getter; the
//! resolver is the single writer, so callers never see a half-updated
//! value and cannot mutate shared state themselves.

use std::sync::{Arc, RwLock};

use crate::value::FlagValue;

/// Read handle for a registered option.
///
/// Holds the registration-time default until resolution runs, then the
/// resolved value for the rest of the process. Cloning the handle is cheap;
/// all clones observe the same slot.
#[derive(Debug)]
pub struct FlagHandle<T> {
    inner: Arc<RwLock<T>>,
}

impl<T: Clone> FlagHandle<T> {
    /// Current value of the option
    pub fn get(&self) -> T {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl<T> Clone for FlagHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Type-erased write side of a slot, used by the resolver's fan-out.
pub(crate) trait Slot: Send + Sync {
    /// Parse the resolved text and store it
    fn write_text(&self, text: &str) -> Result<(), String>;
}

pub(crate) struct TypedSlot<T> {
    inner: Arc<RwLock<T>>,
}

impl<T: FlagValue> TypedSlot<T> {
    pub(crate) fn new(default: T) -> (Self, FlagHandle<T>) {
        let inner = Arc::new(RwLock::new(default));
        let handle = FlagHandle {
            inner: Arc::clone(&inner),
        };
        (Self { inner }, handle)
    }
}

impl<T: FlagValue> Slot for TypedSlot<T> {
    fn write_text(&self, text: &str) -> Result<(), String> {
        let value = T::parse_text(text)?;
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_sees_slot_writes() {
        let (slot, handle) = TypedSlot::new(4i32);
        assert_eq!(handle.get(), 4);

        slot.write_text("8").unwrap();
        assert_eq!(handle.get(), 8);
    }

    #[test]
    fn test_write_rejects_bad_text() {
        let (slot, handle) = TypedSlot::new(4i32);
        assert!(slot.write_text("eight").is_err());
        assert_eq!(handle.get(), 4);
    }

    #[test]
    fn test_cloned_handles_share_slot() {
        let (slot, handle) = TypedSlot::new(String::from("a"));
        let other = handle.clone();

        slot.write_text("b").unwrap();
        assert_eq!(handle.get(), "b");
        assert_eq!(other.get(), "b");
    }
}
