//! Composer warnings routed through `tracing`.
//!
//! Provides deduplication to avoid spamming the same warning once per render.
//! Used by the composer to report type labels the page model uses but the
//! storefront cannot render.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about unrenderable content (emits once per unique message)
///
/// Returns `true` if the warning was emitted, `false` if it had already been
/// seen since the last [`clear_warnings`].
///
/// # Example
/// ```ignore
/// warn_once("COMPOSE", "no renderer for type label 'Carousel'");
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let first = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if first {
        tracing::warn!(component, "{message}");
    }
    first
}

/// Clear all recorded warnings (call when starting a new render session)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_deduplicates() {
        let message = "unique message for dedup test";
        assert!(warn_once("test", message));
        assert!(!warn_once("test", message));
        // Same message from another component is a distinct warning
        assert!(warn_once("other", message));
    }
}
