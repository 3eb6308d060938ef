//! Request cookies and the cookie-consent slot.
//!
//! Cookies are snapshotted once per render and are read-only afterwards. The
//! only mutable state in a runtime context is the consent acknowledgement,
//! which has exactly one writer ([`ConsentWriter`]) and any number of readers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Name of the cookie holding the visitor's consent decision.
pub const CONSENT_COOKIE: &str = "CookieConsent";

/// Read-only snapshot of the incoming request's cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSnapshot {
    values: BTreeMap<String, String>,
}

impl CookieSnapshot {
    /// A snapshot with no cookies.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header (`a=1; b=2`).
    ///
    /// Pairs without `=` are ignored; the first occurrence of a name wins.
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        let mut values = BTreeMap::new();
        for pair in header.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    let _ = values
                        .entry(name.to_string())
                        .or_insert_with(|| value.trim().to_string());
                }
            }
        }
        Self { values }
    }

    /// Value of a cookie.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Iterate over cookies in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consent state recorded in the consent cookie.
    #[must_use]
    pub fn consent(&self) -> ConsentState {
        match self.get(CONSENT_COOKIE) {
            Some("true") => ConsentState::Accepted,
            Some("false") => ConsentState::Declined,
            _ => ConsentState::Unknown,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CookieSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Visitor's cookie-consent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConsentState {
    /// No decision recorded yet.
    Unknown = 0,
    /// Tracking accepted.
    Accepted = 1,
    /// Tracking declined.
    Declined = 2,
}

impl ConsentState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Accepted,
            2 => Self::Declined,
            _ => Self::Unknown,
        }
    }
}

/// Shared consent state: one writer, many readers.
#[derive(Debug)]
pub struct ConsentSlot {
    state: AtomicU8,
    writer_taken: AtomicBool,
}

impl ConsentSlot {
    /// A slot initialised to `initial`.
    #[must_use]
    pub const fn new(initial: ConsentState) -> Self {
        Self {
            state: AtomicU8::new(initial as u8),
            writer_taken: AtomicBool::new(false),
        }
    }

    /// Latest consent state.
    #[must_use]
    pub fn get(&self) -> ConsentState {
        ConsentState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Hand out the slot's writer. Only the first call succeeds.
    #[must_use]
    pub fn writer(slot: &Arc<Self>) -> Option<ConsentWriter> {
        slot.writer_taken
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ConsentWriter {
                slot: Arc::clone(slot),
            })
    }
}

/// The single writer of a [`ConsentSlot`], held by the consent UI.
#[derive(Debug)]
pub struct ConsentWriter {
    slot: Arc<ConsentSlot>,
}

impl ConsentWriter {
    /// Record the visitor's decision.
    pub fn acknowledge(&self, accepted: bool) {
        let state = if accepted {
            ConsentState::Accepted
        } else {
            ConsentState::Declined
        };
        self.slot.state.store(state as u8, Ordering::Release);
        tracing::debug!(accepted, "cookie consent acknowledged");
    }
}
