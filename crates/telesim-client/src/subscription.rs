//! Subscription states and the local signal cache.
//!
//! Subscribed signals are refreshed by updates the simulator pushes; the
//! client applies them to this cache whenever it reads the socket. A
//! buffered read never blocks — it reports the most recently applied value,
//! or nothing when the first update has not arrived yet.

use std::collections::HashMap;

use telesim_core::signals::SignalKind;

use crate::protocol::ClientError;

// ---------------------------------------------------------------------------
// SubscriptionState
// ---------------------------------------------------------------------------

/// Lifecycle of a single signal subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    /// No subscription exists for the signal.
    #[default]
    NotSubscribed,
    /// Subscribed, but no update has been delivered yet. Buffered reads
    /// report nothing and callers keep their zero placeholders.
    Pending,
    /// Subscribed with at least one delivered value.
    Fresh,
}

impl SubscriptionState {
    /// Whether a buffered read would return a value.
    #[must_use]
    pub const fn has_value(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

// ---------------------------------------------------------------------------
// SignalValue
// ---------------------------------------------------------------------------

/// A delivered signal value.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    Scalar(f32),
    Integer(i64),
    Vector(Vec<f32>),
}

impl SignalValue {
    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        match self {
            Self::Scalar(_) => SignalKind::Scalar,
            Self::Integer(_) => SignalKind::Integer,
            Self::Vector(_) => SignalKind::Vector,
        }
    }
}

// ---------------------------------------------------------------------------
// SignalCache
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Slot {
    kind: SignalKind,
    value: Option<SignalValue>,
}

/// Per-signal cache of subscription states and last-delivered values.
#[derive(Debug, Default)]
pub struct SignalCache {
    slots: HashMap<String, Slot>,
}

impl SignalCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription. Re-subscribing with the same kind keeps any
    /// already-delivered value; changing the kind resets the slot.
    pub fn subscribe(&mut self, name: &str, kind: SignalKind) {
        match self.slots.get_mut(name) {
            Some(slot) if slot.kind == kind => {}
            _ => {
                self.slots
                    .insert(name.to_string(), Slot { kind, value: None });
            }
        }
    }

    /// Current state of a signal's subscription.
    #[must_use]
    pub fn state(&self, name: &str) -> SubscriptionState {
        match self.slots.get(name) {
            None => SubscriptionState::NotSubscribed,
            Some(Slot { value: None, .. }) => SubscriptionState::Pending,
            Some(Slot { value: Some(_), .. }) => SubscriptionState::Fresh,
        }
    }

    /// Apply a pushed update.
    ///
    /// Updates for signals that were never subscribed are ignored (the
    /// simulator only pushes what was asked for; anything else is noise).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::KindMismatch`] when the delivered value's
    /// shape contradicts the subscription.
    pub fn apply(&mut self, name: &str, value: SignalValue) -> Result<(), ClientError> {
        let Some(slot) = self.slots.get_mut(name) else {
            return Ok(());
        };
        if slot.kind != value.kind() {
            return Err(ClientError::KindMismatch {
                name: name.to_string(),
                expected: slot.kind,
                got: value.kind(),
            });
        }
        slot.value = Some(value);
        Ok(())
    }

    /// Buffered scalar read. `Ok(None)` while pending.
    pub fn scalar(&self, name: &str) -> Result<Option<f32>, ClientError> {
        match self.get(name, SignalKind::Scalar)? {
            Some(SignalValue::Scalar(v)) => Ok(Some(*v)),
            _ => Ok(None),
        }
    }

    /// Buffered integer read. `Ok(None)` while pending.
    pub fn integer(&self, name: &str) -> Result<Option<i64>, ClientError> {
        match self.get(name, SignalKind::Integer)? {
            Some(SignalValue::Integer(v)) => Ok(Some(*v)),
            _ => Ok(None),
        }
    }

    /// Buffered vector read. `Ok(None)` while pending.
    pub fn vector(&self, name: &str) -> Result<Option<Vec<f32>>, ClientError> {
        match self.get(name, SignalKind::Vector)? {
            Some(SignalValue::Vector(v)) => Ok(Some(v.clone())),
            _ => Ok(None),
        }
    }

    fn get(
        &self,
        name: &str,
        expected: SignalKind,
    ) -> Result<Option<&SignalValue>, ClientError> {
        let Some(slot) = self.slots.get(name) else {
            return Err(ClientError::NotSubscribed {
                name: name.to_string(),
            });
        };
        if slot.kind != expected {
            return Err(ClientError::KindMismatch {
                name: name.to_string(),
                expected,
                got: slot.kind,
            });
        }
        Ok(slot.value.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
