//! Per-controller sequence tokens and last-issued-wins bookkeeping.

use std::fmt;

/// Monotonic per-controller request counter. `SequenceToken::NONE` means
/// nothing has been issued yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SequenceToken(pub u64);

impl SequenceToken {
    pub const NONE: SequenceToken = SequenceToken(0);

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Discarded,
}

/// State each controller owns exclusively.
///
/// A result is applied only when its token equals `last_issued` at the time
/// it arrives; anything older is dropped.
#[derive(Debug, Clone)]
pub struct ControllerState<T> {
    last_issued: SequenceToken,
    latest_accepted: SequenceToken,
    busy: bool,
    last_value: T,
}

impl<T: Default> Default for ControllerState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ControllerState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            last_issued: SequenceToken::NONE,
            latest_accepted: SequenceToken::NONE,
            busy: false,
            last_value: initial,
        }
    }

    /// Issues a fresh token and marks a request as in flight.
    pub fn issue(&mut self) -> SequenceToken {
        self.last_issued = self.last_issued.next();
        self.busy = true;
        self.last_issued
    }

    /// Invalidates whatever is in flight without issuing a request, and
    /// installs `value` as the current state.
    pub fn supersede(&mut self, value: T) -> SequenceToken {
        self.last_issued = self.last_issued.next();
        self.latest_accepted = self.last_issued;
        self.busy = false;
        self.last_value = value;
        self.last_issued
    }

    pub fn is_current(&self, token: SequenceToken) -> bool {
        token != SequenceToken::NONE && token == self.last_issued
    }

    /// Applies `value` if `token` is still the newest issued token.
    pub fn resolve(&mut self, token: SequenceToken, value: T) -> Resolution {
        if !self.is_current(token) {
            return Resolution::Discarded;
        }
        self.latest_accepted = token;
        self.busy = false;
        self.last_value = value;
        Resolution::Applied
    }

    /// Replaces the current value without touching tokens.
    pub fn set_value(&mut self, value: T) {
        self.last_value = value;
    }

    pub fn last_issued(&self) -> SequenceToken {
        self.last_issued
    }

    pub fn latest_accepted(&self) -> SequenceToken {
        self.latest_accepted
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn value(&self) -> &T {
        &self.last_value
    }
}

#[cfg(test)]
#[path = "tests/sequence_tests.rs"]
mod tests;
