//! Retry policy for fetches that must eventually succeed
//!
//! The policy is a pure function of the number of consecutive failed
//! attempts; reporting and the actual re-sending live in the fetch client.

/// What the fetch client should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Send the request again with the current identity
    RetrySame,

    /// Draw a new identity, then send again
    Rotate,

    /// Stop and report the failure
    GiveUp,
}

/// Decides between retrying, rotating the identity, and giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    rotate_after: u32,
    max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retries forever, rotating the identity every `rotate_after` failures
    pub fn unbounded(rotate_after: u32) -> Self {
        Self {
            rotate_after: rotate_after.max(1),
            max_attempts: None,
        }
    }

    /// Like `unbounded`, but gives up once `max_attempts` attempts have failed
    pub fn bounded(rotate_after: u32, max_attempts: u32) -> Self {
        Self {
            rotate_after: rotate_after.max(1),
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    /// Builds a policy from config values, where a cap of 0 means unbounded
    pub fn from_limits(rotate_after: u32, max_attempts: u32) -> Self {
        if max_attempts == 0 {
            Self::unbounded(rotate_after)
        } else {
            Self::bounded(rotate_after, max_attempts)
        }
    }

    pub fn rotate_after(&self) -> u32 {
        self.rotate_after
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Decides the next step after `consecutive_failures` failed attempts (>= 1)
    pub fn decide(&self, consecutive_failures: u32) -> RetryAction {
        if let Some(max) = self.max_attempts {
            if consecutive_failures >= max {
                return RetryAction::GiveUp;
            }
        }

        if consecutive_failures > 0 && consecutive_failures % self.rotate_after == 0 {
            RetryAction::Rotate
        } else {
            RetryAction::RetrySame
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(5)
    }
}
