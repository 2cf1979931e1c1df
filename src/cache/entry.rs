//! Cache Entry Module
//!
//! Defines individual cache entries and the per-write expiration convention.

use std::time::{Duration, Instant};

// == Expiration ==
/// Expiration requested by a single write.
///
/// Mirrors the signed-duration convention: zero means "use the store's
/// default", a positive duration is a TTL relative to the moment the write is
/// applied, and the negative sentinel means "never expires".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the store's default expiration
    #[default]
    Default,
    /// Never expire
    Never,
    /// Expire this long after the write is applied
    After(Duration),
}

impl Expiration {
    // == From Millis ==
    /// Builds an expiration from a signed millisecond count.
    ///
    /// `0` selects the store default, a positive value is a TTL and any
    /// negative value means the entry never expires.
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            0 => Expiration::Default,
            m if m < 0 => Expiration::Never,
            m => Expiration::After(Duration::from_millis(m as u64)),
        }
    }

    // == Resolve ==
    /// Resolves this expiration to an absolute deadline.
    ///
    /// `Default`, and `After` with a zero duration, fall back to `default`,
    /// which must itself not be `Default`; a store always resolves its own
    /// default to `Never` or `After`.
    pub fn deadline(self, default: Expiration, now: Instant) -> Option<Instant> {
        let effective = match self {
            Expiration::Default => default,
            Expiration::After(ttl) if ttl.is_zero() => default,
            other => other,
        };

        match effective {
            Expiration::After(ttl) => now.checked_add(ttl),
            Expiration::Never | Expiration::Default => None,
        }
    }
}

impl From<Duration> for Expiration {
    fn from(duration: Duration) -> Self {
        if duration.is_zero() {
            Expiration::Default
        } else {
            Expiration::After(duration)
        }
    }
}

// == Cache Entry ==
/// A stored value together with its optional absolute expiration.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring at `expires_at`.
    pub fn new(value: String, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks expiry against a caller-supplied instant.
    ///
    /// An entry is expired once `now >= expires_at`; entries without an
    /// expiration never expire.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Checks expiry against the real clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has a TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}
