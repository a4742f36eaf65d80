use std::time::Duration;

/// Integer sentinel for "store without expiration".
pub const NO_EXPIRATION: i64 = 0;

/// Integer sentinel routing a write to the non-persistent tier.
pub const NON_PERSISTENT: i64 = -1;

/// TTL used for non-persistent writes.
///
/// Process-local stores treat 0 as "forever"; storing with the shortest real
/// TTL keeps such entries from becoming permanent by accident.
pub(crate) const NON_PERSISTENT_TTL: u64 = 1;

/// How long a value written with [`Cache::set`](crate::Cache::set) lives, and
/// in which tier.
///
/// Integers convert the same way the sentinels read: `0` is [`Never`](Self::Never),
/// `-1` is [`NonPersistent`](Self::NonPersistent), positive values are seconds.
/// Other negative values are treated as `Never`.
///
/// # Examples
///
/// ```
/// use cachette::{Expiration, NON_PERSISTENT, NO_EXPIRATION};
/// use std::time::Duration;
///
/// assert_eq!(Expiration::from(NO_EXPIRATION), Expiration::Never);
/// assert_eq!(Expiration::from(NON_PERSISTENT), Expiration::NonPersistent);
/// assert_eq!(Expiration::from(300), Expiration::After(300));
/// assert_eq!(Expiration::from(Duration::from_secs(60)), Expiration::After(60));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Expiration {
    /// Persistent tier, no expiration.
    #[default]
    Never,
    /// Persistent tier, expires after the given number of seconds.
    After(u64),
    /// Non-persistent tier, process lifetime only.
    NonPersistent,
}

impl Expiration {
    /// TTL in seconds as handed to a backend, `0` meaning "no expiration".
    pub fn ttl_secs(&self) -> u64 {
        match self {
            Expiration::Never => 0,
            Expiration::After(secs) => *secs,
            Expiration::NonPersistent => NON_PERSISTENT_TTL,
        }
    }

    pub fn is_non_persistent(&self) -> bool {
        matches!(self, Expiration::NonPersistent)
    }
}

impl From<i64> for Expiration {
    fn from(secs: i64) -> Self {
        match secs {
            NON_PERSISTENT => Expiration::NonPersistent,
            s if s > 0 => Expiration::After(s as u64),
            _ => Expiration::Never,
        }
    }
}

impl From<i32> for Expiration {
    fn from(secs: i32) -> Self {
        Expiration::from(i64::from(secs))
    }
}

impl From<Duration> for Expiration {
    fn from(ttl: Duration) -> Self {
        match ttl.as_secs() {
            0 => Expiration::Never,
            secs => Expiration::After(secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert_eq!(Expiration::from(0i64), Expiration::Never);
        assert_eq!(Expiration::from(-1i64), Expiration::NonPersistent);
        assert_eq!(Expiration::from(-7i64), Expiration::Never);
        assert_eq!(Expiration::from(42i32), Expiration::After(42));
    }

    #[test]
    fn test_ttl_secs() {
        assert_eq!(Expiration::Never.ttl_secs(), 0);
        assert_eq!(Expiration::After(9).ttl_secs(), 9);
        assert_eq!(Expiration::NonPersistent.ttl_secs(), 1);
    }

    #[test]
    fn test_sub_second_duration_is_never() {
        assert_eq!(
            Expiration::from(Duration::from_millis(500)),
            Expiration::Never
        );
    }
}
