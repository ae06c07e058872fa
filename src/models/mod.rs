pub mod event;
pub mod mood;
pub mod movie_like;
pub mod patch;
pub mod song;
pub mod surprise;
pub mod task;
pub mod user;
pub mod wishlist;

use chrono::{DateTime, Utc};

/// Stamp a completion/watched date exactly once: the first transition to
/// `true` records `now`; every later toggle keeps the original date.
pub fn stamp_once(
    flag: bool,
    existing: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if flag && existing.is_none() {
        Some(now)
    } else {
        existing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn stamp_set_on_first_completion() {
        let now = Utc::now();
        assert_eq!(stamp_once(true, None, now), Some(now));
        assert_eq!(stamp_once(false, None, now), None);
    }

    #[test]
    fn stamp_survives_toggling() {
        let first = Utc::now();
        let later = first + Duration::hours(2);

        // true -> false -> true keeps the original date
        let stamped = stamp_once(true, None, first);
        let after_untoggle = stamp_once(false, stamped, later);
        assert_eq!(after_untoggle, Some(first));
        let after_retoggle = stamp_once(true, after_untoggle, later);
        assert_eq!(after_retoggle, Some(first));
    }
}
