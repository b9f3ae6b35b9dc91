//! Time conversions
//!
//! The MVG API delivers absolute instants as Unix timestamps in milliseconds.
//! These helpers convert between that wire form and [`DateTime<Utc>`], and
//! implement the relative-minutes rule used for departure normalization.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::MvgError;

/// Convert an epoch-millisecond timestamp into a structured instant.
///
/// Values outside chrono's representable range fail with
/// [`MvgError::TimestampOutOfRange`] instead of being coerced.
pub fn datetime_from_epoch_ms(epoch_ms: i64) -> Result<DateTime<Utc>, MvgError> {
    Utc.timestamp_millis_opt(epoch_ms)
        .single()
        .ok_or(MvgError::TimestampOutOfRange(epoch_ms))
}

/// Convert a structured instant into the API's epoch-millisecond form.
#[must_use]
pub fn epoch_ms_from_datetime(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

/// Whole minutes from `now` until an epoch-millisecond instant.
///
/// Floor division toward negative infinity: an instant 90 seconds in the past
/// is `-2`, one 90 seconds ahead is `1`. Negative values are meaningful (the
/// vehicle has already departed) and are not clamped. Instants outside
/// chrono's representable range fail with [`MvgError::TimestampOutOfRange`].
pub fn minutes_between(now: DateTime<Utc>, epoch_ms: i64) -> Result<i64, MvgError> {
    // The subtraction cannot overflow once both instants are representable.
    datetime_from_epoch_ms(epoch_ms)?;
    Ok((epoch_ms - now.timestamp_millis()).div_euclid(60_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_round_trip_preserves_instant() {
        let instant = Utc.with_ymd_and_hms(2026, 8, 23, 14, 30, 15).unwrap();
        let ms = epoch_ms_from_datetime(instant);
        assert_eq!(datetime_from_epoch_ms(ms).unwrap(), instant);
    }

    #[test]
    fn test_epoch_round_trip_keeps_milliseconds() {
        let ms = 1_571_923_180_500;
        let instant = datetime_from_epoch_ms(ms).unwrap();
        assert_eq!(epoch_ms_from_datetime(instant), ms);
    }

    #[test]
    fn test_out_of_range_timestamp_fails() {
        let err = datetime_from_epoch_ms(i64::MAX).unwrap_err();
        assert!(matches!(err, MvgError::TimestampOutOfRange(_)));
        assert!(err.to_string().contains(&i64::MAX.to_string()));

        assert!(datetime_from_epoch_ms(i64::MIN).is_err());
    }

    #[test]
    fn test_minutes_between_future() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        let in_five = epoch_ms_from_datetime(now) + 5 * 60_000;
        assert_eq!(minutes_between(now, in_five).unwrap(), 5);
    }

    #[test]
    fn test_minutes_between_floors_partial_minutes() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        let now_ms = epoch_ms_from_datetime(now);

        // 4 minutes 59 seconds ahead floors to 4
        assert_eq!(minutes_between(now, now_ms + 299_000).unwrap(), 4);
        // 90 seconds ahead floors to 1
        assert_eq!(minutes_between(now, now_ms + 90_000).unwrap(), 1);
    }

    #[test]
    fn test_minutes_between_negative_for_departed() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        let now_ms = epoch_ms_from_datetime(now);

        // 90 seconds in the past floors toward negative infinity
        assert_eq!(minutes_between(now, now_ms - 90_000).unwrap(), -2);
        assert_eq!(minutes_between(now, now_ms - 60_000).unwrap(), -1);
    }

    #[test]
    fn test_minutes_between_same_instant() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        assert_eq!(minutes_between(now, epoch_ms_from_datetime(now)).unwrap(), 0);
    }

    #[test]
    fn test_minutes_between_rejects_extreme_instants() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();

        let err = minutes_between(now, i64::MIN).unwrap_err();
        assert!(matches!(err, MvgError::TimestampOutOfRange(i64::MIN)));

        assert!(minutes_between(now, i64::MAX).is_err());
    }
}
