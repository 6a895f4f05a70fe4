//! Walk-forward window arithmetic.
//!
//! Windows chain backwards from the end date: each walk's out-of-sample
//! period ends where the next walk's began, and its in-sample period ends
//! exactly where its out-of-sample period starts. The result is returned in
//! chronological order, numbered 1..N.

use chrono::{Duration, NaiveDate};
use strider_models::{Timerange, TimerangeError, WalkWindow};

/// Builds `num_walks` chained IS/OOS windows ending at `end_date`.
///
/// Boundary convention: IS end equals OOS start (the bot's timerange end is
/// exclusive at the daily boundary, so chained windows share their boundary
/// date without double-counting candles).
pub fn chain_backwards(
    end_date: NaiveDate,
    is_days: u32,
    oos_days: u32,
    num_walks: u32,
) -> Result<Vec<WalkWindow>, WindowError> {
    if is_days == 0 || oos_days == 0 {
        return Err(WindowError::EmptyWindow);
    }

    let mut windows = Vec::with_capacity(num_walks as usize);
    let mut current_end = end_date;

    for _ in 0..num_walks {
        let oos_end = current_end;
        let oos_start = oos_end - Duration::days(i64::from(oos_days));
        let is_end = oos_start;
        let is_start = is_end - Duration::days(i64::from(is_days));

        windows.push(WalkWindow {
            walk_num: 0, // renumbered chronologically below
            is_period: Timerange::new(is_start, is_end)?,
            oos_period: Timerange::new(oos_start, oos_end)?,
        });

        current_end = oos_start;
    }

    windows.reverse();
    for (i, w) in windows.iter_mut().enumerate() {
        w.walk_num = i as u32 + 1;
    }
    Ok(windows)
}

/// Splits a forward period starting at `start_date` into an IS range of
/// `is_days` calendar days followed by an OOS range of `oos_days` days.
pub fn forward_split(
    start_date: NaiveDate,
    is_days: u32,
    oos_days: u32,
) -> Result<(Timerange, Timerange), WindowError> {
    if is_days == 0 || oos_days == 0 {
        return Err(WindowError::EmptyWindow);
    }

    let is_end = start_date + Duration::days(i64::from(is_days) - 1);
    let oos_start = start_date + Duration::days(i64::from(is_days));
    let oos_end = oos_start + Duration::days(i64::from(oos_days) - 1);

    Ok((
        Timerange::new(start_date, is_end)?,
        Timerange::new(oos_start, oos_end)?,
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("window lengths must be positive")]
    EmptyWindow,

    #[error(transparent)]
    Timerange(#[from] TimerangeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_chain_backwards_shape() {
        let windows = chain_backwards(d(2024, 6, 30), 90, 30, 3).unwrap();
        assert_eq!(windows.len(), 3);

        // chronological numbering
        assert_eq!(windows[0].walk_num, 1);
        assert_eq!(windows[2].walk_num, 3);

        // last walk ends at the requested end date
        assert_eq!(windows[2].oos_period.end, d(2024, 6, 30));

        for w in &windows {
            // IS immediately precedes OOS
            assert_eq!(w.is_period.end, w.oos_period.start);
            assert_eq!((w.is_period.end - w.is_period.start).num_days(), 90);
            assert_eq!((w.oos_period.end - w.oos_period.start).num_days(), 30);
        }

        // contiguous chain: each OOS starts where the previous one ended
        for pair in windows.windows(2) {
            assert_eq!(pair[0].oos_period.end, pair[1].oos_period.start);
        }
    }

    #[test]
    fn test_chain_backwards_exact_dates() {
        let windows = chain_backwards(d(2024, 3, 1), 10, 5, 2).unwrap();
        assert_eq!(windows[1].oos_period.start, d(2024, 2, 25));
        assert_eq!(windows[1].is_period.start, d(2024, 2, 15));
        assert_eq!(windows[0].oos_period.end, d(2024, 2, 25));
        assert_eq!(windows[0].oos_period.start, d(2024, 2, 20));
        assert_eq!(windows[0].is_period.start, d(2024, 2, 10));
    }

    #[test]
    fn test_zero_walks_is_empty() {
        assert!(chain_backwards(d(2024, 1, 1), 30, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn test_zero_length_window_rejected() {
        assert_eq!(
            chain_backwards(d(2024, 1, 1), 0, 10, 1).unwrap_err(),
            WindowError::EmptyWindow
        );
        assert_eq!(forward_split(d(2024, 1, 1), 10, 0).unwrap_err(), WindowError::EmptyWindow);
    }

    #[test]
    fn test_forward_split_exact_dates() {
        let (is, oos) = forward_split(d(2024, 1, 1), 90, 30).unwrap();
        assert_eq!(is.start, d(2024, 1, 1));
        assert_eq!(is.end, d(2024, 3, 30));
        assert_eq!(oos.start, d(2024, 3, 31));
        assert_eq!(oos.end, d(2024, 4, 29));
        assert_eq!(is.days(), 90);
        assert_eq!(oos.days(), 30);
    }
}
