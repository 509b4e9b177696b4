use thiserror::Error;

/// Longest sequence `range_step` will materialize.
pub const MAX_RANGE_LEN: usize = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("step cannot be zero")]
    ZeroStep,
    #[error("range of {0} elements exceeds the limit of {MAX_RANGE_LEN}")]
    TooLong(u128),
}

/// `[0, stop)` with unit step. Empty if the sequence would be too long.
pub fn range(stop: i64) -> Vec<i64> {
    range_step(0, stop, 1).unwrap_or_default()
}

/// `[start, stop)` with unit step. Empty if the sequence would be too long.
pub fn range_from(start: i64, stop: i64) -> Vec<i64> {
    range_step(start, stop, 1).unwrap_or_default()
}

/// Arithmetic sequence from `start` towards `stop` (exclusive). Negative steps count down.
///
/// Length is `max(ceil((stop - start) / step), 0)`, so an interval that points the wrong way
/// for the step yields an empty sequence rather than an error.
pub fn range_step(start: i64, stop: i64, step: i64) -> Result<Vec<i64>, RangeError> {
    if step == 0 {
        return Err(RangeError::ZeroStep);
    }
    // i128 holds any i64 difference without overflow.
    let len = ceil_div(i128::from(stop) - i128::from(start), i128::from(step)).max(0) as u128;
    if len > MAX_RANGE_LEN as u128 {
        return Err(RangeError::TooLong(len));
    }
    let len = len as i64;
    Ok((0..len).map(|i| start + i * step).collect())
}

fn ceil_div(num: i128, den: i128) -> i128 {
    let q = num / den;
    let r = num % den;
    if r != 0 && ((r > 0) == (den > 0)) {
        q + 1
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_RANGE_LEN, RangeError, range, range_from, range_step};

    #[test]
    fn single_argument_counts_from_zero() {
        assert_eq!(range(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(range(5), range_step(0, 5, 1).unwrap());
        assert!(range(0).is_empty());
        assert!(range(-3).is_empty());
    }

    #[test]
    fn empty_when_start_meets_stop() {
        assert!(range_from(2, 2).is_empty());
        assert!(range_from(7, 2).is_empty());
        assert!(range_step(2, 7, -1).unwrap().is_empty());
    }

    #[test]
    fn zero_step_is_rejected() {
        assert_eq!(range_step(0, 0, 0), Err(RangeError::ZeroStep));
        assert_eq!(range_step(0, 10, 0), Err(RangeError::ZeroStep));
    }

    #[test]
    fn stepped_sequences_stay_below_stop() {
        assert_eq!(range_step(0, 10, 3).unwrap(), vec![0, 3, 6, 9]);
        assert_eq!(range_step(1, 10, 3).unwrap(), vec![1, 4, 7]);
        assert_eq!(range_step(-4, 4, 4).unwrap(), vec![-4, 0]);
    }

    #[test]
    fn negative_steps_count_down() {
        assert_eq!(range_step(5, 0, -2).unwrap(), vec![5, 3, 1]);
        assert_eq!(range_step(0, -3, -1).unwrap(), vec![0, -1, -2]);
        // `range(0, 0, -1)` is empty, only a zero step fails.
        assert!(range_step(0, 0, -1).unwrap().is_empty());
    }

    #[test]
    fn length_matches_ceiling_formula() {
        for start in -6..6 {
            for stop in -6..6 {
                for step in [1, 2, 3, -1, -2, 5] {
                    let out = range_step(start, stop, step).unwrap();
                    let expected = (((stop - start) as f64) / step as f64).ceil().max(0.0) as usize;
                    assert_eq!(out.len(), expected, "start={start} stop={stop} step={step}");
                }
            }
        }
    }

    #[test]
    fn extreme_bounds_error_instead_of_overflowing() {
        let err = range_step(i64::MIN, i64::MAX, 1).unwrap_err();
        assert_eq!(err, RangeError::TooLong(u128::from(u64::MAX)));
        assert!(matches!(range_step(i64::MAX, i64::MIN, -1), Err(RangeError::TooLong(_))));
        assert!(range_from(i64::MIN, i64::MAX).is_empty());
        // Huge spans with huge steps stay small.
        assert_eq!(range_step(i64::MIN, i64::MAX, i64::MAX).unwrap().len(), 3);
    }

    #[test]
    fn length_limit_is_inclusive() {
        let limit = MAX_RANGE_LEN as i64;
        assert_eq!(range_step(0, limit, 1).unwrap().len(), MAX_RANGE_LEN);
        assert_eq!(
            range_step(0, limit + 1, 1),
            Err(RangeError::TooLong(MAX_RANGE_LEN as u128 + 1))
        );
    }
}
