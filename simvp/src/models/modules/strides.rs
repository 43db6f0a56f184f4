//! # Stride Schedules
//!
//! The spatial encoder alternates full-resolution and stride-2 stages, starting at full
//! resolution. The decoder walks the same path backwards so that its last stage runs at
//! the resolution of the first encoder stage, where the skip connection is taken.

use crate::config::StrideReversal;
use crate::error::{SimVpError, SimVpResult};

/// Generates the strides of `len` stages.
///
/// Without `reverse` the schedule is `[1, 2, 1, 2, ...]`. With `reverse` the result
/// depends on `reversal`:
///
/// - `Mirror`: the non-reversed schedule read backwards, e.g. `[1, 2, 1]` for 3 stages.
/// - `SwapStart`: `[2, 1, 2, 1, ...]`, e.g. `[2, 1, 2]` for 3 stages.
#[must_use]
pub fn stride_schedule(len: usize, reverse: bool, reversal: &StrideReversal) -> Vec<usize> {
    let forward = [1, 2].into_iter().cycle().take(len);
    match (reverse, reversal) {
        (false, _) => forward.collect(),
        (true, StrideReversal::Mirror) => {
            let mut strides: Vec<usize> = forward.collect();
            strides.reverse();
            strides
        }
        (true, StrideReversal::SwapStart) => [2, 1].into_iter().cycle().take(len).collect(),
    }
}

/// Total down- or upsampling factor of a schedule.
#[must_use]
pub fn scale_factor(strides: &[usize]) -> usize {
    strides.iter().product()
}

/// Checks that a decoder schedule undoes an encoder schedule.
///
/// The scale factors must match, and the decoder's last stride must equal the encoder's
/// first so that the final decoder stage runs at the skip connection's resolution.
///
/// # Errors
///
/// Returns `Err(SimVpError::StrideScheduleMismatch)` if either condition fails.
pub fn check_schedules(encoder: &[usize], decoder: &[usize]) -> SimVpResult<()> {
    let same_scale = encoder.len() == decoder.len() && scale_factor(encoder) == scale_factor(decoder);
    let skip_aligned = encoder.first() == decoder.last();

    if same_scale && skip_aligned {
        Ok(())
    } else {
        Err(SimVpError::StrideScheduleMismatch {
            encoder: encoder.to_vec(),
            decoder: decoder.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_schedules() {
        assert_eq!(stride_schedule(4, false, &StrideReversal::Mirror), vec![1, 2, 1, 2]);
        assert_eq!(stride_schedule(4, true, &StrideReversal::Mirror), vec![2, 1, 2, 1]);
        assert_eq!(stride_schedule(4, true, &StrideReversal::SwapStart), vec![2, 1, 2, 1]);
        assert_eq!(scale_factor(&stride_schedule(4, false, &StrideReversal::Mirror)), 4);
    }

    #[test]
    fn test_odd_schedules_differ_by_reversal() {
        let encoder = stride_schedule(3, false, &StrideReversal::Mirror);
        assert_eq!(encoder, vec![1, 2, 1]);

        let mirrored = stride_schedule(3, true, &StrideReversal::Mirror);
        assert_eq!(mirrored, vec![1, 2, 1]);
        assert!(check_schedules(&encoder, &mirrored).is_ok());

        let swapped = stride_schedule(3, true, &StrideReversal::SwapStart);
        assert_eq!(swapped, vec![2, 1, 2]);
        match check_schedules(&encoder, &swapped) {
            Err(SimVpError::StrideScheduleMismatch { encoder, decoder }) => {
                assert_eq!(encoder, vec![1, 2, 1]);
                assert_eq!(decoder, vec![2, 1, 2]);
            }
            _ => panic!("Expected StrideScheduleMismatch error"),
        }
    }

    #[test]
    fn test_mirror_always_composes() {
        for len in 1..=9 {
            let encoder = stride_schedule(len, false, &StrideReversal::Mirror);
            let decoder = stride_schedule(len, true, &StrideReversal::Mirror);
            assert!(check_schedules(&encoder, &decoder).is_ok(), "len = {len}");
        }
    }

    #[test]
    fn test_empty_schedule() {
        assert!(stride_schedule(0, false, &StrideReversal::Mirror).is_empty());
        assert_eq!(scale_factor(&[]), 1);
    }
}
