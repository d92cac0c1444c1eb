//! Pairwise allelic distance between cgMLST profiles.
//!
//! The distance is the number of loci at which both profiles carry a call and
//! the calls differ. Loci where either side is a no-call are dropped from the
//! comparison entirely, so missing data never counts as a mismatch.

use crate::errors::DistanceError;
use crate::models::AlleleProfile;

///
/// Number of loci called in both profiles: the comparison base of
/// [`compute`].
///
pub fn shared_loci(a: &AlleleProfile, b: &AlleleProfile) -> Result<usize, DistanceError> {
    check_width(a, b)?;
    Ok(a
        .calls
        .iter()
        .zip(b.calls.iter())
        .filter(|(x, y)| x.is_some() && y.is_some())
        .count())
}

///
/// Count the differing calls between two profiles.
///
/// # Arguments
/// - a: first profile
/// - b: second profile, built against the same locus list
///
/// # Returns
/// The number of loci called in both profiles whose alleles differ, or
/// `DistanceError::InsufficientOverlap` when no locus is called in both.
///
pub fn compute(a: &AlleleProfile, b: &AlleleProfile) -> Result<u32, DistanceError> {
    check_width(a, b)?;

    let mut shared = 0usize;
    let mut differing = 0u32;
    for (x, y) in a.calls.iter().zip(b.calls.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            shared += 1;
            if x != y {
                differing += 1;
            }
        }
    }

    if shared == 0 {
        return Err(DistanceError::InsufficientOverlap);
    }
    Ok(differing)
}

///
/// Like [`compute`], but stops counting as soon as the distance exceeds
/// `limit` and returns `Ok(None)` in that case. The loop still has to see a
/// shared locus before it can report a distance, so a pair without overlap
/// fails with `InsufficientOverlap` even when `limit` is large.
///
pub fn compute_within(
    a: &AlleleProfile,
    b: &AlleleProfile,
    limit: u32,
) -> Result<Option<u32>, DistanceError> {
    check_width(a, b)?;

    let mut shared = false;
    let mut differing = 0u32;
    for (x, y) in a.calls.iter().zip(b.calls.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            shared = true;
            if x != y {
                differing += 1;
                if differing > limit {
                    return Ok(None);
                }
            }
        }
    }

    if !shared {
        return Err(DistanceError::InsufficientOverlap);
    }
    Ok(Some(differing))
}

fn check_width(a: &AlleleProfile, b: &AlleleProfile) -> Result<(), DistanceError> {
    if a.len() != b.len() {
        return Err(DistanceError::LengthMismatch(a.len(), b.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlleleCall;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn profile(sample: &str, calls: Vec<AlleleCall>) -> AlleleProfile {
        AlleleProfile::new(sample, calls)
    }

    #[rstest]
    fn test_identical_profiles_have_zero_distance() {
        let a = profile("a", vec![Some(1), Some(2), Some(3)]);
        assert_eq!(compute(&a, &a.clone()), Ok(0));
    }

    #[rstest]
    fn test_counts_differing_calls() {
        let a = profile("a", vec![Some(1), Some(2), Some(3), Some(4)]);
        let b = profile("b", vec![Some(1), Some(5), Some(3), Some(6)]);
        assert_eq!(compute(&a, &b), Ok(2));
    }

    #[rstest]
    fn test_no_calls_are_excluded_from_both_sides() {
        let a = profile("a", vec![None, Some(2), Some(3), Some(9)]);
        let b = profile("b", vec![Some(1), None, Some(3), Some(4)]);

        assert_eq!(compute(&a, &b), Ok(1));
        assert_eq!(shared_loci(&a, &b), Ok(2));
    }

    #[rstest]
    fn test_distance_is_symmetric() {
        let a = profile("a", vec![Some(1), None, Some(7), Some(2), Some(2)]);
        let b = profile("b", vec![Some(3), Some(4), None, Some(2), Some(1)]);
        assert_eq!(compute(&a, &b), compute(&b, &a));
        assert_eq!(shared_loci(&a, &b), shared_loci(&b, &a));
    }

    #[rstest]
    fn test_no_overlap_is_an_error() {
        let a = profile("a", vec![Some(1), None]);
        let b = profile("b", vec![None, Some(1)]);
        assert_eq!(compute(&a, &b), Err(DistanceError::InsufficientOverlap));
        assert_eq!(
            compute_within(&a, &b, 100),
            Err(DistanceError::InsufficientOverlap)
        );
    }

    #[rstest]
    fn test_width_mismatch_is_an_error() {
        let a = profile("a", vec![Some(1)]);
        let b = profile("b", vec![Some(1), Some(2)]);
        assert_eq!(compute(&a, &b), Err(DistanceError::LengthMismatch(1, 2)));
    }

    #[rstest]
    #[case(0, None)]
    #[case(1, None)]
    #[case(2, Some(2))]
    #[case(10, Some(2))]
    fn test_compute_within(#[case] limit: u32, #[case] expected: Option<u32>) {
        let a = profile("a", vec![Some(1), Some(2), Some(3)]);
        let b = profile("b", vec![Some(9), Some(2), Some(8)]);
        assert_eq!(compute_within(&a, &b, limit), Ok(expected));
    }
}
