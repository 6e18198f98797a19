//! Vector similarity helpers.

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for mismatched dimensions or zero-norm input rather than
/// NaN, so callers can sort scores without special cases.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Scales a vector to unit length in place. Zero vectors are left as is.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn degenerate_input_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn normalize_produces_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn self_similarity_is_maximal(
            v in prop::collection::vec(-100.0f32..100.0, 1..32),
            w in prop::collection::vec(-100.0f32..100.0, 1..32),
        ) {
            prop_assume!(v.iter().any(|x| x.abs() > 1e-3));
            let own = cosine_similarity(&v, &v);
            let other = cosine_similarity(&v, &w);
            prop_assert!(own >= other - 1e-5);
        }

        #[test]
        fn similarity_is_bounded(
            v in prop::collection::vec(-100.0f32..100.0, 8),
            w in prop::collection::vec(-100.0f32..100.0, 8),
        ) {
            let s = cosine_similarity(&v, &w);
            prop_assert!((-1.0..=1.0).contains(&s));
        }
    }
}
