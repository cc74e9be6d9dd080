// Slice normalization: raw analyzer output (or hand-edited timestamps) in,
// canonical slice set out.
//
// The canonical form is what the rest of the app relies on: strictly
// increasing, no two values within SLICE_EPSILON of each other, 0.0 as the
// first element whenever non-empty, at most NUM_PADS entries.

use crate::shared::{NUM_PADS, SLICE_EPSILON};

pub fn normalize(raw: &[f64]) -> Vec<f64> {
    // the analyzer boundary is json; NaN or negative garbage must not
    // poison the sort
    let mut times: Vec<f64> = raw
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .collect();
    times.sort_by(f64::total_cmp);

    // collapse anything closer than epsilon to the previous kept value
    let mut slices: Vec<f64> = Vec::with_capacity(times.len());
    for t in times {
        match slices.last() {
            Some(&prev) if t - prev < SLICE_EPSILON => {}
            _ => slices.push(t),
        }
    }

    // zero-anchor: the first slice is always exactly 0.0
    if let Some(&first) = slices.first() {
        if first < SLICE_EPSILON {
            slices[0] = 0.0;
        } else {
            slices.insert(0, 0.0);
        }
    }

    slices.truncate(NUM_PADS);
    slices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_set() {
        assert_eq!(normalize(&[]), Vec::<f64>::new());
    }

    #[test]
    fn dedups_sorts_and_zero_anchors() {
        assert_eq!(normalize(&[0.2, 0.2, 5.0, 1.0]), vec![0.0, 0.2, 1.0, 5.0]);
    }

    #[test]
    fn sub_epsilon_neighbor_of_zero_collapses() {
        assert_eq!(normalize(&[0.0, 0.03, 2.0]), vec![0.0, 2.0]);
    }

    #[test]
    fn near_zero_first_slice_snaps_to_zero() {
        assert_eq!(normalize(&[0.03, 2.0]), vec![0.0, 2.0]);
    }

    #[test]
    fn garbage_values_are_dropped() {
        assert_eq!(normalize(&[f64::NAN, -3.0, 1.0, f64::INFINITY]), vec![0.0, 1.0]);
    }

    #[test]
    fn caps_at_sixteen_after_anchoring() {
        let raw: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let out = normalize(&raw);
        assert_eq!(out.len(), 16);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[15], 15.0); // 0.0 plus the first 15 raw values
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = vec![3.0, 0.01, 0.04, 1.5, 1.52, 9.9, 9.9];
        let once = normalize(&raw);
        assert_eq!(normalize(&once), once);
    }
}
