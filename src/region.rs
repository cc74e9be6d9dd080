// Region derivation: joins the canonical slice set with the track duration
// into the list of playable segments.
//
// Regions are throwaway values. They get recomputed whenever either input
// changes and nothing is allowed to hold one across a recompute.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

// Duration is None until the player has decoded the track, and a decoded
// duration of zero is as useless as no duration; both yield no regions even
// if slices already arrived. Whichever input lands second triggers the
// recompute, so arrival order doesn't matter.
pub fn synchronize(slices: &[f64], duration: Option<f64>) -> Vec<Region> {
    let Some(duration) = duration else {
        return Vec::new();
    };
    if duration <= 0.0 {
        return Vec::new();
    }

    // slices are sorted ascending, so anything past the end of the track is
    // a suffix; dropping it keeps the remaining regions contiguous
    let kept: Vec<f64> = slices.iter().copied().filter(|s| *s < duration).collect();

    kept.iter()
        .enumerate()
        .map(|(index, &start)| Region {
            index,
            start,
            end: kept.get(index + 1).copied().unwrap_or(duration),
        })
        .collect()
}
