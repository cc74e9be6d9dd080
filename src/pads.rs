// The 16-slot trigger surface. Binding is purely positional: pad 0 plays the
// earliest region, whatever key happens to sit on pad 0. The key legend is a
// fixed label layer that never changes at runtime.

use crate::region::Region;
use crate::shared::NUM_PADS;

// the 4x4 grid, row by row
pub const PAD_KEYS: [char; NUM_PADS] = [
    '1', '2', '3', '4',
    'q', 'w', 'e', 'r',
    'a', 's', 'd', 'f',
    'z', 'x', 'c', 'v',
];

// A pad is live iff a region exists at its index; everything past the end of
// the region list is inert and triggering it is a no-op.
pub fn resolve(slot: usize, regions: &[Region]) -> Option<&Region> {
    regions.get(slot)
}

pub fn key_to_slot(c: char) -> Option<usize> {
    let c = c.to_ascii_lowercase();
    PAD_KEYS.iter().position(|&k| k == c)
}
