//! Collapse candidates from every strategy and page into the canonical set.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::shift::{ParsedCandidate, Shift, ShiftKey};

/// Sorted by `(start, end)`, one shift per key. When two candidates share a
/// key but not a label, the first one seen is kept.
pub fn canonicalize(candidates: impl IntoIterator<Item = ParsedCandidate>) -> Vec<Shift> {
    let mut by_key: BTreeMap<ShiftKey, Shift> = BTreeMap::new();

    for candidate in candidates {
        match by_key.entry(candidate.shift.key()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate.shift);
            }
            Entry::Occupied(kept) => {
                if kept.get().label != candidate.shift.label {
                    log::warn!(
                        "label conflict at {}: keeping '{}', dropping '{}' ({} on page {})",
                        kept.key(),
                        kept.get().label,
                        candidate.shift.label,
                        candidate.source,
                        candidate.page
                    );
                }
            }
        }
    }

    by_key.into_values().collect()
}
