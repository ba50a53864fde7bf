//! # Access Module
//!
//! Computes which playlist items a viewer may open. The computation is
//! derived in full from the ordered item list and the completion set on
//! every call; callers re-run it whenever a completion event fires instead
//! of patching previous output.

use crate::types::{AccessMode, ItemAvailability, PlaylistEntry};
use std::collections::HashSet;

/// Computes availability and completion flags for every item of a playlist.
///
/// Rules, in order of precedence:
/// - the playlist owner sees every item unlocked regardless of mode,
/// - `Any` mode unlocks every item,
/// - `Sequential` mode unlocks item 0 plus every item whose predecessor is
///   in `completed_ids`.
///
/// `is_completed` is membership in `completed_ids` in all cases. An empty
/// item list yields an empty result.
pub fn compute_availability(
    items: &[PlaylistEntry],
    access_mode: AccessMode,
    completed_ids: &HashSet<i64>,
    viewer_is_owner: bool,
) -> Vec<ItemAvailability> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let is_available = viewer_is_owner
                || match access_mode {
                    AccessMode::Any => true,
                    AccessMode::Sequential => {
                        index == 0 || completed_ids.contains(&items[index - 1].id)
                    }
                };
            ItemAvailability {
                id: item.id,
                is_available,
                is_completed: completed_ids.contains(&item.id),
            }
        })
        .collect()
}
