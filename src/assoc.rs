//! Association between tracked blobs and the blobs of the current frame.
//!
//! Every frame the tracker scores each (track, blob) pair with the weighted
//! dissimilarity from [`TrackedBlob::distance_to`] and then matches pairs
//! greedily, cheapest first. A full assignment solver would be overkill for
//! a matrix this small; implementations targeting larger frames should swap
//! the greedy loop for a minimum-weight matching behind the same interface.

use crate::{blob::Blob, tracked_blob::TrackedBlob, MAX_BLOBS};
use nalgebra::{SMatrix, Scalar};
use num::Float;

/// Pairwise dissimilarity between the track table (rows) and the blobs of
/// the current frame (columns). Stack allocated.
pub type CostMatrix = SMatrix<f32, MAX_BLOBS, MAX_BLOBS>;

/// Cost marking a pair as unmatchable: an inactive slot on either side, or a
/// pair already consumed by a match. Compares above every real threshold.
pub const INVALID_COST: f32 = f32::INFINITY;

/// Score every active (track, blob) pair.
///
/// Pairs where either side is inactive are filled with [`INVALID_COST`] so
/// the matching loop never considers them.
pub fn distance_matrix<T>(
    tracks: &[TrackedBlob<T>; MAX_BLOBS],
    blobs: &[Blob<T>; MAX_BLOBS],
) -> CostMatrix
where
    T: Float + Scalar,
{
    let mut costs = CostMatrix::from_element(INVALID_COST);

    for (row, track) in tracks.iter().enumerate() {
        if !track.is_active() {
            continue;
        }
        for (col, blob) in blobs.iter().enumerate() {
            if blob.is_active() {
                costs[(row, col)] = track.distance_to(blob);
            }
        }
    }

    costs
}

/// Find the cheapest pair still strictly under `threshold`.
///
/// Returns `None` when no matchable pair remains. Ties are broken by scan
/// order: lowest row first, then lowest column.
pub fn lowest_distance(
    costs: &CostMatrix,
    threshold: f32,
) -> Option<(usize, usize)> {
    let mut best = None;
    let mut lowest = threshold;

    for row in 0..MAX_BLOBS {
        for col in 0..MAX_BLOBS {
            let cost = costs[(row, col)];
            if cost < lowest {
                lowest = cost;
                best = Some((row, col));
            }
        }
    }

    best
}

/// Take a matched pair out of contention by marking its whole row and column
/// unmatchable.
pub fn invalidate(costs: &mut CostMatrix, row: usize, col: usize) {
    for k in 0..MAX_BLOBS {
        costs[(row, k)] = INVALID_COST;
        costs[(k, col)] = INVALID_COST;
    }
}
