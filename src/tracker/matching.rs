//! Matching utilities: cost matrix construction, no-match padding, and
//! minimum-cost linear assignment.

use ndarray::Array2;

use crate::tracker::geometry::Point;

/// Compute the Euclidean distance matrix between track positions and
/// detection centroids.
///
/// Returns a matrix of shape (N, M) where N is the number of tracks and
/// M the number of detections.
pub fn distance_matrix(track_positions: &[Point], detections: &[Point]) -> Array2<f32> {
    let mut dists = Array2::zeros((track_positions.len(), detections.len()));
    for (i, t) in track_positions.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            dists[[i, j]] = t.distance(d);
        }
    }
    dists
}

/// Extend an N x M cost matrix to N x (M+N) by appending one synthetic
/// "no-match" column per track, priced at the distance threshold.
///
/// A complete matching over the padded matrix always exists, and no track
/// can end up matched to a real detection costing more than the threshold:
/// its own synthetic column is always the cheaper choice.
pub fn pad_no_match(cost: &Array2<f32>, dist_thresh: f32) -> Array2<f32> {
    let (n, m) = cost.dim();
    let mut padded = Array2::from_elem((n, m + n), dist_thresh);
    for i in 0..n {
        for j in 0..m {
            padded[[i, j]] = cost[[i, j]];
        }
    }
    padded
}

/// Outcome of one assignment solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult {
    /// (track index, detection index) pairs
    pub matches: Vec<(usize, usize)>,
    /// Track indices routed to a synthetic no-match column
    pub unmatched_tracks: Vec<usize>,
    /// Detection indices no track was assigned to
    pub unmatched_detections: Vec<usize>,
}

/// Solve a padded cost matrix as a minimum-total-cost one-to-one matching.
///
/// Columns at `real_cols` and beyond are the synthetic no-match block; a
/// row landing there is an unmatched track. The solve is globally optimal
/// and deterministic, so identical inputs always produce the identical
/// assignment.
pub fn linear_assignment(cost_matrix: &Array2<f32>, real_cols: usize) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..real_cols).collect(),
        };
    }

    if real_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: vec![],
        };
    }

    // lapjv wants a square matrix; virtual rows get a constant large cost
    // so they only absorb the leftover columns.
    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), 1e6);
    for i in 0..num_rows {
        for j in 0..num_cols {
            padded[[i, j]] = cost_matrix[[i, j]] as f64;
        }
    }

    let result = lapjv::lapjv(&padded);

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask: Vec<bool> = vec![true; real_cols];

    match result {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate() {
                if row_idx >= num_rows {
                    continue;
                }
                if col_idx < real_cols {
                    matches.push((row_idx, col_idx));
                    unmatched_detections_mask[col_idx] = false;
                } else {
                    unmatched_tracks.push(row_idx);
                }
            }
        }
        Err(_) => {
            unmatched_tracks = (0..num_rows).collect();
        }
    }

    let unmatched_detections: Vec<usize> = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| if u { Some(i) } else { None })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}
