/// Hungarian algorithm implementation for optimal assignment
///
/// Detection-to-track assignment is always solved globally: a greedy
/// nearest-match breaks identities when trajectories cross.
use ndarray::ArrayView2;
use pathfinding::prelude::{kuhn_munkres, Matrix};

/// Fixed-point scale used to hand float costs to the integer solver
const COST_SCALE: f64 = 1_000_000.0;
/// Weight given to non-finite costs so they are only chosen when unavoidable
const FORBIDDEN_WEIGHT: i64 = -1_000_000_000_000;

/// Result of Hungarian assignment algorithm
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentResult {
    /// Assignments as (detection_idx, track_idx) pairs, ordered by detection
    pub assignments: Vec<(usize, usize)>,
    /// Indices of unassigned detections, ascending
    pub unassigned_detections: Vec<usize>,
    /// Indices of unassigned tracks, ascending
    pub unassigned_tracks: Vec<usize>,
}

/// Hungarian assignment solver
pub struct HungarianSolver;

impl HungarianSolver {
    /// Solve assignment problem using Hungarian algorithm
    ///
    /// # Arguments
    /// * `cost_matrix` - Cost matrix where cost_matrix\[i\]\[j\] is the cost of assigning detection i to track j
    /// * `max_cost` - Maximum allowed cost for a valid assignment (assignments above this are rejected)
    ///
    /// # Returns
    /// AssignmentResult containing optimal assignments and unassigned indices
    pub fn solve(cost_matrix: ArrayView2<f32>, max_cost: f32) -> AssignmentResult {
        let pairs = Self::min_cost_pairs(cost_matrix);
        Self::gate(pairs, cost_matrix.nrows(), cost_matrix.ncols(), |d, t| {
            cost_matrix[[d, t]] <= max_cost
        })
    }

    /// Solve assignment problem maximizing total IoU
    ///
    /// # Arguments
    /// * `iou_matrix` - IoU matrix where iou_matrix\[i\]\[j\] is the IoU between detection i and track j
    /// * `iou_threshold` - Minimum IoU for a valid assignment; optimal pairs below it are split up
    pub fn solve_iou(iou_matrix: ArrayView2<f32>, iou_threshold: f32) -> AssignmentResult {
        let cost_matrix = iou_matrix.mapv(|iou| 1.0 - iou);
        let pairs = Self::min_cost_pairs(cost_matrix.view());
        Self::gate(pairs, iou_matrix.nrows(), iou_matrix.ncols(), |d, t| {
            iou_matrix[[d, t]] >= iou_threshold
        })
    }

    /// Optimal 1:1 pairing minimizing total cost, before any gating
    fn min_cost_pairs(cost_matrix: ArrayView2<f32>) -> Vec<(usize, usize)> {
        let num_detections = cost_matrix.nrows();
        let num_tracks = cost_matrix.ncols();

        if num_detections == 0 || num_tracks == 0 {
            return Vec::new();
        }

        // kuhn_munkres maximizes and needs rows <= columns: negate costs and
        // pad to a square matrix. Padding cells all weigh the same, so they
        // never change which real pairs are optimal.
        let size = num_detections.max(num_tracks);
        let mut weights = Matrix::new(size, size, 0i64);
        for ((i, j), &cost) in cost_matrix.indexed_iter() {
            weights[(i, j)] = if cost.is_finite() {
                -((cost as f64) * COST_SCALE).round() as i64
            } else {
                FORBIDDEN_WEIGHT
            };
        }

        let (_total, raw_assignments) = kuhn_munkres(&weights);

        raw_assignments
            .into_iter()
            .enumerate()
            .filter(|&(det_idx, track_idx)| det_idx < num_detections && track_idx < num_tracks)
            .collect()
    }

    /// Split optimal pairs into accepted assignments and unassigned indices
    fn gate(
        pairs: Vec<(usize, usize)>,
        num_detections: usize,
        num_tracks: usize,
        accept: impl Fn(usize, usize) -> bool,
    ) -> AssignmentResult {
        let mut assigned_detections = vec![false; num_detections];
        let mut assigned_tracks = vec![false; num_tracks];

        let assignments: Vec<(usize, usize)> = pairs
            .into_iter()
            .filter(|&(d, t)| accept(d, t))
            .inspect(|&(d, t)| {
                assigned_detections[d] = true;
                assigned_tracks[t] = true;
            })
            .collect();

        AssignmentResult {
            assignments,
            unassigned_detections: (0..num_detections)
                .filter(|&i| !assigned_detections[i])
                .collect(),
            unassigned_tracks: (0..num_tracks).filter(|&i| !assigned_tracks[i]).collect(),
        }
    }
}
