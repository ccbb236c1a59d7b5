//! Rank selection by the elbow of the reconstruction-error curve.

use crate::cp::{cp_decompose, max_supported_rank, CpInit, CpOptions};
use crate::tensor::InteractionTensor;

use indicatif::ProgressBar;
use log::info;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct ElbowPoint {
    pub rank: usize,
    pub error: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ElbowResult {
    pub curve: Vec<ElbowPoint>,
    pub selected_rank: usize,
}

///
/// Sweep ranks `1..=max_rank`, fitting `runs` models per rank and
/// keeping the best error, then pick the curve point farthest from
/// the chord between the endpoints. A max rank beyond what the
/// tensor dimensions support is clamped, not an error.
///
/// The first fit of each rank uses `opts.init`; restarts are random
/// so they actually explore.
///
pub fn elbow_rank_selection(
    tensor: &InteractionTensor,
    max_rank: usize,
    runs: usize,
    opts: &CpOptions,
) -> anyhow::Result<ElbowResult> {
    if max_rank < 1 {
        anyhow::bail!("max rank must be at least 1");
    }
    let runs = runs.max(1);

    let supported = max_supported_rank(tensor.dims());
    let max_rank = if max_rank > supported {
        info!(
            "max rank {} clamped to {} for a {:?} tensor",
            max_rank,
            supported,
            tensor.dims()
        );
        supported
    } else {
        max_rank
    };

    let pb = ProgressBar::new((max_rank * runs) as u64);
    let mut curve = Vec::with_capacity(max_rank);

    for rank in 1..=max_rank {
        let mut best = f32::INFINITY;

        for run in 0..runs {
            let run_opts = CpOptions {
                rank,
                init: if run == 0 { opts.init } else { CpInit::Random },
                ..*opts
            };
            let model = cp_decompose(tensor, &run_opts)?;
            best = best.min(model.error);
            pb.inc(1);
        }

        curve.push(ElbowPoint { rank, error: best });
    }
    pb.finish_and_clear();

    let selected_rank = pick_elbow(&curve);
    info!("elbow selected rank {}", selected_rank);

    Ok(ElbowResult {
        curve,
        selected_rank,
    })
}

///
/// The point with the largest perpendicular distance to the chord
/// joining the first and last curve points, on axes normalized to
/// `[0,1]`. Falls back to the smallest error when the curve is flat.
///
pub fn pick_elbow(curve: &[ElbowPoint]) -> usize {
    if curve.len() == 1 {
        return curve[0].rank;
    }

    let first = &curve[0];
    let last = &curve[curve.len() - 1];

    let x_span = (last.rank as f32 - first.rank as f32).max(1.0);
    let y_span = (first.error - last.error).abs();

    if y_span <= 0.0 {
        return curve
            .iter()
            .min_by(|a, b| {
                a.error
                    .partial_cmp(&b.error)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|p| p.rank)
            .unwrap_or(first.rank);
    }

    let mut best_rank = first.rank;
    let mut best_dist = f32::NEG_INFINITY;

    // chord runs from (0, 0) to (1, ±1) depending on curve direction
    let direction = (last.error - first.error).signum();

    for point in curve {
        let xx = (point.rank as f32 - first.rank as f32) / x_span;
        let yy = (point.error - first.error) / y_span;

        let chord_y = direction * xx;
        let dist = (yy - chord_y).abs();

        if dist > best_dist {
            best_dist = dist;
            best_rank = point.rank;
        }
    }
    best_rank
}
