//! Final, standardized scores
//!
//! Raw scores are turned into means over the cluster's genes of interest and
//! then standardized within the cluster, so that clusters of different sizes
//! and different numbers of genes of interest become comparable.
//!
//! Leave-one-out evaluation needs the same computation with one gene of
//! interest held out. [`finalize_cluster`] covers both cases and never writes
//! to shared state; callers decide where the scores go.

use super::context::ClusterContext;
use super::view::{scored, Score, ScoreVector};
use crate::correlation::CorrelationMatrix;
use crate::error::{MorphError, Result};
use crate::stats::mean_and_sd;

/// Standardized scores of one cluster, as `(gene, score)` pairs.
///
/// Without exclusion the scored genes are the candidates and
/// `score(i) = raw(i) / g`. With `exclusion = Some(e)`, `e` must be one of the
/// cluster's genes of interest; the scored genes are the candidates plus `e`
/// and `score(i) = (raw(i) - corr(i, e)) / (g - 1)`. Genes of interest other
/// than `e` are never scored.
///
/// The scores are then shifted and scaled to zero mean and unit sample
/// standard deviation. One undefined entry leaves the whole set unscored, as
/// do fewer than two entries or entries that do not vary.
///
/// An inert cluster yields no pairs.
pub fn finalize_cluster(
    context: &ClusterContext,
    raw: &ScoreVector,
    correlations: &CorrelationMatrix,
    exclusion: Option<usize>,
) -> Result<Vec<(usize, Score)>> {
    if !context.is_active() {
        return Ok(Vec::new());
    }

    let goi_count = context.goi_count();
    let (members, divisor, excluded_column) = match exclusion {
        None => (context.candidates().to_vec(), goi_count, None),
        Some(e) => {
            let column = context.goi_column(e).ok_or_else(|| {
                MorphError::invariant(format!(
                    "excluded gene {} is not a gene of interest of cluster {}",
                    e,
                    context.cluster()
                ))
            })?;
            let mut members = context.candidates().to_vec();
            members.push(e);
            (members, goi_count - 1, Some(column))
        }
    };

    // Holding out the only gene of interest leaves nothing to score against
    if divisor == 0 {
        return Ok(members.into_iter().map(|g| (g, None)).collect());
    }

    let mut scores: Vec<Score> = members
        .iter()
        .map(|&i| {
            let r = raw.get(i)?;
            let adjusted = match excluded_column {
                Some(col) => r - correlations.get(i, col),
                None => r,
            };
            scored(adjusted / divisor as f64)
        })
        .collect();

    standardize(&mut scores);

    Ok(members.into_iter().zip(scores).collect())
}

/// Shift and scale the scores to zero mean, unit standard deviation
fn standardize(scores: &mut [Score]) {
    let normal = scores
        .iter()
        .copied()
        .collect::<Option<Vec<f64>>>()
        .and_then(|values| mean_and_sd(&values))
        .filter(|&(_, sd)| sd > 0.0 && sd.is_finite());

    match normal {
        Some((mean, sd)) => {
            for s in scores.iter_mut() {
                *s = s.and_then(|v| scored((v - mean) / sd));
            }
        }
        None => scores.iter_mut().for_each(|s| *s = None),
    }
}

/// Final scores of a whole ranking: every active cluster finalized without
/// exclusion. Genes of interest and genes of inert clusters stay unscored.
pub fn finalize_ranking(
    contexts: &[ClusterContext],
    raw: &ScoreVector,
    correlations: &CorrelationMatrix,
) -> Result<ScoreVector> {
    let mut scores = ScoreVector::unscored(raw.len());
    for context in contexts {
        scores.scatter(finalize_cluster(context, raw, correlations, None)?);
    }
    Ok(scores)
}
