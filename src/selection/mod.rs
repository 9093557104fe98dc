//! Selection of the best ranking per group of genes of interest
//!
//! Every (dataset, clustering) combination yields one ranking per group. The
//! selector keeps, per group, the ranking with the highest AUSR and the mean
//! AUSR of all rankings offered.

use std::collections::BTreeMap;

use crate::ranking::Ranking;
use crate::stats::RunningMean;

/// Minimum number of genes of interest a dataset must contain for a group to
/// be ranked against it
pub const DEFAULT_MIN_SUPPORT: usize = 5;

/// Best ranking and mean AUSR of one group
#[derive(Debug, Clone, Default)]
pub struct GoiResult {
    best: Option<Ranking>,
    ausr: RunningMean,
}

impl GoiResult {
    /// Account for a ranking; it is kept if its AUSR beats the current best.
    /// On ties the earlier ranking stays.
    pub fn add(&mut self, ranking: Ranking) {
        self.ausr.push(ranking.ausr());
        let better = match &self.best {
            Some(best) => ranking.ausr() > best.ausr(),
            None => true,
        };
        if better {
            self.best = Some(ranking);
        }
    }

    pub fn best(&self) -> Option<&Ranking> {
        self.best.as_ref()
    }

    pub fn into_best(self) -> Option<Ranking> {
        self.best
    }

    /// Mean AUSR of all rankings added
    pub fn average_ausr(&self) -> Option<f64> {
        self.ausr.mean()
    }

    /// Number of rankings added
    pub fn n_rankings(&self) -> usize {
        self.ausr.count()
    }
}

/// Outcome of offering one combination to the selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Offer {
    /// Too few genes of interest in the dataset; nothing recorded
    Skipped { found: usize },
    /// Recorded; `best` tells whether it is the new best of its group
    Recorded { ausr: f64, best: bool },
}

/// Aggregates rankings across combinations, keyed by group index
#[derive(Debug, Clone)]
pub struct RankingSelector {
    min_support: usize,
    results: BTreeMap<usize, GoiResult>,
}

impl Default for RankingSelector {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SUPPORT)
    }
}

impl RankingSelector {
    pub fn new(min_support: usize) -> Self {
        Self {
            min_support,
            results: BTreeMap::new(),
        }
    }

    pub fn min_support(&self) -> usize {
        self.min_support
    }

    /// Whether a group with `present` genes in a dataset is rankable
    pub fn is_supported(&self, present: usize) -> bool {
        present >= self.min_support
    }

    /// Offer the ranking of group `group` for one combination.
    ///
    /// Rankings whose group has fewer than the minimum support of genes in
    /// the dataset are skipped and leave no trace.
    pub fn offer(&mut self, group: usize, ranking: Ranking) -> Offer {
        let found = ranking.goi().len();
        if !self.is_supported(found) {
            return Offer::Skipped { found };
        }
        let ausr = ranking.ausr();
        let result = self.results.entry(group).or_default();
        let previous = result.best().map(|b| b.ausr());
        result.add(ranking);
        Offer::Recorded {
            ausr,
            best: previous.map_or(true, |p| ausr > p),
        }
    }

    pub fn result(&self, group: usize) -> Option<&GoiResult> {
        self.results.get(&group)
    }

    /// Results by group index, ascending
    pub fn results(&self) -> impl Iterator<Item = (usize, &GoiResult)> {
        self.results.iter().map(|(&g, r)| (g, r))
    }

    pub fn into_results(self) -> BTreeMap<usize, GoiResult> {
        self.results
    }
}
