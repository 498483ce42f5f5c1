//! Precision, recall and F1 at k for word translation retrieval
//!
//! A source word can have several gold translations. Each dictionary row is checked on its own
//! against its source word's top-k list, then the rows are folded per source word with the
//! credit capped at one hit, so finding two translations of "cat" still counts as one word
//! translated.
//!
//! Precision divides by `n_relevant`: the number of dictionary rows whose top-k list contains
//! *any* target word from the dictionary, not necessarily the row's own. That is looser than
//! textbook precision but it is the figure these evaluations have always reported.

use std::collections::BTreeMap;
use ndarray::prelude::*;
use ndarray::Data;
use serde::Serialize;

use dictionary::DictionaryIndex;
use errors::*;
use farm::{PlainMap, PlainSet};

/// Everything measured at one cutoff
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoffMetrics {
    pub k: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Dictionary rows whose top-k list holds some gold target word
    pub n_relevant: usize,
    /// Source words with a (capped) hit
    pub hits: usize,
    /// Capped hit for each distinct source id
    pub matching: BTreeMap<usize, bool>,
    /// One entry per dictionary row: the source id and its capped hit as of that row
    pub trace: Vec<(usize, bool)>,
}

impl CutoffMetrics {
    /// `precision_at_k`, `recall_at_k` and `f1score_at_k`, in that order
    pub fn named(&self) -> Vec<(String, f64)> {
        vec![
            (format!("precision_at_{}", self.k), self.precision),
            (format!("recall_at_{}", self.k), self.recall),
            (format!("f1score_at_{}", self.k), self.f1),
        ]
    }
}

/// Scores top-k predictions against one gold dictionary
pub struct MetricAggregator<'d> {
    dico: &'d DictionaryIndex,
    gold_targets: PlainSet<usize>,
}

impl<'d> MetricAggregator<'d> {
    pub fn new(dico: &'d DictionaryIndex) -> MetricAggregator<'d> {
        let gold_targets = dico.pairs().iter().map(|&(_, id2)| id2).collect();
        MetricAggregator { dico, gold_targets }
    }

    /// Every target id that is a gold translation of some source word
    pub fn gold_targets(&self) -> &PlainSet<usize> {
        &self.gold_targets
    }

    /// Metrics at each cutoff, in the order given.
    ///
    /// Row `i` of `top_matches` holds the ranked target ids for `query_ids[i]`. Every source id
    /// in the dictionary must be among the queries.
    pub fn evaluate<S>(&self, query_ids: &[usize], top_matches: &ArrayBase<S, Ix2>, cutoffs: &[usize])
        -> Result<Vec<CutoffMetrics>>
        where S: Data<Elem=usize> {
        let rows = self.query_rows(query_ids, top_matches.nrows())?;
        cutoffs.iter().map(|&k| self.at_k(&rows, top_matches, k)).collect()
    }

    /// Which row of the top-k matrix belongs to each dictionary row
    fn query_rows(&self, query_ids: &[usize], n_rows: usize) -> Result<Vec<usize>> {
        if query_ids.len() != n_rows {
            return Err(Error::InvalidDimensions(format!(
                "{} query ids for {} rows of matches", query_ids.len(), n_rows)));
        }
        let mut row_of: PlainMap<usize, usize> = PlainMap::default();
        for (row, &id) in query_ids.iter().enumerate() {
            row_of.entry(id).or_insert(row);
        }
        self.dico.pairs().iter().map(|&(id1, _)| {
            row_of.get(&id1).cloned().ok_or_else(|| Error::InvalidDimensions(format!(
                "source id {} is in the dictionary but was not queried", id1)))
        }).collect()
    }

    fn at_k<S>(&self, rows: &[usize], top_matches: &ArrayBase<S, Ix2>, k: usize) -> Result<CutoffMetrics>
        where S: Data<Elem=usize> {
        let top_k_matches = top_matches.slice(s![.., ..::std::cmp::min(k, top_matches.ncols())]);

        let mut n_relevant = 0;
        let mut all_gold = 0;
        let mut matching: BTreeMap<usize, bool> = BTreeMap::new();
        let mut trace = Vec::with_capacity(rows.len());
        for (&(id1, id2), &row) in self.dico.pairs().iter().zip(rows) {
            let predictions = top_k_matches.row(row);
            if predictions.iter().any(|p| self.gold_targets.contains(p)) {
                n_relevant += 1;
            }
            if predictions.iter().all(|p| self.gold_targets.contains(p)) {
                all_gold += 1;
            }
            let hit = predictions.iter().any(|&p| p == id2);
            let capped = {
                let entry = matching.entry(id1).or_insert(false);
                *entry = *entry || hit;
                *entry
            };
            trace.push((id1, capped));
        }
        debug!("k = {}: {} gold targets, {} of {} rows relevant, {} rows predict only gold targets",
               k, self.gold_targets.len(), n_relevant, rows.len(), all_gold);

        let hits = matching.values().filter(|&&m| m).count();
        let precision = if n_relevant == 0 { 0.0 } else { 100.0 * hits as f64 / n_relevant as f64 };
        let recall = 100.0 * hits as f64 / matching.len() as f64;
        if precision + recall == 0.0 {
            return Err(Error::DegenerateEvaluation { k });
        }
        let f1 = 2.0 * (precision * recall) / (precision + recall);
        Ok(CutoffMetrics { k, precision, recall, f1, n_relevant, hits, matching, trace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dictionary::RawDictionary;
    use vocab::Vocabulary;

    /// Source words s0..s3, target words t0..t5
    fn index(pairs: &[(usize, usize)]) -> DictionaryIndex {
        let v1 = Vocabulary::from_words((0..4).map(|i| format!("s{}", i)));
        let v2 = Vocabulary::from_words((0..6).map(|i| format!("t{}", i)));
        let raw = RawDictionary::from_pairs(pairs.iter()
            .map(|&(a, b)| (format!("s{}", a), format!("t{}", b)))
            .collect());
        DictionaryIndex::build(&raw, &v1, &v2).unwrap()
    }

    #[test]
    fn test_perfect_retrieval() {
        let dico = index(&[(0, 0), (1, 1)]);
        let top = array![[0, 1], [1, 0]];
        let metrics = MetricAggregator::new(&dico).evaluate(&[0, 1], &top, &[1]).unwrap();
        assert_eq!(metrics[0].precision, 100.0);
        assert_eq!(metrics[0].recall, 100.0);
        assert_eq!(metrics[0].f1, 100.0);
        assert_eq!(metrics[0].named()[2], ("f1score_at_1".to_string(), 100.0));
    }

    #[test]
    fn test_multiple_translations_count_once() {
        // s0 has two gold translations and both are retrieved
        let dico = index(&[(0, 0), (0, 1), (1, 2)]);
        let top = array![[1, 0, 5], [4, 3, 5]];
        let metrics = MetricAggregator::new(&dico).evaluate(&[0, 1], &top, &[2]).unwrap();
        let at2 = &metrics[0];
        assert_eq!(at2.hits, 1);
        assert_eq!(at2.matching.get(&0), Some(&true));
        assert_eq!(at2.matching.get(&1), Some(&false));
        assert_eq!(at2.trace, vec![(0, true), (0, true), (1, false)]);
        // Rows, not words: both s0 rows are relevant
        assert_eq!(at2.n_relevant, 2);
        assert_eq!(at2.precision, 50.0);
        assert_eq!(at2.recall, 50.0);
    }

    #[test]
    fn test_trace_follows_running_cap() {
        // The first s0 row misses and the second hits
        let dico = index(&[(0, 3), (0, 0)]);
        let top = array![[0, 1]];
        let metrics = MetricAggregator::new(&dico).evaluate(&[0], &top, &[1]).unwrap();
        assert_eq!(metrics[0].trace, vec![(0, false), (0, true)]);
        assert_eq!(metrics[0].matching.len(), 1);
        assert_eq!(metrics[0].recall, 100.0);
    }

    #[test]
    fn test_relevance_uses_any_gold_target() {
        // s1 predicts t0, which is gold for s0 but not for s1
        let dico = index(&[(0, 0), (1, 1)]);
        let top = array![[0], [0]];
        let metrics = MetricAggregator::new(&dico).evaluate(&[0, 1], &top, &[1]).unwrap();
        assert_eq!(metrics[0].n_relevant, 2);
        assert_eq!(metrics[0].precision, 50.0);
        assert_eq!(metrics[0].recall, 50.0);

        // t5 is nobody's translation, so that row drops out of the denominator
        let top = array![[0], [5]];
        let metrics = MetricAggregator::new(&dico).evaluate(&[0, 1], &top, &[1]).unwrap();
        assert_eq!(metrics[0].n_relevant, 1);
        assert_eq!(metrics[0].precision, 100.0);
        assert_eq!(metrics[0].recall, 50.0);
        assert_abs_diff_eq!(metrics[0].f1, 2.0 * 100.0 * 50.0 / 150.0, epsilon = 1e-12);
    }

    #[test]
    fn test_recall_grows_with_k() {
        let dico = index(&[(0, 2), (1, 4), (2, 0), (3, 5)]);
        let top = array![[2, 0, 1, 3, 4, 5],
                         [0, 1, 2, 3, 4, 5],
                         [1, 3, 0, 2, 4, 5],
                         [1, 2, 3, 4, 0, 5]];
        let metrics = MetricAggregator::new(&dico).evaluate(&[0, 1, 2, 3], &top, &[1, 3, 5, 6]).unwrap();
        let recalls: Vec<f64> = metrics.iter().map(|m| m.recall).collect();
        assert_eq!(recalls, vec![25.0, 50.0, 75.0, 100.0]);
        for pair in recalls.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_nothing_found_is_degenerate() {
        let dico = index(&[(0, 0), (1, 1)]);
        let top = array![[5], [4]];
        match MetricAggregator::new(&dico).evaluate(&[0, 1], &top, &[1]) {
            Err(Error::DegenerateEvaluation { k }) => assert_eq!(k, 1),
            other => panic!("expected DegenerateEvaluation, got {:?}", other),
        }
    }

    #[test]
    fn test_every_source_must_be_queried() {
        let dico = index(&[(0, 0), (2, 1)]);
        let top = array![[0]];
        match MetricAggregator::new(&dico).evaluate(&[0], &top, &[1]) {
            Err(Error::InvalidDimensions(_)) => {}
            other => panic!("expected InvalidDimensions, got {:?}", other),
        }
    }

    #[test]
    fn test_gold_targets() {
        let dico = index(&[(0, 0), (1, 0), (1, 3)]);
        let aggregator = MetricAggregator::new(&dico);
        assert_eq!(aggregator.gold_targets().len(), 2);
        assert!(aggregator.gold_targets().contains(&3));
    }
}
