//! Word translation retrieval: score, rank and grade one method against a gold dictionary
//!
//! Nothing in here prints; see `report` for that.

use std::collections::BTreeMap;
use ndarray::prelude::*;
use serde::Serialize;

use config::EvalConfig;
use dictionary::{Coverage, DictionaryIndex};
use errors::*;
use metrics::{CutoffMetrics, MetricAggregator};
use ranking::top_k;
use similarity::{Method, SimilarityScorer};
use vocab::WordEmbedding;

/// The outcome of evaluating one method
#[derive(Debug, Clone, Serialize)]
pub struct TranslationReport {
    pub method: String,
    pub lang1: String,
    pub lang2: String,
    pub coverage: Coverage,
    pub n_gold_std: usize,
    /// `precision_at_k`, `recall_at_k`, `f1score_at_k` for every cutoff
    pub results: Vec<(String, f64)>,
    pub cutoffs: Vec<CutoffMetrics>,
    /// Distinct source ids, one per row of `top_matches`
    pub query_ids: Vec<usize>,
    /// Best target ids per query, as deep as the largest cutoff
    pub top_matches: Array2<usize>,
}

impl TranslationReport {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.results.iter().find(|&&(ref n, _)| n == name).map(|&(_, v)| v)
    }

    /// The per-row matching trace at every cutoff
    pub fn matching_at_k(&self) -> BTreeMap<usize, &[(usize, bool)]> {
        self.cutoffs.iter().map(|m| (m.k, m.trace.as_slice())).collect()
    }
}

/// Normalizes a pair of embeddings once, then evaluates any number of methods on them
pub struct WordTranslationEvaluator<'a> {
    src: &'a WordEmbedding,
    tgt: &'a WordEmbedding,
    dico: &'a DictionaryIndex,
    config: &'a EvalConfig,
    scorer: SimilarityScorer,
}

impl<'a> WordTranslationEvaluator<'a> {
    pub fn new(src: &'a WordEmbedding, tgt: &'a WordEmbedding,
               dico: &'a DictionaryIndex, config: &'a EvalConfig) -> Result<WordTranslationEvaluator<'a>> {
        let (max1, max2) = dico.max_ids();
        if max1 >= src.vectors.nrows() || max2 >= tgt.vectors.nrows() {
            return Err(Error::InvalidDimensions(format!(
                "dictionary ids reach ({}, {}) but the embeddings have {} and {} rows",
                max1, max2, src.vectors.nrows(), tgt.vectors.nrows())));
        }
        let scorer = SimilarityScorer::new(&src.vectors, &tgt.vectors, config)?;
        Ok(WordTranslationEvaluator { src, tgt, dico, config, scorer })
    }

    pub fn evaluate(&self, method: &Method) -> Result<TranslationReport> {
        let query_ids = self.dico.source_ids();
        let scores = self.scorer.scores(method, &query_ids)?;
        let top_matches = top_k(&scores, self.config.max_cutoff());
        let cutoffs = MetricAggregator::new(self.dico)
            .evaluate(&query_ids, &top_matches, &self.config.cutoffs)?;
        Ok(TranslationReport {
            method: method.to_string(),
            lang1: self.src.lang.clone(),
            lang2: self.tgt.lang.clone(),
            coverage: self.dico.coverage(),
            n_gold_std: self.dico.n_gold_std(),
            results: cutoffs.iter().flat_map(|m| m.named()).collect(),
            cutoffs,
            query_ids,
            top_matches,
        })
    }
}

/// Evaluate a single method from scratch
pub fn get_word_translation_accuracy(src: &WordEmbedding, tgt: &WordEmbedding, method: &Method,
                                     dico: &DictionaryIndex, config: &EvalConfig)
    -> Result<TranslationReport> {
    WordTranslationEvaluator::new(src, tgt, dico, config)?.evaluate(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dictionary::RawDictionary;
    use vocab::Vocabulary;

    fn pair() -> (WordEmbedding, WordEmbedding) {
        let src = WordEmbedding::new("en", Vocabulary::from_words(vec!["cat", "dog", "sun"]),
            array![[1.0, 0.1, 0.0], [0.0, 1.0, 0.2], [0.1, 0.0, 1.0]]).unwrap();
        let tgt = WordEmbedding::new("fr", Vocabulary::from_words(vec!["chien", "soleil", "chat", "lune"]),
            array![[0.1, 2.0, 0.3], [0.0, 0.1, 3.0], [1.5, 0.0, 0.1], [0.2, 0.1, 0.9]]).unwrap();
        (src, tgt)
    }

    fn dico(src: &WordEmbedding, tgt: &WordEmbedding, pairs: &[(&str, &str)]) -> DictionaryIndex {
        let raw = RawDictionary::from_pairs(pairs.iter().map(|&(a, b)| (a.to_string(), b.to_string())).collect());
        DictionaryIndex::build(&raw, &src.vocab, &tgt.vocab).unwrap()
    }

    #[test]
    fn test_every_method_translates_the_toy_pair() {
        let (src, tgt) = pair();
        let dico = dico(&src, &tgt, &[("cat", "chat"), ("dog", "chien"), ("sun", "soleil")]);
        let config = EvalConfig { cutoffs: vec![1, 2], ..EvalConfig::default() };
        let evaluator = WordTranslationEvaluator::new(&src, &tgt, &dico, &config).unwrap();
        for name in &["nn", "invsm_beta_30", "csls_knn_2"] {
            let report = evaluator.evaluate(&name.parse().unwrap()).unwrap();
            assert_eq!(report.method, *name);
            assert_eq!(report.get("precision_at_1"), Some(100.0));
            assert_eq!(report.get("recall_at_1"), Some(100.0));
            assert_eq!(report.results.len(), 6);
            assert_eq!(report.top_matches.dim(), (3, 2));
            assert_eq!(report.top_matches.column(0).to_vec(), vec![2, 0, 1]);
        }
    }

    #[test]
    fn test_queries_are_distinct_sources() {
        let (src, tgt) = pair();
        let dico = dico(&src, &tgt, &[("cat", "chat"), ("cat", "lune"), ("sun", "soleil")]);
        let report = get_word_translation_accuracy(&src, &tgt, &Method::NearestNeighbor,
                                                   &dico, &EvalConfig::default()).unwrap();
        assert_eq!(report.query_ids, vec![0, 2]);
        // Only four target words, so ten neighbors is four
        assert_eq!(report.top_matches.dim(), (2, 4));
        let traces = report.matching_at_k();
        assert_eq!(traces[&1], &[(0, true), (0, true), (2, true)][..]);
        assert_eq!(report.n_gold_std, 2);
    }

    #[test]
    fn test_dictionary_must_fit_embeddings() {
        let (src, tgt) = pair();
        let dico = dico(&src, &tgt, &[("sun", "lune")]);
        let small = WordEmbedding::new("fr", Vocabulary::from_words(vec!["chien"]), array![[1.0, 0.0, 0.0]]).unwrap();
        match get_word_translation_accuracy(&src, &small, &Method::NearestNeighbor, &dico, &EvalConfig::default()) {
            Err(Error::InvalidDimensions(_)) => {}
            other => panic!("expected InvalidDimensions, got {:?}", other),
        }
    }
}
