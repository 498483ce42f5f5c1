//! Evaluation settings, passed explicitly to the scorer and the driver

use std::path::PathBuf;
use errors::*;

#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    /// Report precision/recall/F1 at each of these k
    pub cutoffs: Vec<usize>,
    /// Target words per inverted softmax batch
    pub invsm_batch_size: usize,
    /// Query words per k-NN batch when computing CSLS neighborhood averages
    pub knn_batch_size: usize,
    /// Where `default` dictionaries are looked up
    pub dictionary_dir: PathBuf,
}

impl Default for EvalConfig {
    fn default() -> EvalConfig {
        EvalConfig {
            cutoffs: vec![1, 5, 10],
            invsm_batch_size: 128,
            knn_batch_size: 1024,
            dictionary_dir: PathBuf::from("data/crosslingual/dictionaries"),
        }
    }
}

impl EvalConfig {
    /// How many neighbors to rank so that every cutoff is covered
    pub fn max_cutoff(&self) -> usize {
        self.cutoffs.iter().cloned().max().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cutoffs.is_empty() || self.cutoffs.contains(&0) {
            return Err(Error::Other(format!(
                "Cutoffs must be a non-empty list of positive integers, got {:?}", self.cutoffs)));
        }
        if self.invsm_batch_size == 0 || self.knn_batch_size == 0 {
            return Err(Error::Other("Batch sizes must be positive".into()));
        }
        Ok(())
    }
}
