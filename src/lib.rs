//! Evaluate cross-lingual word embeddings by word translation retrieval
//!
//! Two embedding tables that have been mapped into a shared space are graded against a gold
//! bilingual dictionary: for every source word, are its translations among the nearest target
//! words? Nearness can be plain cosine (`nn`), inverted softmax (`invsm_beta_<β>`) or CSLS
//! (`csls_knn_<k>`), and the results are precision, recall and F1 at a few cutoffs.
//!
//! The computation (`translation`) returns structured results and never prints; `report` logs
//! or saves them.


#[macro_use] extern crate log;
#[macro_use] extern crate ndarray;
extern crate byteorder;
extern crate farmhash;
extern crate hash_hasher;
extern crate memmap;
extern crate rayon;
extern crate regex;
extern crate serde;
extern crate serde_json;
#[cfg(test)] #[macro_use] extern crate approx;
#[cfg(test)] extern crate ndarray_rand;
#[cfg(test)] extern crate rand;
#[cfg(test)] extern crate tempfile;

pub mod errors;
pub mod farm;
pub mod numpy;
pub mod config;
pub mod vocab;
pub mod dictionary;
pub mod similarity;
pub mod ranking;
pub mod metrics;
pub mod translation;
pub mod report;

pub use config::EvalConfig;
pub use dictionary::{DictionaryIndex, DictionarySource, RawDictionary};
pub use errors::{Error, Result};
pub use similarity::{Method, SimilarityScorer};
pub use translation::{get_word_translation_accuracy, TranslationReport, WordTranslationEvaluator};
pub use vocab::{Vocabulary, WordEmbedding};
