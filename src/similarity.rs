//! Source-to-target similarity scores for word translation retrieval
//!
//! Three methods are supported, picked with a method string:
//!
//! - `nn`: cosine similarity.
//! - `invsm_beta_<β>`: inverted softmax. `exp(β·cos)` normalized over the whole *source*
//!   vocabulary for each target word, which discounts targets that are close to everything.
//! - `csls_knn_<k>`: cross-domain similarity local scaling. `2·cos` minus each side's mean
//!   similarity to its k nearest neighbors in the other language.
//!
//! All methods work on row-normalized copies of the embeddings, so cosine is a dot product.

use std::cmp::min;
use std::fmt;
use std::str::FromStr;
use ndarray::prelude::*;
use ndarray::Data;
use rayon::prelude::*;

use config::EvalConfig;
use errors::*;

const INVSM_PREFIX: &'static str = "invsm_beta_";
const CSLS_PREFIX: &'static str = "csls_knn_";

/// A retrieval method and its parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    NearestNeighbor,
    InvertedSoftmax { beta: f64 },
    Csls { knn: usize },
}

impl FromStr for Method {
    type Err = Error;
    fn from_str(s: &str) -> Result<Method> {
        if s == "nn" {
            Ok(Method::NearestNeighbor)
        } else if s.starts_with(INVSM_PREFIX) {
            let token = &s[INVSM_PREFIX.len()..];
            let beta: f64 = token.parse()
                .map_err(|e| Error::ParseFloatError(token.to_string(), e))?;
            if !beta.is_finite() || beta <= 0.0 {
                return Err(Error::InvalidMethodParameter(format!(
                    "{} needs a positive beta, got {:?}", s, token)));
            }
            Ok(Method::InvertedSoftmax { beta })
        } else if s.starts_with(CSLS_PREFIX) {
            let token = &s[CSLS_PREFIX.len()..];
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidMethodParameter(format!(
                    "{} needs a non-negative integer k, got {:?}", s, token)));
            }
            let knn: usize = token.parse()
                .map_err(|e| Error::ParseIntError(token.to_string(), e))?;
            if knn == 0 {
                return Err(Error::InvalidMethodParameter(format!(
                    "{} averages over zero neighbors", s)));
            }
            Ok(Method::Csls { knn })
        } else {
            Err(Error::UnsupportedMethod(s.to_string()))
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Method::NearestNeighbor => write!(f, "nn"),
            Method::InvertedSoftmax { beta } => write!(f, "{}{}", INVSM_PREFIX, beta),
            Method::Csls { knn } => write!(f, "{}{}", CSLS_PREFIX, knn),
        }
    }
}

/// L2-normalize every row into a new array.
///
/// Cosine similarity is just a dot product if the magnitudes are all one. All-zero rows can't be
/// normalized; they stay 0 and so do their similarities.
pub fn normalize_rows<S: Data<Elem=f64>>(emb: &ArrayBase<S, Ix2>) -> Array2<f64> {
    let mut out = emb.to_owned();
    for mut row in out.outer_iter_mut() {
        let norm = row.fold(0.0, |acc, x| acc + (x*x)).sqrt();
        if norm != 0.0 { row.mapv_inplace(|x| x/norm); }
    }
    out
}

/// For each query row, the mean of its `knn` largest dot products with the reference rows.
///
/// Queries are processed `batch_size` rows at a time and one batch is scored before the next
/// starts, so only `batch_size × reference` scores are held at once. Rows within a batch are
/// ranked in parallel, in place. If `query` and `reference` are literally the same matrix (same
/// buffer, shape and strides) a row is not counted as its own neighbor. `knn` is clamped to the
/// number of candidates available.
pub fn nn_avg_dist(query: ArrayView2<f64>, reference: ArrayView2<f64>, knn: usize, batch_size: usize)
    -> Result<Array1<f64>> {
    if query.ncols() != reference.ncols() {
        return Err(Error::InvalidDimensions(format!(
            "query vectors have {} dimensions, reference vectors {}", query.ncols(), reference.ncols())));
    }
    let same = query.as_ptr() == reference.as_ptr()
        && query.shape() == reference.shape()
        && query.strides() == reference.strides();
    let candidates = reference.nrows().saturating_sub(same as usize);
    let k = min(knn, candidates);
    if k == 0 {
        return Err(Error::InvalidDimensions(format!(
            "cannot average over {} neighbors among {} candidates", knn, candidates)));
    }
    if k < knn {
        warn!("Only {} neighbors available, averaging over {} instead of {}", candidates, k, knn);
    }
    let batch_size = ::std::cmp::max(batch_size, 1);
    let n = query.nrows();
    let width = reference.nrows();
    let mut out = Vec::with_capacity(n);
    for start in (0..n).step_by(batch_size) {
        let end = min(start + batch_size, n);
        let mut sims = query.slice(s![start..end, ..]).dot(&reference.t());
        if !sims.is_standard_layout() {
            sims = sims.as_standard_layout().into_owned();
        }
        let rows = match sims.as_slice_mut() {
            Some(rows) => rows,
            None => return Err(Error::Other("batch scores are not contiguous".into())),
        };
        let batch: Vec<f64> = rows.par_chunks_mut(width).enumerate().map(|(offset, row)| {
            if same {
                // Park the self-match past the end of the candidates
                row.swap(start + offset, width - 1);
                mean_of_largest(&mut row[..width - 1], k)
            } else {
                mean_of_largest(row, k)
            }
        }).collect();
        out.extend(batch);
    }
    Ok(Array1::from(out))
}

/// Partially sorts `values`
fn mean_of_largest(values: &mut [f64], k: usize) -> f64 {
    values.select_nth_unstable_by(k - 1, |a, b| b.total_cmp(a));
    values[..k].iter().sum::<f64>() / k as f64
}

/// Scores source words against the whole target vocabulary.
///
/// Holds normalized copies of both embedding tables; the caller's tables are untouched.
pub struct SimilarityScorer {
    emb1: Array2<f64>,
    emb2: Array2<f64>,
    invsm_batch_size: usize,
    knn_batch_size: usize,
}

impl SimilarityScorer {
    pub fn new<S, T>(emb1: &ArrayBase<S, Ix2>, emb2: &ArrayBase<T, Ix2>, config: &EvalConfig)
        -> Result<SimilarityScorer>
        where S: Data<Elem=f64>, T: Data<Elem=f64> {
        config.validate()?;
        if emb1.ncols() != emb2.ncols() {
            return Err(Error::InvalidDimensions(format!(
                "source embeddings have {} dimensions, target embeddings {}",
                emb1.ncols(), emb2.ncols())));
        }
        Ok(SimilarityScorer {
            emb1: normalize_rows(emb1),
            emb2: normalize_rows(emb2),
            invsm_batch_size: config.invsm_batch_size,
            knn_batch_size: config.knn_batch_size,
        })
    }

    pub fn source(&self) -> ArrayView2<f64> {
        self.emb1.view()
    }

    pub fn target(&self) -> ArrayView2<f64> {
        self.emb2.view()
    }

    /// A `|query_ids| × |target vocabulary|` score matrix
    pub fn scores(&self, method: &Method, query_ids: &[usize]) -> Result<Array2<f64>> {
        if let Some(&bad) = query_ids.iter().find(|&&id| id >= self.emb1.nrows()) {
            return Err(Error::InvalidDimensions(format!(
                "source id {} is outside a vocabulary of {}", bad, self.emb1.nrows())));
        }
        match *method {
            Method::NearestNeighbor => Ok(self.nearest_neighbor(query_ids)),
            Method::InvertedSoftmax { beta } => Ok(self.inverted_softmax(query_ids, beta)),
            Method::Csls { knn } => self.csls(query_ids, knn),
        }
    }

    pub fn nearest_neighbor(&self, query_ids: &[usize]) -> Array2<f64> {
        self.emb1.select(Axis(0), query_ids).dot(&self.emb2.t())
    }

    /// P(source | target) with a softmax over every source word, kept only for the queries.
    ///
    /// Target words are handled `invsm_batch_size` at a time, so the full
    /// `|source| × |target|` matrix never exists.
    pub fn inverted_softmax(&self, query_ids: &[usize], beta: f64) -> Array2<f64> {
        let n2 = self.emb2.nrows();
        let mut out = Array2::zeros((query_ids.len(), n2));
        for start in (0..n2).step_by(self.invsm_batch_size) {
            let end = min(start + self.invsm_batch_size, n2);
            let mut scores = self.emb1.dot(&self.emb2.slice(s![start..end, ..]).t());
            for mut column in scores.axis_iter_mut(Axis(1)) {
                // Shifting by the max leaves the ratios alone but keeps exp() finite
                let max = column.fold(::std::f64::NEG_INFINITY, |m, &x| m.max(x));
                column.mapv_inplace(|x| (beta * (x - max)).exp());
                let total = column.sum();
                column.mapv_inplace(|x| x / total);
            }
            out.slice_mut(s![.., start..end]).assign(&scores.select(Axis(0), query_ids));
        }
        out
    }

    /// Mean similarity of every source word to its `knn` nearest targets, and of every target
    /// word to its `knn` nearest sources
    pub fn csls_neighborhoods(&self, knn: usize) -> Result<(Array1<f64>, Array1<f64>)> {
        let average_dist1 = nn_avg_dist(self.emb1.view(), self.emb2.view(), knn, self.knn_batch_size)?;
        let average_dist2 = nn_avg_dist(self.emb2.view(), self.emb1.view(), knn, self.knn_batch_size)?;
        Ok((average_dist1, average_dist2))
    }

    pub fn csls(&self, query_ids: &[usize], knn: usize) -> Result<Array2<f64>> {
        let (average_dist1, average_dist2) = self.csls_neighborhoods(knn)?;
        let mut scores = self.nearest_neighbor(query_ids);
        scores *= 2.0;
        for (mut row, &id) in scores.outer_iter_mut().zip(query_ids) {
            row -= average_dist1[id];
            row -= &average_dist2;
        }
        Ok(scores)
    }
}
