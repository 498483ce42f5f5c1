//! Word embeddings: a vocabulary plus one vector per word
//!
//! Word ids are row indices, contiguous from 0, ordered as the words appear in the source file
//! (which for fastText and word2vec exports means most frequent first).

use std::cmp::min;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use ndarray::prelude::*;

use errors::*;
use farm::{FarmMap, new_farm};
use numpy;

const PREALLOCATE: usize = 1 << 22;

/// Maps words to row ids and back
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    word2id: FarmMap<String, usize>,
    id2word: Vec<String>,
}

impl Vocabulary {
    /// Build from an ordered word list; word i gets id i.
    ///
    /// A repeated word keeps its first id. The later copy still takes up its row so that ids
    /// stay aligned with the embedding table, it just can't be looked up by string.
    pub fn from_words<I, S>(words: I) -> Vocabulary
        where I: IntoIterator<Item=S>, S: Into<String> {
        let mut word2id = new_farm();
        let mut id2word = vec![];
        for (id, word) in words.into_iter().enumerate() {
            let word = word.into();
            if word2id.contains_key(&word) {
                warn!("Word {:?} appears more than once; row {} will be unreachable", word, id);
            } else {
                word2id.insert(word.clone(), id);
            }
            id2word.push(word);
        }
        Vocabulary { word2id, id2word }
    }

    /// Read one word per line, lowercased to match the dictionaries
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Vocabulary> {
        let file = File::open(path.as_ref())
            .map_err(|e| Error::MissingFile(format!("word list {}", path.as_ref().display()), Some(e)))?;
        let words = BufReader::new(file).lines()
            .map(|line| line.map(|l| l.trim_end().to_lowercase()))
            .collect::<::std::io::Result<Vec<String>>>()?;
        Ok(Vocabulary::from_words(words))
    }

    #[inline]
    pub fn id(&self, word: &str) -> Option<usize> {
        self.word2id.get(word).cloned()
    }

    #[inline]
    pub fn word(&self, id: usize) -> Option<&str> {
        self.id2word.get(id).map(|w| w.as_str())
    }

    /// Number of rows, including unreachable duplicates
    pub fn len(&self) -> usize {
        self.id2word.len()
    }

    /// Words in id order
    pub fn words(&self) -> &[String] {
        &self.id2word
    }
}

/// One language's embedding table and its vocabulary
#[derive(Debug, Clone)]
pub struct WordEmbedding {
    pub lang: String,
    pub vocab: Vocabulary,
    pub vectors: Array2<f64>,
}

impl WordEmbedding {
    /// Pair a vocabulary with its vectors, checking that every word has exactly one row
    pub fn new<L: Into<String>>(lang: L, vocab: Vocabulary, vectors: Array2<f64>) -> Result<WordEmbedding> {
        if vocab.len() != vectors.nrows() {
            return Err(Error::InvalidDimensions(format!(
                "{} words but {} embedding rows", vocab.len(), vectors.nrows())));
        }
        Ok(WordEmbedding { lang: lang.into(), vocab, vectors })
    }

    /// Read a word list (one per line) and a numpy matrix with one row per word
    pub fn read_numpy<L, P, Q>(lang: L, wordlist: P, matrix: Q) -> Result<WordEmbedding>
        where L: Into<String>, P: AsRef<Path>, Q: AsRef<Path> {
        let vocab = Vocabulary::read(wordlist)?;
        // Copying out of an mmap needs one copy of the matrix in memory instead of two.
        // Empty matrices can't be mapped at all, so any failure retries with a plain read.
        let mapped = numpy::open_matrix_mmap(matrix.as_ref())
            .and_then(|matfile| numpy::read_matrix_mmap(&matfile).map(|view| view.to_owned()));
        let vectors = match mapped {
            Ok(vectors) => vectors,
            Err(err) => {
                debug!("Could not map {}, reading it instead: {}", matrix.as_ref().display(), err);
                numpy::read_matrix(matrix.as_ref())?
            }
        };
        WordEmbedding::new(lang, vocab, vectors)
    }

    /// Read a fastText / word2vec text file.
    ///
    /// The first line is `<count> <dimension>`, each following line a word then its vector.
    /// Words are lowercased, since the dictionaries are. Lines of the wrong width and repeated
    /// words (after lowercasing, so `Cat` after `cat`) are skipped with a warning. At most
    /// `max_vocab` words are kept, if given.
    pub fn read_text<L, P>(lang: L, path: P, max_vocab: Option<usize>) -> Result<WordEmbedding>
        where L: Into<String>, P: AsRef<Path> {
        let file = File::open(path.as_ref())
            .map_err(|e| Error::MissingFile(format!("embedding {}", path.as_ref().display()), Some(e)))?;
        let mut lines = BufReader::new(file).lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(Error::Other(format!("{} is empty", path.as_ref().display()))),
        };
        let mut head = header.split_whitespace();
        let (count, dim) = match (head.next(), head.next()) {
            (Some(n), Some(d)) => (parse_usize(n)?, parse_usize(d)?),
            _ => return Err(Error::Other(format!(
                "Expected a \"<count> <dimension>\" header in {}, found {:?}",
                path.as_ref().display(), header))),
        };
        let limit = max_vocab.map_or(count, |m| min(m, count));

        let capacity = limit.checked_mul(dim).ok_or_else(|| Error::InvalidDimensions(format!(
            "{} words of dimension {} is too large, in the header of {}",
            limit, dim, path.as_ref().display())))?;
        // The header is only a promise, so don't reserve more than a few million up front
        let mut words: Vec<String> = Vec::with_capacity(min(limit, PREALLOCATE));
        let mut seen: FarmMap<String, usize> = new_farm();
        let mut data: Vec<f64> = Vec::with_capacity(min(capacity, PREALLOCATE));
        for (index, line) in lines.enumerate() {
            if words.len() >= limit { break; }
            let line = line?;
            let mut parts = line.split(' ').filter(|p| !p.is_empty());
            let word = match parts.next() {
                Some(w) => w.to_lowercase(),
                None => continue,
            };
            let vector = parts.map(|p| p.trim().parse::<f64>()
                    .map_err(|e| Error::ParseFloatError(p.to_string(), e)))
                .collect::<Result<Vec<f64>>>()?;
            if vector.len() != dim {
                warn!("Invalid dimension ({}) for word {:?} on line {}", vector.len(), word, index + 1);
                continue;
            }
            if seen.contains_key(&word) {
                warn!("Word {:?} found twice in {}, keeping the first", word, path.as_ref().display());
                continue;
            }
            seen.insert(word.clone(), words.len());
            words.push(word);
            data.extend(vector);
        }
        info!("Loaded {} pre-trained word embeddings of dimension {}", words.len(), dim);
        let vectors = Array2::from_shape_vec((words.len(), dim), data)?;
        WordEmbedding::new(lang, Vocabulary::from_words(words), vectors)
    }

    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }
}

fn parse_usize(token: &str) -> Result<usize> {
    token.parse().map_err(|e| Error::ParseIntError(token.to_string(), e))
}
