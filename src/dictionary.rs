//! Gold bilingual dictionaries and the evaluation index built from them

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use serde::Serialize;

use errors::*;
use farm::FarmSet;
use vocab::Vocabulary;

/// Where the gold dictionary comes from
#[derive(Debug, Clone, PartialEq)]
pub enum DictionarySource {
    /// `<dictionary_dir>/<lang1>-<lang2>-test.txt`
    Default,
    /// Every word spelled the same in both vocabularies
    IdenticalChar,
    Path(PathBuf),
}

impl FromStr for DictionarySource {
    type Err = Error;
    fn from_str(s: &str) -> Result<DictionarySource> {
        Ok(match s {
            "default" => DictionarySource::Default,
            "identical_char" => DictionarySource::IdenticalChar,
            path => DictionarySource::Path(PathBuf::from(path)),
        })
    }
}

impl DictionarySource {
    /// The file this source reads, if it reads one
    pub fn path(&self, dictionary_dir: &Path, lang1: &str, lang2: &str) -> Option<PathBuf> {
        match *self {
            DictionarySource::Default =>
                Some(dictionary_dir.join(format!("{}-{}-test.txt", lang1, lang2))),
            DictionarySource::IdenticalChar => None,
            DictionarySource::Path(ref p) => Some(p.clone()),
        }
    }
}

/// Word pairs as they appear in the dictionary file, before any vocabulary lookups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDictionary {
    pub pairs: Vec<(String, String)>,
    /// Distinct source words in the file, including ones on lines that couldn't be used
    pub n_gold_std: usize,
}

impl RawDictionary {
    /// Wrap already-parsed pairs, counting their distinct source words
    pub fn from_pairs(pairs: Vec<(String, String)>) -> RawDictionary {
        let n_gold_std = pairs.iter().map(|&(ref w1, _)| w1.as_str()).collect::<FarmSet<&str>>().len();
        RawDictionary { pairs, n_gold_std }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<RawDictionary> {
        let file = File::open(path.as_ref())
            .map_err(|e| Error::MissingFile(format!("dictionary {}", path.as_ref().display()), Some(e)))?;
        let lines = BufReader::new(file).lines().collect::<::std::io::Result<Vec<String>>>()?;
        RawDictionary::parse(lines.iter().map(|l| l.as_str()))
    }

    /// One `word1 word2` pair per line, lowercase only.
    ///
    /// Lines that don't hold exactly two words are skipped with a warning. Uppercase anywhere is
    /// an error, since the dictionaries are published lowercased.
    pub fn parse<'a, I: IntoIterator<Item=&'a str>>(lines: I) -> Result<RawDictionary> {
        let mut pairs = vec![];
        let mut sources: FarmSet<String> = FarmSet::default();
        for (index, line) in lines.into_iter().enumerate() {
            if line != line.to_lowercase() {
                return Err(Error::CaseViolation { line: line.to_string(), index });
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if let Some(first) = parts.first() {
                if !sources.contains(*first) {
                    sources.insert(first.to_string());
                }
            }
            if parts.len() != 2 {
                warn!("Could not parse line {:?} ({})", line, index);
                continue;
            }
            pairs.push((parts[0].to_string(), parts[1].to_string()));
        }
        Ok(RawDictionary { pairs, n_gold_std: sources.len() })
    }
}

/// How much of the gold dictionary the vocabularies cover
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Coverage {
    pub pairs: usize,
    pub unique_sources: usize,
    /// Pairs with at least one unknown word
    pub not_found: usize,
    pub not_found_src: usize,
    pub not_found_tgt: usize,
}

/// Gold (source id, target id) pairs, sorted by source id
#[derive(Debug, Clone)]
pub struct DictionaryIndex {
    pairs: Vec<(usize, usize)>,
    n_gold_std: usize,
    coverage: Coverage,
}

impl DictionaryIndex {
    /// Look every pair up in the vocabularies, dropping the ones that can't be found.
    ///
    /// Ids are frequency ranks, so sorting by source id sorts by source word frequency. The sort
    /// is stable: several translations of one word keep their order from the file.
    pub fn build(raw: &RawDictionary, vocab1: &Vocabulary, vocab2: &Vocabulary) -> Result<DictionaryIndex> {
        let mut pairs = vec![];
        let mut coverage = Coverage::default();
        for &(ref word1, ref word2) in raw.pairs.iter() {
            match (vocab1.id(word1), vocab2.id(word2)) {
                (Some(id1), Some(id2)) => pairs.push((id1, id2)),
                (id1, id2) => {
                    coverage.not_found += 1;
                    coverage.not_found_src += id1.is_none() as usize;
                    coverage.not_found_tgt += id2.is_none() as usize;
                }
            }
        }
        if pairs.is_empty() {
            return Err(Error::EmptyDictionary {
                not_found: coverage.not_found,
                not_found_src: coverage.not_found_src,
                not_found_tgt: coverage.not_found_tgt,
            });
        }
        pairs.sort_by_key(|&(id1, _)| id1);
        coverage.pairs = pairs.len();
        coverage.unique_sources = count_runs(&pairs);
        info!("Found {} pairs of words in the dictionary ({} unique). \
               {} other pairs contained at least one unknown word \
               ({} in lang1, {} in lang2)",
              coverage.pairs, coverage.unique_sources,
              coverage.not_found, coverage.not_found_src, coverage.not_found_tgt);
        Ok(DictionaryIndex { pairs, n_gold_std: raw.n_gold_std, coverage })
    }

    /// Pair every word with itself when both languages spell it the same way
    pub fn identical_strings(vocab1: &Vocabulary, vocab2: &Vocabulary) -> Result<DictionaryIndex> {
        let mut pairs: Vec<(usize, usize)> = vocab1.words().iter()
            .filter_map(|w| match (vocab1.id(w), vocab2.id(w)) {
                (Some(id1), Some(id2)) => Some((id1, id2)),
                _ => None,
            })
            .collect();
        if pairs.is_empty() {
            return Err(Error::NoIdenticalStrings);
        }
        // Duplicated words map to their first id and show up once per copy
        pairs.sort_by_key(|&(id1, _)| id1);
        pairs.dedup();
        info!("Found {} pairs of identical character strings.", pairs.len());
        let coverage = Coverage { pairs: pairs.len(), unique_sources: pairs.len(), ..Coverage::default() };
        Ok(DictionaryIndex { n_gold_std: pairs.len(), pairs, coverage })
    }

    /// Read the dictionary named by `source`, or build the identical-string one
    pub fn load(source: &DictionarySource, dictionary_dir: &Path,
                lang1: &str, vocab1: &Vocabulary,
                lang2: &str, vocab2: &Vocabulary) -> Result<DictionaryIndex> {
        match source.path(dictionary_dir, lang1, lang2) {
            Some(path) => {
                info!("Loading evaluation dictionary from {}", path.display());
                DictionaryIndex::build(&RawDictionary::read(&path)?, vocab1, vocab2)
            }
            None => DictionaryIndex::identical_strings(vocab1, vocab2),
        }
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Never true for a successfully built index
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn n_gold_std(&self) -> usize {
        self.n_gold_std
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    /// Distinct source ids in index order
    pub fn source_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.pairs.iter().map(|&(id1, _)| id1).collect();
        ids.dedup();
        ids
    }

    pub fn max_ids(&self) -> (usize, usize) {
        self.pairs.iter().fold((0, 0), |(m1, m2), &(id1, id2)| {
            (::std::cmp::max(m1, id1), ::std::cmp::max(m2, id2))
        })
    }
}

/// Distinct source ids in pairs sorted by source id
fn count_runs(pairs: &[(usize, usize)]) -> usize {
    pairs.windows(2).filter(|w| w[0].0 != w[1].0).count() + if pairs.is_empty() { 0 } else { 1 }
}
