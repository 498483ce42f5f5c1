//! Logging and saving evaluation results

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use serde_json;

use errors::*;
use translation::TranslationReport;

/// One log line per metric, like
/// `1500 source words - csls_knn_10 - Precision at k = 1: 81.466667`
pub fn log_report(report: &TranslationReport) {
    let c = &report.coverage;
    info!("{}-{}: {} pairs ({} source words, {} in the raw dictionary), {} pairs with unknown words",
          report.lang1, report.lang2, c.pairs, c.unique_sources, report.n_gold_std, c.not_found);
    for m in report.cutoffs.iter() {
        let n = m.matching.len();
        info!("{} source words - {} - Precision at k = {}: {:.6}", n, report.method, m.k, m.precision);
        info!("{} source words - {} - Recall at k = {}: {:.6}", n, report.method, m.k, m.recall);
        info!("{} source words - {} - F1-Score at k = {}: {:.6}", n, report.method, m.k, m.f1);
        debug!("{} of {} dictionary rows at k = {} have a gold target among their predictions",
               m.n_relevant, m.trace.len(), m.k);
    }
}

/// A plain text table of every metric, one method per row
pub fn summary_table(reports: &[TranslationReport]) -> String {
    let names: Vec<&str> = match reports.first() {
        Some(r) => r.results.iter().map(|&(ref n, _)| n.as_str()).collect(),
        None => return String::new(),
    };
    let mut out = format!("{:<20}", "method");
    for name in names.iter() {
        out.push_str(&format!(" {:>15}", name));
    }
    out.push('\n');
    for r in reports {
        out.push_str(&format!("{:<20}", r.method));
        for name in names.iter() {
            match r.get(name) {
                Some(v) => out.push_str(&format!(" {:>15.2}", v)),
                None => out.push_str(&format!(" {:>15}", "-")),
            }
        }
        out.push('\n');
    }
    out
}

/// Save every report, predictions included, as one JSON array
pub fn write_json<P: AsRef<Path>>(path: P, reports: &[TranslationReport]) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, reports)
        .map_err(|e| Error::Other(format!("Could not write the JSON report: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::EvalConfig;
    use dictionary::{DictionaryIndex, RawDictionary};
    use similarity::Method;
    use tempfile::tempdir;
    use translation::get_word_translation_accuracy;
    use vocab::{Vocabulary, WordEmbedding};

    fn report() -> TranslationReport {
        let src = WordEmbedding::new("en", Vocabulary::from_words(vec!["cat", "dog"]),
                                     array![[1.0, 0.0], [0.0, 1.0]]).unwrap();
        let tgt = WordEmbedding::new("fr", Vocabulary::from_words(vec!["chat", "chien"]),
                                     array![[0.9, 0.1], [0.1, 0.9]]).unwrap();
        let raw = RawDictionary::from_pairs(vec![("cat".into(), "chat".into()), ("dog".into(), "chien".into())]);
        let dico = DictionaryIndex::build(&raw, &src.vocab, &tgt.vocab).unwrap();
        get_word_translation_accuracy(&src, &tgt, &Method::NearestNeighbor, &dico, &EvalConfig::default()).unwrap()
    }

    #[test]
    fn test_summary_table() {
        let table = summary_table(&[report()]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("precision_at_1"));
        assert!(lines[0].contains("f1score_at_10"));
        assert!(lines[1].starts_with("nn "));
        assert!(lines[1].contains("100.00"));
        assert_eq!(summary_table(&[]), "");
    }

    #[test]
    fn test_write_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json(&path, &[report()]).unwrap();
        let value: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(value[0]["method"], "nn");
        assert_eq!(value[0]["results"][0][0], "precision_at_1");
        assert_eq!(value[0]["query_ids"], serde_json::json!([0, 1]));
        log_report(&report());
    }
}
