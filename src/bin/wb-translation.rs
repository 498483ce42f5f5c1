//! Grade a pair of aligned word embeddings on word translation retrieval
//!
//! Looks up the translations of every word in a gold bilingual dictionary among the nearest
//! target-language neighbors of the source word, and reports precision, recall and F1 at k.
//!

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate wordbridge;

use std::path::PathBuf;
use clap::Arg;

use wordbridge::errors::*;
use wordbridge::report;
use wordbridge::{DictionaryIndex, DictionarySource, EvalConfig, Method, WordEmbedding,
                 WordTranslationEvaluator};

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("<src_lang> 'source language code, e.g. en'")
        .arg_from_usage("<src_emb> 'source embeddings: fastText .vec text, or a .npy matrix with --src-words'")
        .arg_from_usage("<tgt_lang> 'target language code, e.g. fr'")
        .arg_from_usage("<tgt_emb> 'target embeddings: fastText .vec text, or a .npy matrix with --tgt-words'")
        .arg_from_usage("--src-words=[FILE] 'one word per line, matching the rows of a .npy source matrix'")
        .arg_from_usage("--tgt-words=[FILE] 'one word per line, matching the rows of a .npy target matrix'")
        .arg_from_usage("--max-vocab=[N] 'only load the first N words of each .vec file'")
        .arg_from_usage("--dico-eval=[DICO] 'default, identical_char, or the path of a dictionary'")
        .arg_from_usage("--dico-dir=[DIR] 'where the default <src>-<tgt>-test.txt dictionaries are'")
        .arg(Arg::from_usage("-m, --method=[METHOD]... 'nn, invsm_beta_<beta> or csls_knn_<k>; repeat for several'")
             .number_of_values(1))
        .arg(Arg::from_usage("-k, --cutoff=[K]... 'report metrics at this k; repeat for several'")
             .number_of_values(1))
        .arg_from_usage("--json=[FILE] 'save the full reports, predictions included, as JSON'")
        .get_matches();

    let mut config = EvalConfig::default();
    if args.is_present("cutoff") {
        config.cutoffs = values_t!(args, "cutoff", usize).unwrap_or_else(|e| e.exit());
    }
    if let Some(dir) = args.value_of("dico-dir") {
        config.dictionary_dir = PathBuf::from(dir);
    }
    config.validate()?;

    // Bad method names fail before anything is loaded
    let methods = match args.values_of("method") {
        Some(names) => names.map(|name| name.parse()).collect::<Result<Vec<Method>>>()?,
        None => vec![Method::NearestNeighbor, Method::Csls { knn: 10 }],
    };
    let source: DictionarySource = args.value_of("dico-eval").unwrap_or("default").parse()?;
    let max_vocab = if args.is_present("max-vocab") {
        Some(value_t!(args, "max-vocab", usize).unwrap_or_else(|e| e.exit()))
    } else {
        None
    };

    // Both are required arguments
    let src = load_embedding(args.value_of("src_lang").unwrap(), args.value_of("src_emb").unwrap(),
                             args.value_of("src-words"), max_vocab)?;
    let tgt = load_embedding(args.value_of("tgt_lang").unwrap(), args.value_of("tgt_emb").unwrap(),
                             args.value_of("tgt-words"), max_vocab)?;

    let dico = DictionaryIndex::load(&source, &config.dictionary_dir,
                                     &src.lang, &src.vocab, &tgt.lang, &tgt.vocab)?;
    let evaluator = WordTranslationEvaluator::new(&src, &tgt, &dico, &config)?;

    let mut reports = vec![];
    let mut failures = 0;
    for method in methods.iter() {
        info!("Evaluating {}", method);
        match evaluator.evaluate(method) {
            Ok(r) => {
                report::log_report(&r);
                reports.push(r);
            }
            Err(err) => {
                error!("{} failed: {}", method, err);
                failures += 1;
            }
        }
    }

    println!("{}", report::summary_table(&reports));
    if let Some(path) = args.value_of("json") {
        report::write_json(path, &reports)?;
        info!("Saved {} reports to {}", reports.len(), path);
    }
    if failures > 0 {
        return Err(Error::Other(format!("{} of {} methods failed", failures, methods.len())));
    }
    Ok(())
}

fn load_embedding(lang: &str, path: &str, words: Option<&str>, max_vocab: Option<usize>) -> Result<WordEmbedding> {
    info!("Loading {} embeddings from {}", lang, path);
    match words {
        Some(wordlist) => WordEmbedding::read_numpy(lang, wordlist, path),
        None if path.ends_with(".npy") => Err(Error::Other(format!(
            "{} is a numpy matrix; pass its word list with --src-words / --tgt-words", path))),
        None => WordEmbedding::read_text(lang, path, max_vocab),
    }
}
