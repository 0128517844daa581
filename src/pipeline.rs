// imports
use crate::config::{Config, RunParams};
use crate::cooccurrence::Counts;
use crate::corpus::ConllCorpus;
use crate::error::{DsmError, Result};
use crate::files_handling::{read_tokens, save_output, DenseVectors};
use crate::frequency::FrequencyTable;
use crate::matrix::SemanticSpace;
use crate::neighbors::top_k;
use crate::ppmi::Ppmi;
use crate::similarity::Similarity;
use crate::vocabulary::Vocabulary;

use std::env;
use std::time::Instant;
use log::info;

pub struct Pipeline {}

impl Pipeline {

    /// reads the json config named on the command line and runs it
    pub fn run_from_args() -> Result<()> {

        info!("entering program...");
        let args: Vec<String> = env::args().collect();

        info!("building parameters...");
        let params = Config::new(&args)?.get_params();
        info!("{}", params);

        Pipeline::run(&params)?;
        Ok(())
    }

    // runs the main procedure -
    // -> frequencies of every token in the corpus
    // -> selection of targets and contexts
    // -> cooccurrences counting
    // -> ppmi weighting and matrix assembly
    // -> optional dense vectors and nearest neighbours

    pub fn run(params: &RunParams) -> Result<SemanticSpace> {

        let corpus = ConllCorpus::new(&params.corpus_file, params.token_shape.clone());

        let timer = Instant::now();
        info!("counting frequencies in {}...", params.corpus_file);
        let freqs = FrequencyTable::build(&corpus)?;
        let corpus_size = freqs.require_non_empty()?;
        save_output(&params.output_dir, "frequencies", &freqs)?;
        info!("finished frequencies, took {} seconds ...", timer.elapsed().as_secs());

        let sorted = freqs.sorted();
        let targets = Vocabulary::select(&sorted, &params.targets);
        let contexts = Vocabulary::select(&sorted, &params.contexts);
        info!("using {} targets and {} contexts out of {} token types", targets.len(), contexts.len(), freqs.n_types());
        if targets.is_empty() || contexts.is_empty() {
            return Err(DsmError::EmptyInput("no target or no context survived the vocabulary selection".to_string()))
        }

        let cooc = Counts::run(&corpus, &targets, &contexts, params.window_size, params.num_threads)?;

        let timer = Instant::now();
        let weighted = Ppmi::weigh(&cooc, &freqs, &freqs, corpus_size)?;
        let space = SemanticSpace::from_weighted(&weighted, targets.index(), contexts.index())?;
        save_output(&params.output_dir, "ppmi", &space)?;
        let (n_rows, n_cols) = space.matrix.shape();
        info!("saved {} x {} matrix with {} entries, took {} seconds ...", n_rows, n_cols, space.matrix.nnz(), timer.elapsed().as_secs());

        if params.save_dense {
            let dense = space.matrix.to_dense();
            save_output(&params.output_dir, "vectors", &DenseVectors { vectors: dense.view(), index: &space.rows })?;
            info!("saved dense vectors");
        }

        if let Some(k) = params.neighbors_k {
            let timer = Instant::now();
            let similarity = Similarity::new(&space);
            let (scores, queries) = match &params.neighbors_queries {
                Some(path) => similarity.queries(&read_tokens(path)?)?,
                None => (similarity.matrix(), similarity.index().clone())
            };
            let neighbors = top_k(&scores, &queries, similarity.index(), k)?;
            save_output(&params.output_dir, "neighbors", &neighbors)?;
            info!("saved {} nearest neighbours of {} tokens, took {} seconds ...", k, neighbors.len(), timer.elapsed().as_secs());
        }

        Ok(space)
    }
}
