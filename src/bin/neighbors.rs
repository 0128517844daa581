use std::{env, process};
use env_logger::Env;
use log::info;
extern crate dsm_ppmi;
use dsm_ppmi::{files_handling, top_k, DsmError, Result, Similarity};


// loads a persisted ppmi matrix and prints the k nearest neighbours of every query token.
// kept as its own executable so a saved space can be queried without rebuilding it.
//
// arguments to this executable should be:
// path to the matrix records (tsv)
// number of rows and number of columns of the matrix
// number of components per token
// path to the query tokens, one per line, components tab separated
// k
// example: ... Output/ppmi.tsv 5000 20000 2 Input/queries.tsv 10

fn main() {

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        process::exit(1);
    }
}

fn parse_arg(args: &[String], i: usize, what: &str) -> Result<usize> {
    args[i].parse::<usize>().map_err(|_| DsmError::InvalidArgument(format!("{} should be a number, got '{}'", what, args[i])))
}

fn run() -> Result<()> {

    let args: Vec<String> = env::args().collect();
    if args.len() != 7 {
        return Err(DsmError::InvalidArgument(
            "expected <matrix.tsv> <n_rows> <n_cols> <token_width> <queries.tsv> <k>".to_string()
        ))
    }

    let shape = (parse_arg(&args, 2, "n_rows")?, parse_arg(&args, 3, "n_cols")?);
    let token_width = parse_arg(&args, 4, "token_width")?;
    let k = parse_arg(&args, 6, "k")?;

    let space = files_handling::load_space(&args[1], shape, token_width)?;
    info!("loaded {} x {} matrix with {} entries", shape.0, shape.1, space.matrix.nnz());

    let queries = files_handling::read_tokens(&args[5])?;
    let similarity = Similarity::new(&space);
    let (scores, query_index) = similarity.queries(&queries)?;
    let neighbors = top_k(&scores, &query_index, similarity.index(), k)?;

    for token in &queries {

        println!("searching {} most similar words to {}", k, token);
        if let Some(similarities) = neighbors.get(token) {
            for (i, (similar_token, score)) in similarities.iter().enumerate() {
                println!("{} : {} ? {} = {}", i, token, similar_token, score);
            }
        }
        println!("\n");
    }

    Ok(())
}
