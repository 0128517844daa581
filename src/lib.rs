//! Builds PPMI weighted co-occurrence spaces from tagged corpora and queries them
//! for nearest neighbours.

mod error;
mod token;
mod corpus;
mod frequency;
mod vocabulary;
mod cooccurrence;
mod ppmi;
mod matrix;
mod similarity;
mod neighbors;
mod config;
mod pipeline;
pub mod files_handling;

pub use error::{DsmError, Result};
pub use token::{Sentence, Token, TokenIndex};
pub use corpus::{Column, ConllCorpus, SentenceSource, TokenShape};
pub use frequency::{filter_by_pos, filter_by_threshold, FrequencyTable};
pub use vocabulary::{Selection, Vocabulary};
pub use cooccurrence::{CooccurrenceTable, Counts};
pub use ppmi::{Ppmi, WeightedTable};
pub use matrix::{MatrixRecord, SemanticSpace, SparseMatrix};
pub use similarity::{cosine, Similarity};
pub use neighbors::{find_k_most_similar, top_k, Neighbors};
pub use config::{Config, RunParams};
pub use pipeline::Pipeline;
