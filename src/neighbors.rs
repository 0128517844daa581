use crate::error::{DsmError, Result};
use crate::token::{Token, TokenIndex};

use std::collections::BTreeMap;
use ndarray::{Array2, ArrayView1, Axis};


/// query token -> its closest candidates with their scores, best first
pub type Neighbors = BTreeMap<Token, Vec<(Token, f32)>>;


fn labels<'a>(index: &'a TokenIndex, n: usize, axis: &str) -> Result<Vec<&'a Token>> {
    (0..n).map(|i| {
        index.token(i).ok_or_else(|| DsmError::IndexInconsistency(format!("{} {} has no token", axis, i)))
    }).collect()
}

/// the `k` best (candidate, score) pairs of one row of scores. Higher is better,
/// equal scores are ordered by candidate token.
pub fn find_k_most_similar(scores: ArrayView1<f32>, candidates: &[&Token], k: usize) -> Vec<(Token, f32)> {

    let mut indexed_scores: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();

    // sort by most similar in descending order
    indexed_scores.sort_by(|(i, s), (j, t)| t.total_cmp(s).then_with(|| candidates[*i].cmp(candidates[*j])));
    indexed_scores.truncate(k);

    indexed_scores.into_iter().map(|(j, score)| (candidates[j].to_owned(), score)).collect()
}

/// for every row of `similarities` (queries, labelled by `rows`) the `k` most similar
/// columns (candidates, labelled by `columns`). Similarity itself is computed elsewhere.
pub fn top_k(similarities: &Array2<f32>, rows: &TokenIndex, columns: &TokenIndex, k: usize) -> Result<Neighbors> {

    if k == 0 {
        return Err(DsmError::InvalidArgument("k must be positive".to_string()))
    }

    let (n_rows, n_cols) = similarities.dim();
    let queries = labels(rows, n_rows, "row")?;
    let candidates = labels(columns, n_cols, "column")?;

    let mut neighbors = Neighbors::new();
    for (query, scores) in queries.into_iter().zip(similarities.axis_iter(Axis(0))) {
        neighbors.insert(query.to_owned(), find_k_most_similar(scores, &candidates, k));
    }
    Ok(neighbors)
}
