use crate::corpus::SentenceSource;
use crate::error::{DsmError, Result};
use crate::token::Token;

use std::collections::HashMap;
use log::info;


/// Occurrence counts of every token in a corpus, and the corpus size
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrequencyTable {
    token2count: HashMap<Token, usize>,
    total: usize,
}

impl FrequencyTable {

    /// one full scan over `source`, counting every token occurrence
    pub fn build<S: SentenceSource>(source: &S) -> Result<FrequencyTable> {

        let mut table = FrequencyTable::default();
        let mut n_sentences = 0;
        for sentence in source.sentences()? {
            table.accumulate(&sentence?);
            n_sentences += 1;
        }

        info!("counted {} tokens ({} types) in {} sentences", table.total, table.token2count.len(), n_sentences);
        Ok(table)
    }

    fn accumulate(&mut self, sentence: &[Token]) {
        for tok in sentence {
            let val = self.token2count.entry(tok.to_owned()).or_insert(0);
            *val += 1;
        }
        self.total += sentence.len();
    }

    /// count of `token`, zero when it was never seen
    pub fn get(&self, token: &Token) -> usize {
        self.token2count.get(token).copied().unwrap_or(0)
    }

    /// total number of token occurrences scanned
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn n_types(&self) -> usize {
        self.token2count.len()
    }

    /// fails with `EmptyInput` when nothing was counted, since every probability
    /// derived from the table would divide by zero
    pub fn require_non_empty(&self) -> Result<usize> {
        if self.total == 0 {
            return Err(DsmError::EmptyInput("frequency table counted zero tokens".to_string()))
        }
        Ok(self.total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, usize)> {
        self.token2count.iter().map(|(t, c)| (t, *c))
    }

    /// descending by count, ties broken by ascending token
    pub fn sorted(&self) -> Vec<(Token, usize)> {
        let mut tup = self.token2count
        .iter()
        .map(|(k, v)| (k.to_owned(), *v))
        .collect::<Vec<(Token, usize)>>();
        tup.sort_by(|(t1, c1), (t2, c2)| c2.cmp(c1).then_with(|| t1.cmp(t2)));
        tup
    }
}

impl FromIterator<(Token, usize)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (Token, usize)>>(iter: I) -> Self {
        let mut table = FrequencyTable::default();
        for (token, count) in iter {
            *table.token2count.entry(token).or_insert(0) += count;
            table.total += count;
        }
        table
    }
}


/// keeps entries whose attribute at `position` is one of `pos_list`
pub fn filter_by_pos(sorted_freqs: &[(Token, usize)], pos_list: &[String], position: usize) -> Vec<(Token, usize)> {
    sorted_freqs
    .iter()
    .filter(|(token, _)| token.get(position).map_or(false, |pos| pos_list.iter().any(|p| p == pos)))
    .cloned()
    .collect()
}

/// keeps entries seen strictly more than `min_freq` times
pub fn filter_by_threshold(sorted_freqs: &[(Token, usize)], min_freq: usize) -> Vec<(Token, usize)> {
    sorted_freqs
    .iter()
    .filter(|(_, freq)| *freq > min_freq)
    .cloned()
    .collect()
}
