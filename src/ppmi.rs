use crate::cooccurrence::CooccurrenceTable;
use crate::error::{DsmError, Result};
use crate::frequency::FrequencyTable;
use crate::token::Token;
use crate::vocabulary::Vocabulary;

use std::collections::HashMap;
use log::info;


/// Target -> (context -> PPMI weight). Only pairs that co-occurred at least once are stored,
/// everything else reads as zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightedTable {
    weights: HashMap<Token, HashMap<Token, f64>>,
}

impl WeightedTable {

    /// weight of the pair, zero when it was never observed
    pub fn get(&self, target: &Token, context: &Token) -> f64 {
        self.get_stored(target, context).unwrap_or(0.0)
    }

    /// weight of the pair, failing when it was never observed
    pub fn get_strict(&self, target: &Token, context: &Token) -> Result<f64> {
        self.get_stored(target, context).ok_or_else(|| DsmError::UndefinedAssociation {
            target: target.to_string(),
            context: context.to_string()
        })
    }

    fn get_stored(&self, target: &Token, context: &Token) -> Option<f64> {
        self.weights.get(target).and_then(|row| row.get(context)).copied()
    }

    pub fn contains(&self, target: &Token, context: &Token) -> bool {
        self.get_stored(target, context).is_some()
    }

    fn insert(&mut self, target: &Token, context: &Token, weight: f64) {
        self.weights.entry(target.to_owned()).or_default().insert(context.to_owned(), weight);
    }

    /// (target, context, weight) for every stored pair, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&Token, &Token, f64)> {
        self.weights.iter().flat_map(|(t, row)| row.iter().map(move |(c, w)| (t, c, *w)))
    }

    pub fn n_pairs(&self) -> usize {
        self.weights.values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}


pub struct Ppmi {}

impl Ppmi {

    /// max(0, log2(p(t,c) / (p(t) p(c)))) with every probability a count over `corpus_size`.
    /// Only called for positive `count`.
    fn score(count: usize, target_freq: usize, context_freq: usize, corpus_size: usize) -> f64 {
        let n = corpus_size as f64;
        let p_tc = count as f64 / n;
        let p_t = target_freq as f64 / n;
        let p_c = context_freq as f64 / n;
        (p_tc / (p_t * p_c)).log2().max(0.0)
    }

    fn marginal(freqs: &FrequencyTable, token: &Token, role: &str) -> Result<usize> {
        match freqs.get(token) {
            0 => Err(DsmError::IndexInconsistency(format!("{} {} co-occurs but has no frequency", role, token))),
            f => Ok(f)
        }
    }

    /// weights every observed (target, context) pair of `cooc`. Cost follows the number of
    /// observed pairs, not the size of the two vocabularies.
    pub fn weigh(cooc: &CooccurrenceTable,
        target_freqs: &FrequencyTable,
        context_freqs: &FrequencyTable,
        corpus_size: usize) -> Result<WeightedTable> {

        if corpus_size == 0 {
            return Err(DsmError::EmptyInput("corpus size is zero, cannot normalise counts".to_string()))
        }

        let mut weighted = WeightedTable::default();
        for (target, context, count) in cooc.iter() {
            if count == 0 { continue }
            let f_t = Ppmi::marginal(target_freqs, target, "target")?;
            let f_c = Ppmi::marginal(context_freqs, context, "context")?;
            weighted.insert(target, context, Ppmi::score(count, f_t, f_c, corpus_size));
        }

        info!("weighted {} pairs", weighted.n_pairs());
        Ok(weighted)
    }

    /// the same weighting by walking the full targets x contexts grid. Only meant for
    /// checking `weigh` on small inputs.
    pub fn weigh_exhaustive(cooc: &CooccurrenceTable,
        targets: &Vocabulary,
        contexts: &Vocabulary,
        target_freqs: &FrequencyTable,
        context_freqs: &FrequencyTable,
        corpus_size: usize) -> Result<WeightedTable> {

        if corpus_size == 0 {
            return Err(DsmError::EmptyInput("corpus size is zero, cannot normalise counts".to_string()))
        }

        let mut weighted = WeightedTable::default();
        for target in targets.tokens() {
            let f_t = target_freqs.get(target);
            for context in contexts.tokens() {
                let count = cooc.get(target, context);
                if count > 0 {
                    let f_c = context_freqs.get(context);
                    if f_t == 0 || f_c == 0 {
                        return Err(DsmError::IndexInconsistency(format!("pair {} {} co-occurs but has no frequency", target, context)))
                    }
                    weighted.insert(target, context, Ppmi::score(count, f_t, f_c, corpus_size));
                }
            }
        }
        Ok(weighted)
    }
}
