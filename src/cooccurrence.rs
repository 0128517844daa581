// imports
use crate::corpus::SentenceSource;
use crate::error::Result;
use crate::token::{Sentence, Token};
use crate::vocabulary::Vocabulary;

use std::collections::HashMap;
use std::time::Instant;
use log::{debug, info};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};


/// Target -> (context -> number of times the context fell inside the window of the target)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CooccurrenceTable {
    tup2cooc: HashMap<Token, HashMap<Token, usize>>,
}

impl CooccurrenceTable {

    /// count for (target, context), zero when the pair was never seen. Never creates entries.
    pub fn get(&self, target: &Token, context: &Token) -> usize {
        self.tup2cooc.get(target).and_then(|row| row.get(context)).copied().unwrap_or(0)
    }

    pub fn add(&mut self, target: &Token, context: &Token, count: usize) {
        let row = self.tup2cooc.entry(target.to_owned()).or_default();
        let val = row.entry(context.to_owned()).or_insert(0);
        *val += count;
    }

    /// pairwise summation of `other` into `self`
    pub fn merge(&mut self, other: CooccurrenceTable) {
        for (target, row) in other.tup2cooc {
            let mine = self.tup2cooc.entry(target).or_default();
            for (context, count) in row {
                *mine.entry(context).or_insert(0) += count;
            }
        }
    }

    /// (target, context, count) for every observed pair, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&Token, &Token, usize)> {
        self.tup2cooc.iter().flat_map(|(t, row)| row.iter().map(move |(c, n)| (t, c, *n)))
    }

    pub fn n_targets(&self) -> usize {
        self.tup2cooc.len()
    }

    /// number of distinct (target, context) pairs
    pub fn n_pairs(&self) -> usize {
        self.tup2cooc.values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tup2cooc.is_empty()
    }
}


pub struct Counts {}

impl Counts {

    // sentences are read in chunks of this size, each chunk is then split over the thread pool
    const CHUNK_SIZE: usize = 50000;
    const PARTITION_SIZE: usize = 1000;

    /// counts, for each target occurrence, the contexts found up to `window_size` positions away
    /// on either side. Left and right neighbours go to the same cell, the window is clipped
    /// at the sentence boundary and the target position itself is never counted.
    pub fn count(window_size: usize,
        sequences: &[Sentence],
        targets: &Vocabulary,
        contexts: &Vocabulary,
        tup2cooc: &mut CooccurrenceTable) {

            for sequence in sequences {

                let n = sequence.len();
                for (i, tok) in sequence.iter().enumerate() {

                    if !targets.contains(tok) { continue }

                    let start = i.saturating_sub(window_size);
                    let end = i.saturating_add(window_size).min(n - 1);

                    for j in start..=end {

                        if j == i { continue }

                        let context = &sequence[j];
                        if contexts.contains(context) {
                            tup2cooc.add(tok, context, 1);
                        }
                    }
                }
            }
    }

    fn count_partitioned(pool: &ThreadPool,
        window_size: usize,
        sequences: &[Sentence],
        targets: &Vocabulary,
        contexts: &Vocabulary) -> CooccurrenceTable {

        // sentence partitions are independent, tables are merged by summation
        pool.install(|| {
            sequences.par_chunks(Counts::PARTITION_SIZE).map(|part| {
                let mut tup2cooc = CooccurrenceTable::default();
                Counts::count(window_size, part, targets, contexts, &mut tup2cooc);
                tup2cooc
            }).reduce(CooccurrenceTable::default, |mut a, b| {
                a.merge(b);
                a
            })
        })
    }

    /// scans `source` once and returns the co-occurrence table. With `num_threads` > 1 the
    /// counting is spread over a rayon pool, the result is the same as the sequential scan.
    pub fn run<S: SentenceSource>(source: &S,
        targets: &Vocabulary,
        contexts: &Vocabulary,
        window_size: usize,
        num_threads: usize) -> Result<CooccurrenceTable> {

        let timer = Instant::now();
        info!("counting cooccurrences of {} targets with {} contexts, window size {}", targets.len(), contexts.len(), window_size);

        let mut tup2cooc = CooccurrenceTable::default();

        if num_threads <= 1 {
            for sentence in source.sentences()? {
                Counts::count(window_size, &[sentence?], targets, contexts, &mut tup2cooc);
            }
        } else {
            let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;
            let mut chunk: Vec<Sentence> = Vec::with_capacity(Counts::CHUNK_SIZE);
            let mut n_chunks = 0;

            for sentence in source.sentences()? {
                chunk.push(sentence?);
                if chunk.len() == Counts::CHUNK_SIZE {
                    tup2cooc.merge(Counts::count_partitioned(&pool, window_size, &chunk, targets, contexts));
                    chunk.clear();
                    n_chunks += 1;
                    debug!("counted chunk {} ({} sentences so far)", n_chunks, n_chunks * Counts::CHUNK_SIZE);
                }
            }
            if !chunk.is_empty() {
                tup2cooc.merge(Counts::count_partitioned(&pool, window_size, &chunk, targets, contexts));
            }
        }

        info!("found {} cooccurring pairs for {} targets, took {} seconds", tup2cooc.n_pairs(), tup2cooc.n_targets(), timer.elapsed().as_secs());
        Ok(tup2cooc)
    }
}


#[cfg(test)]
mod tests {

    use super::{CooccurrenceTable, Counts};
    use crate::token::{Sentence, Token};
    use crate::vocabulary::Vocabulary;

    fn tok(form: &str) -> Token {
        [form].into_iter().collect()
    }

    fn sentence(forms: &str) -> Sentence {
        forms.split(' ').map(tok).collect()
    }

    fn vocab(forms: &str) -> Vocabulary {
        Vocabulary::new(forms.split(' ').map(tok))
    }

    fn count_one(s: &str, targets: &str, contexts: &str, window_size: usize) -> CooccurrenceTable {
        let corpus = vec![sentence(s)];
        Counts::run(&corpus, &vocab(targets), &vocab(contexts), window_size, 1).unwrap()
    }

    #[test]
    fn window_is_symmetric() {
        let table = count_one("a b T c d", "T", "a b c d", 2);
        for c in ["a", "b", "c", "d"] {
            assert_eq!(table.get(&tok("T"), &tok(c)), 1);
        }
        assert_eq!(table.n_pairs(), 4);
    }

    #[test]
    fn window_excludes_far_tokens() {
        let table = count_one("a b T c d", "T", "a b c d", 1);
        assert_eq!(table.get(&tok("T"), &tok("a")), 0);
        assert_eq!(table.get(&tok("T"), &tok("b")), 1);
        assert_eq!(table.get(&tok("T"), &tok("c")), 1);
        assert_eq!(table.get(&tok("T"), &tok("d")), 0);
        // reading absent pairs does not create them
        assert_eq!(table.n_pairs(), 2);
    }

    #[test]
    fn window_clips_at_sentence_boundary() {
        let table = count_one("T x", "T", "x", 5);
        assert_eq!(table.get(&tok("T"), &tok("x")), 1);
        assert_eq!(table.n_pairs(), 1);
    }

    #[test]
    fn own_position_is_never_counted() {
        let table = count_one("T T", "T", "T", 1);
        // each occurrence sees the other one, never itself
        assert_eq!(table.get(&tok("T"), &tok("T")), 2);

        let single = count_one("T", "T", "T", 3);
        assert!(single.is_empty());
    }

    #[test]
    fn zero_window_counts_nothing() {
        let corpus = vec![sentence("T T a")];
        let mut table = CooccurrenceTable::default();
        Counts::count(0, &corpus[..], &vocab("T"), &vocab("T a"), &mut table);
        assert!(table.is_empty());
    }

    #[test]
    fn no_context_across_sentences() {
        let corpus = vec![sentence("a T"), sentence("b c")];
        let table = Counts::run(&corpus, &vocab("T"), &vocab("a b c"), 3, 1).unwrap();
        assert_eq!(table.get(&tok("T"), &tok("a")), 1);
        assert_eq!(table.get(&tok("T"), &tok("b")), 0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let base = [
            "the cat sat on the mat",
            "the dog sat on the cat",
            "a dog and a cat",
            "on the mat the dog slept",
        ];
        let corpus: Vec<Sentence> = (0..3000).map(|i| sentence(base[i % base.len()])).collect();
        let targets = vocab("cat dog mat");
        let contexts = vocab("the sat on a cat dog");

        let sequential = Counts::run(&corpus, &targets, &contexts, 2, 1).unwrap();
        let parallel = Counts::run(&corpus, &targets, &contexts, 2, 4).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential, Counts::run(&corpus, &targets, &contexts, 2, 1).unwrap());
    }

    #[test]
    fn merge_sums_counts() {
        let mut a = CooccurrenceTable::default();
        a.add(&tok("t"), &tok("c"), 2);
        let mut b = CooccurrenceTable::default();
        b.add(&tok("t"), &tok("c"), 3);
        b.add(&tok("t"), &tok("d"), 1);
        a.merge(b);
        assert_eq!(a.get(&tok("t"), &tok("c")), 5);
        assert_eq!(a.get(&tok("t"), &tok("d")), 1);
    }
}
