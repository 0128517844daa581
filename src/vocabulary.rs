use crate::frequency::{filter_by_pos, filter_by_threshold};
use crate::token::{Token, TokenIndex};

use std::collections::HashSet;
use std::fmt::Display;


/// How the targets (or contexts) of a run are picked out of the ranked frequency list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    /// keep only tokens whose attribute at `pos_position` is in this list
    pub pos: Option<Vec<String>>,
    pub pos_position: usize,
    /// keep only tokens seen strictly more often than this
    pub min_freq: usize,
    /// keep at most the `limit` most frequent of the remaining tokens
    pub limit: Option<usize>,
}

impl Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pos: {:?} (attribute {}), min_freq: {}, limit: {:?}", self.pos, self.pos_position, self.min_freq, self.limit)
    }
}


/// A set of target or context tokens. Membership is a hash lookup; the ranked
/// order is kept as well since it decides the matrix ids.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    tokens: Vec<Token>,
    members: HashSet<Token>,
}

impl Vocabulary {

    pub fn new<I: IntoIterator<Item = Token>>(tokens: I) -> Vocabulary {
        let mut vocab = Vocabulary::default();
        for token in tokens {
            if vocab.members.insert(token.clone()) {
                vocab.tokens.push(token);
            }
        }
        vocab
    }

    /// applies `selection` to a ranked (descending count) frequency list
    pub fn select(sorted_freqs: &[(Token, usize)], selection: &Selection) -> Vocabulary {

        let mut kept = filter_by_threshold(sorted_freqs, selection.min_freq);
        if let Some(pos) = &selection.pos {
            kept = filter_by_pos(&kept, pos, selection.pos_position);
        }
        if let Some(limit) = selection.limit {
            kept.truncate(limit);
        }

        Vocabulary::new(kept.into_iter().map(|(token, _)| token))
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.members.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// ids follow the vocabulary order
    pub fn index(&self) -> TokenIndex {
        TokenIndex::from_tokens(&self.tokens)
    }
}
