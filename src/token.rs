use crate::error::{DsmError, Result};

use std::collections::HashMap;
use std::fmt::Display;
use serde::{Serialize, Deserialize};

/// One corpus token, projected to the attributes kept for this run
/// (for example form, lemma, pos). Ordering is the lexical tuple ordering.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token(Vec<String>);

/// A sentence is just its tokens, in order
pub type Sentence = Vec<Token>;

impl Token {

    pub fn new(components: Vec<String>) -> Token {
        Token(components)
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// attribute at `position` of the projected tuple
    pub fn get(&self, position: usize) -> Option<&str> {
        self.0.get(position).map(|x| x.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for Token {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Token(iter.into_iter().map(|x| x.into()).collect())
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}


/// Bijection between tokens and dense matrix ids, kept for one axis of a matrix
/// (rows are targets, columns are contexts).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenIndex {
    t2i: HashMap<Token, usize>,
    i2t: HashMap<usize, Token>,
}

impl TokenIndex {

    pub fn new() -> TokenIndex {
        Self::default()
    }

    /// assigns ids 0, 1, 2, .. in iteration order, repeated tokens keep their first id
    pub fn from_tokens<'a, I: IntoIterator<Item = &'a Token>>(tokens: I) -> TokenIndex {
        let mut index = TokenIndex::new();
        for token in tokens {
            index.push(token.to_owned());
        }
        index
    }

    /// appends `token` with the next free id, or returns the id it already has
    pub fn push(&mut self, token: Token) -> usize {
        if let Some(i) = self.t2i.get(&token) {
            return *i
        }
        let i = self.t2i.len();
        self.i2t.insert(i, token.clone());
        self.t2i.insert(token, i);
        i
    }

    /// registers an explicit (token, id) pair. Re-registering the same pair is a no-op,
    /// giving a token a second id or an id a second token is rejected.
    pub fn insert(&mut self, token: Token, id: usize) -> Result<()> {

        if let Some(known) = self.t2i.get(&token) {
            if *known != id {
                return Err(DsmError::IndexInconsistency(format!(
                    "token {} has id {} but was also given id {}", token, known, id
                )))
            }
            return Ok(())
        }

        if let Some(known) = self.i2t.get(&id) {
            return Err(DsmError::IndexInconsistency(format!(
                "id {} belongs to token {} but was also given to {}", id, known, token
            )))
        }

        self.i2t.insert(id, token.clone());
        self.t2i.insert(token, id);
        Ok(())
    }

    pub fn id(&self, token: &Token) -> Option<usize> {
        self.t2i.get(token).copied()
    }

    pub fn token(&self, id: usize) -> Option<&Token> {
        self.i2t.get(&id)
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.t2i.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.t2i.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t2i.is_empty()
    }

    /// true when the ids are exactly 0..len
    pub fn is_dense(&self) -> bool {
        (0..self.len()).all(|i| self.i2t.contains_key(&i))
    }

    /// both maps hold the same pairs and every id is below `bound`
    pub fn validate(&self, bound: usize) -> Result<()> {
        if self.t2i.len() != self.i2t.len() {
            return Err(DsmError::IndexInconsistency(format!(
                "{} tokens but {} ids", self.t2i.len(), self.i2t.len()
            )))
        }
        for (token, id) in &self.t2i {
            if self.i2t.get(id) != Some(token) {
                return Err(DsmError::IndexInconsistency(format!("token {} and id {} do not map back to each other", token, id)))
            }
            if *id >= bound {
                return Err(DsmError::IndexInconsistency(format!("id {} of token {} is outside {} slots", id, token, bound)))
            }
        }
        Ok(())
    }

    /// (id, token) pairs by ascending id
    pub fn ordered(&self) -> Vec<(usize, &Token)> {
        let mut pairs: Vec<(usize, &Token)> = self.i2t.iter().map(|(i, t)| (*i, t)).collect();
        pairs.sort_by_key(|(i, _)| *i);
        pairs
    }
}
