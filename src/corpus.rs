use crate::error::{DsmError, Result};
use crate::token::{Sentence, Token};

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use flate2::read::GzDecoder;


/// Native columns of the tagged corpus, in file order. Columns 8 and 9 are unused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    SId,
    Form,
    Lemma,
    Pos,
    PosFgrained,
    Morph,
    SynHead,
    SynRel,
    Mwe,
    Mwe2,
}

impl Column {

    /// position of the column within a corpus line
    pub fn position(&self) -> usize {
        match self {
            Column::SId => 0,
            Column::Form => 1,
            Column::Lemma => 2,
            Column::Pos => 3,
            Column::PosFgrained => 4,
            Column::Morph => 5,
            Column::SynHead => 6,
            Column::SynRel => 7,
            Column::Mwe => 10,
            Column::Mwe2 => 11,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::SId => "s_id",
            Column::Form => "form",
            Column::Lemma => "lemma",
            Column::Pos => "pos",
            Column::PosFgrained => "pos_fgrained",
            Column::Morph => "morph",
            Column::SynHead => "synhead",
            Column::SynRel => "synrel",
            Column::Mwe => "mwe",
            Column::Mwe2 => "mwe2",
        }
    }
}

impl FromStr for Column {
    type Err = DsmError;

    fn from_str(s: &str) -> Result<Self> {
        let column = match s {
            "s_id" => Column::SId,
            "form" => Column::Form,
            "lemma" => Column::Lemma,
            "pos" => Column::Pos,
            "pos_fgrained" => Column::PosFgrained,
            "morph" => Column::Morph,
            "synhead" => Column::SynHead,
            "synrel" => Column::SynRel,
            "mwe" => Column::Mwe,
            "mwe2" => Column::Mwe2,
            _ => return Err(DsmError::Config(format!("unknown corpus column '{}'", s)))
        };
        Ok(column)
    }
}


/// The attribute projection: which columns a token keeps, and in which order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenShape {
    columns: Vec<Column>,
}

impl TokenShape {

    pub fn new(columns: Vec<Column>) -> Result<TokenShape> {
        if columns.is_empty() {
            return Err(DsmError::Config("token shape needs at least one column".to_string()))
        }
        Ok(Self { columns })
    }

    pub fn parse(names: &[String]) -> Result<TokenShape> {
        let columns = names.iter().map(|name| name.parse()).collect::<Result<Vec<Column>>>()?;
        TokenShape::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// where `column` ends up inside a projected token
    pub fn position_of(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    fn project(&self, fields: &[&str], line: u64) -> Result<Token> {
        self.columns.iter().map(|column| {
            fields.get(column.position()).map(|x| x.to_string()).ok_or_else(|| DsmError::MalformedRecord {
                line,
                reason: format!("expected column '{}' at field {}, found {} fields", column.name(), column.position(), fields.len())
            })
        }).collect::<Result<Vec<String>>>().map(Token::new)
    }
}

impl Default for TokenShape {
    fn default() -> Self {
        Self { columns: vec![Column::Form, Column::Lemma, Column::Pos] }
    }
}

impl Display for TokenShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name()).collect();
        write!(f, "({})", names.join(", "))
    }
}


/// A corpus that can be scanned any number of times. Every call to `sentences`
/// opens a fresh cursor, independent of any earlier one.
pub trait SentenceSource {
    type Sentences: Iterator<Item = Result<Sentence>>;
    fn sentences(&self) -> Result<Self::Sentences>;
}

impl SentenceSource for Vec<Sentence> {
    type Sentences = std::vec::IntoIter<Result<Sentence>>;

    fn sentences(&self) -> Result<Self::Sentences> {
        Ok(self.iter().cloned().map(Ok).collect::<Vec<Result<Sentence>>>().into_iter())
    }
}


/// Tab separated, one token per line, sentences split by blank lines.
/// Lines opening with '<' are markup and ignored. Files ending in `.gz` are decompressed.
#[derive(Clone, Debug)]
pub struct ConllCorpus {
    path: PathBuf,
    shape: TokenShape,
}

impl ConllCorpus {

    pub fn new<P: AsRef<Path>>(path: P, shape: TokenShape) -> ConllCorpus {
        Self { path: path.as_ref().to_path_buf(), shape }
    }

    fn open(&self) -> Result<Box<dyn BufRead>> {
        let f = File::open(&self.path)?;
        let is_gz = self.path.extension().map_or(false, |ext| ext == "gz");
        if is_gz {
            Ok(Box::new(BufReader::new(GzDecoder::new(f))))
        } else {
            Ok(Box::new(BufReader::new(f)))
        }
    }
}

impl SentenceSource for ConllCorpus {
    type Sentences = ConllSentences;

    fn sentences(&self) -> Result<Self::Sentences> {
        Ok(ConllSentences {
            lines: self.open()?.lines(),
            shape: self.shape.clone(),
            line_no: 0,
            finished: false,
        })
    }
}

pub struct ConllSentences {
    lines: Lines<Box<dyn BufRead>>,
    shape: TokenShape,
    line_no: u64,
    finished: bool,
}

impl Iterator for ConllSentences {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {

        if self.finished {
            return None
        }

        let mut sentence: Sentence = Vec::new();
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e.into()))
                },
                None => {
                    self.finished = true;
                    if sentence.is_empty() { return None }
                    return Some(Ok(sentence))
                }
            };
            self.line_no += 1;

            if line.starts_with('<') {
                continue
            }

            let line = line.trim();
            if line.is_empty() {
                if sentence.is_empty() { continue }
                return Some(Ok(sentence))
            }

            let fields: Vec<&str> = line.split('\t').collect();
            match self.shape.project(&fields, self.line_no) {
                Ok(token) => sentence.push(token),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e))
                }
            }
        }
    }
}
