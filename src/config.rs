use crate::corpus::{Column, TokenShape};
use crate::error::{DsmError, Result};
use crate::vocabulary::Selection;

use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use serde_json::Value;


#[derive(Clone, Debug, PartialEq)]
pub struct RunParams {
    pub corpus_file: String,
    pub output_dir: String,
    pub token_shape: TokenShape,
    pub window_size: usize,
    pub num_threads: usize,
    pub targets: Selection,
    pub contexts: Selection,
    pub neighbors_k: Option<usize>,
    pub neighbors_queries: Option<String>,
    pub save_dense: bool,
}

impl Display for RunParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using parameters:
        corpus_file: {}
        output_dir: {}
        token_shape: {}
        window_size: {}
        num_threads: {}
        targets: {}
        contexts: {}
        neighbors_k: {:?}
        neighbors_queries: {:?}
        save_dense: {}",
        self.corpus_file, self.output_dir, self.token_shape, self.window_size, self.num_threads,
        self.targets, self.contexts, self.neighbors_k, self.neighbors_queries, self.save_dense)
    }
}


pub struct Config {
    params: RunParams
}

fn required_str(json: &Value, key: &str) -> Result<String> {
    match json.get(key) {
        Some(v) => v.as_str().map(|s| s.to_owned()).ok_or_else(|| DsmError::Config(format!("{} should be a string", key))),
        None => Err(DsmError::Config(format!("{} was not supplied through json", key)))
    }
}

fn optional_str(json: &Value, key: &str) -> Result<Option<String>> {
    match json.get(key) {
        Some(v) => v.as_str().map(|s| Some(s.to_owned())).ok_or_else(|| DsmError::Config(format!("{} should be a string", key))),
        None => Ok(None)
    }
}

fn optional_usize(json: &Value, key: &str) -> Result<Option<usize>> {
    match json.get(key) {
        Some(v) => {
            let x = v.as_u64().ok_or_else(|| DsmError::Config(format!("{} should be a non-negative integer", key)))?;
            usize::try_from(x).map(Some).map_err(|_| DsmError::Config(format!("{} = {} does not fit this platform", key, x)))
        },
        None => Ok(None)
    }
}

fn optional_strings(json: &Value, key: &str) -> Result<Option<Vec<String>>> {
    match json.get(key) {
        Some(Value::Array(items)) => items.iter().map(|item| {
            item.as_str().map(|s| s.to_owned()).ok_or_else(|| DsmError::Config(format!("{} should only hold strings", key)))
        }).collect::<Result<Vec<String>>>().map(Some),
        Some(_) => Err(DsmError::Config(format!("{} should be a list of strings", key))),
        None => Ok(None)
    }
}

fn selection(json: Option<&Value>, shape: &TokenShape, which: &str) -> Result<Selection> {

    let json = match json {
        Some(v) if v.is_object() => v,
        Some(_) => return Err(DsmError::Config(format!("{} should be an object", which))),
        None => return Ok(Selection::default())
    };

    let pos = optional_strings(json, "pos")?;
    let pos_position = match (optional_usize(json, "pos_position")?, &pos) {
        (Some(position), _) => position,
        (None, Some(_)) => shape.position_of(Column::Pos).ok_or_else(|| {
            DsmError::Config(format!("{} filter by pos, but the token shape {} has no pos column", which, shape))
        })?,
        (None, None) => 0
    };
    if pos.is_some() && pos_position >= shape.width() {
        return Err(DsmError::Config(format!("{} pos_position {} is outside the token shape {}", which, pos_position, shape)))
    }

    Ok(Selection {
        pos,
        pos_position,
        min_freq: optional_usize(json, "min_freq")?.unwrap_or(0),
        limit: optional_usize(json, "limit")?,
    })
}

impl Config {

    pub fn get_params(&self) -> RunParams {
        self.params.clone()
    }

    /// expects the program name followed by the path to a json file
    pub fn new(args: &[String]) -> Result<Config> {

        if args.len() != 2 {
            return Err(DsmError::Config("input should be a path to json file only".to_string()));
        }

        let f = BufReader::new(File::open(&args[1])?);
        let json: Value = serde_json::from_reader(f)?;
        Config::from_json(&json)
    }

    pub fn from_json(json: &Value) -> Result<Config> {

        // validate input and output in json
        let corpus_file = required_str(json, "corpus_file")?;
        let output_dir = required_str(json, "output_dir")?;

        // handle default vs input parameters
        let token_shape = match optional_strings(json, "token_shape")? {
            Some(names) => TokenShape::parse(&names)?,
            None => TokenShape::default()
        };
        let window_size = optional_usize(json, "window_size")?.unwrap_or(5);
        let num_threads = optional_usize(json, "num_threads")?.unwrap_or(1);
        let targets = selection(json.get("targets"), &token_shape, "targets")?;
        let contexts = selection(json.get("contexts"), &token_shape, "contexts")?;
        let neighbors_k = optional_usize(json, "neighbors_k")?;
        if neighbors_k == Some(0) {
            return Err(DsmError::Config("neighbors_k should be positive".to_string()))
        }
        let neighbors_queries = optional_str(json, "neighbors_queries")?;
        let save_dense = match json.get("save_dense") {
            Some(v) => v.as_bool().ok_or_else(|| DsmError::Config("save_dense should be boolean".to_string()))?,
            None => false
        };

        let params = RunParams {
            corpus_file,
            output_dir,
            token_shape,
            window_size,
            num_threads,
            targets,
            contexts,
            neighbors_k,
            neighbors_queries,
            save_dense,
        };

        Ok(Self { params })
    }
}


#[cfg(test)]
mod tests {

    use super::Config;
    use crate::corpus::{Column, TokenShape};
    use crate::error::DsmError;
    use serde_json::json;

    #[test]
    fn defaults() {
        let params = Config::from_json(&json!({"corpus_file": "c.conll", "output_dir": "out"})).unwrap().get_params();
        assert_eq!(params.token_shape, TokenShape::default());
        assert_eq!(params.window_size, 5);
        assert_eq!(params.num_threads, 1);
        assert_eq!(params.targets.pos, None);
        assert_eq!(params.targets.limit, None);
        assert_eq!(params.neighbors_k, None);
        assert!(!params.save_dense);
    }

    #[test]
    fn selections_and_shape() {
        let json = json!({
            "corpus_file": "c.conll",
            "output_dir": "out",
            "token_shape": ["lemma", "pos"],
            "window_size": 2,
            "targets": {"pos": ["N"], "min_freq": 10, "limit": 500},
            "contexts": {"pos": ["N", "V", "J"], "limit": 2000},
            "neighbors_k": 10
        });
        let params = Config::from_json(&json).unwrap().get_params();
        assert_eq!(params.token_shape, TokenShape::new(vec![Column::Lemma, Column::Pos]).unwrap());
        assert_eq!(params.window_size, 2);
        assert_eq!(params.targets.pos_position, 1);
        assert_eq!(params.targets.min_freq, 10);
        assert_eq!(params.targets.limit, Some(500));
        assert_eq!(params.contexts.pos.as_ref().map(|p| p.len()), Some(3));
        assert_eq!(params.neighbors_k, Some(10));
    }

    #[test]
    fn rejects_bad_input() {
        let missing = Config::from_json(&json!({"output_dir": "out"}));
        assert!(matches!(missing, Err(DsmError::Config(_))));

        let typed = Config::from_json(&json!({"corpus_file": "c", "output_dir": "o", "window_size": "two"}));
        assert!(matches!(typed, Err(DsmError::Config(_))));

        let no_pos = Config::from_json(&json!({"corpus_file": "c", "output_dir": "o", "token_shape": ["form"], "targets": {"pos": ["N"]}}));
        assert!(matches!(no_pos, Err(DsmError::Config(_))));

        assert!(Config::new(&["prog".to_string()]).is_err());
    }

    #[test]
    fn large_integers_are_never_truncated() {
        let result = Config::from_json(&json!({"corpus_file": "c", "output_dir": "o", "window_size": u64::MAX}));
        match usize::try_from(u64::MAX) {
            Ok(max) => assert_eq!(result.unwrap().get_params().window_size, max),
            Err(_) => assert!(matches!(result, Err(DsmError::Config(_)))),
        }

        let negative = Config::from_json(&json!({"corpus_file": "c", "output_dir": "o", "neighbors_k": -3}));
        assert!(matches!(negative, Err(DsmError::Config(_))));
    }
}
