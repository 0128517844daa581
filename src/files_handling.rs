use crate::error::{DsmError, Result};
use crate::frequency::FrequencyTable;
use crate::matrix::{MatrixRecord, SemanticSpace};
use crate::neighbors::Neighbors;
use crate::token::{Token, TokenIndex};

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Writer, WriterBuilder};
use ndarray::ArrayView2;
use ndarray_npy::write_npy;


pub fn read_input<R: ReadFile>(file_path: &str) -> Result<R> {
    R::read_file(file_path)
}

pub fn save_output<S: SaveFile>(output_dir: &str, file_name: &str, item: &S) -> Result<()> {

    // create output folder
    fs::create_dir_all(output_dir)?;
    item.save_file(output_dir, file_name)
}

pub trait ReadFile: Sized {
    fn read_file(file_path: &str) -> Result<Self>;
}

pub trait SaveFile {
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()>;
}


fn out_path(output_dir: &str, file_name: &str, extension: &str) -> PathBuf {
    Path::new(output_dir).join(format!("{}.{}", file_name, extension))
}

// tab separated, no quoting: tokens never contain tabs but may contain quotes
fn tsv_writer(path: &Path) -> Result<Writer<File>> {
    let wrt = WriterBuilder::new()
    .delimiter(b'\t')
    .has_headers(false)
    .flexible(true)
    .quote_style(QuoteStyle::Never)
    .from_path(path)?;
    Ok(wrt)
}

fn tsv_records(path: &Path) -> Result<impl Iterator<Item = Result<StringRecord>>> {
    let rdr = ReaderBuilder::new()
    .delimiter(b'\t')
    .has_headers(false)
    .flexible(true)
    .quoting(false)
    .from_path(path)?;
    Ok(rdr.into_records().map(|r| r.map_err(DsmError::from)))
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn parse_field<T: std::str::FromStr>(record: &StringRecord, i: usize, what: &str) -> Result<T> {
    let raw = record.get(i).unwrap_or("");
    raw.trim().parse::<T>().map_err(|_| DsmError::MalformedRecord {
        line: line_of(record),
        reason: format!("field {} ('{}') is not a valid {}", i, raw, what)
    })
}

fn token_fields(record: &StringRecord, start: usize, width: usize) -> Token {
    record.iter().skip(start).take(width).map(|f| f.trim()).collect()
}


/// one `token components \t count` line per token, most frequent first
impl SaveFile for FrequencyTable {
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {
        let mut wrt = tsv_writer(&out_path(output_dir, file_name, "tsv"))?;
        for (token, count) in self.sorted() {
            let mut fields: Vec<String> = token.components().to_vec();
            fields.push(count.to_string());
            wrt.write_record(&fields)?;
        }
        wrt.flush()?;
        Ok(())
    }
}

/// the first record fixes the token width, every later record must have the same arity
impl ReadFile for FrequencyTable {
    fn read_file(file_path: &str) -> Result<Self> {
        let mut entries: Vec<(Token, usize)> = Vec::new();
        let mut arity: Option<usize> = None;
        for record in tsv_records(Path::new(file_path))? {
            let record = record?;
            if record.len() < 2 {
                return Err(DsmError::MalformedRecord {
                    line: line_of(&record),
                    reason: format!("expected token fields and a count, found {} fields", record.len())
                })
            }
            let expected = *arity.get_or_insert(record.len());
            if record.len() != expected {
                return Err(DsmError::MalformedRecord {
                    line: line_of(&record),
                    reason: format!("expected {} fields like the first record, found {}", expected, record.len())
                })
            }
            let count = parse_field::<usize>(&record, expected - 1, "count")?;
            entries.push((token_fields(&record, 0, expected - 1), count));
        }
        Ok(entries.into_iter().collect())
    }
}


/// reads `row_id, row token, column_id, column token, weight` records where each token has
/// `token_width` components. Any other arity is a malformed record.
pub fn read_matrix_records(file_path: &str, token_width: usize) -> Result<Vec<MatrixRecord>> {

    if token_width == 0 {
        return Err(DsmError::InvalidArgument("token width must be positive".to_string()))
    }

    let arity = 2 * token_width + 3;
    let mut records: Vec<MatrixRecord> = Vec::new();
    for record in tsv_records(Path::new(file_path))? {
        let record = record?;
        if record.len() != arity {
            return Err(DsmError::MalformedRecord {
                line: line_of(&record),
                reason: format!("expected {} fields, found {}", arity, record.len())
            })
        }

        let column_at = token_width + 1;
        records.push(MatrixRecord {
            row_id: parse_field(&record, 0, "row id")?,
            row_token: token_fields(&record, 1, token_width),
            column_id: parse_field(&record, column_at, "column id")?,
            column_token: token_fields(&record, column_at + 1, token_width),
            weight: parse_field(&record, arity - 1, "weight")?,
        });
    }
    Ok(records)
}

/// reads a persisted matrix back; the shape is not stored in the file and has to be given
pub fn load_space(file_path: &str, shape: (usize, usize), token_width: usize) -> Result<SemanticSpace> {
    let records = read_matrix_records(file_path, token_width)?;
    SemanticSpace::assemble(records, shape)
}

/// one token per line, components tab separated
pub fn read_tokens(file_path: &str) -> Result<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    for record in tsv_records(Path::new(file_path))? {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue
        }
        tokens.push(record.iter().map(|f| f.trim()).collect());
    }
    Ok(tokens)
}


/// writes `<name>.tsv`, one record per stored entry in row-major order, and `<name>.bin`,
/// a bincode snapshot of the whole space
impl SaveFile for SemanticSpace {
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {

        let mut wrt = tsv_writer(&out_path(output_dir, file_name, "tsv"))?;
        for record in self.records()? {
            let mut fields: Vec<String> = vec![record.row_id.to_string()];
            fields.extend(record.row_token.components().iter().cloned());
            fields.push(record.column_id.to_string());
            fields.extend(record.column_token.components().iter().cloned());
            fields.push(record.weight.to_string());
            wrt.write_record(&fields)?;
        }
        wrt.flush()?;

        let mut f = BufWriter::new(File::create(out_path(output_dir, file_name, "bin"))?);
        bincode::serialize_into(&mut f, self)?;
        Ok(())
    }
}

impl ReadFile for SemanticSpace {
    fn read_file(file_path: &str) -> Result<Self> {
        let f = BufReader::new(File::open(file_path)?);
        let item: SemanticSpace = bincode::deserialize_from(f)?;
        item.validate()?;
        Ok(item)
    }
}


/// Dense row vectors labelled by an index whose ids are the row positions
pub struct DenseVectors<'a> {
    pub vectors: ArrayView2<'a, f32>,
    pub index: &'a TokenIndex,
}

/// `<name>.tsv` with `token components \t vector components` by ascending row id, and
/// `<name>.npy` with the bare array
impl SaveFile for DenseVectors<'_> {
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {

        let mut wrt = tsv_writer(&out_path(output_dir, file_name, "tsv"))?;
        for (i, token) in self.index.ordered() {
            if i >= self.vectors.nrows() {
                return Err(DsmError::IndexInconsistency(format!("token {} points at row {} of {}", token, i, self.vectors.nrows())))
            }
            let mut fields: Vec<String> = token.components().to_vec();
            fields.extend(self.vectors.row(i).iter().map(|x| x.to_string()));
            wrt.write_record(&fields)?;
        }
        wrt.flush()?;

        write_npy(out_path(output_dir, file_name, "npy"), &self.vectors)?;
        Ok(())
    }
}


/// `query components \t rank \t neighbour components \t score`, ranks start at 1
impl SaveFile for Neighbors {
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {
        let mut wrt = tsv_writer(&out_path(output_dir, file_name, "tsv"))?;
        for (query, similar) in self {
            for (rank, (neighbor, score)) in similar.iter().enumerate() {
                let mut fields: Vec<String> = query.components().to_vec();
                fields.push((rank + 1).to_string());
                fields.extend(neighbor.components().iter().cloned());
                fields.push(score.to_string());
                wrt.write_record(&fields)?;
            }
        }
        wrt.flush()?;
        Ok(())
    }
}
