use crate::error::{DsmError, Result};
use crate::ppmi::WeightedTable;
use crate::token::{Token, TokenIndex};

use ndarray::Array2;
use serde::{Serialize, Deserialize};


/// Row-major compressed sparse matrix. Entries that are not stored are zero.
/// Column ids are sorted inside every row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl SparseMatrix {

    /// builds the matrix from (row, column, value) triplets. The shape is never inferred,
    /// ids outside it are rejected and repeated (row, column) pairs are summed.
    pub fn from_triplets<I: IntoIterator<Item = (usize, usize, f32)>>(shape: (usize, usize), triplets: I) -> Result<SparseMatrix> {

        let (n_rows, n_cols) = shape;
        let mut entries: Vec<(usize, usize, f32)> = Vec::new();
        for (i, j, v) in triplets {
            if i >= n_rows || j >= n_cols {
                return Err(DsmError::IndexInconsistency(format!(
                    "entry ({}, {}) is outside a {} x {} matrix", i, j, n_rows, n_cols
                )))
            }
            entries.push((i, j, v));
        }

        // stable, so repeated entries are summed in input order
        entries.sort_by_key(|(i, j, _)| (*i, *j));

        let n_ptr = n_rows.checked_add(1).ok_or_else(|| DsmError::InvalidArgument(format!("{} rows cannot be addressed", n_rows)))?;
        let mut indptr = vec![0; n_ptr];
        let mut indices: Vec<usize> = Vec::with_capacity(entries.len());
        let mut data: Vec<f32> = Vec::with_capacity(entries.len());
        let mut last: Option<(usize, usize)> = None;

        for (i, j, v) in entries {
            if last == Some((i, j)) {
                if let Some(x) = data.last_mut() {
                    *x += v;
                }
                continue
            }
            indices.push(j);
            data.push(v);
            indptr[i + 1] += 1;
            last = Some((i, j));
        }

        for i in 0..n_rows {
            indptr[i + 1] += indptr[i];
        }

        Ok(Self { shape, indptr, indices, data })
    }

    /// checks the compressed layout of a matrix that did not come out of `from_triplets`:
    /// one pointer per row plus one, non-decreasing, ending at the entry count, and
    /// column ids inside the shape and strictly increasing within each row
    pub fn validate(&self) -> Result<()> {

        let (n_rows, n_cols) = self.shape;
        let inconsistent = |reason: String| -> Result<()> { Err(DsmError::IndexInconsistency(reason)) };

        if n_rows.checked_add(1) != Some(self.indptr.len()) {
            return inconsistent(format!("{} row pointers for {} rows", self.indptr.len(), n_rows))
        }
        if self.indices.len() != self.data.len() {
            return inconsistent(format!("{} column ids for {} values", self.indices.len(), self.data.len()))
        }
        if self.indptr.first() != Some(&0) || self.indptr.last() != Some(&self.indices.len()) {
            return inconsistent(format!("row pointers must run from 0 to {}", self.indices.len()))
        }

        for (i, bounds) in self.indptr.windows(2).enumerate() {
            let (start, end) = (bounds[0], bounds[1]);
            if start > end {
                return inconsistent(format!("row {} ends before it starts", i))
            }
            let row = &self.indices[start..end];
            if let Some(j) = row.iter().find(|j| **j >= n_cols) {
                return inconsistent(format!("column id {} in row {} is outside {} columns", j, i, n_cols))
            }
            if row.windows(2).any(|w| w[0] >= w[1]) {
                return inconsistent(format!("column ids of row {} are not strictly increasing", i))
            }
        }
        Ok(())
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    /// number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// value at (i, j), zero when nothing is stored there
    pub fn get(&self, i: usize, j: usize) -> f32 {
        if i >= self.nrows() {
            return 0.0
        }
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        match self.indices[start..end].binary_search(&j) {
            Ok(k) => self.data[start + k],
            Err(_) => 0.0
        }
    }

    /// stored (column, value) pairs of row `i`
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let (start, end) = if i < self.nrows() { (self.indptr[i], self.indptr[i + 1]) } else { (0, 0) };
        self.indices[start..end].iter().copied().zip(self.data[start..end].iter().copied())
    }

    /// stored (row, column, value) triplets in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.nrows()).flat_map(move |i| self.row(i).map(move |(j, v)| (i, j, v)))
    }

    pub fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::zeros(self.shape);
        for (i, j, v) in self.iter() {
            dense[[i, j]] = v;
        }
        dense
    }
}


/// One nonzero entry together with the tokens labelling its row and column
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixRecord {
    pub row_id: usize,
    pub row_token: Token,
    pub column_id: usize,
    pub column_token: Token,
    pub weight: f32,
}


/// The durable model: target x context matrix plus the index of each axis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemanticSpace {
    pub matrix: SparseMatrix,
    pub rows: TokenIndex,
    pub columns: TokenIndex,
}

impl SemanticSpace {

    /// assembles a matrix of the declared `shape` from labelled records. A token seen with two
    /// ids, an id seen with two tokens, or an id outside the shape fails the whole assembly.
    pub fn assemble<I: IntoIterator<Item = MatrixRecord>>(records: I, shape: (usize, usize)) -> Result<SemanticSpace> {

        let mut rows = TokenIndex::new();
        let mut columns = TokenIndex::new();
        let mut triplets: Vec<(usize, usize, f32)> = Vec::new();

        for record in records {
            if record.row_id >= shape.0 {
                return Err(DsmError::IndexInconsistency(format!("row id {} is outside {} rows", record.row_id, shape.0)))
            }
            if record.column_id >= shape.1 {
                return Err(DsmError::IndexInconsistency(format!("column id {} is outside {} columns", record.column_id, shape.1)))
            }
            rows.insert(record.row_token, record.row_id)?;
            columns.insert(record.column_token, record.column_id)?;
            triplets.push((record.row_id, record.column_id, record.weight));
        }

        let matrix = SparseMatrix::from_triplets(shape, triplets)?;
        Ok(Self { matrix, rows, columns })
    }

    /// lays a weighted table out on the given indices, which must be dense
    pub fn from_weighted(table: &WeightedTable, rows: TokenIndex, columns: TokenIndex) -> Result<SemanticSpace> {

        if !rows.is_dense() || !columns.is_dense() {
            return Err(DsmError::IndexInconsistency("row and column indices must use ids 0..len".to_string()))
        }

        let mut triplets: Vec<(usize, usize, f32)> = Vec::with_capacity(table.n_pairs());
        for (target, context, weight) in table.iter() {
            let i = rows.id(target).ok_or_else(|| DsmError::IndexInconsistency(format!("target {} has no row", target)))?;
            let j = columns.id(context).ok_or_else(|| DsmError::IndexInconsistency(format!("context {} has no column", context)))?;
            triplets.push((i, j, weight as f32));
        }

        let matrix = SparseMatrix::from_triplets((rows.len(), columns.len()), triplets)?;
        Ok(Self { matrix, rows, columns })
    }

    /// checks that the matrix layout is sound and that both indices are bijections
    /// whose ids fit the matrix shape
    pub fn validate(&self) -> Result<()> {
        self.matrix.validate()?;
        self.rows.validate(self.matrix.nrows())?;
        self.columns.validate(self.matrix.ncols())
    }

    /// weight for the (target, context) tokens, zero when absent
    pub fn weight(&self, target: &Token, context: &Token) -> f32 {
        match (self.rows.id(target), self.columns.id(context)) {
            (Some(i), Some(j)) => self.matrix.get(i, j),
            _ => 0.0
        }
    }

    /// every stored entry with its labels, in row-major order
    pub fn records(&self) -> Result<Vec<MatrixRecord>> {
        self.matrix.iter().map(|(i, j, weight)| {
            let row_token = self.rows.token(i).ok_or_else(|| DsmError::IndexInconsistency(format!("row {} has no token", i)))?;
            let column_token = self.columns.token(j).ok_or_else(|| DsmError::IndexInconsistency(format!("column {} has no token", j)))?;
            Ok(MatrixRecord {
                row_id: i,
                row_token: row_token.to_owned(),
                column_id: j,
                column_token: column_token.to_owned(),
                weight
            })
        }).collect()
    }
}


#[cfg(test)]
mod tests {

    use super::{MatrixRecord, SemanticSpace, SparseMatrix};
    use crate::error::DsmError;
    use crate::ppmi::Ppmi;
    use crate::cooccurrence::CooccurrenceTable;
    use crate::frequency::FrequencyTable;
    use crate::token::{Token, TokenIndex};

    fn tok(form: &str) -> Token {
        [form].into_iter().collect()
    }

    fn record(row_id: usize, row: &str, column_id: usize, column: &str, weight: f32) -> MatrixRecord {
        MatrixRecord { row_id, row_token: tok(row), column_id, column_token: tok(column), weight }
    }

    #[test]
    fn triplets_round_trip() {
        let triplets = vec![(2, 0, 1.5), (0, 3, 0.25), (0, 1, 2.0), (1, 1, 4.0)];
        let m = SparseMatrix::from_triplets((3, 4), triplets).unwrap();

        let back: Vec<(usize, usize, f32)> = m.iter().collect();
        assert_eq!(back, vec![(0, 1, 2.0), (0, 3, 0.25), (1, 1, 4.0), (2, 0, 1.5)]);
        assert_eq!(m.nnz(), 4);
        assert_eq!(m.get(0, 3), 0.25);
        assert_eq!(m.get(0, 2), 0.0);
        assert_eq!(m.get(7, 0), 0.0);
    }

    #[test]
    fn duplicates_are_summed() {
        let m = SparseMatrix::from_triplets((2, 2), vec![(1, 0, 1.0), (0, 0, 0.5), (1, 0, 2.0)]).unwrap();
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![(0, 0, 0.5), (1, 0, 3.0)]);
    }

    #[test]
    fn shape_is_declared_not_inferred() {
        let m = SparseMatrix::from_triplets((5, 6), vec![(0, 0, 1.0)]).unwrap();
        assert_eq!(m.shape(), (5, 6));
        assert_eq!(m.row(4).count(), 0);

        let dense = m.to_dense();
        assert_eq!(dense.dim(), (5, 6));
        assert_eq!(dense[[0, 0]], 1.0);

        let outside = SparseMatrix::from_triplets((2, 2), vec![(0, 2, 1.0)]);
        assert!(matches!(outside, Err(DsmError::IndexInconsistency(_))));
    }

    #[test]
    fn unaddressable_row_count_is_rejected() {
        let m = SparseMatrix::from_triplets((usize::MAX, 1), Vec::new());
        assert!(matches!(m, Err(DsmError::InvalidArgument(_))));
    }

    #[test]
    fn corrupt_layouts_fail_validation() {
        let good = SparseMatrix::from_triplets((2, 3), vec![(0, 2, 1.0), (0, 0, 0.5), (1, 1, 2.0)]).unwrap();
        assert!(good.validate().is_ok());

        let corrupt = |indptr: Vec<usize>, indices: Vec<usize>, data: Vec<f32>| {
            SparseMatrix { shape: (2, 3), indptr, indices, data }.validate()
        };
        // pointer past the stored entries
        assert!(matches!(corrupt(vec![0, 3, 3], vec![0], vec![1.0]), Err(DsmError::IndexInconsistency(_))));
        // wrong pointer count
        assert!(matches!(corrupt(vec![0, 1], vec![0], vec![1.0]), Err(DsmError::IndexInconsistency(_))));
        // decreasing pointers
        assert!(matches!(corrupt(vec![0, 2, 1], vec![0], vec![1.0]), Err(DsmError::IndexInconsistency(_))));
        // ids and values disagree
        assert!(matches!(corrupt(vec![0, 1, 1], vec![0], vec![1.0, 2.0]), Err(DsmError::IndexInconsistency(_))));
        // column outside the shape
        assert!(matches!(corrupt(vec![0, 1, 1], vec![3], vec![1.0]), Err(DsmError::IndexInconsistency(_))));
        // unsorted row
        assert!(matches!(corrupt(vec![0, 2, 2], vec![2, 0], vec![1.0, 1.0]), Err(DsmError::IndexInconsistency(_))));
    }

    #[test]
    fn space_validation_checks_indices() {
        let records = vec![record(0, "cat", 1, "purr", 2.0), record(1, "dog", 0, "bark", 3.0)];
        let space = SemanticSpace::assemble(records, (2, 2)).unwrap();
        assert!(space.validate().is_ok());

        let mut too_many_rows = space.clone();
        too_many_rows.rows.insert(tok("owl"), 5).unwrap();
        assert!(matches!(too_many_rows.validate(), Err(DsmError::IndexInconsistency(_))));
    }

    #[test]
    fn assemble_from_records() {
        let records = vec![
            record(0, "cat", 1, "purr", 2.0),
            record(1, "dog", 0, "bark", 3.0),
            record(0, "cat", 0, "bark", 0.5),
        ];
        let space = SemanticSpace::assemble(records.clone(), (3, 2)).unwrap();

        assert_eq!(space.matrix.shape(), (3, 2));
        assert_eq!(space.rows.id(&tok("dog")), Some(1));
        assert_eq!(space.columns.id(&tok("purr")), Some(1));
        assert_eq!(space.weight(&tok("cat"), &tok("purr")), 2.0);
        assert_eq!(space.weight(&tok("dog"), &tok("purr")), 0.0);

        let mut expected = records;
        expected.sort_by_key(|r| (r.row_id, r.column_id));
        assert_eq!(space.records().unwrap(), expected);
    }

    #[test]
    fn assemble_rejects_conflicts() {
        let conflict = vec![record(0, "cat", 0, "bark", 1.0), record(1, "cat", 0, "bark", 1.0)];
        assert!(matches!(SemanticSpace::assemble(conflict, (2, 1)), Err(DsmError::IndexInconsistency(_))));

        let shared_id = vec![record(0, "cat", 0, "bark", 1.0), record(0, "dog", 0, "bark", 1.0)];
        assert!(matches!(SemanticSpace::assemble(shared_id, (2, 1)), Err(DsmError::IndexInconsistency(_))));

        let outside = vec![record(2, "cat", 0, "bark", 1.0)];
        assert!(matches!(SemanticSpace::assemble(outside, (2, 1)), Err(DsmError::IndexInconsistency(_))));
    }

    #[test]
    fn from_weighted_uses_vocabulary_ids() {
        let freqs: FrequencyTable = vec![(tok("t"), 2), (tok("c"), 5), (tok("d"), 3)].into_iter().collect();
        let mut cooc = CooccurrenceTable::default();
        cooc.add(&tok("t"), &tok("c"), 2);
        cooc.add(&tok("t"), &tok("d"), 1);
        let weighted = Ppmi::weigh(&cooc, &freqs, &freqs, 10).unwrap();

        let rows = TokenIndex::from_tokens(&[tok("u"), tok("t")]);
        let columns = TokenIndex::from_tokens(&[tok("d"), tok("c")]);
        let space = SemanticSpace::from_weighted(&weighted, rows, columns).unwrap();

        assert_eq!(space.matrix.shape(), (2, 2));
        assert_eq!(space.matrix.row(0).count(), 0);
        assert!((space.matrix.get(1, 1) - 1.0).abs() < 1e-6);
        assert!((space.weight(&tok("t"), &tok("d")) - (5.0f32 / 3.0).log2()).abs() < 1e-6);

        let missing_row = TokenIndex::from_tokens(&[tok("u")]);
        let result = SemanticSpace::from_weighted(&weighted, missing_row, TokenIndex::from_tokens(&[tok("c"), tok("d")]));
        assert!(matches!(result, Err(DsmError::IndexInconsistency(_))));
    }
}
