use crate::error::{DsmError, Result};
use crate::matrix::SemanticSpace;
use crate::token::{Token, TokenIndex};

use ndarray::prelude::*;


/// cosine of two vectors, zero when either of them is all zeros
pub fn cosine(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0
    }
    a.dot(&b) / (norm_a * norm_b)
}


/// Dense, L2 normalised copy of the labelled rows of a space. Dot products between
/// rows are then cosine similarities.
pub struct Similarity {
    w: Array2<f32>,
    t2i: TokenIndex,
}

impl Similarity {

    pub fn new(space: &SemanticSpace) -> Similarity {

        // rows without a token cannot be reported, keep the labelled ones in id order
        let labelled = space.rows.ordered();
        let mut w: Array2<f32> = Array2::zeros((labelled.len(), space.matrix.ncols()));
        for (k, (i, _)) in labelled.iter().enumerate() {
            for (j, v) in space.matrix.row(*i) {
                w[[k, j]] = v;
            }
        }

        // need to normalize w so each entry norm l2 is 1, all-zero rows stay zero
        for mut row in w.axis_iter_mut(Axis(0)) {
            let norm = row.mapv(|a| a.powi(2)).sum().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|a| a / norm);
            }
        }

        let t2i = TokenIndex::from_tokens(labelled.into_iter().map(|(_, t)| t));
        Self { w, t2i }
    }

    /// the tokens labelling the rows of `matrix`, ids follow the row order of the space
    pub fn index(&self) -> &TokenIndex {
        &self.t2i
    }

    pub fn vector(&self, token: &Token) -> Result<ArrayView1<f32>> {
        match self.t2i.id(token) {
            Some(i) => Ok(self.w.row(i)),
            None => Err(DsmError::InvalidArgument(format!("token {} is not a row of the matrix", token)))
        }
    }

    pub fn cosine(&self, a: &Token, b: &Token) -> Result<f32> {
        Ok(cosine(self.vector(a)?, self.vector(b)?))
    }

    /// all rows against all rows
    pub fn matrix(&self) -> Array2<f32> {
        self.w.dot(&self.w.t())
    }

    /// the given query rows against all rows, with the index labelling the query axis.
    /// A token asked for twice gets a single row.
    pub fn queries(&self, tokens: &[Token]) -> Result<(Array2<f32>, TokenIndex)> {

        let index = TokenIndex::from_tokens(tokens);
        let mut selected: Array2<f32> = Array2::zeros((index.len(), self.w.ncols()));
        for (k, token) in index.ordered() {
            let vec = self.vector(token)?;
            selected.row_mut(k).assign(&vec);
        }

        let scores = selected.dot(&self.w.t());
        Ok((scores, index))
    }
}


#[cfg(test)]
mod tests {

    use super::{cosine, Similarity};
    use crate::matrix::{MatrixRecord, SemanticSpace};
    use crate::token::Token;
    use ndarray::array;

    fn tok(form: &str) -> Token {
        [form].into_iter().collect()
    }

    fn space() -> SemanticSpace {
        let entries = [
            (0, "cat", 0, "purr", 3.0), (0, "cat", 1, "fur", 4.0),
            (1, "lion", 0, "purr", 6.0), (1, "lion", 1, "fur", 8.0),
            (2, "car", 2, "road", 1.0),
        ];
        let records = entries.iter().map(|(i, r, j, c, w)| MatrixRecord {
            row_id: *i, row_token: tok(r), column_id: *j, column_token: tok(c), weight: *w
        });
        SemanticSpace::assemble(records, (3, 3)).unwrap()
    }

    #[test]
    fn cosine_of_vectors() {
        let a = array![1.0f32, 0.0];
        let b = array![1.0f32, 1.0];
        assert!((cosine(a.view(), b.view()) - 1.0 / 2.0f32.sqrt()).abs() < 1e-6);
        assert_eq!(cosine(a.view(), array![0.0f32, 0.0].view()), 0.0);
    }

    #[test]
    fn rows_are_normalised() {
        let sim = Similarity::new(&space());
        let cat = sim.vector(&tok("cat")).unwrap();
        assert!((cat.dot(&cat) - 1.0).abs() < 1e-6);
        assert!((cat[0] - 0.6).abs() < 1e-6);

        assert!((sim.cosine(&tok("cat"), &tok("lion")).unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(sim.cosine(&tok("cat"), &tok("car")).unwrap(), 0.0);
        assert!(sim.vector(&tok("purr")).is_err());
    }

    #[test]
    fn full_and_query_matrices() {
        let sim = Similarity::new(&space());
        let full = sim.matrix();
        assert_eq!(full.dim(), (3, 3));
        assert!((full[[2, 2]] - 1.0).abs() < 1e-6);

        let (scores, index) = sim.queries(&[tok("car"), tok("car")]).unwrap();
        assert_eq!(scores.dim(), (1, 3));
        assert_eq!(index.id(&tok("car")), Some(0));
        assert!((scores[[0, 2]] - 1.0).abs() < 1e-6);
        assert_eq!(scores[[0, 0]], 0.0);
    }
}
