use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Sub, Mul, Index, IndexMut};

/// Dense row-major matrix of `f64`.
///
/// Used for layer parameters (`rows x cols`), for dense activations
/// (`batch x features`) and for 1-D signals (`channels x length`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix from row-major data.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Matrix {
        assert_eq!(
            data.len(),
            rows * cols,
            "Matrix::from_vec: expected {}x{} = {} values, got {}",
            rows, cols, rows * cols, data.len()
        );
        Matrix { rows, cols, data }
    }

    /// Builds a matrix from equally sized rows. An empty input gives a 0x0 matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Matrix {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            assert_eq!(row.len(), n_cols, "Matrix::from_rows: ragged rows");
            data.extend(row);
        }
        Matrix { rows: n_rows, cols: n_cols, data }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both draws are in (0, 1] so ln() never sees 0.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: N(0, sqrt(2 / fan_in)).
    ///
    /// Recommended before ReLU-family activations. `fan_in` is passed
    /// explicitly because for convolution weights it is `in_channels * kernel`,
    /// not the number of columns of the stored matrix.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, fan_in: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / fan_in.max(1) as f64).sqrt();
        let data = (0..rows * cols)
            .map(|_| Matrix::sample_standard_normal(rng) * std_dev)
            .collect();
        Matrix { rows, cols, data }
    }

    /// Xavier (Glorot) initialization: N(0, sqrt(1 / fan_in)).
    ///
    /// Used for the linear classification head.
    pub fn xavier<R: Rng + ?Sized>(rows: usize, cols: usize, fan_in: usize, rng: &mut R) -> Matrix {
        let std_dev = (1.0 / fan_in.max(1) as f64).sqrt();
        let data = (0..rows * cols)
            .map(|_| Matrix::sample_standard_normal(rng) * std_dev)
            .collect();
        Matrix { rows, cols, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Copies the rows out, e.g. to hand per-sample score vectors to callers.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|r| self.row(r).to_vec()).collect()
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        self.assert_same_shape(other, "hadamard");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a * b).collect(),
        }
    }

    /// `self += other` without allocating.
    pub fn add_assign(&mut self, other: &Matrix) {
        self.assert_same_shape(other, "add_assign");
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }

    /// `self += alpha * other` without allocating.
    pub fn add_scaled(&mut self, other: &Matrix, alpha: f64) {
        self.assert_same_shape(other, "add_scaled");
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += alpha * b;
        }
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Matrix product `self · rhs` by reference.
    pub fn matmul(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!(
                "Matrices are of incorrect sizes: {}x{} · {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            )
        }
        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                let rhs_row = rhs.row(k);
                let out_row = res.row_mut(i);
                for (o, b) in out_row.iter_mut().zip(rhs_row) {
                    *o += a * b;
                }
            }
        }
        res
    }

    /// Mean of each row, returned as a column of length `rows`.
    pub fn row_means(&self) -> Vec<f64> {
        if self.cols == 0 {
            return vec![0.0; self.rows];
        }
        (0..self.rows)
            .map(|r| self.row(r).iter().sum::<f64>() / self.cols as f64)
            .collect()
    }

    fn assert_same_shape(&self, other: &Matrix, op: &str) {
        if self.rows != other.rows || self.cols != other.cols {
            panic!(
                "Matrices are of incorrect sizes for {}: {}x{} vs {}x{}",
                op, self.rows, self.cols, other.rows, other.cols
            )
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        &mut self.data[r * self.cols + c]
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(mut self, rhs: Self) -> Self::Output {
        self.add_assign(&rhs);
        self
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(mut self, rhs: Self) -> Self::Output {
        self.add_scaled(&rhs, -1.0);
        self
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        self.matmul(&rhs)
    }
}
