//! Dense, fixed-size, row-major 2D container addressed by `(row, column)`.

use serde::Serialize;
use shared::{
    domain::Coordinate,
    error::{ErrorCode, GridFault},
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("matrix dimensions must be positive, got {rows}x{columns}")]
    InvalidDimensions { rows: usize, columns: usize },
    #[error("({row}, {column}) is outside a {rows}x{columns} matrix")]
    OutOfBounds {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },
    #[error("row {row} has {actual} entries, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl From<&MatrixError> for GridFault {
    fn from(value: &MatrixError) -> Self {
        let code = match value {
            MatrixError::InvalidDimensions { .. } => ErrorCode::InvalidDimensions,
            MatrixError::OutOfBounds { .. } => ErrorCode::OutOfBounds,
            MatrixError::RaggedRows { .. } => ErrorCode::RaggedRows,
        };
        GridFault::new(code, value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix<T> {
    rows: usize,
    columns: usize,
    entries: Vec<T>,
}

impl<T> Matrix<T> {
    /// Builds a matrix by calling `generator` exactly once per coordinate.
    pub fn create<F>(rows: usize, columns: usize, mut generator: F) -> Result<Self, MatrixError>
    where
        F: FnMut(usize, usize) -> T,
    {
        if rows == 0 || columns == 0 {
            return Err(MatrixError::InvalidDimensions { rows, columns });
        }

        let mut entries = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                entries.push(generator(row, column));
            }
        }

        Ok(Self {
            rows,
            columns,
            entries,
        })
    }

    pub fn try_from_rows(rows: Vec<Vec<T>>) -> Result<Self, MatrixError> {
        let row_count = rows.len();
        let columns = rows.first().map(Vec::len).unwrap_or_default();
        if row_count == 0 || columns == 0 {
            return Err(MatrixError::InvalidDimensions {
                rows: row_count,
                columns,
            });
        }

        if let Some((row, entries)) = rows
            .iter()
            .enumerate()
            .find(|(_, entries)| entries.len() != columns)
        {
            return Err(MatrixError::RaggedRows {
                row,
                expected: columns,
                actual: entries.len(),
            });
        }

        Ok(Self {
            rows: row_count,
            columns,
            entries: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        row < self.rows && column < self.columns
    }

    fn index_of(&self, row: usize, column: usize) -> Result<usize, MatrixError> {
        if !self.contains(row, column) {
            return Err(MatrixError::OutOfBounds {
                row,
                column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(row * self.columns + column)
    }

    pub fn get_ref(&self, row: usize, column: usize) -> Result<&T, MatrixError> {
        let index = self.index_of(row, column)?;
        Ok(&self.entries[index])
    }

    /// Replaces exactly one entry; neighbors are untouched.
    pub fn set(&mut self, row: usize, column: usize, value: T) -> Result<(), MatrixError> {
        let index = self.index_of(row, column)?;
        self.entries[index] = value;
        Ok(())
    }

    /// Positional transform: `transform` sees coordinates only, never the current entry.
    pub fn map<V, F>(&self, mut transform: F) -> Matrix<V>
    where
        F: FnMut(usize, usize) -> V,
    {
        let mut entries = Vec::with_capacity(self.entries.len());
        self.for_each(|row, column| entries.push(transform(row, column)));
        Matrix {
            rows: self.rows,
            columns: self.columns,
            entries,
        }
    }

    /// Row-major visit of every coordinate.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(usize, usize),
    {
        for row in 0..self.rows {
            for column in 0..self.columns {
                visit(row, column);
            }
        }
    }

    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.columns).map(move |column| Coordinate::new(row, column)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, &T)> + '_ {
        self.coordinates().zip(self.entries.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter()
    }
}

impl<T: Clone> Matrix<T> {
    pub fn get(&self, row: usize, column: usize) -> Result<T, MatrixError> {
        self.get_ref(row, column).cloned()
    }

    pub fn at(&self, coordinate: Coordinate) -> Result<T, MatrixError> {
        self.get(coordinate.row, coordinate.column)
    }

    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.entries
            .chunks(self.columns)
            .map(<[T]>::to_vec)
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
