// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! A dense row-major matrix of `f64` features.

/// Row-major feature matrix with a fixed number of columns.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    num_columns: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Creates an empty matrix with `num_columns` columns.
    #[inline]
    pub fn new(num_columns: usize) -> Self {
        Self {
            num_columns,
            data: Vec::new(),
        }
    }

    /// Creates an empty matrix with room for `rows` rows.
    #[inline]
    pub fn with_capacity(rows: usize, num_columns: usize) -> Self {
        Self {
            num_columns,
            data: Vec::with_capacity(rows * num_columns),
        }
    }

    /// Creates a zero matrix of the given shape.
    #[inline]
    pub fn zeros(rows: usize, num_columns: usize) -> Self {
        Self {
            num_columns,
            data: vec![0.0; rows * num_columns],
        }
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        if self.num_columns == 0 {
            0
        } else {
            self.data.len() / self.num_columns
        }
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends a row.
    #[inline]
    pub fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(
            row.len(),
            self.num_columns,
            "called `FeatureMatrix::push_row` with a row of length {} but the matrix has {} columns",
            row.len(),
            self.num_columns
        );
        self.data.extend_from_slice(row);
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.num_columns;
        &self.data[start..start + self.num_columns]
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.data[row * self.num_columns + column]
    }

    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        self.data[row * self.num_columns + column] = value;
    }

    /// The underlying row-major storage.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl std::fmt::Display for FeatureMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FeatureMatrix({}x{})", self.num_rows(), self.num_columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_access() {
        let mut m = FeatureMatrix::new(2);
        assert!(m.is_empty());
        m.push_row(&[1.0, 2.0]);
        m.push_row(&[3.0, 4.0]);
        assert_eq!(m.num_rows(), 2);
        assert_eq!(m.row(1), &[3.0, 4.0]);
        m.set(0, 1, 5.0);
        assert_eq!(m.get(0, 1), 5.0);
        assert_eq!(format!("{}", m), "FeatureMatrix(2x2)");
        assert_eq!(FeatureMatrix::zeros(3, 4).as_slice().len(), 12);
    }
}
