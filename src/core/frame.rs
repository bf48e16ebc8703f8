use serde::{Deserialize, Serialize};

/// Dense row-major matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Matrix<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Write `src` (a `src_rows x src_cols` row-major block) transposed so that
    /// `self[c][col_offset + r] == src[r][c]`.
    pub(crate) fn put_transposed(
        &mut self,
        src: &[T],
        src_rows: usize,
        src_cols: usize,
        col_offset: usize,
    ) {
        if src_cols == 0 {
            return;
        }
        for (r, src_row) in src.chunks_exact(src_cols).take(src_rows).enumerate() {
            for (c, value) in src_row.iter().enumerate() {
                self.data[c * self.cols + col_offset + r] = *value;
            }
        }
    }

    /// Copy `src` into row `row` starting at column `col_offset`
    pub(crate) fn put_row(&mut self, row: usize, col_offset: usize, src: &[T]) {
        let start = row * self.cols + col_offset;
        self.data[start..start + src.len()].copy_from_slice(src);
    }

    /// Copy `src` down column `col`
    pub(crate) fn put_column(&mut self, col: usize, src: &[T]) {
        for (r, value) in src.iter().enumerate().take(self.rows) {
            self.data[r * self.cols + col] = *value;
        }
    }
}

impl<T> Matrix<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[T]> {
        if row < self.rows {
            Some(&self.data[row * self.cols..(row + 1) * self.cols])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

/// Channel-major acquisition unit handed to downstream consumers.
///
/// For a frame assembled from K packets of S samples and C channels every
/// per-sample matrix has S*K columns; `lfp_data` has one column per packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Emission order, starting at 0 for each acquisition
    pub sequence_id: u64,

    /// 1 x S*K
    pub start_trigger: Matrix<u8>,

    /// 1 x S*K
    pub synchronization: Matrix<u16>,

    /// (S+1) x S*K
    pub counters: Matrix<i32>,

    /// C x K
    pub lfp_data: Matrix<f32>,

    /// C x S*K
    pub ap_data: Matrix<f32>,

    /// Hardware input queue fill fraction at read time (advisory)
    pub buffer_capacity: f32,
}

impl Frame {
    /// Number of packets batched into this frame
    pub fn packet_count(&self) -> usize {
        self.lfp_data.cols()
    }

    /// Samples per channel (S*K)
    pub fn sample_count(&self) -> usize {
        self.ap_data.cols()
    }

    pub fn channel_count(&self) -> usize {
        self.ap_data.rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_transposed_at_offset() {
        let mut m: Matrix<i32> = Matrix::zeros(3, 4);
        // 2x3 block
        m.put_transposed(&[1, 2, 3, 4, 5, 6], 2, 3, 2);

        assert_eq!(m.row(0), Some(&[0, 0, 1, 4][..]));
        assert_eq!(m.row(1), Some(&[0, 0, 2, 5][..]));
        assert_eq!(m.row(2), Some(&[0, 0, 3, 6][..]));
    }

    #[test]
    fn test_get_out_of_bounds() {
        let m: Matrix<u8> = Matrix::zeros(1, 2);
        assert_eq!(m.get(0, 1), Some(&0));
        assert_eq!(m.get(1, 0), None);
        assert_eq!(m.get(0, 2), None);
    }
}
