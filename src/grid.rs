//! The grid the coordinator assembles.  A [`GridBuffer`] accepts each
//! row exactly once, in any order; once every row is in, it freezes
//! into a read-only [`Grid`] for whoever renders it.

use crate::error::{Error, Result};

/// Rows under assembly.  Lives on rank 0 only.
#[derive(Debug)]
pub struct GridBuffer {
    width: usize,
    height: usize,
    cells: Vec<f64>,
    written: Vec<bool>,
    remaining: usize,
}

impl GridBuffer {
    /// An empty buffer of `height` rows, `width` values each.
    pub fn new(width: usize, height: usize) -> Self {
        GridBuffer {
            width,
            height,
            cells: vec![0.0; width * height],
            written: vec![false; height],
            remaining: height,
        }
    }

    /// Values per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows in the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Stores `values` as row `row`.  A row may be written only once.
    pub fn write_row(&mut self, row: usize, values: &[f64]) -> Result<()> {
        if row >= self.height {
            return Err(Error::RowOutOfRange {
                row,
                height: self.height,
            });
        }
        if values.len() != self.width {
            return Err(Error::RowWidth {
                row,
                got: values.len(),
                width: self.width,
            });
        }
        if self.written[row] {
            return Err(Error::RowRewritten(row));
        }
        let start = row * self.width;
        self.cells[start..start + self.width].copy_from_slice(values);
        self.written[row] = true;
        self.remaining -= 1;
        Ok(())
    }

    /// Stores a block of rows laid end to end, one row per index in
    /// `rows`, in that order.
    pub fn write_rows<I>(&mut self, rows: I, block: &[f64]) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut chunks = block.chunks(self.width.max(1));
        for row in rows {
            let values = chunks.next().unwrap_or(&[]);
            self.write_row(row, values)?;
        }
        match chunks.next() {
            None => Ok(()),
            Some(extra) => Err(Error::RowWidth {
                row: self.height,
                got: extra.len(),
                width: self.width,
            }),
        }
    }

    /// True once every row has been written.
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Rows still missing, in increasing order.
    pub fn missing_rows(&self) -> Vec<usize> {
        self.written
            .iter()
            .enumerate()
            .filter(|(_, w)| !**w)
            .map(|(row, _)| row)
            .collect()
    }

    /// Freezes the buffer.  Fails if any row is missing.
    pub fn finish(self) -> Result<Grid> {
        if !self.is_complete() {
            return Err(Error::IncompleteGrid {
                missing: self.remaining,
                height: self.height,
            });
        }
        Ok(Grid {
            width: self.width,
            height: self.height,
            cells: self.cells,
        })
    }
}

/// A finished grid of convergence values, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl Grid {
    /// Values per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows in the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row `y`.
    pub fn row(&self, y: usize) -> &[f64] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// The value at column `x` of row `y`.
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.cells[y * self.width + x]
    }

    /// Every value, row-major.
    pub fn as_slice(&self) -> &[f64] {
        &self.cells
    }

    /// Takes the values out, row-major.
    pub fn into_vec(self) -> Vec<f64> {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    #[test]
    fn rows_arrive_in_any_order() {
        let mut rows: Vec<usize> = (0..20).collect();
        rows.shuffle(&mut rand::thread_rng());
        let mut buffer = GridBuffer::new(3, 20);
        for row in rows {
            let v = row as f64;
            buffer.write_row(row, &[v, v, v]).unwrap();
        }
        let grid = buffer.finish().unwrap();
        for y in 0..20 {
            assert_eq!(grid.row(y), &[y as f64; 3][..]);
        }
    }

    #[test]
    fn second_write_is_rejected() {
        let mut buffer = GridBuffer::new(2, 2);
        buffer.write_row(1, &[0.5, 0.5]).unwrap();
        match buffer.write_row(1, &[0.5, 0.5]) {
            Err(Error::RowRewritten(1)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn wrong_width_and_range_are_rejected() {
        let mut buffer = GridBuffer::new(2, 2);
        assert!(buffer.write_row(0, &[0.5]).is_err());
        assert!(buffer.write_row(2, &[0.5, 0.5]).is_err());
        assert_eq!(buffer.missing_rows(), vec![0, 1]);
    }

    #[test]
    fn incomplete_buffers_do_not_freeze() {
        let mut buffer = GridBuffer::new(1, 3);
        buffer.write_row(0, &[1.0]).unwrap();
        buffer.write_row(2, &[1.0]).unwrap();
        assert_eq!(buffer.missing_rows(), vec![1]);
        match buffer.finish() {
            Err(Error::IncompleteGrid { missing: 1, height: 3 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn blocks_scatter_by_row_index() {
        let mut buffer = GridBuffer::new(2, 4);
        buffer
            .write_rows(vec![1, 3], &[1.0, 1.0, 3.0, 3.0])
            .unwrap();
        buffer
            .write_rows(vec![0, 2], &[0.0, 0.0, 2.0, 2.0])
            .unwrap();
        let grid = buffer.finish().unwrap();
        assert_eq!(grid.as_slice(), &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0][..]);
        assert_eq!(grid.get(1, 3), 3.0);
    }

    #[test]
    fn short_and_long_blocks_are_rejected() {
        let mut buffer = GridBuffer::new(2, 4);
        assert!(buffer.write_rows(vec![0, 1], &[0.0, 0.0]).is_err());
        let mut buffer = GridBuffer::new(2, 4);
        assert!(buffer.write_rows(vec![0], &[0.0, 0.0, 1.0, 1.0]).is_err());
    }
}
