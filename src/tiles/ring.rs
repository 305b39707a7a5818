//! Two-dimensional ring buffer. Rotating it moves the logical first row and
//! column by adjusting offsets, leaving the elements where they are.

#[derive(Debug, Clone, PartialEq)]
pub struct TileRing<T> {
    items: Vec<T>,
    rows: usize,
    cols: usize,
    row_offset: usize,
    col_offset: usize,
}

impl<T> TileRing<T> {
    /// Builds a `rows x cols` ring, calling `make(row, col)` in logical order.
    pub fn new(rows: usize, cols: usize, mut make: impl FnMut(usize, usize) -> T) -> Self {
        let mut items = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                items.push(make(row, col));
            }
        }
        Self {
            items,
            rows,
            cols,
            row_offset: 0,
            col_offset: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let r = (self.row_offset + row) % self.rows;
        let c = (self.col_offset + col) % self.cols;
        Some(r * self.cols + c)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.index(row, col).map(|i| &self.items[i])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        self.index(row, col).map(move |i| &mut self.items[i])
    }

    /// Makes the element at logical `(-rows, -cols)` the new first one, so a
    /// positive shift brings the trailing rows/columns to the front.
    pub fn rotate(&mut self, rows: i64, cols: i64) {
        if self.is_empty() {
            return;
        }
        self.row_offset = shift(self.row_offset, rows, self.rows);
        self.col_offset = shift(self.col_offset, cols, self.cols);
    }

    /// Elements with their logical `(row, col)`, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.cols).filter_map(move |col| self.get(row, col).map(|item| (row, col, item)))
        })
    }

    pub fn find_mut(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.items.iter_mut().find(|item| predicate(item))
    }

    /// Consumes the ring into logical rows.
    pub fn into_rows(self) -> Vec<Vec<T>> {
        let Self {
            items,
            cols,
            row_offset,
            col_offset,
            ..
        } = self;
        if cols == 0 {
            return Vec::new();
        }

        let mut stored: Vec<Vec<T>> = Vec::new();
        let mut items = items.into_iter();
        loop {
            let row: Vec<T> = items.by_ref().take(cols).collect();
            if row.is_empty() {
                break;
            }
            stored.push(row);
        }

        stored.rotate_left(row_offset);
        for row in &mut stored {
            row.rotate_left(col_offset);
        }
        stored
    }

    /// Builds a ring from logical rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return None;
        }
        let row_count = if cols == 0 { 0 } else { rows.len() };
        Some(Self {
            items: rows.into_iter().flatten().collect(),
            rows: row_count,
            cols,
            row_offset: 0,
            col_offset: 0,
        })
    }
}

impl<T> Default for TileRing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            rows: 0,
            cols: 0,
            row_offset: 0,
            col_offset: 0,
        }
    }
}

fn shift(offset: usize, by: i64, len: usize) -> usize {
    let len = len as i64;
    (offset as i64 - by).rem_euclid(len) as usize
}
