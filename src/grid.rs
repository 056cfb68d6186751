/// A grid position holding a positive number of grains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub grains: u64,
}

impl Cell {
    pub fn new(x: usize, y: usize, grains: u64) -> Self {
        Self { x, y, grains }
    }
}

/// Bounded slot storage mapping coordinates to cells.
///
/// Storage reserves one extra column and row past `width`/`height` so neighbors that the
/// inclusive boundary admits always have a slot. Everything outside storage reads as empty.
pub struct GridStore {
    height: usize,
    stride: usize,
    slots: Vec<Option<Cell>>,
}

impl GridStore {
    pub fn new(width: usize, height: usize) -> Self {
        let stride = width + 1;
        Self {
            height,
            stride,
            slots: vec![None; stride * (height + 1)],
        }
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.stride || y as usize > self.height {
            return None;
        }
        Some(y as usize * self.stride + x as usize)
    }

    pub fn get(&self, x: i64, y: i64) -> Option<&Cell> {
        self.index(x, y).and_then(|idx| self.slots[idx].as_ref())
    }

    pub fn get_mut(&mut self, x: i64, y: i64) -> Option<&mut Cell> {
        self.index(x, y).and_then(|idx| self.slots[idx].as_mut())
    }

    /// Store a cell at its own coordinate. Returns false if the coordinate has no slot.
    pub fn insert(&mut self, cell: Cell) -> bool {
        match self.index(cell.x as i64, cell.y as i64) {
            Some(idx) => {
                self.slots[idx] = Some(cell);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, x: i64, y: i64) -> Option<Cell> {
        self.index(x, y).and_then(|idx| self.slots[idx].take())
    }

    /// Empty every slot
    pub fn reset(&mut self) {
        self.slots.fill(None);
    }

    /// Number of occupied slots (full scan, used for consistency checks)
    #[cfg(test)]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_clear() {
        let mut grid = GridStore::new(8, 6);
        assert!(grid.insert(Cell::new(3, 2, 5)));
        assert_eq!(grid.get(3, 2), Some(&Cell::new(3, 2, 5)));
        assert_eq!(grid.get(2, 3), None);

        grid.get_mut(3, 2).unwrap().grains += 2;
        assert_eq!(grid.get(3, 2).unwrap().grains, 7);

        assert_eq!(grid.clear(3, 2), Some(Cell::new(3, 2, 7)));
        assert_eq!(grid.get(3, 2), None);
        assert_eq!(grid.occupied(), 0);
    }

    #[test]
    fn test_out_of_range_reads_are_empty() {
        let grid = GridStore::new(4, 4);
        assert!(grid.get(-1, 0).is_none());
        assert!(grid.get(0, -1).is_none());
        assert!(grid.get(5, 0).is_none());
        assert!(grid.get(0, 5).is_none());
        assert!(grid.get(i64::MAX, i64::MAX).is_none());
    }

    #[test]
    fn test_guard_row_and_column_are_addressable() {
        let mut grid = GridStore::new(4, 3);
        assert!(grid.insert(Cell::new(4, 1, 1)));
        assert!(grid.insert(Cell::new(2, 3, 1)));
        assert!(grid.insert(Cell::new(4, 3, 1)));
        assert_eq!(grid.get(4, 1).map(|c| c.grains), Some(1));
        assert_eq!(grid.get(4, 3).map(|c| c.grains), Some(1));
        // Guard column must not alias the next row
        assert!(grid.get(0, 2).is_none());
    }

    #[test]
    fn test_insert_outside_storage_is_ignored() {
        let mut grid = GridStore::new(4, 3);
        assert!(!grid.insert(Cell::new(5, 0, 1)));
        assert!(!grid.insert(Cell::new(0, 4, 1)));
        assert_eq!(grid.occupied(), 0);
    }

    #[test]
    fn test_reset() {
        let mut grid = GridStore::new(4, 4);
        grid.insert(Cell::new(1, 1, 1));
        grid.insert(Cell::new(2, 2, 1));
        grid.reset();
        assert_eq!(grid.occupied(), 0);
    }
}
