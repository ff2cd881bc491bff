//! Occupancy grid of the cargo space.
//!
//! One bit per unit cell, flattened as `(x * height + y) * length + z` so
//! that the innermost `z` run of a box is contiguous in memory.

use bitvec::vec::BitVec;

use crate::types::{Dims3, Point3};

/// Dense free/occupied record of a `width × height × length` cargo space.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    length: usize,
    cells: BitVec,
}

impl OccupancyGrid {
    /// Creates a fully free grid. Callers validate the cell count beforehand.
    pub fn new(width: usize, height: usize, length: usize) -> Self {
        Self {
            width,
            height,
            length,
            cells: BitVec::repeat(false, width * height * length),
        }
    }

    #[inline]
    fn offset(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.height + y) * self.length + z
    }

    /// Resolves a box to index ranges, or `None` if any part lies outside the grid.
    fn region(&self, position: Point3, extent: Dims3) -> Option<Region> {
        let axis = |start: i64, size: i64, limit: usize| -> Option<(usize, usize)> {
            let start = usize::try_from(start).ok()?;
            let size = usize::try_from(size).ok()?;
            let end = start.checked_add(size)?;
            (end <= limit).then_some((start, end))
        };
        Some(Region {
            x: axis(position.x, extent.width, self.width)?,
            y: axis(position.y, extent.height, self.height)?,
            z: axis(position.z, extent.length, self.length)?,
        })
    }

    /// Returns `true` if every cell of the box is inside the grid and free.
    pub fn is_region_free(&self, position: Point3, extent: Dims3) -> bool {
        let Some(region) = self.region(position, extent) else {
            return false;
        };
        for x in region.x.0..region.x.1 {
            for y in region.y.0..region.y.1 {
                let row = self.offset(x, y, region.z.0)..self.offset(x, y, region.z.1);
                if self.cells[row].any() {
                    return false;
                }
            }
        }
        true
    }

    /// Marks every cell of the box as occupied.
    ///
    /// Returns `false` without touching the grid if the box leaves the grid.
    pub fn occupy_region(&mut self, position: Point3, extent: Dims3) -> bool {
        let Some(region) = self.region(position, extent) else {
            return false;
        };
        for x in region.x.0..region.x.1 {
            for y in region.y.0..region.y.1 {
                let row = self.offset(x, y, region.z.0)..self.offset(x, y, region.z.1);
                self.cells[row].fill(true);
            }
        }
        true
    }

    pub fn is_occupied(&self, point: Point3) -> bool {
        match self.region(point, Dims3::new(1, 1, 1)) {
            Some(region) => self.cells[self.offset(region.x.0, region.y.0, region.z.0)],
            None => false,
        }
    }

    /// Frees every cell so the grid can serve another planning run.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.count_ones()
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }
}

#[derive(Clone, Copy)]
struct Region {
    x: (usize, usize),
    y: (usize, usize),
    z: (usize, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_free() {
        let grid = OccupancyGrid::new(2, 3, 4);
        assert_eq!(grid.total_cells(), 24);
        assert_eq!(grid.occupied_cells(), 0);
        assert!(grid.is_region_free(Point3::origin(), Dims3::new(2, 3, 4)));
    }

    #[test]
    fn occupy_marks_exactly_the_box() {
        let mut grid = OccupancyGrid::new(3, 3, 3);
        assert!(grid.occupy_region(Point3::new(1, 0, 1), Dims3::new(2, 1, 2)));

        assert_eq!(grid.occupied_cells(), 4);
        assert!(grid.is_occupied(Point3::new(1, 0, 1)));
        assert!(grid.is_occupied(Point3::new(2, 0, 2)));
        assert!(!grid.is_occupied(Point3::new(0, 0, 0)));
        assert!(!grid.is_occupied(Point3::new(1, 1, 1)));

        assert!(!grid.is_region_free(Point3::new(0, 0, 0), Dims3::new(2, 1, 2)));
        assert!(grid.is_region_free(Point3::new(0, 1, 0), Dims3::new(3, 2, 3)));
    }

    #[test]
    fn out_of_bounds_regions_are_never_free() {
        let mut grid = OccupancyGrid::new(2, 1, 1);
        assert!(!grid.is_region_free(Point3::new(1, 0, 0), Dims3::new(2, 1, 1)));
        assert!(!grid.is_region_free(Point3::new(-1, 0, 0), Dims3::new(1, 1, 1)));
        assert!(!grid.occupy_region(Point3::new(0, 0, 0), Dims3::new(1, 1, 2)));
        assert_eq!(grid.occupied_cells(), 0);
        assert!(!grid.is_occupied(Point3::new(5, 0, 0)));
    }

    #[test]
    fn clear_resets_for_reuse() {
        let mut grid = OccupancyGrid::new(1, 1, 2);
        grid.occupy_region(Point3::origin(), Dims3::new(1, 1, 2));
        assert_eq!(grid.occupied_cells(), 2);

        grid.clear();
        assert_eq!(grid.occupied_cells(), 0);
        assert_eq!(grid.total_cells(), 2);
    }
}
