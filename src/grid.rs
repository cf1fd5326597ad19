// src/grid.rs
//
// Region extents on the map raster.
// - Corners:    rectangular sub-range (upper-left, lower-right) in map pixels
// - MapExtent:  size of the full map; slices regions out of it
// - RegionGrid: the cell grid of one search region
//
// Ranges are half-open: a region with corners (130,265)-(180,315) covers
// columns 130..180 and rows 265..315, i.e. a 50x50 grid.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::Cell;

/// Rectangular sub-range of the map: (UL-X, UL-Y, LR-X, LR-Y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corners {
    pub ul_x: u32,
    pub ul_y: u32,
    pub lr_x: u32,
    pub lr_y: u32,
}

impl Corners {
    pub const fn new(ul_x: u32, ul_y: u32, lr_x: u32, lr_y: u32) -> Self {
        Self {
            ul_x,
            ul_y,
            lr_x,
            lr_y,
        }
    }

    pub fn width(&self) -> u32 {
        self.lr_x.saturating_sub(self.ul_x)
    }

    pub fn height(&self) -> u32 {
        self.lr_y.saturating_sub(self.ul_y)
    }

    /// True if the two half-open rectangles share at least one pixel.
    pub fn overlaps(&self, other: &Corners) -> bool {
        self.ul_x < other.lr_x
            && other.ul_x < self.lr_x
            && self.ul_y < other.lr_y
            && other.ul_y < self.lr_y
    }

    /// Map coordinate of a local cell.
    pub fn to_map(&self, cell: Cell) -> (u32, u32) {
        (self.ul_x + cell.x, self.ul_y + cell.y)
    }

    /// Region grid spanned by these corners, without clipping to a map.
    pub fn grid(&self) -> RegionGrid {
        RegionGrid::new(self.width(), self.height())
    }
}

/// Full map raster size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapExtent {
    pub width: u32,
    pub height: u32,
}

impl MapExtent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether the corners fit entirely inside the map.
    pub fn contains(&self, corners: &Corners) -> bool {
        corners.lr_x <= self.width && corners.lr_y <= self.height
    }

    /// Slice a region out of the map. Bounds past the map edge are clipped
    /// the same way raster slicing clips them; an empty result is an error.
    pub fn slice(&self, corners: &Corners) -> Result<RegionGrid, SearchError> {
        let lr_x = corners.lr_x.min(self.width);
        let lr_y = corners.lr_y.min(self.height);
        let width = lr_x.saturating_sub(corners.ul_x);
        let height = lr_y.saturating_sub(corners.ul_y);
        if width == 0 || height == 0 {
            return Err(SearchError::config(format!(
                "region {:?} has zero area inside a {}x{} map",
                corners, self.width, self.height
            )));
        }
        Ok(RegionGrid::new(width, height))
    }
}

/// 2D cell grid of a single search region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionGrid {
    width: u32,
    height: u32,
}

impl RegionGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Row-major index of a cell. `None` if the cell is outside the grid.
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        if cell.x < self.width && cell.y < self.height {
            Some(cell.y as usize * self.width as usize + cell.x as usize)
        } else {
            None
        }
    }

    /// Cell at a row-major index. Caller guarantees `index < cell_count()`.
    pub fn cell_at(&self, index: usize) -> Cell {
        let w = self.width as usize;
        Cell::new((index % w) as u32, (index / w) as u32)
    }

    /// All cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cell_count()).map(move |i| self.cell_at(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_index_round_trip() {
        let g = RegionGrid::new(4, 3);
        assert_eq!(g.cell_count(), 12);
        for (i, c) in g.cells().enumerate() {
            assert_eq!(g.index_of(c), Some(i));
        }
        assert_eq!(g.index_of(Cell::new(4, 0)), None);
        assert_eq!(g.index_of(Cell::new(0, 3)), None);
    }

    #[test]
    fn slice_clips_to_map_edge() {
        let map = MapExtent::new(100, 100);
        let g = map.slice(&Corners::new(90, 80, 120, 100)).unwrap();
        assert_eq!((g.width(), g.height()), (10, 20));

        assert!(map.slice(&Corners::new(100, 0, 120, 10)).is_err());
        assert!(map.slice(&Corners::new(10, 10, 10, 20)).is_err());
    }

    #[test]
    fn shared_edges_do_not_overlap() {
        let a = Corners::new(130, 265, 180, 315);
        let b = Corners::new(80, 255, 130, 305);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Corners::new(179, 314, 200, 400)));
    }
}
