use crate::geometry::BoundingBox;
use bitvec::prelude::BitVec;
use log::{debug, trace};
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    #[error("maze resolution must be at least one pixel")]
    ZeroResolution,
    #[error("maze area must not be empty, got {width}x{height}")]
    EmptyArea { width: u32, height: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Cells covered by one obstacle.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    /// Index of the obstacle in the slice the maze was built from.
    pub obstacle: usize,
    pub rows: RangeInclusive<usize>,
    pub cols: RangeInclusive<usize>,
    pub distance: Option<f64>,
}

impl Footprint {
    pub fn contains(&self, cell: Cell) -> bool {
        self.rows.contains(&cell.row) && self.cols.contains(&cell.col)
    }
}

/// Occupancy grid over the walkable zone in front of the user.
///
/// The grid covers pixel rows `[benchmark, benchmark + height)` and pixel
/// columns `[0, width)`. Row 0 holds the benchmark line, the far edge of the
/// zone; the last row is the one at the user's feet.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    width: u32,
    height: u32,
    resolution: u32,
    benchmark: u32,
    benchmark_row: usize,
    cells: BitVec,
    footprints: Vec<Footprint>,
}

impl OccupancyGrid {
    fn empty(height: u32, width: u32, benchmark: u32, resolution: u32) -> Result<Self, MazeError> {
        if resolution == 0 {
            return Err(MazeError::ZeroResolution);
        }
        if height == 0 || width == 0 {
            return Err(MazeError::EmptyArea { width, height });
        }

        let rows = height.div_ceil(resolution) as usize;
        let cols = width.div_ceil(resolution) as usize;
        // the benchmark line is the zone's top edge
        let benchmark_row = 0;

        Ok(Self {
            rows,
            cols,
            width,
            height,
            resolution,
            benchmark,
            benchmark_row,
            cells: BitVec::repeat(false, rows * cols),
            footprints: Vec::new(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Zone width in pixels; the last column may be partial.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn benchmark(&self) -> u32 {
        self.benchmark
    }

    pub fn benchmark_row(&self) -> usize {
        self.benchmark_row
    }

    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Cells outside the grid are reported free.
    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.contains(cell) && self.cells[cell.row * self.cols + cell.col]
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter_ones()
            .map(|index| Cell::new(index / self.cols, index % self.cols))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.count_ones()
    }

    /// Footprints of every obstacle covering `cell`.
    pub fn obstacles_at(&self, cell: Cell) -> impl Iterator<Item = &Footprint> + '_ {
        self.footprints.iter().filter(move |fp| fp.contains(cell))
    }

    /// Distance of the closest measured obstacle in the grid.
    pub fn nearest_distance(&self) -> Option<f64> {
        self.footprints
            .iter()
            .filter_map(|fp| fp.distance)
            .min_by(|a, b| a.total_cmp(b))
    }

    fn occupy(&mut self, footprint: Footprint) {
        for row in footprint.rows.clone() {
            for col in footprint.cols.clone() {
                self.cells.set(row * self.cols + col, true);
            }
        }
        self.footprints.push(footprint);
    }

    /// Projects a box onto the grid. `None` when it lies outside the zone.
    fn footprint_of(&self, obstacle: usize, bbox: &BoundingBox) -> Option<Footprint> {
        let zone_width = self.width as i64;
        let zone_height = self.height as i64;
        let benchmark = self.benchmark as i64;

        // a flat box still blocks the line it sits on
        let left = bbox.left() as i64;
        let right = (bbox.right() as i64).max(left + 1);
        let top = bbox.top() as i64 - benchmark;
        let bottom = (bbox.bottom() as i64 - benchmark).max(top + 1);

        let (left, right) = (left.max(0), right.min(zone_width));
        let (top, bottom) = (top.max(0), bottom.min(zone_height));
        if left >= right || top >= bottom {
            return None;
        }

        let resolution = self.resolution as i64;
        let cols = (left / resolution) as usize..=((right - 1) / resolution) as usize;
        let rows = (top / resolution) as usize..=((bottom - 1) / resolution) as usize;

        Some(Footprint {
            obstacle,
            rows: *rows.start()..=(*rows.end()).min(self.rows - 1),
            cols: *cols.start()..=(*cols.end()).min(self.cols - 1),
            distance: bbox.distance,
        })
    }
}

/// Builds the occupancy grid of the walkable zone.
///
/// `height` and `width` size the zone in pixels, `benchmark` is the pixel line
/// of its top edge and `resolution` the edge of a cell. Every cell an
/// obstacle overlaps is marked, even by a single pixel.
pub fn generate_maze(
    data: &[BoundingBox],
    height: u32,
    width: u32,
    benchmark: u32,
    resolution: u32,
) -> Result<OccupancyGrid, MazeError> {
    let mut grid = OccupancyGrid::empty(height, width, benchmark, resolution)?;

    for (index, bbox) in data.iter().enumerate() {
        match grid.footprint_of(index, bbox) {
            Some(footprint) => {
                trace!(
                    "obstacle {index} covers rows {:?} cols {:?}",
                    footprint.rows,
                    footprint.cols
                );
                grid.occupy(footprint);
            }
            None => debug!("obstacle {index} ({bbox}) lies outside the maze"),
        }
    }

    Ok(grid)
}

impl Display for OccupancyGrid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let mark = if self.is_occupied(Cell::new(row, col)) { '#' } else { '.' };
                write!(f, "{mark}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
