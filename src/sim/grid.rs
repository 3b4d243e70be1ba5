//! Static tile map and the solid-tile collision index built from it
//!
//! Map text format: one row per line, comma-separated non-negative integers.
//! Blank lines are skipped and rows may be ragged. Any problem reading or
//! parsing the map substitutes the bordered default map, so loading a level
//! never fails on tile data.

use std::path::Path;

use thiserror::Error;

use super::rect::Rect;
use crate::consts::{DEFAULT_MAP_COLS, DEFAULT_MAP_ROWS, TILE_SIZE};

/// Raw tile code as stored in the map
pub type TileCode = u32;

pub const TILE_EMPTY: TileCode = 0;
pub const TILE_SOLID: TileCode = 1;
pub const TILE_HAZARD: TileCode = 2;
/// Returned by lookups outside the grid
pub const TILE_OUT_OF_BOUNDS: TileCode = TileCode::MAX;

/// Why a map source could not be used
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tile token {token:?} at line {line}, column {column}")]
    InvalidToken {
        line: usize,
        column: usize,
        token: String,
    },

    #[error("map contains no rows")]
    Empty,
}

/// Immutable grid of tile codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    /// Row-major codes, ragged rows kept as-is
    rows: Vec<Vec<TileCode>>,
    /// Widest row
    cols: usize,
    cell_size: i32,
}

impl TileGrid {
    /// Build from explicit rows
    pub fn from_rows(rows: Vec<Vec<TileCode>>, cell_size: i32) -> Result<Self, MapError> {
        if rows.is_empty() {
            return Err(MapError::Empty);
        }
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        if cols == 0 {
            return Err(MapError::Empty);
        }
        Ok(Self {
            rows,
            cols,
            cell_size,
        })
    }

    /// Parse the comma-separated text format
    pub fn parse(text: &str, cell_size: i32) -> Result<Self, MapError> {
        let mut rows = Vec::new();
        for (line_idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut row = Vec::new();
            for (col_idx, token) in line.split(',').enumerate() {
                let token = token.trim();
                let code = token.parse::<TileCode>().ok().filter(|&c| c != TILE_OUT_OF_BOUNDS);
                match code {
                    Some(code) => row.push(code),
                    None => {
                        return Err(MapError::InvalidToken {
                            line: line_idx + 1,
                            column: col_idx + 1,
                            token: token.to_string(),
                        });
                    }
                }
            }
            rows.push(row);
        }
        Self::from_rows(rows, cell_size)
    }

    /// Read and parse a map file
    pub fn read(path: &Path, cell_size: i32) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, cell_size)
    }

    /// Load a map, substituting the default map on any failure
    pub fn load(path: Option<&Path>, cell_size: i32) -> Self {
        let Some(path) = path else {
            log::info!("No map source configured, using default map");
            return Self::default_map(cell_size);
        };
        match Self::read(path, cell_size) {
            Ok(grid) => {
                log::info!(
                    "Loaded map {} ({}x{} cells)",
                    path.display(),
                    grid.cols(),
                    grid.rows()
                );
                grid
            }
            Err(e) => {
                log::warn!("Map {} unusable ({}), using default map", path.display(), e);
                Self::default_map(cell_size)
            }
        }
    }

    /// Deterministic fallback: solid border around an empty interior
    pub fn default_map(cell_size: i32) -> Self {
        let rows = (0..DEFAULT_MAP_ROWS)
            .map(|r| {
                (0..DEFAULT_MAP_COLS)
                    .map(|c| {
                        let border = r == 0
                            || c == 0
                            || r == DEFAULT_MAP_ROWS - 1
                            || c == DEFAULT_MAP_COLS - 1;
                        if border { TILE_SOLID } else { TILE_EMPTY }
                    })
                    .collect()
            })
            .collect();
        Self {
            rows,
            cols: DEFAULT_MAP_COLS,
            cell_size,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// World width in pixels
    pub fn width(&self) -> i32 {
        self.cols as i32 * self.cell_size
    }

    /// World height in pixels
    pub fn height(&self) -> i32 {
        self.rows.len() as i32 * self.cell_size
    }

    /// Code of a cell by grid coordinates. Cells past the end of a short
    /// row but inside the grid are empty.
    pub fn cell(&self, col: i32, row: i32) -> TileCode {
        if col < 0 || row < 0 || col as usize >= self.cols {
            return TILE_OUT_OF_BOUNDS;
        }
        match self.rows.get(row as usize) {
            Some(r) => r.get(col as usize).copied().unwrap_or(TILE_EMPTY),
            None => TILE_OUT_OF_BOUNDS,
        }
    }

    /// Code of the cell containing a pixel
    pub fn tile_at(&self, px: i32, py: i32) -> TileCode {
        self.cell(px.div_euclid(self.cell_size), py.div_euclid(self.cell_size))
    }

    /// Pixel rectangle of a cell
    pub fn cell_rect(&self, col: i32, row: i32) -> Rect {
        Rect::new(
            col * self.cell_size,
            row * self.cell_size,
            self.cell_size,
            self.cell_size,
        )
    }

    /// Every cell under a rectangle, not only its center
    pub fn codes_under(&self, rect: &Rect) -> impl Iterator<Item = TileCode> + '_ {
        let (cols, rows) = rect.cell_span(self.cell_size);
        rows.flat_map(move |r| cols.clone().map(move |c| self.cell(c, r)))
    }

    /// True if any cell under the rectangle carries one of the codes
    pub fn any_under(&self, rect: &Rect, codes: &[TileCode]) -> bool {
        self.codes_under(rect).any(|code| codes.contains(&code))
    }

    /// Number of cells with the given code
    pub fn count(&self, code: TileCode) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.iter())
            .filter(|&&c| c == code)
            .count()
    }
}

/// One rectangle per solid cell, with a per-cell lookup so queries only
/// touch the cells under the probe
#[derive(Debug, Clone)]
pub struct CollisionIndex {
    rects: Vec<Rect>,
    /// Index into `rects` for each cell, row-major over `cols` x `rows`
    lookup: Vec<Option<u32>>,
    cols: usize,
    rows: usize,
    cell_size: i32,
}

impl CollisionIndex {
    /// Build once from a grid
    pub fn build(grid: &TileGrid) -> Self {
        let (cols, rows) = (grid.cols(), grid.rows());
        let mut rects = Vec::new();
        let mut lookup = vec![None; cols * rows];
        for row in 0..rows {
            for col in 0..cols {
                if grid.cell(col as i32, row as i32) == TILE_SOLID {
                    lookup[row * cols + col] = Some(rects.len() as u32);
                    rects.push(grid.cell_rect(col as i32, row as i32));
                }
            }
        }
        log::debug!("Collision index: {} solid cells", rects.len());
        Self {
            rects,
            lookup,
            cols,
            rows,
            cell_size: grid.cell_size(),
        }
    }

    /// All solid rectangles
    pub fn solid_rectangles(&self) -> &[Rect] {
        &self.rects
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Solid rectangles intersecting a probe, visiting only covered cells
    pub fn overlapping(&self, probe: Rect) -> impl Iterator<Item = Rect> + '_ {
        let (cols, rows) = probe.cell_span(self.cell_size);
        rows.flat_map(move |r| cols.clone().map(move |c| (c, r)))
            .filter_map(move |(c, r)| {
                if c < 0 || r < 0 || c as usize >= self.cols || r as usize >= self.rows {
                    return None;
                }
                self.lookup[r as usize * self.cols + c as usize]
            })
            .map(move |i| self.rects[i as usize])
            .filter(move |rect| rect.intersects(&probe))
    }

    pub fn any_overlapping(&self, probe: Rect) -> bool {
        self.overlapping(probe).next().is_some()
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::default_map(TILE_SIZE)
    }
}
