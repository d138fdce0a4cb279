//! Region/grid partitioning and per-cell mark detection.
//!
//! A [`Region`] is a user-configured rectangle on the page; a [`Grid`]
//! partitions it into rows × cols cells by linear subdivision. Each cell's
//! fill ratio is the share of ink pixels inside an inset sampling window
//! (the inner 80% of the cell, so grid-line pixels at cell borders are not
//! counted). Cells are never stored independently of a detection pass.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::binarize::is_ink;

// Fraction of the cell width/height trimmed from each side before sampling.
const SAMPLE_MARGIN: f64 = 0.1;

// ── Error type ─────────────────────────────────────────────────────────────

/// Malformed region/grid configuration.
///
/// The one place this crate refuses instead of degrading: a zero-sized
/// region or grid leaves the cell subdivision undefined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Region has zero width or height.
    EmptyRegion { w: u32, h: u32 },
    /// Grid has zero rows or columns.
    EmptyGrid { rows: u32, cols: u32 },
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRegion { w, h } => {
                write!(f, "region must have non-zero size, got {}x{}", w, h)
            }
            Self::EmptyGrid { rows, cols } => {
                write!(f, "grid must have non-zero rows and cols, got {}x{}", rows, cols)
            }
        }
    }
}

impl std::error::Error for GridError {}

// ── Types ──────────────────────────────────────────────────────────────────

/// Rectangular area of interest in buffer-pixel coordinates.
///
/// May extend past the buffer edges; out-of-bounds samples are skipped
/// during detection rather than counted as background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// Row/column partition applied to a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub rows: u32,
    pub cols: u32,
}

/// One grid cell with its computed fill ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell origin x (buffer pixels).
    pub x: i32,
    /// Cell origin y (buffer pixels).
    pub y: i32,
    /// Cell width.
    pub w: u32,
    /// Cell height.
    pub h: u32,
    /// Ink pixels / sampled pixels in the inset window, in [0, 1].
    pub ratio: f32,
    /// `ratio > sensitivity` for the sensitivity of the detection pass.
    pub marked: bool,
}

/// Output of one detection pass over a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Row-major cell matrix; the authoritative decode input.
    pub matrix: Vec<Vec<Cell>>,
    /// The same cells flattened in traversal order, for overlay drawing.
    /// Carries no semantics beyond `matrix`.
    pub debug_cells: Vec<Cell>,
}

// ── Detection ──────────────────────────────────────────────────────────────

/// Compute per-cell fill ratios and mark flags for `region` under `grid`.
///
/// Cell bounds come from floored linear subdivision: adjacent cells may
/// differ in size by one pixel but never overlap. A cell straddling the
/// buffer edge gets a smaller sample denominator, not a penalty; a cell
/// with no in-bounds samples gets ratio 0. Pure: same inputs, same output.
pub fn detect_marks(
    buffer: &GrayImage,
    region: &Region,
    grid: &Grid,
    sensitivity: f32,
) -> Result<DetectionResult, GridError> {
    if region.w == 0 || region.h == 0 {
        return Err(GridError::EmptyRegion {
            w: region.w,
            h: region.h,
        });
    }
    if grid.rows == 0 || grid.cols == 0 {
        return Err(GridError::EmptyGrid {
            rows: grid.rows,
            cols: grid.cols,
        });
    }

    let cell_w = region.w as f64 / grid.cols as f64;
    let cell_h = region.h as f64 / grid.rows as f64;
    let (buf_w, buf_h) = buffer.dimensions();

    let mut matrix = Vec::with_capacity(grid.rows as usize);
    let mut debug_cells = Vec::with_capacity((grid.rows * grid.cols) as usize);

    for r in 0..grid.rows {
        let mut row = Vec::with_capacity(grid.cols as usize);
        for c in 0..grid.cols {
            let cx = (region.x as f64 + c as f64 * cell_w).floor() as i32;
            let cy = (region.y as f64 + r as f64 * cell_h).floor() as i32;
            let cw = cell_w.floor() as u32;
            let ch = cell_h.floor() as u32;

            let margin_x = (cw as f64 * SAMPLE_MARGIN).floor() as i32;
            let margin_y = (ch as f64 * SAMPLE_MARGIN).floor() as i32;

            let mut ink_count = 0u32;
            let mut sampled = 0u32;

            for py in (cy + margin_y)..(cy + ch as i32 - margin_y) {
                for px in (cx + margin_x)..(cx + cw as i32 - margin_x) {
                    if px < 0 || py < 0 || px as u32 >= buf_w || py as u32 >= buf_h {
                        continue;
                    }
                    if is_ink(buffer.get_pixel(px as u32, py as u32).0[0]) {
                        ink_count += 1;
                    }
                    sampled += 1;
                }
            }

            let ratio = if sampled > 0 {
                ink_count as f32 / sampled as f32
            } else {
                0.0
            };

            let cell = Cell {
                x: cx,
                y: cy,
                w: cw,
                h: ch,
                ratio,
                marked: ratio > sensitivity,
            };
            row.push(cell);
            debug_cells.push(cell);
        }
        matrix.push(row);
    }

    Ok(DetectionResult {
        matrix,
        debug_cells,
    })
}
