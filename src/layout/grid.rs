use crate::foundation::core::Size;
use crate::foundation::error::{VidsumError, VidsumResult};

/// Mosaic geometry: `columns x rows` cells of `cell_size`, tiled row-major on `canvas_size`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    pub columns: usize,
    pub rows: usize,
    pub cell_size: Size,
    pub canvas_size: Size,
    /// Uniform factor applied to the reference cell; always `<= 1.0`.
    pub scale: f64,
}

impl GridGeometry {
    pub fn capacity(&self) -> usize {
        self.columns * self.rows
    }

    /// `(column, row)` of the `index`-th cell, left-to-right then top-to-bottom.
    pub fn cell_index(&self, index: usize) -> (usize, usize) {
        (index % self.columns, index / self.columns)
    }

    /// Top-left pixel of the `index`-th cell.
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let (col, row) = self.cell_index(index);
        (col as u32 * self.cell_size.w, row as u32 * self.cell_size.h)
    }
}

/// Compute a grid that holds `subject_count` cells of `reference_cell_size`, downscaled
/// uniformly when the canvas would be wider than `max_canvas_w`.
///
/// Cells are treated as pixels of a square-ish image so the mosaic keeps roughly the aspect
/// ratio of the video.
pub fn plan(
    subject_count: usize,
    reference_cell_size: Size,
    max_canvas_w: u32,
) -> VidsumResult<GridGeometry> {
    if subject_count == 0 {
        return Err(VidsumError::invalid_input(
            "grid layout requires at least one subject",
        ));
    }
    if reference_cell_size.is_empty() {
        return Err(VidsumError::invalid_input(format!(
            "reference cell size must be non-zero (got {}x{})",
            reference_cell_size.w, reference_cell_size.h
        )));
    }
    if max_canvas_w == 0 {
        return Err(VidsumError::invalid_input("max canvas width must be non-zero"));
    }

    let side = ((subject_count as f64).sqrt() + 0.5).floor() as usize;
    let rows = side.max(1);
    let mut columns = rows;
    if columns * rows < subject_count {
        columns += 1;
    }

    let full_w = u64::from(reference_cell_size.w) * columns as u64;
    let (cell_size, scale) = if full_w > u64::from(max_canvas_w) {
        let scale = f64::from(max_canvas_w) / full_w as f64;
        // Exact integer floor of `scale * dim`.
        let scaled = |dim: u32| (u64::from(dim) * u64::from(max_canvas_w) / full_w) as u32;
        let cell = Size::new(scaled(reference_cell_size.w), scaled(reference_cell_size.h));
        (cell, scale)
    } else {
        (reference_cell_size, 1.0)
    };
    if cell_size.is_empty() {
        return Err(VidsumError::invalid_input(format!(
            "{columns} columns do not fit in {max_canvas_w}px"
        )));
    }

    let canvas_w = u64::from(cell_size.w) * columns as u64;
    let canvas_h = u64::from(cell_size.h) * rows as u64;
    let canvas_size = Size::new(
        u32::try_from(canvas_w)
            .map_err(|_| VidsumError::invalid_input("canvas width overflows u32"))?,
        u32::try_from(canvas_h)
            .map_err(|_| VidsumError::invalid_input("canvas height overflows u32"))?,
    );

    Ok(GridGeometry {
        columns,
        rows,
        cell_size,
        canvas_size,
        scale,
    })
}
