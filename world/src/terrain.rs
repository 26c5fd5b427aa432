//! Static collision grid built once per battlefield configuration.

use grid_assault_core::TerrainTemplate;

/// Width of the always-blocked border, in cells. Two cells make up exactly
/// one render tile, which keeps the world-to-grid offset tile-aligned.
pub(crate) const PADDING: u32 = 2;

const CELLS_PER_TILE: u32 = 2;

/// Tile-based blocked/open lookup over the battlefield interior.
///
/// The grid stores the interior template surrounded by a [`PADDING`]-cell
/// blocked border. The border only simplifies bounds math: every public
/// lookup fails open outside the interior, so the border never produces a
/// gameplay wall hit.
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    columns: u32,
    rows: u32,
    cell_length: f32,
    cells: Vec<bool>,
}

impl TerrainGrid {
    pub(crate) fn new(template: &TerrainTemplate, cell_length: f32) -> Self {
        let columns = template.columns() + 2 * PADDING;
        let rows = template.rows() + 2 * PADDING;
        let capacity = (columns as usize) * (rows as usize);
        let mut cells = vec![true; capacity];
        for row in 0..template.rows() {
            for column in 0..template.columns() {
                let index = ((row + PADDING) * columns + column + PADDING) as usize;
                cells[index] = template.blocked(column, row);
            }
        }
        Self {
            columns,
            rows,
            cell_length,
            cells,
        }
    }

    /// Side length of one render tile in world pixels.
    #[must_use]
    pub fn tile_length(&self) -> f32 {
        self.cell_length * CELLS_PER_TILE as f32
    }

    /// Reports whether the wall cell under the provided world position blocks
    /// movement.
    ///
    /// Coordinates that map outside the interior — including the padding
    /// border — return `false`, so out-of-range lookups never panic and
    /// movement logic stays free to apply its own bounds checks.
    #[must_use]
    pub fn is_blocked(&self, world_x: f32, world_y: f32) -> bool {
        let Some((column, row)) = self.cell_at(world_x, world_y) else {
            return false;
        };
        if !self.interior_contains(column, row) {
            return false;
        }
        self.cells[(row * self.columns + column) as usize]
    }

    /// Reports whether the cell coordinates fall inside the playable
    /// interior, excluding the padding border.
    #[must_use]
    pub fn interior_contains(&self, column: u32, row: u32) -> bool {
        column >= PADDING
            && column < self.columns - PADDING
            && row >= PADDING
            && row < self.rows - PADDING
    }

    fn cell_at(&self, world_x: f32, world_y: f32) -> Option<(u32, u32)> {
        if self.cell_length <= 0.0 {
            return None;
        }
        let column = (world_x / self.cell_length).floor() as i64 + i64::from(PADDING);
        let row = (world_y / self.cell_length).floor() as i64 + i64::from(PADDING);
        if column < 0 || row < 0 || column >= i64::from(self.columns) || row >= i64::from(self.rows)
        {
            return None;
        }
        Some((column as u32, row as u32))
    }
}
