//! Tile grid and the pure physics queries every entity shares.

use crate::types::Tile;

#[derive(Clone, Debug)]
pub struct Grid {
    cols: i32,
    rows: i32,
    tile_size: f32,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn filled(cols: i32, rows: i32, tile_size: f32, tile: Tile) -> Self {
        Self {
            cols,
            rows,
            tile_size,
            tiles: vec![tile; (cols.max(0) * rows.max(0)) as usize],
        }
    }

    /// Builds a grid from rows of glyphs: `#` wall, `.` collectible, anything else empty.
    pub fn from_rows(rows: &[&str], tile_size: f32) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|row| row.len()).max().unwrap_or(0) as i32;
        let mut grid = Self::filled(width, height, tile_size, Tile::Empty);
        for (row, line) in rows.iter().enumerate() {
            for (col, glyph) in line.bytes().enumerate() {
                let tile = match glyph {
                    b'#' => Tile::Wall,
                    b'.' => Tile::Collectible,
                    _ => Tile::Empty,
                };
                grid.set(col as i32, row as i32, tile);
            }
        }
        grid
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn width_px(&self) -> f32 {
        self.cols as f32 * self.tile_size
    }

    pub fn height_px(&self) -> f32 {
        self.rows as f32 * self.tile_size
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && col < self.cols && row < self.rows
    }

    pub fn get(&self, col: i32, row: i32) -> Option<Tile> {
        if !self.in_bounds(col, row) {
            return None;
        }
        self.tiles.get((row * self.cols + col) as usize).copied()
    }

    pub fn set(&mut self, col: i32, row: i32, tile: Tile) {
        if !self.in_bounds(col, row) {
            return;
        }
        let idx = (row * self.cols + col) as usize;
        self.tiles[idx] = tile;
    }

    /// Rows outside the grid are solid, columns outside it are open so that
    /// the tunnel row wraps.
    pub fn is_wall(&self, col: i32, row: i32, can_pass_walls: bool) -> bool {
        if col < 0 || col >= self.cols {
            return false;
        }
        if row < 0 || row >= self.rows {
            return true;
        }
        if can_pass_walls {
            return false;
        }
        self.get(col, row) == Some(Tile::Wall)
    }

    pub fn is_open(&self, col: i32, row: i32) -> bool {
        self.in_bounds(col, row) && !self.is_wall(col, row, false)
    }

    pub fn tile_of(&self, coord: f32) -> i32 {
        (coord / self.tile_size).floor() as i32
    }

    pub fn center_of(&self, tile: i32) -> f32 {
        tile as f32 * self.tile_size + self.tile_size / 2.0
    }

    pub fn snap(&self, coord: f32) -> f32 {
        self.center_of(self.tile_of(coord))
    }

    pub fn is_at_center(&self, x: f32, y: f32, tolerance: f32) -> bool {
        let mid = self.tile_size / 2.0;
        let rem_x = (x.rem_euclid(self.tile_size) - mid).abs();
        let rem_y = (y.rem_euclid(self.tile_size) - mid).abs();
        rem_x < tolerance && rem_y < tolerance
    }

    /// Nearest open cell center to `(x, y)`, searching square rings outward.
    pub fn find_nearest_open(&self, x: f32, y: f32, max_radius: i32) -> Option<(f32, f32)> {
        let col = self.tile_of(x).clamp(0, self.cols - 1);
        let row = self.tile_of(y).clamp(0, self.rows - 1);
        if self.is_open(col, row) {
            return Some((self.center_of(col), self.center_of(row)));
        }
        for radius in 1..=max_radius {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let (c, r) = (col + dx, row + dy);
                    if self.is_open(c, r) {
                        return Some((self.center_of(c), self.center_of(r)));
                    }
                }
            }
        }
        None
    }

    pub fn collectible_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|tile| **tile == Tile::Collectible)
            .count()
    }

    pub fn take_collectible(&mut self, col: i32, row: i32) -> bool {
        if self.get(col, row) != Some(Tile::Collectible) {
            return false;
        }
        self.set(col, row, Tile::Empty);
        true
    }

    /// Turns every empty interior tile back into a collectible; tunnel
    /// mouths on the border stay empty.
    pub fn refill_collectibles(&mut self) -> usize {
        let mut refilled = 0;
        for row in 1..self.rows - 1 {
            for col in 1..self.cols - 1 {
                if self.get(col, row) == Some(Tile::Empty) {
                    self.set(col, row, Tile::Collectible);
                    refilled += 1;
                }
            }
        }
        refilled
    }

    pub fn open_cells(&self) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.is_open(col, row) {
                    out.push((col, row));
                }
            }
        }
        out
    }

    pub fn to_rows(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| {
                (0..self.cols)
                    .map(|col| self.get(col, row).unwrap_or(Tile::Wall).glyph())
                    .collect()
            })
            .collect()
    }
}
