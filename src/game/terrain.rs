//! Destructible terrain grid
//!
//! Boolean occupancy field stored row-major. Anything outside the grid counts
//! as solid for collision queries.

use rand::Rng;

use crate::util::math::Vec2;

/// Number of mounds scattered over the base ground line
pub const MOUND_COUNT: usize = 20;
/// Ground line sits this far above the bottom edge on average
const GROUND_DEPTH: i32 = 120;
const GROUND_AMPLITUDE: f32 = 40.0;
const GROUND_FREQUENCY: f32 = 0.008;
const MOUND_MIN_RADIUS: i32 = 15;
const MOUND_RADIUS_SPREAD: f32 = 35.0;
/// Mound centres keep this margin from the top
const MOUND_TOP_MARGIN: i32 = 100;
/// Vertical band height excluded from mound centres
const MOUND_BAND_EXCLUSION: i32 = 250;

/// Default radius for body collision queries
pub const BODY_RADIUS: i32 = 15;

/// Destructible terrain
#[derive(Debug, Clone)]
pub struct Terrain {
    width: i32,
    height: i32,
    cells: Vec<bool>,
    revision: u64,
}

impl Terrain {
    /// Create a terrain with no solid cells
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            cells: vec![false; width * height],
            revision: 0,
        }
    }

    /// Create and procedurally generate a terrain
    pub fn generate<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Self {
        let mut terrain = Self::empty(width, height);

        for x in 0..terrain.width {
            let wave = (GROUND_AMPLITUDE * (x as f32 * GROUND_FREQUENCY).sin()) as i32;
            let ground = terrain.height - GROUND_DEPTH + wave;
            terrain.fill_column(x, ground);
        }

        let band = (terrain.height - MOUND_BAND_EXCLUSION).max(0) as f32;
        for _ in 0..MOUND_COUNT {
            let cx = (rng.gen::<f32>() * terrain.width as f32) as i32;
            let cy = (rng.gen::<f32>() * band) as i32 + MOUND_TOP_MARGIN;
            let radius = MOUND_MIN_RADIUS + (rng.gen::<f32>() * MOUND_RADIUS_SPREAD) as i32;
            terrain.fill_circle(cx, cy, radius);
        }

        terrain
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    /// Row-major solidity field (`y * width + x`)
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Bumped every time a carve changes at least one cell.
    /// Renderers compare it against their cached value to know when to rebuild.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Stored cell value, or `None` outside the grid
    pub fn cell(&self, x: i32, y: i32) -> Option<bool> {
        self.in_bounds(x, y).then(|| self.cells[self.index(x, y)])
    }

    /// Point collision; out-of-bounds is solid
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).unwrap_or(true)
    }

    /// Disc collision: any cell within `radius` of `center` is solid
    pub fn is_solid_circle(&self, center: Vec2, radius: i32) -> bool {
        let (cx, cy) = center.cell();
        let r2 = radius * radius;
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if dx * dx + dy * dy <= r2 && self.is_solid(cx + dx, cy + dy) {
                    return true;
                }
            }
        }
        false
    }

    /// Clear every cell within `radius` of (cx, cy). Returns how many cells changed.
    pub fn carve(&mut self, cx: i32, cy: i32, radius: i32) -> usize {
        let changed = self.set_circle(cx, cy, radius, false);
        if changed > 0 {
            self.revision += 1;
        }
        changed
    }

    /// Mark every cell within `radius` of (cx, cy) as solid
    pub fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32) -> usize {
        self.set_circle(cx, cy, radius, true)
    }

    /// Fill column `x` from `top` down to the bottom edge
    pub fn fill_column(&mut self, x: i32, top: i32) {
        if x < 0 || x >= self.width {
            return;
        }
        for y in top.max(0)..self.height {
            let idx = self.index(x, y);
            self.cells[idx] = true;
        }
    }

    fn set_circle(&mut self, cx: i32, cy: i32, radius: i32, solid: bool) -> usize {
        let r2 = radius * radius;
        let mut changed = 0;
        for x in (cx - radius)..=(cx + radius) {
            for y in (cy - radius)..=(cy + radius) {
                if !self.in_bounds(x, y) {
                    continue;
                }
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let idx = self.index(x, y);
                if self.cells[idx] != solid {
                    self.cells[idx] = solid;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// First solid row in column `x`, scanning top-down; `height` if the column is empty.
    /// Columns outside the grid are clamped to the nearest edge column.
    pub fn ground_level(&self, x: i32) -> i32 {
        if self.width == 0 {
            return self.height;
        }
        let x = x.clamp(0, self.width - 1);
        (0..self.height)
            .find(|&y| self.cells[self.index(x, y)])
            .unwrap_or(self.height)
    }
}
