use crate::palette::HeatResponse;

/// Which neighborhood a diffusion pass samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffusionFilter {
    /// Own cell, left, right and the cell below. Heat creeps upward and cools in place.
    WithSelf,
    /// Three cells of the row below plus the cell two rows below. No self term.
    BelowTwoRows,
}

impl DiffusionFilter {
    pub const ALL: [DiffusionFilter; 2] = [Self::WithSelf, Self::BelowTwoRows];

    pub fn label(self) -> &'static str {
        match self {
            Self::WithSelf => "With self",
            Self::BelowTwoRows => "Below (two rows)",
        }
    }
}

/// Toroidal grid of 8-bit heat, row-major. Both dimensions are powers of two
/// so every coordinate wraps with a bitmask.
pub struct HeatField {
    width: u32,
    height: u32,
    mask_x: u32,
    mask_y: u32,
    cells: Vec<u8>,
    /// Pre-step snapshot read by `diffuse`. Kept around to avoid per-frame allocs.
    scratch: Vec<u8>,
}

impl HeatField {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width.is_power_of_two() && height.is_power_of_two(),
            "heat field dimensions must be powers of two, got {width}x{height}"
        );
        let len = (width * height) as usize;
        Self {
            width,
            height,
            mask_x: width - 1,
            mask_y: height - 1,
            cells: vec![0; len],
            scratch: vec![0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major index with both axes wrapped.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        ((y & self.mask_y) * self.width + (x & self.mask_x)) as usize
    }

    #[inline]
    pub fn wrap_x(&self, x: u32) -> u32 {
        x & self.mask_x
    }

    #[inline]
    pub fn wrap_y(&self, y: u32) -> u32 {
        y & self.mask_y
    }

    #[cfg(test)]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.cells[self.index(x, y)]
    }

    /// Set one cell's heat outright.
    #[inline]
    pub fn ignite(&mut self, x: u32, y: u32, heat: u8) {
        let idx = self.index(x, y);
        self.cells[idx] = heat;
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn total_heat(&self) -> u64 {
        self.cells.iter().map(|&h| h as u64).sum()
    }

    /// One full-grid diffusion pass. Every output cell is computed from the
    /// field as it was before the pass started.
    pub fn diffuse(&mut self, table: &HeatResponse, filter: DiffusionFilter) {
        self.scratch.copy_from_slice(&self.cells);

        let w = self.width;
        for y in 0..self.height {
            let row = (y * w) as usize;
            let below = (self.wrap_y(y + 1) * w) as usize;
            let below2 = (self.wrap_y(y + 2) * w) as usize;

            for x in 0..w {
                let left = self.wrap_x(x.wrapping_sub(1)) as usize;
                let right = self.wrap_x(x + 1) as usize;
                let x = x as usize;
                let s = &self.scratch;

                let sum = match filter {
                    DiffusionFilter::WithSelf => {
                        s[row + x] as u32
                            + s[row + right] as u32
                            + s[row + left] as u32
                            + s[below + x] as u32
                    }
                    DiffusionFilter::BelowTwoRows => {
                        s[below + left] as u32
                            + s[below + x] as u32
                            + s[below + right] as u32
                            + s[below2 + x] as u32
                    }
                };

                self.cells[row + x] = table.lookup(sum);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_wraps_both_axes() {
        let f = HeatField::new(256, 128);
        for k in [0u32, 1, 17, 255] {
            assert_eq!(f.index(256 + k, 5), f.index(k, 5));
            assert_eq!(f.index(3, 128 + (k & 127)), f.index(3, k & 127));
        }
        assert_eq!(f.index(u32::MAX, 0), f.index(255, 0));
        assert_eq!(f.index(0, u32::MAX), f.index(0, 127));
    }

    #[test]
    #[should_panic(expected = "powers of two")]
    fn rejects_non_power_of_two() {
        let _ = HeatField::new(100, 64);
    }

    #[test]
    fn ignite_and_clear() {
        let mut f = HeatField::new(64, 64);
        f.ignite(70, 3, 200);
        assert_eq!(f.get(6, 3), 200);
        assert_eq!(f.total_heat(), 200);
        f.clear();
        assert_eq!(f.total_heat(), 0);
    }

    #[test]
    fn with_self_spreads_sideways_and_up() {
        let table = HeatResponse::build(1.0);
        let mut f = HeatField::new(256, 256);
        f.ignite(10, 10, 255);
        f.diffuse(&table, DiffusionFilter::WithSelf);

        let spread = table.lookup(255);
        assert!(spread > 0);
        assert_eq!(f.get(10, 10), spread);
        assert_eq!(f.get(9, 10), spread);
        assert_eq!(f.get(11, 10), spread);
        // (10, 9) samples (10, 10) as its lower neighbor.
        assert_eq!(f.get(10, 9), spread);
        // Nothing samples upward.
        assert_eq!(f.get(10, 11), 0);
        assert_eq!(f.total_heat(), 4 * spread as u64);
    }

    #[test]
    fn diffusion_reads_pre_step_values_only() {
        let table = HeatResponse::build(1.0);
        let mut f = HeatField::new(16, 16);
        // A horizontal run: if outputs fed back into the same pass, the
        // right-hand cells would see cooled left neighbors.
        for x in 2..8 {
            f.ignite(x, 4, 255);
        }
        f.diffuse(&table, DiffusionFilter::WithSelf);
        let inner = table.lookup(3 * 255);
        for x in 3..7 {
            assert_eq!(f.get(x, 4), inner);
        }
        let edge = table.lookup(2 * 255);
        assert_eq!(f.get(2, 4), edge);
        assert_eq!(f.get(7, 4), edge);
        assert_eq!(f.get(1, 4), table.lookup(255));
    }

    #[test]
    fn with_self_wraps_at_edges() {
        let table = HeatResponse::build(1.0);
        let mut f = HeatField::new(32, 32);
        f.ignite(0, 0, 255);
        f.diffuse(&table, DiffusionFilter::WithSelf);
        let spread = table.lookup(255);
        assert_eq!(f.get(31, 0), spread);
        assert_eq!(f.get(1, 0), spread);
        assert_eq!(f.get(0, 31), spread);
    }

    #[test]
    fn below_two_rows_has_no_self_term() {
        let table = HeatResponse::build(1.0);
        let mut f = HeatField::new(64, 64);
        f.ignite(10, 10, 255);
        f.diffuse(&table, DiffusionFilter::BelowTwoRows);

        let spread = table.lookup(255);
        assert_eq!(f.get(10, 10), 0);
        assert_eq!(f.get(9, 9), spread);
        assert_eq!(f.get(10, 9), spread);
        assert_eq!(f.get(11, 9), spread);
        assert_eq!(f.get(10, 8), spread);
        assert_eq!(f.total_heat(), 4 * spread as u64);
    }

    #[test]
    fn cold_field_stays_cold() {
        let table = HeatResponse::build(1.0);
        let mut f = HeatField::new(64, 64);
        for filter in DiffusionFilter::ALL {
            f.diffuse(&table, filter);
        }
        assert_eq!(f.total_heat(), 0);
    }
}
