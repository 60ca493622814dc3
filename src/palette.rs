use bytemuck::{Pod, Zeroable};

/// Number of palette entries, one per heat level.
pub const PALETTE_SIZE: usize = 256;
/// Largest neighbor sum a diffusion filter can produce (4 cells at full heat).
pub const MAX_NEIGHBOR_SUM: usize = 4 * 255;
/// Divisor that maps a neighbor sum onto [0, 1].
const SUM_SCALE: f32 = 1023.0;
/// Cooling applied to every diffused cell.
const DECAY_EPSILON: f32 = 0.005;

/// Per-channel (scale, exponent) pairs of the fire ramp.
const RED_CURVE: (f32, f32) = (3.9, 0.5);
const GREEN_CURVE: (f32, f32) = (2.2, 1.5);
const BLUE_CURVE: (f32, f32) = (1.6, 2.0);

/// One RGBA8 pixel. Layout matches `Rgba8Unorm` so a frame uploads as raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[inline]
fn unit_to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

#[inline]
fn channel(t: f32, (scale, exponent): (f32, f32)) -> u8 {
    unit_to_byte((t * scale).powf(exponent))
}

/// Heat → color lookup: dark, through red and yellow, to white.
pub struct Palette {
    colors: [Color; PALETTE_SIZE],
}

impl Palette {
    pub fn build() -> Self {
        let mut colors = [Color::BLACK; PALETTE_SIZE];
        for (i, c) in colors.iter_mut().enumerate() {
            let t = i as f32 / 255.0;
            *c = Color::rgb(
                channel(t, RED_CURVE),
                channel(t, GREEN_CURVE),
                channel(t, BLUE_CURVE),
            );
        }
        Self { colors }
    }

    #[inline]
    pub fn color(&self, heat: u8) -> Color {
        self.colors[heat as usize]
    }
}

/// Neighbor-sum → decayed heat lookup used by the diffusion filters.
///
/// `conductivity` is stored but the decay curve does not read it yet;
/// any value yields the same table.
pub struct HeatResponse {
    table: Vec<u8>,
    conductivity: f32,
}

impl HeatResponse {
    pub fn build(conductivity: f32) -> Self {
        let table = (0..=MAX_NEIGHBOR_SUM)
            .map(|i| unit_to_byte(i as f32 / SUM_SCALE - DECAY_EPSILON))
            .collect();
        Self {
            table,
            conductivity,
        }
    }

    /// Decayed heat for a sum of four neighbor cells.
    #[inline]
    pub fn lookup(&self, sum: u32) -> u8 {
        self.table[sum as usize]
    }

    pub fn conductivity(&self) -> f32 {
        self.conductivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_endpoints() {
        let p = Palette::build();
        assert_eq!(p.color(0), Color::rgb(0, 0, 0));
        assert_eq!(p.color(255), Color::rgb(255, 255, 255));
        assert!(p.colors.iter().all(|c| c.a == 255));
    }

    #[test]
    fn palette_channels_never_dim() {
        let p = Palette::build();
        for w in p.colors.windows(2) {
            assert!(w[1].r >= w[0].r);
            assert!(w[1].g >= w[0].g);
            assert!(w[1].b >= w[0].b);
        }
    }

    #[test]
    fn red_saturates_before_green_and_blue() {
        let p = Palette::build();
        // t*3.9 reaches 1 around i=66, green needs i~116, blue i~160.
        assert_eq!(p.color(70).r, 255);
        assert!(p.color(70).g < 255);
        assert_eq!(p.color(120).g, 255);
        assert!(p.color(120).b < 255);
        assert_eq!(p.color(170).b, 255);
    }

    #[test]
    fn response_table_shape() {
        let t = HeatResponse::build(1.0);
        assert_eq!(t.table.len(), MAX_NEIGHBOR_SUM + 1);
        // Small sums cool to nothing.
        assert_eq!(t.lookup(0), 0);
        assert_eq!(t.lookup(5), 0);
        // A full neighborhood stays just under full heat.
        assert_eq!(t.lookup(1020), 252);
        for i in 1..t.table.len() as u32 {
            assert!(t.lookup(i) >= t.lookup(i - 1));
        }
    }

    #[test]
    fn conductivity_does_not_change_table() {
        let a = HeatResponse::build(0.1);
        let b = HeatResponse::build(10.0);
        assert_eq!(a.table, b.table);
        assert_eq!(b.conductivity(), 10.0);
    }
}
