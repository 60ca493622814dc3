use crate::heat::HeatField;
use crate::rng::ByteSource;

/// Default pool capacity.
pub const MAX_SPARKS: usize = 1024;
/// Energy of a freshly spawned spark.
pub const FULL_ENERGY: u8 = 255;
/// A Blaze spawns a helper when its roll lands below this (128/256).
const BLAZE_SPAWN_CHANCE: u8 = 128;
/// Energy a helper loses each frame.
const HELPER_COOLING: u8 = 5;
/// After cooling, energy at or above this means the u8 wrapped past zero.
const EXPIRED_ENERGY: u8 = 251;
/// Sparks closer than this on both axes are removed by `remove_near`.
const REMOVE_RADIUS: u32 = 10;

/// Spark behavior, dispatched once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparkKind {
    /// Rewrites its own cell with random heat every frame. Never moves.
    Burn,
    /// Random heat at a random horizontal offset (0..63) to the right.
    Sparkle,
    /// Emits BlazeHelper children. Leaves the field alone.
    Blaze,
    /// Short-lived ember: cools, heats its cell, random-walks along its velocity.
    BlazeHelper,
}

impl SparkKind {
    pub const ALL: [SparkKind; 4] = [Self::Burn, Self::Sparkle, Self::Blaze, Self::BlazeHelper];

    pub fn label(self) -> &'static str {
        match self {
            Self::Burn => "Burn",
            Self::Sparkle => "Sparkle",
            Self::Blaze => "Blaze",
            Self::BlazeHelper => "Blaze helper",
        }
    }
}

/// Velocity stored biased: 128 is at rest, 0 is -128, 255 is +127.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Velocity(pub u8);

impl Velocity {
    pub const ZERO: Velocity = Velocity(128);

    #[cfg(test)]
    pub fn encode(v: i32) -> Self {
        Self((v.clamp(-128, 127) + 128) as u8)
    }

    #[inline]
    pub fn decode(self) -> i32 {
        self.0 as i32 - 128
    }

    /// One step along this axis: ±1 with probability |v|/128, else 0.
    fn step(self, rng: &mut impl ByteSource) -> i32 {
        let v = self.decode();
        let roll = (rng.next_byte() & 127) as u32;
        if roll >= v.unsigned_abs() {
            0
        } else if v >= 0 {
            1
        } else {
            -1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spark {
    pub x: u32,
    pub y: u32,
    pub energy: u8,
    pub kind: SparkKind,
    pub vel_x: Velocity,
    pub vel_y: Velocity,
}

impl Spark {
    /// A resting spark at full energy.
    pub fn new(kind: SparkKind, x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            energy: FULL_ENERGY,
            kind,
            vel_x: Velocity::ZERO,
            vel_y: Velocity::ZERO,
        }
    }

    /// A helper ember with a random heading.
    pub fn helper(x: u32, y: u32, rng: &mut impl ByteSource) -> Self {
        let vel_x = Velocity(rng.next_byte());
        let vel_y = Velocity(rng.next_byte());
        Self {
            vel_x,
            vel_y,
            ..Self::new(SparkKind::BlazeHelper, x, y)
        }
    }
}

/// Bounded spark pool. Order is not preserved: removal swaps in the last spark.
pub struct SparkPool {
    sparks: Vec<Spark>,
    capacity: usize,
}

impl SparkPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a spark. Returns false (and drops it) when the pool is full.
    pub fn spawn(&mut self, spark: Spark) -> bool {
        if self.sparks.len() >= self.capacity {
            log::debug!("spark pool full ({}), dropping {:?}", self.capacity, spark.kind);
            return false;
        }
        self.sparks.push(spark);
        true
    }

    /// Spawn a spark of `kind` at a grid cell. Helpers get a random heading.
    pub fn spawn_kind(
        &mut self,
        kind: SparkKind,
        x: u32,
        y: u32,
        rng: &mut impl ByteSource,
    ) -> bool {
        let spark = match kind {
            SparkKind::BlazeHelper => Spark::helper(x, y, rng),
            _ => Spark::new(kind, x, y),
        };
        self.spawn(spark)
    }

    /// Remove every spark within `REMOVE_RADIUS` of (x, y) on both axes.
    /// Returns how many were removed.
    pub fn remove_near(&mut self, x: u32, y: u32) -> usize {
        let mut removed = 0;
        // Walk backwards so a swapped-in spark has already been examined.
        for i in (0..self.sparks.len()).rev() {
            let s = &self.sparks[i];
            if s.x.abs_diff(x) < REMOVE_RADIUS && s.y.abs_diff(y) < REMOVE_RADIUS {
                self.sparks.swap_remove(i);
                removed += 1;
            }
        }
        removed
    }

    /// Run one frame of spark behavior against the heat field.
    ///
    /// Each spark present at the start of the frame is processed exactly once;
    /// helpers spawned this frame first act on the next one.
    pub fn update(&mut self, field: &mut HeatField, rng: &mut impl ByteSource) {
        for i in (0..self.sparks.len()).rev() {
            let spark = self.sparks[i];
            match spark.kind {
                SparkKind::Burn => {
                    field.ignite(spark.x, spark.y, rng.next_byte());
                }
                SparkKind::Sparkle => {
                    let jitter = (rng.next_byte() as u32 * 64) >> 8;
                    field.ignite(spark.x + jitter, spark.y, rng.next_byte());
                }
                SparkKind::Blaze => {
                    if rng.next_byte() < BLAZE_SPAWN_CHANCE && self.sparks.len() < self.capacity {
                        self.sparks.push(Spark::helper(spark.x, spark.y, rng));
                    }
                }
                SparkKind::BlazeHelper => {
                    let energy = spark.energy.wrapping_sub(HELPER_COOLING);
                    if energy >= EXPIRED_ENERGY {
                        self.sparks.swap_remove(i);
                        continue;
                    }
                    field.ignite(spark.x, spark.y, energy);

                    let dx = spark.vel_x.step(rng);
                    let dy = spark.vel_y.step(rng);
                    let s = &mut self.sparks[i];
                    s.energy = energy;
                    s.x = field.wrap_x(spark.x.wrapping_add_signed(dx));
                    s.y = field.wrap_y(spark.y.wrapping_add_signed(dy));
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.sparks.clear();
    }

    pub fn len(&self) -> usize {
        self.sparks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sparks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spark> {
        self.sparks.iter()
    }

    pub fn count_of(&self, kind: SparkKind) -> usize {
        self.iter().filter(|s| s.kind == kind).count()
    }
}
