//! Fixed-point column grid.
//!
//! World coordinates are stored as integers scaled by ten so columns can be
//! compared with exact equality after repeated movement.

/// Fixed-point scale shared by column keys and quantized heights.
pub const FIXED_POINT_SCALE: f32 = 10.0;

/// Quantizes a world coordinate to tenths.
#[inline]
pub fn quantize(v: f32) -> i32 {
    (v * FIXED_POINT_SCALE).round() as i32
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub ix: i32,
    pub iz: i32,
}

impl ColumnKey {
    #[inline]
    pub const fn new(ix: i32, iz: i32) -> Self {
        Self { ix, iz }
    }

    #[inline]
    pub fn world_x(self) -> f32 {
        self.ix as f32 / FIXED_POINT_SCALE
    }

    #[inline]
    pub fn world_z(self) -> f32 {
        self.iz as f32 / FIXED_POINT_SCALE
    }
}

/// Horizontal grid spacing, held in tenths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSpec {
    step: i32,
}

impl GridSpec {
    /// Spacing is rounded to the nearest tenth, with a floor of one tenth.
    pub fn from_spacing(spacing: f32) -> Self {
        Self {
            step: quantize(spacing).max(1),
        }
    }

    #[inline]
    pub const fn from_step(step: i32) -> Self {
        Self {
            step: if step < 1 { 1 } else { step },
        }
    }

    /// Spacing in key units (tenths).
    #[inline]
    pub fn step(&self) -> i32 {
        self.step
    }

    #[inline]
    pub fn spacing(&self) -> f32 {
        self.step as f32 / FIXED_POINT_SCALE
    }

    /// Snaps one world coordinate to the nearest column and returns its key component.
    #[inline]
    pub fn snap(&self, v: f32) -> i32 {
        (v / self.spacing()).round() as i32 * self.step
    }

    #[inline]
    pub fn key_for(&self, x: f32, z: f32) -> ColumnKey {
        ColumnKey::new(self.snap(x), self.snap(z))
    }

    /// Whole grid steps closest to `distance`.
    #[inline]
    pub fn steps_for(&self, distance: f32) -> i32 {
        (distance / self.spacing()).round() as i32
    }

    /// `distance` rounded to a whole number of steps, in key units.
    #[inline]
    pub fn span_for(&self, distance: f32) -> i32 {
        self.steps_for(distance) * self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_rounds_to_tenths() {
        assert_eq!(GridSpec::from_spacing(0.5).step(), 5);
        assert_eq!(GridSpec::from_spacing(0.14).step(), 1);
        assert_eq!(GridSpec::from_spacing(0.0).step(), 1);
        assert_eq!(GridSpec::from_spacing(2.0).step(), 20);
    }

    #[test]
    fn positions_in_same_bucket_share_key() {
        let g = GridSpec::from_spacing(0.5);
        assert_eq!(g.key_for(1.01, -0.2), g.key_for(0.8, 0.2));
        assert_eq!(g.key_for(1.01, -0.2), ColumnKey::new(10, 0));
        assert_ne!(g.key_for(1.3, 0.0), g.key_for(1.2, 0.0));
    }

    #[test]
    fn key_round_trips_to_world() {
        let g = GridSpec::from_spacing(0.5);
        let k = g.key_for(-3.4, 7.76);
        assert_eq!(k, ColumnKey::new(-35, 80));
        assert_eq!(k.world_x(), -3.5);
        assert_eq!(k.world_z(), 8.0);
    }

    #[test]
    fn radius_snaps_to_whole_steps() {
        let g = GridSpec::from_spacing(0.5);
        assert_eq!(g.span_for(10.0), 100);
        assert_eq!(g.span_for(10.2), 100);
        assert_eq!(g.span_for(10.3), 105);
        let g = GridSpec::from_spacing(0.3);
        assert_eq!(g.span_for(10.0), 99);
    }

    #[test]
    fn quantize_uses_tenths() {
        assert_eq!(quantize(1.26), 13);
        assert_eq!(quantize(-0.04), 0);
        assert_eq!(quantize(-0.06), -1);
    }
}
