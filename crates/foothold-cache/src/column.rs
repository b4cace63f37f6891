use foothold_geom::Vec3;
use hashbrown::HashMap;

use crate::marker::{MarkerHandle, MarkerKind};
use crate::pool::{PoolHandle, Recycle};

/// One cached ground point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    pub position: Vec3,
    pub standable: bool,
    /// Marker currently showing this sample.
    pub marker: Option<MarkerHandle>,
}

impl Sample {
    #[inline]
    pub fn kind(&self) -> MarkerKind {
        MarkerKind::from_standable(self.standable)
    }

    #[inline]
    pub fn is_shown(&self) -> bool {
        self.marker.is_some()
    }
}

impl Recycle for Sample {
    fn recycle(&mut self) {
        debug_assert!(self.marker.is_none(), "sample recycled while shown");
        *self = Sample::default();
    }
}

/// Samples of one grid column keyed by quantized height, plus the vertical
/// span the column was probed over.
#[derive(Debug, Default)]
pub struct ColumnCache {
    pub ray_top: f32,
    pub ray_bottom: f32,
    pub(crate) samples: HashMap<i32, PoolHandle>,
}

impl ColumnCache {
    /// Whether the probed span still covers `[y - radius, y + radius]`.
    #[inline]
    pub fn covers(&self, y: f32, radius: f32) -> bool {
        self.ray_top >= y + radius && self.ray_bottom <= y - radius
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Recycle for ColumnCache {
    fn recycle(&mut self) {
        // keeps the map's capacity for the next column
        self.samples.clear();
        self.ray_top = 0.0;
        self.ray_bottom = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_requires_full_span() {
        let c = ColumnCache {
            ray_top: 15.0,
            ray_bottom: -15.0,
            samples: HashMap::new(),
        };
        assert!(c.covers(0.0, 10.0));
        assert!(c.covers(5.0, 10.0));
        assert!(!c.covers(5.1, 10.0));
        assert!(!c.covers(0.0, 15.5));
    }

    #[test]
    fn recycle_clears_samples() {
        let mut c = ColumnCache::default();
        c.ray_top = 3.0;
        c.samples.insert(4, crate::pool::PoolHandle::from_bits(7));
        c.recycle();
        assert!(c.is_empty());
        assert_eq!(c.ray_top, 0.0);
    }
}
