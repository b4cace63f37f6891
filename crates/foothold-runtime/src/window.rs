//! The three column rects a scan pass works against.

use foothold_cache::ColumnKey;
use foothold_geom::{IncrementalFrustum, Rect};

use crate::ScanSettings;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewWindow {
    pub center: ColumnKey,
    pub focal_y: f32,
    /// Markers are live here.
    pub active: Rect,
    /// Columns stay cached here.
    pub keep: Rect,
    /// Frustum footprint inside the active area; only these columns can show markers.
    pub recheck: Rect,
}

impl ViewWindow {
    pub fn new(center: ColumnKey, focal_y: f32, settings: &ScanSettings, frustum: &IncrementalFrustum) -> Self {
        let step = settings.grid.step();
        let range = settings.safe_range();
        let active = Rect::around(center.ix, center.iz, range, step);
        let keep = Rect::around(center.ix, center.iz, range * 2, step);
        let recheck = frustum
            .quantized_xz_bounds(step)
            .intersection(&active)
            .unwrap_or(Rect::EMPTY);
        Self {
            center,
            focal_y,
            active,
            keep,
            recheck,
        }
    }
}
