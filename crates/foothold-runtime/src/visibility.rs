//! Per-column show/hide decisions.

use foothold_cache::{ColumnKey, MarkerSink, SpatialColumnCache};
use foothold_geom::IncrementalFrustum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisibilityGate {
    /// Show samples inside the view frustum.
    Frustum,
    /// Show samples within the detection radius vertically, regardless of view direction.
    Distance,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibilityCounts {
    pub shown: u32,
    pub hidden: u32,
}

impl VisibilityCounts {
    #[inline]
    pub fn operations(&self) -> u32 {
        self.shown + self.hidden
    }
}

/// Shows or hides every sample of a resident column.
///
/// With [`VisibilityGate::Frustum`] the caller must already have prepared
/// `frustum` for this column's x and z.
pub fn evaluate_column<S: MarkerSink + ?Sized>(
    cache: &mut SpatialColumnCache,
    key: ColumnKey,
    gate: VisibilityGate,
    frustum: &IncrementalFrustum,
    focal_y: f32,
    radius: f32,
    sink: &mut S,
) -> VisibilityCounts {
    let mut counts = VisibilityCounts::default();
    cache.for_each_sample_mut(key, |sample| {
        let y = sample.position.y;
        let in_view = match gate {
            VisibilityGate::Frustum => frustum.contains_y(y),
            VisibilityGate::Distance => (focal_y - y).abs() <= radius,
        };
        match (sample.marker, in_view) {
            (None, true) => {
                sample.marker = Some(sink.acquire(sample.kind(), sample.position));
                counts.shown += 1;
            }
            (Some(handle), false) => {
                sink.release(handle);
                sample.marker = None;
                counts.hidden += 1;
            }
            _ => {}
        }
    });
    counts
}
