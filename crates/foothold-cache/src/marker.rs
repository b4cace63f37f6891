//! Marker presentation seam and slope classification.

use foothold_geom::Vec3;

/// Slopes below this angle (degrees from up) are plain floor and get no marker.
pub const FLAT_MAX_ANGLE: f32 = 30.0;
/// Slopes from [`FLAT_MAX_ANGLE`] up to this angle are standable.
pub const STANDABLE_MAX_ANGLE: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Standable,
    NonStandable,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 2] = [MarkerKind::Standable, MarkerKind::NonStandable];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            MarkerKind::Standable => 0,
            MarkerKind::NonStandable => 1,
        }
    }

    #[inline]
    pub fn from_standable(standable: bool) -> Self {
        if standable {
            MarkerKind::Standable
        } else {
            MarkerKind::NonStandable
        }
    }
}

/// Opaque id of a shown marker, minted by the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

pub trait MarkerSink {
    fn acquire(&mut self, kind: MarkerKind, position: Vec3) -> MarkerHandle;
    fn release(&mut self, handle: MarkerHandle);
    fn update_alpha(&mut self, kind: MarkerKind, alpha: f32);
}

impl<S: MarkerSink + ?Sized> MarkerSink for &mut S {
    fn acquire(&mut self, kind: MarkerKind, position: Vec3) -> MarkerHandle {
        (**self).acquire(kind, position)
    }

    fn release(&mut self, handle: MarkerHandle) {
        (**self).release(handle)
    }

    fn update_alpha(&mut self, kind: MarkerKind, alpha: f32) {
        (**self).update_alpha(kind, alpha)
    }
}

/// `None` for flat ground, otherwise the marker kind the slope deserves.
pub fn classify_slope(normal: Vec3) -> Option<MarkerKind> {
    let angle = Vec3::UP.angle_deg(normal);
    if angle < FLAT_MAX_ANGLE {
        None
    } else if angle < STANDABLE_MAX_ANGLE {
        Some(MarkerKind::Standable)
    } else {
        Some(MarkerKind::NonStandable)
    }
}
