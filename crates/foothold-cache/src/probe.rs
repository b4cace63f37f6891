//! Vertical geometry queries against the host world.

use std::fmt;

use foothold_geom::Vec3;

/// One surface intersection reported by a vertical probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    pub point: Vec3,
    pub normal: Vec3,
    /// Collider-level walkability flag; `false` marks the surface as never standable.
    pub standable: bool,
    /// Concave colliders only report their first hit per query.
    pub convex: bool,
}

impl ProbeHit {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal,
            standable: true,
            convex: true,
        }
    }

    pub fn concave(mut self) -> Self {
        self.convex = false;
        self
    }

    pub fn blocked(mut self) -> Self {
        self.standable = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// No world geometry is loaded.
    WorldUnavailable,
    InvalidSegment { origin_y: f32, max_distance: f32 },
    Backend(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::WorldUnavailable => write!(f, "no world geometry loaded"),
            ProbeError::InvalidSegment {
                origin_y,
                max_distance,
            } => write!(
                f,
                "invalid probe segment from y={} over {}",
                origin_y, max_distance
            ),
            ProbeError::Backend(msg) => write!(f, "probe backend error: {}", msg),
        }
    }
}

impl std::error::Error for ProbeError {}

/// Downward ray query. Implementations append every intersection along the
/// segment `origin .. origin - max_distance * UP` to `hits`, in any order.
pub trait GeometryProbe {
    fn probe_vertical(
        &mut self,
        origin: Vec3,
        max_distance: f32,
        hits: &mut Vec<ProbeHit>,
    ) -> Result<(), ProbeError>;
}

impl<P: GeometryProbe + ?Sized> GeometryProbe for &mut P {
    fn probe_vertical(
        &mut self,
        origin: Vec3,
        max_distance: f32,
        hits: &mut Vec<ProbeHit>,
    ) -> Result<(), ProbeError> {
        (**self).probe_vertical(origin, max_distance, hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_problem() {
        assert_eq!(
            ProbeError::WorldUnavailable.to_string(),
            "no world geometry loaded"
        );
        let e = ProbeError::InvalidSegment {
            origin_y: 1.5,
            max_distance: -2.0,
        };
        assert!(e.to_string().contains("y=1.5"));
        assert!(ProbeError::Backend("boom".into()).to_string().ends_with("boom"));
    }

    #[test]
    fn hit_builders_set_flags() {
        let h = ProbeHit::new(Vec3::ZERO, Vec3::UP);
        assert!(h.standable && h.convex);
        let h = h.concave().blocked();
        assert!(!h.standable && !h.convex);
    }
}
