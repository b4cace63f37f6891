use foothold_cache::grid::FIXED_POINT_SCALE;
use foothold_cache::{CacheParams, GridSpec};

/// Validated scan parameters handed to the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanSettings {
    pub grid: GridSpec,
    /// Detection radius in world units.
    pub radius: f32,
    /// Work units (probes plus marker operations) per resume.
    pub max_work_per_frame: u32,
    pub concave_detection: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::new(0.5, 10.0, 100, true)
    }
}

impl ScanSettings {
    pub fn new(spacing: f32, radius: f32, max_work_per_frame: u32, concave_detection: bool) -> Self {
        Self {
            grid: GridSpec::from_spacing(spacing),
            radius: radius.max(0.0),
            max_work_per_frame: max_work_per_frame.max(1),
            concave_detection,
        }
    }

    /// Detection radius snapped to whole grid steps, in key units.
    #[inline]
    pub fn safe_range(&self) -> i32 {
        self.grid.span_for(self.radius)
    }

    /// [`Self::safe_range`] back in world units; the frustum far plane.
    #[inline]
    pub fn safe_radius(&self) -> f32 {
        self.safe_range() as f32 / FIXED_POINT_SCALE
    }

    pub fn cache_params(&self) -> CacheParams {
        CacheParams {
            concave_refinement: self.concave_detection,
            ..CacheParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_range_is_whole_steps() {
        let s = ScanSettings::new(0.5, 10.0, 100, true);
        assert_eq!(s.grid.step(), 5);
        assert_eq!(s.safe_range(), 100);
        let s = ScanSettings::new(0.3, 10.0, 100, true);
        assert_eq!(s.safe_range() % 3, 0);
    }

    #[test]
    fn safe_radius_matches_the_scanned_extent() {
        let s = ScanSettings::new(0.5, 10.0, 100, true);
        assert_eq!(s.safe_radius(), 10.0);
        // 10 / 0.3 rounds to 33 steps
        let s = ScanSettings::new(0.3, 10.0, 100, true);
        assert!((s.safe_radius() - 9.9).abs() < 1e-5);
        // 10 / 0.6 rounds up to 17 steps, past the raw radius
        let s = ScanSettings::new(0.6, 10.0, 100, true);
        assert!((s.safe_radius() - 10.2).abs() < 1e-5);
        assert!(s.safe_radius() > s.radius);
    }

    #[test]
    fn budget_has_floor_of_one() {
        assert_eq!(ScanSettings::new(0.5, 10.0, 0, false).max_work_per_frame, 1);
        assert!(!ScanSettings::new(0.5, 10.0, 0, false).cache_params().concave_refinement);
    }
}
