//! Resumable, work-budgeted scan passes.
//!
//! A pass is planned up front as a list of column rects, each tagged with
//! what to do to its columns, then walked column by column across as many
//! [`ScanScheduler::resume`] calls as the budget requires. The walk only
//! stops between columns, so every column is either untouched or finished at
//! a suspension point.

use foothold_cache::{
    ColumnCacheStats, ColumnKey, GeometryProbe, MarkerSink, SpatialColumnCache,
};
use foothold_geom::{CameraView, Columns, IncrementalFrustum, Rect, Vec3, subtract};

use crate::visibility::{VisibilityGate, evaluate_column};
use crate::{ScanSettings, ViewWindow};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanKind {
    /// Hide everything and rebuild the whole active area.
    Full { gate: VisibilityGate },
    /// Only the work implied by how the window moved since the last pass.
    Incremental,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanRequest {
    pub focal: Vec3,
    pub camera: CameraView,
    pub kind: ScanKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanProgress {
    Running,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    FullScan,
    IncrementalScan,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOp {
    /// Refresh the column, then evaluate it.
    Populate(VisibilityGate),
    Evict,
    Hide,
    /// Refresh and re-evaluate against the frustum.
    Recheck,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassStep {
    pub op: PassOp,
    pub rect: Rect,
}

struct Pass {
    full: bool,
    focal_y: f32,
    frustum: IncrementalFrustum,
    step: usize,
    columns: Columns,
    prepared_x: Option<i32>,
    work: u64,
    skipped: u32,
}

pub struct ScanScheduler {
    settings: ScanSettings,
    cache: SpatialColumnCache,
    window: Option<ViewWindow>,
    plan: Vec<PassStep>,
    pass: Option<Pass>,
    passes: u64,
}

impl ScanScheduler {
    pub fn new(settings: ScanSettings) -> Self {
        let cache = SpatialColumnCache::new(settings.cache_params());
        Self {
            settings,
            cache,
            window: None,
            plan: Vec::new(),
            pass: None,
            passes: 0,
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn cache(&self) -> &SpatialColumnCache {
        &self.cache
    }

    pub fn window(&self) -> Option<&ViewWindow> {
        self.window.as_ref()
    }

    /// Steps of the current (or most recent) pass.
    pub fn plan(&self) -> &[PassStep] {
        &self.plan
    }

    pub fn passes_completed(&self) -> u64 {
        self.passes
    }

    pub fn stats(&self) -> ColumnCacheStats {
        self.cache.stats()
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pass.is_none()
    }

    pub fn state(&self) -> SchedulerState {
        match &self.pass {
            None => SchedulerState::Idle,
            Some(p) if p.full => SchedulerState::FullScan,
            Some(_) => SchedulerState::IncrementalScan,
        }
    }

    /// Plans a pass. Returns `false`, ignoring the request, while a pass is
    /// still running. Full scans hide every marker and drop columns outside
    /// the new keep area right away.
    pub fn begin<S: MarkerSink + ?Sized>(&mut self, request: ScanRequest, sink: &mut S) -> bool {
        if self.pass.is_some() {
            return false;
        }
        let frustum = IncrementalFrustum::new(&request.camera, Some(self.settings.safe_radius()));
        let center = self
            .settings
            .grid
            .key_for(request.focal.x, request.focal.z);
        let mut window = ViewWindow::new(center, request.focal.y, &self.settings, &frustum);
        if let ScanKind::Full {
            gate: VisibilityGate::Distance,
        } = request.kind
        {
            // markers may land anywhere in the active area
            window.recheck = window.active;
        }

        self.plan.clear();
        let full_gate = match (request.kind, self.window.as_ref()) {
            (ScanKind::Full { gate }, _) => Some(gate),
            (ScanKind::Incremental, None) => Some(VisibilityGate::Frustum),
            (ScanKind::Incremental, Some(prev)) => {
                plan_incremental(prev, &window, &mut self.plan);
                None
            }
        };
        if let Some(gate) = full_gate {
            let hidden = self.cache.hide_all(sink);
            let dropped = self.cache.evict_outside(window.keep, sink);
            log::debug!(
                "full scan at ({}, {}): hid {} markers, dropped {} columns",
                center.ix,
                center.iz,
                hidden,
                dropped
            );
            self.plan.push(PassStep {
                op: PassOp::Populate(gate),
                rect: window.active,
            });
        }

        let step = self.settings.grid.step();
        let columns = self
            .plan
            .first()
            .map_or(Rect::EMPTY, |s| s.rect)
            .columns(step);
        self.pass = Some(Pass {
            full: full_gate.is_some(),
            focal_y: request.focal.y,
            frustum,
            step: 0,
            columns,
            prepared_x: None,
            work: 0,
            skipped: 0,
        });
        self.window = Some(window);
        true
    }

    /// Works through the pass until `budget` work units are spent. At least
    /// one column is processed per call.
    pub fn resume<P, S>(&mut self, budget: u32, probe: &mut P, sink: &mut S) -> ScanProgress
    where
        P: GeometryProbe + ?Sized,
        S: MarkerSink + ?Sized,
    {
        let Some(mut pass) = self.pass.take() else {
            return ScanProgress::Done;
        };
        let step = self.settings.grid.step();
        let mut spent = 0u32;
        let mut processed = 0u32;
        loop {
            if processed > 0 && spent >= budget {
                pass.work += u64::from(spent);
                self.pass = Some(pass);
                return ScanProgress::Running;
            }
            let Some((x, z)) = pass.columns.next() else {
                pass.step += 1;
                match self.plan.get(pass.step) {
                    Some(next) => {
                        pass.columns = next.rect.columns(step);
                        pass.prepared_x = None;
                        continue;
                    }
                    None => break,
                }
            };
            let op = self.plan[pass.step].op;
            spent += self.process(&mut pass, op, ColumnKey::new(x, z), probe, sink);
            processed += 1;
        }

        pass.work += u64::from(spent);
        self.passes += 1;
        if pass.skipped > 0 {
            log::warn!("scan pass finished with {} columns skipped", pass.skipped);
        }
        log::debug!(
            "{} pass done: {} work units, {} columns resident",
            if pass.full { "full" } else { "incremental" },
            pass.work,
            self.cache.len()
        );
        ScanProgress::Done
    }

    fn process<P, S>(&mut self, pass: &mut Pass, op: PassOp, key: ColumnKey, probe: &mut P, sink: &mut S) -> u32
    where
        P: GeometryProbe + ?Sized,
        S: MarkerSink + ?Sized,
    {
        let radius = self.settings.radius;
        let gate = match op {
            PassOp::Evict => return self.cache.evict(key, sink),
            PassOp::Hide => return self.cache.hide_column(key, sink),
            PassOp::Populate(gate) => gate,
            PassOp::Recheck => VisibilityGate::Frustum,
        };
        let probes = match self.cache.ensure_fresh(key, pass.focal_y, radius, probe, sink) {
            Ok(n) => n,
            Err(e) => {
                log::warn!("probe failed at column ({}, {}): {}", key.ix, key.iz, e);
                pass.skipped += 1;
                return 1;
            }
        };
        if gate == VisibilityGate::Frustum {
            if pass.prepared_x != Some(key.ix) {
                pass.frustum.prepare_x(key.world_x());
                pass.prepared_x = Some(key.ix);
            }
            pass.frustum.prepare_xz(key.world_z());
        }
        let counts = evaluate_column(&mut self.cache, key, gate, &pass.frustum, pass.focal_y, radius, sink);
        probes + counts.operations()
    }

    /// Drops every cached column and any pass in flight. The next
    /// incremental request becomes a full scan.
    pub fn reset<S: MarkerSink + ?Sized>(&mut self, sink: &mut S) {
        let released = self.cache.evict_all(sink);
        self.pass = None;
        self.window = None;
        self.plan.clear();
        log::debug!("scheduler reset ({} markers released)", released);
    }

    /// Abandons any pass in flight and hides every marker, keeping the cache.
    pub fn hide_all<S: MarkerSink + ?Sized>(&mut self, sink: &mut S) -> u32 {
        self.pass = None;
        self.cache.hide_all(sink)
    }

    /// Applies new settings. Everything cached is dropped.
    pub fn reconfigure<S: MarkerSink + ?Sized>(&mut self, settings: ScanSettings, sink: &mut S) {
        self.reset(sink);
        self.cache.set_concave_refinement(settings.concave_detection);
        self.settings = settings;
    }
}

/// Populate, evict, hide and recheck steps for moving from `prev` to `next`.
fn plan_incremental(prev: &ViewWindow, next: &ViewWindow, plan: &mut Vec<PassStep>) {
    let mut push = |op: PassOp, rects: &[Rect]| {
        plan.extend(rects.iter().map(|&rect| PassStep { op, rect }));
    };
    push(
        PassOp::Populate(VisibilityGate::Frustum),
        subtract(next.active, prev.active).as_slice(),
    );
    push(PassOp::Evict, subtract(prev.keep, next.keep).as_slice());
    push(PassOp::Hide, subtract(prev.recheck, next.recheck).as_slice());
    if !next.recheck.is_empty() {
        push(PassOp::Recheck, &[next.recheck]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foothold_cache::{MarkerHandle, MarkerKind, ProbeError, ProbeHit};

    /// 40-degree ramp rising along x, crossing every column once.
    struct Ramp {
        probes: u32,
        fail_at: Option<(f32, f32)>,
    }

    impl GeometryProbe for Ramp {
        fn probe_vertical(
            &mut self,
            origin: Vec3,
            max_distance: f32,
            hits: &mut Vec<ProbeHit>,
        ) -> Result<(), ProbeError> {
            self.probes += 1;
            if self.fail_at == Some((origin.x, origin.z)) {
                return Err(ProbeError::WorldUnavailable);
            }
            let t = 40f32.to_radians();
            let y = 20.0 + origin.x * t.tan();
            if y <= origin.y && y >= origin.y - max_distance {
                hits.push(ProbeHit::new(
                    Vec3::new(origin.x, y, origin.z),
                    Vec3::new(-t.sin(), t.cos(), 0.0),
                ));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Tally {
        live: i64,
        next: u64,
    }

    impl MarkerSink for Tally {
        fn acquire(&mut self, _kind: MarkerKind, _position: Vec3) -> MarkerHandle {
            self.live += 1;
            self.next += 1;
            MarkerHandle(self.next)
        }

        fn release(&mut self, _handle: MarkerHandle) {
            self.live -= 1;
        }

        fn update_alpha(&mut self, _kind: MarkerKind, _alpha: f32) {}
    }

    fn settings() -> ScanSettings {
        // 2 world units of radius keeps the grids small
        ScanSettings::new(0.5, 2.0, 10, false)
    }

    fn camera_at(focal: Vec3) -> CameraView {
        CameraView::from_yaw_pitch(focal, 0.0, -30.0, 70.0, 1.5, 0.1, 500.0)
    }

    fn run_to_end(s: &mut ScanScheduler, probe: &mut Ramp, sink: &mut Tally) -> u32 {
        let mut resumes = 0;
        loop {
            resumes += 1;
            if s.resume(s.settings().max_work_per_frame, probe, sink) == ScanProgress::Done {
                return resumes;
            }
            assert!(resumes < 10_000);
        }
    }

    fn full(focal: Vec3, gate: VisibilityGate) -> ScanRequest {
        ScanRequest {
            focal,
            camera: camera_at(focal),
            kind: ScanKind::Full { gate },
        }
    }

    #[test]
    fn only_one_pass_at_a_time() {
        let mut s = ScanScheduler::new(settings());
        let mut sink = Tally::default();
        let focal = Vec3::new(0.0, 20.0, 0.0);
        assert!(s.begin(full(focal, VisibilityGate::Distance), &mut sink));
        assert_eq!(s.state(), SchedulerState::FullScan);
        assert!(!s.begin(full(focal, VisibilityGate::Distance), &mut sink));
    }

    #[test]
    fn full_scan_spans_several_resumes() {
        let mut s = ScanScheduler::new(settings());
        let mut probe = Ramp { probes: 0, fail_at: None };
        let mut sink = Tally::default();
        let focal = Vec3::new(0.0, 20.0, 0.0);
        s.begin(full(focal, VisibilityGate::Distance), &mut sink);
        let resumes = run_to_end(&mut s, &mut probe, &mut sink);

        // 9 x 9 columns, each one probe and one marker, 10 units per resume
        assert_eq!(probe.probes, 81);
        assert_eq!(sink.live, 81);
        assert!(resumes >= 162 / 10);
        assert!(s.is_idle());
        assert_eq!(s.passes_completed(), 1);
    }

    #[test]
    fn budget_is_checked_between_columns() {
        let mut s = ScanScheduler::new(settings());
        let mut probe = Ramp { probes: 0, fail_at: None };
        let mut sink = Tally::default();
        s.begin(full(Vec3::new(0.0, 20.0, 0.0), VisibilityGate::Distance), &mut sink);
        // every column costs two units; a budget of one still makes progress
        assert_eq!(s.resume(1, &mut probe, &mut sink), ScanProgress::Running);
        assert_eq!(probe.probes, 1);
        assert_eq!(s.resume(3, &mut probe, &mut sink), ScanProgress::Running);
        assert_eq!(probe.probes, 3);
    }

    #[test]
    fn probe_failure_skips_column() {
        let mut s = ScanScheduler::new(settings());
        let mut probe = Ramp {
            probes: 0,
            fail_at: Some((0.5, 0.5)),
        };
        let mut sink = Tally::default();
        s.begin(full(Vec3::new(0.0, 20.0, 0.0), VisibilityGate::Distance), &mut sink);
        run_to_end(&mut s, &mut probe, &mut sink);
        assert_eq!(s.cache().len(), 80);
        assert!(!s.cache().contains(ColumnKey::new(5, 5)));
    }

    #[test]
    fn incremental_without_history_becomes_full() {
        let mut s = ScanScheduler::new(settings());
        let mut sink = Tally::default();
        let focal = Vec3::new(0.0, 20.0, 0.0);
        s.begin(
            ScanRequest {
                focal,
                camera: camera_at(focal),
                kind: ScanKind::Incremental,
            },
            &mut sink,
        );
        assert_eq!(s.state(), SchedulerState::FullScan);
        assert_eq!(s.plan().len(), 1);
        assert_eq!(s.plan()[0].op, PassOp::Populate(VisibilityGate::Frustum));
    }

    #[test]
    fn reset_releases_everything() {
        let mut s = ScanScheduler::new(settings());
        let mut probe = Ramp { probes: 0, fail_at: None };
        let mut sink = Tally::default();
        s.begin(full(Vec3::new(0.0, 20.0, 0.0), VisibilityGate::Distance), &mut sink);
        s.resume(20, &mut probe, &mut sink);
        assert!(!s.is_idle());
        s.reset(&mut sink);
        assert!(s.is_idle());
        assert!(s.window().is_none());
        assert!(s.cache().is_empty());
        assert_eq!(sink.live, 0);
    }

    #[test]
    fn far_plane_reaches_the_rounded_range() {
        // 1.6 / 0.6 rounds up to 3 steps, so the active area reaches 1.8
        let settings = ScanSettings::new(0.6, 1.6, 1000, false);
        assert!((settings.safe_radius() - 1.8).abs() < 1e-5);
        let mut s = ScanScheduler::new(settings);
        let mut probe = Ramp { probes: 0, fail_at: None };
        let mut sink = Tally::default();
        let focal = Vec3::new(0.0, 20.0, 0.0);
        // looking up the ramp from the focal point
        let camera = CameraView::from_yaw_pitch(focal, 0.0, 40.0, 70.0, 1.5, 0.1, 500.0);
        s.begin(
            ScanRequest {
                focal,
                camera,
                kind: ScanKind::Full {
                    gate: VisibilityGate::Frustum,
                },
            },
            &mut sink,
        );
        run_to_end(&mut s, &mut probe, &mut sink);

        // about 1.68 from the camera: past the raw radius, inside the grid range
        let key = ColumnKey::new(12, 6);
        let sample = s.cache().samples_in(key).next().unwrap();
        assert!((sample.position - focal).length() > 1.6);
        assert!(sample.is_shown());
    }

    #[test]
    fn hide_all_keeps_cache() {
        let mut s = ScanScheduler::new(settings());
        let mut probe = Ramp { probes: 0, fail_at: None };
        let mut sink = Tally::default();
        s.begin(full(Vec3::new(0.0, 20.0, 0.0), VisibilityGate::Distance), &mut sink);
        run_to_end(&mut s, &mut probe, &mut sink);
        assert_eq!(s.hide_all(&mut sink), 81);
        assert_eq!(sink.live, 0);
        assert_eq!(s.cache().len(), 81);
    }
}
