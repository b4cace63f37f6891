use std::path::PathBuf;

use foothold_cache::{MarkerKind, MarkerSink};
use foothold_geom::{CameraView, Vec3};
use foothold_runtime::{
    ActivationMode, ActivationState, ModeAction, ScanProgress, ScanRequest, ScanScheduler,
};

use crate::config::{FootholdConfig, load_config_from_path};
use crate::event::{Event, EventEnvelope, EventQueue};
use crate::markers::BallSink;
use crate::watch::ConfigWatcher;
use crate::world::DemoWorld;

const EYE_HEIGHT: f32 = 1.6;
const CAMERA_PITCH: f32 = -20.0;
const CAMERA_FOV_Y: f32 = 70.0;
const CAMERA_ASPECT: f32 = 16.0 / 9.0;

/// Scripted viewer: walks a slow loop and turns its head.
#[derive(Clone, Copy, Debug)]
pub struct Viewer {
    pub radius: f32,
    /// Radians per second along the loop.
    pub speed: f32,
    /// Degrees per second of head turn.
    pub turn: f32,
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            radius: 6.0,
            speed: 0.15,
            turn: 12.0,
        }
    }
}

impl Viewer {
    pub fn focal(&self, world: &DemoWorld, time: f64) -> Vec3 {
        let a = time as f32 * self.speed;
        let (x, z) = (self.radius * a.cos(), self.radius * a.sin());
        Vec3::new(x, world.ground_height(x, z), z)
    }

    pub fn camera(&self, focal: Vec3, time: f64) -> CameraView {
        let yaw = (time as f32 * self.turn) % 360.0;
        CameraView::from_yaw_pitch(
            focal + Vec3::new(0.0, EYE_HEIGHT, 0.0),
            yaw,
            CAMERA_PITCH,
            CAMERA_FOV_Y,
            CAMERA_ASPECT,
            0.1,
            1000.0,
        )
    }
}

pub struct App {
    pub config: FootholdConfig,
    config_path: PathBuf,
    pub world: DemoWorld,
    pub sink: BallSink,
    pub scheduler: ScanScheduler,
    pub activation: ActivationState,
    pub queue: EventQueue,
    watcher: ConfigWatcher,
    pub viewer: Viewer,
    scene_active: bool,
    pub frame: u64,
    pub time: f64,
    peak_samples: usize,
}

impl App {
    pub fn new(
        config: FootholdConfig,
        config_path: PathBuf,
        world: DemoWorld,
        watcher: ConfigWatcher,
    ) -> Self {
        let sink = BallSink::new(&config);
        let scheduler = ScanScheduler::new(config.scan_settings());
        let activation = ActivationState::new(config.activation_mode());
        let mut queue = EventQueue::new();
        queue.emit_now(Event::WorldLoaded {
            scene: world.scene().scene_name().to_string(),
        });
        Self {
            config,
            config_path,
            world,
            sink,
            scheduler,
            activation,
            queue,
            watcher,
            viewer: Viewer::default(),
            scene_active: false,
            frame: 0,
            time: 0.0,
            peak_samples: 0,
        }
    }

    pub fn scene_active(&self) -> bool {
        self.scene_active
    }

    pub fn press_activation(&mut self) {
        self.queue.emit_now(Event::ActivationPressed);
    }

    pub fn change_mode(&mut self, mode: ActivationMode) {
        self.queue.emit_now(Event::ModeChanged { mode });
    }

    /// One host frame of `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        if self.watcher.take_changed() {
            self.queue.emit_now(Event::ConfigChanged);
        }
        self.queue.emit_now(Event::Tick);
        while let Some(env) = self.queue.pop_ready() {
            self.handle_event(env);
        }
        self.queue.advance_tick();
        self.frame += 1;
        self.time += dt;
    }

    fn handle_event(&mut self, env: EventEnvelope) {
        Self::log_event(self.queue.now, &env.kind);
        match env.kind {
            Event::Tick => self.tick(),
            Event::WorldLoaded { scene } => {
                self.scheduler.reset(&mut self.sink);
                self.sink = BallSink::new(&self.config);
                self.activation = ActivationState::new(self.config.activation_mode());
                self.peak_samples = 0;
                self.scene_active = self.config.scenes.allows(&scene);
                if self.scene_active {
                    log::info!(
                        "scene '{}': markers enabled ({} mode, key {})",
                        scene,
                        self.activation.mode(),
                        self.config.general.activation_key
                    );
                } else {
                    log::info!("scene '{}' not in configured prefixes; markers disabled", scene);
                }
            }
            Event::ActivationPressed => {
                if !self.scene_active {
                    return;
                }
                let running = !self.scheduler.is_idle();
                let action = self.activation.on_key(running, self.time);
                self.apply(action);
            }
            Event::ModeChanged { mode } => {
                self.scheduler.reset(&mut self.sink);
                self.config.general.mode = mode.name().to_string();
                self.enter_mode(mode);
            }
            Event::ConfigChanged => self.reload_config(),
        }
    }

    fn log_event(tick: u64, ev: &Event) {
        match ev {
            Event::Tick => log::trace!(target: "events", "[tick {}] Tick", tick),
            Event::WorldLoaded { scene } => {
                log::info!(target: "events", "[tick {}] WorldLoaded scene={}", tick, scene)
            }
            Event::ConfigChanged => log::info!(target: "events", "[tick {}] ConfigChanged", tick),
            Event::ActivationPressed => {
                log::debug!(target: "events", "[tick {}] ActivationPressed", tick)
            }
            Event::ModeChanged { mode } => {
                log::info!(target: "events", "[tick {}] ModeChanged mode={}", tick, mode)
            }
        }
    }

    fn reload_config(&mut self) {
        let cfg = match load_config_from_path(&self.config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!(
                    "config reload from {} failed: {}; keeping current settings",
                    self.config_path.display(),
                    e
                );
                return;
            }
        };
        self.apply_config(cfg);
    }

    /// Restyles the markers, drops the cache and restarts under `cfg`.
    pub fn apply_config(&mut self, cfg: FootholdConfig) {
        let mode_changed = cfg.activation_mode() != self.activation.mode();
        self.sink.restyle(&cfg);
        self.scheduler.reconfigure(cfg.scan_settings(), &mut self.sink);
        if mode_changed {
            self.enter_mode(cfg.activation_mode());
        }
        self.config = cfg;
        log::info!(
            "config applied: range {} spacing {} budget {} mode {}",
            self.config.general.detection_range,
            self.config.general.grid_spacing,
            self.config.general.max_points_per_frame,
            self.activation.mode()
        );
    }

    /// Fresh activation state; markers go back to opaque.
    fn enter_mode(&mut self, mode: ActivationMode) {
        self.activation = ActivationState::new(mode);
        for kind in MarkerKind::ALL {
            self.sink.update_alpha(kind, 1.0);
        }
    }

    fn tick(&mut self) {
        if !self.scene_active {
            return;
        }
        if self.scheduler.is_idle() {
            let action = self.activation.on_idle_tick();
            self.apply(action);
        }
        if !self.scheduler.is_idle() {
            let budget = self.scheduler.settings().max_work_per_frame;
            if self.scheduler.resume(budget, &mut self.world, &mut self.sink) == ScanProgress::Done {
                log::trace!("pass {} done", self.scheduler.passes_completed());
            }
        }
        self.tick_fade();

        self.peak_samples = self.peak_samples.max(self.scheduler.cache().sample_count());
        if self.config.debug.debug_mode
            && self.frame % u64::from(self.config.debug.stats_interval_frames) == 0
        {
            self.log_stats();
        }
    }

    fn tick_fade(&mut self) {
        let Some(fade) = self.activation.fade_mut() else {
            return;
        };
        let Some(alpha) = fade.tick(self.time) else {
            return;
        };
        for kind in MarkerKind::ALL {
            self.sink.update_alpha(kind, alpha);
        }
        if alpha <= 0.0 {
            let hidden = self.scheduler.hide_all(&mut self.sink);
            if hidden > 0 {
                log::debug!("fade finished, {} markers hidden", hidden);
            }
        }
    }

    fn apply(&mut self, action: ModeAction) {
        match action {
            ModeAction::StartScan(kind) => {
                let focal = self.viewer.focal(&self.world, self.time);
                let request = ScanRequest {
                    focal,
                    camera: self.viewer.camera(focal, self.time),
                    kind,
                };
                if !self.scheduler.begin(request, &mut self.sink) {
                    log::debug!("scan request ignored, pass in flight");
                }
            }
            ModeAction::CancelScan => {
                let hidden = self.scheduler.hide_all(&mut self.sink);
                log::debug!("scan cancelled, {} markers hidden", hidden);
            }
            ModeAction::NoOp => {}
        }
    }

    pub fn log_stats(&self) {
        let cache = self.scheduler.stats();
        let balls = self.sink.stats();
        let focal = self.viewer.focal(&self.world, self.time);
        let sp = cache.sample_pool;
        let leaks = sp.allocated as i64 - (sp.free + sp.in_use) as i64;
        log::info!(
            "[frame {}] focal ({:.2}, {:.2}, {:.2}) state {:?} mode {}",
            self.frame,
            focal.x,
            focal.y,
            focal.z,
            self.scheduler.state(),
            self.activation.mode()
        );
        log::info!(
            "  markers shown {} (peak {}) standable {} non-standable {} pooled [{} / {}] alpha {:.2}",
            balls.total_shown(),
            balls.peak_shown,
            balls.shown[0],
            balls.shown[1],
            balls.pooled[0].free,
            balls.pooled[1].free,
            self.sink.alpha(MarkerKind::Standable)
        );
        log::info!(
            "  cache columns {} samples {} (peak {}) probes {} hits {} misses {} evictions {}",
            cache.columns,
            cache.samples,
            self.peak_samples,
            cache.probes,
            cache.hits,
            cache.misses,
            cache.evictions
        );
        log::info!(
            "  sample pool allocations {} in use {} free {} leaks {}; column pool {} / {}",
            sp.allocated,
            sp.in_use,
            sp.free,
            leaks,
            cache.column_pool.in_use,
            cache.column_pool.allocated
        );
    }
}
