//! Procedural demo scenes answering vertical probes.

use clap::ValueEnum;
use fastnoise_lite::{FastNoiseLite, NoiseType};
use foothold_cache::{GeometryProbe, ProbeError, ProbeHit};
use foothold_geom::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum DemoScene {
    /// Level ground; produces no markers.
    Flat,
    /// A 40 degree ramp rising along +x.
    Ramp,
    /// Rolling noise terrain.
    Terrain,
    /// Gentle ground under a stacked concave ledge and an unwalkable roof.
    Cliffs,
    /// Menu scene; never scanned.
    Title,
}

impl DemoScene {
    /// Host scene name, matched against `[scenes].prefixes`.
    pub fn scene_name(self) -> &'static str {
        match self {
            DemoScene::Flat => "Level_Flat",
            DemoScene::Ramp => "Level_Ramp",
            DemoScene::Terrain => "Level_Terrain",
            DemoScene::Cliffs => "Airport_Cliffs",
            DemoScene::Title => "Title",
        }
    }
}

const RAMP_DEG: f32 = 40.0;
const RAMP_BASE: f32 = 20.0;
const FLAT_HEIGHT: f32 = 1.0;

/// Sloped slab over an xz footprint, rising along +x.
#[derive(Clone, Copy, Debug)]
struct Slab {
    min: (f32, f32),
    max: (f32, f32),
    /// Height at the footprint centre.
    y: f32,
    slope_deg: f32,
}

impl Slab {
    fn covers(&self, x: f32, z: f32) -> bool {
        x >= self.min.0 && x <= self.max.0 && z >= self.min.1 && z <= self.max.1
    }

    fn surface(&self, x: f32) -> (f32, Vec3) {
        let t = self.slope_deg.to_radians();
        let cx = 0.5 * (self.min.0 + self.max.0);
        (self.y + (x - cx) * t.tan(), Vec3::new(-t.sin(), t.cos(), 0.0))
    }
}

/// Layers of one concave mesh: a probe only ever reports the topmost one.
const LEDGE: [Slab; 3] = [
    Slab { min: (-2.0, -2.0), max: (2.0, 2.0), y: 14.0, slope_deg: 35.0 },
    Slab { min: (-2.0, -2.0), max: (2.0, 2.0), y: 10.0, slope_deg: 35.0 },
    Slab { min: (-2.0, -2.0), max: (2.0, 2.0), y: 6.0, slope_deg: 55.0 },
];

/// Walkable angle, but flagged as never standable.
const ROOF: Slab = Slab { min: (5.0, -3.0), max: (9.0, 3.0), y: 12.0, slope_deg: 40.0 };

pub struct DemoWorld {
    scene: DemoScene,
    noise: FastNoiseLite,
    probes: u64,
}

impl DemoWorld {
    pub fn new(scene: DemoScene, seed: i32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(0.04));
        Self {
            scene,
            noise,
            probes: 0,
        }
    }

    pub fn scene(&self) -> DemoScene {
        self.scene
    }

    pub fn probes(&self) -> u64 {
        self.probes
    }

    /// Height of the base ground under (x, z).
    pub fn ground_height(&self, x: f32, z: f32) -> f32 {
        match self.scene {
            DemoScene::Flat | DemoScene::Title => FLAT_HEIGHT,
            DemoScene::Ramp => RAMP_BASE + x * RAMP_DEG.to_radians().tan(),
            DemoScene::Terrain => 8.0 + 6.0 * self.noise.get_noise_2d(x, z),
            DemoScene::Cliffs => 2.0 + 0.8 * self.noise.get_noise_2d(x, z),
        }
    }

    fn ground_normal(&self, x: f32, z: f32) -> Vec3 {
        match self.scene {
            DemoScene::Flat | DemoScene::Title => Vec3::UP,
            DemoScene::Ramp => {
                let t = RAMP_DEG.to_radians();
                Vec3::new(-t.sin(), t.cos(), 0.0)
            }
            DemoScene::Terrain | DemoScene::Cliffs => {
                let e = 0.05;
                let dx = (self.ground_height(x + e, z) - self.ground_height(x - e, z)) / (2.0 * e);
                let dz = (self.ground_height(x, z + e) - self.ground_height(x, z - e)) / (2.0 * e);
                Vec3::new(-dx, 1.0, -dz).normalized()
            }
        }
    }
}

impl GeometryProbe for DemoWorld {
    fn probe_vertical(
        &mut self,
        origin: Vec3,
        max_distance: f32,
        hits: &mut Vec<ProbeHit>,
    ) -> Result<(), ProbeError> {
        if !(max_distance.is_finite() && max_distance >= 0.0 && origin.y.is_finite()) {
            return Err(ProbeError::InvalidSegment {
                origin_y: origin.y,
                max_distance,
            });
        }
        self.probes += 1;
        let (x, z) = (origin.x, origin.z);
        let bottom = origin.y - max_distance;
        let on_segment = |y: f32| y <= origin.y && y >= bottom;

        let ground = self.ground_height(x, z);
        if on_segment(ground) {
            hits.push(ProbeHit::new(Vec3::new(x, ground, z), self.ground_normal(x, z)));
        }

        if self.scene == DemoScene::Cliffs {
            let top = LEDGE
                .iter()
                .filter(|s| s.covers(x, z))
                .map(|s| s.surface(x))
                .filter(|&(y, _)| on_segment(y))
                .max_by(|a, b| a.0.total_cmp(&b.0));
            if let Some((y, normal)) = top {
                hits.push(ProbeHit::new(Vec3::new(x, y, z), normal).concave());
            }
            if ROOF.covers(x, z) {
                let (y, normal) = ROOF.surface(x);
                if on_segment(y) {
                    hits.push(ProbeHit::new(Vec3::new(x, y, z), normal).blocked());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(world: &mut DemoWorld, x: f32, z: f32, top: f32, span: f32) -> Vec<ProbeHit> {
        let mut hits = Vec::new();
        world
            .probe_vertical(Vec3::new(x, top, z), span, &mut hits)
            .unwrap();
        hits
    }

    #[test]
    fn flat_ground_is_level() {
        let mut w = DemoWorld::new(DemoScene::Flat, 1);
        let hits = probe(&mut w, 3.0, -7.0, 10.0, 20.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].point.y, FLAT_HEIGHT);
        assert_eq!(hits[0].normal, Vec3::UP);
        // segment stops short of the ground
        assert!(probe(&mut w, 0.0, 0.0, 10.0, 5.0).is_empty());
    }

    #[test]
    fn ramp_is_forty_degrees() {
        let mut w = DemoWorld::new(DemoScene::Ramp, 1);
        let hits = probe(&mut w, 1.0, 0.0, 40.0, 40.0);
        assert_eq!(hits.len(), 1);
        assert!((Vec3::UP.angle_deg(hits[0].normal) - 40.0).abs() < 0.01);
        assert!((hits[0].point.y - w.ground_height(1.0, 0.0)).abs() < 1e-5);
    }

    #[test]
    fn terrain_is_deterministic_per_seed() {
        let a = DemoWorld::new(DemoScene::Terrain, 7);
        let b = DemoWorld::new(DemoScene::Terrain, 7);
        for i in 0..20 {
            let (x, z) = (i as f32 * 1.3, i as f32 * -0.7);
            assert_eq!(a.ground_height(x, z), b.ground_height(x, z));
            assert!((2.0..=14.0).contains(&a.ground_height(x, z)));
        }
    }

    #[test]
    fn concave_ledge_reports_only_top_layer() {
        let mut w = DemoWorld::new(DemoScene::Cliffs, 3);
        let hits = probe(&mut w, 0.0, 0.0, 30.0, 40.0);
        let concave: Vec<_> = hits.iter().filter(|h| !h.convex).collect();
        assert_eq!(concave.len(), 1);
        assert!((concave[0].point.y - 14.0).abs() < 1e-4);
        // probing from just under it finds the next layer
        let hits = probe(&mut w, 0.0, 0.0, 13.9, 20.0);
        let concave: Vec<_> = hits.iter().filter(|h| !h.convex).collect();
        assert!((concave[0].point.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn roof_is_blocked() {
        let mut w = DemoWorld::new(DemoScene::Cliffs, 3);
        let hits = probe(&mut w, 7.0, 0.0, 30.0, 40.0);
        assert!(hits.iter().any(|h| !h.standable));
        assert!(hits.iter().filter(|h| h.standable).all(|h| h.convex));
    }

    #[test]
    fn bad_queries_fail() {
        let mut w = DemoWorld::new(DemoScene::Flat, 1);
        let mut hits = Vec::new();
        assert!(matches!(
            w.probe_vertical(Vec3::ZERO, f32::NAN, &mut hits),
            Err(ProbeError::InvalidSegment { .. })
        ));
        assert!(matches!(
            w.probe_vertical(Vec3::new(0.0, f32::INFINITY, 0.0), 1.0, &mut hits),
            Err(ProbeError::InvalidSegment { .. })
        ));
        assert_eq!(w.probes(), 0);
    }

    #[test]
    fn scene_names_gate_on_prefix() {
        let scenes = crate::config::Scenes::default();
        assert!(scenes.allows(DemoScene::Ramp.scene_name()));
        assert!(scenes.allows(DemoScene::Cliffs.scene_name()));
        assert!(!scenes.allows(DemoScene::Title.scene_name()));
    }
}
