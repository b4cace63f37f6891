//! Pooled marker balls: the headless stand-in for the rendered spheres.

use foothold_cache::{MarkerHandle, MarkerKind, MarkerSink, ObjectPool, PoolHandle, PoolStats, Recycle};
use foothold_geom::Vec3;

use crate::config::FootholdConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ball {
    pub position: Vec3,
    pub color: [u8; 3],
    pub alpha: f32,
    pub scale: f32,
    pub visible: bool,
}

impl Recycle for Ball {
    fn recycle(&mut self) {
        self.visible = false;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BallStats {
    pub shown: [usize; 2],
    pub pooled: [PoolStats; 2],
    pub peak_shown: usize,
    pub stale_releases: u64,
}

impl BallStats {
    pub fn total_shown(&self) -> usize {
        self.shown[0] + self.shown[1]
    }
}

/// One pool per marker kind, styled from `[appearance]`.
pub struct BallSink {
    pools: [ObjectPool<Ball>; 2],
    colors: [[u8; 3]; 2],
    alpha: [f32; 2],
    scale: f32,
    peak_shown: usize,
    stale_releases: u64,
}

// Kind lives in the low bit; the top bit of the slot version is dropped, which
// only makes a handle go stale early.
fn encode(kind: MarkerKind, handle: PoolHandle) -> MarkerHandle {
    MarkerHandle((handle.to_bits() << 1) | kind.index() as u64)
}

fn decode(handle: MarkerHandle) -> (MarkerKind, PoolHandle) {
    let kind = if handle.0 & 1 == 0 {
        MarkerKind::Standable
    } else {
        MarkerKind::NonStandable
    };
    (kind, PoolHandle::from_bits(handle.0 >> 1))
}

impl BallSink {
    pub fn new(config: &FootholdConfig) -> Self {
        let size = config.marker_pool_size();
        let grow = (size / 10).max(1);
        log::info!("marker pools: {} balls per kind, growing by {}", size, grow);
        let mut sink = Self {
            pools: [
                ObjectPool::with_capacity(size, grow),
                ObjectPool::with_capacity(size, grow),
            ],
            colors: [[0; 3]; 2],
            alpha: [1.0; 2],
            scale: 0.0,
            peak_shown: 0,
            stale_releases: 0,
        };
        sink.restyle(config);
        sink
    }

    /// Applies colours and scale to every pooled ball, shown or not.
    pub fn restyle(&mut self, config: &FootholdConfig) {
        self.colors = [
            config.appearance.standable_color.rgb(),
            config.appearance.non_standable_color.rgb(),
        ];
        self.scale = config.marker_scale();
        for kind in MarkerKind::ALL {
            let color = self.colors[kind.index()];
            for (_, ball) in self.pools[kind.index()].iter_mut() {
                ball.color = color;
                ball.scale = self.scale;
            }
        }
    }

    pub fn get(&self, handle: MarkerHandle) -> Option<&Ball> {
        let (kind, h) = decode(handle);
        self.pools[kind.index()].get(h)
    }

    pub fn shown(&self) -> usize {
        self.pools.iter().map(ObjectPool::in_use).sum()
    }

    pub fn alpha(&self, kind: MarkerKind) -> f32 {
        self.alpha[kind.index()]
    }

    #[cfg(test)]
    pub(crate) fn balls(&self) -> impl Iterator<Item = &Ball> + '_ {
        self.pools.iter().flat_map(|p| p.iter().map(|(_, b)| b))
    }

    pub fn stats(&self) -> BallStats {
        BallStats {
            shown: [self.pools[0].in_use(), self.pools[1].in_use()],
            pooled: [self.pools[0].stats(), self.pools[1].stats()],
            peak_shown: self.peak_shown,
            stale_releases: self.stale_releases,
        }
    }
}

impl MarkerSink for BallSink {
    fn acquire(&mut self, kind: MarkerKind, position: Vec3) -> MarkerHandle {
        let i = kind.index();
        let h = self.pools[i].acquire();
        self.pools[i][h] = Ball {
            position,
            color: self.colors[i],
            alpha: self.alpha[i],
            scale: self.scale,
            visible: true,
        };
        self.peak_shown = self.peak_shown.max(self.shown());
        encode(kind, h)
    }

    fn release(&mut self, handle: MarkerHandle) {
        let (kind, h) = decode(handle);
        if !self.pools[kind.index()].release(h) {
            self.stale_releases += 1;
            log::warn!("release of stale marker {:?}", handle);
        }
    }

    fn update_alpha(&mut self, kind: MarkerKind, alpha: f32) {
        let i = kind.index();
        self.alpha[i] = alpha;
        for (_, ball) in self.pools[i].iter_mut() {
            ball.alpha = alpha;
        }
    }
}
