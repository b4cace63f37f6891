//! Column-keyed cache of standable ground samples.
//!
//! Each resident column remembers the vertical span it was probed over. A
//! query at focal height `y` with radius `r` reuses the column only while that
//! span still covers `[y - r, y + r]`; otherwise the column is thrown away and
//! probed again from scratch. Columns and samples live in generational pools
//! owned by the cache, so moving around a populated area does not allocate.

use std::mem;

use foothold_geom::{Rect, Vec3};
use hashbrown::HashMap;

use crate::column::{ColumnCache, Sample};
use crate::grid::{ColumnKey, quantize};
use crate::marker::{MarkerKind, MarkerSink, classify_slope};
use crate::pool::{ObjectPool, PoolHandle, PoolStats};
use crate::probe::{GeometryProbe, ProbeError, ProbeHit};

/// Hits below this height are water or void and never cached.
pub const SEA_LEVEL_CUTOFF: f32 = 0.5;
/// The probe spans `radius * PROBE_SPAN_FACTOR` above and below the focal height.
pub const PROBE_SPAN_FACTOR: f32 = 1.5;
/// Upper bound on concave refinement probes per column.
pub const MAX_EXTRA_PROBES: u32 = 100;
/// Refinement probes start this far below the concave hit they look behind.
const SUB_PROBE_NUDGE: f32 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct CacheParams {
    pub sea_level: f32,
    pub concave_refinement: bool,
    pub max_extra_probes: u32,
    pub sample_pool: usize,
    pub sample_pool_grow: usize,
    pub column_pool: usize,
    pub column_pool_grow: usize,
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            sea_level: SEA_LEVEL_CUTOFF,
            concave_refinement: true,
            max_extra_probes: MAX_EXTRA_PROBES,
            sample_pool: 40_000,
            sample_pool_grow: 40_000 / 5,
            column_pool: 10_000,
            column_pool_grow: 10_000 / 5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColumnCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub probes: u64,
    pub evictions: u64,
    pub columns: usize,
    pub samples: usize,
    pub shown: usize,
    pub sample_pool: PoolStats,
    pub column_pool: PoolStats,
}

pub struct SpatialColumnCache {
    columns: HashMap<ColumnKey, PoolHandle>,
    column_pool: ObjectPool<ColumnCache>,
    sample_pool: ObjectPool<Sample>,
    params: CacheParams,
    hit_buf: Vec<ProbeHit>,
    found_buf: Vec<f32>,
    pending_buf: Vec<f32>,
    key_buf: Vec<ColumnKey>,
    hits: u64,
    misses: u64,
    probes: u64,
    evictions: u64,
}

impl Default for SpatialColumnCache {
    fn default() -> Self {
        Self::new(CacheParams::default())
    }
}

impl SpatialColumnCache {
    pub fn new(params: CacheParams) -> Self {
        Self {
            columns: HashMap::with_capacity(params.column_pool),
            column_pool: ObjectPool::with_capacity(params.column_pool, params.column_pool_grow),
            sample_pool: ObjectPool::with_capacity(params.sample_pool, params.sample_pool_grow),
            params,
            hit_buf: Vec::new(),
            found_buf: Vec::new(),
            pending_buf: Vec::new(),
            key_buf: Vec::new(),
            hits: 0,
            misses: 0,
            probes: 0,
            evictions: 0,
        }
    }

    pub fn params(&self) -> &CacheParams {
        &self.params
    }

    pub fn set_concave_refinement(&mut self, enabled: bool) {
        self.params.concave_refinement = enabled;
    }

    /// Makes `key` valid for `focal_y ± radius`, probing on a miss.
    /// Returns the number of probes issued (0 when the cached column was reused).
    /// On error nothing is inserted for the column.
    pub fn ensure_fresh<P, S>(
        &mut self,
        key: ColumnKey,
        focal_y: f32,
        radius: f32,
        probe: &mut P,
        sink: &mut S,
    ) -> Result<u32, ProbeError>
    where
        P: GeometryProbe + ?Sized,
        S: MarkerSink + ?Sized,
    {
        if let Some(&handle) = self.columns.get(&key) {
            if self.column_pool[handle].covers(focal_y, radius) {
                self.hits += 1;
                return Ok(0);
            }
            self.evict(key, sink);
        }
        self.misses += 1;
        self.build_column(key, focal_y, radius, probe)
    }

    pub fn get_or_refresh<P, S>(
        &mut self,
        key: ColumnKey,
        focal_y: f32,
        radius: f32,
        probe: &mut P,
        sink: &mut S,
    ) -> Result<&ColumnCache, ProbeError>
    where
        P: GeometryProbe + ?Sized,
        S: MarkerSink + ?Sized,
    {
        self.ensure_fresh(key, focal_y, radius, probe, sink)?;
        match self.column(key) {
            Some(column) => Ok(column),
            None => unreachable!("column {:?} missing after refresh", key),
        }
    }

    fn build_column<P>(
        &mut self,
        key: ColumnKey,
        focal_y: f32,
        radius: f32,
        probe: &mut P,
    ) -> Result<u32, ProbeError>
    where
        P: GeometryProbe + ?Sized,
    {
        let top = focal_y + radius * PROBE_SPAN_FACTOR;
        let span = 2.0 * radius * PROBE_SPAN_FACTOR;
        let bottom = top - span;
        let (x, z) = (key.world_x(), key.world_z());

        let mut hits = mem::take(&mut self.hit_buf);
        let mut found = mem::take(&mut self.found_buf);
        let mut pending = mem::take(&mut self.pending_buf);
        hits.clear();
        found.clear();
        pending.clear();

        let result = self.probe_column(
            key,
            Vec3::new(x, top, z),
            span,
            bottom,
            probe,
            &mut hits,
            &mut found,
            &mut pending,
        );

        self.hit_buf = hits;
        self.found_buf = found;
        self.pending_buf = pending;
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn probe_column<P>(
        &mut self,
        key: ColumnKey,
        origin: Vec3,
        span: f32,
        bottom: f32,
        probe: &mut P,
        hits: &mut Vec<ProbeHit>,
        found: &mut Vec<f32>,
        pending: &mut Vec<f32>,
    ) -> Result<u32, ProbeError>
    where
        P: GeometryProbe + ?Sized,
    {
        self.probes += 1;
        probe.probe_vertical(origin, span, hits)?;
        let mut issued = 1u32;

        let handle = self.column_pool.acquire();
        {
            let column = &mut self.column_pool[handle];
            column.ray_top = origin.y;
            column.ray_bottom = bottom;
        }
        self.absorb(handle, hits, found, pending);

        if self.params.concave_refinement {
            let mut extra = 0u32;
            while let Some(hit_y) = pending.pop() {
                if extra >= self.params.max_extra_probes {
                    log::debug!(
                        "column ({}, {}): concave refinement stopped after {} probes",
                        key.ix,
                        key.iz,
                        extra
                    );
                    break;
                }
                let end = found
                    .iter()
                    .copied()
                    .filter(|&y| y < hit_y)
                    .fold(bottom, f32::max);
                let start = hit_y - SUB_PROBE_NUDGE;
                if start <= end {
                    continue;
                }
                hits.clear();
                extra += 1;
                issued += 1;
                self.probes += 1;
                if let Err(e) = probe.probe_vertical(Vec3::new(origin.x, start, origin.z), start - end, hits) {
                    let column = &mut self.column_pool[handle];
                    for (_, s) in column.samples.drain() {
                        self.sample_pool.release(s);
                    }
                    self.column_pool.release(handle);
                    return Err(e);
                }
                self.absorb(handle, hits, found, pending);
            }
        }

        self.columns.insert(key, handle);
        Ok(issued)
    }

    /// Filters one probe's hits into the column. Concave hits at a height not
    /// seen before are queued for refinement.
    fn absorb(
        &mut self,
        handle: PoolHandle,
        hits: &[ProbeHit],
        found: &mut Vec<f32>,
        pending: &mut Vec<f32>,
    ) {
        let refine = self.params.concave_refinement;
        let column = &mut self.column_pool[handle];
        for hit in hits {
            let p = hit.point;
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                continue;
            }
            if p.y < self.params.sea_level {
                continue;
            }
            let qy = quantize(p.y);
            if !found.iter().any(|&y| quantize(y) == qy) {
                found.push(p.y);
                if refine && !hit.convex {
                    pending.push(p.y);
                }
            }
            if !hit.standable {
                continue;
            }
            let Some(kind) = classify_slope(hit.normal) else {
                continue;
            };
            if column.samples.contains_key(&qy) {
                continue;
            }
            let s = self.sample_pool.acquire();
            self.sample_pool[s] = Sample {
                position: p,
                standable: kind == MarkerKind::Standable,
                marker: None,
            };
            column.samples.insert(qy, s);
        }
    }

    /// Drops a column and returns its samples to the pool, releasing any shown
    /// markers. Returns the number of markers released.
    pub fn evict<S: MarkerSink + ?Sized>(&mut self, key: ColumnKey, sink: &mut S) -> u32 {
        let Some(handle) = self.columns.remove(&key) else {
            return 0;
        };
        self.evictions += 1;
        release_column(&mut self.column_pool, &mut self.sample_pool, handle, sink)
    }

    pub fn evict_all<S: MarkerSink + ?Sized>(&mut self, sink: &mut S) -> u32 {
        let mut released = 0;
        let count = self.columns.len();
        for (_, handle) in self.columns.drain() {
            released += release_column(&mut self.column_pool, &mut self.sample_pool, handle, sink);
        }
        self.evictions += count as u64;
        if count > 0 {
            log::debug!("evicted all {} columns ({} markers released)", count, released);
        }
        released
    }

    /// Evicts every resident column outside `keep`. Returns the number of columns evicted.
    pub fn evict_outside<S: MarkerSink + ?Sized>(&mut self, keep: Rect, sink: &mut S) -> usize {
        let mut keys = mem::take(&mut self.key_buf);
        keys.clear();
        keys.extend(self.columns.keys().copied().filter(|k| !keep.contains(k.ix, k.iz)));
        for &key in &keys {
            self.evict(key, sink);
        }
        let n = keys.len();
        self.key_buf = keys;
        n
    }

    /// Releases the column's markers but keeps its samples cached.
    pub fn hide_column<S: MarkerSink + ?Sized>(&mut self, key: ColumnKey, sink: &mut S) -> u32 {
        let Some(&handle) = self.columns.get(&key) else {
            return 0;
        };
        hide_samples(&self.column_pool[handle], &mut self.sample_pool, sink)
    }

    pub fn hide_all<S: MarkerSink + ?Sized>(&mut self, sink: &mut S) -> u32 {
        let mut released = 0;
        for &handle in self.columns.values() {
            released += hide_samples(&self.column_pool[handle], &mut self.sample_pool, sink);
        }
        released
    }

    /// Visits every sample of a resident column. Returns `false` when the column is absent.
    pub fn for_each_sample_mut<F>(&mut self, key: ColumnKey, mut f: F) -> bool
    where
        F: FnMut(&mut Sample),
    {
        let Some(&handle) = self.columns.get(&key) else {
            return false;
        };
        for &s in self.column_pool[handle].samples.values() {
            f(&mut self.sample_pool[s]);
        }
        true
    }

    pub fn column(&self, key: ColumnKey) -> Option<&ColumnCache> {
        self.columns
            .get(&key)
            .and_then(|&h| self.column_pool.get(h))
    }

    /// Samples of `key`; empty when the column is not resident.
    pub fn samples_in(&self, key: ColumnKey) -> impl Iterator<Item = &Sample> + '_ {
        self.column(key)
            .into_iter()
            .flat_map(move |c| c.samples.values().filter_map(move |&s| self.sample_pool.get(s)))
    }

    #[inline]
    pub fn contains(&self, key: ColumnKey) -> bool {
        self.columns.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = ColumnKey> + '_ {
        self.columns.keys().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Samples held across all columns, without walking the pool.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_pool.in_use()
    }

    pub fn stats(&self) -> ColumnCacheStats {
        ColumnCacheStats {
            hits: self.hits,
            misses: self.misses,
            probes: self.probes,
            evictions: self.evictions,
            columns: self.columns.len(),
            samples: self.sample_count(),
            shown: self.sample_pool.iter().filter(|(_, s)| s.is_shown()).count(),
            sample_pool: self.sample_pool.stats(),
            column_pool: self.column_pool.stats(),
        }
    }
}

fn hide_samples<S: MarkerSink + ?Sized>(
    column: &ColumnCache,
    samples: &mut ObjectPool<Sample>,
    sink: &mut S,
) -> u32 {
    let mut released = 0;
    for &s in column.samples.values() {
        if let Some(marker) = samples[s].marker.take() {
            sink.release(marker);
            released += 1;
        }
    }
    released
}

fn release_column<S: MarkerSink + ?Sized>(
    columns: &mut ObjectPool<ColumnCache>,
    samples: &mut ObjectPool<Sample>,
    handle: PoolHandle,
    sink: &mut S,
) -> u32 {
    let released = hide_samples(&columns[handle], samples, sink);
    for (_, s) in columns[handle].samples.drain() {
        samples.release(s);
    }
    columns.release(handle);
    released
}
