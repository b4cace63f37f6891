//! Column-keyed cache of standable ground samples around a moving focal point.
#![forbid(unsafe_code)]

mod column;
mod column_cache;
pub mod grid;
pub mod marker;
pub mod pool;
pub mod probe;

pub use column::{ColumnCache, Sample};
pub use column_cache::{
    CacheParams, ColumnCacheStats, MAX_EXTRA_PROBES, PROBE_SPAN_FACTOR, SEA_LEVEL_CUTOFF,
    SpatialColumnCache,
};
pub use grid::{ColumnKey, GridSpec, quantize};
pub use marker::{MarkerHandle, MarkerKind, MarkerSink, classify_slope};
pub use pool::{ObjectPool, PoolHandle, PoolStats, Recycle};
pub use probe::{GeometryProbe, ProbeError, ProbeHit};
