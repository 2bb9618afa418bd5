pub use cv_core as core;
pub use cv_runtime as runtime;
pub use cv_sfm as sfm;

pub use cv_sfm::{projected_tracks, Projector, ProjectionOptions};

/// Initialize a single global Rayon thread pool for all CPU-parallel routines.
///
/// Call this once at application startup before projecting large scenes:
/// the default resource group that parallel projection runs in takes its
/// size from this pool, and is fixed by the first projection that needs it.
/// Repeated calls are idempotent and return the first initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `CV_CPU_THREADS` env var
/// 3. Rayon default
///
/// Workers are pinned to the cores listed in `CV_CPU_CORES`, if set.
pub fn init_thread_pool(num_threads: Option<usize>) -> cv_runtime::Result<()> {
    cv_runtime::init_global_thread_pool(num_threads)
}
