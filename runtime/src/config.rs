use crate::{Error, Result};
use rayon::ThreadPoolBuilder;
use std::env;
use std::sync::OnceLock;

/// Environment variable consulted for the CPU worker count.
pub const THREADS_ENV_VAR: &str = "CV_CPU_THREADS";
/// Environment variable holding a comma-separated list of cores to pin workers to.
pub const CORES_ENV_VAR: &str = "CV_CPU_CORES";

static GLOBAL_POOL: OnceLock<Result<RuntimeConfig>> = OnceLock::new();

/// Thread layout for a resource group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Worker count. `None` means the Rayon default.
    pub num_threads: Option<usize>,
    /// Cores to pin workers to, assigned round-robin.
    pub core_ids: Option<Vec<usize>>,
}

impl RuntimeConfig {
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
            core_ids: None,
        }
    }

    pub fn with_core_ids(mut self, core_ids: Vec<usize>) -> Self {
        self.core_ids = Some(core_ids);
        self
    }

    /// Reads `CV_CPU_THREADS` and `CV_CPU_CORES`, if set.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            num_threads: read_env(THREADS_ENV_VAR)?
                .map(|raw| parse_thread_count(&raw))
                .transpose()?,
            core_ids: read_env(CORES_ENV_VAR)?
                .map(|raw| parse_core_ids(&raw))
                .transpose()?,
        })
    }

    /// Resolved worker count, falling back to the available hardware threads.
    /// Does not touch the global Rayon pool.
    pub fn resolved_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        })
    }
}

/// Initialize the global Rayon thread pool used by CPU-parallel routines.
///
/// Priority:
/// 1. `num_threads` argument
/// 2. `CV_CPU_THREADS` environment variable
/// 3. Rayon default
///
/// Workers are pinned to `CV_CPU_CORES` when it is set. The first call wins;
/// later calls return its outcome.
pub fn init_global_thread_pool(num_threads: Option<usize>) -> Result<()> {
    init_global_with(|| {
        let mut config = RuntimeConfig::from_env()?;
        if num_threads.is_some() {
            config.num_threads = num_threads;
        }
        Ok(config)
    })
    .map(|_| ())
}

/// Initialize the global Rayon thread pool from an explicit layout.
pub fn init_global_thread_pool_with(config: RuntimeConfig) -> Result<()> {
    init_global_with(|| Ok(config)).map(|_| ())
}

/// Layout of the global pool, initializing it from the environment if no
/// one has yet. `num_threads` is always the actual worker count.
pub fn global_pool_config() -> Result<RuntimeConfig> {
    init_global_with(RuntimeConfig::from_env)
}

fn init_global_with<F>(make_config: F) -> Result<RuntimeConfig>
where
    F: FnOnce() -> Result<RuntimeConfig>,
{
    GLOBAL_POOL
        .get_or_init(|| {
            let config = make_config()?;

            let mut builder = ThreadPoolBuilder::new();
            if let Some(n) = config.num_threads {
                if n == 0 {
                    return Err(Error::ConfigError(format!(
                        "{THREADS_ENV_VAR} must be >= 1"
                    )));
                }
                builder = builder.num_threads(n);
            }
            if let Some(cores) = config.core_ids.clone() {
                builder = builder.start_handler(move |i| pin_worker(&cores, i));
            }

            builder
                .build_global()
                .map_err(|e| Error::RuntimeError(e.to_string()))?;

            let threads = rayon::current_num_threads();
            tracing::debug!(threads, cores = ?config.core_ids, "initialized global thread pool");
            Ok(RuntimeConfig {
                num_threads: Some(threads),
                core_ids: config.core_ids,
            })
        })
        .clone()
}

/// Pin the calling worker to `cores[index % cores.len()]`.
pub(crate) fn pin_worker(cores: &[usize], index: usize) {
    if let Some(&id) = cores.get(index % cores.len().max(1)) {
        if !core_affinity::set_for_current(core_affinity::CoreId { id }) {
            tracing::warn!(core = id, worker = index, "failed to pin worker thread");
        }
    }
}

pub fn current_cpu_threads() -> usize {
    rayon::current_num_threads()
}

fn read_env(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(raw) => Ok(Some(raw)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::ConfigError(format!("failed to read {name}: {e}"))),
    }
}

fn parse_thread_count(raw: &str) -> Result<usize> {
    let parsed: usize = raw.trim().parse().map_err(|_| {
        Error::ConfigError(format!(
            "{THREADS_ENV_VAR} must be a positive integer, got '{raw}'"
        ))
    })?;
    if parsed == 0 {
        return Err(Error::ConfigError(format!(
            "{THREADS_ENV_VAR} must be >= 1"
        )));
    }
    Ok(parsed)
}

fn parse_core_ids(raw: &str) -> Result<Vec<usize>> {
    let cores = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| {
                Error::ConfigError(format!("{CORES_ENV_VAR} has a bad core id '{s}'"))
            })
        })
        .collect::<Result<Vec<usize>>>()?;
    if cores.is_empty() {
        return Err(Error::ConfigError(format!(
            "{CORES_ENV_VAR} lists no cores"
        )));
    }
    Ok(cores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_thread_count() {
        assert_eq!(parse_thread_count("4").unwrap(), 4);
        assert_eq!(parse_thread_count(" 2 ").unwrap(), 2);
    }

    #[test]
    fn test_parse_thread_count_rejects_zero() {
        let err = parse_thread_count("0").unwrap_err();
        assert!(err.to_string().contains(">= 1"));
    }

    #[test]
    fn test_parse_thread_count_rejects_garbage() {
        assert!(matches!(
            parse_thread_count("many"),
            Err(Error::ConfigError(_))
        ));
        assert!(parse_thread_count("-3").is_err());
    }

    #[test]
    fn test_parse_core_ids() {
        assert_eq!(parse_core_ids("0").unwrap(), vec![0]);
        assert_eq!(parse_core_ids(" 0, 2,3 ,").unwrap(), vec![0, 2, 3]);
    }

    #[test]
    fn test_parse_core_ids_rejects_garbage() {
        assert!(matches!(parse_core_ids("0,x"), Err(Error::ConfigError(_))));
        assert!(matches!(parse_core_ids(" , "), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_resolved_threads() {
        assert_eq!(RuntimeConfig::new(3).resolved_threads(), 3);
        assert!(RuntimeConfig::default().resolved_threads() >= 1);
    }

    #[test]
    fn test_with_core_ids() {
        let config = RuntimeConfig::new(2).with_core_ids(vec![0, 1]);
        assert_eq!(config.core_ids, Some(vec![0, 1]));
    }
}
