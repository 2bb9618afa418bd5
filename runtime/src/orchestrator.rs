use crate::config::{global_pool_config, pin_worker, RuntimeConfig};
use crate::{Error, Result};
use rayon::ThreadPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

pub const DEFAULT_GROUP: &str = "default";

/// A named Rayon pool that CPU-parallel routines run inside.
pub struct ResourceGroup {
    pub name: String,
    pub pool: Arc<ThreadPool>,
    pub cores: Vec<usize>,
}

impl std::fmt::Debug for ResourceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGroup")
            .field("name", &self.name)
            .field("threads", &self.pool.current_num_threads())
            .field("cores", &self.cores)
            .finish()
    }
}

impl ResourceGroup {
    pub fn new(name: &str, num_threads: usize, core_ids: Option<Vec<usize>>) -> Result<Self> {
        if num_threads == 0 {
            return Err(Error::ConfigError(format!(
                "resource group '{name}' needs at least one thread"
            )));
        }
        let thread_name_prefix = format!("cv-{}-", name);

        let mut builder = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(move |i| format!("{}{}", thread_name_prefix, i));
        if let Some(cores) = core_ids.clone() {
            builder = builder.start_handler(move |i| pin_worker(&cores, i));
        }
        let pool = builder
            .build()
            .map_err(|e| Error::RuntimeError(e.to_string()))?;

        tracing::debug!(group = name, threads = num_threads, "created resource group");

        Ok(Self {
            name: name.to_string(),
            pool: Arc::new(pool),
            cores: core_ids.unwrap_or_default(),
        })
    }

    pub fn from_config(name: &str, config: &RuntimeConfig) -> Result<Self> {
        Self::new(name, config.resolved_threads(), config.core_ids.clone())
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` inside this group's pool; Rayon iterators in `f` use its workers.
    pub fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(f)
    }
}

pub struct TaskScheduler {
    groups: Mutex<HashMap<String, Arc<ResourceGroup>>>,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
        }
    }

    pub fn create_group(
        &self,
        name: &str,
        num_threads: usize,
        cores: Option<Vec<usize>>,
    ) -> Result<Arc<ResourceGroup>> {
        let group = Arc::new(ResourceGroup::new(name, num_threads, cores)?);
        self.groups
            .lock()
            .map_err(|_| Error::RuntimeError("scheduler lock poisoned".to_string()))?
            .insert(name.to_string(), group.clone());
        Ok(group)
    }

    pub fn get_group(&self, name: &str) -> Option<Arc<ResourceGroup>> {
        self.groups.lock().ok()?.get(name).cloned()
    }

    pub fn remove_group(&self, name: &str) -> Option<Arc<ResourceGroup>> {
        self.groups.lock().ok()?.remove(name)
    }

    pub fn get_default_group(&self) -> Result<Arc<ResourceGroup>> {
        self.get_group(DEFAULT_GROUP)
            .ok_or_else(|| Error::RuntimeError("default resource group missing".to_string()))
    }
}

static GLOBAL_SCHEDULER: OnceLock<Result<TaskScheduler>> = OnceLock::new();

/// Process-wide scheduler. The default group mirrors the global pool's
/// layout, so `init_global_thread_pool` called first decides its size.
pub fn scheduler() -> Result<&'static TaskScheduler> {
    GLOBAL_SCHEDULER
        .get_or_init(|| {
            let config = match global_pool_config() {
                Ok(config) => config,
                Err(Error::RuntimeError(e)) => {
                    // The global pool was built outside this crate; follow it.
                    tracing::warn!(error = %e, "global thread pool not configured here");
                    RuntimeConfig::new(rayon::current_num_threads())
                }
                Err(e) => return Err(e),
            };
            let s = TaskScheduler::new();
            s.create_group(DEFAULT_GROUP, config.resolved_threads(), config.core_ids)?;
            Ok(s)
        })
        .as_ref()
        .map_err(Clone::clone)
}
