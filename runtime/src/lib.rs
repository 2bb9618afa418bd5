pub mod config;
pub mod orchestrator;

pub use config::{
    current_cpu_threads, global_pool_config, init_global_thread_pool,
    init_global_thread_pool_with, RuntimeConfig, CORES_ENV_VAR, THREADS_ENV_VAR,
};
pub use orchestrator::{scheduler, ResourceGroup, TaskScheduler};

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

