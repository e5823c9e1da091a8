//! Worker group configuration.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `workers` | available CPU parallelism |
//! | `thread_name_prefix` | `"execbridge-worker"` |
//! | `thread_stack_size` | 2 MiB |
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic** — fields set directly on [`GroupConfig`]
//! 2. **Environment variables** — applied via [`GroupConfig::apply_env_overrides`]
//! 3. **Defaults** — [`GroupConfig::default`]

use core::fmt;

/// Environment variable name for the worker count.
pub const ENV_WORKER_THREADS: &str = "EXECBRIDGE_WORKER_THREADS";
/// Environment variable name for the worker thread name prefix.
pub const ENV_THREAD_NAME_PREFIX: &str = "EXECBRIDGE_THREAD_NAME_PREFIX";
/// Environment variable name for the worker thread stack size.
pub const ENV_THREAD_STACK_SIZE: &str = "EXECBRIDGE_THREAD_STACK_SIZE";

/// Error building a worker group.
#[derive(Debug)]
pub enum BuildError {
    /// A field value failed validation.
    InvalidValue {
        /// The field that failed validation.
        field: &'static str,
        /// Why the value is invalid.
        reason: String,
    },
    /// Spawning a worker thread failed.
    ThreadSpawn {
        /// The name of the thread that could not be spawned.
        thread: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid value for {field}: {reason}")
            }
            Self::ThreadSpawn { thread, source } => {
                write!(f, "failed to spawn worker thread {thread}: {source}")
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidValue { .. } => None,
            Self::ThreadSpawn { source, .. } => Some(source),
        }
    }
}

/// Worker group configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// Number of workers (default: available parallelism).
    pub workers: usize,
    /// Name prefix for worker threads.
    pub thread_name_prefix: String,
    /// Stack size per worker thread.
    pub thread_stack_size: usize,
}

impl GroupConfig {
    /// Normalizes configuration values to safe defaults.
    pub fn normalize(&mut self) {
        if self.workers == 0 {
            self.workers = 1;
        }
        if self.thread_stack_size == 0 {
            self.thread_stack_size = 2 * 1024 * 1024;
        }
        if self.thread_name_prefix.is_empty() {
            self.thread_name_prefix = "execbridge-worker".to_string();
        }
    }

    /// Applies environment variable overrides.
    ///
    /// Only variables that are set in the environment are applied.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidValue`] if a variable is set but contains
    /// an unparseable value.
    pub fn apply_env_overrides(&mut self) -> Result<(), BuildError> {
        if let Some(value) = read_env(ENV_WORKER_THREADS) {
            self.workers = parse_usize(ENV_WORKER_THREADS, &value)?;
        }
        if let Some(value) = read_env(ENV_THREAD_NAME_PREFIX) {
            self.thread_name_prefix = value;
        }
        if let Some(value) = read_env(ENV_THREAD_STACK_SIZE) {
            self.thread_stack_size = parse_usize(ENV_THREAD_STACK_SIZE, &value)?;
        }
        Ok(())
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            thread_name_prefix: "execbridge-worker".to_string(),
            thread_stack_size: 2 * 1024 * 1024,
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_usize(name: &'static str, value: &str) -> Result<usize, BuildError> {
    value.parse().map_err(|_| BuildError::InvalidValue {
        field: name,
        reason: format!("expected an unsigned integer, got {value:?}"),
    })
}
