//! Process lifecycle hooks for the hyperglass server: stylesheet build, cache
//! availability check and multiprocess metrics directory management.

pub mod assets;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod hooks;
mod metrics;
pub mod multiproc;

pub use error::HookError;
pub use hooks::{Hooks, LifecycleHooks, ServerHandle, WorkerHandle};
