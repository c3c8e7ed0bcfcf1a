//! Bootstrapping of [rulewire_di] containers.
//!
//! Applications usually need more than a bare container: logging, configuration and rules kept
//! outside the code. [Bootstrap](bootstrap::Bootstrap) reads [ContainerConfig](config::ContainerConfig)
//! from the environment, installs a `tracing` logger and applies JSON or XML rule files,
//! producing a ready [Container](rulewire_di::container::Container).
//!
//! ### Features
//!
//! * `threadsafe` - use threadsafe pointers and `Send + Sync` trait bounds

pub mod bootstrap;
pub mod config;
pub mod loader;
