//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Sweep: purges expired entries and evicts when over the cleanup threshold

mod sweep;

pub use sweep::spawn_sweep_task;
