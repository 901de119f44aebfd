//! Transfer Engine (C6)
//!
//! Orchestrates the three transfer topologies (send, get, relay) over a
//! bounded-concurrency worker pool, each unit running the per-file state
//! machine in `units`.

mod engine;
mod units;

pub use engine::TransferEngine;
