// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Clients for the subsystems that own residuals pipeline data.
//!
//! The upload, lead sheet, assignment and audit subsystems are reached
//! through the `ResidualsBackend` trait. `fetch_snapshot` reads all four for
//! one period and assembles a `PipelineSnapshot`.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod aggregate;
mod backend;
mod error;
mod http;
mod memory;

#[cfg(test)]
mod tests;

pub use aggregate::fetch_snapshot;
pub use backend::{ResidualsBackend, Subsystem};
pub use error::{SnapshotError, UpstreamError};
pub use http::{DEFAULT_TIMEOUT, HttpBackend};
pub use memory::InMemoryBackend;
