//! ObraFlow administrative scripts
//!
//! Library behind the `reconcile-forecasts` and `seed-instance` binaries:
//! entities shared with the main application, the forecast/expense repair
//! procedure and the first-run instance bootstrap.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod services;
