//! Polls temperature sensors from a Home Assistant instance and serves a
//! small dashboard plus a JSON API, with a bounded rolling history per
//! sensor for trend display.
//!
//! The core (`registry`, `client`, `history`, `units`) is framework-free:
//! it takes explicit configuration, exposes `poll_one` / `poll_all` /
//! `snapshot_all`, and leaves scheduling to whoever calls it. The `server`
//! module is the thin axum layer on top.

pub mod client;
pub mod config;
pub mod domain;
pub mod history;
pub mod registry;
pub mod server;
pub mod units;
