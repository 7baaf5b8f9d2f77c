//! Flexi Engine library crate.
//!
//! This crate exposes the flexi-time balance engine and the pieces
//! around it as reusable modules.  External applications may depend on
//! the `flexi_engine` crate and call `engine::compute_summary` directly,
//! drive optimistic edits through `session::AccountSession`, or embed
//! the HTTP API via `api::build_router`.

pub mod error;
pub mod models;
pub mod week;
pub mod engine;
pub mod format;
pub mod payout;
pub mod sanitize;
pub mod entries;
pub mod session;
pub mod settings;
pub mod store;
pub mod api;
