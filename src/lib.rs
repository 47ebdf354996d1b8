//! Planboard: project planning with user-controlled ordering.
//!
//! The server side lives in [`api`] and [`db`]; the client side (HTTP client
//! plus the reorder helpers that drive it) lives in [`client`] and [`reorder`].

pub mod api;
pub mod cli;
pub mod client;
pub mod db;
pub mod models;
pub mod reorder;
