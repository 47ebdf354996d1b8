//! Domain models for Planboard.
//!
//! # Core Concepts
//!
//! - [`Project`]: Top-level container. Access is granted through [`ProjectMember`] rows.
//! - Orderable items: [`Feature`], [`Comment`], [`RoadmapItem`], [`Sprint`] and [`Task`].
//!   Each carries an integer `order` that positions it inside its scoping set
//!   (the project, or the feature for comments). Duplicate values are allowed;
//!   lists break ties by creation time.
//! - [`OrderEntry`]: One `(id, order)` pair of a reorder batch.

mod comment;
mod feature;
mod order;
mod project;
mod roadmap;
mod sprint;
mod task;

pub use comment::*;
pub use feature::*;
pub use order::*;
pub use project::*;
pub use roadmap::*;
pub use sprint::*;
pub use task::*;
