//! # Brawl Common
//!
//! Common types shared by the Brawl combat crates:
//! - ID types (EntityId, TeamId, CollisionGroup, asset handles)
//! - The entity category lattice and physics layer masks
//! - The top-level error type
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod tags;

pub use glam::Vec2;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::tags::*;
    pub use glam::Vec2;
}

pub use prelude::*;
