//! Stat economy: vitals, regeneration and action gating.

pub mod gating;
pub mod regen;
pub mod vitals;

pub use gating::{Action, ActionCost, ActionGate, Resource};
pub use regen::RegenTrack;
pub use vitals::{Stat, VitalEvent, Vitals, VitalsConfig};
