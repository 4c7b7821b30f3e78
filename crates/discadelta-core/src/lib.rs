#![forbid(unsafe_code)]

//! Core: geometry primitives and logging setup shared by the Discadelta crates.
//!
//! # Role in Discadelta
//! `discadelta-core` holds the pieces that sit outside the allocation engine
//! itself: the integer [`geometry::Rect`] handed to graphics APIs after
//! layout, and the optional subscriber wiring for the engine's `tracing`
//! diagnostics.

pub mod geometry;
pub mod logging;
