//! Simulation core of a single-screen tank toy: event buses, tank and bullet state,
//! the per-frame update loop and the movement math.

pub mod common;
pub mod control;
pub mod entity;
pub mod error;
pub mod input;
pub mod network;
pub mod observer;
pub mod runtime;
pub mod schedule;
pub mod session;
pub mod surface;
pub mod utils;

pub use entity::Tank;
pub use error::TankError;
pub use runtime::{Headless, Runtime};
