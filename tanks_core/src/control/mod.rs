//! Behaviour layered on top of the plain state in [`crate::common`]

pub mod bullet;
pub mod tank;
