pub mod bullet;
pub mod constants;
pub mod tank;
