pub mod particle;
pub mod spawn;
