pub mod buffer;
pub mod resample;
