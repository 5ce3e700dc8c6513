pub mod biquad;
pub mod common;
pub mod compressor;
pub mod crossover;
pub mod meter;
