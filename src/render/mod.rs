pub mod accumulator;
pub mod config;
pub mod frame;
pub mod scheduler;
pub mod stats;
