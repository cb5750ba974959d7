pub mod campaign;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod input;
pub mod level;
pub mod maze;
pub mod reachability;
pub mod render;
pub mod rng;
pub mod types;
