pub mod agent;
pub mod config;
pub mod constants;
pub mod driver;
pub mod effects;
pub mod engine;
pub mod grid;
pub mod maze;
pub mod pathfinding;
pub mod player;
pub mod rng;
pub mod types;
