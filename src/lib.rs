// src/lib.rs — Library root for Atelier

pub mod budget;
pub mod cli;
pub mod cost;
pub mod engine;
pub mod feedback;
pub mod gateway;
pub mod generator;
pub mod infra;
pub mod iteration;
pub mod model;
pub mod prompt;
pub mod store;
