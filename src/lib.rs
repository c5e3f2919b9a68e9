pub mod config;
pub mod diag;
pub mod emit;
pub mod model;
pub mod passes;
pub mod pipeline;
pub mod transform;
