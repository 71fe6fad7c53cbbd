pub mod config;
pub mod error;
pub mod gameplay;
pub mod model;
pub mod renderer;
pub mod session;
