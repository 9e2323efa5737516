pub mod bracket;
pub mod bracket_layout;
pub mod config;
pub mod demo;
pub mod engine;
pub mod export;
pub mod model;
pub mod season;
pub mod standings;
pub mod state;
pub mod store;
pub mod zones;
