/// Database connection management
pub mod database;

/// Generator configuration loading from config.toml
pub mod generator;
