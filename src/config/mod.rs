/// Database configuration and connection management
pub mod database;

/// Ledger settings loaded from a TOML file and the environment
pub mod settings;
