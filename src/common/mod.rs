pub mod config;
pub mod display_server;
pub mod paths;
