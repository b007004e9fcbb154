pub mod config;
pub mod selection;
pub mod upload;
