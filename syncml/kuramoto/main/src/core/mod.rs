pub mod config;
pub mod history;
pub mod network;
mod plot;
