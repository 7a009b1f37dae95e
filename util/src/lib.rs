pub mod config;
pub mod state;
pub mod sync;
pub mod ws;
