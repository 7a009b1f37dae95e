#![allow(dead_code)]

pub mod app;
pub mod ws;

pub use app::{make_test_app, post_json};
pub use ws::{connect_fleet, spawn_server};
