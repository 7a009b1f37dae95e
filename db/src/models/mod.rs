pub mod machine;
pub mod usage_session;
