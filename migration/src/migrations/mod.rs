pub mod m202602100001_create_machines;
pub mod m202602100002_create_usage_sessions;
