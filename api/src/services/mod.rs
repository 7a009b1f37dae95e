pub mod error;
pub mod presence;
pub mod reconciler;
pub mod snapshot;
