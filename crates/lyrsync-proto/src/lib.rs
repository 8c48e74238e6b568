pub mod config;
pub mod platform;
pub mod presenter;
pub mod protocol;
pub mod reconciler;
pub mod registry;
