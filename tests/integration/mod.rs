//! Integration tests for the viewdeck orchestrator

mod config_integration;
mod directory;
mod instance_pool;
mod resource_loading;
mod test_utils;
mod view_lifecycle;
