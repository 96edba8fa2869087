//! Plugins shipped with the extensions.

pub mod persisted_operations;
pub mod rest;
