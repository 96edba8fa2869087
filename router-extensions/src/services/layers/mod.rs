//! Layers that are specific to one pipeline stage.

pub(crate) mod persisted_operations;
