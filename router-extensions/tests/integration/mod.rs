pub(crate) mod common;

mod persisted_operations;
mod rest_docs;
mod rest_facade;
