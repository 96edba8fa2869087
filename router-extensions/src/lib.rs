//! Request pipeline extensions for a GraphQL router:
//!
//! * a persisted-operation gate that only lets registered operation documents execute,
//! * a REST facade that exposes the schema over conventional HTTP verbs and paths,
//!   multiplexing each REST call onto the shared execution engine.

#![warn(unreachable_pub)]

pub mod configuration;
mod context;
pub mod error;
pub mod graphql;
pub mod json_ext;
pub mod layers;
pub mod plugin;
pub mod plugins;
mod request;
mod response;
mod schema;
pub mod services;

pub use configuration::Configuration;
pub use context::Context;
pub use schema::Schema;
