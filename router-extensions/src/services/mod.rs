//! Implementation of the various steps in the processing pipeline.

use http::HeaderValue;

pub use crate::services::execution::ExecutionArgs;
pub use crate::services::execution::ExecutionEngine;
pub use crate::services::execution::ExecutionEnvironment;

pub mod execution;
pub(crate) mod layers;
pub mod router;
pub mod supergraph;

pub(crate) static APPLICATION_JSON_HEADER_VALUE: HeaderValue =
    HeaderValue::from_static("application/json");

pub(crate) static TEXT_HTML_HEADER_VALUE: HeaderValue =
    HeaderValue::from_static("text/html; charset=utf-8");
