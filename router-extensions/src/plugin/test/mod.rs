//! Utilities which make it easy to test with [`crate::plugin`].


pub(crate) use service::MockRouterService;
pub(crate) use service::MockSupergraphService;
