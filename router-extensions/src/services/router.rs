#![allow(missing_docs)] // FIXME

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use http::Method;
use http::StatusCode;
use http::Uri;
use http::header::CONTENT_TYPE;
use static_assertions::assert_impl_all;
use tower::BoxError;

use crate::Context;
use crate::graphql;
use crate::services::APPLICATION_JSON_HEADER_VALUE;

pub type BoxService = tower::util::BoxService<Request, Response, BoxError>;
pub type BoxCloneService = tower::util::BoxCloneService<Request, Response, BoxError>;
pub type ServiceResult = Result<Response, BoxError>;

assert_impl_all!(Request: Send);
/// Represents the HTTP step of the processing pipeline.
///
/// This is the raw inbound request, before any GraphQL decoding, plus contextual data for
/// extensions. REST calls are answered at this step.
#[non_exhaustive]
pub struct Request {
    /// Original request to the server.
    pub router_request: http::Request<Bytes>,

    /// Context for extension
    pub context: Context,
}

impl From<(http::Request<Bytes>, Context)> for Request {
    fn from((router_request, context): (http::Request<Bytes>, Context)) -> Self {
        Self {
            router_request,
            context,
        }
    }
}

#[buildstructor::buildstructor]
impl Request {
    /// This is the constructor (or builder) to use when constructing a real Request.
    ///
    /// Required parameters are required in non-testing code to create a Request.
    #[builder(visibility = "pub")]
    fn new(
        context: Context,
        headers: HashMap<HeaderName, HeaderValue>,
        uri: Uri,
        method: Method,
        body: Bytes,
    ) -> Result<Request, BoxError> {
        let mut router_request = http::Request::builder()
            .uri(uri)
            .method(method)
            .body(body)?;
        router_request.headers_mut().extend(headers);
        Ok(Self {
            router_request,
            context,
        })
    }

    /// This is the constructor (or builder) to use when constructing a fake Request.
    ///
    /// Every parameter has a default, which is usually enough for testing.
    #[builder(visibility = "pub")]
    fn fake_new(
        context: Option<Context>,
        headers: HashMap<HeaderName, HeaderValue>,
        uri: Option<Uri>,
        method: Option<Method>,
        body: Option<Bytes>,
    ) -> Result<Request, BoxError> {
        Request::new(
            context.unwrap_or_default(),
            headers,
            uri.unwrap_or_else(|| Uri::from_static("http://example.com/")),
            method.unwrap_or(Method::GET),
            body.unwrap_or_default(),
        )
    }
}

impl Request {
    /// The parts of the request a context builder may look at.
    pub fn head(&self) -> RequestHead {
        RequestHead::from(&self.router_request)
    }
}

/// Method, URI and headers of an inbound request.
///
/// Context builders receive this rather than the request itself, since the body has usually
/// been consumed by the time a context is derived.
#[derive(Clone, Debug)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl<T> From<&http::Request<T>> for RequestHead {
    fn from(request: &http::Request<T>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        }
    }
}

assert_impl_all!(Response: Send);
#[non_exhaustive]
#[derive(Debug)]
pub struct Response {
    pub response: http::Response<Bytes>,
    pub context: Context,
}

#[buildstructor::buildstructor]
impl Response {
    /// This is the constructor (or builder) to use when constructing a real Response.
    ///
    /// Required parameters are required in non-testing code to create a Response.
    #[builder(visibility = "pub")]
    fn new(
        body: Bytes,
        status_code: Option<StatusCode>,
        headers: HashMap<HeaderName, HeaderValue>,
        context: Context,
    ) -> Result<Self, BoxError> {
        let mut response = http::Response::builder()
            .status(status_code.unwrap_or(StatusCode::OK))
            .body(body)?;
        response.headers_mut().extend(headers);
        Ok(Self { response, context })
    }

    /// This is the constructor (or builder) to use when constructing a Response that carries
    /// a GraphQL payload, such as a global error.
    #[builder(visibility = "pub")]
    fn graphql_new(
        data: Option<serde_json_bytes::Value>,
        errors: Vec<graphql::Error>,
        status_code: Option<StatusCode>,
        context: Context,
    ) -> Result<Self, BoxError> {
        let body = graphql::Response::builder()
            .and_data(data)
            .errors(errors)
            .build();
        let mut response = http::Response::builder()
            .status(status_code.unwrap_or(StatusCode::OK))
            .body(Bytes::from(serde_json::to_vec(&body)?))?;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, APPLICATION_JSON_HEADER_VALUE.clone());
        Ok(Self { response, context })
    }

    /// This is the constructor (or builder) to use when constructing a fake Response.
    #[builder(visibility = "pub")]
    fn fake_new(
        body: Option<Bytes>,
        status_code: Option<StatusCode>,
        headers: HashMap<HeaderName, HeaderValue>,
        context: Option<Context>,
    ) -> Result<Self, BoxError> {
        Response::new(
            body.unwrap_or_default(),
            status_code,
            headers,
            context.unwrap_or_default(),
        )
    }

    /// The response body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(self.response.body()).into_owned()
    }
}
