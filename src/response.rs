//! Response sinks.
//!
//! [`ResponseWriter`] is the minimal surface the responder and the JSON
//! writers need. [`ResponseRecorder`] implements it in memory and converts
//! into an [`http::Response`] for the host server or for assertions.

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use tracing::warn;

/// Where a handler writes its response.
///
/// The status must be written once, before the body. Writing body bytes
/// without a status implies 200.
pub trait ResponseWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_status(&mut self, status: StatusCode);

    fn write_body(&mut self, data: &[u8]);

    /// Replaces the value of a header.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers_mut().insert(name, value);
    }
}

/// In-memory [`ResponseWriter`].
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The written status, 200 if none was written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => warn!(%current, ignored = %status, "superfluous status write"),
            None => self.status = Some(status),
        }
    }

    fn write_body(&mut self, data: &[u8]) {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(data);
    }
}
