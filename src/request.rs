//! Request-side helpers: parameter sources, predicates, bearer tokens and
//! the outgoing wire dump.

use std::{borrow::Cow, collections::HashMap, convert::Infallible, io::Read};

use bytes::Bytes;
use http::{
    HeaderMap, HeaderValue, Method, Request, Response, Uri, Version,
    header::{AUTHORIZATION, CONTENT_TYPE, HOST, UPGRADE},
};
use http_body_util::{BodyExt, Empty};
use hyper::{body::Body, service::service_fn};
use hyper_util::rt::TokioIo;
use tokio::io::duplex;
use tracing::debug;
use url::form_urlencoded;

use crate::{
    config::FormConfig,
    error::{FormError, WireError},
    wire::WireCapture,
};

/// Routing variables captured by an external router, e.g. `id` for a route
/// pattern `/users/{id}`.
///
/// Routers store this as a request extension; the accessors in
/// [`crate::params::path`] only read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Decoded url-encoded body fields, in body order.
///
/// Stored as a request extension by [`parse_form`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(Vec<(String, String)>);

impl FormValues {
    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Read-only access to the three parameter sources of a request.
///
/// All lookups are case-sensitive and return the first value for a key.
pub trait ParamSource {
    /// Body field (see [`parse_form`]) or, failing that, query parameter.
    fn form_value(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Query string parameter.
    fn query_value(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Routing variable.
    fn path_value(&self, key: &str) -> Option<&str>;
}

impl<B> ParamSource for Request<B> {
    fn form_value(&self, key: &str) -> Option<Cow<'_, str>> {
        self.extensions()
            .get::<FormValues>()
            .and_then(|form| form.get(key))
            .map(Cow::Borrowed)
            .or_else(|| self.query_value(key))
    }

    fn query_value(&self, key: &str) -> Option<Cow<'_, str>> {
        let query = self.uri().query()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    fn path_value(&self, key: &str) -> Option<&str> {
        self.extensions().get::<PathParams>()?.get(key)
    }
}

/// Reads a url-encoded body into a [`FormValues`] extension.
///
/// Only POST, PUT and PATCH requests with an
/// `application/x-www-form-urlencoded` content type are read; anything else
/// is left untouched. At most `config.max_body_bytes` are accepted.
pub fn parse_form<B: Read>(request: &mut Request<B>, config: &FormConfig) -> Result<(), FormError> {
    if !matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH) {
        return Ok(());
    }

    let urlencoded = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        });
    if !urlencoded {
        return Ok(());
    }

    let limit = config.max_body_bytes;
    let mut raw = Vec::new();
    request
        .body_mut()
        .by_ref()
        .take(limit.saturating_add(1))
        .read_to_end(&mut raw)?;
    if raw.len() as u64 > limit {
        return Err(FormError::TooLarge { limit });
    }

    let values: FormValues = form_urlencoded::parse(&raw).into_owned().collect();
    debug!(fields = values.len(), bytes = raw.len(), "parsed form body");
    request.extensions_mut().insert(values);
    Ok(())
}

/// Returns true for GET and HEAD requests.
pub fn is_get_or_head<B>(request: &Request<B>) -> bool {
    matches!(*request.method(), Method::GET | Method::HEAD)
}

/// Returns true for a GET request asking to upgrade to WebSocket.
pub fn is_websocket_upgrade<B>(request: &Request<B>) -> bool {
    request.method() == Method::GET
        && request
            .headers()
            .get(UPGRADE)
            .is_some_and(|v| v.as_bytes() == b"websocket")
}

/// Returns true when the request carries JSON, judged by its content type.
pub fn is_xhr<B>(request: &Request<B>) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"))
}

/// Extracts the token of a `Bearer` authorization header.
///
/// The scheme is matched case-insensitively; the token is returned as sent.
/// Returns `None` when the header is absent, uses another scheme, or carries
/// an empty token.
pub fn bearer_token<B>(request: &Request<B>) -> Option<&str> {
    const PREFIX: &str = "bearer ";

    let auth = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    if !auth.get(..PREFIX.len())?.eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let token = &auth[PREFIX.len()..];
    (!token.is_empty()).then_some(token)
}

/// Writes `request` to `w` exactly as hyper's HTTP/1 client would send it.
///
/// An absolute URI is sent in origin form and its authority becomes the
/// `Host` header when none is set. Header names are title-cased, and bodies
/// without a known length (or with `Transfer-Encoding: chunked`) appear with
/// chunked framing.
pub async fn dump_request_out<W, B>(w: &mut W, request: Request<B>) -> Result<(), WireError>
where
    W: std::io::Write,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let wire = to_bytes(request).await?;
    w.write_all(&wire)?;
    Ok(())
}

/// Serializes an HTTP request to the bytes hyper's HTTP/1.1 client writes.
///
/// This drives a real client connection over a duplex stream against a
/// mock server that reads the whole request before answering.
pub async fn to_bytes<B>(request: Request<B>) -> Result<Bytes, WireError>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if !matches!(request.version(), Version::HTTP_10 | Version::HTTP_11) {
        return Err(WireError::UnsupportedVersion);
    }
    let request = into_origin_form(request);

    let (client, server) = duplex(8192);
    let capture_client = WireCapture::new(client);
    let captured = capture_client.captured();

    let server_handle = tokio::spawn(async move {
        let service = service_fn(|req: Request<hyper::body::Incoming>| async move {
            let _ = req.into_body().collect().await;
            Ok::<_, Infallible>(Response::new(Empty::<Bytes>::new()))
        });

        let _ = hyper::server::conn::http1::Builder::new()
            .serve_connection(TokioIo::new(server), service)
            .await;
    });

    let client_handle = tokio::spawn(async move {
        let (mut sender, connection) = hyper::client::conn::http1::Builder::new()
            .title_case_headers(true)
            .handshake(TokioIo::new(capture_client))
            .await?;
        tokio::spawn(connection);
        sender.send_request(request).await.map(drop)
    });

    let outcome = client_handle.await;
    server_handle.abort();

    match outcome {
        Ok(Ok(())) => Ok(captured.take()),
        Ok(Err(e)) => Err(WireError::Connection(Box::new(e))),
        Err(_) => Err(WireError::Sync),
    }
}

fn into_origin_form<B>(mut request: Request<B>) -> Request<B> {
    let Some(authority) = request.uri().authority().cloned() else {
        return request;
    };

    if !request.headers().contains_key(HOST) {
        let host = match authority.port_u16() {
            Some(port) => format!("{}:{port}", authority.host()),
            None => authority.host().to_owned(),
        };
        if let Ok(value) = HeaderValue::from_str(&host) {
            let mut headers = HeaderMap::with_capacity(request.headers().len() + 1);
            headers.insert(HOST, value);
            headers.extend(request.headers_mut().drain());
            *request.headers_mut() = headers;
        }
    }

    let origin = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
        .to_owned();
    if let Ok(uri) = origin.parse::<Uri>() {
        *request.uri_mut() = uri;
    }
    request
}
