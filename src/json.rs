//! JSON request and response bodies.
//!
//! Decoding reads a bounded prefix of the body through a pooled scratch
//! buffer so the consumed input can be quoted in the error without reading
//! the stream twice.

use std::{
    io::{BufReader, Read},
    ops::{Deref, DerefMut},
    sync::Arc,
};

use http::{HeaderValue, Request, StatusCode, header::CONTENT_TYPE};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, trace};

use crate::{
    config::{JsonConfig, PoolConfig},
    error::JsonError,
    response::ResponseWriter,
    status::BadRequestError,
};

static GLOBAL_POOL: Lazy<Arc<BufferPool>> =
    Lazy::new(|| Arc::new(BufferPool::new(PoolConfig::default())));

/// A pool of reusable byte buffers, safe to share between requests.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
    config: PoolConfig,
}

impl BufferPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            config,
        }
    }

    /// The process-wide pool used by [`read_json`].
    pub fn global() -> Arc<BufferPool> {
        Arc::clone(&GLOBAL_POOL)
    }

    /// Takes a buffer out of the pool, allocating one if none is idle.
    ///
    /// The buffer is cleared and returned when the guard is dropped.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self.idle.lock().pop().unwrap_or_default();
        trace!(capacity = buf.capacity(), "acquired scratch buffer");
        PooledBuffer { pool: self, buf }
    }

    /// Number of buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        if buf.capacity() > self.config.max_retained_capacity {
            trace!(capacity = buf.capacity(), "dropping oversized scratch buffer");
            return;
        }
        let mut idle = self.idle.lock();
        if idle.len() < self.config.max_pooled_buffers {
            idle.push(buf);
        }
    }
}

/// A buffer borrowed from a [`BufferPool`].
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

/// Copies everything read from `inner` into `sink`.
struct TeeReader<'a, R> {
    inner: R,
    sink: &'a mut Vec<u8>,
}

impl<R: Read> Read for TeeReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.sink.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

/// Bounded JSON body decoder.
#[derive(Debug, Clone)]
pub struct JsonReader {
    pool: Arc<BufferPool>,
    config: JsonConfig,
}

impl Default for JsonReader {
    fn default() -> Self {
        Self::new(BufferPool::global(), JsonConfig::default())
    }
}

impl JsonReader {
    pub fn new(pool: Arc<BufferPool>, config: JsonConfig) -> Self {
        Self { pool, config }
    }

    /// Decodes one JSON value from at most `max_body_bytes` of `body`.
    ///
    /// Trailing data after the value is not inspected. On failure the error
    /// carries the bytes consumed so far.
    pub fn read<T, R>(&self, body: R) -> Result<T, JsonError>
    where
        T: DeserializeOwned,
        R: Read,
    {
        let mut buf = self.pool.acquire();
        let decoded = {
            let tee = TeeReader {
                inner: body.take(self.config.max_body_bytes),
                sink: &mut buf,
            };
            let mut de = serde_json::Deserializer::from_reader(BufReader::new(tee));
            T::deserialize(&mut de)
        };

        decoded.map_err(|source| {
            debug!(consumed = buf.len(), error = %source, "cannot decode JSON body");
            JsonError::Decode {
                source,
                input: String::from_utf8_lossy(&buf).into_owned(),
            }
        })
    }
}

/// Decodes the request body as JSON using the global pool and default
/// limits (8 MiB).
pub fn read_json<T, B>(request: &mut Request<B>) -> Result<T, JsonError>
where
    T: DeserializeOwned,
    B: Read,
{
    JsonReader::default().read(request.body_mut())
}

/// Like [`read_json`], but fails with a 400 `Invalid JSON data` error whose
/// source is the decode error.
pub fn must_read_json<T, B>(request: &mut Request<B>) -> Result<T, BadRequestError>
where
    T: DeserializeOwned,
    B: Read,
{
    read_json(request).map_err(|err| BadRequestError::new("Invalid JSON data").with_source(err))
}

/// Writes `data` as indented JSON with status 200.
pub fn write_json<W, T>(w: &mut W, data: &T) -> Result<(), JsonError>
where
    W: ResponseWriter + ?Sized,
    T: Serialize + ?Sized,
{
    write_json_with_code(w, StatusCode::OK, data)
}

/// Writes `data` as indented JSON followed by a newline, with the given
/// status. Nothing is written if `data` cannot be serialized.
pub fn write_json_with_code<W, T>(w: &mut W, code: StatusCode, data: &T) -> Result<(), JsonError>
where
    W: ResponseWriter + ?Sized,
    T: Serialize + ?Sized,
{
    let mut body = serde_json::to_vec_pretty(data).map_err(JsonError::Encode)?;
    body.push(b'\n');

    w.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    w.write_status(code);
    w.write_body(&body);
    Ok(())
}

/// Releases a body handle, if any.
pub fn close_body<R>(body: Option<R>) {
    if let Some(body) = body {
        drop(body);
        trace!("closed body");
    }
}
