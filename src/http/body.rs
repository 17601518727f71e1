//! Incremental request body capture.
//!
//! # Responsibilities
//! - Read the declared `Content-Length` (if present and numeric)
//! - Append data chunks to a single buffer
//! - Resolve once: on reaching the declared length, or on stream close
//! - Reject on stream error, or once the body outgrows the configured limit
//!
//! # Design Decisions
//! - Content-Length is authoritative: reaching it resolves without waiting for close
//! - The buffer is moved out on completion, so it is handed off exactly once
//! - Events after completion are ignored; `capture` stops polling and drops the stream
//! - No timeout here; connection timeouts belong to the HTTP boundary

use std::pin::pin;

use axum::body::Bytes;
use axum::http::{header::CONTENT_LENGTH, HeaderMap};
use futures_util::{Stream, StreamExt};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body capture failed before completion.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("{0}")]
    Stream(BoxError),

    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// One event observed on a request body stream.
#[derive(Debug)]
pub enum BodyEvent<E> {
    Data(Bytes),
    Close,
    Error(E),
}

/// Accumulation state for one request body.
#[derive(Debug, Default)]
pub struct BodyAccumulator {
    buffer: Vec<u8>,
    declared_len: Option<usize>,
    limit: Option<usize>,
    complete: bool,
}

impl BodyAccumulator {
    pub fn new(declared_len: Option<usize>) -> Self {
        Self {
            buffer: Vec::with_capacity(declared_len.unwrap_or(0).min(64 * 1024)),
            declared_len,
            limit: None,
            complete: false,
        }
    }

    /// Reject bodies larger than `limit` bytes.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Build an accumulator from the request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::new(declared_length(headers))
    }

    pub fn declared_len(&self) -> Option<usize> {
        self.declared_len
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Bytes buffered so far.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one stream event.
    ///
    /// Returns the final result the first time the body completes and `None`
    /// for every other event, including all events after completion.
    pub fn feed<E>(&mut self, event: BodyEvent<E>) -> Option<Result<Bytes, BodyError>>
    where
        E: Into<BoxError>,
    {
        if self.complete {
            return None;
        }

        match event {
            BodyEvent::Data(chunk) => {
                self.buffer.extend_from_slice(&chunk);
                match (self.declared_len, self.limit) {
                    (Some(len), _) if self.buffer.len() >= len => Some(Ok(self.finish())),
                    (_, Some(limit)) if self.buffer.len() > limit => {
                        Some(Err(self.reject(BodyError::TooLarge { limit })))
                    }
                    _ => None,
                }
            }
            BodyEvent::Close => Some(Ok(self.finish())),
            BodyEvent::Error(e) => Some(Err(self.reject(BodyError::Stream(e.into())))),
        }
    }

    /// Drive `stream` until the body completes.
    pub async fn capture<S, E>(mut self, stream: S) -> Result<Bytes, BodyError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<BoxError>,
    {
        match (self.declared_len, self.limit) {
            (Some(0), _) => return Ok(self.finish()),
            (Some(len), Some(limit)) if len > limit => {
                return Err(self.reject(BodyError::TooLarge { limit }));
            }
            _ => {}
        }

        let mut stream = pin!(stream);
        loop {
            let event = match stream.next().await {
                Some(Ok(chunk)) => BodyEvent::Data(chunk),
                Some(Err(e)) => BodyEvent::Error(e),
                None => BodyEvent::Close,
            };
            if let Some(result) = self.feed(event) {
                tracing::trace!(
                    declared_len = ?self.declared_len,
                    ok = result.is_ok(),
                    "Body capture finished"
                );
                return result;
            }
        }
    }

    fn finish(&mut self) -> Bytes {
        self.complete = true;
        Bytes::from(std::mem::take(&mut self.buffer))
    }

    fn reject(&mut self, error: BodyError) -> BodyError {
        self.complete = true;
        self.buffer = Vec::new();
        error
    }
}

/// Declared body length, if the header is present and numeric.
pub fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok())
}
