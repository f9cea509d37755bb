//! Framed codec for the host session.
//!
//! Uses LengthDelimitedCodec for framing (4-byte big-endian length prefix) +
//! serde_json for the payload. Works over any AsyncRead/AsyncWrite, so the
//! session can run over TCP in production and an in-memory duplex in tests.

use std::io;
use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

/// Largest frame accepted in either direction.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

const LARGE_FRAME_BYTES: usize = 100_000;

/// Codec that frames messages with a length prefix and serializes with JSON.
///
/// Decodes `T`; encodes anything serializable, so one side can send envelopes
/// while reading back loosely-typed replies.
pub struct JsonCodec<T> {
    inner: LengthDelimitedCodec,
    _phantom: PhantomData<T>,
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self::with_max_frame_length(MAX_FRAME_LENGTH)
    }

    pub fn with_max_frame_length(max_frame_length: usize) -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .length_field_length(4)
                .max_frame_length(max_frame_length)
                .new_codec(),
            _phantom: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Decoder for JsonCodec<T> {
    type Item = T;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src)? {
            Some(bytes) => {
                tracing::trace!(json_size_bytes = bytes.len(), "Decoding frame");
                let item = serde_json::from_slice(&bytes)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}

impl<T, U: Serialize> Encoder<U> for JsonCodec<T> {
    type Error = io::Error;

    fn encode(&mut self, item: U, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json =
            serde_json::to_vec(&item).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let json_len = json.len();
        tracing::trace!(json_size_bytes = json_len, "Encoding frame");
        if json_len > LARGE_FRAME_BYTES {
            tracing::info!(
                json_size_bytes = json_len,
                json_size_kb = json_len / 1024,
                "Large frame being encoded"
            );
        }
        self.inner.encode(Bytes::from(json), dst)
    }
}
