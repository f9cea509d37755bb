//! Transport to the editor host.
//!
//! # Architecture
//!
//! - **protocol**: Command envelope and reply flattening
//! - **codec**: Length-prefixed JSON framing for AsyncRead/AsyncWrite
//! - **session**: The single lazily-connected, self-healing host connection

pub mod codec;
pub mod protocol;
pub mod session;

pub use protocol::CommandEnvelope;
pub use session::{Connector, HostStream, Session, SessionError, SessionGuard, TcpConnector};
