//! Backend connector subsystem.
//!
//! # Data Flow
//! ```text
//! apply_command(command, payload)
//!     → dial fresh TCP connection (bounded by connect timeout)
//!     → frame.rs encodes command + payload, one flushed write
//!     → read until `}` terminator (bounded by read timeout)
//!     → connection dropped on every path
//! ```
//!
//! # Design Decisions
//! - Dial-per-request, no pooling: a broken connection from one request can
//!   never poison another request's connection
//! - No internal retries; retry policy belongs to the caller
//! - Connect, send, and receive failures stay distinguishable

pub mod frame;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_util::codec::Framed;

use crate::config::TimeoutConfig;
use crate::connector::frame::{BackendCodec, CommandRequest, FrameError};

/// Error type for one backend round trip.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// TCP connect failed (refused, unreachable).
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// TCP connect exceeded the configured timeout.
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Writing the framed request failed.
    #[error("send failed: {0}")]
    Send(#[source] FrameError),

    /// Writing the framed request exceeded the configured timeout.
    #[error("send timed out after {0:?}")]
    SendTimeout(Duration),

    /// Reading the response frame failed.
    #[error("receive failed: {0}")]
    Receive(#[source] FrameError),

    /// Connection closed before a response terminator was seen.
    #[error("connection closed before response terminator")]
    ReceiveClosed,

    /// Reading the response frame exceeded the configured timeout.
    #[error("receive timed out after {0:?}")]
    ReceiveTimeout(Duration),
}

impl ConnectorError {
    /// Coarse failure kind, used as a metric label and for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectorError::Connect { .. } | ConnectorError::ConnectTimeout { .. } => "connect",
            ConnectorError::Send(_) | ConnectorError::SendTimeout(_) => "send",
            ConnectorError::Receive(_)
            | ConnectorError::ReceiveClosed
            | ConnectorError::ReceiveTimeout(_) => "receive",
        }
    }
}

/// Performs one synchronous command exchange with the classification backend
/// per invocation.
///
/// Holds no connection state between calls; each call owns its socket end to
/// end, so the connector is safe to invoke concurrently from any number of
/// tasks.
#[derive(Debug, Clone)]
pub struct ClassificationConnector {
    address: String,
    timeouts: TimeoutConfig,
}

impl ClassificationConnector {
    /// Create a connector for the given backend address.
    pub fn new(address: impl Into<String>, timeouts: TimeoutConfig) -> Self {
        Self {
            address: address.into(),
            timeouts,
        }
    }

    /// The configured backend address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Forward `command` and `payload` to the backend and return the raw
    /// response text, up to and including the frame terminator.
    ///
    /// The command and payload are passed through unexamined. The connection
    /// is closed before returning, whether the exchange succeeded or failed.
    pub async fn apply_command(
        &self,
        command: &str,
        payload: &str,
    ) -> Result<String, ConnectorError> {
        let connect_timeout = self.timeouts.connect();
        let stream = match time::timeout(connect_timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ConnectorError::Connect {
                    addr: self.address.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(ConnectorError::ConnectTimeout {
                    addr: self.address.clone(),
                    timeout: connect_timeout,
                })
            }
        };

        let mut framed = Framed::new(stream, BackendCodec::new());

        let request = CommandRequest { command, payload };
        match time::timeout(self.timeouts.write(), framed.send(request)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ConnectorError::Send(e)),
            Err(_) => return Err(ConnectorError::SendTimeout(self.timeouts.write())),
        }

        let response = match time::timeout(self.timeouts.read(), framed.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => return Err(ConnectorError::Receive(e)),
            Ok(None) => return Err(ConnectorError::ReceiveClosed),
            Err(_) => return Err(ConnectorError::ReceiveTimeout(self.timeouts.read())),
        };

        // `framed` (and the socket it owns) is dropped here.
        Ok(response)
    }
}
