//! Length-delimited message framing over TCP.
//!
//! Every logical message (request, acknowledgement, unary call or reply) is
//! exactly one frame: a 4-byte big-endian length followed by the payload.

use crate::error::TransportError;
use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::debug;

/// One framed TCP connection.
pub struct FrameConnection {
    inner: Framed<TcpStream, LengthDelimitedCodec>,
    peer: SocketAddr,
    io_timeout: Option<Duration>,
}

impl FrameConnection {
    /// Dials `endpoint` and wraps the stream.
    pub async fn connect<A>(
        endpoint: A,
        max_frame_length: usize,
        io_timeout: Option<Duration>,
    ) -> Result<Self, TransportError>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        let label = endpoint.to_string();
        let stream = with_timeout(io_timeout, async {
            TcpStream::connect(endpoint)
                .await
                .map_err(|source| TransportError::Connect {
                    endpoint: label.clone(),
                    source,
                })
        })
        .await?;
        let peer = stream.peer_addr()?;
        Ok(Self::new(stream, peer, max_frame_length, io_timeout))
    }

    /// Wraps an accepted stream.
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        max_frame_length: usize,
        io_timeout: Option<Duration>,
    ) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%peer, error = %e, "failed to disable Nagle's algorithm");
        }
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(max_frame_length)
            .new_codec();
        Self {
            inner: Framed::new(stream, codec),
            peer,
            io_timeout,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Sends one frame and flushes it.
    pub async fn send(&mut self, payload: Bytes) -> Result<(), TransportError> {
        let inner = &mut self.inner;
        with_timeout(self.io_timeout, async {
            inner.send(payload).await.map_err(TransportError::from)
        })
        .await
    }

    /// Receives the next frame; `None` once the peer has closed cleanly.
    ///
    /// Cancel safe: dropping the future loses no partially read frame.
    pub async fn recv(&mut self) -> Result<Option<BytesMut>, TransportError> {
        let inner = &mut self.inner;
        with_timeout(self.io_timeout, async {
            inner.next().await.transpose().map_err(TransportError::from)
        })
        .await
    }

    /// Flushes and shuts down the write half.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        SinkExt::<Bytes>::close(&mut self.inner).await?;
        Ok(())
    }
}

async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TransportError::Timeout(limit))?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_new_disables_nagle_and_frames_messages() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = FrameConnection::connect(addr, 1024, None).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        let mut server = FrameConnection::new(stream, peer, 1024, None);

        assert!(client.inner.get_ref().nodelay().unwrap());
        assert!(server.inner.get_ref().nodelay().unwrap());

        client.send(Bytes::from_static(b"one")).await.unwrap();
        client.send(Bytes::from_static(b"two")).await.unwrap();
        assert_eq!(&server.recv().await.unwrap().unwrap()[..], b"one");
        assert_eq!(&server.recv().await.unwrap().unwrap()[..], b"two");

        client.close().await.unwrap();
        assert!(server.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_is_invalid_data() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = FrameConnection::connect(addr, 1024, None).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        let mut server = FrameConnection::new(stream, peer, 8, None);

        client.send(Bytes::from_static(b"longer than eight bytes")).await.unwrap();
        let err = server.recv().await.unwrap_err();
        assert!(err.is_protocol_violation());
    }
}
