use std::pin::Pin;
use std::task::Poll;
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::ReadBuf;
use tokio_serial::SerialPortBuilderExt;

use crate::command::PaintCommand;

/// A single ASCII byte the device sends to signal an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(try_from = "char")]
pub struct Marker(u8);

impl Marker {
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<char> for Marker {
    type Error = NonAsciiMarker;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        if value.is_ascii() {
            Ok(Self(value as u8))
        } else {
            Err(NonAsciiMarker(value))
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Marker '{}' is not a single ASCII character", .0)]
pub struct NonAsciiMarker(char);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckMarkers {
    pub ready: Marker,
    pub paint_complete: Marker,
}

impl Default for AckMarkers {
    fn default() -> Self {
        Self {
            ready: Marker(b'r'),
            paint_complete: Marker(b'd'),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Failed to write command to device")]
    Write(#[source] std::io::Error),

    #[error("Failed to read acknowledgment from device")]
    Read(#[source] std::io::Error),

    #[error("Device answered {:#04x} instead of the paint complete marker", .0)]
    UnexpectedAck(u8),

    #[error("No acknowledgment within {:?}", .0)]
    AckTimeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to open serial device '{}'", .path)]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("Device went away before signalling readiness")]
    ReadyHandshake(#[source] std::io::Error),
}

/// Owns the channel to the matrix controller and speaks its request/acknowledge protocol.
pub struct TransportDriver<C> {
    channel: C,
    markers: AckMarkers,
    ack_timeout: Option<Duration>,
}

impl TransportDriver<tokio_serial::SerialStream> {
    pub fn open(config: &crate::config::SerialConfig) -> Result<Self, TransportError> {
        let stream = tokio_serial::new(config.path.as_str(), config.baud_rate)
            .open_native_async()
            .map_err(|source| TransportError::Open {
                path: config.path.to_string(),
                source,
            })?;

        tracing::info!(path = %config.path, baud_rate = config.baud_rate, "Opened serial device");
        Ok(Self::new(stream, config.markers(), config.ack_timeout()))
    }
}

impl<C> TransportDriver<C>
where
    C: AsyncRead + AsyncWrite + Unpin,
{
    /// `ack_timeout` of `None` waits for an acknowledgment forever.
    pub fn new(channel: C, markers: AckMarkers, ack_timeout: Option<Duration>) -> Self {
        Self {
            channel,
            markers,
            ack_timeout,
        }
    }

    /// Wait for the one-time readiness signal after the channel was opened.
    ///
    /// Anything else arriving before it is boot noise and gets discarded.
    pub async fn await_ready(&mut self) -> Result<(), TransportError> {
        loop {
            let byte = self
                .channel
                .read_u8()
                .await
                .map_err(TransportError::ReadyHandshake)?;

            if byte == self.markers.ready.get() {
                tracing::info!("Device signalled readiness");
                return Ok(());
            }

            tracing::warn!(byte, "Discarding unexpected byte while waiting for readiness");
        }
    }

    /// Write one command and wait for the device to confirm it was painted.
    ///
    /// Input that arrived before the write, like the ack of a command that
    /// already timed out, is discarded so it cannot acknowledge this one.
    pub async fn send(&mut self, command: &PaintCommand) -> Result<(), SendError> {
        let discarded = self.discard_buffered_input().await;
        if discarded > 0 {
            tracing::warn!(discarded, "Discarded stale bytes from device before writing");
        }

        let wire = command.to_wire();
        self.channel
            .write_all(wire.as_bytes())
            .await
            .map_err(SendError::Write)?;
        self.channel.flush().await.map_err(SendError::Write)?;
        tracing::trace!(%wire, "Command written, awaiting acknowledgment");

        let ack = match self.ack_timeout {
            Some(limit) => tokio::time::timeout(limit, self.channel.read_u8())
                .await
                .map_err(|_elapsed| SendError::AckTimeout(limit))?,
            None => self.channel.read_u8().await,
        }
        .map_err(SendError::Read)?;

        if ack == self.markers.paint_complete.get() {
            Ok(())
        } else {
            Err(SendError::UnexpectedAck(ack))
        }
    }

    /// Read whatever is immediately available without waiting, returning the byte count.
    ///
    /// Stops at the first read that would block, hits end-of-stream or fails;
    /// the following write or read reports those conditions.
    async fn discard_buffered_input(&mut self) -> usize {
        let mut scratch = [0; 64];
        let mut discarded = 0;

        std::future::poll_fn(|cx| loop {
            let mut buf = ReadBuf::new(&mut scratch);
            match Pin::new(&mut self.channel).poll_read(cx, &mut buf) {
                Poll::Ready(Ok(())) if !buf.filled().is_empty() => {
                    discarded += buf.filled().len();
                }
                _ => return Poll::Ready(discarded),
            }
        })
        .await
    }
}
