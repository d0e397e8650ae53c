//! Serial [`DeviceLink`]: frames commands and classifies the board's replies.

use std::borrow::Cow;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::{Instant, timeout, timeout_at};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use ledbridge_app::ports::DeviceLink;
use ledbridge_domain::error::DeviceError;
use ledbridge_domain::protocol::{Acknowledgement, Command};

use crate::config::SerialConfig;
use crate::error::SerialError;

type Opener<S> = Box<dyn FnMut(&SerialConfig) -> Result<S, SerialError> + Send>;

/// [`DeviceLink`] over a byte stream, normally a [`SerialStream`].
///
/// The stream is only held while the channel is open. Once it is lost
/// (write failure, end of stream) every send fails with
/// [`DeviceError::Unavailable`] until [`open`](DeviceLink::open) is called
/// again.
pub struct SerialDeviceLink<S = SerialStream> {
    config: SerialConfig,
    opener: Opener<S>,
    stream: Option<BufReader<S>>,
}

impl SerialDeviceLink<SerialStream> {
    /// Create a link to the configured serial port. Nothing is opened yet.
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self::with_opener(config, |config| {
            tokio_serial::new(config.port.as_str(), config.baud_rate)
                .open_native_async()
                .map_err(|source| SerialError::Open {
                    port: config.port.clone(),
                    source,
                })
        })
    }
}

impl<S> SerialDeviceLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Create a link whose stream comes from `opener` on every open.
    pub fn with_opener(
        config: SerialConfig,
        opener: impl FnMut(&SerialConfig) -> Result<S, SerialError> + Send + 'static,
    ) -> Self {
        Self {
            config,
            opener: Box::new(opener),
            stream: None,
        }
    }

    /// Open the port and wait out the settling window.
    ///
    /// Unlike [`DeviceLink::open`], the failure keeps its cause, which is
    /// what startup wants to report.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Open`] when the port cannot be opened.
    pub async fn connect(&mut self) -> Result<(), SerialError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = (self.opener)(&self.config)?;
        let mut reader = BufReader::new(stream);
        settle(&mut reader, self.config.settle()).await;
        self.stream = Some(reader);

        tracing::info!(
            port = %self.config.port,
            baud_rate = self.config.baud_rate,
            "serial channel open"
        );
        Ok(())
    }

    fn drop_stream(&mut self, err: &SerialError) {
        tracing::error!(port = %self.config.port, error = %err, "serial channel lost");
        self.stream = None;
    }
}

impl<S> DeviceLink for SerialDeviceLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn endpoint(&self) -> &str {
        &self.config.port
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn open(&mut self) -> Result<(), DeviceError> {
        self.connect().await.map_err(|err| {
            tracing::error!(port = %self.config.port, error = %err, "cannot open serial channel");
            err.into_device()
        })
    }

    async fn send(&mut self, command: Command) -> Result<Acknowledgement, DeviceError> {
        let Some(reader) = self.stream.as_mut() else {
            return Err(DeviceError::Unavailable);
        };

        tracing::debug!(command = %command, "sending command");
        match exchange(reader, command, self.config.ack_timeout()).await {
            Ok(acknowledgement) => {
                tracing::debug!(command = %command, ?acknowledgement, "acknowledgement received");
                Ok(acknowledgement)
            }
            Err(err) => {
                self.drop_stream(&err);
                Err(err.into_device())
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut reader) = self.stream.take() {
            if let Err(err) = reader.get_mut().shutdown().await {
                tracing::debug!(error = %err, "error while closing serial channel");
            }
            tracing::info!(port = %self.config.port, "serial channel closed");
        }
    }
}

/// Read and log whatever the board prints while it boots.
async fn settle<S: AsyncRead + Unpin>(reader: &mut BufReader<S>, window: Duration) {
    if window.is_zero() {
        return;
    }

    let deadline = Instant::now() + window;
    loop {
        let mut line = Vec::new();
        match timeout_at(deadline, reader.read_until(b'\n', &mut line)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(_)) => tracing::info!(banner = %printable(&line), "device banner"),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "read error while device settles");
                break;
            }
            Err(_) => {
                if !line.is_empty() {
                    tracing::info!(banner = %printable(&line), "device banner");
                }
                break;
            }
        }
    }
}

/// One command round-trip: drain, write, read one line.
async fn exchange<S>(
    reader: &mut BufReader<S>,
    command: Command,
    ack_timeout: Duration,
) -> Result<Acknowledgement, SerialError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    drain_stale(reader).await?;

    let stream = reader.get_mut();
    stream.write_all(command.encode().as_bytes()).await?;
    stream.flush().await?;

    let mut reply = Vec::new();
    match timeout(ack_timeout, reader.read_until(b'\n', &mut reply)).await {
        Err(_) if reply.is_empty() => Ok(Acknowledgement::Timeout),
        Err(_) => Ok(Acknowledgement::Malformed(printable(&reply).into_owned())),
        Ok(Ok(0)) => Err(SerialError::Disconnected),
        Ok(Ok(_)) => Ok(Acknowledgement::classify(&String::from_utf8_lossy(&reply))),
        Ok(Err(err)) => Err(err.into()),
    }
}

/// Discard input that arrived before the command was written, such as a late
/// reply to a command that already timed out.
async fn drain_stale<S: AsyncRead + Unpin>(reader: &mut BufReader<S>) -> Result<(), SerialError> {
    loop {
        let mut stale = Vec::new();
        match timeout(Duration::ZERO, reader.read_until(b'\n', &mut stale)).await {
            Ok(Ok(0)) => return Err(SerialError::Disconnected),
            Ok(Ok(_)) => tracing::debug!(input = %printable(&stale), "discarding stale input"),
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => {
                if !stale.is_empty() {
                    tracing::debug!(input = %printable(&stale), "discarding stale input");
                }
                return Ok(());
            }
        }
    }
}

fn printable(bytes: &[u8]) -> Cow<'_, str> {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(text) => Cow::Borrowed(text.trim_end_matches(['\r', '\n'])),
        Cow::Owned(text) => Cow::Owned(text.trim_end_matches(['\r', '\n']).to_string()),
    }
}
