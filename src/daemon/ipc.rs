use super::DaemonMessage;
use crate::error::{FeedsiftError, Result};
use crate::protocol::{FilterRequest, FilterResponse, RequestEnvelope, ResponseEnvelope};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Longest accepted line, in bytes, in either direction
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Start the IPC server
///
/// Each connection may send any number of newline-delimited request
/// envelopes; each one is answered with exactly one response line. A line
/// longer than [`MAX_LINE_BYTES`] is answered with an error and ends the
/// connection.
pub async fn start_ipc_server(
    socket_path: PathBuf,
    tx: mpsc::Sender<DaemonMessage>,
) -> Result<JoinHandle<()>> {
    // Remove existing socket if present
    if socket_path.exists() {
        tokio::fs::remove_file(&socket_path).await.map_err(|e| {
            FeedsiftError::Other(format!("Failed to remove existing socket: {}", e))
        })?;
    }
    if let Some(parent) = socket_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!("Starting IPC server on {}", socket_path.display());
    let listener = UnixListener::bind(&socket_path)
        .map_err(|e| FeedsiftError::Other(format!("Failed to bind IPC socket: {}", e)))?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, tx).await {
                            error!("IPC connection failed: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept IPC connection: {}", e);
                }
            }
        }
    });

    Ok(handle)
}

async fn serve_connection(stream: UnixStream, tx: mpsc::Sender<DaemonMessage>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_BYTES));

    while let Some(line) = lines.next().await {
        let oversized = matches!(line, Err(LinesCodecError::MaxLineLengthExceeded));
        let response = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match serde_json::from_str::<RequestEnvelope>(&line) {
                Ok(envelope) => dispatch(envelope, &tx).await,
                Err(e) => {
                    warn!("Invalid IPC request received: {}. Error: {}", line, e);
                    rejection(format!("Invalid request: {}", e))
                }
            },
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!("IPC request exceeded {} bytes", MAX_LINE_BYTES);
                rejection(format!("Request exceeds {} bytes", MAX_LINE_BYTES))
            }
            Err(LinesCodecError::Io(e)) => return Err(e.into()),
        };

        let json = serde_json::to_string(&response)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        if oversized {
            break;
        }
    }

    debug!("IPC connection closed");
    Ok(())
}

/// Response to a line that never became a request
fn rejection(message: String) -> ResponseEnvelope {
    ResponseEnvelope {
        id: Uuid::nil(),
        response: FilterResponse::error(message),
    }
}

/// Hand a request to the worker and wait for its reply
async fn dispatch(envelope: RequestEnvelope, tx: &mpsc::Sender<DaemonMessage>) -> ResponseEnvelope {
    let id = envelope.id;
    let (resp_tx, resp_rx) = oneshot::channel();

    if let Err(e) = tx.send(DaemonMessage::Request(envelope, resp_tx)).await {
        error!("Failed to send request to worker: {}", e);
        return ResponseEnvelope {
            id,
            response: FilterResponse::error("Filter worker is not running"),
        };
    }

    match resp_rx.await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to receive response from worker: {}", e);
            ResponseEnvelope {
                id,
                response: FilterResponse::error("Filter worker dropped the request"),
            }
        }
    }
}

/// Client: send one request and wait up to `timeout` for its response
pub async fn send_request(
    socket_path: &Path,
    request: FilterRequest,
    timeout: Duration,
) -> Result<FilterResponse> {
    let envelope = RequestEnvelope::new(request);
    let id = envelope.id;

    let response = tokio::time::timeout(timeout, exchange(socket_path, &envelope))
        .await
        .map_err(|_| FeedsiftError::Timeout(timeout.as_millis() as u64))??;

    if response.id != id {
        return Err(FeedsiftError::Channel(format!(
            "Response {} does not match request {}",
            response.id, id
        )));
    }
    Ok(response.response)
}

async fn exchange(socket_path: &Path, envelope: &RequestEnvelope) -> Result<ResponseEnvelope> {
    let mut stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| FeedsiftError::Channel(format!("Failed to connect to IPC socket: {}", e)))?;

    let json = serde_json::to_string(envelope)?;
    stream.write_all(json.as_bytes()).await?;
    stream.write_all(b"\n").await?;

    let mut lines = FramedRead::new(stream, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    match lines.next().await {
        Some(Ok(line)) => Ok(serde_json::from_str(&line)?),
        Some(Err(LinesCodecError::Io(e))) => Err(e.into()),
        Some(Err(LinesCodecError::MaxLineLengthExceeded)) => Err(FeedsiftError::Channel(format!(
            "Response exceeds {} bytes",
            MAX_LINE_BYTES
        ))),
        None => Err(FeedsiftError::Channel(
            "IPC socket closed without response".to_string(),
        )),
    }
}
