use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;

use perspace_ipc::{HostEvent, HostRequest};

use super::bind_socket;

pub const HOST_SOCKET_PATH: &str = "/tmp/perspace-host.sock";

#[derive(Debug, PartialEq, Eq)]
enum Served {
    Disconnected,
    Shutdown,
}

/// Socket the compositor-side extension connects to. Host events flow in,
/// host requests flow out, one JSON object per line. One host at a time.
pub struct HostBridge {
    socket_path: PathBuf,
    event_tx: mpsc::Sender<HostEvent>,
    request_rx: mpsc::UnboundedReceiver<HostRequest>,
}

impl HostBridge {
    pub fn new(
        event_tx: mpsc::Sender<HostEvent>,
        request_rx: mpsc::UnboundedReceiver<HostRequest>,
    ) -> Self {
        Self {
            socket_path: PathBuf::from(HOST_SOCKET_PATH),
            event_tx,
            request_rx,
        }
    }

    /// Runs until the daemon drops its request sender.
    pub async fn run(mut self) -> Result<()> {
        let listener = bind_socket(&self.socket_path)?;
        tracing::info!("Host bridge listening on {:?}", self.socket_path);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        tracing::info!("Host connected");
                        // Requests meant for a previous host are stale
                        while self.request_rx.try_recv().is_ok() {}
                        match Self::serve(stream, &self.event_tx, &mut self.request_rx).await {
                            Ok(Served::Disconnected) => tracing::warn!("Host disconnected"),
                            Ok(Served::Shutdown) => return Ok(()),
                            Err(e) => tracing::error!("Host connection error: {}", e),
                        }
                    }
                    Err(e) => tracing::error!("Host bridge accept error: {}", e),
                },
                request = self.request_rx.recv() => match request {
                    Some(request) => tracing::debug!("No host connected, dropping {:?}", request),
                    None => return Ok(()),
                },
            }
        }
    }

    async fn serve(
        stream: UnixStream,
        event_tx: &mpsc::Sender<HostEvent>,
        request_rx: &mut mpsc::UnboundedReceiver<HostRequest>,
    ) -> Result<Served> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        return Ok(Served::Disconnected);
                    };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<HostEvent>(line) {
                        Ok(event) => {
                            tracing::trace!("Host event: {:?}", event);
                            if event_tx.send(event).await.is_err() {
                                return Ok(Served::Shutdown);
                            }
                        }
                        Err(e) => tracing::warn!("Malformed host event: {}", e),
                    }
                }
                request = request_rx.recv() => {
                    // The daemon only closes the channel after its last request is queued
                    let Some(request) = request else {
                        return Ok(Served::Shutdown);
                    };
                    let json = serde_json::to_string(&request)?;
                    writer.write_all(json.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
            }
        }
    }
}

impl Drop for HostBridge {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_serve_relays_both_directions() {
        let (daemon_end, mut host_end) = UnixStream::pair().unwrap();
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let (request_tx, mut request_rx) = mpsc::unbounded_channel();

        let serving = tokio::spawn(async move {
            HostBridge::serve(daemon_end, &event_tx, &mut request_rx).await
        });

        host_end
            .write_all(b"{\"type\":\"pointer_moved\",\"x\":10,\"y\":20}\nnot json\n\n")
            .await
            .unwrap();
        assert_eq!(
            event_rx.recv().await,
            Some(HostEvent::PointerMoved { x: 10, y: 20 })
        );

        request_tx
            .send(HostRequest::ActivateWorkspace { workspace: 2 })
            .unwrap();
        drop(request_tx);

        let result = serving.await.unwrap().unwrap();
        assert_eq!(result, Served::Shutdown);

        let mut written = String::new();
        host_end.read_to_string(&mut written).await.unwrap();
        let request: HostRequest = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(request, HostRequest::ActivateWorkspace { workspace: 2 });
    }

    #[tokio::test]
    async fn test_serve_ends_when_host_hangs_up() {
        let (daemon_end, host_end) = UnixStream::pair().unwrap();
        let (event_tx, _event_rx) = mpsc::channel(8);
        let (_request_tx, mut request_rx) = mpsc::unbounded_channel();
        drop(host_end);

        let result = HostBridge::serve(daemon_end, &event_tx, &mut request_rx)
            .await
            .unwrap();
        assert_eq!(result, Served::Disconnected);
    }
}
