use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::ipc::{EventBroadcaster, EventServer, HostBridge, IpcServer};
use perspace_ipc::{Command, HostEvent, HostRequest, Response, StateEvent};

pub type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

pub type SnapshotRequest = oneshot::Sender<StateEvent>;

/// Receiving ends owned by the daemon loop.
pub struct LoopChannels {
    pub host_event_rx: mpsc::Receiver<HostEvent>,
    pub request_tx: mpsc::UnboundedSender<HostRequest>,
    pub ipc_rx: mpsc::Receiver<IpcCommandWithResponse>,
    pub snapshot_rx: mpsc::Receiver<SnapshotRequest>,
    pub broadcaster: EventBroadcaster,
}

/// Ends handed to the socket servers.
pub struct ServerChannels {
    host_event_tx: mpsc::Sender<HostEvent>,
    request_rx: mpsc::UnboundedReceiver<HostRequest>,
    ipc_tx: mpsc::Sender<IpcCommandWithResponse>,
    snapshot_tx: mpsc::Sender<SnapshotRequest>,
    event_server_rx: broadcast::Receiver<StateEvent>,
}

pub fn create_channels() -> (LoopChannels, ServerChannels) {
    // Channel: host bridge -> daemon loop
    let (host_event_tx, host_event_rx) = mpsc::channel::<HostEvent>(256);

    // Channel: daemon loop -> host bridge. Unbounded so effects never wait.
    let (request_tx, request_rx) = mpsc::unbounded_channel::<HostRequest>();

    // Channel: control socket -> daemon loop
    let (ipc_tx, ipc_rx) = mpsc::channel::<IpcCommandWithResponse>(256);

    // Channel: snapshot requests from new event subscribers
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<SnapshotRequest>(16);

    let broadcaster = EventBroadcaster::new(256);
    let event_server_rx = broadcaster.subscribe();

    let loop_channels = LoopChannels {
        host_event_rx,
        request_tx,
        ipc_rx,
        snapshot_rx,
        broadcaster,
    };
    let server_channels = ServerChannels {
        host_event_tx,
        request_rx,
        ipc_tx,
        snapshot_tx,
        event_server_rx,
    };
    (loop_channels, server_channels)
}

/// Start the control, event and host sockets. Returns the bridge task so
/// shutdown can wait for the last host requests to be written.
pub fn spawn_servers(channels: ServerChannels) -> JoinHandle<()> {
    let ServerChannels {
        host_event_tx,
        request_rx,
        ipc_tx,
        snapshot_tx,
        event_server_rx,
    } = channels;

    let ipc_server = IpcServer::new(ipc_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {}", e);
        }
    });

    let event_server = EventServer::new(event_server_rx, snapshot_tx);
    tokio::spawn(async move {
        if let Err(e) = event_server.run().await {
            tracing::error!("Event server error: {}", e);
        }
    });

    let bridge = HostBridge::new(host_event_tx, request_rx);
    tokio::spawn(async move {
        if let Err(e) = bridge.run().await {
            tracing::error!("Host bridge error: {}", e);
        }
    })
}
