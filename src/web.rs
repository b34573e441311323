//! Websocket server for the `view` command

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use log::{debug, info, warn};
use nmea_logger_core::PlaybackSchedule;
use thiserror::Error;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_graceful_shutdown::SubsystemHandle;

use crate::error::PlaybackError;
use crate::format::RecordPipeline;
use crate::playback::{PlaybackController, PlaybackSink};

const PLAYBACK_URI: &str = "/ws";

#[derive(Error, Debug)]
pub enum WebError {
    #[error("Socket operation failed")]
    Io(#[from] io::Error),
}

/// Shared by every connection; each one still opens the log itself
#[derive(Clone)]
pub struct Web {
    input: Arc<PathBuf>,
    schedule: PlaybackSchedule,
    ignore_parse_errors: bool,
    listen_port: u16,
    shutdown_tx: broadcast::Sender<()>,
}

impl Web {
    pub fn new(input: PathBuf, schedule: PlaybackSchedule, ignore_parse_errors: bool) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Web {
            input: Arc::new(input),
            schedule,
            ignore_parse_errors,
            listen_port: 0,
            shutdown_tx,
        }
    }

    /// Stop accepting connections and end every running replay
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Serve `/ws` until the subsystem is asked to shut down
    pub async fn run(
        mut self,
        listener: TcpListener,
        subsys: SubsystemHandle,
    ) -> Result<(), WebError> {
        let addr = listener.local_addr()?;
        self.listen_port = addr.port();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let shutdown_tx = self.shutdown_tx.clone();

        let app = Router::new()
            .route(PLAYBACK_URI, get(playback_handler))
            .with_state(self)
            .into_make_service_with_connect_info::<SocketAddr>();

        info!("URL: http://{}", addr);
        tokio::select! { biased;
            _ = subsys.on_shutdown_requested() => {
                let _ = shutdown_tx.send(());
            },
            r = axum::serve(listener, app)
                    .with_graceful_shutdown(
                        async move {
                            _ = shutdown_rx.recv().await;
                        }
                    ) => {
                r?;
            }
        }
        info!("Web server stopped");
        Ok(())
    }
}

async fn playback_handler(
    State(state): State<Web>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    debug!("playback request from {}", addr);
    if !origin_allowed(&headers, state.listen_port) {
        warn!(
            "Refusing playback to {}: origin {:?} not allowed",
            addr,
            headers.get(header::ORIGIN)
        );
        return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
    }

    let shutdown_rx = state.shutdown_tx.subscribe();
    ws.on_upgrade(move |socket| playback_stream(socket, state, addr, shutdown_rx))
}

/// Replays the whole log to one connection
async fn playback_stream(
    socket: WebSocket,
    state: Web,
    addr: SocketAddr,
    shutdown_rx: broadcast::Receiver<()>,
) {
    let mut sink = WebSocketSink { socket };

    let pipeline = match RecordPipeline::open(&state.input, state.ignore_parse_errors) {
        Ok(pipeline) => pipeline,
        Err(source) => {
            let e = PlaybackError::Open {
                path: state.input.to_path_buf(),
                source,
            };
            warn!("Playback to {} failed: {}", addr, e);
            if let Err(e) = sink.close().await {
                debug!("Error closing websocket: {}", e);
            }
            return;
        }
    };

    let mut controller = PlaybackController::new(sink, state.schedule, shutdown_rx);
    match controller.run(pipeline).await {
        Ok(summary) => debug!(
            "Playback to {} ended ({:?}) after {} records in {} batches",
            addr, summary.end, summary.records, summary.batches
        ),
        Err(e) => warn!("Playback to {} failed: {}", addr, e),
    }
}

/// Browsers may only connect from the page served on this host, or from
/// `localhost` on the listen port. Clients that send no `Origin` are not
/// browsers and are let through.
fn origin_allowed(headers: &HeaderMap, listen_port: u16) -> bool {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return true;
    };
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let authority = origin
        .split_once("://")
        .map_or(origin, |(_, rest)| rest)
        .trim_end_matches('/');

    let same_host = headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .is_some_and(|host| host.eq_ignore_ascii_case(authority));
    same_host || authority.eq_ignore_ascii_case(&format!("localhost:{}", listen_port))
}

struct WebSocketSink {
    socket: WebSocket,
}

#[async_trait]
impl PlaybackSink for WebSocketSink {
    async fn send_batch(&mut self, batch: String) -> Result<(), PlaybackError> {
        self.socket.send(Message::Text(batch.into())).await?;
        Ok(())
    }

    async fn closed(&mut self) {
        loop {
            match self.socket.recv().await {
                Some(Ok(Message::Close(frame))) => {
                    debug!("Viewer closed websocket: {:?}", frame);
                    return;
                }
                Some(Ok(message)) => {
                    debug!("Dropping unexpected message {:?}", message);
                }
                Some(Err(e)) => {
                    debug!("Error on receive from websocket: {}", e);
                    return;
                }
                None => return,
            }
        }
    }

    async fn close(&mut self) -> Result<(), PlaybackError> {
        let frame = CloseFrame {
            code: close_code::NORMAL,
            reason: "".into(),
        };
        self.socket.send(Message::Close(Some(frame))).await?;
        Ok(())
    }
}
