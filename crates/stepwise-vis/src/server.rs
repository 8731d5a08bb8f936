//! Axum web server with WebSocket streaming for trace playback.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use stepwise_replay::{
    Frame, PlaybackController, PlaybackEvent, PlaybackSpeed, PlaybackStatus, SessionSupervisor,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::producers::{self, Algorithm, Family, Input, InputGenerator};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state.
pub struct AppState {
    config: ServerConfig,
    supervisor: SessionSupervisor,
    inputs: Mutex<InputGenerator>,
    speed: RwLock<PlaybackSpeed>,
}

/// Request to record and load a new run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
    pub algorithm: String,
    /// Explicit input; generated when absent
    #[serde(default)]
    pub input: Option<Input>,
    /// Size of a generated input
    #[serde(default)]
    pub size: Option<usize>,
    /// Attach a snapshot to every step
    #[serde(default)]
    pub snapshots: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub algorithm: Algorithm,
    pub input: Input,
    pub status: PlaybackStatus,
}

#[derive(Debug, Clone, Serialize)]
struct AlgorithmInfo {
    name: &'static str,
    family: Family,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Direction {
    Forward,
    Backward,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            supervisor: SessionSupervisor::new(config.playback.clone()),
            inputs: Mutex::new(InputGenerator::new(config.seed)),
            speed: RwLock::new(PlaybackSpeed::Normal),
            config,
        }
    }

    pub fn supervisor(&self) -> &SessionSupervisor {
        &self.supervisor
    }

    fn controller(&self) -> Result<PlaybackController> {
        self.supervisor.current().ok_or(Error::NoSession)
    }

    async fn status(&self) -> Result<PlaybackStatus> {
        Ok(self.controller()?.status().await)
    }

    async fn frame(&self) -> Result<Frame> {
        Ok(self.controller()?.current().await)
    }

    /// Record a run and make it the active session.
    ///
    /// The producer runs on the blocking pool under the configured timeout.
    /// If it fails or overruns, the current session keeps playing.
    pub async fn run(&self, request: RunRequest) -> Result<RunResponse> {
        let algorithm: Algorithm = request.algorithm.parse()?;
        let max = self.config.max_input_size;
        let input = match request.input {
            Some(input) => input,
            None => {
                let size = request.size.unwrap_or(self.config.input_size);
                if size > max {
                    return Err(Error::InputTooLarge { size, max });
                }
                self.inputs.lock().await.input_for(algorithm, size)
            }
        };
        if input.size() > max {
            return Err(Error::InputTooLarge {
                size: input.size(),
                max,
            });
        }
        let initial = producers::initial_state(algorithm, &input)?;

        let timeout = self.config.producer_timeout;
        let with_snapshots = request.snapshots;
        let job = input.clone();
        let producer = async move {
            let task = tokio::task::spawn_blocking(move || {
                producers::produce(algorithm, &job, with_snapshots)
            });
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(Ok(run))) => Ok(run.steps),
                Ok(Ok(Err(err))) => Err(BoxError::from(err)),
                Ok(Err(join)) => Err(BoxError::from(join)),
                Err(_) => Err(BoxError::from(format!(
                    "{algorithm} did not finish within {}ms",
                    timeout.as_millis()
                ))),
            }
        };

        info!(%algorithm, with_snapshots, "starting run");
        let controller = self.supervisor.start_session(initial, producer).await?;
        Ok(RunResponse {
            algorithm,
            input,
            status: controller.status().await,
        })
    }

    async fn play(&self) -> Result<PlaybackStatus> {
        let controller = self.controller()?;
        let speed = *self.speed.read().await;
        controller
            .play_at(speed, self.config.playback.base_delay)
            .await?;
        Ok(controller.status().await)
    }

    async fn pause(&self) -> Result<PlaybackStatus> {
        let controller = self.controller()?;
        controller.pause().await;
        Ok(controller.status().await)
    }

    async fn resume(&self) -> Result<PlaybackStatus> {
        let controller = self.controller()?;
        controller.resume().await;
        Ok(controller.status().await)
    }

    async fn cancel(&self) -> Result<PlaybackStatus> {
        let controller = self.controller()?;
        controller.cancel().await;
        Ok(controller.status().await)
    }

    async fn step(&self, direction: Direction) -> Result<PlaybackStatus> {
        let controller = self.controller()?;
        match direction {
            Direction::Forward => controller.step_forward().await?,
            Direction::Backward => controller.step_backward().await?,
        };
        Ok(controller.status().await)
    }

    async fn seek(&self, position: i64) -> Result<PlaybackStatus> {
        let controller = self.controller()?;
        controller.seek(position).await?;
        Ok(controller.status().await)
    }

    /// Remember `speed` for future plays and apply it to the active session.
    async fn set_speed(&self, speed: PlaybackSpeed) -> Result<PlaybackStatus> {
        let controller = self.controller()?;
        *self.speed.write().await = speed;
        controller
            .set_delay(speed.delay(self.config.playback.base_delay))
            .await;
        Ok(controller.status().await)
    }
}

/// Visualization server.
pub struct VisServer {
    state: Arc<AppState>,
}

impl VisServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(config)),
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_handler))
            // API routes
            .route("/api/algorithms", get(algorithms_handler))
            .route("/api/run", post(run_handler))
            .route("/api/frame", get(frame_handler))
            .route("/api/playback", get(status_handler))
            .route("/api/playback/play", post(play_handler))
            .route("/api/playback/pause", post(pause_handler))
            .route("/api/playback/resume", post(resume_handler))
            .route("/api/playback/cancel", post(cancel_handler))
            .route("/api/playback/step", post(step_handler))
            .route("/api/playback/seek", post(seek_handler))
            .route("/api/playback/speed", post(speed_handler))
            // WebSocket for frames and commands
            .route("/ws", get(ws_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serve until interrupted, then retire the active session.
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.state.config.addr).await?;
        info!(addr = %listener.local_addr()?, "visualization server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        self.state.supervisor.end_session().await;
        info!("visualization server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn algorithms_handler() -> Json<Vec<AlgorithmInfo>> {
    Json(
        Algorithm::ALL
            .into_iter()
            .map(|a| AlgorithmInfo {
                name: a.name(),
                family: a.family(),
            })
            .collect(),
    )
}

async fn run_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>> {
    Ok(Json(state.run(req).await?))
}

async fn frame_handler(State(state): State<Arc<AppState>>) -> Result<Json<Frame>> {
    Ok(Json(state.frame().await?))
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackStatus>> {
    Ok(Json(state.status().await?))
}

async fn play_handler(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackStatus>> {
    Ok(Json(state.play().await?))
}

async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackStatus>> {
    Ok(Json(state.pause().await?))
}

async fn resume_handler(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackStatus>> {
    Ok(Json(state.resume().await?))
}

async fn cancel_handler(State(state): State<Arc<AppState>>) -> Result<Json<PlaybackStatus>> {
    Ok(Json(state.cancel().await?))
}

#[derive(Deserialize)]
struct StepRequest {
    direction: Direction,
}

async fn step_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StepRequest>,
) -> Result<Json<PlaybackStatus>> {
    Ok(Json(state.step(req.direction).await?))
}

#[derive(Deserialize)]
struct SeekRequest {
    position: i64,
}

async fn seek_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<PlaybackStatus>> {
    Ok(Json(state.seek(req.position).await?))
}

#[derive(Deserialize)]
struct SpeedRequest {
    speed: PlaybackSpeed,
}

async fn speed_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeedRequest>,
) -> Result<Json<PlaybackStatus>> {
    Ok(Json(state.set_speed(req.speed).await?))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    GetStatus,
    GetFrame,
    Run(RunRequest),
    Play,
    Pause,
    Resume,
    Cancel,
    Step { direction: Direction },
    Seek { position: i64 },
    Speed { speed: PlaybackSpeed },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsResponse {
    Status(PlaybackStatus),
    Frame(Frame),
    Run(RunResponse),
    Error {
        error: &'static str,
        message: String,
    },
}

impl From<Error> for WsResponse {
    fn from(err: Error) -> Self {
        WsResponse::Error {
            error: err.code(),
            message: err.to_string(),
        }
    }
}

async fn handle_ws_command(state: &AppState, cmd: WsCommand) -> WsResponse {
    let result = match cmd {
        WsCommand::GetStatus => state.status().await.map(WsResponse::Status),
        WsCommand::GetFrame => state.frame().await.map(WsResponse::Frame),
        WsCommand::Run(request) => state.run(request).await.map(WsResponse::Run),
        WsCommand::Play => state.play().await.map(WsResponse::Status),
        WsCommand::Pause => state.pause().await.map(WsResponse::Status),
        WsCommand::Resume => state.resume().await.map(WsResponse::Status),
        WsCommand::Cancel => state.cancel().await.map(WsResponse::Status),
        WsCommand::Step { direction } => state.step(direction).await.map(WsResponse::Status),
        WsCommand::Seek { position } => state.seek(position).await.map(WsResponse::Status),
        WsCommand::Speed { speed } => state.set_speed(speed).await.map(WsResponse::Status),
    };
    result.unwrap_or_else(WsResponse::from)
}

/// Stream the active session's events and execute client commands.
///
/// Follows session switches: when a new run starts the socket resubscribes
/// to the new controller and sends its first frame.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    info!("websocket client connected");
    let mut sessions = state.supervisor.watch();
    let current = sessions.borrow_and_update().clone();
    let mut events = follow(&mut socket, current).await;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = match serde_json::from_str::<WsCommand>(text.as_str()) {
                            Ok(cmd) => handle_ws_command(&state, cmd).await,
                            Err(err) => WsResponse::Error {
                                error: "bad_command",
                                message: err.to_string(),
                            },
                        };
                        if send_json(&mut socket, &response).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(error = %err, "websocket receive failed");
                        break;
                    }
                }
            }
            changed = sessions.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = sessions.borrow_and_update().clone();
                events = follow(&mut socket, current).await;
            }
            event = next_event(&mut events) => {
                match event {
                    Ok(event) => {
                        if send_json(&mut socket, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "websocket client lagging, events dropped");
                    }
                    Err(RecvError::Closed) => events = None,
                }
            }
        }
    }
    info!("websocket client disconnected");
}

/// Subscribe to `controller` and send its current frame.
async fn follow(
    socket: &mut WebSocket,
    controller: Option<PlaybackController>,
) -> Option<broadcast::Receiver<PlaybackEvent>> {
    let controller = controller?;
    let events = controller.subscribe();
    let frame = PlaybackEvent::Frame(controller.current().await);
    if let Err(err) = send_json(socket, &frame).await {
        debug!(error = %err, "failed to send initial frame");
    }
    Some(events)
}

async fn next_event(
    events: &mut Option<broadcast::Receiver<PlaybackEvent>>,
) -> std::result::Result<PlaybackEvent, RecvError> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

async fn send_json<T: Serialize>(
    socket: &mut WebSocket,
    value: &T,
) -> std::result::Result<(), axum::Error> {
    let json = serde_json::to_string(value).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}
