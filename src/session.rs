//! The board download session and the coordinator that owns it.
//!
//! A [`Coordinator`] tracks at most one download at a time. Starting a
//! download fills its session slot and spawns a background task that
//! resolves the board, walks the whole feed, then hands the images to the
//! [`DownloadSink`] one by one:
//!
//! ```text
//! absent ──start──▶ downloading ──▶ complete | canceled | error ──(teardown delay)──▶ absent
//! ```
//!
//! Cancellation is cooperative. [`Coordinator::cancel`] only raises a flag;
//! the task notices it before the next feed page, before the next file, or
//! while pausing between files. A file already handed to the sink is allowed
//! to finish.
//!
//! Front-ends never get a handle on the session itself, only
//! [`SessionSnapshot`] copies and [`Event`]s.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pinfetch::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> pinfetch::Result<()> {
//! let coordinator = Coordinator::pinterest(Config::default(), Arc::new(FsSink::new("./downloads")));
//! let mut events = coordinator.subscribe();
//!
//! coordinator.start("https://www.pinterest.com/alice/garden/")?;
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//!     if event.is_terminal() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    board::{BoardApi, PinterestClient, fetch_all_images, parse_board_url},
    config::Config,
    error::{Error, Result},
    messages::{Event, Request, Response},
    sink::{ConflictAction, DownloadRequest, DownloadSink},
};

const EVENT_CAPACITY: usize = 256;

/// Lifecycle state of a session. An absent session is `None` in the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Downloading,
    Canceled,
    Complete,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Downloading)
    }
}

/// Point-in-time copy of the session, as handed to front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,

    /// Files saved so far
    pub completed: usize,

    /// Images found on the board, known once pagination is done
    pub total: usize,

    /// Set as soon as a cancel was requested, even before `status` follows
    pub canceled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
struct Session {
    id: u64,
    status: SessionStatus,
    completed: usize,
    total: usize,
    error: Option<String>,
    cancel: CancellationToken,
}

impl Session {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            completed: self.completed,
            total: self.total,
            canceled: self.cancel.is_cancelled(),
            error: self.error.clone(),
        }
    }
}

/// How a pipeline run ended when it did not fail.
enum Outcome {
    Complete,
    Canceled,
}

struct Inner {
    config: Config,
    api: Arc<dyn BoardApi>,
    sink: Arc<dyn DownloadSink>,
    slot: Mutex<Option<Session>>,
    events: broadcast::Sender<Event>,
    next_id: AtomicU64,
}

/// Owner of the single download session.
///
/// Cloning is cheap and every clone drives the same slot.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Creates a coordinator over any board API and sink.
    pub fn new(config: Config, api: Arc<dyn BoardApi>, sink: Arc<dyn DownloadSink>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                api,
                sink,
                slot: Mutex::new(None),
                events,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Creates a coordinator talking to Pinterest with the given config.
    pub fn pinterest(config: Config, sink: Arc<dyn DownloadSink>) -> Self {
        let api = Arc::new(PinterestClient::new(&config));
        Self::new(config, api, sink)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Subscribes to session events.
    ///
    /// Only events sent after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    /// Starts downloading `board_url` and returns without waiting.
    ///
    /// The URL is validated by the background task; an invalid URL ends the
    /// session in the error state like any other failure.
    ///
    /// # Errors
    ///
    /// * [`Error::NoRuntime`] - called outside a tokio runtime
    /// * [`Error::SessionActive`] - a session is still held, including a
    ///   finished one inside its teardown delay
    pub fn start(&self, board_url: impl Into<String>) -> Result<()> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let board_url = board_url.into();
        let cancel = CancellationToken::new();

        let id = {
            let mut slot = self.inner.slot.lock();
            if slot.is_some() {
                warn!(%board_url, "Rejecting start, a session is already active");
                return Err(Error::SessionActive);
            }

            let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            *slot = Some(Session {
                id,
                status: SessionStatus::Downloading,
                completed: 0,
                total: 0,
                error: None,
                cancel: cancel.clone(),
            });
            id
        };

        info!(session = id, %board_url, "Starting board download");
        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move { inner.run(id, board_url, cancel).await });

        Ok(())
    }

    /// Requests cancellation of the active session.
    ///
    /// Returns `false` when there is no session. Repeated calls are harmless.
    pub fn cancel(&self) -> bool {
        match self.inner.slot.lock().as_ref() {
            Some(session) => {
                if !session.cancel.is_cancelled() {
                    info!(session = session.id, "Cancel requested");
                }
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Returns a copy of the current session, or `None` when there is none.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.inner.slot.lock().as_ref().map(Session::snapshot)
    }

    /// Handles one front-end request.
    ///
    /// Only [`Request::PopupReady`] produces a response; the other requests
    /// are fire-and-forget and their failures are only logged.
    pub fn handle(&self, request: Request) -> Option<Response> {
        match request {
            Request::PopupReady => {
                let state = self.snapshot();
                Some(Response::PopupState {
                    downloading: state.is_some(),
                    state,
                })
            }
            Request::StartBoardDownload { board_url } => {
                if let Err(e) = self.start(board_url) {
                    debug!(error = %e, "Start request ignored");
                }
                None
            }
            Request::CancelBoardDownload => {
                self.cancel();
                None
            }
        }
    }
}

impl Inner {
    async fn run(self: Arc<Self>, id: u64, board_url: String, cancel: CancellationToken) {
        // The pipeline runs in its own task so a panicking API or sink still
        // ends the session and frees the slot.
        let pipeline = tokio::spawn({
            let inner = Arc::clone(&self);
            let board_url = board_url.clone();
            let cancel = cancel.clone();
            async move { inner.pipeline(id, &board_url, &cancel).await }
        });
        let result = pipeline
            .await
            .unwrap_or_else(|e| Err(Error::Other(format!("Download task failed: {}", e))));

        let (status, message, event) = match result {
            Ok(Outcome::Complete) => (SessionStatus::Complete, None, Event::DownloadComplete),
            Ok(Outcome::Canceled) => (SessionStatus::Canceled, None, Event::DownloadCanceled),
            Err(e) => {
                error!(session = id, %board_url, error = %e, "Board download failed");
                let message = e.to_string();
                (
                    SessionStatus::Error,
                    Some(message.clone()),
                    Event::DownloadError { message },
                )
            }
        };

        self.update(id, |session| {
            session.status = status;
            session.error = message;
        });
        info!(session = id, ?status, "Board download finished");
        self.emit(event);

        tokio::time::sleep(self.config.teardown_delay()).await;

        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|session| session.id == id) {
            *slot = None;
            debug!(session = id, "Session torn down");
        }
    }

    async fn pipeline(
        &self,
        id: u64,
        board_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        let board = parse_board_url(board_url)?;
        let info = self.api.fetch_board_info(&board).await?;
        let images = fetch_all_images(self.api.as_ref(), &board, &info.id, cancel).await?;

        let total = images.len();
        self.update(id, |session| {
            session.total = total;
            session.completed = 0;
        });
        info!(session = id, board = %info.name, total, "Board feed collected");

        for image in images {
            if cancel.is_cancelled() {
                return Ok(Outcome::Canceled);
            }

            self.sink
                .download(DownloadRequest {
                    url: image.url,
                    filename: format!("{}/{}.jpg", info.name, image.filename),
                    conflict_action: ConflictAction::Uniquify,
                })
                .await?;

            let completed = self
                .update(id, |session| {
                    session.completed += 1;
                    session.completed
                })
                .unwrap_or_default();
            self.emit(Event::DownloadProgress { completed, total });

            self.pause(cancel).await;
        }

        if cancel.is_cancelled() {
            Ok(Outcome::Canceled)
        } else {
            Ok(Outcome::Complete)
        }
    }

    /// Sleeps for a random time up to the configured ceiling, waking early on cancel.
    async fn pause(&self, cancel: &CancellationToken) {
        let ceiling = self.config.pause_ceiling();
        if ceiling.is_zero() {
            return;
        }

        let delay = rand::thread_rng().gen_range(Duration::ZERO..=ceiling);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {}
        }
    }

    /// Applies `f` to session `id` if it still occupies the slot.
    fn update<R>(&self, id: u64, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.slot
            .lock()
            .as_mut()
            .filter(|session| session.id == id)
            .map(f)
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("No listener for session event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoardInfo, BoardRef, FeedPage};
    use async_trait::async_trait;

    struct EmptyBoard;

    #[async_trait]
    impl BoardApi for EmptyBoard {
        async fn fetch_board_info(&self, _board: &BoardRef) -> Result<BoardInfo> {
            Ok(BoardInfo {
                id: "1".into(),
                name: "Empty".into(),
            })
        }

        async fn fetch_feed_page(
            &self,
            _board: &BoardRef,
            _board_id: &str,
            _bookmark: Option<&str>,
        ) -> Result<FeedPage> {
            Ok(FeedPage::default())
        }
    }

    struct NoSink;

    #[async_trait]
    impl DownloadSink for NoSink {
        async fn download(&self, _request: DownloadRequest) -> Result<()> {
            Err(Error::sink("unused"))
        }
    }

    fn coordinator() -> Coordinator {
        let config = Config {
            teardown_delay_ms: 20,
            pause_ceiling_ms: 0,
            ..Config::default()
        };
        Coordinator::new(config, Arc::new(EmptyBoard), Arc::new(NoSink))
    }

    #[tokio::test]
    async fn test_empty_board_completes_and_tears_down() {
        let coordinator = coordinator();
        let mut events = coordinator.subscribe();

        coordinator
            .start("https://www.pinterest.com/alice/empty/")
            .unwrap();
        assert_eq!(events.recv().await.unwrap(), Event::DownloadComplete);

        let snapshot = coordinator.snapshot().unwrap();
        assert_eq!(snapshot.status, SessionStatus::Complete);
        assert_eq!(snapshot.total, 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(coordinator.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_ends_in_error() {
        let coordinator = coordinator();
        let mut events = coordinator.subscribe();

        coordinator.handle(Request::StartBoardDownload {
            board_url: "https://example.com/nope".into(),
        });

        assert_eq!(
            events.recv().await.unwrap(),
            Event::DownloadError {
                message: "Invalid Pinterest board URL".into()
            }
        );
        let snapshot = coordinator.snapshot().unwrap();
        assert_eq!(snapshot.status, SessionStatus::Error);
        assert_eq!(snapshot.error.as_deref(), Some("Invalid Pinterest board URL"));
    }

    struct PanickingBoard;

    #[async_trait]
    impl BoardApi for PanickingBoard {
        async fn fetch_board_info(&self, _board: &BoardRef) -> Result<BoardInfo> {
            panic!("board lookup blew up");
        }

        async fn fetch_feed_page(
            &self,
            _board: &BoardRef,
            _board_id: &str,
            _bookmark: Option<&str>,
        ) -> Result<FeedPage> {
            Ok(FeedPage::default())
        }
    }

    #[tokio::test]
    async fn test_panicking_api_ends_in_error_and_frees_slot() {
        let config = Config {
            teardown_delay_ms: 20,
            pause_ceiling_ms: 0,
            ..Config::default()
        };
        let coordinator = Coordinator::new(config, Arc::new(PanickingBoard), Arc::new(NoSink));
        let mut events = coordinator.subscribe();

        coordinator
            .start("https://www.pinterest.com/alice/garden/")
            .unwrap();

        match events.recv().await.unwrap() {
            Event::DownloadError { message } => {
                assert!(message.starts_with("Download task failed"), "{}", message)
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(coordinator.snapshot().unwrap().status, SessionStatus::Error);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(coordinator.snapshot().is_none());
        assert!(coordinator.start("https://www.pinterest.com/alice/garden/").is_ok());
    }

    #[test]
    fn test_start_outside_runtime_is_an_error() {
        let coordinator = coordinator();

        assert!(matches!(
            coordinator.start("https://www.pinterest.com/alice/garden/"),
            Err(Error::NoRuntime)
        ));
        assert!(coordinator.snapshot().is_none());
    }

    #[test]
    fn test_cancel_without_session_is_noop() {
        let coordinator = coordinator();
        assert!(!coordinator.cancel());
        assert_eq!(coordinator.handle(Request::CancelBoardDownload), None);
        assert_eq!(
            coordinator.handle(Request::PopupReady),
            Some(Response::PopupState {
                downloading: false,
                state: None
            })
        );
    }
}
