//! Messages exchanged between a front-end and the [`Coordinator`](crate::session::Coordinator).
//!
//! Requests flow from the front-end to the coordinator, events flow back.
//! All of them serialize to the JSON shape the browser extension uses, with a
//! `type` tag in `SCREAMING_SNAKE_CASE`:
//!
//! ```rust
//! use pinfetch::messages::{Event, Request};
//!
//! let request: Request = serde_json::from_str(
//!     r#"{"type":"START_BOARD_DOWNLOAD","boardUrl":"https://www.pinterest.com/alice/garden/"}"#,
//! ).unwrap();
//! assert!(matches!(request, Request::StartBoardDownload { .. }));
//!
//! let event = Event::DownloadProgress { completed: 3, total: 10 };
//! assert_eq!(
//!     serde_json::to_string(&event).unwrap(),
//!     r#"{"type":"DOWNLOAD_PROGRESS","completed":3,"total":10}"#
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::session::SessionSnapshot;

/// Front-end to coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Asks for the current session; answered with [`Response::PopupState`].
    PopupReady,

    /// Starts downloading a board. Fire-and-forget.
    StartBoardDownload {
        #[serde(rename = "boardUrl")]
        board_url: String,
    },

    /// Cancels the running download, if any. Fire-and-forget.
    CancelBoardDownload,
}

/// Coordinator reply to a [`Request`] that expects one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    PopupState {
        downloading: bool,
        state: Option<SessionSnapshot>,
    },
}

/// Coordinator to front-end notifications.
///
/// Delivery is best-effort: events sent while nobody listens are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    DownloadProgress { completed: usize, total: usize },
    DownloadComplete,
    DownloadCanceled,
    DownloadError { message: String },
}

impl Event {
    /// Whether this event ends a session.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Event::DownloadProgress { .. })
    }
}
