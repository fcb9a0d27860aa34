//! View model for a front-end showing the download state.
//!
//! A front-end only ever needs to know which [`PopupView`] to render. It gets
//! one when it opens (from the [`Response::PopupState`] reply to
//! `POPUP_READY`), when the user acts, and whenever an [`Event`] arrives.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::messages::{Event, Response};
use crate::session::{SessionSnapshot, SessionStatus};

static BOARD_PAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://www\.pinterest\.com/([^/]+)/[^/]+/?$").expect("valid board page regex")
});

/// Whether a tab URL points at a board page.
///
/// Pin pages (`/pin/<id>/`) share the board URL shape and are excluded.
///
/// ```rust
/// use pinfetch::popup::is_board_url;
///
/// assert!(is_board_url("https://www.pinterest.com/alice/garden/"));
/// assert!(!is_board_url("https://www.pinterest.com/pin/123456/"));
/// assert!(!is_board_url("https://www.pinterest.com/"));
/// ```
pub fn is_board_url(url: &str) -> bool {
    BOARD_PAGE
        .captures(url)
        .is_some_and(|captures| &captures[1] != "pin")
}

/// Everything a front-end can display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupView {
    /// The active tab is not a board.
    NotOnBoard,
    /// Ready to start.
    Idle,
    /// Start was clicked, no progress yet.
    Starting,
    Progress { completed: usize, total: usize },
    /// Cancel was clicked, waiting for the session to notice.
    Canceling,
    Complete,
    Canceled,
    Error { message: String },
}

impl PopupView {
    /// View for a freshly opened front-end on `tab_url`.
    ///
    /// `reply` is the answer to `POPUP_READY`, or `None` if the coordinator
    /// could not be reached.
    pub fn initial(tab_url: &str, reply: Option<&Response>) -> Self {
        if !is_board_url(tab_url) {
            return PopupView::NotOnBoard;
        }

        match reply {
            Some(Response::PopupState {
                downloading: true,
                state: Some(state),
            }) => Self::from_snapshot(state),
            _ => PopupView::Idle,
        }
    }

    pub fn from_snapshot(state: &SessionSnapshot) -> Self {
        match state.status {
            SessionStatus::Downloading => PopupView::Progress {
                completed: state.completed,
                total: state.total,
            },
            SessionStatus::Complete => PopupView::Complete,
            SessionStatus::Canceled => PopupView::Canceled,
            SessionStatus::Error => PopupView::Error {
                message: state
                    .error
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            },
        }
    }

    pub fn from_event(event: &Event) -> Self {
        match event {
            Event::DownloadProgress { completed, total } => PopupView::Progress {
                completed: *completed,
                total: *total,
            },
            Event::DownloadComplete => PopupView::Complete,
            Event::DownloadCanceled => PopupView::Canceled,
            Event::DownloadError { message } => PopupView::Error {
                message: message.clone(),
            },
        }
    }

    /// Whether the start control is offered.
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            PopupView::Idle | PopupView::Canceled | PopupView::Error { .. }
        )
    }

    /// Whether the cancel control is offered.
    pub fn can_cancel(&self) -> bool {
        matches!(self, PopupView::Starting | PopupView::Progress { .. })
    }
}

impl fmt::Display for PopupView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopupView::NotOnBoard => write!(f, "Navigate to a board to download"),
            PopupView::Idle => Ok(()),
            PopupView::Starting => write!(f, "Starting…"),
            PopupView::Progress { completed, total } => {
                write!(f, "Downloaded {} of {}", completed, total)
            }
            PopupView::Canceling => write!(f, "Canceling…"),
            PopupView::Complete => write!(f, "✅ Download complete"),
            PopupView::Canceled => write!(f, "⛔ Download canceled"),
            PopupView::Error { message } => write!(f, "❌ Error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str = "https://www.pinterest.com/alice/garden/";

    fn snapshot(status: SessionStatus, error: Option<&str>) -> SessionSnapshot {
        SessionSnapshot {
            status,
            completed: 2,
            total: 5,
            canceled: status == SessionStatus::Canceled,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_initial_view() {
        assert_eq!(
            PopupView::initial("https://www.pinterest.com/pin/99/", None),
            PopupView::NotOnBoard
        );
        assert_eq!(PopupView::initial(BOARD, None), PopupView::Idle);

        let idle = Response::PopupState {
            downloading: false,
            state: None,
        };
        assert_eq!(PopupView::initial(BOARD, Some(&idle)), PopupView::Idle);

        let busy = Response::PopupState {
            downloading: true,
            state: Some(snapshot(SessionStatus::Downloading, None)),
        };
        assert_eq!(
            PopupView::initial(BOARD, Some(&busy)),
            PopupView::Progress {
                completed: 2,
                total: 5
            }
        );
    }

    #[test]
    fn test_error_without_message() {
        let view = PopupView::from_snapshot(&snapshot(SessionStatus::Error, None));
        assert_eq!(view.to_string(), "❌ Error: Unknown error");
        assert!(view.can_start());
    }

    #[test]
    fn test_event_views() {
        let progress = PopupView::from_event(&Event::DownloadProgress {
            completed: 3,
            total: 7,
        });
        assert_eq!(progress.to_string(), "Downloaded 3 of 7");
        assert!(progress.can_cancel());
        assert!(!progress.can_start());

        let complete = PopupView::from_event(&Event::DownloadComplete);
        assert_eq!(complete.to_string(), "✅ Download complete");
        assert!(!complete.can_start());
        assert!(PopupView::from_event(&Event::DownloadCanceled).can_start());
    }
}
