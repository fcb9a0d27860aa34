//! # pinfetch - Download every image of a Pinterest board
//!
//! pinfetch resolves a board URL through Pinterest's internal JSON resources,
//! pages through the whole board feed, picks the best still image of every
//! pin and saves them one at a time through a download sink.
//!
//! ## Features
//!
//! - **Board resolution**: board URL to board identifier and display name
//! - **Full pagination**: follows feed bookmarks until the board is exhausted
//! - **Image selection**: largest JPEG/PNG variant of each pin, videos skipped
//! - **Clean file names**: pin descriptions turned into safe file names
//! - **Single tracked session**: start, cancel and observe one download at a time
//! - **Cooperative cancellation**: honored between pages, between files and during pauses
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pinfetch::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> pinfetch::Result<()> {
//!     let sink = Arc::new(FsSink::new("./downloads"));
//!     let coordinator = Coordinator::pinterest(Config::default(), sink);
//!     let mut events = coordinator.subscribe();
//!
//!     coordinator.start("https://www.pinterest.com/alice/garden/")?;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{}", PopupView::from_event(&event));
//!         if event.is_terminal() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`board`]: URL parsing, board resolution and feed pagination
//! - [`select`]: image variant selection
//! - [`filename`]: file name derivation
//! - [`sink`]: where files are written
//! - [`session`]: the download session and its coordinator
//! - [`messages`]: request, response and event types for front-ends
//! - [`popup`]: view model for front-ends
//! - [`net`]: HTTP client and JSON helpers
//! - [`config`]: runtime settings
//! - [`error`]: error handling

pub mod board;
pub mod config;
pub mod error;
pub mod filename;
pub mod messages;
pub mod net;
pub mod popup;
pub mod select;
pub mod session;
pub mod sink;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use pinfetch::prelude::*;
///
/// let board = parse_board_url("https://www.pinterest.com/alice/garden/").unwrap();
/// assert_eq!(board.slug, "garden");
/// ```
pub mod prelude {
    pub use crate::{
        board::{BoardApi, PinterestClient, fetch_all_images, parse_board_url},
        config::{Config, ConfigBuilder},
        filename::filename_from_pin,
        messages::{Event, Request, Response},
        popup::PopupView,
        select::select_downloadable_image,
        session::{Coordinator, SessionSnapshot, SessionStatus},
        sink::{ConflictAction, DownloadRequest, DownloadSink, FsSink},
        types::{BoardInfo, BoardRef, FeedPage, ImageRecord, Pin},
    };
}

// Re-export main types at crate root for direct access
pub use board::{BoardApi, PinterestClient, parse_board_url};
pub use config::Config;
pub use error::{Error, Result};
pub use session::{Coordinator, SessionSnapshot, SessionStatus};
pub use types::{BoardInfo, BoardRef, ImageRecord, Pin};
