//! Error types and result handling for pinfetch operations.
//!
//! All fallible operations return a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! - **Invalid URL**: the board URL does not look like `https://www.pinterest.com/<user>/<board>/`
//! - **Board Not Found**: the board resource responded without an identifier
//! - **Feed Fetch**: a page of the board feed came back with a non-success status
//! - **Download Sink**: the download sink refused or failed to save a file
//! - **Session Active**: a download was requested while another one is still tracked
//! - **Network / JSON / IO**: wrapped lower-level failures
//!
//! Every variant is fatal for the session that hit it; nothing is retried.
//!
//! # Examples
//!
//! ```rust
//! use pinfetch::board::parse_board_url;
//! use pinfetch::Error;
//!
//! match parse_board_url("https://example.com/not/a/board") {
//!     Ok(board) => println!("board {}", board.slug),
//!     Err(Error::InvalidUrl(url)) => println!("not a board: {}", url),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// Type alias for Results with pinfetch errors.
///
/// ```rust
/// use pinfetch::{Error, Result};
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::board_not_found("alice/garden"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all pinfetch operations.
///
/// The `Display` output of the domain variants is what ends up in the
/// session's `error` field and in the `DOWNLOAD_ERROR` event, so it is kept
/// short and human readable.
#[derive(Error, Debug)]
pub enum Error {
    /// The board URL did not match the expected board pattern.
    ///
    /// Raised before any network call is made. Carries the rejected input.
    #[error("Invalid Pinterest board URL")]
    InvalidUrl(String),

    /// The board resource was fetched but carried no board identifier.
    ///
    /// The payload names the board that failed to resolve.
    #[error("Board ID not found")]
    BoardNotFound(String),

    /// A board feed page request returned a non-success HTTP status.
    ///
    /// Pagination stops at the first failing page and the whole session
    /// transitions to the error state.
    #[error("Failed to fetch board feed: {status}")]
    FeedFetch { status: u16 },

    /// The download sink rejected a file.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pinfetch::Error;
    ///
    /// let error = Error::sink("HTTP 404 Not Found");
    /// assert_eq!(error.to_string(), "Download failed: HTTP 404 Not Found");
    /// ```
    #[error("Download failed: {0}")]
    DownloadSink(String),

    /// A start was requested while a session is still held.
    #[error("A board download is already in progress")]
    SessionActive,

    /// Network-related errors from HTTP operations.
    ///
    /// Wraps errors from the underlying HTTP client (reqwest), such as
    /// DNS failures, refused connections or broken response bodies.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization and deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A session was started outside a tokio runtime.
    #[error("No async runtime available to run the download")]
    NoRuntime,

    /// Generic error messages.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an invalid URL error for the given input.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Error::InvalidUrl(url.into())
    }

    /// Creates a board not found error.
    ///
    /// # Parameters
    ///
    /// * `board` - Something identifying the board, usually `username/slug`
    pub fn board_not_found(board: impl Into<String>) -> Self {
        Error::BoardNotFound(board.into())
    }

    /// Creates a feed fetch error from an HTTP status code.
    pub fn feed_fetch(status: u16) -> Self {
        Error::FeedFetch { status }
    }

    /// Creates a download sink error with the given message.
    pub fn sink(msg: impl Into<String>) -> Self {
        Error::DownloadSink(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_messages() {
        assert_eq!(
            Error::invalid_url("nope").to_string(),
            "Invalid Pinterest board URL"
        );
        assert_eq!(
            Error::board_not_found("alice/garden").to_string(),
            "Board ID not found"
        );
        assert_eq!(
            Error::feed_fetch(503).to_string(),
            "Failed to fetch board feed: 503"
        );
    }
}
