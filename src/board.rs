//! Board resolution and feed pagination.
//!
//! This module turns a board URL into the list of images to download:
//!
//! 1. [`parse_board_url`] splits the URL into a [`BoardRef`]
//! 2. [`BoardApi::fetch_board_info`] resolves the board identifier and name
//! 3. [`BoardApi::fetch_feed_page`] fetches one page of pins per call
//! 4. [`fetch_all_images`] walks the bookmarks until the feed ends and keeps
//!    the downloadable image of every pin, in feed order
//!
//! [`PinterestClient`] is the [`BoardApi`] backed by Pinterest's internal
//! resource endpoints. Anything else implementing the trait (a fixture, a
//! cache) can be handed to the session instead.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pinfetch::board::{BoardApi, PinterestClient, fetch_all_images, parse_board_url};
//! use pinfetch::config::Config;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> pinfetch::Result<()> {
//! let api = PinterestClient::new(&Config::default());
//! let board = parse_board_url("https://www.pinterest.com/alice/garden/")?;
//! let info = api.fetch_board_info(&board).await?;
//! let images = fetch_all_images(&api, &board, &info.id, &CancellationToken::new()).await?;
//! println!("{} has {} images", info.name, images.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::Config,
    error::{Error, Result},
    filename::filename_from_pin,
    net::{HttpClient, json as json_path},
    select::select_downloadable_image,
    types::{BoardInfo, BoardRef, FeedPage, ImageRecord, Pin},
};

/// Path of the board resolution endpoint.
pub const BOARD_RESOURCE_PATH: &str = "/resource/BoardResource/get/";

/// Path of the paginated board feed endpoint.
pub const BOARD_FEED_RESOURCE_PATH: &str = "/resource/BoardFeedResource/get/";

/// Bookmark the feed hands out once there is nothing left.
pub const END_BOOKMARK: &str = "-end-";

static BOARD_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://www\.pinterest\.com/([^/]+)/([^/]+)/?$").expect("valid board url regex")
});

/// Parses a board URL of the form `https://www.pinterest.com/<username>/<slug>/`.
///
/// The trailing slash is optional. Anything else, including extra path
/// segments, query strings or other hosts, is rejected.
///
/// # Errors
///
/// * [`Error::InvalidUrl`] - the input is not a board URL
///
/// # Examples
///
/// ```rust
/// use pinfetch::board::parse_board_url;
///
/// let board = parse_board_url("https://www.pinterest.com/alice/garden/").unwrap();
/// assert_eq!(board.username, "alice");
/// assert_eq!(board.slug, "garden");
/// assert_eq!(board.source_url, "/alice/garden/");
///
/// assert!(parse_board_url("https://www.pinterest.com/alice/").is_err());
/// ```
pub fn parse_board_url(board_url: &str) -> Result<BoardRef> {
    let captures = BOARD_URL
        .captures(board_url)
        .ok_or_else(|| Error::invalid_url(board_url))?;

    Ok(BoardRef::new(&captures[1], &captures[2]))
}

/// Access to the two board resources a download needs.
///
/// Implementations are shared with the session's background task, hence the
/// `Send + Sync` bound.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// Resolves the board identifier and display name.
    ///
    /// # Errors
    ///
    /// * [`Error::BoardNotFound`] - the response carried no board identifier
    /// * [`Error::Network`] - connection or transport failure
    async fn fetch_board_info(&self, board: &BoardRef) -> Result<BoardInfo>;

    /// Fetches one page of the board feed.
    ///
    /// `bookmark` is the continuation token returned by the previous page,
    /// `None` for the first page.
    ///
    /// # Errors
    ///
    /// * [`Error::FeedFetch`] - the page request returned a non-success status
    /// * [`Error::Network`] - connection or transport failure
    async fn fetch_feed_page(
        &self,
        board: &BoardRef,
        board_id: &str,
        bookmark: Option<&str>,
    ) -> Result<FeedPage>;
}

/// [`BoardApi`] implementation talking to Pinterest's resource endpoints.
///
/// Requests carry the configured session cookie, so private boards work as
/// long as the cookie belongs to an account that can see them.
#[derive(Debug, Clone)]
pub struct PinterestClient {
    client: HttpClient,
    page_size: u32,
    default_board_name: String,
}

impl PinterestClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: HttpClient::new(config),
            page_size: config.page_size,
            default_board_name: config.default_board_name.clone(),
        }
    }

    /// Builds the board resource URL for `board`.
    pub fn board_info_url(&self, board: &BoardRef) -> Result<Url> {
        let data = json!({
            "options": {
                "field_set_key": "detailed",
                "orbac_subject_id": "",
                "slug": board.slug,
                "username": board.username,
            },
            "context": {},
        });

        let mut url = self.client.endpoint(BOARD_RESOURCE_PATH)?;
        append_resource_query(&mut url, &board.source_url, &data);
        Ok(url)
    }

    /// Builds the feed URL for one page of `board`.
    pub fn board_feed_url(
        &self,
        board: &BoardRef,
        board_id: &str,
        bookmark: Option<&str>,
    ) -> Result<Url> {
        let mut options = json!({
            "board_id": board_id,
            "board_url": board.source_url,
            "page_size": self.page_size,
            "field_set_key": "react_grid_pin",
            "currentFilter": -1,
            "filter_section_pins": true,
            "sort": "default",
            "layout": "default",
            "redux_normalize_feed": true,
        });
        if let Some(bookmark) = bookmark {
            options["bookmarks"] = json!([bookmark]);
        }

        let data = json!({ "options": options, "context": {} });

        let mut url = self.client.endpoint(BOARD_FEED_RESOURCE_PATH)?;
        append_resource_query(&mut url, &board.source_url, &data);
        Ok(url)
    }
}

fn append_resource_query(url: &mut Url, source_url: &str, data: &Value) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    url.query_pairs_mut()
        .append_pair("source_url", source_url)
        .append_pair("data", &data.to_string())
        .append_pair("_", &now.to_string());
}

#[async_trait]
impl BoardApi for PinterestClient {
    async fn fetch_board_info(&self, board: &BoardRef) -> Result<BoardInfo> {
        let url = self.board_info_url(board)?;
        let response = self.client.get(url, &board.source_url).await?;

        let status = response.status();
        if !status.is_success() {
            warn!(board = %board.source_url, %status, "Board resource request failed");
        }

        // A failed lookup still answers with an envelope, just without data.
        let body = HttpClient::read_json(response)
            .await
            .unwrap_or(Value::Null);

        let id = json_path::extract_str(&body, "resource_response.data.id")
            .ok_or_else(|| Error::board_not_found(format!("{}/{}", board.username, board.slug)))?;
        let name = json_path::extract_str(&body, "resource_response.data.name")
            .unwrap_or_else(|| self.default_board_name.clone());

        debug!(board = %board.source_url, %id, %name, "Resolved board");
        Ok(BoardInfo { id, name })
    }

    async fn fetch_feed_page(
        &self,
        board: &BoardRef,
        board_id: &str,
        bookmark: Option<&str>,
    ) -> Result<FeedPage> {
        let url = self.board_feed_url(board, board_id, bookmark)?;
        let response = self.client.get(url, &board.source_url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::feed_fetch(status.as_u16()));
        }

        let body = HttpClient::read_json(response).await?;

        let pins = json_path::extract_array(&body, "resource_response.data")
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Pin>(record) {
                Ok(pin) => Some(pin),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable feed record");
                    None
                }
            })
            .collect();

        let bookmark = json_path::extract_str(&body, "resource_response.bookmark")
            .filter(|b| b != END_BOOKMARK);

        Ok(FeedPage { pins, bookmark })
    }
}

/// Keeps the downloadable image of each pin, in order.
///
/// Videos and pins without an acceptable variant are skipped silently. Names
/// fall back to `pin-<id>` when the pin has no usable text.
pub fn images_from_pins(pins: &[Pin]) -> Vec<ImageRecord> {
    pins.iter()
        .filter_map(|pin| {
            let selected = select_downloadable_image(pin)?;
            let fallback = format!("pin-{}", pin.id_string());
            Some(ImageRecord {
                url: selected.url,
                ext: selected.ext.to_string(),
                filename: filename_from_pin(pin, &fallback),
            })
        })
        .collect()
}

/// Walks the whole board feed and returns every downloadable image.
///
/// Pages are requested one after another, each with the bookmark of the
/// previous one, until a page comes back without a bookmark. Images keep
/// feed order: everything from page N precedes page N+1.
///
/// `cancel` is checked before every page request. Once it is set no further
/// request is made and the images gathered so far are returned.
///
/// # Errors
///
/// The first failing page aborts the walk; already collected images are
/// discarded with it.
pub async fn fetch_all_images(
    api: &dyn BoardApi,
    board: &BoardRef,
    board_id: &str,
    cancel: &CancellationToken,
) -> Result<Vec<ImageRecord>> {
    let mut images = Vec::new();
    let mut bookmark: Option<String> = None;
    let mut page_number = 0usize;

    loop {
        if cancel.is_cancelled() {
            debug!(board = %board.source_url, page_number, "Pagination canceled");
            break;
        }

        let page = api
            .fetch_feed_page(board, board_id, bookmark.as_deref())
            .await?;
        page_number += 1;

        let page_images = images_from_pins(&page.pins);
        debug!(
            board = %board.source_url,
            page_number,
            pins = page.pins.len(),
            images = page_images.len(),
            "Fetched feed page"
        );
        images.extend(page_images);

        match page.bookmark {
            Some(next) => bookmark = Some(next),
            None => break,
        }
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_board_urls() {
        let board = parse_board_url("https://www.pinterest.com/alice/garden/").unwrap();
        assert_eq!(board.username, "alice");
        assert_eq!(board.slug, "garden");
        assert_eq!(board.source_url, "/alice/garden/");

        let no_slash = parse_board_url("https://www.pinterest.com/bob/cozy-rooms").unwrap();
        assert_eq!(no_slash.source_url, "/bob/cozy-rooms/");
    }

    #[test]
    fn test_parse_rejects_non_boards() {
        let invalid = [
            "",
            "https://www.pinterest.com/",
            "https://www.pinterest.com/alice/",
            "https://www.pinterest.com/alice/garden/extra/",
            "http://www.pinterest.com/alice/garden/",
            "https://pinterest.com/alice/garden/",
            "https://www.pinterest.com//garden/",
            "https://www.pinterest.com/alice/garden/?q=1",
            "not a url",
        ];

        for url in invalid {
            assert!(
                matches!(parse_board_url(url), Err(Error::InvalidUrl(_))),
                "accepted {:?}",
                url
            );
        }
    }

    #[test]
    fn test_feed_url_contains_bookmark_only_when_given() {
        let client = PinterestClient::new(&Config::default());
        let board = BoardRef::new("alice", "garden");

        let first = client.board_feed_url(&board, "77", None).unwrap();
        let data = query_data(&first);
        assert_eq!(data["options"]["board_id"], "77");
        assert_eq!(data["options"]["board_url"], "/alice/garden/");
        assert_eq!(data["options"]["page_size"], 25);
        assert!(data["options"].get("bookmarks").is_none());

        let next = client.board_feed_url(&board, "77", Some("B1")).unwrap();
        assert_eq!(query_data(&next)["options"]["bookmarks"], json!(["B1"]));
        assert!(next.path().ends_with(BOARD_FEED_RESOURCE_PATH));
    }

    #[test]
    fn test_board_info_url_options() {
        let client = PinterestClient::new(&Config::default());
        let url = client
            .board_info_url(&BoardRef::new("alice", "garden"))
            .unwrap();

        let source_url = url
            .query_pairs()
            .find(|(k, _)| k == "source_url")
            .map(|(_, v)| v.into_owned());
        assert_eq!(source_url.as_deref(), Some("/alice/garden/"));

        let data = query_data(&url);
        assert_eq!(data["options"]["username"], "alice");
        assert_eq!(data["options"]["slug"], "garden");
        assert_eq!(data["options"]["field_set_key"], "detailed");
    }

    #[test]
    fn test_images_from_pins_skips_videos_and_unusable() {
        let pins: Vec<Pin> = serde_json::from_value(json!([
            { "id": "1", "description": "First", "images": { "orig": { "url": "https://x/1.jpg", "width": 2, "height": 2 } } },
            { "id": "2", "is_video": true, "images": { "orig": { "url": "https://x/2.jpg", "width": 2, "height": 2 } } },
            { "id": "3", "images": { "orig": { "url": "https://x/3.gif", "width": 2, "height": 2 } } },
            { "id": "4", "images": { "orig": { "url": "https://x/4.png", "width": 2, "height": 2 } } }
        ]))
        .unwrap();

        let images = images_from_pins(&pins);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].filename, "First");
        assert_eq!(images[1].filename, "pin-4");
        assert_eq!(images[1].ext, ".png");
    }

    fn query_data(url: &Url) -> Value {
        let raw = url
            .query_pairs()
            .find(|(k, _)| k == "data")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}
