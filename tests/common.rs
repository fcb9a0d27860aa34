//! Common test utilities and constants
//!
//! Shared fixtures used across the integration test modules: a scripted
//! board API, a recording download sink and wiremock helpers for the
//! Pinterest resource endpoints.

use async_trait::async_trait;
use parking_lot::Mutex;
use pinfetch::prelude::*;
use pinfetch::{Error, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use wiremock::{Match, Request as MockRequest};

#[allow(dead_code)]
pub const BOARD_URL: &str = "https://www.pinterest.com/alice/garden/";
#[allow(dead_code)]
pub const SOURCE_URL: &str = "/alice/garden/";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Config with no pauses and a short teardown, pointed at `api_base`.
#[allow(dead_code)]
pub fn fast_config(api_base: &str) -> Config {
    ConfigBuilder::default()
        .api_base(api_base)
        .pause_ceiling_ms(0u64)
        .teardown_delay_ms(50u64)
        .build()
        .unwrap()
}

/// A feed record with one JPEG variant.
#[allow(dead_code)]
pub fn pin_json(id: &str, description: &str, url: &str) -> Value {
    json!({
        "id": id,
        "description": description,
        "images": {
            "236x": { "url": url.replace(".jpg", "_small.jpg"), "width": 236, "height": 300 },
            "orig": { "url": url, "width": 1000, "height": 1270 }
        }
    })
}

/// Wraps feed records the way the feed endpoint does.
#[allow(dead_code)]
pub fn feed_body(pins: Vec<Value>, bookmark: Option<&str>) -> Value {
    json!({
        "resource_response": {
            "status": "success",
            "data": pins,
            "bookmark": bookmark
        }
    })
}

#[allow(dead_code)]
pub fn board_body(id: Option<&str>, name: Option<&str>) -> Value {
    json!({
        "resource_response": {
            "status": "success",
            "data": { "id": id, "name": name }
        }
    })
}

/// Matches feed requests by the bookmark inside the `data` query parameter.
#[allow(dead_code)]
pub struct FeedBookmark(pub Option<&'static str>);

impl Match for FeedBookmark {
    fn matches(&self, request: &MockRequest) -> bool {
        let data = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "data")
            .and_then(|(_, v)| serde_json::from_str::<Value>(&v).ok());

        match data {
            Some(data) => data["options"]["bookmarks"][0].as_str() == self.0,
            None => false,
        }
    }
}

/// Scripted [`BoardApi`]: page `n` is served for bookmark `B<n>` (none for page 0).
#[allow(dead_code)]
pub struct FakeBoard {
    pub info: Option<BoardInfo>,
    pub pages: Vec<Vec<Value>>,
    pub fail_page: Option<(usize, u16)>,
    pub cancel_after_page: Option<(usize, CancellationToken)>,
    pub requests: Mutex<Vec<Option<String>>>,
}

#[allow(dead_code)]
impl FakeBoard {
    pub fn new(name: &str, pages: Vec<Vec<Value>>) -> Self {
        Self {
            info: Some(BoardInfo {
                id: "900".to_string(),
                name: name.to_string(),
            }),
            pages,
            fail_page: None,
            cancel_after_page: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `pages` pages of `per_page` downloadable pins each, named `p<page>-<n>`.
    pub fn with_images(name: &str, pages: usize, per_page: usize) -> Self {
        let pages = (0..pages)
            .map(|page| {
                (0..per_page)
                    .map(|n| {
                        let id = format!("p{}-{}", page, n);
                        pin_json(&id, &id, &format!("https://i.pinimg.com/originals/{}.jpg", id))
                    })
                    .collect()
            })
            .collect();
        Self::new(name, pages)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl BoardApi for FakeBoard {
    async fn fetch_board_info(&self, board: &BoardRef) -> Result<BoardInfo> {
        self.info
            .clone()
            .ok_or_else(|| Error::board_not_found(board.source_url.clone()))
    }

    async fn fetch_feed_page(
        &self,
        _board: &BoardRef,
        _board_id: &str,
        bookmark: Option<&str>,
    ) -> Result<FeedPage> {
        self.requests.lock().push(bookmark.map(str::to_string));

        let index = match bookmark {
            None => 0,
            Some(b) => b.trim_start_matches('B').parse::<usize>().unwrap(),
        };

        if let Some((page, status)) = self.fail_page {
            if page == index {
                return Err(Error::feed_fetch(status));
            }
        }

        let pins = self.pages[index]
            .iter()
            .map(|v| serde_json::from_value::<Pin>(v.clone()).unwrap())
            .collect();

        if let Some((page, token)) = &self.cancel_after_page {
            if *page == index {
                token.cancel();
            }
        }

        let bookmark = (index + 1 < self.pages.len()).then(|| format!("B{}", index + 1));
        Ok(FeedPage { pins, bookmark })
    }
}

/// Sink that records requests, optionally waiting on a gate or failing.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingSink {
    pub requests: Mutex<Vec<DownloadRequest>>,
    pub gate: Option<Arc<Semaphore>>,
    pub fail_at: Option<usize>,
}

#[allow(dead_code)]
impl RecordingSink {
    /// A sink letting `permits` downloads through before blocking.
    pub fn gated(permits: usize) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(permits));
        let sink = Self {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        (sink, gate)
    }

    pub fn filenames(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.filename.clone())
            .collect()
    }
}

#[async_trait]
impl DownloadSink for RecordingSink {
    async fn download(&self, request: DownloadRequest) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let index = {
            let mut requests = self.requests.lock();
            requests.push(request);
            requests.len() - 1
        };

        if self.fail_at == Some(index) {
            return Err(Error::sink("rejected"));
        }
        Ok(())
    }
}

/// Waits for the next terminal event, collecting everything received.
#[allow(dead_code)]
pub async fn collect_until_terminal(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
) -> Vec<Event> {
    let mut seen = Vec::new();
    let run = async {
        loop {
            let event = events.recv().await.unwrap();
            let terminal = event.is_terminal();
            seen.push(event);
            if terminal {
                break;
            }
        }
    };
    tokio::time::timeout(TEST_TIMEOUT, run)
        .await
        .expect("session did not finish in time");
    seen
}
