//! Runtime configuration for the board downloader.
//!
//! [`Config`] carries every tunable the client and the session use. The
//! defaults reproduce the behavior of the browser extension: 25 pins per
//! feed page, a random pause of up to two seconds between files, and a
//! two second grace period before a finished session is forgotten.
//!
//! # Examples
//!
//! ```rust
//! use pinfetch::config::{Config, ConfigBuilder};
//!
//! let config = ConfigBuilder::default()
//!     .pause_ceiling_ms(0u64)
//!     .cookie(Some("_pinterest_sess=abc".to_string()))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.page_size, 25);
//! assert_eq!(config.pause_ceiling_ms, 0);
//! ```

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API origin.
pub const DEFAULT_API_BASE: &str = "https://www.pinterest.com";

/// Name used for the target directory when the board has none.
pub const DEFAULT_BOARD_NAME: &str = "Pinterest Board";

/// Value of the `x-pinterest-pws-handler` header sent with every API call.
pub const PWS_HANDLER: &str = "www/[username]/[slug].js";

/// Settings shared by the HTTP client and the download session.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
pub struct Config {
    /// Origin the resource endpoints are requested from, without trailing slash
    pub api_base: String,

    /// Pins requested per feed page
    pub page_size: u32,

    /// Upper bound of the random pause between two files, in milliseconds
    pub pause_ceiling_ms: u64,

    /// How long a finished session stays readable, in milliseconds
    pub teardown_delay_ms: u64,

    /// Directory name used when the board resource has no name
    pub default_board_name: String,

    pub pws_handler: String,

    /// Raw `Cookie` header carrying the Pinterest session, if any
    pub cookie: Option<String>,

    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: 25,
            pause_ceiling_ms: 2000,
            teardown_delay_ms: 2000,
            default_board_name: DEFAULT_BOARD_NAME.to_string(),
            pws_handler: PWS_HANDLER.to_string(),
            cookie: None,
            user_agent: concat!("pinfetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    pub fn pause_ceiling(&self) -> Duration {
        Duration::from_millis(self.pause_ceiling_ms)
    }

    pub fn teardown_delay(&self) -> Duration {
        Duration::from_millis(self.teardown_delay_ms)
    }
}
