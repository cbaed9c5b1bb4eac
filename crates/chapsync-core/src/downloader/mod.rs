//! HTTP side of a chapter download.
//!
//! `HttpClient` carries the transport policy (timeouts, user agent) chosen by
//! the caller and hands out configured curl handles. `resolve` performs the
//! per-chapter distribution lookup and `page` streams one page image to disk.
//! Everything here is blocking; async callers go through `spawn_blocking`.

mod error;
pub mod page;
pub mod resolve;

pub use error::{ResolveError, TransferError};
pub use page::{fetch_page, page_file_name, page_url};
pub use resolve::{resolve_distribution, resolve_url};

use crate::config::HttpConfig;
use std::time::Duration;

/// Ready-made HTTP client. Cheap to clone; each request gets a fresh curl handle.
#[derive(Debug, Clone)]
pub struct HttpClient {
    connect_timeout: Duration,
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(&HttpConfig::default())
    }
}

impl HttpClient {
    pub fn new(cfg: &HttpConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            timeout: cfg.timeout(),
            user_agent: cfg.user_agent.clone(),
        }
    }

    /// A GET handle for `url` with redirects and the configured timeouts applied.
    pub(crate) fn easy(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        if let Some(ua) = &self.user_agent {
            easy.useragent(ua)?;
        }
        Ok(easy)
    }

    /// GET `url` into memory. Returns the status code and the body.
    pub(crate) fn get_bytes(&self, url: &str) -> Result<(u32, Vec<u8>), curl::Error> {
        let mut body = Vec::new();
        let mut easy = self.easy(url)?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let code = easy.response_code()?;
        Ok((code, body))
    }
}

pub(crate) fn is_success(code: u32) -> bool {
    (200..300).contains(&code)
}
