//! Text and JSON retrieval with optional cache-busting.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;

use crate::error::Error;

/// Raw answer from a transport: a status code and the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Body decoded as UTF-8.
    pub body: String,
    /// HTTP-style status code.
    pub status: u16,
}

impl Response {
    /// A 200 response carrying `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        return Self { body: body.into(), status: 200 };
    }

    /// An empty response with the given status.
    pub const fn status(status: u16) -> Self {
        return Self { body: String::new(), status };
    }

    /// True for 2xx statuses.
    pub const fn is_success(&self) -> bool {
        return self.status >= 200 && self.status < 300;
    }
}

/// Where bytes come from. Implementations must be shareable across the
/// threads `load_all` fetches on.
pub trait Transport: Sync {
    /// Issue one request. An `Err` means no response arrived at all.
    ///
    /// # Errors
    ///
    /// Returns the I/O failure that prevented a response.
    fn get(&self, url: &str) -> std::io::Result<Response>;
}

/// Serves site-relative URLs out of a directory on disk.
/// The query string is ignored, a missing file answers 404, and any `..`
/// component answers 403.
#[derive(Debug, Clone)]
pub struct DirTransport {
    root: PathBuf,
}

impl DirTransport {
    /// Serve files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        return Self { root: root.into() };
    }

    /// Site root this transport reads from.
    pub fn root(&self) -> &Path {
        return &self.root;
    }
}

impl Transport for DirTransport {
    fn get(&self, url: &str) -> std::io::Result<Response> {
        let path = url.split_once('?').map_or(url, |(path, _)| return path);
        let relative = Path::new(path.trim_start_matches('/'));

        if relative.components().any(|c| return !matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Ok(Response::status(403));
        }

        let full = self.root.join(relative);
        if !full.is_file() {
            return Ok(Response::status(404));
        }
        let body = std::fs::read_to_string(&full)?;
        return Ok(Response::ok(body));
    }
}

/// Fetches text and JSON through a transport. No retries; callers decide.
#[derive(Debug)]
pub struct Fetcher<T> {
    /// Last cache-busting stamp handed out, for strict monotonicity.
    last_stamp: AtomicU64,
    transport: T,
}

impl<T: Transport> Fetcher<T> {
    /// Wrap a transport.
    pub const fn new(transport: T) -> Self {
        return Self { last_stamp: AtomicU64::new(0), transport };
    }

    /// The wrapped transport.
    pub const fn transport(&self) -> &T {
        return &self.transport;
    }

    /// Fetch a resource as text. With `bust`, a `t=<millis>` parameter is added.
    ///
    /// # Errors
    ///
    /// Returns `Error::Fetch` when no response arrives or the status is not 2xx.
    pub fn fetch_text(&self, url: &str, bust: bool) -> Result<String, Error> {
        let url = if bust { bust_url(url, self.next_stamp()) } else { url.to_string() };
        let response = self.transport.get(&url).map_err(|e| {
            return Error::Fetch { cause: Some(e.to_string()), status: None, url: url.clone() };
        })?;

        if !response.is_success() {
            return Err(Error::Fetch { cause: None, status: Some(response.status), url });
        }
        return Ok(response.body);
    }

    /// Fetch a resource and decode it as JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Fetch` for transport failures, non-2xx statuses, and
    /// bodies that do not decode into `D`.
    pub fn fetch_json<D: DeserializeOwned>(&self, url: &str, bust: bool) -> Result<D, Error> {
        let body = self.fetch_text(url, bust)?;
        return serde_json::from_str(&body).map_err(|e| {
            return Error::Fetch {
                cause: Some(format!("malformed JSON: {e}")),
                status: None,
                url: url.to_string(),
            };
        });
    }

    /// Milliseconds since the epoch, bumped past the previous stamp so two
    /// busts in the same millisecond still differ.
    fn next_stamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| return u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                return Some(now.max(last.saturating_add(1)));
            })
            .unwrap_or(0);
        return now.max(previous.saturating_add(1));
    }
}

/// Append `t=<stamp>`, using `&` when the URL already carries a query.
pub fn bust_url(url: &str, stamp: u64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    return format!("{url}{separator}t={stamp}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bust_appends_query_or_extends_it() {
        assert_eq!(bust_url("content/about.txt", 42), "content/about.txt?t=42");
        assert_eq!(bust_url("contact-info.json?v=2", 7), "contact-info.json?v=2&t=7");
    }

    #[test]
    fn stamps_strictly_increase() {
        let fetcher = Fetcher::new(DirTransport::new("."));
        let first = fetcher.next_stamp();
        let second = fetcher.next_stamp();
        let third = fetcher.next_stamp();
        assert!(first < second && second < third);
    }

    #[test]
    fn dir_transport_ignores_query_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("content")).unwrap();
        std::fs::write(dir.path().join("content/about.txt"), "# Hi\n").unwrap();
        let transport = DirTransport::new(dir.path());

        assert_eq!(transport.get("content/about.txt?t=9").unwrap(), Response::ok("# Hi\n"));
        assert_eq!(transport.get("/content/about.txt").unwrap().status, 200);
        assert_eq!(transport.get("content/missing.txt").unwrap().status, 404);
        assert_eq!(transport.get("content").unwrap().status, 404);
        assert_eq!(transport.get("../etc/passwd").unwrap().status, 403);
    }

    #[test]
    fn non_success_status_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(DirTransport::new(dir.path()));
        let err = fetcher.fetch_text("content/none.txt", false).unwrap_err();
        assert!(matches!(err, Error::Fetch { status: Some(404), .. }));
    }

    #[test]
    fn malformed_json_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("contact-info.json"), "{ not json").unwrap();
        let fetcher = Fetcher::new(DirTransport::new(dir.path()));
        let err = fetcher
            .fetch_json::<serde_json::Value>("contact-info.json", true)
            .unwrap_err();
        let Error::Fetch { cause: Some(cause), .. } = err else {
            panic!("expected a fetch error with a cause");
        };
        assert!(cause.starts_with("malformed JSON"));
    }
}
