//! Virtual host mappings: serve a host name from a local folder.
//!
//! A mapping for `appassets.example` makes
//! `wvhost://appassets.example/index.html` resolve to
//! `{folder}/index.html`. On Windows the engine sees the rewritten form
//! `https://wvhost.appassets.example/index.html`; both are accepted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use url::Url;
use webview_dll_common::{AccessKind, Result, ShimError};

/// Custom protocol scheme under which mapped hosts are served.
pub const VIRTUAL_HOST_SCHEME: &str = "wvhost";

/// Host reserved for serving a view's page scripts. Cannot be mapped.
pub const PAGE_SCRIPTS_HOST: &str = "webview.init";

/// Extract the lowercase host from a bare host name or a URL.
///
/// `https://AppAssets.example:443/sub/` and `appassets.example` both yield
/// `appassets.example`.
pub fn host_from_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("http://{trimmed}"))
    };
    let host = parsed
        .ok()
        .and_then(|u| u.host_str().map(normalize_host))
        .unwrap_or_default();
    if host.is_empty() {
        return Err(ShimError::InvalidArgument(format!(
            "no host name in {url:?}"
        )));
    }
    Ok(host)
}

/// Lowercase and strip the scheme prefix WebView2 adds to custom hosts.
fn normalize_host(host: &str) -> String {
    let lower = host.to_ascii_lowercase();
    let prefix = format!("{VIRTUAL_HOST_SCHEME}.");
    match lower.strip_prefix(&prefix) {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

/// Normalized host of a request URI, `wvhost://host/` or the WebView2
/// form `https://wvhost.host/`.
pub fn request_host(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    url.host_str().map(normalize_host).filter(|h| !h.is_empty())
}

/// Where a virtual host request came from, read from its headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestSource<'a> {
    pub origin: Option<&'a str>,
    pub referer: Option<&'a str>,
    /// `Sec-Fetch-Site`
    pub fetch_site: Option<&'a str>,
    /// `Sec-Fetch-Mode`
    pub fetch_mode: Option<&'a str>,
}

impl RequestSource<'_> {
    /// True if the request was made by a document outside `host`.
    /// Navigations are never cross-origin resource access.
    fn is_cross_origin(&self, host: &str) -> bool {
        if self.fetch_mode == Some("navigate") {
            return false;
        }
        if let Some(origin) = self.origin {
            return is_foreign(origin, host);
        }
        if matches!(self.fetch_site, Some("cross-site") | Some("same-site")) {
            return true;
        }
        self.referer.is_some_and(|referer| is_foreign(referer, host))
    }
}

fn is_foreign(source: &str, host: &str) -> bool {
    if source == "null" {
        return true;
    }
    match Url::parse(source) {
        Ok(url) => url.host_str().map(normalize_host).as_deref() != Some(host),
        Err(_) => true,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMapping {
    pub folder: PathBuf,
    pub access: AccessKind,
}

/// Response for one virtual host request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResponse {
    pub status: u16,
    pub mime: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl HostResponse {
    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            mime: "text/plain",
            headers: Vec::new(),
            body: message.as_bytes().to_vec(),
        }
    }
}

/// Host name -> folder mappings of one view.
#[derive(Debug, Clone, Default)]
pub struct VirtualHostTable {
    hosts: HashMap<String, HostMapping>,
}

impl VirtualHostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `host` to `folder`, replacing an earlier mapping of the host.
    pub fn insert(&mut self, host: &str, folder: impl Into<PathBuf>, access: AccessKind) {
        self.hosts.insert(
            normalize_host(host),
            HostMapping {
                folder: folder.into(),
                access,
            },
        );
    }

    pub fn get(&self, host: &str) -> Option<&HostMapping> {
        self.hosts.get(&normalize_host(host))
    }

    /// Point an `http(s)` URL under a mapped host at the custom scheme.
    /// `None` when the URL is not under a mapped host. Port and user info
    /// are dropped.
    pub fn rewrite_url(&self, url: &str) -> Option<String> {
        let url = Url::parse(url.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = normalize_host(url.host_str()?);
        self.get(&host)?;
        let mut target = format!("{VIRTUAL_HOST_SCHEME}://{host}{}", url.path());
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            target.push('#');
            target.push_str(fragment);
        }
        Some(target)
    }

    /// Serve a request URI.
    pub fn resolve(&self, uri: &str, source: &RequestSource<'_>) -> HostResponse {
        let Some((host, path)) = split_request_uri(uri) else {
            return HostResponse::error(400, "Bad Request");
        };
        let Some(mapping) = self.get(&host) else {
            return HostResponse::error(404, "Not Found");
        };

        if mapping.access == AccessKind::Deny && source.is_cross_origin(&host) {
            return HostResponse::error(403, "Forbidden");
        }

        let Some((file, data)) = read_within(&mapping.folder, &path) else {
            return HostResponse::error(404, "Not Found");
        };

        let mut headers = Vec::new();
        if mapping.access == AccessKind::Allow {
            headers.push(("Access-Control-Allow-Origin", "*".to_string()));
        }
        HostResponse {
            status: 200,
            mime: mime_from_extension(&file),
            headers,
            body: data,
        }
    }
}

/// Split `wvhost://host/path?q` or `https://wvhost.host/path` into a
/// normalized host and a decoded relative path.
fn split_request_uri(uri: &str) -> Option<(String, String)> {
    let url = Url::parse(uri).ok()?;
    let host = normalize_host(url.host_str()?);
    if host.is_empty() {
        return None;
    }
    let segments: Vec<String> = url
        .path_segments()
        .into_iter()
        .flatten()
        .map(|segment| urlencoding::decode(segment).map(|s| s.into_owned()))
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    let path = segments.join("/");
    let path = if path.is_empty() || path.ends_with('/') {
        format!("{path}index.html")
    } else {
        path
    };
    Some((host, path))
}

/// Read `path` relative to `folder`, refusing anything that resolves
/// outside the folder (`..`, absolute paths, symlinks).
fn read_within(folder: &Path, path: &str) -> Option<(PathBuf, Vec<u8>)> {
    let canonical_base = std::fs::canonicalize(folder).ok()?;
    let canonical_file = std::fs::canonicalize(folder.join(path)).ok()?;
    if !canonical_file.starts_with(&canonical_base) || !canonical_file.is_file() {
        return None;
    }
    let data = std::fs::read(&canonical_file).ok()?;
    Some((canonical_file, data))
}

/// Guess MIME type from file extension.
fn mime_from_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") | Some("mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("wasm") => "application/wasm",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        Some("xml") => "application/xml",
        _ => "application/octet-stream",
    }
}
