//! Serving mapped virtual hosts through a wry custom protocol.

use std::borrow::Cow;

use tracing::warn;
use webview_dll_core::{
    HostResponse, PageScripts, RequestSource, PAGE_SCRIPTS_HOST, VIRTUAL_HOST_SCHEME,
};
use wry::http::{header, Request, Response, StatusCode};

fn header_str<'a>(request: &'a Request<Vec<u8>>, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

/// Headers that tell where a request came from.
pub fn request_source(request: &Request<Vec<u8>>) -> RequestSource<'_> {
    RequestSource {
        origin: header_str(request, header::ORIGIN.as_str()),
        referer: header_str(request, header::REFERER.as_str()),
        fetch_site: header_str(request, "sec-fetch-site"),
        fetch_mode: header_str(request, "sec-fetch-mode"),
    }
}

/// URL the page scripts loader fetches.
pub fn page_scripts_url() -> String {
    platform_url(format!(
        "{VIRTUAL_HOST_SCHEME}://{PAGE_SCRIPTS_HOST}/scripts.json"
    ))
}

/// The view's page scripts as a JSON array, readable from any origin.
pub fn page_scripts_response(scripts: &PageScripts) -> Response<Cow<'static, [u8]>> {
    to_http(HostResponse {
        status: 200,
        mime: "application/json",
        headers: vec![
            ("Access-Control-Allow-Origin", "*".to_string()),
            ("Cache-Control", "no-store".to_string()),
        ],
        body: scripts.to_json().into_bytes(),
    })
}

pub fn to_http(response: HostResponse) -> Response<Cow<'static, [u8]>> {
    let mut builder = Response::builder()
        .status(response.status)
        .header(header::CONTENT_TYPE, response.mime);
    for (name, value) in &response.headers {
        builder = builder.header(*name, value.as_str());
    }
    builder.body(Cow::Owned(response.body)).unwrap_or_else(|e| {
        warn!(error = %e, "virtual host response rejected");
        let mut fallback = Response::new(Cow::Borrowed(&b"Internal Server Error"[..]));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

/// Form of a custom-scheme URL the platform webview actually loads.
/// WebView2 exposes custom schemes as `https://<scheme>.<host>/`.
pub fn platform_url(url: String) -> String {
    if cfg!(target_os = "windows") {
        windows_url(&url).unwrap_or(url)
    } else {
        url
    }
}

fn windows_url(url: &str) -> Option<String> {
    let rest = url.strip_prefix(VIRTUAL_HOST_SCHEME)?.strip_prefix("://")?;
    Some(format!("https://{VIRTUAL_HOST_SCHEME}.{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use webview_dll_common::AccessKind;
    use webview_dll_core::VirtualHostTable;

    #[test]
    fn source_headers_are_read() {
        let request = Request::builder()
            .uri("wvhost://app.local/index.html")
            .header("Origin", "https://evil.example")
            .header("Referer", "https://evil.example/page")
            .header("Sec-Fetch-Site", "cross-site")
            .header("Sec-Fetch-Mode", "cors")
            .body(Vec::new())
            .unwrap();
        assert_eq!(
            request_source(&request),
            RequestSource {
                origin: Some("https://evil.example"),
                referer: Some("https://evil.example/page"),
                fetch_site: Some("cross-site"),
                fetch_mode: Some("cors"),
            }
        );

        let bare = Request::builder()
            .uri("wvhost://app.local/")
            .body(Vec::new())
            .unwrap();
        assert_eq!(request_source(&bare), RequestSource::default());
    }

    #[test]
    fn foreign_image_without_origin_is_refused_under_deny() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let mut table = VirtualHostTable::new();
        table.insert("app.local", dir.path(), AccessKind::Deny);

        let request = Request::builder()
            .uri("wvhost://app.local/logo.png")
            .header("Referer", "https://evil.example/")
            .body(Vec::new())
            .unwrap();
        let response = to_http(table.resolve(
            &request.uri().to_string(),
            &request_source(&request),
        ));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn page_scripts_are_served_as_json() {
        let scripts = PageScripts::default();
        scripts.add("window.ready = true;");
        let response = page_scripts_response(&scripts);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
        assert_eq!(&response.body()[..], br#"["window.ready = true;"]"#);
    }

    #[test]
    fn page_scripts_url_is_on_reserved_host() {
        let url = page_scripts_url();
        assert_eq!(
            webview_dll_core::virtual_host::request_host(&url).as_deref(),
            Some(PAGE_SCRIPTS_HOST)
        );
    }

    #[test]
    fn response_carries_status_type_and_headers() {
        let response = to_http(HostResponse {
            status: 200,
            mime: "text/html",
            headers: vec![("Access-Control-Allow-Origin", "*".to_string())],
            body: b"<p>ok</p>".to_vec(),
        });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
        assert_eq!(&response.body()[..], b"<p>ok</p>");
    }

    #[test]
    fn served_file_reaches_http_response() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "main()").unwrap();
        let mut table = VirtualHostTable::new();
        table.insert("app.local", dir.path(), AccessKind::Allow);

        let response = to_http(table.resolve("wvhost://app.local/app.js", &RequestSource::default()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&response.body()[..], b"main()");
    }

    #[test]
    fn windows_form_of_custom_url() {
        assert_eq!(
            windows_url("wvhost://app.local/index.html").as_deref(),
            Some("https://wvhost.app.local/index.html")
        );
        assert_eq!(windows_url("https://app.local/"), None);
    }
}
