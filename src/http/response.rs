//! Redirect construction.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Build the redirect target for an instance.
///
/// `path_and_query` is the request's original path and query. When
/// `preferences` is set it is appended as a `preferences` parameter.
pub fn build_redirect_url(base: &str, path_and_query: &str, preferences: Option<&str>) -> String {
    let mut target = format!("{}{}", base.trim_end_matches('/'), path_and_query);
    if let Some(preferences) = preferences {
        let separator = if path_and_query.contains('?') { '&' } else { '?' };
        target.push(separator);
        target.push_str("preferences=");
        target.push_str(&urlencoding::encode(preferences));
    }
    target
}

fn redirect_body(location: &str) -> String {
    let href = location.replace('&', "&amp;").replace('"', "&quot;");
    format!(
        "<HTML><HEAD>\
         <meta http-equiv=\"content-type\" content=\"text/html;charset=utf-8\">\
         <TITLE>302 Moved</TITLE></HEAD><BODY>\
         <H1>302 Moved</H1>\
         The document has moved <A HREF=\"{}\">here</A>.\
         </BODY></HTML>",
        href
    )
}

/// 302 to `location` with a small HTML body. Never cached.
pub fn redirect(location: &str) -> Response {
    let Ok(value) = HeaderValue::from_str(location) else {
        tracing::error!(location = %location, "Redirect target is not a valid header value");
        return (StatusCode::BAD_GATEWAY, "Invalid redirect target").into_response();
    };

    (
        StatusCode::FOUND,
        [
            (header::LOCATION, value),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=UTF-8"),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        redirect_body(location),
    )
        .into_response()
}
