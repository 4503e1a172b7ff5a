use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

pub const HX_REQUEST: &str = "HX-Request";
pub const HX_REDIRECT: &str = "HX-Redirect";

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Client-side navigation for htmx requests: a `200` carrying `HX-Redirect`.
pub fn hx_redirect(to: &str) -> Response {
    (StatusCode::OK, [(HX_REDIRECT, to)]).into_response()
}

/// `HX-Redirect` when htmx issued the request, a plain `303` otherwise.
pub fn redirect(headers: &HeaderMap, to: &str) -> Response {
    if is_htmx(headers) {
        hx_redirect(to)
    } else {
        Redirect::to(to).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::LOCATION, HeaderValue};

    #[test]
    fn plain_requests_get_see_other() {
        let res = redirect(&HeaderMap::new(), "/login");
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[LOCATION], "/login");
    }

    #[test]
    fn htmx_requests_get_hx_redirect() {
        let mut headers = HeaderMap::new();
        headers.insert(HX_REQUEST, HeaderValue::from_static("true"));
        let res = redirect(&headers, "/login");
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[HX_REDIRECT], "/login");
    }
}
