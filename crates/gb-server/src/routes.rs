//! Request routing.
//!
//! Scene endpoints are matched generically: `/api/{s}-entries` and
//! `/api/{s}-entry` for any `s`, with the scene validated after matching so a
//! bad symbol is reported as such instead of as an unknown path.

use gb_core::{CoreError, Scene};
use tiny_http::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /`
    Health,
    /// `OPTIONS` on any path.
    Preflight,
    /// `GET /api/{s}-entries`
    ListEntries(Scene),
    /// `POST /api/{s}-entry`
    AppendEntry(Scene),
    /// A scene endpoint with a symbol outside the alphabet.
    InvalidScene(CoreError),
    /// Any other `GET` or `HEAD`, served from the public directory.
    /// Carries the decoded path.
    Asset(String),
    MethodNotAllowed,
    NotFound,
}

/// Map a method and raw request URL to a route.
///
/// The path is percent-decoded once here; every route sees decoded text.
pub fn resolve(method: &Method, url: &str) -> Route {
    if *method == Method::Options {
        return Route::Preflight;
    }

    let raw_path = url.split(['?', '#']).next().unwrap_or_default();
    let Ok(decoded) = urlencoding::decode(raw_path) else {
        return Route::NotFound;
    };
    let path: &str = &decoded;

    if let Some(rest) = path.strip_prefix("/api/") {
        return resolve_api(method, rest);
    }
    match (method, path) {
        (Method::Get | Method::Head, "/") => Route::Health,
        (Method::Get | Method::Head, _) => Route::Asset(path.to_string()),
        (_, "/") => Route::MethodNotAllowed,
        _ => Route::NotFound,
    }
}

fn resolve_api(method: &Method, rest: &str) -> Route {
    let (raw_scene, is_listing) = if let Some(raw) = rest.strip_suffix("-entries") {
        (raw, true)
    } else if let Some(raw) = rest.strip_suffix("-entry") {
        (raw, false)
    } else {
        return Route::NotFound;
    };

    let scene = match Scene::normalize(raw_scene) {
        Ok(scene) => scene,
        Err(err) => return Route::InvalidScene(err),
    };

    match (is_listing, method) {
        (true, Method::Get) => Route::ListEntries(scene),
        (false, Method::Post) => Route::AppendEntry(scene),
        _ => Route::MethodNotAllowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Method::Get, "/", Route::Health)]
    #[case(Method::Get, "/api/a-entries", Route::ListEntries(Scene::A))]
    #[case(Method::Get, "/api/j-entries?since=0", Route::ListEntries(Scene::J))]
    #[case(Method::Get, "/api/C-entries", Route::ListEntries(Scene::C))]
    #[case(Method::Post, "/api/c-entry", Route::AppendEntry(Scene::C))]
    #[case(Method::Options, "/api/c-entry", Route::Preflight)]
    #[case(Method::Get, "/a.html", Route::Asset("/a.html".into()))]
    #[case(Method::Head, "/a.html?v=2", Route::Asset("/a.html".into()))]
    #[case(Method::Get, "/api/%63-entries", Route::ListEntries(Scene::C))]
    #[case(Method::Post, "/api/%63-entry", Route::AppendEntry(Scene::C))]
    #[case(Method::Get, "/my%20page.html", Route::Asset("/my page.html".into()))]
    #[case(Method::Get, "/img/%2e%2e/x", Route::Asset("/img/../x".into()))]
    #[case(Method::Get, "/%ff.html", Route::NotFound)]
    #[case(Method::Post, "/api/c-entries", Route::MethodNotAllowed)]
    #[case(Method::Get, "/api/c-entry", Route::MethodNotAllowed)]
    #[case(Method::Delete, "/", Route::MethodNotAllowed)]
    #[case(Method::Get, "/api/entries", Route::NotFound)]
    #[case(Method::Get, "/api/status", Route::NotFound)]
    #[case(Method::Post, "/upload", Route::NotFound)]
    fn resolves(#[case] method: Method, #[case] url: &str, #[case] expected: Route) {
        assert_eq!(resolve(&method, url), expected);
    }

    #[rstest]
    #[case(Method::Get, "/api/z-entries")]
    #[case(Method::Post, "/api/z-entry")]
    #[case(Method::Get, "/api/ab-entries")]
    #[case(Method::Get, "/api/-entries")]
    fn rejects_bad_scene_symbols(#[case] method: Method, #[case] url: &str) {
        assert!(matches!(
            resolve(&method, url),
            Route::InvalidScene(CoreError::InvalidScene(_))
        ));
    }
}
