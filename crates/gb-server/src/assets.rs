//! Static files from the public directory (the scene pages themselves).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::response::ApiResponse;

/// Map an already decoded request path onto a file under `root`.
///
/// Returns `None` for paths that would leave `root`. Directory paths resolve
/// to their `index.html`.
pub fn resolve_asset(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    let mut depth = 0_usize;

    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', ':', '\0']) => return None,
            s => {
                path.push(s);
                depth += 1;
            }
        }
    }
    if depth == 0 || url_path.ends_with('/') {
        path.push("index.html");
    }
    Some(path)
}

#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

/// Serve `url_path` from `root`, or a JSON 404.
pub async fn serve(root: &Path, url_path: &str) -> ApiResponse {
    let Some(mut path) = resolve_asset(root, url_path) else {
        tracing::debug!(path = url_path, "rejected asset path");
        return not_found(url_path);
    };
    if tokio::fs::metadata(&path)
        .await
        .is_ok_and(|meta| meta.is_dir())
    {
        path.push("index.html");
    }

    match tokio::fs::read(&path).await {
        Ok(body) => ApiResponse::bytes(200, content_type_for(&path), body),
        Err(err) if err.kind() == ErrorKind::NotFound => not_found(url_path),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read asset");
            ApiResponse::error(500, "asset_unreadable", format!("failed to read {url_path}"))
        }
    }
}

pub fn not_found(url_path: &str) -> ApiResponse {
    ApiResponse::error(404, "not_found", format!("no route for {url_path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_file() {
        let root = Path::new("/srv/public");
        assert_eq!(
            resolve_asset(root, "/a.html"),
            Some(PathBuf::from("/srv/public/a.html"))
        );
    }

    #[test]
    fn directory_gets_index() {
        let root = Path::new("/srv/public");
        assert_eq!(
            resolve_asset(root, "/scenes/"),
            Some(PathBuf::from("/srv/public/scenes/index.html"))
        );
    }

    #[test]
    fn decoded_spaces_are_kept() {
        let root = Path::new("/srv/public");
        assert_eq!(
            resolve_asset(root, "/my page.html"),
            Some(PathBuf::from("/srv/public/my page.html"))
        );
    }

    #[test]
    fn traversal_is_rejected() {
        let root = Path::new("/srv/public");
        assert_eq!(resolve_asset(root, "/../secret"), None);
        assert_eq!(resolve_asset(root, "/img/../../etc/passwd"), None);
        assert_eq!(resolve_asset(root, "/..\\..\\win.ini"), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("c.html")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("bg.PNG")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("bg.png")), "image/png");
    }

    #[tokio::test]
    async fn serves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("c.html"), "<h1>scene c</h1>").unwrap();

        let resp = serve(dir.path(), "/c.html").await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"<h1>scene c</h1>");
        assert_eq!(resp.content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn directory_without_slash_serves_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("scenes")).unwrap();
        std::fs::write(dir.path().join("scenes/index.html"), "index").unwrap();

        let resp = serve(dir.path(), "/scenes").await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"index");
    }

    #[tokio::test]
    async fn missing_file_is_json_404() {
        let dir = tempfile::tempdir().unwrap();
        let resp = serve(dir.path(), "/nope.html").await;
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body_json().unwrap()["error"], "not_found");
    }
}
