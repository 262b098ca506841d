use crate::http::{Response, StatusCode};
use crate::router::StaticMount;
use crate::{Failure, Request};

use std::io;
use std::path::{Component, Path, PathBuf};

/// Read the file `req` addresses below `mount` and build a response for it.
pub(crate) async fn serve(mount: &StaticMount, req: &Request) -> Result<Response, Failure> {
    let relative = urlencoding::decode(mount.relative(req.path()))
        .map_err(|err| Failure::decode("path decode error", err))?;

    let path = map_path(&mount.directory, &relative)
        .ok_or_else(|| Failure::NotFound(format!("{} is outside the static root", req.path())))?;

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(Failure::NotFound(format!("{} not found", req.path()))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Failure::NotFound(format!("{} not found", req.path())));
        }
        Err(err) => return Err(err.into()),
    }
    let content = tokio::fs::read(&path).await?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "serving static file");

    let response = Response::new(StatusCode::OK)
        .header("Content-Type", content_type(&path))
        .body(content);

    Ok(match &mount.handler {
        Some(handler) => handler(response, req),
        None => response,
    })
}

/// Join `relative` onto `root`, rejecting anything but plain components.
fn map_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => path.push(segment),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
