use crate::{
    error::{AvatarError, Result},
    media::mime_for_path,
    server::AppState,
};
use actix_web::{web, HttpRequest, HttpResponse};
use std::path::{Path, PathBuf};

/// Joins `request_path` onto `root` lexically. Any `..` that would climb
/// above `root` is refused instead of clamped.
pub fn resolve_public_path(root: &Path, request_path: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();

    for segment in request_path.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                if !relative.pop() {
                    return Err(AvatarError::Forbidden(request_path.to_string()));
                }
            }
            s if s.contains(':') || s.contains('\0') => {
                return Err(AvatarError::Forbidden(request_path.to_string()));
            }
            s => relative.push(s),
        }
    }

    Ok(root.join(relative))
}

pub async fn serve(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let requested = req.match_info().query("filename");

    let path = match resolve_public_path(&state.config.public_dir, requested) {
        Ok(path) => path,
        Err(e) => {
            log::warn!("Blocked static path {}", e);
            return HttpResponse::Forbidden()
                .content_type("text/plain; charset=utf-8")
                .body("Forbidden");
        }
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(mime_for_path(&path))
            .body(bytes),
        Err(_) => not_found(),
    }
}

/// Anything that is neither an API route nor a GET.
pub async fn fallback() -> HttpResponse {
    not_found()
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/plain; charset=utf-8")
        .body("Not found")
}
