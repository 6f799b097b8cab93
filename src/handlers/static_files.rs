use crate::models::HealthResponse;
use crate::settings::WinnerSettings;
use crate::utils::responses::ResponseBuilder;
use actix_web::{web, HttpResponse};
use log::debug;
use std::path::Path;

/// Health check endpoint
pub async fn health() -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Twitter Winner is running".to_string(),
    };
    ResponseBuilder::ok().json(&response)
}

/// Serve static files from the configured assets folder
pub async fn serve_static(
    path: web::Path<String>,
    settings: web::Data<WinnerSettings>,
) -> HttpResponse {
    let filename = path.into_inner();
    if !is_safe_path(&filename) {
        debug!("Rejected static file path: {filename}");
        return ResponseBuilder::not_found().build();
    }

    let file_path = Path::new(&settings.static_files.assets_folder).join(&filename);
    debug!("Attempting to serve static file: {}", file_path.display());

    match tokio::fs::read(&file_path).await {
        Ok(contents) => HttpResponse::Ok()
            .content_type(content_type_for(&filename))
            .body(contents),
        Err(_) => {
            debug!("Static file not found: {}", file_path.display());
            ResponseBuilder::not_found().build()
        }
    }
}

/// Relative path made of plain segments only
fn is_safe_path(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('/')
        && !filename.contains('\\')
        && filename
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "text/plain",
    }
}
