//! API handlers for the webfont server
//!
//! Provides REST endpoints for:
//! - Health checks
//! - Listing supported output formats
//! - Converting an uploaded font into a zipped kit

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;
use webfont_core::{OutputFormat, PackError, SourceFormat};

use crate::error::ApiError;
use crate::multipart::read_convert_request;
use crate::AppState;

/// Comma separated ids of the formats present in the archive
pub const FORMATS_HEADER: HeaderName = HeaderName::from_static("x-webfont-formats");

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "webfont-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Format list response
#[derive(Serialize)]
pub struct FormatListResponse {
    pub success: bool,
    pub formats: Vec<FormatInfo>,
    pub default_formats: Vec<OutputFormat>,
    pub max_upload_bytes: usize,
    pub accepted_extensions: Vec<&'static str>,
}

/// Output format metadata
///
/// `extension`, `css_format` and `mime_type` are omitted for
/// `keep-original`, which follows the uploaded file.
#[derive(Serialize)]
pub struct FormatInfo {
    pub id: &'static str,
    pub extension: Option<&'static str>,
    pub css_format: Option<&'static str>,
    pub mime_type: Option<&'static str>,
    pub default: bool,
}

impl From<OutputFormat> for FormatInfo {
    fn from(format: OutputFormat) -> Self {
        let fixed = |value: fn(OutputFormat, SourceFormat) -> &'static str| {
            (format != OutputFormat::Original).then(|| value(format, SourceFormat::TrueType))
        };
        Self {
            id: format.id(),
            extension: fixed(OutputFormat::extension),
            css_format: fixed(OutputFormat::css_format),
            mime_type: fixed(OutputFormat::mime_type),
            default: format.is_default(),
        }
    }
}

/// Handler: GET /api/fonts/formats
pub async fn handle_list_formats(State(state): State<AppState>) -> Json<FormatListResponse> {
    Json(FormatListResponse {
        success: true,
        formats: OutputFormat::ALL.into_iter().map(FormatInfo::from).collect(),
        default_formats: OutputFormat::DEFAULT.to_vec(),
        max_upload_bytes: state.packager.max_upload_bytes(),
        accepted_extensions: SourceFormat::ALL.iter().map(|s| s.extension()).collect(),
    })
}

/// Handler: POST /api/fonts/convert
///
/// Expects a multipart body with the font in `file` and an optional format
/// selection; responds with the ZIP kit as an attachment.
pub async fn handle_convert_font(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let request = read_convert_request(multipart?).await?;

    info!(
        filename = request.upload.as_ref().map(|u| u.filename.as_str()),
        formats = ?request.formats,
        "Convert request"
    );

    let packager = state.packager.clone();
    let output = tokio::task::spawn_blocking(move || packager.pack(request.upload, &request.formats))
        .await
        .map_err(|join_error| {
            PackError::Internal(format!("Conversion task panicked: {}", join_error))
        })??;

    let produced = output
        .formats
        .iter()
        .map(|f| f.id())
        .collect::<Vec<_>>()
        .join(",");

    info!(
        archive = %output.archive_filename,
        bytes = output.archive.len(),
        formats = %produced,
        skipped = output.skipped.len(),
        "Font kit ready"
    );

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", output.archive_filename),
        ),
        (header::CACHE_CONTROL, "no-store".to_string()),
        (FORMATS_HEADER, produced),
    ];

    Ok((headers, output.archive).into_response())
}
