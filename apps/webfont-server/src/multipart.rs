//! Multipart request parsing for the convert endpoint
//!
//! Browsers and form libraries disagree on how a multi-select is sent:
//! `formats=a&formats=b`, `formats[]=a`, a single comma separated value or
//! a singular `format` field. All of them are merged here into one ordered
//! list before the request reaches the packager.

use axum::extract::{multipart::MultipartError, Multipart};
use tracing::debug;
use webfont_core::{FontUpload, OutputFormat, SourceFormat};

/// Field carrying the font upload
const FILE_FIELD: &str = "file";

/// Fields carrying format selections
const FORMAT_FIELDS: [&str; 3] = ["formats", "formats[]", "format"];

/// A parsed convert request
#[derive(Debug, Default)]
pub struct ConvertRequest {
    pub upload: Option<FontUpload>,
    pub formats: Vec<OutputFormat>,
}

/// Read every field of the multipart body.
///
/// The `file` field wins; otherwise the first field that carries a filename
/// is taken as the upload. A file input left empty by the browser (no
/// filename, no bytes) counts as no upload at all. An upload with an
/// unsupported extension is returned without its bytes.
pub async fn read_convert_request(mut multipart: Multipart) -> Result<ConvertRequest, MultipartError> {
    let mut upload = None;
    let mut fallback = None;
    let mut format_values = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        if FORMAT_FIELDS.contains(&name.as_str()) {
            format_values.push(field.text().await?);
            continue;
        }

        let is_file_field = name == FILE_FIELD;
        if !is_file_field && (file_name.is_none() || fallback.is_some()) {
            debug!(field = %name, "Ignoring multipart field");
            continue;
        }

        let file_name = file_name.unwrap_or_default();
        let file = if has_unsupported_extension(&file_name) {
            // Left unread: the extension error must win over the body limit
            debug!(field = %name, file_name = %file_name, "Skipping body of unsupported upload");
            let file = FontUpload::new(file_name, Vec::new());
            if is_file_field {
                return Ok(ConvertRequest {
                    upload: Some(file),
                    formats: collect_format_ids(&format_values),
                });
            }
            file
        } else {
            let bytes = field.bytes().await?;
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            FontUpload::new(file_name, bytes.to_vec())
        };

        if is_file_field {
            upload = Some(file);
        } else {
            fallback = Some(file);
        }
    }

    Ok(ConvertRequest {
        upload: upload.or(fallback),
        formats: collect_format_ids(&format_values),
    })
}

/// A named upload whose extension is not a source font
fn has_unsupported_extension(file_name: &str) -> bool {
    !file_name.is_empty() && SourceFormat::from_filename(file_name).is_none()
}

/// Parse format selections in arrival order, splitting comma separated values.
///
/// Unknown identifiers are dropped. Duplicates are kept; the packager
/// removes them.
pub fn collect_format_ids<S: AsRef<str>>(values: &[S]) -> Vec<OutputFormat> {
    values
        .iter()
        .flat_map(|value| value.as_ref().split(','))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter_map(|id| match id.parse::<OutputFormat>() {
            Ok(format) => Some(format),
            Err(err) => {
                debug!(id, error = %err, "Ignoring unknown output format");
                None
            }
        })
        .collect()
}
