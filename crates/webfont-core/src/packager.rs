//! Upload validation and kit assembly

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::archive::build_archive;
use crate::canonical::to_truetype;
use crate::encode::{EncodeInput, EncoderRegistry};
use crate::error::PackError;
use crate::format::{OutputFormat, SourceFormat};
use crate::naming::FontNames;
use crate::stylesheet::{render_stylesheet, StylesheetSource};

/// 5 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const STYLESHEET_FILENAME: &str = "stylesheet.css";

/// A font file as received from the client
#[derive(Debug, Clone)]
pub struct FontUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl FontUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// One produced file of the kit
#[derive(Debug, Clone)]
pub struct Artifact {
    pub format: OutputFormat,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub css_format: &'static str,
}

/// A requested format that could not be produced
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFormat {
    pub format: OutputFormat,
    pub reason: String,
}

/// Everything that goes into the archive
#[derive(Debug, Clone)]
pub struct FontPackage {
    pub base_name: String,
    pub display_name: String,
    /// Produced artifacts in stylesheet priority order
    pub artifacts: Vec<Artifact>,
    pub stylesheet: String,
    pub skipped: Vec<SkippedFormat>,
}

impl FontPackage {
    pub fn formats(&self) -> Vec<OutputFormat> {
        self.artifacts.iter().map(|a| a.format).collect()
    }

    pub fn archive_filename(&self) -> String {
        format!("{}-webfont.zip", self.base_name)
    }
}

#[derive(Debug, Clone)]
pub struct PackOutput {
    pub archive: Vec<u8>,
    pub archive_filename: String,
    pub formats: Vec<OutputFormat>,
    pub skipped: Vec<SkippedFormat>,
}

/// The font packaging pipeline
pub struct FontPackager {
    registry: EncoderRegistry,
    max_upload_bytes: usize,
}

impl FontPackager {
    pub fn new(registry: EncoderRegistry, max_upload_bytes: usize) -> Self {
        Self {
            registry,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Check presence, extension and size without touching the font data
    pub fn validate<'a>(
        &self,
        upload: Option<&'a FontUpload>,
    ) -> Result<(&'a FontUpload, SourceFormat), PackError> {
        let upload = upload.ok_or(PackError::MissingFile)?;
        let source = SourceFormat::from_filename(&upload.filename)
            .ok_or_else(|| PackError::UnsupportedFormat(upload.filename.clone()))?;
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(PackError::FileTooLarge {
                size: upload.bytes.len(),
                limit: self.max_upload_bytes,
            });
        }
        Ok((upload, source))
    }

    /// Convert an upload into the kit contents
    pub fn build(
        &self,
        upload: Option<&FontUpload>,
        formats: &[OutputFormat],
    ) -> Result<FontPackage, PackError> {
        let (upload, source) = self.validate(upload)?;
        let formats = normalize_formats(formats);
        let names = FontNames::from_filename(&upload.filename);

        info!(
            filename = %upload.filename,
            size = upload.bytes.len(),
            source = source.extension(),
            formats = ?formats,
            "Packaging font"
        );

        let truetype = to_truetype(&upload.bytes).map_err(PackError::CanonicalConversion)?;
        let input = EncodeInput {
            truetype: &truetype,
            original: &upload.bytes,
            source,
            names: &names,
        };

        let mut artifacts = Vec::with_capacity(formats.len());
        let mut skipped = Vec::new();
        for format in formats {
            match self.registry.encode(format, &input) {
                Ok(bytes) => artifacts.push(Artifact {
                    format,
                    filename: format!("{}.{}", names.base_name, format.extension(source)),
                    bytes,
                    css_format: format.css_format(source),
                }),
                Err(err) => {
                    warn!(format = %format, error = %err, "Skipping format");
                    skipped.push(SkippedFormat {
                        format,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if artifacts.is_empty() {
            return Err(PackError::NoOutput);
        }
        artifacts.sort_by_key(|a| a.format);

        let sources: Vec<StylesheetSource<'_>> = artifacts
            .iter()
            .map(|a| StylesheetSource {
                format: a.format,
                filename: &a.filename,
                css_format: a.css_format,
            })
            .collect();
        let stylesheet = render_stylesheet(&names, &sources);

        Ok(FontPackage {
            base_name: names.base_name,
            display_name: names.display_name,
            artifacts,
            stylesheet,
            skipped,
        })
    }

    /// Validate, convert and zip an upload
    pub fn pack(
        &self,
        upload: Option<FontUpload>,
        formats: &[OutputFormat],
    ) -> Result<PackOutput, PackError> {
        let package = self.build(upload.as_ref(), formats)?;

        let entries = package
            .artifacts
            .iter()
            .map(|a| (a.filename.as_str(), a.bytes.as_slice()))
            .chain(std::iter::once((
                STYLESHEET_FILENAME,
                package.stylesheet.as_bytes(),
            )));
        let archive = build_archive(entries).map_err(|e| PackError::Internal(e.to_string()))?;

        debug!(
            archive_bytes = archive.len(),
            skipped = package.skipped.len(),
            "Built font kit archive"
        );

        Ok(PackOutput {
            archive,
            archive_filename: package.archive_filename(),
            formats: package.formats(),
            skipped: package.skipped,
        })
    }
}

impl Default for FontPackager {
    fn default() -> Self {
        Self::new(EncoderRegistry::native(), DEFAULT_MAX_UPLOAD_BYTES)
    }
}

/// Drop duplicates (first occurrence wins); an empty selection means the defaults
pub fn normalize_formats(formats: &[OutputFormat]) -> Vec<OutputFormat> {
    let mut unique: Vec<OutputFormat> = Vec::with_capacity(formats.len());
    for &format in formats {
        if !unique.contains(&format) {
            unique.push(format);
        }
    }
    if unique.is_empty() {
        unique.extend(OutputFormat::DEFAULT);
    }
    unique
}
