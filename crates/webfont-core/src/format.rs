//! Source and output format identifiers

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Font formats accepted as uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    #[serde(rename = "ttf")]
    TrueType,
    #[serde(rename = "otf")]
    OpenType,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 2] = [SourceFormat::TrueType, SourceFormat::OpenType];

    /// Detect the source format from a filename's extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "ttf" => Some(SourceFormat::TrueType),
            "otf" => Some(SourceFormat::OpenType),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::TrueType => "ttf",
            SourceFormat::OpenType => "otf",
        }
    }

    /// Value for the CSS `format()` hint
    pub fn css_format(self) -> &'static str {
        match self {
            SourceFormat::TrueType => "truetype",
            SourceFormat::OpenType => "opentype",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            SourceFormat::TrueType => "font/ttf",
            SourceFormat::OpenType => "font/otf",
        }
    }
}

/// Formats that can be requested for the output kit.
///
/// Declaration order is the stylesheet priority order, so sorting a list of
/// formats yields the order in which `src` entries are emitted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Eot,
    Woff2,
    Woff,
    #[serde(rename = "keep-original")]
    Original,
    Svg,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Eot,
        OutputFormat::Woff2,
        OutputFormat::Woff,
        OutputFormat::Original,
        OutputFormat::Svg,
    ];

    /// Produced when a request selects nothing usable
    pub const DEFAULT: [OutputFormat; 2] = [OutputFormat::Woff2, OutputFormat::Woff];

    /// Wire identifier
    pub fn id(self) -> &'static str {
        match self {
            OutputFormat::Eot => "eot",
            OutputFormat::Woff2 => "woff2",
            OutputFormat::Woff => "woff",
            OutputFormat::Original => "keep-original",
            OutputFormat::Svg => "svg",
        }
    }

    pub fn is_default(self) -> bool {
        Self::DEFAULT.contains(&self)
    }

    /// File extension of the produced artifact
    pub fn extension(self, source: SourceFormat) -> &'static str {
        match self {
            OutputFormat::Eot => "eot",
            OutputFormat::Woff2 => "woff2",
            OutputFormat::Woff => "woff",
            OutputFormat::Original => source.extension(),
            OutputFormat::Svg => "svg",
        }
    }

    pub fn css_format(self, source: SourceFormat) -> &'static str {
        match self {
            OutputFormat::Eot => "embedded-opentype",
            OutputFormat::Woff2 => "woff2",
            OutputFormat::Woff => "woff",
            OutputFormat::Original => source.css_format(),
            OutputFormat::Svg => "svg",
        }
    }

    pub fn mime_type(self, source: SourceFormat) -> &'static str {
        match self {
            OutputFormat::Eot => "application/vnd.ms-fontobject",
            OutputFormat::Woff2 => "font/woff2",
            OutputFormat::Woff => "font/woff",
            OutputFormat::Original => source.mime_type(),
            OutputFormat::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown output format '{0}'")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eot" => Ok(OutputFormat::Eot),
            "woff2" => Ok(OutputFormat::Woff2),
            "woff" => Ok(OutputFormat::Woff),
            "svg" => Ok(OutputFormat::Svg),
            "keep-original" | "keep_original" | "original" | "ttf" | "otf" => {
                Ok(OutputFormat::Original)
            }
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}
