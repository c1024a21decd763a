use thiserror::Error;

/// Errors raised while reading, converting or encoding font data
#[derive(Error, Debug)]
pub enum FontError {
    #[error("Font data truncated at offset {0}")]
    Truncated(usize),

    #[error("Malformed font: {0}")]
    Malformed(String),

    #[error("Missing required table '{0}'")]
    MissingTable(String),

    #[error("Unsupported font: {0}")]
    Unsupported(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for FontError {
    fn from(err: zip::result::ZipError) -> Self {
        FontError::Archive(err.to_string())
    }
}

/// Request-level failures of the packaging pipeline
#[derive(Error, Debug)]
pub enum PackError {
    #[error("Missing file: no font file was provided")]
    MissingFile,

    #[error("Unsupported source format '{0}': only .ttf and .otf files are accepted")]
    UnsupportedFormat(String),

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Failed to convert font to TrueType: {0}")]
    CanonicalConversion(#[source] FontError),

    #[error("No output formats could be generated; try selecting different formats")]
    NoOutput,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse grouping of [`PackError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input, rejected before any conversion
    Validation,
    /// Conversion could not produce a usable result
    Conversion,
    Internal,
}

impl PackError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PackError::MissingFile
            | PackError::UnsupportedFormat(_)
            | PackError::FileTooLarge { .. } => ErrorClass::Validation,
            PackError::CanonicalConversion(_) | PackError::NoOutput => ErrorClass::Conversion,
            PackError::Internal(_) => ErrorClass::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(PackError::MissingFile.class(), ErrorClass::Validation);
        assert_eq!(
            PackError::FileTooLarge { size: 10, limit: 5 }.class(),
            ErrorClass::Validation
        );
        assert_eq!(
            PackError::CanonicalConversion(FontError::Truncated(0)).class(),
            ErrorClass::Conversion
        );
        assert_eq!(PackError::NoOutput.class(), ErrorClass::Conversion);
        assert_eq!(PackError::Internal("boom".into()).class(), ErrorClass::Internal);
    }

    #[test]
    fn test_messages_name_the_problem() {
        assert_eq!(
            PackError::UnsupportedFormat("font.woff".into()).to_string(),
            "Unsupported source format 'font.woff': only .ttf and .otf files are accepted"
        );
        assert!(PackError::NoOutput.to_string().contains("different formats"));
    }
}
