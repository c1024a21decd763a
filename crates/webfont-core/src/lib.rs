//! Web font kit generation
//!
//! Takes an uploaded TrueType or OpenType font, normalizes it to TrueType
//! outlines and derives the formats browsers load: WOFF2, WOFF, EOT, SVG and
//! the original file. The produced files are bundled with a matching
//! `@font-face` stylesheet into one ZIP archive.
//!
//! The entry point is [`FontPackager::pack`]. Each output format is produced
//! by its own [`StrategyChain`], so a failing format is dropped from the kit
//! without affecting the others.

pub mod archive;
pub mod canonical;
pub mod encode;
pub mod error;
pub mod format;
pub mod naming;
pub mod packager;
pub mod sfnt;
pub mod stylesheet;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use encode::{EncodeInput, EncoderRegistry, FormatEncoder, StrategyChain};
pub use error::{ErrorClass, FontError, PackError};
pub use format::{OutputFormat, SourceFormat, UnknownFormat};
pub use naming::FontNames;
pub use packager::{
    normalize_formats, Artifact, FontPackage, FontPackager, FontUpload, PackOutput,
    SkippedFormat, DEFAULT_MAX_UPLOAD_BYTES, STYLESHEET_FILENAME,
};
