//! Names derived from the uploaded filename

use serde::Serialize;

const FALLBACK_BASE: &str = "webfont";
const FALLBACK_DISPLAY: &str = "Webfont";

/// Output names for one font kit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontNames {
    /// Filesystem-safe stem used for every artifact, e.g. `Open-Sans-Bold`
    pub base_name: String,
    /// Human-readable family name used in the stylesheet, e.g. `Open Sans Bold`
    pub display_name: String,
}

impl FontNames {
    pub fn from_filename(filename: &str) -> Self {
        let stem = file_stem(filename);
        Self {
            base_name: base_name(stem),
            display_name: display_name(stem),
        }
    }
}

/// Strip directory components and the final extension
fn file_stem(filename: &str) -> &str {
    let file = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    }
}

/// Runs of non-alphanumeric characters collapse to a single `-`
fn base_name(stem: &str) -> String {
    let mut base = String::with_capacity(stem.len());
    let mut pending_separator = false;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !base.is_empty() {
                base.push('-');
            }
            pending_separator = false;
            base.push(c);
        } else {
            pending_separator = true;
        }
    }

    if base.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        base
    }
}

/// Separators become spaces, camel-case humps are split, words capitalized
fn display_name(stem: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous: Option<char> = None;

    for c in stem.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous = None;
            continue;
        }
        if previous.is_some_and(char::is_lowercase) && c.is_uppercase() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        previous = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    if words.is_empty() {
        return FALLBACK_DISPLAY.to_string();
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_names_from_typical_filenames() {
        let names = FontNames::from_filename("OpenSans-BoldItalic.ttf");
        assert_eq!(names.base_name, "OpenSans-BoldItalic");
        assert_eq!(names.display_name, "Open Sans Bold Italic");

        let names = FontNames::from_filename("my_cool  font!!.otf");
        assert_eq!(names.base_name, "my-cool-font");
        assert_eq!(names.display_name, "My Cool Font");
    }

    #[test]
    fn test_strips_directories_and_only_last_extension() {
        let names = FontNames::from_filename("C:\\fonts\\inter.var.ttf");
        assert_eq!(names.base_name, "inter-var");
        assert_eq!(names.display_name, "Inter Var");

        let names = FontNames::from_filename("/tmp/upload/Lato.ttf");
        assert_eq!(names.base_name, "Lato");
    }

    #[test]
    fn test_trims_leading_and_trailing_separators() {
        let names = FontNames::from_filename("__--Roboto--__.ttf");
        assert_eq!(names.base_name, "Roboto");
        assert_eq!(names.display_name, "Roboto");
    }

    #[test]
    fn test_fallback_for_unusable_names() {
        let names = FontNames::from_filename("***.ttf");
        assert_eq!(names.base_name, "webfont");
        assert_eq!(names.display_name, "Webfont");
    }

    #[test]
    fn test_non_ascii_letters_kept_for_display_only() {
        let names = FontNames::from_filename("Schrift-Größe.otf");
        assert_eq!(names.base_name, "Schrift-Gr-e");
        assert_eq!(names.display_name, "Schrift Größe");
    }

    proptest! {
        /// Property: base names are always filesystem safe
        #[test]
        fn base_name_is_filesystem_safe(filename in ".{0,40}") {
            let names = FontNames::from_filename(&filename);
            prop_assert!(!names.base_name.is_empty());
            prop_assert!(names.base_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
            prop_assert!(!names.base_name.starts_with('-'));
            prop_assert!(!names.base_name.ends_with('-'));
            prop_assert!(!names.base_name.contains("--"));
        }

        /// Property: display names never carry doubled or edge whitespace
        #[test]
        fn display_name_is_trimmed(filename in "[A-Za-z0-9 _.-]{0,40}") {
            let names = FontNames::from_filename(&filename);
            prop_assert!(!names.display_name.is_empty());
            prop_assert_eq!(names.display_name.trim(), names.display_name.as_str());
            prop_assert!(!names.display_name.contains("  "));
        }
    }
}
