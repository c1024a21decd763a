//! `@font-face` stylesheet generation

use crate::format::OutputFormat;
use crate::naming::FontNames;

/// One produced artifact as referenced from the stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetSource<'a> {
    pub format: OutputFormat,
    pub filename: &'a str,
    pub css_format: &'static str,
}

/// Render the `@font-face` block for the produced artifacts.
///
/// Sources are emitted in [`OutputFormat`] priority order regardless of the
/// order passed in. EOT is additionally declared on its own `src` line so
/// legacy IE picks it up before the `?#iefix` hack.
pub fn render_stylesheet(names: &FontNames, sources: &[StylesheetSource<'_>]) -> String {
    let mut sources = sources.to_vec();
    sources.sort_by_key(|source| source.format);

    let mut lines = vec![
        "@font-face {".to_string(),
        format!("    font-family: '{}';", escape_css_string(&names.display_name)),
    ];

    if let Some(eot) = sources.iter().find(|s| s.format == OutputFormat::Eot) {
        lines.push(format!("    src: url('{}');", eot.filename));
    }

    let urls: Vec<String> = sources
        .iter()
        .map(|source| match source.format {
            OutputFormat::Eot => format!(
                "url('{}?#iefix') format('{}')",
                source.filename, source.css_format
            ),
            OutputFormat::Svg => format!(
                "url('{}#{}') format('{}')",
                source.filename, names.base_name, source.css_format
            ),
            _ => format!("url('{}') format('{}')", source.filename, source.css_format),
        })
        .collect();
    if !urls.is_empty() {
        lines.push(format!("    src: {};", urls.join(",\n         ")));
    }

    lines.extend(
        [
            "    font-weight: normal;",
            "    font-style: normal;",
            "    font-display: swap;",
            "}",
            "",
        ]
        .map(String::from),
    );
    lines.join("\n")
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SourceFormat;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn names() -> FontNames {
        FontNames::from_filename("Test-Sans.ttf")
    }

    fn source(format: OutputFormat, filename: &str) -> StylesheetSource<'_> {
        StylesheetSource {
            format,
            filename,
            css_format: format.css_format(SourceFormat::TrueType),
        }
    }

    #[test]
    fn test_default_formats() {
        let css = render_stylesheet(
            &names(),
            &[
                source(OutputFormat::Woff2, "Test-Sans.woff2"),
                source(OutputFormat::Woff, "Test-Sans.woff"),
            ],
        );
        let expected = "\
@font-face {
    font-family: 'Test Sans';
    src: url('Test-Sans.woff2') format('woff2'),
         url('Test-Sans.woff') format('woff');
    font-weight: normal;
    font-style: normal;
    font-display: swap;
}
";
        assert_eq!(css, expected);
    }

    #[test]
    fn test_all_formats_in_priority_order() {
        let css = render_stylesheet(
            &names(),
            &[
                source(OutputFormat::Svg, "Test-Sans.svg"),
                source(OutputFormat::Original, "Test-Sans.ttf"),
                source(OutputFormat::Woff, "Test-Sans.woff"),
                source(OutputFormat::Eot, "Test-Sans.eot"),
                source(OutputFormat::Woff2, "Test-Sans.woff2"),
            ],
        );
        let expected = "\
@font-face {
    font-family: 'Test Sans';
    src: url('Test-Sans.eot');
    src: url('Test-Sans.eot?#iefix') format('embedded-opentype'),
         url('Test-Sans.woff2') format('woff2'),
         url('Test-Sans.woff') format('woff'),
         url('Test-Sans.ttf') format('truetype'),
         url('Test-Sans.svg#Test-Sans') format('svg');
    font-weight: normal;
    font-style: normal;
    font-display: swap;
}
";
        assert_eq!(css, expected);
    }

    #[test]
    fn test_quotes_in_display_name_are_escaped() {
        let names = FontNames {
            base_name: "odd".into(),
            display_name: "It's".into(),
        };
        let css = render_stylesheet(&names, &[source(OutputFormat::Woff, "odd.woff")]);
        assert!(css.contains("font-family: 'It\\'s';"));
    }

    proptest! {
        /// Property: output depends only on the set of formats, not their order
        #[test]
        fn stylesheet_is_order_independent(
            selection in proptest::sample::subsequence(OutputFormat::ALL.to_vec(), 1..=5),
            seed in any::<u64>(),
        ) {
            let filenames: Vec<String> = selection
                .iter()
                .map(|f| format!("Test-Sans.{}", f.extension(SourceFormat::TrueType)))
                .collect();
            let sources: Vec<StylesheetSource<'_>> = selection
                .iter()
                .zip(&filenames)
                .map(|(f, name)| source(*f, name))
                .collect();

            let mut shuffled = sources.clone();
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();

            let first = render_stylesheet(&names(), &sources);
            prop_assert_eq!(&first, &render_stylesheet(&names(), &sources));
            prop_assert_eq!(&first, &render_stylesheet(&names(), &shuffled));
            prop_assert_eq!(first.matches("url(").count(), len + usize::from(selection.contains(&OutputFormat::Eot)));
        }
    }
}
