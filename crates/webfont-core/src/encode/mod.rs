//! Web font encoders and per-format strategy chains
//!
//! Each output format owns an ordered [`StrategyChain`] of named encoders.
//! The chain tries them in turn and the first success wins, so an alternate
//! implementation for a format is added by appending a strategy rather than
//! nesting fallbacks.

mod eot;
mod svg;
mod woff;
mod woff2;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::FontError;
use crate::format::{OutputFormat, SourceFormat};
use crate::naming::FontNames;

pub use eot::{encode_eot, EotEncoder};
pub use svg::{encode_svg, SvgEncoder};
pub use woff::{encode_woff, WoffEncoder};
pub use woff2::{encode_woff2, Woff2Encoder};

/// Everything an encoder may draw on
#[derive(Debug, Clone, Copy)]
pub struct EncodeInput<'a> {
    /// Canonical TrueType font
    pub truetype: &'a [u8],
    /// Bytes exactly as uploaded
    pub original: &'a [u8],
    pub source: SourceFormat,
    pub names: &'a FontNames,
}

/// A single named way of producing one output format
pub trait FormatEncoder: Send + Sync {
    fn name(&self) -> &'static str;

    fn encode(&self, input: &EncodeInput<'_>) -> Result<Vec<u8>, FontError>;
}

/// Ships the uploaded file unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughEncoder;

impl FormatEncoder for PassthroughEncoder {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn encode(&self, input: &EncodeInput<'_>) -> Result<Vec<u8>, FontError> {
        Ok(input.original.to_vec())
    }
}

/// Ordered encoders for one output format
pub struct StrategyChain {
    format: OutputFormat,
    strategies: Vec<Box<dyn FormatEncoder>>,
}

impl StrategyChain {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            strategies: Vec::new(),
        }
    }

    pub fn with_strategy<E: FormatEncoder + 'static>(mut self, encoder: E) -> Self {
        self.strategies.push(Box::new(encoder));
        self
    }

    /// The built-in chain for a format
    pub fn native(format: OutputFormat) -> Self {
        let chain = Self::new(format);
        match format {
            OutputFormat::Eot => chain.with_strategy(EotEncoder),
            OutputFormat::Woff2 => chain.with_strategy(Woff2Encoder::default()),
            OutputFormat::Woff => chain.with_strategy(WoffEncoder::default()),
            OutputFormat::Original => chain.with_strategy(PassthroughEncoder),
            OutputFormat::Svg => chain.with_strategy(SvgEncoder),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy in order; the first success wins
    pub fn run(&self, input: &EncodeInput<'_>) -> Result<Vec<u8>, FontError> {
        let mut failures = Vec::new();
        for strategy in &self.strategies {
            match strategy.encode(input) {
                Ok(bytes) => {
                    debug!(
                        format = %self.format,
                        strategy = strategy.name(),
                        bytes = bytes.len(),
                        "Encoded format"
                    );
                    return Ok(bytes);
                }
                Err(err) => {
                    warn!(
                        format = %self.format,
                        strategy = strategy.name(),
                        error = %err,
                        "Encoding strategy failed"
                    );
                    failures.push(format!("{}: {}", strategy.name(), err));
                }
            }
        }

        if failures.is_empty() {
            Err(FontError::Encode(format!(
                "no encoder configured for {}",
                self.format
            )))
        } else {
            Err(FontError::Encode(failures.join("; ")))
        }
    }
}

/// One strategy chain per output format
pub struct EncoderRegistry {
    chains: BTreeMap<OutputFormat, StrategyChain>,
}

impl EncoderRegistry {
    /// Native chains for every format
    pub fn native() -> Self {
        let chains = OutputFormat::ALL
            .into_iter()
            .map(|format| (format, StrategyChain::native(format)))
            .collect();
        Self { chains }
    }

    /// Replace the chain for `chain.format()`
    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chains.insert(chain.format(), chain);
        self
    }

    pub fn chain(&self, format: OutputFormat) -> Option<&StrategyChain> {
        self.chains.get(&format)
    }

    /// Encode one format through its chain
    pub fn encode(&self, format: OutputFormat, input: &EncodeInput<'_>) -> Result<Vec<u8>, FontError> {
        match self.chain(format) {
            Some(chain) => chain.run(input),
            None => Err(FontError::Encode(format!("no encoder configured for {}", format))),
        }
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::native()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Failing;

    impl FormatEncoder for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn encode(&self, _: &EncodeInput<'_>) -> Result<Vec<u8>, FontError> {
            Err(FontError::Encode("simulated failure".into()))
        }
    }

    struct Fixed(&'static [u8], Arc<AtomicUsize>);

    impl FormatEncoder for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn encode(&self, _: &EncodeInput<'_>) -> Result<Vec<u8>, FontError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.to_vec())
        }
    }

    fn with_input<T>(f: impl FnOnce(&EncodeInput<'_>) -> T) -> T {
        let font = testing::truetype_font();
        let names = FontNames::from_filename("Test-Sans.ttf");
        let input = EncodeInput {
            truetype: &font,
            original: &font,
            source: SourceFormat::TrueType,
            names: &names,
        };
        f(&input)
    }

    #[test]
    fn test_first_success_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = StrategyChain::new(OutputFormat::Woff)
            .with_strategy(Failing)
            .with_strategy(Fixed(b"first", calls.clone()))
            .with_strategy(Fixed(b"second", calls.clone()));

        let bytes = with_input(|input| chain.run(input)).unwrap();
        assert_eq!(bytes, b"first");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(chain.strategy_names(), vec!["failing", "fixed", "fixed"]);
    }

    #[test]
    fn test_all_failures_are_reported() {
        let chain = StrategyChain::new(OutputFormat::Svg)
            .with_strategy(Failing)
            .with_strategy(Failing);
        let err = with_input(|input| chain.run(input)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Encoding failed: failing: Encoding failed: simulated failure; failing: Encoding failed: simulated failure"
        );
    }

    #[test]
    fn test_empty_chain_fails() {
        let chain = StrategyChain::new(OutputFormat::Eot);
        assert!(with_input(|input| chain.run(input)).is_err());
    }

    #[test]
    fn test_native_registry_covers_every_format() {
        let registry = EncoderRegistry::native();
        for format in OutputFormat::ALL {
            let chain = registry.chain(format).unwrap();
            assert_eq!(chain.strategy_names().len(), 1, "{} chain", format);
            let bytes = with_input(|input| registry.encode(format, input)).unwrap();
            assert!(!bytes.is_empty(), "{} produced no bytes", format);
        }
    }

    #[test]
    fn test_with_chain_replaces_native() {
        let registry = EncoderRegistry::native()
            .with_chain(StrategyChain::new(OutputFormat::Woff2).with_strategy(Failing));
        assert_eq!(
            registry.chain(OutputFormat::Woff2).unwrap().strategy_names(),
            vec!["failing"]
        );
        assert!(with_input(|input| registry.encode(OutputFormat::Woff2, input)).is_err());
    }

    #[test]
    fn test_passthrough_keeps_original_bytes() {
        let bytes = with_input(|input| PassthroughEncoder.encode(input)).unwrap();
        assert_eq!(bytes, testing::truetype_font());
    }
}
