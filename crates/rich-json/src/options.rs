//! Codec configuration.

/// Widest indentation honoured; larger widths are clamped.
pub const MAX_INDENT: usize = 10;

/// Options controlling how encoded text is laid out.
///
/// Decoding accepts any well-formed JSON regardless of these options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecOptions {
    /// Spaces per nesting level. `None` or `Some(0)` writes compact JSON.
    pub indent: Option<usize>,
}

impl CodecOptions {
    pub fn compact() -> Self {
        Self { indent: None }
    }

    pub fn pretty(indent: usize) -> Self {
        Self {
            indent: Some(indent),
        }
    }

    /// The indentation actually applied, after clamping.
    pub fn effective_indent(&self) -> Option<usize> {
        self.indent.filter(|&w| w > 0).map(|w| w.min(MAX_INDENT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_indent_is_compact() {
        assert_eq!(CodecOptions::pretty(0).effective_indent(), None);
        assert_eq!(CodecOptions::compact().effective_indent(), None);
        assert_eq!(CodecOptions::default(), CodecOptions::compact());
    }

    #[test]
    fn wide_indent_is_clamped() {
        assert_eq!(CodecOptions::pretty(4).effective_indent(), Some(4));
        assert_eq!(CodecOptions::pretty(64).effective_indent(), Some(MAX_INDENT));
    }
}
