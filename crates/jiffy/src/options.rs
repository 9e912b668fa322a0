/// Default limit on expression nesting.
///
/// Kept below `serde_json`'s parser recursion limit (128) so that deeply
/// nested expressions hit [`ExprError::MaxDepthExceeded`](crate::ExprError)
/// rather than a generic parse error.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Options for [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting depth; the root expression is depth 1.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Options for [`Encoder`](crate::Encoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Maximum nesting depth; the root expression is depth 1.
    pub max_depth: usize,
    /// Emit indented output instead of the compact form.
    pub pretty: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            pretty: false,
        }
    }
}
