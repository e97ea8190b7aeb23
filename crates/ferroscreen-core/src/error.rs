use thiserror::Error;

/// Validation errors for domain values and screening thresholds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("time window start must not be after its end")]
    InvertedWindow,
    #[error("min_beats {min_beats} cannot exceed the {quarters} quarters examined")]
    BeatsExceedQuarters { min_beats: u32, quarters: u32 },
}

/// Startup configuration errors. Any of these blocks a run from starting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no API key configured; set FERROSCREEN_ALPHAVANTAGE_API_KEY (free key: https://www.alphavantage.co/support/#api-key)")]
    MissingApiKey,
    #[error("API key is still the placeholder value '{0}'")]
    PlaceholderApiKey(String),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors raised by the screening driver itself. Upstream failures never surface here;
/// they are folded into fetch reports and enrichment results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScreenError {
    #[error("another screening run is already in progress; concurrent runs would exceed the shared call quota")]
    RunInProgress,
}
