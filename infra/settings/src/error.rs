use std::borrow::Cow;

/// A specialized error enum for the settings store.
#[lhub_derive::lhub_error]
pub enum SettingsError {
    /// The key is empty or contains characters that cannot map onto a file name.
    #[error("Invalid settings key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Serialization failure{}: {source}", format_context(.context))]
    Serde { source: serde_json::Error, context: Option<Cow<'static, str>> },
}
