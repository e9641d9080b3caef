use lhub_repository::RepositoryError;
use lhub_settings::SettingsError;
use std::borrow::Cow;

/// Dashboard feature error type.
///
/// Cache and remote errors keep their original kind behind `source`, so
/// callers can still branch on them.
#[lhub_derive::lhub_error]
pub enum DashboardError {
    #[error("Repository error{}: {source}", format_context(.context))]
    Repository { source: RepositoryError, context: Option<Cow<'static, str>> },

    #[error("Settings error{}: {source}", format_context(.context))]
    Settings { source: SettingsError, context: Option<Cow<'static, str>> },
}
