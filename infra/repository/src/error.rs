use std::borrow::Cow;

/// Errors surfaced by the repository cache layer.
///
/// `NotFound` and `Transport` originate in the remote-fetch collaborators and
/// pass through the cache unchanged so callers can branch on the original
/// kind; the cache never retries them. The enum is `Clone` because a single
/// in-flight failure is delivered to every caller that joined the flight.
#[lhub_derive::lhub_error]
#[derive(Clone)]
pub enum RepositoryError {
    /// The remote reported that the entity does not exist.
    #[error("Entity not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The remote call failed below the application layer.
    #[error("Transport failure{}: {message}", format_context(.context))]
    Transport { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The in-flight fetch was invalidated before it completed.
    #[error("Fetch cancelled{}: {message}", format_context(.context))]
    Cancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The cache was used after `dispose()`. Programmer error, fail fast.
    #[error("Cache used after dispose{}: {message}", format_context(.context))]
    Disposed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
