use std::borrow::Cow;

/// Errors that can occur during service locator operations.
#[lhub_derive::lhub_error]
pub enum LocatorError {
    /// A registration already exists for the requested key.
    /// The existing registration is left untouched.
    #[error("Duplicate registration{}: {message}", format_context(.context))]
    DuplicateRegistration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No registration exists for the requested key.
    #[error("Service not registered{}: {message}", format_context(.context))]
    NotRegistered { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A stored instance failed to downcast back to the requested interface.
    /// This indicates an invariant violation inside the locator.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
