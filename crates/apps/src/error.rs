use std::borrow::Cow;

/// A specialized [`AppsError`] enum of the registry.
#[trellis_derive::trellis_error]
pub enum AppsError {
    /// Fatal configuration problem surfaced at startup.
    #[error("Improperly configured{}: {message}", format_context(.context))]
    ImproperlyConfigured { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A lookup ran before the phase it depends on completed.
    #[error("App registry not ready{}: {message}", format_context(.context))]
    NotReady { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Unknown app label, model name or model registration.
    #[error("Lookup failed{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Two different models claim the same `(app_label, model_name)`.
    #[error("Model conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// `populate()` was entered again while it was running.
    #[error("populate() isn't reentrant{}", format_context(.context))]
    Reentrant { context: Option<Cow<'static, str>> },

    /// The module resolver has no module under the requested path.
    #[error("No module named '{module}'{}", format_context(.context))]
    Import { module: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A model reference that isn't `app_label.ModelName`.
    #[error("Invalid model reference{}: {message}", format_context(.context))]
    InvalidReference { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An `unset_*` call without a matching `set_*`.
    #[error("Unbalanced registry state{}: {message}", format_context(.context))]
    Unbalanced { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal registry error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl AppsError {
    pub(crate) fn improperly_configured(message: impl Into<Cow<'static, str>>) -> Self {
        Self::ImproperlyConfigured { message: message.into(), context: None }
    }

    pub(crate) fn not_ready(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotReady { message: message.into(), context: None }
    }

    pub(crate) fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }

    pub(crate) fn import(module: impl Into<Cow<'static, str>>) -> Self {
        Self::Import { module: module.into(), context: None }
    }

    pub(crate) fn unbalanced(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Unbalanced { message: message.into(), context: None }
    }

    /// Whether the error says a module is missing from the resolver.
    #[must_use]
    pub const fn is_import(&self) -> bool {
        matches!(self, Self::Import { .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
