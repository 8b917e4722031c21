use std::borrow::Cow;
use trellis_derive::trellis_error;

#[trellis_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Lookup failed{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<std::borrow::Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {}
