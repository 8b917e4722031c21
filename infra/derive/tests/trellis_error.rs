use std::borrow::Cow;
use trellis_derive::trellis_error;

#[trellis_error]
pub enum ProbeError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Not ready{}: {message}", format_context(.context))]
    NotReady { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Reentrant call{}", format_context(.context))]
    Reentrant { context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn failing_io() -> Result<(), std::io::Error> {
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
}

#[test]
fn ui_expansion_compiles() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/trellis_error_pass.rs");
}

#[test]
fn source_errors_convert_with_question_mark() {
    fn run() -> Result<(), ProbeError> {
        failing_io()?;
        Ok(())
    }

    let err = run().unwrap_err();
    assert!(matches!(err, ProbeError::Io { context: None, .. }));
    assert_eq!(err.to_string(), "IO error: gone");
}

#[test]
fn context_is_attached_to_source_results() {
    let err = failing_io().context("reading settings").unwrap_err();
    assert_eq!(err.to_string(), "IO error (reading settings): gone");
}

#[test]
fn context_is_attached_to_own_results() {
    let res: Result<(), ProbeError> =
        Err(ProbeError::NotReady { message: "Apps aren't loaded yet.".into(), context: None });
    let err = res.context("get_app_configs").unwrap_err();
    assert_eq!(err.to_string(), "Not ready (get_app_configs): Apps aren't loaded yet.");

    let res: Result<(), ProbeError> = Err(ProbeError::Reentrant { context: None });
    assert_eq!(res.context("ready hook").unwrap_err().to_string(), "Reentrant call (ready hook)");
}

#[test]
fn strings_convert_into_internal() {
    let borrowed: ProbeError = "boom".into();
    let owned: ProbeError = String::from("bang").into();
    assert_eq!(borrowed.to_string(), "Internal error: boom");
    assert_eq!(owned.to_string(), "Internal error: bang");
}
