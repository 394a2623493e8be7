use anyhow::Result;
use inquire::InquireError;

mod spinner;
mod theme;

pub use spinner::Spinner;
pub use theme::Style;

/// Check if the inquire error is a user cancellation/interruption.
const fn is_prompt_cancelled(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Runs an interactive prompt and turns a user cancellation into `Ok(None)`.
///
/// On cancellation (Ctrl+C or Escape) a newline is printed to stderr to
/// clean up the terminal.
pub fn handle_prompt_cancellation<T, F>(f: F) -> Result<Option<T>>
where
    F: FnOnce() -> Result<T>,
{
    match f() {
        Ok(value) => Ok(Some(value)),
        Err(e)
            if e.downcast_ref::<InquireError>()
                .is_some_and(is_prompt_cancelled) =>
        {
            eprintln!();
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_prompt_cancellation_ok() {
        let result = handle_prompt_cancellation(|| Ok(7));
        assert!(matches!(result, Ok(Some(7))));
    }

    #[test]
    fn test_handle_prompt_cancellation_operation_canceled() {
        let result: Result<Option<()>> =
            handle_prompt_cancellation(|| Err(InquireError::OperationCanceled.into()));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_handle_prompt_cancellation_operation_interrupted() {
        let result: Result<Option<()>> =
            handle_prompt_cancellation(|| Err(InquireError::OperationInterrupted.into()));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_handle_prompt_cancellation_other_error() {
        let result: Result<Option<()>> =
            handle_prompt_cancellation(|| Err(anyhow::anyhow!("Some other error")));
        let Err(err) = result else {
            panic!("expected an error");
        };
        assert!(err.to_string().contains("Some other error"));
    }

    #[test]
    fn test_is_prompt_cancelled_other_error() {
        let err = InquireError::Custom("test".into());
        assert!(!is_prompt_cancelled(&err));
    }
}
