use hostwire_core::{classify, ErrorClass};
use std::error::Error as StdError;

pub const EXIT_CODE_SUCCESS: i32 = 0;
pub const EXIT_CODE_FAILURE: i32 = 1;
/// The entity the command referred to does not exist.
pub const EXIT_CODE_NOT_FOUND: i32 = 30;
/// The entity the command would create already exists.
pub const EXIT_CODE_DUPLICATE: i32 = 31;

/// Maps the outcome of an invocation to the process exit code.
pub fn resolve_error_to_exit_code(err: Option<&(dyn StdError + 'static)>) -> i32 {
    match err {
        None => EXIT_CODE_SUCCESS,
        Some(err) => match classify(err) {
            ErrorClass::NotFound => EXIT_CODE_NOT_FOUND,
            ErrorClass::Duplicate => EXIT_CODE_DUPLICATE,
            ErrorClass::Other => EXIT_CODE_FAILURE,
        },
    }
}

pub fn exit_code_for<T, E>(result: &Result<T, E>) -> i32
where
    E: StdError + 'static,
{
    match result {
        Ok(_) => EXIT_CODE_SUCCESS,
        Err(err) => resolve_error_to_exit_code(Some(err)),
    }
}
