use std::fmt::Display;

use luacv_core::CvError;
use luacv_highgui::WindowError;

/// Errors raised by the binding functions.
///
/// They reach Lua as catchable errors (`pcall`) and can be recovered on the
/// Rust side with [`binding_error`].
#[derive(thiserror::Error, Debug)]
pub enum BindingError {
    #[error("bad argument #{position} to '{function}' ({message})")]
    InvalidArgument {
        function: &'static str,
        position: usize,
        message: String,
    },

    #[error("{expected} expected, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{expected} expected, got {got}")]
    InvalidHandle {
        expected: &'static str,
        got: &'static str,
    },

    #[error("max number of trackbars ({capacity}) reached")]
    CapacityExceeded { capacity: usize },

    #[error("{0} is not yet implemented")]
    NotYetImplemented(&'static str),

    #[error("{0}")]
    Native(String),
}

impl BindingError {
    pub(crate) fn invalid(function: &'static str, position: usize, message: impl Display) -> Self {
        BindingError::InvalidArgument {
            function,
            position,
            message: message.to_string(),
        }
    }
}

impl From<CvError> for BindingError {
    fn from(err: CvError) -> Self {
        BindingError::Native(err.to_string())
    }
}

impl From<WindowError> for BindingError {
    fn from(err: WindowError) -> Self {
        BindingError::Native(err.to_string())
    }
}

impl From<BindingError> for mlua::Error {
    fn from(err: BindingError) -> Self {
        mlua::Error::external(err)
    }
}

/// Find the [`BindingError`] behind a Lua error, looking through callback
/// tracebacks and added context.
pub fn binding_error(err: &mlua::Error) -> Option<&BindingError> {
    match err {
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<BindingError>(),
        mlua::Error::CallbackError { cause, .. } => binding_error(cause),
        mlua::Error::BadArgument { cause, .. } => binding_error(cause),
        mlua::Error::WithContext { cause, .. } => binding_error(cause),
        _ => None,
    }
}
