use thiserror::Error;

use crate::body::{LabelId, StatementId};

macro_rules! malformed_region {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedRegion {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedRegion {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Region building is a total function over well-formed input, so every variant here describes
/// input that violates a structural precondition the upstream binder was expected to enforce,
/// or a dangling reference between the statement arena and its labels.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::MalformedRegion`] - The statement tree cannot be expressed as a valid region tree
/// - [`Error::UnresolvedLabel`] - A `goto` names a label that no statement defines
/// - [`Error::UnknownStatement`] - A statement id does not belong to the method body
///
/// ## Infrastructure Errors
/// - [`Error::GraphError`] - Flow graph construction failed
///
/// # Examples
///
/// ```rust
/// use ehscope::{body::MethodBodyBuilder, Error, RegionBuilder};
///
/// let mut b = MethodBodyBuilder::new();
/// let stray = b.break_stmt();
/// let root = b.block(vec![stray]);
/// let body = b.finish(root)?;
///
/// match RegionBuilder::new().build(&body) {
///     Err(Error::MalformedRegion { message, .. }) => println!("rejected: {message}"),
///     Err(e) => println!("other error: {e}"),
///     Ok(tree) => println!("{tree}"),
/// }
/// # Ok::<(), ehscope::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The statement tree violates a structural precondition of the region model.
    ///
    /// Raised for an exception local referenced outside its handler, a jump into a protected
    /// region, control leaving a `finally`/`fault` handler, a `try` without handlers, and
    /// similar shapes that the CLR exception model cannot represent. The error includes the
    /// source location where the violation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violated precondition
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed region - {file}:{line}: {message}")]
    MalformedRegion {
        /// The message to be printed for the MalformedRegion error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A `goto` references a label that no labeled statement defines.
    #[error("Label {0} is referenced but never defined")]
    UnresolvedLabel(LabelId),

    /// A statement id is outside the arena of the method body it was used with.
    #[error("Statement {0} does not belong to this method body")]
    UnknownStatement(StatementId),

    /// Flow graph construction error.
    ///
    /// Raised by the graph infrastructure when an edge references a node that does not
    /// exist. Seeing this from a public API indicates an internal inconsistency.
    #[error("{0}")]
    GraphError(String),
}
