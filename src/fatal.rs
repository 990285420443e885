use std::fmt;

/// What went wrong in a failed attribute query.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// error code returned by the call
    Os(i32),
    /// the reported region wraps the address space
    Overflow { addr: usize, size: usize },
    /// the reported low limit is above the high one
    Inverted { low: usize, high: usize },
}

/// A call in the attribute sequence failed on a platform that claims to support it.
///
/// There's no recovering from this: the stack-growth code would rather have no
/// bounds than bounds it can't trust, so the only thing to do is hand this to a
/// [`FatalHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrFailure {
    pub op: &'static str,
    pub cause: FailureCause,
}

impl AttrFailure {
    pub const fn os(op: &'static str, code: i32) -> Self {
        Self { op, cause: FailureCause::Os(code) }
    }
}

impl fmt::Display for AttrFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause {
            FailureCause::Os(code) => write!(f, "{} failed: {}", self.op, std::io::Error::from_raw_os_error(code)),
            FailureCause::Overflow { addr, size } => write!(f, "{} failed: stack {addr:#x} + {size:#x} overflows the address space", self.op),
            FailureCause::Inverted { low, high } => write!(f, "{} failed: stack low limit {low:#x} is above high limit {high:#x}", self.op),
        }
    }
}

impl std::error::Error for AttrFailure {}


/// The "abort with a message" collaborator.
pub trait FatalHandler {
    fn fatal(&self, failure: &AttrFailure) -> !;
}

/// Reports the diagnostic once and aborts the process. Doesn't unwind.
///
/// Goes through `log` when an error-level logger is listening, straight to
/// stderr otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnFatal;

impl FatalHandler for AbortOnFatal {
    fn fatal(&self, failure: &AttrFailure) -> ! {
        if log_enabled!(log::Level::Error) {
            error!("fatal error: {failure}");
            log::logger().flush();
        } else {
            eprintln!("fatal error: {failure}");
        }
        std::process::abort()
    }
}
