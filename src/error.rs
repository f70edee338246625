use std::fmt;

/// The five fatal failure categories of the assembly engine.
///
/// Every error type in this crate maps onto exactly one category via its
/// `category()` method. Failures are fatal to the current operation; there is
/// no retry or partial-result policy. Callers should treat any of these as a
/// programming or configuration error rather than a transient condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad index, mismatched sequence lengths, or invalid order
    Input,
    /// Unsupported order combination for the analytic path, or curved geometry
    FeatureNotImplemented,
    /// Non-triangle geometry supplied to the triangle solver
    WrongElementType,
    /// Nodes not coplanar in the expected plane, or degenerate element
    Geometry,
    /// Requested container size exceeds what can be allocated
    MemoryOverflow,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Input => write!(f, "INPUT ERROR"),
            Self::FeatureNotImplemented => write!(f, "FEATURE NOT IMPLEMENTED"),
            Self::WrongElementType => write!(f, "WRONG ELEMENT TYPE"),
            Self::Geometry => write!(f, "GEOMETRY ERROR"),
            Self::MemoryOverflow => write!(f, "MEMORY OVERFLOW"),
        }
    }
}
