//! Error types for the graph kernel.
//!
//! Every variant except `Load` and `Meta` reports a contract violation by
//! the caller. Expected absence (removing a missing element, reading an
//! unset feature) and failed proxy resolution are not errors.

use objgraph_meta::ObjectId;

use crate::Uri;

/// Errors raised by graph operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A list index outside the valid range.
    #[error("index {index} out of bounds for list of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    /// The feature does not belong to the instance's class.
    #[error("'{feature}' is not a feature of class '{class}'")]
    FeatureNotInClass { feature: String, class: String },

    /// A list was requested for a single-valued feature.
    #[error("'{feature}' is not a many-valued feature")]
    NotMany { feature: String },

    /// The feature is not changeable.
    #[error("'{feature}' is not changeable")]
    NotChangeable { feature: String },

    /// The operation does not belong to the instance's class.
    #[error("'{operation}' is not an operation of class '{class}'")]
    OperationNotInClass { operation: String, class: String },

    /// No implementation was registered for the operation.
    #[error("operation '{operation}' is not implemented")]
    OperationNotImplemented { operation: String },

    /// A protocol call reached a proxy that has not been resolved.
    #[error("unresolved proxy: {uri}")]
    UnresolvedProxy { uri: Uri },

    /// Abstract classes and interfaces cannot be instantiated.
    #[error("cannot instantiate abstract class '{class}'")]
    AbstractClass { class: String },

    /// The value does not fit the feature's type.
    #[error("value {value} is not valid for feature '{feature}'")]
    TypeMismatch { feature: String, value: String },

    /// An object was added twice to a reference list.
    #[error("the 'no duplicates' constraint is violated for '{feature}'")]
    Duplicate { feature: String },

    /// An object would become its own container.
    #[error("{child} cannot be contained within its own subtree at {container}")]
    ContainmentCycle { container: ObjectId, child: ObjectId },

    /// A handle that this graph never issued.
    #[error("invalid handle: {handle}")]
    InvalidHandle { handle: String },

    /// A resource loader failed.
    #[error("failed to load resource '{uri}': {message}")]
    Load { uri: Uri, message: String },

    /// A metamodel error, such as an unconvertible default literal.
    #[error(transparent)]
    Meta(#[from] objgraph_meta::Error),
}

impl Error {
    pub(crate) fn invalid_handle(handle: impl std::fmt::Display) -> Self {
        Error::InvalidHandle {
            handle: handle.to_string(),
        }
    }
}

/// Result alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn index_error_display() {
        let e = Error::IndexOutOfBounds { index: 3, size: 2 };
        assert_eq!(format!("{}", e), "index 3 out of bounds for list of size 2");
    }

    #[test]
    fn proxy_error_names_locator() {
        let e = Error::UnresolvedProxy {
            uri: Uri::parse("other.model#//@items.0"),
        };
        assert!(format!("{}", e).contains("other.model#//@items.0"));
    }

    #[test]
    fn meta_error_is_transparent() {
        let inner = objgraph_meta::Error::conversion("Int", "x", "bad");
        let display = inner.to_string();
        let e: Error = inner.into();
        assert_eq!(e.to_string(), display);
        assert!(StdError::source(&e).is_none());
    }

    #[test]
    fn invalid_handle_display() {
        let e = Error::invalid_handle(ObjectId::from_index(9));
        assert_eq!(e.to_string(), "invalid handle: object#9");
    }
}
