//! Error types for the metamodel layer.

/// Errors raised while building or querying a metamodel.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A literal could not be converted by a data type's converter.
    #[error("cannot convert '{literal}' to {type_name}: {message}")]
    Conversion {
        type_name: String,
        literal: String,
        message: String,
    },

    /// A value has the wrong shape for a data type.
    #[error("value {value} is not a valid {type_name}")]
    UnsupportedValue { type_name: String, value: String },

    /// Adding the supertype would make a class inherit from itself.
    #[error("class '{class}' cannot inherit from '{super_type}': inheritance cycle")]
    SuperTypeCycle { class: String, super_type: String },

    /// A package description named a type that does not exist.
    #[error("unknown type '{name}' in package description")]
    UnknownType { name: String },

    /// A package description named an opposite that does not exist.
    #[error("unknown opposite '{opposite}' for reference '{reference}'")]
    UnknownOpposite { reference: String, opposite: String },

    /// A package description could not be decoded.
    #[error("invalid package description: {0}")]
    Description(#[from] serde_json::Error),
}

impl Error {
    /// Create a conversion error.
    pub fn conversion(
        type_name: impl Into<String>,
        literal: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Conversion {
            type_name: type_name.into(),
            literal: literal.into(),
            message: message.into(),
        }
    }
}

/// Result alias for metamodel operations.
pub type Result<T> = std::result::Result<T, Error>;
