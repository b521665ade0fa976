//! Typed handles into metamodel and graph arenas.
//!
//! Descriptors and instances never point at each other directly. Every
//! relation (supertype, owner, opposite, container) is one of these
//! handles, resolved through the arena that issued it.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create a handle from an arena index.
            pub fn from_index(index: usize) -> Self {
                $name(index as u32)
            }

            /// The arena index of this handle.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// Handle of a class descriptor.
    ClassId,
    "class"
);
handle!(
    /// Handle of a structural feature descriptor.
    FeatureId,
    "feature"
);
handle!(
    /// Handle of an operation descriptor.
    OperationId,
    "operation"
);
handle!(
    /// Handle of a data type.
    DataTypeId,
    "datatype"
);
handle!(
    /// Handle of a package.
    PackageId,
    "package"
);
handle!(
    /// Handle of an instance in a graph.
    ObjectId,
    "object"
);
handle!(
    /// Handle of a notifying list in a graph.
    ListId,
    "list"
);

/// The value type of a feature or operation: a class or a data type.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classifier {
    Class(ClassId),
    DataType(DataTypeId),
}

impl Classifier {
    pub fn as_class(self) -> Option<ClassId> {
        match self {
            Classifier::Class(c) => Some(c),
            Classifier::DataType(_) => None,
        }
    }

    pub fn as_data_type(self) -> Option<DataTypeId> {
        match self {
            Classifier::DataType(d) => Some(d),
            Classifier::Class(_) => None,
        }
    }
}

impl From<ClassId> for Classifier {
    fn from(c: ClassId) -> Self {
        Classifier::Class(c)
    }
}

impl From<DataTypeId> for Classifier {
    fn from(d: DataTypeId) -> Self {
        Classifier::DataType(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_round_trip_index() {
        assert_eq!(ObjectId::from_index(7).index(), 7);
        assert_eq!(format!("{}", ClassId::from_index(3)), "class#3");
    }

    #[test]
    fn classifier_projection() {
        let c: Classifier = ClassId::from_index(1).into();
        assert_eq!(c.as_class(), Some(ClassId::from_index(1)));
        assert_eq!(c.as_data_type(), None);
    }
}
