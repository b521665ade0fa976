//! Packages and data types.

use std::fmt;
use std::rc::Rc;

use crate::{Classifier, PackageId, ValueConverter};

/// A namespace of classifiers, identified by its namespace URI.
#[derive(Clone, Debug)]
pub struct Package {
    pub(crate) name: String,
    pub(crate) ns_uri: String,
    pub(crate) ns_prefix: String,
    pub(crate) classifiers: Vec<Classifier>,
}

impl Package {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ns_uri(&self) -> &str {
        &self.ns_uri
    }

    pub fn ns_prefix(&self) -> &str {
        &self.ns_prefix
    }

    /// Classes and data types in insertion order.
    pub fn classifiers(&self) -> &[Classifier] {
        &self.classifiers
    }
}

/// A value type for attributes, backed by a converter.
#[derive(Clone)]
pub struct DataType {
    pub(crate) name: String,
    pub(crate) package: Option<PackageId>,
    pub(crate) converter: Rc<dyn ValueConverter>,
}

impl DataType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> Option<PackageId> {
        self.package
    }

    pub fn converter(&self) -> &dyn ValueConverter {
        self.converter.as_ref()
    }
}

impl fmt::Debug for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataType")
            .field("name", &self.name)
            .field("package", &self.package)
            .finish_non_exhaustive()
    }
}
