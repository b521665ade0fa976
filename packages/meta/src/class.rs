//! Class and operation descriptors.

use crate::{ClassId, Classifier, FeatureId, OperationId, PackageId};

/// A named, possibly abstract, multiply-inherited class.
///
/// Own features and operations are kept in insertion order; that order
/// assigns their feature IDs. Inherited members are computed by
/// [`Metamodel`](crate::Metamodel) queries.
#[derive(Clone, Debug)]
pub struct ClassDescriptor {
    pub(crate) name: String,
    pub(crate) is_abstract: bool,
    pub(crate) is_interface: bool,
    pub(crate) features: Vec<FeatureId>,
    pub(crate) operations: Vec<OperationId>,
    pub(crate) super_types: Vec<ClassId>,
    pub(crate) package: Option<PackageId>,
}

impl ClassDescriptor {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            is_interface: false,
            features: Vec::new(),
            operations: Vec::new(),
            super_types: Vec::new(),
            package: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// Whether instances of exactly this class can be created.
    pub fn is_instantiable(&self) -> bool {
        !self.is_abstract && !self.is_interface
    }

    /// Own features, in declaration order.
    pub fn features(&self) -> &[FeatureId] {
        &self.features
    }

    /// Own operations, in declaration order.
    pub fn operations(&self) -> &[OperationId] {
        &self.operations
    }

    /// Direct supertypes, in declaration order.
    pub fn super_types(&self) -> &[ClassId] {
        &self.super_types
    }

    /// The package this class was added to.
    pub fn package(&self) -> Option<PackageId> {
        self.package
    }
}

/// A parameter of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: Option<Classifier>,
}

/// A behavioral feature of a class. Implementations are registered with
/// the graph that invokes them.
#[derive(Clone, Debug)]
pub struct OperationDescriptor {
    pub(crate) name: String,
    pub(crate) ty: Option<Classifier>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) owner: ClassId,
}

impl OperationDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return type, `None` for operations returning nothing.
    pub fn ty(&self) -> Option<Classifier> {
        self.ty
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn owner(&self) -> ClassId {
        self.owner
    }
}
