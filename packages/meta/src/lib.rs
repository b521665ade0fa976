//! Metamodel layer: descriptions of classes and their features.
//!
//! This layer describes what instances look like, without holding any
//! instances:
//! - `Metamodel`: the environment owning every descriptor, passed explicitly
//!   to the graphs that use it
//! - `ClassDescriptor`: name, flags, own features and operations, supertypes
//! - `StructuralFeature`: attributes and references with cardinality and flags
//! - `DataType` + `ValueConverter`: literal conversion for attribute values
//! - `Value`: what a feature slot holds
//!
//! # Example
//!
//! ```rust
//! use objgraph_meta::{Metamodel, Primitive};
//!
//! let mut mm = Metamodel::new();
//! let pkg = mm.create_package("family", "urn:family");
//! let person = mm.create_class(pkg, "Person");
//! let name = mm.add_attribute(person, "name", mm.primitive(Primitive::String));
//! let children = mm.add_containment(person, "children", person);
//! mm.feature_mut(children).set_many();
//!
//! assert_eq!(mm.all_structural_features(person), vec![name, children]);
//! ```

mod class;
mod converter;
mod description;
mod error;
mod feature;
mod ids;
mod metamodel;
mod package;
mod value;

pub use class::{ClassDescriptor, OperationDescriptor, Parameter};
pub use converter::{Primitive, ValueConverter};
pub use description::{
    AttributeDescription, ClassDescription, FeatureFlags, OperationDescription,
    PackageDescription, ParameterDescription, ReferenceDescription,
};
pub use error::{Error, Result};
pub use feature::{FeatureKind, StructuralFeature, UNBOUNDED};
pub use ids::{ClassId, Classifier, DataTypeId, FeatureId, ListId, ObjectId, OperationId, PackageId};
pub use metamodel::{Metamodel, PRIMITIVES_NS_URI};
pub use package::{DataType, Package};
pub use value::Value;
