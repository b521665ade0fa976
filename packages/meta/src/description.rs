//! Building packages from serde descriptions.
//!
//! A description names types instead of holding handles, so a whole
//! package can be written as JSON and loaded into a [`Metamodel`]:
//!
//! ```rust
//! use objgraph_meta::Metamodel;
//!
//! let json = r#"{
//!     "name": "family",
//!     "ns_uri": "urn:family",
//!     "classes": [{
//!         "name": "Person",
//!         "attributes": [{ "name": "name", "type": "String" }],
//!         "references": [{
//!             "name": "children", "type": "Person",
//!             "upper": -1, "containment": true
//!         }]
//!     }]
//! }"#;
//!
//! let mut mm = Metamodel::new();
//! let family = mm.load_package_json(json).unwrap();
//! assert!(mm.classifier(family, "Person").is_some());
//! ```

use serde::{Deserialize, Serialize};

use crate::{ClassId, Classifier, Error, FeatureId, Metamodel, PackageId, Result};

fn yes() -> bool {
    true
}

fn one() -> i32 {
    1
}

/// A package and its classes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageDescription {
    pub name: String,
    pub ns_uri: String,
    #[serde(default)]
    pub ns_prefix: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassDescription>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDescription {
    pub name: String,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default, rename = "interface")]
    pub is_interface: bool,
    #[serde(default)]
    pub super_types: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDescription>,
    #[serde(default)]
    pub references: Vec<ReferenceDescription>,
    #[serde(default)]
    pub operations: Vec<OperationDescription>,
}

/// Flags shared by attributes and references.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub lower: i32,
    #[serde(default = "one")]
    pub upper: i32,
    #[serde(default = "yes")]
    pub changeable: bool,
    #[serde(default)]
    pub volatile: bool,
    #[serde(default)]
    pub transient: bool,
    #[serde(default)]
    pub unsettable: bool,
    #[serde(default)]
    pub derived: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            lower: 0,
            upper: 1,
            changeable: true,
            volatile: false,
            transient: false,
            unsettable: false,
            derived: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(flatten)]
    pub flags: FeatureFlags,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub id: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(flatten)]
    pub flags: FeatureFlags,
    #[serde(default)]
    pub containment: bool,
    /// Name of the opposite reference on the referenced class.
    #[serde(default)]
    pub opposite: Option<String>,
    #[serde(default = "yes")]
    pub resolve_proxies: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationDescription {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescription>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescription {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
}

impl Metamodel {
    /// Decode a JSON package description and load it.
    pub fn load_package_json(&mut self, json: &str) -> Result<PackageId> {
        let description: PackageDescription = serde_json::from_str(json)?;
        self.load_package(&description)
    }

    /// Build a package from a description.
    ///
    /// Type names resolve against the package being loaded first, then
    /// against every other registered package in registration order.
    ///
    /// The package is built on a copy of the environment. On error nothing
    /// is registered and opposites in other packages are left untouched.
    pub fn load_package(&mut self, description: &PackageDescription) -> Result<PackageId> {
        let mut staged = self.clone();
        let package = staged.build_package(description)?;
        *self = staged;
        Ok(package)
    }

    fn build_package(&mut self, description: &PackageDescription) -> Result<PackageId> {
        let package = self.create_package(&description.name, &description.ns_uri);
        if let Some(prefix) = &description.ns_prefix {
            self.set_ns_prefix(package, prefix.clone());
        }

        let classes: Vec<ClassId> = description
            .classes
            .iter()
            .map(|c| {
                let id = self.create_class(package, &c.name);
                self.set_abstract(id, c.is_abstract);
                self.set_interface(id, c.is_interface);
                id
            })
            .collect();

        let mut pending_opposites: Vec<(FeatureId, ClassId, &str)> = Vec::new();
        for (class, desc) in classes.iter().copied().zip(&description.classes) {
            for name in &desc.super_types {
                let super_type = self.resolve_class(package, name)?;
                self.add_super_type(class, super_type)?;
            }
            for attribute in &desc.attributes {
                let ty = self
                    .resolve_type(package, &attribute.ty)?
                    .as_data_type()
                    .ok_or_else(|| Error::UnknownType {
                        name: attribute.ty.clone(),
                    })?;
                let id = self.add_attribute(class, &attribute.name, ty);
                self.apply_flags(id, &attribute.flags);
                self.feature_mut(id)
                    .set_default_literal(attribute.default_value.clone())
                    .set_id(attribute.id);
            }
            for reference in &desc.references {
                let ty = self.resolve_class(package, &reference.ty)?;
                let id = self.add_reference(class, &reference.name, ty);
                self.apply_flags(id, &reference.flags);
                self.feature_mut(id)
                    .set_containment(reference.containment)
                    .set_resolve_proxies(reference.resolve_proxies);
                if let Some(opposite) = &reference.opposite {
                    pending_opposites.push((id, ty, opposite));
                }
            }
            for operation in &desc.operations {
                let ty = match &operation.ty {
                    Some(name) => Some(self.resolve_type(package, name)?),
                    None => None,
                };
                let op = self.add_operation(class, &operation.name, ty);
                for parameter in &operation.parameters {
                    let ty = match &parameter.ty {
                        Some(name) => Some(self.resolve_type(package, name)?),
                        None => None,
                    };
                    self.add_parameter(op, &parameter.name, ty);
                }
            }
        }

        // Opposites may point forward to classes declared later.
        for (reference, target, opposite) in pending_opposites {
            let other = self
                .structural_feature(target, opposite)
                .filter(|f| self.feature(*f).is_reference())
                .ok_or_else(|| Error::UnknownOpposite {
                    reference: self.feature(reference).name().to_string(),
                    opposite: opposite.to_string(),
                })?;
            self.set_opposite(reference, Some(other));
        }

        tracing::debug!(
            package = %description.name,
            classes = classes.len(),
            "loaded package description"
        );
        Ok(package)
    }

    fn apply_flags(&mut self, feature: FeatureId, flags: &FeatureFlags) {
        self.feature_mut(feature)
            .set_lower_bound(flags.lower)
            .set_upper_bound(flags.upper)
            .set_changeable(flags.changeable)
            .set_volatile(flags.volatile)
            .set_transient(flags.transient)
            .set_unsettable(flags.unsettable)
            .set_derived(flags.derived);
    }

    fn resolve_type(&self, package: PackageId, name: &str) -> Result<Classifier> {
        self.classifier(package, name)
            .or_else(|| {
                self.packages()
                    .filter(|p| *p != package)
                    .find_map(|p| self.classifier(p, name))
            })
            .ok_or_else(|| Error::UnknownType {
                name: name.to_string(),
            })
    }

    fn resolve_class(&self, package: PackageId, name: &str) -> Result<ClassId> {
        self.resolve_type(package, name)?
            .as_class()
            .ok_or_else(|| Error::UnknownType {
                name: name.to_string(),
            })
    }
}
