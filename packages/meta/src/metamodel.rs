//! The metamodel environment: an arena of packages, classes, features,
//! operations and data types.
//!
//! A `Metamodel` is built once, then shared (usually behind `Rc`) by every
//! graph whose instances it describes. All queries are pure functions of
//! the descriptor arena.

use std::rc::Rc;

use crate::class::{ClassDescriptor, OperationDescriptor, Parameter};
use crate::converter::{Primitive, ValueConverter};
use crate::feature::{FeatureKind, StructuralFeature};
use crate::package::{DataType, Package};
use crate::{
    ClassId, Classifier, DataTypeId, Error, FeatureId, OperationId, PackageId, Result, Value,
};

/// Namespace URI of the built-in primitive package.
pub const PRIMITIVES_NS_URI: &str = "urn:objgraph:primitives";

/// Explicit, passed-in registry of every descriptor a graph may use.
#[derive(Clone, Debug)]
pub struct Metamodel {
    packages: Vec<Package>,
    classes: Vec<ClassDescriptor>,
    features: Vec<StructuralFeature>,
    operations: Vec<OperationDescriptor>,
    data_types: Vec<DataType>,
    primitives: PackageId,
}

impl Default for Metamodel {
    fn default() -> Self {
        Self::new()
    }
}

impl Metamodel {
    /// Create an environment holding only the primitive package.
    pub fn new() -> Self {
        let mut mm = Self {
            packages: Vec::new(),
            classes: Vec::new(),
            features: Vec::new(),
            operations: Vec::new(),
            data_types: Vec::new(),
            primitives: PackageId::from_index(0),
        };
        let primitives = mm.create_package("primitives", PRIMITIVES_NS_URI);
        for p in Primitive::ALL {
            mm.create_data_type(primitives, p.name(), Rc::new(p));
        }
        mm.primitives = primitives;
        mm
    }

    // === Packages ===

    pub fn create_package(&mut self, name: impl Into<String>, ns_uri: impl Into<String>) -> PackageId {
        let name = name.into();
        let id = PackageId::from_index(self.packages.len());
        self.packages.push(Package {
            ns_prefix: name.clone(),
            name,
            ns_uri: ns_uri.into(),
            classifiers: Vec::new(),
        });
        id
    }

    pub fn set_ns_prefix(&mut self, package: PackageId, prefix: impl Into<String>) {
        self.packages[package.index()].ns_prefix = prefix.into();
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn packages(&self) -> impl Iterator<Item = PackageId> + '_ {
        (0..self.packages.len()).map(PackageId::from_index)
    }

    pub fn package_by_ns_uri(&self, ns_uri: &str) -> Option<PackageId> {
        self.packages
            .iter()
            .position(|p| p.ns_uri == ns_uri)
            .map(PackageId::from_index)
    }

    /// The built-in package of primitive data types.
    pub fn primitives(&self) -> PackageId {
        self.primitives
    }

    /// The data type registered for a built-in primitive.
    pub fn primitive(&self, primitive: Primitive) -> DataTypeId {
        // Primitives are registered first and in `Primitive::ALL` order.
        let index = Primitive::ALL
            .iter()
            .position(|p| *p == primitive)
            .unwrap_or_default();
        DataTypeId::from_index(index)
    }

    /// Find a classifier by name within a package.
    pub fn classifier(&self, package: PackageId, name: &str) -> Option<Classifier> {
        self.package(package)
            .classifiers
            .iter()
            .copied()
            .find(|c| self.classifier_name(*c) == name)
    }

    pub fn classifier_name(&self, classifier: Classifier) -> &str {
        match classifier {
            Classifier::Class(c) => self.class(c).name(),
            Classifier::DataType(d) => self.data_type(d).name(),
        }
    }

    // === Data types ===

    pub fn create_data_type(
        &mut self,
        package: PackageId,
        name: impl Into<String>,
        converter: Rc<dyn ValueConverter>,
    ) -> DataTypeId {
        let id = DataTypeId::from_index(self.data_types.len());
        self.data_types.push(DataType {
            name: name.into(),
            package: Some(package),
            converter,
        });
        self.packages[package.index()]
            .classifiers
            .push(Classifier::DataType(id));
        id
    }

    pub fn data_type(&self, id: DataTypeId) -> &DataType {
        &self.data_types[id.index()]
    }

    /// Convert a literal with the data type's converter.
    pub fn create_from_string(&self, data_type: DataTypeId, literal: &str) -> Result<Value> {
        self.data_type(data_type).converter().from_literal(literal)
    }

    /// Render a value with the data type's converter.
    pub fn convert_to_string(&self, data_type: DataTypeId, value: &Value) -> Result<String> {
        self.data_type(data_type).converter().to_literal(value)
    }

    // === Classes ===

    pub fn create_class(&mut self, package: PackageId, name: impl Into<String>) -> ClassId {
        let id = ClassId::from_index(self.classes.len());
        let mut class = ClassDescriptor::new(name);
        class.package = Some(package);
        self.classes.push(class);
        self.packages[package.index()]
            .classifiers
            .push(Classifier::Class(id));
        id
    }

    pub fn class(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.index()]
    }

    pub fn set_abstract(&mut self, class: ClassId, is_abstract: bool) {
        self.classes[class.index()].is_abstract = is_abstract;
    }

    pub fn set_interface(&mut self, class: ClassId, is_interface: bool) {
        self.classes[class.index()].is_interface = is_interface;
    }

    /// Append a direct supertype.
    ///
    /// # Errors
    ///
    /// Fails if `super_type` is `class` or already inherits from it.
    pub fn add_super_type(&mut self, class: ClassId, super_type: ClassId) -> Result<()> {
        if class == super_type || self.all_super_types(super_type).contains(&class) {
            return Err(Error::SuperTypeCycle {
                class: self.class(class).name.clone(),
                super_type: self.class(super_type).name.clone(),
            });
        }
        self.classes[class.index()].super_types.push(super_type);
        Ok(())
    }

    // === Structural features ===

    fn add_feature(&mut self, class: ClassId, mut feature: StructuralFeature) -> FeatureId {
        let id = FeatureId::from_index(self.features.len());
        let owner = &mut self.classes[class.index()];
        feature.owner = Some(class);
        feature.feature_id = owner.features.len();
        owner.features.push(id);
        self.features.push(feature);
        id
    }

    /// Add a single-valued attribute. Adjust bounds and flags through
    /// [`feature_mut`](Self::feature_mut).
    pub fn add_attribute(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        ty: DataTypeId,
    ) -> FeatureId {
        let feature = StructuralFeature::new(
            name,
            Some(Classifier::DataType(ty)),
            FeatureKind::Attribute { id: false },
        );
        self.add_feature(class, feature)
    }

    /// Add a single-valued, proxy-resolving, non-containment reference.
    pub fn add_reference(&mut self, class: ClassId, name: impl Into<String>, ty: ClassId) -> FeatureId {
        let feature = StructuralFeature::new(
            name,
            Some(Classifier::Class(ty)),
            FeatureKind::Reference {
                containment: false,
                opposite: None,
                resolve_proxies: true,
            },
        );
        self.add_feature(class, feature)
    }

    /// Add a single-valued containment reference.
    pub fn add_containment(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        ty: ClassId,
    ) -> FeatureId {
        let id = self.add_reference(class, name, ty);
        self.features[id.index()].set_containment(true);
        id
    }

    pub fn feature(&self, id: FeatureId) -> &StructuralFeature {
        &self.features[id.index()]
    }

    /// Like [`feature`](Self::feature), but `None` for a handle this
    /// environment never issued.
    pub fn get_feature(&self, id: FeatureId) -> Option<&StructuralFeature> {
        self.features.get(id.index())
    }

    pub fn feature_mut(&mut self, id: FeatureId) -> &mut StructuralFeature {
        &mut self.features[id.index()]
    }

    /// Pair two references as opposites, or unpair with `None`.
    ///
    /// Both ends are updated: setting one side's opposite sets the other's,
    /// and any previous partner of either side is unpaired.
    pub fn set_opposite(&mut self, reference: FeatureId, opposite: Option<FeatureId>) {
        let previous = self.feature(reference).opposite();
        if let Some(previous) = previous {
            if Some(previous) != opposite && self.feature(previous).opposite() == Some(reference) {
                self.features[previous.index()].set_opposite_raw(None);
            }
        }
        self.features[reference.index()].set_opposite_raw(opposite);

        if let Some(opposite) = opposite {
            if let Some(stale) = self.feature(opposite).opposite() {
                if stale != reference && self.feature(stale).opposite() == Some(opposite) {
                    self.features[stale.index()].set_opposite_raw(None);
                }
            }
            self.features[opposite.index()].set_opposite_raw(Some(reference));
        }
    }

    /// The computed default value of a feature.
    ///
    /// References and features without a data type default to `Null`.
    /// Attributes convert their default literal, or fall back to the
    /// converter's intrinsic default.
    pub fn default_value(&self, feature: FeatureId) -> Result<Value> {
        let f = self.feature(feature);
        if f.is_many() {
            return Ok(Value::Null);
        }
        let Some(Classifier::DataType(ty)) = f.ty() else {
            return Ok(Value::Null);
        };
        let converter = self.data_type(ty).converter();
        match f.default_literal() {
            Some(literal) => converter.from_literal(literal),
            None => Ok(converter.intrinsic_default()),
        }
    }

    // === Operations ===

    pub fn add_operation(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        ty: Option<Classifier>,
    ) -> OperationId {
        let id = OperationId::from_index(self.operations.len());
        self.operations.push(OperationDescriptor {
            name: name.into(),
            ty,
            parameters: Vec::new(),
            owner: class,
        });
        self.classes[class.index()].operations.push(id);
        id
    }

    pub fn add_parameter(
        &mut self,
        operation: OperationId,
        name: impl Into<String>,
        ty: Option<Classifier>,
    ) {
        self.operations[operation.index()].parameters.push(Parameter {
            name: name.into(),
            ty,
        });
    }

    pub fn operation(&self, id: OperationId) -> &OperationDescriptor {
        &self.operations[id.index()]
    }

    pub fn get_operation(&self, id: OperationId) -> Option<&OperationDescriptor> {
        self.operations.get(id.index())
    }

    // === Derived class queries ===

    /// Transitive closure of direct supertypes, depth-first, each class once.
    pub fn all_super_types(&self, class: ClassId) -> Vec<ClassId> {
        let mut result = Vec::new();
        self.collect_super_types(class, &mut result);
        result
    }

    fn collect_super_types(&self, class: ClassId, result: &mut Vec<ClassId>) {
        for &super_type in &self.class(class).super_types {
            if !result.contains(&super_type) {
                result.push(super_type);
                self.collect_super_types(super_type, result);
            }
        }
    }

    /// Own features followed by each direct supertype's full feature list,
    /// in supertype order.
    ///
    /// There is no deduplication: a class that inherits the same ancestor
    /// along two paths lists that ancestor's features twice. Feature IDs
    /// are positions in this list, so removing duplicates would renumber them.
    pub fn all_structural_features(&self, class: ClassId) -> Vec<FeatureId> {
        let mut result = self.class(class).features.clone();
        for &super_type in &self.class(class).super_types {
            result.extend(self.all_structural_features(super_type));
        }
        result
    }

    pub fn all_attributes(&self, class: ClassId) -> Vec<FeatureId> {
        self.all_structural_features(class)
            .into_iter()
            .filter(|f| self.feature(*f).is_attribute())
            .collect()
    }

    pub fn all_references(&self, class: ClassId) -> Vec<FeatureId> {
        self.all_structural_features(class)
            .into_iter()
            .filter(|f| self.feature(*f).is_reference())
            .collect()
    }

    pub fn all_containments(&self, class: ClassId) -> Vec<FeatureId> {
        self.all_structural_features(class)
            .into_iter()
            .filter(|f| self.feature(*f).is_containment())
            .collect()
    }

    /// Own operations followed by inherited ones, in supertype order.
    pub fn all_operations(&self, class: ClassId) -> Vec<OperationId> {
        let mut result = self.class(class).operations.clone();
        for &super_type in &self.class(class).super_types {
            for op in self.all_operations(super_type) {
                if !result.contains(&op) {
                    result.push(op);
                }
            }
        }
        result
    }

    /// Look up a feature by name among all features, first match wins.
    pub fn structural_feature(&self, class: ClassId, name: &str) -> Option<FeatureId> {
        self.all_structural_features(class)
            .into_iter()
            .find(|f| self.feature(*f).name() == name)
    }

    /// Look up a feature by its feature ID within `class`.
    pub fn structural_feature_by_id(&self, class: ClassId, feature_id: usize) -> Option<FeatureId> {
        self.all_structural_features(class).get(feature_id).copied()
    }

    /// The feature ID of `feature` within `class`: its first position in
    /// [`all_structural_features`](Self::all_structural_features).
    pub fn feature_id(&self, class: ClassId, feature: FeatureId) -> Option<usize> {
        self.all_structural_features(class)
            .iter()
            .position(|f| *f == feature)
    }

    /// Look up an operation by name among all operations.
    pub fn operation_by_name(&self, class: ClassId, name: &str) -> Option<OperationId> {
        self.all_operations(class)
            .into_iter()
            .find(|op| self.operation(*op).name() == name)
    }

    /// Whether `class` is `other` or one of its supertypes.
    pub fn is_super_type_of(&self, class: ClassId, other: ClassId) -> bool {
        class == other || self.all_super_types(other).contains(&class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        mm: Metamodel,
        named: ClassId,
        person: ClassId,
        name: FeatureId,
        children: FeatureId,
    }

    fn fixture() -> Fixture {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("family", "urn:family");
        let string = mm.primitive(Primitive::String);
        let named = mm.create_class(pkg, "Named");
        mm.set_abstract(named, true);
        let name = mm.add_attribute(named, "name", string);
        let person = mm.create_class(pkg, "Person");
        mm.add_super_type(person, named).unwrap();
        let children = mm.add_containment(person, "children", person);
        mm.feature_mut(children).set_many();
        Fixture {
            mm,
            named,
            person,
            name,
            children,
        }
    }

    #[test]
    fn primitives_are_registered() {
        let mm = Metamodel::new();
        let int = mm.primitive(Primitive::Int);
        assert_eq!(mm.data_type(int).name(), "Int");
        assert_eq!(mm.package_by_ns_uri(PRIMITIVES_NS_URI), Some(mm.primitives()));
        assert_eq!(
            mm.classifier(mm.primitives(), "Boolean"),
            Some(Classifier::DataType(mm.primitive(Primitive::Boolean)))
        );
    }

    #[test]
    fn classes_join_their_package() {
        let f = fixture();
        let pkg = f.mm.class(f.person).package().unwrap();
        assert_eq!(f.mm.package(pkg).name(), "family");
        assert_eq!(
            f.mm.classifier(pkg, "Person"),
            Some(Classifier::Class(f.person))
        );
    }

    #[test]
    fn own_features_come_before_inherited() {
        let f = fixture();
        assert_eq!(
            f.mm.all_structural_features(f.person),
            vec![f.children, f.name]
        );
        assert_eq!(f.mm.feature_id(f.person, f.name), Some(1));
        assert_eq!(f.mm.feature(f.name).feature_id(), 0);
        assert_eq!(f.mm.structural_feature(f.person, "name"), Some(f.name));
        assert_eq!(f.mm.structural_feature_by_id(f.person, 0), Some(f.children));
        assert_eq!(f.mm.structural_feature(f.person, "age"), None);
    }

    #[test]
    fn feature_kind_filters() {
        let f = fixture();
        assert_eq!(f.mm.all_attributes(f.person), vec![f.name]);
        assert_eq!(f.mm.all_references(f.person), vec![f.children]);
        assert_eq!(f.mm.all_containments(f.person), vec![f.children]);
    }

    #[test]
    fn super_type_queries() {
        let f = fixture();
        assert!(f.mm.is_super_type_of(f.named, f.person));
        assert!(f.mm.is_super_type_of(f.person, f.person));
        assert!(!f.mm.is_super_type_of(f.person, f.named));
    }

    #[test]
    fn diamond_inheritance_duplicates_features() {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("d", "urn:d");
        let int = mm.primitive(Primitive::Int);
        let top = mm.create_class(pkg, "Top");
        let x = mm.add_attribute(top, "x", int);
        let left = mm.create_class(pkg, "Left");
        let right = mm.create_class(pkg, "Right");
        let bottom = mm.create_class(pkg, "Bottom");
        mm.add_super_type(left, top).unwrap();
        mm.add_super_type(right, top).unwrap();
        mm.add_super_type(bottom, left).unwrap();
        mm.add_super_type(bottom, right).unwrap();

        assert_eq!(mm.all_super_types(bottom), vec![left, top, right]);
        assert_eq!(mm.all_structural_features(bottom), vec![x, x]);
        assert_eq!(mm.feature_id(bottom, x), Some(0));
    }

    #[test]
    fn inheritance_cycles_are_rejected() {
        let mut f = fixture();
        let err = f.mm.add_super_type(f.named, f.person).unwrap_err();
        assert!(matches!(err, Error::SuperTypeCycle { .. }));
        assert!(f.mm.add_super_type(f.person, f.person).is_err());
    }

    #[test]
    fn opposites_are_mutual() {
        let mut f = fixture();
        let parent = f.mm.add_reference(f.person, "parent", f.person);
        f.mm.set_opposite(parent, Some(f.children));
        assert_eq!(f.mm.feature(f.children).opposite(), Some(parent));

        let guardian = f.mm.add_reference(f.person, "guardian", f.person);
        f.mm.set_opposite(f.children, Some(guardian));
        assert_eq!(f.mm.feature(guardian).opposite(), Some(f.children));
        assert_eq!(f.mm.feature(parent).opposite(), None);

        f.mm.set_opposite(guardian, None);
        assert_eq!(f.mm.feature(f.children).opposite(), None);
    }

    #[test]
    fn default_values_use_converters() {
        let mut f = fixture();
        let int = f.mm.primitive(Primitive::Int);
        let age = f.mm.add_attribute(f.person, "age", int);
        assert_eq!(f.mm.default_value(age).unwrap(), Value::Integer(0));
        f.mm.feature_mut(age).set_default_literal(Some("18".to_string()));
        assert_eq!(f.mm.default_value(age).unwrap(), Value::Integer(18));
        f.mm.feature_mut(age).set_default_literal(Some("old".to_string()));
        assert!(f.mm.default_value(age).is_err());
        assert_eq!(f.mm.default_value(f.name).unwrap(), Value::Null);
        assert_eq!(f.mm.default_value(f.children).unwrap(), Value::Null);
    }

    #[test]
    fn inherited_operations() {
        let mut f = fixture();
        let greet = f.mm.add_operation(f.named, "greet", None);
        let string = f.mm.primitive(Primitive::String);
        f.mm.add_parameter(greet, "greeting", Some(string.into()));
        assert_eq!(f.mm.all_operations(f.person), vec![greet]);
        assert_eq!(f.mm.operation_by_name(f.person, "greet"), Some(greet));
        assert_eq!(f.mm.operation(greet).parameters()[0].name, "greeting");
        assert_eq!(f.mm.operation(greet).owner(), f.named);
    }
}
