//! Structural feature descriptors: attributes and references.

use crate::{ClassId, Classifier, FeatureId};

/// Upper bound marking a many-valued feature with no limit.
pub const UNBOUNDED: i32 = -1;

/// What kind of slot a structural feature describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureKind {
    /// A value-typed slot.
    Attribute {
        /// Whether the attribute identifies its object within a resource.
        id: bool,
    },
    /// An instance-typed slot.
    Reference {
        containment: bool,
        opposite: Option<FeatureId>,
        resolve_proxies: bool,
    },
}

/// A typed, cardinality-bounded slot of a class.
#[derive(Clone, Debug)]
pub struct StructuralFeature {
    pub(crate) name: String,
    pub(crate) ty: Option<Classifier>,
    pub(crate) lower_bound: i32,
    pub(crate) upper_bound: i32,
    pub(crate) changeable: bool,
    pub(crate) volatile: bool,
    pub(crate) transient: bool,
    pub(crate) unsettable: bool,
    pub(crate) derived: bool,
    pub(crate) default_literal: Option<String>,
    pub(crate) owner: Option<ClassId>,
    pub(crate) feature_id: usize,
    pub(crate) kind: FeatureKind,
}

impl StructuralFeature {
    pub(crate) fn new(name: impl Into<String>, ty: Option<Classifier>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            ty,
            lower_bound: 0,
            upper_bound: 1,
            changeable: true,
            volatile: false,
            transient: false,
            unsettable: false,
            derived: false,
            default_literal: None,
            owner: None,
            feature_id: 0,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value type.
    pub fn ty(&self) -> Option<Classifier> {
        self.ty
    }

    pub fn lower_bound(&self) -> i32 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> i32 {
        self.upper_bound
    }

    /// Whether the feature holds a list.
    pub fn is_many(&self) -> bool {
        self.upper_bound > 1 || self.upper_bound == UNBOUNDED
    }

    pub fn is_required(&self) -> bool {
        self.lower_bound >= 1
    }

    pub fn is_changeable(&self) -> bool {
        self.changeable
    }

    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn is_unsettable(&self) -> bool {
        self.unsettable
    }

    pub fn is_derived(&self) -> bool {
        self.derived
    }

    /// The default value literal, converted lazily by the type's converter.
    pub fn default_literal(&self) -> Option<&str> {
        self.default_literal.as_deref()
    }

    /// The class this feature was added to.
    pub fn owner(&self) -> Option<ClassId> {
        self.owner
    }

    /// Index of this feature among its owner's own features.
    pub fn feature_id(&self) -> usize {
        self.feature_id
    }

    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, FeatureKind::Attribute { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { .. })
    }

    pub fn is_id(&self) -> bool {
        matches!(self.kind, FeatureKind::Attribute { id: true })
    }

    pub fn is_containment(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                containment: true,
                ..
            }
        )
    }

    pub fn opposite(&self) -> Option<FeatureId> {
        match self.kind {
            FeatureKind::Reference { opposite, .. } => opposite,
            FeatureKind::Attribute { .. } => None,
        }
    }

    pub fn resolves_proxies(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                resolve_proxies: true,
                ..
            }
        )
    }

    // === Builder-style setters ===

    pub fn set_lower_bound(&mut self, bound: i32) -> &mut Self {
        self.lower_bound = bound;
        self
    }

    pub fn set_upper_bound(&mut self, bound: i32) -> &mut Self {
        self.upper_bound = bound;
        self
    }

    /// Shorthand for an unbounded upper bound.
    pub fn set_many(&mut self) -> &mut Self {
        self.set_upper_bound(UNBOUNDED)
    }

    pub fn set_changeable(&mut self, changeable: bool) -> &mut Self {
        self.changeable = changeable;
        self
    }

    pub fn set_volatile(&mut self, volatile: bool) -> &mut Self {
        self.volatile = volatile;
        self
    }

    pub fn set_transient(&mut self, transient: bool) -> &mut Self {
        self.transient = transient;
        self
    }

    pub fn set_unsettable(&mut self, unsettable: bool) -> &mut Self {
        self.unsettable = unsettable;
        self
    }

    pub fn set_derived(&mut self, derived: bool) -> &mut Self {
        self.derived = derived;
        self
    }

    pub fn set_default_literal(&mut self, literal: Option<String>) -> &mut Self {
        self.default_literal = literal;
        self
    }

    /// Mark an attribute as the identifier of its object. No effect on references.
    pub fn set_id(&mut self, is_id: bool) -> &mut Self {
        if let FeatureKind::Attribute { id } = &mut self.kind {
            *id = is_id;
        }
        self
    }

    /// No effect on attributes.
    pub fn set_containment(&mut self, value: bool) -> &mut Self {
        if let FeatureKind::Reference { containment, .. } = &mut self.kind {
            *containment = value;
        }
        self
    }

    /// No effect on attributes.
    pub fn set_resolve_proxies(&mut self, value: bool) -> &mut Self {
        if let FeatureKind::Reference {
            resolve_proxies, ..
        } = &mut self.kind
        {
            *resolve_proxies = value;
        }
        self
    }

    // Opposites are paired through the metamodel so both ends stay in sync.
    pub(crate) fn set_opposite_raw(&mut self, value: Option<FeatureId>) {
        if let FeatureKind::Reference { opposite, .. } = &mut self.kind {
            *opposite = value;
        }
    }
}
