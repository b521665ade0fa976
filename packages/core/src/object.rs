//! Per-instance storage.

use std::collections::HashMap;

use objgraph_meta::{ClassId, FeatureId, Metamodel, ObjectId, Value};

use crate::{AdapterId, ResourceId, Uri};

/// Slot positions of a class's features, shared by all its instances.
///
/// Positions follow `Metamodel::all_structural_features`. A feature listed
/// twice through diamond inheritance maps to its first position.
#[derive(Debug)]
pub(crate) struct ClassLayout {
    pub(crate) features: Vec<FeatureId>,
    index: HashMap<FeatureId, usize>,
}

impl ClassLayout {
    pub(crate) fn new(metamodel: &Metamodel, class: ClassId) -> Self {
        let features = metamodel.all_structural_features(class);
        let mut index = HashMap::with_capacity(features.len());
        for (i, f) in features.iter().enumerate() {
            index.entry(*f).or_insert(i);
        }
        Self { features, index }
    }

    pub(crate) fn slot(&self, feature: FeatureId) -> Option<usize> {
        self.index.get(&feature).copied()
    }

    /// Features in slot order, skipping repeated diamond entries.
    pub(crate) fn distinct(&self) -> impl Iterator<Item = (usize, FeatureId)> + '_ {
        self.features
            .iter()
            .enumerate()
            .filter(|&(i, f)| self.index.get(f) == Some(&i))
            .map(|(i, f)| (i, *f))
    }
}

/// Storage state of one feature slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) enum Slot {
    /// Never set, or unset since.
    #[default]
    Unset,
    /// Explicit value; for many-valued features, the list handle.
    Set(Value),
}

impl Slot {
    pub(crate) fn value(&self) -> Option<&Value> {
        match self {
            Slot::Unset => None,
            Slot::Set(v) => Some(v),
        }
    }
}

/// A graph node.
#[derive(Debug)]
pub(crate) struct ObjectData {
    /// `None` only for proxies created without an expected class.
    pub(crate) class: Option<ClassId>,
    pub(crate) layout: Option<std::rc::Rc<ClassLayout>>,
    pub(crate) slots: Vec<Slot>,
    pub(crate) container: Option<(ObjectId, FeatureId)>,
    /// Set only while the object is a root of a resource.
    pub(crate) resource: Option<ResourceId>,
    pub(crate) adapters: Vec<AdapterId>,
    pub(crate) deliver: bool,
    pub(crate) proxy_uri: Option<Uri>,
}

impl ObjectData {
    pub(crate) fn instance(class: ClassId, layout: std::rc::Rc<ClassLayout>, deliver: bool) -> Self {
        Self {
            class: Some(class),
            slots: vec![Slot::Unset; layout.features.len()],
            layout: Some(layout),
            container: None,
            resource: None,
            adapters: Vec::new(),
            deliver,
            proxy_uri: None,
        }
    }

    pub(crate) fn proxy(uri: Uri, expected: Option<ClassId>, deliver: bool) -> Self {
        Self {
            class: expected,
            layout: None,
            slots: Vec::new(),
            container: None,
            resource: None,
            adapters: Vec::new(),
            deliver,
            proxy_uri: Some(uri),
        }
    }
}
