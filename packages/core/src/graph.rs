//! The instance arena.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use objgraph_meta::{ClassId, FeatureId, ListId, Metamodel, ObjectId, OperationId, Value};

use crate::adapter::AdapterEntry;
use crate::list::ListData;
use crate::notification::{EventKind, Notification};
use crate::object::{ClassLayout, ObjectData};
use crate::resource::{ResourceData, ResourceLoader};
use crate::{Error, GraphOptions, Result, Uri};

/// Implementation of an operation, invoked with the target and arguments.
pub type OperationBody = Rc<dyn Fn(&mut Graph, ObjectId, &[Value]) -> Result<Value>>;

/// An arena of instances described by one [`Metamodel`].
///
/// Instances, lists, adapters and resources live in arenas owned by the
/// graph and are addressed by handles. Containers, opposites and resource
/// roots are handle relations, so the graph has no reference cycles.
///
/// The graph is single-threaded. Adapter callbacks receive `&mut Graph`
/// and may mutate it while a notification is being delivered.
pub struct Graph {
    pub(crate) metamodel: Rc<Metamodel>,
    pub(crate) options: GraphOptions,
    pub(crate) objects: Vec<ObjectData>,
    pub(crate) lists: Vec<ListData>,
    pub(crate) adapters: Vec<AdapterEntry>,
    pub(crate) resources: Vec<ResourceData>,
    pub(crate) loader: Option<Box<dyn ResourceLoader>>,
    layouts: HashMap<ClassId, Rc<ClassLayout>>,
    operations: HashMap<OperationId, OperationBody>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("options", &self.options)
            .field("objects", &self.objects.len())
            .field("lists", &self.lists.len())
            .field("adapters", &self.adapters.len())
            .field("resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

impl Graph {
    /// Create an empty graph with default options.
    pub fn new(metamodel: Rc<Metamodel>) -> Self {
        Self::with_options(metamodel, GraphOptions::default())
    }

    pub fn with_options(metamodel: Rc<Metamodel>, options: GraphOptions) -> Self {
        Self {
            metamodel,
            options,
            objects: Vec::new(),
            lists: Vec::new(),
            adapters: Vec::new(),
            resources: Vec::new(),
            loader: None,
            layouts: HashMap::new(),
            operations: HashMap::new(),
        }
    }

    pub fn metamodel(&self) -> &Rc<Metamodel> {
        &self.metamodel
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// Number of instances ever created, proxies included.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    // === Creation ===

    /// Create an instance of `class` with every feature unset.
    ///
    /// # Errors
    ///
    /// Abstract classes and interfaces cannot be instantiated.
    pub fn create(&mut self, class: ClassId) -> Result<ObjectId> {
        let descriptor = self.metamodel.class(class);
        if !descriptor.is_instantiable() {
            return Err(Error::AbstractClass {
                class: descriptor.name().to_string(),
            });
        }
        let layout = self.layout(class);
        let id = ObjectId::from_index(self.objects.len());
        self.objects
            .push(ObjectData::instance(class, layout, self.options.deliver_by_default));
        Ok(id)
    }

    /// Create a proxy standing in for the object at `uri`.
    ///
    /// Only [`is_proxy`](Self::is_proxy), [`proxy_uri`](Self::proxy_uri),
    /// the adapter protocol and, when `expected` is given,
    /// [`class_of`](Self::class_of) work on a proxy until it is resolved.
    pub fn create_proxy(&mut self, uri: Uri, expected: Option<ClassId>) -> ObjectId {
        let id = ObjectId::from_index(self.objects.len());
        self.objects.push(ObjectData::proxy(
            uri,
            expected,
            self.options.deliver_by_default,
        ));
        id
    }

    fn layout(&mut self, class: ClassId) -> Rc<ClassLayout> {
        let metamodel = &self.metamodel;
        Rc::clone(
            self.layouts
                .entry(class)
                .or_insert_with(|| Rc::new(ClassLayout::new(metamodel, class))),
        )
    }

    // === Handle access ===

    pub(crate) fn data(&self, obj: ObjectId) -> Result<&ObjectData> {
        self.objects
            .get(obj.index())
            .ok_or_else(|| Error::invalid_handle(obj))
    }

    pub(crate) fn list_data(&self, list: ListId) -> Result<&ListData> {
        self.lists
            .get(list.index())
            .ok_or_else(|| Error::invalid_handle(list))
    }

    /// Slot position of `feature` on `obj`.
    ///
    /// This is the gate for every reflective call: it fails for proxies and
    /// for features outside the instance's class.
    pub(crate) fn slot_index(&self, obj: ObjectId, feature: FeatureId) -> Result<usize> {
        let data = self.data(obj)?;
        let Some(descriptor) = self.metamodel.get_feature(feature) else {
            return Err(Error::invalid_handle(feature));
        };
        if let Some(uri) = &data.proxy_uri {
            return Err(Error::UnresolvedProxy { uri: uri.clone() });
        }
        data.layout
            .as_ref()
            .and_then(|layout| layout.slot(feature))
            .ok_or_else(|| Error::FeatureNotInClass {
                feature: descriptor.name().to_string(),
                class: data
                    .class
                    .map(|c| self.metamodel.class(c).name().to_string())
                    .unwrap_or_default(),
            })
    }

    /// Slot position of `feature` on `obj`, or `None` when either does not apply.
    pub(crate) fn try_slot(&self, obj: ObjectId, feature: FeatureId) -> Option<usize> {
        let data = self.objects.get(obj.index())?;
        data.layout.as_ref()?.slot(feature)
    }

    // === Class queries ===

    /// The class of an instance, or the expected class of a proxy.
    ///
    /// # Errors
    ///
    /// Fails for a proxy created without an expected class.
    pub fn class_of(&self, obj: ObjectId) -> Result<ClassId> {
        let data = self.data(obj)?;
        match (data.class, &data.proxy_uri) {
            (Some(class), _) => Ok(class),
            (None, Some(uri)) => Err(Error::UnresolvedProxy { uri: uri.clone() }),
            (None, None) => Err(Error::invalid_handle(obj)),
        }
    }

    /// Whether `obj` is an instance of `class` or of one of its subclasses.
    pub fn is_instance(&self, class: ClassId, obj: ObjectId) -> bool {
        self.class_of(obj)
            .map(|c| self.metamodel.is_super_type_of(class, c))
            .unwrap_or(false)
    }

    /// Find a feature of the instance's class by name.
    pub fn feature_named(&self, obj: ObjectId, name: &str) -> Result<FeatureId> {
        let class = self.class_of(obj)?;
        self.metamodel
            .structural_feature(class, name)
            .ok_or_else(|| Error::FeatureNotInClass {
                feature: name.to_string(),
                class: self.metamodel.class(class).name().to_string(),
            })
    }

    // === Operations ===

    /// Register the implementation invoked for `operation` on any instance
    /// whose class has it.
    pub fn implement_operation<F>(&mut self, operation: OperationId, body: F)
    where
        F: Fn(&mut Graph, ObjectId, &[Value]) -> Result<Value> + 'static,
    {
        self.operations.insert(operation, Rc::new(body));
    }

    /// Invoke an operation on an instance.
    ///
    /// # Errors
    ///
    /// Fails for proxies, for operations outside the instance's class, and
    /// for operations without a registered implementation.
    pub fn invoke(&mut self, obj: ObjectId, operation: OperationId, args: &[Value]) -> Result<Value> {
        if let Some(uri) = &self.data(obj)?.proxy_uri {
            return Err(Error::UnresolvedProxy { uri: uri.clone() });
        }
        let class = self.class_of(obj)?;
        let name = self
            .metamodel
            .get_operation(operation)
            .ok_or_else(|| Error::invalid_handle(operation))?
            .name()
            .to_string();
        if !self.metamodel.all_operations(class).contains(&operation) {
            return Err(Error::OperationNotInClass {
                operation: name,
                class: self.metamodel.class(class).name().to_string(),
            });
        }
        let body = self
            .operations
            .get(&operation)
            .cloned()
            .ok_or(Error::OperationNotImplemented { operation: name })?;
        body(self, obj, args)
    }

    // === Notification emission ===

    /// Emit a change notification for `obj` if anyone is listening.
    ///
    /// Single-valued feature notifications carry the feature default so
    /// adapters can test [`Notification::is_reset`].
    pub(crate) fn emit(
        &mut self,
        obj: ObjectId,
        kind: EventKind,
        feature: FeatureId,
        old_value: Value,
        new_value: Value,
        position: Option<usize>,
    ) {
        if !self.notification_required(obj) {
            return;
        }
        let mut notification =
            Notification::new(obj, kind, Some(feature), old_value, new_value, position);
        if !self.metamodel.feature(feature).is_many() {
            if let Ok(default) = self.metamodel.default_value(feature) {
                notification = notification.with_feature_default(default);
            }
        }
        self.notify(notification);
    }
}
