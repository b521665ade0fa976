//! Resources: named groups of root objects inside a graph.
//!
//! A resource owns the roots of one or more containment trees and gives
//! every object in them a URI fragment. Fragments are either the value of
//! the object's ID attribute or a path from a root:
//!
//! * `/` and `/1` address the first and second root.
//! * `//@children.0/@pet` walks from the first root through the first
//!   element of `children` and then the single-valued `pet`.
//!
//! Resources that are not in memory yet are produced by a
//! [`ResourceLoader`] installed on the graph.

use std::fmt;

use objgraph_meta::{FeatureId, ObjectId, Value};

use crate::object::Slot;
use crate::{Error, Graph, Result, Uri};

/// Handle of a resource in a graph.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourceId(u32);

impl ResourceId {
    pub fn from_index(index: usize) -> Self {
        ResourceId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct ResourceData {
    uri: Uri,
    contents: Vec<ObjectId>,
    loaded: bool,
}

/// Fills a resource that was requested but is not loaded.
///
/// The loader receives the graph and populates the resource through the
/// normal API, typically `create`, `set` and [`Graph::add_root`]. It is
/// taken out of the graph for the duration of the call, so a nested load
/// from inside a loader fails instead of recursing.
pub trait ResourceLoader {
    fn load(&mut self, graph: &mut Graph, resource: ResourceId) -> Result<()>;
}

impl<F> ResourceLoader for F
where
    F: FnMut(&mut Graph, ResourceId) -> Result<()>,
{
    fn load(&mut self, graph: &mut Graph, resource: ResourceId) -> Result<()> {
        self(graph, resource)
    }
}

impl Graph {
    /// The resource for `uri`, created empty if the graph has none.
    ///
    /// Any fragment on `uri` is ignored.
    pub fn create_resource(&mut self, uri: impl Into<Uri>) -> ResourceId {
        let uri = uri.into().trim_fragment();
        if let Some(existing) = self.find_resource(&uri) {
            return existing;
        }
        let id = ResourceId::from_index(self.resources.len());
        tracing::debug!(resource = %id, %uri, "created resource");
        self.resources.push(ResourceData {
            uri,
            contents: Vec::new(),
            loaded: false,
        });
        id
    }

    fn find_resource(&self, uri: &Uri) -> Option<ResourceId> {
        self.resources
            .iter()
            .position(|r| r.uri.resource() == uri.resource())
            .map(ResourceId::from_index)
    }

    fn resource_data(&self, resource: ResourceId) -> Result<&ResourceData> {
        self.resources
            .get(resource.index())
            .ok_or_else(|| Error::invalid_handle(resource))
    }

    pub fn resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        (0..self.resources.len()).map(ResourceId::from_index)
    }

    pub fn resource_uri(&self, resource: ResourceId) -> Result<&Uri> {
        Ok(&self.resource_data(resource)?.uri)
    }

    /// Root objects, in order.
    pub fn resource_contents(&self, resource: ResourceId) -> &[ObjectId] {
        self.resources
            .get(resource.index())
            .map(|r| r.contents.as_slice())
            .unwrap_or_default()
    }

    /// Whether the resource has been loaded or has had roots added.
    pub fn is_loaded(&self, resource: ResourceId) -> bool {
        self.resources.get(resource.index()).is_some_and(|r| r.loaded)
    }

    /// Install the loader used for resources requested on demand.
    pub fn set_loader(&mut self, loader: impl ResourceLoader + 'static) {
        self.loader = Some(Box::new(loader));
    }

    /// Append `obj` to the resource's roots.
    ///
    /// The object first leaves its container, or the roots of another
    /// resource.
    pub fn add_root(&mut self, resource: ResourceId, obj: ObjectId) -> Result<()> {
        self.resource_data(resource)?;
        if self.data(obj)?.resource == Some(resource) {
            return Ok(());
        }
        self.remove_from_container(obj)?;
        let data = &mut self.resources[resource.index()];
        data.contents.push(obj);
        data.loaded = true;
        self.objects[obj.index()].resource = Some(resource);
        Ok(())
    }

    /// Remove `obj` from the resource's roots. Returns `false` if it was
    /// not a root there.
    pub fn remove_root(&mut self, resource: ResourceId, obj: ObjectId) -> bool {
        let Some(data) = self.resources.get_mut(resource.index()) else {
            return false;
        };
        let Some(position) = data.contents.iter().position(|o| *o == obj) else {
            return false;
        };
        data.contents.remove(position);
        self.objects[obj.index()].resource = None;
        true
    }

    /// The resource holding `obj`, directly as a root or through its
    /// container chain.
    pub fn e_resource(&self, obj: ObjectId) -> Option<ResourceId> {
        let mut current = obj;
        loop {
            let data = self.objects.get(current.index())?;
            if let Some(resource) = data.resource {
                return Some(resource);
            }
            current = data.container?.0;
        }
    }

    /// Look up a resource by URI, loading it when asked to.
    ///
    /// Without `load_on_demand` only resources already known to the graph
    /// are returned. With it, unknown resources are created and any
    /// unloaded resource is handed to the installed loader.
    ///
    /// # Errors
    ///
    /// Fails when a load is needed and there is no loader, or the loader
    /// fails.
    pub fn resource_by_uri(&mut self, uri: &Uri, load_on_demand: bool) -> Result<Option<ResourceId>> {
        let existing = self.find_resource(uri);
        if !load_on_demand {
            return Ok(existing);
        }
        let resource = match existing {
            Some(resource) if self.is_loaded(resource) => return Ok(Some(resource)),
            Some(resource) => resource,
            None => self.create_resource(uri.clone()),
        };
        self.load(resource)?;
        Ok(Some(resource))
    }

    /// Run the installed loader for `resource`.
    pub fn load(&mut self, resource: ResourceId) -> Result<()> {
        let uri = self.resource_uri(resource)?.clone();
        let Some(mut loader) = self.loader.take() else {
            return Err(Error::Load {
                uri,
                message: "no resource loader installed".to_string(),
            });
        };
        tracing::debug!(%resource, %uri, "loading resource");
        self.resources[resource.index()].loaded = true;
        let result = loader.load(self, resource);
        self.loader = Some(loader);
        if let Err(err) = &result {
            tracing::warn!(%resource, %uri, %err, "resource load failed");
            self.resources[resource.index()].loaded = false;
        }
        result
    }

    // === Fragments ===

    /// Value of the object's ID attribute, when it has one and it is set.
    pub fn id_of(&self, obj: ObjectId) -> Option<String> {
        let class = self.objects.get(obj.index())?.class?;
        let feature = self
            .metamodel
            .all_attributes(class)
            .into_iter()
            .find(|f| self.metamodel.feature(*f).is_id())?;
        let slot = self.try_slot(obj, feature)?;
        match self.stored(obj, slot) {
            Slot::Set(Value::String(s)) => Some(s.clone()),
            Slot::Set(Value::Null) | Slot::Unset => None,
            Slot::Set(other) => Some(other.to_string()),
        }
    }

    /// The fragment addressing `obj` inside its resource.
    ///
    /// Objects with an ID use it. Others get a path from their root.
    /// Returns `None` for objects outside any resource.
    pub fn uri_fragment(&self, obj: ObjectId) -> Option<String> {
        if let Some(id) = self.id_of(obj) {
            return Some(id);
        }
        let mut segments = Vec::new();
        let mut current = obj;
        loop {
            let data = self.objects.get(current.index())?;
            if let Some(resource) = data.resource {
                let index = self.resource_contents(resource).iter().position(|o| *o == current)?;
                let root = if index == 0 {
                    "/".to_string()
                } else {
                    format!("/{}", index)
                };
                segments.reverse();
                return Some(if segments.is_empty() {
                    root
                } else {
                    format!("{}/{}", root, segments.join("/"))
                });
            }
            let (container, feature) = data.container?;
            segments.push(self.path_segment(container, feature, current)?);
            current = container;
        }
    }

    fn path_segment(&self, container: ObjectId, feature: FeatureId, child: ObjectId) -> Option<String> {
        let f = self.metamodel.feature(feature);
        if !f.is_many() {
            return Some(format!("@{}", f.name()));
        }
        let slot = self.try_slot(container, feature)?;
        let Slot::Set(Value::List(list)) = self.stored(container, slot) else {
            return None;
        };
        let index = self.lists[list.index()]
            .items
            .iter()
            .position(|v| *v == Value::Object(child))?;
        Some(format!("@{}.{}", f.name(), index))
    }

    /// Find the object a fragment addresses in a resource.
    ///
    /// Paths are followed through stored values without resolving
    /// proxies. A fragment that is not a path is matched against ID
    /// attribute values of every object in the resource.
    pub fn object_by_fragment(&self, resource: ResourceId, fragment: &str) -> Option<ObjectId> {
        let roots = self.resource_contents(resource);
        let Some(path) = fragment.strip_prefix('/') else {
            return roots
                .iter()
                .flat_map(|root| std::iter::once(*root).chain(self.e_all_contents(*root)))
                .find(|obj| self.id_of(*obj).as_deref() == Some(fragment));
        };

        let mut segments = path.split('/');
        let root_index = match segments.next() {
            None | Some("") => 0,
            Some(index) => index.parse::<usize>().ok()?,
        };
        let mut current = *roots.get(root_index)?;
        for segment in segments {
            current = self.follow_segment(current, segment)?;
        }
        Some(current)
    }

    fn follow_segment(&self, obj: ObjectId, segment: &str) -> Option<ObjectId> {
        let segment = segment.strip_prefix('@')?;
        let (name, index) = match segment.rsplit_once('.') {
            Some((name, index)) => (name, Some(index.parse::<usize>().ok()?)),
            None => (segment, None),
        };
        let class = self.objects.get(obj.index())?.class?;
        let feature = self.metamodel.structural_feature(class, name)?;
        let slot = self.try_slot(obj, feature)?;
        match (self.stored(obj, slot), index) {
            (Slot::Set(Value::List(list)), Some(index)) => {
                self.lists[list.index()].items.get(index)?.as_object()
            }
            (Slot::Set(Value::Object(child)), None) => Some(*child),
            _ => None,
        }
    }

    /// Full URI of `obj`: its resource's URI with its fragment.
    pub fn uri_of(&self, obj: ObjectId) -> Option<Uri> {
        let resource = self.e_resource(obj)?;
        let fragment = self.uri_fragment(obj)?;
        Some(self.resource_uri(resource).ok()?.with_fragment(fragment))
    }
}
