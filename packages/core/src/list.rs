//! Notifying lists backing many-valued features.
//!
//! Every mutation is index-checked and reported by the owning instance with
//! the list's feature. Reference and containment lists hold each object at
//! most once; containment lists also maintain the children's container
//! pointers.

use objgraph_meta::{FeatureId, ListId, ObjectId, Value};

use crate::notification::EventKind;
use crate::{Error, Graph, Result};

/// Which behavior a list has, fixed by its feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// Plain values, duplicates allowed.
    Attribute,
    /// Non-containment references.
    Reference { resolve_proxies: bool },
    /// Owned children.
    Containment { resolve_proxies: bool },
}

impl ListKind {
    pub fn is_unique(self) -> bool {
        !matches!(self, ListKind::Attribute)
    }

    pub fn is_containment(self) -> bool {
        matches!(self, ListKind::Containment { .. })
    }

    pub fn resolves_proxies(self) -> bool {
        match self {
            ListKind::Attribute => false,
            ListKind::Reference { resolve_proxies } | ListKind::Containment { resolve_proxies } => {
                resolve_proxies
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct ListData {
    pub(crate) owner: ObjectId,
    pub(crate) feature: FeatureId,
    pub(crate) kind: ListKind,
    pub(crate) items: Vec<Value>,
}

impl ListData {
    pub(crate) fn new(owner: ObjectId, feature: FeatureId, kind: ListKind) -> Self {
        Self {
            owner,
            feature,
            kind,
            items: Vec::new(),
        }
    }
}

fn check_index(index: usize, size: usize) -> Result<()> {
    if index >= size {
        return Err(Error::IndexOutOfBounds { index, size });
    }
    Ok(())
}

/// Insertion point for `index`, or the end when `None`.
fn checked_position(index: Option<usize>, size: usize) -> Result<usize> {
    match index {
        Some(index) if index > size => Err(Error::IndexOutOfBounds { index, size }),
        Some(index) => Ok(index),
        None => Ok(size),
    }
}

/// A mutable view of one list in a graph.
///
/// Obtained from [`Graph::list`]. Reads through a reference list may
/// resolve proxies and so also need the graph mutably.
#[derive(Debug)]
pub struct EList<'g> {
    graph: &'g mut Graph,
    id: ListId,
}

impl<'g> EList<'g> {
    pub fn id(&self) -> ListId {
        self.id
    }

    fn data(&self) -> &ListData {
        &self.graph.lists[self.id.index()]
    }

    /// The instance that owns this list.
    pub fn owner(&self) -> ObjectId {
        self.data().owner
    }

    pub fn feature(&self) -> FeatureId {
        self.data().feature
    }

    pub fn kind(&self) -> ListKind {
        self.data().kind
    }

    pub fn len(&self) -> usize {
        self.data().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().items.is_empty()
    }

    /// Element at `index`, resolving a proxy in a resolving list.
    pub fn get(&mut self, index: usize) -> Result<Value> {
        self.graph.list_get(self.id, index, true)
    }

    /// Element at `index` as stored, proxies left as they are.
    pub fn basic_get(&self, index: usize) -> Result<Value> {
        let items = &self.data().items;
        check_index(index, items.len())?;
        Ok(items[index].clone())
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.data().items.contains(value)
    }

    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.data().items.iter().position(|v| v == value)
    }

    /// All elements in order, resolving proxies.
    pub fn to_vec(&mut self) -> Vec<Value> {
        (0..self.len())
            .filter_map(|i| self.graph.list_get(self.id, i, true).ok())
            .collect()
    }

    /// Forward iteration over a resolved snapshot of the elements.
    pub fn iter(&mut self) -> std::vec::IntoIter<Value> {
        self.to_vec().into_iter()
    }

    /// Append a value, emitting `Add`. Returns `false` when a unique list
    /// already holds it.
    pub fn add(&mut self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        self.graph.check_element(self.id, &value)?;
        self.graph.list_insert(self.id, None, value)
    }

    /// Insert a value at `index` in `0..=len`, emitting `Add`.
    pub fn add_at(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.graph.check_element(self.id, &value)?;
        if self.kind().is_unique() && self.contains(&value) {
            return Err(self.graph.duplicate(self.id));
        }
        self.graph.list_insert(self.id, Some(index), value).map(|_| ())
    }

    /// Append a batch as one `AddMany`. Duplicates are skipped in unique
    /// lists. Returns whether anything was added.
    pub fn add_all<I>(&mut self, values: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        for v in &values {
            self.graph.check_element(self.id, v)?;
        }
        self.graph.list_add_all(self.id, None, values)
    }

    /// Remove the first element equal to `value`, emitting `Remove`.
    pub fn remove(&mut self, value: &Value) -> Result<bool> {
        self.graph.list_remove(self.id, value)
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<Value> {
        self.graph.list_remove_at(self.id, index)
    }

    /// Replace the element at `index`, returning the old element.
    ///
    /// Replacing an element with itself is a no-op.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Value> {
        let value = value.into();
        self.graph.check_element(self.id, &value)?;
        self.graph.list_set(self.id, index, value)
    }

    /// Move the element at `old_index` to `new_index`, emitting `Move`.
    pub fn move_to(&mut self, new_index: usize, old_index: usize) -> Result<Value> {
        self.graph.list_move(self.id, new_index, old_index)
    }

    /// Remove every element.
    pub fn clear(&mut self) -> Result<()> {
        self.graph.list_clear(self.id)
    }
}

impl Graph {
    /// A view of a list obtained from a many-valued feature.
    pub fn list(&mut self, list: ListId) -> Result<EList<'_>> {
        self.list_data(list)?;
        Ok(EList {
            graph: self,
            id: list,
        })
    }

    /// Shorthand for the list of a many-valued feature.
    pub fn list_for(&mut self, obj: ObjectId, feature: FeatureId) -> Result<EList<'_>> {
        let list = self.list_of(obj, feature)?;
        self.list(list)
    }

    pub(crate) fn duplicate(&self, list: ListId) -> Error {
        let feature = self.lists[list.index()].feature;
        Error::Duplicate {
            feature: self.metamodel.feature(feature).name().to_string(),
        }
    }

    pub(crate) fn check_element(&self, list: ListId, value: &Value) -> Result<()> {
        let feature = self.list_data(list)?.feature;
        self.check_value(feature, value)
    }

    pub(crate) fn list_get(&mut self, list: ListId, index: usize, resolve: bool) -> Result<Value> {
        let data = self.list_data(list)?;
        check_index(index, data.items.len())?;
        let (owner, feature, kind) = (data.owner, data.feature, data.kind);
        let value = data.items[index].clone();

        let Value::Object(proxy) = value else {
            return Ok(value);
        };
        if !resolve || !kind.resolves_proxies() || !self.is_proxy(proxy) {
            return Ok(value);
        }
        let resolved = self.resolve_proxy(proxy, owner);
        if resolved == proxy {
            return Ok(value);
        }
        if kind.is_containment() && !self.adopt_resolved(owner, proxy, resolved)? {
            return Ok(value);
        }
        // Leaving an earlier slot in this same list shifts the proxy.
        let items = &mut self.lists[list.index()].items;
        let Some(index) = items.iter().position(|v| *v == value) else {
            return Ok(value);
        };
        items[index] = Value::Object(resolved);
        if kind.is_containment() {
            self.attach(resolved, owner, feature);
        }
        Ok(Value::Object(resolved))
    }

    /// Insert at `index` (append when `None`). Unique lists ignore a value
    /// they already hold and return `false`.
    pub(crate) fn list_insert(&mut self, list: ListId, index: Option<usize>, value: Value) -> Result<bool> {
        let data = self.list_data(list)?;
        let (owner, feature, kind) = (data.owner, data.feature, data.kind);
        checked_position(index, data.items.len())?;
        if kind.is_unique() && data.items.contains(&value) {
            return Ok(false);
        }
        if let (true, Some(child)) = (kind.is_containment(), value.as_object()) {
            self.check_containable(owner, child)?;
            self.remove_from_container(child)?;
        }

        // Callbacks run by the removal above may have shrunk this list.
        let items = &mut self.lists[list.index()].items;
        let position = checked_position(index, items.len())?;
        items.insert(position, value.clone());

        self.did_add(owner, feature, kind, &value)?;
        self.emit(owner, EventKind::Add, feature, Value::Null, value, Some(position));
        Ok(true)
    }

    /// Insert a batch as one `AddMany` at `index` (append when `None`).
    pub(crate) fn list_add_all(
        &mut self,
        list: ListId,
        index: Option<usize>,
        values: Vec<Value>,
    ) -> Result<bool> {
        let data = self.list_data(list)?;
        let (owner, feature, kind) = (data.owner, data.feature, data.kind);
        checked_position(index, data.items.len())?;

        let mut batch: Vec<Value> = Vec::with_capacity(values.len());
        for value in values {
            let held = self.lists[list.index()].items.contains(&value);
            if kind.is_unique() && (held || batch.contains(&value)) {
                continue;
            }
            batch.push(value);
        }
        if batch.is_empty() {
            return Ok(false);
        }
        if kind.is_containment() {
            for child in batch.iter().filter_map(Value::as_object) {
                self.check_containable(owner, child)?;
            }
            for child in batch.iter().filter_map(Value::as_object) {
                self.remove_from_container(child)?;
            }
        }

        let items = &mut self.lists[list.index()].items;
        let start = checked_position(index, items.len())?;
        items.splice(start..start, batch.iter().cloned());

        for value in &batch {
            self.did_add(owner, feature, kind, value)?;
        }
        self.emit(owner, EventKind::AddMany, feature, Value::Null, Value::Array(batch), Some(start));
        Ok(true)
    }

    pub(crate) fn list_remove(&mut self, list: ListId, value: &Value) -> Result<bool> {
        let Some(index) = self.list_data(list)?.items.iter().position(|v| v == value) else {
            return Ok(false);
        };
        self.list_remove_at(list, index)?;
        Ok(true)
    }

    pub(crate) fn list_remove_at(&mut self, list: ListId, index: usize) -> Result<Value> {
        let data = self.list_data(list)?;
        check_index(index, data.items.len())?;
        let (owner, feature, kind) = (data.owner, data.feature, data.kind);

        let value = self.lists[list.index()].items.remove(index);
        self.did_remove(owner, feature, kind, &value)?;
        self.emit(owner, EventKind::Remove, feature, value.clone(), Value::Null, Some(index));
        Ok(value)
    }

    pub(crate) fn list_set(&mut self, list: ListId, index: usize, value: Value) -> Result<Value> {
        let data = self.list_data(list)?;
        check_index(index, data.items.len())?;
        let (owner, feature, kind) = (data.owner, data.feature, data.kind);
        let old = data.items[index].clone();
        if old == value {
            return Ok(old);
        }
        if kind.is_unique() && data.items.contains(&value) {
            return Err(self.duplicate(list));
        }
        if let (true, Some(child)) = (kind.is_containment(), value.as_object()) {
            self.check_containable(owner, child)?;
            self.remove_from_container(child)?;
        }

        self.lists[list.index()].items[index] = value.clone();
        self.did_remove(owner, feature, kind, &old)?;
        self.did_add(owner, feature, kind, &value)?;
        self.emit(owner, EventKind::Set, feature, old.clone(), value, Some(index));
        Ok(old)
    }

    pub(crate) fn list_move(&mut self, list: ListId, new_index: usize, old_index: usize) -> Result<Value> {
        let data = self.list_data(list)?;
        let size = data.items.len();
        check_index(old_index, size)?;
        check_index(new_index, size)?;
        let (owner, feature) = (data.owner, data.feature);
        if new_index == old_index {
            return Ok(data.items[old_index].clone());
        }

        let items = &mut self.lists[list.index()].items;
        let value = items.remove(old_index);
        items.insert(new_index, value.clone());
        self.emit(
            owner,
            EventKind::Move,
            feature,
            Value::Integer(old_index as i64),
            value.clone(),
            Some(new_index),
        );
        Ok(value)
    }

    /// Remove everything. One element is reported as `Remove` at 0, more as
    /// a single `RemoveMany` carrying the whole batch.
    pub(crate) fn list_clear(&mut self, list: ListId) -> Result<()> {
        let data = self.list_data(list)?;
        if data.items.is_empty() {
            return Ok(());
        }
        let (owner, feature, kind) = (data.owner, data.feature, data.kind);

        let mut removed = std::mem::take(&mut self.lists[list.index()].items);
        for value in &removed {
            self.did_remove(owner, feature, kind, value)?;
        }
        if removed.len() == 1 {
            let value = removed.remove(0);
            self.emit(owner, EventKind::Remove, feature, value, Value::Null, Some(0));
        } else {
            self.emit(owner, EventKind::RemoveMany, feature, Value::Array(removed), Value::Null, None);
        }
        Ok(())
    }

    /// Container pointer and opposite bookkeeping for a value that has
    /// just entered the list.
    fn did_add(&mut self, owner: ObjectId, feature: FeatureId, kind: ListKind, value: &Value) -> Result<()> {
        let Some(obj) = value.as_object() else {
            return Ok(());
        };
        if kind.is_containment() {
            self.attach(obj, owner, feature);
        } else if let Some(opposite) = self.metamodel.feature(feature).opposite() {
            self.inverse_add(obj, opposite, owner)?;
        }
        Ok(())
    }

    fn did_remove(&mut self, owner: ObjectId, feature: FeatureId, kind: ListKind, value: &Value) -> Result<()> {
        let Some(obj) = value.as_object() else {
            return Ok(());
        };
        if kind.is_containment() {
            self.detach(obj, feature);
        } else if let Some(opposite) = self.metamodel.feature(feature).opposite() {
            self.inverse_remove(obj, opposite, owner)?;
        }
        Ok(())
    }
}
