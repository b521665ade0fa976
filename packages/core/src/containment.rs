//! Containment: the single-owner relation between instances.
//!
//! An instance sits in at most one containment slot at a time, or is a
//! root of a resource. Every mutation path that places an instance into a
//! containment slot goes through [`Graph::remove_from_container`] first.

use objgraph_meta::{FeatureId, ObjectId, Value};

use crate::notification::EventKind;
use crate::object::Slot;
use crate::{Error, Graph, Result};

impl Graph {
    /// The instance whose containment slot holds `obj`.
    pub fn e_container(&self, obj: ObjectId) -> Option<ObjectId> {
        self.objects.get(obj.index())?.container.map(|(c, _)| c)
    }

    /// The containment feature of the slot holding `obj`.
    pub fn e_containing_feature(&self, obj: ObjectId) -> Option<FeatureId> {
        self.objects.get(obj.index())?.container.map(|(_, f)| f)
    }

    /// Direct children of `obj`, in feature order then list order.
    ///
    /// Proxies in containment slots are returned as they are stored.
    pub fn e_contents(&self, obj: ObjectId) -> Vec<ObjectId> {
        let Some(data) = self.objects.get(obj.index()) else {
            return Vec::new();
        };
        let Some(layout) = &data.layout else {
            return Vec::new();
        };
        let mut children = Vec::new();
        for (slot, feature) in layout.distinct() {
            if !self.metamodel.feature(feature).is_containment() {
                continue;
            }
            match data.slots[slot].value() {
                Some(Value::Object(child)) => children.push(*child),
                Some(Value::List(list)) => {
                    children.extend(self.lists[list.index()].items.iter().filter_map(Value::as_object))
                }
                _ => {}
            }
        }
        children
    }

    /// Every instance below `obj`, depth-first, parents before children.
    pub fn e_all_contents(&self, obj: ObjectId) -> Vec<ObjectId> {
        let mut result = Vec::new();
        let mut stack: Vec<ObjectId> = self.e_contents(obj).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.e_contents(next).into_iter().rev());
        }
        result
    }

    /// Whether `ancestor` is `obj` or on its container chain.
    pub fn is_ancestor(&self, ancestor: ObjectId, obj: ObjectId) -> bool {
        let mut current = Some(obj);
        while let Some(o) = current {
            if o == ancestor {
                return true;
            }
            current = self.e_container(o);
        }
        false
    }

    /// The containment that a container reference mirrors, if `feature` is one.
    pub(crate) fn mirrored_containment(&self, feature: FeatureId) -> Option<FeatureId> {
        self.metamodel
            .feature(feature)
            .opposite()
            .filter(|opposite| self.metamodel.feature(*opposite).is_containment())
    }

    pub(crate) fn check_containable(&self, container: ObjectId, child: ObjectId) -> Result<()> {
        if self.is_ancestor(child, container) {
            return Err(Error::ContainmentCycle { container, child });
        }
        Ok(())
    }

    /// Take `child` out of its containment slot or resource root list.
    ///
    /// Removal goes through the owning slot's normal mutation path, so the
    /// old container's adapters see a `Remove` or `Set`.
    pub(crate) fn remove_from_container(&mut self, child: ObjectId) -> Result<()> {
        self.leave_containment_slot(child)?;
        if let Some(resource) = self.objects[child.index()].resource {
            self.remove_root(resource, child);
        }
        Ok(())
    }

    /// Take `child` out of its containment slot, keeping it as a resource
    /// root if it is one.
    fn leave_containment_slot(&mut self, child: ObjectId) -> Result<()> {
        if let Some((container, feature)) = self.objects[child.index()].container {
            tracing::debug!(%child, from = %container, "moving out of container");
            let slot = self.slot_index(container, feature)?;
            if self.metamodel.feature(feature).is_many() {
                match self.objects[container.index()].slots[slot].value() {
                    Some(Value::List(list)) => {
                        let list = *list;
                        self.list_remove(list, &Value::Object(child))?;
                    }
                    _ => self.detach(child, feature),
                }
            } else {
                self.set_single(container, slot, feature, Value::Null)?;
            }
        }
        Ok(())
    }

    /// Prepare `resolved` to take over the containment slot of `owner`
    /// that holds `proxy`.
    ///
    /// `resolved` leaves whatever slot held it before, so it never has two
    /// owners, but stays a root of its own resource. Returns `false`, and
    /// leaves the proxy in place, when `resolved` is `owner` or one of its
    /// ancestors.
    pub(crate) fn adopt_resolved(
        &mut self,
        owner: ObjectId,
        proxy: ObjectId,
        resolved: ObjectId,
    ) -> Result<bool> {
        if self.check_containable(owner, resolved).is_err() {
            tracing::warn!(
                %proxy,
                %resolved,
                container = %owner,
                "resolved object would contain its own container"
            );
            return Ok(false);
        }
        self.leave_containment_slot(resolved)?;
        self.objects[proxy.index()].container = None;
        Ok(true)
    }

    /// Point `child` at its new container.
    pub(crate) fn attach(&mut self, child: ObjectId, container: ObjectId, feature: FeatureId) {
        let old = self.e_container(child);
        self.objects[child.index()].container = Some((container, feature));
        self.notify_container_reference(child, feature, old.into(), Value::Object(container));
    }

    /// Clear `child`'s container pointer if it still refers to `feature`.
    pub(crate) fn detach(&mut self, child: ObjectId, feature: FeatureId) {
        let Some((container, current)) = self.objects[child.index()].container else {
            return;
        };
        if current != feature {
            return;
        }
        self.objects[child.index()].container = None;
        self.notify_container_reference(child, feature, Value::Object(container), Value::Null);
    }

    /// A containment change is also a change of the child's container
    /// reference, when its class has one.
    fn notify_container_reference(
        &mut self,
        child: ObjectId,
        containment: FeatureId,
        old: Value,
        new: Value,
    ) {
        let Some(back) = self.metamodel.feature(containment).opposite() else {
            return;
        };
        if self.try_slot(child, back).is_some() && old != new {
            self.emit(child, EventKind::Set, back, old, new, None);
        }
    }

    /// Write a container reference: move `obj` into (or out of) the
    /// containment slot it mirrors.
    pub(crate) fn set_container_reference(
        &mut self,
        obj: ObjectId,
        feature: FeatureId,
        containment: FeatureId,
        value: Value,
    ) -> Result<()> {
        let current = match self.objects[obj.index()].container {
            Some((c, f)) if f == containment => Some(c),
            _ => None,
        };
        let target = value.as_object();
        if target == current {
            return Ok(());
        }
        match target {
            None => self.remove_from_container(obj),
            Some(container) => {
                tracing::debug!(%obj, %container, via = %feature, "setting container reference");
                if self.metamodel.feature(containment).is_many() {
                    let list = self.list_of(container, containment)?;
                    self.list_insert(list, None, Value::Object(obj)).map(|_| ())
                } else {
                    let slot = self.slot_index(container, containment)?;
                    self.set_single(container, slot, containment, Value::Object(obj))
                }
            }
        }
    }

    /// Current container if held through `containment`.
    pub(crate) fn container_via(&self, obj: ObjectId, containment: FeatureId) -> Value {
        match self.objects[obj.index()].container {
            Some((c, f)) if f == containment => Value::Object(c),
            _ => Value::Null,
        }
    }

    pub(crate) fn stored(&self, obj: ObjectId, slot: usize) -> &Slot {
        &self.objects[obj.index()].slots[slot]
    }
}
