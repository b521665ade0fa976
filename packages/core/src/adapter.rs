//! Observers of instances.
//!
//! Adapters are registered once with the graph and then attached to any
//! number of instances. Delivery is synchronous and re-entrant: a callback
//! gets `&mut Graph` and may trigger further notifications before the
//! original delivery returns.
//!
//! A content adapter follows containment: attaching it to an instance
//! attaches it to the instance's whole subtree, and containment changes
//! delivered to it extend or shrink that coverage before the callback runs.

use std::fmt;
use std::rc::Rc;

use objgraph_meta::ObjectId;

use crate::notification::{EventKind, Notification};
use crate::{Error, Graph, Result};

/// Handle of an adapter registered with a graph.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AdapterId(u32);

impl AdapterId {
    pub fn from_index(index: usize) -> Self {
        AdapterId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "adapter#{}", self.0)
    }
}

/// Receives notifications from the instances it is attached to.
///
/// Callbacks take `&self`; adapters that record state use interior
/// mutability and must not hold a borrow across calls back into the graph.
pub trait Adapter {
    fn notify_changed(&self, graph: &mut Graph, adapter: AdapterId, notification: &Notification);
}

impl<F> Adapter for F
where
    F: Fn(&mut Graph, AdapterId, &Notification),
{
    fn notify_changed(&self, graph: &mut Graph, adapter: AdapterId, notification: &Notification) {
        self(graph, adapter, notification)
    }
}

pub(crate) struct AdapterEntry {
    adapter: Rc<dyn Adapter>,
    target: Option<ObjectId>,
    content: bool,
}

impl Graph {
    fn register(&mut self, adapter: Rc<dyn Adapter>, content: bool) -> AdapterId {
        let id = AdapterId::from_index(self.adapters.len());
        self.adapters.push(AdapterEntry {
            adapter,
            target: None,
            content,
        });
        id
    }

    /// Register an adapter that observes only the instances it is added to.
    pub fn register_adapter(&mut self, adapter: Rc<dyn Adapter>) -> AdapterId {
        self.register(adapter, false)
    }

    /// Register an adapter that follows the containment tree of the
    /// instances it is added to.
    pub fn register_content_adapter(&mut self, adapter: Rc<dyn Adapter>) -> AdapterId {
        self.register(adapter, true)
    }

    fn entry(&self, adapter: AdapterId) -> Result<&AdapterEntry> {
        self.adapters
            .get(adapter.index())
            .ok_or_else(|| Error::invalid_handle(adapter))
    }

    pub fn is_content_adapter(&self, adapter: AdapterId) -> bool {
        self.adapters
            .get(adapter.index())
            .is_some_and(|entry| entry.content)
    }

    /// The instance the adapter was most recently added to, cleared when it
    /// is removed from that instance.
    pub fn adapter_target(&self, adapter: AdapterId) -> Option<ObjectId> {
        self.adapters.get(adapter.index()).and_then(|e| e.target)
    }

    /// Adapters attached to an instance, in registration order.
    pub fn adapters(&self, obj: ObjectId) -> &[AdapterId] {
        self.objects
            .get(obj.index())
            .map(|data| data.adapters.as_slice())
            .unwrap_or_default()
    }

    /// Append an adapter to an instance and make the instance its target.
    ///
    /// A content adapter is also added to every object of the instance's
    /// containment subtree, depth-first.
    pub fn add_adapter(&mut self, obj: ObjectId, adapter: AdapterId) -> Result<()> {
        self.data(obj)?;
        let content = self.entry(adapter)?.content;
        self.objects[obj.index()].adapters.push(adapter);
        self.adapters[adapter.index()].target = Some(obj);
        if content {
            for child in self.e_contents(obj) {
                self.attach_content_adapter(child, adapter);
            }
        }
        Ok(())
    }

    /// Subtree attachment of a content adapter. Does not move its target.
    fn attach_content_adapter(&mut self, obj: ObjectId, adapter: AdapterId) {
        if self.objects[obj.index()].adapters.contains(&adapter) {
            return;
        }
        self.objects[obj.index()].adapters.push(adapter);
        for child in self.e_contents(obj) {
            self.attach_content_adapter(child, adapter);
        }
    }

    /// Remove an adapter from an instance.
    ///
    /// When delivery is enabled the adapter first receives a
    /// `RemovingAdapter` notification. A content adapter is also removed
    /// from the instance's subtree. Returns `false` if the adapter was not
    /// attached.
    pub fn remove_adapter(&mut self, obj: ObjectId, adapter: AdapterId) -> Result<bool> {
        if !self.data(obj)?.adapters.contains(&adapter) {
            return Ok(false);
        }
        let entry = self.entry(adapter)?;
        let (callback, content) = (Rc::clone(&entry.adapter), entry.content);

        if self.objects[obj.index()].deliver {
            callback.notify_changed(self, adapter, &Notification::removing_adapter(obj, adapter));
        }

        let adapters = &mut self.objects[obj.index()].adapters;
        // The callback may already have detached it.
        if let Some(position) = adapters.iter().position(|a| *a == adapter) {
            adapters.remove(position);
        }
        if self.adapters[adapter.index()].target == Some(obj) {
            self.adapters[adapter.index()].target = None;
        }
        if content {
            for child in self.e_contents(obj) {
                self.remove_adapter(child, adapter)?;
            }
        }
        Ok(true)
    }

    /// Enable or disable notification delivery for an instance.
    pub fn set_deliver(&mut self, obj: ObjectId, deliver: bool) -> Result<()> {
        self.data(obj)?;
        self.objects[obj.index()].deliver = deliver;
        Ok(())
    }

    pub fn deliver(&self, obj: ObjectId) -> bool {
        self.objects.get(obj.index()).is_some_and(|d| d.deliver)
    }

    /// Whether a notification from `obj` would reach anyone.
    pub fn notification_required(&self, obj: ObjectId) -> bool {
        self.objects
            .get(obj.index())
            .is_some_and(|d| d.deliver && !d.adapters.is_empty())
    }

    /// Deliver a notification to the notifier's adapters, in order.
    ///
    /// The adapter list is snapshotted first, so adapters added or removed
    /// by a callback do not change who receives this notification. Content
    /// adapters adjust their subtree coverage before any callback runs.
    pub fn notify(&mut self, notification: Notification) {
        let notifier = notification.notifier();
        if !self.notification_required(notifier) {
            return;
        }
        let snapshot = self.objects[notifier.index()].adapters.clone();

        self.track_content(&snapshot, &notification);

        for adapter in snapshot {
            let Some(entry) = self.adapters.get(adapter.index()) else {
                continue;
            };
            let callback = Rc::clone(&entry.adapter);
            tracing::trace!(
                notifier = %notifier,
                %adapter,
                kind = ?notification.kind(),
                "delivering notification"
            );
            callback.notify_changed(self, adapter, &notification);
        }
    }

    /// Containment pass for content adapters: follow added objects into
    /// their subtrees, leave removed subtrees.
    fn track_content(&mut self, snapshot: &[AdapterId], notification: &Notification) {
        let Some(feature) = notification.feature() else {
            return;
        };
        if !self.metamodel.feature(feature).is_containment() {
            return;
        }
        let content: Vec<AdapterId> = snapshot
            .iter()
            .copied()
            .filter(|a| self.is_content_adapter(*a))
            .collect();
        if content.is_empty() {
            return;
        }

        let (mut added, mut removed) = match notification.kind() {
            EventKind::Add | EventKind::AddMany => (notification.new_value().objects(), Vec::new()),
            EventKind::Remove | EventKind::RemoveMany => {
                (Vec::new(), notification.old_value().objects())
            }
            EventKind::Set | EventKind::Unset => (
                notification.new_value().objects(),
                notification.old_value().objects(),
            ),
            EventKind::Move | EventKind::RemovingAdapter => return,
        };
        // A touch leaves coverage as it is.
        let unchanged: Vec<ObjectId> = added.iter().filter(|o| removed.contains(o)).copied().collect();
        added.retain(|o| !unchanged.contains(o));
        removed.retain(|o| !unchanged.contains(o));

        for adapter in content {
            for obj in &removed {
                if let Err(err) = self.remove_adapter(*obj, adapter) {
                    tracing::warn!(%obj, %adapter, %err, "failed to detach content adapter");
                }
            }
            for obj in &added {
                if self.objects.get(obj.index()).is_some() {
                    self.attach_content_adapter(*obj, adapter);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use objgraph_meta::{Metamodel, Primitive, Value};

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<EventKind>>,
    }

    impl Adapter for Recorder {
        fn notify_changed(&self, _graph: &mut Graph, _adapter: AdapterId, n: &Notification) {
            self.seen.borrow_mut().push(n.kind());
        }
    }

    fn graph() -> (Graph, objgraph_meta::ClassId, objgraph_meta::FeatureId) {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("p", "urn:p");
        let node = mm.create_class(pkg, "Node");
        let label = mm.add_attribute(node, "label", mm.primitive(Primitive::String));
        (Graph::new(Rc::new(mm)), node, label)
    }

    #[test]
    fn add_sets_target_and_remove_clears_it() {
        let (mut graph, node, _) = graph();
        let obj = graph.create(node).unwrap();
        let recorder = Rc::new(Recorder::default());
        let id = graph.register_adapter(recorder.clone());

        graph.add_adapter(obj, id).unwrap();
        assert_eq!(graph.adapter_target(id), Some(obj));
        assert_eq!(graph.adapters(obj), &[id]);

        assert!(graph.remove_adapter(obj, id).unwrap());
        assert_eq!(graph.adapter_target(id), None);
        assert!(graph.adapters(obj).is_empty());
        assert_eq!(*recorder.seen.borrow(), vec![EventKind::RemovingAdapter]);

        assert!(!graph.remove_adapter(obj, id).unwrap());
    }

    #[test]
    fn removing_without_delivery_is_silent() {
        let (mut graph, node, _) = graph();
        let obj = graph.create(node).unwrap();
        let recorder = Rc::new(Recorder::default());
        let id = graph.register_adapter(recorder.clone());
        graph.add_adapter(obj, id).unwrap();
        graph.set_deliver(obj, false).unwrap();

        assert!(graph.remove_adapter(obj, id).unwrap());
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn delivery_respects_flag() {
        let (mut graph, node, label) = graph();
        let obj = graph.create(node).unwrap();
        let recorder = Rc::new(Recorder::default());
        let id = graph.register_adapter(recorder.clone());
        graph.add_adapter(obj, id).unwrap();

        graph.set(obj, label, Value::from("a")).unwrap();
        graph.set_deliver(obj, false).unwrap();
        graph.set(obj, label, Value::from("b")).unwrap();
        assert_eq!(*recorder.seen.borrow(), vec![EventKind::Set]);
    }

    #[test]
    fn delivery_is_in_registration_order() {
        let (mut graph, node, label) = graph();
        let obj = graph.create(node).unwrap();
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            let id = graph.register_adapter(Rc::new(
                move |_: &mut Graph, _: AdapterId, _: &Notification| {
                    order.borrow_mut().push(name);
                },
            ));
            graph.add_adapter(obj, id).unwrap();
        }
        graph.set(obj, label, Value::from("x")).unwrap();
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn callbacks_may_mutate_the_graph() {
        let (mut graph, node, label) = graph();
        let obj = graph.create(node).unwrap();
        let recorder = Rc::new(Recorder::default());
        let watcher = graph.register_adapter(recorder.clone());

        // Normalizes the label to upper case, re-entering set.
        let normalizer = graph.register_adapter(Rc::new(
            move |graph: &mut Graph, _: AdapterId, n: &Notification| {
                if let Some(s) = n.new_value().as_str() {
                    let upper = s.to_uppercase();
                    if upper != s {
                        graph.set(n.notifier(), label, Value::from(upper)).unwrap();
                    }
                }
            },
        ));
        graph.add_adapter(obj, normalizer).unwrap();
        graph.add_adapter(obj, watcher).unwrap();

        graph.set(obj, label, Value::from("abc")).unwrap();
        assert_eq!(graph.get(obj, label).unwrap(), Value::from("ABC"));
        assert_eq!(
            *recorder.seen.borrow(),
            vec![EventKind::Set, EventKind::Set]
        );
    }

    #[test]
    fn adapter_added_during_delivery_misses_current_notification() {
        let (mut graph, node, label) = graph();
        let obj = graph.create(node).unwrap();
        let late = Rc::new(Recorder::default());
        let late_id = graph.register_adapter(late.clone());
        let adder = graph.register_adapter(Rc::new(
            move |graph: &mut Graph, _: AdapterId, n: &Notification| {
                if !graph.adapters(n.notifier()).contains(&late_id) {
                    graph.add_adapter(n.notifier(), late_id).unwrap();
                }
            },
        ));
        graph.add_adapter(obj, adder).unwrap();

        graph.set(obj, label, Value::from("x")).unwrap();
        assert!(late.seen.borrow().is_empty());
        graph.set(obj, label, Value::from("y")).unwrap();
        assert_eq!(*late.seen.borrow(), vec![EventKind::Set]);
    }
}
