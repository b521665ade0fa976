//! Change records delivered to adapters.

use objgraph_meta::{FeatureId, ObjectId, Value};

use crate::AdapterId;

/// What kind of change a notification describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A single value was replaced (feature slot or list position).
    Set,
    /// A feature was returned to its default state.
    Unset,
    /// One element was added to a list.
    Add,
    /// A batch of elements was added to a list.
    AddMany,
    /// One element was removed from a list.
    Remove,
    /// A batch of elements was removed from a list.
    RemoveMany,
    /// An element changed position within a list.
    Move,
    /// An adapter is about to be removed from the notifier.
    RemovingAdapter,
}

/// An immutable record of one state change.
///
/// The notifier is always an instance: list changes are reported by the
/// instance owning the list, with the list's feature.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    notifier: ObjectId,
    kind: EventKind,
    feature: Option<FeatureId>,
    old_value: Value,
    new_value: Value,
    position: Option<usize>,
    feature_default: Option<Value>,
    adapter: Option<AdapterId>,
}

impl Notification {
    pub fn new(
        notifier: ObjectId,
        kind: EventKind,
        feature: Option<FeatureId>,
        old_value: Value,
        new_value: Value,
        position: Option<usize>,
    ) -> Self {
        Self {
            notifier,
            kind,
            feature,
            old_value,
            new_value,
            position,
            feature_default: None,
            adapter: None,
        }
    }

    /// The notification sent to an adapter just before it is removed.
    ///
    /// Adapters live in the graph rather than in [`Value`], so the removed
    /// adapter is carried by [`adapter`](Self::adapter) instead of the new
    /// value. Both values are `Null` and there is no feature.
    pub fn removing_adapter(notifier: ObjectId, adapter: AdapterId) -> Self {
        let mut n = Self::new(
            notifier,
            EventKind::RemovingAdapter,
            None,
            Value::Null,
            Value::Null,
            None,
        );
        n.adapter = Some(adapter);
        n
    }

    /// Attach the feature's default value, enabling [`is_reset`](Self::is_reset).
    pub fn with_feature_default(mut self, default: Value) -> Self {
        self.feature_default = Some(default);
        self
    }

    pub fn notifier(&self) -> ObjectId {
        self.notifier
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn feature(&self) -> Option<FeatureId> {
        self.feature
    }

    pub fn old_value(&self) -> &Value {
        &self.old_value
    }

    pub fn new_value(&self) -> &Value {
        &self.new_value
    }

    /// List index of the change, `None` when not applicable.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// For `RemovingAdapter`, the adapter being removed.
    pub fn adapter(&self) -> Option<AdapterId> {
        self.adapter
    }

    /// Whether the change left the value as it was.
    pub fn is_touch(&self) -> bool {
        self.old_value == self.new_value
    }

    /// Whether the new value is the feature's default. Always `false` when
    /// no default was attached.
    pub fn is_reset(&self) -> bool {
        self.feature_default
            .as_ref()
            .is_some_and(|d| *d == self.new_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(old: Value, new: Value) -> Notification {
        Notification::new(
            ObjectId::from_index(0),
            EventKind::Set,
            Some(FeatureId::from_index(1)),
            old,
            new,
            None,
        )
    }

    #[test]
    fn touch_compares_old_and_new() {
        assert!(set(Value::from(1i64), Value::from(1i64)).is_touch());
        assert!(!set(Value::from(1i64), Value::from(2i64)).is_touch());
    }

    #[test]
    fn reset_needs_a_default() {
        let n = set(Value::from(5i64), Value::from(0i64));
        assert!(!n.is_reset());
        assert!(n.with_feature_default(Value::from(0i64)).is_reset());
    }

    #[test]
    fn removing_adapter_carries_adapter() {
        let n = Notification::removing_adapter(ObjectId::from_index(2), AdapterId::from_index(3));
        assert_eq!(n.kind(), EventKind::RemovingAdapter);
        assert_eq!(n.adapter(), Some(AdapterId::from_index(3)));
        assert_eq!(n.feature(), None);
        assert_eq!(n.position(), None);
    }
}
