//! The reflective protocol: generic get, set, is-set and unset.

use objgraph_meta::{Classifier, FeatureId, ListId, ObjectId, Value};

use crate::list::{ListData, ListKind};
use crate::notification::EventKind;
use crate::object::Slot;
use crate::{Error, Graph, Result};

impl Graph {
    /// Read a feature, resolving a proxy held by a single-valued reference.
    ///
    /// This read may mutate the graph: a resolved proxy replaces the stored
    /// value, and the list of a many-valued feature is created on first
    /// access. Unset single-valued features read as their default value.
    pub fn get(&mut self, obj: ObjectId, feature: FeatureId) -> Result<Value> {
        self.get_with(obj, feature, true)
    }

    /// Read a feature, optionally leaving stored proxies unresolved.
    pub fn get_with(&mut self, obj: ObjectId, feature: FeatureId, resolve: bool) -> Result<Value> {
        let slot = self.slot_index(obj, feature)?;
        let metamodel = std::rc::Rc::clone(&self.metamodel);
        let f = metamodel.feature(feature);

        if f.is_many() {
            return Ok(Value::List(self.ensure_list(obj, slot, feature)));
        }
        if let Some(containment) = self.mirrored_containment(feature) {
            return Ok(self.container_via(obj, containment));
        }
        let value = match self.stored(obj, slot) {
            Slot::Unset => return Ok(metamodel.default_value(feature)?),
            Slot::Set(value) => value.clone(),
        };
        match value {
            Value::Object(proxy) if resolve && f.resolves_proxies() && self.is_proxy(proxy) => {
                let resolved = self.resolve_proxy(proxy, obj);
                if resolved == proxy {
                    return Ok(Value::Object(proxy));
                }
                if f.is_containment() && !self.adopt_resolved(obj, proxy, resolved)? {
                    return Ok(Value::Object(proxy));
                }
                self.objects[obj.index()].slots[slot] = Slot::Set(Value::Object(resolved));
                if f.is_containment() {
                    self.attach(resolved, obj, feature);
                }
                Ok(Value::Object(resolved))
            }
            value => Ok(value),
        }
    }

    /// The list backing a many-valued feature.
    pub fn list_of(&mut self, obj: ObjectId, feature: FeatureId) -> Result<ListId> {
        let slot = self.slot_index(obj, feature)?;
        if !self.metamodel.feature(feature).is_many() {
            return Err(Error::NotMany {
                feature: self.metamodel.feature(feature).name().to_string(),
            });
        }
        Ok(self.ensure_list(obj, slot, feature))
    }

    /// Return the slot's list, creating the right variant on first use.
    pub(crate) fn ensure_list(&mut self, obj: ObjectId, slot: usize, feature: FeatureId) -> ListId {
        if let Slot::Set(Value::List(list)) = self.stored(obj, slot) {
            return *list;
        }
        let f = self.metamodel.feature(feature);
        let kind = if f.is_attribute() {
            ListKind::Attribute
        } else if f.is_containment() {
            ListKind::Containment {
                resolve_proxies: f.resolves_proxies(),
            }
        } else {
            ListKind::Reference {
                resolve_proxies: f.resolves_proxies(),
            }
        };
        let list = ListId::from_index(self.lists.len());
        self.lists.push(ListData::new(obj, feature, kind));
        self.objects[obj.index()].slots[slot] = Slot::Set(Value::List(list));
        list
    }

    /// Write a feature.
    ///
    /// Writing a single-valued containment moves the new value out of its
    /// previous container first. Writing a many-valued feature replaces the
    /// list contents with the elements of an `Array` value.
    ///
    /// # Errors
    ///
    /// Fails for proxies, foreign or unchangeable features, and values that
    /// do not fit the feature's type.
    pub fn set(&mut self, obj: ObjectId, feature: FeatureId, value: Value) -> Result<()> {
        let slot = self.slot_index(obj, feature)?;
        self.check_changeable(feature)?;

        if self.metamodel.feature(feature).is_many() {
            let values = match value {
                Value::Array(values) => values,
                Value::Null => Vec::new(),
                other => return Err(self.type_mismatch(feature, &other)),
            };
            let list = self.ensure_list(obj, slot, feature);
            for v in &values {
                self.check_element(list, v)?;
            }
            if self.metamodel.feature(feature).is_containment() {
                for child in values.iter().filter_map(Value::as_object) {
                    self.check_containable(obj, child)?;
                }
            }
            self.list_clear(list)?;
            self.list_add_all(list, None, values)?;
            return Ok(());
        }

        self.check_value(feature, &value)?;
        if let Some(containment) = self.mirrored_containment(feature) {
            return self.set_container_reference(obj, feature, containment, value);
        }
        self.set_single(obj, slot, feature, value)
    }

    /// Store a single value with containment and opposite bookkeeping,
    /// then emit `Set`.
    pub(crate) fn set_single(
        &mut self,
        obj: ObjectId,
        slot: usize,
        feature: FeatureId,
        value: Value,
    ) -> Result<()> {
        let metamodel = std::rc::Rc::clone(&self.metamodel);
        let f = metamodel.feature(feature);
        let stored = self.stored(obj, slot).value().cloned();
        let old_object = stored.as_ref().and_then(Value::as_object);
        let new_object = value.as_object();

        if f.is_containment() {
            if new_object != old_object {
                if let Some(child) = new_object {
                    self.check_containable(obj, child)?;
                    self.remove_from_container(child)?;
                }
                if let Some(old) = old_object {
                    self.detach(old, feature);
                }
            }
        } else if let Some(opposite) = f.opposite() {
            if new_object != old_object {
                if let Some(old) = old_object {
                    self.inverse_remove(old, opposite, obj)?;
                }
                if let Some(new) = new_object {
                    self.inverse_add(new, opposite, obj)?;
                }
            }
        }

        let old_value = match self.stored(obj, slot) {
            Slot::Set(v) => v.clone(),
            Slot::Unset => metamodel.default_value(feature)?,
        };
        self.objects[obj.index()].slots[slot] = Slot::Set(value.clone());
        if f.is_containment() {
            if let Some(child) = new_object {
                if new_object != old_object {
                    self.attach(child, obj, feature);
                }
            }
        }
        self.emit(obj, EventKind::Set, feature, old_value, value, None);
        Ok(())
    }

    /// Whether a feature holds an explicit value.
    ///
    /// Many-valued features are set when non-empty. Unsettable features are
    /// set from the first write until `unset`. Other features are set while
    /// their value differs from the default.
    pub fn is_set(&self, obj: ObjectId, feature: FeatureId) -> Result<bool> {
        let slot = self.slot_index(obj, feature)?;
        let f = self.metamodel.feature(feature);
        if let Some(containment) = self.mirrored_containment(feature) {
            return Ok(!self.container_via(obj, containment).is_null());
        }
        match self.stored(obj, slot) {
            Slot::Unset => Ok(false),
            Slot::Set(Value::List(list)) if f.is_many() => {
                Ok(!self.lists[list.index()].items.is_empty())
            }
            Slot::Set(_) if f.is_unsettable() => Ok(true),
            Slot::Set(value) => Ok(*value != self.metamodel.default_value(feature)?),
        }
    }

    /// Return a feature to its default state and emit `Unset` with the
    /// default as the new value.
    ///
    /// A contained value is detached from this instance. A many-valued
    /// feature is cleared, keeping its list.
    pub fn unset(&mut self, obj: ObjectId, feature: FeatureId) -> Result<()> {
        let slot = self.slot_index(obj, feature)?;
        self.check_changeable(feature)?;
        let metamodel = std::rc::Rc::clone(&self.metamodel);
        let f = metamodel.feature(feature);

        if f.is_many() {
            if let Slot::Set(Value::List(list)) = self.stored(obj, slot) {
                let list = *list;
                self.list_clear(list)?;
            }
            return Ok(());
        }
        if let Some(containment) = self.mirrored_containment(feature) {
            if !self.container_via(obj, containment).is_null() {
                self.remove_from_container(obj)?;
            }
            return Ok(());
        }

        let default = metamodel.default_value(feature)?;
        let old_value = match self.stored(obj, slot) {
            Slot::Set(v) => v.clone(),
            Slot::Unset => default.clone(),
        };
        if let Some(old) = old_value.as_object() {
            if f.is_containment() {
                self.detach(old, feature);
            } else if let Some(opposite) = f.opposite() {
                self.inverse_remove(old, opposite, obj)?;
            }
        }
        self.objects[obj.index()].slots[slot] = Slot::Unset;
        self.emit(obj, EventKind::Unset, feature, old_value, default, None);
        Ok(())
    }

    // === Validation ===

    fn check_changeable(&self, feature: FeatureId) -> Result<()> {
        let f = self.metamodel.feature(feature);
        if !f.is_changeable() {
            return Err(Error::NotChangeable {
                feature: f.name().to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn type_mismatch(&self, feature: FeatureId, value: &Value) -> Error {
        Error::TypeMismatch {
            feature: self.metamodel.feature(feature).name().to_string(),
            value: value.to_string(),
        }
    }

    /// Check a single value against the feature's type.
    ///
    /// Proxies pass when their expected class fits or is unknown.
    pub(crate) fn check_value(&self, feature: FeatureId, value: &Value) -> Result<()> {
        let f = self.metamodel.feature(feature);
        match (value, f.ty()) {
            (Value::Null, _) => Ok(()),
            (Value::List(_) | Value::Array(_), _) => Err(self.type_mismatch(feature, value)),
            (Value::Object(obj), ty) if f.is_reference() => {
                let data = self.data(*obj)?;
                match (data.class, ty) {
                    (Some(class), Some(Classifier::Class(expected)))
                        if !self.metamodel.is_super_type_of(expected, class) =>
                    {
                        Err(self.type_mismatch(feature, value))
                    }
                    _ => Ok(()),
                }
            }
            (Value::Object(_), _) => Err(self.type_mismatch(feature, value)),
            (_, _) if f.is_reference() => Err(self.type_mismatch(feature, value)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use objgraph_meta::{ClassId, Metamodel, Primitive};

    struct Fixture {
        graph: Graph,
        person: ClassId,
        dog: ClassId,
        name: FeatureId,
        age: FeatureId,
        nickname: FeatureId,
        pet: FeatureId,
        tags: FeatureId,
        id: FeatureId,
    }

    fn fixture() -> Fixture {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("p", "urn:p");
        let person = mm.create_class(pkg, "Person");
        let dog = mm.create_class(pkg, "Dog");
        let name = mm.add_attribute(person, "name", mm.primitive(Primitive::String));
        let age = mm.add_attribute(person, "age", mm.primitive(Primitive::Int));
        mm.feature_mut(age).set_default_literal(Some("1".to_string()));
        let nickname = mm.add_attribute(person, "nickname", mm.primitive(Primitive::String));
        mm.feature_mut(nickname).set_unsettable(true);
        let pet = mm.add_containment(person, "pet", dog);
        let tags = mm.add_attribute(person, "tags", mm.primitive(Primitive::String));
        mm.feature_mut(tags).set_many();
        let id = mm.add_attribute(person, "id", mm.primitive(Primitive::Long));
        mm.feature_mut(id).set_changeable(false);
        Fixture {
            graph: Graph::new(Rc::new(mm)),
            person,
            dog,
            name,
            age,
            nickname,
            pet,
            tags,
            id,
        }
    }

    #[test]
    fn unset_features_read_defaults() {
        let mut f = fixture();
        let p = f.graph.create(f.person).unwrap();
        assert_eq!(f.graph.get(p, f.age).unwrap(), Value::Integer(1));
        assert_eq!(f.graph.get(p, f.name).unwrap(), Value::Null);
        assert!(!f.graph.is_set(p, f.age).unwrap());
    }

    #[test]
    fn set_then_unset_restores_default() {
        let mut f = fixture();
        let p = f.graph.create(f.person).unwrap();
        f.graph.set(p, f.age, Value::Integer(40)).unwrap();
        assert!(f.graph.is_set(p, f.age).unwrap());
        f.graph.unset(p, f.age).unwrap();
        assert!(!f.graph.is_set(p, f.age).unwrap());
        assert_eq!(f.graph.get(p, f.age).unwrap(), Value::Integer(1));
    }

    #[test]
    fn setting_the_default_is_not_set_unless_unsettable() {
        let mut f = fixture();
        let p = f.graph.create(f.person).unwrap();
        f.graph.set(p, f.age, Value::Integer(1)).unwrap();
        assert!(!f.graph.is_set(p, f.age).unwrap());
        f.graph.set(p, f.nickname, Value::Null).unwrap();
        assert!(f.graph.is_set(p, f.nickname).unwrap());
        f.graph.unset(p, f.nickname).unwrap();
        assert!(!f.graph.is_set(p, f.nickname).unwrap());
    }

    #[test]
    fn many_valued_get_returns_same_list() {
        let mut f = fixture();
        let p = f.graph.create(f.person).unwrap();
        let first = f.graph.get(p, f.tags).unwrap();
        let second = f.graph.get(p, f.tags).unwrap();
        assert!(matches!(first, Value::List(_)));
        assert_eq!(first, second);
        assert!(!f.graph.is_set(p, f.tags).unwrap());
    }

    #[test]
    fn many_valued_set_replaces_contents() {
        let mut f = fixture();
        let p = f.graph.create(f.person).unwrap();
        f.graph
            .set(p, f.tags, Value::from(vec!["a", "b"]))
            .unwrap();
        let list = f.graph.list_of(p, f.tags).unwrap();
        assert_eq!(f.graph.list(list).unwrap().len(), 2);
        assert!(f.graph.is_set(p, f.tags).unwrap());
        f.graph.unset(p, f.tags).unwrap();
        assert_eq!(f.graph.list(list).unwrap().len(), 0);
        assert!(!f.graph.is_set(p, f.tags).unwrap());
    }

    #[test]
    fn single_containment_moves_between_owners() {
        let mut f = fixture();
        let a = f.graph.create(f.person).unwrap();
        let b = f.graph.create(f.person).unwrap();
        let rex = f.graph.create(f.dog).unwrap();

        f.graph.set(a, f.pet, Value::Object(rex)).unwrap();
        assert_eq!(f.graph.e_container(rex), Some(a));

        f.graph.set(b, f.pet, Value::Object(rex)).unwrap();
        assert_eq!(f.graph.e_container(rex), Some(b));
        assert_eq!(f.graph.get(a, f.pet).unwrap(), Value::Null);
        assert!(!f.graph.is_set(a, f.pet).unwrap());

        let fido = f.graph.create(f.dog).unwrap();
        f.graph.set(b, f.pet, Value::Object(fido)).unwrap();
        assert_eq!(f.graph.e_container(rex), None);
        assert_eq!(f.graph.e_container(fido), Some(b));
    }

    #[test]
    fn unset_detaches_contained_value() {
        let mut f = fixture();
        let a = f.graph.create(f.person).unwrap();
        let rex = f.graph.create(f.dog).unwrap();
        f.graph.set(a, f.pet, Value::Object(rex)).unwrap();
        f.graph.unset(a, f.pet).unwrap();
        assert_eq!(f.graph.e_container(rex), None);
        assert_eq!(f.graph.get(a, f.pet).unwrap(), Value::Null);
    }

    #[test]
    fn type_checks() {
        let mut f = fixture();
        let p = f.graph.create(f.person).unwrap();
        let q = f.graph.create(f.person).unwrap();
        assert!(matches!(
            f.graph.set(p, f.pet, Value::Object(q)),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            f.graph.set(p, f.pet, Value::from("rex")),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            f.graph.set(p, f.name, Value::Object(q)),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            f.graph.set(p, f.tags, Value::from("solo")),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn unchangeable_features_reject_writes() {
        let mut f = fixture();
        let p = f.graph.create(f.person).unwrap();
        assert!(matches!(
            f.graph.set(p, f.id, Value::Integer(3)),
            Err(Error::NotChangeable { .. })
        ));
        assert!(matches!(
            f.graph.unset(p, f.id),
            Err(Error::NotChangeable { .. })
        ));
    }

    #[test]
    fn foreign_feature_is_an_error() {
        let mut f = fixture();
        let rex = f.graph.create(f.dog).unwrap();
        assert!(matches!(
            f.graph.set(rex, f.name, Value::from("Rex")),
            Err(Error::FeatureNotInClass { .. })
        ));
        assert!(matches!(
            f.graph.get(rex, f.name),
            Err(Error::FeatureNotInClass { .. })
        ));
        assert!(f.graph.is_set(rex, f.name).is_err());
    }

    #[test]
    fn list_of_single_valued_feature_fails() {
        let mut f = fixture();
        let p = f.graph.create(f.person).unwrap();
        assert!(matches!(
            f.graph.list_of(p, f.name),
            Err(Error::NotMany { .. })
        ));
    }

    #[test]
    fn containing_yourself_is_rejected() {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("t", "urn:t");
        let node = mm.create_class(pkg, "Node");
        let child = mm.add_containment(node, "child", node);
        let mut graph = Graph::new(Rc::new(mm));
        let a = graph.create(node).unwrap();
        let b = graph.create(node).unwrap();
        graph.set(a, child, Value::Object(b)).unwrap();
        assert!(matches!(
            graph.set(b, child, Value::Object(a)),
            Err(Error::ContainmentCycle { .. })
        ));
        assert!(matches!(
            graph.set(a, child, Value::Object(a)),
            Err(Error::ContainmentCycle { .. })
        ));
        assert_eq!(graph.e_container(b), Some(a));
    }
}
