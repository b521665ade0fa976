//! Opposite synchronization for non-containment references.
//!
//! Writing one end of a reference pair updates the other end of the
//! affected objects only. The other end is written directly, so it emits
//! its own notification but does not cascade further: an object that loses
//! its old partner this way keeps a stale forward reference.

use objgraph_meta::{FeatureId, ObjectId, Value};

use crate::notification::EventKind;
use crate::object::Slot;
use crate::{Graph, Result};

impl Graph {
    /// Record `source` in `target`'s `opposite` feature.
    pub(crate) fn inverse_add(&mut self, target: ObjectId, opposite: FeatureId, source: ObjectId) -> Result<()> {
        let Some(slot) = self.try_slot(target, opposite) else {
            return Ok(());
        };
        let source = Value::Object(source);

        if self.metamodel.feature(opposite).is_many() {
            let list = self.ensure_list(target, slot, opposite);
            let items = &mut self.lists[list.index()].items;
            if items.contains(&source) {
                return Ok(());
            }
            items.push(source.clone());
            let position = items.len() - 1;
            tracing::trace!(%target, feature = %opposite, "inverse add");
            self.emit(target, EventKind::Add, opposite, Value::Null, source, Some(position));
            return Ok(());
        }

        let old = match self.stored(target, slot) {
            Slot::Set(v) => v.clone(),
            Slot::Unset => Value::Null,
        };
        if old == source {
            return Ok(());
        }
        self.objects[target.index()].slots[slot] = Slot::Set(source.clone());
        tracing::trace!(%target, feature = %opposite, "inverse set");
        self.emit(target, EventKind::Set, opposite, old, source, None);
        Ok(())
    }

    /// Drop `source` from `target`'s `opposite` feature.
    pub(crate) fn inverse_remove(
        &mut self,
        target: ObjectId,
        opposite: FeatureId,
        source: ObjectId,
    ) -> Result<()> {
        let Some(slot) = self.try_slot(target, opposite) else {
            return Ok(());
        };
        let source = Value::Object(source);

        match self.stored(target, slot) {
            Slot::Set(Value::List(list)) => {
                let list = *list;
                let items = &mut self.lists[list.index()].items;
                let Some(position) = items.iter().position(|v| *v == source) else {
                    return Ok(());
                };
                items.remove(position);
                tracing::trace!(%target, feature = %opposite, "inverse remove");
                self.emit(target, EventKind::Remove, opposite, source, Value::Null, Some(position));
            }
            Slot::Set(current) if *current == source => {
                self.objects[target.index()].slots[slot] = Slot::Set(Value::Null);
                tracing::trace!(%target, feature = %opposite, "inverse clear");
                self.emit(target, EventKind::Set, opposite, source, Value::Null, None);
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use objgraph_meta::{Metamodel, Value};

    use crate::Graph;

    #[test]
    fn single_to_many_pair_stays_in_sync() {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("lib", "urn:lib");
        let book = mm.create_class(pkg, "Book");
        let writer = mm.create_class(pkg, "Writer");
        let author = mm.add_reference(book, "author", writer);
        let books = mm.add_reference(writer, "books", book);
        mm.feature_mut(books).set_many();
        mm.set_opposite(author, Some(books));

        let mut graph = Graph::new(Rc::new(mm));
        let b1 = graph.create(book).unwrap();
        let b2 = graph.create(book).unwrap();
        let w1 = graph.create(writer).unwrap();
        let w2 = graph.create(writer).unwrap();

        graph.set(b1, author, Value::Object(w1)).unwrap();
        graph.list_for(w1, books).unwrap().add(b2).unwrap();
        assert_eq!(graph.get(b2, author).unwrap(), Value::Object(w1));
        assert_eq!(
            graph.list_for(w1, books).unwrap().to_vec(),
            vec![Value::Object(b1), Value::Object(b2)]
        );

        graph.set(b1, author, Value::Object(w2)).unwrap();
        assert_eq!(graph.list_for(w1, books).unwrap().to_vec(), vec![Value::Object(b2)]);
        assert_eq!(graph.list_for(w2, books).unwrap().to_vec(), vec![Value::Object(b1)]);

        graph.list_for(w1, books).unwrap().clear().unwrap();
        assert_eq!(graph.get(b2, author).unwrap(), Value::Null);

        graph.unset(b1, author).unwrap();
        assert!(graph.list_for(w2, books).unwrap().is_empty());
    }

    #[test]
    fn single_to_single_pair() {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("m", "urn:m");
        let person = mm.create_class(pkg, "Person");
        let spouse = mm.add_reference(person, "spouse", person);
        mm.set_opposite(spouse, Some(spouse));

        let mut graph = Graph::new(Rc::new(mm));
        let a = graph.create(person).unwrap();
        let b = graph.create(person).unwrap();
        graph.set(a, spouse, Value::Object(b)).unwrap();
        assert_eq!(graph.get(b, spouse).unwrap(), Value::Object(a));
        graph.set(a, spouse, Value::Null).unwrap();
        assert_eq!(graph.get(b, spouse).unwrap(), Value::Null);
    }
}
