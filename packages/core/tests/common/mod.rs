#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use objgraph_core::{Adapter, AdapterId, ClassId, EventKind, FeatureId, Graph, Notification, ObjectId};
use objgraph_meta::Metamodel;

pub const FAMILY: &str = r#"{
    "name": "family",
    "ns_uri": "urn:family",
    "classes": [
        {
            "name": "Person",
            "attributes": [
                { "name": "name", "type": "String" },
                { "name": "age", "type": "Int", "default_value": "0" }
            ],
            "references": [
                { "name": "children", "type": "Person", "upper": -1,
                  "containment": true, "opposite": "parent" },
                { "name": "parent", "type": "Person", "opposite": "children" },
                { "name": "pet", "type": "Dog", "containment": true },
                { "name": "friends", "type": "Person", "upper": -1 },
                { "name": "bestFriend", "type": "Person" }
            ]
        },
        {
            "name": "Dog",
            "attributes": [{ "name": "name", "type": "String" }]
        }
    ]
}"#;

pub struct Family {
    pub graph: Graph,
    pub person: ClassId,
    pub dog: ClassId,
    pub name: FeatureId,
    pub age: FeatureId,
    pub children: FeatureId,
    pub parent: FeatureId,
    pub pet: FeatureId,
    pub friends: FeatureId,
    pub best_friend: FeatureId,
}

pub fn family() -> Family {
    let mut mm = Metamodel::new();
    let pkg = mm.load_package_json(FAMILY).unwrap();
    let person = mm.classifier(pkg, "Person").unwrap().as_class().unwrap();
    let dog = mm.classifier(pkg, "Dog").unwrap().as_class().unwrap();
    let feature = |name: &str| mm.structural_feature(person, name).unwrap();
    let (name, age, children, parent, pet, friends, best_friend) = (
        feature("name"),
        feature("age"),
        feature("children"),
        feature("parent"),
        feature("pet"),
        feature("friends"),
        feature("bestFriend"),
    );
    Family {
        graph: Graph::new(Rc::new(mm)),
        person,
        dog,
        name,
        age,
        children,
        parent,
        pet,
        friends,
        best_friend,
    }
}

impl Family {
    pub fn person(&mut self) -> ObjectId {
        self.graph.create(self.person).unwrap()
    }

    pub fn dog(&mut self) -> ObjectId {
        self.graph.create(self.dog).unwrap()
    }

    /// Attach a fresh recorder to `obj`.
    pub fn watch(&mut self, obj: ObjectId) -> Rc<Recorder> {
        let recorder = Rc::new(Recorder::default());
        let id = self.graph.register_adapter(recorder.clone());
        self.graph.add_adapter(obj, id).unwrap();
        recorder
    }
}

/// Keeps every notification it is sent.
#[derive(Default)]
pub struct Recorder {
    pub seen: RefCell<Vec<Notification>>,
}

impl Recorder {
    pub fn kinds(&self) -> Vec<EventKind> {
        self.seen.borrow().iter().map(Notification::kind).collect()
    }

    pub fn last(&self) -> Notification {
        self.seen.borrow().last().cloned().unwrap()
    }

    pub fn clear(&self) {
        self.seen.borrow_mut().clear();
    }
}

impl Adapter for Recorder {
    fn notify_changed(&self, _graph: &mut Graph, _adapter: AdapterId, notification: &Notification) {
        self.seen.borrow_mut().push(notification.clone());
    }
}
