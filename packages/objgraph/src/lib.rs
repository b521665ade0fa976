//! objgraph: reflective object graphs described by a runtime metamodel.
//!
//! The workspace is layered:
//! - [`objgraph_meta`] describes packages, classes, features and data types
//! - [`objgraph_core`] holds instances of those classes in a [`Graph`], with
//!   containment, notifying lists, adapters, proxies and resources
//!
//! Both crates are re-exported whole, and their most used types at the top
//! level.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use objgraph::{AdapterId, EventKind, Graph, Metamodel, Notification};
//!
//! let mut mm = Metamodel::new();
//! let family = mm
//!     .load_package_json(r#"{
//!         "name": "family",
//!         "ns_uri": "urn:family",
//!         "classes": [{
//!             "name": "Person",
//!             "attributes": [{ "name": "name", "type": "String" }],
//!             "references": [{
//!                 "name": "children", "type": "Person",
//!                 "upper": -1, "containment": true
//!             }]
//!         }]
//!     }"#)
//!     .unwrap();
//! let person = mm.classifier(family, "Person").unwrap().as_class().unwrap();
//! let children = mm.structural_feature(person, "children").unwrap();
//!
//! let mut graph = Graph::new(Rc::new(mm));
//! let parent = graph.create(person).unwrap();
//! let child = graph.create(person).unwrap();
//!
//! let adds = Rc::new(std::cell::Cell::new(0));
//! let counter = Rc::clone(&adds);
//! let watcher = graph.register_adapter(Rc::new(
//!     move |_: &mut Graph, _: AdapterId, n: &Notification| {
//!         if n.kind() == EventKind::Add {
//!             counter.set(counter.get() + 1);
//!         }
//!     },
//! ));
//! graph.add_adapter(parent, watcher).unwrap();
//!
//! graph.list_for(parent, children).unwrap().add(child).unwrap();
//! assert_eq!(graph.e_container(child), Some(parent));
//! assert_eq!(adds.get(), 1);
//! ```

pub use objgraph_core;
pub use objgraph_meta;

pub use objgraph_core::{
    Adapter, AdapterId, EList, Error, EventKind, Graph, GraphOptions, ListKind, Notification,
    ResourceId, ResourceLoader, Result, Uri,
};
pub use objgraph_meta::{
    ClassDescriptor, ClassId, Classifier, DataTypeId, FeatureId, ListId, Metamodel, ObjectId,
    OperationId, PackageDescription, PackageId, Primitive, StructuralFeature, Value,
};
