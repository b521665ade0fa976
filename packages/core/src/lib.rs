//! Object graph kernel: instances of a [`Metamodel`](objgraph_meta::Metamodel)
//! and the machinery that keeps them consistent.
//!
//! - `Graph`: arena of instances with the reflective protocol (`get`,
//!   `set`, `is_set`, `unset`, `invoke`)
//! - `EList`: index-checked notifying lists for many-valued features
//! - `Adapter`: observers attached to instances, including content
//!   adapters that follow the containment tree
//! - Proxies: stand-ins for objects addressed by `Uri`, resolved on read
//! - Resources: groups of root objects with URI fragments and on-demand
//!   loading through a `ResourceLoader`
//!
//! Each instance has at most one container. Every path that places an
//! instance into a containment slot removes it from its previous slot.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use objgraph_core::{Graph, Value};
//! use objgraph_meta::{Metamodel, Primitive};
//!
//! let mut mm = Metamodel::new();
//! let pkg = mm.create_package("family", "urn:family");
//! let person = mm.create_class(pkg, "Person");
//! let name = mm.add_attribute(person, "name", mm.primitive(Primitive::String));
//! let children = mm.add_containment(person, "children", person);
//! mm.feature_mut(children).set_many();
//!
//! let mut graph = Graph::new(Rc::new(mm));
//! let parent = graph.create(person).unwrap();
//! let child = graph.create(person).unwrap();
//! graph.set(child, name, Value::from("Ada")).unwrap();
//! graph.list_for(parent, children).unwrap().add(child).unwrap();
//!
//! assert_eq!(graph.e_container(child), Some(parent));
//! assert_eq!(graph.get(child, name).unwrap(), Value::from("Ada"));
//! ```

mod adapter;
mod containment;
mod error;
mod graph;
mod inverse;
mod list;
mod notification;
mod object;
mod options;
mod proxy;
mod reflect;
mod resource;
mod uri;

pub use adapter::{Adapter, AdapterId};
pub use error::{Error, Result};
pub use graph::{Graph, OperationBody};
pub use list::{EList, ListKind};
pub use notification::{EventKind, Notification};
pub use options::GraphOptions;
pub use resource::{ResourceId, ResourceLoader};
pub use uri::Uri;

pub use objgraph_meta::{ClassId, FeatureId, ListId, ObjectId, OperationId, Value};
