mod common;

use std::rc::Rc;

use objgraph_core::{AdapterId, EventKind, Graph, Notification, ObjectId, Value};

use common::{family, Family, Recorder};

/// root -> [a -> [a1 -> [a11]], b], root.pet = rex
fn tree(f: &mut Family) -> (ObjectId, Vec<ObjectId>) {
    let root = f.person();
    let a = f.person();
    let b = f.person();
    let a1 = f.person();
    let a11 = f.person();
    let rex = f.dog();
    f.graph.list_for(root, f.children).unwrap().add_all([a, b]).unwrap();
    f.graph.list_for(a, f.children).unwrap().add(a1).unwrap();
    f.graph.list_for(a1, f.children).unwrap().add(a11).unwrap();
    f.graph.set(root, f.pet, Value::Object(rex)).unwrap();
    (root, vec![a, b, a1, a11, rex])
}

#[test]
fn test_attaches_to_whole_subtree() {
    let mut f = family();
    let (root, nodes) = tree(&mut f);
    let recorder = Rc::new(Recorder::default());
    let id = f.graph.register_content_adapter(recorder.clone());

    f.graph.add_adapter(root, id).unwrap();

    assert!(f.graph.adapters(root).contains(&id));
    for node in &nodes {
        assert!(f.graph.adapters(*node).contains(&id), "missing on {}", node);
    }
    assert_eq!(f.graph.adapter_target(id), Some(root));
}

#[test]
fn test_follows_added_subtrees() {
    let mut f = family();
    let root = f.person();
    let recorder = Rc::new(Recorder::default());
    let id = f.graph.register_content_adapter(recorder.clone());
    f.graph.add_adapter(root, id).unwrap();

    let branch = f.person();
    let leaf = f.person();
    f.graph.list_for(branch, f.children).unwrap().add(leaf).unwrap();
    f.graph.list_for(root, f.children).unwrap().add(branch).unwrap();

    assert!(f.graph.adapters(branch).contains(&id));
    assert!(f.graph.adapters(leaf).contains(&id));

    // Changes deep in the tree now reach the adapter.
    recorder.clear();
    f.graph.set(leaf, f.name, Value::from("leaf")).unwrap();
    let n = recorder.last();
    assert_eq!(n.kind(), EventKind::Set);
    assert_eq!(n.notifier(), leaf);
}

#[test]
fn test_add_many_and_single_containment_are_followed() {
    let mut f = family();
    let root = f.person();
    let recorder = Rc::new(Recorder::default());
    let id = f.graph.register_content_adapter(recorder.clone());
    f.graph.add_adapter(root, id).unwrap();

    let a = f.person();
    let b = f.person();
    let rex = f.dog();
    f.graph.list_for(root, f.children).unwrap().add_all([a, b]).unwrap();
    f.graph.set(a, f.pet, Value::Object(rex)).unwrap();

    for obj in [a, b, rex] {
        assert!(f.graph.adapters(obj).contains(&id));
    }
}

#[test]
fn test_removing_a_subtree_detaches_exactly_it() {
    let mut f = family();
    let (root, nodes) = tree(&mut f);
    let (a, b, a1, a11, rex) = (nodes[0], nodes[1], nodes[2], nodes[3], nodes[4]);
    let recorder = Rc::new(Recorder::default());
    let id = f.graph.register_content_adapter(recorder.clone());
    f.graph.add_adapter(root, id).unwrap();

    f.graph.list_for(root, f.children).unwrap().remove(&Value::Object(a)).unwrap();

    for gone in [a, a1, a11] {
        assert!(!f.graph.adapters(gone).contains(&id));
    }
    for kept in [root, b, rex] {
        assert!(f.graph.adapters(kept).contains(&id));
    }
    assert_eq!(f.graph.adapter_target(id), Some(root));

    // No longer observed.
    recorder.clear();
    f.graph.set(a11, f.name, Value::from("x")).unwrap();
    assert!(recorder.seen.borrow().is_empty());
}

#[test]
fn test_clear_and_unset_detach() {
    let mut f = family();
    let (root, nodes) = tree(&mut f);
    let recorder = Rc::new(Recorder::default());
    let id = f.graph.register_content_adapter(recorder.clone());
    f.graph.add_adapter(root, id).unwrap();

    f.graph.list_for(root, f.children).unwrap().clear().unwrap();
    f.graph.unset(root, f.pet).unwrap();

    for node in nodes {
        assert!(!f.graph.adapters(node).contains(&id));
    }
    assert!(f.graph.adapters(root).contains(&id));
}

#[test]
fn test_removing_from_root_detaches_everywhere() {
    let mut f = family();
    let (root, nodes) = tree(&mut f);
    let recorder = Rc::new(Recorder::default());
    let id = f.graph.register_content_adapter(recorder.clone());
    f.graph.add_adapter(root, id).unwrap();

    assert!(f.graph.remove_adapter(root, id).unwrap());
    assert!(f.graph.adapters(root).is_empty());
    for node in nodes {
        assert!(f.graph.adapters(node).is_empty());
    }
    assert_eq!(f.graph.adapter_target(id), None);
}

#[test]
fn test_content_adapter_sees_changes_before_its_callback() {
    let mut f = family();
    let root = f.person();
    let id = f.graph.register_content_adapter(Rc::new(
        |graph: &mut Graph, me: AdapterId, n: &Notification| {
            if n.kind() == EventKind::Add {
                let added = n.new_value().as_object().unwrap();
                assert!(graph.adapters(added).contains(&me));
            }
        },
    ));
    f.graph.add_adapter(root, id).unwrap();
    let child = f.person();
    f.graph.list_for(root, f.children).unwrap().add(child).unwrap();
    assert!(f.graph.adapters(child).contains(&id));
}
