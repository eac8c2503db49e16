//! Dispatcher integration tests
//!
//! These drive the dispatcher with extension verifiers that log every
//! callback, and check the order in which islands are entered and left.

mod common;

use std::sync::Arc;

use common::{entries, new_log, Log, RecordingIgnoredSchema, RecordingSchema};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use xmlislands::events::{Attribute, Attributes, EventSink};
use xmlislands::islands::{CollectingSink, Dispatcher, IslandSchema, SchemaProvider, TopLevel};
use xmlislands::producers::XmlReaderProducer;
use xmlislands::XMLNS_NAMESPACE;

fn provider(schemas: Vec<(&str, Arc<dyn IslandSchema>)>, root: Option<&str>) -> Arc<SchemaProvider> {
    let mut builder = SchemaProvider::builder();
    for (namespace, schema) in schemas {
        builder = builder.add_schema(namespace, schema).unwrap();
    }
    if let Some(namespace) = root {
        builder = builder.top_level(TopLevel::Island {
            namespace: namespace.to_string(),
            decls: vec![],
        });
    }
    Arc::new(builder.build(&mut CollectingSink::new()).unwrap())
}

fn a_and_b(log: &Log) -> Arc<SchemaProvider> {
    provider(
        vec![
            ("urn:a", RecordingSchema::new("a", "urn:a", log).into_arc()),
            ("urn:b", RecordingSchema::new("b", "urn:b", log).into_arc()),
        ],
        Some("urn:a"),
    )
}

fn run(provider: Arc<SchemaProvider>, xml: &str) -> Dispatcher {
    let mut dispatcher = Dispatcher::new(provider, CollectingSink::new());
    dispatcher.attach(&mut XmlReaderProducer::new(xml)).unwrap();
    dispatcher
}

fn of(log: &[String], id: &str) -> Vec<String> {
    log.iter()
        .filter_map(|line| line.strip_prefix(id))
        .map(|rest| rest.trim_start().to_string())
        .collect()
}

// ============================================================================
// Island entry and exit
// ============================================================================

#[test]
fn test_child_island_round_trip() {
    let log = new_log();
    let mut d = Dispatcher::new(a_and_b(&log), CollectingSink::new());
    let none = Attributes::new();

    d.start_element("urn:a", "root", "a:root", &none).unwrap();
    assert_eq!((d.depth(), d.island_depth()), (2, 0));

    d.start_element("urn:b", "child", "b:child", &none).unwrap();
    assert_eq!((d.depth(), d.island_depth()), (1, 1));

    d.end_element("urn:b", "child", "b:child").unwrap();
    assert_eq!((d.depth(), d.island_depth()), (2, 0));

    d.end_element("urn:a", "root", "a:root").unwrap();
    assert_eq!((d.depth(), d.island_depth()), (1, 0));

    let outcome = d.finish().unwrap();
    assert_eq!(outcome.root_matches.len(), 1);
    assert!(outcome.sink.is_valid());

    assert_eq!(
        entries(&log),
        [
            "a#0 created",
            "a#0 open a:root []",
            "a#0 open b:child []",
            "a#0 switch urn:b",
            "b#0 created",
            "b#0 open b:child []",
            "b#0 close b:child",
            "b#0 end-island 1",
            "b#0 dropped",
            "a#0 end-child-island urn:b 1",
            "a#0 close a:root",
            "a#0 end-island 1",
            "a#0 dropped",
        ]
    );
}

#[test]
fn test_rejected_island_delivers_empty_result() {
    let log = new_log();
    let provider = provider(
        vec![
            ("urn:a", RecordingSchema::new("a", "urn:a", &log).into_arc()),
            (
                "urn:b",
                RecordingSchema::new("b", "urn:b", &log).rejecting().into_arc(),
            ),
        ],
        Some("urn:a"),
    );
    let d = run(
        provider,
        r#"<a:root xmlns:a="urn:a"><b:child xmlns:b="urn:b"/></a:root>"#,
    );
    d.finish().unwrap();

    let log = entries(&log);
    assert!(of(&log, "b#0").contains(&"end-island 0".to_string()));
    assert!(of(&log, "a#0").contains(&"end-child-island urn:b 0".to_string()));
}

#[test]
fn test_sibling_islands_get_fresh_verifiers() {
    let log = new_log();
    let d = run(
        a_and_b(&log),
        r#"<a:root xmlns:a="urn:a" xmlns:b="urn:b"><b:x/><a:y/><b:z/></a:root>"#,
    );
    d.finish().unwrap();

    let log = entries(&log);
    for (id, name) in [("b#0", "b:x"), ("b#1", "b:z")] {
        assert_eq!(
            of(&log, id),
            [
                "created".to_string(),
                "+a=urn:a".to_string(),
                "+b=urn:b".to_string(),
                format!("open {} []", name),
                format!("close {}", name),
                "end-island 1".to_string(),
                "dropped".to_string(),
            ]
        );
    }
    assert_eq!(
        of(&log, "a#0")
            .iter()
            .filter(|line| line.starts_with("end-child-island"))
            .count(),
        2
    );
}

// ============================================================================
// Prefix replay
// ============================================================================

#[test]
fn test_prefixes_in_scope_are_replayed_in_order() {
    let log = new_log();
    let d = run(
        a_and_b(&log),
        r#"<a:root xmlns:a="urn:a" xmlns:x="urn:x"><b:child xmlns:b="urn:b" x:flag="1"/></a:root>"#,
    );
    d.finish().unwrap();

    let log = entries(&log);
    assert_eq!(
        of(&log, "b#0"),
        [
            "created",
            "+a=urn:a",
            "+x=urn:x",
            "+b=urn:b",
            "open b:child [x:flag]",
            "close b:child",
            "-b",
            "end-island 1",
            "dropped",
        ]
    );
    // The parent saw the declaration on the child too, and sees its end.
    let a = of(&log, "a#0");
    assert!(a.contains(&"+b=urn:b".to_string()));
    assert_eq!(a.iter().filter(|line| *line == "-b").count(), 1);
}

#[test]
fn test_shadowed_prefix_is_replayed_once() {
    let log = new_log();
    let d = run(
        a_and_b(&log),
        r#"<a:root xmlns:a="urn:a" xmlns:p="urn:one"><a:in xmlns:p="urn:two"><b:child xmlns:b="urn:b"/></a:in></a:root>"#,
    );
    d.finish().unwrap();

    let b: Vec<_> = of(&entries(&log), "b#0")
        .into_iter()
        .filter(|line| line.starts_with('+'))
        .collect();
    assert_eq!(b, ["+a=urn:a", "+p=urn:two", "+b=urn:b"]);
}

#[test]
fn test_replayed_attributes_are_passed_verbatim() {
    let log = new_log();
    let mut d = Dispatcher::new(a_and_b(&log), CollectingSink::new());

    let mut attributes = Attributes::new();
    attributes.push(Attribute::new(XMLNS_NAMESPACE, "b", "xmlns:b", "urn:b"));
    attributes.push(Attribute::new("urn:x", "flag", "x:flag", "1"));

    d.start_element("urn:a", "root", "a:root", &Attributes::new())
        .unwrap();
    d.start_prefix_mapping("b", "urn:b").unwrap();
    d.start_element("urn:b", "child", "b:child", &attributes)
        .unwrap();
    d.end_element("urn:b", "child", "b:child").unwrap();
    d.end_prefix_mapping("b").unwrap();
    d.end_element("urn:a", "root", "a:root").unwrap();
    d.finish().unwrap();

    let log = entries(&log);
    assert!(of(&log, "a#0").contains(&"open b:child [xmlns:b x:flag]".to_string()));
    assert!(of(&log, "b#0").contains(&"open b:child [xmlns:b x:flag]".to_string()));
}

#[test]
fn test_rejected_prefix_declarations_are_never_ended() {
    let log = new_log();
    let mut d = Dispatcher::new(a_and_b(&log), CollectingSink::new());
    let none = Attributes::new();

    d.start_prefix_mapping("a", "urn:a").unwrap();
    d.start_prefix_mapping("bad", XMLNS_NAMESPACE).unwrap();
    d.start_prefix_mapping("a", "urn:a").unwrap();
    d.start_prefix_mapping("a", "urn:other").unwrap();
    d.start_element("urn:a", "root", "a:root", &none).unwrap();
    d.end_element("urn:a", "root", "a:root").unwrap();
    d.end_prefix_mapping("a").unwrap();
    d.end_prefix_mapping("bad").unwrap();
    d.end_prefix_mapping("a").unwrap();
    d.end_prefix_mapping("a").unwrap();
    let outcome = d.finish().unwrap();

    assert_eq!(
        of(&entries(&log), "a#0"),
        [
            "created",
            "+a=urn:a",
            "open a:root []",
            "close a:root",
            "-a",
            "end-island 1",
            "dropped",
        ]
    );
    // Malformed and conflicting declarations are fatal, a repeat is not.
    assert_eq!(outcome.sink.diagnostics().len(), 2);
}

#[test]
fn test_rejected_prefix_on_island_root_is_not_ended() {
    let log = new_log();
    let mut d = Dispatcher::new(a_and_b(&log), CollectingSink::new());
    let none = Attributes::new();

    d.start_prefix_mapping("a", "urn:a").unwrap();
    d.start_element("urn:a", "root", "a:root", &none).unwrap();
    d.start_prefix_mapping("b", "urn:b").unwrap();
    d.start_prefix_mapping("xmlns", "urn:x").unwrap();
    d.start_element("urn:b", "child", "b:child", &none).unwrap();
    d.end_element("urn:b", "child", "b:child").unwrap();
    d.end_prefix_mapping("b").unwrap();
    d.end_prefix_mapping("xmlns").unwrap();
    d.end_element("urn:a", "root", "a:root").unwrap();
    d.end_prefix_mapping("a").unwrap();
    d.finish().unwrap();

    let log = entries(&log);
    for id in ["a#0", "b#0"] {
        assert!(!of(&log, id).iter().any(|line| line.contains("xmlns")), "{}", id);
    }
    assert_eq!(
        of(&log, "a#0").iter().filter(|line| line.starts_with('-')).count(),
        2
    );
}

// ============================================================================
// Chained switches and pass-through islands
// ============================================================================

#[test]
fn test_chained_switch_on_one_element() {
    let log = new_log();
    let provider = provider(
        vec![
            ("urn:a", RecordingSchema::new("a", "urn:a", &log).into_arc()),
            (
                "urn:b",
                RecordingSchema::new("b", "urn:b", &log)
                    .delegating_to("urn:c")
                    .into_arc(),
            ),
            ("urn:c", RecordingSchema::new("c", "urn:c", &log).into_arc()),
        ],
        Some("urn:a"),
    );
    let d = run(
        provider,
        r#"<a:root xmlns:a="urn:a" xmlns:b="urn:b"><b:child/></a:root>"#,
    );
    assert_eq!((d.depth(), d.island_depth()), (1, 0));
    d.finish().unwrap();

    assert_eq!(
        entries(&log),
        [
            "a#0 created",
            "a#0 +a=urn:a",
            "a#0 +b=urn:b",
            "a#0 open a:root []",
            "a#0 open b:child []",
            "a#0 switch urn:b",
            "b#0 created",
            "b#0 +a=urn:a",
            "b#0 +b=urn:b",
            "b#0 open b:child []",
            "b#0 switch urn:c",
            "c#0 created",
            "c#0 +a=urn:a",
            "c#0 +b=urn:b",
            "c#0 open b:child []",
            "c#0 close b:child",
            "c#0 end-island 1",
            "c#0 dropped",
            "b#0 end-child-island urn:b 1",
            "b#0 end-island 1",
            "b#0 dropped",
            "a#0 end-child-island urn:b 1",
            "a#0 close a:root",
            "a#0 -a",
            "a#0 -b",
            "a#0 end-island 1",
            "a#0 dropped",
        ]
    );
}

#[test]
fn test_ignored_island_adopts_registered_namespace() {
    let log = new_log();
    let provider = provider(
        vec![
            ("urn:a", RecordingSchema::new("a", "urn:a", &log).into_arc()),
            ("urn:n", RecordingIgnoredSchema::new("n", &log).into_arc()),
            ("urn:b", RecordingSchema::new("b", "urn:b", &log).into_arc()),
        ],
        Some("urn:a"),
    );
    let mut d = Dispatcher::new(provider, CollectingSink::new());
    let none = Attributes::new();

    d.start_element("urn:a", "root", "a:root", &none).unwrap();
    d.start_element("urn:n", "wrap", "n:wrap", &none).unwrap();
    d.start_element("urn:n", "deep", "n:deep", &none).unwrap();
    d.start_element("urn:b", "child", "b:child", &none).unwrap();
    assert_eq!((d.island_depth(), d.active_kind()), (2, "extension"));
    d.end_element("urn:b", "child", "b:child").unwrap();
    assert_eq!(d.island_depth(), 1);
    d.end_element("urn:n", "deep", "n:deep").unwrap();
    d.end_element("urn:n", "wrap", "n:wrap").unwrap();
    d.end_element("urn:a", "root", "a:root").unwrap();
    d.finish().unwrap();

    let log = entries(&log);
    assert_eq!(
        of(&log, "n#0"),
        [
            "created",
            "open n:wrap",
            "open n:deep",
            "open b:child",
            "end-child-island urn:b 1",
            "close n:deep",
            "close n:wrap",
            "end-island 1",
        ]
    );

    let position = |line: &str| log.iter().position(|l| l == line).unwrap();
    let child_done = position("b#0 end-island 1");
    let ignored_told = position("n#0 end-child-island urn:b 1");
    assert!(child_done < ignored_told);
    assert!(ignored_told < position("n#0 close n:deep"));
    assert!(position("n#0 end-island 1") < position("a#0 end-child-island urn:n 1"));
    assert!(!log.iter().any(|l| l.starts_with("a#0 end-child-island urn:b")));
}

// ============================================================================
// Verifier lifetime
// ============================================================================

#[test]
fn test_verifiers_are_never_used_after_end_island() {
    let log = new_log();
    let d = run(
        a_and_b(&log),
        r#"<a:root xmlns:a="urn:a" xmlns:b="urn:b">
             <b:x><a:back><b:again>text</b:again></a:back></b:x>
             <b:y/>
             <a:plain><b:z><?pi data?></b:z></a:plain>
           </a:root>"#,
    );
    d.finish().unwrap();

    let log = entries(&log);
    let created: Vec<&str> = log
        .iter()
        .filter_map(|line| line.strip_suffix(" created"))
        .collect();
    assert!(created.len() >= 6);

    for id in created {
        let mine: Vec<usize> = log
            .iter()
            .enumerate()
            .filter(|(_, line)| line.split(' ').next() == Some(id))
            .map(|(index, _)| index)
            .collect();
        let dropped = log
            .iter()
            .position(|line| *line == format!("{} dropped", id))
            .unwrap_or_else(|| panic!("{} was never dropped", id));
        assert_eq!(mine.last(), Some(&dropped), "{} used after drop", id);
        assert_eq!(
            log.iter().filter(|line| **line == format!("{} end-island 1", id)).count(),
            1
        );
    }
}

// ============================================================================
// Depth and stack pairing
// ============================================================================

#[derive(Debug, Clone)]
struct Node {
    namespace: usize,
    children: Vec<Node>,
}

const NAMESPACES: [&str; 3] = ["urn:a", "urn:b", "urn:c"];

fn tree() -> impl Strategy<Value = Node> {
    let leaf = (0..3usize).prop_map(|namespace| Node {
        namespace,
        children: vec![],
    });
    leaf.prop_recursive(6, 48, 4, |inner| {
        (0..3usize, prop::collection::vec(inner, 0..4))
            .prop_map(|(namespace, children)| Node { namespace, children })
    })
}

fn walk(d: &mut Dispatcher, node: &Node, parent: Option<usize>, islands: usize) {
    let namespace = NAMESPACES[node.namespace];
    let islands = match parent {
        Some(p) if p != node.namespace => islands + 1,
        _ => islands,
    };

    d.start_element(namespace, "e", "e", &Attributes::new())
        .unwrap();
    assert_eq!(d.island_depth(), islands);

    for child in &node.children {
        walk(d, child, Some(node.namespace), islands);
        assert_eq!(d.island_depth(), islands);
    }
    d.end_element(namespace, "e", "e").unwrap();
}

proptest! {
    #[test]
    fn prop_island_stack_pairs_with_depth(root in tree()) {
        let root = Node { namespace: 0, ..root };
        let log = new_log();
        let provider = provider(
            NAMESPACES
                .iter()
                .map(|ns| (*ns, RecordingSchema::new(ns, ns, &log).into_arc()))
                .collect(),
            Some("urn:a"),
        );
        let mut d = Dispatcher::new(provider, CollectingSink::new());

        walk(&mut d, &root, None, 0);
        prop_assert_eq!(d.depth(), 1);
        prop_assert_eq!(d.island_depth(), 0);
        prop_assert!(d.finish().is_ok());

        let log = entries(&log);
        let created = log.iter().filter(|l| l.ends_with(" created")).count();
        let dropped = log.iter().filter(|l| l.ends_with(" dropped")).count();
        prop_assert_eq!(created, dropped);
    }
}
