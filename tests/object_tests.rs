//! Value Object Tests
//!
//! Tests verify:
//! - Kind is fixed by the constructor
//! - Encoding hints for small and large payloads
//! - Typed accessors reject mismatched kinds
//! - Reference counting through retain/release
//! - Structural equality

use nimbuskv::object::{Container, Encoding, Kind, Object, StringValue, Value};
use nimbuskv::NimbusError;

// =============================================================================
// Kind Tests
// =============================================================================

#[test]
fn test_constructors_set_kind() {
    assert_eq!(Object::string("v").kind(), Kind::String);
    assert_eq!(Object::list(["a", "b"]).kind(), Kind::List);
    assert_eq!(Object::set(["a"]).kind(), Kind::Set);
    assert_eq!(Object::sorted_set([("a", 1.0)]).kind(), Kind::SortedSet);
    assert_eq!(Object::hash([("f", "v")]).kind(), Kind::Hash);
}

#[test]
fn test_kind_names_match_type_replies() {
    let names: Vec<_> = [Kind::String, Kind::List, Kind::Set, Kind::SortedSet, Kind::Hash]
        .iter()
        .map(Kind::as_str)
        .collect();
    assert_eq!(names, vec!["string", "list", "set", "zset", "hash"]);
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_string_encoding_hints() {
    assert_eq!(Object::string("42").encoding(), Encoding::Int);
    assert_eq!(Object::string("hello").encoding(), Encoding::Embstr);
    assert_eq!(Object::string(vec![b'x'; 100]).encoding(), Encoding::Raw);
}

#[test]
fn test_aggregate_encodings_grow_out_of_compact_form() {
    assert_eq!(Object::list(["a"]).encoding(), Encoding::Listpack);
    let long_list = Object::list((0..500).map(|i| i.to_string()));
    assert_eq!(long_list.encoding(), Encoding::Quicklist);

    assert_eq!(Object::set(["1", "2"]).encoding(), Encoding::Intset);
    assert_eq!(Object::set(["a", "b"]).encoding(), Encoding::Listpack);

    assert_eq!(Object::sorted_set([("a", 1.0)]).encoding(), Encoding::Listpack);
    let wide_zset = Object::sorted_set([("m".repeat(100), 1.0)]);
    assert_eq!(wide_zset.encoding(), Encoding::Skiplist);

    assert_eq!(Object::hash([("f", "v")]).encoding(), Encoding::Listpack);
    let big_hash = Object::hash((0..200).map(|i| (format!("f{i}"), "v")));
    assert_eq!(big_hash.encoding(), Encoding::Hashtable);
}

#[test]
fn test_encoding_does_not_change_behaviour() {
    let compact = Object::list(["a", "b"]);
    let long = Object::list((0..300).map(|i| format!("item-{i}")));

    assert_eq!(compact.as_list().unwrap().len(), 2);
    assert_eq!(long.as_list().unwrap().len(), 300);
    assert_eq!(long.as_list().unwrap().index(-1).unwrap().as_ref(), b"item-299");
}

// =============================================================================
// Typed Accessor Tests
// =============================================================================

#[test]
fn test_matching_accessor_unwraps_payload() {
    let obj = Object::string("hello");
    let s = obj.as_string().unwrap();
    assert_eq!(s.as_bytes().as_ref(), b"hello");
    assert_eq!(s.len(), 5);

    let hash = Object::hash([("name", "nimbus")]);
    assert_eq!(hash.as_hash().unwrap().get(b"name").unwrap().as_ref(), b"nimbus");

    let zset = Object::sorted_set([("a", 2.0), ("b", 1.0)]);
    assert_eq!(zset.as_sorted_set().unwrap().rank(b"a"), Some(1));

    let set = Object::set(["x"]);
    assert!(set.as_set().unwrap().contains(b"x"));
}

#[test]
fn test_mismatched_accessor_fails_wrong_type() {
    let obj = Object::list(["a"]);

    let err = obj.as_string().unwrap_err();
    assert!(matches!(
        err,
        NimbusError::WrongType { expected: Kind::String, actual: Kind::List }
    ));
    assert!(obj.as_set().is_err());
    assert!(obj.as_sorted_set().is_err());
    assert!(obj.as_hash().is_err());
    assert!(obj.as_list().is_ok());
}

#[test]
fn test_wrong_type_message() {
    let err = Object::hash([("f", "v")]).as_list().unwrap_err();
    assert!(err.to_string().starts_with("WRONGTYPE"));
}

// =============================================================================
// Reference Counting Tests
// =============================================================================

#[test]
fn test_new_object_has_one_reference() {
    assert_eq!(Object::string("v").refcount(), 1);
}

#[test]
fn test_retain_and_release_track_count() {
    let obj = Object::string("v");
    let a = obj.retain();
    let b = obj.retain();
    assert_eq!(obj.refcount(), 3);

    assert!(a.release().is_none());
    assert!(b.release().is_none());
    assert_eq!(obj.refcount(), 1);
}

#[test]
fn test_last_release_hands_back_payload() {
    let obj = Object::string("bye");
    match obj.release() {
        Some(Value::String(s)) => assert_eq!(s, StringValue::new("bye")),
        other => panic!("Expected string payload, got {:?}", other),
    }
}

// =============================================================================
// Equality Tests
// =============================================================================

#[test]
fn test_equality_is_structural() {
    assert_eq!(Object::string("x"), Object::string("x"));
    assert_ne!(Object::string("x"), Object::string("y"));
    assert_eq!(Object::set(["a", "b"]), Object::set(["b", "a"]));
    assert_eq!(
        Object::sorted_set([("a", 1.0), ("b", 2.0)]),
        Object::sorted_set([("b", 2.0), ("a", 1.0)])
    );
}

#[test]
fn test_differing_kinds_are_never_equal() {
    assert_ne!(Object::list(["a"]), Object::set(["a"]));
    assert_ne!(Object::string(""), Object::hash(Vec::<(String, String)>::new()));
}
