use indoc::indoc;

use super::{
    Concept, Direction, MemorySchema, PointerKind, PointerQuery, QualName, Schema,
    SchemaBuilder, SchemaError, Type,
};
use crate::test_utils::{fixture_schema, qn};

fn outbound(name: &str) -> PointerQuery<'_> {
    PointerQuery::new(name, Direction::Outbound)
}

#[test]
fn resolves_prelude_and_module_names() {
    let schema = fixture_schema();

    assert_eq!(schema.resolve_name("Person", Some("test")), Some(qn("Person")));
    assert_eq!(
        schema.resolve_name("str", Some("test")),
        Some(QualName::new("std", "str"))
    );
    assert_eq!(schema.resolve_name("test::Book", None), Some(qn("Book")));
    assert_eq!(schema.resolve_name("Person", None), None);
    assert_eq!(schema.resolve_name("Atom", Some("schema")), Some(QualName::new("schema", "Atom")));
}

#[test]
fn inherited_pointers_are_visible_unless_excluded() {
    let schema = fixture_schema();

    let name = schema.resolve_pointer(&qn("Person"), &outbound("name")).unwrap();
    assert_eq!(name.name, qn("name"));
    assert_eq!(name.source, Type::Class(qn("Named")));
    assert_eq!(name.target, Type::std("str"));

    let own_only = outbound("name").include_inherited(false);
    assert!(schema.resolve_pointer(&qn("Person"), &own_only).is_none());
    assert!(schema
        .resolve_pointer(&qn("Person"), &outbound("email").include_inherited(false))
        .is_some());
}

#[test]
fn qualified_pointer_names_must_match_the_module() {
    let schema = fixture_schema();

    assert!(schema.resolve_pointer(&qn("Person"), &outbound("test::friends")).is_some());
    assert!(schema.resolve_pointer(&qn("Person"), &outbound("std::friends")).is_none());
}

#[test]
fn far_endpoint_narrows_to_compatible_targets() {
    let schema = fixture_schema();
    let book = qn("Book");
    let group = qn("Group");

    let owns = schema
        .resolve_pointer(&qn("Person"), &outbound("owns").far_endpoint(Some(&book)))
        .unwrap();
    assert_eq!(owns.target, Type::Class(qn("Item")));

    assert!(schema
        .resolve_pointer(&qn("Person"), &outbound("owns").far_endpoint(Some(&group)))
        .is_none());
}

#[test]
fn inbound_pointers_are_found_by_target() {
    let schema = fixture_schema();

    let members = schema
        .resolve_pointer(&qn("Person"), &PointerQuery::new("members", Direction::Inbound))
        .unwrap();
    assert_eq!(members.far_endpoint(Direction::Inbound), &Type::Class(qn("Group")));

    // `owns` targets Item, an ancestor of Book.
    assert!(schema
        .resolve_pointer(&qn("Book"), &PointerQuery::new("owns", Direction::Inbound))
        .is_some());
    assert!(schema
        .resolve_pointer(&qn("Group"), &PointerQuery::new("members", Direction::Inbound))
        .is_none());
}

#[test]
fn children_are_searched_only_on_request() {
    let schema = fixture_schema();

    assert!(schema.resolve_pointer(&qn("Item"), &outbound("pages")).is_none());
    let pages = schema
        .resolve_pointer(&qn("Item"), &outbound("pages").look_in_children(true))
        .unwrap();
    assert_eq!(pages.source, Type::Class(qn("Book")));
}

#[test]
fn link_properties_resolve_on_the_link() {
    let schema = fixture_schema();

    let since = schema.resolve_pointer(&qn("friends"), &outbound("since")).unwrap();

    assert_eq!(since.kind, PointerKind::Property);
    assert_eq!(since.source, Type::Class(qn("friends")));
}

#[test]
fn subclass_and_virtual_queries() {
    let schema = fixture_schema();

    assert!(schema.is_subclass(&qn("Book"), &qn("Named")));
    assert!(schema.is_subclass(&qn("Book"), &qn("Book")));
    assert!(!schema.is_subclass(&qn("Named"), &qn("Book")));
    assert!(schema.is_virtual(&qn("Item")));
    assert!(!schema.is_virtual(&qn("Book")));
    assert_eq!(
        schema.ancestors(&qn("Book")).cloned().collect::<Vec<_>>(),
        vec![qn("Item"), qn("Named")]
    );
}

#[test]
fn concept_pointers_are_addressable_as_links() {
    let schema = fixture_schema();

    assert_eq!(schema.get(&qn("email")).map(|o| o.kind_name()), Some("link"));
    assert_eq!(schema.get(&qn("PersonView")).map(|o| o.kind_name()), Some("view"));
}

#[test]
fn loads_from_json() {
    let json = indoc! {r#"
        {
          "modules": {
            "test": {
              "atoms": ["rating"],
              "concepts": {
                "Person": {"bases": ["Named"], "links": {"friends": "Person"}, "properties": {"score": "rating"}},
                "Named": {"properties": {"name": "std::str"}},
                "Item": {"virtual": true}
              },
              "links": {"friends": {"properties": {"since": "std::str"}}}
            }
          }
        }
    "#};

    let schema = MemorySchema::from_json(json).unwrap();

    let score = schema.resolve_pointer(&qn("Person"), &outbound("score")).unwrap();
    assert_eq!(score.target, Type::Class(qn("rating")));
    assert!(schema.resolve_pointer(&qn("Person"), &outbound("name")).is_some());
    assert!(schema.is_virtual(&qn("Item")));
    assert!(schema.resolve_pointer(&qn("friends"), &outbound("since")).is_some());
}

#[test]
fn rejects_unknown_declaration_fields() {
    let err = MemorySchema::from_json(r#"{"modules": {"test": {"types": {}}}}"#).unwrap_err();

    assert!(matches!(err, SchemaError::Declaration(_)));
}

#[test]
fn rejects_inheritance_cycles() {
    let err = SchemaBuilder::new()
        .concept(Concept::new(qn("A")).base(qn("B")))
        .concept(Concept::new(qn("B")).base(qn("A")))
        .build()
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        r#"invalid concept hierarchy: detected cycle on vertex "test::A""#
    );
}

#[test]
fn rejects_unknown_bases_and_targets() {
    let err = SchemaBuilder::new()
        .concept(Concept::new(qn("A")).base(qn("Missing")))
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid concept hierarchy: reference to an undefined item test::Missing in test::A"
    );

    let err = SchemaBuilder::new()
        .concept(Concept::new(qn("A")).link("to", Type::Class(qn("Nowhere"))))
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "`test::Nowhere` referenced by `test::to` is not defined");
}

#[test]
fn rejects_duplicates_and_non_concept_bases() {
    let err = SchemaBuilder::new()
        .concept(Concept::new(qn("A")))
        .concept(Concept::new(qn("A")))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::Duplicate { name } if name == qn("A")));

    let err = SchemaBuilder::new()
        .concept(Concept::new(qn("A")).base(QualName::new("std", "str")))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidBase { .. }));
}
