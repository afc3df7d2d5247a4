//! Shared fixtures for compiler tests.

use crate::ast::{BinOperator, Expr, Literal, Path, Ptr, SelectQuery, ShapeElement};
use crate::schema::{Concept, LinkDecl, MemorySchema, QualName, SchemaBuilder, Type, View};

/// Name in the `test` module.
pub fn qn(name: &str) -> QualName {
    QualName::new("test", name)
}

fn ty(name: &str) -> Type {
    Type::Class(qn(name))
}

/// ```text
/// Named { name }
/// Person: Named { email, age, friends -> Person, owns -> Item }
/// Item: Named (virtual)
/// Book: Item { pages }
/// Car: Item { model }
/// Group: Named { members -> Person }
/// link friends { @since }
/// view PersonView := Person { name, friends }
/// view FriendlyView := Person { friends FILTER Person.friends.name = 'Bob' }
/// ```
pub fn fixture_schema() -> MemorySchema {
    let person_view = SelectQuery::new(
        Path::class("Person").shape(vec![Ptr::link("name").into(), Ptr::link("friends").into()]),
    );

    let bob = Expr::binop(
        Path::class("Person").link("friends").link("name"),
        BinOperator::Eq,
        Literal::from("Bob"),
    );
    let friendly_view = SelectQuery::new(
        Path::class("Person").shape(vec![ShapeElement::new(Ptr::link("friends")).filter(bob)]),
    )
    .module("test");

    SchemaBuilder::new()
        .concept(Concept::new(qn("Named")).property("name", Type::std("str")))
        .concept(
            Concept::new(qn("Person"))
                .base(qn("Named"))
                .property("email", Type::std("str"))
                .property("age", Type::std("int64"))
                .link("friends", ty("Person"))
                .link("owns", ty("Item")),
        )
        .concept(Concept::new(qn("Item")).base(qn("Named")).is_virtual(true))
        .concept(
            Concept::new(qn("Book"))
                .base(qn("Item"))
                .property("pages", Type::std("int64")),
        )
        .concept(
            Concept::new(qn("Car"))
                .base(qn("Item"))
                .property("model", Type::std("str")),
        )
        .concept(
            Concept::new(qn("Group"))
                .base(qn("Named"))
                .link("members", ty("Person")),
        )
        .link(LinkDecl::new(qn("friends")).property("since", Type::std("str")))
        .view(View::new(qn("PersonView"), person_view.into()))
        .view(View::new(qn("FriendlyView"), friendly_view.into()))
        .build()
        .expect("fixture schema is valid")
}
