use super::{
    BinOperator, ClassRef, Expr, Literal, Path, Ptr, SelectQuery, ShapeElement, Statement,
    generate_source,
};

fn render(stmt: impl Into<Statement>) -> String {
    generate_source(&stmt.into())
}

#[test]
fn select_with_module_and_filter() {
    let stmt = SelectQuery::new(Path::class("Person").shape(vec![
        Ptr::link("name").into(),
        Ptr::link("email").into(),
    ]))
    .module("test")
    .filter(Expr::binop(
        Path::class("Person").link("name"),
        BinOperator::Eq,
        Literal::from("Bob"),
    ));

    insta::assert_snapshot!(render(stmt), @"WITH MODULE test SELECT Person { name, email } FILTER Person.name = 'Bob'");
}

#[test]
fn nested_binary_operands_are_parenthesized() {
    let cmp = |name: &str, op, value: i64| {
        Expr::binop(Path::class("Person").link(name), op, Literal::Int(value))
    };
    let filter = Expr::binop(
        Expr::binop(cmp("age", BinOperator::Ne, 30), BinOperator::And, cmp("rank", BinOperator::Eq, 1)),
        BinOperator::And,
        Expr::binop(
            Path::class("Person").link("tag"),
            BinOperator::NotIn,
            Expr::Sequence(vec![Literal::from("a").into(), Literal::from("b").into()]),
        ),
    );

    let stmt = SelectQuery::new(Path::class("Person")).filter(filter);

    insta::assert_snapshot!(render(stmt), @"SELECT Person FILTER ((Person.age != 30) AND (Person.rank = 1)) AND (Person.tag NOT IN ('a', 'b'))");
}

#[test]
fn union_wraps_both_sides() {
    let stmt = Statement::union(
        SelectQuery::new(Path::class("Person")).into(),
        SelectQuery::new(Path::class("Book")).module("test").into(),
    );

    insta::assert_snapshot!(render(stmt), @"(SELECT Person) UNION (WITH MODULE test SELECT Book)");
}

#[test]
fn pointer_steps_render_direction_kind_and_target() {
    let path = Path::new(vec![ClassRef::qualified("test", "Person").into()])
        .step(Ptr::link("owns").target(ClassRef::new("Book")))
        .step(Ptr::link("friends").inbound())
        .step(Ptr::property("since"));

    insta::assert_snapshot!(render(SelectQuery::new(path)), @"SELECT test::Person.owns[IS Book].<friends@since");
}

#[test]
fn nested_shapes_with_filters() {
    let friends = ShapeElement::new(Ptr::link("friends"))
        .shape(vec![Ptr::link("name").into()])
        .filter(Expr::binop(
            Path::class("Person").link("friends").link("name"),
            BinOperator::In,
            Expr::parameter("names"),
        ));
    let path = Path::class("Person").shape(vec![Ptr::link("name").into(), friends]);

    insta::assert_snapshot!(render(SelectQuery::new(path)), @"SELECT Person { name, friends { name } FILTER Person.friends.name IN $names }");
}

#[test]
fn literals_and_tuples() {
    let stmt = SelectQuery {
        module: None,
        targets: vec![Expr::Tuple(vec![
            ("a".to_owned(), Literal::from("it's").into()),
            ("b".to_owned(), Literal::Float(2.0).into()),
            ("c".to_owned(), Literal::Float(0.5).into()),
            ("d".to_owned(), Literal::Bool(true).into()),
            ("e".to_owned(), Literal::Null.into()),
        ])],
        filter: None,
    };

    insta::assert_snapshot!(render(stmt), @r"SELECT (a := 'it\'s', b := 2.0, c := 0.5, d := true, e := NULL)");
}

#[test]
fn partial_paths_start_with_a_dot() {
    let filter = Expr::binop(
        Path::partial(vec![Ptr::link("name").into()]),
        BinOperator::Eq,
        Literal::from("Bob"),
    );
    let stmt = SelectQuery::new(Path::class("Person")).filter(filter);

    insta::assert_snapshot!(render(stmt), @"SELECT Person FILTER .name = 'Bob'");
}
