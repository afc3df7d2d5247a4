use super::{Context, compile_path, ensure_set, ensure_stmt, path_step};
use crate::ast::{self, ClassRef, Expr as AstExpr, Literal, Path, Ptr};
use crate::compile::{compile, compile_query};
use crate::diagnostics::Span;
use crate::ir::{Expr, Node, PathId, Stmt};
use crate::schema::{Direction, MemorySchema, PointerKind, QualName, Type};
use crate::test_utils::{fixture_schema, qn};

fn context(schema: &MemorySchema) -> Context<'_> {
    Context::builder(schema).module("test").build()
}

#[test]
fn shared_prefixes_resolve_to_the_same_set() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let friends = compile_path(&Path::class("Person").link("friends"), &mut ctx).unwrap();
    let name = compile_path(&Path::class("Person").link("friends").link("name"), &mut ctx).unwrap();
    let again = compile_path(&Path::class("Person").link("friends"), &mut ctx).unwrap();

    assert_eq!(friends, again);
    let rptr = ctx.set(name).rptr.as_ref().unwrap();
    assert_eq!(rptr.source, friends);
    assert_eq!(rptr.target, name);
    assert_eq!(ctx.set(name).scls, Type::std("str"));
}

#[test]
fn root_sets_are_registered_once() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let first = compile_path(&Path::class("Person"), &mut ctx).unwrap();
    let second = compile_path(&Path::class("Person"), &mut ctx).unwrap();

    assert_eq!(first, second);
    assert_eq!(ctx.lookup(&PathId::new(Type::Class(qn("Person")))), Some(first));
}

#[test]
fn scopes_cover_every_prefix() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let name = compile_path(&Path::class("Person").link("friends").link("name"), &mut ctx).unwrap();

    let path_id = ctx.set(name).path_id.clone();
    for prefix in path_id.prefixes() {
        assert!(ctx.path_scope().contains(&prefix), "{prefix} not in scope");
    }
    assert!(ctx.stmt_path_scope().any(|p| *p == path_id));
}

#[test]
fn ensure_set_returns_sets_unchanged() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);
    let person = compile_path(&Path::class("Person"), &mut ctx).unwrap();
    let allocated = ctx.arena().len();

    assert_eq!(ensure_set(person, &mut ctx), person);
    assert_eq!(ensure_set(Node::Set(person), &mut ctx), person);
    assert_eq!(ctx.arena().len(), allocated);
}

#[test]
fn ensure_set_wraps_expressions_with_fresh_aliases() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let one = ensure_set(Expr::Constant(Literal::Int(1)), &mut ctx);
    let two = ensure_set(Expr::Constant(Literal::from("two")), &mut ctx);

    assert_eq!(ctx.set(one).alias.as_deref(), Some("expr~1"));
    assert_eq!(ctx.set(one).path_id, PathId::expr("expr~1"));
    assert_eq!(ctx.set(one).scls, Type::std("int64"));
    assert_eq!(ctx.set(two).alias.as_deref(), Some("expr~2"));
    assert_eq!(ctx.set(two).scls, Type::std("str"));
}

#[test]
fn ensure_stmt_returns_statements_unchanged() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);
    let stmt = compile_query(&ast::SelectQuery::new(Path::class("Person")).into(), &mut ctx).unwrap();
    let allocated = ctx.arena().len();

    let again = ensure_stmt(stmt.clone(), &mut ctx);

    assert_eq!(again, stmt);
    assert_eq!(ctx.arena().len(), allocated);
}

#[test]
fn ensure_stmt_wraps_sets_with_the_statement_scope() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);
    let friends = compile_path(&Path::class("Person").link("friends"), &mut ctx).unwrap();
    let person = ctx.lookup(&PathId::new(Type::Class(qn("Person")))).unwrap();

    let Stmt::Select(select) = ensure_stmt(friends, &mut ctx);

    assert_eq!(select.result, friends);
    assert_eq!(select.filter, None);
    assert_eq!(select.specific_path_scope, vec![person, friends]);
    assert!(select.path_scope.contains(&ctx.set(friends).path_id));
}

fn tuple_set(ctx: &mut Context<'_>) -> crate::ir::SetId {
    let tuple = AstExpr::Tuple(vec![
        ("a".to_owned(), Literal::Int(1).into()),
        ("b".to_owned(), Literal::from("x").into()),
    ]);
    let node = compile(&tuple, ctx).unwrap();
    ensure_set(node, ctx)
}

#[test]
fn tuple_elements_are_cached_per_tip() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);
    let tuple = tuple_set(&mut ctx);
    let scls = ctx.set(tuple).scls.clone();
    let name = ClassRef::new("a");

    let (first, ptr) = path_step(tuple, &scls, &name, Direction::Outbound, None, &mut ctx).unwrap();
    let (second, _) = path_step(tuple, &scls, &name, Direction::Outbound, None, &mut ctx).unwrap();

    assert_eq!(first, second);
    assert!(ptr.is_none());
    assert_eq!(ctx.set(first).scls, Type::std("int64"));
    assert!(matches!(
        &ctx.set(first).expr,
        Some(Expr::TupleIndirection { expr, name, .. }) if *expr == tuple && name == "a"
    ));
}

#[test]
fn undeclared_tuple_elements_are_rejected() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);
    let tuple = tuple_set(&mut ctx);
    let scls = ctx.set(tuple).scls.clone();

    let err = path_step(tuple, &scls, &ClassRef::new("c"), Direction::Outbound, None, &mut ctx)
        .unwrap_err();

    assert!(err.is_reference());
    assert_eq!(err.message(), "c is not a member of a struct");
}

#[test]
fn expression_roots_are_traversable() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);
    let tuple = AstExpr::Tuple(vec![("a".to_owned(), Literal::Int(1).into())]);

    let element = compile_path(&Path::new(vec![tuple.into()]).link("a"), &mut ctx).unwrap();

    assert_eq!(ctx.set(element).scls, Type::std("int64"));
}

#[test]
fn type_filters_narrow_virtual_targets() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);
    let owns_book = Path::class("Person").step(Ptr::link("owns").target(ClassRef::new("Book")));

    let filtered = compile_path(&owns_book, &mut ctx).unwrap();
    let again = compile_path(&owns_book, &mut ctx).unwrap();
    let pages = compile_path(&owns_book.clone().link("pages"), &mut ctx).unwrap();

    assert_eq!(filtered, again);
    assert_eq!(ctx.set(pages).scls, Type::std("int64"));
    insta::assert_snapshot!(ctx.dump_set(filtered), @r"
    (test::Person).>(test::owns)[IS test::Item] :: test::Book
      alias: expr~1
      rptr: >test::owns from (test::Person)
      expr: TypeFilter test::Book of (test::Person).>(test::owns)[IS test::Item]
    ");
}

#[test]
fn type_filters_on_concrete_targets_keep_the_path_set() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let filtered = compile_path(
        &Path::class("Person").step(Ptr::link("friends").target(ClassRef::new("Person"))),
        &mut ctx,
    )
    .unwrap();

    assert!(ctx.set(filtered).expr.is_none());
    assert_eq!(filtered, compile_path(&Path::class("Person").link("friends"), &mut ctx).unwrap());
}

#[test]
fn incompatible_type_filters_do_not_resolve() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let err = compile_path(
        &Path::class("Person").step(Ptr::link("friends").target(ClassRef::new("Book"))),
        &mut ctx,
    )
    .unwrap_err();

    assert_eq!(
        err.message(),
        "(test::Person).>(friends TO test::Book) does not resolve to any known path"
    );
}

#[test]
fn type_filter_operand_must_be_a_concept() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let err = compile_path(
        &Path::class("Person").step(Ptr::link("owns").target(ClassRef::new("str"))),
        &mut ctx,
    )
    .unwrap_err();

    assert!(err.is_reference());
    assert_eq!(err.message(), "invalid type filter operand: std::str is not a concept");
}

#[test]
fn inbound_steps_reach_the_pointer_source() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let groups = compile_path(&Path::class("Person").step(Ptr::link("members").inbound()), &mut ctx)
        .unwrap();

    let set = ctx.set(groups);
    assert_eq!(set.scls, Type::Class(qn("Group")));
    assert_eq!(set.rptr.as_ref().map(|r| r.direction), Some(Direction::Inbound));
}

#[test]
fn link_properties_follow_the_preceding_link() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let since = compile_path(
        &Path::class("Person").link("friends").step(Ptr::property("since")),
        &mut ctx,
    )
    .unwrap();

    let rptr = ctx.set(since).rptr.as_ref().unwrap();
    assert_eq!(rptr.ptrcls.kind, PointerKind::Property);
    assert_eq!(rptr.ptrcls.name, qn("since"));
    assert_eq!(ctx.set(since).scls, Type::std("str"));
}

#[test]
fn link_properties_need_a_link() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let err = compile_path(&Path::class("Person").step(Ptr::property("since")), &mut ctx)
        .unwrap_err();

    assert!(err.is_reference());
    assert_eq!(err.message(), "link property @since is not preceded by a link");
}

#[test]
fn unknown_pointers_report_the_traversal() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let err = compile_path(
        &Path::class("Person").step(Ptr::link("nope").with_span(Span::new(7, 11))),
        &mut ctx,
    )
    .unwrap_err();

    assert!(err.is_reference());
    assert_eq!(
        err.message(),
        "(test::Person).>(nope) does not resolve to any known path"
    );
    assert_eq!(err.span(), Some(Span::new(7, 11)));
}

#[test]
fn qualified_pointer_names_resolve_through_the_schema() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let qualified = compile_path(
        &Path::class("Person").step(Ptr::new(ClassRef::qualified("test", "email"), PointerKind::Link)),
        &mut ctx,
    )
    .unwrap();
    let bare = compile_path(&Path::class("Person").link("email"), &mut ctx).unwrap();

    assert_eq!(qualified, bare);

    let err = compile_path(
        &Path::class("Person").step(Ptr::new(ClassRef::qualified("test", "nothing"), PointerKind::Link)),
        &mut ctx,
    )
    .unwrap_err();
    assert_eq!(err.message(), "reference to a non-existent schema item: test::nothing");
}

#[test]
fn unknown_roots_are_reference_errors() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let err = compile_path(
        &Path::new(vec![ClassRef::new("Nope").with_span(Span::new(0, 4)).into()]),
        &mut ctx,
    )
    .unwrap_err();

    assert!(err.is_reference());
    assert_eq!(err.message(), "reference to a non-existent schema item: Nope");
    assert_eq!(err.span(), Some(Span::new(0, 4)));
}

#[test]
fn class_meta_pointer_on_scalars() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let class = compile_path(
        &Path::class("Person").link("name").link("__class__"),
        &mut ctx,
    )
    .unwrap();

    assert_eq!(ctx.set(class).scls, Type::class("schema", "Atom"));

    let err = compile_path(
        &Path::class("Person").link("name").step(Ptr::link("__class__").inbound()),
        &mut ctx,
    )
    .unwrap_err();
    assert_eq!(
        err.message(),
        "(std::str).<(__class__) does not resolve to any known path"
    );
}

#[test]
fn partial_paths_extend_the_result_path() {
    let schema = fixture_schema();
    let mut ctx = Context::builder(&schema)
        .module("test")
        .result_path(vec![ClassRef::new("Person").into()])
        .build();

    let partial = compile_path(&Path::partial(vec![Ptr::link("name").into()]), &mut ctx).unwrap();
    let full = compile_path(&Path::class("Person").link("name"), &mut ctx).unwrap();

    assert_eq!(partial, full);
}

#[test]
fn partial_paths_need_a_result_path() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let err = compile_path(&Path::partial(vec![Ptr::link("name").into()]), &mut ctx).unwrap_err();

    assert!(err.is_reference());
}

#[test]
fn paths_cannot_start_with_a_pointer() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let err = compile_path(&Path::new(vec![Ptr::link("name").into()]), &mut ctx).unwrap_err();

    assert!(!err.is_reference());
}

#[test]
#[should_panic(expected = "unexpected class reference as a non-first path item")]
fn class_references_only_lead_paths() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let _ = compile_path(
        &Path::class("Person").step(ClassRef::new("Book")),
        &mut ctx,
    );
}

#[test]
fn anchors_shadow_schema_names() {
    let schema = fixture_schema();
    let mut ctx = Context::builder(&schema)
        .module("test")
        .anchor("Book", Type::Class(qn("Person")))
        .build();
    let anchor = ctx.anchor("Book").unwrap();

    let root = compile_path(&Path::class("Book"), &mut ctx).unwrap();
    let name = compile_path(&Path::class("Book").link("email"), &mut ctx).unwrap();

    assert_eq!(root, anchor);
    assert_eq!(ctx.set(name).rptr.as_ref().unwrap().source, anchor);
}

#[test]
fn views_are_declared_once() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let view = compile_path(&Path::class("PersonView"), &mut ctx).unwrap();
    let again = compile_path(&Path::new(vec![ClassRef::qualified("test", "PersonView").into()]), &mut ctx)
        .unwrap();

    assert_eq!(view, again);
    assert_eq!(ctx.set(view).scls, Type::Class(qn("Person")));
    assert!(matches!(ctx.set(view).expr, Some(Expr::Stmt(_))));
}

#[test]
fn views_resolve_names_in_their_own_module() {
    let schema = fixture_schema();
    let mut ctx = Context::builder(&schema).module("other").build();

    let view = compile_path(
        &Path::new(vec![ClassRef::qualified("test", "PersonView").into()]),
        &mut ctx,
    )
    .unwrap();

    assert_eq!(ctx.set(view).scls, Type::Class(qn("Person")));
    assert_eq!(ctx.module(), Some("other"));
}

#[test]
fn view_steps_use_the_view_shape() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);

    let name = compile_path(&Path::class("PersonView").link("name"), &mut ctx).unwrap();
    let friends = compile_path(&Path::class("FriendlyView").link("friends"), &mut ctx).unwrap();

    assert_eq!(ctx.set(name).scls, Type::std("str"));
    assert_eq!(ctx.set(name).view_source, None);

    let view_source = ctx.set(friends).view_source.unwrap();
    assert!(matches!(ctx.set(view_source).expr, Some(Expr::Stmt(_))));
    assert_eq!(
        ctx.set(view_source).rptr.as_ref().map(|r| r.ptrcls.name.clone()),
        Some(qn("friends"))
    );
}

#[test]
fn computed_shape_elements_are_reused() {
    let schema = fixture_schema();
    let mut ctx = context(&schema);
    let bob = AstExpr::binop(
        Path::partial(vec![Ptr::link("name").into()]),
        ast::BinOperator::Eq,
        Literal::from("Bob"),
    );
    let shaped = Path::class("Person")
        .shape(vec![ast::ShapeElement::new(Ptr::link("friends")).filter(bob)]);

    let Node::Set(view) = compile(&shaped.into(), &mut ctx).unwrap() else {
        panic!("paths compile to sets");
    };
    ctx.bind_anchor("p", view);
    let friends = compile_path(&Path::class("p").link("friends"), &mut ctx).unwrap();

    assert_eq!(ctx.set(view).shape, vec![friends]);
    assert!(matches!(ctx.set(friends).expr, Some(Expr::Stmt(_))));
}

#[test]
fn qualified_class_names_ignore_the_default_module() {
    let schema = fixture_schema();
    let mut ctx = Context::new(&schema);

    let person = compile_path(
        &Path::new(vec![ClassRef::qualified("test", "Person").into()]),
        &mut ctx,
    )
    .unwrap();

    assert_eq!(ctx.set(person).path_id, PathId::new(Type::Class(QualName::new("test", "Person"))));
    assert!(compile_path(&Path::class("Person"), &mut ctx).is_err());
}
