use super::{Error, Span};

#[test]
fn with_span_keeps_the_first_span() {
    let err = Error::reference("nope")
        .with_span(Some(Span::new(1, 3)))
        .with_span(Some(Span::new(5, 9)));

    assert_eq!(err.span(), Some(Span::new(1, 3)));
    assert!(err.is_reference());
}

#[test]
fn render_without_span_is_the_message() {
    let err = Error::language("SELECT requires at least one target");

    assert_eq!(
        err.render("SELECT"),
        "SELECT requires at least one target"
    );
}

#[test]
fn render_points_at_the_span() {
    let source = "SELECT Nope";
    let err = Error::reference("reference to a non-existent schema item: Nope")
        .with_span(Some(Span::from(7..11)));

    let rendered = err.render(source);

    assert!(rendered.starts_with("error: reference to a non-existent schema item: Nope"));
    assert!(rendered.contains("SELECT Nope"));
    assert!(rendered.contains("^^^^"));
}

#[test]
fn empty_span_at_end_is_clamped() {
    let source = "SELECT";
    let err = Error::language("unexpected end").with_span(Some(Span::new(6, 6)));

    let rendered = err.printer().source(source).path("query.esdl").render();

    assert!(rendered.contains("query.esdl"));
    assert!(rendered.contains("unexpected end"));
}
