use pretty_assertions::assert_eq;
use serde_json::json;
use view_expr::{Bindings, Value};
use view_renderer::{
    EngineOptions, MemoryLoader, Registration, TemplateSource, ViewEngine, ViewError,
};

fn bindings(value: serde_json::Value) -> Bindings {
    match Value::from(value) {
        Value::Map(map) => map.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        other => panic!("Expected an object, got {:?}", other),
    }
}

fn engine(components: &[(&str, &str)]) -> ViewEngine {
    let mut engine = ViewEngine::new();
    for (name, markup) in components {
        engine.register_component(name, *markup, None, false).unwrap();
    }
    engine
}

#[test]
fn test_self_closing_components() {
    let engine = engine(&[("x-foo", r#"<div class="foo">{{ $label ?? 'foo' }}</div>"#)]);

    let expected = engine.render("<x-foo></x-foo>", Bindings::new()).unwrap();
    assert_eq!(expected, r#"<div class="foo">foo</div>"#);
    assert_eq!(engine.render("<x-foo/>", Bindings::new()).unwrap(), expected);
    assert_eq!(engine.render("<x-foo />", Bindings::new()).unwrap(), expected);
}

#[test]
fn test_default_and_named_slots_use_caller_scope() {
    let engine = engine(&[(
        "x-layout",
        r#"<div class="layout"><main><x-slot /></main><x-slot name="scripts" /></div>"#,
    )]);

    let html = engine
        .render(
            r#"<x-layout><x-slot name="scripts"><script>{{ $script }}</script></x-slot><p>{{ $title }}</p></x-layout>"#,
            bindings(json!({"title": "Home", "script": "init()"})),
        )
        .unwrap();

    assert_eq!(
        html,
        r#"<div class="layout"><main><p>Home</p></main><script>init()</script></div>"#
    );
}

#[test]
fn test_missing_named_slot_renders_nothing() {
    let engine = engine(&[("x-layout", r#"<body><x-slot /><x-slot name="scripts" /></body>"#)]);
    assert_eq!(
        engine.render("<x-layout>content</x-layout>", Bindings::new()).unwrap(),
        "<body>content</body>"
    );
}

#[test]
fn test_slot_named_default_fills_default_slot() {
    let engine = engine(&[("x-card", r#"<div class="card"><x-slot /></div>"#)]);
    assert_eq!(
        engine
            .render(
                r#"<x-card><x-slot name="default">{{ $who }}</x-slot></x-card>"#,
                bindings(json!({"who": "Ada"}))
            )
            .unwrap(),
        r#"<div class="card">Ada</div>"#
    );
}

#[test]
fn test_slot_fallback_uses_component_scope() {
    let engine = engine(&[(
        "x-button",
        r#"<button><x-slot>{{ $label }}</x-slot></button><x-slot name="icon">*</x-slot>"#,
    )]);

    assert_eq!(
        engine.render(r#"<x-button label="Save" />"#, Bindings::new()).unwrap(),
        "<button>Save</button>*"
    );
    assert_eq!(
        engine
            .render(
                r#"<x-button label="Save">
    Store
</x-button>"#,
                Bindings::new()
            )
            .unwrap(),
        "<button>\n    Store\n</button>*"
    );
}

#[test]
fn test_props() {
    let engine = engine(&[(
        "x-card",
        r#"<h2>{{ $title }}</h2><small>{{ $byline }}</small><p>{{ $post ?? 'no post' }}</p><i :if="$featured">*</i>"#,
    )]);

    let html = engine
        .render(
            r#"<x-card :title="$post->title" byline="by {{ $post->author }}" featured />"#,
            bindings(json!({"post": {"title": "Hello", "author": "Ada"}})),
        )
        .unwrap();

    assert_eq!(html, "<h2>Hello</h2><small>by Ada</small><p>no post</p><i>*</i>");
}

#[test]
fn test_kebab_case_props_are_camelized() {
    let engine = engine(&[("x-meta", "{{ $dataTitle }}")]);
    assert_eq!(
        engine
            .render(r#"<x-meta :data-title="$title" />"#, bindings(json!({"title": "T"})))
            .unwrap(),
        "T"
    );
}

#[test]
fn test_component_does_not_see_caller_bindings() {
    let engine = engine(&[("x-leak", "[{{ $secret }}]")]);
    assert_eq!(
        engine
            .render("<x-leak />", bindings(json!({"secret": "hidden"})))
            .unwrap(),
        "[]"
    );
}

#[test]
fn test_directives_on_components() {
    let engine = engine(&[("x-item", "<li>{{ $name }}</li>")]);
    let source = r#"<ul><x-item :foreach="$items as $item" :name="$item" /><li :forelse>none</li></ul>"#;

    assert_eq!(
        engine.render(source, bindings(json!({"items": ["a", "b"]}))).unwrap(),
        "<ul><li>a</li><li>b</li></ul>"
    );
    assert_eq!(
        engine.render(source, bindings(json!({"items": []}))).unwrap(),
        "<ul><li>none</li></ul>"
    );
}

#[test]
fn test_slots_pass_through_nested_components() {
    let engine = engine(&[
        ("x-outer", "<section><x-inner><x-slot /></x-inner></section>"),
        ("x-inner", "<div><x-slot /></div>"),
    ]);

    assert_eq!(
        engine
            .render("<x-outer>hi {{ $name }}</x-outer>", bindings(json!({"name": "Ada"})))
            .unwrap(),
        "<section><div>hi Ada</div></section>"
    );
}

#[test]
fn test_component_not_found() {
    let err = ViewEngine::new().render("<x-missing />", Bindings::new()).unwrap_err();
    assert!(matches!(err, ViewError::ComponentNotFound { .. }), "got {:?}", err);
    insta::assert_snapshot!(err.to_string(), @"Unknown view component <x-missing>");
}

#[test]
fn test_unrendered_unknown_components_do_not_fail() {
    assert_eq!(
        ViewEngine::new()
            .render(r#"<x-missing :if="false" />ok"#, Bindings::new())
            .unwrap(),
        "ok"
    );
}

#[test]
fn test_application_component_overrides_vendor() {
    let mut engine = ViewEngine::new();
    engine
        .register_component("x-input", "vendor", Some("vendor/x-input.view.html".into()), true)
        .unwrap();
    let outcome = engine
        .register_component("x-input", "app", Some("app/x-input.view.html".into()), false)
        .unwrap();

    assert_eq!(outcome, Registration::Replaced);
    assert_eq!(engine.render("<x-input />", Bindings::new()).unwrap(), "app");

    let outcome = engine
        .register_component("x-input", "vendor again", None, true)
        .unwrap();
    assert_eq!(outcome, Registration::Ignored);
    assert_eq!(engine.render("<x-input />", Bindings::new()).unwrap(), "app");
}

#[test]
fn test_duplicate_application_components() {
    let mut engine = ViewEngine::new();
    engine
        .register_component("x-input", "a", Some("a/x-input.view.html".into()), false)
        .unwrap();
    let err = engine
        .register_component("x-input", "b", Some("b/x-input.view.html".into()), false)
        .unwrap_err();

    assert!(matches!(err, ViewError::DuplicateComponent { .. }), "got {:?}", err);
}

#[test]
fn test_recursive_component() {
    let engine = engine(&[("x-loop", "<div><x-loop /></div>")]).with_options(EngineOptions {
        max_component_depth: 8,
        ..EngineOptions::default()
    });

    let err = engine.render("<x-loop />", Bindings::new()).unwrap_err();
    assert_eq!(err.to_string(), "View component <x-loop> nested more than 8 levels deep");
}

#[test]
fn test_nesting_limit_spans_components() {
    let engine = engine(&[("x-wrap", "<div><div><x-slot /></div></div>")]).with_options(EngineOptions {
        max_depth: 4,
        ..EngineOptions::default()
    });

    assert_eq!(
        engine.render("<x-wrap>hi</x-wrap>", Bindings::new()).unwrap(),
        "<div><div>hi</div></div>"
    );

    let err = engine
        .render("<x-wrap><x-wrap>hi</x-wrap></x-wrap>", Bindings::new())
        .unwrap_err();
    assert!(matches!(err, ViewError::NestedTooDeeply { depth: 4, .. }), "got {:?}", err);
    assert_eq!(err.to_string(), "<div> is nested more than 4 levels deep");
    assert_eq!(err.code(), "nested-too-deeply");
}

#[test]
fn test_component_loaded_from_path() {
    let mut engine = ViewEngine::new()
        .with_loader(MemoryLoader::new().with_template("components/x-badge.view.html", "<b>{{ $text }}</b>"));
    engine
        .register_component(
            "x-badge",
            TemplateSource::path("components/x-badge.view.html"),
            Some("components/x-badge.view.html".into()),
            false,
        )
        .unwrap();

    assert_eq!(
        engine.render(r#"<x-badge text="new" />"#, Bindings::new()).unwrap(),
        "<b>new</b>"
    );
}

#[test]
fn test_invalid_component_template() {
    let engine = engine(&[("x-bad", "<p :else></p>")]);
    let err = engine.render("<x-bad />", Bindings::new()).unwrap_err();
    assert!(matches!(err, ViewError::ElementWasInvalid(_)), "got {:?}", err);
}

#[test]
fn test_custom_component_prefix() {
    let mut engine = ViewEngine::new().with_options(EngineOptions {
        component_prefix: "v-".into(),
        ..EngineOptions::default()
    });
    engine.register_component("card", "<v-slot />!", None, false).unwrap();

    assert_eq!(
        engine.render("<v-card>hi</v-card><x-card></x-card>", Bindings::new()).unwrap(),
        "hi!<x-card></x-card>"
    );
}
