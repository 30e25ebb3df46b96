//! Compiler extensions interpreted through the public load entry point.

use rosetta::frontend::{DiagnosticCode, LoadOutcome};
use rosetta::{CancellationToken, EmissionPipeline, EmitConfig, TargetKind, load};
use rosetta_core::AnnotationTarget;
use rosetta_core::SpecialType;
use rosetta_core::lang::annotations as known;
use rosetta_syntax::{
    Annotation, Argument, Compilation, CompilationBuilder, Constant, Expr, Span, Stmt, StmtKind, SymbolId,
};

/// A program with one compiler extension whose `Init(ctx)` body is filled in by each test.
struct Fixture {
    b: CompilationBuilder,
    extension: SymbolId,
    init: SymbolId,
    name_attribute: SymbolId,
}

impl Fixture {
    fn new() -> Self {
        let mut b = CompilationBuilder::new();
        let marker = b.interface("Rosetta", "ICompilerExtension");
        let context = b.annotation_class("Rosetta.ExtensionContext");
        let name_attribute = b.annotation_class(known::NAME);
        let extension = b.class("App.Build", "Rules");
        b.implement(extension, marker);
        let init = b.method(extension, "Init", None, &[("ctx", context)]);
        Self {
            b,
            extension,
            init,
            name_attribute,
        }
    }

    fn load(mut self, body: Vec<Stmt>, target: &str) -> (Compilation, LoadOutcome) {
        self.b.set_body(self.init, body);
        let c = self.b.build();
        let outcome = load(&c, target, &CancellationToken::new()).expect("load completes");
        (c, outcome)
    }
}

fn ctx(accessor: &str, args: Vec<Argument>) -> Expr {
    Expr::call(Expr::member(Expr::name("ctx"), accessor), args)
}

fn add(receiver: Expr, annotations: Vec<Expr>) -> Expr {
    Expr::call(
        Expr::member(receiver, "Add"),
        annotations.into_iter().map(Argument::positional).collect(),
    )
}

fn rename(class: SymbolId, to: &str) -> Expr {
    Expr::new_object(vec![Argument::positional(Expr::literal(to))], Vec::new()).with_type(class)
}

fn codes(outcome: &LoadOutcome) -> Vec<DiagnosticCode> {
    outcome.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn type_accessor_registers_a_rename() {
    let mut f = Fixture::new();
    let point = f.b.class("Geo", "Point");
    let name = f.name_attribute;
    let body = vec![Stmt::expr(add(
        ctx("Type", Vec::new()).with_type_args(vec![point]),
        vec![rename(name, "Vec2")],
    ))];
    let (c, outcome) = f.load(body, "typescript");

    assert!(outcome.succeeded(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.stats.extensions, 1);
    assert_eq!(outcome.stats.methods, 1);
    assert_eq!(outcome.stats.failed, 0);
    assert_eq!(outcome.stats.registered, 1);
    let found = outcome.registry.find(&c, point, known::NAME).expect("rename registered");
    assert_eq!(found.arg(0), Some(&Constant::from("Vec2")));
}

#[test]
fn synthetic_renames_reach_the_emitted_file() {
    let mut f = Fixture::new();
    let point = f.b.class("Geo", "Point");
    let name = f.name_attribute;
    let body = vec![Stmt::expr(add(
        ctx("Type", vec![Argument::positional(Expr::type_of(point))]),
        vec![rename(name, "Vec2")],
    ))];
    let (c, outcome) = f.load(body, "typescript");

    let diagnostics = rosetta::DiagnosticBag::new();
    let config = EmitConfig::new().with_target(TargetKind::TypeScript);
    let pipeline = EmissionPipeline::new(&c, &outcome.registry, &config, &diagnostics);
    let result = pipeline.emit(&[point]).expect("emission succeeds");
    let file = result.get(point).expect("point emitted");
    assert_eq!(file.path, "Vec2.ts");
    assert!(file.text.contains("class Vec2"), "{}", file.text);
}

#[test]
fn bound_variables_and_fluent_chains_register_in_order() {
    let mut f = Fixture::new();
    let point = f.b.class("Geo", "Point");
    let name = f.name_attribute;
    let external = f.b.annotation_class(known::EXTERNAL);
    let body = vec![
        Stmt::local("t", ctx("Type", vec![Argument::positional(Expr::literal("Geo.Point"))])),
        Stmt::expr(add(
            add(Expr::name("t"), vec![rename(name, "First")]),
            vec![Expr::new_object(Vec::new(), Vec::new()).with_type(external)],
        )),
        Stmt::expr(Expr::assign(Expr::name("u"), Expr::name("t"))),
        Stmt::expr(add(Expr::name("u"), vec![rename(name, "Second")])),
    ];
    let (c, outcome) = f.load(body, "typescript");

    assert!(outcome.succeeded(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.stats.registered, 3);
    let classes: Vec<String> = outcome
        .registry
        .attributes(&c, point)
        .iter()
        .map(|a| c.full_name(a.class))
        .collect();
    assert_eq!(classes, [known::NAME, known::EXTERNAL, known::NAME]);
    // The last registration wins.
    let found = outcome.registry.find(&c, point, known::NAME).unwrap();
    assert_eq!(found.arg(0).and_then(Constant::as_str), Some("Second"));
}

#[test]
fn synthetic_annotations_follow_declared_ones() {
    let mut f = Fixture::new();
    let point = f.b.class("Geo", "Point");
    let name = f.name_attribute;
    f.b.annotate(point, Annotation::new(name).with_arg("Declared"));
    let body = vec![Stmt::expr(add(
        ctx("Type", Vec::new()).with_type_args(vec![point]),
        vec![rename(name, "Synthetic")],
    ))];
    let (c, outcome) = f.load(body, "typescript");

    let all = outcome.registry.attributes(&c, point);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].arg(0).and_then(Constant::as_str), Some("Declared"));
    assert_eq!(all[1].arg(0).and_then(Constant::as_str), Some("Synthetic"));
    let found = outcome.registry.find(&c, point, known::NAME).unwrap();
    assert_eq!(found.arg(0).and_then(Constant::as_str), Some("Synthetic"));
}

#[test]
fn member_accessor_retargets_to_the_getter() {
    let mut f = Fixture::new();
    let int = f.b.core_type(SpecialType::Int32);
    let point = f.b.class("Geo", "Point");
    let length = f.b.property(point, "Length", int);
    let name = f.name_attribute;
    let selector = Expr::lambda(&["x"], Expr::member(Expr::name("x"), "Length").with_symbol(length));
    let body = vec![Stmt::expr(add(
        ctx(
            "Member",
            vec![
                Argument::positional(selector),
                Argument::named("target", Expr::literal(3i64)),
            ],
        ),
        vec![rename(name, "size")],
    ))];
    let (c, outcome) = f.load(body, "typescript");

    assert!(outcome.succeeded(), "{:?}", outcome.diagnostics);
    let getter = c.symbol(length).getter.expect("auto-property getter");
    let on_getter = outcome.registry.attributes(&c, getter);
    assert_eq!(on_getter.len(), 1);
    assert_eq!(on_getter[0].target, AnnotationTarget::Getter);
    assert!(outcome.registry.attributes(&c, length).is_empty());
}

#[test]
fn member_accessor_selects_a_parameter_by_name() {
    let mut f = Fixture::new();
    let int = f.b.core_type(SpecialType::Int32);
    let point = f.b.class("Geo", "Point");
    let scale = f.b.method(point, "Scale", None, &[("factor", int)]);
    let name = f.name_attribute;
    let selector = Expr::lambda(
        &["x"],
        Expr::call(Expr::member(Expr::name("x"), "Scale"), Vec::new()).with_symbol(scale),
    );
    let body = vec![Stmt::expr(add(
        ctx(
            "Member",
            vec![
                Argument::positional(selector),
                Argument::named("name", Expr::literal("factor")),
            ],
        ),
        vec![rename(name, "k")],
    ))];
    let (c, outcome) = f.load(body, "typescript");

    assert!(outcome.succeeded(), "{:?}", outcome.diagnostics);
    let factor = c.parameters(scale)[0].id;
    let on_parameter = outcome.registry.attributes(&c, factor);
    assert_eq!(on_parameter.len(), 1);
    assert_eq!(on_parameter[0].target, AnnotationTarget::Parameter);
}

#[test]
fn return_value_annotations_are_kept_apart() {
    let mut f = Fixture::new();
    let int = f.b.core_type(SpecialType::Int32);
    let point = f.b.class("Geo", "Point");
    let sum = f.b.method(point, "Sum", Some(int), &[]);
    let name = f.name_attribute;
    let selector = Expr::lambda(
        &["x"],
        Expr::call(Expr::member(Expr::name("x"), "Sum"), Vec::new()).with_symbol(sum),
    );
    let body = vec![Stmt::expr(add(
        ctx(
            "Member",
            vec![Argument::positional(selector), Argument::positional(Expr::literal(1i64))],
        ),
        vec![rename(name, "total")],
    ))];
    let (c, outcome) = f.load(body, "typescript");

    assert!(outcome.succeeded(), "{:?}", outcome.diagnostics);
    assert!(outcome.registry.attributes(&c, sum).is_empty());
    assert_eq!(outcome.registry.return_value_attributes(&c, sum).len(), 1);
}

#[test]
fn constructor_accessor_uses_the_selected_overload() {
    let mut f = Fixture::new();
    let int = f.b.core_type(SpecialType::Int32);
    let point = f.b.class("Geo", "Point");
    f.b.constructor(point, &[]);
    let with_x = f.b.constructor(point, &[("x", int)]);
    let name = f.name_attribute;
    let selector = Expr::lambda(
        &["x"],
        Expr::new_object(vec![Argument::positional(Expr::literal(1i64))], Vec::new()).with_symbol(with_x),
    );
    let body = vec![Stmt::expr(add(
        ctx("Constructor", vec![Argument::positional(selector)]),
        vec![rename(name, "fromX")],
    ))];
    let (c, outcome) = f.load(body, "typescript");

    assert!(outcome.succeeded(), "{:?}", outcome.diagnostics);
    assert!(outcome.registry.has(&c, with_x, known::NAME));
}

#[test]
fn event_accessor_retargets_to_the_adder() {
    let mut f = Fixture::new();
    let action = f.b.type_decl("Ui", "Action", rosetta_syntax::TypeKind::Delegate);
    let button = f.b.class("Ui", "Button");
    let clicked = f.b.event(button, "Clicked", action);
    let name = f.name_attribute;
    let body = vec![Stmt::expr(add(
        ctx(
            "Event",
            vec![
                Argument::positional(Expr::literal("Clicked")),
                Argument::named("target", Expr::literal(5i64)),
            ],
        )
        .with_type_args(vec![button]),
        vec![rename(name, "onClick")],
    ))];
    let (c, outcome) = f.load(body, "typescript");

    assert!(outcome.succeeded(), "{:?}", outcome.diagnostics);
    let adder = c.symbol(clicked).adder.expect("event adder");
    let on_adder = outcome.registry.attributes(&c, adder);
    assert_eq!(on_adder.len(), 1);
    assert_eq!(on_adder[0].target, AnnotationTarget::Adder);
}

#[test]
fn unknown_events_are_reported() {
    let mut f = Fixture::new();
    let button = f.b.class("Ui", "Button");
    let name = f.name_attribute;
    let body = vec![Stmt::expr(add(
        ctx("Event", vec![Argument::named("name", Expr::literal("Pressed"))]).with_type_args(vec![button]),
        vec![rename(name, "x")],
    ))];
    let (_, outcome) = f.load(body, "typescript");
    assert_eq!(codes(&outcome), [DiagnosticCode::UnresolvedEvent]);
    assert_eq!(outcome.diagnostics[0].message, "type 'Ui.Button' has no event named 'Pressed'");
}

#[test]
fn extensions_for_other_targets_are_skipped() {
    let make = || {
        let mut f = Fixture::new();
        let point = f.b.class("Geo", "Point");
        let target = f.b.annotation_class(known::TARGET);
        f.b.annotate(f.extension, Annotation::new(target).with_arg("python"));
        let name = f.name_attribute;
        let body = vec![Stmt::expr(add(
            ctx("Type", Vec::new()).with_type_args(vec![point]),
            vec![rename(name, "vec")],
        ))];
        (f, body)
    };

    let (f, body) = make();
    let (_, skipped) = f.load(body, "typescript");
    assert_eq!(skipped.stats.extensions, 0);
    assert_eq!(skipped.stats.registered, 0);

    let (f, body) = make();
    let (_, applied) = f.load(body, "Python");
    assert_eq!(applied.stats.extensions, 1);
    assert_eq!(applied.stats.registered, 1);
}

#[test]
fn unsupported_statements_stop_the_method_but_keep_earlier_work() {
    let mut f = Fixture::new();
    let file = f.b.file("build/Rules.cs");
    let point = f.b.class("Geo", "Point");
    let name = f.name_attribute;
    let body = vec![
        Stmt::expr(add(
            ctx("Type", Vec::new()).with_type_args(vec![point]),
            vec![rename(name, "Kept")],
        )),
        Stmt::new(StmtKind::While {
            condition: Expr::literal(true),
            body: Vec::new(),
        })
        .with_span(Span::new(file, 12, 9)),
        Stmt::expr(add(
            ctx("Type", Vec::new()).with_type_args(vec![point]),
            vec![rename(name, "Never")],
        )),
    ];
    let (c, outcome) = f.load(body, "typescript");

    assert!(!outcome.succeeded());
    assert_eq!(outcome.stats.failed, 1);
    assert_eq!(outcome.stats.registered, 1);
    assert_eq!(codes(&outcome), [DiagnosticCode::UnsupportedStatement]);
    let reported = &outcome.diagnostics[0];
    assert_eq!(reported.file.as_deref(), Some("build/Rules.cs"));
    assert_eq!(reported.location().as_deref(), Some("build/Rules.cs:12:9"));
    let kept = outcome.registry.find(&c, point, known::NAME).unwrap();
    assert_eq!(kept.arg(0).and_then(Constant::as_str), Some("Kept"));
}

fn assert_fails(label: &str, body: impl FnOnce(&mut Fixture) -> Vec<Stmt>, expected: DiagnosticCode) {
    let mut f = Fixture::new();
    let body = body(&mut f);
    let (_, outcome) = f.load(body, "typescript");
    assert_eq!(codes(&outcome), [expected], "{label}");
    assert_eq!(outcome.stats.failed, 1, "{label}");
    assert!(!outcome.succeeded(), "{label}");
}

#[test]
fn extension_errors_are_diagnosed() {
    assert_fails(
        "unknown accessor",
        |f| {
            let name = f.name_attribute;
            vec![Stmt::expr(add(ctx("Property", Vec::new()), vec![rename(name, "x")]))]
        },
        DiagnosticCode::UnknownAccessor,
    );
    assert_fails(
        "unbound variable",
        |f| {
            let name = f.name_attribute;
            vec![Stmt::expr(add(Expr::name("missing"), vec![rename(name, "x")]))]
        },
        DiagnosticCode::UnboundVariable,
    );
    assert_fails(
        "non-constant argument",
        |f| {
            let point = f.b.class("Geo", "Point");
            let name = f.name_attribute;
            let computed =
                Expr::new_object(vec![Argument::positional(Expr::name("label"))], Vec::new()).with_type(name);
            vec![Stmt::expr(add(
                ctx("Type", Vec::new()).with_type_args(vec![point]),
                vec![computed],
            ))]
        },
        DiagnosticCode::NonConstantArgument,
    );
    assert_fails(
        "annotation that is not an object creation",
        |f| {
            let point = f.b.class("Geo", "Point");
            vec![Stmt::expr(add(
                ctx("Type", Vec::new()).with_type_args(vec![point]),
                vec![Expr::literal("Vec2")],
            ))]
        },
        DiagnosticCode::UnsupportedAnnotation,
    );
    assert_fails(
        "adder target on a field",
        |f| {
            let int = f.b.core_type(SpecialType::Int32);
            let point = f.b.class("Geo", "Point");
            let x = f.b.field(point, "X", int);
            let name = f.name_attribute;
            let selector = Expr::lambda(&["p"], Expr::member(Expr::name("p"), "X").with_symbol(x));
            vec![Stmt::expr(add(
                ctx(
                    "Member",
                    vec![Argument::positional(selector), Argument::named("target", Expr::literal(5i64))],
                ),
                vec![rename(name, "x")],
            ))]
        },
        DiagnosticCode::InvalidTarget,
    );
    assert_fails(
        "member selector that is not a lambda",
        |f| {
            let name = f.name_attribute;
            vec![Stmt::expr(add(
                ctx("Member", vec![Argument::positional(Expr::literal("X"))]),
                vec![rename(name, "x")],
            ))]
        },
        DiagnosticCode::UnresolvedMember,
    );
    assert_fails(
        "unknown assembly",
        |f| {
            let name = f.name_attribute;
            vec![Stmt::expr(add(
                ctx("Assembly", vec![Argument::positional(Expr::literal("Nope"))]),
                vec![rename(name, "x")],
            ))]
        },
        DiagnosticCode::UnresolvedAssembly,
    );
    assert_fails(
        "unknown type name",
        |f| {
            let name = f.name_attribute;
            vec![Stmt::expr(add(
                ctx("Type", vec![Argument::positional(Expr::literal("Geo.Missing"))]),
                vec![rename(name, "x")],
            ))]
        },
        DiagnosticCode::UnresolvedType,
    );
}

#[test]
fn entry_methods_need_exactly_one_parameter() {
    let mut f = Fixture::new();
    let int = f.b.core_type(SpecialType::Int32);
    f.b.parameter(f.init, "extra", int);
    let (_, outcome) = f.load(Vec::new(), "typescript");
    assert_eq!(codes(&outcome), [DiagnosticCode::ExtensionSignature]);
    assert_eq!(outcome.stats.failed, 1);
}

#[test]
fn extensions_without_an_entry_method_only_warn() {
    let mut b = CompilationBuilder::new();
    let marker = b.interface("Rosetta", "ICompilerExtension");
    let extension = b.class("App.Build", "Empty");
    b.implement(extension, marker);
    let c = b.build();

    let outcome = load(&c, "typescript", &CancellationToken::new()).unwrap();
    assert_eq!(codes(&outcome), [DiagnosticCode::MissingEntryMethod]);
    assert!(outcome.succeeded());
    assert_eq!(outcome.stats.extensions, 1);
    assert_eq!(outcome.stats.methods, 0);
}

#[test]
fn extensions_in_referenced_assemblies_run_too() {
    let mut b = CompilationBuilder::new();
    let marker = b.interface("Rosetta", "ICompilerExtension");
    let context = b.annotation_class("Rosetta.ExtensionContext");
    let name = b.annotation_class(known::NAME);
    let point = b.class("Geo", "Point");
    b.reference_assembly("Geo.Rules");
    let extension = b.class("Geo.Rules", "Naming");
    b.implement(extension, marker);
    let init = b.method(extension, "Init", None, &[("ctx", context)]);
    b.set_body(
        init,
        vec![Stmt::expr(add(
            ctx("Type", Vec::new()).with_type_args(vec![point]),
            vec![rename(name, "P")],
        ))],
    );
    b.use_source();
    let c = b.build();

    let outcome = load(&c, "typescript", &CancellationToken::new()).unwrap();
    assert!(outcome.succeeded(), "{:?}", outcome.diagnostics);
    assert!(outcome.registry.has(&c, point, known::NAME));
}

#[test]
fn a_failing_extension_does_not_undo_its_siblings() {
    let mut f = Fixture::new();
    let point = f.b.class("Geo", "Point");
    let line = f.b.class("Geo", "Line");
    let name = f.name_attribute;

    // A second extension whose annotation argument is computed at runtime.
    let extension = f.extension;
    let marker = f.b.symbol_mut(extension).interfaces[0];
    let context = f.b.annotation_class("Rosetta.ExtensionContext");
    let sibling = f.b.class("App.Build", "BrokenRules");
    f.b.implement(sibling, marker);
    let sibling_init = f.b.method(sibling, "Init", None, &[("ctx", context)]);
    let computed = Expr::new_object(vec![Argument::positional(Expr::name("label"))], Vec::new()).with_type(name);
    f.b.set_body(
        sibling_init,
        vec![Stmt::expr(add(ctx("Type", Vec::new()).with_type_args(vec![line]), vec![computed]))],
    );

    let body = vec![Stmt::expr(add(
        ctx("Type", Vec::new()).with_type_args(vec![point]),
        vec![rename(name, "Vec2")],
    ))];
    let (c, outcome) = f.load(body, "typescript");

    assert_eq!(codes(&outcome), [DiagnosticCode::NonConstantArgument]);
    assert!(!outcome.succeeded());
    assert_eq!(outcome.stats.extensions, 2);
    assert_eq!(outcome.stats.failed, 1);
    assert_eq!(outcome.stats.registered, 1);
    let kept = outcome.registry.find(&c, point, known::NAME).unwrap();
    assert_eq!(kept.arg(0).and_then(Constant::as_str), Some("Vec2"));
    assert!(!outcome.registry.has(&c, line, known::NAME));
}
