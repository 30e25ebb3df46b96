//! Whole-file output of both renderers, built through the public pipeline.

use rosetta::backend::EmitError;
use rosetta::config::{EmitConfig, TargetKind};
use rosetta::frontend::{AttributeRegistry, DiagnosticBag, DiagnosticCode};
use rosetta::{EmissionPipeline, EmitResult};
use rosetta_core::SpecialType;
use rosetta_syntax::{
    Argument, BinaryOp, Compilation, CompilationBuilder, Constant, Expr, ExprKind, Span, Stmt, StmtKind,
    SwitchSection, SymbolId, TypeKind,
};

fn emit(compilation: &Compilation, target: TargetKind) -> (EmitResult, DiagnosticBag) {
    let registry = AttributeRegistry::new();
    let diagnostics = DiagnosticBag::new();
    let config = EmitConfig::new().with_target(target).with_parallelism(2);
    let result = {
        let pipeline = EmissionPipeline::new(compilation, &registry, &config, &diagnostics);
        pipeline.emit(&pipeline.emittable_types()).expect("emission succeeds")
    };
    (result, diagnostics)
}

fn text(result: &EmitResult, ty: SymbolId) -> &str {
    &result.get(ty).expect("type was emitted").text
}

/// `Geo.Point` with two fields, a constructor, an instance and a static method.
fn point_program() -> (Compilation, SymbolId) {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let point = b.class("Geo", "Point");
    let fx = b.field(point, "X", int);
    let fy = b.field(point, "Y", int);

    let ctor = b.constructor(point, &[]);
    let px = b.parameter(ctor, "x", int);
    let py = b.parameter(ctor, "y", int);
    let field = |f, ty| Expr::name(if f == fx { "X" } else { "Y" }).with_symbol(f).with_type(ty);
    b.set_body(
        ctor,
        vec![
            Stmt::expr(Expr::assign(field(fx, int), Expr::name("x").with_symbol(px).with_type(int))),
            Stmt::expr(Expr::assign(field(fy, int), Expr::name("y").with_symbol(py).with_type(int))),
        ],
    );

    let sum = b.method(point, "Sum", Some(int), &[]);
    b.set_body(
        sum,
        vec![Stmt::ret(Some(
            Expr::binary(BinaryOp::Add, field(fx, int), field(fy, int)).with_type(int),
        ))],
    );

    let half = b.static_method(point, "Half", Some(int), &[]);
    let v = b.parameter(half, "v", int);
    b.set_body(
        half,
        vec![Stmt::ret(Some(
            Expr::binary(
                BinaryOp::Div,
                Expr::name("v").with_symbol(v).with_type(int),
                Expr::literal(2i64).with_type(int),
            )
            .with_type(int),
        ))],
    );
    (b.build(), point)
}

#[test]
fn typescript_class_with_members() {
    let (c, point) = point_program();
    let (result, diagnostics) = emit(&c, TargetKind::TypeScript);
    assert!(diagnostics.is_empty());
    assert_eq!(result.get(point).unwrap().path, "Geo/Point.ts");
    insta::assert_snapshot!(text(&result, point), @r"
    namespace Geo {
        export class Point {
            x: number = 0;
            y: number = 0;

            constructor(x: number, y: number) {
                this.x = x;
                this.y = y;
            }

            sum(): number {
                return this.x + this.y;
            }

            static half(v: number): number {
                return Math.trunc(v / 2);
            }
        }
    }
    ");
}

#[test]
fn python_class_with_members() {
    let (c, point) = point_program();
    let (result, _) = emit(&c, TargetKind::Python);
    assert_eq!(result.get(point).unwrap().path, "Geo_Point.py");
    insta::assert_snapshot!(text(&result, point), @r"
    from __future__ import annotations


    class Geo_Point:
        x: int
        y: int

        def __init__(self, x: int, y: int) -> None:
            self.x = 0
            self.y = 0
            self.x = x
            self.y = y

        def sum(self) -> int:
            return self.x + self.y

        @staticmethod
        def half(v: int) -> int:
            return int(v / 2)
    ");
}

/// `Geo.Color` enum plus `Geo.Palette` using it in a switch, and a foreach over an array.
fn palette_program() -> (Compilation, SymbolId, SymbolId) {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let string = b.core_type(SpecialType::String);
    let ints = b.array_of(int);
    let file = b.file("src/Geo/Palette.cs");

    let color = b.enum_type("Geo", "Color");
    let red = b.enum_member(color, "Red", 0);
    b.enum_member(color, "Green", 1);

    let palette = b.class("Geo", "Palette");
    let describe = b.static_method(palette, "Describe", Some(string), &[]);
    let c = b.parameter(describe, "c", color);
    b.set_body(
        describe,
        vec![Stmt::new(StmtKind::Switch {
            subject: Expr::name("c").with_symbol(c).with_type(color),
            sections: vec![
                SwitchSection {
                    labels: vec![Some(
                        Expr::name("Red")
                            .with_symbol(red)
                            .with_type(color)
                            .with_constant(Constant::Enum { ty: color, value: 0 }),
                    )],
                    body: vec![Stmt::ret(Some(Expr::literal("red").with_type(string)))],
                },
                SwitchSection {
                    labels: vec![None],
                    body: vec![Stmt::ret(Some(Expr::literal("other").with_type(string)))],
                },
            ],
        })
        .with_span(Span::new(file, 10, 9))],
    );

    let count = b.method(palette, "Count", Some(int), &[]);
    let values = b.parameter(count, "values", ints);
    let total = b.local(count, "total", int);
    let item = b.local(count, "v", int);
    b.set_body(
        count,
        vec![
            Stmt::new(StmtKind::Local {
                name: "total".to_string(),
                symbol: Some(total),
                init: Some(Expr::literal(0i64).with_type(int)),
            }),
            Stmt::new(StmtKind::Foreach {
                variable: "v".to_string(),
                symbol: Some(item),
                collection: Expr::name("values").with_symbol(values).with_type(ints),
                body: vec![Stmt::expr(Expr::new(ExprKind::Assignment {
                    op: Some(BinaryOp::Add),
                    target: Box::new(Expr::name("total").with_symbol(total).with_type(int)),
                    value: Box::new(Expr::name("v").with_symbol(item).with_type(int)),
                }))],
            }),
            Stmt::ret(Some(Expr::name("total").with_symbol(total).with_type(int))),
        ],
    );
    (b.build(), color, palette)
}

#[test]
fn python_enum_and_match() {
    let (c, color, palette) = palette_program();
    let (result, _) = emit(&c, TargetKind::Python);
    insta::assert_snapshot!(text(&result, color), @r"
    from __future__ import annotations

    from enum import IntEnum


    class Geo_Color(IntEnum):
        RED = 0
        GREEN = 1
    ");
    insta::assert_snapshot!(text(&result, palette), @r#"
    from __future__ import annotations

    from Geo_Color import Geo_Color


    class Geo_Palette:
        @staticmethod
        def describe(c: Geo_Color) -> str:
            match c:
                case Geo_Color.RED:
                    return "red"
                case _:
                    return "other"

        def count(self, values: list[int]) -> int:
            total = 0
            for v in values:
                total += v
            return total
    "#);
}

#[test]
fn typescript_enum_and_switch() {
    let (c, color, palette) = palette_program();
    let (result, _) = emit(&c, TargetKind::TypeScript);
    insta::assert_snapshot!(text(&result, color), @r"
    namespace Geo {
        export enum Color {
            Red = 0,
            Green = 1,
        }
    }
    ");
    insta::assert_snapshot!(text(&result, palette), @r#"
    namespace Geo {
        export class Palette {
            static describe(c: Geo.Color): string {
                switch (c) {
                    case Geo.Color.Red:
                        return "red";
                    default:
                        return "other";
                }
            }

            count(values: number[]): number {
                let total = 0;
                for (const v of values) {
                    total += v;
                }
                return total;
            }
        }
    }
    "#);
}

#[test]
fn typescript_field_like_event() {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let action = b.type_decl("Ui", "Action", TypeKind::Delegate);
    b.method(action, "Invoke", None, &[("value", int)]);
    let button = b.class("Ui", "Button");
    let clicked = b.event(button, "Clicked", action);
    let click = b.method(button, "Click", None, &[]);
    b.set_body(
        click,
        vec![Stmt::expr(Expr::call(
            Expr::name("Clicked").with_symbol(clicked).with_type(action),
            vec![Argument::positional(Expr::literal(1i64).with_type(int))],
        ))],
    );
    let c = b.build();

    let (result, _) = emit(&c, TargetKind::TypeScript);
    assert_eq!(result.len(), 1, "delegates get no file of their own");
    insta::assert_snapshot!(text(&result, button), @r"
    namespace Ui {
        export class Button {
            clicked: ((arg0: number) => void)[] = [];

            addClicked(handler: ((arg0: number) => void)): void {
                this.clicked.push(handler);
            }

            removeClicked(handler: ((arg0: number) => void)): void {
                const index = this.clicked.indexOf(handler);
                if (index >= 0) {
                    this.clicked.splice(index, 1);
                }
            }

            click(): void {
                this.clicked.slice().forEach((h) => h(1));
            }
        }
    }
    ");
}

#[test]
fn failures_carry_the_last_visited_node() {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let file = b.file("src/Flow.cs");
    let flow = b.class("App", "Flow");
    let run = b.method(flow, "Run", None, &[]);
    let k = b.parameter(run, "k", int);
    let early_break = Stmt::new(StmtKind::Break).with_span(Span::new(file, 7, 13));
    b.set_body(
        run,
        vec![Stmt::new(StmtKind::Switch {
            subject: Expr::name("k").with_symbol(k).with_type(int),
            sections: vec![SwitchSection {
                labels: vec![Some(Expr::literal(1i64).with_type(int))],
                body: vec![
                    Stmt::new(StmtKind::If {
                        condition: Expr::literal(true),
                        then_branch: vec![early_break],
                        else_branch: None,
                    }),
                    Stmt::new(StmtKind::Break),
                ],
            }],
        })],
    );
    let c = b.build();

    let registry = AttributeRegistry::new();
    let diagnostics = DiagnosticBag::new();
    let config = EmitConfig::new().with_target(TargetKind::Python);
    let pipeline = EmissionPipeline::new(&c, &registry, &config, &diagnostics);
    let err = pipeline.emit(&pipeline.emittable_types()).unwrap_err();

    let EmitError::Context { ty, node, location, source } = &err else {
        panic!("expected a context error, got {err:?}");
    };
    assert_eq!(ty, "App.Flow");
    assert_eq!(*node, "break");
    assert_eq!(location, "src/Flow.cs:7:13");
    assert!(matches!(source.as_ref(), EmitError::Unsupported(_)));

    let reported = diagnostics.snapshot();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].code, DiagnosticCode::EmissionFailed);
    assert!(reported[0].is_error());
}

#[test]
fn the_same_program_renders_identically_at_any_parallelism() {
    let (c, _, _) = palette_program();
    let registry = AttributeRegistry::new();
    let run = |jobs| {
        let diagnostics = DiagnosticBag::new();
        let config = EmitConfig::new().with_target(TargetKind::TypeScript).with_parallelism(jobs);
        let pipeline = EmissionPipeline::new(&c, &registry, &config, &diagnostics);
        pipeline.emit(&pipeline.emittable_types()).unwrap()
    };
    assert_eq!(run(1), run(4));
}
