//! Output naming through the public resolver, for both targets.
//!
//! The property tests check that names are unique within a type and do not depend on the order (or thread) in
//! which they are queried once the pre-pass has run.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use rayon::prelude::*;
use rosetta::backend::{NameResolver, renderer_for};
use rosetta::{AttributeRegistry, DiagnosticBag, EmissionPipeline, EmitConfig, TargetKind};
use rosetta_core::SpecialType;
use rosetta_core::lang::annotations as known;
use rosetta_syntax::{Annotation, Compilation, CompilationBuilder, SymbolId};

fn resolver<'c>(c: &'c Compilation, registry: &'c AttributeRegistry, target: TargetKind) -> NameResolver<'c> {
    NameResolver::new(c, registry, renderer_for(target).conventions())
}

#[test]
fn overloads_get_parameter_type_suffixes() {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let string = b.core_type(SpecialType::String);
    let ints = b.array_of(int);
    let geo = b.class("App", "Geo");
    let by_int = b.method(geo, "Move", None, &[("x", int)]);
    let by_pair = b.method(geo, "Move", None, &[("x", int), ("label", string)]);
    let by_array = b.method(geo, "Move", None, &[("xs", ints)]);
    let single = b.method(geo, "Stop", None, &[("x", int)]);
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    ts.prepare(&[geo]);
    assert_eq!(&*ts.name(by_int), "move$Int32");
    assert_eq!(&*ts.name(by_pair), "move$Int32$String");
    assert_eq!(&*ts.name(by_array), "move$Int32Array");
    assert_eq!(&*ts.name(single), "stop");

    let py = resolver(&c, &registry, TargetKind::Python);
    py.prepare(&[geo]);
    assert_eq!(&*py.name(by_pair), "move_Int32_String");
}

#[test]
fn constructor_names_depend_on_the_overload_count() {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let single = b.class("Geo", "Circle");
    let only = b.constructor(single, &[("r", int)]);
    let point = b.class("Geo", "Point");
    let empty = b.constructor(point, &[]);
    let with_x = b.constructor(point, &[("x", int)]);
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    ts.prepare(&[single, point]);
    assert_eq!(&*ts.name(only), "constructor");
    assert_eq!(&*ts.name(empty), "Point");
    assert_eq!(&*ts.name(with_x), "Point$Int32");
    assert!(ts.entry(with_x).has_constructor_overloads);

    let py = resolver(&c, &registry, TargetKind::Python);
    assert_eq!(&*py.name(only), "__init__");
}

#[test]
fn keywords_are_escaped_per_target() {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let store = b.class("App", "Store");
    let delete = b.method(store, "Delete", None, &[]);
    let class = b.field(store, "Class", int);
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    assert_eq!(&*ts.name(delete), "delete_");
    assert_eq!(&*ts.name(class), "class_");

    let py = resolver(&c, &registry, TargetKind::Python);
    assert_eq!(&*py.name(delete), "delete");
    assert_eq!(&*py.name(class), "class_");
}

#[test]
fn case_collisions_get_numeric_suffixes_in_declaration_order() {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let store = b.class("App", "Store");
    let upper = b.field(store, "Value", int);
    let lower = b.field(store, "value", int);
    let snake = b.field(store, "_value", int);
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    ts.prepare(&[store]);
    assert_eq!(&*ts.name(upper), "value");
    assert_eq!(&*ts.name(lower), "value1");
    assert_eq!(&*ts.name(snake), "_value");
}

#[test]
fn renames_are_verbatim_and_claim_their_name_first() {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let name = b.annotation_class(known::NAME);
    let shape = b.class("Geo", "Shape");
    let natural = b.field(shape, "Size", int);
    let renamed = b.method(shape, "ComputeArea", Some(int), &[]);
    b.annotate(renamed, Annotation::new(name).with_arg("size"));
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    ts.prepare(&[shape]);
    assert_eq!(&*ts.name(renamed), "size");
    assert_eq!(&*ts.name(natural), "size1");

    // No case conversion, even for Python.
    let mut b = CompilationBuilder::new();
    let name = b.annotation_class(known::NAME);
    let shape = b.class("Geo", "Shape");
    let renamed = b.method(shape, "Area", None, &[]);
    b.annotate(renamed, Annotation::new(name).with_arg("AreaOf"));
    let c = b.build();
    let py = resolver(&c, &registry, TargetKind::Python);
    assert_eq!(&*py.name(renamed), "AreaOf");
}

#[test]
fn type_renames_drop_the_namespace_unless_asked() {
    let mut b = CompilationBuilder::new();
    let name = b.annotation_class(known::NAME);
    let dropped = b.class("Geo.Shapes", "Point");
    b.annotate(dropped, Annotation::new(name).with_arg("Vec2"));
    let kept = b.class("Geo.Shapes", "Circle");
    b.annotate(kept, Annotation::new(name).with_arg("Round").with_named("KeepNamespace", true));
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    assert_eq!(&*ts.name(dropped), "Vec2");
    assert_eq!(&*ts.name(kept), "Geo.Shapes.Round");

    let py = resolver(&c, &registry, TargetKind::Python);
    assert_eq!(&*py.name(kept), "Geo_Shapes_Round");
}

#[test]
fn native_names_win_over_everything() {
    let mut b = CompilationBuilder::new();
    let name = b.annotation_class(known::NAME);
    let native = b.annotation_class(known::NATIVE);
    let list = b.class("Collections", "List");
    b.annotate(list, Annotation::new(name).with_arg("Ignored"));
    b.annotate(list, Annotation::new(native).with_arg("Array"));
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    let entry = ts.entry(list);
    assert_eq!(&*entry.name, "Array");
    assert!(entry.is_native());
}

#[test]
fn generic_types_sharing_a_name_get_their_arity() {
    let mut b = CompilationBuilder::new();
    let plain = b.class("Data", "Box");
    let generic = b.generic_class("Data", "Box", &["T"]);
    let pair = b.generic_class("Data", "Pair", &["A", "B"]);
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    ts.prepare(&[plain, generic, pair]);
    assert_eq!(&*ts.name(plain), "Data.Box");
    assert_eq!(&*ts.name(generic), "Data.Box$1");
    assert_eq!(&*ts.name(pair), "Data.Pair");
}

#[test]
fn nested_types_are_prefixed_with_their_outer_type() {
    let mut b = CompilationBuilder::new();
    let outer = b.class("App", "Tree");
    let inner = b.nested_class(outer, "Node");
    let c = b.build();
    let registry = AttributeRegistry::new();

    assert_eq!(&*resolver(&c, &registry, TargetKind::TypeScript).name(inner), "App.Tree$Node");
    assert_eq!(&*resolver(&c, &registry, TargetKind::Python).name(inner), "App_Tree_Node");
}

#[test]
fn types_with_the_same_simple_name_in_different_namespaces_stay_distinct() {
    let mut b = CompilationBuilder::new();
    let geo = b.class("Geo", "Point");
    let draw = b.class("Draw", "Point");
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    ts.prepare(&[geo, draw]);
    assert_eq!(&*ts.name(geo), "Geo.Point");
    assert_eq!(&*ts.name(draw), "Draw.Point");

    let py = resolver(&c, &registry, TargetKind::Python);
    py.prepare(&[geo, draw]);
    assert_ne!(py.name(geo), py.name(draw));
}

#[test]
fn renamed_types_claim_their_name_before_siblings() {
    let mut b = CompilationBuilder::new();
    let name = b.annotation_class(known::NAME);
    let foo = b.class("App", "Foo");
    let bar = b.class("App", "Bar");
    b.annotate(bar, Annotation::new(name).with_arg("Foo").with_named("KeepNamespace", true));
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    ts.prepare(&[foo, bar]);
    assert_eq!(&*ts.name(bar), "App.Foo");
    assert_eq!(&*ts.name(foo), "App.Foo1");

    // Each type gets its own file.
    let bag = DiagnosticBag::new();
    let config = EmitConfig::new().with_target(TargetKind::TypeScript).with_parallelism(2);
    let pipeline = EmissionPipeline::new(&c, &registry, &config, &bag);
    let result = pipeline.emit(&[foo, bar]).unwrap();
    assert_eq!(result.get(bar).unwrap().path, "App/Foo.ts");
    assert_eq!(result.get(foo).unwrap().path, "App/Foo1.ts");
}

#[test]
fn conflicting_type_renames_do_not_share_a_name() {
    let mut b = CompilationBuilder::new();
    let name = b.annotation_class(known::NAME);
    let first = b.class("Geo", "Point");
    let second = b.class("Draw", "Point");
    b.annotate(first, Annotation::new(name).with_arg("Vec2"));
    b.annotate(second, Annotation::new(name).with_arg("Vec2"));
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    ts.prepare(&[first, second]);
    assert_eq!(&*ts.name(first), "Vec2");
    assert_eq!(&*ts.name(second), "Vec21");
}

#[test]
fn flattened_type_names_are_unique_across_the_program() {
    let mut b = CompilationBuilder::new();
    let outer = b.class("App", "Outer");
    let inner = b.nested_class(outer, "Inner");
    let look_alike = b.class("App", "Outer_Inner");
    let c = b.build();
    let registry = AttributeRegistry::new();

    let py = resolver(&c, &registry, TargetKind::Python);
    py.prepare(&[outer, inner, look_alike]);
    assert_eq!(&*py.name(inner), "App_Outer_Inner");
    assert_ne!(py.name(look_alike), py.name(inner));

    let python = renderer_for(TargetKind::Python);
    assert_ne!(python.file_path(&py.name(inner)), python.file_path(&py.name(look_alike)));
}

#[test]
fn accessors_follow_the_member_case() {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let action = b.type_decl("Ui", "Action", rosetta_syntax::TypeKind::Delegate);
    let button = b.class("Ui", "Button");
    let width = b.property(button, "Width", int);
    let clicked = b.event(button, "Clicked", action);
    let c = b.build();
    let registry = AttributeRegistry::new();

    let ts = resolver(&c, &registry, TargetKind::TypeScript);
    ts.prepare(&[button]);
    let property = c.symbol(width);
    let event = c.symbol(clicked);
    assert_eq!(&*ts.name(property.getter.unwrap()), "getWidth");
    assert_eq!(&*ts.name(event.adder.unwrap()), "addClicked");
    assert_eq!(&*ts.name(event.remover.unwrap()), "removeClicked");

    let py = resolver(&c, &registry, TargetKind::Python);
    py.prepare(&[button]);
    assert_eq!(&*py.name(property.setter.unwrap()), "set_width");
}

// =============================================================================
// Properties
// =============================================================================

const MEMBER_NAMES: &[&str] = &[
    "Run", "run", "Value", "value", "_value", "Delete", "Class", "Item", "ItemCount", "item_count", "Size",
];

/// A class whose members are generated from `(name, kind)` pairs: 0 = method, 1 = field, 2 = property.
fn generated_class(members: &[(usize, u8)]) -> (Compilation, SymbolId, Vec<SymbolId>) {
    let mut b = CompilationBuilder::new();
    let int = b.core_type(SpecialType::Int32);
    let ty = b.class("Gen", "Sample");
    let mut ids = Vec::new();
    for &(name, kind) in members {
        let name = MEMBER_NAMES[name];
        let id = match kind {
            0 => b.method(ty, name, None, &[]),
            1 => b.field(ty, name, int),
            _ => b.property(ty, name, int),
        };
        ids.push(id);
        let symbol = b.symbol_mut(id);
        let accessors = [symbol.getter, symbol.setter];
        ids.extend(accessors.into_iter().flatten());
    }
    (b.build(), ty, ids)
}

fn members_strategy() -> impl Strategy<Value = Vec<(usize, u8)>> {
    prop::collection::vec((0..MEMBER_NAMES.len(), 0u8..3), 1..16)
}

fn target_strategy() -> impl Strategy<Value = TargetKind> {
    prop_oneof![Just(TargetKind::TypeScript), Just(TargetKind::Python)]
}

proptest! {
    /// Property: every member and accessor of a type gets a distinct output name.
    #[test]
    fn names_are_unique_within_a_type(members in members_strategy(), target in target_strategy()) {
        let (c, ty, ids) = generated_class(&members);
        let registry = AttributeRegistry::new();
        let names = resolver(&c, &registry, target);
        names.prepare(&[ty]);
        let distinct: HashSet<Arc<str>> = ids.iter().map(|&id| names.name(id)).collect();
        prop_assert_eq!(distinct.len(), ids.len());
    }

    /// Property: after the pre-pass, query order and parallelism do not change any name.
    #[test]
    fn names_do_not_depend_on_query_order(members in members_strategy(), target in target_strategy()) {
        let (c, ty, ids) = generated_class(&members);
        let registry = AttributeRegistry::new();

        let first = resolver(&c, &registry, target);
        first.prepare(&[ty]);
        let in_order: Vec<Arc<str>> = ids.iter().map(|&id| first.name(id)).collect();

        let second = resolver(&c, &registry, target);
        second.prepare(&[ty]);
        let mut reversed: Vec<Arc<str>> = ids.iter().rev().map(|&id| second.name(id)).collect();
        reversed.reverse();
        prop_assert_eq!(&in_order, &reversed);

        let third = resolver(&c, &registry, target);
        third.prepare(&[ty]);
        let parallel: Vec<Arc<str>> = ids.par_iter().map(|&id| third.name(id)).collect();
        prop_assert_eq!(&in_order, &parallel);
    }

    /// Property: resolving a symbol twice yields the same name.
    #[test]
    fn names_are_memoized(members in members_strategy()) {
        let (c, ty, ids) = generated_class(&members);
        let registry = AttributeRegistry::new();
        let names = resolver(&c, &registry, TargetKind::TypeScript);
        names.prepare(&[ty]);
        let cached = names.cached();
        for &id in &ids {
            prop_assert_eq!(names.name(id), names.name(id));
        }
        prop_assert_eq!(names.cached(), cached);
    }
}
