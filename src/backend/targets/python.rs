//! Python renderer.
//!
//! Output is one module per type, named after the type's flattened output name (`App_Models_Point.py`). Types
//! declared in other modules are imported by name; `from __future__ import annotations` keeps type hints unevaluated
//! so hints never need imports of their own.

use rosetta_core::lang::casts::CastRule;
use rosetta_core::lang::keywords::PYTHON_KEYWORDS;
use rosetta_core::{Case, SpecialType};
use rosetta_syntax::{BinaryOp, UnaryOp};

use super::{
    AccessorDecl, AccessorKind, EventDecl, FieldDecl, FileHeader, MethodDecl, Renderer, TypeDecl, masked_narrow,
};
use crate::backend::emit::{Conversion, EmitError, Writer};
use crate::backend::naming::NamingConventions;
use crate::config::TargetKind;

pub static PYTHON_CONVENTIONS: NamingConventions = NamingConventions {
    type_case: Case::Preserve,
    method_case: Case::Snake,
    property_case: Case::Snake,
    field_case: Case::Snake,
    enum_member_case: Case::ScreamingSnake,
    parameter_case: Case::Snake,
    constructor_name: "__init__",
    overload_separator: "_",
    namespace_separator: "_",
    nested_separator: "_",
    keywords: PYTHON_KEYWORDS,
    keyword_suffix: "_",
    primitives: &[
        (SpecialType::Void, "None"),
        (SpecialType::Object, "object"),
        (SpecialType::Boolean, "bool"),
        (SpecialType::Char, "str"),
        (SpecialType::SByte, "int"),
        (SpecialType::Byte, "int"),
        (SpecialType::Int16, "int"),
        (SpecialType::UInt16, "int"),
        (SpecialType::Int32, "int"),
        (SpecialType::UInt32, "int"),
        (SpecialType::Int64, "int"),
        (SpecialType::UInt64, "int"),
        (SpecialType::Single, "float"),
        (SpecialType::Double, "float"),
        (SpecialType::Decimal, "Decimal"),
        (SpecialType::String, "str"),
    ],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonRenderer;

fn is_simple_target(target: &str) -> bool {
    target.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl PythonRenderer {
    fn parameter_list(&self, decl: &MethodDecl<'_>) -> String {
        let receiver = (!decl.is_static).then(|| self.this_keyword().to_string());
        let params = decl.params.iter().map(|p| match (&p.element_ty, &p.default) {
            (Some(element), _) => format!("*{}: {element}", p.name),
            (None, Some(default)) => format!("{}: {} = {default}", p.name, p.ty),
            (None, None) => format!("{}: {}", p.name, p.ty),
        });
        receiver.into_iter().chain(params).collect::<Vec<_>>().join(", ")
    }

    fn def(&self, w: &mut Writer, is_static: bool, signature: &str, is_abstract: bool) {
        if is_static {
            w.writeln("@staticmethod");
        }
        if is_abstract {
            w.writeln(&format!("def {signature}: ..."));
        } else {
            self.open_block(w, &format!("def {signature}"));
        }
    }
}

impl Renderer for PythonRenderer {
    fn target(&self) -> TargetKind {
        TargetKind::Python
    }

    fn conventions(&self) -> &'static NamingConventions {
        &PYTHON_CONVENTIONS
    }

    fn null_literal(&self) -> &'static str {
        "None"
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "True" } else { "False" }
    }

    fn float_literal(&self, value: f64) -> String {
        if value.is_finite() {
            format!("{value:?}")
        } else {
            format!("float(\"{value}\")")
        }
    }

    fn this_keyword(&self) -> &'static str {
        "self"
    }

    fn binary_operator(&self, op: BinaryOp) -> &'static str {
        match op {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            // Rendered by `binary` as a conditional expression.
            BinaryOp::Coalesce => "or",
        }
    }

    fn binary(&self, op: BinaryOp, lhs: &str, rhs: &str) -> String {
        match op {
            BinaryOp::Coalesce => format!("({lhs} if {lhs} is not None else {rhs})"),
            op => format!("{lhs} {} {rhs}", self.binary_operator(op)),
        }
    }

    fn integer_division(&self, lhs: &str, rhs: &str) -> String {
        format!("int({lhs} / {rhs})")
    }

    fn unary(&self, op: UnaryOp, operand: &str) -> String {
        match op {
            UnaryOp::Neg => format!("-{operand}"),
            UnaryOp::Not => format!("not {operand}"),
            UnaryOp::BitNot => format!("~{operand}"),
        }
    }

    fn concat_operand(&self, text: &str) -> String {
        format!("str({text})")
    }

    fn conditional(&self, condition: &str, when_true: &str, when_false: &str) -> String {
        format!("{when_true} if {condition} else {when_false}")
    }

    fn assignment(
        &self,
        target: &str,
        op: Option<BinaryOp>,
        value: &str,
        as_expression: bool,
    ) -> Result<String, EmitError> {
        if as_expression {
            return match op {
                None if is_simple_target(target) => Ok(format!("({target} := {value})")),
                _ => Err(EmitError::unsupported(format!(
                    "assignment to '{target}' used as a value in Python"
                ))),
            };
        }
        Ok(match op {
            None => format!("{target} = {value}"),
            Some(BinaryOp::Coalesce) => format!("{target} = {target} if {target} is not None else {value}"),
            Some(BinaryOp::And) => format!("{target} = {target} and {value}"),
            Some(BinaryOp::Or) => format!("{target} = {target} or {value}"),
            Some(op) => format!("{target} {}= {value}", self.binary_operator(op)),
        })
    }

    fn object_creation(&self, ty: &str, args: &[String]) -> String {
        format!("{ty}({})", args.join(", "))
    }

    fn with_initializers(&self, creation: &str, initializers: &[(String, String)], temp: &str) -> String {
        let sets = initializers
            .iter()
            .map(|(member, value)| format!("setattr({temp}, \"{member}\", {value})"))
            .chain(std::iter::once(temp.to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("(lambda {temp}: ({sets})[-1])({creation})")
    }

    fn spread(&self, text: &str) -> String {
        format!("*{text}")
    }

    fn lambda(&self, params: &[String], body: &str) -> String {
        if params.is_empty() {
            format!("lambda: {body}")
        } else {
            format!("lambda {}: {body}", params.join(", "))
        }
    }

    fn block_lambda_header(&self, _params: &[String]) -> Result<String, EmitError> {
        Err(EmitError::unsupported("lambda with a statement body in Python"))
    }

    fn raise_event(&self, storage: &str, args: &[String]) -> String {
        format!("[h({}) for h in list({storage})]", args.join(", "))
    }

    fn conversion(&self, text: &str, conversion: &Conversion, target_type: &str) -> String {
        match conversion {
            Conversion::Numeric(numeric) => match numeric.rule {
                CastRule::Narrow => masked_narrow(text, numeric.to).unwrap_or_else(|| format!("int({text})")),
                CastRule::Truncate => match masked_narrow(&format!("int({text})"), numeric.to) {
                    Some(masked) if !matches!(numeric.to, SpecialType::Int64) => masked,
                    _ => format!("int({text})"),
                },
                CastRule::Widen => format!("float({text})"),
                CastRule::ToSingle => text.to_string(),
                CastRule::CharCode => format!("ord({text})"),
                CastRule::FromCharCode => format!("chr({text})"),
                CastRule::ToDecimal => format!("Decimal({text})"),
                CastRule::FromDecimal if numeric.to.is_integral() => format!("int({text})"),
                CastRule::FromDecimal => format!("float({text})"),
            },
            Conversion::EnumToUnderlying { .. } => format!("int({text})"),
            Conversion::UnderlyingToEnum { .. } => format!("{target_type}({text})"),
            Conversion::Convertible { to } => self.convertible(text, *to),
            Conversion::ToIterable { from_array: true } => text.to_string(),
            Conversion::ToIterable { from_array: false } => {
                format!("(e.current for e in [{text}.get_enumerator()] for _ in iter(e.move_next, False))")
            }
        }
    }

    fn cast(&self, text: &str, _target_type: &str) -> String {
        text.to_string()
    }

    fn instance_check(&self, value: &str, ty: &str) -> String {
        format!("isinstance({value}, {ty})")
    }

    fn array_type(&self, element: &str) -> String {
        format!("list[{element}]")
    }

    fn generic_type(&self, name: &str, args: &[String]) -> String {
        format!("{name}[{}]", args.join(", "))
    }

    fn nullable_type(&self, inner: &str) -> String {
        format!("{inner} | None")
    }

    fn iterable_type(&self, element: &str) -> String {
        format!("Iterable[{element}]")
    }

    fn function_type(&self, params: &[String], ret: &str) -> String {
        format!("Callable[[{}], {ret}]", params.join(", "))
    }

    fn statement_end(&self) -> &'static str {
        ""
    }

    fn open_block(&self, w: &mut Writer, header: &str) {
        w.writeln(&format!("{header}:"));
        w.indent();
    }

    fn continue_block(&self, w: &mut Writer, header: &str) {
        w.dedent();
        self.open_block(w, header);
    }

    fn close_block(&self, w: &mut Writer) {
        w.dedent();
    }

    fn empty_body(&self, w: &mut Writer) {
        w.writeln("pass");
    }

    fn local(&self, name: &str, ty: Option<&str>, init: Option<&str>) -> String {
        match (ty, init) {
            (_, Some(init)) => format!("{name} = {init}"),
            (Some(ty), None) => format!("{name}: {ty}"),
            (None, None) => format!("{name} = None"),
        }
    }

    fn if_header(&self, condition: &str) -> String {
        format!("if {condition}")
    }

    fn else_if_header(&self, condition: &str) -> String {
        format!("elif {condition}")
    }

    fn while_header(&self, condition: &str) -> String {
        format!("while {condition}")
    }

    fn foreach_header(&self, variable: &str, collection: &str) -> String {
        format!("for {variable} in {collection}")
    }

    fn throw(&self, value: &str) -> String {
        format!("raise {value}")
    }

    fn rethrow(&self, _caught: Option<&str>) -> Result<String, EmitError> {
        Ok("raise".to_string())
    }

    fn try_header(&self) -> &'static str {
        "try"
    }

    fn typed_catch(&self) -> bool {
        true
    }

    fn catch_header(&self, variable: Option<&str>, ty: Option<&str>) -> String {
        let ty = ty.unwrap_or("Exception");
        match variable {
            Some(variable) => format!("except {ty} as {variable}"),
            None => format!("except {ty}"),
        }
    }

    fn switch_header(&self, subject: &str) -> String {
        format!("match {subject}")
    }

    fn keeps_switch_breaks(&self) -> bool {
        false
    }

    fn open_switch_section(&self, w: &mut Writer, labels: &[Option<String>]) {
        let pattern = if labels.iter().any(Option::is_none) {
            "_".to_string()
        } else {
            labels.iter().flatten().cloned().collect::<Vec<_>>().join(" | ")
        };
        self.open_block(w, &format!("case {pattern}"));
    }

    fn begin_file(&self, w: &mut Writer, header: &FileHeader) {
        w.writeln("from __future__ import annotations");
        let mut imports = Vec::new();
        if header.uses.decimal {
            imports.push("from decimal import Decimal".to_string());
        }
        if header.uses.enums {
            imports.push("from enum import IntEnum".to_string());
        }
        for (module, name) in &header.imports {
            imports.push(format!("from {module} import {name}"));
        }
        if !imports.is_empty() {
            w.newline();
            for import in &imports {
                w.writeln(import);
            }
        }
        w.newline();
        w.newline();
    }

    fn end_file(&self, _w: &mut Writer, _header: &FileHeader) {}

    fn class_open(&self, w: &mut Writer, decl: &TypeDecl<'_>) {
        let bases: Vec<&str> = decl.base.iter().chain(&decl.interfaces).map(String::as_str).collect();
        if bases.is_empty() {
            self.open_block(w, &format!("class {}", decl.name));
        } else {
            self.open_block(w, &format!("class {}({})", decl.name, bases.join(", ")));
        }
    }

    fn class_close(&self, w: &mut Writer, decl: &TypeDecl<'_>, static_init: Option<&str>) {
        self.close_block(w);
        if let Some(init) = static_init {
            w.blank_line();
            w.writeln(&format!("{}.{init}()", decl.name));
        }
    }

    fn enum_open(&self, w: &mut Writer, decl: &TypeDecl<'_>) {
        self.open_block(w, &format!("class {}(IntEnum)", decl.name));
    }

    fn enum_member(&self, w: &mut Writer, name: &str, value: &str) {
        w.writeln(&format!("{name} = {value}"));
    }

    fn enum_close(&self, w: &mut Writer) {
        self.close_block(w);
    }

    fn inline_field_initializers(&self) -> bool {
        false
    }

    fn field(&self, w: &mut Writer, decl: &FieldDecl<'_>) {
        match decl.init {
            Some(init) if decl.is_static => w.writeln(&format!("{}: {} = {init}", decl.name, decl.ty)),
            _ => w.writeln(&format!("{}: {}", decl.name, decl.ty)),
        }
    }

    fn accessor_open(&self, w: &mut Writer, decl: &AccessorDecl<'_>) -> Result<(), EmitError> {
        if decl.is_static {
            return Err(EmitError::unsupported(format!("static property '{}' in Python", decl.name)));
        }
        let this = self.this_keyword();
        match decl.kind {
            AccessorKind::Getter => {
                w.writeln("@property");
                self.def(w, false, &format!("{}({this}) -> {}", decl.name, decl.ty), decl.is_abstract);
            }
            AccessorKind::Setter => {
                w.writeln(&format!("@{}.setter", decl.name));
                let signature = format!("{}({this}, {}: {}) -> None", decl.name, decl.value, decl.ty);
                self.def(w, false, &signature, decl.is_abstract);
            }
        }
        Ok(())
    }

    fn method_open(&self, w: &mut Writer, decl: &MethodDecl<'_>) {
        let params = self.parameter_list(decl);
        let ret = if decl.is_constructor {
            "None"
        } else {
            decl.return_type.as_deref().unwrap_or("None")
        };
        let signature = format!("{}({params}) -> {ret}", decl.name);
        self.def(w, decl.is_static, &signature, decl.is_abstract);
        if decl.call_super && !decl.is_abstract {
            w.writeln("super().__init__()");
        }
    }

    fn event_accessors(&self, w: &mut Writer, decl: &EventDecl<'_>) {
        let handler = format!("handler: {}", decl.handler_type);
        let params = if decl.is_static {
            handler
        } else {
            format!("{}, {handler}", self.this_keyword())
        };
        self.def(w, decl.is_static, &format!("{}({params}) -> None", decl.adder), false);
        w.writeln(&format!("{}.append(handler)", decl.storage));
        self.close_block(w);
        w.blank_line();
        self.def(w, decl.is_static, &format!("{}({params}) -> None", decl.remover), false);
        self.open_block(w, &format!("if handler in {}", decl.storage));
        w.writeln(&format!("{}.remove(handler)", decl.storage));
        self.close_block(w);
        self.close_block(w);
    }
}
