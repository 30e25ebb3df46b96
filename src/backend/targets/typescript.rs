//! TypeScript renderer.
//!
//! Output is one script file per type. Types keep their namespace as a `namespace` block, so files merge into one
//! global namespace tree when compiled together and need no imports. Nested types are declared next to their outer
//! type under the joined name (`Outer$Inner`).

use rosetta_core::lang::casts::CastRule;
use rosetta_core::lang::keywords::TYPESCRIPT_KEYWORDS;
use rosetta_core::{Case, SpecialType};
use rosetta_syntax::{BinaryOp, TypeKind, UnaryOp};

use super::{AccessorDecl, AccessorKind, EventDecl, FieldDecl, FileHeader, MethodDecl, Renderer, TypeDecl};
use crate::backend::emit::{Conversion, EmitError, Writer};
use crate::backend::naming::NamingConventions;
use crate::config::TargetKind;

pub static TYPESCRIPT_CONVENTIONS: NamingConventions = NamingConventions {
    type_case: Case::Preserve,
    method_case: Case::Camel,
    property_case: Case::Camel,
    field_case: Case::Camel,
    enum_member_case: Case::Preserve,
    parameter_case: Case::Camel,
    constructor_name: "constructor",
    overload_separator: "$",
    namespace_separator: ".",
    nested_separator: "$",
    keywords: TYPESCRIPT_KEYWORDS,
    keyword_suffix: "_",
    primitives: &[
        (SpecialType::Void, "void"),
        (SpecialType::Object, "any"),
        (SpecialType::Boolean, "boolean"),
        (SpecialType::Char, "string"),
        (SpecialType::SByte, "number"),
        (SpecialType::Byte, "number"),
        (SpecialType::Int16, "number"),
        (SpecialType::UInt16, "number"),
        (SpecialType::Int32, "number"),
        (SpecialType::UInt32, "number"),
        (SpecialType::Int64, "number"),
        (SpecialType::UInt64, "number"),
        (SpecialType::Single, "number"),
        (SpecialType::Double, "number"),
        (SpecialType::Decimal, "number"),
        (SpecialType::String, "string"),
    ],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptRenderer;

fn narrow(text: &str, to: SpecialType) -> String {
    match to {
        SpecialType::Int32 => format!("({text} | 0)"),
        SpecialType::UInt32 => format!("({text} >>> 0)"),
        SpecialType::Int16 => format!("(({text} << 16) >> 16)"),
        SpecialType::UInt16 => format!("({text} & 0xFFFF)"),
        SpecialType::SByte => format!("(({text} << 24) >> 24)"),
        SpecialType::Byte => format!("({text} & 0xFF)"),
        _ => format!("Math.trunc({text})"),
    }
}

fn parameter_list(decl: &MethodDecl<'_>) -> String {
    decl.params
        .iter()
        .map(|p| match (&p.element_ty, &p.default) {
            (Some(_), _) => format!("...{}: {}", p.name, p.ty),
            (None, Some(default)) => format!("{}: {} = {default}", p.name, p.ty),
            (None, None) => format!("{}: {}", p.name, p.ty),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl Renderer for TypeScriptRenderer {
    fn target(&self) -> TargetKind {
        TargetKind::TypeScript
    }

    fn conventions(&self) -> &'static NamingConventions {
        &TYPESCRIPT_CONVENTIONS
    }

    fn file_path(&self, type_name: &str) -> String {
        format!("{}.ts", type_name.replace('.', "/"))
    }

    fn split_type_name<'n>(&self, name: &'n str) -> (Option<&'n str>, &'n str) {
        match name.rsplit_once('.') {
            Some((namespace, simple)) => (Some(namespace), simple),
            None => (None, name),
        }
    }

    fn null_literal(&self) -> &'static str {
        "null"
    }

    fn absent_literal(&self) -> &'static str {
        "undefined"
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "true" } else { "false" }
    }

    fn float_literal(&self, value: f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
            text.to_string()
        } else {
            format!("{value:?}")
        }
    }

    fn this_keyword(&self) -> &'static str {
        "this"
    }

    fn binary_operator(&self, op: BinaryOp) -> &'static str {
        match op {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "===",
            BinaryOp::NotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Coalesce => "??",
        }
    }

    fn integer_division(&self, lhs: &str, rhs: &str) -> String {
        format!("Math.trunc({lhs} / {rhs})")
    }

    fn unary(&self, op: UnaryOp, operand: &str) -> String {
        match op {
            UnaryOp::Neg => format!("-{operand}"),
            UnaryOp::Not => format!("!{operand}"),
            UnaryOp::BitNot => format!("~{operand}"),
        }
    }

    fn conditional(&self, condition: &str, when_true: &str, when_false: &str) -> String {
        format!("{condition} ? {when_true} : {when_false}")
    }

    fn assignment(
        &self,
        target: &str,
        op: Option<BinaryOp>,
        value: &str,
        as_expression: bool,
    ) -> Result<String, EmitError> {
        let text = match op {
            Some(op) => format!("{target} {}= {value}", self.binary_operator(op)),
            None => format!("{target} = {value}"),
        };
        Ok(if as_expression { format!("({text})") } else { text })
    }

    fn object_creation(&self, ty: &str, args: &[String]) -> String {
        format!("new {ty}({})", args.join(", "))
    }

    fn with_initializers(&self, creation: &str, initializers: &[(String, String)], _temp: &str) -> String {
        let fields = initializers
            .iter()
            .map(|(member, value)| format!("{member}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Object.assign({creation}, {{ {fields} }})")
    }

    fn spread(&self, text: &str) -> String {
        format!("...{text}")
    }

    fn lambda(&self, params: &[String], body: &str) -> String {
        format!("({}) => {body}", params.join(", "))
    }

    fn block_lambda_header(&self, params: &[String]) -> Result<String, EmitError> {
        Ok(format!("({}) =>", params.join(", ")))
    }

    fn raise_event(&self, storage: &str, args: &[String]) -> String {
        format!("{storage}.slice().forEach((h) => h({}))", args.join(", "))
    }

    fn conversion(&self, text: &str, conversion: &Conversion, target_type: &str) -> String {
        match conversion {
            Conversion::Numeric(numeric) => match numeric.rule {
                CastRule::Narrow => narrow(text, numeric.to),
                CastRule::Truncate => match numeric.to {
                    SpecialType::Int64 | SpecialType::UInt64 => format!("Math.trunc({text})"),
                    to => narrow(&format!("Math.trunc({text})"), to),
                },
                CastRule::ToSingle => format!("Math.fround({text})"),
                CastRule::CharCode => format!("{text}.charCodeAt(0)"),
                CastRule::FromCharCode => format!("String.fromCharCode({text})"),
                CastRule::Widen | CastRule::ToDecimal | CastRule::FromDecimal => text.to_string(),
            },
            Conversion::EnumToUnderlying { .. } => text.to_string(),
            Conversion::UnderlyingToEnum { .. } => format!("({text} as {target_type})"),
            Conversion::Convertible { to } => self.convertible(text, *to),
            Conversion::ToIterable { from_array: true } => text.to_string(),
            Conversion::ToIterable { from_array: false } => format!(
                "{{ [Symbol.iterator]: function* () {{ const e = {text}.getEnumerator(); while (e.moveNext()) yield e.current; }} }}"
            ),
        }
    }

    fn cast(&self, text: &str, target_type: &str) -> String {
        format!("({text} as {target_type})")
    }

    fn instance_check(&self, value: &str, ty: &str) -> String {
        format!("{value} instanceof {ty}")
    }

    fn array_type(&self, element: &str) -> String {
        let wrapped = element.starts_with('(') && element.ends_with(')');
        if element.contains(' ') && !wrapped {
            format!("({element})[]")
        } else {
            format!("{element}[]")
        }
    }

    fn generic_type(&self, name: &str, args: &[String]) -> String {
        format!("{name}<{}>", args.join(", "))
    }

    fn nullable_type(&self, inner: &str) -> String {
        format!("{inner} | null")
    }

    fn iterable_type(&self, element: &str) -> String {
        format!("Iterable<{element}>")
    }

    fn function_type(&self, params: &[String], ret: &str) -> String {
        let params = params
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("arg{i}: {ty}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("(({params}) => {ret})")
    }

    fn statement_end(&self) -> &'static str {
        ";"
    }

    fn open_block(&self, w: &mut Writer, header: &str) {
        w.writeln(&format!("{header} {{"));
        w.indent();
    }

    fn continue_block(&self, w: &mut Writer, header: &str) {
        w.dedent();
        w.writeln(&format!("}} {header} {{"));
        w.indent();
    }

    fn close_block(&self, w: &mut Writer) {
        w.dedent();
        w.writeln("}");
    }

    fn open_scope(&self, w: &mut Writer) {
        w.writeln("{");
        w.indent();
    }

    fn close_scope(&self, w: &mut Writer) {
        self.close_block(w);
    }

    fn local(&self, name: &str, ty: Option<&str>, init: Option<&str>) -> String {
        match (ty, init) {
            (_, Some(init)) => format!("let {name} = {init}"),
            (Some(ty), None) => format!("let {name}: {ty}"),
            (None, None) => format!("let {name}"),
        }
    }

    fn if_header(&self, condition: &str) -> String {
        format!("if ({condition})")
    }

    fn else_if_header(&self, condition: &str) -> String {
        format!("else if ({condition})")
    }

    fn while_header(&self, condition: &str) -> String {
        format!("while ({condition})")
    }

    fn foreach_header(&self, variable: &str, collection: &str) -> String {
        format!("for (const {variable} of {collection})")
    }

    fn throw(&self, value: &str) -> String {
        format!("throw {value}")
    }

    fn rethrow(&self, caught: Option<&str>) -> Result<String, EmitError> {
        caught
            .map(|variable| format!("throw {variable}"))
            .ok_or_else(|| EmitError::unsupported("rethrow outside of a catch clause"))
    }

    fn typed_catch(&self) -> bool {
        false
    }

    fn catch_header(&self, variable: Option<&str>, _ty: Option<&str>) -> String {
        match variable {
            Some(variable) => format!("catch ({variable})"),
            None => "catch".to_string(),
        }
    }

    fn switch_header(&self, subject: &str) -> String {
        format!("switch ({subject})")
    }

    fn keeps_switch_breaks(&self) -> bool {
        true
    }

    fn open_switch_section(&self, w: &mut Writer, labels: &[Option<String>]) {
        for label in labels {
            match label {
                Some(label) => w.writeln(&format!("case {label}:")),
                None => w.writeln("default:"),
            }
        }
        w.indent();
    }

    fn begin_file(&self, w: &mut Writer, header: &FileHeader) {
        if let Some(namespace) = &header.namespace {
            w.writeln(&format!("namespace {namespace} {{"));
            w.indent();
        }
    }

    fn end_file(&self, w: &mut Writer, header: &FileHeader) {
        if header.namespace.is_some() {
            w.dedent();
            w.writeln("}");
        }
    }

    fn class_open(&self, w: &mut Writer, decl: &TypeDecl<'_>) {
        let export = if decl.exported { "export " } else { "" };
        let type_parameters = if decl.type_parameters.is_empty() {
            String::new()
        } else {
            format!("<{}>", decl.type_parameters.join(", "))
        };
        let mut header = if decl.kind == TypeKind::Interface {
            let mut header = format!("{export}interface {}{type_parameters}", decl.name);
            let bases: Vec<&str> = decl.base.iter().chain(&decl.interfaces).map(String::as_str).collect();
            if !bases.is_empty() {
                header.push_str(&format!(" extends {}", bases.join(", ")));
            }
            header
        } else {
            let mut header = format!("{export}class {}{type_parameters}", decl.name);
            if let Some(base) = &decl.base {
                header.push_str(&format!(" extends {base}"));
            }
            if !decl.interfaces.is_empty() {
                header.push_str(&format!(" implements {}", decl.interfaces.join(", ")));
            }
            header
        };
        header.push_str(" {");
        w.writeln(&header);
        w.indent();
    }

    fn class_close(&self, w: &mut Writer, decl: &TypeDecl<'_>, static_init: Option<&str>) {
        if let Some(init) = static_init {
            w.blank_line();
            w.writeln("static {");
            w.indent();
            w.writeln(&format!("{}.{init}();", decl.name));
            w.dedent();
            w.writeln("}");
        }
        self.close_block(w);
    }

    fn enum_open(&self, w: &mut Writer, decl: &TypeDecl<'_>) {
        let export = if decl.exported { "export " } else { "" };
        w.writeln(&format!("{export}enum {} {{", decl.name));
        w.indent();
    }

    fn enum_member(&self, w: &mut Writer, name: &str, value: &str) {
        w.writeln(&format!("{name} = {value},"));
    }

    fn enum_close(&self, w: &mut Writer) {
        self.close_block(w);
    }

    fn inline_field_initializers(&self) -> bool {
        true
    }

    fn field(&self, w: &mut Writer, decl: &FieldDecl<'_>) {
        let modifier = if decl.is_static { "static " } else { "" };
        match decl.init {
            Some(init) => w.writeln(&format!("{modifier}{}: {} = {init};", decl.name, decl.ty)),
            None => w.writeln(&format!("{modifier}{}: {};", decl.name, decl.ty)),
        }
    }

    fn accessor_open(&self, w: &mut Writer, decl: &AccessorDecl<'_>) -> Result<(), EmitError> {
        let modifier = if decl.is_static { "static " } else { "" };
        let header = match decl.kind {
            AccessorKind::Getter => format!("{modifier}get {}(): {}", decl.name, decl.ty),
            AccessorKind::Setter => format!("{modifier}set {}({}: {})", decl.name, decl.value, decl.ty),
        };
        if decl.is_abstract {
            // Interface accessors become a plain property signature, written once for the getter.
            if decl.kind == AccessorKind::Getter {
                w.writeln(&format!("{}: {};", decl.name, decl.ty));
            }
        } else {
            self.open_block(w, &header);
        }
        Ok(())
    }

    fn method_open(&self, w: &mut Writer, decl: &MethodDecl<'_>) {
        let params = parameter_list(decl);
        if decl.is_constructor {
            self.open_block(w, &format!("constructor({params})"));
            if decl.call_super {
                w.writeln("super();");
            }
            return;
        }
        let modifier = if decl.is_static { "static " } else { "" };
        let type_parameters = if decl.type_parameters.is_empty() {
            String::new()
        } else {
            format!("<{}>", decl.type_parameters.join(", "))
        };
        let ret = decl.return_type.as_deref().unwrap_or("void");
        let signature = format!("{modifier}{}{type_parameters}({params}): {ret}", decl.name);
        if decl.is_abstract {
            w.writeln(&format!("{signature};"));
        } else {
            self.open_block(w, &signature);
        }
    }

    fn event_accessors(&self, w: &mut Writer, decl: &EventDecl<'_>) {
        let modifier = if decl.is_static { "static " } else { "" };
        let storage = decl.storage;
        self.open_block(w, &format!("{modifier}{}(handler: {}): void", decl.adder, decl.handler_type));
        w.writeln(&format!("{storage}.push(handler);"));
        self.close_block(w);
        w.blank_line();
        self.open_block(w, &format!("{modifier}{}(handler: {}): void", decl.remover, decl.handler_type));
        w.writeln(&format!("const index = {storage}.indexOf(handler);"));
        self.open_block(w, "if (index >= 0)");
        w.writeln(&format!("{storage}.splice(index, 1);"));
        self.close_block(w);
        self.close_block(w);
    }
}
