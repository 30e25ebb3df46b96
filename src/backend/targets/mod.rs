//! Target renderers.
//!
//! A [`Renderer`] turns the facts the engine computed (output names, bound arguments, conversion decisions) into the
//! literal text of one target language. Every renderer is driven by the same node dispatch in
//! [`crate::backend::emit`]: adding a target means implementing this trait, never a second dispatch mechanism.
//!
//! ## Notes
//! - Expression hooks take already-rendered child text and return text; statement and declaration hooks write to the
//!   active [`Writer`] buffer.
//! - Renderers are stateless and shared by every emission worker (`Send + Sync`).
//!
//! ## See also
//! - [`typescript`]: `.ts` output, namespaces, camelCase members
//! - [`python`]: `.py` output, flat module names, snake_case members

pub mod python;
pub mod typescript;

use rosetta_core::{NumericClass, SpecialType};
use rosetta_syntax::{BinaryOp, TypeKind, UnaryOp};

use crate::backend::emit::{Conversion, EmitError, Writer};
use crate::backend::naming::NamingConventions;
use crate::config::TargetKind;

pub use python::PythonRenderer;
pub use typescript::TypeScriptRenderer;

/// Renderer for a backend.
pub fn renderer_for(target: TargetKind) -> &'static dyn Renderer {
    match target {
        TargetKind::TypeScript => &TypeScriptRenderer,
        TargetKind::Python => &PythonRenderer,
    }
}

/// Runtime facilities a file needs beyond the types it references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uses {
    pub enums: bool,
    pub decimal: bool,
}

/// Everything known about an output file once its declarations are rendered.
#[derive(Debug, Clone, Default)]
pub struct FileHeader {
    pub namespace: Option<String>,
    /// `(module, name)` pairs of types declared in other files.
    pub imports: Vec<(String, String)>,
    pub uses: Uses,
}

#[derive(Debug, Clone)]
pub struct TypeDecl<'a> {
    pub name: &'a str,
    pub kind: TypeKind,
    pub base: Option<String>,
    pub interfaces: Vec<String>,
    pub type_parameters: Vec<String>,
    /// Declared inside a namespace block and visible outside it.
    pub exported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: String,
    /// Element type of a variadic parameter.
    pub element_ty: Option<String>,
    pub default: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl<'a> {
    pub name: &'a str,
    pub params: &'a [ParamDecl],
    pub type_parameters: Vec<String>,
    pub return_type: Option<String>,
    pub is_static: bool,
    /// Signature only: interface members and methods without a body.
    pub is_abstract: bool,
    /// The type's single constructor (rendered with the target's constructor syntax).
    pub is_constructor: bool,
    /// Call the base type's constructor before anything else.
    pub call_super: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Getter,
    Setter,
}

#[derive(Debug, Clone)]
pub struct AccessorDecl<'a> {
    pub name: &'a str,
    pub ty: &'a str,
    pub kind: AccessorKind,
    /// Setter parameter.
    pub value: &'a str,
    pub is_static: bool,
    pub is_abstract: bool,
}

#[derive(Debug, Clone)]
pub struct FieldDecl<'a> {
    pub name: &'a str,
    pub ty: &'a str,
    pub init: Option<&'a str>,
    pub is_static: bool,
}

#[derive(Debug, Clone)]
pub struct EventDecl<'a> {
    pub adder: &'a str,
    pub remover: &'a str,
    pub handler_type: &'a str,
    /// How the handler list is reached (`this.changed`, `Type.changed`).
    pub storage: &'a str,
    pub is_static: bool,
}

/// Quote a string literal with JSON-style escapes, which both reference targets accept.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Bit width and signedness of an integral special type.
pub fn integral_shape(special: SpecialType) -> Option<(u8, bool)> {
    match special.numeric_class()? {
        NumericClass::Integral { bits, signed } => Some((bits, signed)),
        _ => None,
    }
}

pub trait Renderer: Send + Sync {
    fn target(&self) -> TargetKind;

    fn conventions(&self) -> &'static NamingConventions;

    /// Relative output path of the file declaring the type with this output name.
    fn file_path(&self, type_name: &str) -> String {
        format!("{type_name}.{}", self.target().file_extension())
    }

    /// Name other files import the file declaring `type_name` by.
    fn module_name(&self, type_name: &str) -> String {
        type_name.to_string()
    }

    /// `(namespace, simple name)` of a type's output name.
    fn split_type_name<'n>(&self, name: &'n str) -> (Option<&'n str>, &'n str) {
        (None, name)
    }

    // ---- literals -------------------------------------------------------------------------------------------------

    fn null_literal(&self) -> &'static str;

    /// Value passed for an optional parameter that has no default at all.
    fn absent_literal(&self) -> &'static str {
        self.null_literal()
    }

    fn bool_literal(&self, value: bool) -> &'static str;

    fn float_literal(&self, value: f64) -> String;

    fn string_literal(&self, value: &str) -> String {
        quote(value)
    }

    fn this_keyword(&self) -> &'static str;

    /// Zero value of a special type.
    fn default_value(&self, special: SpecialType) -> String {
        match special {
            SpecialType::Boolean => self.bool_literal(false).to_string(),
            SpecialType::Char => self.string_literal("\0"),
            SpecialType::Single | SpecialType::Double => self.float_literal(0.0),
            s if s.is_numeric() => "0".to_string(),
            _ => self.null_literal().to_string(),
        }
    }

    // ---- expressions ----------------------------------------------------------------------------------------------

    fn binary_operator(&self, op: BinaryOp) -> &'static str;

    fn binary(&self, op: BinaryOp, lhs: &str, rhs: &str) -> String {
        format!("{lhs} {} {rhs}", self.binary_operator(op))
    }

    /// Integer division truncating toward zero.
    fn integer_division(&self, lhs: &str, rhs: &str) -> String;

    fn unary(&self, op: UnaryOp, operand: &str) -> String;

    /// Operand of a string concatenation whose static type is not a string.
    fn concat_operand(&self, text: &str) -> String {
        text.to_string()
    }

    fn conditional(&self, condition: &str, when_true: &str, when_false: &str) -> String;

    /// `target = value` (or compound). `as_expression` is set when the value of the assignment is used.
    fn assignment(&self, target: &str, op: Option<BinaryOp>, value: &str, as_expression: bool)
    -> Result<String, EmitError>;

    fn object_creation(&self, ty: &str, args: &[String]) -> String;

    /// Creation through an overloaded constructor rendered as a named initializer method.
    fn named_construction(&self, ty: &str, constructor: &str, args: &[String]) -> String {
        format!("{}.{constructor}({})", self.object_creation(ty, &[]), args.join(", "))
    }

    /// Apply `member = value` initializers to a freshly created object; `temp` is free in the current scope.
    fn with_initializers(&self, creation: &str, initializers: &[(String, String)], temp: &str) -> String;

    fn array_literal(&self, elements: &[String]) -> String {
        format!("[{}]", elements.join(", "))
    }

    /// Pass an array to a variadic parameter as separate arguments.
    fn spread(&self, text: &str) -> String;

    fn lambda(&self, params: &[String], body: &str) -> String;

    /// Header of a lambda with a statement body (the block itself is opened by [`Renderer::open_block`]).
    fn block_lambda_header(&self, params: &[String]) -> Result<String, EmitError>;

    /// Invoke every handler in an event's handler list.
    fn raise_event(&self, storage: &str, args: &[String]) -> String;

    fn conversion(&self, text: &str, conversion: &Conversion, target_type: &str) -> String;

    /// Explicit cast the engine has no conversion rule for.
    fn cast(&self, text: &str, target_type: &str) -> String;

    /// Explicit conversion of a convertible object to a primitive (`ToInt32(null)`).
    fn convertible(&self, text: &str, to: SpecialType) -> String {
        let simple = to.full_name().and_then(|n| n.rsplit('.').next()).unwrap_or("Object");
        let conventions = self.conventions();
        let method = conventions.identifier(&format!("To{simple}"), conventions.method_case);
        format!("{text}.{method}({})", self.null_literal())
    }

    fn instance_check(&self, value: &str, ty: &str) -> String;

    // ---- types ----------------------------------------------------------------------------------------------------

    fn array_type(&self, element: &str) -> String;

    fn generic_type(&self, name: &str, args: &[String]) -> String;

    fn nullable_type(&self, inner: &str) -> String;

    fn iterable_type(&self, element: &str) -> String;

    fn function_type(&self, params: &[String], ret: &str) -> String;

    // ---- statements -----------------------------------------------------------------------------------------------

    fn statement_end(&self) -> &'static str;

    /// Write `header` and open a block below it.
    fn open_block(&self, w: &mut Writer, header: &str);

    /// Close the current block and open the next clause of the same statement (`else`, `catch`, `finally`).
    fn continue_block(&self, w: &mut Writer, header: &str);

    fn close_block(&self, w: &mut Writer);

    /// Called for a block that would otherwise have no statements.
    fn empty_body(&self, _w: &mut Writer) {}

    /// Lexical scope for a bare block statement.
    fn open_scope(&self, _w: &mut Writer) {}

    fn close_scope(&self, _w: &mut Writer) {}

    fn local(&self, name: &str, ty: Option<&str>, init: Option<&str>) -> String;

    fn if_header(&self, condition: &str) -> String;

    fn else_if_header(&self, condition: &str) -> String;

    fn else_header(&self) -> &'static str {
        "else"
    }

    fn while_header(&self, condition: &str) -> String;

    fn foreach_header(&self, variable: &str, collection: &str) -> String;

    fn throw(&self, value: &str) -> String;

    /// Re-raise the exception being handled; `caught` names the enclosing catch variable.
    fn rethrow(&self, caught: Option<&str>) -> Result<String, EmitError>;

    fn try_header(&self) -> &'static str {
        "try"
    }

    /// Whether catch clauses can filter on the exception type natively.
    fn typed_catch(&self) -> bool;

    fn catch_header(&self, variable: Option<&str>, ty: Option<&str>) -> String;

    fn finally_header(&self) -> &'static str {
        "finally"
    }

    fn switch_header(&self, subject: &str) -> String;

    /// Whether a `break` ending a switch section is kept.
    fn keeps_switch_breaks(&self) -> bool;

    /// Open one switch section; a `None` label is the default section.
    fn open_switch_section(&self, w: &mut Writer, labels: &[Option<String>]);

    fn close_switch_section(&self, w: &mut Writer) {
        w.dedent();
    }

    // ---- declarations ---------------------------------------------------------------------------------------------

    fn begin_file(&self, w: &mut Writer, header: &FileHeader);

    fn end_file(&self, w: &mut Writer, header: &FileHeader);

    fn class_open(&self, w: &mut Writer, decl: &TypeDecl<'_>);

    /// Close a class; `static_init` names a static initializer method to run once the class exists.
    fn class_close(&self, w: &mut Writer, decl: &TypeDecl<'_>, static_init: Option<&str>);

    fn enum_open(&self, w: &mut Writer, decl: &TypeDecl<'_>);

    fn enum_member(&self, w: &mut Writer, name: &str, value: &str);

    fn enum_close(&self, w: &mut Writer);

    /// Whether instance field initializers are written on the field (otherwise at the top of every constructor).
    fn inline_field_initializers(&self) -> bool;

    fn field(&self, w: &mut Writer, decl: &FieldDecl<'_>);

    /// Assignment of an instance field inside a constructor.
    fn field_init(&self, name: &str, value: &str) -> String {
        format!("{}.{name} = {value}{}", self.this_keyword(), self.statement_end())
    }

    /// Open a property accessor. Abstract accessors are written as a signature and opened no block.
    fn accessor_open(&self, w: &mut Writer, decl: &AccessorDecl<'_>) -> Result<(), EmitError>;

    /// Open a method. Abstract methods are written as a signature and open no block.
    fn method_open(&self, w: &mut Writer, decl: &MethodDecl<'_>);

    /// Add/remove methods of a field-like event.
    fn event_accessors(&self, w: &mut Writer, decl: &EventDecl<'_>);
}

/// Text of a numeric conversion shared by targets whose integers are unbounded and masked on narrowing.
pub(crate) fn masked_narrow(text: &str, to: SpecialType) -> Option<String> {
    let (bits, signed) = integral_shape(to)?;
    let full: u128 = 1u128 << bits;
    Some(if signed {
        let half = full / 2;
        format!("(({text} + {half}) % {full} - {half})")
    } else {
        format!("({text} & {:#X})", full - 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_escapes_control_characters() {
        assert_eq!(quote("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(quote("\u{1}"), r#""\u0001""#);
    }

    #[test]
    fn masked_narrowing_text() {
        assert_eq!(masked_narrow("x", SpecialType::Byte).unwrap(), "(x & 0xFF)");
        assert_eq!(masked_narrow("x", SpecialType::Int16).unwrap(), "((x + 32768) % 65536 - 32768)");
        assert!(masked_narrow("x", SpecialType::Double).is_none());
    }

    #[test]
    fn renderers_are_selected_by_target() {
        assert_eq!(renderer_for(TargetKind::TypeScript).target(), TargetKind::TypeScript);
        assert_eq!(renderer_for(TargetKind::Python).target(), TargetKind::Python);
    }
}
