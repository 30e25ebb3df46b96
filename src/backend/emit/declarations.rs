//! Type and member declarations.
//!
//! [`Emitter::emit_file`] renders one output file: the type's declaration, its nested types as siblings (unless
//! nested types are flattened into files of their own), then the file header computed from what the declarations
//! referenced.

use rosetta_core::SpecialType;
use rosetta_syntax::{Constant, MethodKind, Stmt, StmtKind, Symbol, SymbolId, SymbolKind, TypeKind};

use super::context::EmissionContext;
use super::dispatch::Emitter;
use super::errors::EmitError;
use crate::backend::targets::{AccessorDecl, AccessorKind, EventDecl, FieldDecl, FileHeader, MethodDecl, ParamDecl, TypeDecl};

/// Method name a static constructor body is moved into.
const STATIC_INIT: &str = "StaticInit";

/// What the previous member wrote, for blank-line placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Written {
    Nothing,
    Field,
    Block,
}

impl Emitter<'_> {
    /// Render the file of `cx.ty` into `cx.writer`.
    #[tracing::instrument(skip_all, fields(ty = %self.compilation.full_name(cx.ty)))]
    pub fn emit_file(&self, cx: &mut EmissionContext) -> Result<(), EmitError> {
        let renderer = self.renderer;
        let ty = cx.ty;

        cx.writer.push();
        self.type_declaration(cx, ty)?;
        if !self.flatten_nested {
            for nested in self.nested_types(ty) {
                cx.writer.blank_line();
                self.type_declaration(cx, nested)?;
            }
        }
        let body = cx.writer.pop()?;

        let name = self.names.name(ty);
        let (namespace, _) = renderer.split_type_name(&name);
        let header = FileHeader {
            namespace: namespace.map(str::to_string),
            imports: cx.references.iter().cloned().collect(),
            uses: cx.uses,
        };
        renderer.begin_file(&mut cx.writer, &header);
        cx.writer.write(&body);
        renderer.end_file(&mut cx.writer, &header);
        tracing::debug!(imports = header.imports.len(), "rendered file");
        Ok(())
    }

    /// Emitted nested types of `ty`, depth-first in declaration order.
    fn nested_types(&self, ty: SymbolId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        for member in self.compilation.members(ty) {
            if member.is_type() && self.is_emitted_type(member.id) {
                out.push(member.id);
                out.extend(self.nested_types(member.id));
            }
        }
        out
    }

    fn type_declaration(&self, cx: &mut EmissionContext, ty: SymbolId) -> Result<(), EmitError> {
        let compilation = self.compilation;
        let conventions = self.conventions();
        let symbol = compilation.symbol(ty);
        let name = self.names.name(ty);
        let (namespace, simple) = self.renderer.split_type_name(&name);
        let kind = symbol.type_kind.unwrap_or(TypeKind::Class);

        let base = symbol
            .base_type
            .filter(|&b| compilation.special_type(b) != SpecialType::Object)
            .map(|b| self.type_text(cx, b));
        let interfaces = symbol
            .interfaces
            .iter()
            .filter(|&&i| self.is_emitted_type(i) || self.names.entry(i).is_native())
            .map(|&i| self.type_text(cx, i))
            .collect();
        let decl = TypeDecl {
            name: simple,
            kind,
            base,
            interfaces,
            type_parameters: symbol.type_parameters.iter().map(|p| conventions.escape(p)).collect(),
            exported: namespace.is_some(),
        };

        match kind {
            TypeKind::Enum => self.enum_declaration(cx, symbol, &decl),
            _ => self.class_declaration(cx, symbol, &decl),
        }
    }

    fn enum_declaration(&self, cx: &mut EmissionContext, symbol: &Symbol, decl: &TypeDecl<'_>) -> Result<(), EmitError> {
        let renderer = self.renderer;
        cx.uses.enums = true;
        renderer.enum_open(&mut cx.writer, decl);
        let mut any = false;
        for member in self.compilation.members(symbol.id) {
            let Some(value) = member.constant_value.as_ref().and_then(Constant::as_i64) else {
                continue;
            };
            renderer.enum_member(&mut cx.writer, &self.names.name(member.id), &value.to_string());
            any = true;
        }
        if !any {
            renderer.empty_body(&mut cx.writer);
        }
        renderer.enum_close(&mut cx.writer);
        Ok(())
    }

    /// Instance members stored per object: fields, auto-properties and field-like events.
    fn is_instance_storage(&self, member: &Symbol) -> bool {
        if self.is_static_member(member.id) {
            return false;
        }
        match member.kind {
            SymbolKind::Field => true,
            SymbolKind::Property => member.is_auto_property,
            SymbolKind::Event => !self.has_custom_accessors(member),
            _ => false,
        }
    }

    fn has_custom_accessors(&self, event: &Symbol) -> bool {
        event
            .adder
            .is_some_and(|adder| self.compilation.symbol(adder).body.is_some())
    }

    /// Initial value of a field, auto-property or event's handler list.
    fn storage_init(&self, cx: &mut EmissionContext, member: &Symbol) -> Result<String, EmitError> {
        if member.kind == SymbolKind::Event {
            return Ok(self.renderer.array_literal(&[]));
        }
        cx.member = Some(member.id);
        let text = match (&member.initializer, &member.constant_value, member.declared_type) {
            (Some(init), _, _) => self.expr(cx, init)?,
            (None, Some(value), _) => self.constant(cx, value)?,
            (None, None, Some(ty)) if self.compilation.is_enum(ty) => self.constant(cx, &Constant::Enum { ty, value: 0 })?,
            (None, None, Some(ty)) => self.renderer.default_value(self.compilation.special_type(ty)),
            (None, None, None) => self.renderer.null_literal().to_string(),
        };
        cx.member = None;
        Ok(text)
    }

    fn class_declaration(&self, cx: &mut EmissionContext, symbol: &Symbol, decl: &TypeDecl<'_>) -> Result<(), EmitError> {
        let compilation = self.compilation;
        let renderer = self.renderer;
        let is_interface = decl.kind == TypeKind::Interface;
        let inline = renderer.inline_field_initializers();

        let members: Vec<&Symbol> = compilation
            .members(symbol.id)
            .filter(|m| !m.is_type() && !self.names.entry(m.id).is_native())
            .collect();

        let mut prologue = Vec::new();
        if !inline && !is_interface {
            for member in members.iter().filter(|m| self.is_instance_storage(m)) {
                let init = self.storage_init(cx, member)?;
                prologue.push(renderer.field_init(&self.names.name(member.id), &init));
            }
        }
        let has_constructors = !compilation.constructors(symbol.id).is_empty();
        let mut pending_init = !has_constructors && !prologue.is_empty();

        renderer.class_open(&mut cx.writer, decl);
        let mut written = Written::Nothing;
        let mut static_init = None;

        for member in members {
            let is_storage = member.kind == SymbolKind::Field
                || (member.kind == SymbolKind::Property && member.is_auto_property && !is_interface);
            if pending_init && !is_storage {
                self.separate(cx, &mut written, false);
                self.synthesized_constructor(cx, decl, &prologue)?;
                pending_init = false;
            }
            self.separate(cx, &mut written, is_storage);

            match member.kind {
                SymbolKind::Field => self.field(cx, member, inline)?,
                SymbolKind::Property if member.is_auto_property && !is_interface => self.field(cx, member, inline)?,
                SymbolKind::Property => self.property(cx, member, is_interface)?,
                SymbolKind::Event => self.event(cx, decl, member, is_interface)?,
                SymbolKind::Method => match member.method_kind {
                    Some(MethodKind::Constructor) => self.constructor(cx, decl, member, &prologue)?,
                    Some(MethodKind::StaticConstructor) => {
                        static_init = Some(self.static_constructor(cx, member)?);
                    }
                    _ => self.method(cx, member, is_interface)?,
                },
                _ => continue,
            }
        }
        if pending_init {
            self.separate(cx, &mut written, false);
            self.synthesized_constructor(cx, decl, &prologue)?;
        }
        if written == Written::Nothing {
            renderer.empty_body(&mut cx.writer);
        }
        renderer.class_close(&mut cx.writer, decl, static_init.as_deref());
        Ok(())
    }

    /// Blank line between members; consecutive fields stay together.
    fn separate(&self, cx: &mut EmissionContext, written: &mut Written, is_field: bool) {
        match (*written, is_field) {
            (Written::Nothing, _) | (Written::Field, true) => {}
            _ => cx.writer.blank_line(),
        }
        *written = if is_field { Written::Field } else { Written::Block };
    }

    fn field(&self, cx: &mut EmissionContext, member: &Symbol, inline: bool) -> Result<(), EmitError> {
        let name = self.names.name(member.id);
        let ty = match member.declared_type {
            Some(ty) => self.type_text(cx, ty),
            None => self.renderer.null_literal().to_string(),
        };
        let is_static = self.is_static_member(member.id);
        let init = if is_static || inline {
            Some(self.storage_init(cx, member)?)
        } else {
            None
        };
        self.renderer.field(
            &mut cx.writer,
            &FieldDecl {
                name: &name,
                ty: &ty,
                init: init.as_deref(),
                is_static,
            },
        );
        Ok(())
    }

    fn property(&self, cx: &mut EmissionContext, member: &Symbol, is_interface: bool) -> Result<(), EmitError> {
        let compilation = self.compilation;
        let renderer = self.renderer;
        let name = self.names.name(member.id);
        let ty = match member.declared_type {
            Some(ty) => self.type_text(cx, ty),
            None => self.object_text(),
        };
        let is_static = self.is_static_member(member.id);

        let accessors = [(member.getter, AccessorKind::Getter), (member.setter, AccessorKind::Setter)];
        for (accessor, kind) in accessors {
            let Some(accessor) = accessor.map(|a| compilation.symbol(a)) else {
                continue;
            };
            let body = accessor.body.as_ref().filter(|_| !is_interface);
            // Auto-properties in interfaces have no accessor bodies.
            if body.is_none() && !is_interface && !member.is_auto_property {
                continue;
            }
            let value = match compilation.parameters(accessor.id).first() {
                Some(param) => self.names.name(param.id).to_string(),
                None => self.conventions().identifier("value", self.conventions().parameter_case),
            };
            renderer.accessor_open(
                &mut cx.writer,
                &AccessorDecl {
                    name: &name,
                    ty: &ty,
                    kind,
                    value: &value,
                    is_static,
                    is_abstract: body.is_none(),
                },
            )?;
            if let Some(body) = body {
                cx.member = Some(accessor.id);
                self.block(cx, body)?;
                cx.member = None;
                renderer.close_block(&mut cx.writer);
            }
        }
        Ok(())
    }

    fn object_text(&self) -> String {
        self.conventions()
            .primitive(SpecialType::Object)
            .unwrap_or(self.renderer.null_literal())
            .to_string()
    }

    fn param_decls(&self, cx: &mut EmissionContext, method: SymbolId) -> Result<Vec<ParamDecl>, EmitError> {
        let compilation = self.compilation;
        let mut out = Vec::new();
        for param in compilation.parameters(method) {
            let ty = match param.declared_type {
                Some(ty) => self.type_text(cx, ty),
                None => self.object_text(),
            };
            let element_ty = match param.declared_type.and_then(|t| compilation.symbol(t).element_type) {
                Some(element) if param.is_params => Some(self.type_text(cx, element)),
                _ => None,
            };
            let default = if param.is_optional {
                Some(match (&param.default_syntax, &param.default_value) {
                    (Some(syntax), _) => self.expr(cx, syntax)?,
                    (None, Some(value)) => self.constant(cx, value)?,
                    (None, None) => self.renderer.absent_literal().to_string(),
                })
            } else {
                None
            };
            out.push(ParamDecl {
                name: self.names.name(param.id).to_string(),
                ty,
                element_ty,
                default,
            });
        }
        Ok(out)
    }

    fn method(&self, cx: &mut EmissionContext, member: &Symbol, is_interface: bool) -> Result<(), EmitError> {
        let renderer = self.renderer;
        let conventions = self.conventions();
        let name = self.names.name(member.id);
        let params = self.param_decls(cx, member.id)?;
        let return_type = member.declared_type.map(|t| self.type_text(cx, t));
        let body = member.body.as_ref().filter(|_| !is_interface);
        renderer.method_open(
            &mut cx.writer,
            &MethodDecl {
                name: &name,
                params: &params,
                type_parameters: member.type_parameters.iter().map(|p| conventions.escape(p)).collect(),
                return_type,
                is_static: member.is_static,
                is_abstract: body.is_none(),
                is_constructor: false,
                call_super: false,
            },
        );
        if let Some(body) = body {
            self.member_body(cx, member.id, body, false)?;
            renderer.close_block(&mut cx.writer);
        }
        Ok(())
    }

    fn member_body(
        &self,
        cx: &mut EmissionContext,
        member: SymbolId,
        body: &[Stmt],
        returns_self: bool,
    ) -> Result<(), EmitError> {
        cx.member = Some(member);
        cx.with_flags(|f| f.returns_self = returns_self, |cx| self.block(cx, body))?;
        cx.member = None;
        Ok(())
    }

    fn constructor(
        &self,
        cx: &mut EmissionContext,
        decl: &TypeDecl<'_>,
        member: &Symbol,
        prologue: &[String],
    ) -> Result<(), EmitError> {
        let renderer = self.renderer;
        let name = self.names.name(member.id);
        let fixed = *name == *self.conventions().constructor_name;
        let params = self.param_decls(cx, member.id)?;
        let return_type = (!fixed).then(|| self.type_text(cx, member.container.unwrap_or(cx.ty)));
        renderer.method_open(
            &mut cx.writer,
            &MethodDecl {
                name: &name,
                params: &params,
                type_parameters: Vec::new(),
                return_type,
                is_static: false,
                is_abstract: false,
                is_constructor: fixed,
                call_super: fixed && decl.base.is_some(),
            },
        );
        for line in prologue {
            cx.writer.writeln(line);
        }
        let body = member.body.as_deref().unwrap_or_default();
        if body.is_empty() && prologue.is_empty() && fixed {
            renderer.empty_body(&mut cx.writer);
        } else if !body.is_empty() {
            self.member_body(cx, member.id, body, !fixed)?;
        }
        if !fixed && !matches!(body.last().map(|s| &s.kind), Some(StmtKind::Return(_))) {
            let end = renderer.statement_end();
            cx.writer.writeln(&format!("return {}{end}", renderer.this_keyword()));
        }
        renderer.close_block(&mut cx.writer);
        Ok(())
    }

    /// Constructor holding only field initializers, for types that declare none.
    fn synthesized_constructor(
        &self,
        cx: &mut EmissionContext,
        decl: &TypeDecl<'_>,
        prologue: &[String],
    ) -> Result<(), EmitError> {
        let renderer = self.renderer;
        renderer.method_open(
            &mut cx.writer,
            &MethodDecl {
                name: self.conventions().constructor_name,
                params: &[],
                type_parameters: Vec::new(),
                return_type: None,
                is_static: false,
                is_abstract: false,
                is_constructor: true,
                call_super: decl.base.is_some(),
            },
        );
        for line in prologue {
            cx.writer.writeln(line);
        }
        renderer.close_block(&mut cx.writer);
        Ok(())
    }

    /// A static constructor becomes a static method run once after the class is declared; returns its name.
    fn static_constructor(&self, cx: &mut EmissionContext, member: &Symbol) -> Result<String, EmitError> {
        let renderer = self.renderer;
        let conventions = self.conventions();
        let name = conventions.identifier(STATIC_INIT, conventions.method_case);
        renderer.method_open(
            &mut cx.writer,
            &MethodDecl {
                name: &name,
                params: &[],
                type_parameters: Vec::new(),
                return_type: Some(self.void_type()),
                is_static: true,
                is_abstract: false,
                is_constructor: false,
                call_super: false,
            },
        );
        self.member_body(cx, member.id, member.body.as_deref().unwrap_or_default(), false)?;
        renderer.close_block(&mut cx.writer);
        Ok(name)
    }

    fn event(&self, cx: &mut EmissionContext, decl: &TypeDecl<'_>, member: &Symbol, is_interface: bool) -> Result<(), EmitError> {
        let compilation = self.compilation;
        let renderer = self.renderer;
        let (Some(adder), Some(remover)) = (member.adder, member.remover) else {
            return Err(EmitError::MissingSymbol(format!(
                "add/remove accessors of event '{}'",
                compilation.full_name(member.id)
            )));
        };
        let handler_type = match member.declared_type {
            Some(ty) => self.type_text(cx, ty),
            None => self.object_text(),
        };

        if is_interface || self.has_custom_accessors(member) {
            for accessor in [adder, remover] {
                let accessor = compilation.symbol(accessor);
                let mut params = self.param_decls(cx, accessor.id)?;
                if params.is_empty() {
                    params.push(ParamDecl {
                        name: self.conventions().identifier("value", self.conventions().parameter_case),
                        ty: handler_type.clone(),
                        element_ty: None,
                        default: None,
                    });
                }
                let body = accessor.body.as_ref().filter(|_| !is_interface);
                renderer.method_open(
                    &mut cx.writer,
                    &MethodDecl {
                        name: &self.names.name(accessor.id),
                        params: &params,
                        type_parameters: Vec::new(),
                        return_type: Some(self.void_type()),
                        is_static: member.is_static,
                        is_abstract: body.is_none(),
                        is_constructor: false,
                        call_super: false,
                    },
                );
                if let Some(body) = body {
                    self.member_body(cx, accessor.id, body, false)?;
                    renderer.close_block(&mut cx.writer);
                }
            }
            return Ok(());
        }

        let name = self.names.name(member.id);
        let storage_type = renderer.array_type(&handler_type);
        let is_static = member.is_static;
        let init = if is_static || renderer.inline_field_initializers() {
            Some(renderer.array_literal(&[]))
        } else {
            None
        };
        renderer.field(
            &mut cx.writer,
            &FieldDecl {
                name: &name,
                ty: &storage_type,
                init: init.as_deref(),
                is_static,
            },
        );
        cx.writer.blank_line();
        let receiver = if is_static { decl.name } else { renderer.this_keyword() };
        let storage = format!("{receiver}.{name}");
        renderer.event_accessors(
            &mut cx.writer,
            &EventDecl {
                adder: &self.names.name(adder),
                remover: &self.names.name(remover),
                handler_type: &handler_type,
                storage: &storage,
                is_static,
            },
        );
        Ok(())
    }
}
