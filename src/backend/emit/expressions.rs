//! Expression handlers.
//!
//! Every handler returns the rendered text of its node. Child expressions go through [`Emitter::expr`], which also
//! applies the auto-cast decision for the child's converted type, so handlers only see final operand text.

use rosetta_core::SpecialType;
use rosetta_core::lang::annotations::IterationStrategy;
use rosetta_core::lang::casts::CastRule;
use rosetta_syntax::{
    Argument, BinaryOp, Constant, Expr, ExprKind, Initializer, LambdaBody, MethodKind, SymbolId, SymbolKind, TypeKind,
};

use super::cast::{self, Conversion};
use super::context::EmissionContext;
use super::dispatch::Emitter;
use super::errors::EmitError;
use crate::backend::binding::{ArgumentValue, CallerInfo, ParameterBinding};

type Text = Result<String, EmitError>;

/// Operand text that must be parenthesized when embedded in a larger expression.
fn is_composite(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Binary { .. }
            | ExprKind::Unary { .. }
            | ExprKind::Conditional { .. }
            | ExprKind::Assignment { .. }
            | ExprKind::Lambda { .. }
    )
}

fn parenthesize(expr: &Expr, text: String) -> String {
    if is_composite(expr) { format!("({text})") } else { text }
}

impl Emitter<'_> {
    pub fn expr(&self, cx: &mut EmissionContext, expr: &Expr) -> Text {
        cx.enter(expr.kind_name(), expr.span);
        let mut text = self.expr_kind(cx, expr)?;
        if !cx.flags.is_lhs {
            text = self.convert(cx, expr, text);
        }
        cx.leave();
        Ok(text)
    }

    /// Rendered child, parenthesized when composite.
    fn operand(&self, cx: &mut EmissionContext, expr: &Expr) -> Text {
        let text = cx.with_flags(|f| f.is_lhs = false, |cx| self.expr(cx, expr))?;
        Ok(parenthesize(expr, text))
    }

    fn convert(&self, cx: &mut EmissionContext, expr: &Expr, text: String) -> String {
        let (Some(from), Some(to)) = (expr.ty, expr.converted_ty) else {
            return text;
        };
        match cast::resolve(self.names, from, to) {
            Some(conversion) => self.apply(cx, &text, &conversion, to),
            None => text,
        }
    }

    fn apply(&self, cx: &mut EmissionContext, text: &str, conversion: &Conversion, to: SymbolId) -> String {
        if let Conversion::Numeric(numeric) = conversion
            && matches!(numeric.rule, CastRule::ToDecimal | CastRule::FromDecimal)
        {
            cx.uses.decimal = true;
        }
        let target = self.type_text(cx, to);
        self.renderer.conversion(text, conversion, &target)
    }

    fn expr_kind(&self, cx: &mut EmissionContext, expr: &Expr) -> Text {
        let renderer = self.renderer;
        match &expr.kind {
            ExprKind::Literal(value) => self.constant(cx, value),
            ExprKind::This => Ok(renderer.this_keyword().to_string()),
            ExprKind::Name(raw) => self.name(cx, expr, raw),
            ExprKind::MemberAccess { target, member } => self.member_access(cx, expr, target, member),
            ExprKind::Invocation { callee, args, .. } => self.invocation(cx, expr, callee, args),
            ExprKind::ObjectCreation { args, initializer } => self.object_creation(cx, expr, args, initializer),
            ExprKind::ArrayCreation { elements } => {
                let elements = elements
                    .iter()
                    .map(|e| self.operand(cx, e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(renderer.array_literal(&elements))
            }
            ExprKind::ElementAccess { target, index } => {
                let target = self.operand(cx, target)?;
                let index = cx.with_flags(|f| f.is_lhs = false, |cx| self.expr(cx, index))?;
                Ok(format!("{target}[{index}]"))
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(cx, expr, *op, lhs, rhs),
            ExprKind::Unary { op, operand } => {
                let operand = self.operand(cx, operand)?;
                Ok(renderer.unary(*op, &operand))
            }
            ExprKind::Assignment { op, target, value } => self.assignment(cx, *op, target, value, true),
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                let condition = self.operand(cx, condition)?;
                let when_true = self.operand(cx, when_true)?;
                let when_false = self.operand(cx, when_false)?;
                Ok(renderer.conditional(&condition, &when_true, &when_false))
            }
            ExprKind::Cast { operand } => self.cast(cx, expr, operand),
            ExprKind::TypeOf => match expr.symbol {
                Some(ty) => Ok(self.type_text(cx, ty)),
                None => Err(EmitError::MissingSymbol("typeof without a type".to_string())),
            },
            ExprKind::Lambda { parameters, body } => self.lambda(cx, parameters, body),
            ExprKind::Default => Ok(match expr.ty {
                Some(ty) if self.compilation.is_enum(ty) => self.constant(cx, &Constant::Enum { ty, value: 0 })?,
                Some(ty) => renderer.default_value(self.compilation.special_type(ty)),
                None => renderer.null_literal().to_string(),
            }),
        }
    }

    pub(crate) fn constant(&self, cx: &mut EmissionContext, value: &Constant) -> Text {
        let renderer = self.renderer;
        Ok(match value {
            Constant::Null => renderer.null_literal().to_string(),
            Constant::Bool(b) => renderer.bool_literal(*b).to_string(),
            Constant::Int(v) => v.to_string(),
            Constant::UInt(v) => v.to_string(),
            Constant::Float(v) => renderer.float_literal(*v),
            Constant::Char(c) => renderer.string_literal(&c.to_string()),
            Constant::String(s) => renderer.string_literal(s),
            Constant::Type(ty) => self.type_text(cx, *ty),
            Constant::Enum { ty, value } => {
                let member = self
                    .compilation
                    .members(*ty)
                    .find(|m| {
                        m.kind == SymbolKind::Field && m.constant_value.as_ref().and_then(Constant::as_i64) == Some(*value)
                    })
                    .map(|m| m.id);
                match member {
                    Some(member) => self.static_member(cx, member),
                    None => {
                        let conversion = Conversion::UnderlyingToEnum { enum_type: *ty };
                        self.apply(cx, &value.to_string(), &conversion, *ty)
                    }
                }
            }
            Constant::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.constant(cx, item))
                    .collect::<Result<Vec<_>, _>>()?;
                renderer.array_literal(&items)
            }
        })
    }

    fn name(&self, cx: &mut EmissionContext, expr: &Expr, raw: &str) -> Text {
        if cx.flags.is_case_label
            && let Some(value) = &expr.constant
        {
            return self.constant(cx, value);
        }
        let Some(symbol) = expr.symbol else {
            let conventions = self.conventions();
            return Ok(conventions.identifier(raw, conventions.parameter_case));
        };
        Ok(match self.compilation.symbol(symbol).kind {
            SymbolKind::Type => self.type_text(cx, symbol),
            SymbolKind::Parameter | SymbolKind::Local => self.names.name(symbol).to_string(),
            _ if self.is_static_member(symbol) => self.static_member(cx, symbol),
            _ => format!("{}.{}", self.renderer.this_keyword(), self.names.name(symbol)),
        })
    }

    fn member_access(&self, cx: &mut EmissionContext, expr: &Expr, target: &Expr, member: &str) -> Text {
        if let Some(symbol) = expr.symbol {
            let kind = self.compilation.symbol(symbol).kind;
            if kind == SymbolKind::Type {
                return Ok(self.type_text(cx, symbol));
            }
            if self.is_static_member(symbol) {
                return Ok(self.static_member(cx, symbol));
            }
            let target = self.operand(cx, target)?;
            return Ok(format!("{target}.{}", self.names.name(symbol)));
        }
        let target = self.operand(cx, target)?;
        let conventions = self.conventions();
        Ok(format!("{target}.{}", conventions.identifier(member, conventions.property_case)))
    }

    /// Text of a method callee, receiver included.
    fn callee(&self, cx: &mut EmissionContext, callee: &Expr, method: SymbolId) -> Text {
        if self.is_static_member(method) {
            return Ok(self.static_member(cx, method));
        }
        let name = self.names.name(method);
        match &callee.kind {
            ExprKind::MemberAccess { target, .. } => {
                let target = self.operand(cx, target)?;
                Ok(format!("{target}.{name}"))
            }
            ExprKind::Name(_) => Ok(format!("{}.{name}", self.renderer.this_keyword())),
            _ => self.operand(cx, callee),
        }
    }

    fn invocation(&self, cx: &mut EmissionContext, expr: &Expr, callee: &Expr, args: &[Argument]) -> Text {
        let compilation = self.compilation;

        // Raising a field-like event: `Changed(x)` or `Changed.Invoke(x)`.
        let event = match &callee.kind {
            _ if callee.symbol.is_some_and(|s| compilation.symbol(s).kind == SymbolKind::Event) => Some(callee),
            ExprKind::MemberAccess { target, member }
                if member == "Invoke" && target.symbol.is_some_and(|s| compilation.symbol(s).kind == SymbolKind::Event) =>
            {
                Some(target.as_ref())
            }
            _ => None,
        };
        if let Some(event) = event {
            let storage = self.operand(cx, event)?;
            let args = args
                .iter()
                .map(|a| self.operand(cx, &a.value))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(self.renderer.raise_event(&storage, &args));
        }

        let method = expr.symbol.or(callee.symbol).filter(|&m| compilation.symbol(m).is_method());
        let Some(method) = method else {
            let callee = self.operand(cx, callee)?;
            let args = args
                .iter()
                .map(|a| self.operand(cx, &a.value))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(format!("{callee}({})", args.join(", ")));
        };

        let is_delegate_invoke = compilation
            .containing_type(method)
            .is_some_and(|t| compilation.symbol(t).type_kind == Some(TypeKind::Delegate));
        let callee = if is_delegate_invoke {
            match &callee.kind {
                ExprKind::MemberAccess { target, .. } => self.operand(cx, target)?,
                _ => self.operand(cx, callee)?,
            }
        } else {
            self.callee(cx, callee, method)?
        };

        let caller = self.caller_member(cx).map(|member| CallerInfo {
            member,
            line: expr.span.line,
            file: compilation.file_path(&expr.span),
        });
        let binding = self.binder.bind_call(method, args, caller)?;
        let args = self.arguments(cx, &binding)?;
        Ok(format!("{callee}({})", args.join(", ")))
    }

    /// Rendered arguments of a bound call in emission order.
    pub(crate) fn arguments(&self, cx: &mut EmissionContext, binding: &ParameterBinding<'_>) -> Result<Vec<String>, EmitError> {
        let renderer = self.renderer;
        let mut out = Vec::with_capacity(binding.parameters.len() + binding.leading.len());
        for leading in &binding.leading {
            out.push(self.operand(cx, leading)?);
        }
        for parameter in binding.emitted() {
            match &parameter.value {
                ArgumentValue::Actuals(exprs) if parameter.is_params && !parameter.expanded => {
                    for array in exprs {
                        let text = self.operand(cx, array)?;
                        out.push(renderer.spread(&text));
                    }
                }
                ArgumentValue::Actuals(exprs) => {
                    for actual in exprs {
                        out.push(self.operand(cx, actual)?);
                    }
                }
                ArgumentValue::CallerMemberName(name) => out.push(renderer.string_literal(name)),
                ArgumentValue::CallerLineNumber(line) => out.push(line.to_string()),
                ArgumentValue::CallerFilePath(path) => out.push(renderer.string_literal(path)),
                ArgumentValue::DefaultExpression(default) => out.push(self.operand(cx, default)?),
                ArgumentValue::DefaultConstant(value) => out.push(self.constant(cx, value)?),
                ArgumentValue::Absent => out.push(renderer.absent_literal().to_string()),
            }
        }
        Ok(out)
    }

    fn object_creation(
        &self,
        cx: &mut EmissionContext,
        expr: &Expr,
        args: &[Argument],
        initializer: &[Initializer],
    ) -> Text {
        let Some(ty) = expr.ty else {
            return Err(EmitError::MissingSymbol("object creation without a type".to_string()));
        };
        let type_text = self.type_text(cx, ty);
        let creation = match expr.symbol {
            Some(constructor) => {
                let binding = self.binder.bind_call(constructor, args, None)?;
                let args = self.arguments(cx, &binding)?;
                let name = self.names.name(constructor);
                if self.names.entry(ty).is_native() || *name == *self.conventions().constructor_name {
                    self.renderer.object_creation(&type_text, &args)
                } else {
                    self.renderer.named_construction(&type_text, &name, &args)
                }
            }
            None => {
                let args = args
                    .iter()
                    .map(|a| self.operand(cx, &a.value))
                    .collect::<Result<Vec<_>, _>>()?;
                self.renderer.object_creation(&type_text, &args)
            }
        };
        if initializer.is_empty() {
            return Ok(creation);
        }

        let depth = cx.flags.object_creation_depth;
        let initializers = cx.with_flags(
            |f| f.object_creation_depth += 1,
            |cx| {
                initializer
                    .iter()
                    .map(|init| {
                        let member = match init.symbol {
                            Some(symbol) => self.names.name(symbol).to_string(),
                            None => {
                                let conventions = self.conventions();
                                conventions.identifier(&init.member, conventions.property_case)
                            }
                        };
                        Ok((member, self.operand(cx, &init.value)?))
                    })
                    .collect::<Result<Vec<_>, EmitError>>()
            },
        )?;
        Ok(self.renderer.with_initializers(&creation, &initializers, &format!("__o{depth}")))
    }

    fn binary(&self, cx: &mut EmissionContext, expr: &Expr, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Text {
        let compilation = self.compilation;
        let renderer = self.renderer;
        let l = self.operand(cx, lhs)?;
        let r = self.operand(cx, rhs)?;

        if let Some(operator) = expr.symbol
            && compilation.symbol(operator).method_kind == Some(MethodKind::Operator)
        {
            let callee = self.static_member(cx, operator);
            return Ok(format!("{callee}({l}, {r})"));
        }

        let special = |e: &Expr| e.converted_ty.or(e.ty).map(|t| compilation.special_type(t));
        let result = expr.ty.map(|t| compilation.special_type(t));
        if op == BinaryOp::Div && result.is_some_and(SpecialType::is_integral) {
            return Ok(renderer.integer_division(&l, &r));
        }
        if op == BinaryOp::Add && result == Some(SpecialType::String) {
            let concat = |e: &Expr, text: String| {
                if special(e) == Some(SpecialType::String) {
                    text
                } else {
                    renderer.concat_operand(&text)
                }
            };
            return Ok(renderer.binary(op, &concat(lhs, l), &concat(rhs, r)));
        }
        Ok(renderer.binary(op, &l, &r))
    }

    /// `target = value`, compound assignments and event subscription.
    pub(crate) fn assignment(
        &self,
        cx: &mut EmissionContext,
        op: Option<BinaryOp>,
        target: &Expr,
        value: &Expr,
        as_expression: bool,
    ) -> Text {
        let compilation = self.compilation;
        let renderer = self.renderer;

        if let Some(event) = target.symbol.map(|s| compilation.symbol(s))
            && event.kind == SymbolKind::Event
            && matches!(op, Some(BinaryOp::Add | BinaryOp::Sub))
        {
            let accessor = if op == Some(BinaryOp::Add) { event.adder } else { event.remover };
            let Some(accessor) = accessor else {
                return Err(EmitError::MissingSymbol(format!("accessor of event '{}'", event.name)));
            };
            let receiver = match &target.kind {
                _ if self.is_static_member(event.id) => match compilation.containing_type(event.id) {
                    Some(ty) => self.type_text(cx, ty),
                    None => renderer.this_keyword().to_string(),
                },
                ExprKind::MemberAccess { target, .. } => self.operand(cx, target)?,
                _ => renderer.this_keyword().to_string(),
            };
            let handler = self.operand(cx, value)?;
            return Ok(format!("{receiver}.{}({handler})", self.names.name(accessor)));
        }

        let target_text = cx.with_flags(|f| f.is_lhs = true, |cx| self.expr(cx, target))?;
        let value_text = self.operand(cx, value)?;
        let integral = target
            .ty
            .is_some_and(|t| compilation.special_type(t).is_integral());
        if op == Some(BinaryOp::Div) && integral {
            let quotient = renderer.integer_division(&target_text, &value_text);
            return renderer.assignment(&target_text, None, &quotient, as_expression);
        }
        renderer.assignment(&target_text, op, &value_text, as_expression)
    }

    fn cast(&self, cx: &mut EmissionContext, expr: &Expr, operand: &Expr) -> Text {
        let text = self.operand(cx, operand)?;
        let (Some(from), Some(to)) = (operand.converted_ty.or(operand.ty), expr.ty) else {
            return Ok(text);
        };
        if let Some(conversion) = cast::resolve(self.names, from, to) {
            return Ok(self.apply(cx, &text, &conversion, to));
        }
        let compilation = self.compilation;
        if compilation.definition(from) == compilation.definition(to)
            || (compilation.special_type(from).is_numeric() && compilation.special_type(to).is_numeric())
        {
            return Ok(text);
        }
        let target = self.type_text(cx, to);
        Ok(self.renderer.cast(&text, &target))
    }

    fn lambda(&self, cx: &mut EmissionContext, parameters: &[String], body: &LambdaBody) -> Text {
        let conventions = self.conventions();
        let params: Vec<String> = parameters
            .iter()
            .map(|p| conventions.identifier(p, conventions.parameter_case))
            .collect();
        match body {
            LambdaBody::Expr(body) => {
                let body = cx.with_flags(|f| f.is_lhs = false, |cx| self.expr(cx, body))?;
                Ok(self.renderer.lambda(&params, &body))
            }
            LambdaBody::Block(statements) => {
                let header = self.renderer.block_lambda_header(&params)?;
                let breakables = std::mem::take(&mut cx.breakables);
                cx.writer.push();
                self.renderer.open_block(&mut cx.writer, &header);
                cx.with_flags(|f| f.returns_self = false, |cx| self.block(cx, statements))?;
                self.renderer.close_block(&mut cx.writer);
                let text = cx.writer.pop()?;
                cx.breakables = breakables;
                Ok(text.trim_end().to_string())
            }
        }
    }

    /// Iteration adaptation for a `foreach` collection whose type enumerates through an enumerator object.
    pub(crate) fn iterable(&self, cx: &mut EmissionContext, collection: &Expr) -> Text {
        let text = self.expr(cx, collection)?;
        let Some(ty) = collection.converted_ty.or(collection.ty) else {
            return Ok(text);
        };
        if self.names.entry(ty).iteration == IterationStrategy::Enumerator {
            let conversion = Conversion::ToIterable { from_array: false };
            return Ok(self.apply(cx, &text, &conversion, ty));
        }
        Ok(text)
    }
}
