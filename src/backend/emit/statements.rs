//! Statement handlers.
//!
//! Statements write straight into the active writer buffer. Block structure (braces, colons, indentation) is the
//! renderer's business; the handlers here only decide what goes into each block.

use rosetta_syntax::{BinaryOp, CatchClause, Expr, ExprKind, Stmt, StmtKind, SwitchSection, SymbolId};

use super::context::{Breakable, EmissionContext};
use super::dispatch::Emitter;
use super::errors::EmitError;

const ROOT_EXCEPTION: &str = "System.Exception";

impl Emitter<'_> {
    /// Statements of a block; an empty block gets the renderer's placeholder body.
    pub fn block(&self, cx: &mut EmissionContext, statements: &[Stmt]) -> Result<(), EmitError> {
        if statements.is_empty() {
            self.renderer.empty_body(&mut cx.writer);
        }
        for statement in statements {
            self.stmt(cx, statement)?;
        }
        Ok(())
    }

    pub fn stmt(&self, cx: &mut EmissionContext, stmt: &Stmt) -> Result<(), EmitError> {
        cx.enter(stmt.kind_name(), stmt.span);
        self.stmt_kind(cx, stmt)?;
        cx.leave();
        Ok(())
    }

    fn line(&self, cx: &mut EmissionContext, text: &str) {
        cx.writer.writeln(&format!("{text}{}", self.renderer.statement_end()));
    }

    fn local_name(&self, symbol: Option<SymbolId>, raw: &str) -> String {
        match symbol {
            Some(symbol) => self.names.name(symbol).to_string(),
            None => {
                let conventions = self.conventions();
                conventions.identifier(raw, conventions.parameter_case)
            }
        }
    }

    fn stmt_kind(&self, cx: &mut EmissionContext, stmt: &Stmt) -> Result<(), EmitError> {
        let renderer = self.renderer;
        match &stmt.kind {
            StmtKind::Local { name, symbol, init } => {
                let name = self.local_name(*symbol, name);
                let ty = match symbol.and_then(|s| self.compilation.symbol(s).declared_type) {
                    Some(ty) => Some(self.type_text(cx, ty)),
                    None => None,
                };
                let init = match init {
                    Some(init) => Some(self.expr(cx, init)?),
                    None => None,
                };
                self.line(cx, &renderer.local(&name, ty.as_deref(), init.as_deref()));
            }
            StmtKind::Expr(expr) => {
                let text = self.expr_statement(cx, expr)?;
                self.line(cx, &text);
            }
            StmtKind::Return(value) => {
                let text = match value {
                    Some(value) => format!("return {}", self.expr(cx, value)?),
                    None if cx.flags.returns_self => format!("return {}", renderer.this_keyword()),
                    None => "return".to_string(),
                };
                self.line(cx, &text);
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_chain(cx, condition, then_branch, else_branch.as_deref())?,
            StmtKind::While { condition, body } => {
                let condition = self.expr(cx, condition)?;
                renderer.open_block(&mut cx.writer, &renderer.while_header(&condition));
                self.breakable(cx, Breakable::Loop, body)?;
                renderer.close_block(&mut cx.writer);
            }
            StmtKind::Foreach {
                variable,
                symbol,
                collection,
                body,
            } => {
                let variable = self.local_name(*symbol, variable);
                let collection = self.iterable(cx, collection)?;
                renderer.open_block(&mut cx.writer, &renderer.foreach_header(&variable, &collection));
                self.breakable(cx, Breakable::Loop, body)?;
                renderer.close_block(&mut cx.writer);
            }
            StmtKind::Block(statements) => {
                renderer.open_scope(&mut cx.writer);
                self.block(cx, statements)?;
                renderer.close_scope(&mut cx.writer);
            }
            StmtKind::Throw(Some(value)) => {
                let value = self.expr(cx, value)?;
                self.line(cx, &renderer.throw(&value));
            }
            StmtKind::Throw(None) => {
                let caught = cx.catch_variables.last().cloned().flatten();
                let text = renderer.rethrow(caught.as_deref())?;
                self.line(cx, &text);
            }
            StmtKind::Try { body, catches, finally } => self.try_statement(cx, body, catches, finally.as_deref())?,
            StmtKind::Using {
                variable,
                resource,
                body,
            } => self.using_statement(cx, variable.as_deref(), resource, body)?,
            StmtKind::Switch { subject, sections } => self.switch_statement(cx, subject, sections)?,
            StmtKind::Break => {
                if cx.breakables.last() == Some(&Breakable::Switch) && !renderer.keeps_switch_breaks() {
                    return Err(EmitError::unsupported(format!(
                        "'break' before the end of a switch section in {}",
                        renderer.target()
                    )));
                }
                self.line(cx, "break");
            }
            StmtKind::Continue => self.line(cx, "continue"),
        }
        Ok(())
    }

    /// An expression used as a statement: assignments render in statement form.
    fn expr_statement(&self, cx: &mut EmissionContext, expr: &Expr) -> Result<String, EmitError> {
        match &expr.kind {
            ExprKind::Assignment { op, target, value } => {
                cx.enter(expr.kind_name(), expr.span);
                let text = self.assignment(cx, *op, target, value, false)?;
                cx.leave();
                Ok(text)
            }
            _ => self.expr(cx, expr),
        }
    }

    fn breakable(&self, cx: &mut EmissionContext, kind: Breakable, body: &[Stmt]) -> Result<(), EmitError> {
        cx.breakables.push(kind);
        self.block(cx, body)?;
        cx.breakables.pop();
        Ok(())
    }

    fn if_chain(
        &self,
        cx: &mut EmissionContext,
        condition: &Expr,
        then_branch: &[Stmt],
        else_branch: Option<&[Stmt]>,
    ) -> Result<(), EmitError> {
        let renderer = self.renderer;
        let condition = self.expr(cx, condition)?;
        renderer.open_block(&mut cx.writer, &renderer.if_header(&condition));
        self.block(cx, then_branch)?;

        let mut next = else_branch;
        while let Some(statements) = next {
            match statements {
                [
                    Stmt {
                        kind:
                            StmtKind::If {
                                condition,
                                then_branch,
                                else_branch,
                            },
                        ..
                    },
                ] => {
                    let condition = self.expr(cx, condition)?;
                    renderer.continue_block(&mut cx.writer, &renderer.else_if_header(&condition));
                    self.block(cx, then_branch)?;
                    next = else_branch.as_deref();
                }
                _ => {
                    renderer.continue_block(&mut cx.writer, renderer.else_header());
                    self.block(cx, statements)?;
                    next = None;
                }
            }
        }
        renderer.close_block(&mut cx.writer);
        Ok(())
    }

    fn catch_variable(&self, clause: &CatchClause) -> Option<String> {
        let conventions = self.conventions();
        clause
            .variable
            .as_deref()
            .map(|v| conventions.identifier(v, conventions.parameter_case))
    }

    /// Catch type that actually filters (the root exception type catches everything).
    fn catch_filter(&self, clause: &CatchClause) -> Option<SymbolId> {
        clause
            .ty
            .filter(|&ty| self.compilation.full_name(ty) != ROOT_EXCEPTION)
    }

    fn try_statement(
        &self,
        cx: &mut EmissionContext,
        body: &[Stmt],
        catches: &[CatchClause],
        finally: Option<&[Stmt]>,
    ) -> Result<(), EmitError> {
        let renderer = self.renderer;
        renderer.open_block(&mut cx.writer, renderer.try_header());
        self.block(cx, body)?;

        if renderer.typed_catch() {
            for clause in catches {
                let variable = self.catch_variable(clause);
                let ty = clause.ty.map(|ty| self.type_text(cx, ty));
                renderer.continue_block(&mut cx.writer, &renderer.catch_header(variable.as_deref(), ty.as_deref()));
                self.catch_body(cx, variable, &clause.body)?;
            }
        } else if let [clause] = catches
            && self.catch_filter(clause).is_none()
        {
            let variable = self.catch_variable(clause);
            renderer.continue_block(&mut cx.writer, &renderer.catch_header(variable.as_deref(), None));
            self.catch_body(cx, variable, &clause.body)?;
        } else if !catches.is_empty() {
            self.filtered_catches(cx, catches)?;
        }

        if let Some(finally) = finally {
            renderer.continue_block(&mut cx.writer, renderer.finally_header());
            self.block(cx, finally)?;
        }
        renderer.close_block(&mut cx.writer);
        Ok(())
    }

    /// One untyped catch dispatching on the exception type with an instance-check chain.
    fn filtered_catches(&self, cx: &mut EmissionContext, catches: &[CatchClause]) -> Result<(), EmitError> {
        let renderer = self.renderer;
        let caught = format!("__e{}", cx.flags.catch_depth);
        renderer.continue_block(&mut cx.writer, &renderer.catch_header(Some(&caught), None));

        let mut exhaustive = false;
        for (i, clause) in catches.iter().enumerate() {
            let header = match self.catch_filter(clause) {
                Some(ty) => {
                    let ty = self.type_text(cx, ty);
                    let check = renderer.instance_check(&caught, &ty);
                    if i == 0 { renderer.if_header(&check) } else { renderer.else_if_header(&check) }
                }
                None if i == 0 => {
                    exhaustive = true;
                    renderer.if_header(renderer.bool_literal(true))
                }
                None => {
                    exhaustive = true;
                    renderer.else_header().to_string()
                }
            };
            if i == 0 {
                renderer.open_block(&mut cx.writer, &header);
            } else {
                renderer.continue_block(&mut cx.writer, &header);
            }
            let variable = self.catch_variable(clause);
            if let Some(variable) = &variable {
                self.line(cx, &renderer.local(variable, None, Some(&caught)));
            }
            self.catch_body(cx, Some(caught.clone()), &clause.body)?;
            if exhaustive {
                break;
            }
        }
        if !exhaustive {
            renderer.continue_block(&mut cx.writer, renderer.else_header());
            self.line(cx, &renderer.throw(&caught));
        }
        renderer.close_block(&mut cx.writer);
        Ok(())
    }

    fn catch_body(&self, cx: &mut EmissionContext, variable: Option<String>, body: &[Stmt]) -> Result<(), EmitError> {
        cx.catch_variables.push(variable);
        cx.with_flags(|f| f.catch_depth += 1, |cx| self.block(cx, body))?;
        cx.catch_variables.pop();
        Ok(())
    }

    /// `using (var r = ...) { ... }` as a scoped local plus try/finally disposal.
    fn using_statement(
        &self,
        cx: &mut EmissionContext,
        variable: Option<&str>,
        resource: &Expr,
        body: &[Stmt],
    ) -> Result<(), EmitError> {
        let renderer = self.renderer;
        let conventions = self.conventions();
        let name = match variable {
            Some(variable) => conventions.identifier(variable, conventions.parameter_case),
            None => format!("__using{}", cx.flags.using_depth),
        };
        let resource = self.expr(cx, resource)?;
        renderer.open_scope(&mut cx.writer);
        self.line(cx, &renderer.local(&name, None, Some(&resource)));
        renderer.open_block(&mut cx.writer, renderer.try_header());
        cx.with_flags(|f| f.using_depth += 1, |cx| self.block(cx, body))?;
        renderer.continue_block(&mut cx.writer, renderer.finally_header());
        let not_null = renderer.binary(BinaryOp::NotEq, &name, renderer.null_literal());
        renderer.open_block(&mut cx.writer, &renderer.if_header(&not_null));
        let dispose = conventions.identifier("Dispose", conventions.method_case);
        self.line(cx, &format!("{name}.{dispose}()"));
        renderer.close_block(&mut cx.writer);
        renderer.close_block(&mut cx.writer);
        renderer.close_scope(&mut cx.writer);
        Ok(())
    }

    fn switch_statement(
        &self,
        cx: &mut EmissionContext,
        subject: &Expr,
        sections: &[SwitchSection],
    ) -> Result<(), EmitError> {
        let renderer = self.renderer;
        let subject = self.expr(cx, subject)?;
        renderer.open_block(&mut cx.writer, &renderer.switch_header(&subject));
        cx.breakables.push(Breakable::Switch);
        for section in sections {
            let labels = section
                .labels
                .iter()
                .map(|label| match label {
                    Some(label) => cx.with_flags(|f| f.is_case_label = true, |cx| self.expr(cx, label)).map(Some),
                    None => Ok(None),
                })
                .collect::<Result<Vec<_>, EmitError>>()?;
            renderer.open_switch_section(&mut cx.writer, &labels);
            let body = match section.body.split_last() {
                Some((last, rest)) if !renderer.keeps_switch_breaks() && matches!(last.kind, StmtKind::Break) => rest,
                _ => section.body.as_slice(),
            };
            self.block(cx, body)?;
            renderer.close_switch_section(&mut cx.writer);
        }
        cx.breakables.pop();
        renderer.close_block(&mut cx.writer);
        Ok(())
    }
}
