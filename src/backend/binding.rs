//! Call-site argument binding.
//!
//! Maps the actual arguments of a call onto the formal parameters of the invoked method:
//!
//! - a named actual binds to the formal of that name;
//! - a positional actual binds to the next unconsumed formal in declaration order, except that once a variadic
//!   (`params`) formal is reached every further positional actual is appended to it;
//! - an unfilled optional formal resolves, in order, to caller information (when the parameter carries a caller-info
//!   annotation and the call site is known), its declaration's default expression, its constant default, or an
//!   absent value;
//! - an unfilled variadic formal binds to an empty list.
//!
//! A required formal left unfilled is a [`BindError`]: the front-end validated the call, so this is a model defect and
//! only fails the current call site.

use rosetta_core::lang::annotations as known;
use rosetta_syntax::{Argument, Compilation, Constant, Expr, Symbol, SymbolId};

use crate::frontend::{AttributeRegistry, Diagnostic, DiagnosticBag, DiagnosticCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("no argument supplied for required parameter '{parameter}' of '{method}'")]
    MissingArgument { method: String, parameter: String },

    #[error("'{method}' has no parameter named '{name}'")]
    UnknownParameter { method: String, name: String },

    #[error("too many arguments in call to '{method}'")]
    TooManyArguments { method: String },
}

/// One actual argument at a call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActualArgument<'e> {
    pub name: Option<&'e str>,
    pub value: &'e Expr,
    /// Emitted before all other arguments and not bound to a formal (injected receiver-like arguments).
    pub emit_first: bool,
}

impl<'e> ActualArgument<'e> {
    pub fn from_syntax(arg: &'e Argument) -> Self {
        Self {
            name: arg.name.as_deref(),
            value: &arg.value,
            emit_first: false,
        }
    }

    pub fn injected(value: &'e Expr) -> Self {
        Self {
            name: None,
            value,
            emit_first: true,
        }
    }
}

/// What a formal parameter resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue<'e> {
    /// Bound actuals in call order; several (or none) only for a variadic formal.
    Actuals(Vec<&'e Expr>),
    CallerMemberName(String),
    CallerLineNumber(u32),
    CallerFilePath(String),
    /// Default-value expression from the parameter's declaration.
    DefaultExpression(&'e Expr),
    DefaultConstant(&'e Constant),
    /// Optional parameter without any default: the target's null/absent literal.
    Absent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter<'e> {
    pub parameter: SymbolId,
    /// Source name of the formal.
    pub name: &'e str,
    pub is_params: bool,
    /// `false` when a variadic formal received a single array argument that is passed through as is.
    pub expanded: bool,
    pub value: ArgumentValue<'e>,
}

/// Formal parameter name → resolved value, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterBinding<'e> {
    pub parameters: Vec<BoundParameter<'e>>,
    /// Actuals flagged `emit_first`, in call order.
    pub leading: Vec<&'e Expr>,
}

impl<'e> ParameterBinding<'e> {
    pub fn get(&self, name: &str) -> Option<&BoundParameter<'e>> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Actual arguments bound to `name` (empty when the formal was defaulted or does not exist).
    pub fn actuals(&self, name: &str) -> &[&'e Expr] {
        match self.get(name).map(|p| &p.value) {
            Some(ArgumentValue::Actuals(exprs)) => exprs,
            _ => &[],
        }
    }

    /// Parameters in emission order with trailing absent values dropped.
    pub fn emitted(&self) -> &[BoundParameter<'e>] {
        let keep = self
            .parameters
            .iter()
            .rposition(|p| p.value != ArgumentValue::Absent)
            .map_or(0, |i| i + 1);
        &self.parameters[..keep]
    }
}

/// The call site, for caller-info substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerInfo<'s> {
    /// Source name of the calling member.
    pub member: &'s str,
    pub line: u32,
    pub file: Option<&'s str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallerInfoKind {
    MemberName,
    LineNumber,
    FilePath,
}

pub struct ArgumentBinder<'c> {
    compilation: &'c Compilation,
    attributes: &'c AttributeRegistry,
    diagnostics: &'c DiagnosticBag,
}

impl<'c> ArgumentBinder<'c> {
    pub fn new(compilation: &'c Compilation, attributes: &'c AttributeRegistry, diagnostics: &'c DiagnosticBag) -> Self {
        Self {
            compilation,
            attributes,
            diagnostics,
        }
    }

    /// Bind the syntactic arguments of a call.
    pub fn bind_call<'e>(
        &self,
        method: SymbolId,
        args: &'e [Argument],
        caller: Option<CallerInfo<'_>>,
    ) -> Result<ParameterBinding<'e>, BindError>
    where
        'c: 'e,
    {
        let actuals: Vec<ActualArgument<'e>> = args.iter().map(ActualArgument::from_syntax).collect();
        self.bind(method, &actuals, caller)
    }

    pub fn bind<'e>(
        &self,
        method: SymbolId,
        actuals: &[ActualArgument<'e>],
        caller: Option<CallerInfo<'_>>,
    ) -> Result<ParameterBinding<'e>, BindError>
    where
        'c: 'e,
    {
        let compilation = self.compilation;
        let formals: Vec<&'c Symbol> = compilation.parameters(method);
        let mut bound: Vec<Vec<&'e Expr>> = vec![Vec::new(); formals.len()];
        let mut consumed = vec![false; formals.len()];
        let mut leading = Vec::new();
        let mut next = 0;

        for actual in actuals {
            if actual.emit_first {
                leading.push(actual.value);
                continue;
            }
            if let Some(name) = actual.name {
                let index = formals
                    .iter()
                    .position(|f| f.name == name)
                    .ok_or_else(|| BindError::UnknownParameter {
                        method: compilation.full_name(method),
                        name: name.to_string(),
                    })?;
                bound[index].push(actual.value);
                consumed[index] = true;
                continue;
            }
            loop {
                let Some(formal) = formals.get(next) else {
                    return Err(BindError::TooManyArguments {
                        method: compilation.full_name(method),
                    });
                };
                if formal.is_params {
                    bound[next].push(actual.value);
                    consumed[next] = true;
                    break;
                }
                if consumed[next] {
                    next += 1;
                    continue;
                }
                bound[next].push(actual.value);
                consumed[next] = true;
                next += 1;
                break;
            }
        }

        let mut parameters = Vec::with_capacity(formals.len());
        for (formal, exprs) in formals.iter().copied().zip(bound) {
            let expanded = !(formal.is_params && exprs.len() == 1 && exprs[0].ty.is_some() && exprs[0].ty == formal.declared_type);
            let value = if !exprs.is_empty() || formal.is_params {
                ArgumentValue::Actuals(exprs)
            } else if formal.is_optional {
                self.default_value(formal, caller)
            } else {
                return Err(BindError::MissingArgument {
                    method: compilation.full_name(method),
                    parameter: formal.name.clone(),
                });
            };
            parameters.push(BoundParameter {
                parameter: formal.id,
                name: formal.name.as_str(),
                is_params: formal.is_params,
                expanded,
                value,
            });
        }
        Ok(ParameterBinding { parameters, leading })
    }

    fn caller_info_kind(&self, parameter: SymbolId) -> Option<CallerInfoKind> {
        let has = |class: &str| self.attributes.has(self.compilation, parameter, class);
        if has(known::CALLER_MEMBER_NAME) {
            Some(CallerInfoKind::MemberName)
        } else if has(known::CALLER_LINE_NUMBER) {
            Some(CallerInfoKind::LineNumber)
        } else if has(known::CALLER_FILE_PATH) {
            Some(CallerInfoKind::FilePath)
        } else {
            None
        }
    }

    fn default_value<'e>(&self, formal: &'c Symbol, caller: Option<CallerInfo<'_>>) -> ArgumentValue<'e>
    where
        'c: 'e,
    {
        if let Some(kind) = self.caller_info_kind(formal.id) {
            match caller {
                Some(site) => {
                    return match kind {
                        CallerInfoKind::MemberName => ArgumentValue::CallerMemberName(site.member.to_string()),
                        CallerInfoKind::LineNumber => ArgumentValue::CallerLineNumber(site.line),
                        CallerInfoKind::FilePath => {
                            ArgumentValue::CallerFilePath(site.file.unwrap_or_default().to_string())
                        }
                    };
                }
                None => {
                    tracing::warn!(parameter = %formal.name, "caller information unavailable, using the default");
                    self.diagnostics.report(
                        Diagnostic::new(DiagnosticCode::CallerInfoUnavailable, [&formal.name])
                            .at(self.compilation, formal.span),
                    );
                }
            }
        }
        if let Some(expr) = &formal.default_syntax {
            return ArgumentValue::DefaultExpression(expr);
        }
        if let Some(constant) = &formal.default_value {
            return ArgumentValue::DefaultConstant(constant);
        }
        ArgumentValue::Absent
    }
}
