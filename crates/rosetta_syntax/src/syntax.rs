//! Typed syntax of executable bodies.
//!
//! Every [`Expr`] carries the facts the semantic model resolved for it: the referenced symbol, the natural type, the
//! contextually converted type and the constant value (when the expression is a compile-time constant). The engine
//! never infers any of these on its own.

use serde::{Deserialize, Serialize};

use crate::annotations::Constant;
use crate::span::Span;
use crate::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

/// A call-site argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(default)]
    pub name: Option<String>,
    pub value: Expr,
}

impl Argument {
    pub fn positional(value: Expr) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// `Member = value` inside an object initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initializer {
    pub member: String,
    #[serde(default)]
    pub symbol: Option<SymbolId>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Constant),
    /// A simple name: local, parameter, member of the enclosing type, or a type.
    Name(String),
    This,
    MemberAccess {
        target: Box<Expr>,
        member: String,
    },
    Invocation {
        callee: Box<Expr>,
        args: Vec<Argument>,
        #[serde(default)]
        type_args: Vec<SymbolId>,
    },
    /// `new T(args) { initializers }`; the constructor is the expression's symbol, `T` its type.
    ObjectCreation {
        args: Vec<Argument>,
        #[serde(default)]
        initializer: Vec<Initializer>,
    },
    ArrayCreation {
        elements: Vec<Expr>,
    },
    ElementAccess {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `target = value` or a compound assignment when `op` is set.
    Assignment {
        #[serde(default)]
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    /// Explicit cast; the target type is the expression's type.
    Cast {
        operand: Box<Expr>,
    },
    /// `typeof(T)`; `T` is the expression's symbol.
    TypeOf,
    Lambda {
        parameters: Vec<String>,
        body: LambdaBody,
    },
    /// `default` / `default(T)`.
    Default,
}

/// A typed expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(default)]
    pub span: Span,
    /// Referenced or declared symbol (member, local, constructor, method, type).
    #[serde(default)]
    pub symbol: Option<SymbolId>,
    /// Natural type.
    #[serde(default)]
    pub ty: Option<SymbolId>,
    /// Type the expression is converted to by its context, when it differs from `ty`.
    #[serde(default)]
    pub converted_ty: Option<SymbolId>,
    #[serde(default)]
    pub constant: Option<Constant>,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            span: Span::default(),
            symbol: None,
            ty: None,
            converted_ty: None,
            constant: None,
        }
    }

    /// A literal; literals are always constants.
    pub fn literal(value: impl Into<Constant>) -> Self {
        let value = value.into();
        let mut expr = Self::new(ExprKind::Literal(value.clone()));
        expr.constant = Some(value);
        expr
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Name(name.into()))
    }

    pub fn this() -> Self {
        Self::new(ExprKind::This)
    }

    pub fn member(target: Expr, member: impl Into<String>) -> Self {
        Self::new(ExprKind::MemberAccess {
            target: Box::new(target),
            member: member.into(),
        })
    }

    pub fn call(callee: Expr, args: Vec<Argument>) -> Self {
        Self::new(ExprKind::Invocation {
            callee: Box::new(callee),
            args,
            type_args: Vec::new(),
        })
    }

    pub fn new_object(args: Vec<Argument>, initializer: Vec<Initializer>) -> Self {
        Self::new(ExprKind::ObjectCreation { args, initializer })
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::new(ExprKind::Assignment {
            op: None,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn type_of(ty: SymbolId) -> Self {
        Self::new(ExprKind::TypeOf).with_symbol(ty)
    }

    pub fn lambda(parameters: &[&str], body: Expr) -> Self {
        Self::new(ExprKind::Lambda {
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            body: LambdaBody::Expr(Box::new(body)),
        })
    }

    pub fn with_symbol(mut self, symbol: SymbolId) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_type(mut self, ty: SymbolId) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_converted_type(mut self, ty: SymbolId) -> Self {
        self.converted_ty = Some(ty);
        self
    }

    pub fn with_constant(mut self, value: Constant) -> Self {
        self.constant = Some(value);
        self
    }

    pub fn with_type_args(mut self, args: Vec<SymbolId>) -> Self {
        if let ExprKind::Invocation { type_args, .. } = &mut self.kind {
            *type_args = args;
        }
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Visit every symbol id referenced by this expression and its sub-expressions.
    pub fn visit_symbols(&self, visit: &mut dyn FnMut(SymbolId)) {
        for id in [self.symbol, self.ty, self.converted_ty].into_iter().flatten() {
            visit(id);
        }
        if let Some(constant) = &self.constant {
            constant.visit_symbols(visit);
        }
        match &self.kind {
            ExprKind::Literal(value) => value.visit_symbols(visit),
            ExprKind::Name(_) | ExprKind::This | ExprKind::TypeOf | ExprKind::Default => {}
            ExprKind::MemberAccess { target, .. } => target.visit_symbols(visit),
            ExprKind::Invocation { callee, args, type_args } => {
                callee.visit_symbols(visit);
                args.iter().for_each(|a| a.value.visit_symbols(visit));
                type_args.iter().for_each(|&t| visit(t));
            }
            ExprKind::ObjectCreation { args, initializer } => {
                args.iter().for_each(|a| a.value.visit_symbols(visit));
                for init in initializer {
                    if let Some(member) = init.symbol {
                        visit(member);
                    }
                    init.value.visit_symbols(visit);
                }
            }
            ExprKind::ArrayCreation { elements } => elements.iter().for_each(|e| e.visit_symbols(visit)),
            ExprKind::ElementAccess { target, index } => {
                target.visit_symbols(visit);
                index.visit_symbols(visit);
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.visit_symbols(visit);
                rhs.visit_symbols(visit);
            }
            ExprKind::Unary { operand, .. } | ExprKind::Cast { operand } => operand.visit_symbols(visit),
            ExprKind::Assignment { target, value, .. } => {
                target.visit_symbols(visit);
                value.visit_symbols(visit);
            }
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                condition.visit_symbols(visit);
                when_true.visit_symbols(visit);
                when_false.visit_symbols(visit);
            }
            ExprKind::Lambda { body, .. } => match body {
                LambdaBody::Expr(expr) => expr.visit_symbols(visit),
                LambdaBody::Block(stmts) => visit_block(stmts, visit),
            },
        }
    }

    /// Short, stable label for the node kind (used in diagnostics).
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Literal(_) => "literal",
            ExprKind::Name(_) => "name",
            ExprKind::This => "this",
            ExprKind::MemberAccess { .. } => "member access",
            ExprKind::Invocation { .. } => "invocation",
            ExprKind::ObjectCreation { .. } => "object creation",
            ExprKind::ArrayCreation { .. } => "array creation",
            ExprKind::ElementAccess { .. } => "element access",
            ExprKind::Binary { .. } => "binary expression",
            ExprKind::Unary { .. } => "unary expression",
            ExprKind::Assignment { .. } => "assignment",
            ExprKind::Conditional { .. } => "conditional expression",
            ExprKind::Cast { .. } => "cast",
            ExprKind::TypeOf => "typeof",
            ExprKind::Lambda { .. } => "lambda",
            ExprKind::Default => "default",
        }
    }
}

fn visit_block(stmts: &[Stmt], visit: &mut dyn FnMut(SymbolId)) {
    for stmt in stmts {
        stmt.visit_symbols(visit);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub ty: Option<SymbolId>,
    pub body: Vec<Stmt>,
}

/// One `case ...:` group; a `None` label is `default:`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchSection {
    pub labels: Vec<Option<Expr>>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Local {
        name: String,
        #[serde(default)]
        symbol: Option<SymbolId>,
        #[serde(default)]
        init: Option<Expr>,
    },
    Expr(Expr),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        #[serde(default)]
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    Foreach {
        variable: String,
        #[serde(default)]
        symbol: Option<SymbolId>,
        collection: Expr,
        body: Vec<Stmt>,
    },
    Block(Vec<Stmt>),
    Throw(Option<Expr>),
    Try {
        body: Vec<Stmt>,
        #[serde(default)]
        catches: Vec<CatchClause>,
        #[serde(default)]
        finally: Option<Vec<Stmt>>,
    },
    Using {
        #[serde(default)]
        variable: Option<String>,
        resource: Expr,
        body: Vec<Stmt>,
    },
    Switch {
        subject: Expr,
        sections: Vec<SwitchSection>,
    },
    Break,
    Continue,
}

/// A statement with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    #[serde(default)]
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            span: Span::default(),
        }
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr(expr))
    }

    pub fn local(name: impl Into<String>, init: Expr) -> Self {
        Self::new(StmtKind::Local {
            name: name.into(),
            symbol: None,
            init: Some(init),
        })
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Return(value))
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Visit every symbol id referenced by this statement, its expressions and nested statements.
    pub fn visit_symbols(&self, visit: &mut dyn FnMut(SymbolId)) {
        match &self.kind {
            StmtKind::Local { symbol, init, .. } => {
                if let Some(local) = symbol {
                    visit(*local);
                }
                if let Some(init) = init {
                    init.visit_symbols(visit);
                }
            }
            StmtKind::Expr(expr) => expr.visit_symbols(visit),
            StmtKind::Return(value) | StmtKind::Throw(value) => {
                if let Some(value) = value {
                    value.visit_symbols(visit);
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.visit_symbols(visit);
                visit_block(then_branch, visit);
                if let Some(else_branch) = else_branch {
                    visit_block(else_branch, visit);
                }
            }
            StmtKind::While { condition, body } => {
                condition.visit_symbols(visit);
                visit_block(body, visit);
            }
            StmtKind::Foreach {
                symbol, collection, body, ..
            } => {
                if let Some(variable) = symbol {
                    visit(*variable);
                }
                collection.visit_symbols(visit);
                visit_block(body, visit);
            }
            StmtKind::Block(body) => visit_block(body, visit),
            StmtKind::Try { body, catches, finally } => {
                visit_block(body, visit);
                for catch in catches {
                    if let Some(ty) = catch.ty {
                        visit(ty);
                    }
                    visit_block(&catch.body, visit);
                }
                if let Some(finally) = finally {
                    visit_block(finally, visit);
                }
            }
            StmtKind::Using { resource, body, .. } => {
                resource.visit_symbols(visit);
                visit_block(body, visit);
            }
            StmtKind::Switch { subject, sections } => {
                subject.visit_symbols(visit);
                for section in sections {
                    section.labels.iter().flatten().for_each(|l| l.visit_symbols(visit));
                    visit_block(&section.body, visit);
                }
            }
            StmtKind::Break | StmtKind::Continue => {}
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            StmtKind::Local { .. } => "local declaration",
            StmtKind::Expr(_) => "expression statement",
            StmtKind::Return(_) => "return",
            StmtKind::If { .. } => "if",
            StmtKind::While { .. } => "while",
            StmtKind::Foreach { .. } => "foreach",
            StmtKind::Block(_) => "block",
            StmtKind::Throw(_) => "throw",
            StmtKind::Try { .. } => "try",
            StmtKind::Using { .. } => "using",
            StmtKind::Switch { .. } => "switch",
            StmtKind::Break => "break",
            StmtKind::Continue => "continue",
        }
    }
}
