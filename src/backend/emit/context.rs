//! Per-type emission state.
//!
//! One [`EmissionContext`] exists per emitted type and is owned by exactly one worker. Everything shared between
//! workers lives on the emitter; everything here is mutable and private to the type being emitted.

use std::collections::BTreeSet;

use rosetta_syntax::{Span, SymbolId};

use super::errors::EmitError;
use super::writer::Writer;
use crate::backend::targets::Uses;

/// Transient flags consulted by node renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitFlags {
    /// Rendering the target of an assignment.
    pub is_lhs: bool,
    /// Rendering a `case` label.
    pub is_case_label: bool,
    pub catch_depth: u32,
    pub using_depth: u32,
    pub object_creation_depth: u32,
    /// Emitting a constructor rendered as a named initializer: a bare `return` yields the instance.
    pub returns_self: bool,
}

/// Statement a `break` can leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakable {
    Loop,
    Switch,
}

/// A node on the visiting stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitedNode {
    pub kind: &'static str,
    pub span: Span,
}

#[derive(Debug)]
pub struct EmissionContext {
    /// Type being emitted.
    pub ty: SymbolId,
    pub writer: Writer,
    pub flags: EmitFlags,
    /// Member whose body is being emitted (the caller for caller-info arguments).
    pub member: Option<SymbolId>,
    /// Variables of the enclosing `catch` clauses, innermost last.
    pub catch_variables: Vec<Option<String>>,
    /// Enclosing loops and switches, innermost last.
    pub breakables: Vec<Breakable>,
    /// `(module, name)` of types referenced from other output files.
    pub references: BTreeSet<(String, String)>,
    pub uses: Uses,
    nodes: Vec<VisitedNode>,
    last_node: Option<VisitedNode>,
}

impl EmissionContext {
    pub fn new(ty: SymbolId, indent_width: usize) -> Self {
        Self {
            ty,
            writer: Writer::new(indent_width),
            flags: EmitFlags::default(),
            member: None,
            catch_variables: Vec::new(),
            breakables: Vec::new(),
            references: BTreeSet::new(),
            uses: Uses::default(),
            nodes: Vec::new(),
            last_node: None,
        }
    }

    pub fn enter(&mut self, kind: &'static str, span: Span) {
        let node = VisitedNode { kind, span };
        self.nodes.push(node);
        self.last_node = Some(node);
    }

    pub fn leave(&mut self) {
        self.nodes.pop();
    }

    /// Deepest node still being visited, or the last one visited.
    pub fn current_node(&self) -> Option<VisitedNode> {
        self.nodes.last().copied().or(self.last_node)
    }

    /// Rendered text of the file; every pushed buffer must have been popped.
    pub fn finish(self) -> Result<String, EmitError> {
        self.writer.finish()
    }

    /// Run `f` with `flags` changed by `set`, restoring the previous flags afterwards (also on error).
    pub fn with_flags<T>(&mut self, set: impl FnOnce(&mut EmitFlags), f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.flags;
        set(&mut self.flags);
        let out = f(self);
        self.flags = saved;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_stack_tracks_the_deepest_node() {
        let mut cx = EmissionContext::new(SymbolId(0), 4);
        cx.enter("if", Span::new(0, 1, 1));
        cx.enter("invocation", Span::new(0, 2, 5));
        assert_eq!(cx.current_node().unwrap().kind, "invocation");
        cx.leave();
        assert_eq!(cx.current_node().unwrap().kind, "if");
        cx.leave();
        assert_eq!(cx.current_node().unwrap().kind, "invocation");
    }

    #[test]
    fn flags_are_restored() {
        let mut cx = EmissionContext::new(SymbolId(0), 4);
        let seen = cx.with_flags(|f| f.is_lhs = true, |cx| cx.flags.is_lhs);
        assert!(seen);
        assert!(!cx.flags.is_lhs);
    }
}
