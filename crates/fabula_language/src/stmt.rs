//! Flat statement arrays.
//!
//! A compiled body is a `Vec<Statement>` executed by index: each
//! statement names the index to run next, and control flow is a
//! computed successor rather than tree recursion. Block delimiters and
//! case labels stay in the array as dummy statements so the serializer
//! can rebuild nesting, but [`resolve_successors`] rewrites every jump
//! to skip over them, so the interpreter rarely touches one.

use fabula_foundation::{PropId, TypeId, Value};

use crate::expr::{BinaryOp, Expr};

/// Jump target meaning "past the end of the body".
///
/// `return` compiles to a jump here; the interpreter stops as soon as
/// the instruction pointer leaves the array.
pub const END_OF_BODY: usize = usize::MAX;

/// What follows a closing brace, recorded for the serializer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTail {
    None,
    Else,
    Elseif,
}

/// One element of a compiled body.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// Dummy: an opening brace. Falls through to the next index.
    BlockStart,
    /// Dummy: a closing brace. Falls through to `exit`.
    BlockEnd { exit: usize, tail: BlockTail },
    /// Dummy: a `case value:` or `default:` label. Entered sequentially
    /// only when the previous case ran off its end, in which case the
    /// switch is over and control moves to `exit`.
    CaseEntry {
        value: Option<Value>,
        ty: TypeId,
        exit: usize,
    },
    /// `var $name: ty = init;` writing a frame slot.
    Local {
        slot: usize,
        name: String,
        ty: TypeId,
        init: Option<Expr>,
        next: usize,
    },
    /// Assignment to a local, global, or property place.
    Assign {
        target: Expr,
        value: Expr,
        next: usize,
    },
    /// An expression evaluated for its side effect.
    Expression { expr: Expr, next: usize },
    If {
        cond: Expr,
        then_target: usize,
        else_target: usize,
    },
    /// Dispatch on a constant-labelled case list; no fallthrough.
    Switch {
        scrutinee: Expr,
        cases: Vec<(Value, usize)>,
        default_target: usize,
    },
    While {
        cond: Expr,
        body: usize,
        exit: usize,
    },
    /// `foreach ($name in items)`, visiting every real item in id order.
    ForeachItems {
        slot: usize,
        name: String,
        body: usize,
        exit: usize,
    },
    /// `foreach ($name in SomeEnum)`, visiting ordinals in order.
    ForeachEnum {
        slot: usize,
        name: String,
        ty: TypeId,
        body: usize,
        exit: usize,
    },
    /// `foreach ($name in items where prop <op> rhs)`. The right-hand
    /// value is evaluated once on entry into the `temp` slot.
    ForeachWhere {
        slot: usize,
        name: String,
        prop: PropId,
        op: BinaryOp,
        rhs: Expr,
        temp: usize,
        body: usize,
        exit: usize,
    },
    /// The bottom of a loop body; routes back into the advance logic of
    /// the loop statement at `owner`.
    EndLoop { owner: usize },
    /// Compile-time-resolved jump past the owning loop.
    Break { target: usize },
    /// Compile-time-resolved jump to the owning loop's advance.
    Continue { target: usize },
    Return,
    /// `return expr;` writes the return slot, then leaves the body.
    ReturnValue { value: Expr },
    /// A nested `command` declaration; registers the command for the
    /// rest of the turn when executed.
    RegisterCommand {
        command: fabula_foundation::CommandId,
        next: usize,
    },
}

impl Statement {
    /// Whether this statement only marks structure and carries no
    /// behavior of its own.
    #[must_use]
    pub fn is_dummy(&self) -> bool {
        matches!(
            self,
            Statement::BlockStart | Statement::BlockEnd { .. } | Statement::CaseEntry { .. }
        )
    }
}

/// Follows a chain of dummy statements to the first real successor.
/// Dummy chains only ever point forward, so the walk is bounded.
fn chase(code: &[Statement], start: usize) -> usize {
    let mut target = start;
    for _ in 0..=code.len() {
        match code.get(target) {
            Some(Statement::BlockStart) => target += 1,
            Some(Statement::BlockEnd { exit, .. } | Statement::CaseEntry { exit, .. }) => {
                target = *exit;
            }
            _ => return target,
        }
    }
    target
}

/// Rewrites every successor index to skip chains of dummy statements.
///
/// Run once after a body finishes compiling. The dummies stay in place
/// for the serializer; only the jumps around them change, so execution
/// is observably identical.
pub fn resolve_successors(code: &mut [Statement]) {
    for i in 0..code.len() {
        let mut stmt = std::mem::replace(&mut code[i], Statement::BlockStart);
        match &mut stmt {
            Statement::Local { next, .. }
            | Statement::Assign { next, .. }
            | Statement::Expression { next, .. }
            | Statement::RegisterCommand { next, .. } => *next = chase(code, *next),
            Statement::If {
                then_target,
                else_target,
                ..
            } => {
                *then_target = chase(code, *then_target);
                *else_target = chase(code, *else_target);
            }
            Statement::Switch {
                cases,
                default_target,
                ..
            } => {
                for (_, target) in cases.iter_mut() {
                    *target = chase(code, *target);
                }
                *default_target = chase(code, *default_target);
            }
            Statement::While { body, exit, .. }
            | Statement::ForeachItems { body, exit, .. }
            | Statement::ForeachEnum { body, exit, .. }
            | Statement::ForeachWhere { body, exit, .. } => {
                *body = chase(code, *body);
                *exit = chase(code, *exit);
            }
            Statement::BlockEnd { exit, .. } | Statement::CaseEntry { exit, .. } => {
                *exit = chase(code, *exit);
            }
            Statement::Break { target } | Statement::Continue { target } => {
                *target = chase(code, *target);
            }
            Statement::BlockStart
            | Statement::EndLoop { .. }
            | Statement::Return
            | Statement::ReturnValue { .. } => {}
        }
        code[i] = stmt;
    }
}
