//! The story interpreter.
//!
//! Execution walks a function's flat statement array by index. Every
//! statement names its successors, so there is no call-site bookkeeping
//! beyond one frame per active function. Running never fails: arithmetic
//! wraps, division by zero yields zero, null items absorb reads and
//! writes, and calling the null delegate runs the empty null function.
//! The only runtime channels are the world's output buffer, drawings,
//! properties, and globals.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

use fabula_foundation::{FuncId, ItemId, StrId, TypeId, TypeKind, Value};
use fabula_storage::{Shape, World};

use crate::defs::Definitions;
use crate::expr::{apply_binary, apply_unary, BinaryOp, Expr, TemplatePart};
use crate::frame::{Frame, RETURN_SLOT};
use crate::intrinsics::Intrinsic;
use crate::stmt::{Statement, END_OF_BODY};

/// Execution context: compiled definitions plus the mutable world.
pub struct Cx<'a> {
    /// The compiled program.
    pub defs: &'a Definitions,
    /// The state being acted on.
    pub world: &'a mut World,
}

/// Runs one function to completion and returns its value.
///
/// Extra arguments are dropped, missing ones read as null, and a body
/// that falls off its end yields null. Unknown function ids run nothing.
pub fn run_function(cx: &mut Cx, func: FuncId, args: &[Value]) -> Value {
    let defs = cx.defs;
    let Some(f) = defs.function(func) else {
        return Value::NULL;
    };
    let mut frame = Frame::new(f.frame_size);
    for (i, arg) in args.iter().enumerate() {
        frame.set(i + 1, *arg);
    }
    let code = &f.code;
    let mut at = 0;
    while at < code.len() {
        at = step(cx, &mut frame, code, at);
    }
    frame.get(RETURN_SLOT)
}

/// Ends the current turn: bumps the counter, forgets commands registered
/// during the turn, and runs every `turn` block in declaration order.
pub fn advance_turn(cx: &mut Cx) {
    cx.world.turn += 1;
    cx.world.registered_commands.clear();
    let defs = cx.defs;
    for &block in &defs.turn_blocks {
        run_function(cx, block, &[]);
    }
}

/// Executes the statement at `at` and returns the next index.
fn step(cx: &mut Cx, frame: &mut Frame, code: &[Statement], at: usize) -> usize {
    match &code[at] {
        Statement::BlockStart => at + 1,
        Statement::BlockEnd { exit, .. } | Statement::CaseEntry { exit, .. } => *exit,
        Statement::Local {
            slot, init, next, ..
        } => {
            let value = init
                .as_ref()
                .map_or(Value::NULL, |expr| eval(cx, frame, expr));
            frame.set(*slot, value);
            *next
        }
        Statement::Assign {
            target,
            value,
            next,
        } => {
            let v = eval(cx, frame, value);
            store(cx, frame, target, v);
            *next
        }
        Statement::Expression { expr, next } => {
            eval(cx, frame, expr);
            *next
        }
        Statement::If {
            cond,
            then_target,
            else_target,
        } => {
            if eval(cx, frame, cond).truthy() {
                *then_target
            } else {
                *else_target
            }
        }
        Statement::Switch {
            scrutinee,
            cases,
            default_target,
        } => {
            let value = eval(cx, frame, scrutinee);
            cases
                .iter()
                .find(|(label, _)| label.raw() == value.raw())
                .map_or(*default_target, |(_, target)| *target)
        }
        Statement::While { cond, body, exit } => {
            if eval(cx, frame, cond).truthy() {
                *body
            } else {
                *exit
            }
        }
        Statement::ForeachItems { slot, .. } => {
            frame.set(*slot, Value::NULL);
            advance_foreach(cx, frame, code, at)
        }
        Statement::ForeachEnum { slot, .. } => {
            frame.set(*slot, Value::new(-1));
            advance_foreach(cx, frame, code, at)
        }
        Statement::ForeachWhere {
            slot, rhs, temp, ..
        } => {
            frame.set(*slot, Value::NULL);
            let bound = eval(cx, frame, rhs);
            frame.set(*temp, bound);
            advance_foreach(cx, frame, code, at)
        }
        Statement::EndLoop { owner } => match code.get(*owner) {
            Some(Statement::While { .. }) => *owner,
            Some(
                Statement::ForeachItems { .. }
                | Statement::ForeachEnum { .. }
                | Statement::ForeachWhere { .. },
            ) => advance_foreach(cx, frame, code, *owner),
            _ => at + 1,
        },
        Statement::Break { target } | Statement::Continue { target } => *target,
        Statement::Return => END_OF_BODY,
        Statement::ReturnValue { value } => {
            let v = eval(cx, frame, value);
            frame.set(RETURN_SLOT, v);
            END_OF_BODY
        }
        Statement::RegisterCommand { command, next } => {
            cx.world.registered_commands.push(*command);
            *next
        }
    }
}

/// Steps a foreach loop whose header sits at `owner`: advances the loop
/// variable to the next element and picks the body or the exit. The
/// null item never comes up.
fn advance_foreach(cx: &mut Cx, frame: &mut Frame, code: &[Statement], owner: usize) -> usize {
    match &code[owner] {
        Statement::ForeachItems {
            slot, body, exit, ..
        } => {
            let next = frame.get(*slot).index() + 1;
            if next < cx.world.items.len() {
                frame.set(*slot, Value::new(next as i64));
                *body
            } else {
                *exit
            }
        }
        Statement::ForeachEnum {
            slot,
            ty,
            body,
            exit,
            ..
        } => {
            let next = frame.get(*slot).raw() + 1;
            let len = cx.world.types.enum_values(*ty).len() as i64;
            if next < len {
                frame.set(*slot, Value::new(next));
                *body
            } else {
                *exit
            }
        }
        Statement::ForeachWhere {
            slot,
            prop,
            op,
            temp,
            body,
            exit,
            ..
        } => {
            let bound = frame.get(*temp);
            let mut id = frame.get(*slot).index() + 1;
            while id < cx.world.items.len() {
                let item = ItemId::from_raw(id as u32);
                let value = cx.world.props.get(item, *prop);
                if apply_binary(*op, value, bound).truthy() {
                    frame.set(*slot, item.to_value());
                    return *body;
                }
                id += 1;
            }
            *exit
        }
        _ => owner + 1,
    }
}

fn store(cx: &mut Cx, frame: &mut Frame, target: &Expr, value: Value) {
    match target {
        Expr::Local { slot, .. } => frame.set(*slot, value),
        Expr::Global { id, .. } => {
            if let Some(cell) = cx.world.globals.get_mut(id.index()) {
                *cell = value;
            }
        }
        Expr::Property { target, prop, .. } => {
            let item = ItemId::from_value(eval(cx, frame, target));
            cx.world.props.set(item, *prop, value);
        }
        _ => {}
    }
}

/// Evaluates one expression. Logic short-circuits, ternaries evaluate
/// one branch, and templates render their holes through
/// [`display_value`].
fn eval(cx: &mut Cx, frame: &Frame, expr: &Expr) -> Value {
    match expr {
        Expr::Literal { value, .. } => *value,
        Expr::Local { slot, .. } => frame.get(*slot),
        Expr::Global { id, .. } => cx
            .world
            .globals
            .get(id.index())
            .copied()
            .unwrap_or(Value::NULL),
        Expr::Property { target, prop, .. } => {
            let item = ItemId::from_value(eval(cx, frame, target));
            cx.world.props.get(item, *prop)
        }
        Expr::Unary { op, operand } => apply_unary(*op, eval(cx, frame, operand)),
        Expr::Binary { op, lhs, rhs } => match op {
            BinaryOp::And => {
                if eval(cx, frame, lhs).truthy() {
                    Value::from(eval(cx, frame, rhs).truthy())
                } else {
                    Value::FALSE
                }
            }
            BinaryOp::Or => {
                if eval(cx, frame, lhs).truthy() {
                    Value::TRUE
                } else {
                    Value::from(eval(cx, frame, rhs).truthy())
                }
            }
            _ => {
                let a = eval(cx, frame, lhs);
                let b = eval(cx, frame, rhs);
                apply_binary(*op, a, b)
            }
        },
        Expr::Ternary {
            cond,
            then,
            otherwise,
            ..
        } => {
            if eval(cx, frame, cond).truthy() {
                eval(cx, frame, then)
            } else {
                eval(cx, frame, otherwise)
            }
        }
        Expr::Call { func, args, .. } => {
            let values = eval_args(cx, frame, args);
            run_function(cx, *func, &values)
        }
        Expr::CallDelegate { target, args, .. } => {
            let func = FuncId::from_value(eval(cx, frame, target));
            let values = eval_args(cx, frame, args);
            run_function(cx, func, &values)
        }
        Expr::CallMap { map, arg, .. } => {
            let key = eval(cx, frame, arg);
            cx.defs.map(*map).map_or(Value::NULL, |m| m.lookup(key))
        }
        Expr::CallIntrinsic { intrinsic, args } => eval_intrinsic(cx, frame, *intrinsic, args),
        Expr::Template { parts } => {
            let mut text = String::new();
            for part in parts {
                match part {
                    TemplatePart::Text(t) => text.push_str(t),
                    TemplatePart::Hole(hole) => {
                        let value = eval(cx, frame, hole);
                        let rendered = display_value(cx.defs, cx.world, hole.ty(), value);
                        text.push_str(&rendered);
                    }
                }
            }
            cx.world.interner.intern(&text).to_value()
        }
    }
}

fn eval_args(cx: &mut Cx, frame: &Frame, args: &[Expr]) -> Vec<Value> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval(cx, frame, arg));
    }
    values
}

fn eval_intrinsic(cx: &mut Cx, frame: &Frame, intrinsic: Intrinsic, args: &[Expr]) -> Value {
    let values = eval_args(cx, frame, args);
    let arg = |i: usize| values.get(i).copied().unwrap_or(Value::NULL);
    match intrinsic {
        Intrinsic::Print => {
            let text = resolve_string(cx.world, arg(0));
            cx.world.say(text);
            Value::NULL
        }
        Intrinsic::ItemLookup => {
            let name = resolve_string(cx.world, arg(0));
            cx.world.items.lookup(&name).to_value()
        }
        Intrinsic::Random => Value::new(cx.world.roll(arg(0).raw())),
        Intrinsic::Count => Value::new(cx.world.items.count() as i64),
        Intrinsic::Tick => {
            advance_turn(cx);
            Value::NULL
        }
        Intrinsic::Rectangle | Intrinsic::Ellipse => {
            let canvas = resolve_string(cx.world, arg(0));
            let shape = if intrinsic == Intrinsic::Rectangle {
                Shape::Rect {
                    x: arg(1).raw(),
                    y: arg(2).raw(),
                    width: arg(3).raw(),
                    height: arg(4).raw(),
                    fill: resolve_string(cx.world, arg(5)),
                    stroke: resolve_string(cx.world, arg(6)),
                    stroke_width: arg(7).raw(),
                }
            } else {
                Shape::Ellipse {
                    x: arg(1).raw(),
                    y: arg(2).raw(),
                    width: arg(3).raw(),
                    height: arg(4).raw(),
                    fill: resolve_string(cx.world, arg(5)),
                    stroke: resolve_string(cx.world, arg(6)),
                    stroke_width: arg(7).raw(),
                }
            };
            cx.world.drawings.push(&canvas, shape);
            Value::NULL
        }
    }
}

fn resolve_string(world: &World, value: Value) -> String {
    world
        .interner
        .resolve(StrId::from_value(value))
        .to_string()
}

/// Renders a typed value the way the player sees it: strings verbatim,
/// items by display name, enums by member name, delegates by function
/// name.
#[must_use]
pub fn display_value(defs: &Definitions, world: &World, ty: TypeId, value: Value) -> String {
    match world.types.kind(ty) {
        TypeKind::Int => value.raw().to_string(),
        TypeKind::Bool => {
            if value.truthy() {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        TypeKind::String => world
            .interner
            .resolve(StrId::from_value(value))
            .to_string(),
        TypeKind::Item => {
            let id = ItemId::from_value(value);
            if id == ItemId::NULL {
                "null".to_string()
            } else {
                world.display_name(id).to_string()
            }
        }
        TypeKind::Void | TypeKind::Null => "null".to_string(),
        TypeKind::Enum { values } => usize::try_from(value.raw())
            .ok()
            .and_then(|ordinal| values.get(ordinal))
            .map_or_else(|| value.raw().to_string(), Clone::clone),
        TypeKind::Delegate { .. } => defs
            .function(FuncId::from_value(value))
            .map_or_else(|| "null".to_string(), |f| f.name.clone()),
    }
}
