//! Source regeneration.
//!
//! Turns a compiled program plus the current world back into story
//! source that compiles to the same program and state. Declarations
//! come out in dependency order; globals carry their current values as
//! initializers; properties set on items are replayed by a synthetic
//! `game` block at the end, which also replaces the original `game`
//! blocks (their effects are already in the state). Constants were
//! inlined at compile time and do not reappear.
//!
//! The turn counter, the random stream, pending output, and drawings
//! are not part of the source and are not carried over.

#![allow(clippy::cast_possible_truncation)]

use std::collections::HashSet;

use fabula_foundation::{FuncId, ItemId, PropId, StrId, TypeId, TypeKind, Value};
use fabula_storage::World;

use crate::defs::{Command, Definitions, Function};
use crate::expr::{BinaryOp, Expr, TemplatePart};
use crate::stmt::{BlockTail, Statement};

/// Renders the program and state as story source.
#[must_use]
pub fn export_source(defs: &Definitions, world: &World) -> String {
    Export::new(defs, world).render()
}

/// Escapes text for a `"..."` literal.
fn escape_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes text for the literal runs of a `` `...` `` template.
fn escape_template(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '{' => out.push_str("\\{"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

fn binding_power(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 2,
        BinaryOp::And => 3,
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => 4,
        BinaryOp::Add | BinaryOp::Sub => 5,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
    }
}

struct Export<'a> {
    defs: &'a Definitions,
    world: &'a World,
    /// Functions referenceable by name; delegate values outside this
    /// set render as `null`.
    named: HashSet<u32>,
    out: String,
}

impl<'a> Export<'a> {
    fn new(defs: &'a Definitions, world: &'a World) -> Self {
        let mut hidden: HashSet<u32> = HashSet::new();
        hidden.insert(0);
        for cmd in &defs.commands {
            hidden.insert(cmd.body.raw());
        }
        for id in defs.game_blocks.iter().chain(&defs.turn_blocks) {
            hidden.insert(id.raw());
        }
        let named = (0..defs.functions.len() as u32)
            .filter(|id| !hidden.contains(id))
            .collect();
        Self {
            defs,
            world,
            named,
            out: String::new(),
        }
    }

    fn render(mut self) -> String {
        self.enums();
        self.delegates();
        self.properties();
        self.items();
        self.globals();
        self.maps();
        self.functions();
        self.commands();
        self.turn_blocks();
        self.restore_block();
        self.out
    }

    // ----- plumbing -----

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    fn line(&mut self, depth: usize, text: &str) {
        self.indent(depth);
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn docs(&mut self, docs: &[String], depth: usize) {
        for doc in docs {
            self.indent(depth);
            self.out.push_str("/// ");
            self.out.push_str(doc);
            self.out.push('\n');
        }
    }

    fn gap(&mut self) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
    }

    // ----- declarations -----

    fn enums(&mut self) {
        for decl in &self.defs.enums {
            self.gap();
            self.docs(&decl.docs, 0);
            let name = self.world.types.name(decl.ty).to_string();
            let members = self.world.types.enum_values(decl.ty).join(", ");
            self.line(0, &format!("enum {name} {{ {members} }}"));
        }
    }

    fn delegates(&mut self) {
        for decl in &self.defs.delegates {
            self.gap();
            self.docs(&decl.docs, 0);
            let Some((shapes, ret)) = self.world.types.delegate_shape(decl.ty) else {
                continue;
            };
            let params: Vec<String> = decl
                .params
                .iter()
                .zip(shapes)
                .map(|(name, ty)| format!("${name}: {}", self.world.types.name(*ty)))
                .collect();
            let mut text = format!("delegate {}({})", decl.name, params.join(", "));
            if ret != TypeId::VOID {
                text.push_str(&format!(": {}", self.world.types.name(ret)));
            }
            text.push(';');
            self.line(0, &text);
        }
    }

    fn properties(&mut self) {
        // Index 0 is the built-in `name` property.
        for index in 1..self.world.props.len() {
            let prop = PropId::from_raw(index as u32);
            let Some(def) = self.world.props.def(prop) else {
                continue;
            };
            let text = format!(
                "property {}: {};",
                def.name,
                self.world.types.name(def.ty)
            );
            self.gap();
            self.docs(&def.docs, 0);
            self.line(0, &text);
        }
    }

    fn items(&mut self) {
        let mut first = true;
        for index in 1..self.world.items.len() {
            let id = ItemId::from_raw(index as u32);
            let Some(def) = self.world.items.get(id) else {
                continue;
            };
            let text = if def.bare {
                format!("item {};", def.name)
            } else {
                format!("item \"{}\";", escape_str(&def.name))
            };
            if first {
                self.gap();
                first = false;
            }
            self.docs(&def.docs, 0);
            self.line(0, &text);
        }
    }

    fn globals(&mut self) {
        let mut first = true;
        for (index, def) in self.defs.globals.iter().enumerate() {
            let value = self
                .world
                .globals
                .get(index)
                .copied()
                .unwrap_or(Value::NULL);
            let text = format!(
                "var {}: {} = {};",
                def.name,
                self.world.types.name(def.ty),
                self.literal(def.ty, value)
            );
            if first {
                self.gap();
                first = false;
            }
            self.docs(&def.docs, 0);
            self.line(0, &text);
        }
    }

    fn maps(&mut self) {
        for map in &self.defs.maps {
            self.gap();
            self.docs(&map.docs, 0);
            self.line(
                0,
                &format!(
                    "map {}({}): {} {{",
                    map.name,
                    self.world.types.name(map.input),
                    self.world.types.name(map.output)
                ),
            );
            let members = self.world.types.enum_values(map.input).to_vec();
            for (ordinal, member) in members.iter().enumerate() {
                let value = map.table.get(ordinal).copied().unwrap_or(Value::NULL);
                let rendered = self.literal(map.output, value);
                self.line(1, &format!("{member} => {rendered},"));
            }
            self.line(0, "}");
        }
    }

    fn functions(&mut self) {
        for index in 0..self.defs.functions.len() {
            if !self.named.contains(&(index as u32)) {
                continue;
            }
            let f = &self.defs.functions[index];
            self.gap();
            self.write_function(f);
        }
    }

    fn write_function(&mut self, f: &Function) {
        self.docs(&f.docs, 0);
        let params: Vec<String> = f
            .params
            .iter()
            .map(|p| format!("${}: {}", p.name, self.world.types.name(p.ty)))
            .collect();
        let mut header = format!("function {}({})", f.name, params.join(", "));
        if f.ret != TypeId::VOID {
            header.push_str(&format!(": {}", self.world.types.name(f.ret)));
        }
        let shorthand = if f.shorthand {
            match f.code.first() {
                Some(Statement::ReturnValue { value }) => Some(self.expr(value, 0)),
                Some(Statement::Expression { expr, .. }) => Some(self.expr(expr, 0)),
                _ => None,
            }
        } else {
            None
        };
        if let Some(body) = shorthand {
            self.line(0, &format!("{header} => {body};"));
        } else {
            self.line(0, &format!("{header} {{"));
            self.write_body(&f.code, 1);
            self.line(0, "}");
        }
    }

    fn commands(&mut self) {
        for cmd in &self.defs.commands {
            if !cmd.top_level {
                continue;
            }
            self.gap();
            self.write_command(cmd, 0);
        }
    }

    fn write_command(&mut self, cmd: &Command, depth: usize) {
        self.docs(&cmd.docs, depth);
        self.line(
            depth,
            &format!("command \"{}\" {{", escape_str(&cmd.trigger.source)),
        );
        if let Some(body) = self.defs.function(cmd.body) {
            self.write_body(&body.code, depth + 1);
        }
        self.line(depth, "}");
    }

    fn turn_blocks(&mut self) {
        for &id in &self.defs.turn_blocks {
            let Some(f) = self.defs.function(id) else {
                continue;
            };
            self.gap();
            self.docs(&f.docs, 0);
            self.line(0, "turn {");
            self.write_body(&f.code, 1);
            self.line(0, "}");
        }
    }

    /// The synthetic `game` block that replays every property cell with
    /// a value. Stands in for the original `game` blocks, whose effects
    /// already live in the state being exported.
    fn restore_block(&mut self) {
        let mut lines: Vec<String> = Vec::new();
        for item_index in 1..self.world.items.len() {
            let item = ItemId::from_raw(u32::try_from(item_index).unwrap_or(0));
            for prop_index in 0..self.world.props.len() {
                let prop = PropId::from_raw(u32::try_from(prop_index).unwrap_or(0));
                let value = self.world.props.get(item, prop);
                if value == Value::NULL {
                    continue;
                }
                let target = if self.world.items.is_bare(item) {
                    self.world.items.name(item).to_string()
                } else {
                    format!("item(\"{}\")", escape_str(self.world.items.name(item)))
                };
                lines.push(format!(
                    "{target}.{} = {};",
                    self.world.props.name(prop),
                    self.literal(self.world.props.ty(prop), value)
                ));
            }
        }
        if lines.is_empty() {
            return;
        }
        self.gap();
        self.line(0, "game {");
        for entry in lines {
            self.line(1, &entry);
        }
        self.line(0, "}");
    }

    // ----- bodies -----

    fn write_body(&mut self, code: &[Statement], depth: usize) {
        let mut i = 0;
        if matches!(code.first(), Some(Statement::BlockStart)) {
            let _ = self.write_block(code, &mut i, depth);
        } else {
            // Shorthand bodies are a single statement.
            while i < code.len() {
                self.write_stmt(code, &mut i, depth);
            }
        }
    }

    /// Writes the statements between a `BlockStart` at `i` and its
    /// matching end, leaving `i` past the end. Returns the block's tail
    /// so if-chains know how to continue.
    fn write_block(&mut self, code: &[Statement], i: &mut usize, depth: usize) -> BlockTail {
        *i += 1;
        while *i < code.len() {
            if let Statement::BlockEnd { tail, .. } = &code[*i] {
                let tail = *tail;
                *i += 1;
                return tail;
            }
            self.write_stmt(code, i, depth);
        }
        BlockTail::None
    }

    fn write_stmt(&mut self, code: &[Statement], i: &mut usize, depth: usize) {
        match &code[*i] {
            Statement::BlockStart => {
                self.line(depth, "{");
                let _ = self.write_block(code, i, depth + 1);
                self.line(depth, "}");
            }
            Statement::BlockEnd { .. } | Statement::CaseEntry { .. } | Statement::EndLoop { .. } => {
                *i += 1;
            }
            Statement::Local {
                name, ty, init, ..
            } => {
                let mut text = format!("var ${name}: {}", self.world.types.name(*ty));
                if let Some(init) = init {
                    text.push_str(&format!(" = {}", self.expr(init, 0)));
                }
                text.push(';');
                self.line(depth, &text);
                *i += 1;
            }
            Statement::Assign { target, value, .. } => {
                let text = format!("{} = {};", self.expr(target, 0), self.expr(value, 0));
                self.line(depth, &text);
                *i += 1;
            }
            Statement::Expression { expr, .. } => {
                let text = format!("{};", self.expr(expr, 0));
                self.line(depth, &text);
                *i += 1;
            }
            Statement::If { .. } => self.write_if(code, i, depth),
            Statement::Switch { .. } => self.write_switch(code, i, depth),
            Statement::While { cond, .. } => {
                let cond = self.expr(cond, 0);
                *i += 1;
                self.line(depth, &format!("while ({cond}) {{"));
                let _ = self.write_block(code, i, depth + 1);
                self.skip_end_loop(code, i);
                self.line(depth, "}");
            }
            Statement::ForeachItems { name, .. } => {
                let header = format!("foreach (${name} in items) {{");
                *i += 1;
                self.line(depth, &header);
                let _ = self.write_block(code, i, depth + 1);
                self.skip_end_loop(code, i);
                self.line(depth, "}");
            }
            Statement::ForeachEnum { name, ty, .. } => {
                let header = format!(
                    "foreach (${name} in {}) {{",
                    self.world.types.name(*ty)
                );
                *i += 1;
                self.line(depth, &header);
                let _ = self.write_block(code, i, depth + 1);
                self.skip_end_loop(code, i);
                self.line(depth, "}");
            }
            Statement::ForeachWhere {
                name,
                prop,
                op,
                rhs,
                ..
            } => {
                let header = format!(
                    "foreach (${name} in items where {} {} {}) {{",
                    self.world.props.name(*prop),
                    op.text(),
                    self.expr(rhs, 0)
                );
                *i += 1;
                self.line(depth, &header);
                let _ = self.write_block(code, i, depth + 1);
                self.skip_end_loop(code, i);
                self.line(depth, "}");
            }
            Statement::Break { .. } => {
                self.line(depth, "break;");
                *i += 1;
            }
            Statement::Continue { .. } => {
                self.line(depth, "continue;");
                *i += 1;
            }
            Statement::Return => {
                self.line(depth, "return;");
                *i += 1;
            }
            Statement::ReturnValue { value } => {
                let text = format!("return {};", self.expr(value, 0));
                self.line(depth, &text);
                *i += 1;
            }
            Statement::RegisterCommand { command, .. } => {
                if let Some(cmd) = self.defs.command(*command) {
                    self.write_command(cmd, depth);
                }
                *i += 1;
            }
        }
    }

    fn skip_end_loop(&mut self, code: &[Statement], i: &mut usize) {
        if matches!(code.get(*i), Some(Statement::EndLoop { .. })) {
            *i += 1;
        }
    }

    fn write_if(&mut self, code: &[Statement], i: &mut usize, depth: usize) {
        self.indent(depth);
        self.out.push_str("if ");
        loop {
            let Some(Statement::If { cond, .. }) = code.get(*i) else {
                break;
            };
            let cond = self.expr(cond, 0);
            *i += 1;
            self.out.push_str(&format!("({cond}) {{\n"));
            let tail = self.write_block(code, i, depth + 1);
            self.indent(depth);
            self.out.push('}');
            match tail {
                BlockTail::Elseif => self.out.push_str(" elseif "),
                BlockTail::Else => {
                    self.out.push_str(" else {\n");
                    let _ = self.write_block(code, i, depth + 1);
                    self.indent(depth);
                    self.out.push('}');
                    break;
                }
                BlockTail::None => break,
            }
        }
        self.out.push('\n');
    }

    fn write_switch(&mut self, code: &[Statement], i: &mut usize, depth: usize) {
        let Statement::Switch { scrutinee, .. } = &code[*i] else {
            return;
        };
        let scrutinee = self.expr(scrutinee, 0);
        *i += 1;
        self.line(depth, &format!("switch ({scrutinee}) {{"));
        // The switch wraps its arms in one block.
        *i += 1;
        while *i < code.len() {
            match &code[*i] {
                Statement::BlockEnd { .. } => {
                    *i += 1;
                    break;
                }
                Statement::CaseEntry {
                    value: Some(value),
                    ty,
                    ..
                } => {
                    let label = self.literal(*ty, *value);
                    *i += 1;
                    self.line(depth + 1, &format!("case {label}: {{"));
                    let _ = self.write_block(code, i, depth + 2);
                    self.line(depth + 1, "}");
                }
                Statement::CaseEntry { value: None, .. } => {
                    *i += 1;
                    self.line(depth + 1, "default: {");
                    let _ = self.write_block(code, i, depth + 2);
                    self.line(depth + 1, "}");
                }
                _ => {
                    *i += 1;
                }
            }
        }
        self.line(depth, "}");
    }

    // ----- expressions -----

    fn expr(&self, expr: &Expr, min_bp: u8) -> String {
        match expr {
            Expr::Literal { value, ty } => self.literal(*ty, *value),
            Expr::Local { name, .. } => format!("${name}"),
            Expr::Global { id, .. } => self
                .defs
                .global(*id)
                .map_or_else(|| "null".to_string(), |g| g.name.clone()),
            Expr::Property { target, prop, .. } => {
                format!(
                    "{}.{}",
                    self.expr(target, 8),
                    self.world.props.name(*prop)
                )
            }
            Expr::Unary { op, operand } => {
                let text = format!("{}{}", op.text(), self.expr(operand, 7));
                if min_bp > 7 {
                    format!("({text})")
                } else {
                    text
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let power = binding_power(*op);
                let text = format!(
                    "{} {} {}",
                    self.expr(lhs, power),
                    op.text(),
                    self.expr(rhs, power + 1)
                );
                if power < min_bp {
                    format!("({text})")
                } else {
                    text
                }
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
                ..
            } => {
                let text = format!(
                    "{} ? {} : {}",
                    self.expr(cond, 2),
                    self.expr(then, 1),
                    self.expr(otherwise, 1)
                );
                if min_bp > 1 {
                    format!("({text})")
                } else {
                    text
                }
            }
            Expr::Call { func, args, .. } => {
                let name = self
                    .defs
                    .function(*func)
                    .map_or_else(|| "null".to_string(), |f| f.name.clone());
                format!("{name}({})", self.args(args))
            }
            Expr::CallDelegate { target, args, .. } => {
                format!("{}({})", self.expr(target, 8), self.args(args))
            }
            Expr::CallMap { map, arg, .. } => {
                let name = self
                    .defs
                    .map(*map)
                    .map_or_else(|| "null".to_string(), |m| m.name.clone());
                format!("{name}({})", self.expr(arg, 0))
            }
            Expr::CallIntrinsic { intrinsic, args } => {
                format!("{}({})", intrinsic.name(), self.args(args))
            }
            Expr::Template { parts } => {
                let mut out = String::from("`");
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(&escape_template(text)),
                        TemplatePart::Hole(hole) => {
                            out.push('{');
                            out.push_str(&self.expr(hole, 0));
                            out.push('}');
                        }
                    }
                }
                out.push('`');
                out
            }
        }
    }

    fn args(&self, args: &[Expr]) -> String {
        args.iter()
            .map(|arg| self.expr(arg, 0))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Renders a value as a source literal of the given type. Values a
    /// literal cannot spell (an out-of-range enum ordinal, a hidden
    /// function) render as `null`, which every type accepts.
    fn literal(&self, ty: TypeId, value: Value) -> String {
        match self.world.types.kind(ty) {
            TypeKind::Int => value.raw().to_string(),
            TypeKind::Bool => {
                if value.truthy() {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
            TypeKind::String => format!(
                "\"{}\"",
                escape_str(self.world.interner.resolve(StrId::from_value(value)))
            ),
            TypeKind::Item => {
                let id = ItemId::from_value(value);
                if id == ItemId::NULL {
                    "null".to_string()
                } else if self.world.items.is_bare(id) {
                    self.world.items.name(id).to_string()
                } else {
                    format!("item(\"{}\")", escape_str(self.world.items.name(id)))
                }
            }
            TypeKind::Void | TypeKind::Null => "null".to_string(),
            TypeKind::Enum { values } => usize::try_from(value.raw())
                .ok()
                .and_then(|ordinal| values.get(ordinal))
                .map_or_else(
                    || "null".to_string(),
                    |member| format!("{}.{member}", self.world.types.name(ty)),
                ),
            TypeKind::Delegate { .. } => {
                let id = FuncId::from_value(value);
                if self.named.contains(&id.raw()) {
                    self.defs
                        .function(id)
                        .map_or_else(|| "null".to_string(), |f| f.name.clone())
                } else {
                    "null".to_string()
                }
            }
        }
    }
}
