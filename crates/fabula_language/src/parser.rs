//! Parser and compiler for story sources.
//!
//! A single recursive-descent pass walks the whole include graph and
//! produces [`Definitions`] plus the declared state in the world: types,
//! items, properties, and globals. Bodies compile straight to flat
//! statement arrays; expressions fold constants as they parse. The
//! first violation anywhere aborts the load with a positioned error.
//!
//! Name resolution is one flat table. Every declaration claims its name
//! before anything else can, so keywords, intrinsics, types, items,
//! functions, maps, globals, and constants all live in a single
//! namespace and collisions are caught at declaration time.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use fabula_foundation::{
    CommandId, Error, FuncId, GlobalId, ItemId, MapId, PropId, Position, Result, TypeId, Value,
};
use fabula_storage::World;

use crate::command::{self, CompiledTrigger, Segment, TriggerPiece};
use crate::defs::{
    Command, Definitions, DelegateDecl, EnumDecl, Function, GlobalDef, MapDef, Param,
};
use crate::expr::{apply_binary, apply_unary, BinaryOp, Expr, TemplatePart, UnaryOp};
use crate::frame::FrameBuilder;
use crate::intrinsics::Intrinsic;
use crate::lexer::Lexer;
use crate::source::SourceProvider;
use crate::stmt::{resolve_successors, BlockTail, Statement, END_OF_BODY};
use crate::token::{Symbol, Token, TokenKind};

static DOC_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[A-Za-z_][A-Za-z0-9_]*").expect("doc parameter pattern"));

/// Every word with grammatical meaning. Claimed in the name table up
/// front so no declaration can shadow one.
const KEYWORDS: &[&str] = &[
    "include", "enum", "delegate", "property", "item", "var", "const", "function", "map",
    "command", "game", "turn", "if", "elseif", "else", "switch", "case", "default", "while",
    "foreach", "in", "where", "break", "continue", "return", "null", "true", "false", "items",
];

/// What a reserved name stands for.
#[derive(Clone, Debug)]
enum Declared {
    Keyword,
    Intrinsic(Intrinsic),
    Type(TypeId),
    Property(PropId),
    Item(ItemId),
    Function(FuncId),
    Map(MapId),
    Global(GlobalId, TypeId),
    /// Constants are inlined at every reference; only the folded value
    /// survives compilation.
    Const(Value, TypeId),
}

impl Declared {
    fn describe(&self) -> &'static str {
        match self {
            Declared::Keyword => "a keyword",
            Declared::Intrinsic(_) => "a built-in function",
            Declared::Type(_) => "a type",
            Declared::Property(_) => "a property",
            Declared::Item(_) => "an item",
            Declared::Function(_) => "a function",
            Declared::Map(_) => "a map",
            Declared::Global(..) => "a variable",
            Declared::Const(..) => "a constant",
        }
    }
}

fn seed_table() -> HashMap<String, Declared> {
    let mut table = HashMap::new();
    for keyword in KEYWORDS {
        table.insert((*keyword).to_string(), Declared::Keyword);
    }
    for (name, intrinsic) in Intrinsic::NAMED {
        table.insert((*name).to_string(), Declared::Intrinsic(*intrinsic));
    }
    let builtins = [
        ("Item", TypeId::ITEM),
        ("String", TypeId::STRING),
        ("Int", TypeId::INT),
        ("Bool", TypeId::BOOL),
        ("Void", TypeId::VOID),
    ];
    for (name, ty) in builtins {
        table.insert(name.to_string(), Declared::Type(ty));
    }
    table.insert("name".to_string(), Declared::Property(PropId::NAME));
    table
}

/// Break and continue sites of one open loop, patched when it closes.
#[derive(Default)]
struct LoopCtx {
    breaks: Vec<usize>,
    continues: Vec<usize>,
}

/// Compile state for one body.
struct BodyCx {
    frame: FrameBuilder,
    code: Vec<Statement>,
    loops: Vec<LoopCtx>,
    /// Declared return type of the enclosing function.
    ret: TypeId,
}

impl BodyCx {
    fn new(ret: TypeId) -> Self {
        Self {
            frame: FrameBuilder::new(),
            code: Vec::new(),
            loops: Vec::new(),
            ret,
        }
    }

    fn set_exit(&mut self, at: usize, value: usize) {
        if let Some(Statement::BlockEnd { exit, .. } | Statement::CaseEntry { exit, .. }) =
            self.code.get_mut(at)
        {
            *exit = value;
        }
    }

    fn set_tail(&mut self, at: usize, value: BlockTail) {
        if let Some(Statement::BlockEnd { tail, .. }) = self.code.get_mut(at) {
            *tail = value;
        }
    }

    fn set_else(&mut self, at: usize, value: usize) {
        if let Some(Statement::If { else_target, .. }) = self.code.get_mut(at) {
            *else_target = value;
        }
    }

    fn set_loop_exit(&mut self, at: usize, value: usize) {
        if let Some(
            Statement::While { exit, .. }
            | Statement::ForeachItems { exit, .. }
            | Statement::ForeachEnum { exit, .. }
            | Statement::ForeachWhere { exit, .. },
        ) = self.code.get_mut(at)
        {
            *exit = value;
        }
    }

    fn set_jump(&mut self, at: usize, value: usize) {
        if let Some(Statement::Break { target } | Statement::Continue { target }) =
            self.code.get_mut(at)
        {
            *target = value;
        }
    }
}

fn comparison_op(token: &Token) -> Option<BinaryOp> {
    match token.kind {
        TokenKind::Sym(Symbol::EqEq) => Some(BinaryOp::Eq),
        TokenKind::Sym(Symbol::NotEq) => Some(BinaryOp::Ne),
        TokenKind::Sym(Symbol::Lt) => Some(BinaryOp::Lt),
        TokenKind::Sym(Symbol::LtEq) => Some(BinaryOp::Le),
        TokenKind::Sym(Symbol::Gt) => Some(BinaryOp::Gt),
        TokenKind::Sym(Symbol::GtEq) => Some(BinaryOp::Ge),
        _ => None,
    }
}

/// Compiles the include graph rooted at `entry`.
///
/// Declares types, items, properties, and globals into `world` and
/// returns the compiled definitions together with advisory warnings.
///
/// # Errors
///
/// Returns the first compile error, positioned at the offending source.
pub fn parse(
    provider: &mut dyn SourceProvider,
    entry: &str,
    world: &mut World,
) -> Result<(Definitions, Vec<String>)> {
    Parser::new(provider, entry, world)?.run()
}

/// Single-pass parser and compiler over an include graph.
pub struct Parser<'a> {
    world: &'a mut World,
    provider: &'a mut dyn SourceProvider,
    defs: Definitions,
    /// Flat reserved-name table; one namespace for everything.
    table: HashMap<String, Declared>,
    /// Sources already pulled in; a second include of one is skipped.
    visited: HashSet<String>,
    /// Lexers of enclosing sources, suspended at their `include`.
    include_stack: Vec<Lexer>,
    lexer: Lexer,
    /// Current token (lookahead).
    tok: Token,
    warnings: Vec<String>,
}

impl<'a> Parser<'a> {
    /// Creates a parser over the entry source.
    ///
    /// # Errors
    ///
    /// Fails when the entry cannot be read or its first token is bad.
    pub fn new(
        provider: &'a mut dyn SourceProvider,
        entry: &str,
        world: &'a mut World,
    ) -> Result<Self> {
        let text = provider.read(entry)?;
        let lexer = Lexer::source(entry, &text);
        let mut visited = HashSet::new();
        visited.insert(entry.to_string());
        let mut parser = Self {
            world,
            provider,
            defs: Definitions::new(),
            table: seed_table(),
            visited,
            include_stack: Vec::new(),
            lexer,
            tok: Token {
                kind: TokenKind::End,
                pos: Position::start(entry),
                docs: Vec::new(),
            },
            warnings: Vec::new(),
        };
        parser.advance()?;
        Ok(parser)
    }

    /// Parses every declaration in the graph.
    ///
    /// # Errors
    ///
    /// Returns the first compile error.
    pub fn run(mut self) -> Result<(Definitions, Vec<String>)> {
        while !self.tok.is_end() {
            self.declaration()?;
        }
        Ok((self.defs, self.warnings))
    }

    // ----- token plumbing -----

    fn advance(&mut self) -> Result<()> {
        loop {
            let tok = self.lexer.next_token()?;
            if tok.is_end() && !self.lexer.is_fragment() {
                if let Some(outer) = self.include_stack.pop() {
                    self.lexer = outer;
                    continue;
                }
            }
            self.tok = tok;
            return Ok(());
        }
    }

    fn unexpected(&self, wanted: &str) -> Error {
        Error::compile(
            self.tok.pos.clone(),
            format!("expected {wanted}, found {}", self.tok.describe()),
        )
    }

    fn err(&self, pos: &Position, message: impl Into<String>) -> Error {
        Error::compile(pos.clone(), message)
    }

    fn type_mismatch(&self, pos: &Position, want: TypeId, got: TypeId) -> Error {
        self.err(
            pos,
            format!(
                "expected `{}`, found `{}`",
                self.world.types.name(want),
                self.world.types.name(got)
            ),
        )
    }

    fn expect_sym(&mut self, symbol: Symbol) -> Result<()> {
        if self.tok.is_sym(symbol) {
            self.advance()
        } else {
            Err(self.unexpected(&format!("`{}`", symbol.text())))
        }
    }

    fn eat_sym(&mut self, symbol: Symbol) -> Result<bool> {
        if self.tok.is_sym(symbol) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<()> {
        if self.tok.is_name(word) {
            self.advance()
        } else {
            Err(self.unexpected(&format!("`{word}`")))
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<(String, Position)> {
        match &self.tok.kind {
            TokenKind::Name(n) => {
                let name = n.clone();
                let pos = self.tok.pos.clone();
                self.advance()?;
                Ok((name, pos))
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn expect_var(&mut self, what: &str) -> Result<String> {
        match &self.tok.kind {
            TokenKind::Var(n) => {
                let name = n.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Runs `f` over an embedded fragment, restoring the outer lexer and
    /// lookahead afterwards. The fragment's tokens report positions
    /// inside the enclosing source.
    fn with_fragment<T>(
        &mut self,
        text: &str,
        pos: &Position,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let fragment = Lexer::fragment(Arc::clone(&pos.source), text, pos.line, pos.column);
        let saved_lexer = std::mem::replace(&mut self.lexer, fragment);
        let saved_tok = self.tok.clone();
        let result = self.advance().and_then(|()| f(self));
        self.lexer = saved_lexer;
        self.tok = saved_tok;
        result
    }

    // ----- names -----

    fn ensure_free(&self, name: &str, pos: &Position) -> Result<()> {
        if let Some(existing) = self.table.get(name) {
            return Err(self.err(
                pos,
                format!("`{name}` is already {}", existing.describe()),
            ));
        }
        Ok(())
    }

    fn type_ref(&mut self) -> Result<TypeId> {
        let (name, pos) = self.expect_name("a type name")?;
        match self.table.get(&name) {
            Some(Declared::Type(ty)) => Ok(*ty),
            _ => Err(self.err(&pos, format!("`{name}` is not a type"))),
        }
    }

    fn value_type_ref(&mut self, what: &str) -> Result<TypeId> {
        let pos = self.tok.pos.clone();
        let ty = self.type_ref()?;
        if ty == TypeId::VOID {
            return Err(self.err(&pos, format!("{what} cannot be Void")));
        }
        Ok(ty)
    }

    // ----- declarations -----

    fn declaration(&mut self) -> Result<()> {
        let docs = self.tok.docs.clone();
        let pos = self.tok.pos.clone();
        let TokenKind::Name(word) = &self.tok.kind else {
            return Err(self.unexpected("a declaration"));
        };
        match word.clone().as_str() {
            "include" => self.include_decl(),
            "enum" => self.enum_decl(docs),
            "delegate" => self.delegate_decl(docs),
            "property" => self.property_decl(docs),
            "item" => self.item_decl(docs),
            "var" => self.global_decl(docs, false),
            "const" => self.global_decl(docs, true),
            "function" => self.function_decl(docs),
            "map" => self.map_decl(docs),
            "command" => self.command_decl(docs, true).map(|_| ()),
            "game" => self.init_block_decl(docs, false),
            "turn" => self.init_block_decl(docs, true),
            other => Err(self.err(&pos, format!("expected a declaration, found `{other}`"))),
        }
    }

    fn include_decl(&mut self) -> Result<()> {
        self.advance()?;
        let TokenKind::Str(target) = &self.tok.kind else {
            return Err(self.unexpected("a quoted source name"));
        };
        let target = target.clone();
        self.advance()?;
        if !self.tok.is_sym(Symbol::Semi) {
            return Err(self.unexpected("`;`"));
        }
        if self.visited.insert(target.clone()) {
            let text = self.provider.read(&target)?;
            let included = Lexer::source(&target, &text);
            let outer = std::mem::replace(&mut self.lexer, included);
            self.include_stack.push(outer);
        }
        // Either pulls the included source's first token or moves past
        // the `;`. The suspended lexer resumes when the include ends.
        self.advance()
    }

    fn enum_decl(&mut self, docs: Vec<String>) -> Result<()> {
        self.advance()?;
        let (name, pos) = self.expect_name("an enum name")?;
        self.ensure_free(&name, &pos)?;
        self.expect_sym(Symbol::LBrace)?;
        let mut values: Vec<String> = Vec::new();
        while !self.tok.is_sym(Symbol::RBrace) {
            let (member, mpos) = self.expect_name("an enum member")?;
            if values.contains(&member) {
                return Err(self.err(&mpos, format!("duplicate enum member `{member}`")));
            }
            values.push(member);
            if !self.eat_sym(Symbol::Comma)? {
                break;
            }
        }
        self.expect_sym(Symbol::RBrace)?;
        if values.is_empty() {
            return Err(self.err(&pos, format!("enum `{name}` needs at least one member")));
        }
        let ty = self.world.types.declare_enum(&name, values);
        self.table.insert(name, Declared::Type(ty));
        self.defs.enums.push(EnumDecl { ty, docs });
        Ok(())
    }

    fn delegate_decl(&mut self, docs: Vec<String>) -> Result<()> {
        self.advance()?;
        let (name, pos) = self.expect_name("a delegate name")?;
        self.ensure_free(&name, &pos)?;
        let params = self.param_list()?;
        let ret = if self.eat_sym(Symbol::Colon)? {
            self.type_ref()?
        } else {
            TypeId::VOID
        };
        self.expect_sym(Symbol::Semi)?;
        let shapes = params.iter().map(|p| p.ty).collect();
        let names = params.into_iter().map(|p| p.name).collect();
        let ty = self.world.types.declare_delegate(&name, shapes, ret);
        self.table.insert(name.clone(), Declared::Type(ty));
        self.defs.delegates.push(DelegateDecl {
            name,
            ty,
            params: names,
            docs,
        });
        Ok(())
    }

    fn property_decl(&mut self, docs: Vec<String>) -> Result<()> {
        self.advance()?;
        let (name, pos) = self.expect_name("a property name")?;
        self.ensure_free(&name, &pos)?;
        self.expect_sym(Symbol::Colon)?;
        let ty = self.value_type_ref("a property")?;
        self.expect_sym(Symbol::Semi)?;
        let Some(id) = self.world.props.declare(&name, ty, docs) else {
            return Err(self.err(&pos, format!("property `{name}` is already declared")));
        };
        self.table.insert(name, Declared::Property(id));
        Ok(())
    }

    fn item_decl(&mut self, docs: Vec<String>) -> Result<()> {
        self.advance()?;
        let (name, pos, bare) = match &self.tok.kind {
            TokenKind::Name(n) => (n.clone(), self.tok.pos.clone(), true),
            TokenKind::Str(s) => (s.clone(), self.tok.pos.clone(), false),
            _ => return Err(self.unexpected("an item name")),
        };
        self.advance()?;
        self.expect_sym(Symbol::Semi)?;
        if bare {
            self.ensure_free(&name, &pos)?;
        }
        let Some(id) = self.world.items.declare(&name, bare, docs) else {
            return Err(self.err(&pos, format!("item `{name}` is already declared")));
        };
        if bare {
            self.table.insert(name, Declared::Item(id));
        }
        Ok(())
    }

    fn global_decl(&mut self, docs: Vec<String>, constant: bool) -> Result<()> {
        self.advance()?;
        let (name, pos) = self.expect_name("a variable name")?;
        self.ensure_free(&name, &pos)?;
        self.expect_sym(Symbol::Colon)?;
        let ty = self.value_type_ref("a variable")?;
        let value = if self.eat_sym(Symbol::Assign)? {
            let vpos = self.tok.pos.clone();
            let mut cx = BodyCx::new(TypeId::VOID);
            let expr = self.expression(&mut cx)?;
            let Some((value, vty)) = expr.as_constant() else {
                return Err(self.err(
                    &vpos,
                    format!("the initializer of `{name}` must be a compile-time constant"),
                ));
            };
            if !self.world.types.assignable(ty, vty) {
                return Err(self.type_mismatch(&vpos, ty, vty));
            }
            value
        } else if constant {
            return Err(self.err(&pos, format!("constant `{name}` needs a value")));
        } else {
            Value::NULL
        };
        self.expect_sym(Symbol::Semi)?;
        if constant {
            self.table.insert(name, Declared::Const(value, ty));
        } else {
            let id = GlobalId::from_raw(self.defs.globals.len() as u32);
            self.defs.globals.push(GlobalDef {
                name: name.clone(),
                ty,
                docs,
            });
            self.world.globals.push(value);
            self.table.insert(name, Declared::Global(id, ty));
        }
        Ok(())
    }

    fn function_decl(&mut self, docs: Vec<String>) -> Result<()> {
        self.advance()?;
        let (name, pos) = self.expect_name("a function name")?;
        self.ensure_free(&name, &pos)?;
        let params = self.param_list()?;
        let ret = if self.eat_sym(Symbol::Colon)? {
            self.type_ref()?
        } else {
            TypeId::VOID
        };
        self.check_doc_params(&docs, &params, &pos, &format!("function `{name}`"));
        // The signature goes in before the body compiles, so the body
        // can call itself.
        let id = FuncId::from_raw(self.defs.functions.len() as u32);
        self.defs.functions.push(Function {
            name: name.clone(),
            params: params.clone(),
            ret,
            frame_size: 1,
            code: Vec::new(),
            docs,
            shorthand: false,
        });
        self.table.insert(name, Declared::Function(id));
        let (code, frame_size, shorthand) = if self.tok.is_sym(Symbol::FatArrow) {
            self.shorthand_body(&params, ret)?
        } else {
            let (code, size) = self.compile_body(&params, ret)?;
            (code, size, false)
        };
        if let Some(f) = self.defs.functions.get_mut(id.index()) {
            f.code = code;
            f.frame_size = frame_size;
            f.shorthand = shorthand;
        }
        Ok(())
    }

    fn map_decl(&mut self, docs: Vec<String>) -> Result<()> {
        self.advance()?;
        let (name, pos) = self.expect_name("a map name")?;
        self.ensure_free(&name, &pos)?;
        self.expect_sym(Symbol::LParen)?;
        let ipos = self.tok.pos.clone();
        let input = self.type_ref()?;
        if !self.world.types.is_enum(input) {
            return Err(self.err(&ipos, "a map's input must be an enum"));
        }
        self.expect_sym(Symbol::RParen)?;
        self.expect_sym(Symbol::Colon)?;
        let output = self.value_type_ref("a map's output")?;
        self.expect_sym(Symbol::LBrace)?;
        let members: Vec<String> = self.world.types.enum_values(input).to_vec();
        let mut table = vec![Value::NULL; members.len()];
        let mut covered = vec![0u64; members.len().div_ceil(64)];
        while !self.tok.is_sym(Symbol::RBrace) {
            let (key, kpos) = self.expect_name("an enum member")?;
            let Some(ordinal) = members.iter().position(|m| m == &key) else {
                return Err(self.err(
                    &kpos,
                    format!("`{key}` is not a member of `{}`", self.world.types.name(input)),
                ));
            };
            if covered[ordinal / 64] & (1 << (ordinal % 64)) != 0 {
                return Err(self.err(&kpos, format!("duplicate map entry for `{key}`")));
            }
            covered[ordinal / 64] |= 1 << (ordinal % 64);
            self.expect_sym(Symbol::FatArrow)?;
            let vpos = self.tok.pos.clone();
            let mut cx = BodyCx::new(TypeId::VOID);
            let expr = self.expression(&mut cx)?;
            let Some((value, vty)) = expr.as_constant() else {
                return Err(self.err(&vpos, "map values must be compile-time constants"));
            };
            if !self.world.types.assignable(output, vty) {
                return Err(self.type_mismatch(&vpos, output, vty));
            }
            table[ordinal] = value;
            if !self.eat_sym(Symbol::Comma)? {
                break;
            }
        }
        self.expect_sym(Symbol::RBrace)?;
        for (ordinal, member) in members.iter().enumerate() {
            if covered[ordinal / 64] & (1 << (ordinal % 64)) == 0 {
                return Err(self.err(
                    &pos,
                    format!("map `{name}` is missing an entry for `{member}`"),
                ));
            }
        }
        let id = MapId::from_raw(self.defs.maps.len() as u32);
        self.defs.maps.push(MapDef {
            name: name.clone(),
            input,
            output,
            table,
            docs,
        });
        self.table.insert(name, Declared::Map(id));
        Ok(())
    }

    fn command_decl(&mut self, docs: Vec<String>, top_level: bool) -> Result<CommandId> {
        self.advance()?;
        let TokenKind::Str(trigger) = &self.tok.kind else {
            return Err(self.unexpected("a trigger string"));
        };
        let trigger = trigger.clone();
        let tpos = self.tok.pos.clone();
        self.advance()?;
        let pieces = command::split_trigger(&trigger).map_err(|m| self.err(&tpos, m))?;
        let mut segments = Vec::new();
        let mut params: Vec<Param> = Vec::new();
        for piece in pieces {
            match piece {
                TriggerPiece::Literal(text) => {
                    for word in text.split_whitespace() {
                        segments.push(Segment::Word(word.to_lowercase()));
                    }
                }
                TriggerPiece::Placeholder(inner) => {
                    let param = self.trigger_param(&inner, &tpos, &params)?;
                    segments.push(Segment::Capture);
                    params.push(param);
                }
            }
        }
        if segments.is_empty() {
            return Err(self.err(&tpos, "a command trigger cannot be empty"));
        }
        let compiled = CompiledTrigger::assemble(&trigger, &segments, params.clone())
            .map_err(|m| self.err(&tpos, m))?;
        self.check_doc_params(&docs, &params, &tpos, &format!("command \"{trigger}\""));
        let fid = FuncId::from_raw(self.defs.functions.len() as u32);
        self.defs.functions.push(Function {
            name: trigger.clone(),
            params: params.clone(),
            ret: TypeId::VOID,
            frame_size: 1,
            code: Vec::new(),
            docs: Vec::new(),
            shorthand: false,
        });
        let (code, frame_size) = self.compile_body(&params, TypeId::VOID)?;
        if let Some(f) = self.defs.functions.get_mut(fid.index()) {
            f.code = code;
            f.frame_size = frame_size;
        }
        let cid = CommandId::from_raw(self.defs.commands.len() as u32);
        self.defs.commands.push(Command {
            trigger: compiled,
            body: fid,
            top_level,
            docs,
        });
        Ok(cid)
    }

    /// Parses the `$name: Type` inside one trigger placeholder.
    fn trigger_param(
        &mut self,
        inner: &str,
        tpos: &Position,
        existing: &[Param],
    ) -> Result<Param> {
        let (name, ty) = self.with_fragment(inner, tpos, |p| {
            let name = p.expect_var("a parameter")?;
            p.expect_sym(Symbol::Colon)?;
            let ty = p.type_ref()?;
            if !p.tok.is_end() {
                return Err(p.unexpected("the end of the parameter"));
            }
            Ok((name, ty))
        })?;
        let accepted = ty == TypeId::ITEM
            || ty == TypeId::STRING
            || ty == TypeId::INT
            || ty == TypeId::BOOL
            || self.world.types.is_enum(ty);
        if !accepted {
            return Err(self.err(
                tpos,
                "a command parameter must be Item, String, Int, Bool, or an enum",
            ));
        }
        if existing.iter().any(|p| p.name == name) {
            return Err(self.err(tpos, format!("duplicate parameter `${name}`")));
        }
        Ok(Param { name, ty })
    }

    fn init_block_decl(&mut self, docs: Vec<String>, turn: bool) -> Result<()> {
        self.advance()?;
        let fid = FuncId::from_raw(self.defs.functions.len() as u32);
        let name = if turn { "turn" } else { "game" };
        self.defs.functions.push(Function {
            name: name.to_string(),
            params: Vec::new(),
            ret: TypeId::VOID,
            frame_size: 1,
            code: Vec::new(),
            docs,
            shorthand: false,
        });
        let (code, frame_size) = self.compile_body(&[], TypeId::VOID)?;
        if let Some(f) = self.defs.functions.get_mut(fid.index()) {
            f.code = code;
            f.frame_size = frame_size;
        }
        if turn {
            self.defs.turn_blocks.push(fid);
        } else {
            self.defs.game_blocks.push(fid);
        }
        Ok(())
    }

    fn param_list(&mut self) -> Result<Vec<Param>> {
        self.expect_sym(Symbol::LParen)?;
        let mut params: Vec<Param> = Vec::new();
        while !self.tok.is_sym(Symbol::RParen) {
            let pos = self.tok.pos.clone();
            let name = self.expect_var("a parameter")?;
            self.expect_sym(Symbol::Colon)?;
            let ty = self.value_type_ref("a parameter")?;
            if params.iter().any(|p| p.name == name) {
                return Err(self.err(&pos, format!("duplicate parameter `${name}`")));
            }
            params.push(Param { name, ty });
            if !self.eat_sym(Symbol::Comma)? {
                break;
            }
        }
        self.expect_sym(Symbol::RParen)?;
        Ok(params)
    }

    fn check_doc_params(
        &mut self,
        docs: &[String],
        params: &[Param],
        pos: &Position,
        owner: &str,
    ) {
        for line in docs {
            for found in DOC_PARAM.find_iter(line) {
                let mention = &found.as_str()[1..];
                if !params.iter().any(|p| p.name == mention) {
                    self.warnings.push(format!(
                        "{pos}: doc comment for {owner} mentions unknown parameter `${mention}`"
                    ));
                }
            }
        }
    }

    // ----- bodies -----

    fn compile_body(&mut self, params: &[Param], ret: TypeId) -> Result<(Vec<Statement>, usize)> {
        let mut cx = BodyCx::new(ret);
        for p in params {
            let _ = cx.frame.declare(&p.name, p.ty);
        }
        self.block(&mut cx)?;
        resolve_successors(&mut cx.code);
        Ok((cx.code, cx.frame.frame_size()))
    }

    fn shorthand_body(
        &mut self,
        params: &[Param],
        ret: TypeId,
    ) -> Result<(Vec<Statement>, usize, bool)> {
        self.advance()?;
        let mut cx = BodyCx::new(ret);
        for p in params {
            let _ = cx.frame.declare(&p.name, p.ty);
        }
        let pos = self.tok.pos.clone();
        let value = self.expression(&mut cx)?;
        self.expect_sym(Symbol::Semi)?;
        let code = if ret == TypeId::VOID {
            if !value.has_effect() {
                return Err(self.err(&pos, "statement has no effect"));
            }
            vec![Statement::Expression {
                expr: value,
                next: 1,
            }]
        } else {
            if !self.world.types.assignable(ret, value.ty()) {
                return Err(self.type_mismatch(&pos, ret, value.ty()));
            }
            vec![Statement::ReturnValue { value }]
        };
        Ok((code, cx.frame.frame_size(), true))
    }

    // ----- statements -----

    fn block(&mut self, cx: &mut BodyCx) -> Result<()> {
        self.expect_sym(Symbol::LBrace)?;
        let mark = cx.frame.mark();
        cx.code.push(Statement::BlockStart);
        while !self.tok.is_sym(Symbol::RBrace) {
            if self.tok.is_end() {
                return Err(self.unexpected("`}`"));
            }
            self.statement(cx)?;
        }
        self.advance()?;
        let exit = cx.code.len() + 1;
        cx.code.push(Statement::BlockEnd {
            exit,
            tail: BlockTail::None,
        });
        cx.frame.release(mark);
        Ok(())
    }

    fn statement(&mut self, cx: &mut BodyCx) -> Result<()> {
        if self.tok.is_sym(Symbol::LBrace) {
            return self.block(cx);
        }
        let docs = self.tok.docs.clone();
        let word = match &self.tok.kind {
            TokenKind::Name(n) => Some(n.clone()),
            _ => None,
        };
        match word.as_deref() {
            Some("var") => self.local_stmt(cx),
            Some("if") => self.if_stmt(cx),
            Some("switch") => self.switch_stmt(cx),
            Some("while") => self.while_stmt(cx),
            Some("foreach") => self.foreach_stmt(cx),
            Some("break") => self.break_stmt(cx),
            Some("continue") => self.continue_stmt(cx),
            Some("return") => self.return_stmt(cx),
            Some("command") => {
                let cid = self.command_decl(docs, false)?;
                let next = cx.code.len() + 1;
                cx.code.push(Statement::RegisterCommand { command: cid, next });
                Ok(())
            }
            _ => self.simple_stmt(cx),
        }
    }

    fn local_stmt(&mut self, cx: &mut BodyCx) -> Result<()> {
        self.advance()?;
        let pos = self.tok.pos.clone();
        let name = self.expect_var("a variable")?;
        self.expect_sym(Symbol::Colon)?;
        let ty = self.value_type_ref("a variable")?;
        let init = if self.eat_sym(Symbol::Assign)? {
            let vpos = self.tok.pos.clone();
            let expr = self.expression(cx)?;
            if !self.world.types.assignable(ty, expr.ty()) {
                return Err(self.type_mismatch(&vpos, ty, expr.ty()));
            }
            Some(expr)
        } else {
            None
        };
        self.expect_sym(Symbol::Semi)?;
        let Some(slot) = cx.frame.declare(&name, ty) else {
            return Err(self.err(&pos, format!("`${name}` is already declared")));
        };
        let next = cx.code.len() + 1;
        cx.code.push(Statement::Local {
            slot,
            name,
            ty,
            init,
            next,
        });
        Ok(())
    }

    fn simple_stmt(&mut self, cx: &mut BodyCx) -> Result<()> {
        let pos = self.tok.pos.clone();
        let target = self.expression(cx)?;
        if self.eat_sym(Symbol::Assign)? {
            if !target.is_lvalue() {
                return Err(self.err(&pos, "this expression cannot be assigned to"));
            }
            let vpos = self.tok.pos.clone();
            let value = self.expression(cx)?;
            self.expect_sym(Symbol::Semi)?;
            if !self.world.types.assignable(target.ty(), value.ty()) {
                return Err(self.type_mismatch(&vpos, target.ty(), value.ty()));
            }
            let next = cx.code.len() + 1;
            cx.code.push(Statement::Assign {
                target,
                value,
                next,
            });
        } else {
            self.expect_sym(Symbol::Semi)?;
            if !target.has_effect() {
                return Err(self.err(&pos, "statement has no effect"));
            }
            let next = cx.code.len() + 1;
            cx.code.push(Statement::Expression { expr: target, next });
        }
        Ok(())
    }

    fn if_stmt(&mut self, cx: &mut BodyCx) -> Result<()> {
        let mut ends = Vec::new();
        let mut open_else = None;
        self.if_chain(cx, &mut ends, &mut open_else)?;
        let after = cx.code.len();
        for end in ends {
            cx.set_exit(end, after);
        }
        if let Some(if_idx) = open_else {
            cx.set_else(if_idx, after);
        }
        Ok(())
    }

    fn if_chain(
        &mut self,
        cx: &mut BodyCx,
        ends: &mut Vec<usize>,
        open_else: &mut Option<usize>,
    ) -> Result<()> {
        self.advance()?; // past `if` / `elseif`
        self.expect_sym(Symbol::LParen)?;
        let cpos = self.tok.pos.clone();
        let cond = self.expression(cx)?;
        if cond.ty() != TypeId::BOOL {
            return Err(self.err(&cpos, "a condition must be Bool"));
        }
        self.expect_sym(Symbol::RParen)?;
        let if_idx = cx.code.len();
        cx.code.push(Statement::If {
            cond,
            then_target: if_idx + 1,
            else_target: END_OF_BODY,
        });
        self.block(cx)?;
        let then_end = cx.code.len() - 1;
        ends.push(then_end);
        if self.tok.is_name("elseif") {
            cx.set_tail(then_end, BlockTail::Elseif);
            cx.set_else(if_idx, cx.code.len());
            self.if_chain(cx, ends, open_else)
        } else if self.tok.is_name("else") {
            self.advance()?;
            cx.set_tail(then_end, BlockTail::Else);
            cx.set_else(if_idx, cx.code.len());
            self.block(cx)?;
            ends.push(cx.code.len() - 1);
            Ok(())
        } else {
            *open_else = Some(if_idx);
            Ok(())
        }
    }

    fn while_stmt(&mut self, cx: &mut BodyCx) -> Result<()> {
        self.advance()?;
        self.expect_sym(Symbol::LParen)?;
        let cpos = self.tok.pos.clone();
        let cond = self.expression(cx)?;
        if cond.ty() != TypeId::BOOL {
            return Err(self.err(&cpos, "a condition must be Bool"));
        }
        self.expect_sym(Symbol::RParen)?;
        let head = cx.code.len();
        cx.code.push(Statement::While {
            cond,
            body: head + 1,
            exit: 0,
        });
        self.close_loop(cx, head)
    }

    fn foreach_stmt(&mut self, cx: &mut BodyCx) -> Result<()> {
        self.advance()?;
        self.expect_sym(Symbol::LParen)?;
        let vpos = self.tok.pos.clone();
        let name = self.expect_var("a loop variable")?;
        self.expect_word("in")?;
        let mark = cx.frame.mark();
        let head;
        if self.tok.is_name("items") {
            self.advance()?;
            if self.tok.is_name("where") {
                self.advance()?;
                let (prop_name, ppos) = self.expect_name("a property name")?;
                let prop = match self.table.get(&prop_name) {
                    Some(Declared::Property(p)) => *p,
                    _ => {
                        return Err(
                            self.err(&ppos, format!("`{prop_name}` is not a property"))
                        );
                    }
                };
                let opos = self.tok.pos.clone();
                let Some(op) = comparison_op(&self.tok) else {
                    return Err(self.unexpected("a comparison"));
                };
                self.advance()?;
                let rpos = self.tok.pos.clone();
                let rhs = self.expression(cx)?;
                self.expect_sym(Symbol::RParen)?;
                let prop_ty = self.world.props.ty(prop);
                match op {
                    BinaryOp::Eq | BinaryOp::Ne => {
                        if !self.world.types.comparable(prop_ty, rhs.ty()) {
                            return Err(self.type_mismatch(&rpos, prop_ty, rhs.ty()));
                        }
                    }
                    _ => {
                        if prop_ty != TypeId::INT || rhs.ty() != TypeId::INT {
                            return Err(self.err(&opos, "ordering compares Int values"));
                        }
                    }
                }
                let Some(slot) = cx.frame.declare(&name, TypeId::ITEM) else {
                    return Err(self.err(&vpos, format!("`${name}` is already declared")));
                };
                let temp = cx.frame.alloc_temp();
                head = cx.code.len();
                cx.code.push(Statement::ForeachWhere {
                    slot,
                    name,
                    prop,
                    op,
                    rhs,
                    temp,
                    body: head + 1,
                    exit: 0,
                });
            } else {
                self.expect_sym(Symbol::RParen)?;
                let Some(slot) = cx.frame.declare(&name, TypeId::ITEM) else {
                    return Err(self.err(&vpos, format!("`${name}` is already declared")));
                };
                head = cx.code.len();
                cx.code.push(Statement::ForeachItems {
                    slot,
                    name,
                    body: head + 1,
                    exit: 0,
                });
            }
        } else {
            let tpos = self.tok.pos.clone();
            let ty = self.type_ref()?;
            if !self.world.types.is_enum(ty) {
                return Err(self.err(&tpos, "a loop runs over `items` or an enum"));
            }
            self.expect_sym(Symbol::RParen)?;
            let Some(slot) = cx.frame.declare(&name, ty) else {
                return Err(self.err(&vpos, format!("`${name}` is already declared")));
            };
            head = cx.code.len();
            cx.code.push(Statement::ForeachEnum {
                slot,
                name,
                ty,
                body: head + 1,
                exit: 0,
            });
        }
        let result = self.close_loop(cx, head);
        cx.frame.release(mark);
        result
    }

    /// Compiles the body of the loop whose header sits at `head`, then
    /// threads the end-of-loop statement and patches breaks, continues,
    /// and the loop's own exit.
    fn close_loop(&mut self, cx: &mut BodyCx, head: usize) -> Result<()> {
        cx.loops.push(LoopCtx::default());
        self.block(cx)?;
        let end = cx.code.len();
        cx.set_exit(end - 1, end);
        cx.code.push(Statement::EndLoop { owner: head });
        let after = cx.code.len();
        cx.set_loop_exit(head, after);
        let ctx = cx.loops.pop().unwrap_or_default();
        for site in ctx.breaks {
            cx.set_jump(site, after);
        }
        for site in ctx.continues {
            cx.set_jump(site, end);
        }
        Ok(())
    }

    fn break_stmt(&mut self, cx: &mut BodyCx) -> Result<()> {
        let pos = self.tok.pos.clone();
        self.advance()?;
        self.expect_sym(Symbol::Semi)?;
        if cx.loops.is_empty() {
            return Err(self.err(&pos, "`break` outside a loop"));
        }
        let at = cx.code.len();
        cx.code.push(Statement::Break { target: END_OF_BODY });
        if let Some(ctx) = cx.loops.last_mut() {
            ctx.breaks.push(at);
        }
        Ok(())
    }

    fn continue_stmt(&mut self, cx: &mut BodyCx) -> Result<()> {
        let pos = self.tok.pos.clone();
        self.advance()?;
        self.expect_sym(Symbol::Semi)?;
        if cx.loops.is_empty() {
            return Err(self.err(&pos, "`continue` outside a loop"));
        }
        let at = cx.code.len();
        cx.code.push(Statement::Continue { target: END_OF_BODY });
        if let Some(ctx) = cx.loops.last_mut() {
            ctx.continues.push(at);
        }
        Ok(())
    }

    fn return_stmt(&mut self, cx: &mut BodyCx) -> Result<()> {
        let pos = self.tok.pos.clone();
        self.advance()?;
        if self.eat_sym(Symbol::Semi)? {
            if cx.ret != TypeId::VOID {
                return Err(self.err(
                    &pos,
                    format!(
                        "this function returns `{}`; `return` needs a value",
                        self.world.types.name(cx.ret)
                    ),
                ));
            }
            cx.code.push(Statement::Return);
        } else {
            let vpos = self.tok.pos.clone();
            let value = self.expression(cx)?;
            self.expect_sym(Symbol::Semi)?;
            if cx.ret == TypeId::VOID {
                return Err(self.err(&vpos, "this function does not return a value"));
            }
            if !self.world.types.assignable(cx.ret, value.ty()) {
                return Err(self.type_mismatch(&vpos, cx.ret, value.ty()));
            }
            cx.code.push(Statement::ReturnValue { value });
        }
        Ok(())
    }

    fn switch_stmt(&mut self, cx: &mut BodyCx) -> Result<()> {
        self.advance()?;
        self.expect_sym(Symbol::LParen)?;
        let spos = self.tok.pos.clone();
        let scrutinee = self.expression(cx)?;
        let sty = scrutinee.ty();
        if sty == TypeId::VOID {
            return Err(self.err(&spos, "cannot switch on a Void expression"));
        }
        self.expect_sym(Symbol::RParen)?;
        self.expect_sym(Symbol::LBrace)?;
        let sw = cx.code.len();
        cx.code.push(Statement::Switch {
            scrutinee,
            cases: Vec::new(),
            default_target: 0,
        });
        cx.code.push(Statement::BlockStart);
        let mut cases: Vec<(Value, usize)> = Vec::new();
        let mut default_target: Option<usize> = None;
        let mut entries: Vec<usize> = Vec::new();
        while !self.tok.is_sym(Symbol::RBrace) {
            if self.tok.is_name("case") {
                self.advance()?;
                let vpos = self.tok.pos.clone();
                let label = {
                    let mut label_cx = BodyCx::new(TypeId::VOID);
                    self.expression(&mut label_cx)?
                };
                let Some((value, vty)) = label.as_constant() else {
                    return Err(
                        self.err(&vpos, "case labels must be compile-time constants")
                    );
                };
                if !self.world.types.comparable(sty, vty) {
                    return Err(self.type_mismatch(&vpos, sty, vty));
                }
                if cases.iter().any(|(v, _)| *v == value) {
                    return Err(self.err(&vpos, "duplicate case label"));
                }
                self.expect_sym(Symbol::Colon)?;
                let entry = cx.code.len();
                cx.code.push(Statement::CaseEntry {
                    value: Some(value),
                    ty: vty,
                    exit: 0,
                });
                entries.push(entry);
                cases.push((value, entry + 1));
                self.block(cx)?;
            } else if self.tok.is_name("default") {
                let dpos = self.tok.pos.clone();
                self.advance()?;
                self.expect_sym(Symbol::Colon)?;
                if default_target.is_some() {
                    return Err(self.err(&dpos, "duplicate `default`"));
                }
                let entry = cx.code.len();
                cx.code.push(Statement::CaseEntry {
                    value: None,
                    ty: sty,
                    exit: 0,
                });
                entries.push(entry);
                default_target = Some(entry + 1);
                self.block(cx)?;
            } else {
                return Err(self.unexpected("`case`, `default`, or `}`"));
            }
        }
        self.advance()?;
        let be = cx.code.len();
        cx.code.push(Statement::BlockEnd {
            exit: be + 1,
            tail: BlockTail::None,
        });
        for entry in entries {
            cx.set_exit(entry, be);
        }
        if let Some(Statement::Switch {
            cases: c,
            default_target: d,
            ..
        }) = cx.code.get_mut(sw)
        {
            *c = cases;
            *d = default_target.unwrap_or(be);
        }
        Ok(())
    }

    // ----- expressions -----

    fn expression(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        self.ternary(cx)
    }

    fn ternary(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        let cond = self.logic_or(cx)?;
        if !self.tok.is_sym(Symbol::Question) {
            return Ok(cond);
        }
        let qpos = self.tok.pos.clone();
        self.advance()?;
        if cond.ty() != TypeId::BOOL {
            return Err(self.err(&qpos, "a condition must be Bool"));
        }
        let then = self.ternary(cx)?;
        self.expect_sym(Symbol::Colon)?;
        let otherwise = self.ternary(cx)?;
        let ty = if then.ty() == otherwise.ty() {
            then.ty()
        } else if then.ty() == TypeId::NULL {
            otherwise.ty()
        } else if otherwise.ty() == TypeId::NULL {
            then.ty()
        } else {
            return Err(self.err(
                &qpos,
                format!(
                    "ternary branches disagree: `{}` and `{}`",
                    self.world.types.name(then.ty()),
                    self.world.types.name(otherwise.ty())
                ),
            ));
        };
        if let Some((value, _)) = cond.as_constant() {
            return Ok(if value.truthy() { then } else { otherwise });
        }
        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
            ty,
        })
    }

    fn logic_or(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        let mut lhs = self.logic_and(cx)?;
        while self.tok.is_sym(Symbol::OrOr) {
            let pos = self.tok.pos.clone();
            self.advance()?;
            let rhs = self.logic_and(cx)?;
            lhs = self.combine(BinaryOp::Or, lhs, rhs, &pos)?;
        }
        Ok(lhs)
    }

    fn logic_and(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        let mut lhs = self.comparison(cx)?;
        while self.tok.is_sym(Symbol::AndAnd) {
            let pos = self.tok.pos.clone();
            self.advance()?;
            let rhs = self.comparison(cx)?;
            lhs = self.combine(BinaryOp::And, lhs, rhs, &pos)?;
        }
        Ok(lhs)
    }

    fn comparison(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        let mut lhs = self.additive(cx)?;
        while let Some(op) = comparison_op(&self.tok) {
            let pos = self.tok.pos.clone();
            self.advance()?;
            let rhs = self.additive(cx)?;
            lhs = self.combine(op, lhs, rhs, &pos)?;
        }
        Ok(lhs)
    }

    fn additive(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        let mut lhs = self.multiplicative(cx)?;
        loop {
            let op = if self.tok.is_sym(Symbol::Plus) {
                BinaryOp::Add
            } else if self.tok.is_sym(Symbol::Minus) {
                BinaryOp::Sub
            } else {
                return Ok(lhs);
            };
            let pos = self.tok.pos.clone();
            self.advance()?;
            let rhs = self.multiplicative(cx)?;
            lhs = self.combine(op, lhs, rhs, &pos)?;
        }
    }

    fn multiplicative(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        let mut lhs = self.unary(cx)?;
        loop {
            let op = if self.tok.is_sym(Symbol::Star) {
                BinaryOp::Mul
            } else if self.tok.is_sym(Symbol::Slash) {
                BinaryOp::Div
            } else if self.tok.is_sym(Symbol::Percent) {
                BinaryOp::Rem
            } else {
                return Ok(lhs);
            };
            let pos = self.tok.pos.clone();
            self.advance()?;
            let rhs = self.unary(cx)?;
            lhs = self.combine(op, lhs, rhs, &pos)?;
        }
    }

    /// Type-checks one binary combination and folds it when both sides
    /// are constant. Logic with a constant left side short-circuits at
    /// compile time.
    fn combine(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr, pos: &Position) -> Result<Expr> {
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                if lhs.ty() != TypeId::INT || rhs.ty() != TypeId::INT {
                    return Err(
                        self.err(pos, format!("`{}` combines Int values", op.text()))
                    );
                }
                if let (Some((a, _)), Some((b, _))) = (lhs.as_constant(), rhs.as_constant()) {
                    return Ok(Expr::Literal {
                        value: apply_binary(op, a, b),
                        ty: TypeId::INT,
                    });
                }
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                if lhs.ty() != TypeId::INT || rhs.ty() != TypeId::INT {
                    return Err(self.err(pos, format!("`{}` compares Int values", op.text())));
                }
                if let (Some((a, _)), Some((b, _))) = (lhs.as_constant(), rhs.as_constant()) {
                    return Ok(Expr::Literal {
                        value: apply_binary(op, a, b),
                        ty: TypeId::BOOL,
                    });
                }
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                if !self.world.types.comparable(lhs.ty(), rhs.ty()) {
                    return Err(self.err(
                        pos,
                        format!(
                            "cannot compare `{}` with `{}`",
                            self.world.types.name(lhs.ty()),
                            self.world.types.name(rhs.ty())
                        ),
                    ));
                }
                if let (Some((a, _)), Some((b, _))) = (lhs.as_constant(), rhs.as_constant()) {
                    return Ok(Expr::Literal {
                        value: apply_binary(op, a, b),
                        ty: TypeId::BOOL,
                    });
                }
            }
            BinaryOp::And | BinaryOp::Or => {
                if lhs.ty() != TypeId::BOOL || rhs.ty() != TypeId::BOOL {
                    return Err(
                        self.err(pos, format!("`{}` combines Bool values", op.text()))
                    );
                }
                if let Some((value, _)) = lhs.as_constant() {
                    let keep_rhs = if op == BinaryOp::And {
                        value.truthy()
                    } else {
                        !value.truthy()
                    };
                    return Ok(if keep_rhs {
                        rhs
                    } else {
                        Expr::Literal {
                            value: Value::from(op == BinaryOp::Or),
                            ty: TypeId::BOOL,
                        }
                    });
                }
            }
        }
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn unary(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        if self.tok.is_sym(Symbol::Bang) {
            let pos = self.tok.pos.clone();
            self.advance()?;
            let operand = self.unary(cx)?;
            if operand.ty() != TypeId::BOOL {
                return Err(self.err(&pos, "`!` needs a Bool operand"));
            }
            if let Some((value, _)) = operand.as_constant() {
                return Ok(Expr::Literal {
                    value: apply_unary(UnaryOp::Not, value),
                    ty: TypeId::BOOL,
                });
            }
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        if self.tok.is_sym(Symbol::Minus) {
            let pos = self.tok.pos.clone();
            self.advance()?;
            let operand = self.unary(cx)?;
            if operand.ty() != TypeId::INT {
                return Err(self.err(&pos, "`-` needs an Int operand"));
            }
            if let Some((value, _)) = operand.as_constant() {
                return Ok(Expr::Literal {
                    value: apply_unary(UnaryOp::Neg, value),
                    ty: TypeId::INT,
                });
            }
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.postfix(cx)
    }

    fn postfix(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        let mut expr = self.atom(cx)?;
        loop {
            if self.tok.is_sym(Symbol::Dot) {
                let dpos = self.tok.pos.clone();
                self.advance()?;
                let (field, fpos) = self.expect_name("a property name")?;
                if expr.ty() != TypeId::ITEM {
                    return Err(self.err(&dpos, "only items have properties"));
                }
                let prop = match self.table.get(&field) {
                    Some(Declared::Property(p)) => *p,
                    _ => return Err(self.err(&fpos, format!("`{field}` is not a property"))),
                };
                let ty = self.world.props.ty(prop);
                expr = Expr::Property {
                    target: Box::new(expr),
                    prop,
                    ty,
                };
            } else if self.tok.is_sym(Symbol::LParen) {
                let ppos = self.tok.pos.clone();
                let (shapes, ret) = {
                    let Some((params, ret)) = self.world.types.delegate_shape(expr.ty()) else {
                        return Err(self.err(&ppos, "this expression is not callable"));
                    };
                    (params.to_vec(), ret)
                };
                let args = self.argument_list(cx)?;
                self.check_arg_types(&shapes, &args, &ppos, "this delegate")?;
                expr = Expr::CallDelegate {
                    target: Box::new(expr),
                    args,
                    ty: ret,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn argument_list(&mut self, cx: &mut BodyCx) -> Result<Vec<Expr>> {
        self.expect_sym(Symbol::LParen)?;
        let mut args = Vec::new();
        while !self.tok.is_sym(Symbol::RParen) {
            args.push(self.expression(cx)?);
            if !self.eat_sym(Symbol::Comma)? {
                break;
            }
        }
        self.expect_sym(Symbol::RParen)?;
        Ok(args)
    }

    fn check_arg_types(
        &self,
        expected: &[TypeId],
        args: &[Expr],
        pos: &Position,
        what: &str,
    ) -> Result<()> {
        if args.len() != expected.len() {
            let noun = if expected.len() == 1 {
                "argument"
            } else {
                "arguments"
            };
            return Err(self.err(
                pos,
                format!("{what} takes {} {noun}, found {}", expected.len(), args.len()),
            ));
        }
        for (i, (want, arg)) in expected.iter().zip(args).enumerate() {
            if !self.world.types.assignable(*want, arg.ty()) {
                return Err(self.err(
                    pos,
                    format!(
                        "argument {} has type `{}`, expected `{}`",
                        i + 1,
                        self.world.types.name(arg.ty()),
                        self.world.types.name(*want)
                    ),
                ));
            }
        }
        Ok(())
    }

    fn atom(&mut self, cx: &mut BodyCx) -> Result<Expr> {
        let pos = self.tok.pos.clone();
        match &self.tok.kind {
            TokenKind::Int(v) => {
                let value = *v;
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::new(value),
                    ty: TypeId::INT,
                })
            }
            TokenKind::Str(s) => {
                let text = s.clone();
                self.advance()?;
                let id = self.world.interner.intern(&text);
                Ok(Expr::Literal {
                    value: id.to_value(),
                    ty: TypeId::STRING,
                })
            }
            TokenKind::Template(raw) => {
                let raw = raw.clone();
                self.advance()?;
                self.template(cx, &raw, &pos)
            }
            TokenKind::Var(v) => {
                let name = v.clone();
                self.advance()?;
                let Some((slot, ty)) = cx.frame.lookup(&name) else {
                    return Err(self.err(&pos, format!("no variable named `${name}` is in scope")));
                };
                Ok(Expr::Local { slot, ty, name })
            }
            TokenKind::Sym(Symbol::LParen) => {
                self.advance()?;
                let inner = self.expression(cx)?;
                self.expect_sym(Symbol::RParen)?;
                Ok(inner)
            }
            TokenKind::Name(n) => {
                let word = n.clone();
                self.name_atom(cx, &word, &pos)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn name_atom(&mut self, cx: &mut BodyCx, word: &str, pos: &Position) -> Result<Expr> {
        match word {
            "null" => {
                self.advance()?;
                return Ok(Expr::Literal {
                    value: Value::NULL,
                    ty: TypeId::NULL,
                });
            }
            "true" => {
                self.advance()?;
                return Ok(Expr::Literal {
                    value: Value::TRUE,
                    ty: TypeId::BOOL,
                });
            }
            "false" => {
                self.advance()?;
                return Ok(Expr::Literal {
                    value: Value::FALSE,
                    ty: TypeId::BOOL,
                });
            }
            _ => {}
        }
        let Some(declared) = self.table.get(word).cloned() else {
            return Err(self.err(pos, format!("unknown name `{word}`")));
        };
        self.advance()?;
        match declared {
            Declared::Const(value, ty) => Ok(Expr::Literal { value, ty }),
            Declared::Global(id, ty) => Ok(Expr::Global { id, ty }),
            Declared::Item(id) => Ok(Expr::Literal {
                value: id.to_value(),
                ty: TypeId::ITEM,
            }),
            Declared::Function(id) => self.function_atom(cx, id, pos),
            Declared::Map(id) => self.map_call(cx, id, pos),
            Declared::Intrinsic(intrinsic) => self.intrinsic_call(cx, intrinsic, pos),
            Declared::Type(ty) => self.enum_member(ty, pos, word),
            Declared::Property(_) => Err(self.err(
                pos,
                format!("`{word}` is a property; access it through an item"),
            )),
            Declared::Keyword => {
                if word == "item" && self.tok.is_sym(Symbol::LParen) {
                    self.intrinsic_call(cx, Intrinsic::ItemLookup, pos)
                } else {
                    Err(self.err(pos, format!("`{word}` cannot start an expression")))
                }
            }
        }
    }

    /// A function name: a call when parentheses follow, otherwise a
    /// delegate-typed reference to the function.
    fn function_atom(&mut self, cx: &mut BodyCx, id: FuncId, pos: &Position) -> Result<Expr> {
        let (shapes, ret, name): (Vec<TypeId>, TypeId, String) = {
            let Some(f) = self.defs.function(id) else {
                return Err(self.err(pos, "unknown function"));
            };
            (f.params.iter().map(|p| p.ty).collect(), f.ret, f.name.clone())
        };
        if self.tok.is_sym(Symbol::LParen) {
            let args = self.argument_list(cx)?;
            self.check_arg_types(&shapes, &args, pos, &format!("`{name}`"))?;
            Ok(Expr::Call { func: id, args, ty: ret })
        } else {
            let ty = self.world.types.delegate(shapes, ret);
            Ok(Expr::Literal {
                value: id.to_value(),
                ty,
            })
        }
    }

    fn map_call(&mut self, cx: &mut BodyCx, id: MapId, pos: &Position) -> Result<Expr> {
        let (input, output, name) = {
            let Some(m) = self.defs.map(id) else {
                return Err(self.err(pos, "unknown map"));
            };
            (m.input, m.output, m.name.clone())
        };
        if !self.tok.is_sym(Symbol::LParen) {
            return Err(self.err(pos, format!("map `{name}` must be called")));
        }
        let args = self.argument_list(cx)?;
        self.check_arg_types(&[input], &args, pos, &format!("map `{name}`"))?;
        let Some(arg) = args.into_iter().next() else {
            return Err(self.err(pos, format!("map `{name}` takes 1 argument")));
        };
        if let Some((value, _)) = arg.as_constant() {
            let folded = self.defs.map(id).map_or(Value::NULL, |m| m.lookup(value));
            return Ok(Expr::Literal {
                value: folded,
                ty: output,
            });
        }
        Ok(Expr::CallMap {
            map: id,
            arg: Box::new(arg),
            ty: output,
        })
    }

    fn intrinsic_call(
        &mut self,
        cx: &mut BodyCx,
        intrinsic: Intrinsic,
        pos: &Position,
    ) -> Result<Expr> {
        if !self.tok.is_sym(Symbol::LParen) {
            return Err(self.err(pos, format!("`{}` must be called", intrinsic.name())));
        }
        let args = self.argument_list(cx)?;
        self.check_arg_types(
            intrinsic.params(),
            &args,
            pos,
            &format!("`{}`", intrinsic.name()),
        )?;
        Ok(Expr::CallIntrinsic { intrinsic, args })
    }

    fn enum_member(&mut self, ty: TypeId, pos: &Position, tyname: &str) -> Result<Expr> {
        if !self.world.types.is_enum(ty) {
            return Err(self.err(
                pos,
                format!("`{tyname}` cannot appear in an expression"),
            ));
        }
        self.expect_sym(Symbol::Dot)?;
        let (member, mpos) = self.expect_name("an enum member")?;
        let Some(ordinal) = self.world.types.enum_ordinal(ty, &member) else {
            return Err(self.err(&mpos, format!("`{tyname}` has no member `{member}`")));
        };
        Ok(Expr::Literal {
            value: Value::new(ordinal),
            ty,
        })
    }

    // ----- templates -----

    /// Compiles a raw template body: text runs with decoded escapes,
    /// `{...}` holes parsed as embedded expression fragments.
    fn template(&mut self, cx: &mut BodyCx, raw: &str, pos: &Position) -> Result<Expr> {
        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut text = String::new();
        let mut i = 0;
        while i < raw.len() {
            let Some(ch) = raw[i..].chars().next() else {
                break;
            };
            let width = ch.len_utf8();
            match ch {
                '\\' => {
                    let Some(esc) = raw[i + width..].chars().next() else {
                        break;
                    };
                    match esc {
                        'n' => text.push('\n'),
                        '\\' => text.push('\\'),
                        '"' => text.push('"'),
                        '`' => text.push('`'),
                        '{' => text.push('{'),
                        other => {
                            return Err(self.err(
                                pos,
                                format!("unknown escape `\\{other}` in text template"),
                            ));
                        }
                    }
                    i += width + esc.len_utf8();
                }
                '{' => {
                    let body_start = i + width;
                    let body_end = self.hole_end(raw, body_start, pos)?;
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    let column =
                        pos.column + 1 + u32::try_from(raw[..body_start].chars().count())
                            .unwrap_or(0);
                    let hole_pos = Position::new(Arc::clone(&pos.source), pos.line, column);
                    let expr = self.hole_expr(cx, &raw[body_start..body_end], &hole_pos)?;
                    parts.push(TemplatePart::Hole(expr));
                    i = body_end + 1;
                }
                _ => {
                    text.push(ch);
                    i += width;
                }
            }
        }
        if !text.is_empty() || parts.is_empty() {
            parts.push(TemplatePart::Text(text));
        }
        if parts
            .iter()
            .all(|part| matches!(part, TemplatePart::Text(_)))
        {
            let joined: String = parts
                .iter()
                .map(|part| match part {
                    TemplatePart::Text(t) => t.as_str(),
                    TemplatePart::Hole(_) => "",
                })
                .collect();
            let id = self.world.interner.intern(&joined);
            return Ok(Expr::Literal {
                value: id.to_value(),
                ty: TypeId::STRING,
            });
        }
        Ok(Expr::Template { parts })
    }

    /// Finds the byte index of the `}` closing a hole, skipping over
    /// string literals inside the hole.
    fn hole_end(&self, raw: &str, start: usize, pos: &Position) -> Result<usize> {
        let mut depth = 1usize;
        let mut in_str = false;
        let mut i = start;
        while i < raw.len() {
            let Some(ch) = raw[i..].chars().next() else {
                break;
            };
            let width = ch.len_utf8();
            if in_str {
                match ch {
                    '\\' => {
                        let skip = raw[i + width..].chars().next().map_or(0, char::len_utf8);
                        i += width + skip;
                        continue;
                    }
                    '"' => in_str = false,
                    _ => {}
                }
            } else {
                match ch {
                    '"' => in_str = true,
                    '`' => return Err(self.err(pos, "text templates do not nest")),
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(i);
                        }
                    }
                    _ => {}
                }
            }
            i += width;
        }
        Err(self.err(pos, "unterminated `{` in text template"))
    }

    fn hole_expr(&mut self, cx: &mut BodyCx, text: &str, pos: &Position) -> Result<Expr> {
        if text.trim().is_empty() {
            return Err(self.err(pos, "empty interpolation in text template"));
        }
        let expr = self.with_fragment(text, pos, |p| {
            let expr = p.expression(cx)?;
            if !p.tok.is_end() {
                return Err(p.unexpected("the end of the interpolation"));
            }
            Ok(expr)
        })?;
        if expr.ty() == TypeId::VOID {
            return Err(self.err(pos, "this interpolation has no value to show"));
        }
        Ok(expr)
    }
}
