//! The story lexer.
//!
//! Scanning is line-buffered: one master pattern with mutually exclusive
//! named groups is matched against the remainder of the current line, so
//! a token can never span lines. A gap between the scan position and the
//! next match is a lexical error covering the gap. String and template
//! literals hand off to a dedicated scanner that walks escapes and
//! reports untermination.
//!
//! The same machinery lexes whole sources and embedded fragments (the
//! `{...}` holes of text templates, the parameter declarations inside
//! command triggers). A fragment lexer carries the position of its first
//! character so every token still points into the enclosing source.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use fabula_foundation::{Error, Position, Result};

use crate::source::prepare_lines;
use crate::token::{Symbol, Token, TokenKind};

static MASTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?P<ws>[ \t\r]+)|(?P<doc>///[^\n]*)|(?P<comment>//[^\n]*)|(?P<sym>=>|==|!=|<=|>=|&&|\|\||[{}(),;:.?=+\-*/%!<>])|(?P<int>[0-9]+)|(?P<name>[A-Za-z_][A-Za-z0-9_]*)|(?P<var>\$[A-Za-z_][A-Za-z0-9_]*)|(?P<str>")|(?P<tpl>`)"#,
    )
    .expect("token pattern")
});

/// Pull lexer over one source or fragment.
#[derive(Clone, Debug)]
pub struct Lexer {
    name: Arc<str>,
    lines: Vec<String>,
    line: usize,
    col: usize,
    base_line: u32,
    base_col: u32,
    fragment: bool,
    pending_docs: Vec<String>,
}

impl Lexer {
    /// Creates a lexer over a whole source. Sources named `*.md` go
    /// through the literate transform first.
    #[must_use]
    pub fn source(name: &str, text: &str) -> Self {
        Self {
            name: Arc::from(name),
            lines: prepare_lines(name, text),
            line: 0,
            col: 0,
            base_line: 1,
            base_col: 1,
            fragment: false,
            pending_docs: Vec::new(),
        }
    }

    /// Creates a lexer over a fragment embedded in a larger source,
    /// positioned at the fragment's first character.
    #[must_use]
    pub fn fragment(name: Arc<str>, text: &str, line: u32, column: u32) -> Self {
        Self {
            name,
            lines: text.lines().map(str::to_string).collect(),
            line: 0,
            col: 0,
            base_line: line,
            base_col: column,
            fragment: true,
            pending_docs: Vec::new(),
        }
    }

    /// Whether this lexer scans an embedded fragment rather than an
    /// included source.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    fn position(&self, line: usize, byte_col: usize) -> Position {
        let chars = self
            .lines
            .get(line)
            .map_or(0, |l| l[..byte_col.min(l.len())].chars().count());
        let line_no = self.base_line + u32::try_from(line).unwrap_or(0);
        let column = if line == 0 {
            self.base_col + u32::try_from(chars).unwrap_or(0)
        } else {
            1 + u32::try_from(chars).unwrap_or(0)
        };
        Position::new(Arc::clone(&self.name), line_no, column)
    }

    fn token(&mut self, kind: TokenKind, pos: Position) -> Token {
        Token {
            kind,
            pos,
            docs: std::mem::take(&mut self.pending_docs),
        }
    }

    /// Produces the next token.
    ///
    /// # Errors
    ///
    /// Returns a compile error for characters outside the language, for
    /// unterminated or malformed literals, and for out-of-range integer
    /// literals.
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            if self.line >= self.lines.len() {
                let pos = self.position(self.line, 0);
                return Ok(self.token(TokenKind::End, pos));
            }
            if self.col >= self.lines[self.line].len() {
                self.line += 1;
                self.col = 0;
                continue;
            }

            let line_text = self.lines[self.line].clone();
            let Some(caps) = MASTER.captures_at(&line_text, self.col) else {
                let pos = self.position(self.line, self.col);
                let gap = line_text[self.col..].to_string();
                self.col = line_text.len();
                return Err(self.gap_error(pos, &gap));
            };
            let Some(whole) = caps.get(0) else {
                // captures_at always yields group 0 on a match
                self.col = line_text.len();
                continue;
            };
            if whole.start() > self.col {
                let pos = self.position(self.line, self.col);
                let gap = line_text[self.col..whole.start()].to_string();
                self.col = whole.start();
                return Err(self.gap_error(pos, &gap));
            }

            let pos = self.position(self.line, whole.start());
            let text = whole.as_str();

            if caps.name("ws").is_some() {
                self.col = whole.end();
                continue;
            }
            if caps.name("doc").is_some() {
                let body = text.strip_prefix("///").unwrap_or("");
                let body = body.strip_prefix(' ').unwrap_or(body);
                self.pending_docs.push(body.to_string());
                self.col = whole.end();
                continue;
            }
            if caps.name("comment").is_some() {
                self.col = whole.end();
                continue;
            }
            if caps.name("int").is_some() {
                self.col = whole.end();
                let value: i64 = text
                    .parse()
                    .map_err(|_| Error::compile(pos.clone(), "integer literal out of range"))?;
                return Ok(self.token(TokenKind::Int(value), pos));
            }
            if caps.name("name").is_some() {
                self.col = whole.end();
                return Ok(self.token(TokenKind::Name(text.to_string()), pos));
            }
            if caps.name("var").is_some() {
                self.col = whole.end();
                return Ok(self.token(TokenKind::Var(text[1..].to_string()), pos));
            }
            if caps.name("str").is_some() {
                let (decoded, end) = scan_quoted(&line_text, whole.end(), '"', true, &pos)?;
                self.col = end;
                return Ok(self.token(TokenKind::Str(decoded), pos));
            }
            if caps.name("tpl").is_some() {
                let (raw, end) = scan_quoted(&line_text, whole.end(), '`', false, &pos)?;
                self.col = end;
                return Ok(self.token(TokenKind::Template(raw), pos));
            }
            // Remaining group: a symbol.
            self.col = whole.end();
            let symbol = symbol_for(text)
                .ok_or_else(|| Error::compile(pos.clone(), format!("unexpected symbol `{text}`")))?;
            return Ok(self.token(TokenKind::Sym(symbol), pos));
        }
    }

    fn gap_error(&self, pos: Position, gap: &str) -> Error {
        if gap.chars().count() == 1 {
            Error::compile(pos, format!("unexpected character `{gap}`"))
        } else {
            Error::compile(pos, format!("unexpected characters `{gap}`"))
        }
    }
}

fn symbol_for(text: &str) -> Option<Symbol> {
    Some(match text {
        "{" => Symbol::LBrace,
        "}" => Symbol::RBrace,
        "(" => Symbol::LParen,
        ")" => Symbol::RParen,
        "," => Symbol::Comma,
        ";" => Symbol::Semi,
        ":" => Symbol::Colon,
        "." => Symbol::Dot,
        "?" => Symbol::Question,
        "=" => Symbol::Assign,
        "=>" => Symbol::FatArrow,
        "+" => Symbol::Plus,
        "-" => Symbol::Minus,
        "*" => Symbol::Star,
        "/" => Symbol::Slash,
        "%" => Symbol::Percent,
        "!" => Symbol::Bang,
        "==" => Symbol::EqEq,
        "!=" => Symbol::NotEq,
        "<" => Symbol::Lt,
        "<=" => Symbol::LtEq,
        ">" => Symbol::Gt,
        ">=" => Symbol::GtEq,
        "&&" => Symbol::AndAnd,
        "||" => Symbol::OrOr,
        _ => return None,
    })
}

/// Scans a quoted literal from just after its opening delimiter, within
/// one line. Returns the body and the byte offset past the closing
/// delimiter. When `decode` is set, escapes are resolved; otherwise they
/// are kept verbatim for a later pass.
fn scan_quoted(
    line: &str,
    start: usize,
    terminator: char,
    decode: bool,
    pos: &Position,
) -> Result<(String, usize)> {
    let what = if terminator == '"' {
        "string literal"
    } else {
        "text template"
    };
    let mut out = String::new();
    let mut iter = line[start..].char_indices();
    while let Some((off, ch)) = iter.next() {
        if ch == terminator {
            return Ok((out, start + off + ch.len_utf8()));
        }
        if ch == '\\' {
            let Some((_, esc)) = iter.next() else {
                break;
            };
            if decode {
                match esc {
                    'n' => out.push('\n'),
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    '`' => out.push('`'),
                    '{' => out.push('{'),
                    _ => {
                        return Err(Error::compile(
                            pos.clone(),
                            format!("unknown escape `\\{esc}` in {what}"),
                        ));
                    }
                }
            } else {
                out.push('\\');
                out.push(esc);
            }
            continue;
        }
        out.push(ch);
    }
    Err(Error::compile(
        pos.clone(),
        format!("unterminated {what}"),
    ))
}
