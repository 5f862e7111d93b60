//! Tokens produced by the story lexer.

use fabula_foundation::Position;

/// Punctuation and operator tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `?`
    Question,
    /// `=`
    Assign,
    /// `=>`
    FatArrow,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Bang,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
}

impl Symbol {
    /// The symbol as it appears in source.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Comma => ",",
            Self::Semi => ";",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::Question => "?",
            Self::Assign => "=",
            Self::FatArrow => "=>",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Bang => "!",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
        }
    }
}

/// What a token is.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// An integer literal.
    Int(i64),
    /// A bare name: keyword, type, declaration, or member.
    Name(String),
    /// A `$name` frame variable, stored without the sigil.
    Var(String),
    /// A decoded `"..."` string literal.
    Str(String),
    /// The raw body of a `` `...` `` text template. Escapes and `{...}`
    /// holes are decoded later, when the template is compiled.
    Template(String),
    /// Punctuation or an operator.
    Sym(Symbol),
    /// End of input.
    End,
}

/// One lexed token with its position and any doc comment lines that
/// immediately preceded it.
#[derive(Clone, Debug)]
pub struct Token {
    /// What the token is.
    pub kind: TokenKind,
    /// Where the token begins.
    pub pos: Position,
    /// `///` lines gathered since the previous token.
    pub docs: Vec<String>,
}

impl Token {
    /// Whether this token is the given symbol.
    #[must_use]
    pub fn is_sym(&self, symbol: Symbol) -> bool {
        self.kind == TokenKind::Sym(symbol)
    }

    /// Whether this token is the given bare name.
    #[must_use]
    pub fn is_name(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Name(n) if n == name)
    }

    /// Whether this token ends the input.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }

    /// A short description of the token for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Int(v) => format!("`{v}`"),
            TokenKind::Name(n) => format!("`{n}`"),
            TokenKind::Var(n) => format!("`${n}`"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Template(_) => "text template".to_string(),
            TokenKind::Sym(s) => format!("`{}`", s.text()),
            TokenKind::End => "end of input".to_string(),
        }
    }
}
