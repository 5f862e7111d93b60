//! Integration tests for the story lexer.

use fabula_language::lexer::Lexer;
use fabula_language::token::{Symbol, TokenKind};

fn kinds(text: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::source("test.fab", text);
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token().unwrap();
        let done = token.kind == TokenKind::End;
        out.push(token.kind);
        if done {
            return out;
        }
    }
}

#[test]
fn statements_lex_to_expected_kinds() {
    assert_eq!(
        kinds("score = 12;"),
        vec![
            TokenKind::Name("score".to_string()),
            TokenKind::Sym(Symbol::Assign),
            TokenKind::Int(12),
            TokenKind::Sym(Symbol::Semi),
            TokenKind::End,
        ]
    );
}

#[test]
fn variables_drop_their_sigil() {
    assert_eq!(
        kinds("$x != $y"),
        vec![
            TokenKind::Var("x".to_string()),
            TokenKind::Sym(Symbol::NotEq),
            TokenKind::Var("y".to_string()),
            TokenKind::End,
        ]
    );
}

#[test]
fn strings_decode_their_escapes() {
    assert_eq!(
        kinds("\"a \\\"quoted\\\" line\\n\""),
        vec![
            TokenKind::Str("a \"quoted\" line\n".to_string()),
            TokenKind::End,
        ]
    );
}

#[test]
fn templates_stay_raw_until_compiled() {
    assert_eq!(
        kinds("`score {points}`"),
        vec![
            TokenKind::Template("score {points}".to_string()),
            TokenKind::End,
        ]
    );
}

#[test]
fn positions_are_one_based_characters() {
    let mut lexer = Lexer::source("test.fab", "item lamp;");
    let item = lexer.next_token().unwrap();
    assert_eq!((item.pos.line, item.pos.column), (1, 1));
    let lamp = lexer.next_token().unwrap();
    assert_eq!((lamp.pos.line, lamp.pos.column), (1, 6));
    assert_eq!(lamp.pos.to_string(), "test.fab(1,6)");
}

#[test]
fn doc_comments_attach_to_the_next_token() {
    let mut lexer = Lexer::source("test.fab", "// noise\n/// The lamp.\nitem lamp;");
    let item = lexer.next_token().unwrap();
    assert!(item.is_name("item"));
    assert_eq!(item.docs, ["The lamp."]);
}

#[test]
fn markdown_sources_keep_only_fenced_code() {
    let text = "# A Story\n\
                Prose about the lamp.\n\
                ```\n\
                item lamp;\n\
                ```\n\
                More prose.\n";
    let mut lexer = Lexer::source("intro.md", text);
    let item = lexer.next_token().unwrap();
    assert!(item.is_name("item"));
    assert_eq!(item.pos.line, 4);
}

#[test]
fn markdown_links_become_includes() {
    let text = "See [the cellar](cellar.md) for details.\n";
    let mut lexer = Lexer::source("intro.md", text);
    let include = lexer.next_token().unwrap();
    assert!(include.is_name("include"));
    let target = lexer.next_token().unwrap();
    assert_eq!(target.kind, TokenKind::Str("cellar.md".to_string()));
    assert!(lexer.next_token().unwrap().is_sym(Symbol::Semi));
}

#[test]
fn lex_errors_carry_positions() {
    let mut lexer = Lexer::source("test.fab", "item #lamp;");
    lexer.next_token().unwrap();
    let err = lexer.next_token().unwrap_err();
    assert!(err.to_string().starts_with("test.fab(1,6)"), "{err}");
}
