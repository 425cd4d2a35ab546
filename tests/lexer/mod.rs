// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use celeris::unstable::*;

fn get_tokens(source: &Source) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut lex = Lexer::new(source);
    loop {
        let tok = lex.next_token()?;
        tokens.push(tok.clone());
        if tok.0 == TokenKind::Eof {
            break;
        }
    }

    Ok(tokens)
}

fn source(text: &str) -> Source {
    Source::new("<test>".to_string(), text.to_string())
}

// The caret drawn under a token's location must point at the token text.
fn check_loc(tok: &Token) -> Result<()> {
    let msg = tok.1.source.message(tok.1.line, tok.1.col, "", "");
    let lines: Vec<&str> = msg.split('\n').collect();
    let source_line = lines[3];
    let caret_line = lines[4];
    let Some(idx) = caret_line.find('^') else {
        bail!("could not find caret for {tok:#?} {msg}");
    };
    if tok.0 == TokenKind::Eof {
        return Ok(());
    }
    let span_str = tok.1.text().split('\n').next().unwrap_or_default();
    let source_str = &source_line[idx..];
    assert!(
        source_str.starts_with(span_str),
        "location mismatch for {tok:#?} {msg}\n{span_str}\n{source_str}"
    );
    Ok(())
}

fn kinds_and_texts(text: &str) -> Result<Vec<(TokenKind, String)>> {
    let src = source(text);
    Ok(get_tokens(&src)?
        .into_iter()
        .map(|t| (t.0, t.1.text().to_string()))
        .collect())
}

#[test]
fn symbols_and_literals() -> Result<()> {
    use TokenKind::*;
    let toks = kinds_and_texts("a.b[1] >= 2u && 'x' != null || !c ? 1.5 : -3")?;
    let expected = [
        (Ident, "a"),
        (Symbol, "."),
        (Ident, "b"),
        (Symbol, "["),
        (Int, "1"),
        (Symbol, "]"),
        (Symbol, ">="),
        (Uint, "2u"),
        (Symbol, "&&"),
        (String, "'x'"),
        (Symbol, "!="),
        (Ident, "null"),
        (Symbol, "||"),
        (Symbol, "!"),
        (Ident, "c"),
        (Symbol, "?"),
        (Double, "1.5"),
        (Symbol, ":"),
        (Symbol, "-"),
        (Int, "3"),
        (Eof, ""),
    ];
    assert_eq!(toks.len(), expected.len());
    for ((k, t), (ek, et)) in toks.iter().zip(expected.iter()) {
        assert_eq!((k, t.as_str()), (ek, *et));
    }
    Ok(())
}

#[test]
fn locations() -> Result<()> {
    let src = source("x.exists(y,\n\ty > 'two'\n) && b\"\\x00\" == b''");
    for tok in get_tokens(&src)? {
        check_loc(&tok)?;
    }
    Ok(())
}

#[test]
fn multiline_strings_advance_lines() -> Result<()> {
    let src = source("'''one\ntwo''' + z");
    let toks = get_tokens(&src)?;
    assert_eq!(toks[0].0, TokenKind::String);
    let z = &toks[2];
    assert_eq!((z.1.line, z.1.col), (2, 10));
    Ok(())
}

#[test]
fn lexer_errors() {
    let cases = [
        ("'open", "unterminated string literal"),
        ("a # b", "token recognition error at: '#'"),
        ("0x", "invalid hex literal"),
        ("1e+", "invalid exponent"),
    ];
    for (text, expected) in cases {
        let src = source(text);
        match get_tokens(&src) {
            Ok(toks) => panic!("`{text}` lexed as {toks:?}"),
            Err(e) => assert!(
                e.to_string().contains(expected),
                "`{text}`: `{e}` does not contain `{expected}`"
            ),
        }
    }
}

#[test]
fn unescaping() -> Result<()> {
    assert_eq!(unescape(r"'\u00e9\t'", false).map_err(anyhow::Error::msg)?, "é\t".as_bytes());
    assert_eq!(unescape(r"b'\377'", true).map_err(anyhow::Error::msg)?, vec![0xff]);
    assert!(unescape(r"'\xff'", false).is_ok());
    assert!(unescape(r"'\z'", false).is_err());
    Ok(())
}
