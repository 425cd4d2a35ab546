// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::issues::{CelError, Issues};
use crate::lexer::*;
use crate::macros::{find_macro, ExprFactory, Macro};

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

const PRIMARY_START: &str = "{'[', '{', '(', '.', '-', '!', 'true', 'false', 'null', \
     NUM_FLOAT, NUM_INT, NUM_UINT, STRING, BYTES, IDENTIFIER}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Parsing stops once this many errors have been reported.
    pub max_errors: usize,
    pub max_recursion_depth: usize,
    /// Record the original form of expanded macros in `SourceInfo`.
    pub track_macro_calls: bool,
    /// Accept `a.?b`, `a[?b]` and `?` entries in literals.
    pub enable_optional_syntax: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_errors: 100,
            max_recursion_depth: 250,
            track_macro_calls: true,
            enable_optional_syntax: true,
        }
    }
}

type ParseResult<T> = Result<T, CelError>;

pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    tok: Token,
    options: ParserOptions,
    next_id: ExprId,
    positions: BTreeMap<ExprId, i32>,
    macro_calls: BTreeMap<ExprId, Expr>,
    errors: Vec<CelError>,
    depth: usize,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source, options: ParserOptions) -> Self {
        let start = Span {
            source: source.clone(),
            line: 1,
            col: 1,
            start: 0,
            end: 0,
        };
        Self {
            source: source.clone(),
            lexer: Lexer::new(source),
            tok: Token(TokenKind::Eof, start),
            options,
            next_id: 0,
            positions: BTreeMap::new(),
            macro_calls: BTreeMap::new(),
            errors: vec![],
            depth: 0,
        }
    }

    /// Parses the whole source. Syntax errors are collected rather than
    /// returned one at a time.
    pub fn parse(mut self) -> Result<Ast, Issues> {
        let expr = match self.parse_root() {
            Ok(e) => e,
            Err(e) => {
                self.record(e);
                Expr::new(0, ExprKind::NotSet)
            }
        };
        if !self.errors.is_empty() {
            debug!(
                "parsing {} failed with {} error(s)",
                self.source.file(),
                self.errors.len()
            );
            return Err(Issues::new(self.source, self.errors));
        }

        let source_info = SourceInfo {
            location: self.source.file().clone(),
            line_offsets: self.source.line_offsets().to_vec(),
            positions: self.positions,
            macro_calls: self.macro_calls,
        };
        Ok(Ast::new(expr, source_info, self.source))
    }

    fn parse_root(&mut self) -> ParseResult<Expr> {
        self.next_token()?;
        let expr = self.parse_expr()?;
        if self.tok.0 != TokenKind::Eof {
            return Err(self.mismatched("<EOF>"));
        }
        Ok(expr)
    }

    fn record(&mut self, e: CelError) {
        // One error per position. Follow-on errors at the same spot add
        // nothing.
        let max = self.options.max_errors.max(1);
        if self.errors.len() < max && !self.errors.iter().any(|x| x.location == e.location) {
            self.errors.push(e);
        }
    }

    fn limit_reached(&self) -> bool {
        self.errors.len() >= self.options.max_errors.max(1)
    }

    fn next_token(&mut self) -> ParseResult<()> {
        loop {
            match self.lexer.next_token() {
                Ok(tok) => {
                    self.tok = tok;
                    return Ok(());
                }
                Err(e) => {
                    self.record(e.clone());
                    if self.limit_reached() {
                        return Err(e);
                    }
                }
            }
        }
    }

    fn is_symbol(&self, text: &str) -> bool {
        self.tok.0 == TokenKind::Symbol && self.tok.1.text() == text
    }

    fn is_ident(&self, text: &str) -> bool {
        self.tok.0 == TokenKind::Ident && self.tok.1.text() == text
    }

    fn offset(&self) -> i32 {
        self.tok.1.offset()
    }

    fn mismatched(&self, expecting: &str) -> CelError {
        let found = match self.tok.0 {
            TokenKind::Eof => "<EOF>",
            _ => self.tok.1.text(),
        };
        self.tok
            .1
            .error(&format!("Syntax error: mismatched input '{found}' expecting {expecting}"))
    }

    fn expect(&mut self, text: &str) -> ParseResult<()> {
        if self.is_symbol(text) {
            self.next_token()
        } else {
            Err(self.mismatched(&format!("'{text}'")))
        }
    }

    fn check_optional_syntax(&self) -> ParseResult<()> {
        if self.options.enable_optional_syntax {
            Ok(())
        } else {
            Err(self.tok.1.error(&format!(
                "Syntax error: unsupported syntax '{}'",
                self.tok.1.text()
            )))
        }
    }

    fn new_id(&mut self, offset: i32) -> ExprId {
        self.next_id += 1;
        self.positions.insert(self.next_id, offset);
        self.next_id
    }

    fn new_expr(&mut self, offset: i32, kind: ExprKind) -> Expr {
        let id = self.new_id(offset);
        Expr::new(id, kind)
    }

    fn call(&mut self, offset: i32, function: &str, args: Vec<Expr>) -> Expr {
        self.new_expr(
            offset,
            ExprKind::Call {
                function: function.into(),
                target: None,
                args,
            },
        )
    }

    // Skips to the next `,` or to the closing delimiter of the enclosing
    // list so that later elements are still checked for errors.
    fn recover(&mut self, e: CelError) -> ParseResult<()> {
        self.record(e.clone());
        if self.limit_reached() {
            return Err(e);
        }
        let mut depth = 0usize;
        loop {
            match self.tok.0 {
                TokenKind::Eof => return Ok(()),
                TokenKind::Symbol => match self.tok.1.text() {
                    "(" | "[" | "[?" | "{" => depth += 1,
                    ")" | "]" | "}" | "," if depth == 0 => return Ok(()),
                    ")" | "]" | "}" => depth -= 1,
                    _ => (),
                },
                _ => (),
            }
            self.next_token()?;
        }
    }

    // Parses `item (',' item)*` followed by `close`.
    fn parse_sequence<T>(
        &mut self,
        close: &str,
        trailing_comma: bool,
        mut item: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = vec![];
        if self.is_symbol(close) {
            self.next_token()?;
            return Ok(items);
        }
        loop {
            match item(self) {
                Ok(i) => items.push(i),
                Err(e) => self.recover(e)?,
            }
            if !self.is_symbol(",") {
                break;
            }
            self.next_token()?;
            if trailing_comma && self.is_symbol(close) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.depth += 1;
        let r = if self.depth > self.options.max_recursion_depth {
            Err(self.tok.1.error(&format!(
                "expression recursion limit exceeded: {}",
                self.options.max_recursion_depth
            )))
        } else {
            self.parse_conditional()
        };
        self.depth -= 1;
        r
    }

    fn parse_conditional(&mut self) -> ParseResult<Expr> {
        let cond = self.parse_or()?;
        if !self.is_symbol("?") {
            return Ok(cond);
        }
        let offset = self.offset();
        self.next_token()?;
        let then = self.parse_or()?;
        self.expect(":")?;
        let otherwise = self.parse_expr()?;
        Ok(self.call(offset, "_?_:_", vec![cond, then, otherwise]))
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_and()?;
        while self.is_symbol("||") {
            let offset = self.offset();
            self.next_token()?;
            let right = self.parse_and()?;
            expr = self.call(offset, "_||_", vec![expr, right]);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_relation()?;
        while self.is_symbol("&&") {
            let offset = self.offset();
            self.next_token()?;
            let right = self.parse_relation()?;
            expr = self.call(offset, "_&&_", vec![expr, right]);
        }
        Ok(expr)
    }

    fn parse_relation(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = if self.is_ident("in") {
                "@in"
            } else if self.tok.0 == TokenKind::Symbol {
                match self.tok.1.text() {
                    "<" => "_<_",
                    "<=" => "_<=_",
                    ">" => "_>_",
                    ">=" => "_>=_",
                    "==" => "_==_",
                    "!=" => "_!=_",
                    _ => return Ok(expr),
                }
            } else {
                return Ok(expr);
            };
            let offset = self.offset();
            self.next_token()?;
            let right = self.parse_additive()?;
            expr = self.call(offset, op, vec![expr, right]);
        }
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.tok.1.text() {
                "+" if self.tok.0 == TokenKind::Symbol => "_+_",
                "-" if self.tok.0 == TokenKind::Symbol => "_-_",
                _ => return Ok(expr),
            };
            let offset = self.offset();
            self.next_token()?;
            let right = self.parse_multiplicative()?;
            expr = self.call(offset, op, vec![expr, right]);
        }
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.tok.1.text() {
                "*" if self.tok.0 == TokenKind::Symbol => "_*_",
                "/" if self.tok.0 == TokenKind::Symbol => "_/_",
                "%" if self.tok.0 == TokenKind::Symbol => "_%_",
                _ => return Ok(expr),
            };
            let offset = self.offset();
            self.next_token()?;
            let right = self.parse_unary()?;
            expr = self.call(offset, op, vec![expr, right]);
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let offset = self.offset();
        if self.is_symbol("!") {
            let mut count = 0;
            while self.is_symbol("!") {
                count += 1;
                self.next_token()?;
            }
            let operand = self.parse_member()?;
            return Ok(match count % 2 {
                0 => operand,
                _ => self.call(offset, "!_", vec![operand]),
            });
        }
        if !self.is_symbol("-") {
            return self.parse_member();
        }

        let mut count = 0;
        let mut literal_offset = offset;
        while self.is_symbol("-") {
            count += 1;
            literal_offset = self.offset();
            self.next_token()?;
        }
        let operand = if matches!(self.tok.0, TokenKind::Int | TokenKind::Double) {
            // The last minus belongs to the literal.
            count -= 1;
            let literal = self.parse_number(literal_offset, true)?;
            self.parse_member_tail(literal)?
        } else {
            self.parse_member()?
        };
        Ok(match count % 2 {
            0 => operand,
            _ => self.call(offset, "-_", vec![operand]),
        })
    }

    fn parse_member(&mut self) -> ParseResult<Expr> {
        let primary = self.parse_primary()?;
        self.parse_member_tail(primary)
    }

    fn parse_member_tail(&mut self, mut expr: Expr) -> ParseResult<Expr> {
        loop {
            if self.tok.0 != TokenKind::Symbol {
                return Ok(expr);
            }
            let offset = self.offset();
            match self.tok.1.text() {
                "." => {
                    self.next_token()?;
                    let name_span = self.tok.1.clone();
                    let name = self.parse_ident_name()?;
                    if self.is_symbol("(") {
                        self.next_token()?;
                        let args = self.parse_sequence(")", false, Self::parse_expr)?;
                        expr = self.member_call(offset, &name_span, &name, expr, args)?;
                    } else {
                        expr = self.new_expr(
                            offset,
                            ExprKind::Select {
                                operand: Box::new(expr),
                                field: name.into(),
                                test_only: false,
                            },
                        );
                    }
                }
                ".?" => {
                    self.check_optional_syntax()?;
                    self.next_token()?;
                    let field_offset = self.offset();
                    let name = self.parse_ident_name()?;
                    let field = self.new_expr(field_offset, ExprKind::Const(Constant::String(name.into())));
                    expr = self.call(offset, "_?._", vec![expr, field]);
                }
                "[" | "[?" => {
                    let optional = self.tok.1.text() == "[?";
                    if optional {
                        self.check_optional_syntax()?;
                    }
                    self.next_token()?;
                    let index = self.parse_expr()?;
                    self.expect("]")?;
                    let op = if optional { "_[?_]" } else { "_[_]" };
                    expr = self.call(offset, op, vec![expr, index]);
                }
                "{" => {
                    let Some(type_name) = expr.qualified_name() else {
                        return Ok(expr);
                    };
                    let positions = &mut self.positions;
                    expr.walk(&mut |e| {
                        positions.remove(&e.id);
                    });
                    self.next_token()?;
                    let fields = self.parse_sequence("}", true, Self::parse_field_init)?;
                    expr = self.new_expr(
                        offset,
                        ExprKind::Struct {
                            type_name: type_name.into(),
                            fields,
                        },
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let offset = self.offset();
        match self.tok.0 {
            TokenKind::Int | TokenKind::Uint | TokenKind::Double => self.parse_number(offset, false),
            TokenKind::String | TokenKind::Bytes => self.parse_string(offset),
            TokenKind::Ident => {
                let constant = match self.tok.1.text() {
                    "true" => Constant::Bool(true),
                    "false" => Constant::Bool(false),
                    "null" => Constant::Null,
                    _ => return self.parse_ident_or_call(offset, false),
                };
                self.next_token()?;
                Ok(self.new_expr(offset, ExprKind::Const(constant)))
            }
            TokenKind::Symbol => match self.tok.1.text() {
                "." => {
                    self.next_token()?;
                    self.parse_ident_or_call(offset, true)
                }
                "(" => {
                    self.next_token()?;
                    let expr = self.parse_expr()?;
                    self.expect(")")?;
                    Ok(expr)
                }
                "[" | "[?" => {
                    // `[?` also opens a list whose first element is optional.
                    let mut first_optional = self.tok.1.text() == "[?";
                    if first_optional {
                        self.check_optional_syntax()?;
                    }
                    self.next_token()?;
                    if first_optional && self.is_symbol("]") {
                        return Err(self.mismatched(PRIMARY_START));
                    }
                    let items = self.parse_sequence("]", true, |p| {
                        if core::mem::take(&mut first_optional) {
                            return Ok((p.parse_expr()?, true));
                        }
                        p.parse_list_element()
                    })?;
                    let mut elements = Vec::with_capacity(items.len());
                    let mut optional_indices = vec![];
                    for (idx, (e, optional)) in items.into_iter().enumerate() {
                        if optional {
                            optional_indices.push(idx);
                        }
                        elements.push(e);
                    }
                    Ok(self.new_expr(
                        offset,
                        ExprKind::List {
                            elements,
                            optional_indices,
                        },
                    ))
                }
                "{" => {
                    self.next_token()?;
                    let entries = self.parse_sequence("}", true, Self::parse_map_entry)?;
                    Ok(self.new_expr(offset, ExprKind::Map { entries }))
                }
                _ => Err(self.mismatched(PRIMARY_START)),
            },
            TokenKind::Eof => Err(self.mismatched(PRIMARY_START)),
        }
    }

    fn parse_ident_name(&mut self) -> ParseResult<String> {
        if self.tok.0 != TokenKind::Ident {
            return Err(self.mismatched("IDENTIFIER"));
        }
        let name = self.tok.1.text().to_string();
        if RESERVED_WORDS.contains(&name.as_str()) {
            return Err(self.tok.1.error(&format!("reserved identifier: {name}")));
        }
        self.next_token()?;
        Ok(name)
    }

    fn parse_ident_or_call(&mut self, offset: i32, leading_dot: bool) -> ParseResult<Expr> {
        let name_span = self.tok.1.clone();
        let name = self.parse_ident_name()?;
        let name = if leading_dot { format!(".{name}") } else { name };
        if !self.is_symbol("(") {
            return Ok(self.new_expr(offset, ExprKind::Ident(name.into())));
        }
        self.next_token()?;
        let args = self.parse_sequence(")", false, Self::parse_expr)?;
        if let Some(m) = find_macro(&name, args.len(), false) {
            return self.expand_macro(&name_span, m, None, args);
        }
        Ok(self.call(offset, &name, args))
    }

    fn member_call(
        &mut self,
        offset: i32,
        name_span: &Span,
        name: &str,
        target: Expr,
        args: Vec<Expr>,
    ) -> ParseResult<Expr> {
        if let Some(m) = find_macro(name, args.len(), true) {
            return self.expand_macro(name_span, m, Some(target), args);
        }
        Ok(self.new_expr(
            offset,
            ExprKind::Call {
                function: name.into(),
                target: Some(Box::new(target)),
                args,
            },
        ))
    }

    fn expand_macro(
        &mut self,
        span: &Span,
        m: &Macro,
        target: Option<Expr>,
        args: Vec<Expr>,
    ) -> ParseResult<Expr> {
        let original = match self.options.track_macro_calls {
            true => Some((target.clone(), args.clone())),
            false => None,
        };
        let mut factory = ExprFactory::new(&mut self.next_id, &mut self.positions, span.offset());
        let expanded = (m.expander)(&mut factory, target, args).map_err(|msg| span.error(&msg))?;

        if let Some((target, args)) = original {
            let call = Expr::new(
                expanded.id,
                ExprKind::Call {
                    function: m.name.into(),
                    target: target.map(Box::new),
                    args,
                },
            );
            self.macro_calls.insert(expanded.id, call);
        }
        Ok(expanded)
    }

    fn parse_number(&mut self, offset: i32, negative: bool) -> ParseResult<Expr> {
        let span = self.tok.1.clone();
        let text = span.text();
        let sign = if negative { "-" } else { "" };
        let hex = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"));

        let constant = match self.tok.0 {
            TokenKind::Int => {
                let parsed = match hex {
                    Some(h) => i64::from_str_radix(&format!("{sign}{h}"), 16),
                    None => format!("{sign}{text}").parse::<i64>(),
                };
                Constant::Int(parsed.map_err(|_| span.error("invalid int literal"))?)
            }
            TokenKind::Uint => {
                let digits = text.trim_end_matches(['u', 'U']);
                let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
                    Some(h) => u64::from_str_radix(h, 16),
                    None => digits.parse::<u64>(),
                };
                Constant::Uint(parsed.map_err(|_| span.error("invalid uint literal"))?)
            }
            _ => {
                let parsed = format!("{sign}{text}").parse::<f64>();
                Constant::Double(parsed.map_err(|_| span.error("invalid double literal"))?)
            }
        };
        self.next_token()?;
        Ok(self.new_expr(offset, ExprKind::Const(constant)))
    }

    fn parse_string(&mut self, offset: i32) -> ParseResult<Expr> {
        let span = self.tok.1.clone();
        let is_bytes = self.tok.0 == TokenKind::Bytes;
        let bytes = unescape(span.text(), is_bytes).map_err(|msg| span.error(&msg))?;
        let constant = if is_bytes {
            Constant::Bytes(bytes.into())
        } else {
            let s = String::from_utf8(bytes)
                .map_err(|_| span.error("invalid UTF-8 in string literal"))?;
            Constant::String(s.into())
        };
        self.next_token()?;
        Ok(self.new_expr(offset, ExprKind::Const(constant)))
    }

    fn parse_optional_marker(&mut self) -> ParseResult<bool> {
        if !self.is_symbol("?") {
            return Ok(false);
        }
        self.check_optional_syntax()?;
        self.next_token()?;
        Ok(true)
    }

    fn parse_list_element(&mut self) -> ParseResult<(Expr, bool)> {
        let optional = self.parse_optional_marker()?;
        Ok((self.parse_expr()?, optional))
    }

    fn parse_map_entry(&mut self) -> ParseResult<MapEntry> {
        let optional = self.parse_optional_marker()?;
        let key = self.parse_expr()?;
        let offset = self.offset();
        self.expect(":")?;
        let value = self.parse_expr()?;
        Ok(MapEntry {
            id: self.new_id(offset),
            key,
            value,
            optional,
        })
    }

    fn parse_field_init(&mut self) -> ParseResult<FieldInit> {
        let optional = self.parse_optional_marker()?;
        let field = self.parse_ident_name()?;
        let offset = self.offset();
        self.expect(":")?;
        let value = self.parse_expr()?;
        Ok(FieldInit {
            id: self.new_id(offset),
            field: field.into(),
            value,
            optional,
        })
    }
}

/// Parses an expression with the default options.
pub fn parse(text: &str) -> Result<Ast, Issues> {
    parse_with_options(text, &ParserOptions::default())
}

pub fn parse_with_options(text: &str, options: &ParserOptions) -> Result<Ast, Issues> {
    let source = Source::new("<input>".to_string(), text.to_string());
    Parser::new(&source, options.clone()).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_name(e: &Expr) -> &str {
        match &e.kind {
            ExprKind::Call { function, .. } => &**function,
            _ => "",
        }
    }

    #[test]
    fn precedence() {
        let ast = parse("a || b && c == 1 + 2 * 3").unwrap();
        assert_eq!(call_name(&ast.expr), "_||_");
        let ExprKind::Call { args, .. } = &ast.expr.kind else {
            panic!("expected call");
        };
        assert_eq!(call_name(&args[1]), "_&&_");
    }

    #[test]
    fn negative_literals_fold() {
        let ast = parse("-9223372036854775808").unwrap();
        assert_eq!(ast.expr.kind, ExprKind::Const(Constant::Int(i64::MIN)));
        let ast = parse("--1").unwrap();
        assert_eq!(call_name(&ast.expr), "-_");
        let ast = parse("!!a").unwrap();
        assert!(ast.expr.is_ident("a"));
    }

    #[test]
    fn trailing_operator_reports_end_of_input() {
        let issues = parse("1 +").unwrap_err();
        assert_eq!(issues.len(), 1);
        let e = &issues.errors()[0];
        assert_eq!((e.location.line, e.location.column), (1, 4));
        assert!(e.message.contains("mismatched input '<EOF>'"));
    }

    #[test]
    fn errors_in_separate_elements_are_all_reported() {
        let issues = parse("[1 +, 2 *, 3]").unwrap_err();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn max_errors() {
        let options = ParserOptions {
            max_errors: 1,
            ..Default::default()
        };
        let issues = parse_with_options("[1 +, 2 *, 3 /]", &options).unwrap_err();
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn recursion_limit() {
        let options = ParserOptions {
            max_recursion_depth: 10,
            ..Default::default()
        };
        let deep = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        let issues = parse_with_options(&deep, &options).unwrap_err();
        assert!(issues.errors()[0].message.contains("recursion limit"));
        assert!(parse(&deep).is_ok());
    }

    #[test]
    fn ids_are_unique() {
        let ast = parse("m.optMap(v, v + 1).orValue(0) == [1, 2].map(x, x * 2)[0]").unwrap();
        let mut seen = std::collections::BTreeSet::new();
        ast.expr.walk(&mut |e| assert!(seen.insert(e.id), "duplicate id {}", e.id));
        assert_eq!(ast.source_info.macro_calls.len(), 2);
    }

    #[test]
    fn struct_literals() {
        let ast = parse(".pkg.Msg{f: 1, ?g: x}").unwrap();
        let ExprKind::Struct { type_name, fields } = &ast.expr.kind else {
            panic!("expected struct");
        };
        assert_eq!(&**type_name, ".pkg.Msg");
        assert!(fields[1].optional);
        assert_eq!(ast.source_info.positions.len(), 5);
    }

    #[test]
    fn reserved_words() {
        let issues = parse("while").unwrap_err();
        assert!(issues.errors()[0].message.contains("reserved identifier"));
    }

    #[test]
    fn optional_syntax_can_be_disabled() {
        let options = ParserOptions {
            enable_optional_syntax: false,
            ..Default::default()
        };
        assert!(parse_with_options("a.?b", &options).is_err());
        assert!(parse("a.?b").is_ok());
    }
}
