//! Expression parser
//!
//! Parses rule expressions into Expression AST nodes.
//!
//! Supported syntax (lowest precedence first):
//! - Logical: `or` / `||`, `and` / `&&`, prefix `not`
//! - Keyword operators: `in`, `not in`, `contains`, `starts_with`, `ends_with`, `matches`
//! - Comparison: `==`, `!=`, `<`, `<=`, `>`, `>=`
//! - Arithmetic: `+`, `-`, `*`, `/`, `%`
//! - Unary: `!`, `-`
//! - Field access: `stats.finish_reason`, `stats['downloader/response_count']`, `codes[0]`
//! - Literals: `42`, `0.5`, `'text'`, `"text"`, `true`, `false`, `null`
//!   (`True`, `False` and `None` are accepted too), lists `[1, 2]`
//! - Parentheses for grouping
//!
//! Binary operators are found by scanning right to left at the top level
//! (outside quotes and brackets) so each level stays left-associative.

use crate::error::{ParseError, Result};
use vigil_core::ast::{Expression, Operator, UnaryOperator};
use vigil_core::Value;

/// Expression parser
pub struct ExpressionParser;

/// Bytes that, directly before a symbol, make it the tail of a longer operator
const CONFLICT_BEFORE: &[u8] = b"=!<>&|";
/// Bytes that, directly after a symbol, make it the head of a longer operator
const CONFLICT_AFTER: &[u8] = b"=&|";
/// A `+`/`-` whose left side ends with one of these is a sign, not an operator
const SIGN_CONTEXT: &[u8] = b"+-*/%=!<>&|([,";

impl ExpressionParser {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> Result<Expression> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Empty expression".to_string()));
        }

        // Validates quotes and brackets once for the whole input
        Self::top_level_mask(input)?;
        Self::parse_or(input)
    }

    fn parse_or(input: &str) -> Result<Expression> {
        if let Some((left, op, right)) = Self::split_binary(input, &["||"], &["or"])? {
            return Ok(Expression::binary(
                Self::parse_or(left)?,
                Self::parse_operator(op)?,
                Self::parse_and(right)?,
            ));
        }
        Self::parse_and(input)
    }

    fn parse_and(input: &str) -> Result<Expression> {
        if let Some((left, op, right)) = Self::split_binary(input, &["&&"], &["and"])? {
            return Ok(Expression::binary(
                Self::parse_and(left)?,
                Self::parse_operator(op)?,
                Self::parse_not(right)?,
            ));
        }
        Self::parse_not(input)
    }

    /// Prefix `not` binds looser than comparisons: `not a == b` is `not (a == b)`
    fn parse_not(input: &str) -> Result<Expression> {
        let input = input.trim();
        let bytes = input.as_bytes();
        if bytes.starts_with(b"not") && (bytes.len() == 3 || !Self::is_word_byte(bytes[3])) {
            return Ok(Expression::unary(
                UnaryOperator::Not,
                Self::parse_not(Self::operand(&input[3..])?)?,
            ));
        }
        Self::parse_keyword(input)
    }

    fn parse_keyword(input: &str) -> Result<Expression> {
        let keywords = ["in", "contains", "starts_with", "ends_with", "matches"];
        if let Some((left, op, right)) = Self::split_binary(input, &[], &keywords)? {
            return Ok(Expression::binary(
                Self::parse_keyword(left)?,
                Self::parse_operator(op)?,
                Self::parse_comparison(right)?,
            ));
        }
        Self::parse_comparison(input)
    }

    fn parse_comparison(input: &str) -> Result<Expression> {
        let symbols = ["==", "!=", "<=", ">=", "<", ">"];
        if let Some((left, op, right)) = Self::split_binary(input, &symbols, &[])? {
            return Ok(Expression::binary(
                Self::parse_comparison(left)?,
                Self::parse_operator(op)?,
                Self::parse_additive(right)?,
            ));
        }
        Self::parse_additive(input)
    }

    fn parse_additive(input: &str) -> Result<Expression> {
        if let Some((left, op, right)) = Self::split_binary(input, &["+", "-"], &[])? {
            return Ok(Expression::binary(
                Self::parse_additive(left)?,
                Self::parse_operator(op)?,
                Self::parse_multiplicative(right)?,
            ));
        }
        Self::parse_multiplicative(input)
    }

    fn parse_multiplicative(input: &str) -> Result<Expression> {
        if let Some((left, op, right)) = Self::split_binary(input, &["*", "/", "%"], &[])? {
            return Ok(Expression::binary(
                Self::parse_multiplicative(left)?,
                Self::parse_operator(op)?,
                Self::parse_primary(right)?,
            ));
        }
        Self::parse_primary(input)
    }

    /// Parse a primary expression
    fn parse_primary(input: &str) -> Result<Expression> {
        let input = Self::operand(input)?;

        if let Some(num) = Self::parse_number(input) {
            return Ok(Expression::literal(Value::Number(num)));
        }

        // Check for unary operators
        if let Some(rest) = input.strip_prefix('!') {
            return Ok(Expression::unary(
                UnaryOperator::Not,
                Self::parse_primary(rest)?,
            ));
        }
        if let Some(rest) = input.strip_prefix('-') {
            return Ok(Expression::unary(
                UnaryOperator::Negate,
                Self::parse_primary(rest)?,
            ));
        }

        // Check for parentheses
        if input.starts_with('(') {
            let inner = Self::enclosed(input)?;
            return Self::parse_or(Self::operand(inner)?);
        }

        // Check for list literals
        if input.starts_with('[') {
            let inner = Self::enclosed(input)?;
            return Self::parse_list(inner);
        }

        // Check for string literals
        if input.starts_with('\'') || input.starts_with('"') {
            let inner = Self::enclosed(input)?;
            return Ok(Expression::literal(Value::String(inner.to_string())));
        }

        match input {
            "true" | "True" => return Ok(Expression::literal(Value::Bool(true))),
            "false" | "False" => return Ok(Expression::literal(Value::Bool(false))),
            "null" | "None" => return Ok(Expression::literal(Value::Null)),
            _ => {}
        }

        Ok(Expression::field_access(Self::parse_path(input)?))
    }

    fn parse_list(inner: &str) -> Result<Expression> {
        let inner = inner.trim();
        if inner.is_empty() {
            return Ok(Expression::List(Vec::new()));
        }

        let mask = Self::top_level_mask(inner)?;
        let mut items = Vec::new();
        let mut start = 0;
        for (i, &b) in inner.as_bytes().iter().enumerate() {
            if b == b',' && mask[i] {
                items.push(Self::parse_or(Self::operand(&inner[start..i])?)?);
                start = i + 1;
            }
        }

        // A trailing comma is allowed
        let last = inner[start..].trim();
        if !last.is_empty() {
            items.push(Self::parse_or(last)?);
        }

        Ok(Expression::List(items))
    }

    /// Parse a field path such as `stats['log_count/ERROR']` or `stats.memusage.max`
    fn parse_path(input: &str) -> Result<Vec<String>> {
        let invalid = || ParseError::InvalidExpression(format!("Cannot parse: {}", input));
        let chars: Vec<char> = input.chars().collect();
        let mut pos = 0;

        let first = Self::read_identifier(&chars, &mut pos);
        if first.is_empty() || first.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let mut segments = vec![first];

        while pos < chars.len() {
            match chars[pos] {
                '.' => {
                    pos += 1;
                    let segment = Self::read_identifier(&chars, &mut pos);
                    if segment.is_empty() {
                        return Err(invalid());
                    }
                    segments.push(segment);
                }
                '[' => {
                    pos += 1;
                    Self::skip_whitespace(&chars, &mut pos);
                    let segment = match chars.get(pos) {
                        Some(&quote @ ('\'' | '"')) => {
                            pos += 1;
                            let start = pos;
                            while pos < chars.len() && chars[pos] != quote {
                                pos += 1;
                            }
                            if pos >= chars.len() {
                                return Err(invalid());
                            }
                            let segment: String = chars[start..pos].iter().collect();
                            pos += 1;
                            segment
                        }
                        _ => {
                            let start = pos;
                            while pos < chars.len() && chars[pos].is_ascii_digit() {
                                pos += 1;
                            }
                            if start == pos {
                                return Err(invalid());
                            }
                            chars[start..pos].iter().collect()
                        }
                    };
                    Self::skip_whitespace(&chars, &mut pos);
                    if chars.get(pos) != Some(&']') {
                        return Err(invalid());
                    }
                    pos += 1;
                    segments.push(segment);
                }
                _ => return Err(invalid()),
            }
        }

        Ok(segments)
    }

    fn read_identifier(chars: &[char], pos: &mut usize) -> String {
        let start = *pos;
        while *pos < chars.len() && (chars[*pos].is_alphanumeric() || chars[*pos] == '_') {
            *pos += 1;
        }
        chars[start..*pos].iter().collect()
    }

    fn skip_whitespace(chars: &[char], pos: &mut usize) {
        while *pos < chars.len() && chars[*pos].is_whitespace() {
            *pos += 1;
        }
    }

    /// Numbers start with a digit or a dot, optionally signed; `inf`/`nan` are not numbers
    fn parse_number(input: &str) -> Option<f64> {
        let unsigned = input.strip_prefix('-').unwrap_or(input);
        if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            return None;
        }
        input.parse::<f64>().ok()
    }

    /// Find the rightmost top-level occurrence of one of the operators
    ///
    /// Returns the trimmed left side, the operator text and the trimmed right side.
    /// Occurrences with an empty left side are unary and skipped.
    fn split_binary<'a>(
        input: &'a str,
        symbols: &[&'static str],
        keywords: &[&'static str],
    ) -> Result<Option<(&'a str, &'static str, &'a str)>> {
        let mask = Self::top_level_mask(input)?;
        let bytes = input.as_bytes();

        // Scan from right to left to handle left-to-right associativity
        for i in (0..bytes.len()).rev() {
            if !mask[i] {
                continue;
            }

            for &op in symbols {
                if !Self::symbol_at(bytes, i, op) {
                    continue;
                }
                let left = input[..i].trim();
                if left.is_empty() || ((op == "+" || op == "-") && Self::is_sign(left)) {
                    continue;
                }
                return Ok(Some((left, op, Self::operand(&input[i + op.len()..])?)));
            }

            for &word in keywords {
                if !Self::keyword_at(bytes, i, word) {
                    continue;
                }
                let mut left = input[..i].trim_end();
                let mut op = word;
                if word == "in" {
                    if let Some(rest) = Self::strip_trailing_not(left) {
                        left = rest;
                        op = "not in";
                    }
                }
                let left = left.trim();
                if left.is_empty() {
                    continue;
                }
                return Ok(Some((left, op, Self::operand(&input[i + word.len()..])?)));
            }
        }

        Ok(None)
    }

    fn symbol_at(bytes: &[u8], i: usize, op: &str) -> bool {
        let end = i + op.len();
        bytes[i..].starts_with(op.as_bytes())
            && (i == 0 || !CONFLICT_BEFORE.contains(&bytes[i - 1]))
            && (end >= bytes.len() || !CONFLICT_AFTER.contains(&bytes[end]))
    }

    fn keyword_at(bytes: &[u8], i: usize, word: &str) -> bool {
        let end = i + word.len();
        i > 0
            && end < bytes.len()
            && bytes[i..].starts_with(word.as_bytes())
            && !Self::is_word_byte(bytes[i - 1])
            && !Self::is_word_byte(bytes[end])
    }

    /// `x not in y`: peel the `not` off the left side of `in`
    fn strip_trailing_not(left: &str) -> Option<&str> {
        let rest = left.strip_suffix("not")?;
        match rest.as_bytes().last() {
            Some(&b) if Self::is_word_byte(b) => None,
            _ => Some(rest),
        }
    }

    /// True when a `+`/`-` following `left` is a sign rather than a binary operator
    fn is_sign(left: &str) -> bool {
        let Some(&last) = left.as_bytes().last() else {
            return true;
        };
        if SIGN_CONTEXT.contains(&last) {
            return true;
        }

        // Exponent of a float literal such as `1e-5`
        if last == b'e' || last == b'E' {
            let token = left
                .rsplit(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '_'))
                .next()
                .unwrap_or("");
            let mantissa = &token[..token.len() - 1];
            return !mantissa.is_empty()
                && mantissa.starts_with(|c: char| c.is_ascii_digit() || c == '.')
                && mantissa.bytes().all(|b| b.is_ascii_digit() || b == b'.');
        }

        false
    }

    fn is_word_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b >= 0x80
    }

    /// Marks the byte positions that sit outside any quote or bracket
    fn top_level_mask(input: &str) -> Result<Vec<bool>> {
        let bytes = input.as_bytes();
        let mut mask = vec![false; bytes.len()];
        let mut stack: Vec<u8> = Vec::new();
        let mut quote: Option<u8> = None;

        for (i, &b) in bytes.iter().enumerate() {
            if let Some(q) = quote {
                if b == q {
                    quote = None;
                }
                continue;
            }

            mask[i] = stack.is_empty();
            match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => stack.push(b')'),
                b'[' => stack.push(b']'),
                b')' | b']' => {
                    if stack.pop() != Some(b) {
                        return Err(ParseError::InvalidExpression(format!(
                            "Unbalanced '{}' in: {}",
                            b as char, input
                        )));
                    }
                }
                _ => {}
            }
        }

        if quote.is_some() {
            return Err(ParseError::InvalidExpression(format!(
                "Unterminated string literal in: {}",
                input
            )));
        }
        if !stack.is_empty() {
            return Err(ParseError::InvalidExpression(format!(
                "Unclosed bracket in: {}",
                input
            )));
        }

        Ok(mask)
    }

    /// Contents between an opening quote/bracket at the start and its match,
    /// which must be the last character
    fn enclosed(input: &str) -> Result<&str> {
        let bytes = input.as_bytes();
        let opener = bytes[0];
        let close = match opener {
            b'(' | b'[' => Self::matching_bracket(bytes),
            _ => bytes[1..].iter().position(|&b| b == opener).map(|p| p + 1),
        };

        match close {
            Some(end) if end == bytes.len() - 1 => Ok(&input[1..end]),
            _ => Err(ParseError::InvalidExpression(format!(
                "Unexpected input after '{}' in: {}",
                opener as char, input
            ))),
        }
    }

    fn matching_bracket(bytes: &[u8]) -> Option<usize> {
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        for (i, &b) in bytes.iter().enumerate() {
            if let Some(q) = quote {
                if b == q {
                    quote = None;
                }
                continue;
            }
            match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' | b'[' => depth += 1,
                b')' | b']' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Trim an operand, rejecting empty ones
    fn operand(input: &str) -> Result<&str> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Missing operand".to_string()));
        }
        Ok(input)
    }

    /// Parse an operator string
    fn parse_operator(op: &str) -> Result<Operator> {
        match op {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::Le),
            ">=" => Ok(Operator::Ge),
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Sub),
            "*" => Ok(Operator::Mul),
            "/" => Ok(Operator::Div),
            "%" => Ok(Operator::Mod),
            "&&" | "and" => Ok(Operator::And),
            "||" | "or" => Ok(Operator::Or),
            "contains" => Ok(Operator::Contains),
            "starts_with" => Ok(Operator::StartsWith),
            "ends_with" => Ok(Operator::EndsWith),
            "matches" => Ok(Operator::Regex),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            _ => Err(ParseError::InvalidOperator(op.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(segments: &[&str]) -> Expression {
        Expression::field_access(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_parse_number_literal() {
        let expr = ExpressionParser::parse("42").unwrap();
        assert_eq!(expr, Expression::literal(Value::Number(42.0)));

        let expr = ExpressionParser::parse("-0.5").unwrap();
        assert_eq!(expr, Expression::literal(Value::Number(-0.5)));

        let expr = ExpressionParser::parse("1e-3").unwrap();
        assert_eq!(expr, Expression::literal(Value::Number(0.001)));
    }

    #[test]
    fn test_parse_string_literals() {
        let expr = ExpressionParser::parse("'finished'").unwrap();
        assert_eq!(expr, Expression::literal("finished"));

        let expr = ExpressionParser::parse(r#""a == b""#).unwrap();
        assert_eq!(expr, Expression::literal("a == b"));
    }

    #[test]
    fn test_parse_keyword_literals() {
        assert_eq!(
            ExpressionParser::parse("True").unwrap(),
            Expression::literal(true)
        );
        assert_eq!(
            ExpressionParser::parse("None").unwrap(),
            Expression::literal(Value::Null)
        );
    }

    #[test]
    fn test_parse_dotted_and_bracket_access() {
        assert_eq!(
            ExpressionParser::parse("stats.finish_reason").unwrap(),
            field(&["stats", "finish_reason"])
        );
        assert_eq!(
            ExpressionParser::parse("stats['downloader/response_count']").unwrap(),
            field(&["stats", "downloader/response_count"])
        );
        assert_eq!(
            ExpressionParser::parse(r#"stats["memusage"].max"#).unwrap(),
            field(&["stats", "memusage", "max"])
        );
        assert_eq!(
            ExpressionParser::parse("codes[0]").unwrap(),
            field(&["codes", "0"])
        );
    }

    #[test]
    fn test_operator_inside_quotes_is_ignored() {
        let expr = ExpressionParser::parse("stats['log_count/ERROR'] == 0").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                field(&["stats", "log_count/ERROR"]),
                Operator::Eq,
                Expression::literal(0),
            )
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = ExpressionParser::parse("a or b and c").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                field(&["a"]),
                Operator::Or,
                Expression::binary(field(&["b"]), Operator::And, field(&["c"])),
            )
        );
    }

    #[test]
    fn test_symbolic_logical_operators() {
        let expr = ExpressionParser::parse("a && b || c").unwrap();
        assert!(matches!(
            expr,
            Expression::Binary {
                op: Operator::Or,
                ..
            }
        ));
    }

    #[test]
    fn test_arithmetic_precedence_and_associativity() {
        let expr = ExpressionParser::parse("a - b - c * 2").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                Expression::binary(field(&["a"]), Operator::Sub, field(&["b"])),
                Operator::Sub,
                Expression::binary(field(&["c"]), Operator::Mul, Expression::literal(2)),
            )
        );
    }

    #[test]
    fn test_unary_minus_after_operator() {
        let expr = ExpressionParser::parse("a * -b").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                field(&["a"]),
                Operator::Mul,
                Expression::unary(UnaryOperator::Negate, field(&["b"])),
            )
        );
    }

    #[test]
    fn test_not_in_and_prefix_not() {
        let expr = ExpressionParser::parse("stats.finish_reason not in ['failed']").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                field(&["stats", "finish_reason"]),
                Operator::NotIn,
                Expression::List(vec![Expression::literal("failed")]),
            )
        );

        let expr = ExpressionParser::parse("not a == b").unwrap();
        assert_eq!(
            expr,
            Expression::unary(
                UnaryOperator::Not,
                Expression::binary(field(&["a"]), Operator::Eq, field(&["b"])),
            )
        );
    }

    #[test]
    fn test_keyword_inside_identifier_is_not_operator() {
        let expr = ExpressionParser::parse("stats.in_progress").unwrap();
        assert_eq!(expr, field(&["stats", "in_progress"]));
    }

    #[test]
    fn test_string_keyword_operators() {
        for (source, op) in [
            ("url contains 'shop'", Operator::Contains),
            ("url starts_with 'https'", Operator::StartsWith),
            ("url ends_with '.html'", Operator::EndsWith),
            ("url matches '^https?://'", Operator::Regex),
        ] {
            match ExpressionParser::parse(source).unwrap() {
                Expression::Binary { op: parsed, .. } => assert_eq!(parsed, op, "{}", source),
                other => panic!("Expected Binary for {}, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_parentheses_and_lists() {
        let expr = ExpressionParser::parse("(a + 1) * 2").unwrap();
        assert!(matches!(
            expr,
            Expression::Binary {
                op: Operator::Mul,
                ..
            }
        ));

        let expr = ExpressionParser::parse("[1, 'two', [3]]").unwrap();
        match expr {
            Expression::List(items) => assert_eq!(items.len(), 3),
            other => panic!("Expected List, got {:?}", other),
        }

        assert_eq!(
            ExpressionParser::parse("[]").unwrap(),
            Expression::List(vec![])
        );
    }

    #[test]
    fn test_syntax_errors() {
        for source in [
            "",
            "a ==",
            "== b",
            "stats['unterminated",
            "(a + b",
            "a + b)",
            "(a) (b)",
            "1abc",
            "a b",
            "not",
            "count(x)",
        ] {
            assert!(
                ExpressionParser::parse(source).is_err(),
                "expected error for {:?}",
                source
            );
        }
    }
}
