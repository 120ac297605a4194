//! JSONPath parser.

use crate::types::*;
use serde_json::{Number, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Expected root identifier '$' at start")]
    ExpectedRoot,
    #[error("Unexpected character: {0}")]
    UnexpectedChar(char),
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Invalid escape sequence")]
    InvalidEscape,
    #[error("Invalid number")]
    InvalidNumber,
    #[error("Unclosed string")]
    UnclosedString,
    #[error("Unclosed regular expression")]
    UnclosedRegExp,
    #[error("Invalid selector")]
    InvalidSelector,
}

struct ComparisonToken {
    operator: ComparisonOperator,
    len: usize,
}

/// JSONPath parser.
pub struct JsonPathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> JsonPathParser<'a> {
    /// Parse a complete JSONPath expression. Trailing input is an error.
    pub fn parse(input: &'a str) -> Result<JSONPath, ParseError> {
        let mut parser = Self { input, pos: 0 };
        parser.skip_whitespace();
        if parser.peek() != Some('$') {
            return Err(ParseError::ExpectedRoot);
        }
        parser.advance();
        let path = parser.parse_segments(false)?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(path),
            Some(c) => Err(ParseError::UnexpectedChar(c)),
        }
    }

    /// Segments after `$` or `@`. Inside filters whitespace may separate
    /// segments and the path ends at an operator or closing bracket.
    fn parse_segments(&mut self, in_filter: bool) -> Result<JSONPath, ParseError> {
        let mut segments = Vec::new();

        loop {
            if in_filter {
                self.skip_whitespace();
                if self.is_filter_path_terminator() {
                    break;
                }
            }
            match self.peek() {
                Some('.') => {
                    self.advance();
                    if self.peek() == Some('.') {
                        self.advance();
                        let selectors = self.parse_descendant_selectors()?;
                        segments.push(PathSegment::new(selectors, true));
                    } else if self.peek() == Some('*') {
                        self.advance();
                        segments.push(PathSegment::new(vec![Selector::Wildcard], false));
                    } else {
                        let name = self.parse_identifier()?;
                        if self.peek() == Some('(') {
                            // `.min()` and friends close the path.
                            self.advance();
                            self.skip_whitespace();
                            self.expect(')')?;
                            return Ok(JSONPath::new(segments).with_aggregate(name));
                        }
                        segments.push(PathSegment::new(vec![Selector::Name(name)], false));
                    }
                }
                Some('[') => {
                    let selectors = self.parse_bracket_selectors()?;
                    segments.push(PathSegment::new(selectors, false));
                }
                _ => break,
            }
        }

        Ok(JSONPath::new(segments))
    }

    fn parse_descendant_selectors(&mut self) -> Result<Vec<Selector>, ParseError> {
        match self.peek() {
            Some('*') => {
                self.advance();
                Ok(vec![Selector::Wildcard])
            }
            Some('[') => self.parse_bracket_selectors(),
            _ => Ok(vec![Selector::Name(self.parse_identifier()?)]),
        }
    }

    fn parse_bracket_selectors(&mut self) -> Result<Vec<Selector>, ParseError> {
        self.expect('[')?;
        let mut selectors = Vec::new();

        loop {
            self.skip_whitespace();
            selectors.push(self.parse_bracket_selector()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.advance(),
                Some(']') => {
                    self.advance();
                    break;
                }
                Some(c) => return Err(ParseError::UnexpectedChar(c)),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }

        Ok(selectors)
    }

    fn parse_bracket_selector(&mut self) -> Result<Selector, ParseError> {
        match self.peek() {
            Some('\'') | Some('"') => Ok(Selector::Name(self.parse_string()?)),
            Some('*') => {
                self.advance();
                Ok(Selector::Wildcard)
            }
            Some(':') | Some('-') | Some('0'..='9') => self.parse_index_or_slice(),
            Some('?') => {
                self.advance();
                self.skip_whitespace();
                Ok(Selector::Filter(self.parse_filter_expression()?))
            }
            None => Err(ParseError::UnexpectedEnd),
            _ => Err(ParseError::InvalidSelector),
        }
    }

    fn parse_index_or_slice(&mut self) -> Result<Selector, ParseError> {
        let start = self.parse_optional_index()?;
        self.skip_whitespace();

        if self.peek() != Some(':') {
            return start.map(Selector::Index).ok_or(ParseError::InvalidNumber);
        }
        self.advance();
        let end = self.parse_optional_index()?;
        self.skip_whitespace();
        let step = if self.peek() == Some(':') {
            self.advance();
            self.parse_optional_index()?
        } else {
            None
        };

        Ok(Selector::Slice { start, end, step })
    }

    fn parse_optional_index(&mut self) -> Result<Option<isize>, ParseError> {
        self.skip_whitespace();
        if matches!(self.peek(), Some('0'..='9') | Some('-')) {
            Ok(Some(self.parse_index()?))
        } else {
            Ok(None)
        }
    }

    fn parse_index(&mut self) -> Result<isize, ParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        self.input[start..self.pos]
            .parse::<isize>()
            .map_err(|_| ParseError::InvalidNumber)
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let start = self.pos;

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                self.advance();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => ParseError::UnexpectedChar(c),
                None => ParseError::UnexpectedEnd,
            });
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let quote = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        self.advance();

        let mut result = String::new();

        loop {
            match self.peek() {
                None => return Err(ParseError::UnclosedString),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('/') => result.push('/'),
                        Some('\\') => result.push('\\'),
                        Some('\'') => result.push('\''),
                        Some('"') => result.push('"'),
                        _ => return Err(ParseError::InvalidEscape),
                    }
                    self.advance();
                }
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }

        Ok(result)
    }

    /// `/body/flags`, kept verbatim including escapes.
    fn parse_regexp(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.expect('/')?;

        loop {
            match self.peek() {
                None => return Err(ParseError::UnclosedRegExp),
                Some('/') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    if self.is_at_end() {
                        return Err(ParseError::UnclosedRegExp);
                    }
                    self.advance();
                }
                Some(_) => self.advance(),
            }
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.advance();
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_filter_expression(&mut self) -> Result<FilterExpression, ParseError> {
        self.parse_logical_or_expression()
    }

    fn parse_logical_or_expression(&mut self) -> Result<FilterExpression, ParseError> {
        let mut left = self.parse_logical_and_expression()?;
        self.skip_whitespace();

        while self.peek_str("||") {
            self.advance_by(2);
            let right = self.parse_logical_and_expression()?;
            left = FilterExpression::Logical {
                operator: LogicalOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
            self.skip_whitespace();
        }

        Ok(left)
    }

    fn parse_logical_and_expression(&mut self) -> Result<FilterExpression, ParseError> {
        let mut left = self.parse_unary_expression()?;
        self.skip_whitespace();

        while self.peek_str("&&") {
            self.advance_by(2);
            let right = self.parse_unary_expression()?;
            left = FilterExpression::Logical {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
            self.skip_whitespace();
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<FilterExpression, ParseError> {
        self.skip_whitespace();

        if self.peek() == Some('!') {
            self.advance();
            let expr = self.parse_unary_expression()?;
            return Ok(FilterExpression::Negation(Box::new(expr)));
        }

        if self.peek() == Some('(') {
            self.advance();
            let expr = self.parse_filter_expression()?;
            self.skip_whitespace();
            self.expect(')')?;
            return Ok(FilterExpression::Paren(Box::new(expr)));
        }

        self.parse_primary_expression()
    }

    fn parse_primary_expression(&mut self) -> Result<FilterExpression, ParseError> {
        let left = self.parse_value_expression()?;
        self.skip_whitespace();

        if self.peek_str("=~") {
            self.advance_by(2);
            self.skip_whitespace();
            let pattern = self.parse_regexp()?;
            return Ok(FilterExpression::RegExp {
                value: left,
                pattern,
            });
        }

        if let Some(op) = self.peek_comparison_operator() {
            self.advance_by(op.len);
            let right = self.parse_value_expression()?;
            return Ok(FilterExpression::Comparison {
                operator: op.operator,
                left,
                right,
            });
        }

        match left {
            ValueExpression::Literal(_) => Err(ParseError::InvalidSelector),
            value => Ok(FilterExpression::Existence { value }),
        }
    }

    fn parse_value_expression(&mut self) -> Result<ValueExpression, ParseError> {
        self.skip_whitespace();

        match self.peek() {
            Some('@') => {
                self.advance();
                let path = self.parse_segments(true)?;
                if path.segments.is_empty() && path.aggregate.is_none() {
                    Ok(ValueExpression::Current)
                } else {
                    Ok(ValueExpression::Path(path))
                }
            }
            Some('$') => {
                self.advance();
                Ok(ValueExpression::Root(self.parse_segments(true)?))
            }
            Some('[') => self.parse_array_literal().map(ValueExpression::Literal),
            None => Err(ParseError::UnexpectedEnd),
            _ => self.parse_scalar_literal().map(ValueExpression::Literal),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Value, ParseError> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.advance();
            return Ok(Value::Array(items));
        }

        loop {
            self.skip_whitespace();
            items.push(self.parse_scalar_literal()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.advance(),
                Some(']') => {
                    self.advance();
                    break;
                }
                Some(c) => return Err(ParseError::UnexpectedChar(c)),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }

        Ok(Value::Array(items))
    }

    fn parse_scalar_literal(&mut self) -> Result<Value, ParseError> {
        match self.peek() {
            Some('\'') | Some('"') => return self.parse_string().map(Value::String),
            Some('0'..='9') | Some('-') => return self.parse_number().map(Value::Number),
            _ => {}
        }
        for (word, value) in [
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("null", Value::Null),
        ] {
            if self.peek_str(word) {
                self.advance_by(word.len());
                return Ok(value);
            }
        }
        Err(ParseError::InvalidSelector)
    }

    /// Integers stay integers; anything with a fraction or exponent is a
    /// float.
    fn parse_number(&mut self) -> Result<Number, ParseError> {
        let start = self.pos;

        if self.peek() == Some('-') {
            self.advance();
        }

        if !matches!(self.peek(), Some('0'..='9')) {
            return Err(ParseError::InvalidNumber);
        }
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }

        if self.peek() == Some('.') {
            self.advance();
            if !matches!(self.peek(), Some('0'..='9')) {
                return Err(ParseError::InvalidNumber);
            }
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if !matches!(self.peek(), Some('0'..='9')) {
                return Err(ParseError::InvalidNumber);
            }
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }

        self.input[start..self.pos]
            .parse::<Number>()
            .map_err(|_| ParseError::InvalidNumber)
    }

    fn is_filter_path_terminator(&self) -> bool {
        match self.peek() {
            None => true,
            Some(')') | Some(',') | Some(']') => true,
            Some('&') => self.peek_str("&&"),
            Some('|') => self.peek_str("||"),
            Some('=') => self.peek_str("==") || self.peek_str("=~"),
            Some('!') => self.peek_str("!="),
            Some('<') | Some('>') => true,
            _ => false,
        }
    }

    fn peek_comparison_operator(&self) -> Option<ComparisonToken> {
        let (operator, len) = if self.peek_str("==") {
            (ComparisonOperator::Equal, 2)
        } else if self.peek_str("!=") {
            (ComparisonOperator::NotEqual, 2)
        } else if self.peek_str("<=") {
            (ComparisonOperator::LessEqual, 2)
        } else if self.peek_str(">=") {
            (ComparisonOperator::GreaterEqual, 2)
        } else if self.peek_str("<") {
            (ComparisonOperator::Less, 1)
        } else if self.peek_str(">") {
            (ComparisonOperator::Greater, 1)
        } else {
            return None;
        };
        Some(ComparisonToken { operator, len })
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(ParseError::UnexpectedChar(c)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }
}
