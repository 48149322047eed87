use engine_value::{ConstValue, Name, Number, Value};

use super::Parser;
use crate::{
    lexer::TokenKind,
    types::{BaseType, ConstDirective, Directive, Type},
    Pos, Positioned, Result,
};

impl Parser<'_> {
    pub(super) fn parse_value(&mut self) -> Result<Positioned<Value>> {
        self.parse_value_inner(false)
    }

    pub(super) fn parse_const_value(&mut self) -> Result<Positioned<ConstValue>> {
        let value = self.parse_value_inner(true)?;
        let pos = value.pos;
        value
            .node
            .into_const()
            .map(|value| Positioned::new(value, pos))
            .ok_or_else(|| self.error("Variables are not allowed in constant values", pos))
    }

    fn parse_value_inner(&mut self, is_const: bool) -> Result<Positioned<Value>> {
        self.descend(|parser| parser.parse_value_node(is_const))
    }

    fn parse_value_node(&mut self, is_const: bool) -> Result<Positioned<Value>> {
        let pos = self.pos();

        let value = match self.peek_kind() {
            Some(TokenKind::VarSign) if !is_const => {
                self.bump()?;
                Value::Variable(self.parse_name()?.node)
            }
            Some(TokenKind::Int) => {
                let token = self.bump()?;
                let number = token
                    .raw
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("Int literal {} is out of range", token.raw), pos))?;
                Value::Number(Number::from(number))
            }
            Some(TokenKind::Float) => {
                let token = self.bump()?;
                let number = token
                    .raw
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .ok_or_else(|| self.error(format!("Float literal {} is out of range", token.raw), pos))?;
                Value::Number(number)
            }
            Some(TokenKind::String) => Value::String(self.bump()?.value.into_owned()),
            Some(TokenKind::True) => {
                self.bump()?;
                Value::Boolean(true)
            }
            Some(TokenKind::False) => {
                self.bump()?;
                Value::Boolean(false)
            }
            Some(TokenKind::Null) => {
                self.bump()?;
                Value::Null
            }
            Some(kind) if kind.is_name() => Value::Enum(self.parse_name()?.node),
            Some(TokenKind::LBracket) => Value::List(
                self.parse_delimited(TokenKind::LBracket, TokenKind::RBracket, |parser| {
                    Ok(parser.parse_value_inner(is_const)?.node)
                })?,
            ),
            Some(TokenKind::LCurly) => Value::Object(
                self.parse_delimited(TokenKind::LCurly, TokenKind::RCurly, |parser| {
                    let name = parser.parse_name()?.node;
                    parser.expect(TokenKind::Colon)?;
                    Ok((name, parser.parse_value_inner(is_const)?.node))
                })?
                .into_iter()
                .collect(),
            ),
            _ => return Err(self.unexpected()),
        };

        Ok(Positioned::new(value, pos))
    }

    pub(super) fn parse_type(&mut self) -> Result<Positioned<Type>> {
        self.descend(Self::parse_type_node)
    }

    fn parse_type_node(&mut self) -> Result<Positioned<Type>> {
        let pos = self.pos();

        let base = if self.eat(TokenKind::LBracket) {
            let inner = self.parse_type()?;
            self.expect(TokenKind::RBracket)?;
            BaseType::List(Box::new(inner.node))
        } else {
            BaseType::Named(self.parse_name()?.node)
        };
        let nullable = !self.eat(TokenKind::Bang);

        Ok(Positioned::new(Type { base, nullable }, pos))
    }

    /// `(name: value ...)`, empty when there are no parentheses.
    pub(super) fn parse_arguments(&mut self) -> Result<Vec<(Positioned<Name>, Positioned<Value>)>> {
        self.parse_arguments_inner(false)
    }

    fn parse_arguments_inner(&mut self, is_const: bool) -> Result<Vec<(Positioned<Name>, Positioned<Value>)>> {
        if self.peek_kind() != Some(TokenKind::LParen) {
            return Ok(Vec::new());
        }

        self.parse_delimited(TokenKind::LParen, TokenKind::RParen, |parser| {
            let name = parser.parse_name()?;
            parser.expect(TokenKind::Colon)?;
            let value = parser.parse_value_inner(is_const)?;
            Ok((name, value))
        })
    }

    pub(super) fn parse_directives(&mut self) -> Result<Vec<Positioned<Directive>>> {
        let mut directives = Vec::new();
        while self.peek_kind() == Some(TokenKind::DirSign) {
            directives.push(self.parse_directive(false)?);
        }
        Ok(directives)
    }

    pub(super) fn parse_const_directives(&mut self) -> Result<Vec<Positioned<ConstDirective>>> {
        let mut directives = Vec::new();
        while self.peek_kind() == Some(TokenKind::DirSign) {
            let directive = self.parse_directive(true)?;
            let pos = directive.pos;
            let directive = directive
                .node
                .into_const()
                .ok_or_else(|| self.error("Variables are not allowed in constant values", pos))?;
            directives.push(Positioned::new(directive, pos));
        }
        Ok(directives)
    }

    fn parse_directive(&mut self, is_const: bool) -> Result<Positioned<Directive>> {
        let pos: Pos = self.pos();
        self.expect(TokenKind::DirSign)?;
        let name = self.parse_name()?;
        let arguments = self.parse_arguments_inner(is_const)?;
        Ok(Positioned::new(Directive { name, arguments }, pos))
    }
}
