//! Parsing module.
//!
//! This module's structure mirrors `types`.

mod executable;
mod service;
mod value;

use std::{path::Path, sync::Arc};

use engine_value::{ConstValue, Name, Value};

use crate::{
    lexer::{self, Token, TokenKind},
    types::{Document, SelectionSet, Type},
    Error, FileError, Pos, Positioned, Result,
};

/// The grammar rule to start parsing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRule {
    Document,
    Value,
    ConstValue,
    Type,
    SelectionSet,
}

/// The result of [`parse_with`], one variant per [`StartRule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Document(Document),
    Value(Value),
    ConstValue(ConstValue),
    Type(Type),
    SelectionSet(Positioned<SelectionSet>),
}

/// Parse `source` starting from the given rule. The whole input must be consumed.
pub fn parse_with(source: &str, rule: StartRule) -> Result<Parsed> {
    let mut parser = Parser::new(source, None)?;
    let parsed = match rule {
        StartRule::Document => return parser.parse_document().map(Parsed::Document),
        StartRule::Value => Parsed::Value(parser.parse_value()?.node),
        StartRule::ConstValue => Parsed::ConstValue(parser.parse_const_value()?.node),
        StartRule::Type => Parsed::Type(parser.parse_type()?.node),
        StartRule::SelectionSet => Parsed::SelectionSet(parser.parse_selection_set()?),
    };
    parser.expect_end()?;
    Ok(parsed)
}

/// Parse a GraphQL document, executable definitions and type-system definitions alike.
pub fn parse_query(source: impl AsRef<str>) -> Result<Document> {
    Parser::new(source.as_ref(), None)?.parse_document()
}

/// Parse a GraphQL document, recording the file it came from on the document and on errors.
pub fn parse_query_with_filename(source: impl AsRef<str>, filename: &str) -> Result<Document> {
    Parser::new(source.as_ref(), Some(filename.into()))?.parse_document()
}

/// Read and parse a GraphQL document from disk.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document, FileError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|error| FileError::Io {
        path: path.display().to_string(),
        error,
    })?;

    Ok(parse_query_with_filename(&source, &path.display().to_string())?)
}

/// Parse a value literal, which may reference variables.
pub fn parse_value(source: &str) -> Result<Value> {
    let mut parser = Parser::new(source, None)?;
    let value = parser.parse_value()?;
    parser.expect_end()?;
    Ok(value.node)
}

/// Parse a type reference such as `[String!]`.
pub fn parse_type(source: &str) -> Result<Type> {
    let mut parser = Parser::new(source, None)?;
    let ty = parser.parse_type()?;
    parser.expect_end()?;
    Ok(ty.node)
}

/// Parse a bare selection set such as `{ id name }`.
pub fn parse_selection_set(source: &str) -> Result<Positioned<SelectionSet>> {
    let mut parser = Parser::new(source, None)?;
    let selection_set = parser.parse_selection_set()?;
    parser.expect_end()?;
    Ok(selection_set)
}

/// How deeply values, types and selection sets may nest.
pub const RECURSION_LIMIT: usize = 64;

/// A cursor over the tokens of one source text. Every rule consumes what it recognises and
/// never backtracks; choices are made on the next token alone.
pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    cursor: usize,
    depth: usize,
    filename: Option<Arc<str>>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, filename: Option<Arc<str>>) -> Result<Self> {
        let tokens = match lexer::tokenize(source) {
            Ok(tokens) => tokens,
            Err(error) => {
                return Err(Error {
                    message: error.message,
                    line: error.line,
                    column: error.column,
                    filename: filename.as_deref().map(str::to_string),
                    source_text: source.to_string(),
                })
            }
        };

        Ok(Parser {
            source,
            tokens,
            cursor: 0,
            depth: 0,
            filename,
        })
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.cursor + n).map(|token| token.kind)
    }

    fn peek_is_name(&self) -> bool {
        self.peek_kind().is_some_and(TokenKind::is_name)
    }

    /// Position of the next token, or of the end of input.
    fn pos(&self) -> Pos {
        match self.peek() {
            Some(token) => Pos::new(token.line, token.column),
            None => {
                let (line, column) = lexer::end_position(self.source);
                Pos::new(line, column)
            }
        }
    }

    fn bump(&mut self) -> Result<Token<'a>> {
        let token = self.peek().cloned().ok_or_else(|| self.unexpected())?;
        self.cursor += 1;
        Ok(token)
    }

    /// Consumes the next token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>> {
        if self.peek_kind() == Some(kind) {
            self.bump()
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            Some(_) => Err(self.unexpected()),
            None => Ok(()),
        }
    }

    fn parse_name(&mut self) -> Result<Positioned<Name>> {
        if !self.peek_is_name() {
            return Err(self.unexpected());
        }
        let token = self.bump()?;
        Ok(Positioned::new(Name::new(token.raw), Pos::new(token.line, token.column)))
    }

    /// Parses `open item* close`, allowing zero items.
    fn parse_delimited<T>(
        &mut self,
        open: TokenKind,
        close: TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        self.expect(open)?;
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// Runs a rule that may recurse, failing once [`RECURSION_LIMIT`] nested rules are open.
    fn descend<T>(&mut self, rule: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= RECURSION_LIMIT {
            return Err(self.error("Recursion limit exceeded", self.pos()));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn error(&self, message: impl Into<String>, pos: Pos) -> Error {
        Error {
            message: message.into(),
            line: pos.line,
            column: pos.column,
            filename: self.filename.as_deref().map(str::to_string),
            source_text: self.source.to_string(),
        }
    }

    /// The error for the next token not fitting the grammar.
    fn unexpected(&self) -> Error {
        let Some(token) = self.peek() else {
            return self.error("Unexpected end of document", self.pos());
        };

        let message = match token.kind {
            TokenKind::BadUnicodeEscape => format!(
                "Parse error on bad Unicode escape sequence: {:?} ({}) at [{}, {}]",
                token.value, token.kind, token.line, token.column
            ),
            _ => format!(
                "Parse error on {:?} ({}) at [{}, {}]",
                token.raw, token.kind, token.line, token.column
            ),
        };

        self.error(message, self.pos())
    }

    fn parse_document(mut self) -> Result<Document> {
        let mut definitions = Vec::new();
        while self.peek().is_some() {
            definitions.push(self.parse_definition()?);
        }

        Ok(Document {
            definitions,
            filename: self.filename.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use engine_value::Number;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::{BaseType, Definition, OperationType, Selection};

    #[test]
    fn anonymous_query_shorthand() {
        let document = parse_query("{ a b }").unwrap();
        let operation = document.operations().next().unwrap();

        assert_eq!(operation.ty, OperationType::Query);
        assert!(operation.name.is_none());
        let names = operation
            .selection_set
            .items
            .iter()
            .map(|selection| match selection {
                Selection::Field(field) => field.name.to_string(),
                _ => unreachable!(),
            })
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn nodes_carry_the_position_of_their_first_token() {
        let document = parse_query("query Q {\n  alias: field(arg: 1) @skip(if: true)\n}").unwrap();
        let operation = document.operations().next().unwrap();
        assert_eq!(operation.pos, Pos::new(1, 1));
        assert_eq!(operation.name.as_ref().unwrap().pos, Pos::new(1, 7));

        let Selection::Field(field) = &operation.selection_set.items[0] else {
            unreachable!()
        };
        assert_eq!(field.pos, Pos::new(2, 3));
        assert_eq!(field.name.pos, Pos::new(2, 10));
        assert_eq!(field.arguments[0].1.pos, Pos::new(2, 21));
        assert_eq!(field.directives[0].pos, Pos::new(2, 24));
    }

    #[test]
    fn keywords_are_valid_names() {
        let document = parse_query("query query { type: on(query: true) fragment }").unwrap();
        let operation = document.operations().next().unwrap();
        assert_eq!(operation.name.as_ref().unwrap().node, "query");
        assert_eq!(operation.selection_set.items.len(), 2);
    }

    #[test]
    fn empty_arguments() {
        let document = parse_query("{ field() }").unwrap();
        let operation = document.operations().next().unwrap();
        let Selection::Field(field) = &operation.selection_set.items[0] else {
            unreachable!()
        };
        assert!(field.arguments.is_empty());
    }

    #[test]
    fn anonymous_fragment() {
        let document = parse_query("fragment on User @dir { name }").unwrap();
        let Definition::Fragment(fragment) = &document.definitions[0] else {
            unreachable!()
        };
        assert!(fragment.name.is_none());
        assert_eq!(fragment.type_condition.on.node, "User");
        assert_eq!(fragment.directives[0].name.node, "dir");

        let document = parse_query("fragment on on User { name }").unwrap();
        let fragment = document.fragments().next().unwrap();
        assert_eq!(fragment.name.as_ref().unwrap().node, "on");
        assert!(document.fragment("on").is_some());
    }

    #[test]
    fn start_rules() {
        assert_eq!(
            parse_with("[1, $a, {b: ENUM}]", StartRule::Value).unwrap(),
            Parsed::Value(Value::List(vec![
                Value::Number(Number::from(1)),
                Value::Variable(Name::new("a")),
                Value::Object([(Name::new("b"), Value::Enum(Name::new("ENUM")))].into_iter().collect()),
            ]))
        );
        assert_eq!(
            parse_type("[ID!]").unwrap(),
            Type::nullable(BaseType::list(Type::required(BaseType::named("ID"))))
        );
        assert_eq!(parse_selection_set("{ a { b } }").unwrap().items.len(), 1);
        assert!(matches!(
            parse_with("{ a }", StartRule::Document).unwrap(),
            Parsed::Document(_)
        ));

        let error = parse_with("$a", StartRule::ConstValue).unwrap_err();
        assert_eq!(error.message, r#"Parse error on "$" (VAR_SIGN) at [1, 1]"#);

        let error = parse_value("1 2").unwrap_err();
        assert_eq!(error.message, r#"Parse error on "2" (INT) at [1, 3]"#);
    }

    #[test]
    fn error_on_unexpected_token() {
        let error = parse_query("{ a(b: ) }").unwrap_err();
        assert_eq!(error.message, r#"Parse error on ")" (RPAREN) at [1, 8]"#);
        assert_eq!((error.line, error.column), (1, 8));
        assert_eq!(error.source_text, "{ a(b: ) }");
    }

    #[test]
    fn error_at_end_of_document() {
        let error = parse_query("{ a {\n b }").unwrap_err();
        assert_eq!(error.message, "Unexpected end of document");
        assert_eq!((error.line, error.column), (2, 5));
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let depth = 100_000;
        let query = format!("{{ a(x: {}1{}) }}", "[".repeat(depth), "]".repeat(depth));
        let error = parse_query(query).unwrap_err();
        assert_eq!(error.message, "Recursion limit exceeded");
        // The selection set takes one level, the 64th bracket is the first one refused.
        assert_eq!((error.line, error.column), (1, 8 + RECURSION_LIMIT - 1));

        let ty = format!("{}Int{}", "[".repeat(depth), "]".repeat(depth));
        assert_eq!(parse_type(&ty).unwrap_err().message, "Recursion limit exceeded");

        let selections = format!("{}{}", "{ a ".repeat(depth), "}".repeat(depth));
        assert_eq!(parse_query(selections).unwrap_err().message, "Recursion limit exceeded");

        let nested = format!("{{ a(x: {}1{}) }}", "[".repeat(32), "]".repeat(32));
        assert!(parse_query(nested).is_ok());
    }

    #[test]
    fn unknown_characters_and_bad_escapes_fail_parsing() {
        let error = parse_query("{ a ? }").unwrap_err();
        assert_eq!(error.message, r#"Parse error on "?" (UNKNOWN_CHAR) at [1, 5]"#);

        let error = parse_query(r#"{ a(b: "\x") }"#).unwrap_err();
        assert_eq!(
            error.message,
            r#"Parse error on bad Unicode escape sequence: "\\x" (BAD_UNICODE_ESCAPE) at [1, 8]"#
        );
    }

    #[test]
    fn lexer_failures_become_parse_errors() {
        let error = parse_query_with_filename("{ a(b: \"open) }", "query.graphql").unwrap_err();
        assert_eq!(error.message, "Unterminated string");
        assert_eq!(error.filename.as_deref(), Some("query.graphql"));
        assert_eq!(error.to_string(), "query.graphql: Unterminated string");
    }

    #[test]
    fn filename_is_recorded() {
        let document = parse_query_with_filename("{ a }", "a.graphql").unwrap();
        assert_eq!(document.filename.as_deref(), Some("a.graphql"));

        let error = parse_query_with_filename("{", "a.graphql").unwrap_err();
        assert_eq!(error.to_string(), "a.graphql: Unexpected end of document");
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("engine-parser-{}.graphql", std::process::id()));
        std::fs::write(&path, "query FromDisk { a }").unwrap();

        let document = parse_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(document.filename.as_deref(), Some(path.display().to_string().as_str()));
        assert_eq!(document.operations().next().unwrap().name.as_ref().unwrap().node, "FromDisk");

        assert!(matches!(parse_file(&path), Err(FileError::Io { .. })));
    }

    #[test]
    fn empty_document() {
        assert_eq!(parse_query("  # nothing\n").unwrap(), Document::default());
    }
}
