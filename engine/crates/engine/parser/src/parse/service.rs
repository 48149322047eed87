use engine_value::Name;

use super::Parser;
use crate::{
    lexer::TokenKind,
    types::{
        Definition, DirectiveDefinition, DirectiveLocation, EnumType, EnumValueDefinition, FieldDefinition,
        InputObjectType, InputValueDefinition, InterfaceType, ObjectType, SchemaDefinition, TypeDefinition, TypeKind,
        UnionType,
    },
    Positioned, Result,
};

impl Parser<'_> {
    pub(super) fn parse_type_system_definition(&mut self) -> Result<Definition> {
        let pos = self.pos();
        let description = self.parse_description()?;

        let definition = match self.peek_kind() {
            Some(TokenKind::Schema) => Definition::Schema(Positioned::new(self.parse_schema_definition(description)?, pos)),
            Some(TokenKind::Directive) => {
                Definition::Directive(Positioned::new(self.parse_directive_definition(description)?, pos))
            }
            Some(
                TokenKind::Scalar
                | TokenKind::Type
                | TokenKind::Interface
                | TokenKind::Union
                | TokenKind::Enum
                | TokenKind::Input,
            ) => Definition::Type(Positioned::new(self.parse_type_definition(description)?, pos)),
            _ => return Err(self.unexpected()),
        };

        Ok(definition)
    }

    fn parse_description(&mut self) -> Result<Option<Positioned<String>>> {
        if self.peek_kind() != Some(TokenKind::String) {
            return Ok(None);
        }
        let pos = self.pos();
        let token = self.bump()?;
        Ok(Some(Positioned::new(token.value.into_owned(), pos)))
    }

    fn parse_schema_definition(&mut self, description: Option<Positioned<String>>) -> Result<SchemaDefinition> {
        self.expect(TokenKind::Schema)?;
        let directives = self.parse_const_directives()?;

        let mut definition = SchemaDefinition {
            description,
            directives,
            query: None,
            mutation: None,
            subscription: None,
        };

        self.expect(TokenKind::LCurly)?;
        while !self.eat(TokenKind::RCurly) {
            let slot = match self.peek_kind() {
                Some(TokenKind::Query) => &mut definition.query,
                Some(TokenKind::Mutation) => &mut definition.mutation,
                Some(TokenKind::Subscription) => &mut definition.subscription,
                _ => return Err(self.unexpected()),
            };
            self.bump()?;
            self.expect(TokenKind::Colon)?;
            *slot = Some(self.parse_name()?);
        }

        Ok(definition)
    }

    fn parse_type_definition(&mut self, description: Option<Positioned<String>>) -> Result<TypeDefinition> {
        let keyword = self.bump()?.kind;
        let name = self.parse_name()?;

        let (directives, kind) = match keyword {
            TokenKind::Scalar => (self.parse_const_directives()?, TypeKind::Scalar),
            TokenKind::Type | TokenKind::Interface => {
                let implements = self.parse_implements()?;
                let directives = self.parse_const_directives()?;
                let fields = self.parse_fields_definition()?;
                let kind = if keyword == TokenKind::Type {
                    TypeKind::Object(ObjectType { implements, fields })
                } else {
                    TypeKind::Interface(InterfaceType { implements, fields })
                };
                (directives, kind)
            }
            TokenKind::Union => {
                let directives = self.parse_const_directives()?;
                let mut members = Vec::new();
                if self.eat(TokenKind::Equals) {
                    self.eat(TokenKind::Pipe);
                    members.push(self.parse_name()?);
                    while self.eat(TokenKind::Pipe) {
                        members.push(self.parse_name()?);
                    }
                }
                (directives, TypeKind::Union(UnionType { members }))
            }
            TokenKind::Enum => {
                let directives = self.parse_const_directives()?;
                let values = if self.peek_kind() == Some(TokenKind::LCurly) {
                    self.parse_delimited(TokenKind::LCurly, TokenKind::RCurly, Self::parse_enum_value_definition)?
                } else {
                    Vec::new()
                };
                (directives, TypeKind::Enum(EnumType { values }))
            }
            _ => {
                let directives = self.parse_const_directives()?;
                let fields = if self.peek_kind() == Some(TokenKind::LCurly) {
                    self.parse_delimited(TokenKind::LCurly, TokenKind::RCurly, Self::parse_input_value_definition)?
                } else {
                    Vec::new()
                };
                (directives, TypeKind::InputObject(InputObjectType { fields }))
            }
        };

        Ok(TypeDefinition {
            description,
            name,
            directives,
            kind,
        })
    }

    /// `implements A & B`. Commas are ignored, so the older `implements A, B` form works too.
    fn parse_implements(&mut self) -> Result<Vec<Positioned<Name>>> {
        let mut implements = Vec::new();
        if self.eat(TokenKind::Implements) {
            self.eat(TokenKind::Amp);
            implements.push(self.parse_name()?);
            while self.eat(TokenKind::Amp) || self.peek_kind() == Some(TokenKind::Identifier) {
                implements.push(self.parse_name()?);
            }
        }
        Ok(implements)
    }

    fn parse_fields_definition(&mut self) -> Result<Vec<Positioned<FieldDefinition>>> {
        if self.peek_kind() != Some(TokenKind::LCurly) {
            return Ok(Vec::new());
        }

        self.parse_delimited(TokenKind::LCurly, TokenKind::RCurly, |parser| {
            let pos = parser.pos();
            let description = parser.parse_description()?;
            let name = parser.parse_name()?;
            let arguments = parser.parse_arguments_definition()?;
            parser.expect(TokenKind::Colon)?;
            let ty = parser.parse_type()?;
            let directives = parser.parse_const_directives()?;

            Ok(Positioned::new(
                FieldDefinition {
                    description,
                    name,
                    arguments,
                    ty,
                    directives,
                },
                pos,
            ))
        })
    }

    fn parse_arguments_definition(&mut self) -> Result<Vec<Positioned<InputValueDefinition>>> {
        if self.peek_kind() != Some(TokenKind::LParen) {
            return Ok(Vec::new());
        }
        self.parse_delimited(TokenKind::LParen, TokenKind::RParen, Self::parse_input_value_definition)
    }

    fn parse_input_value_definition(&mut self) -> Result<Positioned<InputValueDefinition>> {
        let pos = self.pos();
        let description = self.parse_description()?;
        let name = self.parse_name()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let default_value = if self.eat(TokenKind::Equals) {
            Some(self.parse_const_value()?)
        } else {
            None
        };
        let directives = self.parse_const_directives()?;

        Ok(Positioned::new(
            InputValueDefinition {
                description,
                name,
                ty,
                default_value,
                directives,
            },
            pos,
        ))
    }

    fn parse_enum_value_definition(&mut self) -> Result<Positioned<EnumValueDefinition>> {
        let pos = self.pos();
        let description = self.parse_description()?;
        let value = self.parse_name()?;
        let directives = self.parse_const_directives()?;

        Ok(Positioned::new(
            EnumValueDefinition {
                description,
                value,
                directives,
            },
            pos,
        ))
    }

    fn parse_directive_definition(&mut self, description: Option<Positioned<String>>) -> Result<DirectiveDefinition> {
        self.expect(TokenKind::Directive)?;
        self.expect(TokenKind::DirSign)?;
        let name = self.parse_name()?;
        let arguments = self.parse_arguments_definition()?;
        self.expect(TokenKind::On)?;

        self.eat(TokenKind::Pipe);
        let mut locations = vec![self.parse_directive_location()?];
        while self.eat(TokenKind::Pipe) {
            locations.push(self.parse_directive_location()?);
        }

        Ok(DirectiveDefinition {
            description,
            name,
            arguments,
            locations,
        })
    }

    fn parse_directive_location(&mut self) -> Result<Positioned<DirectiveLocation>> {
        let name = self.parse_name()?;
        let location = name
            .as_str()
            .parse::<DirectiveLocation>()
            .map_err(|_| self.error(format!("Unknown directive location {}", name.node), name.pos))?;
        Ok(name.position_node(location))
    }
}
