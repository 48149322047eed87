use super::Parser;
use crate::{
    lexer::TokenKind,
    types::{
        Definition, Field, FragmentDefinition, FragmentSpread, InlineFragment, OperationDefinition, OperationType,
        Selection, SelectionSet, TypeCondition, VariableDefinition,
    },
    Positioned, Result,
};

impl Parser<'_> {
    pub(super) fn parse_definition(&mut self) -> Result<Definition> {
        match self.peek_kind() {
            Some(TokenKind::LCurly | TokenKind::Query | TokenKind::Mutation | TokenKind::Subscription) => {
                Ok(Definition::Operation(self.parse_operation()?))
            }
            Some(TokenKind::Fragment) => Ok(Definition::Fragment(self.parse_fragment_definition()?)),
            Some(
                TokenKind::String
                | TokenKind::Schema
                | TokenKind::Scalar
                | TokenKind::Type
                | TokenKind::Interface
                | TokenKind::Union
                | TokenKind::Enum
                | TokenKind::Input
                | TokenKind::Directive,
            ) => self.parse_type_system_definition(),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_operation(&mut self) -> Result<Positioned<OperationDefinition>> {
        let pos = self.pos();

        if self.peek_kind() == Some(TokenKind::LCurly) {
            let selection_set = self.parse_selection_set()?;
            return Ok(Positioned::new(
                OperationDefinition {
                    ty: OperationType::Query,
                    name: None,
                    variable_definitions: Vec::new(),
                    directives: Vec::new(),
                    selection_set,
                },
                pos,
            ));
        }

        let ty = match self.bump()?.kind {
            TokenKind::Mutation => OperationType::Mutation,
            TokenKind::Subscription => OperationType::Subscription,
            _ => OperationType::Query,
        };
        let name = if self.peek_is_name() {
            Some(self.parse_name()?)
        } else {
            None
        };
        let variable_definitions = self.parse_variable_definitions()?;
        let directives = self.parse_directives()?;
        let selection_set = self.parse_selection_set()?;

        Ok(Positioned::new(
            OperationDefinition {
                ty,
                name,
                variable_definitions,
                directives,
                selection_set,
            },
            pos,
        ))
    }

    fn parse_variable_definitions(&mut self) -> Result<Vec<Positioned<VariableDefinition>>> {
        if self.peek_kind() != Some(TokenKind::LParen) {
            return Ok(Vec::new());
        }

        self.parse_delimited(TokenKind::LParen, TokenKind::RParen, |parser| {
            let pos = parser.pos();
            parser.expect(TokenKind::VarSign)?;
            let name = parser.parse_name()?;
            parser.expect(TokenKind::Colon)?;
            let var_type = parser.parse_type()?;
            let default_value = if parser.eat(TokenKind::Equals) {
                Some(parser.parse_const_value()?)
            } else {
                None
            };
            let directives = parser.parse_const_directives()?;

            Ok(Positioned::new(
                VariableDefinition {
                    name,
                    var_type,
                    directives,
                    default_value,
                },
                pos,
            ))
        })
    }

    pub(super) fn parse_selection_set(&mut self) -> Result<Positioned<SelectionSet>> {
        self.descend(|parser| {
            let pos = parser.pos();
            let items = parser.parse_delimited(TokenKind::LCurly, TokenKind::RCurly, Self::parse_selection)?;
            Ok(Positioned::new(SelectionSet { items }, pos))
        })
    }

    fn parse_selection(&mut self) -> Result<Selection> {
        if self.peek_kind() != Some(TokenKind::Ellipsis) {
            return Ok(Selection::Field(self.parse_field()?));
        }

        let pos = self.pos();
        self.bump()?;

        match self.peek_kind() {
            Some(TokenKind::On | TokenKind::LCurly | TokenKind::DirSign) => {
                let type_condition = if self.peek_kind() == Some(TokenKind::On) {
                    Some(self.parse_type_condition()?)
                } else {
                    None
                };
                let directives = self.parse_directives()?;
                let selection_set = self.parse_selection_set()?;

                Ok(Selection::InlineFragment(Positioned::new(
                    InlineFragment {
                        type_condition,
                        directives,
                        selection_set,
                    },
                    pos,
                )))
            }
            _ => {
                let fragment_name = self.parse_name()?;
                let directives = self.parse_directives()?;

                Ok(Selection::FragmentSpread(Positioned::new(
                    FragmentSpread {
                        fragment_name,
                        directives,
                    },
                    pos,
                )))
            }
        }
    }

    fn parse_field(&mut self) -> Result<Positioned<Field>> {
        let pos = self.pos();

        let first = self.parse_name()?;
        let (alias, name) = if self.eat(TokenKind::Colon) {
            (Some(first), self.parse_name()?)
        } else {
            (None, first)
        };
        let arguments = self.parse_arguments()?;
        let directives = self.parse_directives()?;
        let selection_set = if self.peek_kind() == Some(TokenKind::LCurly) {
            self.parse_selection_set()?
        } else {
            Positioned::new(SelectionSet::default(), self.pos())
        };

        Ok(Positioned::new(
            Field {
                alias,
                name,
                arguments,
                directives,
                selection_set,
            },
            pos,
        ))
    }

    fn parse_type_condition(&mut self) -> Result<Positioned<TypeCondition>> {
        let pos = self.pos();
        self.expect(TokenKind::On)?;
        let on = self.parse_name()?;
        Ok(Positioned::new(TypeCondition { on }, pos))
    }

    fn parse_fragment_definition(&mut self) -> Result<Positioned<FragmentDefinition>> {
        let pos = self.pos();
        self.expect(TokenKind::Fragment)?;

        // `fragment on User` has no name, `fragment on on User` is named `on`.
        let anonymous = self.peek_kind() == Some(TokenKind::On) && self.peek_nth_kind(1) != Some(TokenKind::On);
        let name = if anonymous { None } else { Some(self.parse_name()?) };
        let type_condition = self.parse_type_condition()?;
        let directives = self.parse_directives()?;
        let selection_set = self.parse_selection_set()?;

        Ok(Positioned::new(
            FragmentDefinition {
                name,
                type_condition,
                directives,
                selection_set,
            },
            pos,
        ))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        parse_query,
        types::{OperationType, Selection},
        Pos,
    };

    #[test]
    fn operation_with_variables() {
        let document = parse_query(
            r#"mutation Create($name: String! = "x" @deprecated, $tags: [String]) @live {
                create(name: $name, tags: $tags) { id }
            }"#,
        )
        .unwrap();
        let operation = document.operations().next().unwrap();

        assert_eq!(operation.ty, OperationType::Mutation);
        assert_eq!(operation.variable_definitions.len(), 2);

        let name = &operation.variable_definitions[0];
        assert_eq!(name.pos, Pos::new(1, 17));
        assert_eq!(name.var_type.to_string(), "String!");
        assert_eq!(name.default_value.as_ref().unwrap().to_string(), r#""x""#);
        assert_eq!(name.directives[0].name.node, "deprecated");
        assert_eq!(operation.directives[0].name.node, "live");
    }

    #[test]
    fn spreads_and_inline_fragments() {
        let document = parse_query("{ ...A ... on B { b } ... @include(if: $c) { c } ... { d } }").unwrap();
        let operation = document.operations().next().unwrap();
        let items = &operation.selection_set.items;

        let Selection::FragmentSpread(spread) = &items[0] else {
            unreachable!()
        };
        assert_eq!(spread.fragment_name.node, "A");

        let Selection::InlineFragment(on_b) = &items[1] else {
            unreachable!()
        };
        assert_eq!(on_b.type_condition.as_ref().unwrap().on.node, "B");

        let Selection::InlineFragment(conditional) = &items[2] else {
            unreachable!()
        };
        assert!(conditional.type_condition.is_none());
        assert_eq!(conditional.directives.len(), 1);

        assert!(matches!(&items[3], Selection::InlineFragment(fragment) if fragment.directives.is_empty()));
    }

    #[test]
    fn multiple_definitions_keep_their_order() {
        let document = parse_query("query A { a } fragment F on T { f } mutation B { b } { c }").unwrap();
        let names = document
            .operations()
            .map(|operation| operation.name.as_ref().map(|name| name.to_string()))
            .collect::<Vec<_>>();
        assert_eq!(names, vec![Some("A".to_string()), Some("B".to_string()), None]);
        assert_eq!(document.fragments().count(), 1);
    }
}
