//! Prints documents back to canonical GraphQL source.

use std::fmt::{self, Display, Formatter, Write};

use engine_value::{ConstValue, Name};

use crate::{
    types::{
        ConstDirective, Definition, Directive, DirectiveDefinition, Document, FieldDefinition, FragmentDefinition,
        InputValueDefinition, OperationDefinition, OperationType, SchemaDefinition, Selection, SelectionSet,
        TypeDefinition, TypeKind,
    },
    Positioned,
};

impl Document {
    /// Print the document as GraphQL source. Parsing the result yields an equal document.
    pub fn to_query_string(&self) -> String {
        self.to_string()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut printer = Printer { out: f, depth: 0 };
        for (i, definition) in self.definitions.iter().enumerate() {
            if i > 0 {
                printer.out.write_str("\n\n")?;
            }
            printer.definition(definition)?;
        }
        Ok(())
    }
}

impl Display for SelectionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Printer { out: f, depth: 0 }.selection_set(self)
    }
}

struct Printer<'a, 'b> {
    out: &'a mut Formatter<'b>,
    depth: usize,
}

impl Printer<'_, '_> {
    fn indent(&mut self) -> fmt::Result {
        for _ in 0..self.depth {
            self.out.write_str("  ")?;
        }
        Ok(())
    }

    fn definition(&mut self, definition: &Definition) -> fmt::Result {
        match definition {
            Definition::Operation(operation) => self.operation(operation),
            Definition::Fragment(fragment) => self.fragment(fragment),
            Definition::Schema(schema) => self.schema(schema),
            Definition::Type(ty) => self.type_definition(ty),
            Definition::Directive(directive) => self.directive_definition(directive),
        }
    }

    fn operation(&mut self, operation: &OperationDefinition) -> fmt::Result {
        let shorthand = operation.ty == OperationType::Query
            && operation.name.is_none()
            && operation.variable_definitions.is_empty()
            && operation.directives.is_empty();

        if !shorthand {
            write!(self.out, "{}", operation.ty)?;
            if let Some(name) = &operation.name {
                write!(self.out, " {name}")?;
            }
            if !operation.variable_definitions.is_empty() {
                self.out.write_char('(')?;
                for (i, variable) in operation.variable_definitions.iter().enumerate() {
                    if i > 0 {
                        self.out.write_str(", ")?;
                    }
                    write!(self.out, "${}: {}", variable.name, variable.var_type)?;
                    if let Some(default_value) = &variable.default_value {
                        write!(self.out, " = {default_value}")?;
                    }
                    self.const_directives(&variable.directives)?;
                }
                self.out.write_char(')')?;
            }
            self.directives(operation.directives.iter().map(|directive| &directive.node))?;
            self.out.write_char(' ')?;
        }

        self.selection_set(&operation.selection_set)
    }

    fn fragment(&mut self, fragment: &FragmentDefinition) -> fmt::Result {
        self.out.write_str("fragment")?;
        if let Some(name) = &fragment.name {
            write!(self.out, " {name}")?;
        }
        write!(self.out, " on {}", fragment.type_condition.on)?;
        self.directives(fragment.directives.iter().map(|directive| &directive.node))?;
        self.out.write_char(' ')?;
        self.selection_set(&fragment.selection_set)
    }

    fn selection_set(&mut self, selection_set: &SelectionSet) -> fmt::Result {
        self.out.write_str("{\n")?;
        self.depth += 1;
        for selection in &selection_set.items {
            self.indent()?;
            self.selection(selection)?;
            self.out.write_char('\n')?;
        }
        self.depth -= 1;
        self.indent()?;
        self.out.write_char('}')
    }

    fn selection(&mut self, selection: &Selection) -> fmt::Result {
        match selection {
            Selection::Field(field) => {
                if let Some(alias) = &field.alias {
                    write!(self.out, "{alias}: ")?;
                }
                write!(self.out, "{}", field.name)?;
                self.arguments(field.arguments.iter().map(|(name, value)| (&name.node, &value.node)))?;
                self.directives(field.directives.iter().map(|directive| &directive.node))?;
                if !field.selection_set.is_empty() {
                    self.out.write_char(' ')?;
                    self.selection_set(&field.selection_set)?;
                }
                Ok(())
            }
            Selection::FragmentSpread(spread) => {
                write!(self.out, "...{}", spread.fragment_name)?;
                self.directives(spread.directives.iter().map(|directive| &directive.node))
            }
            Selection::InlineFragment(fragment) => {
                self.out.write_str("...")?;
                if let Some(condition) = &fragment.type_condition {
                    write!(self.out, " on {}", condition.on)?;
                }
                self.directives(fragment.directives.iter().map(|directive| &directive.node))?;
                self.out.write_char(' ')?;
                self.selection_set(&fragment.selection_set)
            }
        }
    }

    fn directives<'d>(&mut self, directives: impl Iterator<Item = &'d Directive>) -> fmt::Result {
        for directive in directives {
            write!(self.out, " @{}", directive.name)?;
            self.arguments(directive.arguments.iter().map(|(name, value)| (&name.node, &value.node)))?;
        }
        Ok(())
    }

    fn const_directives(&mut self, directives: &[Positioned<ConstDirective>]) -> fmt::Result {
        for directive in directives {
            write!(self.out, " @{}", directive.name)?;
            self.arguments(directive.arguments.iter().map(|(name, value)| (&name.node, &value.node)))?;
        }
        Ok(())
    }

    fn arguments<'v, V: Display + 'v>(
        &mut self,
        arguments: impl ExactSizeIterator<Item = (&'v Name, &'v V)>,
    ) -> fmt::Result {
        if arguments.len() == 0 {
            return Ok(());
        }
        self.out.write_char('(')?;
        for (i, (name, value)) in arguments.enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            write!(self.out, "{name}: {value}")?;
        }
        self.out.write_char(')')
    }

    fn description(&mut self, description: Option<&Positioned<String>>) -> fmt::Result {
        if let Some(description) = description {
            self.indent()?;
            writeln!(self.out, "{}", ConstValue::String(description.node.clone()))?;
        }
        Ok(())
    }

    fn schema(&mut self, schema: &SchemaDefinition) -> fmt::Result {
        self.description(schema.description.as_ref())?;
        self.out.write_str("schema")?;
        self.const_directives(&schema.directives)?;
        self.out.write_str(" {\n")?;
        let roots = [
            ("query", &schema.query),
            ("mutation", &schema.mutation),
            ("subscription", &schema.subscription),
        ];
        for (operation, root) in roots {
            if let Some(root) = root {
                writeln!(self.out, "  {operation}: {root}")?;
            }
        }
        self.out.write_char('}')
    }

    fn type_definition(&mut self, definition: &TypeDefinition) -> fmt::Result {
        self.description(definition.description.as_ref())?;

        let keyword = match &definition.kind {
            TypeKind::Scalar => "scalar",
            TypeKind::Object(_) => "type",
            TypeKind::Interface(_) => "interface",
            TypeKind::Union(_) => "union",
            TypeKind::Enum(_) => "enum",
            TypeKind::InputObject(_) => "input",
        };
        write!(self.out, "{keyword} {}", definition.name)?;

        match &definition.kind {
            TypeKind::Scalar => self.const_directives(&definition.directives),
            TypeKind::Object(object) => {
                self.implements(&object.implements)?;
                self.const_directives(&definition.directives)?;
                self.fields(&object.fields)
            }
            TypeKind::Interface(interface) => {
                self.implements(&interface.implements)?;
                self.const_directives(&definition.directives)?;
                self.fields(&interface.fields)
            }
            TypeKind::Union(union) => {
                self.const_directives(&definition.directives)?;
                for (i, member) in union.members.iter().enumerate() {
                    self.out.write_str(if i == 0 { " = " } else { " | " })?;
                    write!(self.out, "{member}")?;
                }
                Ok(())
            }
            TypeKind::Enum(enum_type) => {
                self.const_directives(&definition.directives)?;
                if enum_type.values.is_empty() {
                    return Ok(());
                }
                self.out.write_str(" {\n")?;
                self.depth += 1;
                for value in &enum_type.values {
                    self.description(value.description.as_ref())?;
                    self.indent()?;
                    write!(self.out, "{}", value.value)?;
                    self.const_directives(&value.directives)?;
                    self.out.write_char('\n')?;
                }
                self.depth -= 1;
                self.out.write_char('}')
            }
            TypeKind::InputObject(input) => {
                self.const_directives(&definition.directives)?;
                if input.fields.is_empty() {
                    return Ok(());
                }
                self.out.write_str(" {\n")?;
                self.depth += 1;
                for field in &input.fields {
                    self.description(field.description.as_ref())?;
                    self.indent()?;
                    self.input_value(field)?;
                    self.out.write_char('\n')?;
                }
                self.depth -= 1;
                self.out.write_char('}')
            }
        }
    }

    fn implements(&mut self, implements: &[Positioned<Name>]) -> fmt::Result {
        for (i, name) in implements.iter().enumerate() {
            self.out.write_str(if i == 0 { " implements " } else { " & " })?;
            write!(self.out, "{name}")?;
        }
        Ok(())
    }

    fn fields(&mut self, fields: &[Positioned<FieldDefinition>]) -> fmt::Result {
        if fields.is_empty() {
            return Ok(());
        }
        self.out.write_str(" {\n")?;
        self.depth += 1;
        for field in fields {
            self.description(field.description.as_ref())?;
            self.indent()?;
            write!(self.out, "{}", field.name)?;
            self.input_values(&field.arguments)?;
            write!(self.out, ": {}", field.ty)?;
            self.const_directives(&field.directives)?;
            self.out.write_char('\n')?;
        }
        self.depth -= 1;
        self.out.write_char('}')
    }

    fn input_values(&mut self, values: &[Positioned<InputValueDefinition>]) -> fmt::Result {
        if values.is_empty() {
            return Ok(());
        }
        self.out.write_char('(')?;
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            if let Some(description) = &value.description {
                write!(self.out, "{} ", ConstValue::String(description.node.clone()))?;
            }
            self.input_value(value)?;
        }
        self.out.write_char(')')
    }

    fn input_value(&mut self, value: &InputValueDefinition) -> fmt::Result {
        write!(self.out, "{}: {}", value.name, value.ty)?;
        if let Some(default_value) = &value.default_value {
            write!(self.out, " = {default_value}")?;
        }
        self.const_directives(&value.directives)
    }

    fn directive_definition(&mut self, definition: &DirectiveDefinition) -> fmt::Result {
        self.description(definition.description.as_ref())?;
        write!(self.out, "directive @{}", definition.name)?;
        self.input_values(&definition.arguments)?;
        for (i, location) in definition.locations.iter().enumerate() {
            self.out.write_str(if i == 0 { " on " } else { " | " })?;
            write!(self.out, "{location}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::parse_query;

    #[test]
    fn prints_canonical_source() {
        let document = parse_query(
            r#"query Q($id: ID! = 4, $flag: Boolean) @live { user: node(id: $id, filter: {tags: ["a", "b"], f: 1.5}) { ...F ... on User @include(if: $flag) { name } } }
            fragment F on Node { id }
            fragment on User { email }
            { plain }"#,
        )
        .unwrap();

        assert_eq!(
            document.to_query_string(),
            r#"query Q($id: ID! = 4, $flag: Boolean) @live {
  user: node(id: $id, filter: {tags: ["a", "b"], f: 1.5}) {
    ...F
    ... on User @include(if: $flag) {
      name
    }
  }
}

fragment F on Node {
  id
}

fragment on User {
  email
}

{
  plain
}"#
        );
    }

    #[test]
    fn printing_then_parsing_is_idempotent() {
        let sources = [
            "{ a b(c: \"multi\\nline \\\"quoted\\\"\") ... { d } }",
            "subscription S @a(b: [1, 2.0, null, ENUM, {x: $y}]) { field() @skip(if: false) }",
            r#"
            schema { query: Query }
            "described" type Query implements Node & Other @key(fields: "id") {
              "the id" id: ID!
              items(first: Int = 10 @deprecated, "after" after: String): [Item!]!
            }
            union U = A | B
            enum E { A """block""" B @deprecated }
            input I { a: Int = 1 b: [String] }
            scalar Date
            directive @key(fields: String!) on OBJECT | FIELD_DEFINITION
            "#,
        ];

        for source in sources {
            let document = parse_query(source).unwrap();
            let printed = document.to_query_string();
            let reparsed = parse_query(&printed).unwrap();

            assert_eq!(reparsed, document, "{printed}");
            assert_eq!(reparsed.to_query_string(), printed);
        }
    }
}
