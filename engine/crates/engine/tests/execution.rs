//! End to end tests of query execution against small schemas.

use std::{cell::RefCell, rc::Rc};

use engine::{
    registry::{EnumType, InterfaceType, MetaField, MetaInputValue, ObjectType, Registry, UnionType},
    ExecutionConfig, FieldError, FieldMiddleware, FieldValue, Next, Request, ResolverContext, Schema, Variables,
};
use serde_json::json;

fn schema(types: Vec<engine::registry::MetaType>) -> Schema {
    types
        .into_iter()
        .fold(Schema::build(Registry::default()), |builder, ty| builder.register(ty))
        .finish()
        .unwrap()
}

#[test]
fn simple_fields() {
    let schema = schema(vec![ObjectType::new("Query")
        .field(MetaField::new("a", "Int").resolver(|_| Ok(json!(1).into())))
        .field(MetaField::new("b", "Int").resolver(|_| Ok(json!(2).into())))
        .into()]);

    insta::assert_json_snapshot!(schema.execute("{ a b }").unwrap(), @r###"
    {
      "data": {
        "a": 1,
        "b": 2
      }
    }
    "###);
}

#[test]
fn aliases_keep_selection_order() {
    let schema = schema(vec![ObjectType::new("Query")
        .field(MetaField::new("a", "Int").resolver(|_| Ok(json!(1).into())))
        .field(MetaField::new("b", "Int").resolver(|_| Ok(FieldValue::lazy(|| Ok(json!(2))))))
        .into()]);

    insta::assert_json_snapshot!(schema.execute("{ second: b first: a b a }").unwrap(), @r###"
    {
      "data": {
        "second": 2,
        "first": 1,
        "b": 2,
        "a": 1
      }
    }
    "###);
}

fn thing_schema() -> Schema {
    schema(vec![
        ObjectType::new("Thing")
            .field(MetaField::new("id", "ID!"))
            .field(MetaField::new("name", "String"))
            .into(),
        ObjectType::new("Query")
            .field(MetaField::new("thing", "Thing").resolver(|_| Ok(json!({"id": null, "name": "x"}).into())))
            .field(MetaField::new("requiredThing", "Thing!").resolver(|_| Ok(json!({"id": null}).into())))
            .field(MetaField::new("other", "String").resolver(|_| Ok("still here".into())))
            .into(),
    ])
}

#[test]
fn null_bubbles_to_the_nullable_parent() {
    insta::assert_json_snapshot!(thing_schema().execute("{ thing { id name } other }").unwrap(), @r###"
    {
      "data": {
        "thing": null,
        "other": "still here"
      },
      "errors": [
        {
          "message": "Cannot return null for non-nullable field Thing.id",
          "locations": [
            {
              "line": 1,
              "column": 11
            }
          ],
          "path": [
            "thing",
            "id"
          ]
        }
      ]
    }
    "###);
}

#[test]
fn null_bubbles_to_the_data() {
    insta::assert_json_snapshot!(thing_schema().execute("{ other requiredThing { id } }").unwrap(), @r###"
    {
      "data": null,
      "errors": [
        {
          "message": "Cannot return null for non-nullable field Thing.id",
          "locations": [
            {
              "line": 1,
              "column": 25
            }
          ],
          "path": [
            "requiredThing",
            "id"
          ]
        }
      ]
    }
    "###);
}

#[test]
fn list_elements_are_nulled_on_their_own() {
    let schema = schema(vec![ObjectType::new("Query")
        .field(MetaField::new("values", "[Int!]").resolver(|_| Ok(json!([0, 1, null, 3, 4]).into())))
        .field(MetaField::new("strict", "[Int!]!").resolver(|_| Ok(json!([0, null]).into())))
        .into()]);

    insta::assert_json_snapshot!(schema.execute("{ values }").unwrap(), @r###"
    {
      "data": {
        "values": [
          0,
          1,
          null,
          3,
          4
        ]
      },
      "errors": [
        {
          "message": "Cannot return null for non-nullable element of Query.values",
          "locations": [
            {
              "line": 1,
              "column": 3
            }
          ],
          "path": [
            "values",
            2
          ]
        }
      ]
    }
    "###);

    insta::assert_json_snapshot!(schema.execute("{ strict }").unwrap(), @r###"
    {
      "data": null,
      "errors": [
        {
          "message": "Cannot return null for non-nullable element of Query.strict",
          "locations": [
            {
              "line": 1,
              "column": 3
            }
          ],
          "path": [
            "strict",
            1
          ]
        }
      ]
    }
    "###);
}

#[test]
fn resolver_errors_only_null_their_field() {
    let schema = schema(vec![ObjectType::new("Query")
        .field(MetaField::new("broken", "Int").resolver(|_| {
            Err(engine::GraphqlError::new("Not today")
                .with_extension("code", "UNAVAILABLE")
                .into())
        }))
        .field(MetaField::new("later", "Int").resolver(|_| {
            Ok(FieldValue::lazy(|| Err::<i32, _>(FieldError::new("Not later either"))))
        }))
        .field(MetaField::new("fine", "Boolean").resolver(|_| Ok(true.into())))
        .into()]);

    insta::assert_json_snapshot!(schema.execute("{ broken later fine }").unwrap(), @r###"
    {
      "data": {
        "broken": null,
        "later": null,
        "fine": true
      },
      "errors": [
        {
          "message": "Not today",
          "locations": [
            {
              "line": 1,
              "column": 3
            }
          ],
          "path": [
            "broken"
          ],
          "extensions": {
            "code": "UNAVAILABLE"
          }
        },
        {
          "message": "Not later either",
          "locations": [
            {
              "line": 1,
              "column": 10
            }
          ],
          "path": [
            "later"
          ]
        }
      ]
    }
    "###);
}

#[test]
fn leaf_values_are_coerced() {
    let schema = schema(vec![
        EnumType::new("Color", ["RED", "GREEN"]).into(),
        ObjectType::new("Query")
            .field(MetaField::new("id", "ID").resolver(|_| Ok(json!(12).into())))
            .field(MetaField::new("count", "Int").resolver(|_| Ok(json!(1.5).into())))
            .field(MetaField::new("color", "Color").resolver(|_| Ok("GREEN".into())))
            .field(MetaField::new("badColor", "Color").resolver(|_| Ok("BLUE".into())))
            .field(MetaField::new("notAList", "[Int]").resolver(|_| Ok(json!({"a": 1}).into())))
            .into(),
    ]);

    insta::assert_json_snapshot!(schema.execute("{ id count color badColor notAList }").unwrap(), @r###"
    {
      "data": {
        "id": "12",
        "count": null,
        "color": "GREEN",
        "badColor": null,
        "notAList": null
      },
      "errors": [
        {
          "message": "Int cannot represent non 32-bit signed integer value: 1.5",
          "locations": [
            {
              "line": 1,
              "column": 6
            }
          ],
          "path": [
            "count"
          ]
        },
        {
          "message": "Enum \"Color\" cannot represent value: \"BLUE\"",
          "locations": [
            {
              "line": 1,
              "column": 18
            }
          ],
          "path": [
            "badColor"
          ]
        },
        {
          "message": "Encountered a object where we expected a list",
          "locations": [
            {
              "line": 1,
              "column": 27
            }
          ],
          "path": [
            "notAList"
          ]
        }
      ]
    }
    "###);
}

#[test]
fn arguments_and_variables() {
    let schema = schema(vec![ObjectType::new("Query")
        .field(
            MetaField::new("echo", "[Int!]!")
                .argument(MetaInputValue::new("value", "Int!"))
                .argument(MetaInputValue::new("times", "Int").with_default(2))
                .resolver(|ctx| {
                    let value = ctx.arg("value").and_then(|value| value.as_i64()).unwrap_or_default();
                    let times = ctx.arg("times").and_then(|times| times.as_i64()).unwrap_or_default();
                    Ok(json!(vec![value; usize::try_from(times).unwrap_or_default()]).into())
                }),
        )
        .into()]);

    let request = Request::new("query($v: Int!, $t: Int) { echo(value: $v) again: echo(value: $v, times: $t) }")
        .variables(Variables::from_json(json!({"v": 3})));
    insta::assert_json_snapshot!(schema.execute(request).unwrap(), @r###"
    {
      "data": {
        "echo": [
          3,
          3
        ],
        "again": [
          3,
          3
        ]
      }
    }
    "###);

    let request = Request::new("query($v: Int!) { echo(value: $v) }").variables(Variables::from_json(json!({"v": "x"})));
    insta::assert_json_snapshot!(schema.execute(request).unwrap(), @r###"
    {
      "errors": [
        {
          "message": "Variable $v of type Int! was provided invalid value",
          "locations": [
            {
              "line": 1,
              "column": 7
            }
          ],
          "extensions": {
            "problems": [
              {
                "explanation": "Int cannot represent non 32-bit signed integer value: \"x\""
              }
            ]
          }
        }
      ]
    }
    "###);

    insta::assert_json_snapshot!(schema.execute("{ echo(times: 1) }").unwrap(), @r###"
    {
      "data": null,
      "errors": [
        {
          "message": "Field 'echo' is missing required arguments: value",
          "locations": [
            {
              "line": 1,
              "column": 3
            }
          ],
          "path": [
            "echo"
          ]
        }
      ]
    }
    "###);
}

#[test]
fn queries_that_cannot_begin() {
    let schema = thing_schema();

    insta::assert_json_snapshot!(schema.execute("fragment F on Query { other }").unwrap(), @"{}");

    insta::assert_json_snapshot!(schema.execute("{ thing { nope } }").unwrap(), @r###"
    {
      "errors": [
        {
          "message": "Field 'nope' doesn't exist on type 'Thing'",
          "locations": [
            {
              "line": 1,
              "column": 11
            }
          ]
        }
      ]
    }
    "###);

    let response = schema.execute("{ thing ").unwrap();
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Unexpected end of document");
    assert!(response.data.is_none());

    insta::assert_json_snapshot!(schema.execute("mutation { other }").unwrap(), @r###"
    {
      "errors": [
        {
          "message": "Schema is not configured for mutations",
          "locations": [
            {
              "line": 1,
              "column": 10
            }
          ]
        }
      ]
    }
    "###);
}

#[test]
fn operation_name_picks_the_operation() {
    let schema = thing_schema();
    let document = "query A { other } query B { thing { name } }";

    insta::assert_json_snapshot!(schema.execute(Request::new(document).with_operation_name("B")).unwrap(), @r###"
    {
      "data": {
        "thing": {
          "name": "x"
        }
      }
    }
    "###);

    insta::assert_json_snapshot!(schema.execute(document).unwrap(), @r###"
    {
      "errors": [
        {
          "message": "An operation name is required"
        }
      ]
    }
    "###);
}

#[test]
fn skip_and_include() {
    let schema = thing_schema();
    let request = Request::new(
        "query($yes: Boolean!) { other @skip(if: $yes) thing @include(if: $yes) { name ...F @skip(if: true) } } fragment F on Thing { id }",
    )
    .variables(Variables::from_json(json!({"yes": true})));

    insta::assert_json_snapshot!(schema.execute(request).unwrap(), @r###"
    {
      "data": {
        "thing": {
          "name": "x"
        }
      }
    }
    "###);
}

fn node_schema() -> Schema {
    schema(vec![
        InterfaceType::new("Node").field(MetaField::new("id", "ID!")).into(),
        ObjectType::new("User")
            .implements("Node")
            .field(MetaField::new("id", "ID!"))
            .field(MetaField::new("name", "String"))
            .into(),
        ObjectType::new("Post")
            .implements("Node")
            .field(MetaField::new("id", "ID!"))
            .field(MetaField::new("title", "String"))
            .into(),
        UnionType::new("SearchResult")
            .member("User")
            .member("Post")
            .resolve_type(|value| {
                let kind = if value.get("title").is_some() { "Post" } else { "User" };
                Some(kind.to_string())
            })
            .into(),
        ObjectType::new("Query")
            .field(MetaField::new("nodes", "[Node]").resolver(|_| {
                Ok(json!([
                    {"__typename": "User", "id": 1, "name": "Ada"},
                    {"__typename": "Post", "id": 2, "title": "Notes"},
                    {"__typename": "Query"}
                ])
                .into())
            }))
            .field(MetaField::new("search", "[SearchResult!]!").resolver(|_| {
                Ok(json!([{"id": 3, "title": "Engines"}, {"id": 4, "name": "Grace"}]).into())
            }))
            .into(),
    ])
}

#[test]
fn abstract_types_and_typename() {
    let query = r#"
        {
            __typename
            nodes {
                __typename
                id
                ... on User { name }
                ... on Post { title }
            }
            search {
                kind: __typename
                ... on Node { id }
                ... on Post { title }
            }
        }
    "#;

    insta::assert_json_snapshot!(node_schema().execute(query).unwrap(), @r###"
    {
      "data": {
        "__typename": "Query",
        "nodes": [
          {
            "__typename": "User",
            "id": "1",
            "name": "Ada"
          },
          {
            "__typename": "Post",
            "id": "2",
            "title": "Notes"
          },
          null
        ],
        "search": [
          {
            "kind": "Post",
            "id": "3",
            "title": "Engines"
          },
          {
            "kind": "User",
            "id": "4"
          }
        ]
      },
      "errors": [
        {
          "message": "Abstract type Node must resolve to an object type at runtime for field Query.nodes",
          "locations": [
            {
              "line": 4,
              "column": 13
            }
          ],
          "path": [
            "nodes",
            2
          ]
        }
      ]
    }
    "###);
}

#[test]
fn typename_can_be_disabled() {
    let schema = Schema::build(Registry::default())
        .register(ObjectType::new("Query").field(MetaField::new("a", "Int")))
        .config(ExecutionConfig::from_toml_str("introspectTypename = false").unwrap())
        .finish()
        .unwrap();

    let response = schema.execute("{ __typename }").unwrap();
    assert_eq!(
        response.errors[0].message,
        "Field '__typename' doesn't exist on type 'Query'"
    );
    assert!(response.data.is_none());
}

#[test]
fn mutation_fields_run_serially() {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let step = |name: &'static str, log: &Rc<RefCell<Vec<String>>>| {
        let log = log.clone();
        MetaField::new(name, "String").resolver(move |_| {
            log.borrow_mut().push(format!("{name} called"));
            let log = log.clone();
            Ok(FieldValue::lazy(move || {
                log.borrow_mut().push(format!("{name} done"));
                Ok(name)
            }))
        })
    };

    let schema = Schema::build(Registry::default())
        .register(ObjectType::new("Mutation").field(step("first", &log)).field(step("second", &log)))
        .register(ObjectType::new("Query").field(step("third", &log)).field(step("fourth", &log)))
        .mutation_type("Mutation")
        .finish()
        .unwrap();

    let response = schema.execute("mutation { first second }").unwrap();
    assert_eq!(response.into_json(), json!({"data": {"first": "first", "second": "second"}}));
    assert_eq!(
        log.take(),
        vec!["first called", "first done", "second called", "second done"]
    );

    schema.execute("{ third fourth }").unwrap();
    assert_eq!(
        log.take(),
        vec!["third called", "fourth called", "third done", "fourth done"]
    );
}

struct Shout;

impl FieldMiddleware for Shout {
    fn resolve(&self, ctx: &ResolverContext<'_>, next: Next<'_>) -> Result<FieldValue, FieldError> {
        if ctx.field_name() == "secret" {
            return Err(FieldError::new("Not allowed"));
        }
        match next.run(ctx)? {
            FieldValue::Value(serde_json::Value::String(value)) => Ok(value.to_uppercase().into()),
            other => Ok(other),
        }
    }
}

struct CountCalls(Rc<RefCell<usize>>);

impl FieldMiddleware for CountCalls {
    fn resolve(&self, ctx: &ResolverContext<'_>, next: Next<'_>) -> Result<FieldValue, FieldError> {
        *self.0.borrow_mut() += 1;
        ctx.add_extension("resolverCalls", *self.0.borrow());
        next.run(ctx)
    }
}

#[test]
fn middleware_wraps_resolvers() {
    let calls = Rc::new(RefCell::new(0));
    let schema = Schema::build(Registry::default())
        .register(ObjectType::new("Nested").field(MetaField::new("word", "String")))
        .register(
            ObjectType::new("Query")
                .field(MetaField::new("greeting", "String").resolver(|_| Ok("hello".into())))
                .field(MetaField::new("secret", "String").resolver(|_| Ok("hidden".into())))
                .field(MetaField::new("nested", "Nested").resolver(|_| Ok(json!({"word": "hi"}).into()))),
        )
        .middleware(CountCalls(calls.clone()))
        .middleware(Shout)
        .finish()
        .unwrap();

    insta::assert_json_snapshot!(schema.execute("{ greeting secret nested { word } }").unwrap(), @r###"
    {
      "data": {
        "greeting": "HELLO",
        "secret": null,
        "nested": {
          "word": "HI"
        }
      },
      "errors": [
        {
          "message": "Not allowed",
          "locations": [
            {
              "line": 1,
              "column": 12
            }
          ],
          "path": [
            "secret"
          ]
        }
      ],
      "extensions": {
        "resolverCalls": 4
      }
    }
    "###);
}

#[test]
fn resolvers_read_data_by_type() {
    struct Greeting(&'static str);
    struct Name(String);

    let schema = Schema::build(Registry::default())
        .register(ObjectType::new("Query").field(MetaField::new("hello", "String").resolver(|ctx| {
            let greeting = ctx.data::<Greeting>()?;
            let name = ctx.data_opt::<Name>().map_or("stranger", |name| name.0.as_str());
            Ok(format!("{} {name}", greeting.0).into())
        })))
        .data(Greeting("Hello"))
        .finish()
        .unwrap();

    let response = schema.execute("{ hello }").unwrap();
    assert_eq!(response.into_json(), json!({"data": {"hello": "Hello stranger"}}));

    let response = schema
        .execute(Request::new("{ hello }").data(Name("Ada".to_string())).data(Greeting("Hi")))
        .unwrap();
    assert_eq!(response.into_json(), json!({"data": {"hello": "Hi Ada"}}));
}

#[test]
fn internal_errors_fail_the_execution() {
    let schema = schema(vec![ObjectType::new("Query")
        .field(MetaField::new("a", "Int").resolver(|_| Err(FieldError::internal(anyhow::anyhow!("database is gone")))))
        .into()]);

    let error = schema.execute("{ a }").unwrap_err();
    assert_eq!(error.to_string(), "internal error: database is gone");
}

#[test]
fn limits_reject_queries_before_they_begin() {
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    let schema = Schema::build(Registry::default())
        .register(ObjectType::new("Query").field(MetaField::new("a", "Int")).field(
            MetaField::new("self", "Query").resolver(move |_| {
                *counter.borrow_mut() += 1;
                Ok(json!({"a": 1}).into())
            }),
        ))
        .limit_complexity(4)
        .limit_depth(3)
        .finish()
        .unwrap();

    insta::assert_json_snapshot!(schema.execute("{ self { a self { a } } a }").unwrap(), @r###"
    {
      "errors": [
        {
          "message": "Query has complexity of 5, which exceeds max complexity of 4"
        }
      ]
    }
    "###);
    insta::assert_json_snapshot!(schema.execute("{ self { self { self { a } } } }").unwrap(), @r###"
    {
      "errors": [
        {
          "message": "Query has depth of 4, which exceeds max depth of 3"
        }
      ]
    }
    "###);
    assert_eq!(*calls.borrow(), 0);

    insta::assert_json_snapshot!(schema.execute("{ self { self { a } } }").unwrap(), @r###"
    {
      "data": {
        "self": {
          "self": {
            "a": 1
          }
        }
      }
    }
    "###);
}
