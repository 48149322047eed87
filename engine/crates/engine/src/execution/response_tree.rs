use indexmap::IndexMap;

pub(crate) type NodeId = usize;

#[derive(Debug)]
enum Slot {
    Pending,
    Null,
    Leaf(serde_json::Value),
    List(Vec<NodeId>),
    Object(IndexMap<String, NodeId>),
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    nullable: bool,
    slot: Slot,
}

/// The `data` of a response while it is being built.
///
/// Every field and list element gets a node as soon as its parent is known, so the order of
/// the response follows the selections no matter when values come in. Nulls bubble up to the
/// closest nullable node.
#[derive(Debug)]
pub(crate) struct ResponseTree {
    nodes: Vec<Node>,
}

impl ResponseTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        ResponseTree {
            nodes: vec![Node {
                parent: None,
                nullable: true,
                slot: Slot::Pending,
            }],
        }
    }

    fn push(&mut self, parent: NodeId, nullable: bool) -> NodeId {
        self.nodes.push(Node {
            parent: Some(parent),
            nullable,
            slot: Slot::Pending,
        });
        self.nodes.len() - 1
    }

    /// Turns `id` into an object with one pending child per key.
    pub fn set_object(&mut self, id: NodeId, keys: impl IntoIterator<Item = (String, bool)>) -> Vec<NodeId> {
        let mut fields = IndexMap::new();
        for (key, nullable) in keys {
            let child = self.push(id, nullable);
            fields.insert(key, child);
        }
        let children = fields.values().copied().collect();
        self.nodes[id].slot = Slot::Object(fields);
        children
    }

    /// Turns `id` into a list of `len` pending elements.
    pub fn set_list(&mut self, id: NodeId, len: usize, nullable_items: bool) -> Vec<NodeId> {
        let items = (0..len).map(|_| self.push(id, nullable_items)).collect::<Vec<_>>();
        self.nodes[id].slot = Slot::List(items.clone());
        items
    }

    pub fn set_leaf(&mut self, id: NodeId, value: serde_json::Value) {
        self.nodes[id].slot = Slot::Leaf(value);
    }

    /// Sets `id` to null, or the closest nullable ancestor if `id` is not nullable. Returns the
    /// node that became null.
    pub fn set_null(&mut self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            let node = &mut self.nodes[current];
            match node.parent {
                Some(parent) if !node.nullable => current = parent,
                _ => {
                    node.slot = Slot::Null;
                    return current;
                }
            }
        }
    }

    /// Whether the value of `id` can still make it into the response.
    pub fn is_live(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = &self.nodes[id];
            if matches!(node.slot, Slot::Null) {
                return false;
            }
            current = node.parent;
        }
        true
    }

    pub fn into_json(self) -> serde_json::Value {
        let mut slots = self.nodes.into_iter().map(|node| Some(node.slot)).collect::<Vec<_>>();
        take_json(&mut slots, Self::ROOT)
    }
}

fn take_json(slots: &mut [Option<Slot>], id: NodeId) -> serde_json::Value {
    match slots.get_mut(id).and_then(Option::take) {
        Some(Slot::Leaf(value)) => value,
        Some(Slot::List(items)) => serde_json::Value::Array(items.into_iter().map(|item| take_json(slots, item)).collect()),
        Some(Slot::Object(fields)) => serde_json::Value::Object(
            fields
                .into_iter()
                .map(|(key, field)| (key, take_json(slots, field)))
                .collect(),
        ),
        Some(Slot::Null | Slot::Pending) | None => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_selection_order() {
        let mut tree = ResponseTree::new();
        let &[a, b] = tree.set_object(ResponseTree::ROOT, [("a".into(), true), ("b".into(), true)]).as_slice() else {
            unreachable!();
        };
        tree.set_leaf(b, json!(2));
        tree.set_leaf(a, json!(1));
        assert_eq!(tree.into_json(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn nulls_bubble_to_the_closest_nullable_node() {
        let mut tree = ResponseTree::new();
        let &[thing, other] = tree.set_object(ResponseTree::ROOT, [("thing".into(), true), ("other".into(), true)]).as_slice()
        else {
            unreachable!();
        };
        tree.set_leaf(other, json!("ok"));
        let &[id] = tree.set_object(thing, [("id".into(), false)]).as_slice() else {
            unreachable!();
        };
        let items = tree.set_list(id, 2, false);

        assert_eq!(tree.set_null(items[1]), thing);
        assert!(!tree.is_live(items[0]));
        assert!(tree.is_live(other));
        assert_eq!(tree.into_json(), json!({"thing": null, "other": "ok"}));
    }

    #[test]
    fn list_elements_are_isolated() {
        let mut tree = ResponseTree::new();
        let &[list] = tree.set_object(ResponseTree::ROOT, [("list".into(), true)]).as_slice() else {
            unreachable!();
        };
        let items = tree.set_list(list, 3, true);
        tree.set_leaf(items[0], json!(0));
        tree.set_null(items[1]);
        tree.set_leaf(items[2], json!(2));
        assert_eq!(tree.into_json(), json!({"list": [0, null, 2]}));
    }

    #[test]
    fn null_root() {
        let mut tree = ResponseTree::new();
        let &[field] = tree.set_object(ResponseTree::ROOT, [("field".into(), false)]).as_slice() else {
            unreachable!();
        };
        assert_eq!(tree.set_null(field), ResponseTree::ROOT);
        assert_eq!(tree.into_json(), json!(null));
    }
}
