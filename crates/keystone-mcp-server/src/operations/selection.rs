//! Selection sets for tool return types

use apollo_compiler::Schema as GraphQLSchema;
use apollo_compiler::schema::{ExtendedType, FieldDefinition};
use std::fmt;

/// One field of a selection set.
///
/// `children` is `None` for leaves and a non-empty list for object fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionNode {
    pub name: String,
    pub children: Option<Vec<SelectionNode>>,
}

impl SelectionNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: None,
        }
    }

    /// An object field, or `None` if nothing below it can be selected
    pub fn object(name: impl Into<String>, children: Vec<SelectionNode>) -> Option<Self> {
        (!children.is_empty()).then(|| Self {
            name: name.into(),
            children: Some(children),
        })
    }
}

impl fmt::Display for SelectionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.children {
            Some(children) => write!(f, "{} {{ {} }}", self.name, render_selection(children)),
            None => f.write_str(&self.name),
        }
    }
}

/// Render selections separated by single spaces
pub fn render_selection(selection: &[SelectionNode]) -> String {
    selection
        .iter()
        .map(SelectionNode::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the selection set for an object or interface type.
///
/// Scalar and enum fields become leaves. Object and interface fields recurse one level
/// deeper and are dropped when nothing below them is selectable. Fields that need
/// arguments to be selected and union fields are skipped. Past `max_depth` the result is
/// empty, which bounds the walk on cyclic schemas.
pub fn build_selection(
    schema: &GraphQLSchema,
    type_name: &str,
    max_depth: usize,
    current_depth: usize,
) -> Vec<SelectionNode> {
    if current_depth > max_depth {
        return Vec::new();
    }

    let fields = match schema.types.get(type_name) {
        Some(ExtendedType::Object(object)) => &object.fields,
        Some(ExtendedType::Interface(interface)) => &interface.fields,
        _ => return Vec::new(),
    };

    fields
        .values()
        .filter(|field| !field.name.starts_with("__") && !requires_arguments(field))
        .filter_map(|field| {
            let element = field.ty.inner_named_type();
            match element.as_str() {
                "String" | "Int" | "Float" | "Boolean" | "ID" => {
                    return Some(SelectionNode::leaf(field.name.as_str()));
                }
                _ => {}
            }

            match schema.types.get(element) {
                Some(ExtendedType::Scalar(_) | ExtendedType::Enum(_)) => {
                    Some(SelectionNode::leaf(field.name.as_str()))
                }
                Some(ExtendedType::Object(_) | ExtendedType::Interface(_)) => SelectionNode::object(
                    field.name.as_str(),
                    build_selection(schema, element, max_depth, current_depth + 1),
                ),
                _ => None,
            }
        })
        .collect()
}

fn requires_arguments(field: &FieldDefinition) -> bool {
    field.arguments.iter().any(|argument| argument.is_required())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::DEFAULT_MAX_DEPTH;
    use rstest::rstest;

    fn schema() -> GraphQLSchema {
        GraphQLSchema::parse_and_validate(include_str!("../testdata/todo.graphql"), "todo.graphql")
            .unwrap()
            .into_inner()
    }

    fn depth(selection: &[SelectionNode]) -> usize {
        selection
            .iter()
            .map(|node| match &node.children {
                Some(children) => 1 + depth(children),
                None => 0,
            })
            .max()
            .unwrap_or(0)
    }

    fn assert_no_empty_children(selection: &[SelectionNode]) {
        for node in selection {
            if let Some(children) = &node.children {
                assert!(!children.is_empty(), "{} has an empty selection", node.name);
                assert_no_empty_children(children);
            }
        }
    }

    #[test]
    fn todo_selection() {
        let selection = build_selection(&schema(), "Todo", 1, 0);

        insta::assert_snapshot!(
            render_selection(&selection),
            @"id label isComplete status priority dueDate metadata assignedTo { id name email }"
        );
    }

    #[test]
    fn scenario_selection_contains_assignee() {
        let selection = build_selection(&schema(), "Todo", DEFAULT_MAX_DEPTH, 0);

        assert!(selection.contains(&SelectionNode::leaf("id")));
        assert!(selection.contains(&SelectionNode::leaf("label")));
        let assigned_to = selection
            .iter()
            .find(|node| node.name == "assignedTo")
            .and_then(|node| node.children.as_ref())
            .unwrap();
        assert!(assigned_to.contains(&SelectionNode::leaf("id")));
        assert!(assigned_to.contains(&SelectionNode::leaf("name")));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(5)]
    fn never_recurses_past_the_bound(#[case] max_depth: usize) {
        let selection = build_selection(&schema(), "User", max_depth, 0);

        assert!(depth(&selection) <= max_depth);
        assert_no_empty_children(&selection);
    }

    #[test]
    fn past_the_bound_is_empty() {
        assert!(build_selection(&schema(), "Todo", 2, 3).is_empty());
    }

    #[test]
    fn object_without_selectable_leaves_is_dropped() {
        // At the bound, `password { isSet }` and `role { ... }` cannot recurse any further
        let selection = build_selection(&schema(), "User", 0, 0);

        assert_eq!(render_selection(&selection), "id name email");
    }

    #[test]
    fn skips_fields_that_need_arguments_and_unions() {
        let schema = schema();

        let role = build_selection(&schema, "Role", DEFAULT_MAX_DEPTH, 0);
        assert!(!role.iter().any(|node| node.name == "assignedTo"));

        let query = build_selection(&schema, "Query", 1, 0);
        assert!(!query.iter().any(|node| node.name == "authenticatedItem"));
        assert!(!query.iter().any(|node| node.name == "todo"));
        assert!(!query.iter().any(|node| node.name == "node"));
        assert!(query.iter().any(|node| node.name == "todos"));
    }

    #[test]
    fn interfaces_recurse() {
        let selection = build_selection(&schema(), "Node", DEFAULT_MAX_DEPTH, 0);

        assert_eq!(selection, vec![SelectionNode::leaf("id")]);
    }

    #[test]
    fn renders_nested_nodes() {
        let node = SelectionNode::object(
            "assignedTo",
            vec![SelectionNode::leaf("id"), SelectionNode::leaf("name")],
        )
        .unwrap();

        assert_eq!(node.to_string(), "assignedTo { id name }");
        assert_eq!(SelectionNode::object("empty", Vec::new()), None);
    }
}
