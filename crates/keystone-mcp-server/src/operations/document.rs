use crate::operations::SelectionNode;
use apollo_compiler::ast::{InputValueDefinition, OperationType, Type};
use apollo_compiler::{Name, Node};
use std::fmt;

/// A variable declared by a synthesized document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<String>,
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}: {}", self.name, self.ty)?;
        if let Some(default_value) = &self.default_value {
            write!(f, " = {default_value}")?;
        }
        Ok(())
    }
}

/// An executable document invoking a single root field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDocument {
    pub operation: OperationType,
    pub name: String,
    pub variables: Vec<Variable>,
    pub field: Name,
    pub selection: Vec<SelectionNode>,
}

/// Assemble the document that invokes `field` with every argument bound to a same-named
/// variable. Argument defaults carry over to the variable declarations.
///
/// An empty selection means the field returns a leaf, so no selection block is rendered.
pub fn synthesize(
    operation: OperationType,
    field: &Name,
    arguments: &[Node<InputValueDefinition>],
    selection: Vec<SelectionNode>,
) -> QueryDocument {
    QueryDocument {
        operation,
        name: operation_name(field),
        variables: arguments
            .iter()
            .map(|argument| Variable {
                name: argument.name.clone(),
                ty: argument.ty.as_ref().clone(),
                default_value: argument.default_value.as_ref().map(ToString::to_string),
            })
            .collect(),
        field: field.clone(),
        selection,
    }
}

/// Upper-case the first character of a field name
fn operation_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn keyword(operation: OperationType) -> &'static str {
    match operation {
        OperationType::Query => "query",
        OperationType::Mutation => "mutation",
        OperationType::Subscription => "subscription",
    }
}

impl fmt::Display for QueryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", keyword(self.operation), self.name)?;
        if !self.variables.is_empty() {
            let declarations = self
                .variables
                .iter()
                .map(Variable::to_string)
                .collect::<Vec<_>>();
            write!(f, "({})", declarations.join(", "))?;
        }
        writeln!(f, " {{")?;

        write!(f, "  {}", self.field)?;
        if !self.variables.is_empty() {
            let arguments = self
                .variables
                .iter()
                .map(|variable| format!("{name}: ${name}", name = variable.name))
                .collect::<Vec<_>>();
            write!(f, "({})", arguments.join(", "))?;
        }
        if !self.selection.is_empty() {
            writeln!(f, " {{")?;
            for node in &self.selection {
                writeln!(f, "    {node}")?;
            }
            write!(f, "  }}")?;
        }

        write!(f, "\n}}")
    }
}
