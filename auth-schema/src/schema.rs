use crate::models::SchemaConstruct;
use auth_attributes::AttributeType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Compiled authorization schema: every entity and rule of one tenant version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub entity_definitions: BTreeMap<String, EntityDefinition>,
    pub rule_definitions: BTreeMap<String, RuleDefinition>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_definitions.is_empty() && self.rule_definitions.is_empty()
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&EntityDefinition> {
        self.entity_definitions.get(name)
    }

    pub fn rule_by_name(&self, name: &str) -> Option<&RuleDefinition> {
        self.rule_definitions.get(name)
    }

    /// Split the schema into one named construct per entity and rule, each serialized
    /// in canonical form.
    pub fn constructs(&self) -> Vec<SchemaConstruct> {
        let entities = self
            .entity_definitions
            .values()
            .map(|entity| SchemaConstruct::new(&entity.name, &entity.to_string()));
        let rules = self
            .rule_definitions
            .values()
            .map(|rule| SchemaConstruct::new(&rule.name, &rule.to_string()));
        entities.chain(rules).collect()
    }
}

impl fmt::Display for SchemaDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for entity in self.entity_definitions.values() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{}", entity)?;
        }
        for rule in self.rule_definitions.values() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}

/// An entity type with its relations, attributes and permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    pub relations: Vec<RelationDefinition>,
    pub attributes: Vec<AttributeDefinition>,
    pub permissions: Vec<PermissionDefinition>,
}

impl EntityDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            relations: Vec::new(),
            attributes: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn permission(&self, name: &str) -> Option<&PermissionDefinition> {
        self.permissions.iter().find(|p| p.name == name)
    }
}

impl fmt::Display for EntityDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "entity {} {{", self.name)?;
        for relation in &self.relations {
            writeln!(f, "    {}", relation)?;
        }
        for attribute in &self.attributes {
            writeln!(f, "    {}", attribute)?;
        }
        for permission in &self.permissions {
            writeln!(f, "    {}", permission)?;
        }
        write!(f, "}}")
    }
}

/// A relation and the subject types allowed to fill it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    pub name: String,
    pub relation_references: Vec<RelationReference>,
}

impl fmt::Display for RelationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relation {}", self.name)?;
        for reference in &self.relation_references {
            write!(f, " {}", reference)?;
        }
        Ok(())
    }
}

/// `@user` or `@organization#member`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationReference {
    pub entity_type: String,
    pub relation: Option<String>,
}

impl RelationReference {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            relation: None,
        }
    }

    pub fn with_relation(entity_type: &str, relation: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            relation: Some(relation.to_string()),
        }
    }
}

impl fmt::Display for RelationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "@{}#{}", self.entity_type, relation),
            None => write!(f, "@{}", self.entity_type),
        }
    }
}

/// A typed attribute declared on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl fmt::Display for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attribute {} {}", self.name, self.attribute_type.as_tag())
    }
}

/// A named permission. The expression is kept as written; evaluating it is the
/// checker's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    pub name: String,
    pub expression: String,
}

impl fmt::Display for PermissionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "permission {} = {}", self.name, self.expression)
    }
}

/// A parameterized boolean rule over attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    pub arguments: Vec<RuleArgument>,
    pub expression: String,
}

impl fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arguments = self
            .arguments
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "rule {}({}) {{\n    {}\n}}",
            self.name, arguments, self.expression
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleArgument {
    pub name: String,
    pub argument_type: AttributeType,
}

impl fmt::Display for RuleArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.argument_type.as_tag())
    }
}

/// Failure to turn definition text into a [`SchemaDefinition`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct CompileError {
    pub line: usize,
    pub message: String,
}

impl CompileError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Turns schema definition text into its compiled form.
///
/// Stored constructs are compiled one at a time on read, so an implementation must
/// accept a single construct whose references point at constructs it cannot see.
#[cfg_attr(test, mockall::automock)]
pub trait SchemaCompiler: Send + Sync {
    fn compile(&self, definitions: &[String]) -> Result<SchemaDefinition, CompileError>;
}
