//! Reference compiler for the schema definition language.
//!
//! ```text
//! entity account {
//!     relation owner @user @organization#member
//!     attribute balance double
//!     permission withdraw = owner and check_balance(balance)
//! }
//!
//! rule check_balance(balance double) {
//!     balance >= 5000
//! }
//! ```
//!
//! Permission and rule expressions are captured verbatim (trimmed) and not evaluated.

use crate::schema::{
    AttributeDefinition, CompileError, EntityDefinition, PermissionDefinition,
    RelationDefinition, RelationReference, RuleArgument, RuleDefinition, SchemaCompiler,
    SchemaDefinition,
};
use auth_attributes::AttributeType;
use std::collections::{HashMap, HashSet};

type CompileResult<T> = Result<T, CompileError>;

/// Parses definition text into a [`SchemaDefinition`].
///
/// The default compiler is lenient: relation references may name entities outside
/// the compiled text, which is what single-construct reads need. [`strict`] requires
/// every reference to resolve within the same unit.
///
/// [`strict`]: DefinitionCompiler::strict
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionCompiler {
    strict: bool,
}

impl DefinitionCompiler {
    pub fn new() -> Self {
        Self { strict: false }
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn compile_text(&self, text: &str) -> CompileResult<SchemaDefinition> {
        let mut parser = Parser::new(text);
        let schema = parser.schema()?;
        if self.strict {
            check_references(&schema, &parser.entity_lines)?;
        }
        Ok(schema)
    }
}

impl SchemaCompiler for DefinitionCompiler {
    fn compile(&self, definitions: &[String]) -> CompileResult<SchemaDefinition> {
        self.compile_text(&definitions.join("\n"))
    }
}

fn check_references(
    schema: &SchemaDefinition,
    entity_lines: &HashMap<String, usize>,
) -> CompileResult<()> {
    for entity in schema.entity_definitions.values() {
        let line = entity_lines.get(&entity.name).copied().unwrap_or(0);
        for relation in &entity.relations {
            for reference in &relation.relation_references {
                let target = schema.entity_by_name(&reference.entity_type).ok_or_else(|| {
                    CompileError::new(
                        line,
                        format!(
                            "relation {}.{} references undefined entity '{}'",
                            entity.name, relation.name, reference.entity_type
                        ),
                    )
                })?;
                if let Some(target_relation) = &reference.relation {
                    let known = target.relation(target_relation).is_some()
                        || target.permission(target_relation).is_some();
                    if !known {
                        return Err(CompileError::new(
                            line,
                            format!(
                                "relation {}.{} references undefined relation '{}#{}'",
                                entity.name, relation.name, reference.entity_type, target_relation
                            ),
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    entity_lines: HashMap<String, usize>,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            entity_lines: HashMap::new(),
        }
    }

    // =========================================================================
    // Constructs
    // =========================================================================

    fn schema(&mut self) -> CompileResult<SchemaDefinition> {
        let mut schema = SchemaDefinition::new();
        loop {
            self.skip_trivia();
            if self.peek().is_none() {
                return Ok(schema);
            }
            let line = self.line;
            let keyword = self.identifier("'entity' or 'rule'")?;
            let name = match keyword.as_str() {
                "entity" => {
                    let entity = self.entity()?;
                    let name = entity.name.clone();
                    self.declare(&schema, &name, line)?;
                    self.entity_lines.insert(name.clone(), line);
                    schema.entity_definitions.insert(name.clone(), entity);
                    name
                }
                "rule" => {
                    let rule = self.rule()?;
                    let name = rule.name.clone();
                    self.declare(&schema, &name, line)?;
                    schema.rule_definitions.insert(name.clone(), rule);
                    name
                }
                other => {
                    return Err(CompileError::new(
                        line,
                        format!("unexpected '{}', expected 'entity' or 'rule'", other),
                    ))
                }
            };
            tracing::trace!(construct = %name, line, "compiled construct");
        }
    }

    fn declare(&self, schema: &SchemaDefinition, name: &str, line: usize) -> CompileResult<()> {
        if schema.entity_definitions.contains_key(name) || schema.rule_definitions.contains_key(name)
        {
            return Err(CompileError::new(line, format!("duplicate definition '{}'", name)));
        }
        Ok(())
    }

    fn entity(&mut self) -> CompileResult<EntityDefinition> {
        self.skip_trivia();
        let name = self.identifier("entity name")?;
        self.skip_trivia();
        self.expect('{')?;

        let mut entity = EntityDefinition::new(&name);
        let mut members = HashSet::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(self.error(format!("unterminated entity '{}'", name))),
                Some('}') => {
                    self.bump();
                    return Ok(entity);
                }
                Some(_) => {}
            }

            let keyword = self.identifier("'relation', 'attribute' or 'permission'")?;
            self.skip_inline_space();
            let member = self.identifier(&format!("{} name", keyword))?;
            if !members.insert(member.clone()) {
                return Err(self.error(format!("duplicate member '{}' in entity '{}'", member, name)));
            }
            self.skip_inline_space();

            match keyword.as_str() {
                "relation" => {
                    let relation_references = if self.peek() == Some(':') {
                        self.bump();
                        self.skip_inline_space();
                        self.typed_references()?
                    } else {
                        self.relation_references()?
                    };
                    entity.relations.push(RelationDefinition {
                        name: member,
                        relation_references,
                    });
                }
                "attribute" => {
                    let attribute_type = self.type_tag()?;
                    entity.attributes.push(AttributeDefinition {
                        name: member,
                        attribute_type,
                    });
                }
                "permission" => {
                    self.expect('=')?;
                    let expression = self.expression_to_line_end();
                    if expression.is_empty() {
                        return Err(self.error(format!("permission '{}' has no expression", member)));
                    }
                    entity.permissions.push(PermissionDefinition {
                        name: member,
                        expression,
                    });
                }
                other => {
                    return Err(self.error(format!(
                        "unexpected '{}', expected 'relation', 'attribute' or 'permission'",
                        other
                    )))
                }
            }
            self.end_of_member()?;
        }
    }

    fn relation_references(&mut self) -> CompileResult<Vec<RelationReference>> {
        let mut references = Vec::new();
        while self.peek() == Some('@') {
            self.bump();
            references.push(self.reference()?);
            self.skip_inline_space();
        }
        if references.is_empty() {
            return Err(self.error("relation needs at least one '@type' reference"));
        }
        Ok(references)
    }

    /// Short form: `relation owner: user | organization#member`.
    fn typed_references(&mut self) -> CompileResult<Vec<RelationReference>> {
        let mut references = Vec::new();
        loop {
            references.push(self.reference()?);
            self.skip_inline_space();
            if self.peek() != Some('|') {
                return Ok(references);
            }
            self.bump();
            self.skip_inline_space();
        }
    }

    fn reference(&mut self) -> CompileResult<RelationReference> {
        let entity_type = self.identifier("entity type")?;
        let relation = if self.peek() == Some('#') {
            self.bump();
            Some(self.identifier("relation after '#'")?)
        } else {
            None
        };
        Ok(RelationReference {
            entity_type,
            relation,
        })
    }

    fn rule(&mut self) -> CompileResult<RuleDefinition> {
        self.skip_trivia();
        let name = self.identifier("rule name")?;
        self.skip_trivia();
        self.expect('(')?;

        let mut arguments: Vec<RuleArgument> = Vec::new();
        self.skip_trivia();
        if self.peek() == Some(')') {
            self.bump();
        } else {
            loop {
                self.skip_trivia();
                let argument = self.identifier("argument name")?;
                if arguments.iter().any(|a| a.name == argument) {
                    return Err(self.error(format!("duplicate argument '{}' in rule '{}'", argument, name)));
                }
                self.skip_inline_space();
                let argument_type = self.type_tag()?;
                arguments.push(RuleArgument {
                    name: argument,
                    argument_type,
                });
                self.skip_trivia();
                match self.bump() {
                    Some(',') => continue,
                    Some(')') => break,
                    _ => return Err(self.error("expected ',' or ')' in argument list")),
                }
            }
        }

        self.skip_trivia();
        self.expect('{')?;
        let expression = self.block_body(&name)?;
        if expression.is_empty() {
            return Err(self.error(format!("rule '{}' has an empty body", name)));
        }
        Ok(RuleDefinition {
            name,
            arguments,
            expression,
        })
    }

    // =========================================================================
    // Lexing helpers
    // =========================================================================

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn at_comment(&self) -> bool {
        self.peek() == Some('/') && self.chars.get(self.pos + 1) == Some(&'/')
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.at_comment() => self.skip_comment(),
                _ => return,
            }
        }
    }

    fn skip_inline_space(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t') | Some('\r')) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(self.line, message)
    }

    fn expect(&mut self, expected: char) -> CompileResult<()> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected)))
        }
    }

    fn identifier(&mut self, what: &str) -> CompileResult<String> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(self.error(format!("expected {}", what))),
        }
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            ident.push(c);
            self.bump();
        }
        Ok(ident)
    }

    fn type_tag(&mut self) -> CompileResult<AttributeType> {
        let mut tag = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '[' || c == ']' || c == '_') {
                break;
            }
            tag.push(c);
            self.bump();
        }
        AttributeType::from_tag(&tag)
            .ok_or_else(|| self.error(format!("unknown attribute type '{}'", tag)))
    }

    fn expression_to_line_end(&mut self) -> String {
        let mut expression = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' || c == '}' || c == ';' || self.at_comment() {
                break;
            }
            expression.push(c);
            self.bump();
        }
        expression.trim().to_string()
    }

    fn end_of_member(&mut self) -> CompileResult<()> {
        self.skip_inline_space();
        match self.peek() {
            Some(';') => {
                self.bump();
                Ok(())
            }
            None | Some('\n') | Some('}') => Ok(()),
            Some('/') if self.at_comment() => Ok(()),
            Some(c) => Err(self.error(format!("unexpected '{}'", c))),
        }
    }

    /// Text up to the brace closing the block just opened, comments removed.
    fn block_body(&mut self, name: &str) -> CompileResult<String> {
        let mut body = String::new();
        let mut depth = 1usize;
        loop {
            if self.at_comment() {
                self.skip_comment();
                continue;
            }
            match self.bump() {
                None => return Err(self.error(format!("unterminated body of '{}'", name))),
                Some('{') => {
                    depth += 1;
                    body.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(body.trim().to_string());
                    }
                    body.push('}');
                }
                Some(c) => body.push(c),
            }
        }
    }
}
