//! Outline extraction with tree-sitter.
//!
//! Produces the declaration-level outline an editor would show for a
//! definitions module: `const`/`let`/`var` declarators, nested object
//! literals, enums and namespaces. Functions and classes are not descended
//! into.

use super::{DocumentSymbol, SymbolKind, SymbolProvider};
use crate::IndexerError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Grammar to parse a file with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    /// TSX for `.tsx`/`.jsx`, plain TypeScript otherwise (the TS grammar
    /// handles JavaScript).
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") | Some("jsx") => Dialect::Tsx,
            _ => Dialect::TypeScript,
        }
    }
}

/// Outline source files by parsing them on demand.
#[derive(Debug, Default)]
pub struct TreeSitterSymbolProvider;

impl TreeSitterSymbolProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SymbolProvider for TreeSitterSymbolProvider {
    async fn document_symbols(&self, path: &Path) -> Result<Vec<DocumentSymbol>, IndexerError> {
        let content = self.open_document(path).await?;
        outline(&content, Dialect::for_path(path)).map_err(|e| match e {
            IndexerError::Parse { message, .. } => IndexerError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    async fn open_document(&self, path: &Path) -> Result<String, IndexerError> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IndexerError::NotFound(path.to_path_buf())
            } else {
                IndexerError::Io(e)
            }
        })
    }
}

/// Parse `content` and return its declaration outline.
pub fn outline(content: &str, dialect: Dialect) -> Result<Vec<DocumentSymbol>, IndexerError> {
    let mut parser = tree_sitter::Parser::new();

    let language = match dialect {
        Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX,
    };

    parser
        .set_language(&language.into())
        .map_err(|e| IndexerError::Parse {
            path: PathBuf::new(),
            message: format!("Failed to set language: {}", e),
        })?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| IndexerError::Parse {
            path: PathBuf::new(),
            message: "Failed to parse content".to_string(),
        })?;

    let mut symbols = Vec::new();
    collect_statements(tree.root_node(), content, &mut symbols);

    debug!(symbol_count = symbols.len(), "Outlined document");

    Ok(symbols)
}

fn text<'s>(node: tree_sitter::Node, content: &'s str) -> &'s str {
    content.get(node.byte_range()).unwrap_or("")
}

fn collect_statements(node: tree_sitter::Node, content: &str, out: &mut Vec<DocumentSymbol>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let declaration = if child.kind() == "export_statement" {
            child.child_by_field_name("declaration")
        } else {
            Some(child)
        };

        if let Some(declaration) = declaration {
            collect_declaration(declaration, content, out);
        }
    }
}

fn collect_declaration(node: tree_sitter::Node, content: &str, out: &mut Vec<DocumentSymbol>) {
    match node.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let kind = if text(node, content).starts_with("const") {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            };

            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                // Destructuring patterns have no single name
                let Some(name) = declarator
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier")
                else {
                    continue;
                };

                let children = declarator
                    .child_by_field_name("value")
                    .map(unwrap_expression)
                    .filter(|v| v.kind() == "object")
                    .map(|object| object_members(object, content))
                    .unwrap_or_default();

                out.push(DocumentSymbol {
                    name: text(name, content).to_string(),
                    kind,
                    range: declarator.byte_range(),
                    children,
                });
            }
        }
        "enum_declaration" => {
            let Some(name) = node.child_by_field_name("name") else {
                return;
            };

            let mut members = Vec::new();
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for member in body.named_children(&mut cursor) {
                    let member_name = match member.kind() {
                        "enum_assignment" => member.child_by_field_name("name"),
                        "property_identifier" | "string" => Some(member),
                        _ => None,
                    };
                    if let Some(member_name) = member_name {
                        members.push(DocumentSymbol::leaf(
                            strip_quotes(text(member_name, content)),
                            SymbolKind::EnumMember,
                            member.byte_range(),
                        ));
                    }
                }
            }

            out.push(DocumentSymbol {
                name: text(name, content).to_string(),
                kind: SymbolKind::Enum,
                range: node.byte_range(),
                children: members,
            });
        }
        "internal_module" | "module" => {
            let (Some(name), Some(body)) = (
                node.child_by_field_name("name"),
                node.child_by_field_name("body"),
            ) else {
                return;
            };

            let mut children = Vec::new();
            collect_statements(body, content, &mut children);

            out.push(DocumentSymbol {
                name: strip_quotes(text(name, content)),
                kind: SymbolKind::Namespace,
                range: node.byte_range(),
                children,
            });
        }
        // `namespace X {}` at statement level is wrapped in an expression
        "expression_statement" => {
            let mut cursor = node.walk();
            for inner in node.named_children(&mut cursor) {
                if inner.kind() == "internal_module" {
                    collect_declaration(inner, content, out);
                }
            }
        }
        _ => {}
    }
}

/// Look through `as const`, `satisfies T` and parentheses.
fn unwrap_expression(node: tree_sitter::Node) -> tree_sitter::Node {
    match node.kind() {
        "as_expression" | "satisfies_expression" | "parenthesized_expression" => node
            .named_child(0)
            .map(unwrap_expression)
            .unwrap_or(node),
        _ => node,
    }
}

fn object_members(object: tree_sitter::Node, content: &str) -> Vec<DocumentSymbol> {
    let mut members = Vec::new();
    let mut cursor = object.walk();

    for member in object.named_children(&mut cursor) {
        if member.kind() != "pair" {
            continue;
        }
        let Some(key) = member.child_by_field_name("key") else {
            continue;
        };

        let children = member
            .child_by_field_name("value")
            .map(unwrap_expression)
            .filter(|v| v.kind() == "object")
            .map(|object| object_members(object, content))
            .unwrap_or_default();

        members.push(DocumentSymbol {
            name: strip_quotes(text(key, content)),
            kind: SymbolKind::Property,
            range: member.byte_range(),
            children,
        });
    }

    members
}

fn strip_quotes(s: &str) -> String {
    s.trim_matches(|c| c == '\'' || c == '"' || c == '`').to_string()
}
