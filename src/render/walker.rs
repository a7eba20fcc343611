use std::collections::HashMap;
use std::path::Path;

use crate::render::context::VariableBindings;
use crate::render::diagnostic::{Diagnostics, ErrorKind, Location, RenderError, RenderWarning};
use crate::render::expr::Evaluator;
use crate::render::scanner::Delimiters;
use crate::template::{TemplateNode, TemplateTree};

/// The rendered tree plus everything that went wrong producing it.
#[derive(Debug, Clone, Default)]
pub struct RenderResult {
    pub tree: TemplateTree,
    pub warnings: Vec<RenderWarning>,
    pub errors: Vec<RenderError>,
}

impl RenderResult {
    /// True when no fatal error occurred. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold in diagnostics from outside the tree pass (loading, derivation,
    /// writing) and restore path order.
    pub fn absorb(&mut self, diags: Diagnostics) {
        let mut all = Diagnostics {
            warnings: std::mem::take(&mut self.warnings),
            errors: std::mem::take(&mut self.errors),
        };
        all.extend(diags);
        all.sort();
        self.warnings = all.warnings;
        self.errors = all.errors;
    }
}

/// Renders template trees. Delimiters and namespace are fixed at
/// construction and apply to every file.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    delimiters: Delimiters,
    namespace: Option<String>,
}

impl Renderer {
    pub fn new(delimiters: Delimiters, namespace: Option<String>) -> Self {
        Self {
            delimiters,
            namespace,
        }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub fn render(&self, tree: &TemplateTree, bindings: &VariableBindings) -> RenderResult {
        let evaluator = self.evaluator(bindings);
        let mut diags = Diagnostics::default();
        let nodes = render_nodes(&tree.nodes, Path::new(""), &evaluator, &mut diags);
        diags.sort();

        RenderResult {
            tree: TemplateTree::new(nodes),
            warnings: diags.warnings,
            errors: diags.errors,
        }
    }

    /// Render one free-standing string, e.g. a hook command.
    pub fn render_str(
        &self,
        text: &str,
        bindings: &VariableBindings,
        location: &Location,
        diags: &mut Diagnostics,
    ) -> String {
        self.evaluator(bindings).render_str(text, location, diags)
    }

    fn evaluator<'a>(&'a self, bindings: &'a VariableBindings) -> Evaluator<'a> {
        Evaluator::new(bindings, &self.delimiters, self.namespace.as_deref())
    }
}

fn render_nodes(
    nodes: &[TemplateNode],
    parent: &Path,
    evaluator: &Evaluator<'_>,
    diags: &mut Diagnostics,
) -> Vec<TemplateNode> {
    // Resolve every sibling name before looking for collisions.
    let mut resolved = Vec::with_capacity(nodes.len());
    for node in nodes {
        let original = parent.join(node.name());
        let name = evaluator.render_str(node.name(), &Location::name(&original), diags);
        if is_valid_name(&name) {
            resolved.push((node, original, name));
        } else {
            diags.error(ErrorKind::InvalidName { name }, Location::name(original));
        }
    }

    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for (_, original, name) in &resolved {
        if let Some(first) = seen.insert(name.as_str(), original.as_path()) {
            diags.error(
                ErrorKind::NameCollision {
                    name: name.clone(),
                    first: first.to_path_buf(),
                    second: original.clone(),
                },
                Location::name(original),
            );
        }
    }

    let mut out = Vec::with_capacity(resolved.len());
    for (node, original, name) in resolved {
        match node {
            TemplateNode::Directory { children, .. } => {
                let children = render_nodes(children, &original, evaluator, diags);
                out.push(TemplateNode::Directory { name, children });
            }
            TemplateNode::File {
                content,
                is_binary: true,
                ..
            } => out.push(TemplateNode::File {
                name,
                content: content.clone(),
                is_binary: true,
            }),
            TemplateNode::File { content, .. } => match std::str::from_utf8(content) {
                Ok(text) => {
                    let rendered =
                        evaluator.render_str(text, &Location::content(&original, 0), diags);
                    out.push(TemplateNode::File {
                        name,
                        content: rendered.into_bytes(),
                        is_binary: false,
                    });
                }
                Err(e) => diags.error(
                    ErrorKind::IoFailure {
                        message: format!("content is not valid UTF-8: {e}"),
                    },
                    Location::name(original),
                ),
            },
        }
    }
    out
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    fn bindings(pairs: &[(&str, &str)]) -> VariableBindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn file_content<'a>(tree: &'a TemplateTree, path: &str) -> &'a [u8] {
        tree.files()
            .into_iter()
            .find(|(p, _)| p == Path::new(path))
            .map(|(_, node)| match node {
                TemplateNode::File { content, .. } => content.as_slice(),
                TemplateNode::Directory { .. } => unreachable!(),
            })
            .unwrap_or_else(|| panic!("{path} not rendered"))
    }

    #[test]
    fn test_readme_example() {
        let tree = TemplateTree::new(vec![TemplateNode::dir(
            "{{project_slug}}",
            vec![TemplateNode::text("README.md", "Hello {{project_name}}")],
        )]);
        let b = bindings(&[("project_name", "My App"), ("project_slug", "my_app")]);

        let result = Renderer::default().render(&tree, &b);
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
        assert_eq!(file_content(&result.tree, "my_app/README.md"), b"Hello My App");
    }

    #[test]
    fn test_no_placeholders_is_identity() {
        let tree = TemplateTree::new(vec![
            TemplateNode::dir(
                "build-logic",
                vec![TemplateNode::text(
                    "kmp.gradle.kts",
                    "plugins {\n    id(\"com.android.library\")\n}\n",
                )],
            ),
            TemplateNode::binary("icon.png", vec![0x89, b'P', b'N', b'G', 0, 1]),
        ]);

        let result = Renderer::default().render(&tree, &VariableBindings::new());
        assert!(result.is_valid());
        assert_eq!(result.tree, tree);
    }

    #[test]
    fn test_binary_never_scanned() {
        let content = b"\x00\x01{{ missing }}{{oops".to_vec();
        let tree = TemplateTree::new(vec![TemplateNode::binary("blob.bin", content.clone())]);

        let result = Renderer::default().render(&tree, &VariableBindings::new());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
        assert_eq!(file_content(&result.tree, "blob.bin"), content.as_slice());
    }

    #[test]
    fn test_name_collision() {
        let tree = TemplateTree::new(vec![
            TemplateNode::text("{{a}}.txt", "first"),
            TemplateNode::text("{{b}}.txt", "second"),
        ]);
        let b = bindings(&[("a", "x"), ("b", "x")]);

        let result = Renderer::default().render(&tree, &b);
        assert!(!result.is_valid());
        assert_eq!(
            result.errors,
            vec![RenderError {
                kind: ErrorKind::NameCollision {
                    name: "x.txt".into(),
                    first: PathBuf::from("{{a}}.txt"),
                    second: PathBuf::from("{{b}}.txt"),
                },
                location: Location::name("{{b}}.txt"),
            }]
        );
        // Both siblings are still rendered.
        assert_eq!(result.tree.nodes.len(), 2);
    }

    #[test]
    fn test_undefined_variable_in_content() {
        let tree = TemplateTree::new(vec![TemplateNode::text(
            "f.txt",
            "before {{undefined_var}} after",
        )]);

        let result = Renderer::default().render(&tree, &VariableBindings::new());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].kind,
            ErrorKind::UndefinedVariable {
                name: "undefined_var".into()
            }
        );
        assert_eq!(result.errors[0].location, Location::content("f.txt", 7));
        assert_eq!(file_content(&result.tree, "f.txt"), b"before  after");
    }

    #[test]
    fn test_name_diagnostics_carry_offset() {
        let tree = TemplateTree::new(vec![TemplateNode::dir(
            "src",
            vec![TemplateNode::text("app-{{missing}}.txt", "x")],
        )]);

        let result = Renderer::default().render(&tree, &VariableBindings::new());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].location,
            Location::Name {
                path: PathBuf::from("src/app-{{missing}}.txt"),
                offset: Some(4),
            }
        );
        assert_eq!(
            result.errors[0].to_string(),
            "src/app-{{missing}}.txt:4 (name): undefined variable 'missing'"
        );
    }

    #[test]
    fn test_unterminated_placeholder_left_as_is() {
        let tree = TemplateTree::new(vec![TemplateNode::text("f.txt", "x {{oops")]);

        let result = Renderer::default().render(&tree, &VariableBindings::new());
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].location, Location::content("f.txt", 2));
        assert_eq!(file_content(&result.tree, "f.txt"), b"x {{oops");
    }

    #[rstest]
    #[case("")]
    #[case("..")]
    #[case("a/b")]
    fn test_invalid_resolved_name_skips_node(#[case] value: &str) {
        let tree = TemplateTree::new(vec![
            TemplateNode::text("{{v}}", "x"),
            TemplateNode::text("ok.txt", "y"),
        ]);
        let b = bindings(&[("v", value)]);

        let result = Renderer::default().render(&tree, &b);
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0].kind, ErrorKind::InvalidName { .. }));
        assert_eq!(result.tree.nodes, vec![TemplateNode::text("ok.txt", "y")]);
    }

    #[test]
    fn test_errors_across_files_keep_path_order() {
        let tree = TemplateTree::new(vec![
            TemplateNode::dir("a", vec![TemplateNode::text("z.txt", "{{one}} {{two}}")]),
            TemplateNode::text("b.txt", "{{three}}"),
        ]);

        let result = Renderer::default().render(&tree, &VariableBindings::new());
        let names: Vec<_> = result
            .errors
            .iter()
            .map(|e| match &e.kind {
                ErrorKind::UndefinedVariable { name } => name.as_str(),
                other => panic!("unexpected {other}"),
            })
            .collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_deterministic() {
        let tree = TemplateTree::new(vec![TemplateNode::dir(
            "{{ name | kebab_case }}",
            vec![
                TemplateNode::text("A.kt", "package {{ pkg }}\nclass {{ name | pascal_case }}"),
                TemplateNode::text("B.swift", "let x = \"{{ name }}\""),
            ],
        )]);
        let b = bindings(&[("name", "feature a"), ("pkg", "com.example")]);
        let renderer = Renderer::default();

        let first = renderer.render(&tree, &b);
        let second = renderer.render(&tree, &b);
        assert_eq!(first.tree, second.tree);
        assert_eq!(
            file_content(&first.tree, "feature-a/A.kt"),
            b"package com.example\nclass FeatureA"
        );
    }

    #[test]
    fn test_invalid_utf8_text_is_io_failure() {
        let tree = TemplateTree::new(vec![TemplateNode::File {
            name: "latin1.txt".into(),
            content: vec![b'c', b'a', b'f', 0xE9],
            is_binary: false,
        }]);

        let result = Renderer::default().render(&tree, &VariableBindings::new());
        assert!(matches!(result.errors[0].kind, ErrorKind::IoFailure { .. }));
        assert!(result.tree.nodes.is_empty());
    }
}
