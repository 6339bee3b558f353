//! Catalog writing for pnpm-workspace.yaml
//!
//! Version strings are replaced in place so comments, key order and quote
//! style survive. Entries that cannot be located line by line (flow-style
//! mappings, anchors) fall back to re-serializing the document.

use crate::domain::DEFAULT_CATALOG;
use crate::error::WorkspaceError;
use regex::Regex;
use std::path::{Path, PathBuf};

/// One catalog entry to rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogChange {
    pub catalog: String,
    pub package: String,
    pub new_range: String,
}

impl CatalogChange {
    pub fn new(
        catalog: impl Into<String>,
        package: impl Into<String>,
        new_range: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            package: package.into(),
            new_range: new_range.into(),
        }
    }
}

/// Which top-level block the scanner is in
#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    Other,
    /// `catalog:` block
    Default,
    /// `catalogs:` block, with the named catalog currently open
    Named {
        name_indent: Option<usize>,
        current: Option<String>,
    },
}

/// Writer for the catalog blocks of pnpm-workspace.yaml
pub struct CatalogWriter {
    path: PathBuf,
    entry: Regex,
}

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(raw)
}

/// A line with any trailing `# comment` removed; `#` inside quotes is kept
fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    let mut prev_blank = true;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '#') if prev_blank => return line[..i].trim_end(),
            _ => {}
        }
        prev_blank = c.is_whitespace();
    }
    line.trim_end()
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

impl CatalogWriter {
    /// Create a writer; `path` is only used in error messages
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let path = path.into();
        // indent, key, separator, value, trailing comment
        let entry = Regex::new(
            r#"^(\s+)("[^"]+"|'[^']+'|[^\s"'#:][^:#]*?)(\s*:\s+)("[^"]*"|'[^']*'|[^\s"'#][^#]*?)(\s+#.*|\s*)$"#,
        )
        .map_err(|e| WorkspaceError::parse_error(&path, format!("invalid regex pattern: {}", e)))?;
        Ok(Self { path, entry })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply changes to the file content
    pub fn apply(&self, content: &str, changes: &[CatalogChange]) -> Result<String, WorkspaceError> {
        if changes.is_empty() {
            return Ok(content.to_string());
        }

        let (rewritten, applied) = self.rewrite_lines(content, changes);
        if applied.iter().all(|done| *done) {
            return Ok(rewritten);
        }

        log::warn!(
            "could not rewrite {} in place, re-serializing",
            self.path.display()
        );
        self.reserialize(content, changes)
    }

    fn rewrite_lines(&self, content: &str, changes: &[CatalogChange]) -> (String, Vec<bool>) {
        let mut applied = vec![false; changes.len()];
        let mut section = Section::Other;
        let mut output = String::with_capacity(content.len());

        for raw_line in content.split_inclusive('\n') {
            let body = raw_line.trim_end_matches(['\n', '\r']);
            let ending = &raw_line[body.len()..];
            let trimmed = body.trim_start();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                output.push_str(raw_line);
                continue;
            }

            let indent = indent_of(body);
            if indent == 0 {
                section = match strip_comment(trimmed) {
                    "catalog:" => Section::Default,
                    "catalogs:" => Section::Named {
                        name_indent: None,
                        current: None,
                    },
                    _ => Section::Other,
                };
                output.push_str(raw_line);
                continue;
            }

            let catalog = match &mut section {
                Section::Other => None,
                Section::Default => Some(DEFAULT_CATALOG.to_string()),
                Section::Named {
                    name_indent,
                    current,
                } => {
                    let opens_catalog = match *name_indent {
                        None => true,
                        Some(level) => indent <= level,
                    };
                    if opens_catalog {
                        *name_indent = Some(indent);
                        *current = strip_comment(trimmed)
                            .strip_suffix(':')
                            .map(|name| unquote(name.trim()).to_string());
                        output.push_str(raw_line);
                        continue;
                    }
                    current.clone()
                }
            };

            let replaced = catalog.and_then(|catalog| {
                let caps = self.entry.captures(body)?;
                let key = unquote(&caps[2]);
                let index = changes
                    .iter()
                    .position(|c| c.catalog == catalog && c.package == key)?;

                let old_value = &caps[4];
                let quote = match old_value.chars().next() {
                    Some(q @ ('"' | '\'')) => q.to_string(),
                    _ => String::new(),
                };
                applied[index] = true;
                Some(format!(
                    "{}{}{}{}{}{}{}",
                    &caps[1], &caps[2], &caps[3], quote, changes[index].new_range, quote, &caps[5]
                ))
            });

            match replaced {
                Some(line) => {
                    output.push_str(&line);
                    output.push_str(ending);
                }
                None => output.push_str(raw_line),
            }
        }

        (output, applied)
    }

    fn reserialize(&self, content: &str, changes: &[CatalogChange]) -> Result<String, WorkspaceError> {
        use serde_yaml::Value;

        let mut document: Value = serde_yaml::from_str(content)
            .map_err(|e| WorkspaceError::parse_error(&self.path, e.to_string()))?;

        for change in changes {
            let table = if change.catalog == DEFAULT_CATALOG
                && document.get("catalog").is_some()
            {
                document.get_mut("catalog")
            } else {
                document
                    .get_mut("catalogs")
                    .and_then(|catalogs| catalogs.get_mut(change.catalog.as_str()))
            };

            let slot = table
                .and_then(|t| t.get_mut(change.package.as_str()))
                .ok_or_else(|| {
                    WorkspaceError::package_not_found(&change.catalog, &change.package)
                })?;
            *slot = Value::String(change.new_range.clone());
        }

        serde_yaml::to_string(&document)
            .map_err(|e| WorkspaceError::parse_error(&self.path, e.to_string()))
    }
}
