//! Structural checks on the configuration document and its operations.
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::path::{Component, Path};

use super::{Module, Operation};

/// Top-level keys every configuration document must carry.
const REQUIRED_KEYS: &[&str] = &["version", "install_dir", "log_file", "modules"];

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Aborts loading before anything touches the filesystem.
    Error,
    /// Reported, loading continues.
    Warning,
}

/// A finding produced while validating a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Whether this finding aborts loading.
    pub severity: Severity,
    /// The module or document location the finding refers to.
    pub item: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationIssue {
    /// Create a finding that aborts loading.
    #[must_use]
    pub fn error(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            item: item.into(),
            message: message.into(),
        }
    }

    /// Create a finding that is reported only.
    #[must_use]
    pub fn warning(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            item: item.into(),
            message: message.into(),
        }
    }

    /// Whether this finding aborts loading.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.message)
    }
}

/// Trait for configuration validators.
///
/// Implementations check one aspect of the configuration:
/// - Required fields and value shapes
/// - Paths that would escape the install directory
/// - Sources that do not exist on disk
pub trait ConfigValidator {
    /// Validate against the directory holding the configuration file.
    fn validate(&self, config_dir: &Path) -> Vec<ValidationIssue>;

    /// Return a human-readable name for this validator.
    fn name(&self) -> &'static str;
}

/// Structural checks on the raw JSON document, run before deserialisation.
#[derive(Debug)]
pub struct DocumentValidator<'a> {
    document: &'a Value,
}

impl<'a> DocumentValidator<'a> {
    /// Validate `document`.
    #[must_use]
    pub const fn new(document: &'a Value) -> Self {
        Self { document }
    }
}

impl ConfigValidator for DocumentValidator<'_> {
    fn validate(&self, _config_dir: &Path) -> Vec<ValidationIssue> {
        let Some(root) = self.document.as_object() else {
            return vec![ValidationIssue::error("document", "must be a JSON object")];
        };

        let mut issues: Vec<ValidationIssue> = REQUIRED_KEYS
            .iter()
            .filter(|key| !root.contains_key(**key))
            .map(|key| ValidationIssue::error("document", format!("missing required key '{key}'")))
            .collect();

        for key in ["install_dir", "log_file"] {
            if let Some(value) = root.get(key)
                && !value.is_string()
            {
                issues.push(ValidationIssue::error(key, "must be a string"));
            }
        }

        match root.get("modules") {
            Some(Value::Object(modules)) => {
                for (name, module) in modules {
                    if name.trim().is_empty() {
                        issues.push(ValidationIssue::error("modules", "module name is empty"));
                    }
                    if !module.is_object() {
                        issues.push(ValidationIssue::error(name.as_str(), "must be an object"));
                    } else if let Some(ops) = module.get("operations")
                        && !ops.is_array()
                    {
                        issues.push(ValidationIssue::error(
                            name.as_str(),
                            "'operations' must be a list",
                        ));
                    }
                }
            }
            Some(_) => issues.push(ValidationIssue::error("modules", "must be an object")),
            None => {}
        }

        issues
    }

    fn name(&self) -> &'static str {
        "document"
    }
}

/// Checks on each module's typed operation list.
#[derive(Debug)]
pub struct OperationValidator<'a> {
    modules: &'a IndexMap<String, Module>,
}

impl<'a> OperationValidator<'a> {
    /// Validate the operations of `modules`.
    #[must_use]
    pub const fn new(modules: &'a IndexMap<String, Module>) -> Self {
        Self { modules }
    }
}

impl ConfigValidator for OperationValidator<'_> {
    fn validate(&self, config_dir: &Path) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (name, module) in self.modules {
            if module.operations.is_empty() {
                issues.push(ValidationIssue::warning(name.as_str(), "module has no operations"));
            }

            for op in &module.operations {
                let item = format!("{name} ({})", op.kind());

                if let Operation::RunCommand { command, .. } = op
                    && command.trim().is_empty()
                {
                    issues.push(ValidationIssue::error(item.as_str(), "command is empty"));
                }

                if let Some(source) = op.source() {
                    if source.as_os_str().is_empty() {
                        issues.push(ValidationIssue::error(item.as_str(), "source is empty"));
                    } else if !config_dir.join(source).exists() {
                        issues.push(ValidationIssue::warning(
                            item.as_str(),
                            format!("source does not exist: {}", source.display()),
                        ));
                    }
                }

                if let Some(target) = op.target()
                    && let Some(problem) = target_problem(target)
                {
                    issues.push(ValidationIssue::error(item.as_str(), problem));
                }
            }
        }

        issues
    }

    fn name(&self) -> &'static str {
        "operations"
    }
}

/// Reject targets that would land outside the install directory.
fn target_problem(target: &Path) -> Option<String> {
    if target.as_os_str().is_empty() {
        return Some("target is empty".to_string());
    }
    if target.is_absolute() || target.has_root() {
        return Some(format!("target must be relative: {}", target.display()));
    }
    if target
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Some(format!(
            "target must stay inside the install directory: {}",
            target.display()
        ));
    }
    if target.components().all(|c| matches!(c, Component::CurDir)) {
        return Some(format!(
            "target must name a path below the install directory: {}",
            target.display()
        ));
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn modules(ops: Vec<Operation>) -> IndexMap<String, Module> {
        IndexMap::from([(
            "tools".to_string(),
            Module {
                description: String::new(),
                enabled: true,
                operations: ops,
            },
        )])
    }

    #[test]
    fn document_requires_object() {
        let doc = json!([1, 2]);
        let issues = DocumentValidator::new(&doc).validate(Path::new("."));
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }

    #[test]
    fn document_reports_each_missing_key() {
        let doc = json!({"version": "1.0", "modules": {}});
        let issues = DocumentValidator::new(&doc).validate(Path::new("."));
        let messages: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            [
                "document: missing required key 'install_dir'",
                "document: missing required key 'log_file'",
            ]
        );
    }

    #[test]
    fn document_rejects_empty_module_name_and_bad_operations() {
        let doc = json!({
            "version": "1.0",
            "install_dir": "~/.claude",
            "log_file": "install.log",
            "modules": {" ": {}, "dev": {"operations": {}}}
        });
        let issues = DocumentValidator::new(&doc).validate(Path::new("."));
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(ValidationIssue::is_error));
    }

    #[test]
    fn valid_document_has_no_issues() {
        let doc = json!({
            "version": "1.0",
            "install_dir": "~/.claude",
            "log_file": "install.log",
            "modules": {"dev": {"enabled": true, "operations": []}}
        });
        assert!(DocumentValidator::new(&doc).validate(Path::new(".")).is_empty());
    }

    #[test]
    fn missing_source_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mods = modules(vec![Operation::CopyDir {
            source: "absent".into(),
            target: "tools".into(),
        }]);
        let issues = OperationValidator::new(&mods).validate(dir.path());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].message.contains("absent"));
    }

    #[test]
    fn escaping_and_absolute_targets_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s.json"), "{}").unwrap();
        let mods = modules(vec![
            Operation::CopyFile {
                source: "s.json".into(),
                target: "../outside.json".into(),
            },
            Operation::MergeJson {
                source: "s.json".into(),
                target: "/etc/settings.json".into(),
                merge_key: None,
            },
        ]);
        let issues = OperationValidator::new(&mods).validate(dir.path());
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(ValidationIssue::is_error));
    }

    #[test]
    fn targets_naming_the_install_dir_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s.md"), "x").unwrap();
        let mods = modules(vec![
            Operation::CopyFile {
                source: "s.md".into(),
                target: ".".into(),
            },
            Operation::CopyDir {
                source: ".".into(),
                target: "./".into(),
            },
            Operation::CopyFile {
                source: "s.md".into(),
                target: "./docs/s.md".into(),
            },
        ]);
        let issues = OperationValidator::new(&mods).validate(dir.path());
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(ValidationIssue::is_error));
        assert!(issues[0].to_string().contains("below the install directory"));
    }

    #[test]
    fn empty_command_is_an_error() {
        let mods = modules(vec![Operation::RunCommand {
            command: "  ".into(),
            env: IndexMap::new(),
        }]);
        let issues = OperationValidator::new(&mods).validate(Path::new("."));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].to_string(), "tools (run_command): command is empty");
    }

    #[test]
    fn module_without_operations_is_a_warning() {
        let mods = modules(Vec::new());
        let issues = OperationValidator::new(&mods).validate(Path::new("."));
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn nested_relative_target_is_accepted() {
        assert_eq!(target_problem(Path::new("commands/dev.md")), None);
        assert_eq!(target_problem(Path::new("./tools")), None);
    }
}
