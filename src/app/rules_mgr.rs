// GuidSleuth - app/rules_mgr.rs
//
// Loads extraction rules from the built-in set (embedded in the binary) and
// from user-defined TOML files on disk. User rules override built-in rules
// with the same ID.

use crate::core::rules::{self, ExtractionRule, RuleSet};
use crate::util::constants;
use crate::util::error::RuleError;
use std::path::{Path, PathBuf};

/// Load all available rules: built-in first, then user-defined overrides.
///
/// Invalid user rule files are logged and skipped (non-fatal).
/// Returns the merged list and any non-fatal errors encountered.
pub fn load_all_rules(user_rule_dir: Option<&Path>) -> (Vec<ExtractionRule>, Vec<RuleError>) {
    let mut loaded = rules::load_builtin_rules();
    let mut errors = Vec::new();

    tracing::debug!(builtin_count = loaded.len(), "Loaded built-in rules");

    if let Some(dir) = user_rule_dir {
        if dir.is_dir() {
            let (user_rules, user_errors) = load_user_rules(dir);
            errors.extend(user_errors);

            for user_rule in user_rules {
                if let Some(pos) = loaded.iter().position(|r| r.id == user_rule.id) {
                    tracing::info!(rule_id = %user_rule.id, "User rule overrides built-in");
                    loaded[pos] = user_rule;
                } else {
                    tracing::info!(rule_id = %user_rule.id, "Loaded user-defined rule");
                    loaded.push(user_rule);
                }
            }
        } else {
            tracing::debug!(
                dir = %dir.display(),
                "User rule directory does not exist (skipping)"
            );
        }
    }

    tracing::debug!(total = loaded.len(), "Rule loading complete");

    (loaded, errors)
}

/// Load rules and merge them into the `RuleSet` the scanners consume,
/// logging every non-fatal error.
pub fn load_rule_set(user_rule_dir: Option<&Path>) -> RuleSet {
    let (loaded, errors) = load_all_rules(user_rule_dir);
    for e in &errors {
        tracing::warn!(error = %e, "Rule skipped");
    }
    RuleSet::from_rules(&loaded)
}

/// Load user-defined rules from `*.toml` files in a directory, in file-name
/// order.
fn load_user_rules(dir: &Path) -> (Vec<ExtractionRule>, Vec<RuleError>) {
    let mut loaded = Vec::new();
    let mut errors = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(RuleError::Io {
                path: dir.to_path_buf(),
                source: e,
            });
            return (loaded, errors);
        }
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry_result in entries {
        match entry_result {
            Ok(entry) => {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("toml") {
                    paths.push(path);
                }
            }
            Err(e) => errors.push(RuleError::Io {
                path: dir.to_path_buf(),
                source: e,
            }),
        }
    }
    paths.sort();

    if paths.len() > constants::MAX_RULE_FILES {
        tracing::warn!(
            count = paths.len(),
            max = constants::MAX_RULE_FILES,
            "Too many rule files, truncating"
        );
        errors.push(RuleError::TooManyRules {
            count: paths.len(),
            max: constants::MAX_RULE_FILES,
        });
        paths.truncate(constants::MAX_RULE_FILES);
    }

    for path in paths {
        match load_rule_file(&path) {
            Ok(rule) => loaded.push(rule),
            Err(e) => errors.push(e),
        }
    }

    (loaded, errors)
}

fn load_rule_file(path: &Path) -> Result<ExtractionRule, RuleError> {
    let metadata = std::fs::metadata(path).map_err(|source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if metadata.len() > constants::MAX_RULE_FILE_SIZE {
        return Err(RuleError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: constants::MAX_RULE_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let def = rules::parse_rule_toml(&content, path)?;
    rules::validate_and_compile(def, path, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EXTRA_RULE: &str = r#"
[rule]
id = "container-paths"
name = "Container paths"

[markers]
needles = ["ContainerManager"]

[paths]
patterns = ['/Containers/Shared/([0-9A-F\-]{36})/']
"#;

    #[test]
    fn test_builtin_only_without_directory() {
        let (loaded, errors) = load_all_rules(None);
        assert!(errors.is_empty());
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].is_builtin);
    }

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let (loaded, errors) = load_all_rules(Some(Path::new("/nonexistent/guidsleuth/rules")));
        assert!(errors.is_empty());
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_user_rule_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("extra.toml"), EXTRA_RULE).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (loaded, errors) = load_all_rules(Some(dir.path()));
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].id, "container-paths");
        assert!(!loaded[1].is_builtin);
    }

    #[test]
    fn test_user_rule_overrides_builtin_by_id() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("override.toml"),
            "[rule]\nid = \"bookassetd\"\n[markers]\nneedles = [\"OnlyThis\"]\n",
        )
        .unwrap();

        let (loaded, _) = load_all_rules(Some(dir.path()));
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].markers.len(), 1);
        assert!(!loaded[0].is_builtin);

        let set = load_rule_set(Some(dir.path()));
        assert_eq!(set.markers()[0].as_bytes(), b"OnlyThis");
        assert!(set.path_patterns().is_empty());
    }

    #[test]
    fn test_invalid_and_oversized_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.toml"), "[rule\nid=").unwrap();
        let big = format!(
            "{EXTRA_RULE}\n# {}\n",
            "x".repeat(constants::MAX_RULE_FILE_SIZE as usize)
        );
        fs::write(dir.path().join("huge.toml"), big).unwrap();

        let (loaded, errors) = load_all_rules(Some(dir.path()));
        assert_eq!(loaded.len(), 1);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], RuleError::TomlParse { .. }));
        assert!(matches!(errors[1], RuleError::FileTooLarge { .. }));
    }
}
