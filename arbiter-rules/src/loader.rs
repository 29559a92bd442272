use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RuleError;

/// Loads rule strings from a file or a directory of rule files.
///
/// Supported files: `.json`/`.yaml`/`.yml` holding either `{rules: [...]}`
/// or a plain list, and `.rules`/`.txt` with one rule per line (`#` starts a
/// comment line). Directory entries are read in file name order.
pub fn load_rule_strings(path: impl AsRef<Path>) -> Result<Vec<String>, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleError::MissingPath(path.display().to_string()));
    }

    let rules = if path.is_dir() {
        load_from_directory(path)?
    } else {
        load_from_file(path)?
    };

    Ok(rules
        .into_iter()
        .map(|rule| rule.trim().to_string())
        .filter(|rule| !rule.is_empty())
        .collect())
}

fn load_from_directory(path: &Path) -> Result<Vec<String>, RuleError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| RuleError::from_io(path, err))? {
        let entry = entry.map_err(|err| RuleError::from_io(path, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| RuleError::from_io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }

        if RuleFileFormat::detect(&entry.path()).is_some() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut rules = Vec::new();
    for file in files {
        rules.append(&mut load_from_file(&file)?);
    }
    Ok(rules)
}

fn load_from_file(path: &Path) -> Result<Vec<String>, RuleError> {
    let format = RuleFileFormat::detect(path).unwrap_or(RuleFileFormat::Lines);
    let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
    match format {
        RuleFileFormat::Document => parse_document(&raw, path),
        RuleFileFormat::Lines => Ok(parse_lines(&raw)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleFileFormat {
    Document,
    Lines,
}

impl RuleFileFormat {
    fn detect(path: &Path) -> Option<Self> {
        match path.extension().and_then(|value| value.to_str()) {
            Some("json" | "yaml" | "yml") => Some(RuleFileFormat::Document),
            Some("rules" | "txt") => Some(RuleFileFormat::Lines),
            _ => None,
        }
    }
}

fn parse_document(raw: &str, path: &Path) -> Result<Vec<String>, RuleError> {
    let mut attempts = Vec::new();

    if let Ok(doc) = serde_yaml::from_str::<RuleDocument>(raw) {
        return Ok(doc.rules);
    }

    attempts.push("rules document");

    if let Ok(list) = serde_yaml::from_str::<Vec<String>>(raw) {
        return Ok(list);
    }

    attempts.push("list");

    let message = format!("unable to parse rules file using {:?} formats", attempts);
    Err(RuleError::load_error(path.to_path_buf(), message))
}

fn parse_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
struct RuleDocument {
    rules: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_yaml_and_json_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let yaml = dir.path().join("a.yaml");
        fs::write(&yaml, "rules:\n  - age > 30\n  - \"salary > 20000\"\n").unwrap();
        let json = dir.path().join("b.json");
        fs::write(&json, r#"["department = 'Sales'", "  "]"#).unwrap();

        assert_eq!(
            load_rule_strings(&yaml).expect("yaml"),
            vec!["age > 30", "salary > 20000"]
        );
        assert_eq!(
            load_rule_strings(&json).expect("json"),
            vec!["department = 'Sales'"]
        );
    }

    #[test]
    fn loads_line_files_skipping_comments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("team.rules");
        fs::write(&file, "# seniors\nage > 30\n\nexperience > 5\n").unwrap();

        assert_eq!(
            load_rule_strings(&file).expect("lines"),
            vec!["age > 30", "experience > 5"]
        );
    }

    #[test]
    fn directories_load_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("2.rules"), "b = 2\n").unwrap();
        fs::write(dir.path().join("1.yml"), "- a = 1\n").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored\n").unwrap();

        assert_eq!(
            load_rule_strings(dir.path()).expect("dir"),
            vec!["a = 1", "b = 2"]
        );
    }

    #[test]
    fn reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            load_rule_strings(dir.path().join("nope.yaml")),
            Err(RuleError::MissingPath(_))
        ));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"rules": 5}"#).unwrap();
        assert!(matches!(
            load_rule_strings(&bad),
            Err(RuleError::Load { .. })
        ));
    }
}
