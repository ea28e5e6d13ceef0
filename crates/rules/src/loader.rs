//! YAML rule files.
//!
//! A rule file is either a bare list of rules or a mapping with a `rules`
//! key:
//!
//! ```yaml
//! rules:
//!   - name: low_sinr
//!     measurement_pattern: "^serv_sinr_cell_"
//!     threshold: -5
//!     comparator: "<"
//!     level: warning
//!     message_template: "{{ measurement }} = {{ value|round(2) }}dB"
//!     consecutive_violations: 2
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{Result, RuleError};
use crate::schema::{RuleSpec, ThresholdRule};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleFile {
    Wrapped { rules: Vec<RuleSpec> },
    List(Vec<RuleSpec>),
}

/// Parse and validate rules from YAML text. Rule names must be unique.
pub fn parse_rules(yaml: &str) -> Result<Vec<ThresholdRule>> {
    let specs = match serde_yaml::from_str::<RuleFile>(yaml)? {
        RuleFile::Wrapped { rules } | RuleFile::List(rules) => rules,
    };

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(specs.len());
    for spec in specs {
        if !seen.insert(spec.name.clone()) {
            return Err(RuleError::Validation(format!(
                "duplicate rule name '{}'",
                spec.name
            )));
        }
        rules.push(ThresholdRule::try_from(spec)?);
    }
    Ok(rules)
}

/// Load and validate a rule file.
pub fn load_rules_file(path: &Path) -> Result<Vec<ThresholdRule>> {
    let text = std::fs::read_to_string(path)?;
    let rules = parse_rules(&text)?;
    info!(path = %path.display(), count = rules.len(), "loaded rule file");
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use simwatch_core::AlertLevel;

    use super::*;
    use crate::schema::Comparator;

    const WRAPPED: &str = r#"
rules:
  - name: low_sinr
    measurement_pattern: "^serv_sinr_cell_"
    threshold: -5
    comparator: "<"
    level: warning
    message_template: "{{ measurement }} = {{ value|round(2) }}dB"
    consecutive_violations: 2
    cooldown_seconds: 30
  - name: overload
    measurement_pattern: "^active_ue_count$"
    threshold: 20
    comparator: gt
    level: critical
    message_template: "{{ value }} UEs"
    enabled: false
"#;

    #[test]
    fn parses_wrapped_file_with_defaults() {
        let rules = parse_rules(WRAPPED).unwrap();
        assert_eq!(rules.len(), 2);

        let low = &rules[0];
        assert_eq!(low.comparator, Comparator::Lt);
        assert_eq!(low.level, AlertLevel::Warning);
        assert_eq!(low.consecutive_violations, 2);
        assert_eq!(low.cooldown_seconds, 30);
        assert!(low.pattern.is_match("serv_sinr_cell_3"));

        let overload = &rules[1];
        assert_eq!(overload.comparator, Comparator::Gt);
        assert_eq!(overload.cooldown_seconds, 60);
        assert_eq!(overload.consecutive_violations, 1);
        assert!(!overload.enabled);
    }

    #[test]
    fn parses_bare_list() {
        let yaml = r#"
- name: eq_rule
  measurement_pattern: ".*"
  threshold: 0
  comparator: "=="
  level: info
  message_template: "zero"
"#;
        let rules = parse_rules(yaml).unwrap();
        assert_eq!(rules[0].comparator, Comparator::Eq);
        assert!(rules[0].enabled);
    }

    #[test]
    fn rejects_duplicates_and_unknown_comparators() {
        let dup = r#"
- { name: a, measurement_pattern: x, threshold: 1, comparator: ">", level: info, message_template: m }
- { name: a, measurement_pattern: y, threshold: 1, comparator: ">", level: info, message_template: m }
"#;
        assert!(matches!(parse_rules(dup), Err(RuleError::Validation(_))));

        let bad = r#"
- { name: a, measurement_pattern: x, threshold: 1, comparator: "~", level: info, message_template: m }
"#;
        assert!(matches!(parse_rules(bad), Err(RuleError::Parse(_))));
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let yaml = "- { name: a, threshold: 1, comparator: \">\", level: info, message_template: m }\n";
        assert!(matches!(parse_rules(yaml), Err(RuleError::Parse(_))));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(WRAPPED.as_bytes()).unwrap();
        let rules = load_rules_file(file.path()).unwrap();
        assert_eq!(rules.len(), 2);

        let missing = file.path().with_extension("missing");
        assert!(matches!(load_rules_file(&missing), Err(RuleError::Io(_))));
    }
}
