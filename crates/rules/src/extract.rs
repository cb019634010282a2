//! Per-source field extraction.
//!
//! One extraction function per [`RuleSource`] variant, dispatched
//! exhaustively by [`extract`]. All three operate on the same raw
//! `serde_yaml::Value` tree the catalog decoded from disk. Missing optional
//! keys become empty strings or empty collections; extraction itself never
//! fails.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use lofp_core::{append_missing_parents, normalize_fp, parent_technique, RuleRecord, RuleSource};

static NULL: Value = Value::Null;

/// Build a [`RuleRecord`] from raw decoded file content.
pub fn extract(
    source: RuleSource,
    raw: &Value,
    path: PathBuf,
    repo_url: &str,
    branch: &str,
) -> RuleRecord {
    let fields = match source {
        RuleSource::Elastic => extract_elastic(raw, &path),
        RuleSource::Sigma => extract_sigma(raw),
        RuleSource::Splunk => extract_splunk(raw),
    };
    RuleRecord {
        source,
        path,
        repo_url: repo_url.to_string(),
        branch: branch.to_string(),
        id: fields.id,
        name: fields.name,
        description: fields.description,
        techniques: fields.techniques,
        false_positives: fields.false_positives,
        logic: fields.logic,
        data_source: fields.data_source,
    }
}

/// The derived fields shared by all three extractors.
struct Extracted {
    id: String,
    name: String,
    description: String,
    techniques: Vec<String>,
    false_positives: Vec<String>,
    logic: String,
    data_source: String,
}

// ── Value helpers ───────────────────────────────────────────────────

fn str_at(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

fn seq_at<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn normalized_seq_at(value: &Value, key: &str) -> Vec<String> {
    seq_at(value, key)
        .iter()
        .filter_map(Value::as_str)
        .map(normalize_fp)
        .collect()
}

/// Close a technique set over sub-technique parents and freeze it sorted.
fn freeze_sorted(mut techniques: BTreeSet<String>) -> Vec<String> {
    let parents: Vec<String> = techniques
        .iter()
        .filter_map(|t| parent_technique(t))
        .map(str::to_string)
        .collect();
    techniques.extend(parents);
    techniques.into_iter().collect()
}

// ── Elastic ─────────────────────────────────────────────────────────

/// Elastic detection-rules TOML: everything lives under the `rule` table.
fn extract_elastic(raw: &Value, path: &Path) -> Extracted {
    let rule = raw.get("rule").unwrap_or(&NULL);

    let mut techniques = BTreeSet::new();
    for threat in seq_at(rule, "threat") {
        for technique in seq_at(threat, "technique") {
            if let Some(id) = technique.get("id").and_then(Value::as_str) {
                techniques.insert(id.to_string());
            }
            for sub in seq_at(technique, "subtechnique") {
                if let Some(id) = sub.get("id").and_then(Value::as_str) {
                    techniques.insert(id.to_string());
                }
            }
        }
    }

    // The log category of an elastic rule is encoded in its directory layout,
    // not in the file contents.
    let data_source = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    Extracted {
        id: str_at(rule, "rule_id"),
        name: str_at(rule, "name"),
        description: str_at(rule, "description"),
        techniques: freeze_sorted(techniques),
        false_positives: normalized_seq_at(rule, "false_positives"),
        logic: str_at(rule, "query"),
        data_source,
    }
}

// ── Sigma ───────────────────────────────────────────────────────────

/// Sigma YAML: flat document, techniques carried as `attack.t####` tags.
fn extract_sigma(raw: &Value) -> Extracted {
    let mut techniques = BTreeSet::new();
    for tag in seq_at(raw, "tags") {
        if let Some(id) = tag.as_str().and_then(attack_technique_tag) {
            techniques.insert(id);
        }
    }

    // The detection block is kept as re-serialized YAML rather than any
    // single query string.
    let logic = raw
        .get("detection")
        .and_then(|d| serde_yaml::to_string(d).ok())
        .unwrap_or_default();

    let data_source = raw
        .get("logsource")
        .map(|l| str_at(l, "product"))
        .unwrap_or_default()
        .to_lowercase();

    Extracted {
        id: str_at(raw, "id"),
        name: str_at(raw, "title"),
        description: str_at(raw, "description"),
        techniques: freeze_sorted(techniques),
        false_positives: normalized_seq_at(raw, "falsepositives"),
        logic,
        data_source,
    }
}

/// Parse a sigma tag of the form `attack.t<digits>[.<digits>]` into a
/// canonical upper-case technique id. Any other tag yields `None`.
fn attack_technique_tag(tag: &str) -> Option<String> {
    let rest = tag.strip_prefix("attack.")?;
    let body = rest.strip_prefix(['t', 'T'])?;
    let mut parts = body.split('.');
    let major = parts.next()?;
    if major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if let Some(minor) = parts.next() {
        if minor.is_empty() || !minor.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if parts.next().is_some() {
            return None;
        }
    }
    Some(format!("T{}", body))
}

// ── Splunk ──────────────────────────────────────────────────────────

/// Splunk security-content YAML: identity fields at the top level, ATT&CK
/// metadata under `tags`.
fn extract_splunk(raw: &Value) -> Extracted {
    let tags = raw.get("tags").unwrap_or(&NULL);

    // Source order is kept; only missing parents are appended.
    let mut techniques: Vec<String> = seq_at(tags, "mitre_attack_id")
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    append_missing_parents(&mut techniques);

    // Newer content nests the field under `tags`; older files carry it at the
    // top level.
    let mut fp_raw = str_at(tags, "known_false_positives");
    if fp_raw.is_empty() {
        fp_raw = str_at(raw, "known_false_positives");
    }
    let normalized = normalize_fp(&fp_raw);
    // "unknown" annotations carry no information worth a page.
    let false_positives = if normalized.is_empty() || normalized.starts_with("unknown") {
        Vec::new()
    } else {
        vec![normalized]
    };

    Extracted {
        id: str_at(raw, "id"),
        name: str_at(raw, "name"),
        description: str_at(raw, "description"),
        techniques,
        false_positives,
        logic: split_search_stages(&str_at(raw, "search")),
        data_source: str_at(tags, "asset_type").to_lowercase(),
    }
}

/// Put each pipe-delimited SPL stage on its own line.
fn split_search_stages(search: &str) -> String {
    search.split('|').map(str::trim).collect::<Vec<_>>().join("\n|")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    const ELASTIC_RULE: &str = r#"
rule:
  rule_id: 9a1a2dae-0b5f-4c3d-8305-a268d404c306
  name: Encoded Executable Stored in the Registry
  description: Identifies registry write modifications to hide an encoded portable executable.
  query: "registry where registry.data.strings : \"TVqQAAMAAAAEAAAA*\""
  false_positives:
    - "Legitimate  administrative  tooling"
  threat:
    - framework: MITRE ATT&CK
      technique:
        - id: T1112
          name: Modify Registry
    - framework: MITRE ATT&CK
      technique:
        - id: T1027
          name: Obfuscated Files or Information
          subtechnique:
            - id: T1027.011
              name: Fileless Storage
"#;

    #[test]
    fn elastic_extracts_all_fields() {
        let raw = yaml(ELASTIC_RULE);
        let record = extract(
            RuleSource::Elastic,
            &raw,
            PathBuf::from("rules/windows/evasion_encoded_exe.toml"),
            "https://github.com/elastic/detection-rules",
            "main",
        );
        assert_eq!(record.id, "9a1a2dae-0b5f-4c3d-8305-a268d404c306");
        assert_eq!(record.name, "Encoded Executable Stored in the Registry");
        assert_eq!(record.techniques, vec!["T1027", "T1027.011", "T1112"]);
        assert_eq!(record.false_positives, vec!["legitimate administrative tooling"]);
        assert!(record.logic.starts_with("registry where"));
        assert_eq!(record.data_source, "windows");
    }

    #[test]
    fn elastic_tolerates_missing_optional_fields() {
        let raw = yaml("rule:\n  name: Bare Rule\n");
        let record = extract(
            RuleSource::Elastic,
            &raw,
            PathBuf::from("rules/bare.toml"),
            "https://github.com/elastic/detection-rules",
            "main",
        );
        assert_eq!(record.name, "Bare Rule");
        assert_eq!(record.id, "");
        assert_eq!(record.description, "");
        assert!(record.techniques.is_empty());
        assert!(record.false_positives.is_empty());
        assert_eq!(record.logic, "");
        assert_eq!(record.data_source, "rules");
    }

    const SIGMA_RULE: &str = r#"
title: Suspicious PsExec Execution
id: c462f537-a1e3-41a6-b5fc-b2c2cef9bf82
description: Detects psexec execution via pipe creation.
tags:
  - attack.lateral-movement
  - attack.t1021.002
  - attack.t1570
logsource:
  product: windows
  service: security
detection:
  selection:
    PipeName|contains: '\PSEXESVC'
  condition: selection
falsepositives:
  - "Legitimate   PsExec usage"
"#;

    #[test]
    fn sigma_extracts_and_canonicalizes_techniques() {
        let raw = yaml(SIGMA_RULE);
        let record = extract(
            RuleSource::Sigma,
            &raw,
            PathBuf::from("rules/windows/pipe_created/psexec.yml"),
            "https://github.com/SigmaHQ/sigma",
            "master",
        );
        assert_eq!(record.id, "c462f537-a1e3-41a6-b5fc-b2c2cef9bf82");
        assert_eq!(record.name, "Suspicious PsExec Execution");
        // Parent T1021 added from sub-technique, sorted, upper-cased.
        assert_eq!(record.techniques, vec!["T1021", "T1021.002", "T1570"]);
        assert_eq!(record.false_positives, vec!["legitimate psexec usage"]);
        assert!(record.logic.contains("selection"));
        assert!(record.logic.contains("PSEXESVC"));
        assert_eq!(record.data_source, "windows");
    }

    #[test]
    fn sigma_detection_logic_is_yaml() {
        let raw = yaml(SIGMA_RULE);
        let record = extract(
            RuleSource::Sigma,
            &raw,
            PathBuf::from("rules/r.yml"),
            "https://github.com/SigmaHQ/sigma",
            "master",
        );
        let reparsed: Value = serde_yaml::from_str(&record.logic).unwrap();
        assert!(reparsed.get("condition").is_some());
    }

    #[test]
    fn sigma_tolerates_empty_document() {
        let raw = yaml("title: Only A Title\n");
        let record = extract(
            RuleSource::Sigma,
            &raw,
            PathBuf::from("rules/min.yml"),
            "https://github.com/SigmaHQ/sigma",
            "master",
        );
        assert_eq!(record.name, "Only A Title");
        assert_eq!(record.id, "");
        assert!(record.techniques.is_empty());
        assert!(record.false_positives.is_empty());
        assert_eq!(record.logic, "");
        assert_eq!(record.data_source, "");
    }

    #[test]
    fn attack_tags_are_filtered_strictly() {
        assert_eq!(attack_technique_tag("attack.t1059"), Some("T1059".to_string()));
        assert_eq!(attack_technique_tag("attack.t1059.001"), Some("T1059.001".to_string()));
        assert_eq!(attack_technique_tag("attack.lateral-movement"), None);
        assert_eq!(attack_technique_tag("attack.ta0008"), None);
        assert_eq!(attack_technique_tag("cve.2021.44228"), None);
        assert_eq!(attack_technique_tag("attack.t1059.001.002"), None);
    }

    const SPLUNK_RULE: &str = r#"
name: Windows Modify Registry NoChangingWallPaper
id: a2276412-e254-4d9a-9082-4d92a7628f38
description: The following analytic detects registry modifications restricting wallpaper changes.
search: 'index=foo | stats count | table count'
tags:
  analytic_story:
    - Windows Registry Abuse
  asset_type: Endpoint
  known_false_positives: Administrators may enforce this setting via group policy.
  mitre_attack_id:
    - T1112
    - T1491.001
"#;

    #[test]
    fn splunk_extracts_all_fields() {
        let raw = yaml(SPLUNK_RULE);
        let record = extract(
            RuleSource::Splunk,
            &raw,
            PathBuf::from("detections/endpoint/wallpaper.yml"),
            "https://github.com/splunk/security_content",
            "develop",
        );
        assert_eq!(record.id, "a2276412-e254-4d9a-9082-4d92a7628f38");
        // Source order kept, parent appended after.
        assert_eq!(record.techniques, vec!["T1112", "T1491.001", "T1491"]);
        assert_eq!(
            record.false_positives,
            vec!["administrators may enforce this setting via group policy."]
        );
        assert_eq!(record.data_source, "endpoint");
    }

    #[test]
    fn splunk_search_stages_split_on_pipes() {
        let raw = yaml("name: r\nsearch: 'index=foo | stats count'\n");
        let record = extract(
            RuleSource::Splunk,
            &raw,
            PathBuf::from("detections/r.yml"),
            "https://github.com/splunk/security_content",
            "develop",
        );
        assert_eq!(record.logic, "index=foo\n|stats count");
    }

    #[test]
    fn splunk_unknown_false_positives_dropped() {
        for fp in ["Unknown", "  unknown  ", "unknown false positives"] {
            let raw = yaml(&format!("name: r\ntags:\n  known_false_positives: \"{}\"\n", fp));
            let record = extract(
                RuleSource::Splunk,
                &raw,
                PathBuf::from("detections/r.yml"),
                "https://github.com/splunk/security_content",
                "develop",
            );
            assert!(record.false_positives.is_empty(), "{:?} should be dropped", fp);
        }
    }

    #[test]
    fn splunk_known_false_positive_kept() {
        let raw = yaml("name: r\ntags:\n  known_false_positives: Benign admin activity\n");
        let record = extract(
            RuleSource::Splunk,
            &raw,
            PathBuf::from("detections/r.yml"),
            "https://github.com/splunk/security_content",
            "develop",
        );
        assert_eq!(record.false_positives, vec!["benign admin activity"]);
    }

    #[test]
    fn splunk_top_level_known_false_positives_accepted() {
        let raw = yaml("name: r\nknown_false_positives: Legacy location\n");
        let record = extract(
            RuleSource::Splunk,
            &raw,
            PathBuf::from("detections/r.yml"),
            "https://github.com/splunk/security_content",
            "develop",
        );
        assert_eq!(record.false_positives, vec!["legacy location"]);
    }

    #[test]
    fn splunk_missing_fields_are_empty() {
        let raw = yaml("name: Minimal\n");
        let record = extract(
            RuleSource::Splunk,
            &raw,
            PathBuf::from("detections/min.yml"),
            "https://github.com/splunk/security_content",
            "develop",
        );
        assert_eq!(record.name, "Minimal");
        assert!(record.techniques.is_empty());
        assert!(record.false_positives.is_empty());
        assert_eq!(record.logic, "");
        assert_eq!(record.data_source, "");
    }
}
