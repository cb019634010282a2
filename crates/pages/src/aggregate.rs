//! Aggregation of rules by false-positive string.
//!
//! Grouping key equality is exact string equality over the normalized text;
//! near-duplicate phrasings stay separate groups.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::warn;

use lofp_core::RuleRecord;

/// The rules and techniques sharing one normalized false-positive string.
#[derive(Debug)]
pub struct AggregationEntry<'a> {
    /// Sorted union of the contributing rules' techniques.
    pub techniques: Vec<String>,
    /// Contributing rules in first-seen order, deduplicated by rule id.
    pub rules: Vec<&'a RuleRecord>,
}

/// Group rules by each false-positive string they declare.
///
/// Returns the groups in first-seen order plus the sorted set of all
/// distinct techniques across the input rules (used for tag indexes, which
/// are independent of any single false positive). A duplicate rule id within
/// one group overwrites the earlier rule, keeping its position.
pub fn aggregate(rules: &[RuleRecord]) -> (IndexMap<String, AggregationEntry<'_>>, Vec<String>) {
    struct Building<'a> {
        techniques: BTreeSet<String>,
        rules: IndexMap<&'a str, &'a RuleRecord>,
    }

    let mut groups: IndexMap<String, Building> = IndexMap::new();
    let mut all_techniques: BTreeSet<String> = BTreeSet::new();

    for rule in rules {
        all_techniques.extend(rule.techniques.iter().cloned());
        for fp in &rule.false_positives {
            let group = groups.entry(fp.clone()).or_insert_with(|| Building {
                techniques: BTreeSet::new(),
                rules: IndexMap::new(),
            });
            group.techniques.extend(rule.techniques.iter().cloned());
            if let Some(previous) = group.rules.insert(rule.id.as_str(), rule) {
                if !std::ptr::eq(previous, rule) {
                    warn!(
                        rule_id = %rule.id,
                        false_positive = %fp,
                        "duplicate rule id in group, keeping the later rule"
                    );
                }
            }
        }
    }

    let frozen = groups
        .into_iter()
        .map(|(fp, building)| {
            (
                fp,
                AggregationEntry {
                    techniques: building.techniques.into_iter().collect(),
                    rules: building.rules.into_values().collect(),
                },
            )
        })
        .collect();

    (frozen, all_techniques.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofp_core::RuleSource;
    use std::path::PathBuf;

    fn record(id: &str, fps: &[&str], techniques: &[&str]) -> RuleRecord {
        RuleRecord {
            source: RuleSource::Sigma,
            path: PathBuf::from(format!("rules/{}.yml", id)),
            repo_url: "https://github.com/SigmaHQ/sigma".to_string(),
            branch: "master".to_string(),
            id: id.to_string(),
            name: format!("Rule {}", id),
            description: String::new(),
            techniques: techniques.iter().map(|s| s.to_string()).collect(),
            false_positives: fps.iter().map(|s| s.to_string()).collect(),
            logic: String::new(),
            data_source: "windows".to_string(),
        }
    }

    #[test]
    fn groups_by_false_positive() {
        let rules = vec![
            record("a", &["legitimate psexec usage"], &["T1569", "T1569.002"]),
            record("b", &["legitimate psexec usage"], &["T1021"]),
            record("c", &["backup software"], &["T1490"]),
        ];
        let (groups, techniques) = aggregate(&rules);

        assert_eq!(groups.len(), 2);
        let psexec = &groups["legitimate psexec usage"];
        assert_eq!(psexec.techniques, vec!["T1021", "T1569", "T1569.002"]);
        assert_eq!(psexec.rules.len(), 2);
        assert_eq!(techniques, vec!["T1021", "T1490", "T1569", "T1569.002"]);
    }

    #[test]
    fn duplicate_ids_last_write_wins() {
        let first = record("dup", &["shared fp"], &["T1003"]);
        let mut second = record("dup", &["shared fp"], &["T1055"]);
        second.name = "Rule dup (newer)".to_string();
        let rules = vec![first, second];

        let (groups, _) = aggregate(&rules);
        let entry = &groups["shared fp"];
        assert_eq!(entry.rules.len(), 1);
        assert_eq!(entry.rules[0].name, "Rule dup (newer)");
        // Techniques from both still contribute to the union.
        assert_eq!(entry.techniques, vec!["T1003", "T1055"]);
    }

    #[test]
    fn rules_without_false_positives_form_no_group() {
        let rules = vec![record("a", &[], &["T1112"])];
        let (groups, techniques) = aggregate(&rules);
        assert!(groups.is_empty());
        // Their techniques still feed the tag indexes.
        assert_eq!(techniques, vec!["T1112"]);
    }

    #[test]
    fn group_order_is_first_seen() {
        let rules = vec![
            record("a", &["zebra fp"], &["T1001"]),
            record("b", &["alpha fp"], &["T1002"]),
        ];
        let (groups, _) = aggregate(&rules);
        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, vec!["zebra fp", "alpha fp"]);
    }
}
