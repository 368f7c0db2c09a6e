use super::Report;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const REQUIRED_SECTIONS: [&str; 6] = ["status", "buttons", "commands", "setup", "errors", "permissions"];

/// Flattens a bundle into dotted keys, skipping `_meta`.
pub fn flatten_keys(bundle: &Value) -> BTreeMap<String, String> {
    fn walk(prefix: &str, node: &Value, out: &mut BTreeMap<String, String>) {
        match node {
            Value::Object(map) => {
                for (key, child) in map {
                    if prefix.is_empty() && key == "_meta" {
                        continue;
                    }
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    walk(&path, child, out);
                }
            }
            Value::String(s) => {
                out.insert(prefix.to_string(), s.clone());
            }
            other => {
                out.insert(prefix.to_string(), other.to_string());
            }
        }
    }

    let mut out = BTreeMap::new();
    walk("", bundle, &mut out);
    out
}

/// `{name}` placeholders used in a template.
pub fn placeholders(template: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    found.insert(name.to_string());
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    found
}

/// Cross-checks language bundles: keys missing against the union of all
/// languages, placeholder sets that differ between languages, empty values
/// and missing top-level sections.
pub fn check_languages(bundles: &BTreeMap<String, Value>) -> Report {
    let mut report = Report::default();
    if bundles.is_empty() {
        report.issue("No language files found");
        return report;
    }

    let flat: BTreeMap<&str, BTreeMap<String, String>> = bundles
        .iter()
        .map(|(code, bundle)| (code.as_str(), flatten_keys(bundle)))
        .collect();
    let all_keys: BTreeSet<&String> = flat.values().flat_map(|keys| keys.keys()).collect();

    for (code, bundle) in bundles {
        for section in REQUIRED_SECTIONS {
            if bundle.get(section).is_none() {
                report.issue(format!("{code}: missing section '{section}'"));
            }
        }
    }

    for (code, keys) in &flat {
        let missing: Vec<&str> = all_keys
            .iter()
            .filter(|key| !keys.contains_key(key.as_str()))
            .map(|key| key.as_str())
            .collect();
        if !missing.is_empty() {
            report.issue(format!(
                "{code}: {} missing key(s): {}",
                missing.len(),
                missing.join(", ")
            ));
        }

        for (key, value) in keys {
            if value.trim().is_empty() {
                report.warn(format!("{code}: empty value for {key}"));
            }
        }
    }

    for key in &all_keys {
        let sets: BTreeSet<BTreeSet<String>> = flat
            .values()
            .filter_map(|keys| keys.get(key.as_str()))
            .map(|value| placeholders(value))
            .collect();
        if sets.len() > 1 {
            report.warn(format!("{key}: placeholders differ between languages"));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle(extra: Value) -> Value {
        let mut base = json!({
            "_meta": { "languageName": "x" },
            "status": { "title": "{emoji} {serverName}" },
            "buttons": {}, "commands": {}, "setup": {}, "errors": {}, "permissions": {}
        });
        if let (Value::Object(base_map), Value::Object(extra_map)) = (&mut base, extra) {
            base_map.extend(extra_map);
        }
        base
    }

    #[test]
    fn finds_placeholders() {
        let found = placeholders("{emoji} **{serverName}** has {count}/{max} {not a var}");
        let expected: BTreeSet<String> = ["count", "emoji", "max", "serverName"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn consistent_bundles_pass() {
        let mut bundles = BTreeMap::new();
        bundles.insert("en".to_string(), bundle(json!({})));
        bundles.insert("de".to_string(), bundle(json!({})));
        let report = check_languages(&bundles);
        assert!(report.is_ok(), "{report:?}");
        assert!(report.warnings.is_empty(), "{report:?}");
    }

    #[test]
    fn reports_missing_keys_placeholders_and_empty_values() {
        let mut bundles = BTreeMap::new();
        bundles.insert(
            "en".to_string(),
            bundle(json!({ "extra": { "only": "here" }, "empty": "" })),
        );
        bundles.insert(
            "de".to_string(),
            bundle(json!({ "status": { "title": "{serverName}" }, "empty": "x" })),
        );

        let report = check_languages(&bundles);
        assert_eq!(report.issues.len(), 1, "{report:?}");
        assert!(report.issues[0].starts_with("de:"));
        assert!(report.issues[0].contains("extra.only"));
        assert!(report.warnings.iter().any(|w| w.contains("status.title")));
        assert!(report.warnings.iter().any(|w| w.contains("empty value for empty")));
    }
}
