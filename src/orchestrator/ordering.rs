//! Phase ordering.
//!
//! Within a phase components run by ascending priority, ties broken by
//! identifier. Declared `depends_*` identifiers must come earlier in the
//! same order.

use crate::config::Configuration;
use crate::constants::{CONFIGURE_PRIORITY, DEFAULT_PRIORITY};
use crate::core::error::{MosaicError, Result};
use crate::core::{ComponentKind, ParamSpec, Phase};

/// Identifiers sorted by `(priority, identifier)`.
pub fn by_priority(mut entries: Vec<(i64, String)>) -> Vec<String> {
    entries.sort();
    entries.into_iter().map(|(_, id)| id).collect()
}

/// Configure priority for `section`: its raw value if given, else the
/// component's declared default.
pub fn configure_priority(raw: &Configuration, section: &str, params: &ParamSpec) -> Result<i64> {
    let declared = params.default_for(CONFIGURE_PRIORITY);
    match raw.get(section, CONFIGURE_PRIORITY).or(declared) {
        Some(value) => value.trim().parse().map_err(|_| MosaicError::InvalidConfigValue {
            section: section.to_string(),
            key: CONFIGURE_PRIORITY.to_string(),
            value: value.to_string(),
            expected: "an integer".to_string(),
        }),
        None => Ok(DEFAULT_PRIORITY),
    }
}

/// Plugins and helpers of a built configuration in extract order.
pub fn extract_order(config: &Configuration) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    for name in config.component_names() {
        if ComponentKind::from_identifier(&name).participates_in(Phase::Extract) {
            let priority = config.view(&name).priority(Phase::Extract)?;
            entries.push((priority, name));
        }
    }
    Ok(by_priority(entries))
}

/// Check that every component's dependencies for `phase` precede it in `order`.
pub fn check_dependencies(config: &Configuration, order: &[String], phase: Phase) -> Result<()> {
    for (position, identifier) in order.iter().enumerate() {
        let earlier = &order[..position];
        let missing: Vec<String> = config
            .view(identifier)
            .dependencies(phase)
            .into_iter()
            .filter(|dep| !earlier.contains(dep))
            .collect();
        if !missing.is_empty() {
            return Err(MosaicError::DependencyOrder {
                identifier: identifier.clone(),
                phase,
                missing,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEPENDS_EXTRACT, EXTRACT_PRIORITY};

    fn config(entries: &[(&str, i64)]) -> Configuration {
        let mut config = Configuration::new();
        config.set("core", "donor", "PANX_1249");
        for (name, priority) in entries {
            config.set(name, EXTRACT_PRIORITY, priority.to_string());
        }
        config
    }

    #[test]
    fn test_ties_break_on_identifier() {
        let order = by_priority(vec![(2, "b".into()), (1, "z".into()), (2, "a".into())]);
        assert_eq!(order, vec!["z", "a", "b"]);
    }

    #[test]
    fn test_extract_order_skips_core_and_mergers() {
        let mut config = config(&[("findings", 300), ("sample_params_helper", 100), ("case_overview", 200)]);
        config.set("gene_information_merger", "render_priority", "300");
        let order = extract_order(&config).unwrap();
        assert_eq!(order, vec!["sample_params_helper", "case_overview", "findings"]);
    }

    #[test]
    fn test_extract_dependency_must_precede() {
        let mut config = config(&[("sample_params_helper", 300), ("case_overview", 200)]);
        config.set("case_overview", DEPENDS_EXTRACT, "sample_params_helper");
        let order = extract_order(&config).unwrap();

        let err = check_dependencies(&config, &order, Phase::Extract).unwrap_err();
        assert!(matches!(
            err,
            MosaicError::DependencyOrder { ref identifier, ref missing, phase: Phase::Extract }
                if identifier == "case_overview" && missing == &vec!["sample_params_helper".to_string()]
        ));

        config.set("sample_params_helper", EXTRACT_PRIORITY, "100");
        let order = extract_order(&config).unwrap();
        assert!(check_dependencies(&config, &order, Phase::Extract).is_ok());
    }

    #[test]
    fn test_configure_priority_falls_back_to_default() {
        let params = ParamSpec::plugin(250, 1, 1);
        let mut raw = Configuration::new();
        raw.set("findings", "findings_file", "x");
        assert_eq!(configure_priority(&raw, "findings", &params).unwrap(), 250);

        raw.set("findings", CONFIGURE_PRIORITY, "5");
        assert_eq!(configure_priority(&raw, "findings", &params).unwrap(), 5);

        raw.set("findings", CONFIGURE_PRIORITY, "soon");
        assert!(matches!(
            configure_priority(&raw, "findings", &params),
            Err(MosaicError::InvalidConfigValue { .. })
        ));
        assert_eq!(configure_priority(&raw, "x", &ParamSpec::new()).unwrap(), DEFAULT_PRIORITY);
    }
}
