//! Resolve an experiment by (possibly partial) name within a project.

use crate::client::Experiment;

/// Result of matching a user-supplied name against a project's experiments.
#[derive(Debug, Clone, PartialEq)]
pub enum NameMatch<'a> {
    NoMatch,
    Unique(&'a Experiment),
    Ambiguous(Vec<&'a Experiment>),
}

/// Find experiments whose name matches `query`.
///
/// Comparison is case-insensitive on trimmed names. Exact matches take
/// precedence; substring matches are only used when there is no exact one.
pub fn match_experiments_by_name<'a>(experiments: &'a [Experiment], query: &str) -> NameMatch<'a> {
    let wanted = query.trim().to_lowercase();
    let normalized = |exp: &Experiment| {
        exp.name
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    };

    let exact: Vec<&Experiment> = experiments
        .iter()
        .filter(|exp| normalized(*exp) == wanted)
        .collect();
    let mut matches = if exact.is_empty() {
        experiments
            .iter()
            .filter(|exp| normalized(*exp).contains(&wanted))
            .collect()
    } else {
        exact
    };

    match matches.len() {
        0 => NameMatch::NoMatch,
        1 => NameMatch::Unique(matches.remove(0)),
        _ => NameMatch::Ambiguous(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment(id: &str, name: &str) -> Experiment {
        Experiment {
            id: id.to_string(),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn project() -> Vec<Experiment> {
        vec![
            experiment("1", "Desktop Ben"),
            experiment("2", "Desktop Ben (old)"),
            experiment("3", "Laptop"),
            experiment("4", "Laptop RAPL"),
        ]
    }

    #[test]
    fn test_exact_match_wins_over_partial() {
        let experiments = project();
        match match_experiments_by_name(&experiments, "desktop ben") {
            NameMatch::Unique(exp) => assert_eq!(exp.id, "1"),
            other => panic!("expected unique match, got {other:?}"),
        }
    }

    #[test]
    fn test_query_is_trimmed() {
        let experiments = project();
        match match_experiments_by_name(&experiments, "  LAPTOP ") {
            NameMatch::Unique(exp) => assert_eq!(exp.id, "3"),
            other => panic!("expected unique match, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_match_unique() {
        let experiments = project();
        match match_experiments_by_name(&experiments, "rapl") {
            NameMatch::Unique(exp) => assert_eq!(exp.id, "4"),
            other => panic!("expected unique match, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_match_ambiguous() {
        let experiments = project();
        match match_experiments_by_name(&experiments, "desk") {
            NameMatch::Ambiguous(found) => {
                let ids: Vec<&str> = found.iter().map(|e| e.id.as_str()).collect();
                assert_eq!(ids, vec!["1", "2"]);
            }
            other => panic!("expected ambiguous match, got {other:?}"),
        }
    }

    #[test]
    fn test_no_match() {
        let experiments = project();
        assert_eq!(
            match_experiments_by_name(&experiments, "server"),
            NameMatch::NoMatch
        );
    }

    #[test]
    fn test_unnamed_experiments_only_match_empty_query() {
        let experiments = vec![Experiment {
            id: "x".into(),
            ..Default::default()
        }];
        assert_eq!(
            match_experiments_by_name(&experiments, "anything"),
            NameMatch::NoMatch
        );
    }
}
