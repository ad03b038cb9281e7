use super::*;
use pretty_assertions::assert_eq;

use std::collections::HashMap;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |var| vars.get(var).cloned()
}

#[test]
fn unset_variables_keep_defaults() {
    let config = SessionConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, SessionConfig::default());
    assert_eq!(config.num_localities, 1);
    assert_eq!(config.collective_timeout, Duration::from_secs(30));
    assert_eq!(config.worker_threads, None);
}

#[test]
fn variables_are_parsed() {
    let config = SessionConfig::from_lookup(lookup(&[
        (LOCALITY_VAR, "2"),
        (NUM_LOCALITIES_VAR, "4"),
        (COLLECTIVE_TIMEOUT_VAR, "250"),
        (WORKER_THREADS_VAR, "3"),
    ]))
    .unwrap();
    assert_eq!(config.locality, 2);
    assert_eq!(config.num_localities, 4);
    assert_eq!(config.collective_timeout, Duration::from_millis(250));
    assert_eq!(config.worker_threads, Some(3));
}

#[test]
fn surrounding_whitespace_is_ignored() {
    let config = SessionConfig::from_lookup(lookup(&[
        (LOCALITY_VAR, " 1\n"),
        (NUM_LOCALITIES_VAR, "\t2 "),
    ]))
    .unwrap();
    assert_eq!((config.locality, config.num_localities), (1, 2));
}

#[test]
fn unparsable_values_name_the_variable() {
    let err = SessionConfig::from_lookup(lookup(&[(NUM_LOCALITIES_VAR, "many")])).unwrap_err();
    match err {
        ConfigError::InvalidValue { var, value, .. } => {
            assert_eq!(var, NUM_LOCALITIES_VAR);
            assert_eq!(value, "many");
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }

    let err = SessionConfig::from_lookup(lookup(&[(LOCALITY_VAR, "-1")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { var: LOCALITY_VAR, .. }));
}

#[test]
fn locality_must_lie_inside_the_cluster() {
    let err = SessionConfig::from_lookup(lookup(&[
        (LOCALITY_VAR, "2"),
        (NUM_LOCALITIES_VAR, "2"),
    ]))
    .unwrap_err();
    assert_eq!(err, ConfigError::LocalityOutOfRange { id: 2, count: 2 });
}

#[test]
fn empty_clusters_are_rejected() {
    let config = SessionConfig {
        num_localities: 0,
        ..SessionConfig::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::NoLocalities));
}

#[test]
fn zero_worker_threads_are_rejected() {
    let err = SessionConfig::from_lookup(lookup(&[(WORKER_THREADS_VAR, "0")])).unwrap_err();
    assert_eq!(err, ConfigError::NoWorkerThreads);
}
