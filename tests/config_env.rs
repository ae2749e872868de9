use statbank::api::DEFAULT_BASE_URL;
use statbank::{ClientConfig, Error, Language};
use std::collections::HashMap;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_without_variables() {
    let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.lang, Language::Da);
}

#[test]
fn variables_override_defaults() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("STATBANK_BASE_URL", " http://localhost:8080/v1 "),
        ("STATBANK_LANG", "EN"),
    ]))
    .unwrap();
    assert_eq!(cfg.base_url, "http://localhost:8080/v1");
    assert_eq!(cfg.lang, Language::En);
}

#[test]
fn blank_variables_are_ignored() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("STATBANK_BASE_URL", ""),
        ("STATBANK_LANG", "  "),
    ]))
    .unwrap();
    assert_eq!(cfg, ClientConfig::default());
}

#[test]
fn invalid_language_is_rejected() {
    let err = ClientConfig::from_lookup(lookup(&[("STATBANK_LANG", "de")])).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}
