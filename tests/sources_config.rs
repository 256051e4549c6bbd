// tests/sources_config.rs
use aws_update_notifier::config::{AppConfig, StateBackend};
use aws_update_notifier::ingest::config::{builtin_sources, load_sources_default, load_sources_from};
use std::{env, fs};

const ONE_SOURCE: &str = r#"
[[sources]]
name = "Security Bulletins"
url = "https://aws.amazon.com/security/security-bulletins/"
max_items = 3
item_selector = "tr.bulletin"
title_selector = "td.title"
date_selector = "td.date"
link_selector = "a"
"#;

#[test]
fn explicit_path_toml_and_json() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("sources.toml");
    fs::write(&p_toml, ONE_SOURCE).unwrap();
    let v = load_sources_from(&p_toml).unwrap();
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].name, "Security Bulletins");

    let p_json = dir.path().join("sources.json");
    fs::write(
        &p_json,
        r#"{"sources":[{"name":"X","url":"https://x.test/","item_selector":"li","title_selector":"h3","date_selector":"time","link_selector":"a","max_items":2}]}"#,
    )
    .unwrap();
    let vj = load_sources_from(&p_json).unwrap();
    assert_eq!(vj[0].max_items, 2);
}

#[serial_test::serial]
#[test]
fn default_uses_override_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    // 1) Nothing on disk → built-in sources
    assert_eq!(load_sources_default(None).unwrap(), builtin_sources());

    // 2) ./config/sources.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("sources.toml"), ONE_SOURCE).unwrap();
    assert_eq!(load_sources_default(None).unwrap()[0].name, "Security Bulletins");

    // 3) Explicit override wins; a missing override is an error
    let p = tmp.path().join("other.toml");
    fs::write(&p, ONE_SOURCE.replace("Security Bulletins", "Other")).unwrap();
    assert_eq!(
        load_sources_default(Some(p.to_str().unwrap())).unwrap()[0].name,
        "Other"
    );
    assert!(load_sources_default(Some("/definitely/missing.toml")).is_err());

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn app_config_reads_process_env() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("sources.toml");
    fs::write(&p, ONE_SOURCE).unwrap();

    env::set_var("SOURCES_CONFIG_PATH", p.display().to_string());
    env::set_var("STATE_BACKEND", "file");
    env::set_var("STATE_DIR", dir.path().join("state").display().to_string());
    env::set_var("SUMMARY_PROVIDER", "disabled");
    env::remove_var("SMTP_HOST");

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.sources.len(), 1);
    assert!(matches!(cfg.state, StateBackend::File { .. }));
    assert!(cfg.smtp.is_none());

    for k in ["SOURCES_CONFIG_PATH", "STATE_BACKEND", "STATE_DIR", "SUMMARY_PROVIDER"] {
        env::remove_var(k);
    }
}
