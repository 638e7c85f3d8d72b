use jobnote_common::{CollisionPolicy, FormatterStrategy, LlmConfig};
use jobnote_config::JobnoteConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn conventional_env_vars_fill_defaults() {
    temp_env::with_vars(
        [
            ("MARKDOWN_SAVE_PATH", Some("/tmp/jobnote-notes")),
            ("GEMINI_API_KEY", Some("gemini-secret")),
            ("LOCAL_LLM_BASE_URL", None),
        ],
        || {
            let config = JobnoteConfigLoader::new().load().expect("load config");

            assert_eq!(config.destination_dir, PathBuf::from("/tmp/jobnote-notes"));
            match &config.llm {
                LlmConfig::Gemini {
                    api_key,
                    max_input_chars,
                    ..
                } => {
                    assert_eq!(api_key, "gemini-secret");
                    assert_eq!(*max_input_chars, 15_000);
                }
                other => panic!("expected gemini, got {other:?}"),
            }
            assert_eq!(config.formatter.strategy, FormatterStrategy::Rewrite);
            assert_eq!(config.on_collision, CollisionPolicy::Suffix);
        },
    );
}

#[test]
#[serial]
fn missing_destination_is_reported() {
    temp_env::with_vars(
        [
            ("MARKDOWN_SAVE_PATH", None::<&str>),
            ("GEMINI_API_KEY", Some("gemini-secret")),
        ],
        || {
            let err = JobnoteConfigLoader::new().load().unwrap_err();
            assert_eq!(err.kind(), "ConfigurationError");
            assert!(err.to_string().contains("MARKDOWN_SAVE_PATH"));
        },
    );
}

#[test]
#[serial]
fn file_selects_local_backend_and_tunables() {
    let tmp = TempDir::new().unwrap();
    let file_yaml = r#"
destination_dir: "${JOBNOTE_TEST_NOTES}/jobs"
llm:
  provider: local
  base_url: "${LOCAL_LLM_BASE_URL}"
  json_mode: true
formatter:
  strategy: local
browser:
  settle_secs: 1
  sandbox: false
selectors:
  - ".posting-body"
  - main
output:
  on_collision: overwrite
logging:
  format: json
  emit_stderr: false
"#;
    let p = write_yaml(&tmp, "jobnote.yaml", file_yaml);

    temp_env::with_vars(
        [
            ("JOBNOTE_TEST_NOTES", Some("/srv/notes")),
            ("LOCAL_LLM_BASE_URL", Some("http://localhost:1234/v1")),
            ("GEMINI_API_KEY", None),
        ],
        || {
            let config = JobnoteConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");

            assert_eq!(config.destination_dir, PathBuf::from("/srv/notes/jobs"));
            match &config.llm {
                LlmConfig::Local {
                    base_url,
                    api_key,
                    json_mode,
                    max_input_chars,
                    ..
                } => {
                    assert_eq!(base_url, "http://localhost:1234/v1");
                    assert_eq!(api_key, "not-needed");
                    assert!(*json_mode);
                    assert_eq!(*max_input_chars, 64_000);
                }
                other => panic!("expected local, got {other:?}"),
            }
            assert_eq!(config.formatter.strategy, FormatterStrategy::Local);
            assert_eq!(config.browser.settle_secs, 1);
            assert!(!config.browser.sandbox);
            assert_eq!(config.selectors, vec![".posting-body", "main"]);
            assert_eq!(config.on_collision, CollisionPolicy::Overwrite);
            assert!(!config.logging.emit_stderr);
        },
    );
}

#[test]
#[serial]
fn prefixed_env_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "jobnote.yaml",
        "destination_dir: /tmp/from-file\nllm:\n  provider: gemini\n  api_key: file-key\n",
    );

    temp_env::with_vars(
        [
            ("JOBNOTE__DESTINATION_DIR", Some("/tmp/from-env")),
            ("JOBNOTE__BROWSER__SETTLE_SECS", Some("0")),
        ],
        || {
            let config = JobnoteConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");
            assert_eq!(config.destination_dir, PathBuf::from("/tmp/from-env"));
            assert_eq!(config.browser.settle_secs, 0);
        },
    );
}

#[test]
#[serial]
fn optional_file_may_be_absent() {
    let tmp = TempDir::new().unwrap();
    temp_env::with_vars(
        [
            ("MARKDOWN_SAVE_PATH", Some("/tmp/jobs")),
            ("GEMINI_API_KEY", Some("k")),
        ],
        || {
            let config = JobnoteConfigLoader::new()
                .with_optional_file(tmp.path().join("missing.yaml"))
                .load()
                .expect("load config");
            assert_eq!(config.destination_dir, PathBuf::from("/tmp/jobs"));
        },
    );
}

#[test]
#[serial]
fn unknown_provider_is_rejected() {
    temp_env::with_var("MARKDOWN_SAVE_PATH", Some("/tmp/jobs"), || {
        let err = JobnoteConfigLoader::new()
            .with_yaml_str("llm:\n  provider: claude\n")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("claude"));
    });
}
