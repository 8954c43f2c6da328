use figment::Jail;
use pretty_assertions::assert_eq;
use tally_config::{StorageBackend, TallyConfig};

#[test]
fn env_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.set_env("TALLY_SERVER__PORT", "7070");
        jail.set_env("TALLY_STORAGE__BACKEND", "local");
        jail.set_env("TALLY_STORAGE__LOCAL_DIR", "/srv/logos");
        jail.set_env("TALLY_GENERAL__AUDIT_LOG_LIMIT", "5");

        let config = TallyConfig::load().expect("config loads");
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.storage.local_dir, "/srv/logos");
        assert_eq!(config.general.audit_log_limit, 5);
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".medal-tally")?;
        jail.create_file(
            ".medal-tally/config.toml",
            r#"
[auth]
session_ttl_secs = 60
"#,
        )?;
        jail.set_env("TALLY_AUTH__SESSION_TTL_SECS", "120");

        let config = TallyConfig::load().expect("config loads");
        assert_eq!(config.auth.session_ttl_secs, 120);
        Ok(())
    });
}

#[test]
fn malformed_env_value_fails_extraction() {
    Jail::expect_with(|jail| {
        jail.set_env("TALLY_SERVER__PORT", "not-a-port");
        assert!(TallyConfig::load().is_err());
        Ok(())
    });
}
