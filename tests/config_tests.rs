use figment::Jail;
use vibe_review::config::{LOCAL_CONFIG_FILE, VibeConfig};

#[test]
fn local_file_and_env_layer_over_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            LOCAL_CONFIG_FILE,
            r#"
                [reviewer]
                model = "gemini-2.5-pro"

                [leaderboard]
                row_height = 2
            "#,
        )?;
        jail.set_env("VIBE_REVIEW_LEADERBOARD__BUFFER_ROWS", "8");
        jail.set_env("VIBE_REVIEW_GITHUB__API_BASE", "http://localhost:9999");

        let config: VibeConfig = VibeConfig::figment().extract()?;
        assert_eq!(config.reviewer.model, "gemini-2.5-pro");
        assert_eq!(config.leaderboard.row_height, 2);
        assert_eq!(config.leaderboard.buffer_rows, 8);
        assert_eq!(config.github.api_base, "http://localhost:9999");
        assert_eq!(config.github.host, "github.com");
        Ok(())
    });
}

#[test]
fn env_overrides_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file(LOCAL_CONFIG_FILE, "[reviewer]\nmodel = \"from-file\"\n")?;
        jail.set_env("VIBE_REVIEW_REVIEWER__MODEL", "from-env");

        let config: VibeConfig = VibeConfig::figment().extract()?;
        assert_eq!(config.reviewer.model, "from-env");
        Ok(())
    });
}

#[test]
fn load_falls_back_to_conventional_key_variable() {
    Jail::expect_with(|jail| {
        jail.set_env("GEMINI_API_KEY", "from-gemini-var");

        let config = VibeConfig::load().expect("config loads");
        assert_eq!(config.reviewer_key().expect("key present"), "from-gemini-var");
        Ok(())
    });
}

#[test]
fn load_rejects_zero_row_height() {
    Jail::expect_with(|jail| {
        jail.create_file(LOCAL_CONFIG_FILE, "[leaderboard]\nrow_height = 0\n")?;
        assert!(VibeConfig::load().is_err());
        Ok(())
    });
}
