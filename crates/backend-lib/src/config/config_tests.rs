use super::*;
use figment::Jail;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.bind_addr.port(), 3000);
    assert_eq!(settings.account.expiration_days, 60);
    assert_eq!(settings.account.default_role, "User");
    assert!(!settings.account.enforce_expiration);
    assert!(settings.data_dir.is_none());
    assert!(settings.validate().is_ok());
}

#[test]
fn test_load_missing_file_uses_defaults() {
    Jail::expect_with(|_jail| {
        let settings = Settings::load_from("does-not-exist.toml").expect("defaults apply");
        assert_eq!(settings.account.expiration_days, 60);
        Ok(())
    });
}

#[test]
fn test_load_from_toml_and_env() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "forum.toml",
            r#"
                log_level = "debug"
                data_dir = "accounts-data"

                [account]
                expiration_days = 30
            "#,
        )?;
        jail.set_env("FORUM_ACCOUNT__DEFAULT_ROLE", "Member");

        let settings = Settings::load_from("forum.toml").expect("settings load");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.data_dir, Some(PathBuf::from("accounts-data")));
        assert_eq!(settings.account.expiration_days, 30);
        assert_eq!(settings.account.default_role, "Member");
        Ok(())
    });
}

#[test]
fn test_zero_grace_period_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("FORUM_ACCOUNT__EXPIRATION_DAYS", "0");
        assert!(Settings::load_from("missing.toml").is_err());
        Ok(())
    });
}

#[test]
fn test_blank_default_role_rejected() {
    let mut settings = Settings::default();
    settings.account.default_role = "  ".to_string();
    assert!(settings.validate().is_err());
}

#[test]
fn test_grace_period_upper_bound() {
    let mut settings = Settings::default();
    settings.account.expiration_days = MAX_EXPIRATION_DAYS;
    assert!(settings.validate().is_ok());

    settings.account.expiration_days = MAX_EXPIRATION_DAYS + 1;
    assert!(settings.validate().is_err());

    Jail::expect_with(|jail| {
        jail.set_env("FORUM_ACCOUNT__EXPIRATION_DAYS", "100000000");
        assert!(Settings::load_from("missing.toml").is_err());
        Ok(())
    });
}

#[test]
fn test_default_role_must_be_a_valid_role_name() {
    let mut settings = Settings::default();
    settings.account.default_role = "Forum User".to_string();
    let err = settings.validate().unwrap_err();
    assert!(format!("{err:#}").contains("Invalid role"));

    settings.account.default_role = "forum-user_2".to_string();
    assert!(settings.validate().is_ok());

    Jail::expect_with(|jail| {
        jail.set_env("FORUM_ACCOUNT__DEFAULT_ROLE", "<admin>");
        assert!(Settings::load_from("missing.toml").is_err());
        Ok(())
    });
}
