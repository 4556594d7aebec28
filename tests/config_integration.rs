use nuanswers::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("NUANSWERS_SERVER__PORT");
        env::remove_var("NUANSWERS_STORAGE__DATA_DIR");
        env::remove_var("ADMIN_PASSWORD");
        env::remove_var("CONFIG_FILE");
    }
}

fn load() -> Result<AppConfig, config::ConfigError> {
    // Fixed argv so the test harness's own flags don't reach clap.
    AppConfig::load_from_args(["nuanswers"])
}

#[test]
#[serial]
fn test_missing_admin_password_is_rejected() {
    clear_env_vars();

    let err = load().unwrap_err();
    assert!(err.to_string().contains("ADMIN_PASSWORD"));
}

#[test]
#[serial]
fn test_defaults_with_admin_password() {
    clear_env_vars();
    unsafe {
        env::set_var("ADMIN_PASSWORD", "sesame");
    }

    let config = load().expect("Failed to load config");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert!(config.resilience.rate_limit_enabled);
    assert_eq!(config.security.admin_password, "sesame");
    assert_eq!(config.tutoring.timezone, "America/New_York");

    clear_env_vars();
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("ADMIN_PASSWORD", "sesame");
        env::set_var("NUANSWERS_SERVER__PORT", "9090");
    }

    let config = load().expect("Failed to load config");
    assert_eq!(config.server.port, 9090);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flag_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("ADMIN_PASSWORD", "sesame");
        env::set_var("NUANSWERS_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args(["nuanswers", "--port", "7171"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 7171);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let config_content = r"
server:
  port: 7070
security:
  admin_password: from-file
";

    let file_path = "test_config.yaml";
    fs::write(file_path, config_content).expect("Failed to write temp config");

    unsafe {
        env::set_var("CONFIG_FILE", file_path);
    }

    // CONFIG_FILE reaches the loader through clap's env fallback.
    let config = AppConfig::load_from_args(["nuanswers", "--config", file_path])
        .expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.security.admin_password, "from-file");

    fs::remove_file(file_path).unwrap();
    clear_env_vars();
}

#[test]
#[serial]
fn test_tutoring_windows_from_file() {
    clear_env_vars();

    let config_content = r"
security:
  admin_password: sesame
tutoring:
  timezone: America/New_York
  windows:
    - day: Monday
      start: '09:00'
      end: '10:00'
";

    let file_path = "test_tutoring_config.yaml";
    fs::write(file_path, config_content).expect("Failed to write temp config");

    let config = AppConfig::load_from_args(["nuanswers", "--config", file_path])
        .expect("Failed to load config from file");
    let windows = config.tutoring.windows.as_deref().expect("windows set");
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].day, "Monday");

    let schedule = nuanswers::config::build_schedule(&config.tutoring).unwrap();
    assert_eq!(schedule.describe(), "Mon 09:00-10:00");

    fs::remove_file(file_path).unwrap();
    clear_env_vars();
}
