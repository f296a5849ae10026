use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use insight_config::{Config, QUERY_BASED_DASHBOARD_CARDS};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let table = root
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut(section)
		.and_then(Value::as_table_mut)
		.expect("Template config must include the requested section.");

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("insight_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> insight_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = insight_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

#[test]
fn loads_sample_config() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Expected valid config.");

	assert_eq!(cfg.service.log_level, "info");
	assert!(!cfg.workspace.filter_test_accounts_default);
	assert!(cfg.workspace.test_account_filters_default_checked);
	assert!(cfg.feature_flags.is_enabled(QUERY_BASED_DASHBOARD_CARDS));
	assert!(!cfg.feature_flags.is_enabled("unknown-flag"));
	assert_eq!(cfg.loader.timeout_ms, 30_000);
}

#[test]
fn feature_flags_section_is_optional() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove("feature_flags");

	let payload = toml::to_string(&root).expect("Failed to render template config.");
	let cfg = load_payload(payload).expect("Expected valid config.");

	assert!(!cfg.feature_flags.is_enabled(QUERY_BASED_DASHBOARD_CARDS));
}

#[test]
fn zero_timeout_is_rejected() {
	let payload = sample_toml_with("loader", "timeout_ms", Value::Integer(0));
	let err = load_payload(payload).expect_err("Expected timeout validation error.");
	let message = err.to_string();

	assert!(
		message.contains("loader.timeout_ms must be greater than zero."),
		"Unexpected error message: {message}"
	);
}

#[test]
fn blank_log_level_is_rejected() {
	let payload = sample_toml_with("service", "log_level", Value::String("   ".to_string()));
	let err = load_payload(payload).expect_err("Expected log level validation error.");

	assert!(err.to_string().contains("service.log_level must be non-empty."));
}

#[test]
fn log_level_is_trimmed() {
	let payload = sample_toml_with("service", "log_level", Value::String(" debug ".to_string()));
	let cfg = load_payload(payload).expect("Expected valid config.");

	assert_eq!(cfg.service.log_level, "debug");
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("insight_config_test_missing.toml");
	let err = insight_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, insight_config::Error::ReadConfig { .. }));
}

#[test]
fn workspace_defaults_fall_back_to_false() {
	let payload = "\
[service]
log_level = \"info\"

[workspace]

[loader]
timeout_ms = 10
"
	.to_string();
	let cfg = load_payload(payload).expect("Expected valid config.");

	assert!(!cfg.workspace.filter_test_accounts_default);
	assert!(!cfg.workspace.test_account_filters_default_checked);
}
