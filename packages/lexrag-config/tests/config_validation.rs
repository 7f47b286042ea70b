use toml::Value;

use lexrag_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn parse_sample() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn set(value: &mut Value, table_path: &[&str], key: &str, new: Value) {
	let mut current = value.as_table_mut().expect("Template config must be a table.");

	for segment in table_path {
		current = current
			.get_mut(*segment)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{segment}]."));
	}

	current.insert(key.to_string(), new);
}

fn config_from(value: Value) -> Result<Config, Error> {
	let raw = toml::to_string(&value).expect("Failed to render template config.");
	let cfg: Config = toml::from_str(&raw).expect("Rendered config must deserialize.");

	lexrag_config::validate(&cfg).map(|()| cfg)
}

#[test]
fn sample_config_is_valid() {
	let cfg = config_from(parse_sample()).expect("Sample config must validate.");

	assert_eq!(cfg.providers.embedding.dimensions, 1536);
	assert_eq!(cfg.retrieval.fused_top_n, 5);
}

#[test]
fn rejects_zero_embedding_dimensions() {
	let mut value = parse_sample();

	set(&mut value, &["providers", "embedding"], "dimensions", Value::Integer(0));

	let err = config_from(value).expect_err("Zero dimensions must be rejected.");

	assert!(err.to_string().contains("dimensions"));
}

#[test]
fn rejects_out_of_range_similarity_threshold() {
	let mut value = parse_sample();

	set(&mut value, &["retrieval"], "similarity_threshold", Value::Float(1.5));

	assert!(config_from(value).is_err());
}

#[test]
fn rejects_non_positive_rrf_k() {
	let mut value = parse_sample();

	set(&mut value, &["retrieval"], "rrf_k", Value::Float(0.0));

	assert!(config_from(value).is_err());
}

#[test]
fn rejects_empty_resolution_url() {
	let mut value = parse_sample();

	set(&mut value, &["providers", "resolution", "mni"], "url", Value::String(String::new()));

	assert!(config_from(value).is_err());
}

#[test]
fn rejects_zero_fused_top_n() {
	let mut value = parse_sample();

	set(&mut value, &["retrieval"], "fused_top_n", Value::Integer(0));

	assert!(config_from(value).is_err());
}
