//! Tests for loading engine configuration.

use std::io::Cursor;

use chrono_tz::Tz;
use runtime_formula::config::{from_yaml_reader, from_yaml_str};
use runtime_formula::{
    EngineConfig, Fallback, FormulaMode, FunctionRegistry, Value, evaluate_formula, load_config,
    resolve_formula,
};

const CONFIG: &str = r#"
timezone: Europe/Amsterdam
mode: advanced
fallback: "null"
providers:
  previous_node:
    "1":
      body: Hello world
      tags: [a, b]
  user:
    name: Ada
"#;

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn parses_a_full_config() -> anyhow::Result<()> {
    let config = from_yaml_str(CONFIG)?;

    assert_eq!(config.timezone.as_deref(), Some("Europe/Amsterdam"));
    assert_eq!(config.mode, FormulaMode::Advanced);
    assert_eq!(config.fallback, Fallback::Null);
    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.timezone()?, Some(Tz::Europe__Amsterdam));

    Ok(())
}

#[test]
fn missing_fields_use_defaults() -> anyhow::Result<()> {
    let config = from_yaml_str("{}")?;
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.mode, FormulaMode::Simple);
    assert_eq!(config.fallback.value(), Value::from(""));
    assert_eq!(config.timezone()?, None);

    Ok(())
}

#[test]
fn json_is_accepted() -> anyhow::Result<()> {
    let json = r#"{ "mode": "raw", "fallback": "empty_string" }"#;
    let config = from_yaml_reader(Cursor::new(json))?;
    assert_eq!(config.mode, FormulaMode::Raw);
    assert_eq!(config.fallback, Fallback::EmptyString);

    Ok(())
}

#[test]
fn unknown_modes_are_rejected() {
    assert!(from_yaml_str("mode: fancy").is_err());
    assert!("fancy".parse::<FormulaMode>().is_err());
    assert_eq!(
        "Advanced".parse::<FormulaMode>().expect("known mode"),
        FormulaMode::Advanced
    );
}

#[test]
fn unknown_timezones_are_rejected() -> anyhow::Result<()> {
    let config = from_yaml_str("timezone: Mars/Olympus_Mons")?;
    assert!(config.timezone().is_err());
    assert!(config.into_context().is_err());

    Ok(())
}

#[test]
fn loads_from_a_file() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!(
        "runtime-formula-config-{}.yaml",
        std::process::id()
    ));
    std::fs::write(&path, CONFIG)?;

    let loaded = load_config(&path);
    std::fs::remove_file(&path)?;

    assert_eq!(loaded?.mode, FormulaMode::Advanced);
    assert!(load_config(&path).is_err());

    Ok(())
}

// =============================================================================
// Runtime context
// =============================================================================

#[test]
fn providers_are_served_from_the_config() -> anyhow::Result<()> {
    let context = from_yaml_str(CONFIG)?.into_context()?;
    let registry = FunctionRegistry::with_builtins();

    assert_eq!(context.timezone(), Tz::Europe__Amsterdam);
    assert_eq!(
        evaluate_formula(
            "concat(get('user.name'), ': ', get('previous_node.1.tags.1'))",
            &registry,
            &context
        )?,
        Value::from("Ada: b")
    );

    Ok(())
}

#[test]
fn configured_fallback_is_used_when_resolving() -> anyhow::Result<()> {
    let config = from_yaml_str(CONFIG)?;
    let context = config.clone().into_context()?;
    let registry = FunctionRegistry::with_builtins();

    assert_eq!(
        resolve_formula("get('nobody.home')", &registry, &context, &config),
        Value::Null
    );
    assert_eq!(
        resolve_formula("hour('2025-11-03 14:05')", &registry, &context, &config),
        Value::from(15.0)
    );

    Ok(())
}
