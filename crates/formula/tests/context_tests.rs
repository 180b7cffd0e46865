//! Tests for data providers and `get()` resolution.

use std::sync::Mutex;

use anyhow::anyhow;
use chrono_tz::Tz;
use runtime_formula::{
    ContextError, DataProvider, DataProviderError, FormulaError, FunctionRegistry,
    JsonDataProvider, RuntimeFormulaContext, Value, evaluate_formula,
};

fn nodes() -> JsonDataProvider {
    JsonDataProvider::new(
        "previous_node",
        serde_json::json!({
            "1": { "body": "Hello world", "tags": ["a", "b"] },
            "2": { "count": 3 },
        }),
    )
}

/// Echoes the application context back, or fails on request.
struct ApplicationProvider;

impl DataProvider for ApplicationProvider {
    fn name(&self) -> &str {
        "app"
    }

    fn get_data_chunk(
        &self,
        application_context: &Value,
        path: &[&str],
    ) -> Result<Value, DataProviderError> {
        match path {
            ["context"] => Ok(application_context.clone()),
            ["broken"] => Err(DataProviderError::Other(anyhow!("backend unavailable"))),
            _ => Err(DataProviderError::Unresolvable {
                path: path.join("."),
            }),
        }
    }
}

/// Records every path it is asked for.
#[derive(Default)]
struct RecordingProvider {
    calls: Mutex<Vec<String>>,
}

impl DataProvider for &'static RecordingProvider {
    fn name(&self) -> &str {
        "log"
    }

    fn get_data_chunk(
        &self,
        _application_context: &Value,
        path: &[&str],
    ) -> Result<Value, DataProviderError> {
        let path = path.join(".");
        self.calls
            .lock()
            .map_err(|_| DataProviderError::Other(anyhow!("poisoned")))?
            .push(path.clone());
        Ok(Value::from(path))
    }
}

// =============================================================================
// Path resolution
// =============================================================================

#[test]
fn resolves_nested_members() {
    let context = RuntimeFormulaContext::default().with_provider(nodes());
    assert_eq!(
        context.get("previous_node.1.body").expect("path exists"),
        Value::from("Hello world")
    );
    assert_eq!(
        context.get("previous_node.2.count").expect("path exists"),
        Value::from(3.0)
    );
}

#[test]
fn resolves_array_items_by_index() {
    let context = RuntimeFormulaContext::default().with_provider(nodes());
    assert_eq!(
        context.get("previous_node.1.tags.1").expect("index exists"),
        Value::from("b")
    );
    assert!(context.get("previous_node.1.tags.5").is_err());
}

#[test]
fn provider_name_alone_returns_everything() {
    let context = RuntimeFormulaContext::default().with_provider(nodes());
    let all = context.get("previous_node").expect("root exists");
    assert!(matches!(all, Value::Object(ref entries) if entries.len() == 2));
}

#[test]
fn missing_provider_is_reported() {
    let context = RuntimeFormulaContext::default().with_provider(nodes());
    let err = context.get("next_node.1.body").expect_err("no such provider");
    assert!(matches!(
        err,
        ContextError::MissingDataProvider { ref provider } if provider == "next_node"
    ));
}

#[test]
fn unresolvable_path_names_provider_and_path() {
    let context = RuntimeFormulaContext::default().with_provider(nodes());
    let err = context.get("previous_node.9.body").expect_err("no node 9");
    match err {
        ContextError::UnresolvablePath { provider, path } => {
            assert_eq!(provider, "previous_node");
            assert_eq!(path, "9.body");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn empty_path_is_rejected() {
    let context = RuntimeFormulaContext::default().with_provider(nodes());
    assert!(matches!(context.get(""), Err(ContextError::EmptyPath)));
}

// =============================================================================
// Custom providers
// =============================================================================

#[test]
fn providers_receive_the_application_context() {
    let context =
        RuntimeFormulaContext::new(Value::from("tenant-42")).with_provider(ApplicationProvider);
    assert_eq!(
        context.get("app.context").expect("context is echoed"),
        Value::from("tenant-42")
    );
}

#[test]
fn provider_failures_are_wrapped() {
    let context = RuntimeFormulaContext::default().with_provider(ApplicationProvider);
    let err = context.get("app.broken").expect_err("provider fails");
    assert!(matches!(err, ContextError::Provider { ref provider, .. } if provider == "app"));
    assert!(err.to_string().contains("backend unavailable"));
}

#[test]
fn later_registration_replaces_a_provider() {
    let replacement = JsonDataProvider::new("previous_node", serde_json::json!({ "1": "new" }));
    let context = RuntimeFormulaContext::default()
        .with_provider(nodes())
        .with_provider(replacement);
    assert_eq!(
        context.get("previous_node.1").expect("replaced data"),
        Value::from("new")
    );
}

#[test]
fn arguments_are_resolved_left_to_right() {
    let recorder: &'static RecordingProvider = Box::leak(Box::new(RecordingProvider::default()));
    let context = RuntimeFormulaContext::default().with_provider(recorder);
    let registry = FunctionRegistry::with_builtins();

    let formula = "concat(get('log.a'), get('log.b'), get('log.c'))";
    let value = evaluate_formula(formula, &registry, &context).expect("formula should evaluate");

    assert_eq!(value, Value::from("abc"));
    let calls = recorder.calls.lock().expect("lock");
    assert_eq!(*calls, vec!["a", "b", "c"]);
}

// =============================================================================
// Formulas
// =============================================================================

#[test]
fn get_surfaces_context_errors() {
    let registry = FunctionRegistry::with_builtins();
    let context = RuntimeFormulaContext::default();

    let err = evaluate_formula("get('previous_node.1.body')", &registry, &context)
        .expect_err("no providers registered");
    assert!(matches!(
        err,
        FormulaError::Context(ContextError::MissingDataProvider { .. })
    ));
}

#[test]
fn timezone_defaults_and_overrides() {
    let context = RuntimeFormulaContext::default().with_timezone(Tz::Europe__Amsterdam);
    assert_eq!(context.timezone(), Tz::Europe__Amsterdam);
}
