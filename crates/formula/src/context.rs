//! Runtime context resolving `get('provider.path')` references.
//!
//! A [`RuntimeFormulaContext`] owns a set of named [`DataProvider`]s plus an opaque
//! application context handed to each of them. Resolution is pure dispatch: the first path
//! segment picks the provider and the remaining segments are passed along. Nothing is cached.

use std::collections::HashMap;

use chrono_tz::Tz;
use thiserror::Error;

use crate::argument::parse_timezone;
use crate::value::Value;

/// Errors a provider reports back to the resolver.
#[derive(Debug, Error)]
pub enum DataProviderError {
    /// The provider has no data at this path.
    #[error("no data at `{path}`")]
    Unresolvable { path: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised while resolving a dotted path.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no data provider named `{provider}`")]
    MissingDataProvider { provider: String },
    #[error("data provider `{provider}` cannot resolve `{path}`")]
    UnresolvablePath { provider: String, path: String },
    #[error("data provider `{provider}` failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("empty data path")]
    EmptyPath,
}

/// A named source of data for `get()` references.
pub trait DataProvider: Send + Sync {
    /// The first path segment that routes to this provider.
    fn name(&self) -> &str;

    /// Resolve the remaining path segments.
    fn get_data_chunk(
        &self,
        application_context: &Value,
        path: &[&str],
    ) -> Result<Value, DataProviderError>;
}

/// A provider serving a fixed tree of values.
///
/// Object members are addressed by key and array items by decimal index.
#[derive(Debug, Clone)]
pub struct JsonDataProvider {
    name: String,
    data: Value,
}

impl JsonDataProvider {
    pub fn new(name: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl DataProvider for JsonDataProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_data_chunk(
        &self,
        _application_context: &Value,
        path: &[&str],
    ) -> Result<Value, DataProviderError> {
        let mut current = &self.data;
        for segment in path {
            let next = match current {
                Value::Object(entries) => entries.get(*segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
                _ => None,
            };
            current = next.ok_or_else(|| DataProviderError::Unresolvable {
                path: path.join("."),
            })?;
        }
        Ok(current.clone())
    }
}

/// Everything a formula can reach at evaluation time.
pub struct RuntimeFormulaContext {
    providers: HashMap<String, Box<dyn DataProvider>>,
    application_context: Value,
    timezone: Option<Tz>,
}

impl Default for RuntimeFormulaContext {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl RuntimeFormulaContext {
    pub fn new(application_context: Value) -> Self {
        Self {
            providers: HashMap::new(),
            application_context,
            timezone: None,
        }
    }

    /// Adds a provider, replacing any provider with the same name.
    pub fn with_provider(mut self, provider: impl DataProvider + 'static) -> Self {
        self.register_provider(Box::new(provider));
        self
    }

    pub fn register_provider(&mut self, provider: Box<dyn DataProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = Some(timezone);
        self
    }

    pub fn application_context(&self) -> &Value {
        &self.application_context
    }

    /// The zone used for calendar fields and as the default for `datetime_format`.
    ///
    /// Falls back to the `TZ` environment variable, then UTC.
    pub fn timezone(&self) -> Tz {
        self.timezone
            .or_else(|| std::env::var("TZ").ok().as_deref().and_then(parse_timezone))
            .unwrap_or(Tz::UTC)
    }

    /// Resolve a dotted path such as `previous_node.1.body`.
    pub fn get(&self, path: &str) -> Result<Value, ContextError> {
        let mut segments = path.split('.');
        let provider_name = segments
            .next()
            .filter(|name| !name.is_empty())
            .ok_or(ContextError::EmptyPath)?;
        let rest: Vec<&str> = segments.collect();

        let provider =
            self.providers
                .get(provider_name)
                .ok_or_else(|| ContextError::MissingDataProvider {
                    provider: provider_name.to_string(),
                })?;

        log::trace!("resolving `{}` through provider `{provider_name}`", rest.join("."));

        provider
            .get_data_chunk(&self.application_context, &rest)
            .map_err(|err| match err {
                DataProviderError::Unresolvable { path } => ContextError::UnresolvablePath {
                    provider: provider_name.to_string(),
                    path,
                },
                DataProviderError::Other(source) => ContextError::Provider {
                    provider: provider_name.to_string(),
                    source,
                },
            })
    }
}
