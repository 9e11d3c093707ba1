//! Named scalar formats mapped to value generators.

use chrono::{DateTime, Utc};
use fake::faker::internet::en::{DomainSuffix, IPv4, IPv6, SafeEmail, Username};
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::{Rng, RngCore};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Produces a value for one format tag, drawing only from the supplied random source.
pub type FormatFn = Arc<dyn Fn(&mut dyn RngCore) -> Value + Send + Sync>;

/// Lookup table consulted before generic scalar generation.
///
/// Registries are read-only once generation starts and can be shared across threads.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    generators: HashMap<String, FormatFn>,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.names())
            .finish()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with faker-backed generators for common formats.
    pub fn with_builtin_formats() -> Self {
        let mut registry = Self::new();
        registry.register("email", |mut rng| Value::String(SafeEmail().fake_with_rng(&mut rng)));
        registry.register("uuid", |rng| {
            Value::String(uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string())
        });
        registry.register("date-time", |rng| Value::String(timestamp(rng).to_rfc3339()));
        registry.register("date", |rng| {
            Value::String(timestamp(rng).format("%Y-%m-%d").to_string())
        });
        registry.register("time", |rng| {
            Value::String(timestamp(rng).format("%H:%M:%S").to_string())
        });
        registry.register("uri", uri);
        registry.register("url", uri);
        registry.register("hostname", |rng| Value::String(hostname(rng)));
        registry.register("ipv4", |mut rng| Value::String(IPv4().fake_with_rng(&mut rng)));
        registry.register("ipv6", |mut rng| Value::String(IPv6().fake_with_rng(&mut rng)));
        registry.register("name", |mut rng| Value::String(Name().fake_with_rng(&mut rng)));
        registry.register("first-name", |mut rng| {
            Value::String(FirstName().fake_with_rng(&mut rng))
        });
        registry.register("last-name", |mut rng| {
            Value::String(LastName().fake_with_rng(&mut rng))
        });
        registry.register("username", |mut rng| {
            Value::String(Username().fake_with_rng(&mut rng))
        });
        registry.register("phone", |mut rng| {
            Value::String(PhoneNumber().fake_with_rng(&mut rng))
        });
        registry.register("word", |mut rng| Value::String(Word().fake_with_rng(&mut rng)));
        registry.register("sentence", |mut rng| {
            Value::String(Sentence(1..10).fake_with_rng(&mut rng))
        });
        registry
    }

    /// Register `generator` under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, generator: F) -> &mut Self
    where
        F: Fn(&mut dyn RngCore) -> Value + Send + Sync + 'static,
    {
        self.generators.insert(name.into(), Arc::new(generator));
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&FormatFn> {
        self.generators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Registered format names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Add every generator of `other`; its entries win on name collisions.
    pub fn extend(&mut self, other: FormatRegistry) {
        self.generators.extend(other.generators);
    }
}

/// A timestamp between 1970 and 2038.
fn timestamp(rng: &mut dyn RngCore) -> DateTime<Utc> {
    let seconds = rng.gen_range(0..i64::from(i32::MAX));
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}

fn hostname(mut rng: &mut dyn RngCore) -> String {
    let label: String = Word().fake_with_rng(&mut rng);
    let suffix: String = DomainSuffix().fake_with_rng(&mut rng);
    format!("{}.{}", label.to_lowercase(), suffix)
}

fn uri(mut rng: &mut dyn RngCore) -> Value {
    let host = hostname(&mut *rng);
    let path: String = Word().fake_with_rng(&mut rng);
    Value::String(format!("https://{}/{}", host, path.to_lowercase()))
}
