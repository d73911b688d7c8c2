//! # Engine Cache
//!
//! One-call helpers that keep a process-wide cache of compiled engines, so
//! repeated calls against the same pattern reuse its tokenization and
//! configuration.
//!
//! The cache holds at most [`CACHE_CAPACITY`] engines. Once full, it is
//! emptied before the next new pattern is inserted.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::Result;
use crate::generate::Engine;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Source { source: String, flags: String },
    Regex(String),
}

/// Most engines kept by the process-wide cache.
pub const CACHE_CAPACITY: usize = 1024;

struct EngineCache {
    capacity: usize,
    engines: Mutex<HashMap<CacheKey, Arc<Engine>>>,
}

impl EngineCache {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            engines: Mutex::new(HashMap::new()),
        }
    }

    fn get_or_compile(
        &self,
        key: CacheKey,
        compile: impl FnOnce() -> Result<Engine>,
    ) -> Result<Arc<Engine>> {
        if let Some(engine) = self.engines.lock().get(&key) {
            return Ok(engine.clone());
        }
        // Compile outside the lock; a racing thread may insert first, and its engine wins.
        let engine = Arc::new(compile()?);

        let mut engines = self.engines.lock();
        if engines.len() >= self.capacity && !engines.contains_key(&key) {
            tracing::debug!(evicted = engines.len(), "engine cache full");
            engines.clear();
        }
        tracing::debug!(?key, "caching engine");
        Ok(engines.entry(key).or_insert(engine).clone())
    }
}

static ENGINES: Lazy<EngineCache> = Lazy::new(|| EngineCache::with_capacity(CACHE_CAPACITY));

fn cached(
    key: CacheKey,
    compile: impl FnOnce() -> Result<Engine>,
) -> Result<Arc<Engine>> {
    ENGINES.get_or_compile(key, compile)
}

/// Generates one random string for `source` compiled with `flags`.
pub fn randexp(
    source: &str,
    flags: &str,
) -> Result<String> {
    let key = CacheKey::Source {
        source: source.to_string(),
        flags: flags.to_string(),
    };
    cached(key, || Engine::compile(source, flags))?.sample()
}

/// The cached engine for a compiled regex.
pub fn engine_for(regex: &::regex::Regex) -> Result<Arc<Engine>> {
    cached(CacheKey::Regex(regex.as_str().to_string()), || {
        Engine::compile(regex, "")
    })
}

/// Generation directly from a compiled [`regex::Regex`](::regex::Regex).
pub trait RegexExt {
    /// A random string this regex matches.
    fn sample(&self) -> Result<String>;
}

impl RegexExt for ::regex::Regex {
    fn sample(&self) -> Result<String> {
        engine_for(self)?.sample()
    }
}
