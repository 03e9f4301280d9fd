//! Memoize Builder Module
//!
//! Collects memoization settings and wraps a function or method with them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{CacheError, Result};
use crate::memo::backend::{CacheSource, MethodCacheSource};
use crate::memo::function::CachedFunction;
use crate::memo::key::{make_key, CacheKey, CallArgs, KeyFn};
use crate::memo::method::CachedMethod;

static NEXT_FUNCTION_ID: AtomicUsize = AtomicUsize::new(1);

// == Settings ==
/// Settings shared by both wrapper kinds.
#[derive(Clone)]
pub(crate) struct MemoSettings {
    /// Unique per wrapped function; part of scoped keys
    pub(crate) id: usize,
    pub(crate) scoped: bool,
    pub(crate) typed: bool,
    pub(crate) key_fn: KeyFn,
}

// == Memoize ==
/// Builder returned by [`memoize`] and [`memoize_method`].
pub struct Memoize<S> {
    source: Option<S>,
    scoped: bool,
    typed: bool,
    key_fn: Option<KeyFn>,
}

impl<S> Default for Memoize<S> {
    fn default() -> Self {
        Self {
            source: None,
            scoped: true,
            typed: false,
            key_fn: None,
        }
    }
}

impl<S> Memoize<S> {
    /// Starts with no cache, `scoped = true` and `typed = false`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    /// Whether the function (and, for methods, the receiver) is part of the key.
    ///
    /// Unscoped wrappers sharing a cache deliberately read each other's results.
    pub fn scoped(mut self, scoped: bool) -> Self {
        self.scoped = scoped;
        self
    }

    /// Whether argument types are part of the key, keeping `3` and `3.0` apart.
    pub fn typed(mut self, typed: bool) -> Self {
        self.typed = typed;
        self
    }

    /// Replaces [`make_key`] with a custom key function.
    pub fn key_fn<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(&CallArgs, bool) -> Result<CacheKey> + Send + Sync + 'static,
    {
        self.key_fn = Some(Arc::new(key_fn));
        self
    }

    fn into_parts(self) -> Result<(S, MemoSettings)> {
        let source = self.source.ok_or_else(|| {
            CacheError::InvalidArgument("expected a cache to memoize into, got none".to_string())
        })?;
        let settings = MemoSettings {
            id: NEXT_FUNCTION_ID.fetch_add(1, Ordering::Relaxed),
            scoped: self.scoped,
            typed: self.typed,
            key_fn: self.key_fn.unwrap_or_else(|| Arc::new(make_key) as KeyFn),
        };
        Ok((source, settings))
    }
}

impl<C> Memoize<CacheSource<C>> {
    /// Wraps a function.
    ///
    /// # Errors
    /// `InvalidArgument` if no cache was given.
    pub fn wrap<F>(self, func: F) -> Result<CachedFunction<C, F>> {
        let (source, settings) = self.into_parts()?;
        Ok(CachedFunction::new(func, source, settings))
    }
}

impl<R, C> Memoize<MethodCacheSource<R, C>> {
    /// Wraps a method taking the receiver as its first parameter.
    ///
    /// # Errors
    /// `InvalidArgument` if no cache was given.
    pub fn wrap<F>(self, func: F) -> Result<CachedMethod<R, C, F>> {
        let (source, settings) = self.into_parts()?;
        Ok(CachedMethod::new(func, source, settings))
    }
}

/// Memoizes a function into the cache `source` resolves to.
pub fn memoize<C>(source: CacheSource<C>) -> Memoize<CacheSource<C>> {
    Memoize::new().cache(source)
}

/// Memoizes a method into the cache `source` resolves to.
pub fn memoize_method<R, C>(source: MethodCacheSource<R, C>) -> Memoize<MethodCacheSource<R, C>> {
    Memoize::new().cache(source)
}
