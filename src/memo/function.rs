//! Cached Function Module
//!
//! Wraps a function so repeated calls with equal arguments are answered from
//! a cache.

use std::fmt;

use tracing::trace;

use crate::error::CacheError;
use crate::memo::backend::{CacheBackend, CacheSource};
use crate::memo::builder::MemoSettings;
use crate::memo::key::{ArgValue, CacheKey, CallArgs};

// == Cached Function ==
/// A memoized function, built with [`memoize`](crate::memo::memoize).
pub struct CachedFunction<C, F> {
    func: F,
    source: CacheSource<C>,
    settings: MemoSettings,
}

impl<C, F> CachedFunction<C, F> {
    pub(crate) fn new(func: F, source: CacheSource<C>, settings: MemoSettings) -> Self {
        Self {
            func,
            source,
            settings,
        }
    }

    /// Builds the key this wrapper stores a call's result under.
    ///
    /// # Errors
    /// `UnhashableArgument` if the arguments cannot form a key.
    pub fn key_for(&self, args: &CallArgs) -> crate::Result<CacheKey> {
        let settings = &self.settings;
        if settings.scoped {
            let scoped = args.with_prefix([ArgValue::Identity(settings.id)]);
            (settings.key_fn)(&scoped, settings.typed)
        } else {
            (settings.key_fn)(args, settings.typed)
        }
    }

    // == Call ==
    /// Returns the cached result for `args`, computing and storing it on a miss.
    ///
    /// Errors from the wrapped function come back unchanged and nothing is
    /// cached for them. Key and backend errors are converted into `E`.
    pub fn call<V, E>(&self, args: &CallArgs) -> Result<V, E>
    where
        F: Fn(&CallArgs) -> Result<V, E>,
        C: CacheBackend<CacheKey, V>,
        V: Clone,
        E: From<CacheError>,
    {
        let cache = self.source.resolve();
        let key = self.key_for(args)?;
        if let Some(value) = cache.lookup(&key)? {
            return Ok(value);
        }

        trace!(function = self.settings.id, "memoized call missed");
        let value = (self.func)(args)?;
        cache.store(key, value.clone());
        Ok(value)
    }

    pub fn scoped(&self) -> bool {
        self.settings.scoped
    }

    pub fn typed(&self) -> bool {
        self.settings.typed
    }
}

impl<C, F> fmt::Debug for CachedFunction<C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFunction")
            .field("id", &self.settings.id)
            .field("source", &self.source)
            .field("scoped", &self.settings.scoped)
            .field("typed", &self.settings.typed)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::cache::Cache;
    use crate::error::CacheError;
    use crate::memo::{memoize, ArgValue, CacheKey, CacheSource, CallArgs};

    fn int_arg(args: &CallArgs, index: usize) -> i64 {
        match args.get(index) {
            Some(ArgValue::Int(v)) => *v,
            Some(ArgValue::Float(f)) => *f as i64,
            _ => 0,
        }
    }

    #[test]
    fn test_computes_once_per_key() {
        let cache: Arc<Cache<CacheKey, i64>> = Arc::new(Cache::lru(8).unwrap());
        let calls = Cell::new(0);
        let square = memoize(CacheSource::shared(cache.clone()))
            .wrap(|args: &CallArgs| {
                calls.set(calls.get() + 1);
                let x = int_arg(args, 0);
                Ok::<_, CacheError>(x * x)
            })
            .unwrap();

        let args = CallArgs::new().arg(4);
        assert_eq!(square.call(&args).unwrap(), 16);
        assert_eq!(square.call(&args).unwrap(), 16);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);

        assert_eq!(square.call(&CallArgs::new().arg(5)).unwrap(), 25);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_typed_separates_int_and_float() {
        let cache: Arc<Cache<CacheKey, i64>> = Arc::new(Cache::lru(8).unwrap());
        let calls = Cell::new(0);
        let double = memoize(CacheSource::shared(cache.clone()))
            .typed(true)
            .wrap(|args: &CallArgs| {
                calls.set(calls.get() + 1);
                Ok::<_, CacheError>(int_arg(args, 0) * 2)
            })
            .unwrap();

        double.call(&CallArgs::new().arg(3)).unwrap();
        double.call(&CallArgs::new().arg(3.0)).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_untyped_merges_int_and_float() {
        let cache: Arc<Cache<CacheKey, i64>> = Arc::new(Cache::lru(8).unwrap());
        let calls = Cell::new(0);
        let double = memoize(CacheSource::shared(cache.clone()))
            .wrap(|args: &CallArgs| {
                calls.set(calls.get() + 1);
                Ok::<_, CacheError>(int_arg(args, 0) * 2)
            })
            .unwrap();

        double.call(&CallArgs::new().arg(3)).unwrap();
        double.call(&CallArgs::new().arg(3.0)).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: Arc<Cache<CacheKey, i64>> = Arc::new(Cache::lru(8).unwrap());
        let attempts = Cell::new(0);
        let flaky = memoize(CacheSource::shared(cache.clone()))
            .wrap(|_: &CallArgs| {
                attempts.set(attempts.get() + 1);
                if attempts.get() == 1 {
                    Err(CacheError::InvalidArgument("first attempt".into()))
                } else {
                    Ok(7)
                }
            })
            .unwrap();

        let args = CallArgs::new().arg("x");
        assert!(matches!(flaky.call(&args), Err(CacheError::InvalidArgument(_))));
        assert!(cache.is_empty());
        assert_eq!(flaky.call(&args).unwrap(), 7);
        assert_eq!(flaky.call(&args).unwrap(), 7);
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_unhashable_arguments_fail_the_call() {
        let cache: Arc<Cache<CacheKey, i64>> = Arc::new(Cache::lru(8).unwrap());
        let identity = memoize(CacheSource::shared(cache))
            .wrap(|_: &CallArgs| Ok::<_, CacheError>(1))
            .unwrap();

        let result = identity.call(&CallArgs::new().arg(ArgValue::list([1])));
        assert!(matches!(result, Err(CacheError::UnhashableArgument(_))));
    }

    #[test]
    fn test_scoped_functions_do_not_share_entries() {
        let cache: Arc<Cache<CacheKey, i64>> = Arc::new(Cache::lru(8).unwrap());
        let plus_one = memoize(CacheSource::shared(cache.clone()))
            .wrap(|args: &CallArgs| Ok::<_, CacheError>(int_arg(args, 0) + 1))
            .unwrap();
        let plus_two = memoize(CacheSource::shared(cache.clone()))
            .wrap(|args: &CallArgs| Ok::<_, CacheError>(int_arg(args, 0) + 2))
            .unwrap();

        let args = CallArgs::new().arg(1);
        assert_eq!(plus_one.call(&args).unwrap(), 2);
        assert_eq!(plus_two.call(&args).unwrap(), 3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_unscoped_functions_share_entries() {
        let cache: Arc<Cache<CacheKey, i64>> = Arc::new(Cache::lru(8).unwrap());
        let plus_one = memoize(CacheSource::shared(cache.clone()))
            .scoped(false)
            .wrap(|args: &CallArgs| Ok::<_, CacheError>(int_arg(args, 0) + 1))
            .unwrap();
        let plus_two = memoize(CacheSource::shared(cache.clone()))
            .scoped(false)
            .wrap(|args: &CallArgs| Ok::<_, CacheError>(int_arg(args, 0) + 2))
            .unwrap();

        let args = CallArgs::new().arg(1);
        assert_eq!(plus_one.call(&args).unwrap(), 2);
        assert_eq!(plus_two.call(&args).unwrap(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_factory_source_picks_cache_per_call() {
        let current: Arc<Mutex<Arc<Mutex<HashMap<CacheKey, i64>>>>> =
            Arc::new(Mutex::new(Arc::new(Mutex::new(HashMap::new()))));
        let handle = current.clone();
        let calls = Cell::new(0);
        let f = memoize(CacheSource::factory(move || handle.lock().clone()))
            .wrap(|_: &CallArgs| {
                calls.set(calls.get() + 1);
                Ok::<_, CacheError>(1)
            })
            .unwrap();

        let args = CallArgs::new().arg(1);
        f.call(&args).unwrap();
        f.call(&args).unwrap();
        assert_eq!(calls.get(), 1);

        // A new scope gets a fresh cache
        *current.lock() = Arc::new(Mutex::new(HashMap::new()));
        f.call(&args).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_custom_key_fn() {
        let cache: Arc<Cache<CacheKey, i64>> = Arc::new(Cache::lru(8).unwrap());
        let calls = Cell::new(0);
        // Key on the first argument only
        let f = memoize(CacheSource::shared(cache.clone()))
            .scoped(false)
            .key_fn(|args: &CallArgs, _typed: bool| {
                Ok(CacheKey::Plain(args.get(0).cloned().unwrap_or(ArgValue::None)))
            })
            .wrap(|args: &CallArgs| {
                calls.set(calls.get() + 1);
                Ok::<_, CacheError>(int_arg(args, 1))
            })
            .unwrap();

        assert_eq!(f.call(&CallArgs::new().arg(1).arg(10)).unwrap(), 10);
        assert_eq!(f.call(&CallArgs::new().arg(1).arg(20)).unwrap(), 10);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_anyhow_errors_pass_through() {
        let cache: Arc<Cache<CacheKey, String>> = Arc::new(Cache::lru(8).unwrap());
        let f = memoize(CacheSource::shared(cache))
            .wrap(|_: &CallArgs| -> anyhow::Result<String> { anyhow::bail!("boom") })
            .unwrap();

        let err = f.call(&CallArgs::new().arg(1)).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_debug_output() {
        let cache: Arc<Cache<CacheKey, i64>> = Arc::new(Cache::lru(8).unwrap());
        let f = memoize(CacheSource::shared(cache))
            .typed(true)
            .wrap(|_: &CallArgs| Ok::<_, CacheError>(1))
            .unwrap();
        let rendered = format!("{:?}", f);
        assert!(rendered.starts_with("CachedFunction { id: "));
        assert!(rendered.ends_with("source: Shared, scoped: true, typed: true }"));
        assert!(f.scoped());
        assert!(f.typed());
    }
}
