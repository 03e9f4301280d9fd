//! Cached Method Module
//!
//! Memoized methods: like cached functions, but the receiver picks the cache
//! (through [`MethodCacheSource`]) and, when scoped, is part of the key.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use tracing::trace;

use crate::error::CacheError;
use crate::memo::backend::{CacheBackend, HasInstanceId, MethodCacheSource};
use crate::memo::builder::MemoSettings;
use crate::memo::key::{ArgValue, CacheKey, CallArgs};

/// The cache a method call resolved to: owned from a shared or factory source,
/// borrowed from the receiver otherwise.
enum Resolved<'a, C> {
    Owned(Arc<C>),
    Borrowed(&'a C),
}

impl<C> Deref for Resolved<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        match self {
            Resolved::Owned(cache) => cache,
            Resolved::Borrowed(cache) => cache,
        }
    }
}

// == Cached Method ==
/// A memoized method, built with [`memoize_method`](crate::memo::memoize_method).
pub struct CachedMethod<R, C, F> {
    func: F,
    source: MethodCacheSource<R, C>,
    settings: MemoSettings,
}

impl<R, C, F> CachedMethod<R, C, F> {
    pub(crate) fn new(func: F, source: MethodCacheSource<R, C>, settings: MemoSettings) -> Self {
        Self {
            func,
            source,
            settings,
        }
    }

    fn resolve<'a>(&self, receiver: &'a R) -> Resolved<'a, C> {
        match &self.source {
            MethodCacheSource::Shared(cache) => Resolved::Owned(Arc::clone(cache)),
            MethodCacheSource::Factory(factory) => Resolved::Owned(factory(receiver)),
            MethodCacheSource::Receiver(get) => Resolved::Borrowed(get(receiver)),
        }
    }

    /// Builds the key a call on `receiver` stores its result under.
    ///
    /// Scoped keys start with the receiver's [`InstanceId`](crate::memo::InstanceId),
    /// so two receivers never share entries even when they share a cache.
    pub fn key_for(&self, receiver: &R, args: &CallArgs) -> crate::Result<CacheKey>
    where
        R: HasInstanceId,
    {
        let settings = &self.settings;
        if settings.scoped {
            let scoped = args.with_prefix([
                ArgValue::Identity(receiver.instance_id().get()),
                ArgValue::Identity(settings.id),
            ]);
            (settings.key_fn)(&scoped, settings.typed)
        } else {
            (settings.key_fn)(args, settings.typed)
        }
    }

    // == Call ==
    /// Calls the method on `receiver`, answering from the cache when possible.
    pub fn call<V, E>(&self, receiver: &R, args: &CallArgs) -> Result<V, E>
    where
        R: HasInstanceId,
        F: Fn(&R, &CallArgs) -> Result<V, E>,
        C: CacheBackend<CacheKey, V>,
        V: Clone,
        E: From<CacheError>,
    {
        let cache = self.resolve(receiver);
        let key = self.key_for(receiver, args)?;
        if let Some(value) = cache.lookup(&key)? {
            return Ok(value);
        }

        trace!(method = self.settings.id, "memoized method call missed");
        let value = (self.func)(receiver, args)?;
        cache.store(key, value.clone());
        Ok(value)
    }

    /// Pairs the method with a receiver so it can be called like a function.
    pub fn bind<'a>(&'a self, receiver: &'a R) -> BoundMethod<'a, R, C, F> {
        BoundMethod {
            method: self,
            receiver,
        }
    }

    pub fn scoped(&self) -> bool {
        self.settings.scoped
    }

    pub fn typed(&self) -> bool {
        self.settings.typed
    }
}

impl<R, C, F> fmt::Debug for CachedMethod<R, C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedMethod")
            .field("id", &self.settings.id)
            .field("source", &self.source)
            .field("scoped", &self.settings.scoped)
            .field("typed", &self.settings.typed)
            .finish()
    }
}

// == Bound Method ==
/// A [`CachedMethod`] together with the receiver it is called on.
pub struct BoundMethod<'a, R, C, F> {
    method: &'a CachedMethod<R, C, F>,
    receiver: &'a R,
}

impl<R, C, F> BoundMethod<'_, R, C, F> {
    pub fn call<V, E>(&self, args: &CallArgs) -> Result<V, E>
    where
        R: HasInstanceId,
        F: Fn(&R, &CallArgs) -> Result<V, E>,
        C: CacheBackend<CacheKey, V>,
        V: Clone,
        E: From<CacheError>,
    {
        self.method.call(self.receiver, args)
    }
}
