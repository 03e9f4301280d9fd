//! Key Composer Module
//!
//! Builds flat, hashable cache keys from a call's positional and named
//! arguments.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::error::{CacheError, Result};
use crate::sentinel::{Sentinel, KWARG_MARK};

// == Argument Type ==
/// Type tag of an argument, mixed into keys built with `typed = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    None,
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    Tuple,
    Identity,
    Sentinel,
    Type,
    Named,
    List,
    Map,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgType::None => "none",
            ArgType::Bool => "bool",
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::Text => "text",
            ArgType::Bytes => "bytes",
            ArgType::Tuple => "tuple",
            ArgType::Identity => "identity",
            ArgType::Sentinel => "sentinel",
            ArgType::Type => "type",
            ArgType::Named => "named",
            ArgType::List => "list",
            ArgType::Map => "map",
        };
        f.write_str(name)
    }
}

// == Argument Value ==
/// One argument of a memoized call.
///
/// Numbers compare by value, so `Int(3)` equals `Float(3.0)` and both hash
/// alike. `List`, `Map` and NaN floats are accepted as arguments but cannot
/// be part of a key.
#[derive(Debug, Clone)]
pub enum ArgValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Tuple(Vec<ArgValue>),
    /// Address or id of an object, compared by identity
    Identity(usize),
    Sentinel(Sentinel),
    Type(ArgType),
    /// A named argument as it appears inside a key
    Named(String, Box<ArgValue>),
    List(Vec<ArgValue>),
    Map(Vec<(String, ArgValue)>),
}

/// Integral finite floats map onto the integer they equal.
fn float_as_int(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or above it overflows i64
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && f >= -I64_BOUND && f < I64_BOUND {
        Some(f as i64)
    } else {
        None
    }
}

impl ArgValue {
    /// Wraps any object's address as an identity value.
    pub fn identity_of<T: ?Sized>(value: &T) -> Self {
        ArgValue::Identity(value as *const T as *const () as usize)
    }

    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ArgValue>,
    {
        ArgValue::Tuple(items.into_iter().map(Into::into).collect())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ArgValue>,
    {
        ArgValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn type_tag(&self) -> ArgType {
        match self {
            ArgValue::None => ArgType::None,
            ArgValue::Bool(_) => ArgType::Bool,
            ArgValue::Int(_) => ArgType::Int,
            ArgValue::Float(_) => ArgType::Float,
            ArgValue::Text(_) => ArgType::Text,
            ArgValue::Bytes(_) => ArgType::Bytes,
            ArgValue::Tuple(_) => ArgType::Tuple,
            ArgValue::Identity(_) => ArgType::Identity,
            ArgValue::Sentinel(_) => ArgType::Sentinel,
            ArgValue::Type(_) => ArgType::Type,
            ArgValue::Named(..) => ArgType::Named,
            ArgValue::List(_) => ArgType::List,
            ArgValue::Map(_) => ArgType::Map,
        }
    }

    /// Fails on the first value that cannot take part in a key.
    pub fn ensure_hashable(&self) -> Result<()> {
        match self {
            ArgValue::List(_) | ArgValue::Map(_) => Err(CacheError::UnhashableArgument(
                format!("{} values cannot be part of a cache key", self.type_tag()),
            )),
            ArgValue::Float(f) if f.is_nan() => Err(CacheError::UnhashableArgument(
                "NaN cannot be part of a cache key".to_string(),
            )),
            ArgValue::Tuple(items) => items.iter().try_for_each(ArgValue::ensure_hashable),
            ArgValue::Named(_, value) => value.ensure_hashable(),
            _ => Ok(()),
        }
    }

    /// Single values of these kinds are used as keys without wrapping.
    fn fast_key(&self) -> Option<ArgValue> {
        match self {
            ArgValue::Int(_) | ArgValue::Text(_) | ArgValue::None => Some(self.clone()),
            // Keep 3.0 and 3 on the same untyped key
            ArgValue::Float(f) => float_as_int(*f).map(ArgValue::Int),
            _ => None,
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        use ArgValue as A;
        match (self, other) {
            (A::None, A::None) => true,
            (A::Bool(a), A::Bool(b)) => a == b,
            (A::Int(a), A::Int(b)) => a == b,
            (A::Float(a), A::Float(b)) => a == b,
            (A::Int(i), A::Float(f)) | (A::Float(f), A::Int(i)) => float_as_int(*f) == Some(*i),
            (A::Text(a), A::Text(b)) => a == b,
            (A::Bytes(a), A::Bytes(b)) => a == b,
            (A::Tuple(a), A::Tuple(b)) => a == b,
            (A::Identity(a), A::Identity(b)) => a == b,
            (A::Sentinel(a), A::Sentinel(b)) => a == b,
            (A::Type(a), A::Type(b)) => a == b,
            (A::Named(an, av), A::Named(bn, bv)) => an == bn && av == bv,
            (A::List(a), A::List(b)) => a == b,
            (A::Map(a), A::Map(b)) => a == b,
            _ => false,
        }
    }
}

// NaN is the only value breaking reflexivity and it never reaches a key.
impl Eq for ArgValue {}

impl Hash for ArgValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ArgValue::None => 0u8.hash(state),
            ArgValue::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            ArgValue::Int(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            ArgValue::Float(f) => match float_as_int(*f) {
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None => {
                    3u8.hash(state);
                    f.to_bits().hash(state);
                }
            },
            ArgValue::Text(s) => {
                4u8.hash(state);
                s.hash(state);
            }
            ArgValue::Bytes(b) => {
                5u8.hash(state);
                b.hash(state);
            }
            ArgValue::Tuple(items) => {
                6u8.hash(state);
                items.hash(state);
            }
            ArgValue::Identity(id) => {
                7u8.hash(state);
                id.hash(state);
            }
            ArgValue::Sentinel(s) => {
                8u8.hash(state);
                s.hash(state);
            }
            ArgValue::Type(t) => {
                9u8.hash(state);
                t.hash(state);
            }
            ArgValue::Named(name, value) => {
                10u8.hash(state);
                name.hash(state);
                value.hash(state);
            }
            ArgValue::List(items) => {
                11u8.hash(state);
                items.hash(state);
            }
            ArgValue::Map(items) => {
                12u8.hash(state);
                items.hash(state);
            }
        }
    }
}

// == Conversions ==
impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v.into())
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::Int(v.into())
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<f32> for ArgValue {
    fn from(v: f32) -> Self {
        ArgValue::Float(v.into())
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Text(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Text(v)
    }
}

impl From<&[u8]> for ArgValue {
    fn from(v: &[u8]) -> Self {
        ArgValue::Bytes(v.to_vec())
    }
}

impl From<Sentinel> for ArgValue {
    fn from(v: Sentinel) -> Self {
        ArgValue::Sentinel(v)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ArgValue::None, Into::into)
    }
}

// == Call Arguments ==
/// Positional and named arguments of one call.
///
/// Named arguments are kept sorted by name, so call sites that pass them in a
/// different order build the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    named: BTreeMap<String, ArgValue>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named argument, replacing an earlier one with the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    pub fn named(&self) -> &BTreeMap<String, ArgValue> {
        &self.named
    }

    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.positional.get(index)
    }

    pub fn get_named(&self, name: &str) -> Option<&ArgValue> {
        self.named.get(name)
    }

    /// Returns a copy with `prefix` placed before the positional arguments.
    pub fn with_prefix<I>(&self, prefix: I) -> Self
    where
        I: IntoIterator<Item = ArgValue>,
    {
        let mut positional: Vec<ArgValue> = prefix.into_iter().collect();
        positional.extend(self.positional.iter().cloned());
        Self {
            positional,
            named: self.named.clone(),
        }
    }
}

// == Cache Key ==
/// A composite key whose hash is computed once, when it is built.
#[derive(Clone)]
pub struct HashedKey {
    parts: Arc<[ArgValue]>,
    hash: u64,
}

impl HashedKey {
    /// # Errors
    /// `UnhashableArgument` if any part cannot be hashed.
    pub fn new(parts: Vec<ArgValue>) -> Result<Self> {
        parts.iter().try_for_each(ArgValue::ensure_hashable)?;
        let mut hasher = FxHasher::default();
        parts.hash(&mut hasher);
        Ok(Self {
            hash: hasher.finish(),
            parts: parts.into(),
        })
    }

    pub fn parts(&self) -> &[ArgValue] {
        &self.parts
    }
}

impl PartialEq for HashedKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.parts == other.parts
    }
}

impl Eq for HashedKey {}

impl Hash for HashedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for HashedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HashedKey").field(&self.parts).finish()
    }
}

/// Key under which a memoized result is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A lone integer, text or none argument, used as is
    Plain(ArgValue),
    Hashed(HashedKey),
}

/// Signature of a custom key function: arguments and the `typed` flag.
pub type KeyFn = Arc<dyn Fn(&CallArgs, bool) -> Result<CacheKey> + Send + Sync>;

// == Make Key ==
/// Builds the cache key for a call.
///
/// Layout: positional arguments, then the keyword marker and `(name, value)`
/// pairs sorted by name, then (when `typed`) the type tag of every positional
/// value and every named value.
///
/// # Errors
/// `UnhashableArgument` if an argument cannot take part in a key.
pub fn make_key(args: &CallArgs, typed: bool) -> Result<CacheKey> {
    let mut parts: Vec<ArgValue> = args.positional.clone();
    if !args.named.is_empty() {
        parts.push(ArgValue::Sentinel(KWARG_MARK));
        parts.extend(
            args.named
                .iter()
                .map(|(name, value)| ArgValue::Named(name.clone(), Box::new(value.clone()))),
        );
    }

    if typed {
        parts.extend(args.positional.iter().map(|v| ArgValue::Type(v.type_tag())));
        parts.extend(args.named.values().map(|v| ArgValue::Type(v.type_tag())));
    } else if let [single] = parts.as_slice() {
        if let Some(plain) = single.fast_key() {
            return Ok(CacheKey::Plain(plain));
        }
    }

    HashedKey::new(parts).map(CacheKey::Hashed)
}
