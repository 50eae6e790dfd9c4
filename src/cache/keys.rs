//! Cache key generation

use std::fmt;

/// A namespaced cache key rendered as `{namespace}.{arg1}.{arg2}...`
///
/// Arguments keep their insertion order; `pair.A.B` and `pair.B.A` are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    args: Vec<String>,
}

impl CacheKey {
    /// Create a key with no arguments
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            args: Vec::new(),
        }
    }

    /// Append one argument token
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Build a key from a namespace and a list of argument tokens
    pub fn with_args<I, T>(namespace: &str, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        args.into_iter().fold(Self::new(namespace), |key, arg| key.arg(arg))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace)?;
        for arg in &self.args {
            write!(f, ".{}", arg)?;
        }
        Ok(())
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}
