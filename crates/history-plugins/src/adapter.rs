//! Adapter trait.
//!
//! Adapters run after internal mapping and before persistence. Each one
//! receives the whole batch of a page and may add, remove, or change
//! entries.

/// A batch transform registered for one entity type.
///
/// # Example
///
/// ```rust
/// use history_plugins::{ImportAdapter, PluginVariable};
///
/// struct DropSecrets;
///
/// impl ImportAdapter<PluginVariable> for DropSecrets {
///     fn name(&self) -> &str {
///         "drop-secrets"
///     }
///
///     fn adapt(&self, batch: Vec<PluginVariable>) -> Vec<PluginVariable> {
///         batch.into_iter().filter(|v| !v.name.starts_with("secret")).collect()
///     }
/// }
/// ```
pub trait ImportAdapter<T>: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Transform one batch.
    fn adapt(&self, batch: Vec<T>) -> Vec<T>;
}

/// Adapter backed by a closure.
pub struct FnAdapter<F> {
    name: String,
    func: F,
}

impl<F> FnAdapter<F> {
    /// Wrap `func` under `name`.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<T, F> ImportAdapter<T> for FnAdapter<F>
where
    F: Fn(Vec<T>) -> Vec<T> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn adapt(&self, batch: Vec<T>) -> Vec<T> {
        (self.func)(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_adapter() {
        let adapter = FnAdapter::new("double", |batch: Vec<u32>| {
            batch.into_iter().map(|v| v * 2).collect()
        });
        assert_eq!(ImportAdapter::<u32>::name(&adapter), "double");
        assert_eq!(adapter.adapt(vec![1, 2]), vec![2, 4]);
    }
}
