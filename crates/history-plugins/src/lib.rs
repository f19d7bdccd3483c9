//! # history-plugins
//!
//! Adapter hooks applied to mapped import batches before persistence.
//!
//! ## Core Components
//!
//! - [`ImportAdapter`]: one batch-in, batch-out transform
//! - [`FnAdapter`]: wraps a plain closure as an adapter
//! - [`AdapterChain`]: adapters applied strictly in registration order
//! - [`PluginRegistry`]: the chains for every hookable entity, built once
//!   at startup
//! - DTOs ([`BusinessKey`], [`PluginVariable`], [`PluginDecisionInput`],
//!   [`PluginDecisionOutput`]): the shapes adapters see
//!
//! ## Usage
//!
//! ```rust
//! use history_plugins::{BusinessKey, FnAdapter, PluginRegistry};
//!
//! let registry = PluginRegistry::builder()
//!     .with_business_key_adapter(FnAdapter::new("redact", |keys: Vec<BusinessKey>| {
//!         keys.into_iter()
//!             .map(|k| BusinessKey { business_key: None, ..k })
//!             .collect()
//!     }))
//!     .build();
//!
//! let out = registry.business_keys().apply(vec![BusinessKey::new("pi-1", Some("secret".into()))]);
//! assert_eq!(out[0].business_key, None);
//! ```

pub mod adapter;
pub mod chain;
pub mod dto;
pub mod registry;

pub use adapter::{FnAdapter, ImportAdapter};
pub use chain::AdapterChain;
pub use dto::{BusinessKey, PluginDecisionInput, PluginDecisionOutput, PluginVariable};
pub use registry::{PluginRegistry, PluginRegistryBuilder};
