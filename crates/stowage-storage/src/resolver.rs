//! Adapter resolver for managing lazily built storage adapters
//!
//! Bindings come from the host's MIME type configuration and are read once. Each
//! backend kind moves from unresolved to either resolved or failed exactly once
//! per resolver; both outcomes are kept and returned to every later lookup.

use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use stowage_core::{BackendKind, MimeTypeBinding, SettingsSource};
use tokio::sync::{Mutex, OnceCell};

use crate::factory;
use crate::{StorageAdapter, StorageError, StorageResult};

type AdapterCell = Arc<OnceCell<StorageResult<Arc<dyn StorageAdapter>>>>;

/// Construction state of one backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unresolved,
    Resolved,
    Failed,
}

struct CompiledBinding {
    pattern: Regex,
    binding: MimeTypeBinding,
}

/// Resolves binding keys and MIME types to shared adapter instances.
///
/// Thread-safe: the first lookup of a kind builds its adapter while concurrent
/// lookups of the same kind wait for that result. Instances are cached by backend
/// kind, so MIME types bound to the same kind share one adapter.
pub struct AdapterResolver {
    settings: Arc<dyn SettingsSource>,
    bindings: Vec<CompiledBinding>,
    cells: Mutex<HashMap<BackendKind, AdapterCell>>,
}

impl AdapterResolver {
    /// Read the MIME type bindings from `settings` and compile their patterns.
    pub fn new(settings: Arc<dyn SettingsSource>) -> StorageResult<Self> {
        let bindings = settings
            .mime_type_bindings()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?
            .into_iter()
            .map(|binding| {
                let pattern = Regex::new(&binding.mime_type).map_err(|e| {
                    StorageError::ConfigError(format!(
                        "Invalid MIME type pattern {}: {}",
                        binding.mime_type, e
                    ))
                })?;
                Ok(CompiledBinding { pattern, binding })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        tracing::debug!(bindings = bindings.len(), "Storage adapter bindings loaded");

        Ok(Self {
            settings,
            bindings,
            cells: Mutex::new(HashMap::new()),
        })
    }

    /// Resolve an explicit binding key (`"aws-s3"`, `"local"`, ...).
    ///
    /// An empty key means "unset" and resolves to the local adapter. Any other key
    /// that names no supported backend fails with `UnknownAdapter`.
    pub async fn resolve(&self, key: &str) -> StorageResult<Arc<dyn StorageAdapter>> {
        let kind = BackendKind::from_binding_key(Some(key))
            .map_err(|e| StorageError::UnknownAdapter(e.0))?;
        self.resolve_kind(kind).await
    }

    /// Resolve the adapter bound to the first pattern matching `mime_type`.
    pub async fn resolve_for_mime(&self, mime_type: &str) -> StorageResult<Arc<dyn StorageAdapter>> {
        let binding = self.binding_for_mime(mime_type).ok_or_else(|| {
            StorageError::ConfigError(format!("No upload adapter configured for {}", mime_type))
        })?;

        let kind = BackendKind::from_binding_key(binding.adapter.as_deref())
            .map_err(|e| StorageError::UnknownAdapter(e.0))?;
        self.resolve_kind(kind).await
    }

    /// Resolve `kind`, building its adapter on first use.
    ///
    /// The construction outcome, success or failure, is returned unchanged to
    /// every later call.
    pub async fn resolve_kind(&self, kind: BackendKind) -> StorageResult<Arc<dyn StorageAdapter>> {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(kind).or_default().clone()
        };

        cell.get_or_init(|| async {
            let result = factory::create_adapter(kind, self.settings.as_ref()).await;
            match result {
                Ok(_) => tracing::info!(backend = %kind, "Storage adapter resolved"),
                Err(ref e) => tracing::warn!(
                    backend = %kind,
                    error = %e,
                    "Storage adapter construction failed"
                ),
            }
            result
        })
        .await
        .clone()
    }

    /// First binding whose pattern matches `mime_type`, in configuration order.
    pub fn binding_for_mime(&self, mime_type: &str) -> Option<&MimeTypeBinding> {
        self.bindings
            .iter()
            .find(|compiled| compiled.pattern.is_match(mime_type))
            .map(|compiled| &compiled.binding)
    }

    /// Distinct adapter keys referenced by the bindings, in configuration order.
    /// Unset keys are reported as `local`.
    pub fn adapter_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for compiled in &self.bindings {
            let key = match compiled.binding.adapter.as_deref().map(str::trim) {
                None | Some("") => BackendKind::Local.as_str().to_string(),
                Some(key) => key.to_string(),
            };
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Current construction state of `kind`.
    pub async fn state(&self, kind: BackendKind) -> BindingState {
        let cells = self.cells.lock().await;
        match cells.get(&kind).and_then(|cell| cell.get()) {
            None => BindingState::Unresolved,
            Some(Ok(_)) => BindingState::Resolved,
            Some(Err(_)) => BindingState::Failed,
        }
    }
}
