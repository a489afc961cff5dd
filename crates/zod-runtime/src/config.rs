//! Configuration
//!
//! Three layers, narrowest first:
//!
//! - [`ParseOptions`]: per parse call
//! - [`SchemaOptions`]: per schema node
//! - [`EngineConfig`]: process-wide defaults, installed once at start-up
//!
//! The abort-early flag resolves in that order: the parse options win over
//! the options of the schema the parse was called on, which win over the
//! engine default.
//!
//! # Example
//! ```rust,ignore
//! use zod_runtime::config::{self, EngineConfig};
//!
//! config::install(EngineConfig::new().with_abort_early(true))?;
//! ```

use crate::error::ConfigError;
use crate::messages::{ErrorMap, Messages};
use crate::path::Path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, warn};

// =============================================================================
// Parse Options
// =============================================================================

/// Options for a single parse call.
#[derive(Clone, Default)]
pub struct ParseOptions {
    /// Halt the whole parse at the first issue
    pub abort_early: Option<bool>,
    /// Contextual error map, consulted before any schema-level map
    pub error_map: Option<ErrorMap>,
    /// Prefix for every issue path
    pub path: Path,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "This method returns new ParseOptions and does not modify self"]
    pub fn with_abort_early(mut self, abort_early: bool) -> Self {
        self.abort_early = Some(abort_early);
        self
    }

    #[must_use = "This method returns new ParseOptions and does not modify self"]
    pub fn with_error_map(mut self, error_map: ErrorMap) -> Self {
        self.error_map = Some(error_map);
        self
    }

    #[must_use = "This method returns new ParseOptions and does not modify self"]
    pub fn with_path(mut self, path: Path) -> Self {
        self.path = path;
        self
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("abort_early", &self.abort_early)
            .field("error_map", &self.error_map.as_ref().map(|_| "<fn>"))
            .field("path", &self.path)
            .finish()
    }
}

// =============================================================================
// Schema Options
// =============================================================================

/// Options carried by every schema node.
#[derive(Clone, Default)]
pub struct SchemaOptions {
    /// Abort-early default when a parse starts at this node
    pub abort_early: Option<bool>,
    /// Emit node-level events at debug level
    pub debug: bool,
    /// Schema-level error map
    pub error_map: Option<ErrorMap>,
    /// Per-kind message overrides
    pub messages: Messages,
    /// Free-form description, surfaced in the manifest
    pub description: Option<String>,
}

impl SchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "This method returns new SchemaOptions and does not modify self"]
    pub fn with_abort_early(mut self, abort_early: bool) -> Self {
        self.abort_early = Some(abort_early);
        self
    }

    #[must_use = "This method returns new SchemaOptions and does not modify self"]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use = "This method returns new SchemaOptions and does not modify self"]
    pub fn with_error_map(mut self, error_map: ErrorMap) -> Self {
        self.error_map = Some(error_map);
        self
    }

    #[must_use = "This method returns new SchemaOptions and does not modify self"]
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    #[must_use = "This method returns new SchemaOptions and does not modify self"]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for SchemaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaOptions")
            .field("abort_early", &self.abort_early)
            .field("debug", &self.debug)
            .field("error_map", &self.error_map.as_ref().map(|_| "<fn>"))
            .field("messages", &self.messages)
            .field("description", &self.description)
            .finish()
    }
}

// =============================================================================
// Engine Config
// =============================================================================

/// Process-wide defaults.
///
/// # Fields
///
/// * `abort_early` - Halt parses at the first issue unless a parse call or
///   schema says otherwise. Default: false.
///
/// * `debug` - Emit node-level events at debug level for every schema.
///   Default: false.
///
/// * `max_issues` - Upper bound on the issues recorded by one parse; further
///   issues still fail the parse but are not kept. Default: 10,000.
///
/// * `error_map` - Engine-wide error map, consulted after every schema-level
///   override and before the built-in messages. Not serialized.
#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub abort_early: bool,
    pub debug: bool,
    pub max_issues: usize,
    #[serde(skip)]
    pub error_map: Option<ErrorMap>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            abort_early: false,
            debug: false,
            max_issues: 10_000,
            error_map: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "This method returns a new EngineConfig and does not modify self"]
    pub fn with_abort_early(mut self, abort_early: bool) -> Self {
        self.abort_early = abort_early;
        self
    }

    #[must_use = "This method returns a new EngineConfig and does not modify self"]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use = "This method returns a new EngineConfig and does not modify self"]
    pub fn with_max_issues(mut self, max_issues: usize) -> Self {
        self.max_issues = max_issues;
        self
    }

    #[must_use = "This method returns a new EngineConfig and does not modify self"]
    pub fn with_error_map(mut self, error_map: ErrorMap) -> Self {
        self.error_map = Some(error_map);
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_issues` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_issues == 0 {
            return Err(ConfigError::Invalid(
                "max_issues must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("abort_early", &self.abort_early)
            .field("debug", &self.debug)
            .field("max_issues", &self.max_issues)
            .field("error_map", &self.error_map.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Install the process-wide configuration.
///
/// Must run before the first parse; once any parse has read the defaults
/// they are fixed for the life of the process.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a configuration is
/// already in effect.
pub fn install(config: EngineConfig) -> Result<(), ConfigError> {
    if let Err(e) = config.validate() {
        warn!(error = %e, "Rejected engine configuration");
        return Err(e);
    }
    ENGINE_CONFIG.set(config).map_err(|_| {
        warn!("Engine configuration already installed");
        ConfigError::AlreadyInstalled
    })?;
    debug!("Engine configuration installed");
    Ok(())
}

/// The configuration in effect, the default one if none was installed.
pub fn global() -> &'static EngineConfig {
    ENGINE_CONFIG.get_or_init(EngineConfig::default)
}
