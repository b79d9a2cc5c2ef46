//! Store configuration, optionally loaded from `replbox.toml`.
//!
//! # Example
//!
//! ```toml
//! [project]
//! main_file = "App.vue"      # Default main file name
//! sfc_extension = "vue"      # Files handed to the external compiler
//!
//! [runtime]
//! framework = "vue"          # Bare module name in the import map
//! default_version = "3.4.21" # Version used for the default runtime URLs
//! runtime_url = "https://unpkg.com/@vue/runtime-dom@{version}/dist/runtime-dom.esm-browser.js"
//! server_renderer_url = "https://unpkg.com/@vue/server-renderer@{version}/dist/server-renderer.esm-browser.js"
//! compiler_url = "https://unpkg.com/@vue/compiler-sfc@{version}/dist/compiler-sfc.esm-browser.js"
//! ```
//!
//! Every section is optional; missing fields take the defaults above.

mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the reserved import map file.
pub const IMPORT_MAP_FILE: &str = "import-map.json";

/// Placeholder substituted by the requested version in URL templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

const WELCOME_CODE: &str = r#"<script setup>
import { ref } from 'vue'

const msg = ref('Hello World!')
</script>

<template>
  <h1>{{ msg }}</h1>
  <input v-model="msg">
</template>"#;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing replbox.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Project layout settings
    pub project: ProjectConfig,

    /// Runtime and compiler URL settings
    pub runtime: RuntimeConfig,
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Main file name; a welcome file is synthesized under this name when a
    /// project does not provide one.
    pub main_file: String,

    /// Source of the synthesized welcome file.
    pub welcome_code: String,

    /// Extension (without dot) of single-file components.
    pub sfc_extension: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            main_file: "App.vue".to_string(),
            welcome_code: WELCOME_CODE.to_string(),
            sfc_extension: "vue".to_string(),
        }
    }
}

/// `[runtime]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Bare module specifier of the framework (import map key).
    pub framework: String,

    /// Version the default runtime URLs point at.
    pub default_version: String,

    /// Framework runtime URL template.
    pub runtime_url: String,

    /// Server renderer URL template.
    pub server_renderer_url: String,

    /// Compiler module URL template, handed to the compiler resolver.
    pub compiler_url: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            framework: "vue".to_string(),
            default_version: "3.4.21".to_string(),
            runtime_url:
                "https://unpkg.com/@vue/runtime-dom@{version}/dist/runtime-dom.esm-browser.js"
                    .to_string(),
            server_renderer_url: "https://unpkg.com/@vue/server-renderer@{version}/dist/server-renderer.esm-browser.js"
                .to_string(),
            compiler_url:
                "https://unpkg.com/@vue/compiler-sfc@{version}/dist/compiler-sfc.esm-browser.js"
                    .to_string(),
        }
    }
}

/// Runtime URLs the sandbox loads the framework from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeUrls {
    pub runtime: String,
    pub server_renderer: String,
}

impl RuntimeConfig {
    /// Import map key of the framework runtime.
    pub fn runtime_key(&self) -> &str {
        &self.framework
    }

    /// Import map key of the server renderer.
    pub fn server_renderer_key(&self) -> String {
        format!("{}/server-renderer", self.framework)
    }

    /// Runtime URLs for `version`, or for `default_version` when `None`.
    pub fn urls(&self, version: Option<&str>) -> RuntimeUrls {
        let version = version.unwrap_or(&self.default_version);
        RuntimeUrls {
            runtime: self.runtime_url.replace(VERSION_PLACEHOLDER, version),
            server_renderer: self.server_renderer_url.replace(VERSION_PLACEHOLDER, version),
        }
    }

    /// Compiler module URL for `version`.
    pub fn compiler_url(&self, version: &str) -> String {
        self.compiler_url.replace(VERSION_PLACEHOLDER, version)
    }
}

impl StoreConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let main = self.project.main_file.trim();
        if main.is_empty() {
            return Err(ConfigError::validation(
                "project.main_file",
                "must not be empty",
            ));
        }
        if main == IMPORT_MAP_FILE {
            return Err(ConfigError::validation(
                "project.main_file",
                format!("`{IMPORT_MAP_FILE}` is reserved"),
            ));
        }
        if self.project.sfc_extension.trim().is_empty() {
            return Err(ConfigError::validation(
                "project.sfc_extension",
                "must not be empty",
            ));
        }
        if self.runtime.framework.trim().is_empty() {
            return Err(ConfigError::validation(
                "runtime.framework",
                "must not be empty",
            ));
        }

        let templates = [
            ("runtime.runtime_url", &self.runtime.runtime_url),
            ("runtime.server_renderer_url", &self.runtime.server_renderer_url),
            ("runtime.compiler_url", &self.runtime.compiler_url),
        ];
        for (field, template) in templates {
            if !template.contains(VERSION_PLACEHOLDER) {
                return Err(ConfigError::validation(
                    field,
                    format!("missing `{VERSION_PLACEHOLDER}` placeholder"),
                ));
            }
        }
        Ok(())
    }
}
