use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// A legacy path prefix that manifests may still carry, and its replacement.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
pub struct PathRewrite {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: String,
    #[serde(default = "default_master_manifest")]
    pub master_manifest: String,
    #[serde(default = "default_data_root")]
    pub data_root: String,
    #[serde(default = "default_fallback_encoding")]
    pub fallback_encoding: String,
    #[serde(default = "default_path_rewrites")]
    pub path_rewrites: Vec<PathRewrite>,
    #[serde(default)]
    pub name_aliases: HashMap<String, String>,
}

impl AppConfig {
    /// Full path of the master manifest.
    pub fn master_manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.manifests_dir).join(&self.master_manifest)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            manifests_dir: default_manifests_dir(),
            master_manifest: default_master_manifest(),
            data_root: default_data_root(),
            fallback_encoding: default_fallback_encoding(),
            path_rewrites: default_path_rewrites(),
            name_aliases: HashMap::new(),
        }
    }
}

fn default_manifests_dir() -> String {
    "manifests".to_string()
}

fn default_master_manifest() -> String {
    "master_manifest.json".to_string()
}

fn default_data_root() -> String {
    ".".to_string()
}

fn default_fallback_encoding() -> String {
    "windows-1252".to_string()
}

fn default_path_rewrites() -> Vec<PathRewrite> {
    vec![PathRewrite {
        from: "data_qp/".to_string(),
        to: "data/".to_string(),
    }]
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
