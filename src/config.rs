//! Configuration for a synchronization run
//!
//! The manifest locations and the two external commands are configuration,
//! not control flow. Sources, lowest priority first:
//!
//! 1. Built-in defaults ([`SyncConfig::default`])
//! 2. `<root>/.config/versync.toml`, or the file passed with `--config`
//! 3. `VERSYNC_*` environment variables (e.g. `VERSYNC_MANIFESTS=src/a,src/b`)
//!
//! CLI overrides are applied by the binary on top of the loaded value.

mod template;

use std::path::{Path, PathBuf};

use config::{ConfigError, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};

pub use template::CommandTemplate;

/// Project-relative location of the optional config file
pub const PROJECT_CONFIG_PATH: &str = ".config/versync.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "VERSYNC";

/// Manifest directories updated by default, in update order
pub const DEFAULT_MANIFESTS: &[&str] = &["src/api", "src/viewer", "src/packaged-viewer"];

/// Sets a manifest's version field without creating a git tag.
///
/// `--allow-same-version` makes re-running with an unchanged version a no-op
/// instead of an error.
pub const DEFAULT_MANIFEST_COMMAND: &str =
    "npm version {{ version }} --no-git-tag-version --allow-same-version";

/// Updates every tracked version reference, tolerating a dirty working tree.
pub const DEFAULT_BUMP_COMMAND: &str = "bump-my-version bump --new-version {{ version }} --allow-dirty";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SyncConfig {
    /// Sub-project directories whose manifests are updated, in order.
    /// Relative paths resolve against the project root.
    #[serde(deserialize_with = "deserialize_manifests")]
    pub manifests: Vec<PathBuf>,

    /// Run once per manifest directory, with that directory as cwd.
    pub manifest_command: CommandTemplate,

    /// Run once at the project root after all manifests are updated.
    pub bump_command: CommandTemplate,

    /// Reject versions that don't parse as semantic versions.
    pub strict_semver: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            manifests: DEFAULT_MANIFESTS.iter().map(PathBuf::from).collect(),
            manifest_command: CommandTemplate::new(DEFAULT_MANIFEST_COMMAND),
            bump_command: CommandTemplate::new(DEFAULT_BUMP_COMMAND),
            strict_semver: false,
        }
    }
}

impl SyncConfig {
    /// Load configuration for the project at `root`.
    ///
    /// `explicit` replaces the project file and must exist. Without it, a missing
    /// `.config/versync.toml` just means defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(root, explicit, None)
    }

    /// Like [`SyncConfig::load`], but reads environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        root: &Path,
        explicit: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::Message(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                File::from(path).format(FileFormat::Toml).required(true)
            }
            None => File::from(root.join(PROJECT_CONFIG_PATH))
                .format(FileFormat::Toml)
                .required(false),
        };

        let environment = Environment::with_prefix(ENV_PREFIX)
            .convert_case(config::Case::Kebab)
            .source(env);

        let config: SyncConfig = config::Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        log::debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    /// Check both command templates expand to a runnable command line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, template) in [
            ("manifest-command", &self.manifest_command),
            ("bump-command", &self.bump_command),
        ] {
            template
                .check()
                .map_err(|e| ConfigError::Message(format!("Invalid {key}: {e}")))?;
        }
        Ok(())
    }

    /// Manifest directories resolved against `root`, in update order.
    pub fn manifest_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.manifests.iter().map(|m| root.join(m)).collect()
    }
}

// Env values arrive as plain strings, so `VERSYNC_MANIFESTS=a,b` is split here.
// Leaving them unparsed keeps all-digit directory names like `123` as paths.
fn deserialize_manifests<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ManifestsToml {
        List(Vec<PathBuf>),
        Separated(String),
    }

    Ok(match ManifestsToml::deserialize(deserializer)? {
        ManifestsToml::List(dirs) => dirs,
        ManifestsToml::Separated(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .collect(),
    })
}
