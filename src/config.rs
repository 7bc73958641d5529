use crate::platform::{self, PlatformTarget};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::PathBuf};
use thiserror::Error;

const DEFAULT_VERSION: &str = "0.1.0";
const DEFAULT_BASE_URL: &str = "https://github.com/Tetraslam/lispium/releases/download";
const DEFAULT_DEST_DIR: &str = "src/lispium/bin";
const DEFAULT_BINARY_NAME: &str = "lispium";
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;
const DEFAULT_LOG_LEVEL: &str = "info";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_FETCH_MAX_RETRIES: u32 = 2;
const DEFAULT_FETCH_INITIAL_BACKOFF_MS: u64 = 500;
const DEFAULT_FETCH_MAX_BACKOFF_MS: u64 = 5000;

const DEFAULT_PACKAGING_COMMAND: &str = "python3";
const DEFAULT_PACKAGING_ARGS: [&str; 2] = ["-m", "build"];

pub const DEFAULT_CONFIG_FILE_NAME: &str = "lispium-wheels.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}")]
    Read {
        path: String,
        #[source]
        cause: std::io::Error,
    },
    #[error("Cannot parse config file")]
    Parse {
        #[source]
        cause: serde_yaml::Error,
    },
    #[error("`{field}` must not be empty")]
    Empty { field: &'static str },
    #[error("`max_concurrent_jobs` must be at least 1")]
    NoWorkers,
    #[error("platforms {first} and {second} would both be staged as {file_name}")]
    DuplicateDestination {
        first: String,
        second: String,
        file_name: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_version")]
    pub version: String,
    #[serde(default = "Config::default_base_url")]
    pub base_url: String,
    #[serde(default = "Config::default_dest_dir")]
    pub dest_dir: PathBuf,
    #[serde(default = "Config::default_binary")]
    pub binary: String,
    pub platforms: Option<Vec<PlatformTarget>>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default = "Config::default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    #[serde(default)]
    pub fail_if_all_platforms_failed: bool,
    #[serde(default)]
    pub packaging: PackagingConfig,
    #[serde(default = "Config::default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: Config::default_version(),
            base_url: Config::default_base_url(),
            dest_dir: Config::default_dest_dir(),
            binary: Config::default_binary(),
            platforms: None,
            fetch: FetchConfig::default(),
            max_concurrent_jobs: Config::default_max_concurrent_jobs(),
            fail_if_all_platforms_failed: false,
            packaging: PackagingConfig::default(),
            log_level: Config::default_log_level(),
        }
    }
}

impl Config {
    /// Loads `lispium-wheels.yaml` from the working directory, falling back to defaults when absent.
    pub async fn load() -> Result<Config, ConfigError> {
        let config_string = match tokio::fs::read_to_string(DEFAULT_CONFIG_FILE_NAME).await {
            Ok(config_string) => config_string,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE_NAME);
                return Ok(Config::default());
            }
            Err(cause) => {
                return Err(ConfigError::Read {
                    path: DEFAULT_CONFIG_FILE_NAME.to_owned(),
                    cause,
                })
            }
        };

        Config::from_yaml(&config_string)
    }

    pub fn from_yaml(config_string: &str) -> Result<Config, ConfigError> {
        serde_yaml::from_str::<Config>(config_string).map_err(|cause| ConfigError::Parse { cause })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Empty { field: "version" });
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Empty { field: "base_url" });
        }
        if self.binary.trim().is_empty() {
            return Err(ConfigError::Empty { field: "binary" });
        }
        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError::NoWorkers);
        }

        let manifest = self.manifest();
        let mut seen = HashSet::new();
        for (index, target) in manifest.iter().enumerate() {
            let file_name = target.binary_file_name(&self.binary);
            if !seen.insert(file_name.clone()) {
                let first = manifest[..index]
                    .iter()
                    .find(|other| other.binary_file_name(&self.binary) == file_name)
                    .map(ToString::to_string)
                    .unwrap_or_default();

                return Err(ConfigError::DuplicateDestination {
                    first,
                    second: target.to_string(),
                    file_name,
                });
            }
        }

        Ok(())
    }

    pub fn manifest(&self) -> Vec<PlatformTarget> {
        self.platforms
            .clone()
            .unwrap_or_else(platform::default_manifest)
    }

    /// `{base_url}/v{version}`
    pub fn release_url(&self) -> String {
        let version = self.version.strip_prefix('v').unwrap_or(&self.version);
        format!("{}/v{}", self.base_url.trim_end_matches('/'), version)
    }

    pub fn archive_url(&self, target: &PlatformTarget) -> String {
        format!("{}/{}", self.release_url(), target.archive)
    }

    pub fn packaging_dir(&self) -> PathBuf {
        self.packaging
            .working_dir
            .clone()
            .unwrap_or_else(|| self.dest_dir.clone())
    }

    fn default_version() -> String {
        DEFAULT_VERSION.to_owned()
    }

    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_owned()
    }

    fn default_dest_dir() -> PathBuf {
        PathBuf::from(DEFAULT_DEST_DIR)
    }

    fn default_binary() -> String {
        DEFAULT_BINARY_NAME.to_owned()
    }

    fn default_max_concurrent_jobs() -> usize {
        DEFAULT_MAX_CONCURRENT_JOBS
    }

    fn default_log_level() -> String {
        DEFAULT_LOG_LEVEL.to_owned()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "FetchConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "FetchConfig::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "FetchConfig::default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "FetchConfig::default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout_secs: FetchConfig::default_timeout_secs(),
            max_retries: FetchConfig::default_max_retries(),
            initial_backoff_ms: FetchConfig::default_initial_backoff_ms(),
            max_backoff_ms: FetchConfig::default_max_backoff_ms(),
        }
    }
}

impl FetchConfig {
    fn default_timeout_secs() -> u64 {
        DEFAULT_FETCH_TIMEOUT_SECS
    }

    fn default_max_retries() -> u32 {
        DEFAULT_FETCH_MAX_RETRIES
    }

    fn default_initial_backoff_ms() -> u64 {
        DEFAULT_FETCH_INITIAL_BACKOFF_MS
    }

    fn default_max_backoff_ms() -> u64 {
        DEFAULT_FETCH_MAX_BACKOFF_MS
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingConfig {
    #[serde(default = "PackagingConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "PackagingConfig::default_command")]
    pub command: String,
    #[serde(default = "PackagingConfig::default_args")]
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        PackagingConfig {
            enabled: PackagingConfig::default_enabled(),
            command: PackagingConfig::default_command(),
            args: PackagingConfig::default_args(),
            working_dir: None,
        }
    }
}

impl PackagingConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_command() -> String {
        DEFAULT_PACKAGING_COMMAND.to_owned()
    }

    fn default_args() -> Vec<String> {
        DEFAULT_PACKAGING_ARGS.iter().map(|arg| arg.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_use_defaults_for_empty_document() -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::from_yaml("{}")?;

        assert_eq!(config.version, "0.1.0");
        assert_eq!(config.binary, "lispium");
        assert_eq!(config.dest_dir, PathBuf::from("src/lispium/bin"));
        assert_eq!(config.max_concurrent_jobs, 4);
        assert!(!config.fail_if_all_platforms_failed);
        assert_eq!(config.packaging.command, "python3");
        assert_eq!(config.packaging.args, vec!["-m", "build"]);
        assert_eq!(config.manifest().len(), 4);

        Ok(())
    }

    #[test]
    fn should_build_release_and_archive_urls() {
        let config = Config {
            version: "v1.2.3".to_owned(),
            base_url: "http://localhost:1234/download/".to_owned(),
            ..Config::default()
        };
        let target = PlatformTarget::new("linux", "x86_64", "lispium-linux-x86_64.tar.gz");

        assert_eq!(config.release_url(), "http://localhost:1234/download/v1.2.3");
        assert_eq!(
            config.archive_url(&target),
            "http://localhost:1234/download/v1.2.3/lispium-linux-x86_64.tar.gz"
        );
    }

    #[test]
    fn should_parse_overrides() -> Result<(), Box<dyn std::error::Error>> {
        let yaml = r#"
version: "0.2.0"
base_url: "http://mirror.local"
dest_dir: "out/bin"
max_concurrent_jobs: 1
fail_if_all_platforms_failed: true
fetch:
  timeout_secs: 5
  max_retries: 0
packaging:
  command: "make"
  args: ["wheels"]
  working_dir: "."
platforms:
  - os: "linux"
    arch: "aarch64"
    archive: "lispium-linux-aarch64.tar.gz"
"#;
        let config = Config::from_yaml(yaml)?;

        assert_eq!(config.release_url(), "http://mirror.local/v0.2.0");
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.fetch.max_retries, 0);
        assert_eq!(config.fetch.initial_backoff_ms, 500);
        assert!(config.fail_if_all_platforms_failed);
        assert_eq!(config.packaging_dir(), PathBuf::from("."));
        assert_eq!(config.manifest().len(), 1);
        assert_eq!(config.manifest()[0].arch, "aarch64");
        config.validate()?;

        Ok(())
    }

    #[test]
    fn should_default_packaging_dir_to_dest_dir() {
        let config = Config::default();

        assert_eq!(config.packaging_dir(), config.dest_dir);
    }

    #[test]
    fn should_reject_duplicate_destinations() {
        let config = Config {
            platforms: Some(vec![
                PlatformTarget::new("linux", "x86_64", "a.tar.gz"),
                PlatformTarget::new("linux", "x86_64", "b.tar.gz"),
            ]),
            ..Config::default()
        };

        let result = config.validate();

        assert!(matches!(
            result,
            Err(ConfigError::DuplicateDestination { ref file_name, .. }) if file_name == "lispium-linux-x86_64"
        ));
    }

    #[test]
    fn should_reject_zero_workers() {
        let config = Config {
            max_concurrent_jobs: 0,
            ..Config::default()
        };

        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));
    }

    #[test]
    fn should_reject_empty_version() {
        let config = Config {
            version: " ".to_owned(),
            ..Config::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Empty { field: "version" })
        ));
    }
}
