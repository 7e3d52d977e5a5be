use std::{env, fs, io, net, num, path};

#[derive(serde::Deserialize)]
struct ConfigFile {
    listen_on: net::SocketAddr,
    templates_path: path::PathBuf,
    #[serde(default = "default_session_ttl_minutes")]
    session_ttl_minutes: u16,
    #[serde(default)]
    worker_count: Option<num::NonZeroUsize>,
    #[serde(default)]
    flash: FlashSettings,
}

fn default_session_ttl_minutes() -> u16 {
    15
}

/// Names used by the flash middleware. Anything left out keeps its default.
#[derive(serde::Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct FlashSettings {
    pub session_key: Option<String>,
    pub utility_name: Option<String>,
    pub locals_key: Option<String>,
    pub view_name: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadConfigError {
    #[error("Failed to obtain current working directory")]
    CurrentWorkingDir(#[source] io::Error),
    #[error("Failed to obtain absolute path for the binary")]
    ExecutablePath(#[source] io::Error),
    #[error("Failed to parse configuration file")]
    ParseFailure(#[from] serde_yaml_ng::Error),
    #[error("Failed to read configuration file contents {}", .path.display())]
    ReadError {
        path: path::PathBuf,
        source: io::Error,
    },
    #[error("Failed to canonicalize the path {path}: {}", .source)]
    CanonicalizePath {
        path: path::PathBuf,
        source: io::Error,
    },
    #[error("Failed to validate configuration file: {}", .0)]
    Validate(#[from] ConfigValidationError),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("Invalid templates path: {}", .0)]
    TemplatesPath(String),
    #[error("Session TTL must be at least one minute")]
    SessionTtl,
}

pub struct Config {
    pub listen_on: net::SocketAddr,
    pub templates_path: path::PathBuf,
    pub session_ttl_minutes: u16,
    pub worker_count: Option<num::NonZeroUsize>,
    pub flash: FlashSettings,
}

impl Config {
    pub fn load<P: AsRef<path::Path>>(path: P) -> Result<Self, LoadConfigError> {
        let path = relative_path_to_absolute(path)?;
        let config_reader =
            fs::File::open(&path).map_err(|source| LoadConfigError::ReadError { path, source })?;

        Self::from_reader(config_reader)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, LoadConfigError> {
        let config: ConfigFile =
            serde_yaml_ng::from_reader(reader).map_err(LoadConfigError::ParseFailure)?;

        config.try_into().map_err(LoadConfigError::Validate)
    }
}

impl TryFrom<ConfigFile> for Config {
    type Error = ConfigValidationError;

    fn try_from(config: ConfigFile) -> Result<Self, Self::Error> {
        let templates_path = resolve_templates_path(config.templates_path)?;

        if config.session_ttl_minutes == 0 {
            return Err(ConfigValidationError::SessionTtl);
        }

        Ok(Self {
            listen_on: config.listen_on,
            templates_path,
            session_ttl_minutes: config.session_ttl_minutes,
            worker_count: config.worker_count,
            flash: config.flash,
        })
    }
}

fn resolve_templates_path(
    templates_path: path::PathBuf,
) -> Result<path::PathBuf, ConfigValidationError> {
    let templates_path = relative_path_to_absolute(templates_path)
        .map_err(|err| ConfigValidationError::TemplatesPath(err.to_string()))?;

    if !templates_path.is_dir() {
        Err(ConfigValidationError::TemplatesPath(format!(
            "`{}` must be a directory",
            templates_path.display()
        )))
    } else {
        Ok(templates_path)
    }
}

fn relative_path_to_absolute<P: AsRef<path::Path>>(
    path: P,
) -> Result<path::PathBuf, LoadConfigError> {
    let path = path.as_ref();

    let path = if path.starts_with("./") || path.starts_with("../") {
        env::current_dir()
            .map_err(LoadConfigError::CurrentWorkingDir)?
            .join(path)
    } else if path.has_root() {
        path.to_owned()
    } else {
        env::current_exe()
            .map_err(LoadConfigError::ExecutablePath)?
            .with_file_name(path)
    };

    fs::canonicalize(&path).map_err(|source| LoadConfigError::CanonicalizePath { path, source })
}
