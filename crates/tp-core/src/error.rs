#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("config file not found at {0}")]
    ConfigNotFound(std::path::PathBuf),

    #[error("package installation failed: {0}")]
    Package(String),

    #[error("toolchain unavailable: {0}")]
    Toolchain(String),

    #[error("source acquisition failed: {0}")]
    Acquisition(String),

    #[error("build failed: {0}")]
    Build(String),

    #[error("certificate generation failed: {0}")]
    Certificate(String),

    #[error("forward proxy setup failed: {0}")]
    Proxy(String),

    #[error("dns reconfiguration failed: {0}")]
    Dns(String),

    #[error("binary '{0}' not found under the build output")]
    ArtifactNotFound(String),

    #[error("process failed: {0}")]
    Process(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
