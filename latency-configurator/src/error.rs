use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfiguratorError {
    #[error("values.yaml not found for service {service} at {}", .path.display())]
    MissingFile { service: String, path: PathBuf },

    #[error("charts directory not found: {}", .0.display())]
    MissingBaseDirectory(PathBuf),

    #[error("no service directories found under {}", .0.display())]
    NoServicesFound(PathBuf),

    #[error("failed to list {}: {source}", .path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{reason} in {}", .path.display())]
    Schema { path: PathBuf, reason: String },

    #[error("failed to serialize {}: {reason}", .path.display())]
    Serialize { path: PathBuf, reason: String },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConfiguratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_message_names_service() {
        let err = ConfiguratorError::MissingFile {
            service: "movie-id-service".to_string(),
            path: PathBuf::from("charts/movie-id-service/values.yaml"),
        };
        let msg = err.to_string();
        assert!(msg.contains("movie-id-service"));
        assert!(msg.contains("charts/movie-id-service/values.yaml"));
    }

    #[test]
    fn test_serialize_message_names_path() {
        let err = ConfiguratorError::Serialize {
            path: PathBuf::from("charts/text-service/values.yaml"),
            reason: "custom tag !custom is not supported".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to serialize charts/text-service/values.yaml: custom tag !custom is not supported"
        );
    }
}
