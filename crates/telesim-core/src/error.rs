use thiserror::Error;

/// Top-level error type for telesim-core.
#[derive(Debug, Error)]
pub enum TelesimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Space error: {0}")]
    Space(#[from] SpaceError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("A scene file is required when booting the simulator")]
    MissingScene,
}

/// Space definition errors.
///
/// Raised when the scene's calibration vectors cannot form a valid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpaceError {
    #[error("Mismatched low/high dimensions: low={low}, high={high}")]
    DimensionMismatch { low: usize, high: usize },

    #[error("Space has zero dimensions")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telesim_error_from_config_error() {
        let err = ConfigError::MissingScene;
        let top: TelesimError = err.into();
        assert!(matches!(top, TelesimError::Config(_)));
        assert!(top.to_string().contains("scene"));
    }

    #[test]
    fn telesim_error_from_space_error() {
        let err = SpaceError::DimensionMismatch { low: 3, high: 5 };
        let top: TelesimError = err.into();
        assert!(matches!(top, TelesimError::Space(_)));
        assert!(top.to_string().contains("low=3"));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn space_error_is_copy() {
        let err = SpaceError::Empty;
        let err2 = err;
        assert_eq!(err, err2);
    }

    #[test]
    fn error_display_messages() {
        assert_eq!(
            SpaceError::DimensionMismatch { low: 2, high: 4 }.to_string(),
            "Mismatched low/high dimensions: low=2, high=4"
        );
        assert_eq!(SpaceError::Empty.to_string(), "Space has zero dimensions");
        assert_eq!(
            ConfigError::InvalidValue {
                field: "connect_attempts".into(),
                message: "must be > 0".into()
            }
            .to_string(),
            "Invalid value for connect_attempts: must be > 0"
        );
    }
}
