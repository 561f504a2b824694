use std::env;
use std::path::PathBuf;

/// Pipeline configuration for the document processing service
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Port the HTTP server binds to (default: 3000)
    pub port: u16,

    /// Root directory for raw uploads (default: "incoming")
    pub incoming_dir: PathBuf,

    /// Root directory for conversion/merge results (default: "output")
    pub output_dir: PathBuf,

    /// Root directory for preview bundles (default: "preview")
    pub preview_dir: PathBuf,

    /// Maximum upload size in bytes (default: 256 MB)
    pub max_file_size: usize,

    /// Age after which the sweeper deletes an entry, in hours (default: 24)
    pub retention_window_hours: u64,

    /// Interval between retention sweeps, in seconds (default: 3600)
    pub sweep_interval_secs: u64,

    /// Document engine backend: "pdf" (default: "pdf")
    pub engine_type: String,

    /// Path to the pdftocairo binary (default: "pdftocairo")
    pub pdftocairo_path: String,

    /// Path to the LibreOffice binary (default: "soffice")
    pub soffice_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            incoming_dir: PathBuf::from("incoming"),
            output_dir: PathBuf::from("output"),
            preview_dir: PathBuf::from("preview"),
            max_file_size: 256 * 1024 * 1024, // 256 MB
            retention_window_hours: 24,
            sweep_interval_secs: 3600,
            engine_type: "pdf".to_string(),
            pdftocairo_path: "pdftocairo".to_string(),
            soffice_path: "soffice".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            incoming_dir: env::var("INCOMING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.incoming_dir),

            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.output_dir),

            preview_dir: env::var("PREVIEW_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.preview_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            retention_window_hours: env::var("RETENTION_WINDOW_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.retention_window_hours),

            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.sweep_interval_secs),

            engine_type: env::var("ENGINE_TYPE").unwrap_or(default.engine_type),

            pdftocairo_path: env::var("PDFTOCAIRO_PATH").unwrap_or(default.pdftocairo_path),

            soffice_path: env::var("SOFFICE_PATH").unwrap_or(default.soffice_path),
        }
    }

    /// Create config for development (small limits, fast sweeps)
    pub fn development() -> Self {
        Self {
            max_file_size: 32 * 1024 * 1024,
            retention_window_hours: 1,
            sweep_interval_secs: 60,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_file_size, 256 * 1024 * 1024);
        assert_eq!(config.retention_window_hours, 24);
        assert_eq!(config.sweep_interval_secs, 3600);
        assert_eq!(config.engine_type, "pdf");
        assert_eq!(config.incoming_dir, PathBuf::from("incoming"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.preview_dir, PathBuf::from("preview"));
    }

    #[test]
    fn test_development_config() {
        let config = PipelineConfig::development();
        assert_eq!(config.retention_window_hours, 1);
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.engine_type, "pdf");
    }
}
