use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mediainfo_path: PathBuf,
    pub pattern: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mediainfo_path: PathBuf::from("mediainfo"),
            pattern: "*.avi".to_string(),
            log_filter: "warn".to_string(),
        }
    }
}

impl AppConfig {
    pub fn with_overrides(
        mut self,
        mediainfo_path: Option<PathBuf>,
        pattern: Option<String>,
        log_filter: Option<String>,
    ) -> Self {
        if let Some(path) = mediainfo_path {
            self.mediainfo_path = path;
        }
        if let Some(pattern) = pattern {
            self.pattern = pattern;
        }
        if let Some(filter) = log_filter {
            self.log_filter = filter;
        }
        self
    }
}
