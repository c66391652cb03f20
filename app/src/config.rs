use std::path::PathBuf;
use std::time::Duration;
use serde::{Serialize, Deserialize};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    pub api_base_url: String,
    /// Media folder shown in settings. The backend scans its own configured path.
    pub local_media_path: String,
    pub poll_interval_ms: u64,
    pub scan_timeout_secs: u64,
    pub max_poll_failures: u32,
    pub thumbnails_preload: usize,
    pub preload_threads: usize,
    pub debug_console: bool,
    pub trace_spans: bool,
    pub cache_path: PathBuf,
}

#[derive(Default)]
pub struct AppConfigOverrides {
    pub log_level: Option<String>,
    pub api_base_url: Option<String>,
    pub local_media_path: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub scan_timeout_secs: Option<u64>,
    pub max_poll_failures: Option<u32>,
    pub thumbnails_preload: Option<usize>,
    pub preload_threads: Option<usize>,
    pub debug_console: bool,
    pub trace_spans: bool,
}

fn default_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cloudsorter")
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        default_dir().join("config")
    }

    /// Layer defaults, the TOML file at `path` and `CLOUDSORTER_*` variables.
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(Self::default_path);
        let cfg = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml).required(false))
            .add_source(config::Environment::with_prefix("CLOUDSORTER"))
            .build()
            .unwrap_or_default();

        let log_level = cfg
            .get_string("log_level")
            .unwrap_or_else(|_| "info".to_string());
        let api_base_url = cfg
            .get_string("api_base_url")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let local_media_path = cfg.get_string("local_media_path").unwrap_or_default();
        let poll_interval_ms = cfg.get_int("poll_interval_ms").unwrap_or(1500).max(1) as u64;
        let scan_timeout_secs = cfg.get_int("scan_timeout_secs").unwrap_or(120).max(1) as u64;
        let max_poll_failures = cfg.get_int("max_poll_failures").unwrap_or(3).max(1) as u32;
        let thumbnails_preload = cfg.get_int("thumbnails_preload").unwrap_or(20).max(1) as usize;
        let preload_threads = cfg.get_int("preload_threads").unwrap_or(4).max(1) as usize;
        let debug_console = cfg.get_bool("debug_console").unwrap_or(false);
        let trace_spans = cfg.get_bool("trace_spans").unwrap_or(false);
        let cache_path = cfg
            .get_string("cache_path")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_dir());

        Self {
            log_level,
            api_base_url,
            local_media_path,
            poll_interval_ms,
            scan_timeout_secs,
            max_poll_failures,
            thumbnails_preload,
            preload_threads,
            debug_console,
            trace_spans,
            cache_path,
        }
    }

    pub fn apply_overrides(mut self, ov: &AppConfigOverrides) -> Self {
        if let Some(l) = &ov.log_level {
            self.log_level = l.clone();
        }
        if let Some(u) = &ov.api_base_url {
            self.api_base_url = u.clone();
        }
        if let Some(p) = &ov.local_media_path {
            self.local_media_path = p.clone();
        }
        if let Some(ms) = ov.poll_interval_ms {
            self.poll_interval_ms = ms.max(1);
        }
        if let Some(s) = ov.scan_timeout_secs {
            self.scan_timeout_secs = s.max(1);
        }
        if let Some(f) = ov.max_poll_failures {
            self.max_poll_failures = f.max(1);
        }
        if let Some(t) = ov.thumbnails_preload {
            self.thumbnails_preload = t.max(1);
        }
        if let Some(pt) = ov.preload_threads {
            self.preload_threads = pt.max(1);
        }
        if ov.debug_console {
            self.debug_console = true;
        }
        if ov.trace_spans {
            self.trace_spans = true;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn save_to(&self, path: Option<PathBuf>) -> std::io::Result<()> {
        let path = path.unwrap_or_else(Self::default_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_preload_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "thumbnails_preload = 0\n").unwrap();
        let cfg = AppConfig::load_from(Some(path));
        assert_eq!(cfg.thumbnails_preload, 1);

        let overridden = cfg.apply_overrides(&AppConfigOverrides {
            thumbnails_preload: Some(0),
            ..Default::default()
        });
        assert_eq!(overridden.thumbnails_preload, 1);
    }
}
