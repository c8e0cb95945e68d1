use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine family of the browser being launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserFamily {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserFamily {
    /// Family implied by an executable's file name; anything unrecognised is treated as Chromium
    pub fn from_executable(path: &Path) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();
        if name.contains("firefox") {
            Self::Firefox
        } else if name.contains("webkit") || name.contains("safari") || name.contains("epiphany") {
            Self::Webkit
        } else {
            Self::Chromium
        }
    }
}

/// Where downloads go and whether the browser asks first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub directory: PathBuf,
    pub prompt_for_download: bool,
}

/// Extra launch arguments and preferences decided by the launch hook
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchPlan {
    pub args: Vec<String>,
    pub download: Option<DownloadSettings>,
}

/// Options for launching a new browser
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,

    pub window_width: u32,
    pub window_height: u32,

    /// Custom Chrome binary
    pub chrome_path: Option<PathBuf>,

    /// Persistent profile directory
    pub user_data_dir: Option<PathBuf>,

    pub sandbox: bool,

    pub family: BrowserFamily,

    /// UI language passed to Chromium-family browsers
    pub lang: String,

    /// Download directory for Chromium-family browsers
    pub download_dir: PathBuf,

    /// Default wait applied to element lookups by the driver itself
    pub default_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1366,
            window_height: 800,
            chrome_path: None,
            user_data_dir: None,
            sandbox: true,
            family: BrowserFamily::Chromium,
            lang: "en-US".to_string(),
            download_dir: PathBuf::from("downloads"),
            default_timeout: Duration::from_secs(15),
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Builder method: set window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Builder method: set the browser binary; the family follows its file name
    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.family = BrowserFamily::from_executable(&path);
        self.chrome_path = Some(path);
        self
    }

    /// Builder method: set user data directory
    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    /// Builder method: set sandbox mode
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Builder method: set download directory
    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Builder method: set driver default timeout
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Launch hook: Chromium-family browsers get a language flag and a prompt-free download directory
    pub fn launch_plan(&self) -> LaunchPlan {
        match self.family {
            BrowserFamily::Chromium => LaunchPlan {
                args: vec![format!("--lang={}", self.lang)],
                download: Some(DownloadSettings {
                    directory: absolute(&self.download_dir),
                    prompt_for_download: false,
                }),
            },
            BrowserFamily::Firefox | BrowserFamily::Webkit => LaunchPlan::default(),
        }
    }
}

fn absolute(path: &PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path.clone();
    }
    std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.clone())
}

/// Options for connecting to an already running browser
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// DevTools WebSocket URL
    pub ws_url: String,

    /// Connection timeout in milliseconds
    pub timeout: u64,
}

impl ConnectionOptions {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self { ws_url: ws_url.into(), timeout: 30_000 }
    }

    /// Builder method: set connection timeout
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }
}
