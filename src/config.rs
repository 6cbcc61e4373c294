use std::path::PathBuf;
use std::time::Duration;

use crate::console::RedrawMode;
use crate::error::{RegressError, Result};

/// Version of the regression corpus archive currently in use.
pub const DEFAULT_DATA_VERSION: &str = "test_data_v1";

/// How worker processes are spawned.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Capture stdout/stderr of each job instead of inheriting the terminal.
    /// Inherited output tears the progress line, so capture is the default.
    pub capture_output: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            capture_output: true,
        }
    }
}

/// Progress line rendering.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Width of the bar in characters
    pub bar_width: usize,
    /// Text shown before the bar
    pub prefix: String,
    pub redraw: RedrawMode,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            bar_width: 50,
            prefix: "Testing clips:".to_string(),
            redraw: RedrawMode::platform_default(),
        }
    }
}

/// Shape of the validation command run for every (clip, configuration) pair:
///
/// `<compressor> <input_switch>="<clip>" -test -config="<config>"`
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    pub compressor: PathBuf,
    pub input_switch: String,
}

impl Default for CommandTemplate {
    fn default() -> Self {
        let exe = if cfg!(windows) {
            "./bin/acl_compressor.exe"
        } else {
            "./bin/acl_compressor"
        };
        Self {
            compressor: PathBuf::from(exe),
            input_switch: "-input".to_string(),
        }
    }
}

impl CommandTemplate {
    pub fn new(compressor: impl Into<PathBuf>) -> Self {
        Self {
            compressor: compressor.into(),
            ..Default::default()
        }
    }

    pub fn with_input_switch(mut self, switch: impl Into<String>) -> Self {
        self.input_switch = switch.into();
        self
    }

    /// Build the command line for one clip under one configuration.
    pub fn render(&self, clip: &str, config: &str) -> String {
        let cmd = format!(
            "{} {}=\"{}\" -test -config=\"{}\"",
            self.compressor.display(),
            self.input_switch,
            clip,
            config
        );
        if cfg!(windows) {
            cmd.replace('/', "\\")
        } else {
            cmd
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegressionConfig {
    pub worker_count: usize,
    pub poll_interval_ms: u64,
    pub command: CommandTemplate,
    pub executor: ExecutorConfig,
    pub progress: ProgressConfig,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            poll_interval_ms: 1000,
            command: CommandTemplate::default(),
            executor: ExecutorConfig::default(),
            progress: ProgressConfig::default(),
        }
    }
}

impl RegressionConfig {
    pub fn new(command: CommandTemplate) -> Self {
        Self {
            command,
            ..Default::default()
        }
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject settings the coordinator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(RegressError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(RegressError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.progress.bar_width == 0 {
            return Err(RegressError::InvalidConfig(
                "progress bar width must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Location and layout of the regression corpus on disk.
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    pub test_data_dir: PathBuf,
    pub data_version: String,
    pub clip_extension: String,
    pub config_extension: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            test_data_dir: PathBuf::from("test_data"),
            data_version: DEFAULT_DATA_VERSION.to_string(),
            clip_extension: ".acl.sjson".to_string(),
            config_extension: ".config.sjson".to_string(),
        }
    }
}

impl CorpusConfig {
    pub fn new(test_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            test_data_dir: test_data_dir.into(),
            ..Default::default()
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.test_data_dir.join(format!("{}.zip", self.data_version))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.test_data_dir.join(&self.data_version)
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.test_data_dir.join("configs")
    }
}
