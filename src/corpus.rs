//! Regression corpus discovery.
//!
//! The corpus ships as `<test_data_dir>/<version>.zip`. On first use it is
//! extracted next to the archive and indexed into `metadata.sjson`. Clips are
//! every `*.acl.sjson` under the extracted directory; configurations are every
//! `*.config.sjson` under `<test_data_dir>/configs`.

use std::fmt::Write as _;
use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::console::Console;
use crate::error::{RegressError, Result};

/// Clip and configuration identifiers for a regression run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub clips: Vec<String>,
    pub configs: Vec<String>,
}

impl Corpus {
    pub fn new(clips: Vec<String>, configs: Vec<String>) -> Self {
        Self { clips, configs }
    }
}

/// Supplies the corpus to the coordinator.
///
/// Implementations fail fast when the corpus is missing or either list is empty.
pub trait CorpusProvider {
    fn load(&self) -> impl Future<Output = Result<Corpus>> + Send;
}

/// Serves an already-known corpus.
impl CorpusProvider for Corpus {
    async fn load(&self) -> Result<Corpus> {
        Ok(self.clone())
    }
}

/// Corpus read from the on-disk test data layout.
#[derive(Debug, Clone)]
pub struct TestDataCorpus {
    config: CorpusConfig,
    console: Console,
}

impl TestDataCorpus {
    pub fn new(config: CorpusConfig, console: Console) -> Self {
        Self { config, console }
    }

    async fn prepare(&self) -> Result<Corpus> {
        self.announce("Preparing regression test data ...");

        let archive = self.config.archive_path();
        if !archive.exists() {
            return Err(RegressError::ArchiveNotFound(archive));
        }

        let data_dir = self.config.data_dir();
        let needs_decompression = !data_dir.exists();
        if needs_decompression {
            self.announce(&format!("Decompressing {} ...", archive.display()));
            decompress(&archive, &self.config.test_data_dir).await?;
        }

        let clips = find_files(&data_dir, &self.config.clip_extension);
        if clips.is_empty() {
            return Err(RegressError::NoClips(data_dir.display().to_string()));
        }
        self.announce(&format!("Found {} regression clips", clips.len()));

        let configs_dir = self.config.configs_dir();
        let configs = find_files(&configs_dir, &self.config.config_extension);
        if configs.is_empty() {
            return Err(RegressError::NoConfigs(
                configs_dir.display().to_string(),
            ));
        }
        self.announce(&format!("Found {} regression configurations", configs.len()));

        tracing::info!(
            clips = clips.len(),
            configs = configs.len(),
            data_dir = %data_dir.display(),
            "Regression corpus ready"
        );

        if needs_decompression {
            let metadata = render_metadata(&clips, &data_dir, &configs, &configs_dir);
            tokio::fs::write(data_dir.join("metadata.sjson"), metadata).await?;
        }

        Ok(Corpus::new(path_strings(&clips), path_strings(&configs)))
    }

    fn announce(&self, text: &str) {
        if let Err(e) = self.console.line(text) {
            tracing::warn!(error = %e, "Failed to write to console");
        }
    }
}

impl CorpusProvider for TestDataCorpus {
    async fn load(&self) -> Result<Corpus> {
        self.prepare().await
    }
}

async fn decompress(archive: &Path, dest: &Path) -> Result<()> {
    let output = Command::new("unzip")
        .arg("-q")
        .arg("-o")
        .arg(archive)
        .arg("-d")
        .arg(dest)
        .output()
        .await
        .map_err(|e| RegressError::Decompress(archive.to_path_buf(), e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RegressError::Decompress(
            archive.to_path_buf(),
            format!("unzip exited with {:?}: {}", output.status.code(), stderr.trim()),
        ));
    }
    Ok(())
}

/// Every regular file under `root` whose name ends with `suffix`, sorted by path.
/// A missing `root` yields no files.
pub fn find_files(root: &Path, suffix: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                if root.exists() {
                    tracing::warn!(error = %e, "Skipping unreadable corpus entry");
                }
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(suffix))
        .map(|entry| entry.into_path())
        .collect()
}

/// Index written next to a freshly extracted corpus.
pub fn render_metadata(
    clips: &[PathBuf],
    clips_root: &Path,
    configs: &[PathBuf],
    configs_root: &Path,
) -> String {
    let mut out = String::new();
    write_list(&mut out, "configs", configs, configs_root);
    write_list(&mut out, "clips", clips, clips_root);
    out
}

fn write_list(out: &mut String, name: &str, paths: &[PathBuf], root: &Path) {
    let _ = writeln!(out, "{} = [", name);
    for path in paths {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let _ = writeln!(out, "\t\"{}\"", relative.display());
    }
    let _ = writeln!(out, "]");
    let _ = writeln!(out);
}

fn path_strings(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn metadata_lists_relative_paths() {
        let clips = vec![
            PathBuf::from("/data/v1/a.acl.sjson"),
            PathBuf::from("/data/v1/sub/b.acl.sjson"),
        ];
        let configs = vec![PathBuf::from("/data/configs/high.config.sjson")];
        let text = render_metadata(
            &clips,
            Path::new("/data/v1"),
            &configs,
            Path::new("/data/configs"),
        );
        let expected = "configs = [\n\t\"high.config.sjson\"\n]\n\n\
                        clips = [\n\t\"a.acl.sjson\"\n\t\"sub/b.acl.sjson\"\n]\n\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn find_files_missing_root_is_empty() {
        let files = find_files(Path::new("/nonexistent/clip-regress/corpus"), ".acl.sjson");
        assert!(files.is_empty());
    }
}
