//! Data loader module for reading snapshot files
//!
//! A snapshot file is a JSON object with optional `cost_records`,
//! `ec2_instances` and `ebs_volumes` arrays. The loader accepts either one
//! such file or a directory, in which case every `.json` file below it is
//! read in path order and merged.
//!
//! When no path is configured the loader looks for
//! `<data_dir>/cloudcost/snapshot.json`.
//!
//! # Examples
//!
//! ```no_run
//! use cloudcost_core::SnapshotSource;
//! use cloudcost_provider_file::FileSnapshotLoader;
//!
//! # async fn example() -> cloudcost_core::Result<()> {
//! let loader = FileSnapshotLoader::new("./snapshots").with_idle_threshold(5.0);
//! let snapshot = loader.load().await?;
//! println!("{} instances", snapshot.ec2_instances.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use cloudcost_core::error::{CloudcostError, Result};
use cloudcost_core::provider::SnapshotSource;
use cloudcost_core::types::Snapshot;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default snapshot location, `<data_dir>/cloudcost/snapshot.json`
pub fn default_snapshot_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("cloudcost").join("snapshot.json"))
}

/// Loads snapshots from a JSON file or a directory of JSON files
#[derive(Debug, Clone)]
pub struct FileSnapshotLoader {
    /// File or directory to read
    path: PathBuf,
    /// Threshold to recompute `is_idle` flags with after loading
    idle_threshold: Option<f64>,
}

impl FileSnapshotLoader {
    /// Create a loader for a file or directory
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            idle_threshold: None,
        }
    }

    /// Create a loader for the explicit path, or the default location
    ///
    /// # Errors
    ///
    /// Returns a config error if no path is given and the platform has no
    /// data directory
    pub fn from_path_or_default(path: Option<PathBuf>) -> Result<Self> {
        match path.or_else(default_snapshot_path) {
            Some(path) => Ok(Self::new(path)),
            None => Err(CloudcostError::Config(
                "no snapshot path given and no data directory available".to_string(),
            )),
        }
    }

    /// Recompute every instance's `is_idle` flag against `cpu_threshold`
    pub fn with_idle_threshold(mut self, cpu_threshold: f64) -> Self {
        self.idle_threshold = Some(cpu_threshold);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find the snapshot files to read, sorted by path
    pub async fn find_snapshot_files(&self) -> Result<Vec<PathBuf>> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| {
            CloudcostError::Config(format!(
                "cannot read snapshot path {}: {e}",
                self.path.display()
            ))
        })?;
        if !metadata.is_dir() {
            return Ok(vec![self.path.clone()]);
        }

        let root = self.path.clone();
        let mut files = tokio::task::spawn_blocking(move || {
            use walkdir::WalkDir;
            let mut files = Vec::new();

            for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if entry.file_type().is_file()
                    && path.extension().and_then(|s| s.to_str()) == Some("json")
                {
                    files.push(path.to_path_buf());
                }
            }
            files
        })
        .await
        .map_err(|e| CloudcostError::Io(std::io::Error::other(e.to_string())))?;

        files.sort();
        debug!(
            "Found {} snapshot files under {}",
            files.len(),
            self.path.display()
        );
        Ok(files)
    }

    /// Parse one snapshot file
    pub async fn load_file(path: &Path) -> Result<Snapshot> {
        let content = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|e| CloudcostError::Parse {
            file: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotLoader {
    async fn load(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::default();
        for file in self.find_snapshot_files().await? {
            snapshot.merge(Self::load_file(&file).await?);
        }
        snapshot.validate()?;

        if let Some(threshold) = self.idle_threshold {
            snapshot.refresh_idle_flags(threshold);
        }

        info!(
            "Loaded snapshot from {}: {} cost records, {} instances, {} volumes",
            self.path.display(),
            snapshot.cost_records.len(),
            snapshot.ec2_instances.len(),
            snapshot.ebs_volumes.len()
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        format!("snapshot files at {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudcost_core::test_utils::{cost, instance, volume};
    use cloudcost_core::types::InstanceState;
    use std::fs;
    use tempfile::TempDir;

    fn write_snapshot(path: &Path, snapshot: &Snapshot) {
        fs::write(path, serde_json::to_string(snapshot).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_load_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("snapshot.json");
        write_snapshot(
            &file,
            &Snapshot {
                cost_records: vec![cost("EC2", "10.00", "us-east-1", "2024-01-01", "2024-01-31")],
                ec2_instances: vec![instance(
                    "i-1",
                    "t3.micro",
                    InstanceState::Running,
                    "us-east-1",
                    1.5,
                )],
                ebs_volumes: Vec::new(),
            },
        );

        let snapshot = FileSnapshotLoader::new(&file).load().await.unwrap();
        assert_eq!(snapshot.cost_records.len(), 1);
        assert_eq!(snapshot.ec2_instances.len(), 1);
        // flags are left as collected unless a threshold is configured
        assert!(!snapshot.ec2_instances[0].is_idle);

        let snapshot = FileSnapshotLoader::new(&file)
            .with_idle_threshold(5.0)
            .load()
            .await
            .unwrap();
        assert!(snapshot.ec2_instances[0].is_idle);
    }

    #[tokio::test]
    async fn test_load_directory_merges_files() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("us-west-2");
        fs::create_dir(&nested).unwrap();

        write_snapshot(
            &dir.path().join("us-east-1.json"),
            &Snapshot {
                ebs_volumes: vec![volume("vol-1", 100, "gp3", false, "us-east-1")],
                ..Snapshot::default()
            },
        );
        write_snapshot(
            &nested.join("inventory.json"),
            &Snapshot {
                ebs_volumes: vec![volume("vol-2", 20, "gp2", true, "us-west-2")],
                ..Snapshot::default()
            },
        );
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loader = FileSnapshotLoader::new(dir.path());
        assert_eq!(loader.find_snapshot_files().await.unwrap().len(), 2);

        let snapshot = loader.load().await.unwrap();
        assert_eq!(snapshot.ebs_volumes.len(), 2);
        assert_eq!(snapshot.regions().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_documents() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("costs.json");
        fs::write(
            &file,
            r#"{"cost_records":[{"service_name":"S3","cost":12.5,"start_date":"2024-01-01","end_date":"2024-01-31","region":"us-east-1"}]}"#,
        )
        .unwrap();

        let snapshot = FileSnapshotLoader::new(&file).load().await.unwrap();
        assert_eq!(snapshot.cost_records[0].usage_type, "standard");
        assert!(snapshot.ec2_instances.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_names_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.json");
        fs::write(&file, "{ not json").unwrap();

        let err = FileSnapshotLoader::new(&file).load().await.unwrap_err();
        match err {
            CloudcostError::Parse { file: reported, .. } => assert_eq!(reported, file),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_ids_across_files_rejected() {
        let dir = TempDir::new().unwrap();
        let snap = Snapshot {
            ebs_volumes: vec![volume("vol-1", 100, "gp3", false, "us-east-1")],
            ..Snapshot::default()
        };
        write_snapshot(&dir.path().join("a.json"), &snap);
        write_snapshot(&dir.path().join("b.json"), &snap);

        let err = FileSnapshotLoader::new(dir.path()).load().await.unwrap_err();
        assert!(matches!(err, CloudcostError::InvalidSnapshot(_)));
    }

    #[tokio::test]
    async fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        let loader = FileSnapshotLoader::new(dir.path().join("absent.json"));
        assert!(matches!(
            loader.load().await,
            Err(CloudcostError::Config(_))
        ));
        assert!(loader.describe().contains("absent.json"));
    }
}
