use camino::Utf8PathBuf;
use drydock_core::{mirror, FileSnapshot, Folder, FolderSnapshot, HubSnapshot, ProjectSnapshot};
use futures::future::{BoxFuture, FutureExt};
use tracing::info;

use crate::export::cycle;
use crate::export::remote::{DataService, HttpDataService};
use crate::export::{BatchReport, ExportError, ExportOptions, ExportRequest, ExportStats};
use crate::io_utils;

/// Batch driver: iterates every hub and project of the service and walks
/// each project tree depth-first, one open/export/close cycle at a time.
pub struct ExportEngine {
    service: Box<dyn DataService>,
}

impl ExportEngine {
    pub fn new(client: reqwest::Client, service_url: &str) -> Result<Self, ExportError> {
        Ok(Self {
            service: Box::new(HttpDataService::new(client, service_url)?),
        })
    }

    pub fn with_service(service: Box<dyn DataService>) -> Self {
        Self { service }
    }

    /// Run the whole batch. Per-item failures are absorbed into the stats;
    /// anything returned as `Err` here is batch-fatal (service unreachable,
    /// listing failure, export root or mirrored directory not creatable).
    pub async fn export_all(&self, req: &ExportRequest) -> Result<BatchReport, ExportError> {
        io_utils::ensure_dir(&req.export_root)?;

        let hubs = self.service.list_hubs().await?;
        if hubs.is_empty() {
            info!("service returned no hubs; nothing to export");
        }

        let mut report = BatchReport::default();
        for hub in hubs {
            info!(hub = %hub.name, "=== hub ===");
            for project in self.service.list_projects(&hub).await? {
                info!(project = %project.name, "-- project");
                let base = mirror::project_dir(&req.export_root, &hub.name, &project.name);
                let root = self.service.root_folder(&project).await?;
                let stats = self.walk_folder(root, base, &req.options).await?;
                report.stats.absorb(stats);
                report.projects += 1;
            }
            report.hubs += 1;
        }

        Ok(report)
    }

    /// Depth-first: the folder's own files before its subfolders. Sibling
    /// order is whatever the service enumeration yields.
    fn walk_folder<'a>(
        &'a self,
        folder: Folder,
        export_dir: Utf8PathBuf,
        options: &'a ExportOptions,
    ) -> BoxFuture<'a, Result<ExportStats, ExportError>> {
        async move {
            let mut stats = ExportStats::default();

            for file in self.service.list_files(&folder).await? {
                let outcome =
                    cycle::process_file(self.service.as_ref(), &file, &export_dir, options).await?;
                stats.record(&outcome);
            }

            for sub in self.service.list_folders(&folder).await? {
                let sub_dir = mirror::mirrored_child(&export_dir, &sub.name);
                stats.absorb(self.walk_folder(sub, sub_dir, options).await?);
            }

            Ok(stats)
        }
        .boxed()
    }

    /// Materialize the remote tree without opening any documents. Backs
    /// planning and the tree listing.
    pub async fn snapshot(&self) -> Result<Vec<HubSnapshot>, ExportError> {
        let mut hubs = Vec::new();
        for hub in self.service.list_hubs().await? {
            let mut projects = Vec::new();
            for project in self.service.list_projects(&hub).await? {
                let root = self.service.root_folder(&project).await?;
                let root = self.snapshot_folder(root).await?;
                projects.push(ProjectSnapshot {
                    name: project.name,
                    root,
                });
            }
            hubs.push(HubSnapshot {
                name: hub.name,
                projects,
            });
        }
        Ok(hubs)
    }

    fn snapshot_folder(&self, folder: Folder) -> BoxFuture<'_, Result<FolderSnapshot, ExportError>> {
        async move {
            let files = self
                .service
                .list_files(&folder)
                .await?
                .into_iter()
                .map(|f| FileSnapshot {
                    name: f.name,
                    extension: f.extension,
                })
                .collect();

            let mut folders = Vec::new();
            for sub in self.service.list_folders(&folder).await? {
                folders.push(self.snapshot_folder(sub).await?);
            }

            Ok(FolderSnapshot {
                name: folder.name,
                files,
                folders,
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::remote::ExportOutcome;
    use crate::export::ServiceError;
    use camino::Utf8Path;
    use drydock_core::{DesignFile, DocumentHandle, Hub, Project};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Fake service with the scenario tree
    /// HubA/ProjX/{file1.f3d, file2.step, folderY/{file3.f3d}}.
    /// Call counters live behind `Arc` so tests keep a view after the
    /// service is boxed into the engine.
    #[derive(Default)]
    struct FakeTree {
        opens: Arc<AtomicU64>,
        closes: Arc<AtomicU64>,
        fail_open_name: Option<String>,
        no_hubs: bool,
    }

    fn file(id: &str, name: &str, extension: &str) -> DesignFile {
        DesignFile {
            id: id.into(),
            name: name.into(),
            extension: extension.into(),
        }
    }

    #[async_trait::async_trait]
    impl DataService for FakeTree {
        async fn list_hubs(&self) -> Result<Vec<Hub>, ServiceError> {
            if self.no_hubs {
                return Ok(Vec::new());
            }
            Ok(vec![Hub {
                id: "h1".into(),
                name: "HubA".into(),
            }])
        }

        async fn list_projects(&self, _hub: &Hub) -> Result<Vec<Project>, ServiceError> {
            Ok(vec![Project {
                id: "p1".into(),
                name: "ProjX".into(),
            }])
        }

        async fn root_folder(&self, _project: &Project) -> Result<Folder, ServiceError> {
            Ok(Folder {
                id: "f-root".into(),
                name: "root".into(),
            })
        }

        async fn list_files(&self, folder: &Folder) -> Result<Vec<DesignFile>, ServiceError> {
            Ok(match folder.id.as_str() {
                "f-root" => vec![file("d1", "file1", "f3d"), file("d2", "file2", "step")],
                "f-y" => vec![file("d3", "file3", "f3d")],
                _ => Vec::new(),
            })
        }

        async fn list_folders(&self, folder: &Folder) -> Result<Vec<Folder>, ServiceError> {
            Ok(match folder.id.as_str() {
                "f-root" => vec![Folder {
                    id: "f-y".into(),
                    name: "folderY".into(),
                }],
                _ => Vec::new(),
            })
        }

        async fn open(&self, file: &DesignFile) -> Result<DocumentHandle, ServiceError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.fail_open_name.as_deref() == Some(file.name.as_str()) {
                return Err(ServiceError::Request("open throttled".into()));
            }
            Ok(DocumentHandle::new(format!("doc-{}", file.id)))
        }

        async fn activate(&self, _handle: &DocumentHandle) -> Result<(), ServiceError> {
            Ok(())
        }

        async fn export(
            &self,
            _handle: &DocumentHandle,
            target: &Utf8Path,
            _format: &str,
        ) -> Result<ExportOutcome, ServiceError> {
            std::fs::write(target.as_std_path(), b"archive").unwrap();
            Ok(ExportOutcome { bytes_written: 7 })
        }

        async fn close(&self, _handle: DocumentHandle, _save: bool) -> Result<(), ServiceError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn request(root: &Utf8Path) -> ExportRequest {
        ExportRequest {
            export_root: root.to_path_buf(),
            options: ExportOptions {
                stabilization_delay: Duration::ZERO,
                ..ExportOptions::default()
            },
        }
    }

    #[tokio::test]
    async fn batch_mirrors_tree_and_filters_other_formats() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let engine = ExportEngine::with_service(Box::new(FakeTree::default()));

        let report = engine.export_all(&request(&root)).await.unwrap();

        assert_eq!(report.hubs, 1);
        assert_eq!(report.projects, 1);
        assert_eq!(report.stats.exported, 2);
        assert_eq!(report.stats.filtered, 1);
        assert_eq!(report.stats.failed, 0);

        assert!(root.join("HubA/ProjX/file1.f3d").exists());
        assert!(root.join("HubA/ProjX/folderY/file3.f3d").exists());
        assert!(!root.join("HubA/ProjX/file2.step").exists());
        assert!(!root.join("HubA/ProjX/file2.f3d").exists());
    }

    #[tokio::test]
    async fn second_run_skips_everything_without_opening() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let service = FakeTree::default();
        let opens = service.opens.clone();
        let closes = service.closes.clone();
        let engine = ExportEngine::with_service(Box::new(service));

        engine.export_all(&request(&root)).await.unwrap();
        assert_eq!(opens.load(Ordering::SeqCst), 2);
        assert_eq!(closes.load(Ordering::SeqCst), 2);

        let second = engine.export_all(&request(&root)).await.unwrap();

        assert_eq!(second.stats.exported, 0);
        assert_eq!(second.stats.skipped, 2);
        assert_eq!(second.stats.filtered, 1);
        assert_eq!(opens.load(Ordering::SeqCst), 2, "rerun must not open anything");
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn one_failed_open_does_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let engine = ExportEngine::with_service(Box::new(FakeTree {
            fail_open_name: Some("file1".into()),
            ..FakeTree::default()
        }));

        let report = engine.export_all(&request(&root)).await.unwrap();

        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.exported, 1);
        assert!(!root.join("HubA/ProjX/file1.f3d").exists());
        assert!(root.join("HubA/ProjX/folderY/file3.f3d").exists());
    }

    #[tokio::test]
    async fn uncreatable_export_root_is_a_batch_fatal_error() {
        let dir = tempdir().unwrap();
        // A regular file where the root's parent must be makes create_dir_all fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let root = Utf8PathBuf::from_path_buf(blocker.join("mirror")).unwrap();

        let service = FakeTree::default();
        let opens = service.opens.clone();
        let closes = service.closes.clone();
        let engine = ExportEngine::with_service(Box::new(service));

        let err = engine.export_all(&request(&root)).await.unwrap_err();

        assert!(matches!(err, ExportError::Io(_)), "got: {err}");
        assert_eq!(opens.load(Ordering::SeqCst), 0);
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_hub_list_is_an_empty_report_not_an_error() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let engine = ExportEngine::with_service(Box::new(FakeTree {
            no_hubs: true,
            ..FakeTree::default()
        }));

        let report = engine.export_all(&request(&root)).await.unwrap();
        assert_eq!(report.hubs, 0);
        assert_eq!(report.stats.exported, 0);
    }

    #[tokio::test]
    async fn snapshot_materializes_the_whole_tree() {
        let engine = ExportEngine::with_service(Box::new(FakeTree::default()));
        let hubs = engine.snapshot().await.unwrap();

        assert_eq!(hubs.len(), 1);
        assert_eq!(hubs[0].name, "HubA");
        let root = &hubs[0].projects[0].root;
        assert_eq!(root.files.len(), 2);
        assert_eq!(root.folders[0].name, "folderY");
        assert_eq!(root.folders[0].files[0].name, "file3");
    }
}
