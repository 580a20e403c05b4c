use camino::Utf8Path;
use drydock_core::{DesignFile, DocumentHandle, Folder, Hub, Project};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::export::ServiceError;

/// Result information the service returns from an export call.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub bytes_written: u64,
}

/// Everything the exporter needs from the external CAD data service. The
/// engine holds this behind `Box<dyn DataService>` so tests can substitute
/// an in-memory fake for the HTTP implementation.
#[async_trait::async_trait]
pub trait DataService: Send + Sync {
    async fn list_hubs(&self) -> Result<Vec<Hub>, ServiceError>;
    async fn list_projects(&self, hub: &Hub) -> Result<Vec<Project>, ServiceError>;
    async fn root_folder(&self, project: &Project) -> Result<Folder, ServiceError>;
    async fn list_files(&self, folder: &Folder) -> Result<Vec<DesignFile>, ServiceError>;
    async fn list_folders(&self, folder: &Folder) -> Result<Vec<Folder>, ServiceError>;
    /// Open a design file, yielding the handle the remaining document
    /// operations are issued against.
    async fn open(&self, file: &DesignFile) -> Result<DocumentHandle, ServiceError>;
    async fn activate(&self, handle: &DocumentHandle) -> Result<(), ServiceError>;
    /// Export the opened document to `target` in the given format.
    async fn export(
        &self,
        handle: &DocumentHandle,
        target: &Utf8Path,
        format: &str,
    ) -> Result<ExportOutcome, ServiceError>;
    /// Release the handle. Consumes it: a closed document cannot be reused.
    async fn close(&self, handle: DocumentHandle, save_changes: bool) -> Result<(), ServiceError>;
}

/// Normalize the operator-supplied service URL into a directory base.
///
/// Without the trailing slash, `Url::join("api/hubs")` would replace the
/// last path segment instead of appending below it.
pub(crate) fn service_base_url(service_url: &str) -> Result<Url, ServiceError> {
    let mut url = Url::parse(service_url)
        .map_err(|e| ServiceError::Request(format!("invalid service url {service_url}: {e}")))?;

    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }

    Ok(url)
}

/// HTTP implementation of [`DataService`] against the CAD application's
/// local automation bridge (JSON over HTTP under `{base}/api/...`).
pub struct HttpDataService {
    client: Client,
    base: Url,
}

#[derive(Deserialize)]
struct HubsPayload {
    hubs: Vec<Hub>,
}

#[derive(Deserialize)]
struct ProjectsPayload {
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct FilesPayload {
    files: Vec<DesignFile>,
}

#[derive(Deserialize)]
struct FoldersPayload {
    folders: Vec<Folder>,
}

#[derive(Serialize)]
struct OpenBody<'a> {
    file_id: &'a str,
}

#[derive(Deserialize)]
struct OpenPayload {
    document_id: String,
}

#[derive(Serialize)]
struct ExportBody<'a> {
    format: &'a str,
}

#[derive(Serialize)]
struct CloseBody {
    save_changes: bool,
}

impl HttpDataService {
    pub fn new(client: Client, service_url: &str) -> Result<Self, ServiceError> {
        Ok(Self {
            client,
            base: service_base_url(service_url)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base
            .join(path)
            .map_err(|e| ServiceError::Protocol(format!("bad endpoint {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = self.endpoint(path)?;
        let bytes = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ServiceError::Request(format!("GET {url} failed: {e}")))?
            .bytes()
            .await
            .map_err(|e| ServiceError::Request(format!("GET {url} body failed: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::Protocol(format!("GET {url} parse failed: {e}")))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let bytes = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ServiceError::Request(format!("POST {url} failed: {e}")))?
            .bytes()
            .await
            .map_err(|e| ServiceError::Request(format!("POST {url} body failed: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::Protocol(format!("POST {url} parse failed: {e}")))
    }

    /// POST where only the status code matters.
    async fn post_ack<B: Serialize + Sync>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ServiceError> {
        let url = self.endpoint(path)?;
        let mut req = self.client.post(url.clone());
        if let Some(b) = body {
            req = req.json(b);
        }
        req.send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ServiceError::Request(format!("POST {url} failed: {e}")))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DataService for HttpDataService {
    async fn list_hubs(&self) -> Result<Vec<Hub>, ServiceError> {
        let payload: HubsPayload = self.get_json("api/hubs").await?;
        Ok(payload.hubs)
    }

    async fn list_projects(&self, hub: &Hub) -> Result<Vec<Project>, ServiceError> {
        let payload: ProjectsPayload = self
            .get_json(&format!("api/hubs/{}/projects", hub.id))
            .await?;
        Ok(payload.projects)
    }

    async fn root_folder(&self, project: &Project) -> Result<Folder, ServiceError> {
        self.get_json(&format!("api/projects/{}/root", project.id))
            .await
    }

    async fn list_files(&self, folder: &Folder) -> Result<Vec<DesignFile>, ServiceError> {
        let payload: FilesPayload = self
            .get_json(&format!("api/folders/{}/files", folder.id))
            .await?;
        Ok(payload.files)
    }

    async fn list_folders(&self, folder: &Folder) -> Result<Vec<Folder>, ServiceError> {
        let payload: FoldersPayload = self
            .get_json(&format!("api/folders/{}/folders", folder.id))
            .await?;
        Ok(payload.folders)
    }

    async fn open(&self, file: &DesignFile) -> Result<DocumentHandle, ServiceError> {
        let payload: OpenPayload = self
            .post_json("api/documents/open", &OpenBody { file_id: &file.id })
            .await?;
        Ok(DocumentHandle::new(payload.document_id))
    }

    async fn activate(&self, handle: &DocumentHandle) -> Result<(), ServiceError> {
        self.post_ack::<()>(
            &format!("api/documents/{}/activate", handle.document_id()),
            None,
        )
        .await
    }

    async fn export(
        &self,
        handle: &DocumentHandle,
        target: &Utf8Path,
        format: &str,
    ) -> Result<ExportOutcome, ServiceError> {
        let url = self.endpoint(&format!("api/documents/{}/export", handle.document_id()))?;
        let resp = self
            .client
            .post(url.clone())
            .json(&ExportBody { format })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ServiceError::Request(format!("POST {url} failed: {e}")))?;

        let bytes_written = drydock_infra::net::save_body_to_file(resp, target).await?;
        Ok(ExportOutcome { bytes_written })
    }

    async fn close(&self, handle: DocumentHandle, save_changes: bool) -> Result<(), ServiceError> {
        self.post_ack(
            &format!("api/documents/{}/close", handle.document_id()),
            Some(&CloseBody { save_changes }),
        )
        .await
    }
}
