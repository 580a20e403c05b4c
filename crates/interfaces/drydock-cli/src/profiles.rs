use anyhow::{anyhow, Context, Result};
use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

const QUALIFIER: &str = "com";
const ORG: &str = "drydock";
const APP: &str = "exporter";

/// A saved service/output pairing so operators do not retype flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub service_url: String,
    pub export_root: String,
    pub last_export: Option<String>,
}

pub struct ProfileManager {
    /// Overrides the platform config directory; used by tests.
    dir: Option<PathBuf>,
}

impl ProfileManager {
    pub fn new() -> Self {
        Self { dir: None }
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    fn config_dir(&self) -> Result<PathBuf> {
        let dir = match &self.dir {
            Some(d) => d.clone(),
            None => ProjectDirs::from(QUALIFIER, ORG, APP)
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .config_dir()
                .to_path_buf(),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    fn profiles_path(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("profiles.json"))
    }

    pub fn list(&self) -> Result<Vec<Profile>> {
        let path = self.profiles_path()?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).context("Failed to read profiles")?;
        let profiles: Vec<Profile> = serde_json::from_str(&content)?;
        Ok(profiles)
    }

    pub fn find(&self, name_or_id: &str) -> Result<Profile> {
        let profiles = self.list()?;
        profiles
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name_or_id) || p.id == name_or_id)
            .ok_or_else(|| anyhow!("Profile '{}' not found", name_or_id))
    }

    pub fn add(
        &self,
        id: String,
        name: String,
        service_url: String,
        export_root: Utf8PathBuf,
    ) -> Result<Profile> {
        let mut profiles = self.list()?;

        if id.trim().is_empty() {
            return Err(anyhow!("Profile ID cannot be empty"));
        }
        if !id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(anyhow!("Profile ID must use only a-z, 0-9, - and _"));
        }
        if profiles.iter().any(|p| p.id == id) {
            return Err(anyhow!("A profile with ID '{}' already exists", id));
        }

        let profile = Profile {
            id,
            name,
            service_url,
            export_root: export_root.to_string(),
            last_export: None,
        };

        profiles.push(profile.clone());
        self.save(&profiles)?;
        Ok(profile)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut profiles = self.list()?;
        let original_len = profiles.len();
        profiles.retain(|p| p.id != name && !p.name.eq_ignore_ascii_case(name));

        if profiles.len() == original_len {
            return Err(anyhow!("Profile '{}' not found", name));
        }

        self.save(&profiles)?;
        Ok(())
    }

    /// Record a successful profile-driven export run.
    pub fn stamp_last_export(&self, id: &str) -> Result<()> {
        let mut profiles = self.list()?;
        let profile = profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("Profile '{}' not found", id))?;
        profile.last_export = Some(chrono::Utc::now().to_rfc3339());
        self.save(&profiles)
    }

    fn save(&self, profiles: &[Profile]) -> Result<()> {
        let path = self.profiles_path()?;
        let json = serde_json::to_string_pretty(profiles)?;
        atomic_write(&path, json.as_bytes()).context("Failed to write profiles")?;
        Ok(())
    }
}

impl Default for ProfileManager {
    fn default() -> Self {
        Self::new()
    }
}

fn atomic_write(path: &std::path::Path, contents: &[u8]) -> Result<()> {
    let tmp_path = {
        let mut name = path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    };

    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp file {}", tmp_path.to_string_lossy()))?;

    file.write_all(contents)
        .with_context(|| format!("Failed to write temp file {}", tmp_path.to_string_lossy()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {}", tmp_path.to_string_lossy()))?;
    drop(file);

    match fs::rename(&tmp_path, path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(path).ok();
            fs::rename(&tmp_path, path).with_context(|| {
                format!(
                    "Failed to replace destination file {}",
                    path.to_string_lossy()
                )
            })?;
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "Failed to rename temp file {} to {}",
                    tmp_path.to_string_lossy(),
                    path.to_string_lossy()
                )
            });
        }
    }

    Ok(())
}

pub fn handle_list() -> Result<()> {
    let mgr = ProfileManager::new();
    let profiles = mgr.list()?;

    if profiles.is_empty() {
        println!("No profiles found.");
        return Ok(());
    }

    println!("{:<20} {:<24} {:<32} {:<40}", "ID", "NAME", "SERVICE", "OUTPUT");
    println!("{:-<20} {:-<24} {:-<32} {:-<40}", "", "", "", "");
    for p in profiles {
        println!(
            "{:<20} {:<24} {:<32} {:<40}",
            p.id, p.name, p.service_url, p.export_root
        );
    }

    Ok(())
}

pub fn handle_add(
    id: String,
    name: String,
    service_url: String,
    export_root: Utf8PathBuf,
) -> Result<()> {
    let mgr = ProfileManager::new();
    let p = mgr.add(id, name, service_url, export_root)?;
    println!("Profile '{}' ({}) created successfully.", p.name, p.id);
    Ok(())
}

pub fn handle_remove(name: String) -> Result<()> {
    let mgr = ProfileManager::new();
    mgr.remove(&name)?;
    println!("Profile '{}' removed.", name);
    Ok(())
}
