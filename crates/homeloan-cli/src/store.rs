use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use homeloan_core::applications::consultation::ConsultationRecord;
use homeloan_core::applications::intake::LoanApplication;
use homeloan_core::applications::repository::{
    ApplicationRepository, ConsultationRepository, InMemoryApplicationRepository,
    InMemoryConsultationRepository,
};

/// On-disk layout of the `--store` file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    applications: Vec<LoanApplication>,
    #[serde(default)]
    consultations: Vec<ConsultationRecord>,
}

/// Applications and consultations kept in a JSON file between runs.
pub struct Store {
    path: PathBuf,
    pub applications: InMemoryApplicationRepository,
    pub consultations: InMemoryConsultationRepository,
}

impl Store {
    /// Load the store; a missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref().to_path_buf();
        let file: StoreFile = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read store '{}': {}", path.display(), e))?;
            serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse store '{}': {}", path.display(), e))?
        } else {
            StoreFile::default()
        };

        tracing::debug!(
            path = %path.display(),
            applications = file.applications.len(),
            consultations = file.consultations.len(),
            "opened store"
        );

        Ok(Self {
            path,
            applications: InMemoryApplicationRepository::from_records(file.applications),
            consultations: InMemoryConsultationRepository::from_records(file.consultations),
        })
    }

    /// Write every record back, replacing the file.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let file = StoreFile {
            applications: self.applications.all()?,
            consultations: self.consultations.all()?,
        };
        let content = serde_json::to_string_pretty(&file)?;

        // write beside the target, then swap it in
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content)
            .map_err(|e| format!("Failed to write store '{}': {}", staging.display(), e))?;
        fs::rename(&staging, &self.path)
            .map_err(|e| format!("Failed to replace store '{}': {}", self.path.display(), e))?;
        Ok(())
    }
}

/// Open the store named by `--store`, or fail with a hint naming `command`.
pub fn require(path: Option<&str>, command: &str) -> Result<Store, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Store::open(path),
        None => Err(format!("{command} needs --store <file> (or HOMELOAN_STORE)").into()),
    }
}
