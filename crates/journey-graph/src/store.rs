use journey_core::{
    CatalogDocument, CatalogSource, CompletionSet, JourneyError, NodeId, NodeRecord,
    ProgressSnapshot, ProgressStore, RecommendationSettings, Result,
};
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Process-local store holding both the catalog and the user's progress.
///
/// Readers get cloned snapshots, so a computation never observes a concurrent mutation.
#[derive(Debug, Default)]
pub struct InMemoryJourneyStore {
    nodes: RwLock<Vec<NodeRecord>>,
    progress: RwLock<ProgressSnapshot>,
}

impl InMemoryJourneyStore {
    pub fn new(nodes: Vec<NodeRecord>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
            progress: RwLock::new(ProgressSnapshot::default()),
        }
    }

    pub fn with_progress(self, progress: ProgressSnapshot) -> Self {
        *self.progress.write() = progress;
        self
    }

    pub fn replace_nodes(&self, nodes: Vec<NodeRecord>) {
        *self.nodes.write() = nodes;
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.progress.read().clone()
    }
}

impl CatalogSource for InMemoryJourneyStore {
    fn list_nodes(&self) -> Result<Vec<NodeRecord>> {
        Ok(self.nodes.read().clone())
    }

    fn list_completed_ids(&self) -> Result<CompletionSet> {
        Ok(self.progress.read().completed.clone())
    }
}

impl ProgressStore for InMemoryJourneyStore {
    fn mark_completed(&self, id: &str, completed: bool) -> Result<()> {
        let changed = self.progress.write().completed.mark(id, completed);
        debug!(node = id, completed, changed, "completion updated");
        Ok(())
    }

    fn set_current_node(&self, id: Option<NodeId>) -> Result<()> {
        self.progress.write().settings.current_node_id = id;
        Ok(())
    }

    fn set_current_spiral_order(&self, order: Option<i64>) -> Result<()> {
        self.progress.write().settings.current_spiral_order = order;
        Ok(())
    }

    fn settings(&self) -> Result<RecommendationSettings> {
        Ok(self.progress.read().settings.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Yaml,
}

impl CatalogFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(CatalogFormat::Json),
            Some("yaml") | Some("yml") => Ok(CatalogFormat::Yaml),
            _ => Err(JourneyError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parses a catalog file. Accepts a bare node list or `{ nodes: [...] }`.
pub fn load_catalog_file(path: impl AsRef<Path>) -> Result<Vec<NodeRecord>> {
    let path = path.as_ref();
    let format = CatalogFormat::from_path(path)?;
    let content = fs::read_to_string(path)?;

    let document: CatalogDocument = match format {
        CatalogFormat::Json => serde_json::from_str(&content)?,
        CatalogFormat::Yaml => serde_yaml::from_str(&content)?,
    };
    let nodes = document.into_nodes();

    info!(path = %path.display(), nodes = nodes.len(), "catalog loaded");
    Ok(nodes)
}

/// Reads a progress file. A missing file is an empty snapshot.
pub fn read_progress_file(path: impl AsRef<Path>) -> Result<ProgressSnapshot> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no progress file yet");
            Ok(ProgressSnapshot::default())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn write_progress_file(path: impl AsRef<Path>, snapshot: &ProgressSnapshot) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, content)?;
    Ok(())
}

/// Catalog file plus an optional progress file.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    catalog_path: PathBuf,
    progress_path: Option<PathBuf>,
}

impl FileCatalogSource {
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            progress_path: None,
        }
    }

    pub fn with_progress(mut self, progress_path: impl Into<PathBuf>) -> Self {
        self.progress_path = Some(progress_path.into());
        self
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn progress_path(&self) -> Option<&Path> {
        self.progress_path.as_deref()
    }
}

impl CatalogSource for FileCatalogSource {
    fn list_nodes(&self) -> Result<Vec<NodeRecord>> {
        load_catalog_file(&self.catalog_path)
    }

    fn list_completed_ids(&self) -> Result<CompletionSet> {
        match &self.progress_path {
            Some(path) => Ok(read_progress_file(path)?.completed),
            None => Ok(CompletionSet::new()),
        }
    }
}

/// JSON progress file, rewritten in full on every mutation.
#[derive(Debug)]
pub struct FileProgressStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Result<ProgressSnapshot> {
        let _guard = self.lock.lock();
        read_progress_file(&self.path)
    }

    fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut ProgressSnapshot),
    {
        let _guard = self.lock.lock();
        let mut snapshot = read_progress_file(&self.path)?;
        mutate(&mut snapshot);
        write_progress_file(&self.path, &snapshot)?;
        debug!(path = %self.path.display(), "progress saved");
        Ok(())
    }
}

impl ProgressStore for FileProgressStore {
    fn mark_completed(&self, id: &str, completed: bool) -> Result<()> {
        self.update(|snapshot| {
            snapshot.completed.mark(id, completed);
        })
    }

    fn set_current_node(&self, id: Option<NodeId>) -> Result<()> {
        self.update(|snapshot| snapshot.settings.current_node_id = id)
    }

    fn set_current_spiral_order(&self, order: Option<i64>) -> Result<()> {
        self.update(|snapshot| snapshot.settings.current_spiral_order = order)
    }

    fn settings(&self) -> Result<RecommendationSettings> {
        Ok(self.snapshot()?.settings)
    }
}
