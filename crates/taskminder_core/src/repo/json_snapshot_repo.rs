//! JSON-file snapshot gateway.
//!
//! # Responsibility
//! - Persist each collection as one pretty-printed document in a data
//!   directory: `categories.json`, `priorities.json`, `tasks.json`.
//!
//! # Invariants
//! - A missing file loads as an empty collection.
//! - Writes go to a sibling temp file that is renamed over the target, so a
//!   failed save never truncates the previous document.
//! - `save_snapshot` stages all three temp files before renaming any of
//!   them; a staging failure leaves every previous document in place.

use super::snapshot_repo::{
    CategoryRecord, PriorityRecord, RepoError, RepoResult, SnapshotRepository, TaskRecord,
};
use serde::de::DeserializeOwned;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const CATEGORIES_FILE: &str = "categories.json";
pub const PRIORITIES_FILE: &str = "priorities.json";
pub const TASKS_FILE: &str = "tasks.json";
const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CategoriesDocument {
    #[serde(default)]
    categories: Vec<CategoryRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrioritiesDocument {
    #[serde(default)]
    priorities: Vec<PriorityRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TasksDocument {
    #[serde(default)]
    tasks: Vec<TaskRecord>,
}

/// Snapshot gateway over a directory of JSON documents.
#[derive(Debug, Clone)]
pub struct JsonSnapshotRepository {
    dir: PathBuf,
}

impl JsonSnapshotRepository {
    /// The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned + Default>(&self, file_name: &str) -> RepoResult<T> {
        let path = self.dir.join(file_name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => return Err(RepoError::Io { path, source }),
        };
        serde_json::from_str(&contents).map_err(|source| RepoError::Json { path, source })
    }

    fn write<T: Serialize>(&self, file_name: &str, document: &T) -> RepoResult<()> {
        self.stage(file_name, document)?.commit()
    }

    /// Writes `document` to the temp sibling of `file_name` without touching
    /// the target.
    fn stage<T: Serialize>(&self, file_name: &str, document: &T) -> RepoResult<StagedFile> {
        let path = self.dir.join(file_name);
        let tmp_path = self.dir.join(format!("{file_name}{TMP_SUFFIX}"));
        let json = serde_json::to_string_pretty(document).map_err(|source| RepoError::Json {
            path: path.clone(),
            source,
        })?;

        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let staged = StagedFile { path, tmp_path };
        write_synced(&staged.tmp_path, json.as_bytes()).inspect_err(|_| staged.discard())?;
        Ok(staged)
    }

    fn stage_snapshot(
        &self,
        staged: &mut Vec<StagedFile>,
        categories: &[CategoryRecord],
        priorities: &[PriorityRecord],
        tasks: &[TaskRecord],
    ) -> RepoResult<()> {
        staged.push(self.stage(
            CATEGORIES_FILE,
            &CategoriesDocument {
                categories: categories.to_vec(),
            },
        )?);
        staged.push(self.stage(
            PRIORITIES_FILE,
            &PrioritiesDocument {
                priorities: priorities.to_vec(),
            },
        )?);
        staged.push(self.stage(
            TASKS_FILE,
            &TasksDocument {
                tasks: tasks.to_vec(),
            },
        )?);
        Ok(())
    }
}

/// A fully written temp file waiting to replace its target.
#[derive(Debug)]
struct StagedFile {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl StagedFile {
    fn commit(&self) -> RepoResult<()> {
        fs::rename(&self.tmp_path, &self.path).map_err(io_err(&self.path))
    }

    fn discard(&self) {
        match fs::remove_file(&self.tmp_path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                "event=snapshot_tmp_discard module=repo status=error path={} error={}",
                self.tmp_path.display(),
                err
            ),
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> RepoResult<()> {
    let mut file = File::create(path).map_err(io_err(path))?;
    file.write_all(bytes).map_err(io_err(path))?;
    file.sync_all().map_err(io_err(path))
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RepoError {
    let path = path.to_path_buf();
    move |source| RepoError::Io { path, source }
}

impl SnapshotRepository for JsonSnapshotRepository {
    fn load_categories(&self) -> RepoResult<Vec<CategoryRecord>> {
        self.read::<CategoriesDocument>(CATEGORIES_FILE)
            .map(|document| document.categories)
    }

    fn load_priorities(&self) -> RepoResult<Vec<PriorityRecord>> {
        self.read::<PrioritiesDocument>(PRIORITIES_FILE)
            .map(|document| document.priorities)
    }

    fn load_tasks(&self) -> RepoResult<Vec<TaskRecord>> {
        self.read::<TasksDocument>(TASKS_FILE)
            .map(|document| document.tasks)
    }

    fn save_categories(&self, categories: &[CategoryRecord]) -> RepoResult<()> {
        self.write(
            CATEGORIES_FILE,
            &CategoriesDocument {
                categories: categories.to_vec(),
            },
        )
    }

    fn save_priorities(&self, priorities: &[PriorityRecord]) -> RepoResult<()> {
        self.write(
            PRIORITIES_FILE,
            &PrioritiesDocument {
                priorities: priorities.to_vec(),
            },
        )
    }

    fn save_tasks(&self, tasks: &[TaskRecord]) -> RepoResult<()> {
        self.write(
            TASKS_FILE,
            &TasksDocument {
                tasks: tasks.to_vec(),
            },
        )
    }

    fn save_snapshot(
        &self,
        categories: &[CategoryRecord],
        priorities: &[PriorityRecord],
        tasks: &[TaskRecord],
    ) -> RepoResult<()> {
        let mut staged = Vec::with_capacity(3);
        if let Err(err) = self.stage_snapshot(&mut staged, categories, priorities, tasks) {
            staged.iter().for_each(StagedFile::discard);
            return Err(err);
        }
        for file in &staged {
            file.commit()?;
        }
        Ok(())
    }
}
