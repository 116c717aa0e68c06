//! Fixture files for the method harness
//!
//! A [`FixtureSet`] writes the fixture files into a local directory, mirrors a
//! subset of them into the directory the server under test serves from, and
//! removes everything again on [`FixtureSet::cleanup`]. Cleanup is best-effort:
//! removal errors are logged and ignored. It also runs from `Drop`, so a set
//! that is dropped early (panic, early return) still leaves no fixtures behind.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors related to fixture setup
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("IO error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid fixture configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown fixture: {0}")]
    UnknownFixture(String),
}

pub type FixtureResult<T> = Result<T, FixtureError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> FixtureError + '_ {
    move |source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A single file created for the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureFile {
    /// Bare file name, no directory components
    pub name: String,
    pub contents: Vec<u8>,
}

impl FixtureFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Where fixtures live and which of them the server should see
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Local fixture directory, removed entirely on cleanup
    pub fixture_dir: PathBuf,
    /// Directory served by the server under test
    pub served_dir: PathBuf,
    pub files: Vec<FixtureFile>,
    /// Names from `files` copied into `served_dir`
    pub mirrored: Vec<String>,
}

pub const TEXT_FIXTURE: &str = "test.txt";
pub const JSON_FIXTURE: &str = "test.json";
pub const TEXT_FIXTURE_CONTENTS: &str = "Hello, World!";
pub const JSON_FIXTURE_CONTENTS: &str = r#"{"message": "Hello, JSON!"}"#;

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            fixture_dir: PathBuf::from("test_files"),
            served_dir: PathBuf::from("static"),
            files: vec![
                FixtureFile::new(TEXT_FIXTURE, TEXT_FIXTURE_CONTENTS),
                FixtureFile::new(JSON_FIXTURE, JSON_FIXTURE_CONTENTS),
            ],
            mirrored: vec![TEXT_FIXTURE.to_string()],
        }
    }
}

impl FixtureConfig {
    pub fn with_dirs(fixture_dir: impl Into<PathBuf>, served_dir: impl Into<PathBuf>) -> Self {
        Self {
            fixture_dir: fixture_dir.into(),
            served_dir: served_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> FixtureResult<()> {
        if self.fixture_dir.as_os_str().is_empty() {
            return Err(FixtureError::InvalidConfig(
                "Fixture directory cannot be empty".to_string(),
            ));
        }

        if self.served_dir.as_os_str().is_empty() {
            return Err(FixtureError::InvalidConfig(
                "Served directory cannot be empty".to_string(),
            ));
        }

        if self.fixture_dir == self.served_dir {
            return Err(FixtureError::InvalidConfig(
                "Fixture and served directories must differ".to_string(),
            ));
        }

        for file in &self.files {
            if file.name.is_empty()
                || file.name == "."
                || file.name == ".."
                || file.name.contains(['/', '\\'])
            {
                return Err(FixtureError::InvalidConfig(format!(
                    "Invalid fixture name '{}'",
                    file.name
                )));
            }
        }

        for name in &self.mirrored {
            if !self.files.iter().any(|f| &f.name == name) {
                return Err(FixtureError::UnknownFixture(name.clone()));
            }
        }

        Ok(())
    }

    pub fn file(&self, name: &str) -> Option<&FixtureFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// What cleanup did; removal failures are counted, never raised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub restored: usize,
    pub ignored: usize,
}

#[derive(Debug)]
struct Mirror {
    path: PathBuf,
    /// Contents the served file had before setup overwrote it
    backup: Option<Vec<u8>>,
}

/// Live fixtures for one run
#[derive(Debug)]
pub struct FixtureSet {
    config: FixtureConfig,
    mirrors: Vec<Mirror>,
    created_served_dir: bool,
    prepared: bool,
    cleaned_up: bool,
}

impl FixtureSet {
    /// Creates an empty set; nothing touches the filesystem until [`prepare`](Self::prepare).
    pub fn new(config: FixtureConfig) -> Self {
        Self {
            config,
            mirrors: Vec::new(),
            created_served_dir: false,
            prepared: false,
            cleaned_up: false,
        }
    }

    /// Creates and prepares a set, cleaning up whatever was written if preparation fails.
    pub fn setup(config: FixtureConfig) -> FixtureResult<Self> {
        let mut set = Self::new(config);
        if let Err(e) = set.prepare() {
            set.cleanup();
            return Err(e);
        }
        Ok(set)
    }

    /// Writes the fixtures and mirrors them. A no-op on a set that is already
    /// prepared and not yet cleaned up.
    pub fn prepare(&mut self) -> FixtureResult<()> {
        if self.prepared {
            debug!("Fixtures already prepared in {}", self.config.fixture_dir.display());
            return Ok(());
        }
        self.config.validate()?;
        self.cleaned_up = false;

        let fixture_dir = self.config.fixture_dir.clone();
        fs::create_dir_all(&fixture_dir).map_err(io_error(&fixture_dir))?;

        for file in &self.config.files {
            let path = fixture_dir.join(&file.name);
            fs::write(&path, &file.contents).map_err(io_error(&path))?;
            debug!("Wrote fixture {}", path.display());
        }

        let served_dir = self.config.served_dir.clone();
        if !served_dir.is_dir() {
            fs::create_dir_all(&served_dir).map_err(io_error(&served_dir))?;
            self.created_served_dir = true;
        }

        for name in self.config.mirrored.clone() {
            let source = fixture_dir.join(&name);
            let target = served_dir.join(&name);

            // A retry after a partial failure must keep the first backup.
            if !self.mirrors.iter().any(|m| m.path == target) {
                let backup = if target.is_file() {
                    Some(fs::read(&target).map_err(io_error(&target))?)
                } else {
                    None
                };
                self.mirrors.push(Mirror {
                    path: target.clone(),
                    backup,
                });
            }

            let contents = fs::read(&source).map_err(io_error(&source))?;
            fs::write(&target, contents).map_err(io_error(&target))?;
            debug!("Mirrored {} to {}", source.display(), target.display());
        }

        info!(
            "Fixtures ready in {} ({} files, {} mirrored)",
            fixture_dir.display(),
            self.config.files.len(),
            self.mirrors.len()
        );
        self.prepared = true;
        Ok(())
    }

    /// Removes every fixture; safe to call more than once.
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if self.cleaned_up {
            return report;
        }
        self.cleaned_up = true;
        self.prepared = false;

        let fixture_dir = &self.config.fixture_dir;
        let pattern = format!(
            "{}/*",
            glob::Pattern::escape(&fixture_dir.to_string_lossy())
        );
        match glob::glob(&pattern) {
            Ok(entries) => {
                for entry in entries {
                    match entry {
                        Ok(path) => match fs::remove_file(&path) {
                            Ok(()) => report.removed += 1,
                            Err(e) => {
                                debug!("Ignoring failure to remove {}: {}", path.display(), e);
                                report.ignored += 1;
                            }
                        },
                        Err(e) => {
                            debug!("Ignoring unreadable fixture entry: {}", e);
                            report.ignored += 1;
                        }
                    }
                }
            }
            Err(e) => {
                debug!("Ignoring bad cleanup pattern '{}': {}", pattern, e);
                report.ignored += 1;
            }
        }
        if let Err(e) = fs::remove_dir(fixture_dir) {
            debug!("Ignoring failure to remove {}: {}", fixture_dir.display(), e);
            report.ignored += 1;
        }

        for mirror in self.mirrors.drain(..) {
            let outcome = match &mirror.backup {
                Some(previous) => fs::write(&mirror.path, previous).map(|_| true),
                None => fs::remove_file(&mirror.path).map(|_| false),
            };
            match outcome {
                Ok(true) => report.restored += 1,
                Ok(false) => report.removed += 1,
                Err(e) => {
                    debug!("Ignoring failure to clean {}: {}", mirror.path.display(), e);
                    report.ignored += 1;
                }
            }
        }

        if self.created_served_dir {
            self.created_served_dir = false;
            if let Err(e) = fs::remove_dir(&self.config.served_dir) {
                debug!(
                    "Leaving served directory {} in place: {}",
                    self.config.served_dir.display(),
                    e
                );
            }
        }

        info!(
            "Fixtures cleaned up ({} removed, {} restored, {} ignored)",
            report.removed, report.restored, report.ignored
        );
        report
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.config.fixture_dir.join(name)
    }

    pub fn served_path(&self, name: &str) -> PathBuf {
        self.config.served_dir.join(name)
    }

    /// Reads a fixture back from disk.
    pub fn read(&self, name: &str) -> FixtureResult<Vec<u8>> {
        if self.config.file(name).is_none() {
            return Err(FixtureError::UnknownFixture(name.to_string()));
        }
        let path = self.path(name);
        fs::read(&path).map_err(io_error(&path))
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up
    }
}

impl Drop for FixtureSet {
    fn drop(&mut self) {
        if !self.cleaned_up {
            self.cleanup();
        }
    }
}
