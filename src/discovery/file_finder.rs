use crate::config::Config;
use crate::spec::{DocumentFormat, SpecDocument, SpecError};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// How a spec file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Named directly on the command line or in `targets`
    Explicit,
    /// Found by scanning a directory
    Discovered,
}

/// A candidate specification file
#[derive(Debug, Clone)]
pub struct SpecFile {
    /// Path to the file
    pub path: PathBuf,

    /// Format chosen from the extension when the file was found
    pub format: DocumentFormat,

    pub origin: Origin,
}

impl SpecFile {
    pub fn new(path: PathBuf, format: DocumentFormat, origin: Origin) -> Self {
        Self { path, format, origin }
    }

    /// Parse the file. Discovered files must declare `openapi` or `swagger`.
    pub fn load(&self) -> Result<SpecDocument, SpecError> {
        match self.origin {
            Origin::Explicit => SpecDocument::read(&self.path, self.format),
            Origin::Discovered => SpecDocument::load_discovered(&self.path, self.format),
        }
    }
}

/// File finder for discovering specification files in a project
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find all spec files under `root`, or `root` itself when it is a file
    pub fn find_files(&self, root: &Path) -> Vec<SpecFile> {
        debug!("Scanning for spec files in: {}", root.display());

        let targets = if self.config.targets.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.config.targets.iter().map(|t| root.join(t)).collect()
        };

        let mut files: Vec<SpecFile> = targets
            .par_iter()
            .flat_map(|target| self.scan_target(target))
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);

        debug!("Found {} candidate files", files.len());
        files
    }

    fn scan_target(&self, target: &Path) -> Vec<SpecFile> {
        if target.is_file() {
            let format = DocumentFormat::from_path(target).unwrap_or(DocumentFormat::Yaml);
            return vec![SpecFile::new(target.to_path_buf(), format, Origin::Explicit)];
        }

        if !target.exists() {
            trace!("Target does not exist: {}", target.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(target)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .follow_links(false)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();

                if self.config.should_exclude(path) {
                    trace!("Excluding: {}", path.display());
                    return None;
                }

                let format = DocumentFormat::from_path(path)?;

                trace!("Found {:?}: {}", format, path.display());
                Some(SpecFile::new(path.to_path_buf(), format, Origin::Discovered))
            })
            .collect()
    }
}
