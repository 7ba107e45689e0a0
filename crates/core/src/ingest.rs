use crate::extractor::FileExtractor;
use crate::traits::FileCatalog;
use crate::{IndexError, IndexOptions, NewFile};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub fn discover_files(root: &Path, options: &IndexOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for item in WalkDir::new(root).follow_links(options.follow_links) {
        let entry = match item {
            Ok(entry) => entry,
            Err(error) => {
                if let Some(ancestor) = error.loop_ancestor() {
                    warn!(ancestor = %ancestor.display(), "skipping symlink cycle");
                } else {
                    debug!(%error, "skipping unreadable entry");
                }
                continue;
            }
        };

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort_unstable();
    files
}

/// Extracts every file under `root` and upserts the ones that yield text.
///
/// Returns the number of files written to the catalog. Files that cannot be
/// read are skipped; catalog failures abort the walk.
pub fn index_directory<C, X>(
    catalog: &C,
    extractor: &X,
    root: &Path,
    options: &IndexOptions,
) -> Result<usize, IndexError>
where
    C: FileCatalog + ?Sized,
    X: FileExtractor + ?Sized,
{
    if !root.is_dir() {
        return Err(IndexError::InvalidRoot(format!(
            "not a directory: {}",
            root.display()
        )));
    }

    let mut indexed = 0usize;
    let mut skipped = 0usize;

    for path in discover_files(root, options) {
        match build_new_file(extractor, &path) {
            Some(file) => {
                catalog.upsert_file(&file)?;
                indexed += 1;
            }
            None => skipped += 1,
        }
    }

    info!(root = %root.display(), indexed, skipped, "indexing finished");
    Ok(indexed)
}

fn build_new_file<X>(extractor: &X, path: &Path) -> Option<NewFile>
where
    X: FileExtractor + ?Sized,
{
    let content = extractor.extract(path);
    if content.trim().is_empty() {
        debug!(path = %path.display(), "no extractable text");
        return None;
    }

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) => {
            debug!(path = %path.display(), %error, "metadata unavailable");
            return None;
        }
    };

    let modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    Some(NewFile {
        name,
        path: path.to_string_lossy().into_owned(),
        extension,
        size: metadata.len(),
        modified,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::{discover_files, index_directory};
    use crate::catalog::SqliteCatalog;
    use crate::extractor::FormatExtractor;
    use crate::traits::FileCatalog;
    use crate::{IndexError, IndexOptions};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discover_files_is_recursive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("nested").join("deeper");
        fs::create_dir_all(&nested)?;
        fs::write(dir.path().join("a.txt"), "a")?;
        fs::write(nested.join("b.bin"), [1u8, 2, 3])?;

        let files = discover_files(dir.path(), &IndexOptions::default());
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[test]
    fn indexes_only_files_with_text() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("hello.txt"), "hello world")?;
        fs::write(dir.path().join("noise.bin"), [0u8, 159, 146, 150, 42, 7, 255, 13])?;
        fs::write(dir.path().join("blank.md"), "   \n\t ")?;

        let catalog = SqliteCatalog::open_in_memory()?;
        let count = index_directory(
            &catalog,
            &FormatExtractor,
            dir.path(),
            &IndexOptions::default(),
        )?;

        assert_eq!(count, 1);
        assert_eq!(catalog.count()?, 1);

        let hits = catalog.search_files("hello")?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "hello.txt");

        let record = catalog.get_file(hits[0].id)?.expect("record should exist");
        assert!(record.content.contains("hello world"));
        assert_eq!(record.extension, ".txt");
        assert_eq!(record.size, 11);
        Ok(())
    }

    #[test]
    fn reindexing_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("notes");
        fs::create_dir(&nested)?;
        fs::write(dir.path().join("a.txt"), "alpha")?;
        fs::write(nested.join("b.py"), "print('beta')")?;

        let catalog = SqliteCatalog::open_in_memory()?;
        let options = IndexOptions::default();

        let first = index_directory(&catalog, &FormatExtractor, dir.path(), &options)?;
        let ids_before: Vec<_> = catalog.list_files(10)?.into_iter().map(|f| f.id).collect();

        let second = index_directory(&catalog, &FormatExtractor, dir.path(), &options)?;
        let ids_after: Vec<_> = catalog.list_files(10)?.into_iter().map(|f| f.id).collect();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
        assert_eq!(catalog.count()?, 2);
        assert_eq!(ids_before, ids_after);
        Ok(())
    }

    #[test]
    fn reindex_updates_content_and_keeps_summary() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("plan.md");
        fs::write(&path, "version one")?;

        let catalog = SqliteCatalog::open_in_memory()?;
        let options = IndexOptions::default();
        index_directory(&catalog, &FormatExtractor, dir.path(), &options)?;
        let id = catalog.list_files(1)?[0].id;
        catalog.update_summary(id, "a plan", Some("work"))?;

        fs::write(&path, "version two")?;
        index_directory(&catalog, &FormatExtractor, dir.path(), &options)?;

        let record = catalog.get_file(id)?.expect("record should exist");
        assert_eq!(record.content, "version two");
        assert_eq!(record.summary.as_deref(), Some("a plan"));
        assert_eq!(record.category.as_deref(), Some("work"));
        Ok(())
    }

    #[test]
    fn missing_root_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let catalog = SqliteCatalog::open_in_memory()?;
        let result = index_directory(
            &catalog,
            &FormatExtractor,
            &dir.path().join("absent"),
            &IndexOptions::default(),
        );
        assert!(matches!(result, Err(IndexError::InvalidRoot(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn following_links_survives_cycles() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let inner = dir.path().join("inner");
        fs::create_dir(&inner)?;
        fs::write(inner.join("doc.txt"), "loop safe")?;
        std::os::unix::fs::symlink(dir.path(), inner.join("back"))?;

        let options = IndexOptions { follow_links: true };
        let files = discover_files(dir.path(), &options);
        assert_eq!(files.len(), 1);
        Ok(())
    }
}
