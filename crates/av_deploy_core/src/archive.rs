use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::DeployError;

const EXECUTABLE_MODE: u32 = 0o755;
const REGULAR_MODE: u32 = 0o644;
/// Directories left out of the archive; a source checkout carries its VCS metadata.
const SKIPPED_DIRS: [&str; 1] = [".git"];

/// The archive produced by the build step, read once for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct BuiltArchive {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for BuiltArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltArchive")
            .field("path", &self.path)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl BuiltArchive {
    pub fn read(path: &Path) -> Result<Self, DeployError> {
        if !path.is_file() {
            return Err(DeployError::ArchiveMissing(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|source| DeployError::ArchiveIo {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(DeployError::ArchiveEmpty(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 SHA-256, the encoding the function API reports as `CodeSha256`.
    pub fn sha256_base64(&self) -> String {
        code_sha256(&self.bytes)
    }
}

pub fn code_sha256(bytes: &[u8]) -> String {
    B64.encode(Sha256::digest(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    pub output: PathBuf,
    pub entries: Vec<String>,
}

/// Zips every file under `source_dir` into `output`.
///
/// Entries are sorted and carry no timestamps, so the same tree always yields
/// the same bytes.
pub fn package_directory(source_dir: &Path, output: &Path) -> Result<PackageSummary, DeployError> {
    if !source_dir.is_dir() {
        return Err(DeployError::Packaging(format!(
            "source directory '{}' does not exist",
            source_dir.display()
        )));
    }

    let mut files = Vec::new();
    collect_files(source_dir, &mut files)?;
    // the output may live inside the source tree
    if let Ok(output_abs) = fs::canonicalize(output) {
        files.retain(|path| fs::canonicalize(path).ok().as_ref() != Some(&output_abs));
    }
    if files.is_empty() {
        return Err(DeployError::Packaging(format!(
            "source directory '{}' contains no files",
            source_dir.display()
        )));
    }

    let mut entries: Vec<(String, PathBuf)> = files
        .into_iter()
        .map(|path| Ok((entry_name(source_dir, &path)?, path)))
        .collect::<Result<_, DeployError>>()?;
    entries.sort_by(|left, right| left.0.cmp(&right.0));

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| {
            DeployError::Packaging(format!(
                "failed to create output directory '{}': {error}",
                parent.display()
            ))
        })?;
    }

    let file = fs::File::create(output).map_err(|error| {
        DeployError::Packaging(format!(
            "failed to create archive '{}': {error}",
            output.display()
        ))
    })?;
    let mut zip = ZipWriter::new(file);

    for (name, path) in &entries {
        let contents = fs::read(path).map_err(|error| {
            DeployError::Packaging(format!("failed to read '{}': {error}", path.display()))
        })?;
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(file_mode(path));
        zip.start_file(name.as_str(), options).map_err(|error| {
            DeployError::Packaging(format!("failed to start entry {name}: {error}"))
        })?;
        zip.write_all(&contents).map_err(|error| {
            DeployError::Packaging(format!("failed to write entry {name}: {error}"))
        })?;
    }

    zip.finish()
        .map_err(|error| DeployError::Packaging(format!("failed to finish archive: {error}")))?;

    tracing::debug!(
        output = %output.display(),
        entries = entries.len(),
        "packaged archive"
    );

    Ok(PackageSummary {
        output: output.to_path_buf(),
        entries: entries.into_iter().map(|(name, _)| name).collect(),
    })
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), DeployError> {
    let read_dir = fs::read_dir(dir).map_err(|error| {
        DeployError::Packaging(format!("failed to list '{}': {error}", dir.display()))
    })?;
    for entry in read_dir {
        let entry = entry.map_err(|error| {
            DeployError::Packaging(format!("failed to list '{}': {error}", dir.display()))
        })?;
        let path = entry.path();
        if path.is_dir() {
            if SKIPPED_DIRS.iter().any(|skipped| entry.file_name() == *skipped) {
                continue;
            }
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

fn entry_name(root: &Path, path: &Path) -> Result<String, DeployError> {
    let relative = path.strip_prefix(root).map_err(|error| {
        DeployError::Packaging(format!("'{}' is outside the source tree: {error}", path.display()))
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(metadata) if metadata.permissions().mode() & 0o111 != 0 => EXECUTABLE_MODE,
        _ => REGULAR_MODE,
    }
}

#[cfg(not(unix))]
fn file_mode(path: &Path) -> u32 {
    // no exec bit to inspect; the function runtime entry point is `bootstrap`
    if path.file_name().is_some_and(|name| name == "bootstrap") {
        EXECUTABLE_MODE
    } else {
        REGULAR_MODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    fn zip_names(path: &Path) -> Vec<String> {
        let file = fs::File::open(path).expect("open zip");
        let mut archive = zip::ZipArchive::new(file).expect("read zip");
        (0..archive.len())
            .map(|index| archive.by_index(index).expect("entry").name().to_string())
            .collect()
    }

    #[test]
    fn packages_nested_tree_in_sorted_order() {
        let source = tempfile::tempdir().expect("tempdir");
        write_file(source.path(), "scan.py", "print('scan')");
        write_file(source.path(), "lib/clamav.py", "pass");
        write_file(source.path(), "common.py", "pass");

        let out_dir = tempfile::tempdir().expect("tempdir");
        let output = out_dir.path().join("dist/lambda.zip");
        let summary = package_directory(source.path(), &output).expect("package");

        let expected = vec!["common.py", "lib/clamav.py", "scan.py"];
        assert_eq!(summary.entries, expected);
        assert_eq!(zip_names(&output), expected);
    }

    #[test]
    fn packaging_is_deterministic() {
        let source = tempfile::tempdir().expect("tempdir");
        write_file(source.path(), "a.txt", "alpha");
        write_file(source.path(), "b/c.txt", "gamma");

        let out_dir = tempfile::tempdir().expect("tempdir");
        let first = out_dir.path().join("first.zip");
        let second = out_dir.path().join("second.zip");
        package_directory(source.path(), &first).expect("first");
        package_directory(source.path(), &second).expect("second");

        assert_eq!(
            fs::read(&first).expect("first bytes"),
            fs::read(&second).expect("second bytes")
        );
    }

    #[test]
    fn checkout_metadata_is_left_out() {
        let source = tempfile::tempdir().expect("tempdir");
        write_file(source.path(), "scan.py", "print('scan')");
        write_file(source.path(), ".git/HEAD", "ref: refs/heads/main");
        write_file(source.path(), ".github/workflows/ci.yml", "on: push");

        let out_dir = tempfile::tempdir().expect("tempdir");
        let output = out_dir.path().join("lambda.zip");
        let summary = package_directory(source.path(), &output).expect("package");

        assert_eq!(summary.entries, vec![".github/workflows/ci.yml", "scan.py"]);
    }

    #[test]
    fn missing_source_directory_fails() {
        let out_dir = tempfile::tempdir().expect("tempdir");
        let error = package_directory(
            &out_dir.path().join("absent"),
            &out_dir.path().join("out.zip"),
        )
        .expect_err("missing source");
        assert!(error.to_string().contains("does not exist"));
    }

    #[test]
    fn empty_source_directory_fails() {
        let source = tempfile::tempdir().expect("tempdir");
        let out_dir = tempfile::tempdir().expect("tempdir");
        let error = package_directory(source.path(), &out_dir.path().join("out.zip"))
            .expect_err("empty source");
        assert!(error.to_string().contains("contains no files"));
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_is_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let source = tempfile::tempdir().expect("tempdir");
        write_file(source.path(), "bootstrap", "#!/bin/sh");
        write_file(source.path(), "data.txt", "data");
        fs::set_permissions(
            source.path().join("bootstrap"),
            fs::Permissions::from_mode(0o755),
        )
        .expect("chmod");

        let out_dir = tempfile::tempdir().expect("tempdir");
        let output = out_dir.path().join("out.zip");
        package_directory(source.path(), &output).expect("package");

        let file = fs::File::open(&output).expect("open zip");
        let mut archive = zip::ZipArchive::new(file).expect("read zip");
        let bootstrap_mode = archive
            .by_name("bootstrap")
            .expect("bootstrap")
            .unix_mode()
            .expect("mode");
        let data_mode = archive
            .by_name("data.txt")
            .expect("data")
            .unix_mode()
            .expect("mode");
        assert_eq!(bootstrap_mode & 0o777, 0o755);
        assert_eq!(data_mode & 0o777, 0o644);
    }

    #[test]
    fn built_archive_reads_bytes_and_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lambda.zip");
        fs::write(&path, b"abc").expect("write");

        let archive = BuiltArchive::read(&path).expect("read");
        assert_eq!(archive.len(), 3);
        // sha256("abc") in base64
        assert_eq!(
            archive.sha256_base64(),
            "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0="
        );
    }

    #[test]
    fn built_archive_missing_or_empty_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.zip");
        assert!(matches!(
            BuiltArchive::read(&missing),
            Err(DeployError::ArchiveMissing(_))
        ));

        let empty = dir.path().join("empty.zip");
        fs::write(&empty, b"").expect("write");
        assert!(matches!(
            BuiltArchive::read(&empty),
            Err(DeployError::ArchiveEmpty(_))
        ));
    }
}
