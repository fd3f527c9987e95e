//! Code for mapping sectors to output files and appending payloads to them

use crate::{ExtractError, ExtractResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use xa_sector::StreamType;

/// Identifies one extracted stream: `<type>/<file>/<channel>` relative to the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Destination {
    pub stream_type: StreamType,
    pub file: u8,
    pub channel: u8,
}

impl Destination {
    #[must_use]
    pub fn relative_path(self) -> PathBuf {
        Path::new(self.stream_type.dir_name())
            .join(format!("{:02x}", self.file))
            .join(format!("{:02x}", self.channel))
    }
}

/// Append-only output files under a root directory.
///
/// Up to `capacity` handles are kept open between writes, evicting the oldest opened handle when
/// full. With a capacity of 0 every write opens and closes its file. Handles are unbuffered, so
/// each payload reaches the OS in a single `write_all` and nothing needs flushing on eviction.
#[derive(Debug)]
pub struct OutputFiles {
    root: PathBuf,
    capacity: usize,
    handles: HashMap<PathBuf, File>,
    open_order: VecDeque<PathBuf>,
    created_dirs: HashSet<PathBuf>,
    destinations: HashSet<Destination>,
}

impl OutputFiles {
    #[must_use]
    pub fn new(root: PathBuf, capacity: usize) -> Self {
        Self {
            root,
            capacity,
            handles: HashMap::with_capacity(capacity),
            open_order: VecDeque::with_capacity(capacity),
            created_dirs: HashSet::new(),
            destinations: HashSet::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the output root if it does not already exist.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from creating the directory.
    pub fn create_root(&mut self) -> ExtractResult<()> {
        let root = self.root.clone();
        self.create_dir(&root)
    }

    /// Append `bytes` to the file for `destination`, creating the file and its parent
    /// directories if needed. An empty payload still creates the file.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from creating directories, opening, or writing the file.
    pub fn append(&mut self, destination: Destination, bytes: &[u8]) -> ExtractResult<()> {
        let path = self.root.join(destination.relative_path());
        self.destinations.insert(destination);

        if self.capacity == 0 {
            let mut file = self.open(&path)?;
            return write_all(&mut file, &path, bytes);
        }

        if let Some(file) = self.handles.get_mut(&path) {
            return write_all(file, &path, bytes);
        }

        let mut file = self.open(&path)?;
        write_all(&mut file, &path, bytes)?;
        self.insert_handle(path, file);

        Ok(())
    }

    /// Number of distinct destinations written during the lifetime of this pool.
    #[must_use]
    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    #[must_use]
    pub fn open_handle_count(&self) -> usize {
        self.handles.len()
    }

    pub fn close_all(&mut self) {
        log::debug!("Closing {} open output files", self.handles.len());

        self.handles.clear();
        self.open_order.clear();
    }

    fn insert_handle(&mut self, path: PathBuf, file: File) {
        while self.handles.len() >= self.capacity {
            let Some(oldest) = self.open_order.pop_front() else { break };
            log::trace!("Closing output file '{}'", oldest.display());
            self.handles.remove(&oldest);
        }

        self.open_order.push_back(path.clone());
        self.handles.insert(path, file);
    }

    fn open(&mut self, path: &Path) -> ExtractResult<File> {
        if let Some(parent) = path.parent() {
            self.create_dir(parent)?;
        }

        OpenOptions::new().create(true).append(true).open(path).map_err(|source| {
            ExtractError::OpenOutput { path: path.display().to_string(), source }
        })
    }

    fn create_dir(&mut self, dir: &Path) -> ExtractResult<()> {
        if self.created_dirs.contains(dir) {
            return Ok(());
        }

        fs::create_dir_all(dir).map_err(|source| ExtractError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;
        self.created_dirs.insert(dir.to_path_buf());

        Ok(())
    }
}

fn write_all(file: &mut File, path: &Path, bytes: &[u8]) -> ExtractResult<()> {
    file.write_all(bytes)
        .map_err(|source| ExtractError::Write { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const VIDEO_01_1F: Destination =
        Destination { stream_type: StreamType::Video, file: 0x01, channel: 0x1F };

    #[test]
    fn relative_path() {
        assert_eq!(VIDEO_01_1F.relative_path(), Path::new("video").join("01").join("1f"));

        let untyped = Destination { stream_type: StreamType::Untyped, file: 0xAB, channel: 0 };
        assert_eq!(untyped.relative_path(), Path::new("untyped").join("ab").join("00"));
    }

    #[test]
    fn append_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = OutputFiles::new(dir.path().to_path_buf(), 4);

        outputs.append(VIDEO_01_1F, b"abc").unwrap();
        outputs.append(VIDEO_01_1F, b"def").unwrap();
        outputs.close_all();

        let contents = fs::read(dir.path().join("video/01/1f")).unwrap();
        assert_eq!(contents, b"abcdef");
        assert_eq!(outputs.destination_count(), 1);
        assert_eq!(outputs.open_handle_count(), 0);
    }

    #[test]
    fn empty_payload_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = OutputFiles::new(dir.path().to_path_buf(), 0);

        let destination = Destination { stream_type: StreamType::Untyped, file: 0, channel: 0 };
        outputs.append(destination, &[]).unwrap();

        let metadata = fs::metadata(dir.path().join("untyped/00/00")).unwrap();
        assert!(metadata.is_file());
        assert_eq!(metadata.len(), 0);
    }

    #[test]
    fn eviction_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = OutputFiles::new(dir.path().to_path_buf(), 2);

        let destinations: Vec<_> = (0..5)
            .map(|channel| Destination { stream_type: StreamType::Audio, file: 2, channel })
            .collect();

        for round in 0..3_u8 {
            for &destination in &destinations {
                outputs.append(destination, &[round, destination.channel]).unwrap();
                assert!(outputs.open_handle_count() <= 2);
            }
        }
        outputs.close_all();

        for destination in destinations {
            let contents = fs::read(dir.path().join(destination.relative_path())).unwrap();
            let channel = destination.channel;
            assert_eq!(contents, vec![0, channel, 1, channel, 2, channel]);
        }
    }

    #[test]
    fn appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("video/01")).unwrap();
        fs::write(dir.path().join("video/01/1f"), b"old").unwrap();

        let mut outputs = OutputFiles::new(dir.path().to_path_buf(), 0);
        outputs.append(VIDEO_01_1F, b"new").unwrap();

        assert_eq!(fs::read(dir.path().join("video/01/1f")).unwrap(), b"oldnew");
    }
}
