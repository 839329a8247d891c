//! `LoggerState`: the mutable half of the engine (spec §3).

use std::path::{Path, PathBuf};

use crate::severity::Severity;

/// Buffer capacity for the streaming pipeline: `LINE_MAX + 1`, one byte
/// reserved as the synthetic-newline sentinel (spec §3, §4.4).
pub const LINE_MAX: usize = 4096 - 1;
pub const BUFFER_CAPACITY: usize = LINE_MAX + 1;

/// Device + inode + size, used to detect that the on-disk file has been
/// replaced out from under us (spec §3 `file_stat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    pub dev: u64,
    pub ino: u64,
    pub size: u64,
}

impl FileIdentity {
    pub fn of(path: &Path) -> std::io::Result<Self> {
        use std::os::unix::fs::MetadataExt;
        let md = std::fs::metadata(path)?;
        Ok(FileIdentity {
            dev: md.dev(),
            ino: md.ino(),
            size: md.size(),
        })
    }

    /// Same underlying file (ignoring size, which changes on every write).
    pub fn same_inode(&self, other: &FileIdentity) -> bool {
        self.dev == other.dev && self.ino == other.ino
    }
}

/// Derives the `.previous` sibling: insert `.previous` before the
/// extension (spec §3).
#[must_use]
pub fn previous_filename(filename: &str) -> String {
    insert_before_extension(filename, ".previous")
}

/// Derives the staging name used while rotating: prefix the basename with
/// `.` and insert `.new` before the extension (spec §3).
#[must_use]
pub fn new_filename(filename: &str) -> String {
    let staged = insert_before_extension(filename, ".new");
    format!(".{staged}")
}

fn insert_before_extension(filename: &str, infix: &str) -> String {
    match filename.rfind('.') {
        Some(0) | None => format!("{filename}{infix}"),
        Some(idx) => {
            let (stem, ext) = filename.split_at(idx);
            format!("{stem}{infix}{ext}")
        }
    }
}

/// The mutable state threaded through the streaming pipeline.
pub struct LoggerState {
    pub log_dir: PathBuf,
    pub filename: String,
    pub previous_filename: String,
    pub new_filename: String,

    pub file_identity: Option<FileIdentity>,

    /// Rolling input buffer; always holds at most `BUFFER_CAPACITY - 1`
    /// bytes (one-byte headroom for a synthetic newline on overflow).
    pub buffer: Vec<u8>,
    pub filled: usize,
    pub already_processed_partial_line: usize,

    /// Severity of the partial line currently being accumulated, once
    /// decided; `None` means "not yet parsed".
    pub current_line_severity: Option<Severity>,
    /// Bytes at the front of `buffer` that are the current line's severity
    /// prefix, once `current_line_severity` is decided.
    pub current_line_prefix_len: usize,
    /// Bytes of the current line's body already flushed to partial-line
    /// sinks (terminal, stderr), so a later flush only sends the new tail.
    pub partial_flushed: usize,

    pub default_line_level: Severity,
    pub parse_level_prefix: bool,

    pub use_stderr: bool,
    pub use_terminal_colors: bool,

    /// Set once a rotation attempt fails; permanently disables further
    /// rotation attempts for this process (spec §4.3).
    pub max_bytes: u64,
}

impl LoggerState {
    #[must_use]
    pub fn new(
        log_dir: PathBuf,
        filename: String,
        default_line_level: Severity,
        parse_level_prefix: bool,
        max_bytes: u64,
    ) -> Self {
        let previous = previous_filename(&filename);
        let staging = new_filename(&filename);
        LoggerState {
            log_dir,
            previous_filename: previous,
            new_filename: staging,
            filename,
            file_identity: None,
            buffer: vec![0u8; BUFFER_CAPACITY],
            filled: 0,
            already_processed_partial_line: 0,
            current_line_severity: None,
            current_line_prefix_len: 0,
            partial_flushed: 0,
            default_line_level,
            parse_level_prefix,
            use_stderr: false,
            use_terminal_colors: false,
            max_bytes,
        }
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.log_dir.join(&self.filename)
    }

    #[must_use]
    pub fn previous_path(&self) -> PathBuf {
        self.log_dir.join(&self.previous_filename)
    }

    #[must_use]
    pub fn new_path(&self) -> PathBuf {
        self.log_dir.join(&self.new_filename)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn previous_and_new_names_insert_around_extension() {
        assert_eq!(previous_filename("foo.txt"), "foo.previous.txt");
        assert_eq!(new_filename("foo.txt"), ".foo.new.txt");
    }

    #[test]
    fn names_without_extension_just_get_suffixed() {
        assert_eq!(previous_filename("foo"), "foo.previous");
        assert_eq!(new_filename("foo"), ".foo.new");
    }

    #[test]
    fn leading_dot_is_not_treated_as_extension_separator() {
        // a dotfile-looking name with no real extension
        assert_eq!(previous_filename(".foo"), ".foo.previous");
    }
}
