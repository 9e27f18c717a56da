//! Size-based rotating log file writer

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Appends formatted lines to a log file, rotating when a write would push
/// the file past `max_bytes`.
///
/// On rotation the current file is renamed to `<name>.1`, existing backups
/// shift up (`<name>.1` to `<name>.2` and so on), the backup beyond
/// `backup_count` is deleted, and a fresh file is opened. The triggering
/// line lands in the fresh file, so rotation never loses or duplicates a
/// record. With `backup_count == 0` the file is truncated in place.
pub struct RotatingFileWriter {
    path: PathBuf,
    file: File,
    size: u64,
    max_bytes: u64,
    backup_count: u32,
}

impl RotatingFileWriter {
    /// Open (or create) the log file in append mode. Picks up the size of
    /// an existing file so rotation thresholds hold across restarts.
    pub fn open(path: PathBuf, max_bytes: u64, backup_count: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::OpenLogFile {
                path: path.clone(),
                source: e,
            })?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            path,
            file,
            size,
            max_bytes,
            backup_count,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line, rotating first if appending would overflow. An
    /// oversize line on an empty file is written without rotating.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        let incoming = line.len() as u64 + 1;
        if self.size > 0 && self.size + incoming > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.size += incoming;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.file.flush().map_err(Error::Write)
    }

    fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> Result<()> {
        self.file.flush()?;

        if self.backup_count == 0 {
            self.file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&self.path)
                .map_err(|e| Error::OpenLogFile {
                    path: self.path.clone(),
                    source: e,
                })?;
            self.size = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest).map_err(|e| Error::Rotation {
                path: oldest,
                source: e,
            })?;
        }
        for index in (1..self.backup_count).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1)).map_err(|e| Error::Rotation {
                    path: from,
                    source: e,
                })?;
            }
        }
        fs::rename(&self.path, self.backup_path(1)).map_err(|e| Error::Rotation {
            path: self.path.clone(),
            source: e,
        })?;

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::OpenLogFile {
                path: self.path.clone(),
                source: e,
            })?;
        self.size = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_writes_without_rotation_below_threshold() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("svc.log");
        let mut writer = RotatingFileWriter::open(path.clone(), 1024, 2).expect("open");
        writer.write_line("one").expect("write");
        writer.write_line("two").expect("write");
        writer.flush().expect("flush");

        assert_eq!(writer.path(), path.as_path());
        assert_eq!(read_lines(&path), vec!["one", "two"]);
        assert!(!tmp.path().join("svc.log.1").exists());
    }

    #[test]
    fn test_rotation_keeps_triggering_record_exactly_once() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("svc.log");
        // Threshold fits two 10-byte lines; the third write rotates.
        let mut writer = RotatingFileWriter::open(path.clone(), 20, 2).expect("open");
        writer.write_line("aaaaaaaaa").expect("write");
        writer.write_line("bbbbbbbbb").expect("write");
        writer.write_line("ccccccccc").expect("write");
        writer.flush().expect("flush");

        assert_eq!(read_lines(&path), vec!["ccccccccc"]);
        assert_eq!(
            read_lines(&tmp.path().join("svc.log.1")),
            vec!["aaaaaaaaa", "bbbbbbbbb"]
        );
    }

    #[test]
    fn test_backups_never_exceed_backup_count() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("svc.log");
        let mut writer = RotatingFileWriter::open(path.clone(), 20, 2).expect("open");
        for i in 0..50 {
            writer.write_line(&format!("line {i:04}")).expect("write");
        }
        writer.flush().expect("flush");

        assert!(tmp.path().join("svc.log.1").exists());
        assert!(tmp.path().join("svc.log.2").exists());
        assert!(!tmp.path().join("svc.log.3").exists());
    }

    #[test]
    fn test_newest_backup_has_lowest_index() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("svc.log");
        let mut writer = RotatingFileWriter::open(path.clone(), 20, 3).expect("open");
        for i in 0..8 {
            writer.write_line(&format!("line {i:04}")).expect("write");
        }
        writer.flush().expect("flush");

        let current = read_lines(&path);
        let first_backup = read_lines(&tmp.path().join("svc.log.1"));
        let last_current = current.last().expect("current not empty").clone();
        let last_backup = first_backup.last().expect("backup not empty").clone();
        assert!(last_current > last_backup, "{last_current} vs {last_backup}");
    }

    #[test]
    fn test_zero_backup_count_truncates_in_place() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("svc.log");
        let mut writer = RotatingFileWriter::open(path.clone(), 20, 0).expect("open");
        for i in 0..10 {
            writer.write_line(&format!("line {i:04}")).expect("write");
        }
        writer.flush().expect("flush");

        assert!(!tmp.path().join("svc.log.1").exists());
        assert!(read_lines(&path).len() <= 2);
    }

    #[test]
    fn test_reopen_resumes_existing_size() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("svc.log");
        {
            let mut writer = RotatingFileWriter::open(path.clone(), 20, 2).expect("open");
            writer.write_line("aaaaaaaaa").expect("write");
            writer.write_line("bbbbbbbbb").expect("write");
            writer.flush().expect("flush");
        }
        let mut writer = RotatingFileWriter::open(path.clone(), 20, 2).expect("reopen");
        writer.write_line("ccccccccc").expect("write");
        writer.flush().expect("flush");

        assert_eq!(read_lines(&path), vec!["ccccccccc"]);
        assert!(tmp.path().join("svc.log.1").exists());
    }
}
