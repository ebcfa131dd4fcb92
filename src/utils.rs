use crate::Result;
use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use std::path::{Path, PathBuf};
use tokio::fs::ReadDir;

/// The format used when writing dates to, and reading dates from, the database.
pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Create a directory and all of its parents if they do not exist.
pub(crate) async fn make_dir(p: &Path) -> Result<()> {
    tokio::fs::create_dir_all(p)
        .await
        .with_context(|| format!("Unable to create directory at {}", p.to_string_lossy()))
}

/// Resolve `p` to an absolute path. The path must exist.
pub(crate) async fn canonicalize(p: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(p)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", p.to_string_lossy()))
}

/// Open a directory for iteration.
pub(crate) async fn read_dir(p: &Path) -> Result<ReadDir> {
    tokio::fs::read_dir(p)
        .await
        .with_context(|| format!("Unable to read directory {}", p.display()))
}

/// Copy the file at `from` to `to`, overwriting `to` if it exists.
pub(crate) async fn copy(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    let (from, to) = (from.as_ref(), to.as_ref());
    tokio::fs::copy(from, to).await.with_context(|| {
        format!(
            "Unable to copy file from '{}' to '{}'",
            from.to_string_lossy(),
            to.to_string_lossy()
        )
    })?;
    Ok(())
}

/// Delete a file.
pub(crate) async fn remove(p: &Path) -> Result<()> {
    tokio::fs::remove_file(p)
        .await
        .with_context(|| format!("Unable to remove file {}", p.display()))
}

/// Parses a user-supplied date. Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and
/// `YYYY-MM-DDTHH:MM:SS`. A date without a time is taken to be midnight.
pub fn parse_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT) {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| {
        format!("Invalid date '{s}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")
    })?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// The current local time truncated to whole seconds, which is the resolution stored in the
/// database.
pub(crate) fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_date_only() {
        let dt = parse_date("2025-01-05").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2025, 1, 5));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (0, 0, 0));
    }

    #[test]
    fn test_parse_date_with_time() {
        let a = parse_date("2025-01-05 13:45:10").unwrap();
        let b = parse_date("2025-01-05T13:45:10").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hour(), 13);
    }

    #[test]
    fn test_parse_date_bad() {
        assert!(parse_date("05/01/2025").is_err());
        assert!(parse_date("").is_err());
    }

    #[tokio::test]
    async fn test_copy_and_remove() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        write(&a, "hello").await.unwrap();
        copy(&a, &b).await.unwrap();
        assert_eq!(read(&b).await.unwrap(), "hello");
        remove(&a).await.unwrap();
        assert!(!a.exists());
    }
}
