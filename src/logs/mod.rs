//! Flat-file usage logs.
//!
//! Every tracked event is appended as one CSV row to a per-log file under
//! the data directory. Files are created with a header row on first write;
//! subsequent appends preserve all prior rows. A store-wide mutex
//! serializes appends within this process — cross-process writers are out
//! of scope.

mod records;

pub use records::{
    CompletionRecord, ContentAccessRecord, FeedbackRecord, FeedbackTrendRecord,
    RegistrationRecord, ResolutionTimeRecord, ResponseTimeRecord, TopicRecord,
};

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// The CSV logs kept by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Registration,
    Feedback,
    Topic,
    Completion,
    ResponseTimes,
    ContentAccess,
    ResolutionTimes,
    FeedbackTrends,
}

impl LogKind {
    /// All log kinds, in export order.
    pub const ALL: [Self; 8] = [
        Self::Registration,
        Self::Feedback,
        Self::Topic,
        Self::Completion,
        Self::ResponseTimes,
        Self::ContentAccess,
        Self::ResolutionTimes,
        Self::FeedbackTrends,
    ];

    /// File name of the backing CSV.
    #[must_use]
    pub fn filename(self) -> &'static str {
        match self {
            Self::Registration => "registration_data.csv",
            Self::Feedback => "feedback_data.csv",
            Self::Topic => "topic_data.csv",
            Self::Completion => "completion_data.csv",
            Self::ResponseTimes => "response_times.csv",
            Self::ContentAccess => "content_access.csv",
            Self::ResolutionTimes => "resolution_times.csv",
            Self::FeedbackTrends => "feedback_trends.csv",
        }
    }

    /// Short identifier used in admin routes and export filenames.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Feedback => "feedback",
            Self::Topic => "topic",
            Self::Completion => "completion",
            Self::ResponseTimes => "response-times",
            Self::ContentAccess => "content-access",
            Self::ResolutionTimes => "resolution-times",
            Self::FeedbackTrends => "feedback-trends",
        }
    }

    /// Display name used as an Excel sheet title.
    #[must_use]
    pub fn sheet_name(self) -> &'static str {
        match self {
            Self::Registration => "Registration Data",
            Self::Feedback => "Feedback Data",
            Self::Topic => "Topic Data",
            Self::Completion => "Completion Data",
            Self::ResponseTimes => "Response Times",
            Self::ContentAccess => "Content Access",
            Self::ResolutionTimes => "Resolution Times",
            Self::FeedbackTrends => "Feedback Trends",
        }
    }
}

impl FromStr for LogKind {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.slug() == s)
            .ok_or_else(|| LogError::UnknownKind(s.to_string()))
    }
}

/// Errors raised by the log store.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Unknown log identifier in a request path.
    #[error("unknown log: {0}")]
    UnknownKind(String),

    /// Filesystem failure.
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV row or serialization failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only CSV store rooted at a data directory.
#[derive(Debug)]
pub struct LogStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LogStore {
    /// Open a store, creating the data directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LogError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of a log's backing file.
    #[must_use]
    pub fn path(&self, kind: LogKind) -> PathBuf {
        self.dir.join(kind.filename())
    }

    /// Append exactly one row. The header row is written only when the
    /// file is created by this call.
    pub fn append<R: Serialize>(&self, kind: LogKind, record: &R) -> Result<(), LogError> {
        let _guard = self.write_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let path = self.path(kind);
        let exists = path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(!exists)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        tracing::debug!(
            log = kind.slug(),
            path = %path.display(),
            created = !exists,
            "Appended log row"
        );
        Ok(())
    }

    /// Read every row of a log. A missing file reads as empty.
    pub fn read<R: DeserializeOwned>(&self, kind: LogKind) -> Result<Vec<R>, LogError> {
        let path = self.path(kind);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Raw CSV bytes of a log, if the file exists.
    pub fn raw(&self, kind: LogKind) -> Result<Option<Vec<u8>>, LogError> {
        let path = self.path(kind);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(path)?))
    }

    /// Delete a log's backing file. Returns whether a file was removed.
    pub fn clear(&self, kind: LogKind) -> Result<bool, LogError> {
        let _guard = self.write_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let path = self.path(kind);
        if path.exists() {
            std::fs::remove_file(&path)?;
            tracing::info!(log = kind.slug(), "Cleared log");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Delete every log file. Returns how many files were removed.
    pub fn clear_all(&self) -> Result<usize, LogError> {
        let mut removed = 0;
        for kind in LogKind::ALL {
            if self.clear(kind)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// The store's data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Format an instant as a log timestamp in the given zone
/// (`YYYY-MM-DD HH:MM:SS`).
#[must_use]
pub fn timestamp(at: chrono::DateTime<chrono::Utc>, tz: chrono_tz::Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format an instant as a log date in the given zone (`YYYY-MM-DD`).
#[must_use]
pub fn datestamp(at: chrono::DateTime<chrono::Utc>, tz: chrono_tz::Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d").to_string()
}
