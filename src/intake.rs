//! Registration intake: form domain types and validation.
//!
//! Students register before chatting. The form mirrors the campus intake
//! sheet: name, grade, campus, major, the course they need help with, a
//! department course ID, and the professor's name.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Course IDs look like `ACCT_2021_01`: one of the five supported
/// department prefixes, four digits, a section number.
static COURSE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ACCT|ECON|FIN|MIS|WMA)_\d{4}_\d{2}$").unwrap());

/// Class standing options offered on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Freshman,
    Sophomore,
    Junior,
    Senior,
    Graduate,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Freshman => "Freshman",
            Self::Sophomore => "Sophomore",
            Self::Junior => "Junior",
            Self::Senior => "Senior",
            Self::Graduate => "Graduate",
        };
        write!(f, "{s}")
    }
}

/// Campus options offered on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Campus {
    Florham,
    Metro,
    Vancouver,
}

impl fmt::Display for Campus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Florham => "Florham",
            Self::Metro => "Metro",
            Self::Vancouver => "Vancouver",
        };
        write!(f, "{s}")
    }
}

/// Majors served by the tutoring chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Major {
    Accounting,
    Finance,
    #[serde(rename = "MIS [Management Information Systems]")]
    ManagementInformationSystems,
}

impl fmt::Display for Major {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Accounting => "Accounting",
            Self::Finance => "Finance",
            Self::ManagementInformationSystems => "MIS [Management Information Systems]",
        };
        write!(f, "{s}")
    }
}

/// A validated course identifier (`DEPT_####_##`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseId(String);

impl CourseId {
    /// Validate and wrap a raw course ID.
    pub fn parse(raw: &str) -> Result<Self, IntakeError> {
        if COURSE_ID_RE.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(IntakeError::InvalidCourseId(raw.to_string()))
        }
    }

    /// The validated identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CourseId {
    type Error = IntakeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CourseId> for String {
    fn from(id: CourseId) -> Self {
        id.0
    }
}

/// Validation failures for the registration form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntakeError {
    /// A required field was left blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The course ID did not match `(ACCT|ECON|FIN|MIS|WMA)_####_##`.
    #[error(
        "invalid course ID {0:?}: expected ACCT_####_##, ECON_####_##, FIN_####_##, MIS_####_## or WMA_####_##"
    )]
    InvalidCourseId(String),
}

/// The raw registration form as submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub full_name: String,
    pub grade: Grade,
    pub campus: Campus,
    pub major: Major,
    #[serde(default)]
    pub course_name: String,
    pub course_id: String,
    pub professor: String,
}

impl RegistrationForm {
    /// Validate the form into a student profile.
    ///
    /// Full name, course ID, and professor are required; the course ID must
    /// match the department pattern.
    pub fn validate(self) -> Result<StudentProfile, IntakeError> {
        if self.full_name.trim().is_empty() {
            return Err(IntakeError::MissingField("full_name"));
        }
        if self.course_id.trim().is_empty() {
            return Err(IntakeError::MissingField("course_id"));
        }
        if self.professor.trim().is_empty() {
            return Err(IntakeError::MissingField("professor"));
        }
        let course_id = CourseId::parse(self.course_id.trim())?;

        Ok(StudentProfile {
            full_name: self.full_name.trim().to_string(),
            grade: self.grade,
            campus: self.campus,
            major: self.major,
            course_name: self.course_name.trim().to_string(),
            course_id,
            professor: self.professor.trim().to_string(),
        })
    }
}

/// A registered student's validated intake answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub full_name: String,
    pub grade: Grade,
    pub campus: Campus,
    pub major: Major,
    pub course_name: String,
    pub course_id: CourseId,
    pub professor: String,
}
