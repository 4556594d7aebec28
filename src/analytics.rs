//! Dashboard aggregations over the CSV logs.
//!
//! Pure functions from record slices to serializable summaries; all file
//! I/O stays in [`crate::logs`]. Timestamps in the logs are local campus
//! time (`YYYY-MM-DD HH:MM:SS`); rows with unparseable timestamps are
//! skipped rather than failing a whole report.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

use crate::logs::{
    CompletionRecord, FeedbackRecord, RegistrationRecord, ResponseTimeRecord, TopicRecord,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_ts(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Overview
// ─────────────────────────────────────────────────────────────────────────────

/// Headline metrics for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total_registrations: usize,
    pub total_usage_minutes: f64,
    pub avg_session_minutes: f64,
    pub unique_students: usize,
    pub return_users: usize,
    pub return_rate: f64,
    pub avg_sessions_per_student: f64,
}

/// Compute the headline metrics.
#[must_use]
pub fn overview(rows: &[RegistrationRecord]) -> Overview {
    let total = rows.len();
    let total_minutes: f64 = rows.iter().map(|r| r.usage_time_minutes).sum();

    let mut sessions_per_student: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *sessions_per_student.entry(row.full_name.as_str()).or_default() += 1;
    }
    let unique = sessions_per_student.len();
    let returning = sessions_per_student.values().filter(|&&n| n > 1).count();

    Overview {
        total_registrations: total,
        total_usage_minutes: total_minutes,
        avg_session_minutes: if total > 0 {
            total_minutes / total as f64
        } else {
            0.0
        },
        unique_students: unique,
        return_users: returning,
        return_rate: if unique > 0 {
            returning as f64 / unique as f64
        } else {
            0.0
        },
        avg_sessions_per_student: if unique > 0 {
            total as f64 / unique as f64
        } else {
            0.0
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Usage trends
// ─────────────────────────────────────────────────────────────────────────────

/// Per-day registration and usage totals.
#[derive(Debug, Clone, Serialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub registrations: usize,
    pub total_minutes: f64,
    pub avg_minutes: f64,
}

/// Daily registration/usage trend, sorted by date.
#[must_use]
pub fn daily_stats(rows: &[RegistrationRecord]) -> Vec<DailyStat> {
    let mut by_date: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for row in rows {
        if let Some(ts) = parse_ts(&row.timestamp) {
            let entry = by_date.entry(ts.date()).or_default();
            entry.0 += 1;
            entry.1 += row.usage_time_minutes;
        }
    }

    by_date
        .into_iter()
        .map(|(date, (count, minutes))| DailyStat {
            date,
            registrations: count,
            total_minutes: minutes,
            avg_minutes: minutes / count as f64,
        })
        .collect()
}

/// Session count and average length for one weekday.
#[derive(Debug, Clone, Serialize)]
pub struct WeekdayStat {
    pub day: String,
    pub sessions: usize,
    pub avg_minutes: f64,
}

/// Weekly usage pattern, Monday through Sunday.
#[must_use]
pub fn weekday_stats(rows: &[RegistrationRecord]) -> Vec<WeekdayStat> {
    const ORDER: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    let mut by_day: HashMap<Weekday, (usize, f64)> = HashMap::new();
    for row in rows {
        if let Some(ts) = parse_ts(&row.timestamp) {
            let entry = by_day.entry(ts.weekday()).or_default();
            entry.0 += 1;
            entry.1 += row.usage_time_minutes;
        }
    }

    ORDER
        .into_iter()
        .map(|day| {
            let (sessions, minutes) = by_day.get(&day).copied().unwrap_or_default();
            WeekdayStat {
                day: day.to_string(),
                sessions,
                avg_minutes: if sessions > 0 {
                    minutes / sessions as f64
                } else {
                    0.0
                },
            }
        })
        .collect()
}

/// Session count and average length for one hour of day.
#[derive(Debug, Clone, Serialize)]
pub struct HourlyStat {
    pub hour: u32,
    pub sessions: usize,
    pub avg_minutes: f64,
}

/// Hour-of-day distribution (only hours with sessions are returned).
#[must_use]
pub fn hourly_stats(rows: &[RegistrationRecord]) -> Vec<HourlyStat> {
    let mut by_hour: BTreeMap<u32, (usize, f64)> = BTreeMap::new();
    for row in rows {
        if let Some(ts) = parse_ts(&row.timestamp) {
            let entry = by_hour.entry(ts.hour()).or_default();
            entry.0 += 1;
            entry.1 += row.usage_time_minutes;
        }
    }

    by_hour
        .into_iter()
        .map(|(hour, (sessions, minutes))| HourlyStat {
            hour,
            sessions,
            avg_minutes: minutes / sessions as f64,
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Engagement
// ─────────────────────────────────────────────────────────────────────────────

/// Per-student engagement profile.
#[derive(Debug, Clone, Serialize)]
pub struct EngagementStat {
    pub full_name: String,
    pub total_sessions: usize,
    pub total_minutes: f64,
    pub days_active: usize,
    /// Days between first and last session, inclusive.
    pub span_days: i64,
    pub sessions_per_day: f64,
    /// Active days divided by span days, 0-1.
    pub consistency_score: f64,
}

/// Engagement profile for every student, sorted by name.
#[must_use]
pub fn engagement(rows: &[RegistrationRecord]) -> Vec<EngagementStat> {
    let mut by_student: BTreeMap<&str, Vec<&RegistrationRecord>> = BTreeMap::new();
    for row in rows {
        by_student.entry(row.full_name.as_str()).or_default().push(row);
    }

    by_student
        .into_iter()
        .map(|(name, sessions)| student_engagement(name, &sessions))
        .collect()
}

fn student_engagement(name: &str, sessions: &[&RegistrationRecord]) -> EngagementStat {
    let total_sessions = sessions.len();
    let total_minutes: f64 = sessions.iter().map(|r| r.usage_time_minutes).sum();

    let dates: Vec<NaiveDate> = sessions
        .iter()
        .filter_map(|r| parse_ts(&r.timestamp).map(|ts| ts.date()))
        .collect();
    let days_active = dates.iter().collect::<HashSet<_>>().len();
    let span_days = match (dates.iter().min(), dates.iter().max()) {
        (Some(min), Some(max)) => (*max - *min).num_days() + 1,
        _ => 0,
    };

    EngagementStat {
        full_name: name.to_string(),
        total_sessions,
        total_minutes,
        days_active,
        span_days,
        sessions_per_day: if span_days > 0 {
            total_sessions as f64 / span_days as f64
        } else {
            0.0
        },
        consistency_score: if span_days > 0 {
            days_active as f64 / span_days as f64
        } else {
            0.0
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Topics, feedback, completion, response times
// ─────────────────────────────────────────────────────────────────────────────

/// Occurrence count for one topic.
#[derive(Debug, Clone, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

/// Most common topics, ties broken alphabetically.
#[must_use]
pub fn topic_counts(rows: &[TopicRecord], top_n: usize) -> Vec<TopicCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.topic.as_str()).or_default() += 1;
    }

    let mut out: Vec<TopicCount> = counts
        .into_iter()
        .map(|(topic, count)| TopicCount {
            topic: topic.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));
    out.truncate(top_n);
    out
}

/// Average reported difficulty for one topic.
#[derive(Debug, Clone, Serialize)]
pub struct TopicDifficulty {
    pub topic: String,
    pub avg_difficulty: f64,
}

/// Topics ranked by average difficulty, hardest first.
#[must_use]
pub fn topic_difficulty(rows: &[TopicRecord], top_n: usize) -> Vec<TopicDifficulty> {
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for row in rows {
        if let Some(d) = row.difficulty {
            let entry = sums.entry(row.topic.as_str()).or_default();
            entry.0 += f64::from(d);
            entry.1 += 1;
        }
    }

    let mut out: Vec<TopicDifficulty> = sums
        .into_iter()
        .map(|(topic, (sum, n))| TopicDifficulty {
            topic: topic.to_string(),
            avg_difficulty: sum / n as f64,
        })
        .collect();
    out.sort_by(|a, b| {
        b.avg_difficulty
            .total_cmp(&a.avg_difficulty)
            .then_with(|| a.topic.cmp(&b.topic))
    });
    out.truncate(top_n);
    out
}

/// Session-rating distribution.
#[derive(Debug, Clone, Serialize)]
pub struct RatingSummary {
    pub average: f64,
    /// Counts for ratings 1 through 5.
    pub histogram: [usize; 5],
    pub total: usize,
}

/// Average rating and 1-5 histogram.
#[must_use]
pub fn rating_summary(rows: &[FeedbackRecord]) -> RatingSummary {
    let mut histogram = [0usize; 5];
    let mut sum = 0u32;
    let mut total = 0usize;
    for row in rows {
        if (1..=5).contains(&row.rating) {
            histogram[usize::from(row.rating) - 1] += 1;
            sum += u32::from(row.rating);
            total += 1;
        }
    }

    RatingSummary {
        average: if total > 0 {
            f64::from(sum) / total as f64
        } else {
            0.0
        },
        histogram,
        total,
    }
}

/// Completion rate for one course.
#[derive(Debug, Clone, Serialize)]
pub struct CourseCompletion {
    pub course_id: String,
    pub sessions: usize,
    pub completion_rate: f64,
}

/// Overall and per-course completion rates.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionSummary {
    pub completion_rate: f64,
    pub total_completed: usize,
    pub total: usize,
    pub by_course: Vec<CourseCompletion>,
}

/// Completion summary across all completion rows.
#[must_use]
pub fn completion_summary(rows: &[CompletionRecord]) -> CompletionSummary {
    let total = rows.len();
    let completed = rows.iter().filter(|r| r.completed).count();

    let mut by_course: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for row in rows {
        let entry = by_course.entry(row.course_id.as_str()).or_default();
        entry.0 += 1;
        if row.completed {
            entry.1 += 1;
        }
    }

    CompletionSummary {
        completion_rate: if total > 0 {
            completed as f64 / total as f64
        } else {
            0.0
        },
        total_completed: completed,
        total,
        by_course: by_course
            .into_iter()
            .map(|(course_id, (sessions, done))| CourseCompletion {
                course_id: course_id.to_string(),
                sessions,
                completion_rate: done as f64 / sessions as f64,
            })
            .collect(),
    }
}

/// Assistant latency summary.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseTimeSummary {
    pub average_seconds: f64,
    pub max_seconds: f64,
    pub count: usize,
}

/// Average and worst-case response latency.
#[must_use]
pub fn response_time_summary(rows: &[ResponseTimeRecord]) -> ResponseTimeSummary {
    let count = rows.len();
    let sum: f64 = rows.iter().map(|r| r.response_time).sum();
    let max = rows
        .iter()
        .map(|r| r.response_time)
        .fold(0.0_f64, f64::max);

    ResponseTimeSummary {
        average_seconds: if count > 0 { sum / count as f64 } else { 0.0 },
        max_seconds: max,
        count,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Demographics
// ─────────────────────────────────────────────────────────────────────────────

/// A labeled count in a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
}

/// Registration distributions by campus, major, grade, and professor.
#[derive(Debug, Clone, Serialize)]
pub struct Demographics {
    pub by_campus: Vec<CountEntry>,
    pub by_major: Vec<CountEntry>,
    pub by_grade: Vec<CountEntry>,
    pub by_professor: Vec<CountEntry>,
}

fn distribution<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<CountEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut out: Vec<CountEntry> = counts
        .into_iter()
        .map(|(label, count)| CountEntry {
            label: label.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    out
}

/// Compute all four registration distributions.
#[must_use]
pub fn demographics(rows: &[RegistrationRecord]) -> Demographics {
    Demographics {
        by_campus: distribution(rows.iter().map(|r| r.campus.as_str())),
        by_major: distribution(rows.iter().map(|r| r.major.as_str())),
        by_grade: distribution(rows.iter().map(|r| r.grade.as_str())),
        by_professor: distribution(rows.iter().map(|r| r.professor.as_str())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Academic calendar
// ─────────────────────────────────────────────────────────────────────────────

/// Semester classification of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemesterLabel {
    pub semester: String,
    pub year: String,
}

/// 2024-25 academic calendar terms as (start, end, semester, year).
const SEMESTERS: [(&str, &str, &str, &str); 4] = [
    ("2024-08-26", "2024-12-18", "Fall", "2024"),
    ("2025-01-02", "2025-01-20", "Winter", "2025"),
    ("2025-01-21", "2025-05-13", "Spring", "2025"),
    ("2025-05-19", "2025-08-09", "Summer", "2025"),
];

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("calendar constant")
}

/// Classify a date against the academic calendar, labeling the gaps
/// between terms.
#[must_use]
pub fn semester_for(day: NaiveDate) -> SemesterLabel {
    for (start, end, semester, year) in SEMESTERS {
        if day >= date(start) && day <= date(end) {
            return SemesterLabel {
                semester: semester.to_string(),
                year: year.to_string(),
            };
        }
    }

    let label = |semester: &str, year: &str| SemesterLabel {
        semester: semester.to_string(),
        year: year.to_string(),
    };

    if day < date("2024-08-26") {
        label("Pre-Fall", "2024")
    } else if day < date("2025-01-02") {
        label("Winter-Break", "2024-2025")
    } else if day < date("2025-01-21") {
        label("Winter-Spring-Break", "2025")
    } else if day < date("2025-05-19") {
        label("Spring-Summer-Break", "2025")
    } else {
        label("Post-Summer", "2025")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Student success scoring
// ─────────────────────────────────────────────────────────────────────────────

/// Normalized 0-1 factors feeding the success score.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessFactors {
    /// Total hours capped at 10, scaled to 0-1.
    pub usage_score: f64,
    pub consistency_score: f64,
    pub mastery_score: f64,
    pub satisfaction_score: f64,
    pub engagement_trend: f64,
}

/// Success prediction for one student.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessPrediction {
    pub full_name: String,
    pub semester: SemesterLabel,
    pub success_probability: f64,
    pub risk_level: String,
    pub factors: SuccessFactors,
    pub avg_satisfaction: f64,
    pub recommendations: Vec<String>,
    pub strengths: Vec<String>,
}

const FACTOR_WEIGHTS: [(&str, f64); 5] = [
    ("usage_score", 0.25),
    ("consistency_score", 0.25),
    ("mastery_score", 0.20),
    ("satisfaction_score", 0.15),
    ("engagement_trend", 0.15),
];

/// Score a student's likelihood of success from their usage, feedback,
/// topic, and completion history.
#[must_use]
pub fn predict_success(
    full_name: &str,
    registrations: &[RegistrationRecord],
    feedback: &[FeedbackRecord],
    topics: &[TopicRecord],
    completions: &[CompletionRecord],
    today: NaiveDate,
) -> SuccessPrediction {
    let sessions: Vec<&RegistrationRecord> = registrations
        .iter()
        .filter(|r| r.full_name == full_name)
        .collect();
    let course_ids: HashSet<&str> = sessions.iter().map(|r| r.course_id.as_str()).collect();

    let engagement = student_engagement(full_name, &sessions);
    let total_hours = engagement.total_minutes / 60.0;

    let student_feedback: Vec<&FeedbackRecord> = feedback
        .iter()
        .filter(|f| course_ids.contains(f.course_id.as_str()))
        .collect();
    let avg_satisfaction = if student_feedback.is_empty() {
        0.0
    } else {
        student_feedback.iter().map(|f| f64::from(f.rating)).sum::<f64>()
            / student_feedback.len() as f64
    };

    let mastery = topic_mastery(&course_ids, topics, completions);
    let mastery_score = if mastery.is_empty() {
        0.0
    } else {
        mastery.values().sum::<f64>() / mastery.len() as f64
    };

    let trend = engagement_trend(&sessions);

    let factors = SuccessFactors {
        usage_score: (total_hours / 10.0).min(1.0),
        consistency_score: engagement.consistency_score,
        mastery_score,
        satisfaction_score: if avg_satisfaction > 0.0 {
            avg_satisfaction / 5.0
        } else {
            0.0
        },
        engagement_trend: if trend > -1.0 { (trend + 1.0) / 2.0 } else { 0.0 },
    };

    let values = [
        factors.usage_score,
        factors.consistency_score,
        factors.mastery_score,
        factors.satisfaction_score,
        factors.engagement_trend,
    ];
    let probability: f64 = values
        .iter()
        .zip(FACTOR_WEIGHTS.iter())
        .map(|(v, (_, w))| v * w)
        .sum();

    let risk_level = if probability >= 0.7 {
        "Low"
    } else if probability >= 0.4 {
        "Medium"
    } else {
        "High"
    };

    let mut recommendations = Vec::new();
    if factors.usage_score < 0.6 {
        recommendations.push("Increase total usage time".to_string());
    }
    if factors.consistency_score < 0.6 {
        recommendations.push("Maintain more regular study sessions".to_string());
    }
    if factors.mastery_score < 0.6 {
        recommendations.push("Focus on completing more topics".to_string());
    }
    if factors.satisfaction_score < 0.6 {
        recommendations.push("Engage more actively with the content".to_string());
    }
    if factors.engagement_trend < 0.5 {
        recommendations.push("Increase weekly engagement".to_string());
    }

    let strengths = FACTOR_WEIGHTS
        .iter()
        .zip(values.iter())
        .filter(|(_, v)| **v >= 0.8)
        .map(|((name, _), _)| (*name).to_string())
        .collect();

    SuccessPrediction {
        full_name: full_name.to_string(),
        semester: semester_for(today),
        success_probability: probability,
        risk_level: risk_level.to_string(),
        factors,
        avg_satisfaction,
        recommendations,
        strengths,
    }
}

/// Per-topic mastery: 0.7 x completion rate + 0.3 x (avg difficulty / 5),
/// over the topics raised in the student's courses.
fn topic_mastery(
    course_ids: &HashSet<&str>,
    topics: &[TopicRecord],
    completions: &[CompletionRecord],
) -> HashMap<String, f64> {
    let mut attempts: HashMap<&str, (usize, f64)> = HashMap::new();
    for topic in topics {
        if course_ids.contains(topic.course_id.as_str()) {
            let entry = attempts.entry(topic.topic.as_str()).or_default();
            entry.0 += 1;
            entry.1 += f64::from(topic.difficulty.unwrap_or(0));
        }
    }

    let completed = completions
        .iter()
        .filter(|c| c.completed && course_ids.contains(c.course_id.as_str()))
        .count();

    attempts
        .into_iter()
        .map(|(topic, (n, difficulty_sum))| {
            let completion_rate = (completed.min(n)) as f64 / n as f64;
            let avg_difficulty = difficulty_sum / n as f64;
            (
                topic.to_string(),
                completion_rate * 0.7 + (avg_difficulty / 5.0) * 0.3,
            )
        })
        .collect()
}

/// Mean week-over-week change in session count, as a fraction.
fn engagement_trend(sessions: &[&RegistrationRecord]) -> f64 {
    let mut by_week: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for row in sessions {
        if let Some(ts) = parse_ts(&row.timestamp) {
            let week = ts.date().iso_week();
            *by_week.entry((week.year(), week.week())).or_default() += 1;
        }
    }

    if by_week.len() < 2 {
        return 0.0;
    }

    let counts: Vec<f64> = by_week.values().map(|&n| n as f64).collect();
    let changes: Vec<f64> = counts
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if changes.is_empty() {
        0.0
    } else {
        changes.iter().sum::<f64>() / changes.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(name: &str, ts: &str, minutes: f64) -> RegistrationRecord {
        RegistrationRecord {
            timestamp: ts.to_string(),
            full_name: name.to_string(),
            grade: "Junior".to_string(),
            campus: "Florham".to_string(),
            major: "Accounting".to_string(),
            course_name: "Intermediate Accounting".to_string(),
            course_id: "ACCT_2021_01".to_string(),
            professor: "Dr. Byron".to_string(),
            usage_time_minutes: minutes,
        }
    }

    #[test]
    fn test_overview_counts_return_users() {
        let rows = vec![
            reg("Ada", "2025-03-10 11:00:00", 30.0),
            reg("Ada", "2025-03-11 11:00:00", 20.0),
            reg("Grace", "2025-03-10 12:00:00", 10.0),
        ];
        let o = overview(&rows);
        assert_eq!(o.total_registrations, 3);
        assert_eq!(o.unique_students, 2);
        assert_eq!(o.return_users, 1);
        assert!((o.return_rate - 0.5).abs() < f64::EPSILON);
        assert!((o.total_usage_minutes - 60.0).abs() < f64::EPSILON);
        assert!((o.avg_session_minutes - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overview_empty() {
        let o = overview(&[]);
        assert_eq!(o.total_registrations, 0);
        assert_eq!(o.return_rate, 0.0);
        assert_eq!(o.avg_session_minutes, 0.0);
    }

    #[test]
    fn test_daily_stats_sorted_and_grouped() {
        let rows = vec![
            reg("Ada", "2025-03-11 09:00:00", 10.0),
            reg("Ada", "2025-03-10 11:00:00", 30.0),
            reg("Grace", "2025-03-10 12:00:00", 10.0),
        ];
        let daily = daily_stats(&rows);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date.to_string(), "2025-03-10");
        assert_eq!(daily[0].registrations, 2);
        assert!((daily[0].avg_minutes - 20.0).abs() < f64::EPSILON);
        assert_eq!(daily[1].registrations, 1);
    }

    #[test]
    fn test_weekday_stats_ordered_mon_to_sun() {
        // 2025-03-10 is a Monday, 2025-03-15 a Saturday.
        let rows = vec![
            reg("Ada", "2025-03-10 11:00:00", 30.0),
            reg("Grace", "2025-03-15 12:00:00", 10.0),
        ];
        let weekly = weekday_stats(&rows);
        assert_eq!(weekly.len(), 7);
        assert_eq!(weekly[0].day, "Mon");
        assert_eq!(weekly[0].sessions, 1);
        assert_eq!(weekly[5].day, "Sat");
        assert_eq!(weekly[5].sessions, 1);
        assert_eq!(weekly[6].sessions, 0);
    }

    #[test]
    fn test_hourly_stats() {
        let rows = vec![
            reg("Ada", "2025-03-10 11:00:00", 30.0),
            reg("Ada", "2025-03-11 11:30:00", 10.0),
            reg("Grace", "2025-03-10 14:00:00", 10.0),
        ];
        let hourly = hourly_stats(&rows);
        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly[0].hour, 11);
        assert_eq!(hourly[0].sessions, 2);
        assert!((hourly[0].avg_minutes - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_engagement_consistency() {
        // Three sessions over a five-day span, two distinct days.
        let rows = vec![
            reg("Ada", "2025-03-10 09:00:00", 30.0),
            reg("Ada", "2025-03-10 15:00:00", 30.0),
            reg("Ada", "2025-03-14 09:00:00", 30.0),
        ];
        let stats = engagement(&rows);
        assert_eq!(stats.len(), 1);
        let ada = &stats[0];
        assert_eq!(ada.total_sessions, 3);
        assert_eq!(ada.days_active, 2);
        assert_eq!(ada.span_days, 5);
        assert!((ada.consistency_score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_topic_counts_and_difficulty() {
        let rows = vec![
            TopicRecord {
                timestamp: "2025-03-10 11:00:00".to_string(),
                course_id: "ACCT_2021_01".to_string(),
                topic: "ratios".to_string(),
                difficulty: Some(4),
            },
            TopicRecord {
                timestamp: "2025-03-10 12:00:00".to_string(),
                course_id: "ACCT_2021_01".to_string(),
                topic: "ratios".to_string(),
                difficulty: Some(2),
            },
            TopicRecord {
                timestamp: "2025-03-10 13:00:00".to_string(),
                course_id: "FIN_3250_02".to_string(),
                topic: "tvm".to_string(),
                difficulty: Some(5),
            },
        ];

        let counts = topic_counts(&rows, 10);
        assert_eq!(counts[0].topic, "ratios");
        assert_eq!(counts[0].count, 2);

        let difficulty = topic_difficulty(&rows, 10);
        assert_eq!(difficulty[0].topic, "tvm");
        assert!((difficulty[1].avg_difficulty - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rating_summary_histogram() {
        let rows = vec![
            FeedbackRecord {
                timestamp: "2025-03-10 11:00:00".to_string(),
                course_id: "ACCT_2021_01".to_string(),
                rating: 5,
                topic: "ratios".to_string(),
                difficulty: 3,
            },
            FeedbackRecord {
                timestamp: "2025-03-10 12:00:00".to_string(),
                course_id: "ACCT_2021_01".to_string(),
                rating: 3,
                topic: "tvm".to_string(),
                difficulty: 2,
            },
        ];
        let summary = rating_summary(&rows);
        assert_eq!(summary.total, 2);
        assert!((summary.average - 4.0).abs() < f64::EPSILON);
        assert_eq!(summary.histogram, [0, 0, 1, 0, 1]);
    }

    #[test]
    fn test_completion_summary_by_course() {
        let row = |course: &str, completed: bool| CompletionRecord {
            timestamp: "2025-03-10 11:00:00".to_string(),
            course_id: course.to_string(),
            completed,
        };
        let rows = vec![
            row("ACCT_2021_01", true),
            row("ACCT_2021_01", false),
            row("FIN_3250_02", true),
        ];
        let summary = completion_summary(&rows);
        assert_eq!(summary.total_completed, 2);
        assert!((summary.completion_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.by_course.len(), 2);
        assert!((summary.by_course[0].completion_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_demographics_sorted_by_count() {
        let mut rows = vec![
            reg("Ada", "2025-03-10 11:00:00", 30.0),
            reg("Grace", "2025-03-10 12:00:00", 10.0),
        ];
        rows[1].campus = "Metro".to_string();
        rows.push(reg("Hopper", "2025-03-11 12:00:00", 10.0));

        let demo = demographics(&rows);
        assert_eq!(demo.by_campus[0].label, "Florham");
        assert_eq!(demo.by_campus[0].count, 2);
        assert_eq!(demo.by_campus[1].label, "Metro");
    }

    #[test]
    fn test_semester_classification() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(semester_for(d("2024-10-01")).semester, "Fall");
        assert_eq!(semester_for(d("2025-01-10")).semester, "Winter");
        assert_eq!(semester_for(d("2025-03-10")).semester, "Spring");
        assert_eq!(semester_for(d("2025-06-01")).semester, "Summer");
        assert_eq!(semester_for(d("2024-12-25")).semester, "Winter-Break");
        assert_eq!(semester_for(d("2025-09-01")).semester, "Post-Summer");
    }

    #[test]
    fn test_predict_success_bands_risk() {
        let d = NaiveDate::parse_from_str("2025-03-10", "%Y-%m-%d").unwrap();

        // No history at all: high risk.
        let p = predict_success("Nobody", &[], &[], &[], &[], d);
        assert_eq!(p.risk_level, "High");
        assert!(p.success_probability < 0.4);
        assert!(!p.recommendations.is_empty());

        // Heavy, consistent usage with good feedback: lower risk.
        let mut regs = Vec::new();
        for day in 10..17 {
            regs.push(reg("Ada", &format!("2025-03-{day} 11:00:00"), 120.0));
        }
        let feedback = vec![FeedbackRecord {
            timestamp: "2025-03-12 11:00:00".to_string(),
            course_id: "ACCT_2021_01".to_string(),
            rating: 5,
            topic: "ratios".to_string(),
            difficulty: 3,
        }];
        let topics = vec![TopicRecord {
            timestamp: "2025-03-12 11:00:00".to_string(),
            course_id: "ACCT_2021_01".to_string(),
            topic: "ratios".to_string(),
            difficulty: Some(4),
        }];
        let completions = vec![CompletionRecord {
            timestamp: "2025-03-12 11:30:00".to_string(),
            course_id: "ACCT_2021_01".to_string(),
            completed: true,
        }];
        let p = predict_success("Ada", &regs, &feedback, &topics, &completions, d);
        assert!(p.success_probability > 0.6, "got {}", p.success_probability);
        assert!(p.factors.usage_score >= 1.0 - f64::EPSILON);
        assert_eq!(p.semester.semester, "Spring");
    }
}
