//! Row types collected by domain steps and handed to the export collaborator.

use serde::{Deserialize, Serialize};

/// One meeting of one section as shown by the class search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub term: String,
    pub course_reference_number: String,
    pub subject: String,
    pub course_number: String,
    pub sequence_number: String,
    pub course_title: String,
    pub display_name: String,
    pub begin_time: String,
    pub end_time: String,
    pub start_date: String,
    pub end_date: String,
    pub meeting_type: String,
    pub room: String,
    pub maximum_enrollment: i64,
    pub enrollment: i64,
    pub seats_available: i64,
    pub wait_available: i64,
}

/// One completed or in-progress class from a degree audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub term: String,
    pub section: String,
    pub number: String,
    pub course_title: String,
    pub letter_grade: String,
    pub credits: String,
}

/// A collected row. A single run only ever collects one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Course(CourseRecord),
    Transcript(TranscriptRecord),
}

impl CourseRecord {
    /// Export column names, in [`Record::fields`] order.
    pub const HEADER: &'static [&'static str] = &[
        "Term",
        "Course Reference Number",
        "Subject",
        "Course Number",
        "Sequence Number",
        "Course Title",
        "Display Name",
        "Begin Time",
        "End Time",
        "Start Date",
        "End Date",
        "Meeting Type",
        "Room",
        "Maximum Enrollment",
        "Enrollment",
        "Seats Available",
        "Waitlist Available",
    ];
}

impl TranscriptRecord {
    /// Export column names, in [`Record::fields`] order.
    pub const HEADER: &'static [&'static str] = &["Term", "Section", "Number", "Course Title", "Letter Grade", "Credits"];
}

impl Record {
    /// Column names for this kind of row.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Record::Course(_) => CourseRecord::HEADER,
            Record::Transcript(_) => TranscriptRecord::HEADER,
        }
    }

    /// Cell values, in header order.
    pub fn fields(&self) -> Vec<String> {
        match self {
            Record::Course(course) => vec![
                course.term.clone(),
                course.course_reference_number.clone(),
                course.subject.clone(),
                course.course_number.clone(),
                course.sequence_number.clone(),
                course.course_title.clone(),
                course.display_name.clone(),
                course.begin_time.clone(),
                course.end_time.clone(),
                course.start_date.clone(),
                course.end_date.clone(),
                course.meeting_type.clone(),
                course.room.clone(),
                course.maximum_enrollment.to_string(),
                course.enrollment.to_string(),
                course.seats_available.to_string(),
                course.wait_available.to_string(),
            ],
            Record::Transcript(entry) => vec![
                entry.term.clone(),
                entry.section.clone(),
                entry.number.clone(),
                entry.course_title.clone(),
                entry.letter_grade.clone(),
                entry.credits.clone(),
            ],
        }
    }
}

impl From<CourseRecord> for Record {
    fn from(value: CourseRecord) -> Self {
        Record::Course(value)
    }
}

impl From<TranscriptRecord> for Record {
    fn from(value: TranscriptRecord) -> Self {
        Record::Transcript(value)
    }
}
