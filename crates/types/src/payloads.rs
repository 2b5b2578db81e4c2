//! Serde mirrors of the upstream JSON documents.
//!
//! Only the fields the workflows read are modelled. The upstream service
//! returns `null` for many string fields (online sections have no room or
//! meeting time), so string fields decode `null` as an empty string.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::state::RegistrationModel;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Entry of the public term list.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Term {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Class search response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Section>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, deserialize_with = "null_as_default")]
    pub term_desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sequence_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub maximum_enrollment: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enrollment: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seats_available: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wait_available: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub faculty: Vec<Faculty>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meetings_faculty: Vec<MeetingFaculty>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_reference_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingFaculty {
    #[serde(default, deserialize_with = "null_as_default")]
    pub meeting_time: MeetingTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTime {
    #[serde(default, deserialize_with = "null_as_default")]
    pub begin_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meeting_type_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub room: String,
}

/// Registration eligibility for the selected term.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub student_elig_failures: Vec<String>,
}

/// Response to adding a single registration item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddItemResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: RegistrationModel,
}

/// Batch submission request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchUpdate<'a> {
    pub update: Vec<&'a RegistrationModel>,
}

/// Batch submission response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchChanges {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: BatchChangeData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchChangeData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub update: Vec<ChangedItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_reference_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub crn_errors: Vec<CrnError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrnError {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

/// Degree-audit student lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(rename = "_embedded", default, deserialize_with = "null_as_default")]
    pub embedded: EmbeddedStudents,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddedStudents {
    #[serde(default, deserialize_with = "null_as_default")]
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Student {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub goals: Vec<Goal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Goal {
    #[serde(default, deserialize_with = "null_as_default")]
    pub school: KeyDescription,
    #[serde(default, deserialize_with = "null_as_default")]
    pub degree: KeyDescription,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyDescription {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Degree audit document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub class_information: ClassInformation,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInformation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub class_array: Vec<AuditClass>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditClass {
    #[serde(default, deserialize_with = "null_as_default")]
    pub term_literal_long: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discipline: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub letter_grade: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub credits: String,
}
