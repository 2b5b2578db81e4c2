//! Degree-audit transcript export.

use tracing::info;
use veil_api::HttpRequest;
use veil_types::payloads::{Audit, UserInfo};
use veil_types::{DomainError, ProtocolError, Record, StepError, TranscriptRecord, WorkflowState};

use super::endpoints;
use super::handshake::degree_audit_handshake;
use super::response::{decode_json, send_expecting_success, with_query};
use crate::config::Credentials;
use crate::executor::{FnStep, Services, Workflow};

pub const STUDENT_NAME_FIELD: &str = "studentName";
pub const STUDENT_ID_FIELD: &str = "studentId";
pub const SCHOOL_KEY_FIELD: &str = "schoolKey";
pub const SCHOOL_DESCRIPTION_FIELD: &str = "schoolDescription";
pub const DEGREE_KEY_FIELD: &str = "degreeKey";
pub const DEGREE_DESCRIPTION_FIELD: &str = "degreeDescription";

fn required_field<'a>(state: &'a WorkflowState, key: &str) -> Result<&'a str, StepError> {
    state
        .field_str(key)
        .ok_or_else(|| DomainError::MissingState(key.to_string()).into())
}

/// Stores the signed-in student's identity and primary degree goal.
pub fn fetch_student_profile() -> FnStep {
    FnStep::new("fetch_student_profile", |state: &mut WorkflowState, services: &Services| {
        let response = send_expecting_success(services.transport.as_ref(), HttpRequest::get(endpoints::student_profile()))?;
        let profile: UserInfo = decode_json("student profile", &response.body)?;

        let student = profile
            .embedded
            .students
            .last()
            .ok_or_else(|| ProtocolError::malformed("student profile", "no student record"))?;
        let goal = student
            .goals
            .first()
            .ok_or_else(|| ProtocolError::malformed("student profile", "student has no degree goal"))?;

        state.set_field(STUDENT_NAME_FIELD, student.name.as_str());
        state.set_field(STUDENT_ID_FIELD, student.id.as_str());
        state.set_field(SCHOOL_KEY_FIELD, goal.school.key.as_str());
        state.set_field(SCHOOL_DESCRIPTION_FIELD, goal.school.description.as_str());
        state.set_field(DEGREE_KEY_FIELD, goal.degree.key.as_str());
        state.set_field(DEGREE_DESCRIPTION_FIELD, goal.degree.description.as_str());
        info!(name = %student.name, school = %goal.school.description, "student profile loaded");
        Ok(())
    })
}

/// Fetches the degree audit and collects one record per class.
pub fn fetch_audit() -> FnStep {
    FnStep::new("fetch_audit", |state: &mut WorkflowState, services: &Services| {
        let url = with_query(
            &endpoints::audit(),
            [
                ("studentId", required_field(state, STUDENT_ID_FIELD)?),
                ("school", required_field(state, SCHOOL_KEY_FIELD)?),
                ("degree", required_field(state, DEGREE_KEY_FIELD)?),
                ("is-process-new", "false"),
                ("audit-type", "AA"),
                ("auditId", ""),
                ("include-inprogress", "true"),
                ("include-preregistered", "true"),
                ("aid-term", ""),
            ],
        )?;
        let response = send_expecting_success(services.transport.as_ref(), HttpRequest::get(url))?;
        let audit: Audit = decode_json("degree audit", &response.body)?;

        let records: Vec<Record> = audit
            .class_information
            .class_array
            .into_iter()
            .map(|class| {
                Record::from(TranscriptRecord {
                    term: class.term_literal_long,
                    section: class.discipline,
                    number: class.number,
                    course_title: class.course_title,
                    letter_grade: class.letter_grade,
                    credits: class.credits,
                })
            })
            .collect();
        info!(classes = records.len(), "degree audit loaded");
        state.collected_records = records;
        Ok(())
    })
}

/// Degree-audit handshake, profile, then audit.
pub fn transcript_workflow(credentials: &Credentials) -> Workflow {
    Workflow::new("transcript")
        .extend(degree_audit_handshake(credentials))
        .then(fetch_student_profile())
        .then(fetch_audit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_profile_field_is_reported() {
        let state = WorkflowState::new();
        assert_eq!(
            required_field(&state, STUDENT_ID_FIELD),
            Err(DomainError::MissingState(STUDENT_ID_FIELD.into()).into())
        );
    }

    #[test]
    fn workflow_runs_profile_before_audit() {
        let workflow = transcript_workflow(&Credentials::new("20123456", "secret"));
        let names = workflow.step_names();
        assert_eq!(names[4..], ["fetch_student_profile", "fetch_audit"]);
    }
}
