//! Public class search.

use tracing::info;
use veil_api::HttpRequest;
use veil_types::payloads::{SearchResults, Section};
use veil_types::{CourseRecord, DomainError, Record, StepError, WorkflowState};
use veil_util::format_clock_time_12h;

use super::endpoints;
use super::response::{decode_json, send, send_expecting_success, with_query};
use crate::config::SearchTarget;
use crate::executor::{FnStep, Services, Workflow};

/// Flattens each section into one row per instructor and meeting.
pub fn course_records(section: &Section) -> Vec<CourseRecord> {
    let mut records = Vec::with_capacity(section.faculty.len() * section.meetings_faculty.len());
    for faculty in &section.faculty {
        for meeting in &section.meetings_faculty {
            let time = &meeting.meeting_time;
            records.push(CourseRecord {
                term: section.term_desc.clone(),
                course_reference_number: faculty.course_reference_number.clone(),
                subject: section.subject.clone(),
                course_number: section.course_number.clone(),
                sequence_number: section.sequence_number.clone(),
                course_title: section.course_title.clone(),
                display_name: faculty.display_name.clone(),
                begin_time: format_clock_time_12h(&time.begin_time),
                end_time: format_clock_time_12h(&time.end_time),
                start_date: time.start_date.clone(),
                end_date: time.end_date.clone(),
                meeting_type: time.meeting_type_description.clone(),
                room: time.room.clone(),
                maximum_enrollment: section.maximum_enrollment,
                enrollment: section.enrollment,
                seats_available: section.seats_available,
                wait_available: section.wait_available,
            });
        }
    }
    records
}

/// Selects the term for the anonymous search session.
pub fn select_search_term(term_id: &str) -> FnStep {
    let term_id = term_id.to_string();
    FnStep::new("select_search_term", move |_state: &mut WorkflowState, services: &Services| {
        let request = HttpRequest::post(endpoints::search_term_select())
            .header("accept", "application/json")
            .form([("term", term_id.as_str())]);
        send(services.transport.as_ref(), request)?;
        Ok(())
    })
}

/// Fetches the first page of sections for the subject and collects them as records.
pub fn fetch_sections(target: &SearchTarget) -> FnStep {
    let target = target.clone();
    FnStep::new("fetch_sections", move |state: &mut WorkflowState, services: &Services| {
        let url = with_query(
            &endpoints::search_results(),
            [
                ("txt_subject", target.subject.as_str()),
                ("txt_term", target.term_id.as_str()),
                ("startDatepicker", ""),
                ("endDatepicker", ""),
                ("pageOffset", "0"),
                ("pageMaxSize", "100"),
                ("sortColumn", "subjectDescription"),
                ("sortDirection", "asc"),
            ],
        )?;
        let response = send_expecting_success(services.transport.as_ref(), HttpRequest::get(url))?;
        let results: SearchResults = decode_json("search results", &response.body)?;

        if !results.success {
            return Err(DomainError::SearchUnsuccessful.into());
        }
        info!(total_count = results.total_count, subject = %target.subject, "sections found");
        if results.total_count == 0 {
            return Err(StepError::from(DomainError::NoResults));
        }

        state.collected_records.clear();
        state
            .collected_records
            .extend(results.data.iter().flat_map(course_records).map(Record::from));
        Ok(())
    })
}

/// Term selection followed by the section fetch.
pub fn search_workflow(target: &SearchTarget) -> Workflow {
    Workflow::new("search")
        .then(select_search_term(&target.term_id))
        .then(fetch_sections(target))
}
