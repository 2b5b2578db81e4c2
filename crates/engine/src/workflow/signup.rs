//! Class registration after the handshake.

use std::time::Duration;

use chrono_tz::Tz;
use tracing::{debug, info, warn};
use veil_api::HttpRequest;
use veil_types::payloads::{AddItemResponse, BatchChanges, BatchUpdate, ChangedItem, RegistrationStatus};
use veil_types::{DomainError, ItemOutcome, NotificationEvent, ProtocolError, StepError, WorkflowState};

use super::eligibility::{Eligibility, assess_eligibility, wait_for_window};
use super::endpoints;
use super::handshake::registration_handshake;
use super::response::{decode_json, send, send_expecting_success, with_query};
use crate::config::{Credentials, SignupTarget, WorkflowConfig};
use crate::executor::{FnStep, Services, Workflow};

/// Status text of a successfully registered item.
pub const REGISTERED_STATUS: &str = "Registered";
/// Status text of an item blocked by registration errors.
pub const ERRORS_PREVENTING_REGISTRATION: &str = "Errors Preventing Registration";

/// Field holding the announced opening time, when one was waited for.
pub const REGISTRATION_OPENS_AT_FIELD: &str = "registrationOpensAt";

/// Decides the outcome of one item in a batch response.
pub fn item_outcome(item: &ChangedItem) -> ItemOutcome {
    if !item.crn_errors.is_empty() || item.status_description == ERRORS_PREVENTING_REGISTRATION {
        let mut messages: Vec<String> = item.crn_errors.iter().map(|error| error.message.clone()).collect();
        if messages.is_empty() {
            messages.push(item.status_description.clone());
        }
        ItemOutcome::Rejected { messages }
    } else if item.status_description == REGISTERED_STATUS {
        ItemOutcome::Registered {
            title: item.course_title.clone(),
        }
    } else {
        ItemOutcome::Pending {
            status: item.status_description.clone(),
        }
    }
}

pub fn save_term(term_id: &str) -> FnStep {
    let term_id = term_id.to_string();
    FnStep::new("save_term", move |_state: &mut WorkflowState, services: &Services| {
        let url = with_query(&endpoints::save_term(), [("mode", "registration"), ("term", term_id.as_str())])?;
        send(services.transport.as_ref(), HttpRequest::get(url))?;
        Ok(())
    })
}

/// Checks eligibility for the term and waits out an announced opening time.
pub fn registration_status(term_id: &str, zone: Tz, safety_margin: Duration) -> FnStep {
    let term_id = term_id.to_string();
    FnStep::new("registration_status", move |state: &mut WorkflowState, services: &Services| {
        let request = HttpRequest::post(endpoints::registration_term_search()).form([
            ("term", term_id.as_str()),
            ("studyPath", ""),
            ("studyPathText", ""),
            ("startDatepicker", ""),
            ("endDatepicker", ""),
            ("uniqueSessionId", ""),
        ]);
        let response = send_expecting_success(services.transport.as_ref(), request)?;
        let status: RegistrationStatus = decode_json("registration status", &response.body)?;

        match assess_eligibility(&status.student_elig_failures, zone, safety_margin)? {
            Eligibility::Eligible => info!(term_id = %term_id, "eligible to register"),
            Eligibility::OpensAt(window) => {
                state
                    .extracted_fields
                    .insert(REGISTRATION_OPENS_AT_FIELD.to_string(), window.opens_at.to_rfc3339().into());
                wait_for_window(&window, services.clock.as_ref())?;
            }
        }
        Ok(())
    })
}

pub fn visit_class_registration() -> FnStep {
    FnStep::new("visit_class_registration", |_state: &mut WorkflowState, services: &Services| {
        send(services.transport.as_ref(), HttpRequest::head(endpoints::class_registration()))?;
        Ok(())
    })
}

pub fn registration_events() -> FnStep {
    FnStep::new("registration_events", |_state: &mut WorkflowState, services: &Services| {
        send_expecting_success(services.transport.as_ref(), HttpRequest::get(endpoints::registration_events()))?;
        Ok(())
    })
}

/// Adds every requested CRN to the registration cart.
///
/// Accepted items keep the server's model for the batch submit; rejected
/// items are recorded and do not stop their siblings. Items already holding
/// a model from an earlier attempt are skipped.
pub fn add_items(target: &SignupTarget) -> FnStep {
    let target = target.clone();
    FnStep::new("add_items", move |state: &mut WorkflowState, services: &Services| {
        for crn in &target.crns {
            if state.registration_models.contains_key(crn) {
                debug!(crn = %crn, "item already added");
                continue;
            }
            let url = with_query(
                &endpoints::add_registration_item(),
                [("term", target.term_id.as_str()), ("courseReferenceNumber", crn.as_str()), ("olr", "false")],
            )?;
            let response = send_expecting_success(services.transport.as_ref(), HttpRequest::get(url))?;
            let added: AddItemResponse = decode_json("add registration item", &response.body)?;

            if added.success {
                info!(crn = %crn, "item added");
                state.item_outcomes.shift_remove(crn);
                state.registration_models.insert(crn.clone(), added.model);
            } else {
                warn!(crn = %crn, message = %added.message, "item rejected");
                let messages = if added.message.is_empty() { Vec::new() } else { vec![added.message] };
                state.item_outcomes.insert(crn.clone(), ItemOutcome::Rejected { messages });
            }
        }

        if state.registration_models.is_empty() {
            let messages = state
                .item_outcomes
                .values()
                .filter_map(|outcome| match outcome {
                    ItemOutcome::Rejected { messages } => Some(messages.clone()),
                    _ => None,
                })
                .flatten()
                .collect();
            return Err(DomainError::AllItemsRejected { messages }.into());
        }
        Ok(())
    })
}

/// Submits every added item in one batch and records each requested item's outcome.
pub fn submit_batch(target: &SignupTarget) -> FnStep {
    let target = target.clone();
    FnStep::new("submit_batch", move |state: &mut WorkflowState, services: &Services| {
        if state.registration_models.is_empty() {
            return Err(DomainError::MissingState("registration_models".into()).into());
        }
        let batch = BatchUpdate {
            update: state.registration_models.values().collect(),
        };
        let payload = serde_json::to_value(&batch).map_err(|error| StepError::from(ProtocolError::malformed("batch update", error)))?;
        let response = send_expecting_success(services.transport.as_ref(), HttpRequest::post(endpoints::submit_registration_batch()).json(&payload))?;
        let changes: BatchChanges = decode_json("batch changes", &response.body)?;

        for item in changes.data.update.iter().filter(|item| target.crns.contains(&item.course_reference_number)) {
            let outcome = item_outcome(item);
            match &outcome {
                ItemOutcome::Registered { title } => {
                    info!(crn = %item.course_reference_number, title = %title, "registered");
                    if let Err(error) = services.notifier.notify(&NotificationEvent::successful_enrollment(title.clone())) {
                        warn!(crn = %item.course_reference_number, error = %error, "enrollment notification failed");
                    }
                }
                ItemOutcome::Rejected { messages } => {
                    warn!(crn = %item.course_reference_number, title = %item.course_title, errors = messages.len(), "registration errors");
                    for message in messages {
                        warn!(crn = %item.course_reference_number, message = %message, "registration error");
                    }
                }
                ItemOutcome::Pending { status } => {
                    info!(crn = %item.course_reference_number, status = %status, "item not registered");
                }
            }
            state.item_outcomes.insert(item.course_reference_number.clone(), outcome);
        }
        Ok(())
    })
}

/// Handshake, term selection, eligibility wait, then add and submit.
pub fn signup_workflow(credentials: &Credentials, target: &SignupTarget, config: &WorkflowConfig) -> Workflow {
    Workflow::new("signup")
        .extend(registration_handshake(credentials))
        .then(save_term(&target.term_id))
        .then(registration_status(&target.term_id, config.reference_time_zone, config.eligibility_margin))
        .then(visit_class_registration())
        .then(registration_events())
        .then(add_items(target))
        .then(submit_batch(target))
}
