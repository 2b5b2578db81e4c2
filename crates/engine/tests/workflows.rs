mod common;

use std::time::Duration;

use common::{FakeNotifier, FakeTransport, harness, harness_with, saml_form, start_instant};
use serde_json::{Value, json};
use veil_api::{HttpResponse, Method};
use veil_engine::workflow::handshake::{login, register_post_sign_in, submit_common_auth, submit_saml_sso, submit_sso_manager, visit};
use veil_engine::workflow::search::fetch_sections;
use veil_engine::workflow::signup::REGISTRATION_OPENS_AT_FIELD;
use veil_engine::workflow::transcript::{DEGREE_KEY_FIELD, STUDENT_NAME_FIELD};
use veil_engine::workflow::endpoints;
use veil_engine::{
    Credentials, RetryError, SearchTarget, SignupTarget, Workflow, WorkflowConfig, search_workflow, signup_workflow,
    transcript_workflow,
};
use veil_types::{DomainError, ItemOutcome, NotificationEvent, Record, StepError, TransportError, WorkflowState};

fn credentials() -> Credentials {
    Credentials::new("20123456", "secret")
}

fn search_results_body() -> String {
    json!({
        "success": true,
        "totalCount": 1,
        "data": [{
            "termDesc": "2024 Fall De Anza",
            "subject": "MATH",
            "courseNumber": "1A",
            "sequenceNumber": "01",
            "courseTitle": "Calculus",
            "maximumEnrollment": 40,
            "enrollment": 38,
            "seatsAvailable": 2,
            "waitAvailable": 10,
            "faculty": [{"courseReferenceNumber": "41234", "displayName": "Lovelace, Ada"}],
            "meetingsFaculty": [{"meetingTime": {
                "beginTime": "0930",
                "endTime": "1120",
                "startDate": "09/23/2024",
                "endDate": "12/13/2024",
                "meetingTypeDescription": "Lecture",
                "room": "S44"
            }}]
        }]
    })
    .to_string()
}

fn registration_portal() -> FakeTransport {
    FakeTransport::new()
        .ok(Method::GET, endpoints::SSO_MANAGER_LOGIN, "")
        .ok(
            Method::POST,
            endpoints::IDP_LOGIN,
            saml_form(&[("RelayState", "RELAY1"), ("SAMLResponse", "ASSERT1")]),
        )
        .ok(
            Method::POST,
            endpoints::COMMON_AUTH,
            saml_form(&[("RelayState", "RELAY2"), ("SAMLResponse", "ASSERT2")]),
        )
        .ok(Method::POST, endpoints::SSO_MANAGER_SUBMIT, "")
        .ok(Method::GET, endpoints::register_post_sign_in(), saml_form(&[("SAMLRequest", "REQ1")]))
        .ok(Method::POST, endpoints::SAML_SSO, saml_form(&[("SAMLResponse", "ASSERT3")]))
        .ok(Method::POST, endpoints::registration_service_provider(), "")
}

#[test]
fn seven_step_run_survives_flaky_final_step() {
    let transport = registration_portal()
        .on(Method::GET, endpoints::search_results(), Err(TransportError::Timeout("slow".into())))
        .on(Method::GET, endpoints::search_results(), Err(TransportError::Connect("reset".into())))
        .on(Method::GET, endpoints::search_results(), Ok(HttpResponse::new(200, search_results_body())));
    let h = harness(transport, 3, Duration::from_secs(5));
    let workflow = Workflow::new("seven-steps")
        .then(visit("visit_homepage", endpoints::SSO_MANAGER_LOGIN.to_string(), true))
        .then(login(&credentials()))
        .then(submit_common_auth(true, true))
        .then(submit_sso_manager())
        .then(register_post_sign_in())
        .then(submit_saml_sso())
        .then(fetch_sections(&SearchTarget {
            term_id: "202422".into(),
            subject: "MATH".into(),
        }));
    let mut state = WorkflowState::new();

    h.runner.run(&workflow, &mut state).expect("run completes");

    assert_eq!(state.collected_records.len(), 1);
    assert_eq!(h.transport.requests_to(&endpoints::search_results()).len(), 3);
    assert_eq!(h.transport.requests_to(endpoints::IDP_LOGIN).len(), 1);
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(5); 2]);
}

#[test]
fn search_collects_course_rows() {
    let transport = FakeTransport::new()
        .ok(Method::POST, endpoints::search_term_select(), "{}")
        .ok(Method::GET, endpoints::search_results(), search_results_body());
    let h = harness(transport, 3, Duration::from_secs(1));
    let target = SearchTarget {
        term_id: "202422".into(),
        subject: "MATH".into(),
    };
    let mut state = WorkflowState::new();

    h.runner.run(&search_workflow(&target), &mut state).expect("search succeeds");

    let Record::Course(course) = &state.collected_records[0] else {
        panic!("expected a course record");
    };
    assert_eq!(course.course_reference_number, "41234");
    assert_eq!(course.begin_time, "9:30 AM");
    assert_eq!(course.end_time, "11:20 AM");
    assert_eq!(course.room, "S44");

    let select = &h.transport.requests_to(&endpoints::search_term_select())[0];
    assert_eq!(select.body.as_deref(), Some("term=202422"));
    let fetch = &h.transport.requests_to(&endpoints::search_results())[0];
    assert!(fetch.url.contains("txt_subject=MATH&txt_term=202422"));
    assert!(fetch.url.contains("pageMaxSize=100"));
}

#[test]
fn search_without_results_is_terminal() {
    let transport = FakeTransport::new()
        .ok(Method::POST, endpoints::search_term_select(), "{}")
        .ok(
            Method::GET,
            endpoints::search_results(),
            json!({"success": true, "totalCount": 0, "data": []}).to_string(),
        );
    let h = harness(transport, 3, Duration::from_secs(1));
    let target = SearchTarget {
        term_id: "202422".into(),
        subject: "ZZZ".into(),
    };

    let error = h.runner.run(&search_workflow(&target), &mut WorkflowState::new()).unwrap_err();

    assert_eq!(
        error.cause,
        RetryError::Terminal {
            attempts: 1,
            error: DomainError::NoResults.into()
        }
    );
    assert!(h.clock.sleeps().is_empty());
}

#[test]
fn unsuccessful_search_is_terminal() {
    let transport = FakeTransport::new()
        .ok(Method::POST, endpoints::search_term_select(), "{}")
        .ok(Method::GET, endpoints::search_results(), json!({"success": false}).to_string());
    let h = harness(transport, 3, Duration::from_secs(1));
    let target = SearchTarget {
        term_id: "202422".into(),
        subject: "MATH".into(),
    };

    let error = h.runner.run(&search_workflow(&target), &mut WorkflowState::new()).unwrap_err();

    assert_eq!(error.root_cause(), &StepError::from(DomainError::SearchUnsuccessful));
}

fn signup_portal(eligibility_failures: Value) -> FakeTransport {
    let add_prefix = format!("{}?term=202422&courseReferenceNumber=", endpoints::add_registration_item());
    registration_portal()
        .ok(Method::GET, endpoints::save_term(), "")
        .ok(
            Method::POST,
            endpoints::registration_term_search(),
            json!({ "studentEligFailures": eligibility_failures }).to_string(),
        )
        .ok(Method::HEAD, endpoints::class_registration(), "")
        .ok(Method::GET, endpoints::registration_events(), "[]")
        .ok(
            Method::GET,
            format!("{add_prefix}41234"),
            json!({"success": true, "message": null, "model": {"courseReferenceNumber": "41234", "selectedAction": "RW", "term": "202422"}})
                .to_string(),
        )
        .ok(
            Method::GET,
            format!("{add_prefix}41235"),
            json!({"success": false, "message": "Closed section", "model": null}).to_string(),
        )
        .ok(
            Method::POST,
            endpoints::submit_registration_batch(),
            json!({"data": {"update": [
                {"courseReferenceNumber": "41234", "courseTitle": "Calculus I", "statusDescription": "Registered", "crnErrors": []},
                {"courseReferenceNumber": "99999", "courseTitle": "Unrelated", "statusDescription": "Registered", "crnErrors": []}
            ]}})
            .to_string(),
        )
}

#[test]
fn signup_waits_for_window_then_registers() {
    let h = harness(
        signup_portal(json!(["You can register from 05/01/2024 08:00 AM"])),
        3,
        Duration::from_secs(1),
    );
    let target = SignupTarget::new("202422", "41234,41235");
    let mut state = WorkflowState::new();

    h.runner
        .run(&signup_workflow(&credentials(), &target, &WorkflowConfig::default()), &mut state)
        .expect("signup completes");

    // 2024-04-30 12:00 UTC until 2024-05-01 08:00 PDT (15:00 UTC) plus the margin
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(27 * 60 * 60 + 5)]);
    assert!(state.field_str(REGISTRATION_OPENS_AT_FIELD).is_some());

    assert_eq!(
        state.item_outcomes.get("41234"),
        Some(&ItemOutcome::Registered {
            title: "Calculus I".into()
        })
    );
    assert_eq!(
        state.item_outcomes.get("41235"),
        Some(&ItemOutcome::Rejected {
            messages: vec!["Closed section".into()]
        })
    );
    assert!(!state.item_outcomes.contains_key("99999"));
    assert_eq!(state.registered_items(), vec!["41234"]);

    let batch = &h.transport.requests_to(&endpoints::submit_registration_batch())[0];
    assert_eq!(
        batch.body.as_deref(),
        Some(r#"{"update":[{"courseReferenceNumber":"41234","selectedAction":"RW","term":"202422"}]}"#)
    );
    assert_eq!(
        *h.notifier.events.lock().unwrap(),
        vec![NotificationEvent::successful_enrollment("Calculus I")]
    );
}

#[test]
fn signup_without_window_is_not_eligible() {
    let h = harness(signup_portal(json!(["You have a hold on your account."])), 3, Duration::from_secs(1));
    let target = SignupTarget::new("202422", "41234");

    let error = h
        .runner
        .run(&signup_workflow(&credentials(), &target, &WorkflowConfig::default()), &mut WorkflowState::new())
        .unwrap_err();

    assert_eq!(error.failed_step, "registration_status");
    assert!(error.is_terminal());
    assert_eq!(
        error.root_cause(),
        &StepError::from(DomainError::NotEligible {
            messages: vec!["You have a hold on your account.".into()]
        })
    );
    assert!(h.transport.requests_to(&endpoints::add_registration_item()).is_empty());
}

#[test]
fn signup_with_every_item_rejected_never_submits() {
    let h = harness(signup_portal(json!([])), 3, Duration::from_secs(1));
    let target = SignupTarget::new("202422", "41235");
    let mut state = WorkflowState::new();

    let error = h
        .runner
        .run(&signup_workflow(&credentials(), &target, &WorkflowConfig::default()), &mut state)
        .unwrap_err();

    assert_eq!(error.failed_step, "add_items");
    assert_eq!(
        error.root_cause(),
        &StepError::from(DomainError::AllItemsRejected {
            messages: vec!["Closed section".into()]
        })
    );
    assert!(h.clock.sleeps().is_empty());
    assert!(h.transport.requests_to(&endpoints::submit_registration_batch()).is_empty());
}

#[test]
fn notification_failure_does_not_fail_signup() {
    let notifier = FakeNotifier {
        fail: true,
        ..Default::default()
    };
    let h = harness_with(signup_portal(json!([])), 3, Duration::from_secs(1), notifier, start_instant());
    let target = SignupTarget::new("202422", "41234");
    let mut state = WorkflowState::new();

    h.runner
        .run(&signup_workflow(&credentials(), &target, &WorkflowConfig::default()), &mut state)
        .expect("signup completes despite notifier");

    assert_eq!(h.notifier.events.lock().unwrap().len(), 1);
    assert_eq!(state.registered_items(), vec!["41234"]);
}

#[test]
fn transcript_collects_audit_rows() {
    let transport = FakeTransport::new()
        .ok(Method::GET, endpoints::degree_audit_home(), "")
        .ok(
            Method::POST,
            endpoints::IDP_LOGIN,
            saml_form(&[("RelayState", "RELAY1"), ("SAMLResponse", "ASSERT1")]),
        )
        .ok(Method::POST, endpoints::COMMON_AUTH, saml_form(&[("SAMLResponse", "ASSERT2")]))
        .ok(Method::POST, endpoints::degree_audit_sso(), "")
        .ok(
            Method::GET,
            endpoints::student_profile(),
            json!({"_embedded": {"students": [{
                "id": "20123456",
                "name": "Lovelace, Ada",
                "goals": [{
                    "school": {"key": "UG", "description": "Undergraduate"},
                    "degree": {"key": "AA", "description": "Associate in Arts"}
                }]
            }]}})
            .to_string(),
        )
        .ok(
            Method::GET,
            endpoints::audit(),
            json!({"classInformation": {"classArray": [
                {"termLiteralLong": "Fall 2023", "discipline": "CIS", "number": "22A", "courseTitle": "Python", "letterGrade": "A", "credits": 4.5},
                {"termLiteralLong": "Winter 2024", "discipline": "EWRT", "number": "1A", "courseTitle": "Composition", "letterGrade": "B", "credits": "5"}
            ]}})
            .to_string(),
        );
    let h = harness(transport, 3, Duration::from_secs(1));
    let mut state = WorkflowState::new();

    h.runner
        .run(&transcript_workflow(&credentials()), &mut state)
        .expect("transcript completes");

    assert_eq!(state.field_str(STUDENT_NAME_FIELD), Some("Lovelace, Ada"));
    assert_eq!(state.field_str(DEGREE_KEY_FIELD), Some("AA"));
    assert_eq!(state.collected_records.len(), 2);
    let Record::Transcript(first) = &state.collected_records[0] else {
        panic!("expected a transcript record");
    };
    assert_eq!(first.section, "CIS");
    assert_eq!(first.credits, "4.5");

    let audit = &h.transport.requests_to(&endpoints::audit())[0];
    assert!(audit.url.contains("studentId=20123456&school=UG&degree=AA"));
    assert!(audit.url.contains("audit-type=AA"));
}

#[test]
fn transcript_profile_without_goal_is_retried_then_exhausted() {
    let transport = FakeTransport::new()
        .ok(Method::GET, endpoints::degree_audit_home(), "")
        .ok(Method::POST, endpoints::IDP_LOGIN, saml_form(&[("SAMLResponse", "ASSERT1")]))
        .ok(Method::POST, endpoints::COMMON_AUTH, saml_form(&[("SAMLResponse", "ASSERT2")]))
        .ok(Method::POST, endpoints::degree_audit_sso(), "")
        .ok(
            Method::GET,
            endpoints::student_profile(),
            json!({"_embedded": {"students": [{"id": "1", "name": "Ada", "goals": []}]}}).to_string(),
        );
    let h = harness(transport, 2, Duration::from_secs(4));

    let error = h
        .runner
        .run(&transcript_workflow(&credentials()), &mut WorkflowState::new())
        .unwrap_err();

    assert_eq!(error.failed_step, "fetch_student_profile");
    assert!(!error.is_terminal());
    assert!(matches!(error.cause, RetryError::MaxAttemptsExceeded { attempts: 2, .. }));
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(4)]);
}
