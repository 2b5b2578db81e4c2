//! Fixed upstream endpoints.

/// SSO manager entry point that starts the registration handshake.
pub const SSO_MANAGER_LOGIN: &str = "https://ssb-prod.ec.fhda.edu/ssomanager/saml/login?relayState=%2Fc%2Fauth%2FSSB%3Fpkg%3Dhttps%3A%2F%2Fssb-prod.ec.fhda.edu%2FPROD%2Ffhda_uportal.P_DeepLink_Post%3Fp_page%3Dbwskfreg.P_AltPin%26p_payload%3De30%3D";
pub const IDP_LOGIN: &str = "https://ssoshib.fhda.edu/idp/profile/SAML2/Redirect/SSO?execution=e1s1";
pub const COMMON_AUTH: &str = "https://eis-prod.ec.fhda.edu/commonauth";
pub const SSO_MANAGER_SUBMIT: &str = "https://ssb-prod.ec.fhda.edu/ssomanager/saml/SSO";
pub const SAML_SSO: &str = "https://eis-prod.ec.fhda.edu/samlsso";

const REGISTRATION_BASE: &str = "https://reg-prod.ec.fhda.edu/StudentRegistrationSsb";

pub fn register_post_sign_in() -> String {
    format!("{REGISTRATION_BASE}/ssb/registration/registerPostSignIn?mode=registration")
}

pub fn registration_service_provider() -> String {
    format!("{REGISTRATION_BASE}/saml/SSO/alias/registrationssb-prod-sp")
}

pub fn save_term() -> String {
    format!("{REGISTRATION_BASE}/ssb/term/saveTerm")
}

pub fn registration_term_search() -> String {
    format!("{REGISTRATION_BASE}/ssb/term/search?mode=registration")
}

pub fn search_term_select() -> String {
    format!("{REGISTRATION_BASE}/ssb/term/search?mode=search")
}

pub fn class_registration() -> String {
    format!("{REGISTRATION_BASE}/ssb/classRegistration/classRegistration")
}

pub fn registration_events() -> String {
    format!("{REGISTRATION_BASE}/ssb/classRegistration/getRegistrationEvents?termFilter=null")
}

pub fn add_registration_item() -> String {
    format!("{REGISTRATION_BASE}/ssb/classRegistration/addRegistrationItem")
}

pub fn submit_registration_batch() -> String {
    format!("{REGISTRATION_BASE}/ssb/classRegistration/submitRegistration/batch")
}

pub fn search_results() -> String {
    format!("{REGISTRATION_BASE}/ssb/searchResults/searchResults")
}

pub fn term_list() -> String {
    format!("{REGISTRATION_BASE}/ssb/classSearch/getTerms?searchTerm=&offset=1&max=10")
}

const DEGREE_AUDIT_BASE: &str = "https://dw-prod.ec.fhda.edu/responsiveDashboard";

pub fn degree_audit_home() -> String {
    format!("{DEGREE_AUDIT_BASE}/worksheets/WEB31")
}

pub fn degree_audit_sso() -> String {
    format!("{DEGREE_AUDIT_BASE}/saml/SSO")
}

pub fn student_profile() -> String {
    format!("{DEGREE_AUDIT_BASE}/api/students/myself")
}

pub fn audit() -> String {
    format!("{DEGREE_AUDIT_BASE}/api/audit")
}
