use regex::Regex;

use shared_models::PatientDetails;

use crate::models::AppointmentError;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
const PHONE_PATTERN: &str = r"^\+?[0-9(][0-9\s\-\.\(\)]{5,19}$";

pub struct PatientValidationService {
    email_regex: Option<Regex>,
    phone_regex: Option<Regex>,
}

impl PatientValidationService {
    pub fn new() -> Self {
        Self {
            email_regex: Regex::new(EMAIL_PATTERN).ok(),
            phone_regex: Regex::new(PHONE_PATTERN).ok(),
        }
    }

    pub fn validate_email(&self, email: &str) -> bool {
        email.len() <= 254
            && self
                .email_regex
                .as_ref()
                .is_some_and(|regex| regex.is_match(email))
    }

    pub fn validate_phone(&self, phone: &str) -> bool {
        self.phone_regex
            .as_ref()
            .is_some_and(|regex| regex.is_match(phone.trim()))
    }

    /// Contact details given at confirmation: a name, a well-formed email and
    /// a phone number are all required.
    pub fn validate_details(&self, details: &PatientDetails) -> Result<(), AppointmentError> {
        let mut problems = Vec::new();

        if details.name.trim().is_empty() {
            problems.push("name is required");
        }
        if !self.validate_email(details.email.trim()) {
            problems.push("email is not valid");
        }
        if details.phone.trim().is_empty() {
            problems.push("phone is required");
        } else if !self.validate_phone(&details.phone) {
            problems.push("phone is not valid");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppointmentError::ValidationError(problems.join(", ")))
        }
    }
}

impl Default for PatientValidationService {
    fn default() -> Self {
        Self::new()
    }
}
