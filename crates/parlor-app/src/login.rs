//! Two-step mock login: phone number, then a locally generated code.
//!
//! Nothing leaves the process. The "sent" code is handed straight back to the
//! caller for display, and verification is a string comparison.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::sleep;
use tracing::{debug, info};

use parlor_types::api::{PhoneSubmission, Route};

use crate::config::ChatTimings;
use crate::error::{LoginError, Result};
use crate::session::SessionGate;

pub const OTP_LEN: usize = 6;
const PHONE_MIN: usize = 7;
const PHONE_MAX: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Phone,
    Otp,
}

pub struct LoginFlow<R = StdRng> {
    step: LoginStep,
    issued: Option<String>,
    rng: R,
    timings: ChatTimings,
}

impl LoginFlow<StdRng> {
    pub fn new(timings: ChatTimings) -> Self {
        Self::with_rng(timings, StdRng::from_os_rng())
    }
}

impl<R: Rng> LoginFlow<R> {
    pub fn with_rng(timings: ChatTimings, rng: R) -> Self {
        Self {
            step: LoginStep::Phone,
            issued: None,
            rng,
            timings,
        }
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    /// Validate the phone form, issue a fresh code and move to the code step.
    pub async fn send_code(&mut self, submission: &PhoneSubmission) -> std::result::Result<String, LoginError> {
        validate_phone(submission)?;

        let code = self.rng.random_range(100_000..1_000_000_u32).to_string();
        debug!("OTP issued: {}", code);
        self.issued = Some(code.clone());

        sleep(self.timings.send_code_delay).await;
        self.step = LoginStep::Otp;
        info!(
            "Code sent to {} {}",
            submission.country_code, submission.phone_number
        );
        Ok(code)
    }

    /// Check a submitted code. On a match the session flag is set and the
    /// flow resets; on a mismatch nothing changes and the user may retry.
    pub async fn verify(&mut self, otp: &str, session: &SessionGate) -> Result<Route> {
        validate_otp(otp)?;
        let expected = self.issued.as_deref().ok_or(LoginError::NoCodeIssued)?;
        if otp != expected {
            debug!("OTP mismatch");
            return Err(LoginError::OtpMismatch.into());
        }

        sleep(self.timings.verify_delay).await;
        session.sign_in()?;
        self.step = LoginStep::Phone;
        self.issued = None;
        Ok(Route::Dashboard)
    }
}

pub fn validate_phone(submission: &PhoneSubmission) -> std::result::Result<(), LoginError> {
    if submission.country_code.is_empty() {
        return Err(LoginError::MissingCountryCode);
    }

    let number = &submission.phone_number;
    let len = number.chars().count();
    if len < PHONE_MIN {
        return Err(LoginError::PhoneTooShort);
    }
    if len > PHONE_MAX {
        return Err(LoginError::PhoneTooLong);
    }
    if !is_digits(number) {
        return Err(LoginError::NotNumeric);
    }
    Ok(())
}

pub fn validate_otp(otp: &str) -> std::result::Result<(), LoginError> {
    if otp.chars().count() != OTP_LEN {
        return Err(LoginError::OtpLength);
    }
    if !is_digits(otp) {
        return Err(LoginError::NotNumeric);
    }
    Ok(())
}

fn is_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}
