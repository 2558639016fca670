//! Student identity record.
//!
//! Created by the registration flow. Carries the (faculty, matricule) pair that
//! must be unique across records and the subscription fields written by billing.

use crate::domain::billing::{SubscriptionRenewal, SubscriptionStatus};
use crate::domain::foundation::{Timestamp, UserId, ValidationError};
use serde::{Deserialize, Serialize};

/// Uniqueness key of a student record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatriculeKey {
    pub faculty_id: String,
    pub matricule: String,
}

impl MatriculeKey {
    /// Builds a key from raw input. Surrounding whitespace is not significant.
    pub fn new(
        faculty_id: impl Into<String>,
        matricule: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let faculty_id = faculty_id.into().trim().to_string();
        let matricule = matricule.into().trim().to_string();
        if faculty_id.is_empty() {
            return Err(ValidationError::empty_field("faculty_id"));
        }
        if matricule.is_empty() {
            return Err(ValidationError::empty_field("matricule"));
        }
        Ok(Self {
            faculty_id,
            matricule,
        })
    }
}

impl std::fmt::Display for MatriculeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.faculty_id, self.matricule)
    }
}

/// Student identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: UserId,
    pub faculty_id: String,
    pub matricule: String,

    /// Study level, used for broadcast targeting.
    pub level: Option<String>,

    /// Push token registered by the student's device.
    pub notification_token: Option<String>,

    pub subscription_status: SubscriptionStatus,
    pub last_payment_date: Option<Timestamp>,
    pub subscription_expiry_date: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl StudentProfile {
    /// New record as produced by registration: trial, never paid.
    pub fn register(id: UserId, key: MatriculeKey, level: Option<String>, now: Timestamp) -> Self {
        Self {
            id,
            faculty_id: key.faculty_id,
            matricule: key.matricule,
            level,
            notification_token: None,
            subscription_status: SubscriptionStatus::Trial,
            last_payment_date: None,
            subscription_expiry_date: None,
            created_at: now,
        }
    }

    pub fn with_notification_token(mut self, token: impl Into<String>) -> Self {
        self.notification_token = Some(token.into());
        self
    }

    pub fn key(&self) -> MatriculeKey {
        MatriculeKey {
            faculty_id: self.faculty_id.clone(),
            matricule: self.matricule.clone(),
        }
    }

    /// Usable push token, if any. Blank tokens count as absent.
    pub fn push_token(&self) -> Option<&str> {
        self.notification_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    pub fn apply_renewal(&mut self, renewal: &SubscriptionRenewal) {
        self.subscription_status = renewal.status;
        self.last_payment_date = Some(renewal.last_payment_date);
        self.subscription_expiry_date = Some(renewal.expiry_date);
    }

    /// Ordering used to pick the surviving record among duplicates.
    ///
    /// Earliest creation wins; the id breaks ties so every observer agrees.
    pub fn seniority(&self) -> (Timestamp, &str) {
        (self.created_at, self.id.as_str())
    }
}
