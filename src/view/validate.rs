//! Input forms and their field-level validation.
//!
//! Validation runs before any store call; a form that fails never reaches
//! the store.

use thiserror::Error;

use crate::{
    records::ResidentDraft,
    types::{ResidentId, StorageLocationId},
};

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name.
    pub field: &'static str,
    /// Message shown next to the field.
    pub message: String,
}

/// All field errors of one form submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(.errors))]
pub struct ValidationError {
    /// Rejected fields, in form order.
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Message for `field`, if that field was rejected.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn require(&mut self, field: &'static str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.reject(field, message);
        }
    }

    fn selected<T>(&mut self, field: &'static str, value: Option<T>, message: &str) -> Option<T> {
        if value.is_none() {
            self.reject(field, message);
        }
        value
    }

    fn reject(&mut self, field: &'static str, message: &str) {
        self.errors.push(FieldError {
            field,
            message: message.to_string(),
        });
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}

/// Resident add/edit form as typed by staff. Blank optional fields mean "none".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidentForm {
    /// Full name (required).
    pub name: String,
    /// House number (required).
    pub house_number: String,
    /// Phone, blank for none.
    pub phone: String,
    /// Email, blank for none.
    pub email: String,
}

impl ResidentForm {
    /// Checks required fields and email shape, then builds the store payload.
    pub fn validate(&self) -> Result<ResidentDraft, ValidationError> {
        let mut c = Collector::default();
        c.require("name", &self.name, "Name is required");
        c.require("house_number", &self.house_number, "House number is required");
        let email = self.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            c.reject("email", "Invalid email");
        }
        c.finish()?;

        Ok(ResidentDraft {
            name: self.name.trim().to_string(),
            house_number: self.house_number.trim().to_string(),
            phone: non_blank(&self.phone),
            email: non_blank(&self.email),
        })
    }
}

/// Package check-in form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckInRequest {
    /// Label id printed on the package (required).
    pub package_id: String,
    /// Selected resident (required).
    pub resident_id: Option<ResidentId>,
    /// Selected storage location (required).
    pub storage_location_id: Option<StorageLocationId>,
    /// Free-form description.
    pub description: String,
    /// Package color.
    pub color: String,
    /// Package size.
    pub size: String,
    /// Staff notes.
    pub notes: String,
    /// Operator name, blank for the default label.
    pub checked_in_by: String,
}

/// Validated check-in form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidCheckIn {
    pub package_id: String,
    pub resident_id: ResidentId,
    pub storage_location_id: StorageLocationId,
}

impl CheckInRequest {
    pub(crate) fn validate(&self) -> Result<ValidCheckIn, ValidationError> {
        let mut c = Collector::default();
        c.require("package_id", &self.package_id, "Package ID is required");
        let resident_id = c.selected("resident_id", self.resident_id, "Resident is required");
        let storage_location_id = c.selected(
            "storage_location_id",
            self.storage_location_id,
            "Storage location is required",
        );

        match (resident_id, storage_location_id) {
            (Some(resident_id), Some(storage_location_id)) if c.errors.is_empty() => {
                Ok(ValidCheckIn {
                    package_id: self.package_id.trim().to_string(),
                    resident_id,
                    storage_location_id,
                })
            }
            _ => Err(ValidationError { errors: c.errors }),
        }
    }
}

/// `Some(trimmed)` unless blank.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
