use serde::Deserialize;

use crate::timetable::{StaffCategory, StudentId};

pub const MAX_SEVERITY: u8 = 5;

/// Student add/update request from the frontend
#[derive(Debug, Clone, Deserialize)]
pub struct StudentRequest {
    pub name: String,
    pub grade: u8,
    #[serde(default)]
    pub class_number: Option<u8>,
    pub severity: u8,
    #[serde(default)]
    pub target_subjects: Vec<String>,
}

/// Staff add/update request from the frontend
#[derive(Debug, Clone, Deserialize)]
pub struct StaffRequest {
    pub name: String,
    pub category: StaffCategory,
    #[serde(default)]
    pub fixed_assignees: Vec<StudentId>,
}

/// Validates a student request
pub fn validate_student(req: &StudentRequest) -> Result<(), String> {
    if req.name.trim().is_empty() {
        return Err("Student name is required".to_string());
    }

    if !(1..=6).contains(&req.grade) {
        return Err(format!("Invalid grade: {}", req.grade));
    }

    if req.class_number == Some(0) {
        return Err("Class number must be at least 1".to_string());
    }

    // Severity rank 1 is the most severe
    if req.severity < 1 || req.severity > MAX_SEVERITY {
        return Err(format!("Severity rank must be between 1 and {}", MAX_SEVERITY));
    }

    if req.target_subjects.iter().any(|s| s.trim().is_empty()) {
        return Err("Target subjects cannot be blank".to_string());
    }

    Ok(())
}

/// Validates a staff request. Whether the fixed assignees exist is checked
/// against the roster by the workspace.
pub fn validate_staff(req: &StaffRequest) -> Result<(), String> {
    if req.name.trim().is_empty() {
        return Err("Staff name is required".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = req.fixed_assignees.iter().find(|id| !seen.insert(**id)) {
        return Err(format!("Student {} is listed twice", dup));
    }

    Ok(())
}
