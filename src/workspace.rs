use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::roster::{validate_staff, validate_student, StaffRequest, StudentRequest};
use crate::timetable::{
    assign_support, AssignError, AttendanceMatrix, Heuristic, Semester, SlotEntry, SlotStore,
    StaffId, StaffMember, Student, StudentId, Timetable,
};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("{0}")]
    Invalid(String),
    #[error("unknown student {0}")]
    UnknownStudent(StudentId),
    #[error("unknown staff member {0}")]
    UnknownStaff(StaffId),
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to access workspace file: {0}")]
    Io(#[from] std::io::Error),
    #[error("workspace file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the timetable screens work on: both rosters, the grade
/// attendance grid and the per-semester timetable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub staff: Vec<StaffMember>,
    #[serde(default)]
    pub attendance: AttendanceMatrix,
    #[serde(default)]
    pub timetable: Timetable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Workspace {
    pub fn new(students: Vec<Student>, staff: Vec<StaffMember>) -> Self {
        Workspace {
            students,
            staff,
            ..Workspace::default()
        }
    }

    /// Loads a snapshot; a missing file yields an empty workspace
    pub fn load(path: &Path) -> Result<Workspace, WorkspaceError> {
        if !path.exists() {
            info!("No workspace at {}, starting empty", path.display());
            return Ok(Workspace::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&mut self, path: &Path) -> Result<(), WorkspaceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        self.saved_at = Some(Utc::now());
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Workspace saved to {}", path.display());
        Ok(())
    }

    /// Runs the auto-assignment engine over one semester and stores the result.
    /// On error the semester is left untouched.
    pub fn auto_assign(&mut self, semester: Semester, heuristic: Heuristic) -> Result<&SlotStore, AssignError> {
        let current = self.timetable.store(semester);
        let next = assign_support(&current, &self.students, &self.staff, &self.attendance, heuristic)?;
        self.timetable.replace(semester, next);
        Ok(&*self.timetable.store_mut(semester))
    }

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn staff_member(&self, id: StaffId) -> Option<&StaffMember> {
        self.staff.iter().find(|m| m.id == id)
    }

    pub fn add_student(&mut self, req: StudentRequest) -> Result<&Student, RosterError> {
        validate_student(&req).map_err(RosterError::Invalid)?;
        let id = next_id(self.students.iter().map(|s| s.id));
        self.students.push(student_from_request(id, req));
        info!("Added student {}", id);
        Ok(&self.students[self.students.len() - 1])
    }

    /// Keeps the roster position so tie-breaks stay stable
    pub fn update_student(&mut self, id: StudentId, req: StudentRequest) -> Result<&Student, RosterError> {
        validate_student(&req).map_err(RosterError::Invalid)?;
        let position = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or(RosterError::UnknownStudent(id))?;
        self.students[position] = student_from_request(id, req);
        Ok(&self.students[position])
    }

    /// Also drops the student from fixed assignments and every timetable cell
    pub fn remove_student(&mut self, id: StudentId) -> Result<Student, RosterError> {
        let position = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or(RosterError::UnknownStudent(id))?;
        let removed = self.students.remove(position);

        for member in &mut self.staff {
            member.fixed_assignees.retain(|s| *s != id);
        }
        for store in self.timetable.stores_mut() {
            store.retain_entries(|entry| entry.student_id() != Some(id));
        }

        info!("Removed student {}", id);
        Ok(removed)
    }

    pub fn add_staff(&mut self, req: StaffRequest) -> Result<&StaffMember, RosterError> {
        self.check_staff_request(&req)?;
        let id = next_id(self.staff.iter().map(|m| m.id));
        self.staff.push(StaffMember {
            id,
            name: req.name.trim().to_string(),
            category: req.category,
            fixed_assignees: req.fixed_assignees,
        });
        info!("Added staff member {}", id);
        Ok(&self.staff[self.staff.len() - 1])
    }

    pub fn update_staff(&mut self, id: StaffId, req: StaffRequest) -> Result<&StaffMember, RosterError> {
        self.check_staff_request(&req)?;
        let position = self
            .staff
            .iter()
            .position(|m| m.id == id)
            .ok_or(RosterError::UnknownStaff(id))?;
        self.staff[position] = StaffMember {
            id,
            name: req.name.trim().to_string(),
            category: req.category,
            fixed_assignees: req.fixed_assignees,
        };
        Ok(&self.staff[position])
    }

    /// Also drops the member's support entries from every timetable cell
    pub fn remove_staff(&mut self, id: StaffId) -> Result<StaffMember, RosterError> {
        let position = self
            .staff
            .iter()
            .position(|m| m.id == id)
            .ok_or(RosterError::UnknownStaff(id))?;
        let removed = self.staff.remove(position);

        for store in self.timetable.stores_mut() {
            store.retain_entries(|entry| !matches!(entry, SlotEntry::Support { staff_id, .. } if *staff_id == id));
        }

        info!("Removed staff member {}", id);
        Ok(removed)
    }

    fn check_staff_request(&self, req: &StaffRequest) -> Result<(), RosterError> {
        validate_staff(req).map_err(RosterError::Invalid)?;
        match req.fixed_assignees.iter().find(|id| self.student(**id).is_none()) {
            Some(missing) => Err(RosterError::UnknownStudent(*missing)),
            None => Ok(()),
        }
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().map_or(1, |max| max + 1)
}

fn student_from_request(id: StudentId, req: StudentRequest) -> Student {
    Student {
        id,
        name: req.name.trim().to_string(),
        grade: req.grade,
        class_number: req.class_number.unwrap_or(1),
        severity: req.severity,
        target_subjects: req.target_subjects.iter().map(|s| s.trim().to_string()).collect(),
    }
}
