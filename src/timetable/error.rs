use thiserror::Error;

use super::types::{SlotKey, StaffId, StudentId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    #[error("no support staff registered")]
    NoStaffAvailable,
}

/// Rejections of a manual edit to one cell
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("slot {0} is blocked")]
    SlotBlocked(SlotKey),
    #[error("staff {staff_id} already supports another student in {slot}")]
    StaffBusy { staff_id: StaffId, slot: SlotKey },
    #[error("unknown student {0}")]
    UnknownStudent(StudentId),
    #[error("unknown staff member {0}")]
    UnknownStaff(StaffId),
    #[error("special class subject is required")]
    EmptySubject,
}
