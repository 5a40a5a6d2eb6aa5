pub mod types;
pub mod attendance;
pub mod slot_utils;
pub mod engine;
pub mod stats;
pub mod editing;
pub mod error;

pub use types::{
    Day, Heuristic, Semester, SlotEntry, SlotKey, SlotStore, StaffCategory, StaffId, StaffMember,
    Student, StudentId, Timetable,
};
pub use attendance::AttendanceMatrix;
pub use slot_utils::{all_slot_keys, slot_label};
pub use engine::assign_support;
pub use stats::{compute_stats, TimetableStats};
pub use error::{AssignError, EditError};
