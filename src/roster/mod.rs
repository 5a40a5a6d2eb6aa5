pub mod submission;
pub mod export;

pub use submission::{validate_staff, validate_student, StaffRequest, StudentRequest};
pub use export::{export_staff_to_csv, export_students_to_csv};
