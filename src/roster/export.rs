use csv::Writer;
use std::path::Path;

use crate::timetable::{StaffCategory, StaffMember, Student};

/// Writes the student roster in the column layout `parser::load_students` reads
pub fn export_students_to_csv(students: &[Student], csv_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = Writer::from_path(csv_path)?;
    wtr.write_record(["id", "name", "grade", "class", "severity", "subjects"])?;

    for student in students {
        wtr.write_record(&[
            student.id.to_string(),
            student.name.clone(),
            student.grade.to_string(),
            student.class_number.to_string(),
            student.severity.to_string(),
            student.target_subjects.join(";"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the staff roster in the column layout `parser::load_staff` reads
pub fn export_staff_to_csv(staff: &[StaffMember], csv_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = Writer::from_path(csv_path)?;
    wtr.write_record(["id", "name", "category", "students"])?;

    for member in staff {
        let category = match member.category {
            StaffCategory::Practical => "practical",
            StaffCategory::SocialService => "social",
        };
        let assignees: Vec<String> = member.fixed_assignees.iter().map(|id| id.to_string()).collect();

        wtr.write_record(&[
            member.id.to_string(),
            member.name.clone(),
            category.to_string(),
            assignees.join(";"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
