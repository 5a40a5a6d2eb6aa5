use chrono::Local;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::timetable::{
    all_slot_keys, compute_stats, slot_label, Semester, SlotEntry, SlotKey, SlotStore, StaffMember,
    Student,
};

fn student_name(students: &[Student], id: u64) -> String {
    students
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| format!("#{}", id))
}

fn staff_name(staff: &[StaffMember], id: u64) -> String {
    staff
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.name.clone())
        .unwrap_or_else(|| "?".to_string())
}

/// Formats one cell: `[BLOCKED]`, `[EMPTY]` or its entries joined by commas
pub fn format_cell(entries: &[SlotEntry], students: &[Student], staff: &[StaffMember]) -> String {
    if entries.iter().any(SlotEntry::is_blocked) {
        return "[BLOCKED]".to_string();
    }
    if entries.is_empty() {
        return "[EMPTY]".to_string();
    }

    entries
        .iter()
        .filter_map(|entry| match entry {
            SlotEntry::Special { student_id, subject } => {
                Some(format!("{} ({})", student_name(students, *student_id), subject))
            }
            SlotEntry::Support { student_id, staff_id } => Some(format!(
                "{} <- {}",
                student_name(students, *student_id),
                staff_name(staff, *staff_id)
            )),
            SlotEntry::Blocked => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lines for all 30 cells followed by the load summary
pub fn render_timetable(
    semester: Semester,
    store: &SlotStore,
    students: &[Student],
    staff: &[StaffMember],
) -> Vec<String> {
    let mut lines = vec![format!("** Semester {} timetable **", semester)];

    for key in all_slot_keys() {
        lines.push(format!("{}: {}", slot_label(key), format_cell(store.entries(key), students, staff)));
    }

    let stats = compute_stats(store, students, staff);
    lines.push(String::new());
    lines.push(format!("Special class periods: {}", stats.teacher_classes));
    for member in staff {
        let count = stats.support_counts.get(&member.id).copied().unwrap_or(0);
        lines.push(format!("  {} supports {} periods", member.name, count));
    }
    for student in students {
        let count = stats.student_support_counts.get(&student.id).copied().unwrap_or(0);
        lines.push(format!("  {} is supported {} periods", student.name, count));
    }

    lines
}

/// Prints a semester timetable in a readable format
pub fn print_timetable(semester: Semester, store: &SlotStore, students: &[Student], staff: &[StaffMember]) {
    println!();
    for line in render_timetable(semester, store, students, staff) {
        println!("{}", line);
    }
}

/// Lists cells with students present but nobody supporting them
pub fn print_unsupported(slots: &[SlotKey]) {
    if slots.is_empty() {
        return;
    }
    println!("\n⚠️  Periods without support ({}):", slots.len());
    for key in slots {
        println!("  - {}", slot_label(*key));
    }
}

/// Writes a semester timetable to a file, one cell per line
pub fn write_timetable_to_file(
    semester: Semester,
    store: &SlotStore,
    students: &[Student],
    staff: &[StaffMember],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(path)?;

    writeln!(file, "# Generated {}", Local::now().format("%Y-%m-%d %H:%M"))?;
    for line in render_timetable(semester, store, students, staff) {
        writeln!(file, "{}", line)?;
    }

    Ok(())
}
