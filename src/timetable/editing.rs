use super::error::EditError;
use super::types::{SlotEntry, SlotKey, SlotStore, StaffId, StaffMember, Student, StudentId};

/// Puts a student in the special class for one cell, replacing whatever entry
/// the student had there. Placing the same subject again removes it.
/// Returns whether the placement is present afterwards.
pub fn place_special(
    store: &mut SlotStore,
    key: SlotKey,
    students: &[Student],
    student_id: StudentId,
    subject: &str,
) -> Result<bool, EditError> {
    ensure_editable(store, key)?;
    ensure_student(students, student_id)?;
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(EditError::EmptySubject);
    }

    let placement = SlotEntry::Special { student_id, subject: subject.to_string() };
    Ok(toggle_student_entry(store, key, student_id, placement))
}

/// Pairs a student with a staff member for one cell, replacing whatever entry
/// the student had there. Placing the same pairing again removes it.
/// Returns whether the pairing is present afterwards.
pub fn place_support(
    store: &mut SlotStore,
    key: SlotKey,
    students: &[Student],
    staff: &[StaffMember],
    student_id: StudentId,
    staff_id: StaffId,
) -> Result<bool, EditError> {
    ensure_editable(store, key)?;
    ensure_student(students, student_id)?;
    if !staff.iter().any(|m| m.id == staff_id) {
        return Err(EditError::UnknownStaff(staff_id));
    }

    let staff_taken = store.entries(key).iter().any(|entry| {
        entry.staff_id() == Some(staff_id) && entry.student_id() != Some(student_id)
    });
    if staff_taken {
        return Err(EditError::StaffBusy { staff_id, slot: key });
    }

    let pairing = SlotEntry::Support { student_id, staff_id };
    Ok(toggle_student_entry(store, key, student_id, pairing))
}

/// Removes the student's entry from the cell; returns whether one existed
pub fn clear_student(store: &mut SlotStore, key: SlotKey, student_id: StudentId) -> Result<bool, EditError> {
    ensure_editable(store, key)?;
    let mut entries = store.entries(key).to_vec();
    let before = entries.len();
    entries.retain(|entry| entry.student_id() != Some(student_id));
    let removed = entries.len() != before;
    store.set_entries(key, entries);
    Ok(removed)
}

/// Blocking drops every support entry of the cell; unblocking only removes
/// the marker. Returns the new blocked state.
pub fn toggle_blocked(store: &mut SlotStore, key: SlotKey) -> bool {
    let entries = store.entries(key);
    if entries.iter().any(SlotEntry::is_blocked) {
        let unblocked = entries.iter().filter(|e| !e.is_blocked()).cloned().collect();
        store.set_entries(key, unblocked);
        false
    } else {
        let mut blocked: Vec<SlotEntry> = entries.iter().filter(|e| e.is_special()).cloned().collect();
        blocked.push(SlotEntry::Blocked);
        store.set_entries(key, blocked);
        true
    }
}

fn ensure_editable(store: &SlotStore, key: SlotKey) -> Result<(), EditError> {
    if store.is_blocked(key) {
        Err(EditError::SlotBlocked(key))
    } else {
        Ok(())
    }
}

fn ensure_student(students: &[Student], student_id: StudentId) -> Result<(), EditError> {
    if students.iter().any(|s| s.id == student_id) {
        Ok(())
    } else {
        Err(EditError::UnknownStudent(student_id))
    }
}

/// One entry per student per cell
fn toggle_student_entry(store: &mut SlotStore, key: SlotKey, student_id: StudentId, entry: SlotEntry) -> bool {
    let mut entries = store.entries(key).to_vec();
    let already_placed = entries.contains(&entry);
    entries.retain(|e| e.student_id() != Some(student_id));
    if !already_placed {
        entries.push(entry);
    }
    store.set_entries(key, entries);
    !already_placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::types::{Day, StaffCategory};

    fn roster() -> (Vec<Student>, Vec<StaffMember>) {
        let students = (1..=2)
            .map(|id| Student {
                id,
                name: format!("Student {}", id),
                grade: 1,
                class_number: 1,
                severity: 1,
                target_subjects: vec!["Math".into()],
            })
            .collect();
        let staff = vec![StaffMember {
            id: 10,
            name: "Lee".into(),
            category: StaffCategory::Practical,
            fixed_assignees: vec![],
        }];
        (students, staff)
    }

    fn cell() -> SlotKey {
        SlotKey::new(Day::Mon, 2).unwrap()
    }

    #[test]
    fn special_replaces_support_and_toggles_off() {
        let (students, staff) = roster();
        let mut store = SlotStore::new();

        assert!(place_support(&mut store, cell(), &students, &staff, 1, 10).unwrap());
        assert!(place_special(&mut store, cell(), &students, 1, "Math").unwrap());
        assert_eq!(
            store.entries(cell()),
            &[SlotEntry::Special { student_id: 1, subject: "Math".into() }]
        );

        assert!(!place_special(&mut store, cell(), &students, 1, "Math").unwrap());
        assert!(store.entries(cell()).is_empty());
    }

    #[test]
    fn staff_cannot_support_two_students_in_one_cell() {
        let (students, staff) = roster();
        let mut store = SlotStore::new();
        place_support(&mut store, cell(), &students, &staff, 1, 10).unwrap();

        let err = place_support(&mut store, cell(), &students, &staff, 2, 10).unwrap_err();
        assert_eq!(err, EditError::StaffBusy { staff_id: 10, slot: cell() });
    }

    #[test]
    fn blocking_clears_support_but_keeps_specials() {
        let (students, staff) = roster();
        let mut store = SlotStore::new();
        place_special(&mut store, cell(), &students, 1, "Math").unwrap();
        place_support(&mut store, cell(), &students, &staff, 2, 10).unwrap();

        assert!(toggle_blocked(&mut store, cell()));
        assert_eq!(
            store.entries(cell()),
            &[
                SlotEntry::Special { student_id: 1, subject: "Math".into() },
                SlotEntry::Blocked,
            ]
        );
        assert_eq!(
            place_support(&mut store, cell(), &students, &staff, 2, 10),
            Err(EditError::SlotBlocked(cell()))
        );

        assert!(!toggle_blocked(&mut store, cell()));
        assert_eq!(store.support_entry_count(), 0);
        assert!(!store.is_blocked(cell()));
    }

    #[test]
    fn rejects_unknown_ids_and_blank_subjects() {
        let (students, staff) = roster();
        let mut store = SlotStore::new();
        assert_eq!(
            place_special(&mut store, cell(), &students, 9, "Math"),
            Err(EditError::UnknownStudent(9))
        );
        assert_eq!(
            place_support(&mut store, cell(), &students, &staff, 1, 99),
            Err(EditError::UnknownStaff(99))
        );
        assert_eq!(
            place_special(&mut store, cell(), &students, 1, "  "),
            Err(EditError::EmptySubject)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn clear_student_reports_removal() {
        let (students, staff) = roster();
        let mut store = SlotStore::new();
        place_support(&mut store, cell(), &students, &staff, 1, 10).unwrap();

        assert!(clear_student(&mut store, cell(), 1).unwrap());
        assert!(!clear_student(&mut store, cell(), 1).unwrap());
    }
}
