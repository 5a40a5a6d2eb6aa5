use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use super::attendance::AttendanceMatrix;
use super::error::AssignError;
use super::slot_utils::all_slot_keys;
use super::types::{
    Heuristic, SlotEntry, SlotKey, SlotStore, StaffId, StaffMember, Student, StudentId,
};

/// Running support counts for the whole week, threaded through the cell loop
/// by the equal-distribution heuristic
#[derive(Debug, Default)]
struct RunningCounts {
    students: HashMap<StudentId, u32>,
    staff: HashMap<StaffId, u32>,
}

impl RunningCounts {
    fn student(&self, id: StudentId) -> u32 {
        self.students.get(&id).copied().unwrap_or(0)
    }

    fn staff(&self, id: StaffId) -> u32 {
        self.staff.get(&id).copied().unwrap_or(0)
    }

    fn record(&mut self, student_id: StudentId, staff_id: StaffId) {
        *self.students.entry(student_id).or_insert(0) += 1;
        *self.staff.entry(staff_id).or_insert(0) += 1;
    }
}

/// Per-cell occupancy while the cell is being filled
struct CellState {
    busy_students: HashSet<StudentId>,
    busy_staff: HashSet<StaffId>,
    new_entries: Vec<SlotEntry>,
}

impl CellState {
    fn from_entries(entries: &[SlotEntry]) -> Self {
        CellState {
            busy_students: entries.iter().filter_map(SlotEntry::student_id).collect(),
            busy_staff: entries.iter().filter_map(SlotEntry::staff_id).collect(),
            new_entries: Vec::new(),
        }
    }

    fn pair(&mut self, student_id: StudentId, staff_id: StaffId) {
        self.busy_students.insert(student_id);
        self.busy_staff.insert(staff_id);
        self.new_entries.push(SlotEntry::Support { student_id, staff_id });
    }
}

/// Recomputes every support pairing of a semester.
///
/// `Special` and `Blocked` entries of `current` are carried over verbatim,
/// previous `Support` entries are discarded. Cells are processed day-major
/// (Mon period 1 .. Fri period 6), which matters for `Heuristic::Equal`
/// because its counts accumulate across cells.
pub fn assign_support(
    current: &SlotStore,
    students: &[Student],
    staff: &[StaffMember],
    attendance: &AttendanceMatrix,
    heuristic: Heuristic,
) -> Result<SlotStore, AssignError> {
    if staff.is_empty() {
        warn!("Auto-assignment requested with an empty staff roster");
        return Err(AssignError::NoStaffAvailable);
    }

    debug!(
        "Auto-assigning {} students across {} staff ({:?})",
        students.len(),
        staff.len(),
        heuristic
    );

    let mut next = SlotStore::new();
    let mut counts = RunningCounts::default();

    for key in all_slot_keys() {
        // Keep only hand-authored entries; support is rebuilt from scratch
        let kept: Vec<SlotEntry> = current
            .entries(key)
            .iter()
            .filter(|entry| !entry.is_support())
            .cloned()
            .collect();

        if kept.iter().any(SlotEntry::is_blocked) {
            next.set_entries(key, kept);
            continue;
        }

        let mut cell = CellState::from_entries(&kept);
        let candidates: Vec<&Student> = students
            .iter()
            .filter(|s| attendance.is_present(s.grade, key) && !cell.busy_students.contains(&s.id))
            .collect();

        match heuristic {
            Heuristic::Severity => fill_by_severity(&mut cell, candidates, staff),
            Heuristic::Equal => fill_evenly(&mut cell, candidates, staff, &mut counts),
        }

        let mut entries = kept;
        entries.append(&mut cell.new_entries);
        next.set_entries(key, entries);
    }

    info!(
        "Auto-assignment ({:?}) wrote {} support entries",
        heuristic,
        next.support_entry_count()
    );

    Ok(next)
}

/// Most severe first. A student with a fixed staff member only ever gets that
/// member. Students without one take the first free member in roster order,
/// skipping members held for a fixed student who is also a candidate here.
fn fill_by_severity(cell: &mut CellState, mut candidates: Vec<&Student>, staff: &[StaffMember]) {
    // Stable: equal ranks keep roster order
    candidates.sort_by_key(|s| s.severity);

    let fixed: Vec<Option<StaffId>> = candidates
        .iter()
        .map(|s| fixed_staff_for(staff, s.id).map(|m| m.id))
        .collect();

    for (position, student) in candidates.iter().enumerate() {
        if cell.busy_students.contains(&student.id) {
            continue;
        }
        match fixed[position] {
            Some(fixed_id) => {
                if !cell.busy_staff.contains(&fixed_id) {
                    cell.pair(student.id, fixed_id);
                }
            }
            None => {
                let reserved: HashSet<StaffId> = fixed[position + 1..]
                    .iter()
                    .flatten()
                    .copied()
                    .collect();
                if let Some(free) = staff
                    .iter()
                    .find(|m| !cell.busy_staff.contains(&m.id) && !reserved.contains(&m.id))
                {
                    cell.pair(student.id, free.id);
                }
            }
        }
    }
}

/// Pairs the least-served students with the least-used staff until either
/// side runs out for this cell. Fixed assignees are not consulted.
fn fill_evenly(
    cell: &mut CellState,
    mut candidates: Vec<&Student>,
    staff: &[StaffMember],
    counts: &mut RunningCounts,
) {
    candidates.sort_by_key(|s| counts.student(s.id));

    let mut free_staff: Vec<&StaffMember> = staff
        .iter()
        .filter(|m| !cell.busy_staff.contains(&m.id))
        .collect();
    free_staff.sort_by_key(|m| counts.staff(m.id));

    for (student, member) in candidates.into_iter().zip(free_staff) {
        cell.pair(student.id, member.id);
        counts.record(student.id, member.id);
    }
}

/// First staff member in roster order listing the student as a fixed assignee
pub fn fixed_staff_for(staff: &[StaffMember], student_id: StudentId) -> Option<&StaffMember> {
    staff.iter().find(|m| m.fixed_assignees.contains(&student_id))
}

/// Cells of a store that hold no support entry while at least one candidate
/// was present; handy for flagging under-staffed periods
pub fn unsupported_slots(
    store: &SlotStore,
    students: &[Student],
    attendance: &AttendanceMatrix,
) -> Vec<SlotKey> {
    all_slot_keys()
        .filter(|key| !store.is_blocked(*key))
        .filter(|key| {
            let entries = store.entries(*key);
            let any_present = students.iter().any(|s| {
                attendance.is_present(s.grade, *key)
                    && !entries.iter().any(|e| e.student_id() == Some(s.id))
            });
            any_present && !entries.iter().any(SlotEntry::is_support)
        })
        .collect()
}
