use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{SlotEntry, SlotStore, StaffId, StaffMember, Student, StudentId};

/// Weekly load derived from one semester's store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimetableStats {
    /// Cells with at least one special class placement
    pub teacher_classes: u32,
    pub support_counts: BTreeMap<StaffId, u32>,
    pub student_support_counts: BTreeMap<StudentId, u32>,
}

/// Counts support entries per staff member and per student.
/// Every roster id gets a row even when it has no entries.
pub fn compute_stats(store: &SlotStore, students: &[Student], staff: &[StaffMember]) -> TimetableStats {
    let mut stats = TimetableStats {
        teacher_classes: 0,
        support_counts: staff.iter().map(|m| (m.id, 0)).collect(),
        student_support_counts: students.iter().map(|s| (s.id, 0)).collect(),
    };

    for (_, entries) in store.iter() {
        if entries.iter().any(SlotEntry::is_special) {
            stats.teacher_classes += 1;
        }
        for entry in entries {
            if let SlotEntry::Support { student_id, staff_id } = entry {
                *stats.support_counts.entry(*staff_id).or_insert(0) += 1;
                *stats.student_support_counts.entry(*student_id).or_insert(0) += 1;
            }
        }
    }

    stats
}
