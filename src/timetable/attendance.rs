use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{SlotKey, DAYS_PER_WEEK, PERIODS_PER_DAY};

/// Presence grid of one grade: `grid[day][period - 1]`
pub type WeekGrid = [[bool; PERIODS_PER_DAY as usize]; DAYS_PER_WEEK];

pub const GRADES: std::ops::RangeInclusive<u8> = 1..=6;

/// Per grade, whether that grade's students are in their homeroom
/// (and so eligible for support) at each cell of the week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceMatrix {
    grades: BTreeMap<u8, WeekGrid>,
}

impl Default for AttendanceMatrix {
    /// Every grade present in every period
    fn default() -> Self {
        let grades = GRADES
            .map(|grade| (grade, [[true; PERIODS_PER_DAY as usize]; DAYS_PER_WEEK]))
            .collect();
        AttendanceMatrix { grades }
    }
}

impl AttendanceMatrix {
    /// Matrix with no grade rows; every lookup reads as absent
    pub fn empty() -> Self {
        AttendanceMatrix { grades: BTreeMap::new() }
    }

    /// A grade without a row is treated as absent
    pub fn is_present(&self, grade: u8, key: SlotKey) -> bool {
        self.grades
            .get(&grade)
            .and_then(|grid| grid.get(key.day().index()))
            .and_then(|row| row.get(key.period_index()))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, grade: u8, key: SlotKey, present: bool) {
        let grid = self.grades.entry(grade).or_insert([[false; PERIODS_PER_DAY as usize]; DAYS_PER_WEEK]);
        grid[key.day().index()][key.period_index()] = present;
    }

    /// Flips one cell and returns the new value
    pub fn toggle(&mut self, grade: u8, key: SlotKey) -> bool {
        let present = !self.is_present(grade, key);
        self.set(grade, key, present);
        present
    }

    pub fn row(&self, grade: u8) -> Option<&WeekGrid> {
        self.grades.get(&grade)
    }

    pub fn set_row(&mut self, grade: u8, grid: WeekGrid) {
        self.grades.insert(grade, grid);
    }

    pub fn grades(&self) -> impl Iterator<Item = u8> + '_ {
        self.grades.keys().copied()
    }
}
