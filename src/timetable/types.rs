use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type StudentId = u64;
pub type StaffId = u64;

pub const DAYS_PER_WEEK: usize = 5;
pub const PERIODS_PER_DAY: u8 = 6;

/// School day of the weekly timetable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Day {
    pub const ALL: [Day; DAYS_PER_WEEK] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri];

    /// Zero-based column of this day in a week grid
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Day> {
        Day::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mon" | "monday" | "1" => Ok(Day::Mon),
            "tue" | "tuesday" | "2" => Ok(Day::Tue),
            "wed" | "wednesday" | "3" => Ok(Day::Wed),
            "thu" | "thursday" | "4" => Ok(Day::Thu),
            "fri" | "friday" | "5" => Ok(Day::Fri),
            other => Err(format!("Unknown day: {}", other)),
        }
    }
}

/// One `(day, period)` cell of the weekly timetable.
///
/// Ordering is day-major then period, which is also the order the
/// auto-assignment engine walks the week in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    day: Day,
    period: u8,
}

impl SlotKey {
    /// Returns None when the period is outside 1..=6
    pub fn new(day: Day, period: u8) -> Option<SlotKey> {
        if (1..=PERIODS_PER_DAY).contains(&period) {
            Some(SlotKey { day, period })
        } else {
            None
        }
    }

    pub fn day(self) -> Day {
        self.day
    }

    /// 1-based period of the day
    pub fn period(self) -> u8 {
        self.period
    }

    /// Zero-based row of this period in a week grid
    pub fn period_index(self) -> usize {
        (self.period - 1) as usize
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day, self.period)
    }
}

impl FromStr for SlotKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::slot_utils::parse_slot_key(s).ok_or_else(|| format!("Invalid slot: {}", s))
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single entry inside a timetable cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotEntry {
    /// Student attends the special class; authored by hand, never touched by auto-assign
    Special { student_id: StudentId, subject: String },
    /// Support staff member paired with a student in their homeroom
    Support { student_id: StudentId, staff_id: StaffId },
    /// Whole cell is excluded from support assignment
    Blocked,
}

impl SlotEntry {
    pub fn student_id(&self) -> Option<StudentId> {
        match self {
            SlotEntry::Special { student_id, .. } | SlotEntry::Support { student_id, .. } => {
                Some(*student_id)
            }
            SlotEntry::Blocked => None,
        }
    }

    pub fn staff_id(&self) -> Option<StaffId> {
        match self {
            SlotEntry::Support { staff_id, .. } => Some(*staff_id),
            SlotEntry::Special { .. } | SlotEntry::Blocked => None,
        }
    }

    pub fn is_special(&self) -> bool {
        matches!(self, SlotEntry::Special { .. })
    }

    pub fn is_support(&self) -> bool {
        matches!(self, SlotEntry::Support { .. })
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, SlotEntry::Blocked)
    }
}

/// Entries of every cell for one semester (cell -> entries).
/// Cells without entries are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotStore {
    cells: BTreeMap<SlotKey, Vec<SlotEntry>>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, key: SlotKey) -> &[SlotEntry] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replaces the entries of a cell, dropping the cell when the list is empty
    pub fn set_entries(&mut self, key: SlotKey, entries: Vec<SlotEntry>) {
        if entries.is_empty() {
            self.cells.remove(&key);
        } else {
            self.cells.insert(key, entries);
        }
    }

    pub fn push(&mut self, key: SlotKey, entry: SlotEntry) {
        self.cells.entry(key).or_default().push(entry);
    }

    pub fn is_blocked(&self, key: SlotKey) -> bool {
        self.entries(key).iter().any(SlotEntry::is_blocked)
    }

    /// Removes every entry matching the predicate in every cell
    pub fn retain_entries<F>(&mut self, mut keep: F)
    where
        F: FnMut(&SlotEntry) -> bool,
    {
        for entries in self.cells.values_mut() {
            entries.retain(|entry| keep(entry));
        }
        self.cells.retain(|_, entries| !entries.is_empty());
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &[SlotEntry])> {
        self.cells.iter().map(|(key, entries)| (*key, entries.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn support_entry_count(&self) -> usize {
        self.cells
            .values()
            .flat_map(|entries| entries.iter())
            .filter(|entry| entry.is_support())
            .count()
    }
}

/// A pupil on the class roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub grade: u8,
    #[serde(default = "default_class_number")]
    pub class_number: u8,
    /// Lower rank = more severe = served first
    pub severity: u8,
    #[serde(default)]
    pub target_subjects: Vec<String>,
}

fn default_class_number() -> u8 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffCategory {
    Practical,
    SocialService,
}

impl FromStr for StaffCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "practical" => Ok(StaffCategory::Practical),
            "social" | "social_service" | "social-service" => Ok(StaffCategory::SocialService),
            other => Err(format!("Unknown staff category: {}", other)),
        }
    }
}

/// A support staff member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub category: StaffCategory,
    /// Students this member is pre-assigned to
    #[serde(default)]
    pub fixed_assignees: Vec<StudentId>,
}

/// Greedy strategy used by the auto-assignment engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    #[default]
    Severity,
    Equal,
}

impl FromStr for Heuristic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "severity" => Ok(Heuristic::Severity),
            "equal" => Ok(Heuristic::Equal),
            other => Err(format!("Unknown heuristic: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Semester(u8);

impl Semester {
    pub const FIRST: Semester = Semester(1);
    pub const SECOND: Semester = Semester(2);

    pub fn new(value: u8) -> Option<Semester> {
        match value {
            1 | 2 => Some(Semester(value)),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slot stores for every semester of the school year
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable {
    semesters: BTreeMap<Semester, SlotStore>,
}

impl Timetable {
    /// A semester that was never edited reads as an empty store
    pub fn store(&self, semester: Semester) -> SlotStore {
        self.semesters.get(&semester).cloned().unwrap_or_default()
    }

    pub fn store_mut(&mut self, semester: Semester) -> &mut SlotStore {
        self.semesters.entry(semester).or_default()
    }

    pub fn replace(&mut self, semester: Semester, store: SlotStore) {
        self.semesters.insert(semester, store);
    }

    pub fn reset(&mut self, semester: Semester) {
        self.semesters.remove(&semester);
    }

    pub fn stores_mut(&mut self) -> impl Iterator<Item = &mut SlotStore> {
        self.semesters.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_entries_use_type_tag() {
        let entries = vec![
            SlotEntry::Special { student_id: 1, subject: "Math".to_string() },
            SlotEntry::Support { student_id: 2, staff_id: 10 },
            SlotEntry::Blocked,
        ];
        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[0]["type"], "special");
        assert_eq!(json[1]["staff_id"], 10);
        assert_eq!(json[2], serde_json::json!({ "type": "blocked" }));
    }

    #[test]
    fn slot_store_serializes_as_object_keyed_by_cell() {
        let mut store = SlotStore::new();
        let key = SlotKey::new(Day::Wed, 3).unwrap();
        store.push(key, SlotEntry::Blocked);

        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"Wed-3":[{"type":"blocked"}]}"#);

        let back: SlotStore = serde_json::from_str(&json).unwrap();
        assert!(back.is_blocked(key));
    }

    #[test]
    fn slot_key_rejects_out_of_range_periods() {
        assert!(SlotKey::new(Day::Mon, 0).is_none());
        assert!(SlotKey::new(Day::Mon, 7).is_none());
        assert!("Fri-9".parse::<SlotKey>().is_err());
        assert!(serde_json::from_str::<SlotKey>(r#""Mon-0""#).is_err());
    }

    #[test]
    fn slot_key_exposes_validated_cell() {
        let key = SlotKey::new(Day::Thu, 1).unwrap();
        assert_eq!(key.day(), Day::Thu);
        assert_eq!(key.period(), 1);
        assert_eq!(key.period_index(), 0);

        let key: SlotKey = serde_json::from_str(r#""Fri-6""#).unwrap();
        assert_eq!((key.day().index(), key.period_index()), (4, 5));
    }

    #[test]
    fn timetable_keys_semesters_independently() {
        let mut timetable = Timetable::default();
        let key = SlotKey::new(Day::Tue, 2).unwrap();
        timetable.store_mut(Semester::FIRST).push(key, SlotEntry::Blocked);

        assert!(timetable.store(Semester::FIRST).is_blocked(key));
        assert!(timetable.store(Semester::SECOND).is_empty());

        let json = serde_json::to_string(&timetable).unwrap();
        let back: Timetable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, timetable);

        timetable.reset(Semester::FIRST);
        assert!(timetable.store(Semester::FIRST).is_empty());
    }
}
