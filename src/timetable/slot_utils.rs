use super::types::{Day, SlotKey, PERIODS_PER_DAY};

/// All 30 cells in the order the week is processed:
/// Mon period 1..6, then Tue period 1..6, ... Fri period 6
pub fn all_slot_keys() -> impl Iterator<Item = SlotKey> {
    Day::ALL
        .into_iter()
        .flat_map(|day| (1..=PERIODS_PER_DAY).filter_map(move |period| SlotKey::new(day, period)))
}

/// Parses a cell key such as "Mon-3", "mon 3" or "Mon/3"
pub fn parse_slot_key(raw: &str) -> Option<SlotKey> {
    let trimmed = raw.trim();
    let mut parts = trimmed.split(|c: char| c == '-' || c == '/' || c.is_whitespace());
    let day: Day = parts.next()?.parse().ok()?;
    let period: u8 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    SlotKey::new(day, period)
}

/// Human readable cell name, e.g. "Mon period 3"
pub fn slot_label(key: SlotKey) -> String {
    format!("{} period {}", key.day(), key.period())
}
