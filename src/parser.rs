use csv::{Reader, ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::roster::submission::MAX_SEVERITY;
use crate::timetable::{AttendanceMatrix, Day, SlotKey, StaffCategory, StaffMember, Student};

/// Parses a boolean value from various string representations
pub fn parse_bool(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower == "yes" || lower == "true" || lower == "1" || lower == "o" || lower == "y"
}

/// Parses a number, returning None if empty or invalid
fn parse_number<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

/// Splits a `;`-separated cell, dropping blanks
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// CSV reader that accepts rows shorter or longer than the header,
/// so incomplete rows can be skipped instead of failing the import
pub fn csv_reader<R: Read>(rdr: R) -> Reader<R> {
    ReaderBuilder::new().flexible(true).from_reader(rdr)
}

/// Finds a column by header name, falling back to a fixed position
fn column(headers: &StringRecord, names: &[&str], fallback: usize) -> usize {
    headers
        .iter()
        .position(|h| {
            let h = h.trim().to_lowercase();
            names.iter().any(|name| h == *name)
        })
        .unwrap_or(fallback)
}

fn field<'a>(record: &'a StringRecord, col: usize) -> &'a str {
    record.get(col).unwrap_or("").trim()
}

/// Keeps roster order while letting a later row with the same id win
fn upsert<T, F>(rows: &mut Vec<T>, index: &mut HashMap<u64, usize>, id: u64, row: T, id_of: F)
where
    F: Fn(&T) -> u64,
{
    if let Some(&position) = index.get(&id) {
        debug!("Duplicate roster id {} merged into earlier row", id);
        rows[position] = row;
    } else {
        index.insert(id_of(&row), rows.len());
        rows.push(row);
    }
}

/// Reads the student roster.
///
/// Columns: id, name, grade, class, severity, subjects (`;`-separated).
/// Rows without an id or name, with a grade outside 1..=6 or a severity
/// outside 1..=5 are skipped.
pub fn read_students<R: Read>(mut reader: Reader<R>) -> Result<Vec<Student>, Box<dyn std::error::Error>> {
    let headers = reader.headers()?.clone();
    let id_col = column(&headers, &["id", "student_id"], 0);
    let name_col = column(&headers, &["name"], 1);
    let grade_col = column(&headers, &["grade"], 2);
    let class_col = column(&headers, &["class", "class_number"], 3);
    let severity_col = column(&headers, &["severity", "rank"], 4);
    let subjects_col = column(&headers, &["subjects", "target_subjects"], 5);

    let mut students = Vec::new();
    let mut index = HashMap::new();

    for result in reader.records() {
        let record = result?;

        let name = field(&record, name_col).to_string();
        let id: Option<u64> = parse_number(field(&record, id_col));
        let grade: Option<u8> = parse_number(field(&record, grade_col));
        let severity: Option<u8> = parse_number(field(&record, severity_col));

        let (id, grade) = match (id, grade) {
            (Some(id), Some(grade)) if !name.is_empty() && (1..=6).contains(&grade) => (id, grade),
            _ => {
                warn!("Skipping incomplete student row: {:?}", record);
                continue;
            }
        };
        let severity = match severity {
            Some(rank) if (1..=MAX_SEVERITY).contains(&rank) => rank,
            _ => {
                warn!("Skipping student {} with invalid severity: {:?}", id, field(&record, severity_col));
                continue;
            }
        };

        let student = Student {
            id,
            name,
            grade,
            class_number: parse_number(field(&record, class_col)).unwrap_or(1),
            severity,
            target_subjects: parse_list(field(&record, subjects_col)),
        };
        upsert(&mut students, &mut index, id, student, |s| s.id);
    }

    Ok(students)
}

/// Reads the staff roster.
///
/// Columns: id, name, category (`practical` | `social`), students (`;`-separated fixed assignee ids).
/// Rows with an unknown category are skipped.
pub fn read_staff<R: Read>(mut reader: Reader<R>) -> Result<Vec<StaffMember>, Box<dyn std::error::Error>> {
    let headers = reader.headers()?.clone();
    let id_col = column(&headers, &["id", "staff_id"], 0);
    let name_col = column(&headers, &["name"], 1);
    let category_col = column(&headers, &["category", "type"], 2);
    let assignees_col = column(&headers, &["students", "fixed_assignees"], 3);

    let mut staff = Vec::new();
    let mut index = HashMap::new();

    for result in reader.records() {
        let record = result?;

        let name = field(&record, name_col).to_string();
        let id = match parse_number::<u64>(field(&record, id_col)) {
            Some(id) if !name.is_empty() => id,
            _ => {
                warn!("Skipping incomplete staff row: {:?}", record);
                continue;
            }
        };

        let category: StaffCategory = match field(&record, category_col).parse() {
            Ok(category) => category,
            Err(e) => {
                warn!("Skipping staff {}: {}", id, e);
                continue;
            }
        };
        let fixed_assignees = parse_list(field(&record, assignees_col))
            .iter()
            .filter_map(|raw| parse_number(raw))
            .collect();

        let member = StaffMember { id, name, category, fixed_assignees };
        upsert(&mut staff, &mut index, id, member, |m| m.id);
    }

    Ok(staff)
}

/// Reads grade presence rows: `grade, day, p1, p2, p3, p4, p5, p6`.
/// Grades without any row stay absent.
pub fn read_attendance<R: Read>(mut reader: Reader<R>) -> Result<AttendanceMatrix, Box<dyn std::error::Error>> {
    let mut matrix = AttendanceMatrix::empty();

    for result in reader.records() {
        let record = result?;
        if record.len() < 8 {
            warn!("Skipping incomplete attendance row: {:?}", record);
            continue;
        }

        let grade: Option<u8> = parse_number(field(&record, 0));
        let day: Option<Day> = field(&record, 1).parse().ok();
        let (grade, day) = match (grade, day) {
            (Some(grade), Some(day)) => (grade, day),
            _ => {
                warn!("Skipping attendance row: {:?}", record);
                continue;
            }
        };

        for period in 1..=6u8 {
            if let Some(key) = SlotKey::new(day, period) {
                let present = parse_bool(field(&record, 1 + period as usize));
                matrix.set(grade, key, present);
            }
        }
    }

    Ok(matrix)
}

pub fn load_students<P: AsRef<Path>>(path: P) -> Result<Vec<Student>, Box<dyn std::error::Error>> {
    read_students(csv_reader(File::open(path)?))
}

pub fn load_staff<P: AsRef<Path>>(path: P) -> Result<Vec<StaffMember>, Box<dyn std::error::Error>> {
    read_staff(csv_reader(File::open(path)?))
}

pub fn load_attendance<P: AsRef<Path>>(path: P) -> Result<AttendanceMatrix, Box<dyn std::error::Error>> {
    read_attendance(csv_reader(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn reader(data: &str) -> Reader<&[u8]> {
        csv_reader(data.as_bytes())
    }

    #[test]
    fn students_keep_roster_order_and_merge_duplicates() {
        let data = "id,name,grade,class,severity,subjects\n\
                    3,Kim,2,1,2,Math; Korean\n\
                    1,Lee,4,2,1,\n\
                    3,Kim Minji,2,1,1,Art\n\
                    ,Nameless,2,1,1,\n\
                    5,Park,9,1,1,\n";
        let students = read_students(reader(data)).unwrap();

        assert_eq!(students.len(), 2);
        assert_eq!(students[0].id, 3);
        assert_eq!(students[0].name, "Kim Minji");
        assert_eq!(students[0].severity, 1);
        assert_eq!(students[0].target_subjects, vec!["Art".to_string()]);
        assert_eq!(students[1].id, 1);
        assert_eq!(students[1].class_number, 2);
        assert!(students[1].target_subjects.is_empty());
    }

    #[test]
    fn staff_columns_found_by_header_name() {
        let data = "name,id,students,category\n\
                    Choi,10,1;2,social\n\
                    Jung,11,,practical\n";
        let staff = read_staff(reader(data)).unwrap();

        assert_eq!(staff.len(), 2);
        assert_eq!(staff[0].id, 10);
        assert_eq!(staff[0].category, StaffCategory::SocialService);
        assert_eq!(staff[0].fixed_assignees, vec![1, 2]);
        assert!(staff[1].fixed_assignees.is_empty());
    }

    #[test]
    fn attendance_rows_fill_only_listed_grades() {
        let data = "grade,day,p1,p2,p3,p4,p5,p6\n\
                    3,Mon,yes,yes,no,no,1,0\n\
                    3,Tue,o,,,,,\n";
        let matrix = read_attendance(reader(data)).unwrap();

        let at = |day, period| SlotKey::new(day, period).unwrap();
        assert!(matrix.is_present(3, at(Day::Mon, 1)));
        assert!(!matrix.is_present(3, at(Day::Mon, 3)));
        assert!(matrix.is_present(3, at(Day::Mon, 5)));
        assert!(matrix.is_present(3, at(Day::Tue, 1)));
        assert!(!matrix.is_present(3, at(Day::Wed, 1)));
        assert!(!matrix.is_present(2, at(Day::Mon, 1)));
    }

    #[test]
    fn short_rows_are_skipped_and_the_rest_loads() {
        let data = "id,name,grade,class,severity,subjects\n\
                    1,Kim,2,1,2,Math\n\
                    2,Lee\n\
                    3,Park,3,1,1,\n";
        let students = read_students(reader(data)).unwrap();

        let ids: Vec<u64> = students.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let data = "grade,day,p1,p2,p3,p4,p5,p6\n\
                    3,Mon,yes\n\
                    4,Tue,yes,yes,yes,yes,yes,yes\n";
        let matrix = read_attendance(reader(data)).unwrap();
        assert!(!matrix.is_present(3, SlotKey::new(Day::Mon, 1).unwrap()));
        assert!(matrix.is_present(4, SlotKey::new(Day::Tue, 6).unwrap()));
    }

    #[test]
    fn severity_outside_rank_range_skips_the_row() {
        let data = "id,name,grade,class,severity,subjects\n\
                    1,Kim,2,1,0,\n\
                    2,Lee,2,1,200,\n\
                    3,Park,2,1,,\n\
                    4,Choi,2,1,x,\n\
                    5,Oh,2,1,5,\n";
        let students = read_students(reader(data)).unwrap();

        assert_eq!(students.len(), 1);
        assert_eq!(students[0].id, 5);
        assert_eq!(students[0].severity, 5);
    }

    #[test]
    fn unknown_staff_category_skips_the_row() {
        let data = "id,name,category,students\n\
                    10,Choi,janitor,1\n\
                    11,Jung,practical,\n";
        let staff = read_staff(reader(data)).unwrap();

        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].id, 11);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name,grade,class,severity,subjects").unwrap();
        writeln!(file, "1,Yoon,5,3,2,Music").unwrap();
        writeln!(file, "2,Ko").unwrap();
        file.flush().unwrap();

        let students = load_students(file.path()).unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].grade, 5);
    }
}
