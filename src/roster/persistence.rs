//! Text-file persistence for the roster. One record per line:
//!
//! ```text
//! last first cne g1 g2 g3 g4
//! ```
//!
//! Grades are written with two decimals. The average is never stored; it is
//! derived again from the grades whenever a record is read back.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, RosterError};
use crate::models::{Cne, Grades, Student, GRADE_COUNT};

use super::store::RecordStore;

/// Fields expected on each line.
const FIELD_COUNT: usize = 3 + GRADE_COUNT;

/// Read and parse the roster file at `path`.
pub fn load(path: &Path) -> Result<RecordStore> {
    let contents = fs::read_to_string(path).map_err(|err| RosterError::io(path, err))?;
    parse(&contents)
}

/// Parse roster text. Blank lines are skipped; any other malformed line
/// fails the whole parse with its 1-based line number.
pub fn parse(contents: &str) -> Result<RecordStore> {
    let mut store = RecordStore::new();
    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let student = parse_line(line, line_no)?;
        let cne = student.cne;
        store.insert(student).map_err(|_| RosterError::Parse {
            line: line_no,
            reason: format!("CNE {cne} appears more than once"),
        })?;
    }
    Ok(store)
}

/// Write every record in current order, replacing `path` atomically: the
/// data goes to a temporary file in the same directory which is then renamed
/// over the target, so a failed write never leaves a truncated roster.
pub fn save(store: &RecordStore, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut contents = String::new();
    for student in store {
        contents.push_str(&format_line(student));
        contents.push('\n');
    }

    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| RosterError::io(dir, err))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|err| RosterError::io(tmp.path(), err))?;
    // The temp file is created owner-only; keep the roster's existing mode.
    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|err| RosterError::io(tmp.path(), err))?;
    }
    tmp.persist(path)
        .map_err(|err| RosterError::io(path, err.error))?;
    Ok(())
}

/// Render one record in the on-disk line format.
pub fn format_line(student: &Student) -> String {
    let [g1, g2, g3, g4] = *student.grades.values();
    format!(
        "{} {} {} {g1:.2} {g2:.2} {g3:.2} {g4:.2}",
        student.last_name, student.first_name, student.cne
    )
}

fn parse_line(line: &str, line_no: usize) -> Result<Student> {
    let parse_err = |reason: String| RosterError::Parse {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != FIELD_COUNT {
        return Err(parse_err(format!(
            "expected {FIELD_COUNT} fields, found {}",
            fields.len()
        )));
    }

    let cne: Cne = fields[2]
        .parse()
        .map_err(|_| parse_err(format!("invalid CNE '{}'", fields[2])))?;

    let mut grades = [0.0; GRADE_COUNT];
    for (slot, raw) in grades.iter_mut().zip(&fields[3..]) {
        *slot = raw
            .parse()
            .map_err(|_| parse_err(format!("invalid grade '{raw}'")))?;
    }

    Student::new(fields[0], fields[1], cne, Grades::new(grades))
        .map_err(|err| parse_err(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_records_in_file_order() {
        let store = parse("Alami Said 1001 15.00 16.00 15.50 15.50\n\nBerrada Hind 1002 12 12 12 12\n")
            .unwrap();
        let cnes: Vec<_> = store.iter().map(|s| s.cne).collect();
        assert_eq!(cnes, vec![1001, 1002]);
        assert_eq!(store.find(1001).unwrap().average(), 15.5);
        assert_eq!(store.find(1002).unwrap().first_name, "Hind");
    }

    #[test]
    fn reports_line_of_malformed_record() {
        let err = parse("Alami Said 1001 15 16 15 15\nBerrada Hind twelve 1 2 3 4\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().starts_with("line 2:"));

        let err = parse("Alami Said 1001 15 16 15\n").unwrap_err();
        assert!(err.to_string().contains("expected 7 fields, found 6"));
    }

    #[test]
    fn out_of_range_values_are_parse_errors() {
        let err = parse("Alami Said 1001 15 16 15 25\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = parse("Alami Said 0 15 16 15 15\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = parse("Alami Said -4 15 16 15 15\n").unwrap_err();
        assert!(err.to_string().contains("invalid CNE"));
    }

    #[test]
    fn duplicate_cne_in_file_is_rejected() {
        let err = parse("A B 1 1 1 1 1\nC D 1 2 2 2 2\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn line_format_uses_two_decimals() {
        let student =
            Student::new("Alami", "Said", 1001, Grades::new([15.0, 16.25, 15.5, 0.0])).unwrap();
        assert_eq!(format_line(&student), "Alami Said 1001 15.00 16.25 15.50 0.00");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.txt");
        let store = parse("Alami Said 1001 15 16 15.5 15.5\nBerrada Hind 1002 12 12 12 12\n").unwrap();

        save(&store, &path).unwrap();
        let reloaded = load(&path).unwrap();

        assert_eq!(reloaded.records(), store.records());
    }

    #[test]
    fn three_decimal_grades_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.txt");
        let store = parse("Alami Said 1001 12.345 10 10 10\n").unwrap();

        save(&store, &path).unwrap();
        let reloaded = load(&path).unwrap();

        assert_eq!(reloaded.records(), store.records());
        save(&reloaded, &path).unwrap();
        assert_eq!(load(&path).unwrap().records(), store.records());
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.txt");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = parse("Alami Said 1001 15 16 15.5 15.5\n").unwrap();
        save(&store, &path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
