//! Domain models passed between the roster core and the terminal front-end.
//! The types stay light-weight data holders; the only logic they carry is
//! field validation and the derived average, so every layer agrees on what a
//! well-formed record looks like.

use std::fmt;

use crate::error::{Result, RosterError};

/// Student identifier. Unique within the roster and, separately, within the
/// waiting queue.
pub type Cne = u32;

/// Longest accepted name, in bytes.
pub const MAX_NAME_LEN: usize = 50;
/// Number of grades recorded per student.
pub const GRADE_COUNT: usize = 4;
/// Inclusive lower bound of a grade.
pub const GRADE_MIN: f64 = 0.0;
/// Inclusive upper bound of a grade.
pub const GRADE_MAX: f64 = 20.0;
/// Decimal places kept for a grade, both in memory and on disk.
pub const GRADE_DECIMALS: i32 = 2;

/// The four grades of a student. The average is always derived from these
/// values and never stored alongside them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grades([f64; GRADE_COUNT]);

impl Grades {
    /// Values are rounded to [`GRADE_DECIMALS`] places, the precision of the
    /// roster file, so a record reads back exactly as it was written.
    pub fn new(values: [f64; GRADE_COUNT]) -> Self {
        let scale = 10f64.powi(GRADE_DECIMALS);
        Self(values.map(|grade| (grade * scale).round() / scale))
    }

    pub fn values(&self) -> &[f64; GRADE_COUNT] {
        &self.0
    }

    /// Arithmetic mean of the four grades.
    pub fn average(&self) -> f64 {
        self.0.iter().sum::<f64>() / GRADE_COUNT as f64
    }

    fn validate(&self) -> Result<()> {
        for (idx, grade) in self.0.iter().enumerate() {
            if !grade.is_finite() || *grade < GRADE_MIN || *grade > GRADE_MAX {
                return Err(RosterError::Validation(format!(
                    "Grade {} must be between {GRADE_MIN} and {GRADE_MAX} (got {grade}).",
                    idx + 1
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A student record as held by the roster and the waiting queue.
pub struct Student {
    pub last_name: String,
    pub first_name: String,
    /// Unique key. Always strictly positive.
    pub cne: Cne,
    pub grades: Grades,
}

impl Student {
    /// Build a validated record. The same checks run again whenever a record
    /// enters the store or the queue, so hand-built structs cannot sneak past.
    pub fn new(
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        cne: Cne,
        grades: Grades,
    ) -> Result<Self> {
        let student = Self {
            last_name: last_name.into(),
            first_name: first_name.into(),
            cne,
            grades,
        };
        student.validate()?;
        Ok(student)
    }

    /// Mean of the four grades, recomputed on every call.
    pub fn average(&self) -> f64 {
        self.grades.average()
    }

    /// Check the invariants the persisted format and the key index rely on.
    pub fn validate(&self) -> Result<()> {
        validate_name("Last name", &self.last_name)?;
        validate_name("First name", &self.first_name)?;
        if self.cne == 0 {
            return Err(RosterError::Validation(
                "CNE must be a positive number.".to_string(),
            ));
        }
        self.grades.validate()
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (CNE {})", self.last_name, self.first_name, self.cne)
    }
}

/// Names are stored as single whitespace-delimited tokens on disk.
fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(RosterError::Validation(format!("{field} is required.")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(RosterError::Validation(format!(
            "{field} must be a single word."
        )));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(RosterError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} bytes."
        )));
    }
    Ok(())
}

/// Ordering state of the roster. Any insert, delete, or restore puts the
/// store back to `Unsorted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Unsorted,
    Ascending,
    Descending,
}

impl SortMode {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortMode::Ascending
        } else {
            SortMode::Descending
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Unsorted => "Unsorted",
            SortMode::Ascending => "Sorted by average (ascending)",
            SortMode::Descending => "Sorted by average (descending)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn grades() -> Grades {
        Grades::new([12.0, 14.0, 16.0, 18.0])
    }

    #[test]
    fn average_is_mean_of_grades() {
        let student = Student::new("Benali", "Youssef", 7, grades()).unwrap();
        assert_eq!(student.average(), 15.0);
    }

    #[test]
    fn rejects_out_of_range_grades() {
        let err = Student::new("Benali", "Youssef", 7, Grades::new([12.0, 20.5, 0.0, 3.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("Grade 2"));

        let err = Student::new("Benali", "Youssef", 7, Grades::new([f64::NAN, 1.0, 1.0, 1.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn rejects_zero_cne_and_bad_names() {
        assert!(Student::new("Benali", "Youssef", 0, grades()).is_err());
        assert!(Student::new("", "Youssef", 1, grades()).is_err());
        assert!(Student::new("Ben Ali", "Youssef", 1, grades()).is_err());
        assert!(Student::new("B".repeat(MAX_NAME_LEN + 1), "Youssef", 1, grades()).is_err());
        assert!(Student::new("B".repeat(MAX_NAME_LEN), "Youssef", 1, grades()).is_ok());
    }

    #[test]
    fn grades_keep_two_decimals() {
        let grades = Grades::new([12.345, 9.999, 10.0, 0.004]);
        let [a, b, c, d] = *grades.values();
        assert!((a - 12.35).abs() < 1e-9 || (a - 12.34).abs() < 1e-9);
        assert_eq!(b, 10.0);
        assert_eq!(c, 10.0);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn display_names_the_student() {
        let student = Student::new("Benali", "Youssef", 42, grades()).unwrap();
        assert_eq!(student.to_string(), "Benali Youssef (CNE 42)");
    }
}
