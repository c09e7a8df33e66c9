use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Cne, Grades, Student, GRADE_COUNT, GRADE_MAX, GRADE_MIN};

/// Fields of the student form, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum StudentField {
    #[default]
    LastName,
    FirstName,
    Cne,
    Grade(usize),
}

impl StudentField {
    const ORDER: [StudentField; 3 + GRADE_COUNT] = [
        StudentField::LastName,
        StudentField::FirstName,
        StudentField::Cne,
        StudentField::Grade(0),
        StudentField::Grade(1),
        StudentField::Grade(2),
        StudentField::Grade(3),
    ];

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    /// Label shown in front of the input. The cursor offset is derived from it.
    pub(crate) fn label(self) -> String {
        match self {
            StudentField::LastName => "Last name".to_string(),
            StudentField::FirstName => "First name".to_string(),
            StudentField::Cne => "CNE".to_string(),
            StudentField::Grade(idx) => format!("Grade {}", idx + 1),
        }
    }
}

/// Input state shared by the "add student" and "queue request" dialogs.
#[derive(Default, Clone, Debug)]
pub(crate) struct StudentForm {
    pub(crate) last_name: String,
    pub(crate) first_name: String,
    pub(crate) cne: String,
    pub(crate) grades: [String; GRADE_COUNT],
    pub(crate) active: StudentField,
    pub(crate) error: Option<String>,
}

impl StudentForm {
    pub(crate) fn fields() -> &'static [StudentField] {
        &StudentField::ORDER
    }

    /// Move focus forward (or backward) through the fields, wrapping around.
    pub(crate) fn cycle_field(&mut self, forward: bool) {
        let len = StudentField::ORDER.len();
        let current = self.active.position();
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.active = StudentField::ORDER[next];
    }

    fn value(&self, field: StudentField) -> &String {
        match field {
            StudentField::LastName => &self.last_name,
            StudentField::FirstName => &self.first_name,
            StudentField::Cne => &self.cne,
            StudentField::Grade(idx) => &self.grades[idx],
        }
    }

    fn value_mut(&mut self, field: StudentField) -> &mut String {
        match field {
            StudentField::LastName => &mut self.last_name,
            StudentField::FirstName => &mut self.first_name,
            StudentField::Cne => &mut self.cne,
            StudentField::Grade(idx) => &mut self.grades[idx],
        }
    }

    /// Append a character to the active field, rejecting characters the field
    /// can never contain. Names are single words on disk, so whitespace is out.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let allowed = match self.active {
            StudentField::LastName | StudentField::FirstName => {
                !ch.is_control() && !ch.is_whitespace()
            }
            StudentField::Cne => ch.is_ascii_digit(),
            StudentField::Grade(_) => ch.is_ascii_digit() || ch == '.',
        };
        if allowed {
            let field = self.active;
            self.value_mut(field).push(ch);
        }
        allowed
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    /// Validate the inputs and build a student record.
    pub(crate) fn parse_inputs(&self) -> Result<Student> {
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            return Err(anyhow!("Last name is required."));
        }
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(anyhow!("First name is required."));
        }
        let cne = parse_cne(&self.cne)?;

        let mut grades = [0.0; GRADE_COUNT];
        for (idx, (slot, raw)) in grades.iter_mut().zip(&self.grades).enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(anyhow!("Grade {} is required.", idx + 1));
            }
            let grade: f64 = raw
                .parse()
                .map_err(|_| anyhow!("Grade {} must be a number.", idx + 1))?;
            if !(GRADE_MIN..=GRADE_MAX).contains(&grade) {
                return Err(anyhow!(
                    "Grades must be between {GRADE_MIN} and {GRADE_MAX}."
                ));
            }
            *slot = grade;
        }

        Ok(Student::new(last_name, first_name, cne, Grades::new(grades))?)
    }

    /// Render one field line with placeholder styling and focus highlighting.
    pub(crate) fn build_line(&self, field: StudentField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    /// Character count of the active field, used to place the cursor.
    pub(crate) fn active_len(&self) -> usize {
        self.value(self.active).chars().count()
    }

    /// Row of the active field inside the form.
    pub(crate) fn active_row(&self) -> usize {
        self.active.position()
    }
}

/// Single-field dialog asking for a CNE.
#[derive(Default, Clone, Debug)]
pub(crate) struct CneForm {
    pub(crate) cne: String,
    pub(crate) error: Option<String>,
}

impl CneForm {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_ascii_digit() {
            self.cne.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.cne.pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<Cne> {
        parse_cne(&self.cne)
    }
}

/// Confirmation state for deleting a roster entry.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) student: Student,
}

impl From<Student> for ConfirmDelete {
    fn from(student: Student) -> Self {
        Self { student }
    }
}

fn parse_cne(raw: &str) -> Result<Cne> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(anyhow!("CNE is required."));
    }
    let cne: Cne = raw
        .parse()
        .map_err(|_| anyhow!("CNE must be a valid number."))?;
    if cne == 0 {
        return Err(anyhow!("CNE must be a positive number."));
    }
    Ok(cne)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::helpers::surface_error;

    fn filled_form() -> StudentForm {
        let mut form = StudentForm::default();
        for ch in "Alami".chars() {
            form.push_char(ch);
        }
        form.cycle_field(true);
        for ch in "Said".chars() {
            form.push_char(ch);
        }
        form.cycle_field(true);
        for ch in "1001".chars() {
            form.push_char(ch);
        }
        for grade in ["15", "16", "15.5", "15.5"] {
            form.cycle_field(true);
            for ch in grade.chars() {
                form.push_char(ch);
            }
        }
        form
    }

    #[test]
    fn builds_student_from_inputs() {
        let student = filled_form().parse_inputs().unwrap();
        assert_eq!(student.last_name, "Alami");
        assert_eq!(student.cne, 1001);
        assert_eq!(student.average(), 15.5);
    }

    #[test]
    fn rejects_disallowed_characters() {
        let mut form = StudentForm::default();
        assert!(!form.push_char(' '));
        form.active = StudentField::Cne;
        assert!(!form.push_char('x'));
        assert!(form.push_char('7'));
        assert_eq!(form.cne, "7");
    }

    #[test]
    fn reports_out_of_range_grade() {
        let mut form = filled_form();
        form.grades[2] = "25".to_string();
        let err = form.parse_inputs().unwrap_err();
        assert!(err.to_string().contains("between"));
    }

    #[test]
    fn malformed_numbers_show_field_message() {
        let mut form = filled_form();
        form.grades[0] = "1.2.3".to_string();
        let err = form.parse_inputs().unwrap_err();
        assert_eq!(surface_error(&err), "Grade 1 must be a number.");

        let mut form = filled_form();
        form.cne = "99999999999".to_string();
        let err = form.parse_inputs().unwrap_err();
        assert_eq!(surface_error(&err), "CNE must be a valid number.");
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut form = StudentForm::default();
        form.cycle_field(false);
        assert_eq!(form.active, StudentField::Grade(3));
        form.cycle_field(true);
        assert_eq!(form.active, StudentField::LastName);
    }

    #[test]
    fn cne_form_requires_positive_number() {
        let mut form = CneForm::default();
        assert!(form.parse_inputs().is_err());
        form.push_char('0');
        assert!(form.parse_inputs().is_err());
        form.backspace();
        form.push_char('4');
        form.push_char('2');
        assert_eq!(form.parse_inputs().unwrap(), 42);
    }
}
