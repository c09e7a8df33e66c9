//! Human-readable renderings of records, the roster, and the waiting queue.
//! Everything here is pure; the UI decides where the text goes.

use crate::models::Student;

const SEPARATOR: &str = "----------------";

/// Multi-line description of one student.
pub fn format_student(student: &Student) -> String {
    let [g1, g2, g3, g4] = *student.grades.values();
    format!(
        "Last name: {}\nFirst name: {}\nCNE: {}\nGrades: {g1:.2}, {g2:.2}, {g3:.2}, {g4:.2}\nAverage: {:.2}",
        student.last_name,
        student.first_name,
        student.cne,
        student.average()
    )
}

/// Numbered listing of every record with full details.
pub fn format_roster<'a, I>(students: I) -> String
where
    I: IntoIterator<Item = &'a Student>,
{
    let mut out = String::new();
    for (idx, student) in students.into_iter().enumerate() {
        out.push_str(&format!(
            "Student {}:\n{}\n{SEPARATOR}\n",
            idx + 1,
            format_student(student)
        ));
    }
    if out.is_empty() {
        out.push_str("No students in the list.");
    }
    out
}

/// Names and averages only, in the order given. Used for the ranking view.
pub fn format_ranking<'a, I>(students: I) -> String
where
    I: IntoIterator<Item = &'a Student>,
{
    let lines: Vec<String> = students
        .into_iter()
        .enumerate()
        .map(|(idx, s)| {
            format!(
                "{:>3}. {} {}: {:.2}",
                idx + 1,
                s.last_name,
                s.first_name,
                s.average()
            )
        })
        .collect();
    if lines.is_empty() {
        "No students in the list.".to_string()
    } else {
        lines.join("\n")
    }
}

/// Waiting requests in FIFO order, oldest first.
pub fn format_queue<'a, I>(students: I) -> String
where
    I: IntoIterator<Item = &'a Student>,
{
    let lines: Vec<String> = students
        .into_iter()
        .enumerate()
        .map(|(idx, s)| format!("{}. {} (average {:.2})", idx + 1, s, s.average()))
        .collect();
    if lines.is_empty() {
        "The waiting queue is empty.".to_string()
    } else {
        lines.join("\n")
    }
}
