use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::models::{Cne, Student};
use crate::roster::format_student;
use crate::session::{OperationResult, Outcome, Session};

use super::forms::{CneForm, ConfirmDelete, StudentForm};
use super::helpers::{average_style, centered_rect, student_row, surface_error, text_lines};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 5;

/// High-level navigation states, cycled with Tab.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum Screen {
    Students,
    Ranking,
    Queue,
}

impl Screen {
    fn next(self) -> Self {
        match self {
            Screen::Students => Screen::Ranking,
            Screen::Ranking => Screen::Queue,
            Screen::Queue => Screen::Students,
        }
    }

    fn previous(self) -> Self {
        match self {
            Screen::Students => Screen::Queue,
            Screen::Ranking => Screen::Students,
            Screen::Queue => Screen::Ranking,
        }
    }
}

/// Modal interaction state layered over the active screen.
pub(crate) enum Mode {
    Normal,
    AddingStudent(StudentForm),
    QueueingStudent(StudentForm),
    FindingStudent(CneForm),
    ConfirmDelete(ConfirmDelete),
    ShowingStudent(Student),
}

/// Holds the footer message text plus its severity.
pub(crate) struct StatusMessage {
    pub(crate) text: String,
    pub(crate) kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state: the roster session plus what the user is
/// looking at and typing into.
pub struct App {
    session: Session,
    screen: Screen,
    mode: Mode,
    /// Highlighted row on the students screen.
    selected: usize,
    /// Vertical scroll offset of the ranking and queue panels.
    scroll: u16,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            screen: Screen::Students,
            mode: Mode::Normal,
            selected: 0,
            scroll: 0,
            status: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Top-level key dispatcher. Every key goes through the active `Mode`,
    /// which returns the next mode. The boolean result tells the outer loop
    /// whether the user asked to exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingStudent(form) => self.handle_student_form(code, form, false)?,
            Mode::QueueingStudent(form) => self.handle_student_form(code, form, true)?,
            Mode::FindingStudent(form) => self.handle_find(code, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::ShowingStudent(student) => match code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Mode::Normal,
                _ => Mode::ShowingStudent(student),
            },
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => {
                self.switch_screen(self.screen.next());
                return Ok(Mode::Normal);
            }
            KeyCode::BackTab => {
                self.switch_screen(self.screen.previous());
                return Ok(Mode::Normal);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let result = self.session.reload(None);
                self.apply(result);
                self.clamp_selection();
                return Ok(Mode::Normal);
            }
            _ => {}
        }

        match self.screen {
            Screen::Students => self.handle_students_key(code),
            Screen::Ranking => {
                match code {
                    KeyCode::Char('a') | KeyCode::Char('A') => self.sort(true),
                    KeyCode::Char('d') | KeyCode::Char('D') => self.sort(false),
                    KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
                    KeyCode::Down => self.scroll_down(),
                    KeyCode::Home => self.scroll = 0,
                    _ => {}
                }
                Ok(Mode::Normal)
            }
            Screen::Queue => {
                match code {
                    KeyCode::Char('+') => {
                        self.clear_status();
                        return Ok(Mode::QueueingStudent(StudentForm::default()));
                    }
                    KeyCode::Char('-') => {
                        let result = self.session.dequeue();
                        self.apply(result);
                    }
                    KeyCode::Enter => {
                        let result = self.session.promote();
                        let enrolled = result.as_ref().ok().and_then(Outcome::record).map(|s| s.cne);
                        self.apply(result);
                        if let Some(cne) = enrolled {
                            self.focus(cne);
                        }
                    }
                    KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
                    KeyCode::Down => self.scroll_down(),
                    _ => {}
                }
                Ok(Mode::Normal)
            }
        }
    }

    fn handle_students_key(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.session.store().len().saturating_sub(1),
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingStudent(StudentForm::default()));
            }
            KeyCode::Char('-') => {
                if let Some(student) = self.current_student().cloned() {
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(ConfirmDelete::from(student)));
                }
                self.set_status("No student selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.clear_status();
                return Ok(Mode::FindingStudent(CneForm::default()));
            }
            KeyCode::Char('u') | KeyCode::Char('U') => {
                let result = self.session.undo_delete();
                let restored = result.as_ref().ok().and_then(Outcome::record).map(|s| s.cne);
                self.apply(result);
                if let Some(cne) = restored {
                    self.focus(cne);
                }
            }
            KeyCode::Char('a') | KeyCode::Char('A') => self.sort(true),
            KeyCode::Char('d') | KeyCode::Char('D') => self.sort(false),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    /// Shared handler for the add-student and queue-request dialogs.
    fn handle_student_form(
        &mut self,
        code: KeyCode,
        mut form: StudentForm,
        queue: bool,
    ) -> Result<Mode> {
        let wrap = |form| {
            if queue {
                Mode::QueueingStudent(form)
            } else {
                Mode::AddingStudent(form)
            }
        };

        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.cycle_field(true),
            KeyCode::BackTab | KeyCode::Up => form.cycle_field(false),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.submit_student(&form, queue) {
                Ok(()) => return Ok(Mode::Normal),
                Err(message) => {
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        Ok(wrap(form))
    }

    /// Validate the form and send it to the roster or the waiting queue.
    /// Errors come back as display text so the form can stay open.
    fn submit_student(&mut self, form: &StudentForm, queue: bool) -> Result<(), String> {
        let student = form.parse_inputs().map_err(|err| surface_error(&err))?;
        let cne = student.cne;
        let result = if queue {
            self.session.enqueue(student)
        } else {
            self.session.add_student(student)
        };

        match result {
            Ok(outcome) => {
                self.set_status(outcome.message, StatusKind::Info);
                if !queue {
                    self.focus(cne);
                }
                Ok(())
            }
            Err(err) => Err(err.to_string()),
        }
    }

    fn handle_find(&mut self, code: KeyCode, mut form: CneForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Search cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let lookup = form
                    .parse_inputs()
                    .map_err(|err| surface_error(&err))
                    .and_then(|cne| self.session.find_student(cne).map_err(|err| err.to_string()));
                match lookup {
                    Ok(outcome) => {
                        if let Some(student) = outcome.record().cloned() {
                            self.focus(student.cne);
                            self.set_status(outcome.message, StatusKind::Info);
                            return Ok(Mode::ShowingStudent(student));
                        }
                    }
                    Err(message) => {
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::FindingStudent(form))
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let result = self.session.delete_student(confirm.student.cne);
                let failed = result.is_err();
                self.apply(result);
                self.clamp_selection();
                if failed {
                    Ok(Mode::ConfirmDelete(confirm))
                } else {
                    Ok(Mode::Normal)
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn sort(&mut self, ascending: bool) {
        let result = self.session.sort_by_average(ascending);
        self.apply(result);
        self.scroll = 0;
    }

    /// Show the outcome of a session operation in the footer.
    fn apply(&mut self, result: OperationResult) {
        match result {
            Ok(outcome) => self.set_status(outcome.message, StatusKind::Info),
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    /// Scroll one line, stopping once the last line reaches the top.
    fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1).min(self.max_scroll());
    }

    fn max_scroll(&self) -> u16 {
        let lines = match self.screen {
            Screen::Students => 0,
            Screen::Ranking => self.ranking_lines().len(),
            Screen::Queue => self.queue_lines().len(),
        };
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    fn ranking_lines(&self) -> Vec<Line<'static>> {
        text_lines(&self.session.render_ranking())
    }

    fn queue_lines(&self) -> Vec<Line<'static>> {
        let mut lines = text_lines(&self.session.render_queue());
        if let Some(head) = self.session.queue().peek() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Next to enroll: {head}"),
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }
        lines
    }

    fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.scroll = 0;
        self.clear_status();
    }

    fn current_student(&self) -> Option<&Student> {
        self.session.store().records().get(self.selected)
    }

    /// Highlight the row holding `cne`, if it is in the roster.
    fn focus(&mut self, cne: Cne) {
        if let Some(idx) = self
            .session
            .store()
            .records()
            .iter()
            .position(|s| s.cne == cne)
        {
            self.selected = idx;
        }
    }

    fn move_selection(&mut self, offset: isize) {
        let len = self.session.store().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.session.store().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Main render routine. Splits the frame into content and footer and
    /// draws any active dialog on top.
    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match self.screen {
            Screen::Students => self.draw_students(frame, content_area),
            Screen::Ranking => self.draw_ranking(frame, content_area),
            Screen::Queue => self.draw_queue(frame, content_area),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingStudent(form) => self.draw_student_form(frame, area, "Add Student", form),
            Mode::QueueingStudent(form) => {
                self.draw_student_form(frame, area, "Queue Enrollment Request", form)
            }
            Mode::FindingStudent(form) => self.draw_find(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ShowingStudent(student) => self.draw_student_popup(frame, area, student),
            Mode::Normal => {}
        }
    }

    fn draw_students(&self, frame: &mut Frame, area: Rect) {
        let store = self.session.store();
        let title = format!(
            "Students ({}) • {} • {}",
            store.len(),
            store.sort_mode().label(),
            self.session.path().display()
        );

        if store.is_empty() {
            let message = Paragraph::new("No students yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(message, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        let items: Vec<ListItem> = store
            .iter()
            .map(|student| {
                ListItem::new(Line::from(vec![Span::styled(
                    student_row(student),
                    average_style(student.average()),
                )]))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let details = match self.current_student() {
            Some(student) => text_lines(&format_student(student)),
            None => vec![Line::from("")],
        };
        let mut detail_lines = details;
        if let Some(pending) = self.session.pending_undo() {
            detail_lines.push(Line::from(""));
            detail_lines.push(Line::from(Span::styled(
                format!("Undo available: {pending}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
        let panel = Paragraph::new(detail_lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Details"));
        frame.render_widget(panel, chunks[1]);
    }

    fn draw_ranking(&self, frame: &mut Frame, area: Rect) {
        let title = format!("Ranking • {}", self.session.sort_mode().label());
        let paragraph = Paragraph::new(self.ranking_lines())
            .scroll((self.scroll.min(self.max_scroll()), 0))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }

    fn draw_queue(&self, frame: &mut Frame, area: Rect) {
        let title = format!("Waiting Queue ({})", self.session.queue().len());
        // The queue may have shrunk since the last scroll.
        let paragraph = Paragraph::new(self.queue_lines())
            .scroll((self.scroll.min(self.max_scroll()), 0))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    /// Key hints for the active screen and mode.
    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&str, &str)] = match (&self.mode, self.screen) {
            (Mode::AddingStudent(_) | Mode::QueueingStudent(_), _) => &[
                ("[Tab/↑↓]", "Switch Field"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ],
            (Mode::FindingStudent(_), _) => &[("[Enter]", "Search"), ("[Esc]", "Cancel")],
            (Mode::ConfirmDelete(_), _) => &[("[y/Enter]", "Delete"), ("[n/Esc]", "Cancel")],
            (Mode::ShowingStudent(_), _) => &[("[Enter/Esc]", "Close")],
            (Mode::Normal, Screen::Students) => &[
                ("[↑↓]", "Select"),
                ("[+]", "Add"),
                ("[-]", "Delete"),
                ("[f]", "Find"),
                ("[u]", "Undo"),
                ("[a/d]", "Sort Asc/Desc"),
                ("[r]", "Reload"),
                ("[Tab]", "Next Screen"),
                ("[q]", "Quit"),
            ],
            (Mode::Normal, Screen::Ranking) => &[
                ("[↑↓]", "Scroll"),
                ("[a/d]", "Sort Asc/Desc"),
                ("[r]", "Reload"),
                ("[Tab]", "Next Screen"),
                ("[q]", "Quit"),
            ],
            (Mode::Normal, Screen::Queue) => &[
                ("[+]", "Queue Request"),
                ("[-]", "Drop Head"),
                ("[Enter]", "Enroll Head"),
                ("[Tab]", "Next Screen"),
                ("[q]", "Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(hints.len() * 2);
        for (idx, (key, label)) in hints.iter().enumerate() {
            spans.push(Span::styled(key.to_string(), key_style));
            let separator = if idx + 1 == hints.len() { "" } else { "   " };
            spans.push(Span::raw(format!(" {label}{separator}")));
        }
        Line::from(spans)
    }

    fn draw_student_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &StudentForm) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = StudentForm::fields()
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = form.active.label().len() as u16 + 2;
        frame.set_cursor_position((
            inner.x + prefix + form.active_len() as u16,
            inner.y + form.active_row() as u16,
        ));
    }

    fn draw_find(&self, frame: &mut Frame, area: Rect, form: &CneForm) {
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Find Student").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(vec![
                Span::raw("CNE: "),
                Span::styled(form.cne.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        frame.set_cursor_position((inner.x + "CNE: ".len() as u16 + form.cne.len() as u16, inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let text = vec![
            Line::from(Span::styled(
                "Delete this student?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(confirm.student.to_string()),
            Line::from(""),
            Line::from("The last deletion can be undone with 'u'."),
            Line::from(""),
            Line::from("Press y/Enter to delete or n/Esc to cancel."),
        ];
        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Confirm Delete").borders(Borders::ALL));
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_student_popup(&self, frame: &mut Frame, area: Rect, student: &Student) {
        let popup_area = centered_rect(50, 40, area);
        frame.render_widget(Clear, popup_area);
        let paragraph = Paragraph::new(text_lines(&format_student(student)))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Student Found").borders(Borders::ALL));
        frame.render_widget(paragraph, popup_area);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
