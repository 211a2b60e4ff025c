use unicode_width::UnicodeWidthStr;

use crate::config::BrowserConfig;
use crate::connection::ConnectionDescriptor;
use crate::pager::PageStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Db,
    Tables,
    Output,
    Where,
    Limit,
    Page,
}

impl Panel {
    #[cfg(test)]
    pub(crate) const ALL: [Self; 6] = [
        Self::Db,
        Self::Tables,
        Self::Output,
        Self::Where,
        Self::Limit,
        Self::Page,
    ];

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Db => Self::Tables,
            Self::Tables => Self::Output,
            Self::Output => Self::Where,
            Self::Where => Self::Limit,
            Self::Limit => Self::Page,
            Self::Page => Self::Db,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Db => "DB",
            Self::Tables => "Tables",
            Self::Output => "Output",
            Self::Where => "Where",
            Self::Limit => "Limit",
            Self::Page => "Offset",
        }
    }

    #[must_use]
    pub fn shows_cursor(self) -> bool {
        !matches!(self, Self::Tables)
    }

    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Db | Self::Where | Self::Limit | Self::Page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    RefreshTables,
    CycleFocus,
    Navigate(Direction),
    Submit,
    NextPage,
    PreviousPage,
    Insert(char),
    DeleteBackward,
}

/// Work that needs a database round trip. Everything else is handled by the
/// session alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    RefreshTables,
    PreviewTable,
    RunFiltered,
    TurnPage(PageStep),
}

/// Single-line editable text with a character cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
    cursor: usize,
}

impl TextField {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let mut field = Self::default();
        field.set(value);
        field
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.value
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    /// Display columns between the start of the text and the cursor.
    #[must_use]
    pub fn cursor_column(&self) -> usize {
        UnicodeWidthStr::width(&self.value[..self.byte_index()])
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    pub fn insert(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        let at = self.byte_index();
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub fn delete_backward(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.value.remove(at);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map_or(self.value.len(), |(index, _)| index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableList {
    names: Vec<String>,
    selected: usize,
}

impl TableList {
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        (!self.names.is_empty()).then_some(self.selected)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.names.get(self.selected).map(String::as_str)
    }

    /// Keeps the selected position across refreshes, clamped to the new list.
    pub fn replace(&mut self, names: Vec<String>) {
        self.names = names;
        self.selected = self.selected.min(self.names.len().saturating_sub(1));
    }

    fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn select_next(&mut self) {
        let last = self.names.len().saturating_sub(1);
        self.selected = (self.selected + 1).min(last);
    }
}

/// Text shown in the output panel and the scroll position within it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPanel {
    text: String,
    scroll_row: usize,
    scroll_column: usize,
}

impl OutputPanel {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn scroll(&self) -> (usize, usize) {
        (self.scroll_row, self.scroll_column)
    }

    /// Overwrites the whole panel; output is never appended.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.scroll_row = 0;
        self.scroll_column = 0;
    }

    fn scroll_by(&mut self, direction: Direction) {
        let last_row = self.text.lines().count().saturating_sub(1);
        let last_column = self
            .text
            .lines()
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0)
            .saturating_sub(1);

        match direction {
            Direction::Up => self.scroll_row = self.scroll_row.saturating_sub(1),
            Direction::Down => self.scroll_row = (self.scroll_row + 1).min(last_row),
            Direction::Left => self.scroll_column = self.scroll_column.saturating_sub(1),
            Direction::Right => self.scroll_column = (self.scroll_column + 1).min(last_column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    focus: Panel,
    dsn: TextField,
    filter: TextField,
    limit: TextField,
    page: TextField,
    tables: TableList,
    output: OutputPanel,
    should_quit: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&BrowserConfig::default())
    }
}

impl Session {
    #[must_use]
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            focus: Panel::Db,
            dsn: TextField::new(config.dsn.clone()),
            filter: TextField::default(),
            limit: TextField::new(config.limit.to_string()),
            page: TextField::new(config.page.to_string()),
            tables: TableList::default(),
            output: OutputPanel::default(),
            should_quit: false,
        }
    }

    /// Applies one user command. Returns the database work it asks for, if any.
    pub fn handle(&mut self, command: Command) -> Option<Task> {
        match command {
            Command::Quit => self.should_quit = true,
            Command::CycleFocus => self.focus = self.focus.next(),
            Command::RefreshTables => return Some(Task::RefreshTables),
            Command::Navigate(direction) => self.navigate(direction),
            Command::Submit => {
                return match self.focus {
                    Panel::Tables => Some(Task::PreviewTable),
                    Panel::Where => Some(Task::RunFiltered),
                    _ => None,
                }
            }
            Command::NextPage if self.focus == Panel::Output => {
                return Some(Task::TurnPage(PageStep::Next));
            }
            Command::PreviousPage if self.focus == Panel::Output => {
                return Some(Task::TurnPage(PageStep::Previous));
            }
            Command::NextPage | Command::PreviousPage => {}
            Command::Insert(ch) => {
                if let Some(field) = self.focused_field_mut() {
                    field.insert(ch);
                }
            }
            Command::DeleteBackward => {
                if let Some(field) = self.focused_field_mut() {
                    field.delete_backward();
                }
            }
        }
        None
    }

    fn navigate(&mut self, direction: Direction) {
        match self.focus {
            Panel::Tables => match direction {
                Direction::Up => self.tables.select_previous(),
                Direction::Down => self.tables.select_next(),
                Direction::Left | Direction::Right => {}
            },
            Panel::Output => self.output.scroll_by(direction),
            _ => {
                if let Some(field) = self.focused_field_mut() {
                    match direction {
                        Direction::Left => field.move_left(),
                        Direction::Right => field.move_right(),
                        Direction::Up | Direction::Down => {}
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn focus(&self) -> Panel {
        self.focus
    }

    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.focus.shows_cursor()
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn field(&self, panel: Panel) -> Option<&TextField> {
        match panel {
            Panel::Db => Some(&self.dsn),
            Panel::Where => Some(&self.filter),
            Panel::Limit => Some(&self.limit),
            Panel::Page => Some(&self.page),
            Panel::Tables | Panel::Output => None,
        }
    }

    fn focused_field_mut(&mut self) -> Option<&mut TextField> {
        match self.focus {
            Panel::Db => Some(&mut self.dsn),
            Panel::Where => Some(&mut self.filter),
            Panel::Limit => Some(&mut self.limit),
            Panel::Page => Some(&mut self.page),
            Panel::Tables | Panel::Output => None,
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor::new(self.dsn.text().trim())
    }

    #[must_use]
    pub fn filter_text(&self) -> &str {
        self.filter.text()
    }

    #[must_use]
    pub fn limit_text(&self) -> &str {
        self.limit.text()
    }

    #[must_use]
    pub fn page_text(&self) -> &str {
        self.page.text()
    }

    pub fn set_page(&mut self, page: u64) {
        self.page.set(page.to_string());
    }

    #[must_use]
    pub fn tables(&self) -> &TableList {
        &self.tables
    }

    pub fn set_tables(&mut self, names: Vec<String>) {
        self.tables.replace(names);
    }

    #[must_use]
    pub fn output(&self) -> &OutputPanel {
        &self.output
    }

    pub fn show_output(&mut self, text: impl Into<String>) {
        self.output.replace(text);
    }
}
