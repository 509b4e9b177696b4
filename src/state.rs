use std::collections::{HashMap, VecDeque};

use crate::leaderboard::{most_common_order, most_recent_order};
use crate::matrix::{Cell, CellMode, ScoreMatrix};
use crate::scores::{Dataset, ScoreRecord, Year};

pub const GENERIC_ERROR: &str = "Error: could not load scores";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Matrix,
    MostRecent,
    MostCommon,
}

/// Snapshot of the user's selections. Transitions return a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub year: Year,
    pub heatmap: bool,
    pub screen: Screen,
}

impl ViewState {
    pub fn new(year: Year) -> Self {
        Self {
            year,
            heatmap: false,
            screen: Screen::Matrix,
        }
    }

    pub fn with_year(self, year: Year) -> Self {
        Self { year, ..self }
    }

    pub fn toggled_heatmap(self) -> Self {
        Self {
            heatmap: !self.heatmap,
            ..self
        }
    }

    pub fn with_screen(self, screen: Screen) -> Self {
        Self { screen, ..self }
    }

    pub fn cell_mode(&self) -> CellMode {
        CellMode::from_heatmap(self.heatmap)
    }
}

/// Identifies one issued fetch. Results are applied only for the newest token of the
/// currently selected year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub year: Year,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// A dataset with everything derived from it, computed once when it is applied.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub year: Year,
    pub dataset: Dataset,
    pub matrix: ScoreMatrix,
    pub recent: Vec<usize>,
    pub common: Vec<usize>,
}

impl Loaded {
    pub fn new(year: Year, dataset: Dataset) -> Self {
        let matrix = ScoreMatrix::build(&dataset);
        let recent = most_recent_order(dataset.records());
        let common = most_common_order(dataset.records());
        Self {
            year,
            dataset,
            matrix,
            recent,
            common,
        }
    }

    pub fn recent_rows(&self) -> Vec<&ScoreRecord> {
        self.rows_in(&self.recent)
    }

    pub fn common_rows(&self) -> Vec<&ScoreRecord> {
        self.rows_in(&self.common)
    }

    fn rows_in(&self, order: &[usize]) -> Vec<&ScoreRecord> {
        order
            .iter()
            .filter_map(|idx| self.dataset.records().get(*idx))
            .collect()
    }
}

/// Matrix cursor: `row` is the higher score, `col` the lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub row: u32,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearPicker {
    pub open: bool,
    pub selected: usize,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: ViewState,
    pub status: FetchStatus,
    pub loaded: Option<Loaded>,
    pub cache: HashMap<Year, Dataset>,
    pub generation: u64,
    pub latest_generation: HashMap<Year, u64>,
    pub cursor: Cursor,
    pub table_scroll: usize,
    pub picker: YearPicker,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Year::default())
    }
}

impl AppState {
    pub fn new(year: Year) -> Self {
        Self {
            view: ViewState::new(year),
            status: FetchStatus::Idle,
            loaded: None,
            cache: HashMap::with_capacity(8),
            generation: 0,
            latest_generation: HashMap::with_capacity(8),
            cursor: Cursor::default(),
            table_scroll: 0,
            picker: YearPicker {
                open: false,
                selected: 0,
            },
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    /// Switches to `year`. Returns the token to fetch with, or `None` when the memoized
    /// dataset was applied directly.
    pub fn select_year(&mut self, year: Year) -> Option<RequestToken> {
        self.view = self.view.with_year(year);
        self.table_scroll = 0;
        if let Some(dataset) = self.cache.get(&year).cloned() {
            self.install(year, dataset);
            // Drop any in-flight request for this year; the memo is already current.
            self.issue_token(year);
            return None;
        }
        Some(self.begin_fetch(year))
    }

    /// Fetches the selected year again, ignoring the memo cache.
    pub fn refresh(&mut self) -> RequestToken {
        let year = self.view.year;
        self.begin_fetch(year)
    }

    fn begin_fetch(&mut self, year: Year) -> RequestToken {
        self.status = FetchStatus::Loading;
        if self.loaded.as_ref().is_some_and(|l| l.year != year) {
            self.loaded = None;
        }
        self.issue_token(year)
    }

    fn issue_token(&mut self, year: Year) -> RequestToken {
        self.generation += 1;
        self.latest_generation.insert(year, self.generation);
        RequestToken {
            year,
            generation: self.generation,
        }
    }

    /// True while a fetch for the selected year is outstanding, even if older data is shown.
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.year == self.view.year
            && self.latest_generation.get(&token.year) == Some(&token.generation)
    }

    fn install(&mut self, year: Year, dataset: Dataset) {
        self.loaded = Some(Loaded::new(year, dataset));
        self.status = FetchStatus::Ready;
        self.clamp_cursor();
        self.clamp_scroll();
    }

    pub fn toggle_heatmap(&mut self) {
        self.view = self.view.toggled_heatmap();
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.view.screen != screen {
            self.table_scroll = 0;
        }
        self.view = self.view.with_screen(screen);
    }

    pub fn open_picker(&mut self) {
        let selected = Year::all()
            .rev()
            .position(|y| y == self.view.year)
            .unwrap_or(0);
        self.picker = YearPicker {
            open: true,
            selected,
        };
    }

    pub fn close_picker(&mut self) {
        self.picker.open = false;
    }

    pub fn picker_next(&mut self) {
        let total = Year::all().count();
        self.picker.selected = (self.picker.selected + 1).min(total.saturating_sub(1));
    }

    pub fn picker_prev(&mut self) {
        self.picker.selected = self.picker.selected.saturating_sub(1);
    }

    /// Year under the picker highlight; the list shows newest first.
    pub fn picker_year(&self) -> Option<Year> {
        Year::all().rev().nth(self.picker.selected)
    }

    pub fn move_cursor(&mut self, d_row: i64, d_col: i64) {
        let row = i64::from(self.cursor.row) + d_row;
        let col = i64::from(self.cursor.col) + d_col;
        self.cursor = Cursor {
            row: row.max(0) as u32,
            col: col.max(0) as u32,
        };
        self.clamp_cursor();
    }

    /// Keeps the cursor inside the triangle `col <= row <= max_winning`.
    pub fn clamp_cursor(&mut self) {
        let max_row = self
            .loaded
            .as_ref()
            .map(|l| l.matrix.max_winning)
            .unwrap_or(0);
        let row = self.cursor.row.min(max_row);
        let col = self.cursor.col.min(row);
        self.cursor = Cursor { row, col };
    }

    pub fn selected_cell(&self) -> Option<Cell> {
        let loaded = self.loaded.as_ref()?;
        Some(loaded.matrix.cell(
            &loaded.dataset,
            self.cursor.row,
            self.cursor.col,
            self.view.cell_mode(),
        ))
    }

    pub fn selected_record(&self) -> Option<&ScoreRecord> {
        let loaded = self.loaded.as_ref()?;
        loaded
            .matrix
            .lookup_record(&loaded.dataset, self.cursor.row, self.cursor.col)
    }

    pub fn scroll_down(&mut self) {
        self.table_scroll = self.table_scroll.saturating_add(1);
        self.clamp_scroll();
    }

    pub fn scroll_up(&mut self) {
        self.table_scroll = self.table_scroll.saturating_sub(1);
    }

    fn clamp_scroll(&mut self) {
        let total = self.loaded.as_ref().map(|l| l.dataset.len()).unwrap_or(0);
        self.table_scroll = self.table_scroll.min(total.saturating_sub(1));
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    DatasetLoaded {
        token: RequestToken,
        dataset: Dataset,
    },
    DatasetFailed {
        token: RequestToken,
        message: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchYear { token: RequestToken },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::DatasetLoaded { token, dataset } => {
            let current = state.is_current(token);
            state.cache.insert(token.year, dataset.clone());
            if current {
                state.push_log(format!(
                    "[INFO] Loaded {} score pairs for {}",
                    dataset.len(),
                    token.year
                ));
                state.install(token.year, dataset);
            } else {
                state.push_log(format!(
                    "[INFO] Ignored superseded response for {} (request {})",
                    token.year, token.generation
                ));
            }
        }
        Delta::DatasetFailed { token, message } => {
            if state.is_current(token) {
                state.status = FetchStatus::Failed(GENERIC_ERROR.to_string());
                state.loaded = None;
                state.push_log(format!("[WARN] Fetch {} failed: {message}", token.year));
            } else {
                state.push_log(format!(
                    "[INFO] Ignored superseded failure for {}: {message}",
                    token.year
                ));
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
