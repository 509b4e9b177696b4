use frc_scorigami::scores::{AllianceColor, Dataset, FirstOccurrence, ScoreRecord, Year};
use frc_scorigami::state::{
    AppState, Cursor, Delta, FetchStatus, GENERIC_ERROR, Screen, ViewState, apply_delta,
};

fn year(y: u16) -> Year {
    Year::new(y).expect("supported year")
}

fn dataset(pairs: &[(u32, u32, u32)]) -> Dataset {
    let records = pairs
        .iter()
        .map(|(winning, losing, count)| ScoreRecord {
            count: *count,
            winning_score: *winning,
            losing_score: *losing,
            first: FirstOccurrence {
                key: format!("k{winning}-{losing}"),
                actual_time: Some(i64::from(*count)),
                winning_alliance: vec![1],
                losing_alliance: vec![2],
                winning_color: AllianceColor::Red,
            },
        })
        .collect();
    Dataset::new(records).expect("distinct pairs")
}

#[test]
fn response_for_current_year_is_applied() {
    let mut state = AppState::new(year(2024));
    let token = state.select_year(year(2024)).expect("cold cache should fetch");
    assert_eq!(state.status, FetchStatus::Loading);

    apply_delta(
        &mut state,
        Delta::DatasetLoaded {
            token,
            dataset: dataset(&[(10, 3, 2), (10, 10, 1)]),
        },
    );

    assert_eq!(state.status, FetchStatus::Ready);
    let loaded = state.loaded.as_ref().expect("dataset applied");
    assert_eq!(loaded.year, year(2024));
    assert_eq!(loaded.matrix.max_winning, 10);
    assert_eq!(loaded.common, vec![0, 1]);
}

#[test]
fn superseded_response_does_not_replace_newer_selection() {
    let mut state = AppState::new(year(2024));
    let old = state.select_year(year(2023)).expect("fetch 2023");
    let new = state.select_year(year(2019)).expect("fetch 2019");

    apply_delta(
        &mut state,
        Delta::DatasetLoaded {
            token: old,
            dataset: dataset(&[(50, 20, 1)]),
        },
    );
    assert_eq!(state.status, FetchStatus::Loading);
    assert!(state.loaded.is_none());
    // Stale success is still remembered for its own year.
    assert!(state.cache.contains_key(&year(2023)));

    apply_delta(
        &mut state,
        Delta::DatasetLoaded {
            token: new,
            dataset: dataset(&[(70, 12, 3)]),
        },
    );
    let loaded = state.loaded.as_ref().expect("2019 applied");
    assert_eq!(loaded.year, year(2019));
    assert_eq!(loaded.matrix.max_winning, 70);
}

#[test]
fn older_request_for_same_year_is_ignored_after_refresh() {
    let mut state = AppState::new(year(2024));
    let first = state.select_year(year(2024)).expect("fetch");
    let second = state.refresh();
    assert_ne!(first, second);

    apply_delta(
        &mut state,
        Delta::DatasetFailed {
            token: first,
            message: "network error: timed out".to_string(),
        },
    );
    assert_eq!(state.status, FetchStatus::Loading);

    apply_delta(
        &mut state,
        Delta::DatasetLoaded {
            token: second,
            dataset: dataset(&[(1, 0, 1)]),
        },
    );
    assert_eq!(state.status, FetchStatus::Ready);
}

#[test]
fn refresh_keeps_current_data_visible_while_loading() {
    let mut state = AppState::new(year(2024));
    let token = state.select_year(year(2024)).expect("fetch");
    apply_delta(
        &mut state,
        Delta::DatasetLoaded {
            token,
            dataset: dataset(&[(10, 3, 2)]),
        },
    );
    assert!(!state.is_loading());

    let again = state.refresh();
    assert!(state.is_loading());
    assert_eq!(state.status, FetchStatus::Loading);
    assert_eq!(
        state.loaded.as_ref().map(|l| l.dataset.len()),
        Some(1),
        "previous data stays on screen"
    );

    apply_delta(
        &mut state,
        Delta::DatasetLoaded {
            token: again,
            dataset: dataset(&[(10, 3, 3), (4, 4, 1)]),
        },
    );
    assert!(!state.is_loading());
    assert_eq!(state.loaded.as_ref().map(|l| l.dataset.len()), Some(2));
}

#[test]
fn failure_shows_generic_message_and_logs_detail() {
    let mut state = AppState::new(year(2024));
    let token = state.select_year(year(2024)).expect("fetch");
    apply_delta(
        &mut state,
        Delta::DatasetFailed {
            token,
            message: "response not ok: 500 Internal Server Error".to_string(),
        },
    );
    assert_eq!(state.status, FetchStatus::Failed(GENERIC_ERROR.to_string()));
    assert!(state.loaded.is_none());
    assert!(
        state
            .logs
            .back()
            .expect("log line")
            .contains("500 Internal Server Error")
    );

    // A new selection starts clean.
    let retry = state.select_year(year(2023)).expect("fetch");
    assert_eq!(state.status, FetchStatus::Loading);
    apply_delta(
        &mut state,
        Delta::DatasetLoaded {
            token: retry,
            dataset: dataset(&[(2, 1, 1)]),
        },
    );
    assert_eq!(state.status, FetchStatus::Ready);
}

#[test]
fn memoized_year_is_served_without_a_fetch() {
    let mut state = AppState::new(year(2024));
    let token = state.select_year(year(2022)).expect("fetch");
    apply_delta(
        &mut state,
        Delta::DatasetLoaded {
            token,
            dataset: dataset(&[(30, 2, 4)]),
        },
    );
    let _ = state.select_year(year(2024)).expect("fetch 2024");
    assert!(state.select_year(year(2022)).is_none());
    assert_eq!(state.status, FetchStatus::Ready);
    assert_eq!(
        state.loaded.as_ref().map(|l| l.matrix.max_winning),
        Some(30)
    );
}

#[test]
fn cursor_stays_inside_the_triangle() {
    let mut state = AppState::new(year(2024));
    let token = state.select_year(year(2024)).expect("fetch");
    apply_delta(
        &mut state,
        Delta::DatasetLoaded {
            token,
            dataset: dataset(&[(10, 3, 2), (10, 10, 1)]),
        },
    );

    state.move_cursor(4, 9);
    assert_eq!(state.cursor, Cursor { row: 4, col: 4 });
    state.move_cursor(100, 0);
    assert_eq!(state.cursor.row, 10);
    state.cursor = Cursor { row: 10, col: 3 };
    let record = state.selected_record().expect("10-3 occurred");
    assert_eq!(record.count, 2);
    state.move_cursor(-20, -20);
    assert_eq!(state.cursor, Cursor { row: 0, col: 0 });
    assert!(state.selected_record().is_none());
}

#[test]
fn view_transitions_produce_new_snapshots() {
    let view = ViewState::new(year(2024));
    let toggled = view.toggled_heatmap();
    assert!(!view.heatmap);
    assert!(toggled.heatmap);
    assert_eq!(toggled.toggled_heatmap(), view);
    assert_eq!(view.with_screen(Screen::MostCommon).screen, Screen::MostCommon);
    assert_eq!(view.with_year(year(2001)).year, year(2001));
}

#[test]
fn picker_lists_newest_year_first() {
    let mut state = AppState::new(year(2024));
    state.open_picker();
    assert!(state.picker.open);
    assert_eq!(state.picker_year(), Some(year(2024)));
    state.picker_next();
    assert_eq!(state.picker_year(), Some(year(2023)));
    state.picker_prev();
    state.picker_prev();
    assert_eq!(state.picker_year(), Some(year(2024)));
}

#[test]
fn log_buffer_is_capped() {
    let mut state = AppState::default();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] line 50"));
}
