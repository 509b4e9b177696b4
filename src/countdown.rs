use chrono::Timelike;

/// Minutes past the hour at which the data job republishes.
pub const REFRESH_BOUNDARIES: [u32; 6] = [0, 10, 20, 30, 40, 50];

/// Minutes until the next boundary strictly after `minute`, wrapping to the next hour.
pub fn minutes_until_refresh(minute: u32) -> u32 {
    let minute = minute % 60;
    let next = REFRESH_BOUNDARIES
        .iter()
        .copied()
        .find(|b| *b > minute)
        .unwrap_or(REFRESH_BOUNDARIES[0] + 60);
    next - minute
}

pub fn minutes_until_refresh_at<T: Timelike>(now: &T) -> u32 {
    minutes_until_refresh(now.minute())
}

pub fn countdown_label(minutes: u32) -> String {
    format!("Next data refresh in {minutes} min")
}
