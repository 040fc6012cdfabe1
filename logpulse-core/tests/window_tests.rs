use chrono::{DateTime, TimeZone, Utc};
use logpulse_core::event::LogEvent;
use logpulse_core::window::{MAX_WINDOW_MINUTES, Window, anchor_of};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
}

fn events(times: &[DateTime<Utc>]) -> Vec<LogEvent> {
    times.iter().copied().map(LogEvent::at).collect()
}

#[test]
fn test_anchor_is_latest_timestamp() {
    let evs = events(&[at(10, 0), at(11, 0), at(9, 0)]);
    assert_eq!(anchor_of(&evs), Some(at(11, 0)));
    let w = Window::select(evs, 5);
    assert_eq!(w.anchor, Some(at(11, 0)));
}

#[test]
fn test_empty_store_gives_empty_window() {
    for minutes in [1, 60, MAX_WINDOW_MINUTES] {
        let w = Window::select(Vec::new(), minutes);
        assert!(w.anchor.is_none());
        assert!(w.is_empty());
    }
}

#[test]
fn test_sixty_minute_window_excludes_older_events() {
    let w = Window::select(events(&[at(9, 0), at(10, 0), at(11, 0)]), 60);
    let times: Vec<_> = w.events.iter().map(|e| e.timestamp).collect();
    assert_eq!(times, vec![at(10, 0), at(11, 0)]);
    assert_eq!(w.start, Some(at(10, 0)));
}

#[test]
fn test_window_bounds_are_inclusive() {
    let w = Window::select(events(&[at(10, 0), at(10, 30)]), 30);
    assert_eq!(w.len(), 2);

    let w = Window::select(events(&[at(9, 59), at(10, 30)]), 30);
    assert_eq!(w.len(), 1);
}

#[test]
fn test_window_ignores_wall_clock() {
    // Data from years ago is still fully visible.
    let old = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
    let w = Window::select(vec![LogEvent::at(old)], 1);
    assert_eq!(w.len(), 1);
}
