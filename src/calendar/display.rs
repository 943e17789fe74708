//! Text table for upcoming events

use super::{CalendarEvent, EventStart};

const TITLE: &str = "Your Upcoming Schedule";
const HEADERS: [&str; 3] = ["Date", "Time", "Event Description"];

/// Render events as a fixed-width table (MM-DD, HH:MM or "All Day", summary)
pub fn format_upcoming(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return "No upcoming events found.".to_string();
    }

    let rows: Vec<[String; 3]> = events
        .iter()
        .map(|event| {
            let (date, time) = match &event.start {
                EventStart::DateTime(dt) => {
                    (dt.format("%m-%d").to_string(), dt.format("%H:%M").to_string())
                }
                EventStart::AllDay(date) => (date.format("%m-%d").to_string(), "All Day".to_string()),
            };
            [date, time, event.summary.clone()]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 3]| {
        format!(
            "{:<w0$}  {:<w1$}  {}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1]
        )
    };
    let rule = "-".repeat(widths.iter().sum::<usize>() + 4);

    let mut out = vec![TITLE.to_string(), line(HEADERS), rule];
    out.extend(rows.iter().map(|r| line([r[0].as_str(), r[1].as_str(), r[2].as_str()])));
    out.join("\n")
}
