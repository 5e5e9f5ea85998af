// Cumulative drinks chart.
//
// Each participant becomes one step series whose value at their k-th drink
// is k. The chart is drawn with ratatui's `Chart` widget into an off-screen
// buffer and then flattened to text, so it can be printed between ordinary
// prompts instead of taking over the terminal.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;

use chrono::NaiveDateTime;
use crossterm::queue;
use crossterm::style::{Print, ResetColor, SetForegroundColor};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, LegendPosition, Widget};

use crate::models::{Event, User};

/// Printed instead of a chart while an event has no drinks.
pub const NO_DRINKS: &str = "No drinks recorded yet.";

/// Size used when the terminal cannot be queried.
pub const FALLBACK_SIZE: ChartSize = ChartSize {
    width: 60,
    height: 30,
};

const MARGIN_COLUMNS: u16 = 4;
const MARGIN_ROWS: u16 = 6;
const MIN_WIDTH: u16 = 30;
const MIN_HEIGHT: u16 = 10;
const Y_TICKS: u32 = 5;

const PALETTE: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Red,
    Color::Blue,
    Color::LightCyan,
    Color::LightMagenta,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u16,
    pub height: u16,
}

impl ChartSize {
    /// Terminal size minus a margin for the prompt lines around the chart.
    pub fn from_terminal() -> Self {
        match crossterm::terminal::size() {
            Ok((cols, rows)) => ChartSize {
                width: cols.saturating_sub(MARGIN_COLUMNS).max(MIN_WIDTH),
                height: rows.saturating_sub(MARGIN_ROWS).max(MIN_HEIGHT),
            },
            Err(_) => FALLBACK_SIZE,
        }
    }
}

/// One participant's drinks, ranked in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub user_id: u64,
    pub label: String,
    /// `(timestamp, rank)` with ranks `1..=count`.
    pub points: Vec<(NaiveDateTime, u32)>,
}

impl Series {
    pub fn count(&self) -> u32 {
        self.points.len() as u32
    }

    pub fn legend(&self) -> String {
        format!("{} ({})", self.label, self.count())
    }
}

/// Everything needed to plot one event.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    /// Most active participant first.
    pub series: Vec<Series>,
    pub x_bounds: (NaiveDateTime, NaiveDateTime),
    pub y_max: u32,
}

impl ChartData {
    /// `None` when the event has no drinks.
    pub fn from_event(event: &Event, users: &[User]) -> Option<Self> {
        let x_min = event.drinks.iter().map(|d| d.datetime).min()?;
        let x_max = event.drinks.iter().map(|d| d.datetime).max()?;

        let mut grouped: BTreeMap<u64, Vec<NaiveDateTime>> = BTreeMap::new();
        for drink in &event.drinks {
            grouped.entry(drink.user).or_default().push(drink.datetime);
        }

        let names: HashMap<u64, &str> = users.iter().map(|u| (u.id, u.username.as_str())).collect();
        let mut series: Vec<Series> = grouped
            .into_iter()
            .map(|(user_id, mut times)| {
                times.sort();
                let label = names
                    .get(&user_id)
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| unknown_user_label(user_id));
                let points = times.into_iter().zip(1..).collect();
                Series {
                    user_id,
                    label,
                    points,
                }
            })
            .collect();
        series.sort_by(|a, b| b.count().cmp(&a.count()).then_with(|| a.label.cmp(&b.label)));

        let y_max = series.iter().map(Series::count).max().unwrap_or(0);
        Some(ChartData {
            series,
            x_bounds: (x_min, x_max),
            y_max,
        })
    }
}

/// Label for drinks whose user is missing from the user list, e.g. someone
/// whose account was removed.
pub fn unknown_user_label(user_id: u64) -> String {
    format!("user #{user_id}")
}

/// Integer tick labels for one render. A value already printed in this
/// render comes back blank, so rounding several ticks to the same integer
/// does not repeat the label.
#[derive(Debug, Default)]
pub struct TickLabels {
    printed: HashSet<i64>,
}

impl TickLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&mut self, value: f64) -> String {
        let v = value.round() as i64;
        if self.printed.insert(v) {
            v.to_string()
        } else {
            String::new()
        }
    }
}

/// Y axis labels for `0..=y_max`, evenly spaced.
pub fn y_labels(y_max: u32, ticks: &mut TickLabels) -> Vec<String> {
    (0..Y_TICKS)
        .map(|i| ticks.label(f64::from(y_max) * f64::from(i) / f64::from(Y_TICKS - 1)))
        .collect()
}

/// `HH:MM` labels at the start, middle and end of the time range.
pub fn x_labels(x_bounds: (NaiveDateTime, NaiveDateTime)) -> Vec<String> {
    let (start, end) = x_bounds;
    let middle = start + (end - start) / 2;
    [start, middle, end]
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect()
}

fn seconds_since(origin: NaiveDateTime, t: NaiveDateTime) -> f64 {
    (t - origin).num_milliseconds() as f64 / 1000.0
}

/// Plot points for a series drawn as steps: each drink rises from the
/// previous count, and the last count is held to the end of the range.
fn step_points(series: &Series, x_bounds: (NaiveDateTime, NaiveDateTime)) -> Vec<(f64, f64)> {
    let (origin, end) = x_bounds;
    let mut points = Vec::with_capacity(series.points.len() * 2 + 1);
    for &(t, rank) in &series.points {
        let x = seconds_since(origin, t);
        points.push((x, f64::from(rank - 1)));
        points.push((x, f64::from(rank)));
    }
    if let Some(&(last, rank)) = series.points.last() {
        if last < end {
            points.push((seconds_since(origin, end), f64::from(rank)));
        }
    }
    points
}

/// Draw the chart into a buffer of the given size.
pub fn render_buffer(title: &str, data: &ChartData, size: ChartSize) -> Buffer {
    let area = Rect::new(0, 0, size.width, size.height);
    let mut buf = Buffer::empty(area);

    let plotted: Vec<Vec<(f64, f64)>> = data
        .series
        .iter()
        .map(|s| step_points(s, data.x_bounds))
        .collect();
    let datasets: Vec<Dataset> = data
        .series
        .iter()
        .zip(&plotted)
        .enumerate()
        .map(|(i, (series, points))| {
            Dataset::default()
                .name(series.legend())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(points)
        })
        .collect();

    let span = seconds_since(data.x_bounds.0, data.x_bounds.1);
    // A single instant has no width to draw on.
    let x_axis_bounds = if span > 0.0 { [0.0, span] } else { [-60.0, 60.0] };

    let mut ticks = TickLabels::new();
    let chart = Chart::new(datasets)
        .block(Block::bordered().title(format!(" {title} ")))
        .x_axis(
            Axis::default()
                .title("time")
                .bounds(x_axis_bounds)
                .labels(x_labels(data.x_bounds).into_iter().map(Span::raw).collect::<Vec<_>>()),
        )
        .y_axis(
            Axis::default()
                .title("drinks")
                .bounds([0.0, f64::from(data.y_max)])
                .labels(y_labels(data.y_max, &mut ticks).into_iter().map(Span::raw).collect::<Vec<_>>()),
        )
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Ratio(1, 1), Constraint::Ratio(1, 1)));
    chart.render(area, &mut buf);
    buf
}

/// Flatten a buffer into lines of plain text.
pub fn buffer_to_text(buf: &Buffer) -> String {
    let width = usize::from(buf.area.width.max(1));
    buf.content
        .chunks(width)
        .map(|row| {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flatten a buffer into lines with ANSI foreground colours.
pub fn buffer_to_ansi(buf: &Buffer) -> io::Result<String> {
    let width = usize::from(buf.area.width.max(1));
    let mut out: Vec<u8> = Vec::new();
    for (y, row) in buf.content.chunks(width).enumerate() {
        if y > 0 {
            queue!(out, Print('\n'))?;
        }
        let mut current = Color::Reset;
        for cell in row {
            if cell.fg != current {
                current = cell.fg;
                queue!(out, SetForegroundColor(current.into()))?;
            }
            queue!(out, Print(cell.symbol()))?;
        }
        queue!(out, ResetColor)?;
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Render an event as printable text, or the placeholder when nobody has
/// had a drink yet.
pub fn render(event: &Event, users: &[User], size: ChartSize, color: bool) -> io::Result<String> {
    let Some(data) = ChartData::from_event(event, users) else {
        return Ok(NO_DRINKS.to_string());
    };
    let buf = render_buffer(&event.name, &data, size);
    if color {
        buffer_to_ansi(&buf)
    } else {
        Ok(buffer_to_text(&buf))
    }
}
