//! Rendering of the chart view.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Chart, Clear, Dataset, GraphType, LegendPosition, Paragraph},
    Frame,
};

use crate::gridchart::app::App;
use crate::gridchart::chart::{rescale_points, time_labels, value_labels};
use crate::gridcommon::{GridDataset, SeriesAxis};

pub const TITLE: &str = "Power Output vs CO2 Emissions Over Time";

/// Minimum terminal size for a usable chart
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 12;

/// Width of the right-hand CO2 axis column
const SECONDARY_AXIS_WIDTH: u16 = 14;

const X_LABELS: usize = 5;
const Y_LABELS: usize = 5;

/// Fixed color of each series
pub fn series_color(dataset: GridDataset) -> Color {
    match dataset {
        GridDataset::Wind => Color::Blue,
        GridDataset::Hydro => Color::Green,
        GridDataset::Nuclear => Color::Magenta,
        GridDataset::Co2 => Color::Red,
    }
}

/// Draw the whole screen
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(paragraph, area);
        return;
    }

    let [title_area, body_area, status_area] = Layout::vertical([
        Constraint::Length(1), // Title
        Constraint::Min(8),    // Chart
        Constraint::Length(1), // Status bar
    ])
    .areas(area);

    let [chart_area, axis_area] =
        Layout::horizontal([Constraint::Min(20), Constraint::Length(SECONDARY_AXIS_WIDTH)])
            .areas(body_area);

    let title = Paragraph::new(TITLE)
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(title, title_area);

    render_chart(frame, app, chart_area);
    render_secondary_axis(frame, app, axis_area);
    frame.render_widget(Paragraph::new(status_line(app)), status_area);

    if app.show_help {
        render_help(frame, area);
    }
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::bordered();

    if !app.model.has_data() {
        let msg = Paragraph::new("No data received for the requested window")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow))
            .block(block);
        frame.render_widget(msg, area);
        return;
    }

    let bounds = app.bounds();
    // CO2 画在主轴上，数值先映射到主轴范围
    let scaled_co2 = rescale_points(&app.model.get(GridDataset::Co2).points, &bounds);

    let mut datasets = Vec::new();
    for series in app.model.series() {
        if !app.is_visible(series.dataset) || series.is_empty() {
            continue;
        }

        let style = Style::default().fg(series_color(series.dataset));
        match series.dataset.axis() {
            SeriesAxis::Primary => {
                datasets.push(
                    Dataset::default()
                        .name(series.dataset.label())
                        .marker(Marker::Braille)
                        .graph_type(GraphType::Line)
                        .style(style)
                        .data(&series.points),
                );
                if app.show_markers {
                    // 无名称的数据集不出现在图例中
                    datasets.push(
                        Dataset::default()
                            .marker(Marker::Dot)
                            .graph_type(GraphType::Scatter)
                            .style(style)
                            .data(&series.points),
                    );
                }
            }
            SeriesAxis::Secondary => {
                datasets.push(
                    Dataset::default()
                        .name(format!("{} (right axis)", series.dataset.label()))
                        .marker(Marker::Dot)
                        .graph_type(GraphType::Line)
                        .style(style)
                        .data(&scaled_co2),
                );
            }
        }
    }

    let x_axis = Axis::default()
        .title("Time")
        .style(Style::default().fg(Color::Gray))
        .bounds(bounds.x)
        .labels(time_labels(bounds.x, X_LABELS));

    let y_axis = Axis::default()
        .title("Power Output (MW)")
        .style(Style::default().fg(Color::Gray))
        .bounds(bounds.primary)
        .labels(value_labels(bounds.primary, Y_LABELS, 0));

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));

    frame.render_widget(chart, area);
}

fn render_secondary_axis(frame: &mut Frame, app: &App, area: Rect) {
    let shown = app.is_visible(GridDataset::Co2) && !app.model.get(GridDataset::Co2).is_empty();
    let style = if shown {
        Style::default().fg(series_color(GridDataset::Co2))
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let lines: Vec<Line> = secondary_axis_lines(app.bounds().secondary, area.height, shown)
        .into_iter()
        .map(|text| Line::from(Span::styled(text, style)))
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

/// Text rows of the right-hand axis column for a chart of `height` rows.
///
/// Rows 0 and 1 carry the axis title. Tick labels run from the top of the
/// plot (row 2) down to the row above the x axis (`height - 4`), largest
/// value first. Labels are left out when the series is hidden.
pub fn secondary_axis_lines(range: [f64; 2], height: u16, with_labels: bool) -> Vec<String> {
    let height = height as usize;
    let mut lines = vec![String::new(); height];
    if height < 2 {
        return lines;
    }

    lines[0] = "CO2 Emissions".to_string();
    lines[1] = "(scaled)".to_string();

    if !with_labels || height < 7 {
        return lines;
    }

    let top = 2;
    let bottom = height - 4;
    let count = Y_LABELS.min(bottom - top + 1);
    for (i, label) in value_labels(range, count, 1).into_iter().enumerate() {
        let row = if count == 1 {
            bottom
        } else {
            bottom - (bottom - top) * i / (count - 1)
        };
        lines[row] = format!(" {}", label);
    }

    lines
}

/// Bottom status bar: per-series row counts, visibility and window
pub fn status_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();

    for (i, dataset) in GridDataset::ALL.iter().enumerate() {
        let style = if app.is_visible(*dataset) {
            Style::default().fg(series_color(*dataset))
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let rows = app.summary(*dataset).map(|s| s.rows).unwrap_or(0);
        let short = dataset.label().split(' ').next().unwrap_or_default();
        spans.push(Span::styled(format!("[{}] {} {}", i + 1, short, rows), style));

        if app.summary(*dataset).is_some_and(|s| s.aborted.is_some()) {
            spans.push(Span::styled(
                "!",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::raw("  "));
    }

    spans.push(Span::styled(
        format!("{} UTC", app.window),
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::styled("  ? help  q quit", Style::default().fg(Color::DarkGray)));

    Line::from(spans)
}

fn render_help(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled("Keys", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("  1-4      toggle wind / hydro / nuclear / CO2"),
        Line::from("  a        show all series"),
        Line::from("  m        toggle point markers"),
        Line::from("  ?        toggle this help"),
        Line::from("  q, Esc   quit"),
        Line::from(""),
        Line::from("  ! in the status bar: fetch stopped early,"),
        Line::from("    partial data is shown"),
    ];

    let popup = centered_rect(52, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(Block::bordered().title(" Help ")), popup);
}

/// A `width` x `height` rectangle centered in `area`, clipped to it
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
