pub mod charting;
pub mod screen;
pub mod terminal;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, LegendPosition,
        Paragraph, Widget, Wrap,
    },
};

use crate::{
    analysis::{grid_shape, legend_categories, xy_path, y_by_sample_index, CategoryAccuracy},
    session::MouseTrial,
    ui::{
        charting::{category_color, compute_bounds, format_label},
        screen::Screen,
    },
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const INSTRUCTIONS_WIDTH: u16 = 80;

const FIRST_WORD_RGB: (u8, u8, u8) = (255, 255, 0);
const SECOND_WORD_RGB: (u8, u8, u8) = (0, 220, 0);
const LABEL_RGB: (u8, u8, u8) = (200, 200, 200);

/// Scale an RGB color toward black to emulate opacity on a dark terminal
fn faded((r, g, b): (u8, u8, u8), opacity: f64) -> Color {
    let o = opacity.clamp(0.0, 1.0);
    let scale = |c: u8| (c as f64 * o).round() as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

fn render_word(label: &str, word: &str, rgb: (u8, u8, u8), opacity: f64, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let pad = area.height.saturating_sub(3) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(pad),
            Constraint::Length(1), // label
            Constraint::Length(1),
            Constraint::Length(1), // word
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        label,
        Style::default().fg(faded(LABEL_RGB, opacity)),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        word,
        bold_style.fg(faded(rgb, opacity)),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_centered_text(text: &str, area: Rect, buf: &mut Buffer) {
    let width = area.width.min(INSTRUCTIONS_WIDTH);
    let lines = text.lines().count() as u16;
    let rect = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height.saturating_sub(lines) / 2,
        width,
        height: lines.min(area.height),
    };

    Paragraph::new(text)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .render(rect, buf);
}

impl Widget for &Screen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self {
            Screen::Blank => {}
            Screen::Instructions(text) | Screen::Message(text) => {
                render_centered_text(text, area, buf)
            }
            Screen::FirstWord { word, opacity } => {
                render_word("First word:", word, FIRST_WORD_RGB, *opacity, area, buf)
            }
            Screen::SecondWord { word, opacity } => {
                render_word("Second word:", word, SECOND_WORD_RGB, *opacity, area, buf)
            }
        }
    }
}

/// Accuracy-by-category bar chart with numeric annotations
pub struct AccuracyView<'a> {
    pub tallies: &'a [CategoryAccuracy],
}

impl Widget for &AccuracyView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        let bars: Vec<Bar> = self
            .tallies
            .iter()
            .map(|t| {
                let pct = t.percentage();
                Bar::default()
                    .value(pct.round() as u64)
                    .text_value(format!("{pct:.1}%"))
                    .label(Line::from(t.category.clone()))
                    .style(Style::default().fg(Color::LightBlue))
            })
            .collect();

        BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Accuracy per Category (%)"),
            )
            .bar_width(12)
            .bar_gap(4)
            .max(100)
            .data(BarGroup::default().bars(&bars))
            .render(chunks[0], buf);

        Paragraph::new(Span::styled(
            "(esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[1], buf);
    }
}

/// Which trajectory plot is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrajectoryPanel {
    #[default]
    Grid,
    Overlay,
}

impl TrajectoryPanel {
    pub fn toggle(self) -> Self {
        match self {
            TrajectoryPanel::Grid => TrajectoryPanel::Overlay,
            TrajectoryPanel::Overlay => TrajectoryPanel::Grid,
        }
    }
}

/// Per-trial x-y paths in a grid, or all y traces overlaid
pub struct TrajectoryView<'a> {
    pub trials: &'a [MouseTrial],
    pub panel: TrajectoryPanel,
}

impl Widget for &TrajectoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        match self.panel {
            TrajectoryPanel::Grid => render_trial_grid(self.trials, chunks[0], buf),
            TrajectoryPanel::Overlay => render_overlay(self.trials, chunks[0], buf),
        }

        Paragraph::new(Span::styled(
            "(tab) switch view / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[1], buf);
    }
}

fn axis(title: &str, bounds: [f64; 2]) -> Axis<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    Axis::default()
        .title(title.to_string())
        .bounds(bounds)
        .labels(vec![
            Span::styled(format_label(bounds[0]), bold_style),
            Span::styled(format_label(bounds[1]), bold_style),
        ])
}

fn render_trial_grid(trials: &[MouseTrial], area: Rect, buf: &mut Buffer) {
    let (rows, cols) = grid_shape(trials.len());
    if rows == 0 {
        return;
    }

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);

    for (idx, trial) in trials.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, cols as u32); cols])
            .split(row_areas[idx / cols]);

        let points = xy_path(trial);
        let (x_bounds, y_bounds) = compute_bounds(&points);
        let datasets = vec![Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(category_color(trial.category)))
            .data(&points)];

        Chart::new(datasets)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Trial {}: {} -> {} ({})",
                idx + 1,
                trial.initial_word,
                trial.second_word,
                trial.category
            )))
            .x_axis(axis("x", x_bounds))
            .y_axis(axis("y", y_bounds))
            .render(cells[idx % cols], buf);
    }
}

fn render_overlay(trials: &[MouseTrial], area: Rect, buf: &mut Buffer) {
    let series: Vec<Vec<(f64, f64)>> = trials.iter().map(y_by_sample_index).collect();
    let all_points: Vec<(f64, f64)> = series.iter().flatten().copied().collect();
    let (x_bounds, y_bounds) = compute_bounds(&all_points);

    // only the first trace of each category is named, so the legend lists it once
    let mut unnamed = legend_categories(trials);
    let datasets: Vec<Dataset> = trials
        .iter()
        .zip(&series)
        .map(|(trial, points)| {
            let dataset = Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(category_color(trial.category)))
                .data(points);
            match unnamed.iter().position(|c| *c == trial.category) {
                Some(i) => {
                    unnamed.remove(i);
                    dataset.name(trial.category.to_string())
                }
                None => dataset,
            }
        })
        .collect();

    Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Mouse Trajectories (Y-direction)"),
        )
        .legend_position(Some(LegendPosition::TopRight))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)))
        .x_axis(axis("sample index", x_bounds))
        .y_axis(axis("mouse y", y_bounds))
        .render(area, buf);
}
