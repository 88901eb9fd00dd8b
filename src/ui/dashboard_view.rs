use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Sparkline},
    Frame,
};

use super::board_widget;
use super::dashboard::{DashboardState, RunStatus};

/// Render the full self-play dashboard.
pub fn render(frame: &mut Frame, dashboard: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, dashboard, chunks[0]);
    render_main(frame, dashboard, chunks[1]);
    render_footer(frame, chunks[2]);
}

fn render_header(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let (status, color) = match dashboard.status {
        RunStatus::Running => ("RUNNING", Color::Green),
        RunStatus::Paused => ("PAUSED", Color::Yellow),
        RunStatus::Finished => ("FINISHED", Color::Cyan),
    };

    let header_text = Line::from(vec![
        Span::styled(
            format!("Self-play: {}", dashboard.oracle),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::raw(format!("Game: {}/{}", dashboard.game, dashboard.total_games)),
        Span::raw("  |  ["),
        Span::styled(status, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw("]"),
    ]);

    let header = Paragraph::new(header_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_main(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(35),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(cols[0]);
    render_outcome_chart(frame, dashboard, left[0]);
    render_loss_chart(frame, dashboard, left[1]);
    render_game_length_sparkline(frame, dashboard, left[2]);
    render_progress_gauge(frame, dashboard, left[3]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(cols[1]);
    render_live_board(frame, dashboard, right[0]);
    render_stats_panel(frame, dashboard, right[1]);
}

fn render_outcome_chart(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let x_wins: Vec<(f64, f64)> = dashboard.x_win_rate_history.iter().copied().collect();
    let draws: Vec<(f64, f64)> = dashboard.draw_rate_history.iter().copied().collect();
    let (x_min, x_max) = x_bounds(&x_wins, dashboard.total_games);

    let mut datasets = vec![];
    if !x_wins.is_empty() {
        datasets.push(
            Dataset::default()
                .name("X wins")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&x_wins),
        );
        datasets.push(
            Dataset::default()
                .name("Draws")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Yellow))
                .data(&draws),
        );
    }

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Outcomes"))
        .x_axis(
            Axis::default()
                .title("Game")
                .labels(vec![
                    Span::raw(format!("{}", x_min as usize)),
                    Span::raw(format!("{}", x_max as usize)),
                ])
                .bounds([x_min, x_max]),
        )
        .y_axis(
            Axis::default()
                .title("Rate")
                .labels(vec![Span::raw("0%"), Span::raw("50%"), Span::raw("100%")])
                .bounds([0.0, 1.0]),
        );
    frame.render_widget(chart, area);
}

fn render_loss_chart(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let loss_data: Vec<(f64, f64)> = dashboard.loss_history.iter().copied().collect();
    let (x_min, x_max) = x_bounds(&loss_data, dashboard.total_games);

    let y_max = loss_data.iter().map(|&(_, y)| y).fold(0.1_f64, f64::max);
    // Round up to nearest 0.1
    let y_max = ((y_max * 10.0).ceil() / 10.0).max(0.1);

    let mut datasets = vec![];
    if !loss_data.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Loss")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))
                .data(&loss_data),
        );
    }

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Oracle Loss"))
        .x_axis(
            Axis::default()
                .title("Game")
                .labels(vec![
                    Span::raw(format!("{}", x_min as usize)),
                    Span::raw(format!("{}", x_max as usize)),
                ])
                .bounds([x_min, x_max]),
        )
        .y_axis(
            Axis::default()
                .title("MSE")
                .labels(vec![Span::raw("0"), Span::raw(format!("{:.2}", y_max))])
                .bounds([0.0, y_max]),
        );
    frame.render_widget(chart, area);
}

fn render_game_length_sparkline(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let data: Vec<u64> = dashboard.game_length_history.iter().copied().collect();
    let sparkline = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Game Length (avg: {:.1})", dashboard.avg_game_length)),
        )
        .data(&data)
        .style(Style::default().fg(Color::Magenta));
    frame.render_widget(sparkline, area);
}

fn render_progress_gauge(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let progress = dashboard.progress();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Blue))
        .ratio(progress.clamp(0.0, 1.0))
        .label(format!(
            "{}/{} ({:.1}%)",
            dashboard.game,
            dashboard.total_games,
            progress * 100.0
        ));
    frame.render_widget(gauge, area);
}

fn render_live_board(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let title = match dashboard.live_board.as_ref().and_then(|v| v.winner) {
        Some(winner) => format!("Game {} | {} wins in {}", dashboard.live_game, winner, dashboard.live_move_number),
        None => format!("Game {} | move {}", dashboard.live_game, dashboard.live_move_number),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &dashboard.live_board {
        Some(view) => board_widget::render_board_compact(frame, view, inner),
        None => {
            let placeholder = Paragraph::new("Waiting for first move...")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(placeholder, inner);
        }
    }
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), Style::default().fg(Color::White)),
        Span::raw(value),
    ])
}

fn render_stats_panel(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let stats = dashboard.stats;
    let ratio = stats
        .x_to_o_ratio()
        .map_or_else(|| "-".to_string(), |r| format!("{:.2}", r));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("X {}", stats.x_wins),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("O {}", stats.o_wins),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(format!("Draw {}", stats.draws), Style::default().fg(Color::Yellow)),
        ]),
        stat_line("X:O", ratio),
        stat_line("X win", format!("{:.1}%", stats.x_win_rate() * 100.0)),
        stat_line("X win (win)", format!("{:.1}%", dashboard.x_win_rate * 100.0)),
        stat_line("Draw (win)", format!("{:.1}%", dashboard.draw_rate * 100.0)),
        Line::from(""),
        stat_line("Loss", format!("{:.6}", dashboard.loss)),
        stat_line("Trained on", format!("{} games", dashboard.games_trained)),
    ];

    if dashboard.games_per_sec > 0.0 {
        lines.push(stat_line("Games/sec", format!("{:.1}", dashboard.games_per_sec)));
        lines.push(stat_line("Game time", format!("{:.1}ms", dashboard.avg_game_ms)));
        lines.push(stat_line("Train time", format!("{:.1}ms", dashboard.avg_train_ms)));
    }

    if let Some(ref ckpt) = dashboard.last_checkpoint {
        lines.push(Line::from(vec![
            Span::styled("Last Save: ", Style::default().fg(Color::White)),
            Span::styled(ckpt.clone(), Style::default().fg(Color::DarkGray)),
        ]));
    }

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Stats"));
    frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new("P: Pause/Resume  |  S: Save Checkpoint  |  Q: Quit")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    frame.render_widget(footer, area);
}

fn x_bounds(data: &[(f64, f64)], total_games: usize) -> (f64, f64) {
    match (data.first(), data.last()) {
        (Some(first), Some(last)) => (first.0, last.0.max(first.0 + 1.0)),
        _ => (0.0, total_games.max(1) as f64),
    }
}
