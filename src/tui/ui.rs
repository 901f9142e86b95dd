use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use crate::commands::{short_id, timer_bar};
use crate::models::OccurrenceStatus;
use crate::schedule::Clock;
use crate::storage::UserDirectory;
use crate::urgency::{describe_days_left, DueStatus, UrgencyTier};
use super::app::{App, InputMode, ViewMode, InputField};

fn tier_style(tier: UrgencyTier) -> Style {
    match tier {
        UrgencyTier::Critical => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        UrgencyTier::High => Style::default().fg(Color::LightRed),
        UrgencyTier::Medium => Style::default().fg(Color::Yellow),
        UrgencyTier::Low => Style::default().fg(Color::Green),
    }
}

fn header_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

pub fn ui<C: Clock>(f: &mut Frame, app: &mut App<C>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // View
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::Chores => draw_chores(f, app, chunks[0]),
        ViewMode::Week => draw_week(f, app, chunks[0]),
        ViewMode::Report => draw_report(f, app, chunks[0]),
    }

    let keys = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Chores => "q: Quit | a: Add | n: Name | e: Every | Space: Done | d: Del | v: View Week",
            ViewMode::Week => "q: Quit | Space: Claim/Release | Enter: Complete | h/l: Prev/Next Week | t: Today | v: View Report",
            ViewMode::Report => "q: Quit | v: View Chores",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };
    let help_text = match (&app.input_mode, &app.message) {
        (InputMode::Normal, Some(msg)) => format!("{}  [{}]", keys, msg),
        _ => keys.to_string(),
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title(format!("As {}", app.user_name())));

    f.render_widget(help, chunks[1]);

    if matches!(app.input_mode, InputMode::Editing | InputMode::Adding) {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.input_mode {
            InputMode::Adding => match app.add_state.step {
                0 => "Add Chore: Enter Name",
                _ => "Add Chore: Repeat Every N Days",
            },
            _ => match app.input_field {
                InputField::Name => "Edit Name",
                InputField::Every => "Edit Interval (days)",
                InputField::None => "Edit",
            },
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

fn draw_chores<C: Clock>(f: &mut Frame, app: &mut App<C>, area: Rect) {
    let now = app.schedule.now();
    let rows: Vec<Row> = app
        .tasks
        .iter()
        .map(|t| {
            let last_by = t
                .completed_by
                .as_deref()
                .map(|u| app.users.display_name(u))
                .unwrap_or_default();
            match DueStatus::for_task(t, now) {
                Some(status) => Row::new(vec![
                    Cell::from(short_id(&t.id).to_string()),
                    Cell::from(t.name.clone()),
                    Cell::from(format!("{}d", t.frequency_days)),
                    Cell::from(describe_days_left(status.days_left)),
                    Cell::from(timer_bar(status.progress, 12)),
                    Cell::from(last_by),
                ])
                .style(tier_style(status.tier)),
                None => Row::new(vec![
                    Cell::from(short_id(&t.id).to_string()),
                    Cell::from(t.name.clone()),
                    Cell::from(format!("{}d", t.frequency_days)),
                    Cell::from("?"),
                    Cell::from(""),
                    Cell::from(last_by),
                ])
                .style(Style::default().fg(Color::DarkGray)),
            }
        })
        .collect();

    let widths = [
        Constraint::Length(17),
        Constraint::Min(20),
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["ID", "Chore", "Every", "Due", "Timer", "Last done"])
            .style(header_style())
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title("choreboard - Chores"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn draw_week<C: Clock>(f: &mut Frame, app: &mut App<C>, area: Rect) {
    let rows: Vec<Row> = app
        .week
        .iter()
        .flat_map(|day| day.occurrences.iter().map(move |occ| (day, occ)))
        .map(|(day, occ)| {
            let status_style = match occ.status {
                OccurrenceStatus::Pending => Style::default().fg(Color::Yellow),
                OccurrenceStatus::Assigned => Style::default().fg(Color::Cyan),
                OccurrenceStatus::Completed => Style::default().fg(Color::Green),
            };
            let mut day_cell = Cell::from(day.date.format("%a %d %b").to_string());
            if day.is_today {
                day_cell = day_cell.style(header_style());
            }
            Row::new(vec![
                day_cell,
                Cell::from(occ.task_name.clone()),
                Cell::from(occ.status.to_string()).style(status_style),
                Cell::from(occ.assigned_to.as_deref().map(|u| app.users.display_name(u)).unwrap_or_default()),
            ])
        })
        .collect();

    let title = match (app.week.first(), app.week.last()) {
        (Some(first), Some(last)) => format!(
            "choreboard - Week {} to {}",
            first.date.format("%d %b"),
            last.date.format("%d %b %Y")
        ),
        _ => "choreboard - Week".to_string(),
    };

    let widths = [
        Constraint::Length(12),
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Day", "Chore", "Status", "Assigned"])
            .style(header_style())
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.week_state);
}

fn draw_report<C: Clock>(f: &mut Frame, app: &App<C>, area: Rect) {
    let report = &app.report;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Chores: ", header_style()),
            Span::raw(report.total.to_string()),
            Span::raw("   "),
            Span::styled("Overdue: ", header_style()),
            Span::styled(report.overdue.len().to_string(), tier_style(UrgencyTier::Critical)),
            Span::raw("   "),
            Span::styled("Due today: ", header_style()),
            Span::styled(report.due_today.len().to_string(), tier_style(UrgencyTier::Medium)),
            Span::raw("   "),
            Span::styled("On track: ", header_style()),
            Span::styled(report.on_track().to_string(), tier_style(UrgencyTier::Low)),
        ]),
        Line::from(format!(
            "Done today: {}   Done this week: {}",
            report.completed_today, report.completed_this_week
        )),
        Line::from(""),
    ];

    if !report.overdue.is_empty() {
        lines.push(Line::styled("Overdue", header_style()));
        for d in &report.overdue {
            lines.push(Line::styled(
                format!("  {} ({})", d.task.name, describe_days_left(d.status.days_left)),
                tier_style(d.status.tier),
            ));
        }
        lines.push(Line::from(""));
    }
    if !report.due_today.is_empty() {
        lines.push(Line::styled("Due today", header_style()));
        for d in &report.due_today {
            lines.push(Line::from(format!("  {}", d.task.name)));
        }
        lines.push(Line::from(""));
    }
    if !report.completions_by_user.is_empty() {
        lines.push(Line::styled("Done this week by", header_style()));
        for (user, count) in &report.completions_by_user {
            lines.push(Line::from(format!("  {}: {}", app.users.display_name(user), count)));
        }
    }
    if report.unreadable > 0 {
        lines.push(Line::styled(
            format!("{} chore(s) have an unreadable last-completed date.", report.unreadable),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("choreboard - Report"));
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
