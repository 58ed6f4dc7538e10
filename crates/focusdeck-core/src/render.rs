use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::ProjectDay;
use crate::focus::FocusState;
use crate::store::StoreSnapshot;
use crate::timer::{FocusTimer, TimerEvent};
use crate::views::count_label;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, snapshot))]
    pub fn print_task_table(&mut self, snapshot: &StoreSnapshot, today: ProjectDay) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_task_table(&mut out, snapshot, today)
    }

    pub fn write_task_table<W: Write>(
        &self,
        mut out: W,
        snapshot: &StoreSnapshot,
        today: ProjectDay,
    ) -> anyhow::Result<()> {
        let headers = vec![
            "#".to_string(),
            "Done".to_string(),
            "Pri".to_string(),
            "Due".to_string(),
            "Project".to_string(),
            "Title".to_string(),
        ];

        let mut rows = Vec::with_capacity(snapshot.tasks.len());
        for task in &snapshot.tasks {
            let done = if task.completed { "x" } else { "" }.to_string();

            let due = task.due_date.map(|d| today.format(d)).unwrap_or_default();
            let due = match task.due_date.map(|d| today.date_of(d)) {
                Some(day) if day < today.date() && !task.completed => self.paint(&due, "31"),
                Some(day) if day == today.date() => self.paint(&due, "33"),
                _ => due,
            };

            let priority = match task.priority.rank() {
                1 => self.paint(&task.priority.to_string(), "31"),
                _ => task.priority.to_string(),
            };

            let project = task
                .project_id
                .and_then(|id| snapshot.project(id))
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "Inbox".to_string());

            rows.push(vec![
                task.order.to_string(),
                done,
                priority,
                due,
                project,
                task.title.clone(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        writeln!(out, "{}", count_label(snapshot.tasks.len()))?;
        Ok(())
    }

    pub fn write_focus_status<W: Write>(
        &self,
        mut out: W,
        timer: &FocusTimer,
        focus: &FocusState,
        task_title: Option<&str>,
    ) -> anyhow::Result<()> {
        let segment = timer.segment(focus);
        let mut line = format!(
            "{} {}  {:>3.0}%  Session {} of {}",
            segment.title(),
            self.paint(&timer.display(), "1"),
            timer.progress(focus) * 100.0,
            focus.current_session,
            focus.settings.sessions_until_long_break,
        );
        if !segment.is_break()
            && let Some(title) = task_title
        {
            line.push_str(&format!("  [{title}]"));
        }
        writeln!(out, "{line}")?;
        Ok(())
    }

    pub fn write_event<W: Write>(&self, mut out: W, event: &TimerEvent) -> anyhow::Result<()> {
        writeln!(out, "{} {}", self.paint(event.title(), "32"), event.message())?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = visible_width(header);
    }
    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(visible_width(cell));
        }
    }

    write_row(&mut writer, &headers, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(&mut writer, &rule, &widths)?;
    for row in &rows {
        write_row(&mut writer, row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(writer: &mut W, cells: &[String], widths: &[usize]) -> anyhow::Result<()> {
    let mut line = String::new();
    for (idx, cell) in cells.iter().enumerate() {
        if idx > 0 {
            line.push(' ');
        }
        line.push_str(cell);
        if idx + 1 < cells.len() {
            let pad = widths[idx].saturating_sub(visible_width(cell));
            line.push_str(&" ".repeat(pad));
        }
    }
    writeln!(writer, "{}", line.trim_end())?;
    Ok(())
}

/// Display width ignoring ANSI colour sequences.
fn visible_width(text: &str) -> usize {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
            continue;
        }
        plain.push(c);
    }
    UnicodeWidthStr::width(plain.as_str())
}
