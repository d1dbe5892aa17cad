//! Rendering: frame throttle and the channel table.

use std::time::Instant;

use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Frame;

use keysynth_core::dispatch::{EventHandler, TickReport};
use keysynth_core::synth::Synth;

use super::AppRuntime;

const HEADER: [&str; 6] = ["ch", "mode", "instrument", "vol", "mod", "bend"];

impl AppRuntime {
    /// Render at most once per frame interval, and only when something changed.
    pub(crate) fn maybe_render(
        &mut self,
        backend: &mut crate::ui::RatatuiBackend,
    ) -> std::io::Result<()> {
        let now = Instant::now();
        if now.duration_since(self.last_render_time) < self.frame_interval {
            return Ok(());
        }
        // keep the backlog counter live while knobs drain
        if self.last_report.knob_backlog > 0 {
            self.render_needed = true;
        }
        if !self.render_needed {
            return Ok(());
        }
        self.last_render_time = now;

        let rows = channel_rows(&self.handler);
        let current = self.handler.current_index();
        let midi_in = self
            .midi_input
            .as_ref()
            .and_then(|midi_input| midi_input.connected_port_name());
        let footer = footer_text(&self.last_report, &self.synth_label, midi_in, self.held.len());
        backend.draw(|frame| draw(frame, &rows, current, &footer))?;

        self.render_needed = false;
        Ok(())
    }
}

/// One row of display text per channel.
pub(crate) fn channel_rows<S: Synth>(handler: &EventHandler<S>) -> Vec<[String; 6]> {
    handler
        .channels()
        .enumerate()
        .map(|(i, channel)| {
            let mode = handler
                .mode(i)
                .map(|m| format!("{} {}", m.tag(), m.status()))
                .unwrap_or_default();
            [
                format!("{:2}", channel.index()),
                mode,
                channel.instrument.to_string(),
                channel.volume().to_string(),
                channel.modulation().to_string(),
                format!("{:+}", channel.pitch()),
            ]
        })
        .collect()
}

pub(crate) fn footer_text(
    report: &TickReport,
    synth_label: &str,
    midi_in: Option<&str>,
    held: usize,
) -> String {
    format!(
        " {} | in: {} | held {} | knobs queued {} | tick {}us | F1-F3 mode  \u{2190}/\u{2192} channel  Esc quit",
        synth_label,
        midi_in.unwrap_or("none"),
        held,
        report.knob_backlog,
        report.elapsed.as_micros(),
    )
}

fn draw(frame: &mut Frame, rows: &[[String; 6]], current: usize, footer: &str) {
    let [table_area, footer_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());

    let header = Row::new(HEADER).style(Style::default().add_modifier(Modifier::BOLD));
    let body = rows.iter().enumerate().map(|(i, cells)| {
        let row = Row::new(cells.iter().map(String::as_str));
        if i == current {
            row.style(Style::default().fg(Color::Black).bg(Color::Cyan))
        } else {
            row
        }
    });
    let widths = [
        Constraint::Length(3),
        Constraint::Min(22),
        Constraint::Length(10),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(6),
    ];
    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(" keysynth "));
    frame.render_widget(table, table_area);

    let footer = Paragraph::new(Line::from(footer)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, footer_area);
}
