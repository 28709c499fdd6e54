//! Status bar and knob list

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_macro::{engine::engine_info, Patch};

use super::{UiStateInit, UiStateUpdate, VoiceMode};

/// Width of a knob's bar, in cells
const BAR_WIDTH: usize = 12;

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    /// Compute audio stats from a buffer
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

/// Render the status bar
#[allow(clippy::too_many_arguments)]
pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    init: &UiStateInit,
    state: &UiStateUpdate,
    mode: VoiceMode,
    patch: &Patch,
    clock_running: bool,
    stats: &AudioStats,
) {
    let block = Block::default().title(" saavy ").borders(Borders::ALL);

    let voice = match mode {
        VoiceMode::Macro => format!(
            "{} [{}]  env {:.2}  ",
            engine_info(state.engine).name,
            state.engine,
            state.envelope
        ),
        VoiceMode::Resonator => format!(
            "{} / {}  part {}  chord {}  ",
            patch.resonator.exciter_model.name(),
            patch.resonator.resonator_model.name(),
            state.active_part + 1,
            state.chord
        ),
    };

    let gate_symbol = if state.gate { "●" } else { "○" };
    let clock = if clock_running {
        format!("{} {:.0} bpm  ", gate_symbol, init.bpm)
    } else {
        "drone  ".to_string()
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", mode.name()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(voice, Style::default().fg(Color::White)),
        Span::styled(
            clock,
            Style::default().fg(if clock_running {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::styled(
            format!("{:.1}kHz x{}  ", init.sample_rate / 1000.0, init.channels),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Render the knob list with the selected knob highlighted
pub fn render_controls(
    frame: &mut Frame,
    area: Rect,
    mode: VoiceMode,
    patch: &Patch,
    selected: usize,
) {
    let block = Block::default().title(" Controls ").borders(Borders::ALL);

    let lines: Vec<Line> = mode
        .controls()
        .iter()
        .enumerate()
        .map(|(i, control)| {
            let filled = (control.level(patch) * BAR_WIDTH as f32).round() as usize;
            let bar = format!(
                "{}{}",
                "█".repeat(filled.min(BAR_WIDTH)),
                "░".repeat(BAR_WIDTH - filled.min(BAR_WIDTH))
            );
            let style = if i == selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let marker = if i == selected { ">" } else { " " };
            Line::from(vec![
                Span::styled(format!("{} {:<11}", marker, control.name()), style),
                Span::styled(bar, Style::default().fg(Color::Cyan)),
                Span::styled(format!(" {}", control.label(patch)), style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
