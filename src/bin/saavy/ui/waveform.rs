//! Oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Render the last buffer, starting at a rising zero crossing so periodic
/// sounds stand still.
pub fn render_waveform(frame: &mut Frame, area: Rect, audio_buffer: &[f32]) {
    let block = Block::default().title(" Scope ").borders(Borders::ALL);

    let half = audio_buffer.len() / 2;
    let start = audio_buffer
        .windows(2)
        .take(half)
        .position(|w| w[0] <= 0.0 && w[1] > 0.0)
        .unwrap_or(0);
    let view = &audio_buffer[start..(start + half).min(audio_buffer.len())];

    let data: Vec<(f64, f64)> = view
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / view.len().max(1) as f64, sample as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
