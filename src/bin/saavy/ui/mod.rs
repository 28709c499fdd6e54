//! TUI module for saavy
//!
//! A front panel for the voice: knob list, oscilloscope and spectrum.

mod panel;
mod spectrum;
pub mod state;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::debug;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use saavy_macro::Patch;
use std::time::Duration;

pub use state::{ControlMessage, UiStateInit, UiStateUpdate, VoiceMode};

use panel::{render_controls, render_status, AudioStats};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;

/// UI application state
pub struct UiApp {
    /// Ring buffer sender for knob changes
    control_tx: Producer<ControlMessage>,
    /// Ring buffer receiver for audio samples
    audio_rx: Consumer<f32>,
    /// Ring buffer receiver for state updates
    state_rx: Consumer<UiStateUpdate>,
    init: UiStateInit,
    /// Latest state received from the audio thread
    current_state: UiStateUpdate,
    /// Knob settings; the UI owns them and sends copies
    patch: Patch,
    mode: VoiceMode,
    /// Index into the current mode's control list
    selected: usize,
    clock_running: bool,
    /// Audio sample buffer for visualization
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        control_tx: Producer<ControlMessage>,
        audio_rx: Consumer<f32>,
        state_rx: Consumer<UiStateUpdate>,
        init: UiStateInit,
        patch: Patch,
    ) -> Self {
        Self {
            control_tx,
            audio_rx,
            state_rx,
            init,
            current_state: UiStateUpdate::default(),
            patch,
            mode: VoiceMode::Macro,
            selected: 0,
            clock_running: true,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, init.sample_rate),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_state();
            self.spectrum.update(&self.audio_buffer);

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    /// Poll for new audio samples, keeping the last VIS_BUFFER_SIZE
    fn poll_audio(&mut self) {
        let mut received = false;
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.push(sample);
            received = true;
        }

        if received && self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    /// Keep only the latest state
    fn poll_state(&mut self) {
        while let Ok(state) = self.state_rx.pop() {
            self.current_state = state;
        }
    }

    fn send(&mut self, message: ControlMessage) {
        if self.control_tx.push(message).is_err() {
            debug!("control ring full, dropped {:?}", message);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let controls = self.mode.controls();
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = (self.selected + controls.len() - 1) % controls.len();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1) % controls.len();
            }
            KeyCode::Left | KeyCode::Char('h') => self.turn(-1),
            KeyCode::Right | KeyCode::Char('l') => self.turn(1),
            KeyCode::Char(' ') => {
                self.clock_running = !self.clock_running;
                self.send(ControlMessage::Clock(self.clock_running));
            }
            KeyCode::Enter => self.send(ControlMessage::Strike),
            KeyCode::Tab => {
                self.mode = self.mode.toggled();
                self.selected = 0;
                self.send(ControlMessage::Mode(self.mode));
            }
            _ => {}
        }
    }

    fn turn(&mut self, steps: i32) {
        let control = self.mode.controls()[self.selected];
        control.nudge(&mut self.patch, steps);
        self.send(ControlMessage::Patch(self.patch));
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Controls and scopes
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(20)])
            .split(rows[1]);

        let scopes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_status(
            frame,
            rows[0],
            &self.init,
            &self.current_state,
            self.mode,
            &self.patch,
            self.clock_running,
            &stats,
        );
        render_controls(frame, columns[0], self.mode, &self.patch, self.selected);
        render_waveform(frame, scopes[0], &self.audio_buffer);
        render_spectrum(frame, scopes[1], self.spectrum.data());

        let help = Paragraph::new(
            " [Q] Quit  [↑↓] Select  [←→] Turn  [Space] Clock  [Enter] Strike  [Tab] Voice",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[2]);
    }
}
