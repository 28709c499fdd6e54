//! Wavetable scanning across three 8 x 8 banks.
//!
//! `harmonics` moves between banks, `morph` between the rows of a bank and
//! `timbre` along a row. Bank and row are interpolated by rendering the four
//! surrounding rows and weighting them bilinearly; the position along a row
//! is interpolated by the oscillator itself. `aux` plays the nearest wave
//! without any interpolation, for a stepped, lo-fi scan.

use crate::config::SampleRate;
use crate::oscillator::wavetable::{NUM_BANKS, WAVES_PER_BANK};
use crate::oscillator::WavetableOscillator;

use super::{Engine, EngineParameters, ScratchBuffers};

const ROWS: usize = 8;
const COLUMNS: usize = 8;

#[derive(Debug, Clone)]
pub struct WavetableEngine {
    sample_rate: SampleRate,
    /// (bank, row) corners: (0, 0), (0, 1), (1, 0), (1, 1).
    corners: [WavetableOscillator; 4],
    quantized: WavetableOscillator,
}

impl Default for WavetableEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WavetableEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            corners: [WavetableOscillator::new(); 4],
            quantized: WavetableOscillator::new(),
        }
    }
}

#[inline]
fn first_wave(bank: usize, row: usize) -> usize {
    bank.min(NUM_BANKS - 1) * WAVES_PER_BANK + row.min(ROWS - 1) * COLUMNS
}

impl Engine for WavetableEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.reset();
    }

    fn reset(&mut self) {
        for oscillator in self.corners.iter_mut() {
            oscillator.reset();
        }
        self.quantized.reset();
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        _scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        let f0 = self.sample_rate.note_to_frequency(parameters.note);

        let bank = parameters.harmonics.clamp(0.0, 1.0) * (NUM_BANKS as f32 - 1.0001);
        let bank_integral = bank as usize;
        let bank_fractional = bank - bank_integral as f32;

        let row = parameters.morph.clamp(0.0, 1.0) * (ROWS as f32 - 1.0001);
        let row_integral = row as usize;
        let row_fractional = row - row_integral as f32;

        out.fill(0.0);
        aux.fill(0.0);
        for (i, oscillator) in self.corners.iter_mut().enumerate() {
            let bank_offset = i / 2;
            let row_offset = i % 2;
            let bank_weight = if bank_offset == 0 { 1.0 - bank_fractional } else { bank_fractional };
            let row_weight = if row_offset == 0 { 1.0 - row_fractional } else { row_fractional };
            oscillator.render(
                f0,
                bank_weight * row_weight,
                parameters.timbre,
                first_wave(bank_integral + bank_offset, row_integral + row_offset),
                COLUMNS,
                out,
            );
        }

        let nearest_bank = (parameters.harmonics.clamp(0.0, 1.0) * (NUM_BANKS - 1) as f32).round() as usize;
        let nearest_row = (parameters.morph.clamp(0.0, 1.0) * (ROWS - 1) as f32).round() as usize;
        let nearest_column = (parameters.timbre.clamp(0.0, 1.0) * (COLUMNS - 1) as f32).round();
        self.quantized.render(
            f0,
            1.0,
            nearest_column / (COLUMNS - 1) as f32,
            first_wave(nearest_bank, nearest_row),
            COLUMNS,
            aux,
        );
    }
}
