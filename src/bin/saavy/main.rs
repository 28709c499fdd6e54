//! saavy - Terminal front panel for the macro voice
//!
//! Run with: cargo run
//!
//! Set `RUST_LOG` to write a log to `saavy.log`; the terminal itself is
//! owned by the interface.

mod app;
mod clock;
mod ui;

use app::Saavy;
use saavy_macro::Patch;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    if std::env::var_os("RUST_LOG").is_some() {
        let file = std::fs::File::create("saavy.log")?;
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    }

    let patch = Patch {
        note: 43.0,
        decay: 0.6,
        ..Patch::default()
    };

    Saavy::new().bpm(110.0).steps(&[0.0, 7.0, 12.0, 3.0]).patch(patch).run()
}
