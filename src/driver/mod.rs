//! Headless terminal driver: input, presentation, audio and the session loop

pub mod audio;
pub mod input;
pub mod present;
pub mod runner;

pub use audio::TracingAudio;
pub use input::read_stdin;
pub use present::LogPresenter;
pub use runner::MatchRunner;
