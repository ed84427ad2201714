//! UI components module
//!
//! Reusable pieces of the deck: navigation chrome, cards and the demo
//! visualizer.

pub mod card;
pub mod navigation;
pub mod visualizer;

pub use card::{bullet, card_frame, highlight_frame, pill};
pub use navigation::{Direction, NavButton, ProgressDots};
pub use visualizer::AudioVisualizer;
