//! UI module for the pitch deck
//!
//! This module provides:
//! - The eframe application shell with header and slide navigation
//! - The five slides, including the live voice demo card
//! - Reusable components and the branded theme

pub mod app;
pub mod components;
pub mod slides;
pub mod theme;

pub use app::{header_lines, PitchDeckApp, HEADER_TAGLINE};
pub use components::{AudioVisualizer, Direction, NavButton, ProgressDots};
pub use slides::{DemoPanel, RoiPanel};
pub use theme::Theme;
