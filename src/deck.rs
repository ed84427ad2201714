//! Slide sequence and navigation

use crate::{PitchError, Result};

/// The fixed slide order of the deck
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slide {
    Problem = 0,
    Solution = 1,
    Roi = 2,
    Possibilities = 3,
    Offer = 4,
}

impl Slide {
    pub const ALL: [Slide; 5] = [
        Slide::Problem,
        Slide::Solution,
        Slide::Roi,
        Slide::Possibilities,
        Slide::Offer,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Slide::Problem => "The Problem",
            Slide::Solution => "The Solution",
            Slide::Roi => "ROI",
            Slide::Possibilities => "Possibilities",
            Slide::Offer => "The Offer",
        }
    }
}

/// Current position in the deck; a single counter modulo the slide count
#[derive(Clone, Debug, Default)]
pub struct SlideNavigator {
    current: usize,
}

impl SlideNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Slide {
        // `current` only ever holds a valid index
        Slide::ALL[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Advance, wrapping from the last slide to the first
    pub fn next(&mut self) -> Slide {
        self.current = (self.current + 1) % Slide::COUNT;
        self.current()
    }

    /// Go back, wrapping from the first slide to the last
    pub fn previous(&mut self) -> Slide {
        self.current = (self.current + Slide::COUNT - 1) % Slide::COUNT;
        self.current()
    }

    pub fn go_to(&mut self, index: usize) -> Result<Slide> {
        let slide = Slide::from_index(index).ok_or_else(|| {
            PitchError::ConfigError(format!(
                "slide index {} out of range (0..{})",
                index,
                Slide::COUNT
            ))
        })?;
        self.current = index;
        Ok(slide)
    }
}
