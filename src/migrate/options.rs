use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{XlError, XlErrorKind, XlResult},
    types::color::{NamedColor, Rgb},
};

/// How a target cell (or row) compared to the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    /// The target was empty and received the source value
    #[serde(rename = "Filled-in")]
    FilledIn,
    /// The target differed and was replaced by the source value
    Overwritten,
    /// The target differs from the source and was left as is
    Different,
    /// The target key is empty or absent from the sources
    Mismatched,
    /// The target already holds the source value
    Ignored,
    /// The key appears more than once in the sources
    Redundant,
    /// Source keys no target row asked for
    Unused,
}

impl Outcome {
    pub const ALL: [Outcome; 7] = [
        Outcome::FilledIn,
        Outcome::Overwritten,
        Outcome::Different,
        Outcome::Mismatched,
        Outcome::Ignored,
        Outcome::Redundant,
        Outcome::Unused,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Outcome::FilledIn => "Filled-in",
            Outcome::Overwritten => "Overwritten",
            Outcome::Different => "Different",
            Outcome::Mismatched => "Mismatched",
            Outcome::Ignored => "Ignored",
            Outcome::Redundant => "Redundant",
            Outcome::Unused => "Unused",
        }
    }

    pub(crate) fn position(self) -> usize {
        self as usize
    }

    pub fn default_color(self) -> NamedColor {
        match self {
            Outcome::FilledIn => NamedColor::Blue,
            Outcome::Overwritten => NamedColor::Green,
            Outcome::Different => NamedColor::Wheat,
            Outcome::Mismatched => NamedColor::Tomato,
            Outcome::Ignored => NamedColor::Sky,
            Outcome::Redundant => NamedColor::Purple,
            Outcome::Unused => NamedColor::Navy,
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Outcome {
    type Err = XlError;

    fn from_str(name: &str) -> XlResult<Self> {
        Outcome::ALL
            .into_iter()
            .find(|outcome| outcome.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                XlErrorKind::InvalidArguments(format!("unknown outcome: \"{name}\"")).into()
            })
    }
}

/// Fill colors of the outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette([Rgb; 7]);

impl Default for Palette {
    fn default() -> Self {
        Self(Outcome::ALL.map(|outcome| outcome.default_color().rgb()))
    }
}

impl Palette {
    pub fn color(&self, outcome: Outcome) -> Rgb {
        self.0[outcome.position()]
    }

    pub fn with_color(mut self, outcome: Outcome, color: impl Into<Rgb>) -> Self {
        self.0[outcome.position()] = color.into();
        self
    }
}

/// Settings of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    pub overwrite: bool,
    /// Rows between two progress snapshots, 0 for the final one only
    pub batch_size: usize,
    pub palette: Palette,
    /// Order in which the summary is reported and folded
    pub ordering: [Outcome; 7],
    /// Outcomes subtracted from the number of distinct source keys to count unused keys
    pub unused_deductions: Vec<Outcome>,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            batch_size: 10,
            palette: Palette::default(),
            ordering: Outcome::ALL,
            unused_deductions: vec![Outcome::Mismatched, Outcome::Redundant],
        }
    }
}

impl MigrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_ordering(mut self, ordering: [Outcome; 7]) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_unused_deductions(mut self, deductions: Vec<Outcome>) -> Self {
        self.unused_deductions = deductions;
        self
    }

    pub fn validate(&self) -> XlResult<()> {
        let mut sorted = self.ordering;
        sorted.sort();
        if sorted != Outcome::ALL {
            return Err(XlErrorKind::InvalidArguments(format!(
                "ordering should list every outcome once, got {:?}",
                self.ordering
            ))
            .into());
        }
        if self.ordering.last() != Some(&Outcome::Unused) {
            return Err(XlErrorKind::InvalidArguments(
                "ordering should end with Unused".to_string(),
            )
            .into());
        }
        if self.unused_deductions.contains(&Outcome::Unused) {
            return Err(XlErrorKind::InvalidArguments(
                "Unused can not be deducted from itself".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
