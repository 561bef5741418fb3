//! Conformance subset types.

use crate::config::PdfVersion;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PDF/A conformance level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PdfALevel {
    /// PDF/A-1a: Full conformance with logical structure
    A1a,
    /// PDF/A-1b: Basic conformance (visual preservation)
    A1b,
    /// PDF/A-2a: PDF 1.7 based, full conformance
    A2a,
    /// PDF/A-2b: PDF 1.7 based, basic conformance
    A2b,
    /// PDF/A-2u: PDF/A-2b plus Unicode mapping
    A2u,
    /// PDF/A-3a: PDF/A-2a plus embedded files
    A3a,
    /// PDF/A-3b: PDF/A-2b plus embedded files
    A3b,
    /// PDF/A-3u: PDF/A-3b plus Unicode mapping
    A3u,
}

impl PdfALevel {
    /// Get the PDF/A part (1, 2, or 3).
    pub fn part(&self) -> u8 {
        match self {
            PdfALevel::A1a | PdfALevel::A1b => 1,
            PdfALevel::A2a | PdfALevel::A2b | PdfALevel::A2u => 2,
            PdfALevel::A3a | PdfALevel::A3b | PdfALevel::A3u => 3,
        }
    }

    /// Get the conformance level letter.
    pub fn conformance(&self) -> char {
        match self {
            PdfALevel::A1a | PdfALevel::A2a | PdfALevel::A3a => 'A',
            PdfALevel::A1b | PdfALevel::A2b | PdfALevel::A3b => 'B',
            PdfALevel::A2u | PdfALevel::A3u => 'U',
        }
    }

    /// Check if this level requires logical structure (Tagged PDF).
    pub fn requires_structure(&self) -> bool {
        matches!(self, PdfALevel::A1a | PdfALevel::A2a | PdfALevel::A3a)
    }

    /// Lowest output version this level can be written at.
    pub fn minimum_version(&self) -> PdfVersion {
        if self.part() == 1 {
            PdfVersion::V1_4
        } else {
            PdfVersion::V1_7
        }
    }

    fn from_parts(part: u8, conformance: char) -> Option<Self> {
        match (part, conformance.to_ascii_uppercase()) {
            (1, 'A') => Some(PdfALevel::A1a),
            (1, 'B') => Some(PdfALevel::A1b),
            (2, 'A') => Some(PdfALevel::A2a),
            (2, 'B') => Some(PdfALevel::A2b),
            (2, 'U') => Some(PdfALevel::A2u),
            (3, 'A') => Some(PdfALevel::A3a),
            (3, 'B') => Some(PdfALevel::A3b),
            (3, 'U') => Some(PdfALevel::A3u),
            _ => None,
        }
    }
}

impl fmt::Display for PdfALevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PDF/A-{}{}", self.part(), self.conformance().to_ascii_lowercase())
    }
}

/// Requested conformance subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Subset {
    /// Archival profile
    PdfA(PdfALevel),
    /// Accessibility profile (requires tagging)
    PdfUA,
}

impl Subset {
    /// Lowest output version this subset can be written at.
    pub fn minimum_version(&self) -> PdfVersion {
        match self {
            Subset::PdfA(level) => level.minimum_version(),
            Subset::PdfUA => PdfVersion::V1_7,
        }
    }

    /// The PDF/A level, if this is an archival subset.
    pub fn pdfa_level(&self) -> Option<PdfALevel> {
        match self {
            Subset::PdfA(level) => Some(*level),
            Subset::PdfUA => None,
        }
    }
}

impl FromStr for Subset {
    type Err = Error;

    /// Parse `"PDF/A-1"`, `"PDF/A-2b"`, `"PDF/UA"` and similar.
    ///
    /// A bare part number selects conformance B.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Config(format!("unknown conformance subset '{}'", s));
        let upper = s.trim().to_ascii_uppercase();
        if upper == "PDF/UA" || upper == "PDF/UA-1" {
            return Ok(Subset::PdfUA);
        }
        let rest = upper.strip_prefix("PDF/A-").ok_or_else(invalid)?;
        let mut chars = rest.chars();
        let part = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(invalid)? as u8;
        let conformance = match (chars.next(), chars.next()) {
            (None, None) => 'B',
            (Some(c), None) => c,
            _ => return Err(invalid()),
        };
        PdfALevel::from_parts(part, conformance)
            .map(Subset::PdfA)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Subset {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Subset> for String {
    fn from(subset: Subset) -> Self {
        subset.to_string()
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subset::PdfA(level) => write!(f, "{}", level),
            Subset::PdfUA => write!(f, "PDF/UA"),
        }
    }
}
