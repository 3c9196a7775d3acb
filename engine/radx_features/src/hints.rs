//! Condition keywords embedded in uploaded file names.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A condition category detected in a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintTag {
    Normal,
    Pneumonia,
    Covid,
    Fracture,
    Arthritis,
    Tuberculosis,
    Tumor,
}

/// Keyword table, scanned top to bottom. Order here is the order hints are
/// reported in and therefore the order they are resolved in.
const KEYWORDS: &[(HintTag, &[&str])] = &[
    (HintTag::Normal, &["normal", "healthy", "clear"]),
    (HintTag::Pneumonia, &["pneumonia", "infection", "consolidation"]),
    (HintTag::Covid, &["covid", "coronavirus", "covid-19"]),
    (HintTag::Fracture, &["fracture", "break", "broken", "crack"]),
    (HintTag::Arthritis, &["arthritis", "joint", "inflammation"]),
    (HintTag::Tuberculosis, &["tb", "tuberculosis", "tubercular"]),
    (HintTag::Tumor, &["tumor", "mass", "growth", "cancer"]),
];

impl HintTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            HintTag::Normal => "normal",
            HintTag::Pneumonia => "pneumonia",
            HintTag::Covid => "covid",
            HintTag::Fracture => "fracture",
            HintTag::Arthritis => "arthritis",
            HintTag::Tuberculosis => "tuberculosis",
            HintTag::Tumor => "tumor",
        }
    }

    pub fn synonyms(&self) -> &'static [&'static str] {
        KEYWORDS
            .iter()
            .find(|(tag, _)| tag == self)
            .map(|(_, words)| *words)
            .unwrap_or(&[])
    }
}

impl fmt::Display for HintTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scan a file name (not a path) for condition keywords.
///
/// Matching is a plain substring test on the lower-cased name, so short
/// tokens such as `tb` match inside longer words.
pub fn scan_file_name(file_name: &str) -> Vec<HintTag> {
    let lowered = file_name.to_lowercase();
    KEYWORDS
        .iter()
        .filter(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(tag, _)| *tag)
        .collect()
}

/// Scan the base name of `path`; directories never contribute hints.
pub fn scan_path(path: &Path) -> Vec<HintTag> {
    path.file_name()
        .map(|n| scan_file_name(&n.to_string_lossy()))
        .unwrap_or_default()
}
