//! Builds the ordered list of location variants tried by one check.

use std::collections::{BTreeMap, HashSet};

use crate::config::SearchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    /// No location parameter at all.
    Unscoped,
    /// Location text cleaned up to the engine's "City, Country" convention.
    Normalized,
    /// Location text exactly as the user typed it.
    Raw,
}

impl AttemptKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unscoped => "unscoped",
            Self::Normalized => "normalized",
            Self::Raw => "raw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub kind: AttemptKind,
    pub location: Option<String>,
}

impl Attempt {
    #[must_use]
    pub const fn unscoped() -> Self {
        Self {
            kind: AttemptKind::Unscoped,
            location: None,
        }
    }

    /// Everything except the location is shared by all attempts of a check,
    /// so the location alone identifies the request.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

/// Region convention applied to free-text locations.
#[derive(Debug, Clone, Default)]
pub struct LocationRules {
    country_suffix: String,
    aliases: BTreeMap<String, String>,
}

impl LocationRules {
    #[must_use]
    pub fn new(country_suffix: impl Into<String>, aliases: BTreeMap<String, String>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(needle, canonical)| (needle.to_lowercase(), canonical))
            .filter(|(needle, _)| !needle.is_empty())
            .collect();

        Self {
            country_suffix: country_suffix.into().trim().to_string(),
            aliases,
        }
    }

    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.location_country_suffix.clone(),
            config.location_aliases.clone(),
        )
    }

    /// `"izmir / karşıyaka"` becomes `"izmir, Turkey"`; known aliases win
    /// outright. May return an empty string when nothing usable precedes `/`.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let lowered = raw.to_lowercase();
        if let Some(canonical) = self
            .aliases
            .iter()
            .find(|(needle, _)| lowered.contains(needle.as_str()))
            .map(|(_, canonical)| canonical)
        {
            return canonical.clone();
        }

        let head = raw.split('/').next().unwrap_or_default().trim();
        if head.is_empty() || self.country_suffix.is_empty() {
            return head.to_string();
        }

        let tail = format!(", {}", self.country_suffix);
        if head.to_lowercase().ends_with(&tail.to_lowercase()) {
            head.to_string()
        } else {
            format!("{head}{tail}")
        }
    }
}

/// Unscoped first, then normalized, then raw; duplicates removed keeping the
/// first occurrence.
#[must_use]
pub fn build_attempts(location: Option<&str>, rules: &LocationRules) -> Vec<Attempt> {
    let mut candidates = vec![Attempt::unscoped()];

    if let Some(raw) = location.filter(|l| !l.trim().is_empty()) {
        let normalized = rules.normalize(raw);

        if !normalized.is_empty() {
            candidates.push(Attempt {
                kind: AttemptKind::Normalized,
                location: Some(normalized.clone()),
            });
        }

        if normalized != raw {
            candidates.push(Attempt {
                kind: AttemptKind::Raw,
                location: Some(raw.to_string()),
            });
        }
    }

    dedup_attempts(candidates)
}

fn dedup_attempts(candidates: Vec<Attempt>) -> Vec<Attempt> {
    let mut seen: HashSet<Option<String>> = HashSet::new();
    candidates
        .into_iter()
        .filter(|a| seen.insert(a.signature().map(str::to_string)))
        .collect()
}
