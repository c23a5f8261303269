//! Supplementary per-mode stats export.
//!
//! Fetched only after the primary source found a profile. The body is JSON
//! shaped `{"stats": {"a": {"kpd": ..}, "r": {..}, "s": {..}}}`; missing or
//! non-numeric fields read as zero.

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use wtstat_core::profile::ModeRatings;

use crate::transport::ScrapeRequest;
use crate::ParseError;

#[derive(Debug, Default, Deserialize)]
struct ExportBody {
    #[serde(default)]
    stats: Option<ModeStats>,
}

#[derive(Debug, Default, Deserialize)]
struct ModeStats {
    #[serde(default)]
    a: Option<ModeEntry>,
    #[serde(default)]
    r: Option<ModeEntry>,
    #[serde(default)]
    s: Option<ModeEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct ModeEntry {
    #[serde(default)]
    kpd: Value,
}

impl ModeEntry {
    fn rating(entry: Option<&Self>) -> f64 {
        match entry.map(|e| &e.kpd) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

/// Build the export request `{base}/{nickname}/export/json`.
pub fn request(base: &str, nickname: &str) -> Result<ScrapeRequest, ParseError> {
    let mut url = Url::parse(base).map_err(|e| ParseError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ParseError::InvalidUrl(format!("{base}: cannot be a base")))?
        .pop_if_empty()
        .extend([nickname, "export", "json"]);
    Ok(ScrapeRequest::get(url))
}

/// Read the three mode ratings from an export body.
pub fn parse_ratings(body: &str) -> Result<ModeRatings, ParseError> {
    let parsed: ExportBody = serde_json::from_str(body)?;
    let stats = parsed.stats.unwrap_or_default();
    Ok(ModeRatings {
        arcade: ModeEntry::rating(stats.a.as_ref()),
        realistic: ModeEntry::rating(stats.r.as_ref()),
        simulator: ModeEntry::rating(stats.s.as_ref()),
    })
}
