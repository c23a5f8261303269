//! Player profile model and its user-facing text rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// A persisted player statistics snapshot, keyed by nickname.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub nickname: String,
    pub clan: String,
    pub clan_url: String,
    pub banned: bool,
    pub register_date: Option<NaiveDate>,
    pub title: String,
    pub level: i32,
    /// Arcade battles rating from the secondary source.
    pub ts_ab_rate: f64,
    /// Realistic battles rating from the secondary source.
    pub ts_rb_rate: f64,
    /// Simulator battles rating from the secondary source.
    pub ts_sb_rate: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Identity fields extracted from the primary source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProfile {
    pub nickname: String,
    pub clan: String,
    pub clan_url: String,
    pub banned: bool,
    pub register_date: Option<NaiveDate>,
    pub title: String,
    pub level: i32,
    /// Stat tables shown on the page. Carried in the mission result only.
    pub stats: PageStats,
}

/// One table per battle mode, row label to displayed value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeTables {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ab: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rb: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sb: BTreeMap<String, String>,
}

impl ModeTables {
    pub fn is_empty(&self) -> bool {
        self.ab.is_empty() && self.rb.is_empty() && self.sb.is_empty()
    }
}

/// Vehicle-class ratings, each split per battle mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTables {
    #[serde(default, skip_serializing_if = "ModeTables::is_empty")]
    pub aviation: ModeTables,
    #[serde(default, skip_serializing_if = "ModeTables::is_empty")]
    pub ground_vehicles: ModeTables,
    #[serde(default, skip_serializing_if = "ModeTables::is_empty")]
    pub fleet: ModeTables,
}

impl RateTables {
    pub fn is_empty(&self) -> bool {
        self.aviation.is_empty() && self.ground_vehicles.is_empty() && self.fleet.is_empty()
    }
}

/// Statistic tables of the official profile page.
///
/// Values are kept as displayed (`"52%"`, `"1 234"`, `"N/A"`); the page
/// changes formatting more often than it changes labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    #[serde(default, skip_serializing_if = "ModeTables::is_empty")]
    pub user_stat: ModeTables,
    #[serde(default, skip_serializing_if = "RateTables::is_empty")]
    pub user_rate: RateTables,
}

impl PageStats {
    pub fn is_empty(&self) -> bool {
        self.user_stat.is_empty() && self.user_rate.is_empty()
    }
}

/// Per-mode ratings from the secondary source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModeRatings {
    pub arcade: f64,
    pub realistic: f64,
    pub simulator: f64,
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub clan: Option<String>,
    pub clan_url: Option<String>,
    pub banned: Option<bool>,
    pub register_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub level: Option<i32>,
    pub ts_ab_rate: Option<f64>,
    pub ts_rb_rate: Option<f64>,
    pub ts_sb_rate: Option<f64>,
}

impl ProfileUpdate {
    /// Overwrite every identity field with a fresh primary-source extract.
    pub fn identity(extract: &NewProfile) -> Self {
        Self {
            clan: Some(extract.clan.clone()),
            clan_url: Some(extract.clan_url.clone()),
            banned: Some(extract.banned),
            register_date: extract.register_date,
            title: Some(extract.title.clone()),
            level: Some(extract.level),
            ..Self::default()
        }
    }

    pub fn ratings(ratings: ModeRatings) -> Self {
        Self {
            ts_ab_rate: Some(ratings.arcade),
            ts_rb_rate: Some(ratings.realistic),
            ts_sb_rate: Some(ratings.simulator),
            ..Self::default()
        }
    }

    /// Apply this update to an in-memory profile.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(clan) = &self.clan {
            profile.clan = clan.clone();
        }
        if let Some(clan_url) = &self.clan_url {
            profile.clan_url = clan_url.clone();
        }
        if let Some(banned) = self.banned {
            profile.banned = banned;
        }
        if let Some(date) = self.register_date {
            profile.register_date = Some(date);
        }
        if let Some(title) = &self.title {
            profile.title = title.clone();
        }
        if let Some(level) = self.level {
            profile.level = level;
        }
        if let Some(rate) = self.ts_ab_rate {
            profile.ts_ab_rate = rate;
        }
        if let Some(rate) = self.ts_rb_rate {
            profile.ts_rb_rate = rate;
        }
        if let Some(rate) = self.ts_sb_rate {
            profile.ts_sb_rate = rate;
        }
    }
}

/// How much detail the caller wants in a profile message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStyle {
    #[default]
    Short,
    Full,
}

impl Profile {
    pub fn age(&self, now: Timestamp) -> chrono::Duration {
        now - self.updated_at
    }

    pub fn to_message(&self, style: MessageStyle) -> String {
        match style {
            MessageStyle::Short => self.short_message(),
            MessageStyle::Full => self.full_message(),
        }
    }

    fn short_message(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "{}", self.nickname);
        if !self.clan.is_empty() {
            let _ = write!(out, " [{}]", self.clan);
        }
        let _ = write!(out, " | Lv.{}", self.level);
        if !self.title.is_empty() {
            let _ = write!(out, " | {}", self.title);
        }
        let _ = write!(
            out,
            "\nAB {:.2} / RB {:.2} / SB {:.2}",
            self.ts_ab_rate, self.ts_rb_rate, self.ts_sb_rate
        );
        let _ = write!(out, "\nUpdated {} UTC", self.updated_at.format("%Y-%m-%d %H:%M"));
        out
    }

    fn full_message(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Nickname: {}", self.nickname);
        let clan = if self.clan.is_empty() { "-" } else { &self.clan };
        let _ = writeln!(out, "Clan: {clan}");
        if !self.clan_url.is_empty() {
            let _ = writeln!(out, "Clan page: {}", self.clan_url);
        }
        let title = if self.title.is_empty() { "-" } else { &self.title };
        let _ = writeln!(out, "Title: {title}");
        let _ = writeln!(out, "Level: {}", self.level);
        match self.register_date {
            Some(date) => {
                let _ = writeln!(out, "Registered: {}", date.format("%Y-%m-%d"));
            }
            None => {
                let _ = writeln!(out, "Registered: unknown");
            }
        }
        let _ = writeln!(out, "Banned: {}", if self.banned { "yes" } else { "no" });
        let _ = writeln!(out, "Arcade rating: {:.2}", self.ts_ab_rate);
        let _ = writeln!(out, "Realistic rating: {:.2}", self.ts_rb_rate);
        let _ = writeln!(out, "Simulator rating: {:.2}", self.ts_sb_rate);
        let _ = write!(out, "Updated {} UTC", self.updated_at.format("%Y-%m-%d %H:%M"));
        out
    }
}
