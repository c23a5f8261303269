//! Official profile page extraction.
//!
//! The page is looked up by POSTing the nickname as the `nick` query
//! parameter. A not-found page carries a dedicated marker element; a found
//! page carries the profile block. Anything else is a parse error.
//!
//! The stat tables are laid out as columns: one list of row labels and one
//! list of values per battle mode. A table or column the page leaves out
//! comes back empty rather than failing the parse.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use wtstat_core::profile::{ModeTables, NewProfile, PageStats, RateTables};

use crate::transport::ScrapeRequest;
use crate::ParseError;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}\.\d{2}\.\d{4}|\d{4}-\d{2}-\d{2}").expect("valid regex")
});

/// CSS selectors for the official profile page.
#[derive(Debug, Clone)]
pub struct PrimarySelectors {
    /// Present only when the player does not exist.
    pub not_found: String,
    /// Container of a found profile.
    pub profile_block: String,
    pub nickname: String,
    /// Clan link; its text is the clan tag and its `href` the clan page.
    pub clan_link: String,
    pub title: String,
    pub level: String,
    pub register_date: String,
    /// Present when the account is banned.
    pub banned: String,
    /// Overall per-mode statistics.
    pub stat_block: String,
    pub rate_aviation: String,
    pub rate_ground: String,
    pub rate_fleet: String,
    /// Column of row labels within a table.
    pub row_titles: String,
    pub arcade_column: String,
    pub realistic_column: String,
    pub simulator_column: String,
    /// One cell of any column.
    pub table_item: String,
}

impl Default for PrimarySelectors {
    fn default() -> Self {
        Self {
            not_found: "div.user__unavailable-title".to_string(),
            profile_block: "div.user-info".to_string(),
            nickname: ".user-profile__data-nick".to_string(),
            clan_link: ".user-profile__data-clan a".to_string(),
            title: ".user-profile__data-title".to_string(),
            level: ".user-profile__data-item".to_string(),
            register_date: ".user-profile__data-regdate".to_string(),
            banned: ".user-profile__data-nick--banned".to_string(),
            stat_block: "div.user-stat".to_string(),
            rate_aviation: "div.user-rate__fightType--aviation".to_string(),
            rate_ground: "div.user-rate__fightType--ground".to_string(),
            rate_fleet: "div.user-rate__fightType--fleet".to_string(),
            row_titles: "ul.profile-stat__list-titles".to_string(),
            arcade_column: "ul.arcadeFightTab".to_string(),
            realistic_column: "ul.historyFightTab".to_string(),
            simulator_column: "ul.simulationFightTab".to_string(),
            table_item: "li.user-stat__list-item".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryOutcome {
    /// The source positively reported that the player does not exist.
    NotFound,
    Found(NewProfile),
}

struct Compiled {
    not_found: Selector,
    profile_block: Selector,
    nickname: Selector,
    clan_link: Selector,
    title: Selector,
    level: Selector,
    register_date: Selector,
    banned: Selector,
    stat_block: Selector,
    rate_aviation: Selector,
    rate_ground: Selector,
    rate_fleet: Selector,
    row_titles: Selector,
    arcade_column: Selector,
    realistic_column: Selector,
    simulator_column: Selector,
    table_item: Selector,
}

/// Parser with selectors compiled once at construction.
pub struct PrimaryParser {
    selectors: Compiled,
    base_url: Url,
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let found = DATE.find(text)?.as_str();
    NaiveDate::parse_from_str(found, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(found, "%Y-%m-%d"))
        .ok()
}

impl PrimaryParser {
    /// `base_url` resolves relative clan links.
    pub fn new(selectors: PrimarySelectors, base_url: &str) -> Result<Self, ParseError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ParseError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            selectors: Compiled {
                not_found: compile(&selectors.not_found)?,
                profile_block: compile(&selectors.profile_block)?,
                nickname: compile(&selectors.nickname)?,
                clan_link: compile(&selectors.clan_link)?,
                title: compile(&selectors.title)?,
                level: compile(&selectors.level)?,
                register_date: compile(&selectors.register_date)?,
                banned: compile(&selectors.banned)?,
                stat_block: compile(&selectors.stat_block)?,
                rate_aviation: compile(&selectors.rate_aviation)?,
                rate_ground: compile(&selectors.rate_ground)?,
                rate_fleet: compile(&selectors.rate_fleet)?,
                row_titles: compile(&selectors.row_titles)?,
                arcade_column: compile(&selectors.arcade_column)?,
                realistic_column: compile(&selectors.realistic_column)?,
                simulator_column: compile(&selectors.simulator_column)?,
                table_item: compile(&selectors.table_item)?,
            },
            base_url,
        })
    }

    /// Build the lookup request for `nickname` against `base`.
    pub fn request(base: &str, nickname: &str) -> Result<ScrapeRequest, ParseError> {
        let url = Url::parse_with_params(base, &[("nick", nickname)])
            .map_err(|e| ParseError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(ScrapeRequest::post(url))
    }

    /// Extract the profile identity from a page body.
    ///
    /// The nickname of a found profile is always the requested one: the
    /// page obfuscates some nicknames (console accounts that look like
    /// e-mail addresses).
    pub fn parse(&self, html: &str, requested: &str) -> Result<PrimaryOutcome, ParseError> {
        let document = Html::parse_document(html);
        let s = &self.selectors;

        if document.select(&s.not_found).next().is_some() {
            return Ok(PrimaryOutcome::NotFound);
        }
        let block = document
            .select(&s.profile_block)
            .next()
            .ok_or(ParseError::MissingProfileBlock)?;

        let first_text = |selector: &Selector| block.select(selector).next().map(text_of);

        let (clan, clan_url) = match block.select(&s.clan_link).next() {
            Some(link) => {
                let href = link.value().attr("href").unwrap_or_default();
                let url = if href.is_empty() {
                    String::new()
                } else {
                    self.base_url
                        .join(href)
                        .map(String::from)
                        .unwrap_or_else(|_| href.to_string())
                };
                (text_of(link), url)
            }
            None => (String::new(), String::new()),
        };

        let level = block
            .select(&s.level)
            .map(text_of)
            .find(|text| text.to_ascii_lowercase().contains("level"))
            .or_else(|| block.select(&s.level).next().map(text_of))
            .and_then(|text| DIGITS.find(&text).and_then(|m| m.as_str().parse().ok()))
            .unwrap_or(0);

        let banned = block.select(&s.banned).next().is_some();
        if let Some(page_nick) = first_text(&s.nickname) {
            if page_nick != requested {
                tracing::debug!(page_nick = %page_nick, requested, "Overriding page nickname");
            }
        }

        let table = |selector: &Selector| self.mode_tables(document.select(selector).next());
        let stats = PageStats {
            user_stat: table(&s.stat_block),
            user_rate: RateTables {
                aviation: table(&s.rate_aviation),
                ground_vehicles: table(&s.rate_ground),
                fleet: table(&s.rate_fleet),
            },
        };

        Ok(PrimaryOutcome::Found(NewProfile {
            nickname: requested.to_string(),
            clan,
            clan_url,
            banned,
            register_date: first_text(&s.register_date).as_deref().and_then(parse_date),
            title: first_text(&s.title).unwrap_or_default(),
            level,
            stats,
        }))
    }

    /// Pair the label column of `table` with each mode column.
    fn mode_tables(&self, table: Option<ElementRef<'_>>) -> ModeTables {
        let Some(table) = table else {
            return ModeTables::default();
        };
        let s = &self.selectors;
        let labels: Vec<String> = table
            .select(&s.row_titles)
            .next()
            .map(|titles| titles.select(&s.table_item).map(text_of).collect())
            .unwrap_or_default();

        let column = |selector: &Selector| -> BTreeMap<String, String> {
            let Some(values) = table.select(selector).next() else {
                return BTreeMap::new();
            };
            labels
                .iter()
                .cloned()
                .zip(values.select(&s.table_item).map(text_of))
                .filter(|(label, _)| !label.is_empty())
                .collect()
        };

        ModeTables {
            ab: column(&s.arcade_column),
            rb: column(&s.realistic_column),
            sb: column(&s.simulator_column),
        }
    }
}
