//! Leaderboard listing page parser
//!
//! Each ranked entrant is one `.ranking_set` element whose `data-href`
//! points at the character profile:
//!
//! ```html
//! <div class="ranking_set" data-href="/lodestone/character/12345/">
//!     <h3>Test Player</h3>
//!     <div class="order">1</div>
//!     <div class="prev_order">2</div>
//!     <div class="world">Cerberus [Chaos]</div>
//!     <div class="points">1000 +50</div>
//!     <div class="face-wrapper"><img src="https://img2.finalfantasyxiv.com/f/ab_c0.jpg"/></div>
//!     <div class="tier"><img data-tooltip="Crystal"/></div>
//!     <div class="wins">100 +5</div>
//! </div>
//! ```
//!
//! Name, id, rank, world, group and portrait are required; a row missing one
//! of them is rejected. Previous rank, points, wins and tier fall back to
//! `0`, `0 0` and `"None"`.

use crate::extract::{selector, ExtractError, ListingPage, RejectedRow};
use crate::model::{Category, Entrant, NO_TIER};
use scraper::{ElementRef, Html, Selector};

const PROFILE_HREF_PREFIX: &str = "/lodestone/character/";
const PORTRAIT_HOST_PREFIX: &str = "https://img2.finalfantasyxiv.com/f/";

pub(crate) struct ListingSelectors {
    row: Selector,
    name: Selector,
    order: Selector,
    prev_order: Selector,
    world: Selector,
    points: Selector,
    portrait: Selector,
    tier: Selector,
    wins: Selector,
}

impl ListingSelectors {
    pub(crate) fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            row: selector(".ranking_set")?,
            name: selector("h3")?,
            order: selector(".order")?,
            prev_order: selector(".prev_order")?,
            world: selector(".world")?,
            points: selector(".points")?,
            portrait: selector(".face-wrapper img")?,
            tier: selector(".tier img")?,
            wins: selector(".wins")?,
        })
    }
}

/// Parses every leaderboard row on a listing page
pub(crate) fn parse_listing(html: &str, selectors: &ListingSelectors) -> ListingPage {
    let document = Html::parse_document(html);
    let mut page = ListingPage::default();

    for (index, row) in document.select(&selectors.row).enumerate() {
        match parse_row(row, selectors) {
            Ok(entrant) => page.entrants.push(entrant),
            Err(error) => page.rejected.push(RejectedRow { index, error }),
        }
    }

    page
}

fn parse_row(row: ElementRef<'_>, sel: &ListingSelectors) -> Result<Entrant, ExtractError> {
    let name = required_text(row, &sel.name, "name")?;

    let href = row
        .value()
        .attr("data-href")
        .ok_or(ExtractError::MissingField { field: "id" })?;
    let id = parse_profile_id(href)?;

    let rank_text = required_text(row, &sel.order, "current_rank")?;
    let current_rank = rank_text
        .parse::<u32>()
        .ok()
        .filter(|rank| *rank > 0)
        .ok_or(ExtractError::InvalidField {
            field: "current_rank",
            value: rank_text.clone(),
        })?;

    // "-" when the entrant was not ranked last season
    let previous_rank = element_text(row, &sel.prev_order)
        .and_then(|text| text.parse::<u32>().ok())
        .unwrap_or(0);

    let world_text = required_text(row, &sel.world, "world")?;
    let (world, group) = parse_world(&world_text)?;

    let (points, points_delta) = element_text(row, &sel.points)
        .and_then(|text| parse_points_or_wins(&text))
        .unwrap_or((0, 0));

    let portrait = row
        .select(&sel.portrait)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| src.strip_prefix(PORTRAIT_HOST_PREFIX).unwrap_or(src).to_string())
        .filter(|src| !src.is_empty())
        .ok_or(ExtractError::MissingField { field: "portrait" })?;

    let tier = row
        .select(&sel.tier)
        .next()
        .and_then(|img| img.value().attr("data-tooltip"))
        .map(str::trim)
        .filter(|tooltip| !tooltip.is_empty())
        .unwrap_or(NO_TIER)
        .to_string();

    let (wins, wins_delta) = element_text(row, &sel.wins)
        .and_then(|text| parse_points_or_wins(&text))
        .unwrap_or((0, 0));

    Ok(Entrant {
        name,
        id,
        current_rank,
        previous_rank,
        world,
        group,
        points,
        points_delta,
        portrait,
        tier,
        wins,
        wins_delta,
        category: Category::Unknown,
    })
}

/// Parses `"<value>"` or `"<value> <signed delta>"`
///
/// Returns None for empty or malformed text.
///
/// # Example
///
/// ```
/// use cc_harvest::extract::parse_points_or_wins;
///
/// assert_eq!(parse_points_or_wins("1000 +50"), Some((1000, 50)));
/// assert_eq!(parse_points_or_wins("950 -10"), Some((950, -10)));
/// assert_eq!(parse_points_or_wins("1000"), Some((1000, 0)));
/// assert_eq!(parse_points_or_wins(""), None);
/// ```
pub fn parse_points_or_wins(text: &str) -> Option<(i64, i64)> {
    let mut parts = text.split_whitespace();
    let value = parts.next()?.parse::<i64>().ok()?;
    let delta = match parts.next() {
        Some(delta) => delta.parse::<i64>().ok()?,
        None => 0,
    };

    if parts.next().is_some() {
        return None;
    }

    Some((value, delta))
}

/// Extracts the character id from `/lodestone/character/<id>/`
fn parse_profile_id(href: &str) -> Result<u64, ExtractError> {
    href.trim()
        .strip_prefix(PROFILE_HREF_PREFIX)
        .map(|rest| rest.trim_matches('/'))
        .and_then(|id| id.parse::<u64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ExtractError::InvalidField {
            field: "id",
            value: href.to_string(),
        })
}

/// Splits `"World [Group]"`
fn parse_world(text: &str) -> Result<(String, String), ExtractError> {
    let invalid = || ExtractError::InvalidField {
        field: "world",
        value: text.to_string(),
    };

    let (world, group) = text.split_once(char::is_whitespace).ok_or_else(invalid)?;
    let world = world.trim();
    let group = group.trim().trim_start_matches('[').trim_end_matches(']').trim();

    if world.is_empty() || group.is_empty() {
        return Err(invalid());
    }

    Ok((world.to_string(), group.to_string()))
}

/// Trimmed text of the first match, if any
fn element_text(row: ElementRef<'_>, sel: &Selector) -> Option<String> {
    row.select(sel)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

fn required_text(
    row: ElementRef<'_>,
    sel: &Selector,
    field: &'static str,
) -> Result<String, ExtractError> {
    element_text(row, sel)
        .filter(|text| !text.is_empty())
        .ok_or(ExtractError::MissingField { field })
}
