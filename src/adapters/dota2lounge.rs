//! dota2lounge.com adapter
//!
//! Team order on the page is mirrored: the right-hand team is stored as
//! `team_a`. Both titles must be non-empty. The kickoff is one token such as
//! `5.11.2024, 18:00 UTC`.

use crate::adapters::query::{self, InvalidSelector};
use crate::adapters::{
    collect_listing, extract_with, AdapterContext, ExtractedMatch, MatchHeader, MatchLayout,
    MatchListing, Mismatch, Site, SiteAdapter,
};
use crate::date::{DateGrammar, DateLayout};
use crate::model::{Bet, BetOption};
use crate::render::RenderScript;
use crate::ExtractError;
use async_trait::async_trait;
use scraper::ElementRef;

const MATCH_PAGE: &str = "div .match_page";
const LISTING_ENTRY: &str = ".lounge-bets-items__item";

const HEADER: &str = ".lounge-match.lounge-match_on-page";
const TEAM_A_SIDE: &str = ".lounge-match__team_right";
const TEAM_B_SIDE: &str = ".lounge-match__team_left";
const TEAM_TITLE: &str = ".lounge-team__title";
const DATE: &str = ".lounge-match-date__date";
const TOURNAMENT: &str = ".lounge-match__tournament";

const EVENTS: &str = ".lounge-events";
const EVENT: &str = ".lounge-event";
const EVENT_TITLE: &str = ".lounge-event__title";
const EVENT_BUTTON: &str = ".lounge-event__button";
const BUTTON_TEXT: &str = ".lounge-event-button__text";
const BUTTON_COEFF: &str = ".lounge-event-button__coeff";

/// `["5.11.2024, 18:00 UTC"]`
pub static DATE_GRAMMAR: DateGrammar = DateGrammar {
    site: "dota2lounge",
    tokens: 1,
    date_at: 0,
    time_at: 0,
    layout: DateLayout::DottedWithTime,
};

/// Adapter for dota2lounge.com
pub struct Dota2loungeAdapter {
    ctx: AdapterContext,
}

impl Dota2loungeAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SiteAdapter for Dota2loungeAdapter {
    fn site(&self) -> Site {
        Site::Dota2lounge
    }

    async fn list_match_urls(&self, listing_url: &str) -> Result<MatchListing, ExtractError> {
        let script = RenderScript::navigate(listing_url)
            .wait_ready(MATCH_PAGE)
            .capture(MATCH_PAGE);
        let html = self.ctx.render(listing_url, &script).await?;

        collect_listing(
            Site::Dota2lounge,
            listing_url,
            &html,
            LISTING_ENTRY,
            entry_anchor,
            &self.ctx.base_url,
        )
    }

    async fn extract_match(&self, match_url: &str) -> Result<ExtractedMatch, ExtractError> {
        let script = RenderScript::navigate(match_url)
            .wait_ready(MATCH_PAGE)
            .capture(MATCH_PAGE);

        extract_with(&Dota2loungeLayout, &self.ctx, match_url, &script).await
    }
}

fn entry_anchor(entry: ElementRef<'_>) -> Result<Option<ElementRef<'_>>, InvalidSelector> {
    query::select_first(entry, "a")
}

/// First team title found in any block on one side of the header
fn side_title(header: ElementRef<'_>, side: &str) -> Result<String, InvalidSelector> {
    query::first_text(header, &format!("{} {}", side, TEAM_TITLE))
}

struct Dota2loungeLayout;

impl MatchLayout for Dota2loungeLayout {
    fn site(&self) -> Site {
        Site::Dota2lounge
    }

    fn grammar(&self) -> &'static DateGrammar {
        &DATE_GRAMMAR
    }

    fn header(&self, page: ElementRef<'_>) -> Result<MatchHeader, Mismatch> {
        let header = query::select_first(page, HEADER)?
            .ok_or_else(|| Mismatch::Layout(format!("no match header `{}`", HEADER)))?;

        let date_tokens = query::select_first(header, DATE)?
            .map(|date| vec![query::text(date)])
            .unwrap_or_default();

        MatchHeader {
            team_a: side_title(header, TEAM_A_SIDE)?,
            team_b: side_title(header, TEAM_B_SIDE)?,
            date_tokens,
            tournament: query::first_text(header, TOURNAMENT)?,
        }
        .require_teams()
    }

    fn markets<'a>(&self, page: ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, Mismatch> {
        let containers = query::select_all(page, EVENTS)?;
        if containers.is_empty() {
            return Err(Mismatch::Layout(format!("no event list `{}`", EVENTS)));
        }

        let mut events = Vec::new();
        for container in containers {
            events.extend(query::select_all(container, EVENT)?);
        }
        Ok(events)
    }

    fn market(&self, block: ElementRef<'_>) -> Result<Bet, Mismatch> {
        let kind = query::first_text(block, EVENT_TITLE)?;

        let mut options = Vec::new();
        for button in query::select_all(block, EVENT_BUTTON)? {
            options.push(BetOption::new(
                query::first_text(button, BUTTON_TEXT)?,
                query::first_text(button, BUTTON_COEFF)?,
            ));
        }

        Ok(Bet { kind, options })
    }
}
