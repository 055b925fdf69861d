//! the-ggbet.com adapter
//!
//! Match pages only show the full market list after the "All" tab is
//! selected, so the match script clicks it and gives the page a second to
//! settle before capturing. Required fields: exactly two competitor titles.

use crate::adapters::query::{self, InvalidSelector};
use crate::adapters::{
    collect_listing, exactly_two_teams, extract_with, AdapterContext, ExtractedMatch, MatchHeader,
    MatchLayout, MatchListing, Mismatch, Site, SiteAdapter,
};
use crate::date::{DateGrammar, DateLayout};
use crate::model::{Bet, BetOption};
use crate::render::RenderScript;
use crate::ExtractError;
use async_trait::async_trait;
use scraper::ElementRef;
use std::time::Duration;

const EVENT_LIST: &str = r#"div[data-test="sport-event-list"]"#;
const LISTING_ENTRY: &str = r#"div[data-test="sport-event-in-view-subscription"]"#;

const ALL_MARKETS_TAB: &str = r#"div[data-tab="All"]"#;
const TAB_SETTLE: Duration = Duration::from_secs(1);
const MATCH_ROOT: &str = "body";

const COMPETITOR: &str = r#"span[data-test="competitor-title"]"#;
const COMPETITORS: &str = r#"div[data-test="competitors"]"#;
const TOURNAMENT: &str = r#"span[data-test="match-helper-top-bar__tournament-name"]"#;
const MARKETS: &str = r#"div[data-test="markets"]"#;
const MARKET_NAME: &str = r#"div[data-test="market-name"]"#;
const MARKET_GROUP: &str = r#"div[data-test="market-group"]"#;
const ODD_TITLE: &str = r#"div[data-test="odd-button__title"]"#;
const ODD_RESULT: &str = r#"div[data-test="odd-button__result"]"#;

/// `["18:30", "Today"]` or `["18:30", "05 11 2024"]`
pub static DATE_GRAMMAR: DateGrammar = DateGrammar {
    site: "ggbet",
    tokens: 2,
    date_at: 1,
    time_at: 0,
    layout: DateLayout::RelativeOrDayMonthYear,
};

/// Adapter for the-ggbet.com
pub struct GgbetAdapter {
    ctx: AdapterContext,
}

impl GgbetAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SiteAdapter for GgbetAdapter {
    fn site(&self) -> Site {
        Site::Ggbet
    }

    async fn list_match_urls(&self, listing_url: &str) -> Result<MatchListing, ExtractError> {
        let script = RenderScript::navigate(listing_url)
            .wait_ready(EVENT_LIST)
            .capture(EVENT_LIST);
        let html = self.ctx.render(listing_url, &script).await?;

        collect_listing(
            Site::Ggbet,
            listing_url,
            &html,
            LISTING_ENTRY,
            entry_anchor,
            &self.ctx.base_url,
        )
    }

    async fn extract_match(&self, match_url: &str) -> Result<ExtractedMatch, ExtractError> {
        let script = RenderScript::navigate(match_url)
            .wait_ready(ALL_MARKETS_TAB)
            .click(ALL_MARKETS_TAB)
            .sleep(TAB_SETTLE)
            .wait_ready(MATCH_ROOT)
            .capture(MATCH_ROOT);

        extract_with(&GgbetLayout, &self.ctx, match_url, &script).await
    }
}

/// The entry's own link child; links nested deeper belong to other widgets
fn entry_anchor(entry: ElementRef<'_>) -> Result<Option<ElementRef<'_>>, InvalidSelector> {
    Ok(query::children_named(entry, "a").into_iter().next())
}

struct GgbetLayout;

impl MatchLayout for GgbetLayout {
    fn site(&self) -> Site {
        Site::Ggbet
    }

    fn grammar(&self) -> &'static DateGrammar {
        &DATE_GRAMMAR
    }

    fn header(&self, page: ElementRef<'_>) -> Result<MatchHeader, Mismatch> {
        let teams: Vec<String> = query::select_all(page, COMPETITOR)?
            .into_iter()
            .map(query::text)
            .collect();
        let (team_a, team_b) = exactly_two_teams(teams)?;

        let date_tokens: Vec<String> = query::select_first(page, COMPETITORS)?
            .and_then(|competitors| query::children(competitors).into_iter().next())
            .map(|clock| query::children(clock).into_iter().map(query::raw_text).collect())
            .unwrap_or_default();

        Ok(MatchHeader {
            team_a,
            team_b,
            date_tokens,
            tournament: query::first_text(page, TOURNAMENT)?,
        })
    }

    fn markets<'a>(&self, page: ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, Mismatch> {
        let container = query::select_first(page, MARKETS)?
            .ok_or_else(|| Mismatch::Layout(format!("no market list `{}`", MARKETS)))?;

        Ok(query::children(container)
            .into_iter()
            .next()
            .map(query::children)
            .unwrap_or_default())
    }

    fn market(&self, block: ElementRef<'_>) -> Result<Bet, Mismatch> {
        let kind = query::first_text(block, MARKET_NAME)?;

        let mut options = Vec::new();
        for group in query::select_all(block, MARKET_GROUP)? {
            for odd in query::children(group) {
                options.push(BetOption::new(
                    query::first_text(odd, ODD_TITLE)?,
                    query::first_text(odd, ODD_RESULT)?,
                ));
            }
        }

        Ok(Bet { kind, options })
    }
}
