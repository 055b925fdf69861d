//! ligastavok.ru adapter
//!
//! Required fields: exactly two performer names. Kickoff times come either
//! as `["18:30", "11/05"]` or, for matches starting soon, as
//! `["19 ч 30 мин", "Сегодня"]`.

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

const LISTING_ROOT: &str = "body";
const LISTING_ENTRY: &str = "div .bui-event-row-dfbc70";

const MATCH_CONTENT: &str = "div #content";

const PERFORMER: &str = r#"div[itemprop="performer"]"#;
const TIME_WRAPPER: &str = "div .event-header__time-wrapper-1eccdf";
const TOURNAMENT: &str = "a #event__breadcrumbs-tournament";
const MARKETS: &str = "div .part__markets-86eb26";
const MARKET_TITLE: &str = "span .market__title-0ff163";
const OUTCOMES: &str = "div .market__outcomes-96e4e5";

/// `["18:30", "11/05"]` or `["19 ч 30 мин", "Сегодня"]`
pub static DATE_GRAMMAR: DateGrammar = DateGrammar {
    site: "ligastavok",
    tokens: 2,
    date_at: 1,
    time_at: 0,
    layout: DateLayout::MonthDay,
};

/// Adapter for ligastavok.ru
pub struct LigastavokAdapter {
    ctx: AdapterContext,
}

impl LigastavokAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SiteAdapter for LigastavokAdapter {
    fn site(&self) -> Site {
        Site::Ligastavok
    }

    async fn list_match_urls(&self, listing_url: &str) -> Result<MatchListing, ExtractError> {
        let script = RenderScript::navigate(listing_url)
            .wait_ready(LISTING_ROOT)
            .capture(LISTING_ROOT);
        let html = self.ctx.render(listing_url, &script).await?;

        collect_listing(
            Site::Ligastavok,
            listing_url,
            &html,
            LISTING_ENTRY,
            entry_anchor,
            &self.ctx.base_url,
        )
    }

    async fn extract_match(&self, match_url: &str) -> Result<ExtractedMatch, ExtractError> {
        let script = RenderScript::navigate(match_url)
            .wait_ready(MATCH_CONTENT)
            .capture(MATCH_CONTENT);

        extract_with(&LigastavokLayout, &self.ctx, match_url, &script).await
    }
}

fn entry_anchor(entry: ElementRef<'_>) -> Result<Option<ElementRef<'_>>, InvalidSelector> {
    query::select_first(entry, "a")
}

struct LigastavokLayout;

impl MatchLayout for LigastavokLayout {
    fn site(&self) -> Site {
        Site::Ligastavok
    }

    fn grammar(&self) -> &'static DateGrammar {
        &DATE_GRAMMAR
    }

    fn header(&self, page: ElementRef<'_>) -> Result<MatchHeader, Mismatch> {
        let teams: Vec<String> = query::select_all(page, PERFORMER)?
            .into_iter()
            .map(query::text)
            .collect();
        let (team_a, team_b) = exactly_two_teams(teams)?;

        let date_tokens: Vec<String> = query::select_first(page, TIME_WRAPPER)?
            .and_then(|wrapper| query::children(wrapper).into_iter().next())
            .map(|row| query::children(row).into_iter().map(query::raw_text).collect())
            .unwrap_or_default();

        Ok(MatchHeader {
            team_a,
            team_b,
            date_tokens,
            tournament: query::first_text(page, TOURNAMENT)?,
        })
    }

    fn markets<'a>(&self, page: ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, Mismatch> {
        let containers = query::select_all(page, MARKETS)?;
        if containers.is_empty() {
            return Err(Mismatch::Layout(format!("no market list `{}`", MARKETS)));
        }

        Ok(containers.into_iter().flat_map(query::children).collect())
    }

    fn market(&self, block: ElementRef<'_>) -> Result<Bet, Mismatch> {
        let kind = query::first_text(block, MARKET_TITLE)?;

        let options = query::select_all(block, OUTCOMES)?
            .into_iter()
            .flat_map(query::children)
            .map(|outcome| {
                let parts = query::children(outcome);
                let label = parts.first().map(|part| query::text(*part)).unwrap_or_default();
                let price = parts.last().map(|part| query::text(*part)).unwrap_or_default();
                BetOption::new(label, price)
            })
            .collect();

        Ok(Bet { kind, options })
    }
}
