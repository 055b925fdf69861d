//! leon.ru adapter
//!
//! Required fields: both team names (first and last headline team) must be
//! non-empty. The tournament is the second-to-last breadcrumb and may be
//! missing.

use crate::adapters::query::{self, InvalidSelector};
use crate::adapters::{
    collect_listing, extract_with, AdapterContext, ExtractedMatch, MatchHeader, MatchLayout,
    MatchListing, Mismatch, Site, SiteAdapter,
};
use crate::date::{DateGrammar, DateLayout, MonthTable};
use crate::model::{Bet, BetOption};
use crate::render::RenderScript;
use crate::ExtractError;
use async_trait::async_trait;
use scraper::ElementRef;

const LISTING_REGION: &str = "div .sport-event-region";
const LISTING_ENTRY: &str = r#"div[data-test-el="sportline-event-block"]"#;

const MARKETS_READY: &str = "div .sport-event-details-market-list_pY0E1";
const MATCH_DETAILS: &str = "div .sport-event-details";

const TEAM: &str = "div .headline-info__team";
const DATE: &str = "div .headline-info__date";
const BREADCRUMB: &str = "div .breadcrumb__title";
const MARKETS: &str = "div .sport-event-details__markets_G3m4g";
const MARKET_TITLE: &str = "div .sport-event-details-market-group__title";
const RUNNER: &str = "div .sport-event-details-item__runner-holder";

static RU_MONTHS: MonthTable = MonthTable::new(&[
    ("Янв", 1),
    ("Фев", 2),
    ("Мар", 3),
    ("Апр", 4),
    ("Май", 5),
    ("Мая", 5),
    ("Июн", 6),
    ("Июл", 7),
    ("Авг", 8),
    ("Сен", 9),
    ("Окт", 10),
    ("Ноя", 11),
    ("Дек", 12),
]);

/// `["12 Окт 2024", "18:30"]`
pub static DATE_GRAMMAR: DateGrammar = DateGrammar {
    site: "leon",
    tokens: 2,
    date_at: 0,
    time_at: 1,
    layout: DateLayout::DayMonthName(&RU_MONTHS),
};

/// Adapter for leon.ru
pub struct LeonAdapter {
    ctx: AdapterContext,
}

impl LeonAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SiteAdapter for LeonAdapter {
    fn site(&self) -> Site {
        Site::Leon
    }

    async fn list_match_urls(&self, listing_url: &str) -> Result<MatchListing, ExtractError> {
        let script = RenderScript::navigate(listing_url)
            .wait_ready(LISTING_REGION)
            .capture(LISTING_REGION);
        let html = self.ctx.render(listing_url, &script).await?;

        collect_listing(
            Site::Leon,
            listing_url,
            &html,
            LISTING_ENTRY,
            entry_anchor,
            &self.ctx.base_url,
        )
    }

    async fn extract_match(&self, match_url: &str) -> Result<ExtractedMatch, ExtractError> {
        let script = RenderScript::navigate(match_url)
            .wait_ready(MARKETS_READY)
            .capture(MATCH_DETAILS);

        extract_with(&LeonLayout, &self.ctx, match_url, &script).await
    }
}

/// First link below any child of the entry
fn entry_anchor(entry: ElementRef<'_>) -> Result<Option<ElementRef<'_>>, InvalidSelector> {
    for child in query::children(entry) {
        if let Some(anchor) = query::select_first(child, "a")? {
            return Ok(Some(anchor));
        }
    }
    Ok(None)
}

struct LeonLayout;

impl MatchLayout for LeonLayout {
    fn site(&self) -> Site {
        Site::Leon
    }

    fn grammar(&self) -> &'static DateGrammar {
        &DATE_GRAMMAR
    }

    fn header(&self, page: ElementRef<'_>) -> Result<MatchHeader, Mismatch> {
        let teams = query::select_all(page, TEAM)?;
        let team_a = teams.first().map(|team| query::text(*team)).unwrap_or_default();
        let team_b = teams.last().map(|team| query::text(*team)).unwrap_or_default();

        let date_tokens = match query::select_first(page, DATE)? {
            Some(date) => query::children_named(date, "span")
                .into_iter()
                .map(query::raw_text)
                .collect(),
            None => Vec::new(),
        };

        let crumbs = query::select_all(page, BREADCRUMB)?;
        let tournament = query::nth_from_end(&crumbs, 1)
            .map(|crumb| query::text(*crumb))
            .unwrap_or_default();

        MatchHeader {
            team_a,
            team_b,
            date_tokens,
            tournament,
        }
        .require_teams()
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
        let kind = query::first_text(block, MARKET_TITLE)?;

        let mut options = Vec::new();
        for runner in query::select_all(block, RUNNER)? {
            let spans = match query::children(runner).into_iter().next() {
                Some(button) => query::select_all(button, "span")?,
                None => Vec::new(),
            };
            let label = spans.first().map(|span| query::text(*span)).unwrap_or_default();
            let price = spans.last().map(|span| query::text(*span)).unwrap_or_default();
            options.push(BetOption::new(label, price));
        }

        Ok(Bet { kind, options })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testing;
    use crate::render::fixture::FixtureRenderer;
    use chrono::{TimeZone, Utc};

    const LISTING_URL: &str = "https://leon.ru/bets/esports/1970324836975012-dota2";
    const MATCH_URL: &str = "https://leon.ru/bets/esports/dota2/match-1";

    const LISTING: &str = r#"
        <html><body><div class="page"><div class="sport-event-region">
            <div data-test-el="sportline-event-block"><div class="row"><a href="/bets/esports/dota2/match-1">Spirit - GG</a></div></div>
            <div data-test-el="sportline-event-block"><div class="row"><a href="/bets/esports/dota2/match-2">Tundra - Liquid</a></div></div>
            <div data-test-el="sportline-event-block"><div class="row"><span>Live soon</span></div></div>
            <div data-test-el="sportline-event-block"><div class="row"><a href="https://leon.ru/bets/esports/dota2/match-4">BB - Falcons</a></div></div>
        </div></div></body></html>
    "#;

    const MATCH: &str = r#"
        <html><body><div class="layout"><div class="sport-event-details">
            <div class="breadcrumbs">
                <div class="breadcrumb__title">Киберспорт</div>
                <div class="breadcrumb__title"> The International 2024 </div>
                <div class="breadcrumb__title">Team Spirit - Gaimin Gladiators</div>
            </div>
            <div class="headline">
                <div class="headline-info__team"> Team Spirit </div>
                <div class="headline-info__date"><span>12 Окт 2024</span><span>18:30</span></div>
                <div class="headline-info__team">Gaimin Gladiators
                </div>
            </div>
            <div class="sport-event-details-market-list_pY0E1">
                <div class="sport-event-details__markets_G3m4g">
                    <div class="column">
                        <div class="group">
                            <div class="sport-event-details-market-group__title">Победитель</div>
                            <div class="sport-event-details-item__runner-holder"><button><span> Team Spirit </span><span>1.85</span></button></div>
                            <div class="sport-event-details-item__runner-holder"><button><span>Ничья</span><span> 12.0 </span></button></div>
                            <div class="sport-event-details-item__runner-holder"><button><span>Gaimin Gladiators</span><span>1.95</span></button></div>
                        </div>
                        <div class="group">
                            <div class="sport-event-details-market-group__title">Первая кровь</div>
                        </div>
                    </div>
                </div>
            </div>
        </div></div></body></html>
    "#;

    #[tokio::test]
    async fn test_list_match_urls() {
        let renderer = FixtureRenderer::new().page(LISTING_URL, LISTING);
        let (ctx, _) = testing::context(Site::Leon, renderer);

        let listing = LeonAdapter::new(ctx).list_match_urls(LISTING_URL).await.unwrap();

        assert_eq!(
            listing.urls,
            vec![
                "https://leon.ru/bets/esports/dota2/match-1",
                "https://leon.ru/bets/esports/dota2/match-2",
                "https://leon.ru/bets/esports/dota2/match-4",
            ]
        );
        assert_eq!(listing.mismatches.len(), 1);
        assert_eq!(listing.mismatches[0].entry, 2);
    }

    #[tokio::test]
    async fn test_listing_without_region_times_out() {
        let renderer = FixtureRenderer::new().page(LISTING_URL, "<html><body></body></html>");
        let (ctx, _) = testing::context(Site::Leon, renderer);

        let result = LeonAdapter::new(ctx).list_match_urls(LISTING_URL).await;
        assert!(matches!(result, Err(ExtractError::RenderTimeout { .. })));
    }

    #[tokio::test]
    async fn test_extract_match() {
        let renderer = FixtureRenderer::new().page(MATCH_URL, MATCH);
        let log = renderer.log.clone();
        let (ctx, storage) = testing::context(Site::Leon, renderer);

        let extracted = LeonAdapter::new(ctx).extract_match(MATCH_URL).await.unwrap();

        assert_eq!(extracted.game.team_a, "Team Spirit");
        assert_eq!(extracted.game.team_b, "Gaimin Gladiators");
        assert_eq!(extracted.game.tournament, "The International 2024");
        assert_eq!(
            extracted.game.start_time,
            Utc.with_ymd_and_hms(2024, 10, 12, 18, 30, 0).unwrap()
        );
        assert_eq!(extracted.game.url, MATCH_URL);

        assert_eq!(extracted.bets.len(), 2);
        assert_eq!(extracted.bets[0].kind, "Победитель");
        assert_eq!(
            extracted.bets[0].options,
            vec![
                BetOption::new("Team Spirit", "1.85"),
                BetOption::new("Ничья", "12.0"),
                BetOption::new("Gaimin Gladiators", "1.95"),
            ]
        );
        assert_eq!(extracted.bets[1].kind, "Первая кровь");
        assert!(extracted.bets[1].options.is_empty());

        let stored = storage.get_match(extracted.match_id).unwrap().unwrap();
        assert_eq!(stored, extracted.game);
        assert_eq!(storage.get_bets(extracted.match_id).unwrap(), extracted.bets);

        assert_eq!(
            log.lock().unwrap().clone(),
            vec![
                format!("navigate {}", MATCH_URL),
                format!("wait {}", MARKETS_READY),
                format!("capture {}", MATCH_DETAILS),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_market_list_stores_match_without_bets() {
        let page = MATCH.replace("sport-event-details__markets_G3m4g", "sport-event-details__markets_X9z8y");
        let renderer = FixtureRenderer::new().page(MATCH_URL, &page);
        let (ctx, storage) = testing::context(Site::Leon, renderer);

        let extracted = LeonAdapter::new(ctx).extract_match(MATCH_URL).await.unwrap();

        assert_eq!(extracted.game.team_a, "Team Spirit");
        assert!(extracted.bets.is_empty());
        assert_eq!(storage.count_matches().unwrap(), 1);
        assert_eq!(storage.count_bets().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_team_is_schema_mismatch() {
        let page = MATCH.replace(" Team Spirit </div>", "   </div>");
        let renderer = FixtureRenderer::new().page(MATCH_URL, &page);
        let (ctx, storage) = testing::context(Site::Leon, renderer);

        let result = LeonAdapter::new(ctx).extract_match(MATCH_URL).await;

        assert!(matches!(result, Err(ExtractError::SchemaMismatch { .. })));
        assert_eq!(storage.count_matches().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bad_kickoff_hour_fails_match() {
        let page = MATCH.replace("<span>18:30</span>", "<span>1X:30</span>");
        let renderer = FixtureRenderer::new().page(MATCH_URL, &page);
        let (ctx, storage) = testing::context(Site::Leon, renderer);

        let result = LeonAdapter::new(ctx).extract_match(MATCH_URL).await;

        assert!(matches!(result, Err(ExtractError::DateParse { .. })));
        assert_eq!(storage.count_matches().unwrap(), 0);
    }
}
