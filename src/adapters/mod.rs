//! Bookmaker site adapters
//!
//! Every bookmaker is read through a [`SiteAdapter`]: one call lists the match
//! pages linked from a listing page, another extracts and stores a single
//! match with all of its betting markets.
//!
//! Variants share no state. The pieces they have in common (rendering through
//! the context, collecting listing links, and the render → extract → persist
//! flow of a match page) are free functions in this module, parameterized by a
//! site's [`MatchLayout`].

pub mod dota2lounge;
pub mod ggbet;
pub mod leon;
pub mod ligastavok;
pub mod query;

use crate::date::{self, DateGrammar};
use crate::model::{Bet, Match};
use crate::render::{run_script, RenderScript, Renderer};
use crate::state::{ExtractionProgress, ExtractionState};
use crate::storage::{Repository, StorageError};
use crate::ExtractError;
use async_trait::async_trait;
use query::InvalidSelector;
use scraper::{ElementRef, Html};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Supported bookmakers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Leon,
    Ligastavok,
    Ggbet,
    #[value(name = "dota2lounge")]
    Dota2lounge,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leon => "leon",
            Self::Ligastavok => "ligastavok",
            Self::Ggbet => "ggbet",
            Self::Dota2lounge => "dota2lounge",
        }
    }

    /// Origin relative match links are resolved against
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Leon => "https://leon.ru/",
            Self::Ligastavok => "https://www.ligastavok.ru/",
            Self::Ggbet => "https://the-ggbet.com/",
            Self::Dota2lounge => "https://dota2lounge.com/",
        }
    }

    /// Known esports listing for the site, if there is a stable one
    pub fn default_listing_url(&self) -> Option<&'static str> {
        match self {
            Self::Leon => Some("https://leon.ru/bets/esports/1970324836975012-dota2"),
            _ => None,
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything an adapter needs from its surroundings
///
/// Cloning is cheap; the renderer and repository handles are shared.
#[derive(Clone)]
pub struct AdapterContext {
    pub renderer: Arc<dyn Renderer>,
    pub repository: Arc<dyn Repository>,

    /// Origin relative links found on listing pages are joined onto
    pub base_url: Url,

    /// Upper bound for every single render action
    pub render_timeout: Duration,
}

impl AdapterContext {
    /// Plays a render script for `page_url` and returns the captured HTML
    pub async fn render(&self, page_url: &str, script: &RenderScript) -> Result<String, ExtractError> {
        run_script(self.renderer.as_ref(), script, self.render_timeout)
            .await
            .map_err(|err| ExtractError::rendering(page_url, err))
    }
}

/// A listing entry that did not yield a match link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMismatch {
    /// Zero-based position of the entry on the listing page
    pub entry: usize,
    pub detail: String,
}

/// Match links found on a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchListing {
    /// Absolute match page URLs, in document order
    pub urls: Vec<String>,

    /// Entries skipped because their structure was not recognized
    pub mismatches: Vec<LayoutMismatch>,
}

/// A match and the bets stored for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMatch {
    /// ID generated by the repository
    pub match_id: i64,
    pub game: Match,
    pub bets: Vec<Bet>,
}

/// One bookmaker's scraping logic
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn site(&self) -> Site;

    /// Renders a listing page and returns the match pages it links to
    ///
    /// # Returns
    ///
    /// * `Ok(MatchListing)` - Absolute match URLs plus any entries that had no usable link
    /// * `Err(ExtractError)` - The listing could not be rendered
    async fn list_match_urls(&self, listing_url: &str) -> Result<MatchListing, ExtractError>;

    /// Renders a match page, then stores the match followed by each of its bets
    async fn extract_match(&self, match_url: &str) -> Result<ExtractedMatch, ExtractError>;
}

/// Builds the adapter for a site
pub fn build_adapter(site: Site, ctx: AdapterContext) -> Arc<dyn SiteAdapter> {
    match site {
        Site::Leon => Arc::new(leon::LeonAdapter::new(ctx)),
        Site::Ligastavok => Arc::new(ligastavok::LigastavokAdapter::new(ctx)),
        Site::Ggbet => Arc::new(ggbet::GgbetAdapter::new(ctx)),
        Site::Dota2lounge => Arc::new(dota2lounge::Dota2loungeAdapter::new(ctx)),
    }
}

// ===== Shared Extraction Flow =====

/// A structural problem found while reading a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mismatch {
    /// Expected element absent; the page layout likely changed
    Layout(String),

    /// Elements present but the record is unusable (e.g. missing team)
    Schema(String),
}

impl Mismatch {
    fn at(self, url: &str) -> ExtractError {
        match self {
            Self::Layout(detail) => ExtractError::LayoutMismatch {
                url: url.to_string(),
                detail,
            },
            Self::Schema(detail) => ExtractError::SchemaMismatch {
                url: url.to_string(),
                detail,
            },
        }
    }
}

impl From<InvalidSelector> for Mismatch {
    fn from(err: InvalidSelector) -> Self {
        Self::Layout(err.to_string())
    }
}

/// Fields read from a match page header, before date normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MatchHeader {
    pub team_a: String,
    pub team_b: String,
    pub date_tokens: Vec<String>,
    pub tournament: String,
}

impl MatchHeader {
    /// Requires both team names to be present after trimming
    pub fn require_teams(self) -> Result<Self, Mismatch> {
        if self.team_a.is_empty() || self.team_b.is_empty() {
            return Err(Mismatch::Schema(format!(
                "team names missing (got `{}` and `{}`)",
                self.team_a, self.team_b
            )));
        }
        Ok(self)
    }
}

/// Builds a header team pair from a list that must hold exactly two names
pub(crate) fn exactly_two_teams(teams: Vec<String>) -> Result<(String, String), Mismatch> {
    match <[String; 2]>::try_from(teams) {
        Ok([team_a, team_b]) => Ok((team_a, team_b)),
        Err(teams) => Err(Mismatch::Schema(format!(
            "expected 2 team names, found {}",
            teams.len()
        ))),
    }
}

/// How one site lays out its match pages
pub(crate) trait MatchLayout: Send + Sync {
    fn site(&self) -> Site;

    /// Grammar the site's kickoff tokens follow
    fn grammar(&self) -> &'static DateGrammar;

    /// Reads teams, kickoff tokens and tournament
    fn header(&self, page: ElementRef<'_>) -> Result<MatchHeader, Mismatch>;

    /// Returns one element per market block, in page order
    ///
    /// A missing market container is a mismatch; the caller still stores the
    /// match, without bets.
    fn markets<'a>(&self, page: ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, Mismatch>;

    /// Reads one market block
    fn market(&self, block: ElementRef<'_>) -> Result<Bet, Mismatch>;
}

/// Collects match links from a rendered listing
///
/// Every element matching `entry_query` is one match entry; `anchor` picks the
/// link element inside it. Entries without a usable link are recorded as
/// mismatches and skipped.
pub(crate) fn collect_listing(
    site: Site,
    listing_url: &str,
    html: &str,
    entry_query: &str,
    anchor: fn(ElementRef<'_>) -> Result<Option<ElementRef<'_>>, InvalidSelector>,
    base_url: &Url,
) -> Result<MatchListing, ExtractError> {
    let document = Html::parse_document(html);
    let entries = query::select_all(document.root_element(), entry_query)
        .map_err(|err| Mismatch::from(err).at(listing_url))?;

    let mut listing = MatchListing::default();
    for (entry, element) in entries.into_iter().enumerate() {
        let href = anchor(element)
            .map_err(|err| Mismatch::from(err).at(listing_url))?
            .and_then(|a| a.value().attr("href"));

        let resolved = match href {
            Some(href) => query::resolve_href(href, base_url)
                .ok_or_else(|| format!("unusable match link `{}`", href)),
            None => Err("match entry has no link".to_string()),
        };

        match resolved {
            Ok(url) => listing.urls.push(url),
            Err(detail) => {
                tracing::warn!(site = %site, url = listing_url, entry, detail = %detail, "Listing entry skipped");
                listing.mismatches.push(LayoutMismatch { entry, detail });
            }
        }
    }

    tracing::debug!(
        site = %site,
        url = listing_url,
        matches = listing.urls.len(),
        skipped = listing.mismatches.len(),
        "Listing parsed"
    );
    Ok(listing)
}

/// Renders a match page and stores what it shows
///
/// Walks the invocation through its extraction states; the match row is
/// written before any bet, and each bet is written as soon as it is read.
/// Header problems fail the match. A missing market list or an unreadable
/// market only drops those bets.
pub(crate) async fn extract_with<L: MatchLayout>(
    layout: &L,
    ctx: &AdapterContext,
    match_url: &str,
    script: &RenderScript,
) -> Result<ExtractedMatch, ExtractError> {
    let mut progress = ExtractionProgress::new(layout.site().as_str(), match_url);
    progress.advance(ExtractionState::Rendering);

    let result = match ctx.render(match_url, script).await {
        Ok(html) => store_page(layout, ctx.repository.as_ref(), match_url, &html, &mut progress),
        Err(err) => Err(err),
    };

    progress.advance(if result.is_ok() {
        ExtractionState::Done
    } else {
        ExtractionState::Failed
    });
    result
}

fn store_page<L: MatchLayout>(
    layout: &L,
    repository: &dyn Repository,
    match_url: &str,
    html: &str,
    progress: &mut ExtractionProgress<'_>,
) -> Result<ExtractedMatch, ExtractError> {
    progress.advance(ExtractionState::Extracting);

    let document = Html::parse_document(html);
    let page = document.root_element();

    let header = layout.header(page).map_err(|m| m.at(match_url))?;
    let start_time =
        date::normalize(&header.date_tokens, layout.grammar()).map_err(|source| ExtractError::DateParse {
            url: match_url.to_string(),
            source,
        })?;
    let blocks = layout.markets(page).unwrap_or_else(|mismatch| {
        tracing::warn!(
            site = %layout.site(),
            url = match_url,
            mismatch = ?mismatch,
            "Market list not found, storing match without bets"
        );
        Vec::new()
    });

    let game = Match {
        team_a: header.team_a,
        team_b: header.team_b,
        start_time,
        tournament: header.tournament,
        url: match_url.to_string(),
    };

    progress.advance(ExtractionState::Persisting);
    let persistence = |source: StorageError| ExtractError::Persistence {
        url: match_url.to_string(),
        source,
    };

    let match_id = repository.insert_match(&game).map_err(persistence)?;

    let mut bets = Vec::with_capacity(blocks.len());
    for (index, block) in blocks.into_iter().enumerate() {
        let bet = match layout.market(block) {
            Ok(bet) => bet,
            Err(mismatch) => {
                tracing::warn!(
                    site = %layout.site(),
                    url = match_url,
                    market = index,
                    mismatch = ?mismatch,
                    "Market skipped"
                );
                continue;
            }
        };

        repository.insert_bet(match_id, &bet).map_err(persistence)?;
        bets.push(bet);
    }

    tracing::debug!(
        site = %layout.site(),
        url = match_url,
        match_id,
        bets = bets.len(),
        "Match stored"
    );
    Ok(ExtractedMatch {
        match_id,
        game,
        bets,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    fn entry_anchor(entry: ElementRef<'_>) -> Result<Option<ElementRef<'_>>, InvalidSelector> {
        query::select_first(entry, "a")
    }

    #[test]
    fn test_site_names() {
        assert_eq!(Site::Leon.to_string(), "leon");
        assert_eq!(Site::Dota2lounge.as_str(), "dota2lounge");
        assert!(Site::Leon.default_listing_url().is_some());
        assert!(Site::Ggbet.default_listing_url().is_none());
    }

    #[test]
    fn test_site_value_enum() {
        use clap::ValueEnum;

        assert_eq!(Site::from_str("dota2lounge", false), Ok(Site::Dota2lounge));
        assert_eq!(Site::from_str("ligastavok", false), Ok(Site::Ligastavok));
    }

    #[test]
    fn test_collect_listing_skips_entries_without_links() {
        let html = r#"
            <ul>
                <li class="m"><a href="/m/1">One</a></li>
                <li class="m"><span>No link</span></li>
                <li class="m"><a href="mailto:x@y.z">Mail</a></li>
                <li class="m"><a href="https://other.test/m/4">Four</a></li>
            </ul>
        "#;
        let base = Url::parse("https://leon.ru/").unwrap();

        let listing =
            collect_listing(Site::Leon, "https://leon.ru/list", html, "li.m", entry_anchor, &base).unwrap();

        assert_eq!(listing.urls, vec!["https://leon.ru/m/1", "https://other.test/m/4"]);
        assert_eq!(listing.mismatches.len(), 2);
        assert_eq!(listing.mismatches[0].entry, 1);
        assert_eq!(listing.mismatches[1].entry, 2);
    }

    #[test]
    fn test_collect_listing_empty() {
        let base = Url::parse("https://leon.ru/").unwrap();
        let listing =
            collect_listing(Site::Leon, "https://leon.ru/list", "<div></div>", "li.m", entry_anchor, &base)
                .unwrap();
        assert_eq!(listing, MatchListing::default());
    }

    #[test]
    fn test_require_teams() {
        let header = MatchHeader {
            team_a: "Team Spirit".to_string(),
            team_b: String::new(),
            ..MatchHeader::default()
        };
        assert!(matches!(header.require_teams(), Err(Mismatch::Schema(_))));
    }

    #[test]
    fn test_exactly_two_teams() {
        let teams = vec!["A".to_string(), "B".to_string()];
        assert_eq!(exactly_two_teams(teams), Ok(("A".to_string(), "B".to_string())));

        assert!(exactly_two_teams(vec!["A".to_string()]).is_err());
        assert!(exactly_two_teams(vec!["A".into(), "B".into(), "C".into()]).is_err());
    }

    #[test]
    fn test_mismatch_maps_to_extract_error() {
        let err = Mismatch::Layout("gone".to_string()).at("https://leon.ru/m/1");
        assert!(matches!(err, ExtractError::LayoutMismatch { .. }));
        assert_eq!(err.stage(), ExtractionState::Extracting);

        let err = Mismatch::Schema("no teams".to_string()).at("https://leon.ru/m/1");
        assert!(matches!(err, ExtractError::SchemaMismatch { .. }));
    }
}
