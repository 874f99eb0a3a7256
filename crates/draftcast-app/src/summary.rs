// Summary assembly: one pass over the league data producing every caption
// the dashboard needs.
//
// Run order:
// 1. Fetch standings and match results (and squads, if any chart uses them)
// 2. Normalize standings, derive the current gameweek
// 3. Build every prompt up front
// 4. Issue all generation calls concurrently and join them
// 5. Place results by checklist position into the bundle

use futures_util::future::try_join_all;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use draftcast_core::config::{ChartConfig, ChartSource, LeagueConfig};
use draftcast_core::league::{current_gameweek, normalize, Gameweek, LeagueError, SquadRecord};
use draftcast_llm::client::{GenerationError, TextGenerator};
use draftcast_llm::prompt::{self, PromptIntent};

use crate::source::{LeagueSource, SourceError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    League(#[from] LeagueError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

// ---------------------------------------------------------------------------
// Output record
// ---------------------------------------------------------------------------

/// Captions for one chart. `title` is null when the chart has no title
/// caption configured.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChartCaption {
    pub title: Option<String>,
    pub subtitle: String,
}

/// Chart captions keyed by chart key, serialized as a JSON object whose key
/// order follows the configured checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSummaries(Vec<(String, ChartCaption)>);

impl ChartSummaries {
    pub fn get(&self, key: &str) -> Option<&ChartCaption> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ChartSummaries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, caption) in &self.0 {
            map.serialize_entry(key, caption)?;
        }
        map.end()
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBundle {
    pub hero: String,
    pub title: String,
    pub gameweek: Gameweek,
    pub chart_summaries: ChartSummaries,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Prompts for one chart, built before any generation call is issued.
struct ChartPrompts<'a> {
    key: &'a str,
    title: Option<String>,
    subtitle: String,
}

/// Fetch league data, generate every caption, and assemble the bundle.
///
/// Each caption is requested exactly once. Calls run concurrently; the first
/// failure aborts the run and nothing partial is returned.
pub async fn assemble<S, G>(
    source: &S,
    generator: &G,
    league: &LeagueConfig,
    charts: &[ChartConfig],
) -> Result<SummaryBundle, PipelineError>
where
    S: LeagueSource + ?Sized,
    G: TextGenerator + ?Sized,
{
    let league_id = league.id.as_str();
    let needs_squads = charts.iter().any(|c| c.source == ChartSource::Squads);

    let (raw_standings, match_results, squads) = tokio::try_join!(
        source.standings(league_id),
        source.match_results(league_id),
        fetch_squads_if(source, league_id, needs_squads),
    )?;
    info!(
        league = league_id,
        standings = raw_standings.len(),
        match_results = match_results.data.len(),
        squads = squads.len(),
        "league data loaded"
    );

    let standings = normalize(raw_standings);
    let gameweek = current_gameweek(&match_results)?;
    info!(gameweek = gameweek.get(), "current gameweek derived");

    // String-keyed records only, so conversion to `Value` cannot fail.
    let standings_data = json!(standings);
    let results_data = json!(match_results.data);
    let squads_data = json!(squads);

    let hero_prompt =
        prompt::build(PromptIntent::HeroSentence, &standings_data, gameweek, league);
    let title_prompt =
        prompt::build(PromptIntent::GameweekTitle, &standings_data, gameweek, league);
    let chart_prompts: Vec<ChartPrompts<'_>> = charts
        .iter()
        .map(|chart| {
            let data = match chart.source {
                ChartSource::MatchResults => &results_data,
                ChartSource::Squads => &squads_data,
            };
            let title = chart.title_context.as_deref().map(|context| {
                let intent = PromptIntent::ChartTitle {
                    chart_type: &chart.chart_type,
                    context: Some(context),
                };
                prompt::build(intent, data, gameweek, league)
            });
            let subtitle_intent = PromptIntent::ChartSummary {
                chart_type: &chart.chart_type,
                context: Some(&chart.subtitle_context),
            };
            ChartPrompts {
                key: &chart.key,
                title,
                subtitle: prompt::build(subtitle_intent, data, gameweek, league),
            }
        })
        .collect();

    let (hero, title, captions) = tokio::try_join!(
        generator.generate(&hero_prompt),
        generator.generate(&title_prompt),
        try_join_all(chart_prompts.iter().map(|p| chart_caption(generator, p))),
    )?;
    info!(charts = captions.len(), "captions generated");

    let chart_summaries = ChartSummaries(
        chart_prompts
            .iter()
            .zip(captions)
            .map(|(p, caption)| (p.key.to_string(), caption))
            .collect(),
    );

    Ok(SummaryBundle {
        hero,
        title,
        gameweek,
        chart_summaries,
    })
}

async fn fetch_squads_if<S>(
    source: &S,
    league_id: &str,
    needed: bool,
) -> Result<Vec<SquadRecord>, SourceError>
where
    S: LeagueSource + ?Sized,
{
    if needed {
        source.squads(league_id).await
    } else {
        Ok(Vec::new())
    }
}

async fn chart_caption<G>(
    generator: &G,
    prompts: &ChartPrompts<'_>,
) -> Result<ChartCaption, GenerationError>
where
    G: TextGenerator + ?Sized,
{
    let title = async {
        match &prompts.title {
            Some(prompt) => generator.generate(prompt).await.map(Some),
            None => Ok(None),
        }
    };
    let (title, subtitle) = tokio::try_join!(title, generator.generate(&prompts.subtitle))?;
    Ok(ChartCaption { title, subtitle })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
