// Prompt templates for dashboard captions.
//
// Every template is fixed text with a handful of runtime values spliced in
// (gameweek, participants, stakes, chart name). The dataset the caption is
// about is appended after the instruction as pretty-printed JSON, in full.

use serde_json::Value;

use draftcast_core::config::LeagueConfig;
use draftcast_core::league::Gameweek;

/// Which caption is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptIntent<'a> {
    /// One-sentence headline for the top of the dashboard.
    HeroSentence,
    /// Short title for the current gameweek.
    GameweekTitle,
    /// One-sentence takeaway for a named chart, with an optional hint about
    /// what the chart shows.
    ChartSummary {
        chart_type: &'a str,
        context: Option<&'a str>,
    },
    /// Headline-style title for a named chart.
    ChartTitle {
        chart_type: &'a str,
        context: Option<&'a str>,
    },
}

/// Build the full prompt for `intent`, attaching `data` after the instruction.
pub fn build(
    intent: PromptIntent<'_>,
    data: &Value,
    gameweek: Gameweek,
    league: &LeagueConfig,
) -> String {
    let instruction = match intent {
        PromptIntent::HeroSentence => hero_instruction(gameweek, league),
        PromptIntent::GameweekTitle => gameweek_title_instruction(gameweek),
        PromptIntent::ChartSummary {
            chart_type,
            context,
        } => chart_instruction(chart_type, context),
        PromptIntent::ChartTitle {
            chart_type,
            context,
        } => chart_title_instruction(chart_type, context),
    };
    attach_data(&instruction, data)
}

fn hero_instruction(gameweek: Gameweek, league: &LeagueConfig) -> String {
    let count = league.managers.len();
    format!(
        "You are analyzing fantasy premier league draft data for a {count}-person competition \
         after gameweek {gameweek} (of {season} total).\n\
         Write ONE concise sentence (max 25 words) for the top of a dashboard.\n\
         \n\
         Guidelines:\n\
         - Find something interesting beyond simple descriptions\n\
         - Try to mention all {count} users: {names}\n\
         - Comment on who can still win or who risks last place\n\
         - Remember: the loser pays ${stakes} to the joint bank account (mention if relevant/dramatic)\n\
         - Focus on the current standings (rank) and total points\n\
         \n\
         Make it punchy, insightful, and dashboard-worthy!",
        season = league.season_length,
        names = join_names(&league.managers),
        stakes = league.stakes,
    )
}

fn gameweek_title_instruction(gameweek: Gameweek) -> String {
    format!(
        "Create a short, catchy title (max 6 words) for gameweek {gameweek} based on these \
         fantasy draft standings. Focus on the most interesting or dramatic aspect - a tight \
         race, a dominant leader, someone pulling away, etc. Make it punchy and attention-grabbing!"
    )
}

fn chart_instruction(chart_type: &str, context: Option<&str>) -> String {
    with_context(
        format!(
            "Create a brief, insightful sentence (max 25 words) describing the key takeaway \
             from this {chart_type} chart."
        ),
        context,
    )
}

fn chart_title_instruction(chart_type: &str, context: Option<&str>) -> String {
    with_context(
        format!(
            "Create a short, punchy title (max 6 words) capturing the key takeaway \
             from this {chart_type} chart. No full sentence, no trailing period."
        ),
        context,
    )
}

fn with_context(mut instruction: String, context: Option<&str>) -> String {
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        instruction.push(' ');
        instruction.push_str(context);
    }
    instruction
}

fn attach_data(instruction: &str, data: &Value) -> String {
    format!("{instruction}\n\nData:\n{data:#}")
}

/// "A", "A and B", "A, B, and C".
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
