// Lineup suggestor: prompt construction and reconciliation of the model's reply.
//
// The model's reply is untrusted free text. Nothing it says reaches the caller
// unless it names an operator that exists in the catalog on the requested side.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use serde::Deserialize;

use crate::db::{Database, Map, Operator, Side};
use crate::error::AppError;
use crate::metrics;

/// Default number of operators requested from the model and returned to the user.
pub const DEFAULT_SUGGESTION_COUNT: usize = 3;

/// Raw lineup form as submitted by a client. Every field is optional here so
/// that missing input turns into a validation message instead of a 422.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineupForm {
    #[serde(default, alias = "map")]
    pub map_name: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub solo_queue: bool,
    #[serde(default)]
    pub situation: Option<String>,
}

/// A validated lineup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineupRequest {
    pub map_name: String,
    /// Advisory only: not checked against the map's site list.
    pub site: String,
    pub side: Side,
    pub solo_queue: bool,
    pub situation: String,
}

impl LineupForm {
    pub fn validate(self) -> Result<LineupRequest, AppError> {
        fn required(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let (Some(map_name), Some(site), Some(side), Some(situation)) = (
            required(self.map_name),
            required(self.site),
            required(self.side),
            self.situation.filter(|v| !v.trim().is_empty()),
        ) else {
            return Err(AppError::Validation(
                "Please fill in all required fields.".to_string(),
            ));
        };

        let side = side.parse::<Side>().map_err(AppError::Validation)?;

        Ok(LineupRequest {
            map_name,
            site,
            side,
            solo_queue: self.solo_queue,
            situation,
        })
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() {
        "None"
    } else {
        value
    }
}

fn format_map(map: &Map) -> String {
    format!(
        "Map Name: {}\nMap Description: {}\nDefender Sites on this map: {}\nRequires Electricity for key walls: {}",
        map.name,
        or_none(&map.description),
        or_none(&map.defender_sites),
        yes_no(map.electricity_needed),
    )
}

fn format_operators<'a>(operators: impl Iterator<Item = &'a Operator>) -> String {
    let mut out = String::from(
        "Available Operators (Name, Side, Role, Armor, Speed, Ability, Bio, Synergies, Counters, Solo Friendly):",
    );
    for op in operators {
        let _ = write!(
            out,
            "\n- {} ({}): Role: {}, {} Armor, {} Speed. Ability: {}. Bio: {}. Synergies: {}. Counters: {}. Solo Friendly: {}.",
            op.name,
            op.side,
            or_none(&op.role),
            op.armor,
            op.speed,
            op.ability,
            or_none(op.short_bio.trim_end_matches('.')),
            or_none(&op.synergy_examples),
            or_none(&op.counter_examples),
            yes_no(op.solo_friendly),
        );
    }
    out
}

/// Build the instruction sent to the generative-text service.
///
/// Only operators on `request.side` are listed, whatever `operators` contains,
/// so the model can only pick names that will survive reconciliation.
pub fn build_prompt(
    request: &LineupRequest,
    map: &Map,
    operators: &[Operator],
    count: usize,
) -> String {
    let side = request.side;
    let roster = format_operators(operators.iter().filter(|op| op.side == side));
    let playing_style = if request.solo_queue {
        "Solo Queue (consider operators effective independently)"
    } else {
        "With a Team (consider team synergies)"
    };

    format!(
        "You are an expert Rainbow Six Siege player and tactical analyst.\n\
         Your task is to suggest a lineup of {count} {side} operators for a specific scenario.\n\
         Consider the map details, the chosen defender site, whether the user plays solo or with a team, and the situation description.\n\
         Only suggest operators from the list of available operators below; every one of them plays on the {side} side.\n\
         Respond with ONLY the names of the {count} most suitable operators, separated by commas. \
         Do not include explanations, rankings, numbering, bullet points or any other formatting. \
         The names must exactly match the names in the list. If fewer than {count} operators fit, give as many as you can (up to {count}).\n\
         \n\
         Map Details:\n\
         {map_details}\n\
         \n\
         Defender Site: {site}\n\
         \n\
         Playing as Side: {side}\n\
         Playing Style: {playing_style}\n\
         \n\
         Situation Description: {situation}\n\
         \n\
         {roster}\n\
         \n\
         Suggest exactly {count} {side} operators from the list above, comma-separated (e.g., Operator1, Operator2, Operator3):",
        map_details = format_map(map),
        site = request.site,
        situation = request.situation,
    )
}

/// Split a raw completion into at most `cap` distinct candidate names, in the
/// order the model first mentioned them.
///
/// Names are comma-separated. When the comma split yields fewer than two
/// names, the reply is split one name per line instead, if that yields any.
pub fn parse_candidates(raw: &str, cap: usize) -> Vec<String> {
    fn fragments(raw: &str, sep: char) -> Vec<&str> {
        raw.split(sep)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    let mut parts = fragments(raw, ',');
    if parts.len() < 2 {
        let lines = fragments(raw, '\n');
        if !lines.is_empty() {
            parts = lines;
        }
    }

    let mut seen = HashSet::new();
    parts
        .into_iter()
        .filter(|name| seen.insert(*name))
        .take(cap)
        .map(str::to_string)
        .collect()
}

/// Keep the catalog operators named by `candidates`, in candidate order.
/// Operators on the wrong side and unknown names are dropped.
pub fn resolve_candidates(candidates: &[String], found: Vec<Operator>, side: Side) -> Vec<Operator> {
    let mut by_name: HashMap<String, Operator> = found
        .into_iter()
        .filter(|op| op.side == side)
        .map(|op| (op.name.clone(), op))
        .collect();

    let mut resolved = Vec::with_capacity(candidates.len());
    for name in candidates {
        match by_name.remove(name) {
            Some(op) => resolved.push(op),
            None => {
                tracing::warn!("Suggested operator '{name}' not found among {side} operators");
                metrics::SUGGESTED_NAMES_DROPPED_TOTAL.inc();
            }
        }
    }
    resolved
}

/// Reconcile a raw completion against the catalog.
///
/// Returns at most `cap` operators, all on `side`. Blank input yields an empty list.
pub async fn reconcile(
    db: &Database,
    raw: &str,
    side: Side,
    cap: usize,
) -> Result<Vec<Operator>, sqlx::Error> {
    let candidates = parse_candidates(raw, cap);
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let found = db.find_operators_by_names(&candidates, side).await?;
    Ok(resolve_candidates(&candidates, found, side))
}
