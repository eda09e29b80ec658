use serde::{Deserialize, Serialize};
use std::path::Path;

/// Empirically tuned thresholds used by the element analyzer. Hoisted into a
/// config struct so tuning (and property tests) can vary them without touching
/// the heuristics themselves. Defaults match the shipped behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// Share of connector-touched nodes with degree <= 2 above which the
    /// selection counts as a linear flow.
    pub linear_degree_share: f32,
    /// Upper bound on the vertical-position variance (squared units) of text
    /// shapes for them to count as a horizontal actor row.
    pub actor_variance_max: f32,
    /// Alternative actor test: share of text shapes that must sit in the top
    /// third of the selection's vertical range. Lenient OR-combination with
    /// the variance test to tolerate imprecise hand alignment.
    pub actor_top_band_share: f32,
    /// Minimum |dy| for a connector to count as a vertical message.
    pub vertical_displacement_min: f32,
    /// Share of direction-carrying connectors that must be vertical. Kept low
    /// since hand-drawn connectors are rarely perfectly vertical.
    pub vertical_message_share: f32,
    /// Minimum distance the average text row must sit above the average box
    /// row for a lifeline arrangement.
    pub lifeline_y_gap: f32,
    /// Minimum horizontal spread across actor-like shapes for a lifeline
    /// arrangement.
    pub lifeline_spread_min: f32,
    /// Decisions below this confidence are surfaced as a soft warning.
    pub low_confidence: f32,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            linear_degree_share: 0.7,
            actor_variance_max: 200.0,
            actor_top_band_share: 0.6,
            vertical_displacement_min: 30.0,
            vertical_message_share: 0.3,
            lifeline_y_gap: 50.0,
            lifeline_spread_min: 200.0,
            low_confidence: 0.65,
        }
    }
}

/// Resource ceilings applied before anything is handed to the solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverLimits {
    /// Selections with more layoutable nodes than this fail fast instead of
    /// being submitted to the solver.
    pub max_nodes: usize,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self { max_nodes: 400 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub heuristics: HeuristicsConfig,
    #[serde(default)]
    pub limits: SolverLimits,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    heuristics: Option<HeuristicsConfig>,
    limits: Option<SolverLimits>,
}

/// Load a config overlay from a JSON file; absent path or absent sections fall
/// back to defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(heuristics) = parsed.heuristics {
        config.heuristics = heuristics;
    }
    if let Some(limits) = parsed.limits {
        config.limits = limits;
    }

    Ok(config)
}
