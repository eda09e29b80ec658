use serde::{Deserialize, Serialize};

use crate::analyzer::StructuralSignals;

/// Layout families understood by the solver boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutAlgorithm {
    Box,
    Layered,
    Mrtree,
    Stress,
    Grid,
}

impl LayoutAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Layered => "layered",
            Self::Mrtree => "mrtree",
            Self::Stress => "stress",
            Self::Grid => "grid",
        }
    }

    /// Directional families honor a `LayoutDirection`; the rest ignore it.
    pub fn is_directional(self) -> bool {
        matches!(self, Self::Layered | Self::Mrtree)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayoutDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub x: f32,
    pub y: f32,
}

impl Spacing {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The (algorithm, direction, spacing, preserve-groups, confidence, reason)
/// tuple chosen for one invocation. Ephemeral; recomputed per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDecision {
    pub algorithm: LayoutAlgorithm,
    pub direction: Option<LayoutDirection>,
    pub spacing: Spacing,
    pub preserve_groups: bool,
    /// Always in [0, 1].
    pub confidence: f32,
    pub reason: String,
}

impl LayoutDecision {
    /// Low-confidence decisions are a soft warning for the caller, never a
    /// blocker: the classifier always produces something runnable.
    pub fn is_low_confidence(&self, threshold: f32) -> bool {
        self.confidence < threshold
    }
}

// Classifier rule constants, named so the decision list below stays readable.
const SEQUENCE_SPACING: Spacing = Spacing { x: 150.0, y: 80.0 };
const MIN_ACTOR_TEXTS: usize = 2;
const MIN_ACTOR_RECTS: usize = 2;
const MIN_MESSAGE_CONNECTIONS: usize = 3;
const MESSAGES_PER_TEXT: f32 = 0.5;
const ARCH_BOX_RATIO: f32 = 3.0;
const ARCH_MIN_RECTS: usize = 5;
const ARCH_MAX_DENSITY: f32 = 1.0;
const DENSE_DENSITY: f32 = 2.0;

struct Rule {
    applies: fn(&StructuralSignals) -> bool,
    decide: fn() -> LayoutDecision,
}

fn decision(
    algorithm: LayoutAlgorithm,
    direction: Option<LayoutDirection>,
    spacing: Spacing,
    preserve_groups: bool,
    confidence: f32,
    reason: &str,
) -> LayoutDecision {
    LayoutDecision {
        algorithm,
        direction,
        spacing,
        preserve_groups,
        confidence,
        reason: reason.to_string(),
    }
}

/// Ordered decision list; first match wins. Rules 1 and 3 overlap for
/// multi-actor, richly-connected selections — rule 1 deliberately takes
/// priority (see the ordering test below), matching the tuned behavior.
static RULES: &[Rule] = &[
    // 1. Sequence diagram: horizontal actor row plus vertical message flow.
    Rule {
        applies: |s| s.has_horizontal_actors && s.has_vertical_messages,
        decide: || {
            decision(
                LayoutAlgorithm::Layered,
                Some(LayoutDirection::Down),
                SEQUENCE_SPACING,
                false,
                0.95,
                "sequence diagram: horizontal actors + vertical messages",
            )
        },
    },
    // 2. Sequence diagram detected via the lifeline arrangement instead.
    Rule {
        applies: |s| {
            s.text_count >= MIN_ACTOR_TEXTS
                && s.rectangle_count >= MIN_ACTOR_RECTS
                && s.connection_count > 0
                && s.has_lifeline_pattern
        },
        decide: || {
            decision(
                LayoutAlgorithm::Layered,
                Some(LayoutDirection::Down),
                SEQUENCE_SPACING,
                false,
                0.90,
                "sequence diagram: lifeline arrangement",
            )
        },
    },
    // 3. Message-heavy actor graph; fuzzy boundary with rule 1 by design.
    Rule {
        applies: |s| {
            s.text_count >= MIN_ACTOR_TEXTS
                && s.connection_count >= MIN_MESSAGE_CONNECTIONS
                && s.connection_count as f32 >= s.text_count as f32 * MESSAGES_PER_TEXT
        },
        decide: || {
            decision(
                LayoutAlgorithm::Layered,
                Some(LayoutDirection::Down),
                SEQUENCE_SPACING,
                false,
                0.85,
                "actor graph: many messages between labeled participants",
            )
        },
    },
    // 4. Architecture: many components, few connections.
    Rule {
        applies: |s| {
            s.box_to_arrow_ratio > ARCH_BOX_RATIO
                && s.rectangle_count > ARCH_MIN_RECTS
                && !s.has_horizontal_actors
                && s.connection_density < ARCH_MAX_DENSITY
        },
        decide: || {
            decision(
                LayoutAlgorithm::Box,
                None,
                Spacing::new(120.0, 100.0),
                true,
                0.90,
                "architecture: many components, few connections",
            )
        },
    },
    // 5. Class hierarchy with inheritance edges.
    Rule {
        applies: |s| s.has_class_structure && s.has_inheritance_connections,
        decide: || {
            decision(
                LayoutAlgorithm::Mrtree,
                Some(LayoutDirection::Down),
                Spacing::new(100.0, 120.0),
                true,
                0.80,
                "class hierarchy: inheritance connections",
            )
        },
    },
    // 6. Dense network.
    Rule {
        applies: |s| s.connection_density > DENSE_DENSITY,
        decide: || {
            decision(
                LayoutAlgorithm::Stress,
                None,
                Spacing::new(100.0, 100.0),
                false,
                0.75,
                "dense network",
            )
        },
    },
    // 7. Flowchart with decision branches.
    Rule {
        applies: |s| s.has_decision_nodes && s.has_linear_flow,
        decide: || {
            decision(
                LayoutAlgorithm::Layered,
                Some(LayoutDirection::Down),
                Spacing::new(100.0, 60.0),
                true,
                0.70,
                "flowchart with decisions",
            )
        },
    },
];

/// Classify a selection's signals into exactly one layout decision. Falls
/// through to a grid arrangement when no rule fires.
pub fn classify(signals: &StructuralSignals) -> LayoutDecision {
    for rule in RULES {
        if (rule.applies)(signals) {
            return (rule.decide)();
        }
    }
    decision(
        LayoutAlgorithm::Grid,
        None,
        Spacing::new(80.0, 80.0),
        true,
        0.60,
        "no specific pattern detected",
    )
}

/// Fixed catalogue entries offered by the confirmation UI when the user
/// overrides the automatic choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPreset {
    SymmetricTree,
    Sequential,
    Compact,
    Network,
    Grid,
}

impl LayoutPreset {
    pub const ALL: [LayoutPreset; 5] = [
        LayoutPreset::SymmetricTree,
        LayoutPreset::Sequential,
        LayoutPreset::Compact,
        LayoutPreset::Network,
        LayoutPreset::Grid,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::SymmetricTree => "symmetric tree",
            Self::Sequential => "sequential",
            Self::Compact => "compact",
            Self::Network => "network",
            Self::Grid => "grid",
        }
    }

    /// Manual choices bypass the classifier entirely, so they carry full
    /// confidence and their own default spacing and direction.
    pub fn decision(self) -> LayoutDecision {
        let (algorithm, direction, spacing) = match self {
            Self::SymmetricTree => (
                LayoutAlgorithm::Mrtree,
                Some(LayoutDirection::Down),
                Spacing::new(100.0, 120.0),
            ),
            Self::Sequential => (
                LayoutAlgorithm::Layered,
                Some(LayoutDirection::Down),
                Spacing::new(100.0, 60.0),
            ),
            Self::Compact => (LayoutAlgorithm::Box, None, Spacing::new(120.0, 100.0)),
            Self::Network => (LayoutAlgorithm::Stress, None, Spacing::new(100.0, 100.0)),
            Self::Grid => (LayoutAlgorithm::Grid, None, Spacing::new(80.0, 80.0)),
        };
        LayoutDecision {
            algorithm,
            direction,
            spacing,
            preserve_groups: true,
            confidence: 1.0,
            reason: format!("manual choice: {}", self.label()),
        }
    }
}
