//! # Spoke Kinds
//!
//! The closed set of bound-reporting spoke variants and the objective sense
//! they interpret bounds under. Both hub and spokes need these to agree on
//! which fields exist, so they live here rather than in the spoke crate.

use crate::entities::Field;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optimization sense of the underlying problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

impl Sense {
    pub fn is_minimizing(&self) -> bool {
        matches!(self, Sense::Minimize)
    }
}

impl std::str::FromStr for Sense {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" | "minimize" => Ok(Sense::Minimize),
            "max" | "maximize" => Ok(Sense::Maximize),
            other => Err(format!("unknown sense: {other}")),
        }
    }
}

/// Which side of the optimal value a bound sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundKind {
    /// Feasible-solution (primal) bound.
    Inner,
    /// Relaxation (dual) bound.
    Outer,
}

impl BoundKind {
    /// The window field a spoke publishes this bound on.
    pub fn field(&self) -> Field {
        match self {
            BoundKind::Inner => Field::InnerBound,
            BoundKind::Outer => Field::OuterBound,
        }
    }
}

/// Direction in which a reported bound gets better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Improvement {
    SmallerIsBetter,
    LargerIsBetter,
}

impl Improvement {
    /// Inner bounds of a minimization improve downward, outer bounds upward;
    /// maximization mirrors both.
    pub fn for_bound(sense: Sense, kind: BoundKind) -> Self {
        match (sense, kind) {
            (Sense::Minimize, BoundKind::Inner) | (Sense::Maximize, BoundKind::Outer) => {
                Improvement::SmallerIsBetter
            }
            (Sense::Minimize, BoundKind::Outer) | (Sense::Maximize, BoundKind::Inner) => {
                Improvement::LargerIsBetter
            }
        }
    }

    /// True only for a strict improvement of `candidate` over `current`.
    pub fn improves(&self, candidate: f64, current: f64) -> bool {
        match self {
            Improvement::SmallerIsBetter => candidate < current,
            Improvement::LargerIsBetter => candidate > current,
        }
    }

    /// The value every finite candidate improves on.
    pub fn worst(&self) -> f64 {
        match self {
            Improvement::SmallerIsBetter => f64::INFINITY,
            Improvement::LargerIsBetter => f64::NEG_INFINITY,
        }
    }
}

/// Roles a spoke plays for the hub's convergence logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvergerSpokeType {
    OuterBound,
    InnerBound,
    WGetter,
    NonantGetter,
}

/// Static description of a bound-reporting spoke.
pub trait SpokeKind {
    fn bound_kind(&self) -> BoundKind;

    /// Hub-owned fields (beyond shutdown and bounds) this spoke reads.
    fn auxiliary_fields(&self) -> &'static [Field];

    fn converger_types(&self) -> &'static [ConvergerSpokeType];

    /// One-character tag used in hub progress tables.
    fn converger_char(&self) -> char;

    fn name(&self) -> &'static str;

    /// Whether accepted bounds carry a cached solution vector.
    fn caches_incumbent(&self) -> bool {
        false
    }
}

/// The closed set of bound-reporting spoke variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpokeVariant {
    /// Inner bound with no hub inputs.
    InnerBound,
    /// Outer bound with no hub inputs.
    OuterBound,
    /// Inner bound evaluated at hub nonants; caches the incumbent.
    InnerBoundWithIncumbent,
    /// Outer bound computed from hub dual weights.
    OuterBoundWithDuals,
    /// Outer bound computed from hub nonants.
    OuterBoundWithNonants,
}

impl SpokeVariant {
    pub const ALL: [SpokeVariant; 5] = [
        SpokeVariant::InnerBound,
        SpokeVariant::OuterBound,
        SpokeVariant::InnerBoundWithIncumbent,
        SpokeVariant::OuterBoundWithDuals,
        SpokeVariant::OuterBoundWithNonants,
    ];

    /// Whether this variant needs a per-rank nonant-length field.
    pub fn needs_nonant_len(&self) -> bool {
        !self.auxiliary_fields().is_empty()
    }
}

impl SpokeKind for SpokeVariant {
    fn bound_kind(&self) -> BoundKind {
        match self {
            SpokeVariant::InnerBound | SpokeVariant::InnerBoundWithIncumbent => BoundKind::Inner,
            SpokeVariant::OuterBound
            | SpokeVariant::OuterBoundWithDuals
            | SpokeVariant::OuterBoundWithNonants => BoundKind::Outer,
        }
    }

    fn auxiliary_fields(&self) -> &'static [Field] {
        match self {
            SpokeVariant::InnerBound | SpokeVariant::OuterBound => &[],
            SpokeVariant::InnerBoundWithIncumbent | SpokeVariant::OuterBoundWithNonants => {
                &[Field::Nonant]
            }
            SpokeVariant::OuterBoundWithDuals => &[Field::Duals],
        }
    }

    fn converger_types(&self) -> &'static [ConvergerSpokeType] {
        match self {
            SpokeVariant::InnerBound => &[ConvergerSpokeType::InnerBound],
            SpokeVariant::OuterBound => &[ConvergerSpokeType::OuterBound],
            SpokeVariant::InnerBoundWithIncumbent => &[
                ConvergerSpokeType::InnerBound,
                ConvergerSpokeType::NonantGetter,
            ],
            SpokeVariant::OuterBoundWithDuals => {
                &[ConvergerSpokeType::OuterBound, ConvergerSpokeType::WGetter]
            }
            SpokeVariant::OuterBoundWithNonants => &[
                ConvergerSpokeType::OuterBound,
                ConvergerSpokeType::NonantGetter,
            ],
        }
    }

    fn converger_char(&self) -> char {
        match self {
            SpokeVariant::InnerBound | SpokeVariant::InnerBoundWithIncumbent => 'I',
            SpokeVariant::OuterBound | SpokeVariant::OuterBoundWithDuals => 'O',
            // usually a Lagrangian-style spoke
            SpokeVariant::OuterBoundWithNonants => 'A',
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SpokeVariant::InnerBound => "InnerBoundSpoke",
            SpokeVariant::OuterBound => "OuterBoundSpoke",
            SpokeVariant::InnerBoundWithIncumbent => "InnerBoundNonantSpoke",
            SpokeVariant::OuterBoundWithDuals => "OuterBoundWSpoke",
            SpokeVariant::OuterBoundWithNonants => "OuterBoundNonantSpoke",
        }
    }

    fn caches_incumbent(&self) -> bool {
        matches!(self, SpokeVariant::InnerBoundWithIncumbent)
    }
}

impl fmt::Display for SpokeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for SpokeVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(SpokeVariant::InnerBound),
            "outer" => Ok(SpokeVariant::OuterBound),
            "incumbent" | "inner-nonant" => Ok(SpokeVariant::InnerBoundWithIncumbent),
            "duals" | "outer-w" => Ok(SpokeVariant::OuterBoundWithDuals),
            "lagrangian" | "outer-nonant" => Ok(SpokeVariant::OuterBoundWithNonants),
            other => Err(format!("unknown spoke variant: {other}")),
        }
    }
}
