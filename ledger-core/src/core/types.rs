//! Core accounting enums
//!
//! Small `Copy` types shared by positions, lots, snapshots and execution reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fill side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Direction multiplier applied to a fill quantity
    #[inline(always)]
    pub const fn sign(&self) -> i8 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    /// The side that closes a position opened by `self`
    #[inline]
    pub const fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" | "b" | "bid" => Ok(Side::Buy),
            "sell" | "s" | "ask" => Ok(Side::Sell),
            other => Err(format!("unknown side '{}'", other)),
        }
    }
}

/// Direction of a held position
///
/// Always derived from the signed size: `Flat` iff size is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
    Flat,
}

impl PositionSide {
    /// Fill side that increases exposure in this direction
    pub const fn opening_side(&self) -> Option<Side> {
        match self {
            PositionSide::Long => Some(Side::Buy),
            PositionSide::Short => Some(Side::Sell),
            PositionSide::Flat => None,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
            PositionSide::Flat => write!(f, "FLAT"),
        }
    }
}

/// Cost basis accounting method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasisMethod {
    /// Single running average entry price
    WeightedAverage,
    /// Oldest lots are closed first
    Fifo,
}

impl fmt::Display for CostBasisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostBasisMethod::WeightedAverage => write!(f, "weighted_average"),
            CostBasisMethod::Fifo => write!(f, "fifo"),
        }
    }
}

impl FromStr for CostBasisMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weighted_average" | "weighted-average" | "wavg" | "average" => {
                Ok(CostBasisMethod::WeightedAverage)
            }
            "fifo" => Ok(CostBasisMethod::Fifo),
            other => Err(format!(
                "unknown cost basis method '{}', expected 'weighted_average' or 'fifo'",
                other
            )),
        }
    }
}

impl Default for CostBasisMethod {
    fn default() -> Self {
        crate::config::constants::DEFAULT_COST_BASIS_METHOD
    }
}
