//! Deployment tiers, module styles, and the membership rule between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct ParseEnvironmentError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Target deployment profile.
///
/// Declaration order is the processing order of the tier fold: a library key
/// claimed by an earlier tier is not delivered again by a later one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Production,
    Test,
    Development,
}

/// Classification of a first-party module, deciding which tiers deploy it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Style {
    Test,
    Development,
    Container,
    Cartridge,
    Adapter,
    All,
}

impl Tier {
    /// All tiers in processing order.
    pub const ORDERED: [Tier; 3] = [Tier::Production, Tier::Test, Tier::Development];

    /// Environment types whose modules this tier deploys.
    pub fn accepted_types(self) -> &'static [Tier] {
        match self {
            Tier::Production => &[Tier::Production],
            Tier::Test => &[Tier::Production, Tier::Test],
            Tier::Development => &[Tier::Production, Tier::Test, Tier::Development],
        }
    }

    /// Whether a module of `style` is deployed in this tier.
    pub fn accepts(self, style: Style) -> bool {
        style == Style::All || self.accepted_types().contains(&style.environment_type())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Production => "production",
            Tier::Test => "test",
            Tier::Development => "development",
        }
    }
}

/// Free-function form of [`Tier::accepts`].
pub fn accepts(tier: Tier, style: Style) -> bool {
    tier.accepts(style)
}

impl Style {
    pub const ALL_STYLES: [Style; 6] = [
        Style::Test,
        Style::Development,
        Style::Container,
        Style::Cartridge,
        Style::Adapter,
        Style::All,
    ];

    /// The environment type a module of this style belongs to.
    pub fn environment_type(self) -> Tier {
        match self {
            Style::Test => Tier::Test,
            Style::Development => Tier::Development,
            Style::Container | Style::Cartridge | Style::Adapter | Style::All => Tier::Production,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Style::Test => "test",
            Style::Development => "development",
            Style::Container => "container",
            Style::Cartridge => "cartridge",
            Style::Adapter => "adapter",
            Style::All => "all",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ORDERED
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnvironmentError {
                kind: "tier",
                value: s.to_owned(),
                expected: "production, test, development",
            })
    }
}

impl FromStr for Style {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Style::ALL_STYLES
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnvironmentError {
                kind: "style",
                value: s.to_owned(),
                expected: "test, development, container, cartridge, adapter, all",
            })
    }
}

impl TryFrom<String> for Style {
    type Error = ParseEnvironmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        style.as_str().to_owned()
    }
}
