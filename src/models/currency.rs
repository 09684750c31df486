use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Settlement currencies supported by the marketplace.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Aud,
    Sgd,
    Vnd,
}

impl Currency {
    /// Decimal places shown to buyers and charged by payment providers.
    pub fn precision(self) -> u32 {
        match self {
            Currency::Vnd => 0,
            _ => 2,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Aud => "A$",
            Currency::Sgd => "S$",
            Currency::Vnd => "₫",
        }
    }
}
