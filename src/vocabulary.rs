use std::fmt;

use serde::{Deserialize, Serialize};

/// Tokens a model writes when it has no real value for a filter.
const PLACEHOLDERS: &[&str] = &["", "nenhum", "n/a", "na", "null", "qualquer", "none", "any"];

/// Accented spellings the model sometimes uses instead of the canonical key.
const KEY_ALIASES: &[(&str, FilterKey)] = &[
    ("potência_cv_min", FilterKey::MinHorsepower),
    ("potência_cv_max", FilterKey::MaxHorsepower),
];

/// The kind a filter value must coerce to before it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Boolean,
}

/// A search criterion understood by the inventory service.
///
/// The serialized name of each variant is the field name the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterKey {
    #[serde(rename = "marca")]
    Brand,
    #[serde(rename = "modelo")]
    Model,
    #[serde(rename = "ano_producao_inicial_min")]
    ProductionYearMin,
    #[serde(rename = "ano_producao_inicial_max")]
    ProductionYearMax,
    #[serde(rename = "ano_producao_final_especifico")]
    FinalProductionYear,
    #[serde(rename = "combustivel")]
    FuelType,
    #[serde(rename = "num_portas")]
    DoorCount,
    #[serde(rename = "transmissao_automatica")]
    AutomaticTransmission,
    #[serde(rename = "potencia_cv_min")]
    MinHorsepower,
    #[serde(rename = "potencia_cv_max")]
    MaxHorsepower,
    #[serde(rename = "porta_malas_litros_min")]
    MinTrunkVolume,
}

impl FilterKey {
    pub const ALL: [FilterKey; 11] = [
        FilterKey::Brand,
        FilterKey::Model,
        FilterKey::ProductionYearMin,
        FilterKey::ProductionYearMax,
        FilterKey::FinalProductionYear,
        FilterKey::FuelType,
        FilterKey::DoorCount,
        FilterKey::AutomaticTransmission,
        FilterKey::MinHorsepower,
        FilterKey::MaxHorsepower,
        FilterKey::MinTrunkVolume,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::Brand => "marca",
            FilterKey::Model => "modelo",
            FilterKey::ProductionYearMin => "ano_producao_inicial_min",
            FilterKey::ProductionYearMax => "ano_producao_inicial_max",
            FilterKey::FinalProductionYear => "ano_producao_final_especifico",
            FilterKey::FuelType => "combustivel",
            FilterKey::DoorCount => "num_portas",
            FilterKey::AutomaticTransmission => "transmissao_automatica",
            FilterKey::MinHorsepower => "potencia_cv_min",
            FilterKey::MaxHorsepower => "potencia_cv_max",
            FilterKey::MinTrunkVolume => "porta_malas_litros_min",
        }
    }

    /// Resolves a key as written by the model, accepting known aliases.
    pub fn lookup(raw: &str) -> Option<Self> {
        KEY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == raw)
            .map(|(_, key)| *key)
            .or_else(|| Self::ALL.into_iter().find(|key| key.as_str() == raw))
    }

    pub fn kind(self) -> ValueKind {
        match self {
            FilterKey::Brand | FilterKey::Model | FilterKey::FuelType => ValueKind::Text,
            FilterKey::AutomaticTransmission => ValueKind::Boolean,
            FilterKey::ProductionYearMin
            | FilterKey::ProductionYearMax
            | FilterKey::FinalProductionYear
            | FilterKey::DoorCount
            | FilterKey::MinHorsepower
            | FilterKey::MaxHorsepower
            | FilterKey::MinTrunkVolume => ValueKind::Integer,
        }
    }

    /// Whether text values of this key are title-cased.
    pub fn title_cased(self) -> bool {
        matches!(
            self,
            FilterKey::Brand | FilterKey::Model | FilterKey::FuelType
        )
    }

    /// Example value used when describing the key to the model.
    pub fn example(self) -> &'static str {
        match self {
            FilterKey::Brand => "Fiat",
            FilterKey::Model => "Strada",
            FilterKey::ProductionYearMin => "2019",
            FilterKey::ProductionYearMax => "2022",
            FilterKey::FinalProductionYear => "2021",
            FilterKey::FuelType => "Flex, Diesel, Gasolina, Etanol, Elétrico, Híbrido",
            FilterKey::DoorCount => "2, 4",
            FilterKey::AutomaticTransmission => "true ou false",
            FilterKey::MinHorsepower => "70",
            FilterKey::MaxHorsepower => "150",
            FilterKey::MinTrunkVolume => "300",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    PLACEHOLDERS
        .iter()
        .any(|placeholder| value.eq_ignore_ascii_case(placeholder))
}
