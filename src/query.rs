use serde::Deserialize;

use crate::vehicle::Vehicle;

/// Request body accepted by the search endpoint. Unknown fields are rejected.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleFilters {
    #[serde(rename = "marca")]
    pub brand: Option<String>,
    #[serde(rename = "modelo")]
    pub model: Option<String>,
    #[serde(rename = "ano_producao_inicial_min")]
    pub initial_year_min: Option<u32>,
    #[serde(rename = "ano_producao_inicial_max")]
    pub initial_year_max: Option<u32>,
    #[serde(rename = "ano_producao_final_especifico")]
    pub final_year: Option<u32>,
    #[serde(rename = "combustivel")]
    pub fuel_type: Option<String>,
    #[serde(rename = "num_portas")]
    pub door_count: Option<u32>,
    #[serde(rename = "transmissao_automatica")]
    pub automatic_transmission: Option<bool>,
    #[serde(rename = "potencia_cv_min")]
    pub min_horsepower: Option<u32>,
    #[serde(rename = "potencia_cv_max")]
    pub max_horsepower: Option<u32>,
    #[serde(rename = "porta_malas_litros_min")]
    pub min_trunk_liters: Option<u32>,
    #[serde(rename = "autonomia_km_l_min")]
    pub min_efficiency_km_l: Option<f64>,
}

impl VehicleFilters {
    /// Whether `vehicle` satisfies every filter that is set.
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        contains(self.brand.as_deref(), &vehicle.brand)
            && contains(self.model.as_deref(), &vehicle.model)
            && contains(self.fuel_type.as_deref(), &vehicle.fuel_type)
            && self.initial_year_min.map_or(true, |min| vehicle.initial_year >= min)
            && self.initial_year_max.map_or(true, |max| vehicle.initial_year <= max)
            && self.final_year.map_or(true, |year| vehicle.final_year == Some(year))
            && self.door_count.map_or(true, |doors| vehicle.door_count == doors)
            && self
                .automatic_transmission
                .map_or(true, |auto| vehicle.automatic_transmission == auto)
            && self.min_horsepower.map_or(true, |min| vehicle.horsepower >= min)
            && self.max_horsepower.map_or(true, |max| vehicle.horsepower <= max)
            && self
                .min_trunk_liters
                .map_or(true, |min| vehicle.trunk_liters.is_some_and(|trunk| trunk >= min))
            && self
                .min_efficiency_km_l
                .map_or(true, |min| vehicle.efficiency_km_l.is_some_and(|km_l| km_l >= min))
    }
}

/// Case-insensitive substring match; an empty or absent needle matches anything.
fn contains(needle: Option<&str>, haystack: &str) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}
