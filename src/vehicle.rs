use serde::{Deserialize, Serialize};

/// An inventory record as returned by the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "ano_producao_inicial")]
    pub initial_year: u32,
    #[serde(rename = "ano_producao_final")]
    pub final_year: Option<u32>,
    #[serde(rename = "potencia_cv")]
    pub horsepower: u32,
    #[serde(rename = "combustivel")]
    pub fuel_type: String,
    #[serde(rename = "num_portas")]
    pub door_count: u32,
    #[serde(rename = "porta_malas_litros")]
    pub trunk_liters: Option<u32>,
    #[serde(rename = "transmissao_automatica")]
    pub automatic_transmission: bool,
    #[serde(rename = "capacidade_carga_kg")]
    pub cargo_capacity_kg: Option<f64>,
    #[serde(rename = "tanque_litros")]
    pub tank_liters: Option<u32>,
    #[serde(rename = "autonomia_km_l")]
    pub efficiency_km_l: Option<f64>,
}

#[cfg(test)]
pub(crate) fn sample(brand: &str, model: &str, horsepower: u32, fuel_type: &str) -> Vehicle {
    Vehicle {
        id: 0,
        brand: brand.to_string(),
        model: model.to_string(),
        initial_year: 2020,
        final_year: None,
        horsepower,
        fuel_type: fuel_type.to_string(),
        door_count: 4,
        trunk_liters: None,
        automatic_transmission: false,
        cargo_capacity_kg: None,
        tank_liters: None,
        efficiency_km_l: None,
    }
}
