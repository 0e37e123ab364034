use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};
use sled::{Db, Tree};
use tracing::debug;

use crate::{query::VehicleFilters, vehicle::Vehicle};

const VEHICLE_TREE: &str = "vehicles";

/// Vehicle records in a sled tree, keyed by big-endian id.
#[derive(Clone)]
pub struct Inventory {
    db: Db,
    vehicles: Tree,
}

impl Inventory {
    pub fn connect(path: &Path) -> Result<Self> {
        let db = sled::open(path)
            .with_context(|| format!("cannot open inventory at {}", path.display()))?;
        let vehicles = db.open_tree(VEHICLE_TREE)?;
        Ok(Self { db, vehicles })
    }

    /// Stores `vehicle` under a fresh id and returns that id.
    pub fn insert(&self, mut vehicle: Vehicle) -> Result<u64> {
        let id = self.db.generate_id()? + 1;
        vehicle.id = id;
        self.vehicles
            .insert(id.to_be_bytes(), bincode::serialize(&vehicle)?)?;
        Ok(id)
    }

    /// Stores the records not already present and returns how many were added.
    ///
    /// Two records are the same vehicle when brand, model, initial year and
    /// horsepower match.
    pub fn import(&self, vehicles: Vec<Vehicle>) -> Result<usize> {
        let mut known = self
            .vehicles()
            .map(|vehicle| vehicle.map(|v| identity(&v)))
            .collect::<Result<HashSet<_>>>()?;

        let mut added = 0;
        for vehicle in vehicles {
            if !known.insert(identity(&vehicle)) {
                debug!(
                    "Skipping {} {} ({}), already in the inventory",
                    vehicle.brand, vehicle.model, vehicle.initial_year
                );
                continue;
            }
            self.insert(vehicle)?;
            added += 1;
        }
        self.vehicles.flush()?;
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// All records in id order.
    pub fn vehicles(&self) -> impl Iterator<Item = Result<Vehicle>> + '_ {
        self.vehicles.iter().values().map(|val| {
            let val = val?;
            Ok(bincode::deserialize::<Vehicle>(&val)?)
        })
    }

    pub fn search(&self, filters: &VehicleFilters) -> Result<Vec<Vehicle>> {
        let mut found = Vec::new();
        for vehicle in self.vehicles() {
            let vehicle = vehicle?;
            if filters.matches(&vehicle) {
                found.push(vehicle);
            }
        }
        Ok(found)
    }
}

fn identity(vehicle: &Vehicle) -> (String, String, u32, u32) {
    (
        vehicle.brand.clone(),
        vehicle.model.clone(),
        vehicle.initial_year,
        vehicle.horsepower,
    )
}
