//! Feature vector assembly
//!
//! Each input record maps to a fixed-length vector whose positions follow the
//! column order the models were trained on. The order is pinned here and must
//! never be derived from JSON key order: a swapped pair still yields a
//! plausible number, just the wrong one.

use crate::models::{
    EfficiencyInput, FeatureVector, FieldSpec, FieldValue, ImpactInput, FEATURE_COUNT,
};
use crate::schema::InputSchema;

/// Training column order of the environmental impact models
pub const IMPACT_FIELDS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec::int("Material_Type"),
    FieldSpec::float("Energy_Manufacturing"),
    FieldSpec::float("Plant_Size"),
    FieldSpec::float("Capacity_Factor"),
    FieldSpec::float("Lifespan"),
];

/// Training column order of the efficiency model
pub const EFFICIENCY_FIELDS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec::float("Cumulative_Energy_Demand"),
    FieldSpec::float("EROI"),
    FieldSpec::float("Net_Energy_Output"),
    FieldSpec::float("Raw_Material_Consumption"),
    FieldSpec::float("Recyclability_Waste_Generation"),
];

impl InputSchema for ImpactInput {
    const FIELDS: [FieldSpec; FEATURE_COUNT] = IMPACT_FIELDS;

    fn from_values(values: [FieldValue; FEATURE_COUNT]) -> Self {
        let [material_type, energy_manufacturing, plant_size, capacity_factor, lifespan] = values;
        Self {
            material_type: material_type.as_i64(),
            energy_manufacturing: energy_manufacturing.as_f64(),
            plant_size: plant_size.as_f64(),
            capacity_factor: capacity_factor.as_f64(),
            lifespan: lifespan.as_f64(),
        }
    }

    fn assemble(&self) -> FeatureVector {
        [
            self.material_type as f64,
            self.energy_manufacturing,
            self.plant_size,
            self.capacity_factor,
            self.lifespan,
        ]
    }
}

impl InputSchema for EfficiencyInput {
    const FIELDS: [FieldSpec; FEATURE_COUNT] = EFFICIENCY_FIELDS;

    fn from_values(values: [FieldValue; FEATURE_COUNT]) -> Self {
        let [cumulative_energy_demand, eroi, net_energy_output, raw_material_consumption, recyclability_waste_generation] =
            values;
        Self {
            cumulative_energy_demand: cumulative_energy_demand.as_f64(),
            eroi: eroi.as_f64(),
            net_energy_output: net_energy_output.as_f64(),
            raw_material_consumption: raw_material_consumption.as_f64(),
            recyclability_waste_generation: recyclability_waste_generation.as_f64(),
        }
    }

    fn assemble(&self) -> FeatureVector {
        [
            self.cumulative_energy_demand,
            self.eroi,
            self.net_energy_output,
            self.raw_material_consumption,
            self.recyclability_waste_generation,
        ]
    }
}
