//! Data structures for the match catalog.
//!
//! This module contains pure data structures describing buildings,
//! weapons, chassis and faction specials. All structs can be deserialized
//! from RON documents.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `mechcom_headless`.

mod building_data;
mod catalog;
mod faction_data;
mod unit_data;

pub use building_data::{BuildingData, BuildingType};
pub use catalog::{Catalog, UnitPart};
pub use faction_data::FactionSpecial;
pub use unit_data::{
    ChassisData, ChassisType, TargetClass, UnitComposition, WeaponData, WeaponType,
};
