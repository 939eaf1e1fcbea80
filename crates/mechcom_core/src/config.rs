//! Tunable simulation constants.
//!
//! Every field has a default matching the stock game, so a RON override
//! only needs to name the values it changes:
//!
//! ```ron
//! SimConfig(
//!     mining_interval: 300,
//!     starting_money: 1000,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{decimal_serde, decimal_vec_serde, Fixed, Vec2Fixed};

/// Tick-loop constants, loaded once per match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Nominal ticks per second. Only used to convert durations for display.
    pub tick_rate: u32,
    /// Uncontested ticks needed to flip a zone.
    pub zone_capture_time: u32,
    /// Resources withdrawn per refinery per mining cycle.
    pub mining_rate: u32,
    /// Ticks per mining cycle.
    pub mining_interval: u32,
    /// Resources a zone starts with.
    pub zone_resources: u32,
    /// Ticks to construct any building.
    pub build_time: u32,
    /// Ticks to produce one unit.
    pub unit_build_time: u32,
    /// Unit cap before depots.
    pub base_unit_cap: u32,
    /// Extra cap per completed depot.
    pub unit_cap_per_depot: u32,
    /// Where a produced unit appears relative to its factory.
    #[serde(with = "decimal_vec_serde")]
    pub spawn_offset: Vec2Fixed,
    /// Collision radius of units.
    #[serde(with = "decimal_serde")]
    pub unit_radius: Fixed,
    /// Collision radius of placed buildings.
    #[serde(with = "decimal_serde")]
    pub building_radius: Fixed,
    /// Collision radius of the buildings a side starts with.
    #[serde(with = "decimal_serde")]
    pub start_building_radius: Fixed,
    /// A move order completes once closer than this.
    #[serde(with = "decimal_serde")]
    pub arrival_threshold: Fixed,
    /// World units per tick for unit projectiles.
    #[serde(with = "decimal_serde")]
    pub unit_projectile_speed: Fixed,
    /// Turret engagement range (strict).
    #[serde(with = "decimal_serde")]
    pub turret_range: Fixed,
    /// Turret damage per shot.
    pub turret_damage: u32,
    /// Ticks between turret shots.
    pub turret_cooldown: u32,
    /// World units per tick for turret projectiles.
    #[serde(with = "decimal_serde")]
    pub turret_projectile_speed: Fixed,
    /// Inner radius of the placement ring around the anchor building.
    #[serde(with = "decimal_serde")]
    pub placement_min_distance: Fixed,
    /// Outer radius of the placement ring around the anchor building.
    #[serde(with = "decimal_serde")]
    pub placement_max_distance: Fixed,
    /// Extra pick tolerance around an entity's radius when selecting.
    #[serde(with = "decimal_serde")]
    pub selection_margin: Fixed,
    /// Maximum per-axis scatter applied to group move orders.
    #[serde(with = "decimal_serde")]
    pub move_dispersion: Fixed,
    /// Hit points restored by one repair command.
    pub repair_amount: u32,
    /// Money charged per hit point repaired.
    pub repair_cost_per_hp: u32,
    /// Percentage of catalog cost refunded on sale.
    pub sell_refund_percent: u32,
    /// Money the player starts with.
    pub starting_money: i32,
    /// World size in world units.
    #[serde(with = "decimal_vec_serde")]
    pub map_size: Vec2Fixed,
    /// Viewport size assumed until the camera reports one.
    #[serde(with = "decimal_vec_serde")]
    pub viewport_size: Vec2Fixed,
    /// Seed for placement and order scatter.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            zone_capture_time: 300,
            mining_rate: 50,
            mining_interval: 600,
            zone_resources: 12_000,
            build_time: 900,
            unit_build_time: 300,
            base_unit_cap: 5,
            unit_cap_per_depot: 5,
            spawn_offset: Vec2Fixed::from_ints(0, 50),
            unit_radius: Fixed::from_num(12),
            building_radius: Fixed::from_num(30),
            start_building_radius: Fixed::from_num(40),
            arrival_threshold: Fixed::from_num(5),
            unit_projectile_speed: Fixed::from_num(10),
            turret_range: Fixed::from_num(150),
            turret_damage: 10,
            turret_cooldown: 20,
            turret_projectile_speed: Fixed::from_num(12),
            placement_min_distance: Fixed::from_num(80),
            placement_max_distance: Fixed::from_num(130),
            selection_margin: Fixed::from_num(5),
            move_dispersion: Fixed::from_num(15),
            repair_amount: 10,
            repair_cost_per_hp: 1,
            sell_refund_percent: 60,
            starting_money: 600,
            map_size: Vec2Fixed::from_ints(2000, 1500),
            viewport_size: Vec2Fixed::from_ints(800, 600),
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Parse a configuration override from a RON document.
    pub fn from_ron_str(label: &str, source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::ron(label, &e))?;
        config.check()?;
        Ok(config)
    }

    /// Reject values that would stall or break the tick loop.
    pub fn check(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.build_time == 0 {
            problems.push("build_time must be at least 1".to_string());
        }
        if self.mining_interval == 0 {
            problems.push("mining_interval must be at least 1".to_string());
        }
        if self.unit_build_time == 0 {
            problems.push("unit_build_time must be at least 1".to_string());
        }
        if self.placement_min_distance < Fixed::ZERO {
            problems.push("placement_min_distance must not be negative".to_string());
        }
        if self.move_dispersion < Fixed::ZERO {
            problems.push("move_dispersion must not be negative".to_string());
        }
        if self.placement_max_distance <= self.placement_min_distance {
            problems.push("placement_max_distance must exceed placement_min_distance".to_string());
        }
        if self.starting_money < 0 {
            problems.push("starting_money must not be negative".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(GameError::DataParseError {
                path: "SimConfig".to_string(),
                message: problems.join("; "),
            })
        }
    }

    /// Money spent by one full repair step; the minimum funds to repair at all.
    #[must_use]
    pub fn repair_step_cost(&self) -> i32 {
        money(self.repair_amount.saturating_mul(self.repair_cost_per_hp))
    }

    /// Refund for selling something with the given catalog cost.
    #[must_use]
    pub fn sell_refund(&self, cost: i32) -> i32 {
        let refund = i64::from(cost.max(0)) * i64::from(self.sell_refund_percent) / 100;
        i32::try_from(refund).unwrap_or(i32::MAX)
    }
}

/// Convert an unsigned quantity to money, saturating.
#[must_use]
pub fn money(amount: u32) -> i32 {
    i32::try_from(amount).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = SimConfig::from_ron_str(
            "inline",
            "SimConfig(mining_interval: 300, move_dispersion: 0.0)",
        )
        .unwrap();
        assert_eq!(config.mining_interval, 300);
        assert_eq!(config.move_dispersion, Fixed::ZERO);
        assert_eq!(config.build_time, 900);
        assert_eq!(config.spawn_offset, Vec2Fixed::from_ints(0, 50));
    }

    #[test]
    fn test_vector_fields_read_as_pairs() {
        let config =
            SimConfig::from_ron_str("inline", "SimConfig(map_size: (1000.0, 500.0))").unwrap();
        assert_eq!(config.map_size, Vec2Fixed::from_ints(1000, 500));
    }

    #[test]
    fn test_zero_durations_rejected() {
        let err = SimConfig::from_ron_str("inline", "SimConfig(build_time: 0)").unwrap_err();
        assert!(err.to_string().contains("build_time"));
    }

    #[test]
    fn test_negative_distances_rejected() {
        let err = SimConfig::from_ron_str(
            "inline",
            "SimConfig(placement_min_distance: -20.0, placement_max_distance: -10.0)",
        )
        .unwrap_err();
        assert!(err.to_string().contains("placement_min_distance"));

        let err =
            SimConfig::from_ron_str("inline", "SimConfig(move_dispersion: -1.0)").unwrap_err();
        assert!(err.to_string().contains("move_dispersion"));
    }

    #[test]
    fn test_sell_refund_floors() {
        let config = SimConfig::default();
        assert_eq!(config.sell_refund(200), 120);
        assert_eq!(config.sell_refund(150), 90);
        assert_eq!(config.sell_refund(55), 33);
        assert_eq!(config.sell_refund(1), 0);
    }

    #[test]
    fn test_repair_step_cost() {
        assert_eq!(SimConfig::default().repair_step_cost(), 10);
    }
}
