//! Planner configuration.

/// Configuration parameters for graph building and journey search.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Assumed walking speed (km/h) for snap and transfer edges.
    pub walk_speed_kmh: f64,

    /// Assumed light-rail line speed (km/h).
    pub rail_speed_kmh: f64,

    /// Maximum distance (meters) between a rail station and a bus stop for
    /// a transfer walk to be generated.
    pub transfer_radius_m: f64,

    /// Time added to every boarding after the first (minutes).
    pub transfer_penalty_mins: f64,

    /// Upper bound applied to the requested transfer count.
    /// The search state space grows linearly with it.
    pub max_transfers_cap: u32,

    /// Maximum number of states the search may settle before giving up
    /// on the remaining ride-count buckets.
    pub max_settled_states: usize,
}

impl PlannerConfig {
    /// Ride cap for a requested transfer count: zero transfers is exactly
    /// one ride. Negative requests count as zero and large ones are capped.
    pub fn max_rides(&self, requested_transfers: i64) -> u32 {
        let transfers = requested_transfers.clamp(0, i64::from(self.max_transfers_cap));
        transfers as u32 + 1
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            walk_speed_kmh: 4.5,
            rail_speed_kmh: 35.0,
            transfer_radius_m: 500.0,
            transfer_penalty_mins: 5.0,
            max_transfers_cap: 5,
            max_settled_states: 500_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.walk_speed_kmh, 4.5);
        assert_eq!(config.rail_speed_kmh, 35.0);
        assert_eq!(config.transfer_radius_m, 500.0);
        assert_eq!(config.transfer_penalty_mins, 5.0);
        assert_eq!(config.max_transfers_cap, 5);
        assert_eq!(config.max_settled_states, 500_000);
    }

    #[test]
    fn max_rides_clamps() {
        let config = PlannerConfig::default();

        assert_eq!(config.max_rides(0), 1);
        assert_eq!(config.max_rides(2), 3);
        assert_eq!(config.max_rides(-3), 1);
        assert_eq!(config.max_rides(1_000), 6);
    }
}
