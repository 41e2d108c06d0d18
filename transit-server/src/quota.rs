//! Daily API call budget.
//!
//! The transit data service grants a fixed number of calls per day. Every
//! external call reserves units here first; a reservation either covers the
//! whole request or fails without consuming anything.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

/// Usage for the current day.
#[derive(Debug)]
struct QuotaState {
    day: NaiveDate,
    used: u64,
}

/// Process-wide daily call counter.
///
/// Check-and-increment happens under one lock, so concurrent callers can
/// never overshoot the ceiling.
#[derive(Debug)]
pub struct ApiQuotaManager {
    daily_limit: u64,
    state: Mutex<QuotaState>,
}

impl ApiQuotaManager {
    /// Create a manager with `daily_limit` calls per local calendar day.
    pub fn new(daily_limit: u64) -> Self {
        Self::starting_on(daily_limit, Local::now().date_naive())
    }

    /// Create a manager whose current day is `today`.
    pub fn starting_on(daily_limit: u64, today: NaiveDate) -> Self {
        Self {
            daily_limit,
            state: Mutex::new(QuotaState {
                day: today,
                used: 0,
            }),
        }
    }

    pub fn daily_limit(&self) -> u64 {
        self.daily_limit
    }

    /// Reserve `n` calls for today. Returns whether the reservation succeeded.
    pub fn try_consume(&self, n: u64) -> bool {
        self.try_consume_on(n, Local::now().date_naive())
    }

    /// Reserve `n` calls on `today`.
    pub fn try_consume_on(&self, n: u64, today: NaiveDate) -> bool {
        let mut state = self.lock_for(today);
        let remaining = self.daily_limit.saturating_sub(state.used);
        if n > remaining {
            return false;
        }
        state.used += n;
        true
    }

    /// Calls left today.
    pub fn remaining_today(&self) -> u64 {
        self.remaining_on(Local::now().date_naive())
    }

    pub fn remaining_on(&self, today: NaiveDate) -> u64 {
        let state = self.lock_for(today);
        self.daily_limit.saturating_sub(state.used)
    }

    /// Calls used today.
    pub fn used_today(&self) -> u64 {
        self.used_on(Local::now().date_naive())
    }

    pub fn used_on(&self, today: NaiveDate) -> u64 {
        self.lock_for(today).used.min(self.daily_limit)
    }

    /// Treat today's budget as spent, e.g. because the service said so.
    pub fn mark_exhausted(&self) {
        self.mark_exhausted_on(Local::now().date_naive());
    }

    pub fn mark_exhausted_on(&self, today: NaiveDate) {
        let mut state = self.lock_for(today);
        if state.used < self.daily_limit {
            warn!(
                used = state.used,
                limit = self.daily_limit,
                "transit API reported over quota; budget closed for the day"
            );
        }
        state.used = self.daily_limit;
    }

    /// Lock the state, resetting usage if `today` is past the stored day.
    ///
    /// A clock that moves backwards never resets the counter.
    fn lock_for(&self, today: NaiveDate) -> MutexGuard<'_, QuotaState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if today > state.day {
            info!(previous = %state.day, used = state.used, "daily API budget reset");
            state.day = today;
            state.used = 0;
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn reservations_against_ceiling() {
        let quota = ApiQuotaManager::starting_on(10, day(1));

        for _ in 0..9 {
            assert!(quota.try_consume_on(1, day(1)));
        }
        assert!(!quota.try_consume_on(2, day(1)));
        assert_eq!(quota.remaining_on(day(1)), 1);
        assert_eq!(quota.used_on(day(1)), 9);

        assert!(quota.try_consume_on(1, day(1)));
        assert_eq!(quota.remaining_on(day(1)), 0);
        assert!(!quota.try_consume_on(1, day(1)));
    }

    #[test]
    fn zero_reservation_always_succeeds() {
        let quota = ApiQuotaManager::starting_on(0, day(1));
        assert!(quota.try_consume_on(0, day(1)));
        assert!(!quota.try_consume_on(1, day(1)));
    }

    #[test]
    fn resets_when_date_advances() {
        let quota = ApiQuotaManager::starting_on(5, day(1));
        assert!(quota.try_consume_on(5, day(1)));
        assert_eq!(quota.remaining_on(day(1)), 0);

        assert_eq!(quota.remaining_on(day(2)), 5);
        assert!(quota.try_consume_on(3, day(2)));
        assert_eq!(quota.remaining_on(day(2)), 2);
    }

    #[test]
    fn earlier_date_does_not_reset() {
        let quota = ApiQuotaManager::starting_on(5, day(2));
        assert!(quota.try_consume_on(4, day(2)));
        assert_eq!(quota.remaining_on(day(1)), 1);
    }

    #[test]
    fn mark_exhausted_until_rollover() {
        let quota = ApiQuotaManager::starting_on(100, day(1));
        assert!(quota.try_consume_on(3, day(1)));

        quota.mark_exhausted_on(day(1));
        assert_eq!(quota.remaining_on(day(1)), 0);
        assert!(!quota.try_consume_on(1, day(1)));

        assert_eq!(quota.remaining_on(day(2)), 100);
    }

    #[test]
    fn concurrent_reservations_never_overshoot() {
        let quota = Arc::new(ApiQuotaManager::starting_on(1000, day(1)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let quota = quota.clone();
                std::thread::spawn(move || {
                    (0..500).filter(|_| quota.try_consume_on(1, day(1))).count()
                })
            })
            .collect();

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 1000);
        assert_eq!(quota.remaining_on(day(1)), 0);
    }
}
