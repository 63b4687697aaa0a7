use num_format::{Locale, ToFormattedString};
use std::collections::VecDeque;
use std::time::Duration;

/// Transactions per second; anything faster than a millisecond counts as one.
#[must_use]
pub fn tps(transactions: u64, elapsed: Duration) -> u64 {
    let millis = elapsed.as_millis().max(1);
    u64::try_from(u128::from(transactions) * 1_000 / millis).unwrap_or(u64::MAX)
}

/// `1234567` as `1,234,567`
#[must_use]
pub fn format_count(count: u64) -> String {
    count.to_formatted_string(&Locale::en)
}

/// Rate of the latest lap and the rolling average over the most recent laps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lap {
    pub rate: u64,
    pub average: u64,
    pub window_transactions: u64,
    pub window_elapsed: Duration,
}

/// Fixed-size window of the most recent laps
#[derive(Debug)]
pub struct LapWindow {
    capacity: usize,
    laps: VecDeque<(u64, Duration)>,
}

impl LapWindow {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            laps: VecDeque::new(),
        }
    }

    /// Window averaging over `average` transactions when a lap is taken
    /// every `lap` transactions.
    #[must_use]
    pub fn for_rates(lap: u64, average: u64) -> Self {
        let capacity = average / lap.max(1);
        Self::new(usize::try_from(capacity).unwrap_or(usize::MAX))
    }

    pub fn push(&mut self, transactions: u64, elapsed: Duration) -> Lap {
        if self.laps.len() == self.capacity {
            let _ = self.laps.pop_front();
        }
        self.laps.push_back((transactions, elapsed));

        let window_transactions = self.laps.iter().map(|(transactions, _)| transactions).sum();
        let window_elapsed = self.laps.iter().map(|(_, elapsed)| *elapsed).sum();
        Lap {
            rate: tps(transactions, elapsed),
            average: tps(window_transactions, window_elapsed),
            window_transactions,
            window_elapsed,
        }
    }
}
