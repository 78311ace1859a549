//! Date arithmetic behind the booking rules: stays, nightly occupancy and pricing.

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

/// A half-open stay `[check_in, check_out)`: the guest occupies every night
/// from check-in up to, but not including, check-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> AppResult<Self> {
        if check_in >= check_out {
            return Err(AppError::BadRequest(
                "Check-out date must be after check-in date".into(),
            ));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &Stay) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

/// The largest number of `booked` stays that share any single night of `window`.
pub fn peak_occupancy(window: &Stay, booked: &[Stay]) -> u32 {
    let mut events: Vec<(NaiveDate, i32)> = booked
        .iter()
        .filter(|stay| stay.overlaps(window))
        .flat_map(|stay| {
            [
                (stay.check_in.max(window.check_in), 1),
                (stay.check_out.min(window.check_out), -1),
            ]
        })
        .collect();
    // Departures sort before arrivals on the same day.
    events.sort();

    let mut current = 0i32;
    let mut peak = 0i32;
    for (_, delta) in events {
        current += delta;
        peak = peak.max(current);
    }
    peak as u32
}

/// Whether one more stay over `window` fits in `capacity` units.
pub fn has_vacancy(window: &Stay, booked: &[Stay], capacity: u32) -> bool {
    peak_occupancy(window, booked) < capacity
}

/// `nights × nightly_price × (1 + tax_rate)`, rounded to cents.
pub fn total_price(stay: &Stay, nightly_price: f64, tax_rate: f64) -> f64 {
    round2(stay.nights() as f64 * nightly_price * (1.0 + tax_rate))
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn stay(from: u32, to: u32) -> Stay {
        Stay::new(day(from), day(to)).unwrap()
    }

    #[test]
    fn test_stay_requires_check_in_before_check_out() {
        assert!(Stay::new(day(5), day(5)).is_err());
        assert!(Stay::new(day(6), day(5)).is_err());
        assert_eq!(stay(5, 8).nights(), 3);
    }

    #[test]
    fn test_back_to_back_stays_do_not_overlap() {
        assert!(!stay(1, 3).overlaps(&stay(3, 5)));
        assert!(stay(1, 4).overlaps(&stay(3, 5)));
        assert_eq!(peak_occupancy(&stay(3, 5), &[stay(1, 3), stay(5, 7)]), 0);
    }

    #[test]
    fn test_peak_counts_nights_not_overlapping_bookings() {
        // Two short stays inside the window never share a night.
        let booked = [stay(1, 2), stay(3, 4)];
        assert_eq!(peak_occupancy(&stay(1, 5), &booked), 1);
        assert!(has_vacancy(&stay(1, 5), &booked, 2));
        assert!(!has_vacancy(&stay(1, 5), &booked, 1));
    }

    #[test]
    fn test_peak_with_nested_stays() {
        let booked = [stay(1, 10), stay(2, 4), stay(3, 6), stay(8, 9)];
        assert_eq!(peak_occupancy(&stay(1, 10), &booked), 3);
        assert_eq!(peak_occupancy(&stay(6, 10), &booked), 2);
    }

    #[test]
    fn test_total_price_applies_tax() {
        assert_eq!(total_price(&stay(1, 4), 100.0, 0.13), 339.0);
        assert_eq!(total_price(&stay(1, 2), 99.99, 0.0), 99.99);
        assert_eq!(total_price(&stay(1, 3), 10.005, 0.05), 21.01);
    }
}
