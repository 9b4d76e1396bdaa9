use core_types::SellerWindowStats;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::trends::round_whole;

/// Length of the trailing comparison windows: events in the last 30 days are
/// "recent", events 30 to 60 days old are "previous".
pub const TREND_WINDOW_DAYS: i64 = 30;

/// Period-over-period trend percentages for one seller's metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerTrends {
    pub views_trend: String,
    pub inquiries_trend: String,
    pub time_to_sale_trend: String,
}

impl SellerTrends {
    /// Derives the trend strings from the two window aggregates.
    pub fn from_windows(recent: &SellerWindowStats, previous: &SellerWindowStats) -> Self {
        Self {
            views_trend: calculate_trend(
                Decimal::from(recent.views),
                Decimal::from(previous.views),
            ),
            inquiries_trend: calculate_trend(
                Decimal::from(recent.inquiries),
                Decimal::from(previous.inquiries),
            ),
            // The time-to-sale trend reads its windows in the opposite order
            // to the engagement trends. Callers depend on this orientation.
            time_to_sale_trend: calculate_trend(
                previous.avg_sale_days(),
                recent.avg_sale_days(),
            ),
        }
    }
}

/// Formats the period-over-period change as a signed percentage string.
///
/// With an empty previous window the ratio is undefined: the trend is
/// reported as "100%" when the recent window has activity and "0%" otherwise.
pub fn calculate_trend(recent: Decimal, previous: Decimal) -> String {
    if previous.is_zero() {
        return if recent > Decimal::ZERO {
            "100%".to_string()
        } else {
            "0%".to_string()
        };
    }
    let pct = round_whole((recent - previous) / previous * Decimal::from(100));
    if pct >= 0 {
        format!("+{pct}%")
    } else {
        format!("{pct}%")
    }
}

/// Folds a new sale duration into a seller's stored average.
///
/// The first sale sets the average outright; afterwards the stored value is
/// the rounded mean of the previous average and the new duration only. This
/// is a last-two-samples average, not a cumulative mean over all sales.
pub fn fold_time_to_sale(current: Option<i64>, days_to_sale: i64) -> i64 {
    match current {
        None => days_to_sale,
        Some(avg) => round_whole(Decimal::from(avg + days_to_sale) / Decimal::from(2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn trend_against_empty_previous_window() {
        assert_eq!(calculate_trend(dec!(5), Decimal::ZERO), "100%");
        assert_eq!(calculate_trend(Decimal::ZERO, Decimal::ZERO), "0%");
    }

    #[test]
    fn trend_is_signed_and_rounded() {
        assert_eq!(calculate_trend(dec!(15), dec!(10)), "+50%");
        assert_eq!(calculate_trend(dec!(10), dec!(15)), "-33%");
        assert_eq!(calculate_trend(dec!(10), dec!(10)), "+0%");
        assert_eq!(calculate_trend(Decimal::ZERO, dec!(4)), "-100%");
    }

    #[test]
    fn time_to_sale_trend_uses_transposed_windows() {
        let recent = SellerWindowStats {
            views: 10,
            inquiries: 1,
            sales: 1,
            total_sale_days: 20,
        };
        let previous = SellerWindowStats {
            views: 5,
            inquiries: 2,
            sales: 1,
            total_sale_days: 40,
        };
        let trends = SellerTrends::from_windows(&recent, &previous);
        assert_eq!(trends.views_trend, "+100%");
        assert_eq!(trends.inquiries_trend, "-50%");
        // previous average 40 moving to recent average 20, read as
        // (recent=40, previous=20): (40 - 20) / 20 = +100%.
        assert_eq!(trends.time_to_sale_trend, "+100%");
    }

    #[test]
    fn sale_fold_averages_the_last_two_samples() {
        assert_eq!(fold_time_to_sale(None, 60), 60);
        assert_eq!(fold_time_to_sale(Some(40), 60), 50);
        assert_eq!(fold_time_to_sale(Some(40), 61), 51); // 50.5 rounds away from zero
        assert_eq!(fold_time_to_sale(Some(0), 0), 0);
    }
}
