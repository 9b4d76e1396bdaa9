use core_types::PropertyRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::report::PriceEstimate;

/// Comparables are capped to the most recent records matching the query.
pub const COMPARABLE_LIMIT: i64 = 20;

/// Below this many samples a decile trim would bite into real data (or empty
/// the slice outright), so the full sorted range is used instead.
const TRIM_MIN_SAMPLES: usize = 10;

const BAND_LOWER: Decimal = dec!(0.8);
const BAND_UPPER: Decimal = dec!(1.2);

/// The ±20% area band used to select comparables around a target size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBand {
    pub min_area: Decimal,
    pub max_area: Decimal,
}

impl SizeBand {
    pub fn around(target_area: Decimal) -> Self {
        Self {
            min_area: target_area * BAND_LOWER,
            max_area: target_area * BAND_UPPER,
        }
    }

    pub fn contains(&self, area: Decimal) -> bool {
        area >= self.min_area && area <= self.max_area
    }
}

/// A stateless calculator turning a recency-ordered comparable set into a
/// price-per-hectare range.
#[derive(Debug, Default)]
pub struct PriceEstimator {}

impl PriceEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimates a price range from comparables ordered most-recent-first.
    ///
    /// Each comparable at rank `i` carries weight `1/(i+1)`, so the newest
    /// sale dominates the weighted average. The reported range is the
    /// min/max of the price-per-hectare distribution after trimming the
    /// lowest and highest deciles.
    ///
    /// Records with a non-positive area or negative price are dropped before
    /// ranking; an entirely-empty comparable set yields a zeroed estimate
    /// with an explanatory message rather than an error.
    pub fn estimate(&self, comparables: &[PropertyRecord], location: &str) -> PriceEstimate {
        let prices_per_area: Vec<Decimal> = comparables
            .iter()
            .filter(|p| p.is_valid_comparable())
            .filter_map(|p| p.price_per_area())
            .collect();

        if prices_per_area.is_empty() {
            return PriceEstimate::empty(format!(
                "No comparable sold properties found in {location}. \
                 Try adjusting the target size or removing filters."
            ));
        }

        let n = prices_per_area.len();

        let mut weighted_sum = Decimal::ZERO;
        let mut weight_sum = Decimal::ZERO;
        for (rank, price) in prices_per_area.iter().enumerate() {
            let weight = Decimal::ONE / Decimal::from(rank as u64 + 1);
            weighted_sum += price * weight;
            weight_sum += weight;
        }
        let weighted_average = weighted_sum / weight_sum;

        let mut sorted = prices_per_area;
        sorted.sort();

        let (min, max) = if n >= TRIM_MIN_SAMPLES {
            // Keep [floor(n*0.1), floor(n*0.9)); never empty for n >= 10.
            let trimmed = &sorted[n / 10..(n * 9) / 10];
            (trimmed[0], trimmed[trimmed.len() - 1])
        } else {
            (sorted[0], sorted[n - 1])
        };

        PriceEstimate {
            min,
            max,
            count: n,
            weighted_average,
            message: format!(
                "Estimate based on {n} comparable sold properties in {location}."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::PropertyStatus;
    use uuid::Uuid;

    fn comparable(price: Decimal, area: Decimal) -> PropertyRecord {
        PropertyRecord {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            title: "Bottomland parcel".to_string(),
            location: "Nakuru".to_string(),
            price,
            area,
            status: PropertyStatus::Sold,
            water_source: None,
            soil_quality: None,
            classification: None,
            suitable_crops: vec![],
            image_urls: vec![],
            posted_at: Utc::now(),
            view_count: 0,
            inquiry_count: 0,
        }
    }

    #[test]
    fn size_band_is_twenty_percent_each_way() {
        let band = SizeBand::around(dec!(10));
        assert_eq!(band.min_area, dec!(8.0));
        assert_eq!(band.max_area, dec!(12.0));
        assert!(band.contains(dec!(8)));
        assert!(band.contains(dec!(12)));
        assert!(!band.contains(dec!(7.99)));
    }

    #[test]
    fn empty_comparable_set_yields_zeroed_estimate() {
        let estimate = PriceEstimator::new().estimate(&[], "Nakuru");
        assert_eq!(estimate.min, Decimal::ZERO);
        assert_eq!(estimate.max, Decimal::ZERO);
        assert_eq!(estimate.count, 0);
        assert_eq!(estimate.weighted_average, Decimal::ZERO);
        assert!(estimate.message.contains("No comparable"));
    }

    #[test]
    fn recency_weighting_pulls_average_toward_newest() {
        // Price-per-hectare 100 (newest) and 400 (oldest): weights 1 and 1/2,
        // so the weighted average is (100 + 200) / 1.5 = 200, well under the
        // arithmetic mean of 250.
        let comps = vec![comparable(dec!(100), dec!(1)), comparable(dec!(400), dec!(1))];
        let estimate = PriceEstimator::new().estimate(&comps, "Nakuru");
        assert_eq!(estimate.weighted_average, dec!(200));
    }

    #[test]
    fn small_sets_use_the_full_untrimmed_range() {
        let comps = vec![
            comparable(dec!(1000000), dec!(5)),
            comparable(dec!(1200000), dec!(5)),
            comparable(dec!(1100000), dec!(5)),
        ];
        let estimate = PriceEstimator::new().estimate(&comps, "Nakuru");
        assert_eq!(estimate.count, 3);
        assert_eq!(estimate.min, dec!(200000));
        assert_eq!(estimate.max, dec!(240000));
    }

    #[test]
    fn decile_trim_discards_outliers_for_large_sets() {
        // Nine mid-range samples plus one far outlier at each end.
        let mut comps = vec![comparable(dec!(1), dec!(1))];
        for _ in 0..9 {
            comps.push(comparable(dec!(500), dec!(1)));
        }
        comps.push(comparable(dec!(100000), dec!(1)));
        let estimate = PriceEstimator::new().estimate(&comps, "Nakuru");
        assert_eq!(estimate.count, 11);
        assert_eq!(estimate.min, dec!(500));
        assert_eq!(estimate.max, dec!(500));
    }

    #[test]
    fn weighted_average_falls_within_trimmed_range() {
        let comps: Vec<PropertyRecord> = (1..=12)
            .map(|i| comparable(Decimal::from(i * 100), dec!(1)))
            .collect();
        let estimate = PriceEstimator::new().estimate(&comps, "Nakuru");
        assert!(estimate.count >= 10);
        assert!(estimate.min <= estimate.weighted_average);
        assert!(estimate.weighted_average <= estimate.max);
    }

    #[test]
    fn invalid_records_are_excluded_before_ranking() {
        let comps = vec![
            comparable(dec!(100), Decimal::ZERO),
            comparable(dec!(300), dec!(1)),
        ];
        let estimate = PriceEstimator::new().estimate(&comps, "Nakuru");
        assert_eq!(estimate.count, 1);
        assert_eq!(estimate.min, dec!(300));
        assert_eq!(estimate.max, dec!(300));
        assert_eq!(estimate.weighted_average, dec!(300));
    }
}
