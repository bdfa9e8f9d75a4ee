//! User credit histogram.
//!
//! Users are bucketed by `exp` on fixed half-open ranges
//! `[0,100) [100,500) [500,1000) [1000,2000) [2000,3000) [3000,5000)`.
//! Missing values and values outside every range land in the default
//! "not checked in" bucket, so each user is counted exactly once.
//!
//! [`bucket_for`] is the reference mapping. The PostgreSQL query is generated
//! from the same boundary table by [`bucket_case_sql`].

use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Ascending bucket boundaries; bucket `i` is `[B[i], B[i+1])`.
pub const CREDIT_BOUNDARIES: [i64; 7] = [0, 100, 500, 1000, 2000, 3000, 5000];

/// Label of the overflow bucket.
pub const NOT_CHECKED_IN: &str = "not_checked_in";

/// Bucket identity: the lower bound of a range, or the default bucket.
///
/// Ordering puts every bounded bucket (ascending) before the default bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketLabel {
    LowerBound(i64),
    NotCheckedIn,
}

impl Serialize for BucketLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BucketLabel::LowerBound(lb) => serializer.serialize_i64(*lb),
            BucketLabel::NotCheckedIn => serializer.serialize_str(NOT_CHECKED_IN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBucket {
    pub bucket_lower_bound: BucketLabel,
    pub count: i64,
}

/// Map one `exp` value to its bucket.
pub fn bucket_for(exp: Option<i64>) -> BucketLabel {
    let Some(exp) = exp else {
        return BucketLabel::NotCheckedIn;
    };
    CREDIT_BOUNDARIES
        .windows(2)
        .find(|range| exp >= range[0] && exp < range[1])
        .map(|range| BucketLabel::LowerBound(range[0]))
        .unwrap_or(BucketLabel::NotCheckedIn)
}

/// Count values per bucket. Only non-empty buckets are returned, in label order.
pub fn build_histogram<I>(values: I) -> Vec<CreditBucket>
where
    I: IntoIterator<Item = Option<i64>>,
{
    let mut counts: BTreeMap<BucketLabel, i64> = BTreeMap::new();
    for exp in values {
        *counts.entry(bucket_for(exp)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(bucket_lower_bound, count)| CreditBucket {
            bucket_lower_bound,
            count,
        })
        .collect()
}

/// SQL `CASE` expression yielding the bucket lower bound for `column`, or
/// `NULL` for the default bucket.
pub fn bucket_case_sql(column: &str) -> String {
    let mut sql = String::from("CASE");
    for range in CREDIT_BOUNDARIES.windows(2) {
        let _ = write!(
            sql,
            " WHEN {column} >= {lo} AND {column} < {hi} THEN {lo}",
            lo = range[0],
            hi = range[1]
        );
    }
    sql.push_str(" ELSE NULL END");
    sql
}

/// Convert a `(bucket, count)` row from the store, where `None` is the default bucket.
pub(crate) fn bucket_from_row(bucket: Option<i64>, count: i64) -> CreditBucket {
    CreditBucket {
        bucket_lower_bound: bucket.map_or(BucketLabel::NotCheckedIn, BucketLabel::LowerBound),
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_map_to_their_own_bucket() {
        assert_eq!(bucket_for(Some(0)), BucketLabel::LowerBound(0));
        assert_eq!(bucket_for(Some(99)), BucketLabel::LowerBound(0));
        assert_eq!(bucket_for(Some(100)), BucketLabel::LowerBound(100));
        assert_eq!(bucket_for(Some(499)), BucketLabel::LowerBound(100));
        assert_eq!(bucket_for(Some(500)), BucketLabel::LowerBound(500));
        assert_eq!(bucket_for(Some(1999)), BucketLabel::LowerBound(1000));
        assert_eq!(bucket_for(Some(3000)), BucketLabel::LowerBound(3000));
        assert_eq!(bucket_for(Some(4999)), BucketLabel::LowerBound(3000));
    }

    #[test]
    fn out_of_range_and_missing_go_to_default() {
        assert_eq!(bucket_for(Some(5000)), BucketLabel::NotCheckedIn);
        assert_eq!(bucket_for(Some(-1)), BucketLabel::NotCheckedIn);
        assert_eq!(bucket_for(Some(i64::MAX)), BucketLabel::NotCheckedIn);
        assert_eq!(bucket_for(None), BucketLabel::NotCheckedIn);
    }

    #[test]
    fn histogram_orders_default_bucket_last() {
        let result = build_histogram(vec![None, Some(700), Some(5), Some(9000), Some(12)]);
        assert_eq!(
            result,
            vec![
                CreditBucket {
                    bucket_lower_bound: BucketLabel::LowerBound(0),
                    count: 2
                },
                CreditBucket {
                    bucket_lower_bound: BucketLabel::LowerBound(500),
                    count: 1
                },
                CreditBucket {
                    bucket_lower_bound: BucketLabel::NotCheckedIn,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        assert!(build_histogram(Vec::<Option<i64>>::new()).is_empty());
    }

    #[test]
    fn bucket_serializes_as_number_or_label() {
        let json = serde_json::to_value(build_histogram(vec![Some(150), None])).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"bucketLowerBound": 100, "count": 1},
                {"bucketLowerBound": "not_checked_in", "count": 1},
            ])
        );
    }

    #[test]
    fn case_sql_covers_every_range() {
        let sql = bucket_case_sql("exp");
        assert!(sql.starts_with("CASE WHEN exp >= 0 AND exp < 100 THEN 0"));
        assert!(sql.contains("WHEN exp >= 3000 AND exp < 5000 THEN 3000"));
        assert!(sql.ends_with("ELSE NULL END"));
        assert_eq!(sql.matches("WHEN").count(), CREDIT_BOUNDARIES.len() - 1);
    }

    #[test]
    fn row_conversion_maps_null_to_default() {
        assert_eq!(bucket_from_row(None, 3).bucket_lower_bound, BucketLabel::NotCheckedIn);
        assert_eq!(
            bucket_from_row(Some(1000), 3).bucket_lower_bound,
            BucketLabel::LowerBound(1000)
        );
    }
}
