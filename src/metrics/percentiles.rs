use std::collections::HashMap;

use super::{round3, AggregatedMetric, MetricSample};

/// Percentile ranks reported for every metric.
const P50: f64 = 0.50;
const P75: f64 = 0.75;
const P95: f64 = 0.95;
const P99: f64 = 0.99;

/// Group raw samples by metric name and summarize each group.
/// Output order follows first appearance; the caller re-sorts.
pub fn aggregate(samples: &[MetricSample]) -> Vec<AggregatedMetric> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();

    for sample in samples {
        let values = groups.entry(sample.metric_name.as_str()).or_insert_with(|| {
            order.push(sample.metric_name.as_str());
            Vec::new()
        });
        values.push(sample.value);
    }

    order
        .into_iter()
        .map(|name| {
            let mut values = groups.remove(name).unwrap_or_default();
            summarize(name, &mut values)
        })
        .collect()
}

/// Sort `values` ascending and extract the full statistic set.
/// Returns the all-null summary if `values` is empty.
pub fn summarize(metric: &str, values: &mut [f64]) -> AggregatedMetric {
    if values.is_empty() {
        return AggregatedMetric::empty(metric);
    }

    values.sort_by(f64::total_cmp);

    let n = values.len();
    let sum: f64 = values.iter().sum();

    AggregatedMetric {
        metric: metric.to_owned(),
        count: n as u64,
        min: Some(round3(values[0])),
        max: Some(round3(values[n - 1])),
        avg: Some(round3(sum / n as f64)),
        p50: Some(round3(nearest_rank(values, P50))),
        p75: Some(round3(nearest_rank(values, P75))),
        p95: Some(round3(nearest_rank(values, P95))),
        p99: Some(round3(nearest_rank(values, P99))),
    }
}

/// Nearest-rank-floor selection over an ascending, non-empty slice:
/// `values[min(n - 1, floor(p * (n - 1)))]`. Never interpolates.
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let last = sorted.len() - 1;
    let index = ((p * last as f64).floor() as usize).min(last);
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn samples(metric: &str, values: &[f64]) -> Vec<MetricSample> {
        let now = Utc::now();
        values
            .iter()
            .map(|&v| MetricSample::new(metric, v, now))
            .collect()
    }

    #[test]
    fn three_values_pick_observed_ranks() {
        let out = aggregate(&samples("LCP", &[3000.0, 2000.0, 2500.0]));
        assert_eq!(out.len(), 1);

        let lcp = &out[0];
        assert_eq!(lcp.count, 3);
        assert_eq!(lcp.min, Some(2000.0));
        assert_eq!(lcp.max, Some(3000.0));
        assert_eq!(lcp.avg, Some(2500.0));
        assert_eq!(lcp.p50, Some(2500.0));
        assert_eq!(lcp.p75, Some(2500.0));
        assert_eq!(lcp.p95, Some(2500.0));
        assert_eq!(lcp.p99, Some(2500.0));
    }

    #[test]
    fn single_value_fills_every_statistic() {
        let out = aggregate(&samples("TTFB", &[412.5]));
        let ttfb = &out[0];
        assert_eq!(ttfb.count, 1);
        for stat in [ttfb.min, ttfb.max, ttfb.avg, ttfb.p50, ttfb.p75, ttfb.p95, ttfb.p99] {
            assert_eq!(stat, Some(412.5));
        }
    }

    #[test]
    fn hundred_values_use_floor_rank() {
        // 1..=100: index = floor(p * 99)
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let out = aggregate(&samples("INP", &values));
        let inp = &out[0];
        assert_eq!(inp.p50, Some(50.0));
        assert_eq!(inp.p75, Some(75.0));
        assert_eq!(inp.p95, Some(95.0));
        assert_eq!(inp.p99, Some(99.0));
        assert_eq!(inp.avg, Some(50.5));
    }

    #[test]
    fn percentiles_are_monotonic() {
        let values = [0.31, 0.02, 0.9, 0.11, 0.05, 0.44, 0.27, 0.6, 0.08, 0.19, 0.73];
        let out = aggregate(&samples("CLS", &values));
        let m = &out[0];
        let chain = [m.min, m.p50, m.p75, m.p95, m.p99, m.max].map(Option::unwrap);
        assert!(chain.windows(2).all(|w| w[0] <= w[1]), "{chain:?}");
        let avg = m.avg.unwrap();
        assert!(chain[0] <= avg && avg <= chain[5]);
    }

    #[test]
    fn groups_by_metric_name() {
        let mut input = samples("CLS", &[0.1, 0.2]);
        input.extend(samples("LCP", &[1800.0]));
        input.extend(samples("CLS", &[0.3]));

        let out = aggregate(&input);
        assert_eq!(out.len(), 2);
        let cls = out.iter().find(|m| m.metric == "CLS").unwrap();
        assert_eq!(cls.count, 3);
        assert_eq!(cls.min, Some(0.1));
        assert_eq!(cls.max, Some(0.3));
        assert_eq!(cls.avg, Some(0.2));
    }

    #[test]
    fn empty_group_is_all_null() {
        let m = summarize("FCP", &mut []);
        assert_eq!(m, AggregatedMetric::empty("FCP"));
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn values_are_rounded_to_three_places() {
        let out = aggregate(&samples("CLS", &[0.123_44, 0.123_41]));
        assert_eq!(out[0].min, Some(0.123));
        assert_eq!(out[0].max, Some(0.123));
    }
}
