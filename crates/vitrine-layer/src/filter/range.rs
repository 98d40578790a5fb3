//! Numeric range facets shared by the price and decimal filters.
//!
//! Buckets have a fixed width. The first one has no lower bound and the last
//! one no upper bound, so together they cover every value. The maximum value
//! that decides the bucket count is a stats facet, cached per layer state and
//! per constraint set.

use vitrine_core::cache::tags;
use vitrine_search::Interval;
use vitrine_search::response::{FacetCounts, format_number, parse_range_label};

use super::FacetItem;
use crate::layer::Layer;
use crate::request::FilterRequest;
use crate::state::FilterItem;

/// Buckets of `width` up to `max`. Nothing when either is not positive.
///
/// A width that would need more than `max_intervals` buckets is replaced by
/// [`improved_width`].
///
/// ```
/// use vitrine_layer::filter::range::price_buckets;
///
/// let buckets = price_buckets(100.0, 25.0, 10);
/// assert_eq!(buckets.len(), 4);
/// assert_eq!(buckets[0].from, None);
/// assert_eq!(buckets[3].to, None);
/// assert!(buckets[3].include_upper);
///
/// assert_eq!(price_buckets(9_999.0, 0.5, 10).len(), 10);
/// ```
pub fn price_buckets(max: f64, width: f64, max_intervals: u32) -> Vec<Interval> {
    if !(max > 0.0 && width > 0.0) {
        return Vec::new();
    }
    let cap = f64::from(max_intervals.max(1));
    let width = if (max / width).ceil() > cap {
        let widened = improved_width(max, max_intervals);
        log::warn!("Range step {width} needs more than {cap} buckets up to {max}, using {widened}");
        widened
    } else {
        width
    };
    let count = (max / width).ceil().max(1.0) as usize;
    (0..count)
        .map(|i| {
            let last = i + 1 == count;
            let from = (i > 0).then(|| i as f64 * width);
            let to = (!last).then(|| (i + 1) as f64 * width);
            Interval::new(from, to, last)
        })
        .collect()
}

/// Power of ten below `max`, widened until at most `max_intervals` buckets
/// remain.
pub fn improved_width(max: f64, max_intervals: u32) -> f64 {
    if !(max >= 1.0) {
        return 1.0;
    }
    let digits = format!("{}", max.floor() as u64).len() as i32;
    let cap = f64::from(max_intervals.max(1));
    let mut width = 10f64.powi(digits - 1);
    while (max / width).ceil() > cap {
        width *= 10.0;
    }
    width
}

/// Parse a `from-to` request value. Either side may be empty, not both.
pub fn parse_interval(value: &str) -> Option<(Option<f64>, Option<f64>)> {
    let (from, to) = value.split_once('-')?;
    let bound = |s: &str| -> Option<Option<f64>> {
        match s.trim() {
            "" => Some(None),
            v => v
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(Some),
        }
    };
    let (from, to) = (bound(from)?, bound(to)?);
    if from.is_none() && to.is_none() {
        return None;
    }
    Some((from, to))
}

/// Interval for a selected range.
///
/// Equal bounds are widened by one cent. The upper bound is inclusive when
/// it is open or reaches `max`.
pub fn selected_interval(from: Option<f64>, to: Option<f64>, max: f64) -> Interval {
    let to = match (from, to) {
        (Some(from), Some(to)) if from == to => Some(to + 0.01),
        _ => to,
    };
    let include_upper = to.is_none_or(|to| to >= max);
    Interval::new(from, to, include_upper)
}

/// Request value of a range: `from-to`.
pub fn interval_value(from: Option<f64>, to: Option<f64>) -> String {
    format!("{}-{}", render(from), render(to))
}

/// Display text of a range.
pub fn interval_label(from: Option<f64>, to: Option<f64>) -> String {
    match to {
        None => format!("{} and above", render(Some(from.unwrap_or(0.0)))),
        Some(to) => format!("{} - {}", render(Some(from.unwrap_or(0.0))), format_number(to)),
    }
}

/// Items of the non-empty range buckets.
///
/// The last item is left open above, unless it is also open below.
pub fn items_from_counts(counts: &FacetCounts) -> Vec<FacetItem> {
    let mut ranges: Vec<(Option<f64>, Option<f64>, u64)> = counts
        .iter()
        .filter(|bucket| bucket.count > 0)
        .filter_map(|bucket| {
            parse_range_label(&bucket.key).map(|(from, to)| (from, to, bucket.count))
        })
        .collect();
    if let Some(last) = ranges.last_mut()
        && last.0.is_some()
    {
        last.1 = None;
    }
    ranges
        .into_iter()
        .map(|(from, to, count)| FacetItem::new(interval_label(from, to), interval_value(from, to), count))
        .collect()
}

/// Largest value of `field` under the layer's constraints.
///
/// Falls back to the configured default when the statistic is missing.
pub(crate) async fn max_value(layer: &Layer, field: &str) -> f64 {
    let key = match layer.params().without_facets().search_params_digest() {
        Ok(digest) => Some(format!(
            "{}_{}_{}_{}",
            tags::MAXPRICE,
            field,
            layer.state_key(),
            digest
        )),
        Err(e) => {
            log::warn!("Cannot digest search parameters: {e}");
            None
        }
    };

    if let Some(key) = &key
        && let Some(max) = layer.cache_data::<f64>(key).await
    {
        return max;
    }

    let max = layer
        .stats(field)
        .await
        .and_then(|stats| stats.max)
        .filter(|max| max.is_finite())
        .unwrap_or(layer.config().default_max_price);

    if let Some(key) = key {
        let tags = layer.state_tags(&[tags::MAXPRICE.to_string()]);
        layer.save_cache_data(&key, &max, &tags).await;
    }
    max
}

/// Apply a `from-to` selection of `request_var` to `field`.
pub(crate) async fn apply_range(
    layer: &mut Layer,
    field: &str,
    request_var: &str,
    request: &FilterRequest,
) -> Option<Interval> {
    let raw = request.single(request_var)?;
    let Some((from, to)) = parse_interval(raw) else {
        log::debug!("Ignoring invalid range '{raw}' for {request_var}");
        return None;
    };

    let max = max_value(layer, field).await;
    let interval = selected_interval(from, to, max);
    layer.add_range_filter(field, interval);
    layer.add_state_item(FilterItem::new(interval_label(from, to), request_var, raw));
    Some(interval)
}

fn render(bound: Option<f64>) -> String {
    bound.map(format_number).unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
