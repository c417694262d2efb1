use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{IntervalSet, Resource, ResourceId};

use super::TimelineWindow;

/// Operator-controlled row filters. The default shows every resource in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceFilter {
    /// Case-insensitive substring on label or category.
    pub text: String,
    pub category: Option<String>,
    /// Resource must carry every listed feature.
    pub features: Vec<String>,
    /// Sort rows by `(category, label)` instead of source order.
    pub group_by_category: bool,
    /// Hide resources with an occupying booking anywhere in the window.
    pub free_only: bool,
}

impl ResourceFilter {
    fn matches(&self, resource: &Resource, occupied: Option<&HashSet<ResourceId>>) -> bool {
        let needle = self.text.trim().to_lowercase();
        if !needle.is_empty()
            && !resource.label.to_lowercase().contains(&needle)
            && !resource.category.to_lowercase().contains(&needle)
        {
            return false;
        }
        if let Some(category) = &self.category
            && !resource.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if !self.features.iter().all(|f| resource.has_feature(f)) {
            return false;
        }
        if self.free_only
            && let Some(occupied) = occupied
            && occupied.contains(&resource.id)
        {
            return false;
        }
        true
    }
}

/// Resources with at least one occupying booking overlapping the window.
pub fn occupied_resources(intervals: &IntervalSet, window: &TimelineWindow) -> HashSet<ResourceId> {
    let (start, end) = (window.start(), window.end());
    intervals
        .iter()
        .filter(|i| i.status.occupies() && i.start < end && i.end > start)
        .map(|i| i.resource_id.clone())
        .collect()
}

/// Filtered, ordered rows plus the `resource → row` lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceIndex {
    rows: Vec<Resource>,
    row_of: HashMap<ResourceId, usize>,
}

impl ResourceIndex {
    /// Rebuild from scratch. `occupied` is only consulted when `filter.free_only` is set.
    pub fn build(
        resources: &[Resource],
        filter: &ResourceFilter,
        occupied: Option<&HashSet<ResourceId>>,
    ) -> Self {
        let mut rows: Vec<Resource> = resources
            .iter()
            .filter(|r| filter.matches(r, occupied))
            .cloned()
            .collect();
        if filter.group_by_category {
            // Stable sort keeps source order for full ties.
            rows.sort_by(|a, b| {
                compare_category(&a.category, &b.category)
                    .then_with(|| natural_cmp(&a.label, &b.label))
            });
        }
        let row_of = rows
            .iter()
            .enumerate()
            .map(|(row, r)| (r.id.clone(), row))
            .collect();
        Self { rows, row_of }
    }

    pub fn row_of(&self, id: &ResourceId) -> Option<usize> {
        self.row_of.get(id).copied()
    }

    pub fn resource_at(&self, row: usize) -> Option<&Resource> {
        self.rows.get(row)
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.row_of.contains_key(id)
    }

    pub fn rows(&self) -> &[Resource] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn compare_category(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Compare room labels so that digit runs order numerically: "9" < "10" < "10A".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = a.chars().peekable();
    let mut ys = b.chars().peekable();
    loop {
        match (xs.peek().copied(), ys.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_digits(&mut xs);
                let right = take_digits(&mut ys);
                let l = left.trim_start_matches('0');
                let r = right.trim_start_matches('0');
                let ord = l.len().cmp(&r.len()).then_with(|| l.cmp(r));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                xs.next();
                ys.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        out.push(c);
    }
    out
}
