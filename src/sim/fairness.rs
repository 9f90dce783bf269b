//! Layout fairness validation
//!
//! Pass 1 treats full blocks as graph nodes, links any two within the
//! proximity threshold, and breaks up every connected cluster that spans all
//! three lanes. Pass 2 repairs same-lane spacing, preferring to move an
//! obstacle, then to retype it, and only then to delete it.
//!
//! Repair can move or retype a full block into a new cluster, so pass 1 runs
//! once more at the end. Removal never shortens a same-lane gap, so that last
//! sweep keeps the spacing guarantee intact.

use std::collections::{HashSet, VecDeque};

use rand::Rng;
use rand_pcg::Pcg32;

use super::lane::{Lane, ObstacleSpawnDescriptor, sort_by_position};
use crate::consts::{LANE_COUNT, POSITION_EPSILON};
use crate::settings::{FairnessSettings, VerticalOffsets};

/// Relative range obstacles may be moved within
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBounds {
    pub min_offset: f32,
    pub max_offset: f32,
}

/// What the validator changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FairnessReport {
    pub blocking_removed: usize,
    pub repositioned: usize,
    pub retyped: usize,
    pub spacing_removed: usize,
}

impl FairnessReport {
    pub fn interventions(&self) -> usize {
        self.blocking_removed + self.repositioned + self.retyped + self.spacing_removed
    }
}

/// Run both passes plus the closing blocking sweep. Output is sorted by position.
pub fn validate_layout(
    layout: &mut Vec<ObstacleSpawnDescriptor>,
    bounds: LayoutBounds,
    settings: &FairnessSettings,
    vertical_offsets: &VerticalOffsets,
    rng: &mut Pcg32,
) -> FairnessReport {
    let mut report = FairnessReport {
        blocking_removed: remove_blocking_clusters(layout, settings.proximity_threshold, rng),
        ..Default::default()
    };

    repair_spacing(layout, bounds, settings, vertical_offsets, &mut report);
    report.blocking_removed += remove_blocking_clusters(layout, settings.proximity_threshold, rng);
    sort_by_position(layout);

    if report.interventions() > 0 {
        log::debug!(
            "Fairness: removed {} blocking, moved {}, retyped {}, removed {} for spacing",
            report.blocking_removed,
            report.repositioned,
            report.retyped,
            report.spacing_removed
        );
    }
    report
}

/// Connected components of full blocks (indices into `layout`)
pub fn blocking_clusters(layout: &[ObstacleSpawnDescriptor], threshold: f32) -> Vec<Vec<usize>> {
    let nodes: Vec<usize> = (0..layout.len())
        .filter(|&i| layout[i].kind.is_blocking())
        .collect();

    let mut visited = vec![false; nodes.len()];
    let mut clusters = Vec::new();
    for root in 0..nodes.len() {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        let mut queue = VecDeque::from([root]);
        let mut members = Vec::new();
        while let Some(current) = queue.pop_front() {
            members.push(nodes[current]);
            let position = layout[nodes[current]].relative_position;
            for next in 0..nodes.len() {
                if !visited[next]
                    && (layout[nodes[next]].relative_position - position).abs() <= threshold
                {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        clusters.push(members);
    }
    clusters
}

fn lanes_of(layout: &[ObstacleSpawnDescriptor], members: &[usize]) -> HashSet<Lane> {
    members.iter().map(|&i| layout[i].lane).collect()
}

/// Break up clusters that block every lane. Returns how many obstacles were removed.
///
/// One random member goes; if its lane is still covered by the cluster, the
/// rest of that lane's members go too, so the cluster always reopens a lane.
pub fn remove_blocking_clusters(
    layout: &mut Vec<ObstacleSpawnDescriptor>,
    threshold: f32,
    rng: &mut Pcg32,
) -> usize {
    let mut doomed: Vec<usize> = Vec::new();
    for members in blocking_clusters(layout, threshold) {
        if lanes_of(layout, &members).len() < LANE_COUNT {
            continue;
        }
        let victim = members[rng.random_range(0..members.len())];
        let lane = layout[victim].lane;
        let remaining: Vec<usize> = members.iter().copied().filter(|&i| i != victim).collect();
        if lanes_of(layout, &remaining).len() < LANE_COUNT {
            doomed.push(victim);
        } else {
            doomed.extend(members.iter().copied().filter(|&i| layout[i].lane == lane));
        }
        log::debug!(
            "Blocking cluster of {} full blocks covers every lane; reopening {:?}",
            members.len(),
            lane
        );
    }

    remove_indices(layout, doomed)
}

/// Same-lane (earlier, later) index pairs closer than their required spacing
pub fn spacing_violations(
    layout: &[ObstacleSpawnDescriptor],
    settings: &FairnessSettings,
) -> Vec<(usize, usize)> {
    let mut violations = Vec::new();
    for lane in Lane::ALL {
        let mut in_lane: Vec<usize> =
            (0..layout.len()).filter(|&i| layout[i].lane == lane).collect();
        in_lane.sort_by(|&a, &b| {
            layout[a]
                .relative_position
                .total_cmp(&layout[b].relative_position)
                .then(a.cmp(&b))
        });
        for (n, &earlier) in in_lane.iter().enumerate() {
            for &later in &in_lane[n + 1..] {
                let gap = layout[later].relative_position - layout[earlier].relative_position;
                let required = settings.required_spacing(layout[earlier].kind, layout[later].kind);
                if gap + POSITION_EPSILON < required {
                    violations.push((earlier, later));
                }
            }
        }
    }
    violations.sort_by(|a, b| {
        layout[a.0]
            .relative_position
            .total_cmp(&layout[b.0].relative_position)
            .then(a.cmp(b))
    });
    violations
}

/// Fix same-lane spacing: push later, pull earlier, retype later, or remove later.
pub fn repair_spacing(
    layout: &mut Vec<ObstacleSpawnDescriptor>,
    bounds: LayoutBounds,
    settings: &FairnessSettings,
    vertical_offsets: &VerticalOffsets,
    report: &mut FairnessReport,
) {
    for _ in 0..settings.repair_rounds {
        let violations = spacing_violations(layout, settings);
        if violations.is_empty() {
            return;
        }

        let mut touched: HashSet<usize> = HashSet::new();
        let mut removals: Vec<usize> = Vec::new();
        for (earlier, later) in violations {
            if touched.contains(&earlier) || touched.contains(&later) {
                continue;
            }
            touched.insert(earlier);
            touched.insert(later);

            let first = layout[earlier];
            let second = layout[later];
            let required = settings.required_spacing(first.kind, second.kind);
            let gap = second.relative_position - first.relative_position;

            if first.relative_position + required <= bounds.max_offset + POSITION_EPSILON {
                layout[later].relative_position =
                    (first.relative_position + required).min(bounds.max_offset);
                report.repositioned += 1;
            } else if second.relative_position - required >= bounds.min_offset - POSITION_EPSILON {
                layout[earlier].relative_position =
                    (second.relative_position - required).max(bounds.min_offset);
                report.repositioned += 1;
            } else if first.kind != second.kind && gap + POSITION_EPSILON >= settings.min_spacing {
                layout[later].kind = first.kind;
                layout[later].vertical_offset = vertical_offsets.for_kind(first.kind);
                report.retyped += 1;
            } else {
                removals.push(later);
            }
        }
        report.spacing_removed += remove_indices(layout, removals);
    }

    // Whatever the rounds could not settle is dropped, later obstacle first
    while let Some(&(_, later)) = spacing_violations(layout, settings).first() {
        layout.remove(later);
        report.spacing_removed += 1;
    }
}

/// Remove indices in descending order so earlier indices stay valid
fn remove_indices(layout: &mut Vec<ObstacleSpawnDescriptor>, mut indices: Vec<usize>) -> usize {
    indices.sort_unstable_by(|a, b| b.cmp(a));
    indices.dedup();
    for &index in &indices {
        layout.remove(index);
    }
    indices.len()
}

/// True when some full-block cluster still spans all three lanes
pub fn has_blocking_cluster(layout: &[ObstacleSpawnDescriptor], threshold: f32) -> bool {
    blocking_clusters(layout, threshold)
        .iter()
        .any(|members| lanes_of(layout, members).len() >= LANE_COUNT)
}
