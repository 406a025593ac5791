//! Depth buffer partitioning.
//!
//! Objects in one frame can be metres or light years away, far more than a
//! single depth buffer can resolve. The view volume is therefore split into
//! contiguous depth slices. Each slice keeps its far/near ratio within what
//! the depth buffer resolves, slices are drawn back to front, and the depth
//! buffer is cleared between occupied slices.

use crate::render_list::{MIN_NEAR_PLANE_DISTANCE, RenderListEntry};
use orrery_core::profiling::profile_function;

/// A slice of the view volume drawn with its own depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBufferPartition {
    /// Position in drawing order, `0` is the farthest slice.
    pub index: usize,
    pub near_z: f32,
    pub far_z: f32,
    /// Whether any entry was assigned to this slice.
    pub occupied: bool,
}

impl DepthBufferPartition {
    /// True for `near_z <= depth < far_z`.
    pub fn contains(&self, depth: f32) -> bool {
        depth >= self.near_z && depth < self.far_z
    }
}

/// Partitioner configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthPartitionConfig {
    /// Bits of depth buffer precision.
    pub depth_bits: u32,
    /// Upper bound on the number of slices. Extra slices are coalesced.
    pub max_partitions: usize,
    /// Smallest near distance any slice may use.
    pub min_near: f32,
}

impl Default for DepthPartitionConfig {
    fn default() -> Self {
        Self {
            depth_bits: 24,
            max_partitions: 8,
            min_near: MIN_NEAR_PLANE_DISTANCE,
        }
    }
}

impl DepthPartitionConfig {
    pub fn with_depth_bits(mut self, bits: u32) -> Self {
        self.depth_bits = bits;
        self
    }

    pub fn with_max_partitions(mut self, max: usize) -> Self {
        self.max_partitions = max.max(1);
        self
    }

    /// Largest far/near ratio a slice may span.
    pub fn max_ratio(&self) -> f32 {
        let bits = self.depth_bits.clamp(4, 32) as i32;
        2f32.powi(bits) / 8.0
    }
}

/// Slices for one frame plus the slice of every entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthPartitions {
    partitions: Vec<DepthBufferPartition>,
    assignment: Vec<usize>,
}

impl DepthPartitions {
    /// Slices sorted by depth, farthest first.
    pub fn partitions(&self) -> &[DepthBufferPartition] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Slice index of the entry at `entry` in the partitioned slice.
    pub fn partition_of(&self, entry: usize) -> Option<usize> {
        self.assignment.get(entry).copied()
    }

    /// Indices of the entries assigned to slice `partition`.
    pub fn entries_in(&self, partition: usize) -> impl Iterator<Item = usize> + '_ {
        self.assignment
            .iter()
            .enumerate()
            .filter(move |(_, p)| **p == partition)
            .map(|(i, _)| i)
    }

    /// Number of slices that need a depth clear.
    pub fn occupied_count(&self) -> usize {
        self.partitions.iter().filter(|p| p.occupied).count()
    }
}

/// Splits render list entries into depth slices.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthPartitioner {
    config: DepthPartitionConfig,
}

impl DepthPartitioner {
    pub fn new(config: DepthPartitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DepthPartitionConfig {
        &self.config
    }

    /// Partition `entries`, whose depth extents must already be computed.
    pub fn partition(&self, entries: &[RenderListEntry]) -> DepthPartitions {
        profile_function!();

        if entries.is_empty() {
            return DepthPartitions::default();
        }

        let min_near = self.config.min_near.max(f32::MIN_POSITIVE);
        let mut intervals: Vec<(f32, f32)> = entries
            .iter()
            .map(|e| {
                let near = e.near_z.max(min_near);
                (near, e.far_z.max(near * 1.000_001))
            })
            .collect();
        intervals.sort_by(|a, b| b.1.total_cmp(&a.1));

        let spans = self.spans(&intervals);
        let mut spans = self.coalesce(spans);

        if let Some(first) = spans.first_mut() {
            first.1 *= 1.01;
        }

        let global_near = spans.last().map_or(min_near, |s| s.0);
        let global_far = spans.first().map_or(min_near, |s| s.1);

        let assignment: Vec<usize> = entries
            .iter()
            .map(|e| {
                // Slices are contiguous and sorted far to near, so the first
                // slice starting at or below the depth holds it.
                let depth = e.center_z.clamp(global_near, global_far);
                spans
                    .iter()
                    .position(|&(near, _)| depth >= near)
                    .unwrap_or(spans.len() - 1)
            })
            .collect();

        let partitions = spans
            .iter()
            .enumerate()
            .map(|(index, &(near_z, far_z))| DepthBufferPartition {
                index,
                near_z,
                far_z,
                occupied: assignment.contains(&index),
            })
            .collect::<Vec<_>>();

        tracing::trace!(
            "Depth partitions: {} slices ({} occupied) for {} entries",
            partitions.len(),
            partitions.iter().filter(|p| p.occupied).count(),
            entries.len()
        );

        DepthPartitions {
            partitions,
            assignment,
        }
    }

    /// Contiguous `(near, far)` spans, farthest first, covering every interval.
    ///
    /// A disjoint interval joins the current span when the combined ratio
    /// still fits; otherwise the space between them becomes an empty span.
    fn spans(&self, intervals: &[(f32, f32)]) -> Vec<(f32, f32)> {
        let ratio = self.config.max_ratio();
        let mut spans = Vec::new();
        let mut current: Option<(f32, f32)> = None;
        let mut run_start = 0;

        for (i, &(near, far)) in intervals.iter().enumerate() {
            current = Some(match current {
                None => (near, far),
                Some((cur_near, cur_far)) if far < cur_near && cur_far / near > ratio => {
                    self.close_span(cur_near, cur_far, &intervals[run_start..i], &mut spans);
                    spans.push((far, cur_near));
                    run_start = i;
                    (near, far)
                }
                Some((cur_near, cur_far)) => (cur_near.min(near), cur_far),
            });
        }

        if let Some((near, far)) = current {
            self.close_span(near, far, &intervals[run_start..], &mut spans);
        }
        spans
    }

    /// Emit one span split into ratio-limited slices from far to near.
    ///
    /// A cut that would pass through one of the `run` intervals is moved up
    /// to that interval's far edge, so the entry fits in the nearer slice.
    /// Entries whose own extent exceeds the ratio, or that reach the top of
    /// the slice being split, are still cut and lose the part outside their
    /// slice.
    fn close_span(&self, near: f32, mut far: f32, run: &[(f32, f32)], spans: &mut Vec<(f32, f32)>) {
        let ratio = self.config.max_ratio();
        while far / near > ratio {
            let mut boundary = far / ratio;
            while let Some(edge) = run
                .iter()
                .filter(|&&(n, f)| n < boundary && boundary < f && f < far)
                .map(|&(_, f)| f)
                .reduce(f32::max)
            {
                boundary = edge;
            }
            spans.push((boundary, far));
            far = boundary;
        }
        spans.push((near, far));
    }

    /// Merge adjacent slices until at most `max_partitions` remain, always
    /// merging the pair with the smallest combined ratio.
    fn coalesce(&self, mut spans: Vec<(f32, f32)>) -> Vec<(f32, f32)> {
        let max = self.config.max_partitions.max(1);
        if spans.len() > max {
            tracing::debug!(
                "Coalescing {} depth slices down to {}",
                spans.len(),
                max
            );
        }
        while spans.len() > max {
            let i = (0..spans.len() - 1)
                .min_by(|&a, &b| {
                    let ra = spans[a].1 / spans[a + 1].0;
                    let rb = spans[b].1 / spans[b + 1].0;
                    ra.total_cmp(&rb)
                })
                .unwrap_or(0);
            let far = spans[i].1;
            spans[i + 1].1 = far;
            spans.remove(i);
        }
        spans
    }
}
