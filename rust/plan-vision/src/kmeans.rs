// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Seeded colour sampling and k-means clustering
//!
//! Everything random in the pipeline flows through [`SeededRng`], which the
//! caller constructs from an explicit seed. Two runs with the same seed and
//! the same image produce identical clusters.

use rayon::prelude::*;

pub type Rgb = [f64; 3];

/// Small deterministic generator (splitmix64)
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[0, n)`; `n` must be non-zero
    pub fn below(&mut self, n: usize) -> usize {
        ((self.next_u64() as u128 * n as u128) >> 64) as usize
    }
}

/// Pick `count` distinct indices from `0..population` (partial Fisher-Yates)
pub fn sample_indices(population: usize, count: usize, rng: &mut SeededRng) -> Vec<usize> {
    let count = count.min(population);
    let mut indices: Vec<usize> = (0..population).collect();
    for i in 0..count {
        let j = i + rng.below(population - i);
        indices.swap(i, j);
    }
    indices.truncate(count);
    indices
}

pub fn squared_distance(a: &Rgb, b: &Rgb) -> f64 {
    (0..3).map(|c| (a[c] - b[c]) * (a[c] - b[c])).sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub clusters: usize,
    pub restarts: usize,
    pub max_iterations: usize,
    /// Stop once the summed squared centre shift is at most `convergence * variance`
    pub convergence: f64,
}

/// Result of one clustering
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub centers: Vec<Rgb>,
    /// Cluster index per input point
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centres
    pub inertia: f64,
}

impl Clustering {
    /// Points per cluster
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.centers.len()];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }
}

/// Nearest centre and its squared distance; ties go to the lowest index
fn nearest(point: &Rgb, centers: &[Rgb]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (idx, center) in centers.iter().enumerate() {
        let d = squared_distance(point, center);
        if d < best.1 {
            best = (idx, d);
        }
    }
    best
}

fn assign(points: &[Rgb], centers: &[Rgb]) -> Vec<(usize, f64)> {
    points.par_iter().map(|p| nearest(p, centers)).collect()
}

/// Mean per-channel variance, the scale for the convergence threshold
fn data_variance(points: &[Rgb]) -> f64 {
    let n = points.len() as f64;
    let mut total = 0.0;
    for c in 0..3 {
        let mean = points.iter().map(|p| p[c]).sum::<f64>() / n;
        total += points.iter().map(|p| (p[c] - mean).powi(2)).sum::<f64>() / n;
    }
    total / 3.0
}

/// k-means++ seeding
fn init_centers(points: &[Rgb], k: usize, rng: &mut SeededRng) -> Vec<Rgb> {
    let mut centers = Vec::with_capacity(k);
    centers.push(points[rng.below(points.len())]);

    let mut closest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centers[0]))
        .collect();

    while centers.len() < k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.next_f64() * total;
            let mut acc = 0.0;
            let mut chosen = points.len() - 1;
            for (idx, w) in closest.iter().enumerate() {
                acc += w;
                if acc > target {
                    chosen = idx;
                    break;
                }
            }
            chosen
        } else {
            // Fewer distinct colours than clusters
            rng.below(points.len())
        };

        let center = points[pick];
        for (d, p) in closest.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &center));
        }
        centers.push(center);
    }
    centers
}

fn lloyd(points: &[Rgb], mut centers: Vec<Rgb>, params: &KMeansParams, threshold: f64) -> Clustering {
    for _ in 0..params.max_iterations {
        let assignment = assign(points, &centers);

        let mut sums = vec![[0.0; 3]; centers.len()];
        let mut counts = vec![0usize; centers.len()];
        for (p, (label, _)) in points.iter().zip(&assignment) {
            for c in 0..3 {
                sums[*label][c] += p[c];
            }
            counts[*label] += 1;
        }

        let mut shift = 0.0;
        for (idx, center) in centers.iter_mut().enumerate() {
            // Empty clusters keep their centre
            if counts[idx] == 0 {
                continue;
            }
            let n = counts[idx] as f64;
            let updated = [sums[idx][0] / n, sums[idx][1] / n, sums[idx][2] / n];
            shift += squared_distance(center, &updated);
            *center = updated;
        }

        if shift <= threshold {
            break;
        }
    }

    let assignment = assign(points, &centers);
    let inertia = assignment.iter().map(|(_, d)| d).sum();
    Clustering {
        centers,
        labels: assignment.into_iter().map(|(label, _)| label).collect(),
        inertia,
    }
}

/// Cluster `points` with k-means++ seeded Lloyd iterations.
///
/// Runs `params.restarts` independent initialisations and keeps the one with
/// the lowest inertia (earliest on ties). `clusters` is capped at the number
/// of points; an empty input yields an empty clustering.
pub fn kmeans(points: &[Rgb], params: &KMeansParams, rng: &mut SeededRng) -> Clustering {
    if points.is_empty() || params.clusters == 0 {
        return Clustering {
            centers: Vec::new(),
            labels: Vec::new(),
            inertia: 0.0,
        };
    }

    let k = params.clusters.min(points.len());
    let threshold = params.convergence * data_variance(points);

    let mut best: Option<Clustering> = None;
    for _ in 0..params.restarts.max(1) {
        let centers = init_centers(points, k, rng);
        let run = lloyd(points, centers, params, threshold);
        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }

    best.unwrap_or_else(|| Clustering {
        centers: Vec::new(),
        labels: Vec::new(),
        inertia: 0.0,
    })
}
