//! Exploring the shape of a vector space: k-means clustering of the
//! vocabulary and principal component projection.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::StdRng,
    Rng, SeedableRng,
};

use serde::Serialize;

use crate::{
    error::{Error, Result},
    model::Word2VecModel,
};

const PCA_MAX_ITER: usize = 1000;
const PCA_TOLERANCE: f32 = 1e-7;
/// Variance below this fraction of the total is treated as zero.
const PCA_VARIANCE_FLOOR: f32 = 1e-5;

#[derive(Debug, Clone)]
pub struct KMeans {
    /// Cluster of every row, in row order.
    pub labels: Vec<usize>,
    pub centroids: Array2<f32>,
    /// Sum of squared distances from each row to its centroid.
    pub inertia: f32,
    pub iterations: usize,
}

impl KMeans {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.nrows()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

fn squared_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// k-means++ seeding: each new centre is drawn with probability proportional
/// to its squared distance from the centres chosen so far.
fn seed_centroids<R: Rng>(data: ArrayView2<f32>, k: usize, rng: &mut R) -> Array2<f32> {
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut closest: Vec<f32> = data
        .rows()
        .into_iter()
        .map(|row| squared_distance(row, centroids.row(0)))
        .collect();

    for c in 1..k {
        let next = match WeightedIndex::new(&closest) {
            Ok(weights) => weights.sample(rng),
            // every point already sits on a centre
            Err(_) => rng.gen_range(0..n),
        };
        centroids.row_mut(c).assign(&data.row(next));
        for (distance, row) in closest.iter_mut().zip(data.rows()) {
            *distance = distance.min(squared_distance(row, centroids.row(c)));
        }
    }
    centroids
}

/// Assign every row to its nearest centroid. Returns whether any label changed.
fn assign(data: ArrayView2<f32>, centroids: &Array2<f32>, labels: &mut [usize]) -> bool {
    let mut changed = false;
    for (label, row) in labels.iter_mut().zip(data.rows()) {
        let nearest = centroids
            .rows()
            .into_iter()
            .map(|centroid| squared_distance(row, centroid))
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
            .unwrap_or(0);
        if *label != nearest {
            *label = nearest;
            changed = true;
        }
    }
    changed
}

/// Move each centroid to the mean of its rows. Empty clusters stay put.
fn update_centroids(data: ArrayView2<f32>, labels: &[usize], centroids: &mut Array2<f32>) {
    let mut sums = Array2::<f32>::zeros(centroids.raw_dim());
    let mut counts = vec![0usize; centroids.nrows()];
    for (&label, row) in labels.iter().zip(data.rows()) {
        let mut sum = sums.row_mut(label);
        sum += &row;
        counts[label] += 1;
    }
    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = sums.row(c).mapv(|v| v / count as f32);
            centroids.row_mut(c).assign(&mean);
        }
    }
}

pub fn kmeans(
    data: ArrayView2<f32>,
    k: usize,
    max_iter: usize,
    seed: Option<u64>,
) -> Result<KMeans> {
    let n = data.nrows();
    if k == 0 || k > n {
        return Err(Error::InvalidParameter(format!(
            "cannot build {k} clusters from {n} vectors"
        )));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut centroids = seed_centroids(data, k, &mut rng);
    let mut labels = vec![usize::MAX; n];

    let mut iterations = 0;
    for iteration in 1..=max_iter {
        iterations = iteration;
        if !assign(data, &centroids, &mut labels) {
            break;
        }
        update_centroids(data, &labels, &mut centroids);
    }
    assign(data, &centroids, &mut labels);

    let inertia: f32 = labels
        .iter()
        .zip(data.rows())
        .map(|(&label, row)| squared_distance(row, centroids.row(label)))
        .sum();

    tracing::debug!(k, iterations, inertia, "k-means finished");
    Ok(KMeans {
        labels,
        centroids,
        inertia,
        iterations,
    })
}

#[derive(Debug, Clone)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub size: usize,
    /// Words nearest to the centroid, with their cosine similarity.
    pub representatives: Vec<(String, f32)>,
}

pub fn cluster_representatives(
    model: &Word2VecModel,
    clustering: &KMeans,
    top_n: usize,
) -> Result<Vec<ClusterSummary>> {
    let sizes = clustering.cluster_sizes();
    clustering
        .centroids
        .rows()
        .into_iter()
        .enumerate()
        .map(|(cluster, centroid)| {
            let centroid = centroid.to_vec();
            Ok(ClusterSummary {
                cluster,
                size: sizes[cluster],
                representatives: model.similar_by_vector(&centroid, top_n)?,
            })
        })
        .collect()
}

/// One representative word of one cluster, flattened for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterRow {
    pub cluster: usize,
    pub size: usize,
    pub rank: usize,
    pub word: String,
    pub similarity: f32,
}

pub fn cluster_rows(summaries: &[ClusterSummary]) -> Vec<ClusterRow> {
    summaries
        .iter()
        .flat_map(|summary| {
            summary
                .representatives
                .iter()
                .enumerate()
                .map(move |(i, (word, similarity))| ClusterRow {
                    cluster: summary.cluster,
                    size: summary.size,
                    rank: i + 1,
                    word: word.clone(),
                    similarity: *similarity,
                })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Projection {
    /// One row per input row, one column per component.
    pub coordinates: Array2<f32>,
    /// Unit principal axes, one per row.
    pub components: Array2<f32>,
    /// Variance captured by each component.
    pub explained_variance: Vec<f32>,
}

/// Project `data` onto its first `n_components` principal axes.
pub fn pca(data: ArrayView2<f32>, n_components: usize) -> Result<Projection> {
    let (n, d) = data.dim();
    if n < 2 {
        return Err(Error::InvalidParameter(format!(
            "PCA needs at least 2 vectors, got {n}"
        )));
    }
    if n_components == 0 || n_components > d {
        return Err(Error::InvalidParameter(format!(
            "cannot extract {n_components} components from {d} dimensions"
        )));
    }

    let mean = data
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::InvalidParameter("empty matrix".into()))?;
    let centered = &data - &mean;
    let mut covariance = centered.t().dot(&centered) / (n - 1) as f32;
    let floor = covariance.diag().sum() * PCA_VARIANCE_FLOOR;

    let mut components = Array2::<f32>::zeros((n_components, d));
    let mut explained_variance = Vec::with_capacity(n_components);

    for c in 0..n_components {
        let (axis, variance) = dominant_eigenvector(&covariance, floor);
        let outer = axis
            .view()
            .insert_axis(Axis(1))
            .dot(&axis.view().insert_axis(Axis(0)));
        covariance -= &(outer * variance);
        components.row_mut(c).assign(&axis);
        explained_variance.push(variance.max(0.0));
    }

    let coordinates = centered.dot(&components.t());
    Ok(Projection {
        coordinates,
        components,
        explained_variance,
    })
}

/// Power iteration on a symmetric positive semi-definite matrix. Starts from
/// the column with the largest diagonal entry and fixes the sign so that the
/// largest coordinate is positive. A matrix whose diagonal stays under
/// `floor` yields the zero vector.
fn dominant_eigenvector(matrix: &Array2<f32>, floor: f32) -> (Array1<f32>, f32) {
    let d = matrix.nrows();
    let start = (0..d)
        .max_by(|&a, &b| matrix[[a, a]].total_cmp(&matrix[[b, b]]))
        .unwrap_or(0);
    if matrix[[start, start]] <= floor.max(0.0) {
        return (Array1::zeros(d), 0.0);
    }

    let mut vector = matrix.column(start).to_owned();
    let norm = vector.dot(&vector).sqrt();
    vector /= norm;

    for _ in 0..PCA_MAX_ITER {
        let mut next = matrix.dot(&vector);
        let norm = next.dot(&next).sqrt();
        if norm == 0.0 {
            return (Array1::zeros(d), 0.0);
        }
        next /= norm;
        let delta = (&next - &vector).iter().fold(0.0f32, |m, v| m.max(v.abs()));
        vector = next;
        if delta < PCA_TOLERANCE {
            break;
        }
    }

    let pivot = vector
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        vector.mapv_inplace(|v| -v);
    }
    let eigenvalue = vector.dot(&matrix.dot(&vector));
    (vector, eigenvalue)
}

/// The first `limit` rows of a matrix, or all of them.
pub fn head(data: ArrayView2<f32>, limit: Option<usize>) -> ArrayView2<f32> {
    let rows = limit.map_or(data.nrows(), |l| l.min(data.nrows()));
    data.slice_move(s![..rows, ..])
}
