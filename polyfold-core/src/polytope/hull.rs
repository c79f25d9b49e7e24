//! Incremental convex hull over ℚ^d driven by a vertex oracle.
//!
//! The oracle answers "which achievable point minimizes θ·x?" exactly.
//! The hull seeds itself with affinely independent answers, then runs
//! beneath-beyond: every unconfirmed facet is probed along its outward
//! normal; an answer strictly beyond the facet extends the hull, an
//! answer on or below it confirms the facet as supporting. When every
//! facet is confirmed, no achievable point lies outside the hull.
//!
//! Facets are simplices. All arithmetic is exact, so beyond/on/below
//! classifications are never approximate. If the achievable points do
//! not span the full dimension the build stops with the distinct probe
//! answers as vertices and no facets.

use num_traits::{One, Zero};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::rational::Rational;

/// A point in ℚ^d.
pub type Point = Vec<Rational>;
/// A direction in ℚ^d.
pub type Vector = Vec<Rational>;

/// Lifecycle callbacks for hull construction; every method defaults to a
/// no-op. Used for logging only.
pub trait BuildObserver {
    /// Called before the seed probes run.
    fn preinit(&self) {}
    /// Called once an initial simplex exists.
    fn postinit(&self) {}
    /// Called after each confirmation round with (confirmed, live) facet
    /// counts.
    fn perloop(&self, _confirmed: usize, _live: usize) {}
    /// Called when every facet is confirmed.
    fn postloop(&self) {}
}

/// The do-nothing observer.
pub struct SilentObserver;

impl BuildObserver for SilentObserver {}

/// A simplicial facet of the hull.
#[derive(Debug, Clone)]
pub struct Facet {
    /// Indices into the hull's point store, d of them.
    pub vertices: Vec<usize>,
    /// Outward normal.
    pub normal: Vector,
    /// Support value: normal · x = offset on the facet plane.
    pub offset: Rational,
    confirmed: bool,
}

/// The finished hull.
#[derive(Debug)]
pub struct Hull {
    dim: usize,
    points: Vec<Point>,
    facets: Vec<Option<Facet>>,
}

impl Hull {
    /// Ambient dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Live facets.
    pub fn facets(&self) -> impl Iterator<Item = &Facet> {
        self.facets.iter().flatten()
    }

    /// Number of live facets.
    #[must_use]
    pub fn facet_count(&self) -> usize {
        self.facets().count()
    }

    /// Whether the point set spanned the full dimension.
    #[must_use]
    pub fn is_full_dimensional(&self) -> bool {
        self.facet_count() > 0
    }

    /// Hull vertices in point-store order. For a degenerate
    /// (lower-dimensional) build this is every distinct probe answer.
    pub fn vertex_points(&self) -> Vec<&Point> {
        if !self.is_full_dimensional() {
            return self.points.iter().collect();
        }
        let used: FxHashSet<usize> = self
            .facets()
            .flat_map(|facet| facet.vertices.iter().copied())
            .collect();
        let mut indices: Vec<usize> = used.into_iter().collect();
        indices.sort_unstable();
        indices.into_iter().map(|index| &self.points[index]).collect()
    }
}

/// Build the hull of the oracle's achievable set in dimension `dim`.
///
/// The oracle must return, for any objective θ, an achievable point
/// minimizing θ·x exactly. Pending facets are probed in parallel rounds;
/// hull mutation stays sequential.
pub fn build_hull<F>(dim: usize, oracle: &F, observer: &dyn BuildObserver) -> Hull
where
    F: Fn(&Vector) -> Point + Sync,
{
    observer.preinit();

    let mut probes: Vec<Vector> = Vec::new();
    for axis in 0..dim {
        probes.push(unit(dim, axis, false));
        probes.push(unit(dim, axis, true));
    }
    probes.push(vec![Rational::one(); dim]);
    probes.push(vec![-Rational::one(); dim]);

    let answers: Vec<Point> = probes.par_iter().map(|probe| oracle(probe)).collect();
    let mut points: Vec<Point> = Vec::new();
    for answer in answers {
        push_distinct(&mut points, answer);
    }

    // Extend to full affine rank, probing orthogonally to the current
    // span; give up into a vertex-only hull if the achievable set is
    // genuinely lower-dimensional.
    loop {
        if affine_rank(&points) == dim {
            break;
        }
        let Some(orthogonal) = orthogonal_to_affine_span(&points, dim) else {
            break;
        };
        let before = affine_rank(&points);
        push_distinct(&mut points, oracle(&orthogonal));
        push_distinct(&mut points, oracle(&negate(&orthogonal)));
        if affine_rank(&points) == before {
            return Hull {
                dim,
                points,
                facets: Vec::new(),
            };
        }
    }

    let Some(simplex) = independent_simplex(&points, dim) else {
        return Hull {
            dim,
            points,
            facets: Vec::new(),
        };
    };

    let interior = centroid(&simplex.iter().map(|&i| &points[i]).collect::<Vec<_>>());
    let mut facets: Vec<Option<Facet>> = Vec::new();
    for omit in 0..simplex.len() {
        let vertices: Vec<usize> = simplex
            .iter()
            .enumerate()
            .filter_map(|(k, &index)| (k != omit).then_some(index))
            .collect();
        if let Some(facet) = make_facet(&points, vertices, &interior) {
            facets.push(Some(facet));
        }
    }
    observer.postinit();

    loop {
        let pending: Vec<usize> = facets
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| {
                slot.as_ref()
                    .is_some_and(|facet| !facet.confirmed)
                    .then_some(id)
            })
            .collect();
        if pending.is_empty() {
            break;
        }

        let answers: Vec<(usize, Point)> = pending
            .par_iter()
            .map(|&id| {
                let facet = facets[id].as_ref().expect("pending facets are live");
                (id, oracle(&negate(&facet.normal)))
            })
            .collect();

        for (id, answer) in answers {
            let Some(facet) = facets[id].as_ref() else {
                continue; // died earlier this round
            };
            if facet.confirmed {
                continue;
            }
            let beyond_queried = dot(&facet.normal, &answer) > facet.offset;
            insert_point(&mut points, &mut facets, &interior, answer);
            if !beyond_queried {
                if let Some(facet) = facets[id].as_mut() {
                    facet.confirmed = true;
                }
            }
        }

        let confirmed = facets
            .iter()
            .flatten()
            .filter(|facet| facet.confirmed)
            .count();
        let live = facets.iter().flatten().count();
        observer.perloop(confirmed, live);
    }

    observer.postloop();
    Hull {
        dim,
        points,
        facets,
    }
}

/// Fold a new point into the hull. A point inside (or on) every facet is
/// ignored; otherwise the visible facets are replaced by the cone from
/// the point over the visibility horizon.
fn insert_point(
    points: &mut Vec<Point>,
    facets: &mut Vec<Option<Facet>>,
    interior: &Point,
    point: Point,
) {
    let visible: FxHashSet<usize> = facets
        .iter()
        .enumerate()
        .filter_map(|(id, slot)| {
            let facet = slot.as_ref()?;
            (dot(&facet.normal, &point) > facet.offset).then_some(id)
        })
        .collect();
    if visible.is_empty() {
        return;
    }

    let point_index = match points.iter().position(|existing| existing == &point) {
        Some(index) => index,
        None => {
            points.push(point);
            points.len() - 1
        }
    };

    // Each ridge is shared by exactly two facets; the horizon consists
    // of ridges between a visible and an invisible facet.
    let mut ridge_owners: rustc_hash::FxHashMap<Vec<usize>, Vec<usize>> =
        rustc_hash::FxHashMap::default();
    for (id, slot) in facets.iter().enumerate() {
        let Some(facet) = slot else { continue };
        for ridge in ridges(&facet.vertices) {
            ridge_owners.entry(ridge).or_default().push(id);
        }
    }

    let mut horizon: Vec<Vec<usize>> = Vec::new();
    for &id in &visible {
        let facet = facets[id].as_ref().expect("visible facets are live");
        for ridge in ridges(&facet.vertices) {
            let owners = &ridge_owners[&ridge];
            let crosses = owners
                .iter()
                .any(|owner| *owner != id && !visible.contains(owner));
            if crosses {
                horizon.push(ridge);
            }
        }
    }

    for &id in &visible {
        facets[id] = None;
    }

    for ridge in horizon {
        let mut vertices = ridge;
        vertices.push(point_index);
        if let Some(facet) = make_facet(points, vertices, interior) {
            facets.push(Some(facet));
        }
    }
}

fn ridges(vertices: &[usize]) -> Vec<Vec<usize>> {
    (0..vertices.len())
        .map(|omit| {
            let mut ridge: Vec<usize> = vertices
                .iter()
                .enumerate()
                .filter_map(|(k, &v)| (k != omit).then_some(v))
                .collect();
            ridge.sort_unstable();
            ridge
        })
        .collect()
}

/// Assemble a facet from d point indices, oriented away from the
/// interior reference point. Degenerate (affinely dependent) vertex sets
/// yield no facet.
fn make_facet(points: &[Point], vertices: Vec<usize>, interior: &Point) -> Option<Facet> {
    let facet_points: Vec<&Point> = vertices.iter().map(|&index| &points[index]).collect();
    let mut normal = facet_normal(&facet_points)?;
    let mut offset = dot(&normal, facet_points[0]);
    let inner = dot(&normal, interior);
    match inner.cmp(&offset) {
        std::cmp::Ordering::Less => {}
        std::cmp::Ordering::Greater => {
            normal = negate(&normal);
            offset = -offset;
        }
        std::cmp::Ordering::Equal => return None,
    }
    Some(Facet {
        vertices,
        normal,
        offset,
        confirmed: false,
    })
}

/// Generalized cross product: the vector orthogonal to the affine hull
/// of `d` points in ℚ^d, by cofactor expansion over their difference
/// matrix. Returns `None` when the points are affinely dependent.
fn facet_normal(facet_points: &[&Point]) -> Option<Vector> {
    let dim = facet_points[0].len();
    debug_assert_eq!(facet_points.len(), dim);
    let rows: Vec<Vector> = facet_points[1..]
        .iter()
        .map(|p| subtract(p, facet_points[0]))
        .collect();

    let mut normal = Vec::with_capacity(dim);
    for drop_col in 0..dim {
        let minor: Vec<Vector> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter_map(|(c, value)| (c != drop_col).then(|| value.clone()))
                    .collect()
            })
            .collect();
        let mut cofactor = determinant(&minor);
        if drop_col % 2 == 1 {
            cofactor = -cofactor;
        }
        normal.push(cofactor);
    }
    normal.iter().any(|c| !c.is_zero()).then_some(normal)
}

fn determinant(matrix: &[Vector]) -> Rational {
    match matrix.len() {
        0 => Rational::one(),
        1 => matrix[0][0].clone(),
        n => {
            let mut total = Rational::zero();
            for k in 0..n {
                if matrix[0][k].is_zero() {
                    continue;
                }
                let minor: Vec<Vector> = matrix[1..]
                    .iter()
                    .map(|row| {
                        row.iter()
                            .enumerate()
                            .filter_map(|(c, value)| (c != k).then(|| value.clone()))
                            .collect()
                    })
                    .collect();
                let mut term = &matrix[0][k] * &determinant(&minor);
                if k % 2 == 1 {
                    term = -term;
                }
                total = &total + &term;
            }
            total
        }
    }
}

/// Exact dot product.
pub fn dot(a: &[Rational], b: &[Rational]) -> Rational {
    debug_assert_eq!(a.len(), b.len());
    let mut total = Rational::zero();
    for (x, y) in a.iter().zip(b) {
        total = &total + &(x * y);
    }
    total
}

fn subtract(a: &[Rational], b: &[Rational]) -> Vector {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

fn negate(v: &[Rational]) -> Vector {
    v.iter().map(|x| -x).collect()
}

fn unit(dim: usize, axis: usize, negative: bool) -> Vector {
    let mut v = vec![Rational::zero(); dim];
    v[axis] = if negative {
        -Rational::one()
    } else {
        Rational::one()
    };
    v
}

fn centroid(points: &[&Point]) -> Point {
    let dim = points[0].len();
    let count = Rational::from_integer((points.len() as i64).into());
    (0..dim)
        .map(|c| {
            let mut total = Rational::zero();
            for p in points {
                total = &total + &p[c];
            }
            &total / &count
        })
        .collect()
}

fn push_distinct(points: &mut Vec<Point>, candidate: Point) {
    if !points.iter().any(|existing| existing == &candidate) {
        points.push(candidate);
    }
}

fn row_echelon(mut rows: Vec<Vector>) -> Vec<Vector> {
    let dim = rows.first().map_or(0, Vec::len);
    let mut rank = 0;
    for col in 0..dim {
        let Some(pivot) = (rank..rows.len()).find(|&r| !rows[r][col].is_zero()) else {
            continue;
        };
        rows.swap(rank, pivot);
        for r in (rank + 1)..rows.len() {
            if rows[r][col].is_zero() {
                continue;
            }
            let factor = &rows[r][col] / &rows[rank][col];
            for c in col..dim {
                rows[r][c] = &rows[r][c] - &(&factor * &rows[rank][c]);
            }
        }
        rank += 1;
        if rank == rows.len() {
            break;
        }
    }
    rows.truncate(rank);
    rows.retain(|row| row.iter().any(|x| !x.is_zero()));
    rows
}

fn affine_differences(points: &[Point]) -> Vec<Vector> {
    match points.split_first() {
        Some((base, rest)) => rest.iter().map(|p| subtract(p, base)).collect(),
        None => Vec::new(),
    }
}

fn affine_rank(points: &[Point]) -> usize {
    row_echelon(affine_differences(points)).len()
}

/// A nonzero vector orthogonal to the affine span of `points`, or `None`
/// when the span already fills the space.
fn orthogonal_to_affine_span(points: &[Point], dim: usize) -> Option<Vector> {
    let rows = row_echelon(affine_differences(points));
    if rows.len() >= dim {
        return None;
    }
    let pivots: Vec<usize> = rows
        .iter()
        .map(|row| row.iter().position(|x| !x.is_zero()).expect("nonzero row"))
        .collect();
    let free = (0..dim).find(|c| !pivots.contains(c))?;

    let mut v = vec![Rational::zero(); dim];
    v[free] = Rational::one();
    for (row, &pivot_col) in rows.iter().zip(&pivots).rev() {
        let mut total = Rational::zero();
        for c in (pivot_col + 1)..dim {
            total = &total + &(&row[c] * &v[c]);
        }
        v[pivot_col] = -(&total / &row[pivot_col]);
    }
    Some(v)
}

/// Greedily pick d+1 affinely independent points.
fn independent_simplex(points: &[Point], dim: usize) -> Option<Vec<usize>> {
    let mut chosen: Vec<usize> = vec![0];
    for candidate in 1..points.len() {
        if chosen.len() == dim + 1 {
            break;
        }
        let mut trial: Vec<Point> = chosen.iter().map(|&i| points[i].clone()).collect();
        trial.push(points[candidate].clone());
        if affine_rank(&trial) > chosen.len() - 1 {
            chosen.push(candidate);
        }
    }
    (chosen.len() == dim + 1).then_some(chosen)
}
