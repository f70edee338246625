//! Construction of the per-family rule tables.
//!
//! Low-order simplex rules are entered from their exact rational or surd
//! closed forms; everything above them is a collapsed (Duffy-transformed)
//! tensor product of Gauss-Legendre rules, so every stored value is accurate
//! to machine precision. Tables are built once, on first use.

use once_cell::sync::Lazy;

use super::glq::gauss_legendre;
use super::{QuadratureRule, QuadratureTable, RefDomain};

static LINE: Lazy<QuadratureTable> = Lazy::new(build_line);
static TRIANGLE: Lazy<QuadratureTable> = Lazy::new(build_triangle);
static QUADRILATERAL: Lazy<QuadratureTable> = Lazy::new(build_quadrilateral);
static TETRAHEDRON: Lazy<QuadratureTable> = Lazy::new(build_tetrahedron);
static HEXAHEDRON: Lazy<QuadratureTable> = Lazy::new(build_hexahedron);
static PRISM: Lazy<QuadratureTable> = Lazy::new(build_prism);
static PYRAMID: Lazy<QuadratureTable> = Lazy::new(build_pyramid);

pub(super) fn table(domain: RefDomain) -> &'static QuadratureTable {
    match domain {
        RefDomain::Line => &LINE,
        RefDomain::Triangle => &TRIANGLE,
        RefDomain::Quadrilateral => &QUADRILATERAL,
        RefDomain::Tetrahedron => &TETRAHEDRON,
        RefDomain::Hexahedron => &HEXAHEDRON,
        RefDomain::Prism => &PRISM,
        RefDomain::Pyramid => &PYRAMID,
    }
}

/// Gauss-Legendre points mapped from [-1, 1] onto [0, 1], weights halved
fn gauss_legendre_unit(n: usize) -> (Vec<f64>, Vec<f64>) {
    let (points, weights) = gauss_legendre(n);
    (
        points.iter().map(|x| 0.5 * (x + 1.0)).collect(),
        weights.iter().map(|w| 0.5 * w).collect(),
    )
}

fn build_line() -> QuadratureTable {
    let rules = [1, 2, 3, 4, 5, 6, 7, 8, 10, 12, 16]
        .iter()
        .map(|&n| {
            let (points, weights) = gauss_legendre(n);
            QuadratureRule::with(n, 2 * n - 1, [points, Vec::new(), Vec::new()], weights)
        })
        .collect();

    QuadratureTable::with(RefDomain::Line, rules)
}

// --- triangle -------------------------------------------------------------

/// Accumulates the three cyclic images of the barycentric point
/// (1-2a, a, a) as (ξ, η) pairs, all with the same weight
fn push_tri_family(a: f64, w: f64, ksi: &mut Vec<f64>, eta: &mut Vec<f64>, weights: &mut Vec<f64>) {
    let b = 1.0 - 2.0 * a;
    for (x, y) in [(b, a), (a, b), (a, a)] {
        ksi.push(x);
        eta.push(y);
        weights.push(w);
    }
}

fn tri_centroid_rule() -> QuadratureRule {
    QuadratureRule::with(
        1,
        1,
        [vec![1.0 / 3.0], vec![1.0 / 3.0], Vec::new()],
        vec![0.5],
    )
}

fn tri_rule_3() -> QuadratureRule {
    let (mut ksi, mut eta, mut weights) = (Vec::new(), Vec::new(), Vec::new());
    push_tri_family(1.0 / 6.0, 1.0 / 6.0, &mut ksi, &mut eta, &mut weights);
    QuadratureRule::with(3, 2, [ksi, eta, Vec::new()], weights)
}

fn tri_rule_4() -> QuadratureRule {
    let mut ksi = vec![1.0 / 3.0];
    let mut eta = vec![1.0 / 3.0];
    let mut weights = vec![-27.0 / 96.0];
    push_tri_family(0.2, 25.0 / 96.0, &mut ksi, &mut eta, &mut weights);
    QuadratureRule::with(4, 3, [ksi, eta, Vec::new()], weights)
}

/// Cowper's 6 point rule; the point parameters and weights are roots of
/// quadratics with the surd closed forms used below
fn tri_rule_6() -> QuadratureRule {
    let s10 = 10.0_f64.sqrt();
    let t = (38.0 - 44.0 * (0.4_f64).sqrt()).sqrt();
    let a_hi = (8.0 - s10 + t) / 18.0;
    let a_lo = (8.0 - s10 - t) / 18.0;

    let u = (213125.0 - 53320.0 * s10).sqrt();
    let w_hi = (620.0 + u) / 3720.0 * 0.5;
    let w_lo = (620.0 - u) / 3720.0 * 0.5;

    let (mut ksi, mut eta, mut weights) = (Vec::new(), Vec::new(), Vec::new());
    push_tri_family(a_hi, w_hi, &mut ksi, &mut eta, &mut weights);
    push_tri_family(a_lo, w_lo, &mut ksi, &mut eta, &mut weights);
    QuadratureRule::with(6, 4, [ksi, eta, Vec::new()], weights)
}

fn tri_rule_7() -> QuadratureRule {
    let s15 = 15.0_f64.sqrt();

    let mut ksi = vec![1.0 / 3.0];
    let mut eta = vec![1.0 / 3.0];
    let mut weights = vec![9.0 / 80.0];
    push_tri_family(
        (6.0 + s15) / 21.0,
        (155.0 + s15) / 1200.0 * 0.5,
        &mut ksi,
        &mut eta,
        &mut weights,
    );
    push_tri_family(
        (6.0 - s15) / 21.0,
        (155.0 - s15) / 1200.0 * 0.5,
        &mut ksi,
        &mut eta,
        &mut weights,
    );
    QuadratureRule::with(7, 5, [ksi, eta, Vec::new()], weights)
}

/// Duffy-collapsed n×n tensor product: ξ = u, η = v(1-u) with the area factor
/// (1-u) folded into the weights. Exact for total degree 2n-2.
fn collapsed_tri_rule(n: usize) -> QuadratureRule {
    let (points, weights_1d) = gauss_legendre_unit(n);

    let num = n * n;
    let mut ksi = Vec::with_capacity(num);
    let mut eta = Vec::with_capacity(num);
    let mut weights = Vec::with_capacity(num);

    for (u, wu) in points.iter().zip(weights_1d.iter()) {
        for (v, wv) in points.iter().zip(weights_1d.iter()) {
            ksi.push(*u);
            eta.push(v * (1.0 - u));
            weights.push(wu * wv * (1.0 - u));
        }
    }

    QuadratureRule::with(num, 2 * n - 2, [ksi, eta, Vec::new()], weights)
}

fn build_triangle() -> QuadratureTable {
    let mut rules = vec![
        tri_centroid_rule(),
        tri_rule_3(),
        tri_rule_4(),
        tri_rule_6(),
        tri_rule_7(),
    ];
    for n in [4, 5, 6, 7, 8] {
        rules.push(collapsed_tri_rule(n));
    }

    QuadratureTable::with(RefDomain::Triangle, rules)
}

// --- tensor-product domains -----------------------------------------------

fn tensor_quad_rule(n: usize) -> QuadratureRule {
    let (points, weights_1d) = gauss_legendre(n);

    let num = n * n;
    let mut ksi = Vec::with_capacity(num);
    let mut eta = Vec::with_capacity(num);
    let mut weights = Vec::with_capacity(num);

    for (x, wx) in points.iter().zip(weights_1d.iter()) {
        for (y, wy) in points.iter().zip(weights_1d.iter()) {
            ksi.push(*x);
            eta.push(*y);
            weights.push(wx * wy);
        }
    }

    QuadratureRule::with(num, 2 * n - 1, [ksi, eta, Vec::new()], weights)
}

fn build_quadrilateral() -> QuadratureTable {
    let rules = (1..=8).map(tensor_quad_rule).collect();
    QuadratureTable::with(RefDomain::Quadrilateral, rules)
}

fn tensor_hexa_rule(n: usize) -> QuadratureRule {
    let (points, weights_1d) = gauss_legendre(n);

    let num = n * n * n;
    let mut ksi = Vec::with_capacity(num);
    let mut eta = Vec::with_capacity(num);
    let mut zeta = Vec::with_capacity(num);
    let mut weights = Vec::with_capacity(num);

    for (x, wx) in points.iter().zip(weights_1d.iter()) {
        for (y, wy) in points.iter().zip(weights_1d.iter()) {
            for (z, wz) in points.iter().zip(weights_1d.iter()) {
                ksi.push(*x);
                eta.push(*y);
                zeta.push(*z);
                weights.push(wx * wy * wz);
            }
        }
    }

    QuadratureRule::with(num, 2 * n - 1, [ksi, eta, zeta], weights)
}

fn build_hexahedron() -> QuadratureTable {
    let rules = (1..=5).map(tensor_hexa_rule).collect();
    QuadratureTable::with(RefDomain::Hexahedron, rules)
}

// --- tetrahedron ----------------------------------------------------------

fn tet_rule_1() -> QuadratureRule {
    QuadratureRule::with(
        1,
        1,
        [vec![0.25], vec![0.25], vec![0.25]],
        vec![1.0 / 6.0],
    )
}

/// 4 point rule at the barycentric permutations of ((5+3√5)/20, (5-√5)/20 ×3)
fn tet_rule_4() -> QuadratureRule {
    let s5 = 5.0_f64.sqrt();
    let a = (5.0 + 3.0 * s5) / 20.0;
    let b = (5.0 - s5) / 20.0;

    // barycentric (L1, L2, L3, L4) maps to (ξ, η, ζ) = (L2, L3, L4)
    let bary = [[a, b, b, b], [b, a, b, b], [b, b, a, b], [b, b, b, a]];

    let ksi = bary.iter().map(|p| p[1]).collect();
    let eta = bary.iter().map(|p| p[2]).collect();
    let zeta = bary.iter().map(|p| p[3]).collect();

    QuadratureRule::with(4, 2, [ksi, eta, zeta], vec![1.0 / 24.0; 4])
}

fn tet_rule_5() -> QuadratureRule {
    let sixth = 1.0 / 6.0;
    let bary = [
        [0.25, 0.25, 0.25, 0.25],
        [0.5, sixth, sixth, sixth],
        [sixth, 0.5, sixth, sixth],
        [sixth, sixth, 0.5, sixth],
        [sixth, sixth, sixth, 0.5],
    ];

    let ksi = bary.iter().map(|p| p[1]).collect();
    let eta = bary.iter().map(|p| p[2]).collect();
    let zeta = bary.iter().map(|p| p[3]).collect();

    let weights = vec![-2.0 / 15.0, 3.0 / 40.0, 3.0 / 40.0, 3.0 / 40.0, 3.0 / 40.0];

    QuadratureRule::with(5, 3, [ksi, eta, zeta], weights)
}

/// Double-Duffy collapse of an n³ tensor product onto the reference
/// tetrahedron. Exact for total degree 2n-3.
fn collapsed_tet_rule(n: usize) -> QuadratureRule {
    let (points, weights_1d) = gauss_legendre_unit(n);

    let num = n * n * n;
    let mut ksi = Vec::with_capacity(num);
    let mut eta = Vec::with_capacity(num);
    let mut zeta = Vec::with_capacity(num);
    let mut weights = Vec::with_capacity(num);

    for (u, wu) in points.iter().zip(weights_1d.iter()) {
        for (v, wv) in points.iter().zip(weights_1d.iter()) {
            for (w, ww) in points.iter().zip(weights_1d.iter()) {
                let jac = (1.0 - u).powi(2) * (1.0 - v);
                ksi.push(*u);
                eta.push(v * (1.0 - u));
                zeta.push(w * (1.0 - u) * (1.0 - v));
                weights.push(wu * wv * ww * jac);
            }
        }
    }

    QuadratureRule::with(num, 2 * n - 3, [ksi, eta, zeta], weights)
}

fn build_tetrahedron() -> QuadratureTable {
    let mut rules = vec![tet_rule_1(), tet_rule_4(), tet_rule_5()];
    for n in [4, 5, 6] {
        rules.push(collapsed_tet_rule(n));
    }

    QuadratureTable::with(RefDomain::Tetrahedron, rules)
}

// --- prism ----------------------------------------------------------------

/// Product of a triangle rule (ξ, η) with a Gauss-Legendre line rule along ζ
fn prism_rule(tri: &QuadratureRule, n_line: usize, degree: usize) -> QuadratureRule {
    let (line_points, line_weights) = gauss_legendre(n_line);

    let num = tri.num_points() * n_line;
    let mut ksi = Vec::with_capacity(num);
    let mut eta = Vec::with_capacity(num);
    let mut zeta = Vec::with_capacity(num);
    let mut weights = Vec::with_capacity(num);

    for (idx, wt) in tri.weights().iter().enumerate() {
        for (z, wz) in line_points.iter().zip(line_weights.iter()) {
            ksi.push(tri.ksi()[idx]);
            eta.push(tri.eta()[idx]);
            zeta.push(*z);
            weights.push(wt * wz);
        }
    }

    QuadratureRule::with(num, degree, [ksi, eta, zeta], weights)
}

fn build_prism() -> QuadratureTable {
    let rules = vec![
        prism_rule(&tri_centroid_rule(), 1, 1),
        prism_rule(&tri_rule_3(), 2, 2),
        prism_rule(&tri_rule_4(), 2, 3),
        prism_rule(&tri_rule_6(), 3, 4),
        prism_rule(&tri_rule_7(), 3, 5),
        prism_rule(&collapsed_tri_rule(4), 4, 6),
        prism_rule(&collapsed_tri_rule(5), 5, 8),
    ];

    QuadratureTable::with(RefDomain::Prism, rules)
}

// --- pyramid --------------------------------------------------------------

/// Collapsed rule on the reference pyramid (base [-1,1]² at ζ = 0, apex at
/// (0, 0, 1)): ξ = u(1-ζ), η = v(1-ζ) with the (1-ζ)² volume factor in the
/// weights. u, v from an n point rule, ζ from an m point rule on [0, 1];
/// exact for total degree min(2n-1, 2m-3).
fn pyramid_rule(n: usize, m: usize) -> QuadratureRule {
    let (uv_points, uv_weights) = gauss_legendre(n);
    let (z_points, z_weights) = gauss_legendre_unit(m);

    let num = n * n * m;
    let mut ksi = Vec::with_capacity(num);
    let mut eta = Vec::with_capacity(num);
    let mut zeta = Vec::with_capacity(num);
    let mut weights = Vec::with_capacity(num);

    for (u, wu) in uv_points.iter().zip(uv_weights.iter()) {
        for (v, wv) in uv_points.iter().zip(uv_weights.iter()) {
            for (z, wz) in z_points.iter().zip(z_weights.iter()) {
                ksi.push(u * (1.0 - z));
                eta.push(v * (1.0 - z));
                zeta.push(*z);
                weights.push(wu * wv * wz * (1.0 - z).powi(2));
            }
        }
    }

    let degree = (2 * n - 1).min(2 * m - 3);
    QuadratureRule::with(num, degree, [ksi, eta, zeta], weights)
}

fn build_pyramid() -> QuadratureTable {
    let rules = vec![
        pyramid_rule(1, 2),
        pyramid_rule(2, 3),
        pyramid_rule(3, 4),
        pyramid_rule(4, 5),
        pyramid_rule(5, 6),
    ];

    QuadratureTable::with(RefDomain::Pyramid, rules)
}
