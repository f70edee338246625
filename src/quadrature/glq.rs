use nalgebra::{DMatrix, SymmetricEigen};

// https://en.wikipedia.org/wiki/Gaussian_quadrature#Gauss%E2%80%93Legendre_quadrature
/// Gauss Legendre Quadrature points and weights on [-1, +1] via Golub-Welsch:
/// the nodes are the eigenvalues of the symmetric tridiagonal Jacobi matrix,
/// the weights are twice the squared first components of its eigenvectors.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let betas: Vec<f64> = (1..n)
        .map(|i| 0.5 / (1.0 - (2.0 * i as f64).powi(-2)).sqrt())
        .collect();

    let polymat: DMatrix<f64> = DMatrix::from_fn(n, n, |r, c| {
        if r == c + 1 {
            betas[r - 1]
        } else if c == r + 1 {
            betas[c - 1]
        } else {
            0.0
        }
    });

    let eigen_decomp = SymmetricEigen::new(polymat);

    let mut xw: Vec<(f64, f64)> = eigen_decomp
        .eigenvalues
        .iter()
        .cloned()
        .zip(
            eigen_decomp
                .eigenvectors
                .row(0)
                .iter()
                .map(|weight| (*weight).powi(2) * 2.0),
        )
        .collect();

    xw.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    xw.drain(0..).unzip()
}

/// Affinely map points defined on [-1, +1] onto [min, max]. Returns the
/// interval scaling factor (the weight multiplier) along with the mapped
/// points.
pub fn scale_to_interval(points: &[f64], min: f64, max: f64) -> (f64, Vec<f64>) {
    let scale_factor = (max - min) / 2.0;
    let offset = (max + min) / 2.0;

    (
        scale_factor,
        points
            .iter()
            .map(|x| x * scale_factor + offset)
            .collect::<Vec<f64>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLQ_ACCURACY: f64 = 1e-9;

    // reference values for the 20 point rule
    const X_20: [f64; 20] = [
        -0.993128599,
        -0.963971927,
        -0.912234428,
        -0.839116972,
        -0.746331906,
        -0.636053681,
        -0.510867002,
        -0.373706089,
        -0.227785851,
        -0.076526521,
        0.076526521,
        0.227785851,
        0.373706089,
        0.510867002,
        0.636053681,
        0.746331906,
        0.839116972,
        0.912234428,
        0.963971927,
        0.993128599,
    ];
    const W_20: [f64; 20] = [
        0.017614007,
        0.04060143,
        0.062672048,
        0.083276742,
        0.10193012,
        0.118194532,
        0.131688638,
        0.142096109,
        0.149172986,
        0.152753387,
        0.152753387,
        0.149172986,
        0.142096109,
        0.131688638,
        0.118194532,
        0.10193012,
        0.083276742,
        0.062672048,
        0.04060143,
        0.017614007,
    ];

    #[test]
    fn glq_point_generation_and_scaling() {
        let (glq_points, glq_weights) = gauss_legendre(20);

        for (glq_ref, glq_test) in X_20.iter().zip(glq_points.iter()) {
            assert!((glq_ref - glq_test).abs() < GLQ_ACCURACY);
        }

        for (glq_w_ref, glq_w_test) in W_20.iter().zip(glq_weights.iter()) {
            assert!((glq_w_ref - glq_w_test).abs() < GLQ_ACCURACY);
        }

        let (glq_scale, glq_scaled_points) = scale_to_interval(&glq_points, 0.25, 0.5);

        assert!((glq_scale - 0.125).abs() < 1e-14);
        for (raw, scaled) in glq_points.iter().zip(glq_scaled_points.iter()) {
            assert!((raw * 0.125 + 0.375 - scaled).abs() < 1e-14);
        }
    }

    #[test]
    fn single_point_rule_is_the_midpoint() {
        let (points, weights) = gauss_legendre(1);
        assert_eq!(points.len(), 1);
        assert!(points[0].abs() < 1e-14);
        assert!((weights[0] - 2.0).abs() < 1e-14);
    }

    #[test]
    fn monomials_integrate_exactly() {
        // an n point rule is exact through degree 2n - 1
        for n in 1..=8 {
            let (points, weights) = gauss_legendre(n);
            for k in 0..=(2 * n - 1) {
                let numeric: f64 = points
                    .iter()
                    .zip(weights.iter())
                    .map(|(x, w)| w * x.powi(k as i32))
                    .sum();
                let exact = if k % 2 == 0 { 2.0 / (k as f64 + 1.0) } else { 0.0 };
                assert!(
                    (numeric - exact).abs() < 1e-13,
                    "n = {}, k = {}: {} != {}",
                    n,
                    k,
                    numeric,
                    exact
                );
            }
        }
    }
}
