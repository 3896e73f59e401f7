//! Polynomial roots as eigenvalues of the companion matrix.
//!
//! The companion matrix is already upper Hessenberg, so after diagonal
//! balancing it goes straight into the shifted double-step QR iteration.
//! Complex conjugate pairs fall out of the 2x2 deflations.

use rustfft::num_complex::Complex;

use crate::error::AnalysisError;

const RADIX: f64 = 2.0;
const MAX_ITERATIONS: usize = 30;

/// Roots of `c[0]·zⁿ + c[1]·zⁿ⁻¹ + … + c[n]`, in no particular order.
pub fn polynomial_roots(coeffs: &[f64]) -> Result<Vec<Complex<f64>>, AnalysisError> {
    let leading = coeffs.iter().position(|&c| c != 0.0);
    let Some(start) = leading else {
        return Ok(Vec::new());
    };
    let coeffs = &coeffs[start..];

    // trailing zero coefficients are roots at the origin
    let end = coeffs
        .iter()
        .rposition(|&c| c != 0.0)
        .map_or(0, |p| p + 1);
    let zero_roots = coeffs.len() - end;
    let coeffs = &coeffs[..end];

    let mut roots = vec![Complex::new(0.0, 0.0); zero_roots];
    let degree = coeffs.len() - 1;
    match degree {
        0 => {}
        1 => roots.push(Complex::new(-coeffs[1] / coeffs[0], 0.0)),
        _ => {
            let mut a = companion(coeffs);
            balance(&mut a, degree);
            roots.extend(hessenberg_eigenvalues(&mut a, degree)?);
        }
    }
    Ok(roots)
}

/// 1-based `(n+1)×(n+1)` storage; row and column 0 are unused so the
/// deflation bookkeeping below reads like the textbook recurrence.
type Matrix = Vec<Vec<f64>>;

fn companion(coeffs: &[f64]) -> Matrix {
    let n = coeffs.len() - 1;
    let mut a = vec![vec![0.0; n + 1]; n + 1];
    for j in 1..=n {
        a[1][j] = -coeffs[j] / coeffs[0];
    }
    for i in 2..=n {
        a[i][i - 1] = 1.0;
    }
    a
}

/// Diagonal similarity transform equalizing row and column norms.
fn balance(a: &mut Matrix, n: usize) {
    let sqrdx = RADIX * RADIX;
    let mut done = false;
    while !done {
        done = true;
        for i in 1..=n {
            let mut r = 0.0;
            let mut c = 0.0;
            for j in 1..=n {
                if j != i {
                    c += a[j][i].abs();
                    r += a[i][j].abs();
                }
            }
            if c == 0.0 || r == 0.0 {
                continue;
            }
            let s = c + r;
            let mut f = 1.0;
            let mut g = r / RADIX;
            while c < g {
                f *= RADIX;
                c *= sqrdx;
            }
            g = r * RADIX;
            while c > g {
                f /= RADIX;
                c /= sqrdx;
            }
            if (c + r) / f < 0.95 * s {
                done = false;
                let g = 1.0 / f;
                for j in 1..=n {
                    a[i][j] *= g;
                }
                for j in 1..=n {
                    a[j][i] *= f;
                }
            }
        }
    }
}

fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

/// Eigenvalues of an upper Hessenberg matrix (destroyed in the process).
fn hessenberg_eigenvalues(a: &mut Matrix, n: usize) -> Result<Vec<Complex<f64>>, AnalysisError> {
    let mut wr = vec![0.0; n + 1];
    let mut wi = vec![0.0; n + 1];

    let mut anorm = 0.0;
    for i in 1..=n {
        for j in i.saturating_sub(1).max(1)..=n {
            anorm += a[i][j].abs();
        }
    }

    let mut nn = n;
    let mut t = 0.0;

    while nn >= 1 {
        let mut its = 0;
        loop {
            // look for a single small subdiagonal element
            let mut l = nn;
            while l >= 2 {
                let mut s = a[l - 1][l - 1].abs() + a[l][l].abs();
                if s == 0.0 {
                    s = anorm;
                }
                if a[l][l - 1].abs() + s == s {
                    a[l][l - 1] = 0.0;
                    break;
                }
                l -= 1;
            }

            let mut x = a[nn][nn];
            if l == nn {
                // one real root
                wr[nn] = x + t;
                wi[nn] = 0.0;
                nn -= 1;
                break;
            }

            let mut y = a[nn - 1][nn - 1];
            let mut w = a[nn][nn - 1] * a[nn - 1][nn];
            if l == nn - 1 {
                // two roots, real pair or complex conjugates
                let p = 0.5 * (y - x);
                let q = p * p + w;
                let mut z = q.abs().sqrt();
                x += t;
                if q >= 0.0 {
                    z = p + sign(z, p);
                    wr[nn - 1] = x + z;
                    wr[nn] = x + z;
                    if z != 0.0 {
                        wr[nn] = x - w / z;
                    }
                    wi[nn - 1] = 0.0;
                    wi[nn] = 0.0;
                } else {
                    wr[nn - 1] = x + p;
                    wr[nn] = x + p;
                    wi[nn - 1] = -z;
                    wi[nn] = z;
                }
                nn = nn.saturating_sub(2);
                break;
            }

            if its == MAX_ITERATIONS {
                return Err(AnalysisError::RootsDidNotConverge { degree: n });
            }
            if its == 10 || its == 20 {
                // exceptional shift
                t += x;
                for i in 1..=nn {
                    a[i][i] -= x;
                }
                let s = a[nn][nn - 1].abs() + a[nn - 1][nn - 2].abs();
                x = 0.75 * s;
                y = x;
                w = -0.4375 * s * s;
            }
            its += 1;

            // two consecutive small subdiagonal elements
            let (mut p, mut q, mut r, mut z);
            let mut m = nn - 2;
            loop {
                z = a[m][m];
                r = x - z;
                let s = y - z;
                p = (r * s - w) / a[m + 1][m] + a[m][m + 1];
                q = a[m + 1][m + 1] - z - r - s;
                r = a[m + 2][m + 1];
                let s = p.abs() + q.abs() + r.abs();
                p /= s;
                q /= s;
                r /= s;
                if m == l {
                    break;
                }
                let u = a[m][m - 1].abs() * (q.abs() + r.abs());
                let v = p.abs() * (a[m - 1][m - 1].abs() + z.abs() + a[m + 1][m + 1].abs());
                if u + v == v {
                    break;
                }
                m -= 1;
            }

            for i in (m + 2)..=nn {
                a[i][i - 2] = 0.0;
                if i != m + 2 {
                    a[i][i - 3] = 0.0;
                }
            }

            // double QR step on rows l..nn, columns m..nn
            for k in m..nn {
                if k != m {
                    p = a[k][k - 1];
                    q = a[k + 1][k - 1];
                    r = 0.0;
                    if k != nn - 1 {
                        r = a[k + 2][k - 1];
                    }
                    x = p.abs() + q.abs() + r.abs();
                    if x != 0.0 {
                        p /= x;
                        q /= x;
                        r /= x;
                    }
                }
                let s = sign((p * p + q * q + r * r).sqrt(), p);
                if s == 0.0 {
                    continue;
                }
                if k == m {
                    if l != m {
                        a[k][k - 1] = -a[k][k - 1];
                    }
                } else {
                    a[k][k - 1] = -s * x;
                }
                p += s;
                x = p / s;
                y = q / s;
                z = r / s;
                q /= p;
                r /= p;
                for j in k..=nn {
                    p = a[k][j] + q * a[k + 1][j];
                    if k != nn - 1 {
                        p += r * a[k + 2][j];
                        a[k + 2][j] -= p * z;
                    }
                    a[k + 1][j] -= p * y;
                    a[k][j] -= p * x;
                }
                let mmin = nn.min(k + 3);
                for i in l..=mmin {
                    p = x * a[i][k] + y * a[i][k + 1];
                    if k != nn - 1 {
                        p += z * a[i][k + 2];
                        a[i][k + 2] -= p * r;
                    }
                    a[i][k + 1] -= p * q;
                    a[i][k] -= p;
                }
            }
        }
    }

    let roots = (1..=n).map(|i| Complex::new(wr[i], wi[i])).collect::<Vec<_>>();
    if roots.iter().any(|c| !(c.re.is_finite() && c.im.is_finite())) {
        return Err(AnalysisError::RootsDidNotConverge { degree: n });
    }
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sorted(mut roots: Vec<Complex<f64>>) -> Vec<Complex<f64>> {
        roots.sort_by(|a, b| {
            a.re.partial_cmp(&b.re)
                .unwrap()
                .then(a.im.partial_cmp(&b.im).unwrap())
        });
        roots
    }

    fn evaluate(coeffs: &[f64], z: Complex<f64>) -> Complex<f64> {
        coeffs
            .iter()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * z + c)
    }

    #[test]
    fn linear_and_constant() {
        assert!(polynomial_roots(&[5.0]).unwrap().is_empty());
        assert!(polynomial_roots(&[0.0, 0.0]).unwrap().is_empty());
        let roots = polynomial_roots(&[2.0, -6.0]).unwrap();
        assert_eq!(roots.len(), 1);
        assert!((roots[0].re - 3.0).abs() < 1e-12);
    }

    #[test]
    fn real_cubic() {
        // (z-1)(z-2)(z-3)
        let roots = sorted(polynomial_roots(&[1.0, -6.0, 11.0, -6.0]).unwrap());
        assert_eq!(roots.len(), 3);
        for (root, expected) in roots.iter().zip([1.0, 2.0, 3.0]) {
            assert!((root.re - expected).abs() < 1e-9, "got {:?}", roots);
            assert!(root.im.abs() < 1e-9);
        }
    }

    #[test]
    fn conjugate_pair() {
        // z^2 + 1
        let roots = sorted(polynomial_roots(&[1.0, 0.0, 1.0]).unwrap());
        assert!((roots[0].im + 1.0).abs() < 1e-12);
        assert!((roots[1].im - 1.0).abs() < 1e-12);
        assert!(roots[0].re.abs() < 1e-12);
    }

    #[test]
    fn zeros_at_origin_are_kept() {
        // z^3 - z^2 = z^2 (z - 1)
        let roots = sorted(polynomial_roots(&[1.0, -1.0, 0.0, 0.0]).unwrap());
        assert_eq!(roots.len(), 3);
        assert_eq!(roots[0], Complex::new(0.0, 0.0));
        assert!((roots[2].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn recovers_resonator_poles() {
        // product of three resonator sections, the shape LPC polynomials take
        let sample_rate = 16000.0;
        let poles = [(500.0, 80.0), (1500.0, 120.0), (2500.0, 200.0)];
        let mut poly = vec![1.0];
        for &(freq, bw) in &poles {
            let radius = (-PI * bw / sample_rate).exp();
            let theta = 2.0 * PI * freq / sample_rate;
            let section = [1.0, -2.0 * radius * theta.cos(), radius * radius];
            let mut next = vec![0.0; poly.len() + 2];
            for (i, &a) in poly.iter().enumerate() {
                for (j, &b) in section.iter().enumerate() {
                    next[i + j] += a * b;
                }
            }
            poly = next;
        }

        let roots = polynomial_roots(&poly).unwrap();
        assert_eq!(roots.len(), 6);
        for root in &roots {
            assert!(evaluate(&poly, *root).norm() < 1e-9);
        }
        for &(freq, _) in &poles {
            let found = roots.iter().any(|r| {
                r.im > 0.0 && (r.arg() / (2.0 * PI) * sample_rate - freq).abs() < 1e-6
            });
            assert!(found, "missing pole at {} Hz in {:?}", freq, roots);
        }
    }

    #[test]
    fn lpc_order_polynomial() {
        // seven resonator sections give a degree 14 polynomial
        let sample_rate = 44100.0;
        let poles = [
            (300.0, 60.0),
            (900.0, 90.0),
            (2200.0, 150.0),
            (3300.0, 250.0),
            (5000.0, 400.0),
            (8000.0, 900.0),
            (12000.0, 1500.0),
        ];
        let mut poly = vec![1.0];
        for &(freq, bw) in &poles {
            let radius = (-PI * bw / sample_rate).exp();
            let theta = 2.0 * PI * freq / sample_rate;
            let section = [1.0, -2.0 * radius * theta.cos(), radius * radius];
            let mut next = vec![0.0; poly.len() + 2];
            for (i, &a) in poly.iter().enumerate() {
                for (j, &b) in section.iter().enumerate() {
                    next[i + j] += a * b;
                }
            }
            poly = next;
        }
        assert_eq!(poly.len(), 15);

        let roots = polynomial_roots(&poly).unwrap();
        assert_eq!(roots.len(), 14);
        for &(freq, bw) in &poles {
            let found = roots.iter().any(|r| {
                r.im > 0.0
                    && (r.arg() / (2.0 * PI) * sample_rate - freq).abs() < 0.5
                    && (-r.norm().ln() / PI * sample_rate - bw).abs() < 0.5
            });
            assert!(found, "missing pole at {} Hz in {:?}", freq, roots);
        }
    }
}
