use nalgebra::{Point3, Vector3};

const MIN_SEPARATION: f64 = 1e-12;

#[inline]
pub fn harmonic(r: f64, r0: f64, k: f64) -> f64 {
    let stretch = r - r0;
    0.5 * k * stretch * stretch
}

/// Energy of a harmonic spring between `pi` and `pj` and the force it exerts on `pi`
/// (the force on `pj` is the negation).
#[inline]
pub fn harmonic_pair(pi: &Point3<f64>, pj: &Point3<f64>, r0: f64, k: f64) -> (f64, Vector3<f64>) {
    let d = pj - pi;
    let r = d.norm();
    let factor = if r0 == 0.0 {
        k
    } else if r > MIN_SEPARATION {
        k * (1.0 - r0 / r)
    } else {
        0.0
    };
    (harmonic(r, r0, k), d * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn harmonic_is_zero_at_rest_length() {
        assert_close(harmonic(1.2, 1.2, 300.0), 0.0);
        assert_close(harmonic(1.0, 0.0, 2.0), 1.0);
    }

    #[test]
    fn stretched_spring_pulls_atoms_together() {
        let pi = Point3::new(0.0, 0.0, 0.0);
        let pj = Point3::new(2.0, 0.0, 0.0);
        let (energy, force) = harmonic_pair(&pi, &pj, 1.0, 4.0);
        assert_close(energy, 2.0);
        assert_close(force.x, 4.0);
        assert_close(force.y, 0.0);
    }

    #[test]
    fn compressed_spring_pushes_atoms_apart() {
        let pi = Point3::new(0.0, 0.0, 0.0);
        let pj = Point3::new(0.5, 0.0, 0.0);
        let (_, force) = harmonic_pair(&pi, &pj, 1.0, 4.0);
        assert_close(force.x, -2.0);
    }

    #[test]
    fn force_is_the_negative_energy_gradient() {
        let pi = Point3::new(0.3, -0.2, 0.1);
        let pj = Point3::new(1.4, 0.5, -0.6);
        let (r0, k) = (0.9, 7.5);
        let (_, force) = harmonic_pair(&pi, &pj, r0, k);
        let h = 1e-6;
        for axis in 0..3 {
            let mut plus = pi;
            let mut minus = pi;
            plus[axis] += h;
            minus[axis] -= h;
            let numeric = -(harmonic_pair(&plus, &pj, r0, k).0 - harmonic_pair(&minus, &pj, r0, k).0)
                / (2.0 * h);
            assert!((numeric - force[axis]).abs() < 1e-6);
        }
    }

    #[test]
    fn coincident_points_with_zero_rest_length_feel_no_force() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let (energy, force) = harmonic_pair(&p, &p, 0.0, 10.0);
        assert_close(energy, 0.0);
        assert_eq!(force, Vector3::zeros());
    }
}
