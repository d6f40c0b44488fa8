/// Boltzmann constant in eV/K.
pub const BOLTZMANN_EV_PER_K: f64 = 8.617_333_262e-5;
const COULOMB_CONSTANT: f64 = 14.399_645; // In eV·Å/e²

/// Marcus activation free energy `(λ + ΔG0)² / 4λ`, optionally lowered by the coupling `vab`.
#[inline]
pub fn marcus_activation(lambda: f64, delta_g0: f64, vab: Option<f64>) -> f64 {
    let barrier = (lambda + delta_g0).powi(2) / (4.0 * lambda);
    match vab {
        Some(vab) => barrier - vab,
        None => barrier,
    }
}

/// Arrhenius-type hopping rate `vn · exp(−ΔG‡ / kB·T)`, in 1/s.
#[inline]
pub fn marcus_rate(attempt_frequency: f64, activation: f64, temperature: f64) -> f64 {
    attempt_frequency * (-activation / (BOLTZMANN_EV_PER_K * temperature)).exp()
}

/// Coulomb energy of two point charges, in eV.
#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < 1e-6 {
        return q1.signum() * q2.signum() * 1e10;
    }
    COULOMB_CONSTANT * q1 * q2 / (dielectric * dist)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn marcus_activation_without_driving_force_is_quarter_lambda() {
        assert!(f64_approx_equal(marcus_activation(1.74533, 0.0, None), 1.74533 / 4.0));
    }

    #[test]
    fn marcus_activation_vanishes_at_activationless_driving_force() {
        assert!(f64_approx_equal(marcus_activation(1.2, -1.2, None), 0.0));
    }

    #[test]
    fn marcus_activation_subtracts_coupling_when_requested() {
        let plain = marcus_activation(1.0, 0.2, None);
        let corrected = marcus_activation(1.0, 0.2, Some(0.1));
        assert!(f64_approx_equal(plain - corrected, 0.1));
        assert!(f64_approx_equal(plain, 1.44 / 4.0));
    }

    #[test]
    fn marcus_rate_equals_attempt_frequency_for_zero_barrier() {
        assert!(f64_approx_equal(marcus_rate(1.85e13, 0.0, 300.0) / 1.85e13, 1.0));
    }

    #[test]
    fn marcus_rate_matches_closed_form() {
        let rate = marcus_rate(1.0e13, 0.25, 300.0);
        let expected = 1.0e13 * (-0.25 / (BOLTZMANN_EV_PER_K * 300.0)).exp();
        assert!(f64_approx_equal(rate / expected, 1.0));
    }

    #[test]
    fn marcus_rate_increases_with_temperature() {
        assert!(marcus_rate(1.0e13, 0.3, 600.0) > marcus_rate(1.0e13, 0.3, 300.0));
    }

    #[test]
    fn coulomb_calculates_repulsive_energy_correctly() {
        assert!(f64_approx_equal(coulomb(1.0, 1.0, 1.0, 1.0), COULOMB_CONSTANT));
    }

    #[test]
    fn coulomb_scales_with_dielectric_and_distance() {
        let energy = coulomb(2.0, 1.0, -1.0, 4.0);
        assert!(f64_approx_equal(energy, -COULOMB_CONSTANT / 8.0));
    }

    #[test]
    fn coulomb_at_very_small_distance_returns_large_energy_with_correct_sign() {
        assert!(f64_approx_equal(coulomb(1e-7, 1.0, 1.0, 1.0), 1e10));
        assert!(f64_approx_equal(coulomb(1e-7, -1.0, 1.0, 1.0), -1e10));
    }
}
