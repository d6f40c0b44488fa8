use rand::Rng;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplingError {
    #[error("Input rate list is empty, cannot select a process")]
    EmptyRates,
    #[error("All rates are zero, the system cannot evolve")]
    ZeroTotalRate,
    #[error("Invalid rate {rate} for process {index}: rates must be finite and non-negative")]
    InvalidRate { index: usize, rate: f64 },
}

/// Total of a rate list, rejecting negative or non-finite entries.
pub fn total_rate(rates: &[f64]) -> Result<f64, SamplingError> {
    if rates.is_empty() {
        return Err(SamplingError::EmptyRates);
    }
    let mut total = 0.0;
    for (index, &rate) in rates.iter().enumerate() {
        if !rate.is_finite() || rate < 0.0 {
            return Err(SamplingError::InvalidRate { index, rate });
        }
        total += rate;
    }
    if total <= 0.0 {
        return Err(SamplingError::ZeroTotalRate);
    }
    Ok(total)
}

/// Index of the first process with a positive rate whose normalized cumulative rate meets or
/// exceeds `u`.
///
/// `u` is a uniform draw from `[0, 1)`. Zero-rate processes are never selected, even for
/// `u == 0`. Rounding can leave the last cumulative value just below `u`; the last process
/// with a positive rate is returned in that case.
#[inline]
pub fn select_cumulative(rates: &[f64], total: f64, u: f64) -> usize {
    let threshold = u * total;
    let mut cumulative = 0.0;
    for (index, &rate) in rates.iter().enumerate() {
        cumulative += rate;
        if rate > 0.0 && cumulative >= threshold {
            return index;
        }
    }
    rates.iter().rposition(|&rate| rate > 0.0).unwrap_or(0)
}

/// Exponentially distributed residence time `−ln(u) / total` for `u ∈ (0, 1]`.
#[inline]
pub fn waiting_time(total: f64, u: f64) -> f64 {
    -u.ln() / total
}

/// Draws the next process and the time until it fires.
///
/// Consumes exactly two uniform draws from `rng`: one for the selection and one for the
/// waiting time.
#[instrument(level = "trace", skip_all, fields(processes = rates.len()))]
pub fn sample_event(rates: &[f64], rng: &mut impl Rng) -> Result<(usize, f64), SamplingError> {
    let total = total_rate(rates)?;
    let selected = select_cumulative(rates, total, rng.r#gen::<f64>());
    let dt = waiting_time(total, 1.0 - rng.r#gen::<f64>());
    Ok((selected, dt))
}
