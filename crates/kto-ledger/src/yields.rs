//! Yield analytics for positions held to maturity.
//!
//! Holding periods are measured in years of 365 days. The internal rate of
//! return treats every open lot as a cash outflow on its value date and the
//! position's value at maturity (purchase price plus projected earnings) as
//! the single inflow.

use crate::micros::Micros;
use crate::model::InterestPaymentSchedule;
use crate::position::AssetPosition;

const DAYS_PER_YEAR: f64 = 365.0;

const NEWTON_START: f64 = 0.05;
const NEWTON_MAX_ITER: usize = 10;
const BISECT_LO: f64 = 0.0;
const BISECT_HI: f64 = 0.1;
const BISECT_MAX_EXPANSIONS: usize = 50;
const BISECT_MAX_ITER: usize = 200;
const TOLERANCE: f64 = 1e-7;

/// Projected earnings of the open lots if held until the asset matures:
/// the difference between nominal quantity and purchase price, plus
/// interest according to the asset's payment schedule.
///
/// Zero when the asset has no maturity date.
pub fn total_earnings_at_maturity(pos: &AssetPosition) -> Micros {
    let Some(maturity) = pos.asset.maturity_date else {
        return Micros::ZERO;
    };
    let rate = pos.asset.interest_micros.to_f64();
    let schedule = pos.asset.interest_payment_schedule;

    let mut earnings = Micros::ZERO;
    for lot in &pos.items {
        earnings += lot.quantity_micros - lot.purchase_price();
        let years = (maturity - lot.value_date).num_days() as f64 / DAYS_PER_YEAR;
        let q = lot.quantity_micros.to_f64();
        let interest = match schedule {
            InterestPaymentSchedule::Accrued => q * ((1.0 + rate).powf(years) - 1.0),
            InterestPaymentSchedule::Annual => q * rate * years,
            InterestPaymentSchedule::Unspecified => 0.0,
        };
        earnings += Micros::from_f64(interest);
    }
    earnings
}

/// Annual rate `r` at which the open lots, compounded to maturity, grow to
/// their purchase price plus [`total_earnings_at_maturity`].
///
/// Returns 0 when there is nothing to solve (no maturity, no lots, a lot
/// bought on or after maturity, a non-positive purchase price) or when no
/// root is found.
pub fn internal_rate_of_return(pos: &AssetPosition) -> f64 {
    let Some(maturity) = pos.asset.maturity_date else {
        return 0.0;
    };
    if pos.items.is_empty() {
        return 0.0;
    }

    let mut flows = Vec::with_capacity(pos.items.len());
    for lot in &pos.items {
        let x = lot.purchase_price().to_f64();
        let t = (maturity - lot.value_date).num_days() as f64 / DAYS_PER_YEAR;
        if x <= 0.0 || t <= 0.0 {
            return 0.0;
        }
        flows.push((x, t));
    }
    let y = flows.iter().map(|(x, _)| x).sum::<f64>() + total_earnings_at_maturity(pos).to_f64();
    if y <= 0.0 {
        return 0.0;
    }

    if let [(x, t)] = flows.as_slice() {
        return (y / x).powf(1.0 / t) - 1.0;
    }

    let f = |r: f64| flows.iter().map(|(x, t)| x * (1.0 + r).powf(*t)).sum::<f64>() - y;
    let df = |r: f64| flows.iter().map(|(x, t)| x * t * (1.0 + r).powf(t - 1.0)).sum::<f64>();

    newton(&f, &df)
        .or_else(|| bisect(&f))
        .unwrap_or(0.0)
}

fn newton(f: &impl Fn(f64) -> f64, df: &impl Fn(f64) -> f64) -> Option<f64> {
    let mut r = NEWTON_START;
    for _ in 0..NEWTON_MAX_ITER {
        let v = f(r);
        if !v.is_finite() {
            return None;
        }
        if v.abs() <= TOLERANCE {
            return Some(r);
        }
        let d = df(r);
        if d == 0.0 || !d.is_finite() {
            return None;
        }
        r -= v / d;
        if r <= -1.0 {
            return None;
        }
    }
    None
}

/// `f` is increasing in `r`, so the bracket widens downward while `f(lo) > 0`
/// and upward while `f(hi) < 0`.
fn bisect(f: &impl Fn(f64) -> f64) -> Option<f64> {
    let (mut lo, mut hi) = (BISECT_LO, BISECT_HI);
    let mut step = hi - lo;
    let mut expansions = 0;
    while f(lo) * f(hi) > 0.0 {
        if expansions == BISECT_MAX_EXPANSIONS {
            return None;
        }
        if f(lo) > 0.0 {
            lo = (lo - step).max(-1.0 + TOLERANCE);
        } else {
            hi += step;
        }
        step *= 2.0;
        expansions += 1;
    }

    for _ in 0..BISECT_MAX_ITER {
        if hi - lo <= TOLERANCE {
            return Some((lo + hi) / 2.0);
        }
        let mid = (lo + hi) / 2.0;
        if f(lo) * f(mid) <= 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    None
}
