//! Proportion-based Injected Version estimation
//!
//! The proportion of a ticket with known versions is
//! `days(IV, FV) / days(OV, FV)`. Its mean over the consistent tickets is used
//! to place the Injected Version of the tickets where it is unknown:
//! `IV = latest release on or before FV - round(p * days(OV, FV))`.

use chrono::Duration;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{InjectedSource, Release, Ticket};
use crate::timeline::ReleaseTimeline;

/// Proportion used when no ticket qualifies for the average
pub const DEFAULT_PROPORTION: f64 = 0.5;

/// How the baseline release is treated by a proportion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Tickets injected at the baseline do not contribute to the average
    ExcludeBaseline,
    /// Tickets whose earliest affected version is the baseline get the
    /// baseline as Injected Version before averaging
    ForceBaselineIv,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::ExcludeBaseline => "exclude-baseline",
            Strategy::ForceBaselineIv => "force-baseline-iv",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "exclude-baseline" | "exclude" => Ok(Strategy::ExcludeBaseline),
            "force-baseline-iv" | "force-baseline" | "force" => Ok(Strategy::ForceBaselineIv),
            _ => Err(format!(
                "Invalid proportion strategy: {}. Valid options: exclude-baseline, force-baseline-iv",
                s
            )),
        }
    }
}

/// Average proportion together with how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionSample {
    pub value: f64,
    /// Tickets that contributed to the mean
    pub samples: usize,
    /// Tickets with all three versions dropped for temporal inconsistency
    pub inconsistent: usize,
    /// Tickets dropped because they were injected at the baseline
    pub baseline_excluded: usize,
}

impl ProportionSample {
    pub fn is_fallback(&self) -> bool {
        self.samples == 0
    }
}

/// Outcome of a full estimation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionReport {
    pub strategy: Strategy,
    pub proportion: ProportionSample,
    pub forced: usize,
    pub estimated: usize,
    /// Tickets without a usable OV/FV pair or with a non-positive interval
    pub skipped: usize,
    /// Tickets whose estimated date precedes every release
    pub non_estimable: Vec<String>,
}

/// Estimates missing Injected Versions from the average proportion
pub struct ProportionEstimator<'a> {
    timeline: &'a ReleaseTimeline,
    baseline: Option<Release>,
}

impl<'a> ProportionEstimator<'a> {
    /// Create an estimator using `baseline` as the reference release
    pub fn new(timeline: &'a ReleaseTimeline, baseline: Option<Release>) -> Self {
        Self { timeline, baseline }
    }

    /// Resolve the baseline by name, or use the earliest release when no
    /// name is given
    pub fn with_baseline_name(timeline: &'a ReleaseTimeline, name: Option<&str>) -> Self {
        let baseline = match name {
            Some(name) => {
                let found = timeline.find_by_name(name).cloned();
                if found.is_none() {
                    warn!("Baseline release {} is not in the timeline; baseline handling disabled", name);
                }
                found
            }
            None => timeline.first().cloned(),
        };
        Self::new(timeline, baseline)
    }

    pub fn baseline(&self) -> Option<&Release> {
        self.baseline.as_ref()
    }

    /// Run one strategy: force baseline IVs, average, then estimate
    pub fn estimate(&self, tickets: &mut [Ticket], strategy: Strategy) -> ProportionReport {
        let forced = match strategy {
            Strategy::ForceBaselineIv => self.force_baseline_injected(tickets),
            Strategy::ExcludeBaseline => 0,
        };

        let proportion = self.average_proportion(tickets, strategy);
        info!(
            "Average proportion ({}): {:.2} over {} tickets",
            strategy, proportion.value, proportion.samples
        );
        if proportion.is_fallback() {
            warn!("No ticket qualifies for the proportion average; using {}", DEFAULT_PROPORTION);
        }

        let (estimated, skipped, non_estimable) = self.estimate_missing_injected(tickets, proportion.value);
        info!("Injected versions estimated with {}: {}", strategy, estimated);
        if strategy == Strategy::ForceBaselineIv {
            info!("Injected versions forced to the baseline: {}", forced);
        }

        ProportionReport {
            strategy,
            proportion,
            forced,
            estimated,
            skipped,
            non_estimable,
        }
    }

    /// Set the baseline as Injected Version of tickets whose earliest
    /// affected version is the baseline and that have no IV yet
    pub fn force_baseline_injected(&self, tickets: &mut [Ticket]) -> usize {
        let Some(baseline) = &self.baseline else {
            return 0;
        };

        let mut forced = 0;
        for ticket in tickets.iter_mut() {
            if ticket.injected().is_some() {
                continue;
            }
            let at_baseline = ticket
                .earliest_affected_version()
                .map(|earliest| earliest.same_as(baseline))
                .unwrap_or(false);

            if at_baseline && ticket.set_injected(baseline.clone(), InjectedSource::ForcedBaseline) {
                debug!("Ticket {} injected version forced to {}", ticket.key, baseline.name);
                forced += 1;
            }
        }
        forced
    }

    /// Mean proportion over the tickets with consistent OV, IV and FV
    pub fn average_proportion(&self, tickets: &[Ticket], strategy: Strategy) -> ProportionSample {
        let mut sum = 0.0;
        let mut samples = 0;
        let mut inconsistent = 0;
        let mut baseline_excluded = 0;

        for ticket in tickets {
            let (Some(fixed), Some(injected), Some(opening)) = (ticket.fixed(), ticket.injected(), ticket.opening())
            else {
                continue;
            };

            if strategy == Strategy::ExcludeBaseline {
                if let Some(baseline) = &self.baseline {
                    if injected.same_as(baseline) {
                        baseline_excluded += 1;
                        continue;
                    }
                }
            }

            let ov_to_fv = opening.days_until(fixed);
            let iv_to_fv = injected.days_until(fixed);
            if ov_to_fv > 0 && iv_to_fv > 0 && iv_to_fv <= ov_to_fv {
                sum += iv_to_fv as f64 / ov_to_fv as f64;
                samples += 1;
            } else {
                debug!(
                    "Ticket {} excluded from proportion: IV->FV {} days, OV->FV {} days",
                    ticket.key, iv_to_fv, ov_to_fv
                );
                inconsistent += 1;
            }
        }

        let value = if samples == 0 { DEFAULT_PROPORTION } else { sum / samples as f64 };

        ProportionSample {
            value,
            samples,
            inconsistent,
            baseline_excluded,
        }
    }

    /// Place the Injected Version of tickets that have none.
    ///
    /// Returns (estimated, skipped, keys of non-estimable tickets).
    pub fn estimate_missing_injected(&self, tickets: &mut [Ticket], proportion: f64) -> (usize, usize, Vec<String>) {
        let mut estimated = 0;
        let mut skipped = 0;
        let mut non_estimable = Vec::new();

        for ticket in tickets.iter_mut().filter(|t| t.injected().is_none()) {
            let (Some(fixed), Some(opening)) = (ticket.fixed(), ticket.opening()) else {
                skipped += 1;
                continue;
            };

            let fv_ov = opening.days_until(fixed);
            if fv_ov <= 0 {
                skipped += 1;
                continue;
            }

            let fv_iv = (proportion * fv_ov as f64).round() as i64;
            if fv_iv <= 0 {
                skipped += 1;
                continue;
            }

            let estimated_date = fixed.release_date - Duration::days(fv_iv);
            match self.timeline.latest_on_or_before(estimated_date) {
                Some(release) => {
                    debug!("Ticket {} injected version estimated as {}", ticket.key, release.name);
                    ticket.set_injected(release.clone(), InjectedSource::Estimated);
                    estimated += 1;
                }
                None => {
                    debug!("Ticket {} estimated date {} precedes every release", ticket.key, estimated_date);
                    non_estimable.push(ticket.key.clone());
                }
            }
        }

        (estimated, skipped, non_estimable)
    }
}

/// Clear Injected Versions produced by a previous proportion run so another
/// strategy can be applied to the same tickets
pub fn reset_estimated_injected(tickets: &mut [Ticket]) -> usize {
    let mut cleared = 0;
    for ticket in tickets.iter_mut() {
        if ticket.clear_estimated_injected() {
            cleared += 1;
        }
    }
    info!("Cleared {} estimated injected versions", cleared);
    cleared
}
