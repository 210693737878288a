//! # Run configuration
//!
//! [`RunParams`] controls how a trial is spread across worker threads and when a
//! run gives up:
//!
//! * `workers` – number of frame blocks (and threads). `None` resolves to the
//!   available cores minus one, at least one.
//! * `deadline` – wall-clock budget for the whole run, measured from dispatch.
//! * `poll_interval` – how often a parallel worker checks the deadline, and how
//!   often a sequential run polls its `should_cancel` closure. The cancel token and
//!   the abort flag of a failing sibling are read before every frame.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use cgm::trial::run_params::RunParams;
//!
//! let params = RunParams::builder()
//!     .workers(4)
//!     .deadline(Duration::from_secs(5))
//!     .build()
//!     .unwrap();
//! println!("{params:#}");
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cgm_errors::CgmError;

/// Deserialisation goes through [`RunParams::validate`], so a configuration file
/// cannot carry values the builder would refuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRunParams")]
pub struct RunParams {
    pub workers: Option<usize>,
    pub deadline: Option<Duration>,
    pub poll_interval: Duration,
}

impl RunParams {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RunParamsBuilder {
        RunParamsBuilder::new()
    }

    /// Check the invariants [`RunParamsBuilder::build`] enforces.
    ///
    /// Fields are public, so runs call this again before dispatching.
    pub fn validate(&self) -> Result<(), CgmError> {
        if self.workers == Some(0) {
            return Err(CgmError::InvalidRunParameter(
                "workers must be >= 1".into(),
            ));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(CgmError::InvalidRunParameter(
                "deadline must be > 0".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(CgmError::InvalidRunParameter(
                "poll_interval must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Worker count actually used for a run, before capping by the frame count.
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
                .max(1)
        })
    }
}

impl Default for RunParams {
    fn default() -> Self {
        RunParams {
            workers: None,
            deadline: None,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Builder for [`RunParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct RunParamsBuilder {
    params: RunParams,
}

impl RunParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers(mut self, v: usize) -> Self {
        self.params.workers = Some(v);
        self
    }

    pub fn deadline(mut self, v: Duration) -> Self {
        self.params.deadline = Some(v);
        self
    }

    pub fn poll_interval(mut self, v: Duration) -> Self {
        self.params.poll_interval = v;
        self
    }

    /// Validate and return the parameters.
    ///
    /// Errors
    /// ----------
    /// [`CgmError::InvalidRunParameter`] when `workers` is zero, or when the
    /// deadline or the poll interval is zero.
    pub fn build(self) -> Result<RunParams, CgmError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

/// Wire form of [`RunParams`]; missing keys take the defaults.
#[derive(Deserialize)]
#[serde(default)]
struct RawRunParams {
    workers: Option<usize>,
    deadline: Option<Duration>,
    poll_interval: Duration,
}

impl Default for RawRunParams {
    fn default() -> Self {
        RawRunParams {
            workers: None,
            deadline: None,
            poll_interval: RunParams::DEFAULT_POLL_INTERVAL,
        }
    }
}

impl TryFrom<RawRunParams> for RunParams {
    type Error = CgmError;

    fn try_from(raw: RawRunParams) -> Result<Self, Self::Error> {
        let params = RunParams {
            workers: raw.workers,
            deadline: raw.deadline,
            poll_interval: raw.poll_interval,
        };
        params.validate()?;
        Ok(params)
    }
}

impl fmt::Display for RunParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let workers = match self.workers {
            Some(n) => n.to_string(),
            None => format!("auto ({})", self.resolved_workers()),
        };
        let deadline = match self.deadline {
            Some(d) => format!("{d:?}"),
            None => "none".to_string(),
        };

        if f.alternate() {
            const PARAM_COL: usize = 36;
            writeln!(f, "Trial Run Parameters")?;
            writeln!(f, "--------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = " ".repeat(PARAM_COL.saturating_sub(s.len()).max(1));
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!("workers       = {}", workers, "Frame blocks run concurrently")?;
            line!("deadline      = {}", deadline, "Wall-clock budget of a run")?;
            line!(
                "poll_interval = {:?}",
                self.poll_interval,
                "Deadline and cancellation checks"
            )?;
            Ok(())
        } else {
            write!(
                f,
                "RunParams(workers={workers}, deadline={deadline}, poll_interval={:?})",
                self.poll_interval
            )
        }
    }
}

#[cfg(test)]
mod run_params_test {
    use super::*;

    #[test]
    fn test_builder_validation() {
        assert!(matches!(
            RunParams::builder().workers(0).build(),
            Err(CgmError::InvalidRunParameter(_))
        ));
        assert!(RunParams::builder()
            .deadline(Duration::ZERO)
            .build()
            .is_err());
        assert!(RunParams::builder()
            .poll_interval(Duration::ZERO)
            .build()
            .is_err());

        let p = RunParams::builder()
            .workers(3)
            .deadline(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(p.resolved_workers(), 3);
        assert_eq!(p.poll_interval, RunParams::DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_deserialisation_is_validated() {
        let err = serde_json::from_str::<RunParams>(r#"{ "workers": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("workers must be >= 1"));
        assert!(serde_json::from_str::<RunParams>(
            r#"{ "poll_interval": { "secs": 0, "nanos": 0 } }"#
        )
        .is_err());

        let p: RunParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p, RunParams::default());
    }

    #[test]
    fn test_validate_catches_literal_construction() {
        let p = RunParams {
            workers: Some(0),
            ..RunParams::default()
        };
        assert!(matches!(p.validate(), Err(CgmError::InvalidRunParameter(_))));
        assert!(RunParams::default().validate().is_ok());
    }

    #[test]
    fn test_auto_workers_at_least_one() {
        assert!(RunParams::default().resolved_workers() >= 1);
    }

    #[test]
    fn test_display() {
        let p = RunParams::builder().workers(2).build().unwrap();
        assert_eq!(
            p.to_string(),
            "RunParams(workers=2, deadline=none, poll_interval=20ms)"
        );
        let table = format!("{p:#}");
        assert!(table.contains("workers       = 2"));
        assert!(table.contains("# Wall-clock budget of a run"));
    }
}
