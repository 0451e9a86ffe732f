//! The payroll calculation engine.
//!
//! Every step is a pure transform over data the caller has already loaded:
//!
//! | Step | Module |
//! |------|--------|
//! | Resolve company overrides against the global SARS record | [`sars_resolver`] |
//! | Ordinary pay and time-based premiums | [`gross_pay`] |
//! | Medical scheme tax credit and fringe benefit | [`medical_aid`] |
//! | Fixed, percentage and calculated recurring deductions | [`deductions`] |
//! | PAYE, UIF and SDL | [`statutory`] |
//! | Rounding and the net pay figure | [`assembler`] |
//! | Tax-year-to-date totals | [`ytd`] |

pub mod assembler;
pub mod common;
pub mod deductions;
pub mod gross_pay;
pub mod medical_aid;
pub mod sars_resolver;
pub mod statutory;
pub mod ytd;

pub use assembler::{PayrollAssembler, PayrollError, PayrollInputs};
pub use deductions::{DeductionResolver, DeductionSummary};
pub use gross_pay::{GrossPayBreakdown, GrossPayCalculator, PremiumRates, implied_hourly_rate};
pub use medical_aid::{MedicalAidAssessment, MedicalAidCalculator};
pub use sars_resolver::{SarsConfigError, resolve_sars_config};
pub use statutory::{StatutoryCalculator, StatutoryError, StatutoryResult};
pub use ytd::compute_ytd;
