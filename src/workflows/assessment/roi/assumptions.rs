use serde::{Deserialize, Serialize};

/// Every constant the ROI formulas rely on, named and tunable per
/// deployment. `Default` carries the published assumptions used in sales
/// collateral; construct [`super::RoiEngine`] with a custom model to tune.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Annual revenue attributed to one field worker.
    pub revenue_per_field_worker: f64,
    /// Fully loaded hourly rate for office administration time.
    pub hourly_admin_rate: f64,
    /// Working weeks per year used by the time-cost formula.
    pub weeks_per_year: f64,
    /// Share of revenue lost to untracked job costs when job-costing pain
    /// is declared.
    pub margin_erosion_rate: f64,
    /// Share of revenue never billed when change-order pain is declared.
    pub change_order_leakage_rate: f64,
    /// Annual compliance administration cost per field worker when
    /// compliance pain is declared.
    pub compliance_cost_per_worker: f64,
    /// Urgency scaling applied to money costs: `floor + step * urgency`,
    /// reaching 1.0 at urgency 10.
    pub urgency_scaling_floor: f64,
    pub urgency_scaling_step: f64,
    /// Office staff seats added on top of the field crew.
    pub office_seat_buffer: u32,
    /// Smallest seat count ever quoted.
    pub minimum_seats: u32,
    pub monthly_price_per_seat: f64,
    pub onboarding_fee: f64,
    pub training_fee: f64,
    /// Share of admin time cost recovered by the platform.
    pub admin_time_recovery_rate: f64,
    /// Share of margin erosion recovered.
    pub margin_recovery_rate: f64,
    /// Share of missed change-order billing recovered.
    pub change_order_recovery_rate: f64,
    /// Share of compliance overhead recovered.
    pub compliance_recovery_rate: f64,
}

impl CostModel {
    /// Money-cost multiplier for a bounded 1..=10 urgency.
    pub fn urgency_multiplier(&self, urgency: u8) -> f64 {
        self.urgency_scaling_floor + self.urgency_scaling_step * f64::from(urgency)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            revenue_per_field_worker: 150_000.0,
            hourly_admin_rate: 45.0,
            weeks_per_year: 52.0,
            margin_erosion_rate: 0.02,
            change_order_leakage_rate: 0.015,
            compliance_cost_per_worker: 250.0,
            urgency_scaling_floor: 0.6,
            urgency_scaling_step: 0.04,
            office_seat_buffer: 3,
            minimum_seats: 5,
            monthly_price_per_seat: 49.0,
            onboarding_fee: 1_500.0,
            training_fee: 1_000.0,
            admin_time_recovery_rate: 0.60,
            margin_recovery_rate: 0.40,
            change_order_recovery_rate: 0.50,
            compliance_recovery_rate: 0.30,
        }
    }
}
