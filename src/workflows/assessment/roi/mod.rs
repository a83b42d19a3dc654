mod assumptions;
mod breakdown;

pub use assumptions::CostModel;
pub use breakdown::PainPointCost;

use serde::{Deserialize, Serialize};

use super::AssessmentInput;
use breakdown::CostBasis;

/// Pain phrasing that switches on margin-erosion cost.
const MARGIN_PAIN_MARKERS: [&str; 4] = ["job cost", "profit", "estimat", "bid"];
/// Pain phrasing that switches on missed change-order billing.
const CHANGE_ORDER_MARKERS: [&str; 1] = ["change order"];
/// Pain phrasing that switches on compliance overhead.
const COMPLIANCE_MARKERS: [&str; 4] = ["compliance", "payroll", "safety", "certif"];

/// Money-cost components, each zero unless the matching pain was declared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoneyCosts {
    pub margin_erosion: f64,
    pub missed_change_orders: f64,
    pub compliance_overhead: f64,
}

impl MoneyCosts {
    pub fn total(&self) -> f64 {
        self.margin_erosion + self.missed_change_orders + self.compliance_overhead
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestmentEstimate {
    pub seats: u32,
    pub recurring_annual: f64,
    pub one_time: f64,
}

impl InvestmentEstimate {
    pub fn first_year_total(&self) -> f64 {
        self.recurring_annual + self.one_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsEstimate {
    pub recovered_admin_time: f64,
    pub recovered_margin: f64,
    pub recovered_change_orders: f64,
    pub reduced_compliance_overhead: f64,
}

impl SavingsEstimate {
    pub fn total(&self) -> f64 {
        self.recovered_admin_time
            + self.recovered_margin
            + self.recovered_change_orders
            + self.reduced_compliance_overhead
    }
}

/// Financial picture for one intake form. Created fresh per run; ROI and
/// payback are floored at zero so negatives render as "no measurable return
/// yet" rather than a negative number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiCalculation {
    pub representative_crew: u32,
    pub implied_annual_revenue: f64,
    pub weekly_admin_hours: f64,
    pub annual_time_cost: f64,
    pub urgency_multiplier: f64,
    pub money_costs: MoneyCosts,
    pub total_annual_cost: f64,
    pub investment: InvestmentEstimate,
    pub savings: SavingsEstimate,
    pub net_annual_value: f64,
    pub roi_percentage: f64,
    pub payback_months: f64,
    pub pain_point_costs: Vec<PainPointCost>,
    /// Constants the formulas above were evaluated with, carried so the
    /// derivation trace can quote them.
    pub assumptions: CostModel,
}

/// Deterministic ROI estimator over a [`CostModel`].
pub struct RoiEngine {
    model: CostModel,
}

impl RoiEngine {
    pub fn new(model: CostModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &CostModel {
        &self.model
    }

    pub fn estimate(&self, input: &AssessmentInput) -> RoiCalculation {
        let model = &self.model;
        let crew = input.crew_size.representative_crew();
        let implied_annual_revenue = f64::from(crew) * model.revenue_per_field_worker;

        let weekly_admin_hours = input.admin_hours.representative_hours();
        let annual_time_cost = weekly_admin_hours * model.hourly_admin_rate * model.weeks_per_year;

        let urgency_multiplier = model.urgency_multiplier(input.bounded_urgency());
        let money_costs = MoneyCosts {
            margin_erosion: if mentions_any(&input.pain_points, &MARGIN_PAIN_MARKERS) {
                implied_annual_revenue * model.margin_erosion_rate * urgency_multiplier
            } else {
                0.0
            },
            missed_change_orders: if mentions_any(&input.pain_points, &CHANGE_ORDER_MARKERS) {
                implied_annual_revenue * model.change_order_leakage_rate * urgency_multiplier
            } else {
                0.0
            },
            compliance_overhead: if mentions_any(&input.pain_points, &COMPLIANCE_MARKERS) {
                f64::from(crew) * model.compliance_cost_per_worker * urgency_multiplier
            } else {
                0.0
            },
        };
        let total_annual_cost = annual_time_cost + money_costs.total();

        let seats = (crew + model.office_seat_buffer).max(model.minimum_seats);
        let investment = InvestmentEstimate {
            seats,
            recurring_annual: f64::from(seats) * model.monthly_price_per_seat * 12.0,
            one_time: model.onboarding_fee + model.training_fee,
        };

        let savings = SavingsEstimate {
            recovered_admin_time: annual_time_cost * model.admin_time_recovery_rate,
            recovered_margin: money_costs.margin_erosion * model.margin_recovery_rate,
            recovered_change_orders: money_costs.missed_change_orders
                * model.change_order_recovery_rate,
            reduced_compliance_overhead: money_costs.compliance_overhead
                * model.compliance_recovery_rate,
        };

        let net_annual_value = savings.total() - investment.recurring_annual;
        let roi_percentage =
            (net_annual_value / investment.first_year_total() * 100.0).max(0.0);
        let payback_months = if savings.total() > 0.0 {
            (investment.first_year_total() / (savings.total() / 12.0)).max(0.0)
        } else {
            0.0
        };

        let basis = CostBasis {
            implied_annual_revenue,
            annual_time_cost,
        };
        let pain_point_costs = breakdown::pain_point_table(&input.pain_points, model, &basis);

        RoiCalculation {
            representative_crew: crew,
            implied_annual_revenue,
            weekly_admin_hours,
            annual_time_cost,
            urgency_multiplier,
            money_costs,
            total_annual_cost,
            investment,
            savings,
            net_annual_value,
            roi_percentage,
            payback_months,
            pain_point_costs,
            assumptions: model.clone(),
        }
    }
}

impl Default for RoiEngine {
    fn default() -> Self {
        Self::new(CostModel::default())
    }
}

fn mentions_any(pain_points: &[String], markers: &[&str]) -> bool {
    pain_points.iter().any(|pain| {
        let lowered = pain.to_lowercase();
        markers.iter().any(|marker| lowered.contains(marker))
    })
}
