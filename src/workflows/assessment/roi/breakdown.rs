use serde::{Deserialize, Serialize};

use super::assumptions::CostModel;

/// Line item in the per-pain-point table: what the pain costs annually, how
/// the platform addresses it, and what share of the cost comes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainPointCost {
    pub pain_point: String,
    pub annual_cost: f64,
    pub solution: String,
    pub recovery_rate: f64,
    pub annual_savings: f64,
}

/// Derived figures the bucket formulas draw from.
pub(crate) struct CostBasis {
    pub implied_annual_revenue: f64,
    pub annual_time_cost: f64,
}

enum CostFormula {
    /// Fraction of the annual admin time cost.
    TimeShare(f64),
    /// Fraction of implied annual revenue.
    RevenueShare(f64),
}

struct Bucket {
    markers: &'static [&'static str],
    formula: CostFormula,
    solution: &'static str,
    recovery_rate: f64,
}

/// Keyword buckets checked in order; first match wins. The trailing
/// default bucket catches anything unrecognized.
fn buckets(model: &CostModel) -> [Bucket; 7] {
    [
        Bucket {
            markers: &["schedul", "dispatch"],
            formula: CostFormula::TimeShare(0.25),
            solution: "Crew scheduling board with conflict detection",
            recovery_rate: 0.55,
        },
        Bucket {
            markers: &["paperwork", "data entry", "double entry", "timesheet"],
            formula: CostFormula::TimeShare(0.35),
            solution: "Field data capture that eliminates re-keying",
            recovery_rate: 0.65,
        },
        Bucket {
            markers: &["change order"],
            formula: CostFormula::RevenueShare(model.change_order_leakage_rate),
            solution: "Change-order capture and approval from the field",
            recovery_rate: model.change_order_recovery_rate,
        },
        Bucket {
            markers: &["job cost", "profit", "estimat", "bid"],
            formula: CostFormula::RevenueShare(model.margin_erosion_rate),
            solution: "Live job costing against estimate",
            recovery_rate: model.margin_recovery_rate,
        },
        Bucket {
            markers: &["compliance", "payroll", "safety", "certif"],
            formula: CostFormula::RevenueShare(0.005),
            solution: "Automated compliance reporting and certified payroll",
            recovery_rate: model.compliance_recovery_rate,
        },
        Bucket {
            markers: &["invoic", "cash flow", "billing"],
            formula: CostFormula::RevenueShare(0.01),
            solution: "Progress invoicing tied to completed work",
            recovery_rate: 0.45,
        },
        Bucket {
            markers: &["communicat", "phone tag"],
            formula: CostFormula::TimeShare(0.15),
            solution: "Shared job timeline for office and field",
            recovery_rate: 0.40,
        },
    ]
}

const DEFAULT_SOLUTION: &str = "Targeted workflow review during onboarding";
const DEFAULT_TIME_SHARE: f64 = 0.10;
const DEFAULT_RECOVERY_RATE: f64 = 0.25;

pub(crate) fn pain_point_table(
    pain_points: &[String],
    model: &CostModel,
    basis: &CostBasis,
) -> Vec<PainPointCost> {
    pain_points
        .iter()
        .map(|pain| {
            let lowered = pain.to_lowercase();
            let matched = buckets(model)
                .into_iter()
                .find(|bucket| bucket.markers.iter().any(|marker| lowered.contains(marker)));

            let (annual_cost, solution, recovery_rate) = match matched {
                Some(bucket) => {
                    let cost = match bucket.formula {
                        CostFormula::TimeShare(share) => basis.annual_time_cost * share,
                        CostFormula::RevenueShare(share) => basis.implied_annual_revenue * share,
                    };
                    (cost, bucket.solution.to_string(), bucket.recovery_rate)
                }
                None => (
                    basis.annual_time_cost * DEFAULT_TIME_SHARE,
                    DEFAULT_SOLUTION.to_string(),
                    DEFAULT_RECOVERY_RATE,
                ),
            };

            PainPointCost {
                pain_point: pain.clone(),
                annual_cost,
                solution,
                recovery_rate,
                annual_savings: annual_cost * recovery_rate,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basis() -> CostBasis {
        CostBasis {
            implied_annual_revenue: 1_000_000.0,
            annual_time_cost: 35_100.0,
        }
    }

    #[test]
    fn change_order_pain_costs_a_revenue_share() {
        let model = CostModel::default();
        let table = pain_point_table(
            &["Change orders slip through".to_string()],
            &model,
            &basis(),
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].annual_cost, 1_000_000.0 * 0.015);
        assert_eq!(table[0].recovery_rate, model.change_order_recovery_rate);
    }

    #[test]
    fn unrecognized_pain_falls_into_default_bucket() {
        let table = pain_point_table(
            &["Something entirely novel".to_string()],
            &CostModel::default(),
            &basis(),
        );
        assert_eq!(table[0].solution, DEFAULT_SOLUTION);
        assert_eq!(table[0].annual_cost, 35_100.0 * DEFAULT_TIME_SHARE);
        assert_eq!(
            table[0].annual_savings,
            table[0].annual_cost * DEFAULT_RECOVERY_RATE
        );
    }

    #[test]
    fn every_declared_pain_gets_a_row() {
        let pains = vec![
            "Scheduling chaos".to_string(),
            "Paperwork".to_string(),
            "Mystery".to_string(),
        ];
        let table = pain_point_table(&pains, &CostModel::default(), &basis());
        assert_eq!(table.len(), 3);
        assert!(table.iter().all(|row| row.annual_savings <= row.annual_cost));
    }
}
