use super::common::*;
use crate::workflows::assessment::roi::{CostModel, RoiEngine};
use crate::workflows::assessment::{AdminHoursBucket, CrewSizeBracket};

#[test]
fn return_and_payback_are_never_negative() {
    let engine = RoiEngine::default();
    let pain_sets: [&[&str]; 3] = [
        &[],
        &["change order tracking"],
        &["job costing blind spots", "payroll compliance", "phone tag"],
    ];

    for crew in CrewSizeBracket::ordered() {
        for hours in [
            AdminHoursBucket::UnderFive,
            AdminHoursBucket::FiveToTen,
            AdminHoursBucket::TenToTwenty,
            AdminHoursBucket::TwentyPlus,
        ] {
            for pains in pain_sets {
                let mut input = intake();
                input.crew_size = crew;
                input.admin_hours = hours;
                input.pain_points = pains.iter().map(|pain| pain.to_string()).collect();

                let roi = engine.estimate(&input);
                assert!(roi.roi_percentage >= 0.0, "{crew:?}/{hours:?}/{pains:?}");
                assert!(roi.payback_months >= 0.0, "{crew:?}/{hours:?}/{pains:?}");
                assert!(roi.total_annual_cost >= roi.annual_time_cost);
            }
        }
    }
}

#[test]
fn money_costs_gate_on_the_matching_pain_flags() {
    let engine = RoiEngine::default();

    let mut input = intake();
    input.pain_points = vec!["crew morale".to_string()];
    let none = engine.estimate(&input);
    assert_eq!(none.money_costs.margin_erosion, 0.0);
    assert_eq!(none.money_costs.missed_change_orders, 0.0);
    assert_eq!(none.money_costs.compliance_overhead, 0.0);

    input.pain_points = vec!["change orders never get billed".to_string()];
    let change_orders = engine.estimate(&input);
    assert!(change_orders.money_costs.missed_change_orders > 0.0);
    assert_eq!(change_orders.money_costs.margin_erosion, 0.0);
    assert_eq!(change_orders.money_costs.compliance_overhead, 0.0);

    input.pain_points = vec!["certified payroll takes days".to_string()];
    let compliance = engine.estimate(&input);
    assert!(compliance.money_costs.compliance_overhead > 0.0);
    assert_eq!(compliance.money_costs.missed_change_orders, 0.0);
}

#[test]
fn urgency_scales_money_costs_but_not_time_cost() {
    let engine = RoiEngine::default();
    let mut input = intake();
    input.pain_points = vec!["change order tracking".to_string()];

    input.urgency = 2;
    let calm = engine.estimate(&input);
    input.urgency = 9;
    let urgent = engine.estimate(&input);

    assert!(urgent.money_costs.missed_change_orders > calm.money_costs.missed_change_orders);
    assert_eq!(urgent.annual_time_cost, calm.annual_time_cost);
    assert_eq!(urgent.urgency_multiplier, engine.model().urgency_multiplier(9));
}

#[test]
fn seat_count_floors_at_the_model_minimum() {
    let model = CostModel {
        office_seat_buffer: 0,
        ..CostModel::default()
    };
    let engine = RoiEngine::new(model);

    let mut input = intake();
    input.crew_size = CrewSizeBracket::OneToFour;
    let roi = engine.estimate(&input);

    assert_eq!(roi.representative_crew, 3);
    assert_eq!(roi.investment.seats, 5, "floored at the minimum");

    input.crew_size = CrewSizeBracket::TwentyToFortyNine;
    let roi = engine.estimate(&input);
    assert_eq!(roi.investment.seats, 35);
}

#[test]
fn every_declared_pain_gets_a_breakdown_row() {
    let engine = RoiEngine::default();
    let mut input = intake();
    input.pain_points = vec![
        "scheduling conflicts".to_string(),
        "change order tracking".to_string(),
        "a problem nobody has named before".to_string(),
    ];

    let roi = engine.estimate(&input);
    assert_eq!(roi.pain_point_costs.len(), 3);
    for row in &roi.pain_point_costs {
        assert!(row.annual_cost > 0.0);
        assert!(row.annual_savings <= row.annual_cost);
        assert!(!row.solution.is_empty());
    }
}

#[test]
fn zero_recovery_model_floors_both_return_figures() {
    let model = CostModel {
        admin_time_recovery_rate: 0.0,
        ..CostModel::default()
    };
    let engine = RoiEngine::new(model);

    let mut input = intake();
    input.pain_points = vec!["crew morale".to_string()];
    let roi = engine.estimate(&input);

    assert_eq!(roi.savings.total(), 0.0);
    assert_eq!(roi.roi_percentage, 0.0);
    assert_eq!(roi.payback_months, 0.0);
}

#[test]
fn assumptions_ride_along_for_the_derivation() {
    let engine = RoiEngine::default();
    let roi = engine.estimate(&intake());

    assert_eq!(roi.assumptions, *engine.model());
    assert_eq!(
        roi.annual_time_cost,
        roi.weekly_admin_hours * roi.assumptions.hourly_admin_rate * roi.assumptions.weeks_per_year
    );
}
