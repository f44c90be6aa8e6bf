//! End-to-end tests of the full QUBO conversion driver.

use std::collections::BTreeMap;

use quboform::algebra::Function;
use quboform::error::ModelError;
use quboform::eval::State;
use quboform::model::{Constraint, DecisionVariable, Instance, Kind, Sense};
use quboform::reform::QuboOptions;

#[test]
fn weighted_penalties_produce_expected_qubo() {
    // min x0 over binaries, s.t. x0 = 0 (weight 1) and x1 = 1 (weight 2):
    //   x0 + 1*x0^2 + 2*(x1 - 1)^2  =  2*x0 - 2*x1 + 2
    let mut instance = Instance::from_components(
        Sense::Minimize,
        Function::variable(0),
        vec![DecisionVariable::binary(0), DecisionVariable::binary(1)],
        vec![
            Constraint::equal_to_zero(0, Function::variable(0)),
            Constraint::equal_to_zero(1, Function::linear([(1, 1.0)].into(), -1.0)),
        ],
    )
    .unwrap();

    let options = QuboOptions::default()
        .with_penalty_weights(BTreeMap::from([(0, 1.0), (1, 2.0)]));
    let (qubo, offset) = instance.to_qubo(&options).unwrap();

    assert_eq!(qubo, BTreeMap::from([((0, 0), 2.0), ((1, 1), -2.0)]));
    assert_eq!(offset, 2.0);

    // both constraints were absorbed, with their weight parameter recorded
    assert!(instance.constraints().is_empty());
    assert_eq!(instance.removed_constraints().len(), 2);
    for removed in instance.removed_constraints() {
        assert_eq!(removed.removed_reason, "penalty_method");
        assert!(removed.removed_reason_parameters.contains_key("parameter_id"));
    }
}

#[test]
fn maximization_with_integers_and_inequality() {
    // max x0 + x1 over integers in [0, 2], s.t. x0 + 2*x1 <= 3
    let x: Vec<_> = (0..2)
        .map(|i| {
            DecisionVariable::integer(i, 0.0, 2.0)
                .with_name("x")
                .with_subscripts(vec![i as i64])
        })
        .collect();
    let mut instance = Instance::from_components(
        Sense::Maximize,
        Function::linear([(0, 1.0), (1, 1.0)].into(), 0.0),
        x,
        vec![Constraint::less_than_or_equal_to_zero(
            0,
            Function::linear([(0, 1.0), (1, 2.0)].into(), -3.0),
        )],
    )
    .unwrap();

    let (qubo, offset) = instance.to_qubo(&QuboOptions::default()).unwrap();

    // The slack variable takes id 2 with bound [0, 6]; x0, x1, and the
    // slack are then log-encoded into bits 3..=9 with coefficients
    //   x0 = b3 + b4,  x1 = b5 + b6,  slack = b7 + 2*b8 + 3*b9.
    let slack = instance.get_decision_variable(2).unwrap();
    assert_eq!(slack.kind, Kind::Integer);
    assert_eq!(slack.name.as_deref(), Some("ommx.slack"));
    assert_eq!(slack.subscripts, [0]);
    assert_eq!(slack.bound.lower, 0.0);
    assert_eq!(slack.bound.upper, 6.0);
    for id in 3..=9 {
        let bit = instance.get_decision_variable(id).unwrap();
        assert_eq!(bit.kind, Kind::Binary);
        assert_eq!(bit.name.as_deref(), Some("ommx.log_encode"));
    }

    // minimized objective: -(x0 + x1) + (x0 + 2*x1 + slack - 3)^2
    assert_eq!(offset, 9.0);
    assert_eq!(qubo.len(), 28);
    assert_eq!(qubo[&(3, 3)], -6.0);
    assert_eq!(qubo[&(5, 5)], -9.0);
    assert_eq!(qubo[&(7, 7)], -5.0);
    assert_eq!(qubo[&(9, 9)], -9.0);
    assert_eq!(qubo[&(3, 4)], 2.0);
    assert_eq!(qubo[&(5, 6)], 8.0);
    assert_eq!(qubo[&(8, 9)], 12.0);

    // the sense flag is restored even though the objective stays minimized
    assert_eq!(instance.sense(), Sense::Maximize);

    // a solver returns only bit values; x0 = 2, x1 = 0, slack = 1
    let state = State::from_iter([
        (3, 1.0),
        (4, 1.0),
        (5, 0.0),
        (6, 0.0),
        (7, 1.0),
        (8, 0.0),
        (9, 0.0),
    ]);
    let solution = instance.evaluate(&state).unwrap();
    assert_eq!(solution.state().get(0), Some(2.0));
    assert_eq!(solution.state().get(1), Some(0.0));
    assert_eq!(solution.state().get(2), Some(1.0));
    // the stored objective is the minimized form, penalty term zero
    assert_eq!(solution.objective(), -2.0);
    assert!(solution.feasible());
    assert_eq!(
        solution.extract_decision_variables("x").unwrap(),
        BTreeMap::from([(vec![0], 2.0), (vec![1], 0.0)])
    );

    // the QUBO map itself agrees with the objective at this assignment
    let qubo_value: f64 = qubo
        .iter()
        .map(|(&(i, j), c)| c * state.get(i).unwrap() * state.get(j).unwrap())
        .sum();
    assert_eq!(qubo_value + offset, solution.objective());
}

#[test]
fn continuous_variables_fail_before_any_transformation() {
    let variables = vec![
        DecisionVariable::continuous(0, 0.0, 1.0),
        DecisionVariable::binary(1),
        DecisionVariable::continuous(2, -1.0, 1.0),
    ];
    let mut instance = Instance::from_components(
        Sense::Maximize,
        Function::linear([(0, 1.0), (1, 1.0), (2, 1.0)].into(), 0.0),
        variables,
        Vec::new(),
    )
    .unwrap();
    let before = instance.clone();

    let err = instance.to_qubo(&QuboOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ModelError::UnsupportedVariableKind { ids } if ids == vec![0, 2]
    ));
    assert_eq!(instance, before);
}

#[test]
fn conflicting_weight_options_leave_instance_unchanged() {
    let mut instance = Instance::from_components(
        Sense::Minimize,
        Function::variable(0),
        vec![DecisionVariable::binary(0)],
        vec![Constraint::equal_to_zero(0, Function::variable(0))],
    )
    .unwrap();
    let before = instance.clone();

    let options = QuboOptions::default()
        .with_uniform_penalty_weight(1.0)
        .with_penalty_weights(BTreeMap::from([(0, 1.0)]));
    let err = instance.to_qubo(&options).unwrap_err();
    assert!(matches!(err, ModelError::ConflictingOptions(_)));
    assert_eq!(instance, before);
}

#[test]
fn oversized_inequality_falls_back_to_bounded_slack() {
    // x0 + 2*x1 <= 40 over integers in [0, 30]: exact slack range 130
    let x: Vec<_> = (0..2)
        .map(|i| DecisionVariable::integer(i, 0.0, 30.0))
        .collect();
    let mut instance = Instance::from_components(
        Sense::Minimize,
        Function::linear([(0, 1.0), (1, 1.0)].into(), 0.0),
        x,
        vec![Constraint::less_than_or_equal_to_zero(
            0,
            Function::linear([(0, 1.0), (1, 2.0)].into(), -40.0),
        )],
    )
    .unwrap();

    instance.to_qubo(&QuboOptions::default()).unwrap();

    // the softened constraint stayed an inequality before the penalty
    // step, so its removal reason is the uniform penalty method
    let removed = instance.get_removed_constraint(0).unwrap();
    assert_eq!(removed.removed_reason, "uniform_penalty_method");
    // the bounded slack kept the default range limit
    let slack = instance.get_decision_variable(2).unwrap();
    assert_eq!(slack.name.as_deref(), Some("ommx.slack"));
    assert_eq!(slack.bound.upper, 32.0);
}
