use assert_approx_eq::assert_approx_eq;

use cocirc::extract::{extract, ExtractOptions};
use cocirc::{CocircError, Compartment, Disease, Driver, EpidemicModel, Method, Session};

fn seeded(infectious_1: f64, infectious_2: f64) -> [f64; 9] {
    let mut state = [0.0; 9];
    state[Compartment::SS.index()] = 1.0 - infectious_1 - infectious_2;
    state[Compartment::IS.index()] = infectious_1;
    state[Compartment::SI.index()] = infectious_2;
    state
}

#[test]
fn mass_is_conserved_under_lockdown_and_cross_immunity() {
    let mut session = Session::new();
    let model = session.new_model();
    session.set_parameter(model, "sigma_1", 0.5).unwrap();
    session.set_parameter(model, "sigma_2", 0.9).unwrap();
    session.set_parameter(model, "nu_2", 0.5).unwrap();

    let lockdown = session.new_forcing(1.0);
    session.add_event(lockdown, 6.0 * 360.0, 200.0, -0.8).unwrap();
    session.set_forcing_by_name(model, "k_t", lockdown).unwrap();

    let handle = session.run(model, seeded(0.001, 0.001), 1.0, 3600.0).unwrap();
    let series = session.series(handle).unwrap();
    assert_eq!(series.len(), 3601);
    for total in series.totals() {
        assert_approx_eq!(total, 1.0, 1e-9);
    }
    assert_eq!(series.first_out_of_range(), None);
}

#[test]
fn endemic_equilibrium_of_a_single_disease() {
    let mut session = Session::new();
    let model = session.new_model();
    for (name, value) in [
        ("beta_2", 0.0),
        ("nu_1", 0.0),
        ("theta_1", 0.0),
        ("kappa_1", 0.0),
    ] {
        session.set_parameter(model, name, value).unwrap();
    }
    let handle = session.run(model, seeded(0.001, 0.0), 1.0, 3600.0).unwrap();
    let series = session.series(handle).unwrap();

    // I* = ω (1 − 1/R0) / (γ + ω) with R0 = 3, ω = 1/360, γ = 0.1
    let omega = 1.0 / 360.0;
    let expected = omega * (2.0 / 3.0) / (0.1 + omega);
    let snapshot = session.snapshot(model).unwrap();
    assert_approx_eq!(snapshot.endemic_prevalence(Disease::One), expected, 1e-15);

    let prevalence = series.prevalence(Disease::One);
    assert_approx_eq!(prevalence[prevalence.len() - 1], expected, 1e-4);
    assert!(series.prevalence(Disease::Two).iter().all(|&p| p == 0.0));
}

#[test]
fn euler_and_rk4_agree_on_a_gentle_trajectory() {
    let mut session = Session::new();
    let model = session.new_model();
    let rk4 = session.run(model, seeded(0.001, 0.001), 0.1, 100.0).unwrap();
    session.set_method(Method::Euler);
    let euler = session.run(model, seeded(0.001, 0.001), 0.1, 100.0).unwrap();

    let rk4 = session.series(rk4).unwrap().ii();
    let euler = session.series(euler).unwrap().ii();
    for (a, b) in rk4.iter().zip(&euler) {
        assert_approx_eq!(*a, *b, 1e-4);
    }
}

#[test]
fn display_series_for_the_default_lockdown() {
    let mut session = Session::new();
    let model = session.new_model();
    let lockdown = session.new_forcing(1.0);
    session.add_event(lockdown, 2160.0, 200.0, -0.8).unwrap();
    session.set_forcing(model, Driver::Contact, lockdown).unwrap();
    let handle = session.run(model, seeded(0.001, 0.001), 1.0, 3600.0).unwrap();

    let display = extract(session.series(handle).unwrap(), &ExtractOptions::default()).unwrap();
    assert_eq!(display.len(), 361);
    let cases = display.new_cases(Disease::One);
    assert_approx_eq!(cases[0].y, 1.0, 1e-12);
    assert_approx_eq!(cases[360].x, 10.0, 1e-12);
    assert!(cases.iter().all(|p| p.y >= 0.0 && p.y <= 1000.0));
}

#[test]
fn run_is_deterministic_and_leaves_the_model_alone() {
    let mut session = Session::new();
    let model = session.new_model();
    let influx = session.new_forcing(0.5);
    session.set_forcing(model, Driver::Influx2, influx).unwrap();
    let before: EpidemicModel = session.snapshot(model).unwrap();

    let first = session.run(model, seeded(0.0, 0.0), 1.0, 500.0).unwrap();
    let second = session.run(model, seeded(0.0, 0.0), 1.0, 500.0).unwrap();
    assert_eq!(session.series(first).unwrap(), session.series(second).unwrap());
    assert_eq!(session.snapshot(model).unwrap(), before);
}

#[test]
fn horizon_zero_yields_the_initial_state() {
    let mut session = Session::new();
    let model = session.new_model();
    let handle = session.run(model, seeded(0.01, 0.02), 1.0, 0.0).unwrap();
    let series = session.series(handle).unwrap();
    assert_eq!(series.time(), &[0.0]);
    assert_eq!(series.si(), vec![0.02]);
}

#[test]
fn stale_indices_are_rejected() {
    let mut session = Session::new();
    let forcing = session.new_forcing(0.0);
    let change = session.add_change(forcing, 10.0, 1.0, 1.0).unwrap();
    let mut other = Session::new();
    let other_forcing = other.new_forcing(0.0);
    assert!(matches!(
        other.update_change(other_forcing, change, 10.0, 1.0, 2.0),
        Err(CocircError::IndexError { .. })
    ));
    session.update_change(forcing, change, 10.0, 1.0, 2.0).unwrap();
    assert_approx_eq!(session.evaluate(forcing, 20.0).unwrap(), 2.0, 1e-12);
}
