use contagrid::config::Config;
use contagrid::engine::Engine;
use contagrid::error::SimError;

fn base_config() -> Config {
    Config {
        grid_width: 10,
        grid_height: 10,
        population_size: 15,
        infected_count: 1,
        comorbid_count: 4,
        contaminated_cell_count: 1,
        move_probability: 0.5,
        seed: Some(42),
        steps_per_save: 8,
        saves_per_file: 4,
    }
}

#[test]
fn invalid_composition_fails_construction() {
    let cfg = Config {
        infected_count: 10,
        comorbid_count: 6,
        ..base_config()
    };

    let error = Engine::generate_initial_condition(cfg).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<SimError>(),
        Some(SimError::InvalidPopulationComposition { .. })
    ));
}

#[test]
fn initial_condition_matches_config() {
    let cfg = base_config();
    let engine = Engine::generate_initial_condition(cfg.clone()).unwrap();
    let state = engine.state();

    assert_eq!(state.tick, 0);
    assert!(state.running);
    assert_eq!(state.agents.len(), cfg.population_size);
    assert_eq!(state.infected_count(), cfg.infected_count);
    let comorbid = state.agents.iter().filter(|agt| agt.comorbid()).count();
    assert_eq!(comorbid, cfg.comorbid_count);

    // No agent is both pre-infected and comorbid by construction.
    assert!(
        state
            .agents
            .iter()
            .all(|agt| !(agt.infected() && agt.comorbid()))
    );

    // Every agent is bound to a cell and mirrored in the occupant sets.
    for agt in &state.agents {
        let coord = agt.cell().expect("agent placed at initialization");
        assert!(state.grid.occupants_of(coord).unwrap().contains(&agt.id()));
    }

    let contaminated = state
        .grid
        .iter_cells()
        .filter(|(_, cell)| cell.contaminated())
        .count();
    assert_eq!(contaminated, cfg.contaminated_cell_count);
}

#[test]
fn infected_count_never_decreases() {
    let mut engine = Engine::generate_initial_condition(base_config()).unwrap();
    for _ in 0..50 {
        engine.step().unwrap();
    }

    let series = engine.metrics();
    assert!(!series.is_empty());
    for pair in series.windows(2) {
        assert!(pair[1].infected_count >= pair[0].infected_count);
        assert!(pair[1].direct_infection_count >= pair[0].direct_infection_count);
        assert!(pair[1].location_infection_count >= pair[0].location_infection_count);
    }
}

#[test]
fn identical_seeds_give_identical_runs() {
    let mut first = Engine::generate_initial_condition(base_config()).unwrap();
    let mut second = Engine::generate_initial_condition(base_config()).unwrap();

    for _ in 0..25 {
        first.step().unwrap();
        second.step().unwrap();
    }

    assert_eq!(first.state(), second.state());
    assert_eq!(first.metrics(), second.metrics());
}

#[test]
fn first_step_accounts_for_every_new_infection() {
    let mut engine = Engine::generate_initial_condition(Config {
        seed: Some(7),
        ..base_config()
    })
    .unwrap();

    engine.step().unwrap();

    let snapshot = &engine.metrics()[0];
    assert_eq!(snapshot.tick, 0);
    assert_eq!(snapshot.infected_count, 1);
    assert_eq!(snapshot.direct_infection_count, 0);
    assert_eq!(snapshot.location_infection_count, 0);

    let state = engine.state();
    assert_eq!(state.tick, 1);
    assert_eq!(
        state.infected_count(),
        1 + state.direct_infection_count + state.location_infection_count
    );
}

#[test]
fn all_infected_population_terminates_immediately() {
    let cfg = Config {
        population_size: 5,
        infected_count: 5,
        comorbid_count: 0,
        ..base_config()
    };
    let mut engine = Engine::generate_initial_condition(cfg).unwrap();

    engine.step().unwrap();
    assert!(!engine.running());
    assert_eq!(engine.tick(), 0);
    assert_eq!(engine.state().direct_infection_count, 0);
    assert_eq!(engine.state().location_infection_count, 0);

    let snapshot = &engine.metrics()[0];
    assert_eq!(snapshot.infected_count, 5);

    // Further steps are idempotent no-ops.
    let frozen = engine.state().clone();
    let n_snapshots = engine.metrics().len();
    engine.step().unwrap();
    engine.step().unwrap();
    assert_eq!(engine.state(), &frozen);
    assert_eq!(engine.metrics().len(), n_snapshots);
}

#[test]
fn dense_population_eventually_saturates() {
    let cfg = Config {
        grid_width: 3,
        grid_height: 3,
        population_size: 9,
        infected_count: 1,
        comorbid_count: 2,
        contaminated_cell_count: 0,
        move_probability: 1.0,
        seed: Some(1),
        ..base_config()
    };
    let mut engine = Engine::generate_initial_condition(cfg).unwrap();

    let mut steps = 0;
    while engine.running() && steps < 10_000 {
        engine.step().unwrap();
        steps += 1;
    }

    assert!(!engine.running());
    assert_eq!(engine.state().infected_count(), 9);
    assert_eq!(
        engine.state().direct_infection_count + engine.state().location_infection_count,
        8
    );
}
