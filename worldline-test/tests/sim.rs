use anyhow::Result;
use worldline_core::{assemble, Config, MachineId, Simulation, TraceSnapshot};
use worldline_test::fixtures::{ring_members, RING_VOTE_SNAPSHOT};

fn id(n: u64) -> MachineId {
    MachineId::new(n.to_string())
}

/// Drive the voting ring through the captured schedule and check that the
/// recorded trace matches the reference snapshot event for event.
#[test]
fn ring_vote_run_reproduces_reference_trace() -> Result<()> {
    let mut sim = Simulation::new(ring_members());

    for n in 0..3 {
        sim.initialize(&id(n))?;
    }

    sim.deliver(&id(0), "Petition")?; // petition from 2, rejected
    sim.deliver(&id(2), "Vote")?;
    sim.deliver(&id(2), "Petition")?; // petition from 1, accepted
    sim.deliver(&id(1), "Petition")?; // petition from 0, accepted
    sim.deliver(&id(1), "Vote")?; // 1 becomes leader
    sim.deliver(&id(0), "Vote")?; // 0 becomes leader too

    assert!(sim.machine(&id(0)).unwrap().is_leader);
    assert!(sim.machine(&id(1)).unwrap().is_leader);
    assert!(!sim.machine(&id(2)).unwrap().is_leader);

    let snapshot = sim.into_snapshot()?;
    let reference = TraceSnapshot::from_json(RING_VOTE_SNAPSHOT)?;
    assert_eq!(snapshot, reference);

    Ok(())
}

#[test]
fn simulated_trace_assembles_into_a_consistent_graph() -> Result<()> {
    let mut sim = Simulation::new(ring_members());

    for n in 0..3 {
        sim.initialize(&id(n))?;
    }
    sim.deliver(&id(1), "Petition")?;
    sim.deliver(&id(0), "Vote")?;
    sim.deliver(&id(2), "Petition")?;

    let snapshot = sim.into_snapshot()?;
    let graph = assemble(&snapshot, &Config::default())?;

    // Two init nodes (machine 2's init message was never handled, so no
    // event references its clock zero) plus three handled events.
    assert_eq!(graph.nodes.len(), 5);
    assert!(graph.is_causally_consistent());

    Ok(())
}

#[test]
fn unscheduled_delivery_is_rejected() {
    let mut sim = Simulation::new(ring_members());

    sim.initialize(&id(0)).unwrap();

    // Machine 0's petition went to machine 1; nothing is pending at 2.
    assert!(sim.deliver(&id(2), "Petition").is_err());
}
