use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use memtier_config::{DeadlinePolicy, ParsePolicy};
use memtier_core::{ClockSettings, Event};
use memtier_simulator::replay;
use memtier_simulator::{
    Process, RunnerSettings, Simulation, SimulationError, SimulationReport, SimulationSettings,
};
use memtier_telemetry::MetricsRecorder;

fn settings(capacity: usize, start: u64, parse_policy: ParsePolicy) -> SimulationSettings {
    SimulationSettings {
        capacity,
        clock: ClockSettings {
            start,
            step: 10,
            tick_interval: Duration::from_millis(1),
        },
        runner: RunnerSettings {
            pacing: Duration::ZERO,
            pacing_jitter: Duration::ZERO,
            deadline_policy: DeadlinePolicy::RunToCompletion,
            parse_policy,
        },
    }
}

fn lines(commands: &[&str]) -> Vec<String> {
    commands.iter().map(|c| c.to_string()).collect()
}

fn events_of(report: &SimulationReport, pid: u32) -> Vec<Event> {
    report
        .events
        .iter()
        .map(|record| record.event.clone())
        .filter(|event| event.pid() == Some(pid))
        .collect()
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn third_store_evicts_oldest_and_lookup_promotes_it() {
    let process = Process::new(
        1,
        0,
        0,
        lines(&["Store x 1", "Store y 2", "Store z 3", "Lookup x", "Lookup q"]),
    );
    let simulation = Simulation::new(settings(2, 0, ParsePolicy::Lenient), vec![process]);
    let report = simulation.run().unwrap();

    assert!(report.all_succeeded());
    let events: Vec<Event> = report.events.iter().map(|r| r.event.clone()).collect();
    assert_eq!(
        events,
        [
            Event::Started { pid: 1 },
            Event::Store {
                pid: 1,
                id: "x".into(),
                value: 1
            },
            Event::Store {
                pid: 1,
                id: "y".into(),
                value: 2
            },
            Event::SwapOut { id: "x".into() },
            Event::Store {
                pid: 1,
                id: "z".into(),
                value: 3
            },
            Event::SwapOut { id: "y".into() },
            Event::SwapIn { id: "x".into() },
            Event::LookupFound {
                pid: 1,
                id: "x".into(),
                value: 1
            },
            Event::LookupMissing {
                pid: 1,
                id: "q".into()
            },
            Event::Finished { pid: 1 },
        ]
    );

    assert_eq!(report.snapshot.entries(), &[("y".to_string(), 2)]);
    assert_eq!(report.resident, vec!["z", "x"]);
    replay::verify(&report).unwrap();
}

#[test]
fn concurrent_processes_match_sequential_replay() {
    let processes = (1..=4)
        .map(|pid| {
            let commands = (0..20)
                .map(|i| match i % 3 {
                    0 => format!("Store p{pid}v{i} {i}"),
                    1 => format!("Lookup p{pid}v{}", i - 1),
                    _ => format!("Release p{pid}v{}", i - 5),
                })
                .collect();
            Process::new(pid, 0, 0, commands)
        })
        .collect();

    let metrics = Arc::new(MetricsRecorder::new());
    let simulation = Simulation::with_outputs(
        settings(3, 0, ParsePolicy::Lenient),
        processes,
        None,
        Arc::clone(&metrics),
    );
    let report = simulation.run().unwrap();

    assert!(report.all_succeeded());
    assert!(report.resident.len() <= 3);
    for outcome in &report.processes {
        assert_eq!(outcome.as_ref().unwrap().executed, 20);
    }
    assert_eq!(metrics.stores.get(), 4 * 7);
    replay::verify(&report).unwrap();

    let clocks: Vec<u64> = report
        .events
        .iter()
        .filter(|r| !matches!(r.event, Event::Started { .. } | Event::Finished { .. }))
        .map(|r| r.clock)
        .collect();
    assert!(clocks.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn lifecycle_records_respect_start_and_deadline() {
    let processes = vec![
        Process::new(1, 30, 50, lines(&["Store a 1"])),
        Process::new(2, 10, 20, lines(&["Lookup a"])),
    ];
    let simulation = Simulation::new(settings(4, 0, ParsePolicy::Lenient), processes);
    let report = simulation.run().unwrap();

    for (pid, start, deadline) in [(1, 30, 80), (2, 10, 30)] {
        let records: Vec<_> = report
            .events
            .iter()
            .filter(|record| record.event.pid() == Some(pid))
            .collect();
        assert_eq!(records.first().unwrap().event, Event::Started { pid });
        assert_eq!(records.last().unwrap().event, Event::Finished { pid });
        assert!(records.first().unwrap().clock >= start);
        assert!(records.last().unwrap().clock >= deadline);
    }
    assert!(report.final_clock >= 80);
}

#[test]
fn sink_receives_every_record_in_order() {
    let buf = SharedBuf::default();
    let processes = vec![
        Process::new(1, 0, 10, lines(&["Store a 1", "Release a"])),
        Process::new(2, 0, 10, lines(&["Lookup a"])),
    ];
    let simulation = Simulation::with_outputs(
        settings(1, 0, ParsePolicy::Lenient),
        processes,
        Some(Box::new(buf.clone())),
        Arc::new(MetricsRecorder::new()),
    );
    let report = simulation.run().unwrap();

    let written = String::from_utf8(buf.0.lock().clone()).unwrap();
    let expected: String = report
        .events
        .iter()
        .map(|record| format!("{record}\n"))
        .collect();
    assert_eq!(written, expected);
    assert!(written.contains("Process 1, Store: Variable a, Value: 1"));
}

#[test]
fn strict_parse_failure_is_isolated() {
    let processes = vec![
        Process::new(1, 0, 0, lines(&["Store a 1", "Store b"])),
        Process::new(2, 0, 0, lines(&["Store c 3", "Lookup c"])),
    ];
    let simulation = Simulation::new(settings(4, 0, ParsePolicy::Strict), processes);
    let report = simulation.run().unwrap();

    assert!(!report.all_succeeded());
    assert!(matches!(
        report.processes[0],
        Err(SimulationError::CommandParse { pid: 1, .. })
    ));
    assert_eq!(report.processes[1].as_ref().unwrap().executed, 2);
    assert_eq!(report.failures().count(), 1);

    let second = events_of(&report, 2);
    assert_eq!(second.last(), Some(&Event::Finished { pid: 2 }));
    let first = events_of(&report, 1);
    assert!(matches!(first.last(), Some(Event::Failed { pid: 1, .. })));
}

#[test]
fn releasing_unknown_id_only_logs() {
    let process = Process::new(1, 0, 0, lines(&["Release ghost", "Store a 1"]));
    let simulation = Simulation::new(settings(1, 0, ParsePolicy::Lenient), vec![process]);
    let report = simulation.run().unwrap();

    assert_eq!(
        events_of(&report, 1)[1],
        Event::Release {
            pid: 1,
            id: "ghost".into()
        }
    );
    assert_eq!(report.resident, vec!["a"]);
    assert!(report.snapshot.is_empty());
}

#[test]
fn clock_can_start_above_zero() {
    let process = Process::new(1, 0, 0, lines(&["Store a 1"]));
    let simulation = Simulation::new(settings(1, 1000, ParsePolicy::Lenient), vec![process]);
    let report = simulation.run().unwrap();

    assert!(report.events.iter().all(|record| record.clock >= 1000));
    assert!(report.final_clock >= 1000);
}

#[test]
fn simulation_runs_only_once() {
    let simulation = Simulation::new(settings(1, 0, ParsePolicy::Lenient), Vec::new());
    let report = simulation.run().unwrap();
    assert!(report.events.is_empty());

    assert!(matches!(simulation.run(), Err(SimulationError::Clock(_))));
}
