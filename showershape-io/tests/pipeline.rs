#![allow(clippy::float_cmp)]
use approx::assert_relative_eq;
use showershape_algorithms::{AnalysisConfig, EventAggregator};
use showershape_io::{create_sink, read_layer_positions, EventReader};
use std::fs;

const LAYERS: &str = "1 0.0\n2 5.9\n3 11.8\n";

const EVENTS: &str = concat!(
    r#"{"run":{"event":1,"run":700,"pdg_id":11,"energy":50.0,"configuration":1,"run_type":1},"hits":["#,
    r#"{"layer":1,"energy":10.0,"x":0.0,"y":0.0},"#,
    r#"{"layer":1,"energy":20.0,"x":10.0,"y":0.0},"#,
    r#"{"layer":2,"energy":0.3,"x":0.0,"y":0.0}]}"#,
    "\n",
    r#"{"run":{"event":2,"run":700,"configuration":1},"hits":[{"layer":9,"energy":40.0,"x":0.0,"y":0.0}]}"#,
    "\n",
    r#"{"run":{"event":3,"run":700,"configuration":1},"hits":[{"layer":3,"energy":8.0,"x":1.0,"y":2.0}]}"#,
    "\n"
);

#[test]
fn test_process_files_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let layers_path = dir.path().join("layers.txt");
    let events_path = dir.path().join("events.jsonl");
    let output_path = dir.path().join("variables.jsonl");
    fs::write(&layers_path, LAYERS).unwrap();
    fs::write(&events_path, EVENTS).unwrap();

    let positions = read_layer_positions(&layers_path).unwrap();
    let aggregator = EventAggregator::new(AnalysisConfig::default(), positions).unwrap();
    let reader = EventReader::open(&events_path).unwrap();

    let mut sink = create_sink(&output_path).unwrap();
    let mut failures = Vec::new();
    for event in reader.events() {
        let event = event.unwrap();
        match aggregator.process_record(&event) {
            Ok(record) => sink.write_record(&record).unwrap(),
            Err(err) => failures.push((event.run.event, err.to_string())),
        }
    }
    sink.finish().unwrap();
    assert_eq!(sink.records_written(), 2);
    drop(sink);

    // Event 2 has a signal hit in a layer without a z position.
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 2);
    assert!(failures[0].1.contains("layer 9"));

    let text = fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(r#"{"eventID":1.0,"run":700.0,"pdgID":11.0,"#));

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_relative_eq!(first["xmean"].as_f64().unwrap(), 20.0 / 3.0, epsilon = 1e-12);
    assert_eq!(first["NRechits"].as_f64(), Some(2.0));
    assert_eq!(first["NNoisehits"].as_f64(), Some(1.0));
    assert_eq!(first["d2_maxE_layer1"].as_f64(), Some(10.0));
    assert_eq!(first["25PercentQuantileRechitSpectrum"].as_f64(), Some(-1.0));

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["eventID"].as_f64(), Some(3.0));
    assert_relative_eq!(second["zmean"].as_f64().unwrap(), 11.8);
    assert_eq!(second["E_EE"].as_f64(), Some(0.0));
    assert_eq!(second["E_FH"].as_f64(), Some(8.0));
    assert!(second["E_EEperE_tot"].as_f64().is_some());
}

#[test]
fn test_ratio_with_empty_ring_is_null_in_json() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("out.jsonl");
    let mut record = showershape_core::OutputRecord::new();
    record.add("E_EEperE_tot", f64::NAN);
    let mut sink = create_sink(&output_path).unwrap();
    sink.write_record(&record).unwrap();
    sink.finish().unwrap();
    drop(sink);
    assert_eq!(
        fs::read_to_string(&output_path).unwrap(),
        "{\"E_EEperE_tot\":null}\n"
    );
}
