mod common;

use common::*;
use log::{Level, Log, Metadata, Record};
use std::sync::Mutex;
use thermal_sab::{parse_thermal_scattering, TemperatureSettings};

struct Recorder {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Recorder {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records.push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static RECORDER: Recorder = Recorder {
    records: Mutex::new(Vec::new()),
};

fn records_for(table: &str) -> Vec<(Level, String)> {
    RECORDER
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, msg)| msg.starts_with(table))
        .cloned()
        .collect()
}

#[test]
fn test_missing_sections_are_warnings() {
    log::set_logger(&RECORDER).unwrap();
    log::set_max_level(log::LevelFilter::Trace);

    let store = table_store("c_Be", "equal", &[296.0], |_| {
        group(vec![("inelastic".to_string(), fixed_inelastic(2, 2, 2))])
    });
    let table =
        parse_thermal_scattering(&store.root(), "c_Be", &[296.0], &TemperatureSettings::default())
            .unwrap();
    assert!(table.data[0].elastic.is_none());

    let store = table_store("c_Graphite", "equal", &[296.0], |_| {
        group(vec![("elastic".to_string(), elastic("bragg", 2, 0))])
    });
    let table = parse_thermal_scattering(
        &store.root(),
        "c_Graphite",
        &[296.0],
        &TemperatureSettings::default(),
    )
    .unwrap();
    assert!(table.data[0].inelastic.is_none());

    let be = records_for("c_Be: no elastic data");
    assert_eq!(be.len(), 1);
    assert_eq!(be[0].0, Level::Warn);
    assert!(be[0].1.contains("296K"));

    let graphite = records_for("c_Graphite: no inelastic data");
    assert_eq!(graphite.len(), 1);
    assert_eq!(graphite[0].0, Level::Warn);
}
