use std::sync::Mutex;
use log::{Level, LevelFilter, Log, Metadata, Record};
use footprint::footprint;
use footprint::config::ConfigBuilder;
use footprint::log::{LogContext, LogSink};

struct Recorder {
    records: Mutex<Vec<(String, Level, String)>>,
}

impl Log for Recorder {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut records = self.records.lock().unwrap();
        records.push((record.target().to_string(), record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static RECORDER: Recorder = Recorder { records: Mutex::new(Vec::new()) };

#[footprint]
fn square(x: u32) -> u32 {
    x * x
}

// one test per binary: the logger is process-wide
#[test]
fn lines_reach_the_log_crate() {
    log::set_logger(&RECORDER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let config = ConfigBuilder::default()
        .target("calls")
        .level(Level::Debug)
        .build()
        .unwrap();
    let ctx = std::sync::Arc::new(LogContext::new(config.clone(), LogSink::new(config.target.clone())));

    ctx.scope(|| {
        assert_eq!(square(3), 9);
        ctx.warning("careful");
    });

    let records = RECORDER.records.lock().unwrap().clone();
    let name = format!("{}.square", module_path!());
    assert_eq!(records, vec![
        ("calls".to_string(), Level::Debug, format!("CALL {} (x = 3)", name)),
        ("calls".to_string(), Level::Debug, format!("    END {} -> 9", name)),
        ("calls".to_string(), Level::Warn, "careful".to_string()),
    ]);
}
