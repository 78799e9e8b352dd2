use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::ValueEnum;
use csv::ReaderBuilder;
use log::{debug, error, info};
use serde::Deserialize;
use std::{fmt, fs, io::Read, path::Path};
use walkdir::WalkDir;

/// One request of a simulated experiment, as logged by the simulator.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub experiment: String,
    pub app: String,
    pub container: Option<String>,
    pub injected: DateTime<Utc>,
    pub finished: bool,
    /// Seconds between injection and completion. Only set for finished
    /// requests.
    pub response_time: Option<f64>,
}

/// Row layout of the event CSV files. Converted to an `Event` once every
/// field has been validated.
#[derive(Debug, Deserialize)]
struct Record {
    experiment: String,
    app: String,
    #[serde(default)]
    container: Option<String>,
    injected: String,
    finished: String,
    #[serde(default)]
    response_time: Option<f64>,
}

impl TryFrom<Record> for Event {
    type Error = anyhow::Error;

    fn try_from(record: Record) -> Result<Event> {
        let finished = parse_bool(&record.finished)?;
        let response_time = match record.response_time {
            Some(rt) if finished && !rt.is_nan() => Some(rt),
            _ => None,
        };

        Ok(Event {
            experiment: record.experiment,
            app: record.app,
            container: record.container.filter(|c| !c.is_empty()),
            injected: parse_timestamp(&record.injected)?,
            finished,
            response_time,
        })
    }
}

pub fn parse_bool(input: &str) -> Result<bool> {
    match input.trim() {
        "true" | "True" | "TRUE" | "1" => Ok(true),
        "false" | "False" | "FALSE" | "0" => Ok(false),
        other => anyhow::bail!("invalid boolean (value={other})"),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` (assumed UTC) and epoch
/// seconds.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(input) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(t.and_utc());
        }
    }
    // Rejects "NaN" and "inf", which the float parser accepts
    if let Some(secs) = input.parse::<f64>().ok().filter(|s| s.is_finite()) {
        if let Some(t) = DateTime::from_timestamp_millis((secs * 1000.0).round() as i64) {
            return Ok(t);
        }
    }

    anyhow::bail!("invalid timestamp (value={input})")
}

/// Categorical column used to split aggregated series.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum Grouper {
    #[default]
    App,
    Container,
}

impl Grouper {
    pub fn key<'a>(&self, event: &'a Event) -> Option<&'a str> {
        match self {
            Grouper::App => Some(event.app.as_str()),
            Grouper::Container => event.container.as_deref(),
        }
    }

    pub fn title_suffix(&self) -> &'static str {
        match self {
            Grouper::App => "per application",
            Grouper::Container => "per container",
        }
    }

    pub fn legend_title(&self) -> &'static str {
        match self {
            Grouper::App => "Application",
            Grouper::Container => "Container type",
        }
    }
}

impl fmt::Display for Grouper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouper::App => write!(f, "app"),
            Grouper::Container => write!(f, "container"),
        }
    }
}

/// Long-form table of events, one row per request.
#[derive(Clone, Debug, Default)]
pub struct EventTable {
    events: Vec<Event>,
}

impl EventTable {
    pub fn new(events: Vec<Event>) -> EventTable {
        EventTable { events }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<EventTable> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let mut events = Vec::new();
        for (line, result) in reader.deserialize::<Record>().enumerate() {
            let record = result.map_err(|e| {
                let reason = format!("error reading event (row={}, error={e})", line + 1);
                error!("{reason}");
                anyhow::anyhow!(reason)
            })?;
            let event = Event::try_from(record)
                .with_context(|| format!("invalid event (row={})", line + 1))?;
            events.push(event);
        }

        Ok(EventTable { events })
    }

    pub fn from_path(path: &Path) -> Result<EventTable> {
        let file = fs::File::open(path)
            .with_context(|| format!("error opening event log (path={})", path.display()))?;
        let table = Self::from_reader(file)
            .with_context(|| format!("error parsing event log (path={})", path.display()))?;
        debug!("read {} events from {}", table.len(), path.display());

        Ok(table)
    }

    /// Concatenates every CSV file found under `dir`, in path order.
    pub fn from_dir(dir: &Path) -> Result<EventTable> {
        let mut csv_files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let reason = format!("error walking directory (path={}, error={e})", dir.display());
                error!("{reason}");
                anyhow::anyhow!(reason)
            })?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("csv")
            {
                csv_files.push(entry.into_path());
            }
        }

        let mut events = Vec::new();
        for csv_file in &csv_files {
            events.extend(Self::from_path(csv_file)?.events);
        }
        info!(
            "loaded {} events from {} files under {}",
            events.len(),
            csv_files.len(),
            dir.display()
        );

        Ok(EventTable { events })
    }

    /// Reads a single file or every CSV under a directory.
    pub fn load(path: &Path) -> Result<EventTable> {
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            Self::from_path(path)
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<Event> for EventTable {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        EventTable {
            events: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_read_events() {
        let csv = "\
experiment,app,container,injected,finished,response_time,extra
poisson_hard_SWRR_q0,app0,cc0app0,2024-03-01 09:00:01.250,True,1.2,x
poisson_hard_SWRR_q0,app1,,2024-03-01T09:00:02Z,False,,y
";
        let table = EventTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.events()[0];
        assert_eq!(first.container.as_deref(), Some("cc0app0"));
        assert!(first.finished);
        assert_eq!(first.response_time, Some(1.2));
        assert_eq!(first.injected.timestamp_millis() % 1000, 250);

        let second = &table.events()[1];
        assert_eq!(second.container, None);
        assert!(!second.finished);
        assert_eq!(second.response_time, None);
        assert_eq!(
            second.injected,
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 2).unwrap()
        );
    }

    #[test]
    fn test_read_events_without_container_column() {
        let csv = "\
experiment,app,injected,finished,response_time
e,app0,1709283600,1,0.5
";
        let table = EventTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.events()[0].container, None);
        assert_eq!(
            table.events()[0].injected,
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_required_column_fails() {
        let csv = "\
experiment,injected,finished,response_time
e,2024-03-01 09:00:00,True,0.5
";
        assert!(EventTable::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_invalid_boolean_fails() {
        let csv = "\
experiment,app,injected,finished,response_time
e,app0,2024-03-01 09:00:00,maybe,0.5
";
        assert!(EventTable::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_lost_requests_drop_response_time() {
        let csv = "\
experiment,app,injected,finished,response_time
e,app0,2024-03-01 09:00:00,False,3.0
";
        let table = EventTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.events()[0].response_time, None);
    }

    #[test]
    fn test_nan_timestamp_fails() {
        assert!(parse_timestamp("NaN").is_err());
        assert!(parse_timestamp("nan").is_err());
        assert!(parse_timestamp("inf").is_err());

        let csv = "\
experiment,app,injected,finished,response_time
e,app0,NaN,True,0.5
";
        assert!(EventTable::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_directory_of_logs() {
        let dir = std::env::temp_dir().join(format!("simplot-events-{}", std::process::id()));
        let nested = dir.join("run2");
        fs::create_dir_all(&nested).unwrap();

        let header = "experiment,app,injected,finished,response_time\n";
        fs::write(
            dir.join("b.csv"),
            format!("{header}e,app1,2024-03-01 09:00:01,True,0.5\n"),
        )
        .unwrap();
        fs::write(
            dir.join("a.csv"),
            format!("{header}e,app0,2024-03-01 09:00:00,True,0.5\ne,app0,2024-03-01 09:00:02,False,\n"),
        )
        .unwrap();
        fs::write(
            nested.join("c.csv"),
            format!("{header}e,app2,2024-03-01 09:00:03,True,0.5\n"),
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "not,a,log\n").unwrap();

        let table = EventTable::load(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        let apps: Vec<&str> = table.events().iter().map(|e| e.app.as_str()).collect();
        assert_eq!(apps, vec!["app0", "app0", "app1", "app2"]);
    }

    #[test]
    fn test_grouper_keys() {
        let csv = "\
experiment,app,container,injected,finished,response_time
e,app0,cc1app0,2024-03-01 09:00:00,True,0.5
e,app1,,2024-03-01 09:00:00,False,
";
        let table = EventTable::from_reader(csv.as_bytes()).unwrap();
        let events = table.events();

        assert_eq!(Grouper::App.key(&events[0]), Some("app0"));
        assert_eq!(Grouper::Container.key(&events[0]), Some("cc1app0"));
        assert_eq!(Grouper::Container.key(&events[1]), None);
    }
}
