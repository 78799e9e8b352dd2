use crate::data::events::{Event, EventTable};
use log::debug;
use std::fmt;

/// The four parameters identifying one simulated scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExperimentKey {
    pub distribution: String,
    pub termination: String,
    pub lb: String,
    pub queue_size: String,
}

impl ExperimentKey {
    pub fn new(distribution: &str, termination: &str, lb: &str, queue_size: &str) -> Self {
        ExperimentKey {
            distribution: distribution.to_string(),
            termination: termination.to_string(),
            lb: lb.to_string(),
            queue_size: queue_size.to_string(),
        }
    }

    /// Label stored in the `experiment` column of the event logs.
    pub fn label(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.distribution, self.termination, self.lb, self.queue_size
        )
    }

    /// Human-readable form used in chart titles.
    pub fn scenario(&self) -> String {
        format!(
            "<{}, {}, {}, {}>",
            self.distribution, self.termination, self.lb, self.queue_size
        )
    }
}

impl fmt::Display for ExperimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Borrowed subset of an `EventTable`, in table order.
#[derive(Clone, Debug, Default)]
pub struct Selection<'a> {
    events: Vec<&'a Event>,
}

impl<'a> Selection<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a Event> + '_ {
        self.events.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn restrict_app(self, app: Option<&str>) -> Selection<'a> {
        match app {
            Some(app) => Selection {
                events: self.events.into_iter().filter(|e| e.app == app).collect(),
            },
            None => self,
        }
    }
}

impl<'a> FromIterator<&'a Event> for Selection<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Event>>(iter: I) -> Self {
        Selection {
            events: iter.into_iter().collect(),
        }
    }
}

impl EventTable {
    /// Rows of the given experiment, or every row when `experiment` is
    /// `None`.
    pub fn filter(&self, experiment: Option<&str>) -> Selection<'_> {
        match experiment {
            Some(label) => self.events().iter().filter(|e| e.experiment == label).collect(),
            None => self.events().iter().collect(),
        }
    }

    /// Rows whose `experiment` label matches `key` exactly. An unknown
    /// combination yields an empty selection.
    pub fn select(&self, key: &ExperimentKey) -> Selection<'_> {
        let label = key.label();
        let selection = self.filter(Some(&label));
        debug!("selected {} events for experiment {label}", selection.len());
        selection
    }
}
