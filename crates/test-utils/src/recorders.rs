use std::sync::{Arc, Mutex};

use gulptree::explorer::{CommandFlags, FlagPublisher};
use gulptree::output::{AlertSink, OutputCategory, OutputChannel};

/// Flag publisher recording every published flag set.
#[derive(Clone, Default)]
pub struct RecordingFlags {
    history: Arc<Mutex<Vec<CommandFlags>>>,
}

impl RecordingFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<CommandFlags> {
        self.history.lock().unwrap().last().copied()
    }

    pub fn history(&self) -> Vec<CommandFlags> {
        self.history.lock().unwrap().clone()
    }
}

impl FlagPublisher for RecordingFlags {
    fn publish(&mut self, flags: CommandFlags) {
        self.history.lock().unwrap().push(flags);
    }
}

/// Output channel collecting every logged line with its category.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    lines: Arc<Mutex<Vec<(String, Option<OutputCategory>)>>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|(line, _)| line.clone())
            .collect()
    }

    pub fn categorized(&self) -> Vec<(String, Option<OutputCategory>)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|(line, _)| line.contains(needle))
    }
}

impl OutputChannel for RecordingChannel {
    fn log(&self, message: &str) {
        self.lines.lock().unwrap().push((message.to_string(), None));
    }

    fn log_with(&self, message: &str, category: OutputCategory) {
        self.lines
            .lock()
            .unwrap()
            .push((message.to_string(), Some(category)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warn,
    Error,
}

/// Alert sink collecting every alert with its level.
#[derive(Clone, Default)]
pub struct RecordingAlerts {
    alerts: Arc<Mutex<Vec<(AlertLevel, String)>>>,
}

impl RecordingAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(AlertLevel, String)> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.of_level(AlertLevel::Info)
    }

    pub fn errors(&self) -> Vec<String> {
        self.of_level(AlertLevel::Error)
    }

    fn of_level(&self, level: AlertLevel) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl AlertSink for RecordingAlerts {
    fn info(&self, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((AlertLevel::Info, message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((AlertLevel::Warn, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((AlertLevel::Error, message.to_string()));
    }
}
