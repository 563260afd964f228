use indexmap::IndexMap;

/// Append-only destination for filter output that must not touch the document.
///
/// Sinks are keyed by name (the filter command line) and have separate
/// channels for standard output and standard error.
pub trait OutputSink {
    fn write_out(&mut self, name: &str, lines: &[String]);
    fn write_err(&mut self, name: &str, lines: &[String]);
}

/// Output collected for one sink name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkChannels {
    pub out: Vec<String>,
    pub err: Vec<String>,
}

/// In-memory sinks, kept in the order they were first written.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    sinks: IndexMap<String, SinkChannels>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&SinkChannels> {
        self.sinks.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SinkChannels)> {
        self.sinks.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn channels(&mut self, name: &str) -> &mut SinkChannels {
        self.sinks.entry(name.to_string()).or_default()
    }
}

impl OutputSink for MemorySink {
    fn write_out(&mut self, name: &str, lines: &[String]) {
        self.channels(name).out.extend_from_slice(lines);
    }

    fn write_err(&mut self, name: &str, lines: &[String]) {
        self.channels(name).err.extend_from_slice(lines);
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write_out(&mut self, _name: &str, _lines: &[String]) {}
    fn write_err(&mut self, _name: &str, _lines: &[String]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_appends_per_name() {
        let mut sink = MemorySink::new();
        sink.write_out("wc -l", &["3".to_string()]);
        sink.write_err("sort", &["warning".to_string()]);
        sink.write_out("wc -l", &["4".to_string()]);

        let names: Vec<&str> = sink.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["wc -l", "sort"]);
        assert_eq!(sink.get("wc -l").unwrap().out, vec!["3", "4"]);
        assert!(sink.get("wc -l").unwrap().err.is_empty());
        assert_eq!(sink.get("sort").unwrap().err, vec!["warning"]);
        assert!(sink.get("cat").is_none());
    }
}
