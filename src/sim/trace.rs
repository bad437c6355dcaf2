use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    MemReqIssue = 0,
    DramReqIssue = 1,
}

/// CSV trace of memory traffic, one line per event plus one line of
/// addresses for memory events. Matches the reference trace format so the
/// same scripts can consume either.
pub struct Tracer {
    file: BufWriter<File>,
}

impl Tracer {
    pub fn new(path: &Path) -> std::io::Result<Self> {
        Ok(Tracer {
            file: BufWriter::new(File::create(path)?),
        })
    }

    pub fn record(
        &mut self,
        cycle: u64,
        pc: u64,
        warp_id: usize,
        event: TraceEvent,
        addrs: &[u64],
    ) {
        let _ = writeln!(
            self.file,
            "{},0x{:08x},{},-1,{}",
            cycle, pc, warp_id, event as u32
        );
        let mut line = String::new();
        for addr in addrs {
            line.push_str(&format!("0x{:08x},", addr));
        }
        let _ = writeln!(self.file, "{}", line);
    }
}
