use std::io::Write;
use parking_lot::Mutex;
use crate::device::MemorySystemDevice;
use crate::error::DeviceError;
use crate::trace::TraceRecord;

/// Place one of these at any level in the hierarchy to get a read/write trace at that level
///
/// Each access is appended as the decimal address followed by `" W"` or `" R"` and a newline.
/// Records are written in the order the accesses acquire the writer, and the output is never
/// rewound
#[derive(Debug)]
pub struct Tracer<W: Write + Send> {
    trace_file: Mutex<W>,
}

impl<W: Write + Send> Tracer<W> {
    pub fn new(trace_file: W) -> Self {
        Self {
            trace_file: Mutex::new(trace_file),
        }
    }

    pub fn flush(&self) -> Result<(), DeviceError> {
        self.trace_file.lock().flush()?;
        Ok(())
    }

    /// Returns the underlying writer, e.g. to inspect an in-memory trace
    pub fn into_inner(self) -> W {
        self.trace_file.into_inner()
    }
}

impl<W: Write + Send> MemorySystemDevice for Tracer<W> {
    fn access(&self, address: u64, is_write: bool) -> Result<(), DeviceError> {
        let mut trace_file = self.trace_file.lock();
        writeln!(trace_file, "{}", TraceRecord { address, is_write })?;
        Ok(())
    }

    fn invalidate(&self, _address: u64) -> Result<(), DeviceError> {
        Err(DeviceError::InvalidOperation("tracers hold no lines to invalidate"))
    }
}
