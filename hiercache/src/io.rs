use std::fs::File;
use std::io::{self, BufRead};
use crate::trace::TraceReader;

/// Opens a trace file for sequential reading
pub fn get_reader(file: File) -> io::Result<Box<dyn BufRead + Send>> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        const BUFFER_SIZE: usize = 16 * 4096;
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::{BufReader, Cursor};
        use memmap2::{Advice, Mmap};
        // Empty files can't be mapped
        if file.metadata()?.len() == 0 {
            return Ok(Box::new(BufReader::new(file)));
        }
        // The trace is only read, and isn't expected to change while it is mapped
        unsafe {
            let m = Mmap::map(&file)?;
            m.advise(Advice::Sequential)?;
            Ok(Box::new(Cursor::new(m)))
        }
    }
}

/// Opens the trace at `path` as a lazy record iterator
pub fn open_trace(path: &str) -> io::Result<TraceReader<Box<dyn BufRead + Send>>> {
    Ok(TraceReader::new(get_reader(File::open(path)?)?))
}
