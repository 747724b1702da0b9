/// Receives lexical errors as the scan encounters them. The scanner reports
/// through this seam and keeps going; whoever owns the reporter decides what
/// an error means for the process.
pub trait ErrorReporter {
    fn report(&mut self, line: u32, message: &str);
}

/// Reporter used by the driver: prints to stderr and remembers that an error
/// occurred so the caller can pick an exit code.
#[derive(Default)]
pub struct ConsoleReporter {
    had_error: bool,
}

impl ConsoleReporter {
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn reset(&mut self) {
        self.had_error = false;
    }
}

impl ErrorReporter for ConsoleReporter {
    fn report(&mut self, line: u32, message: &str) {
        eprintln!("[line {}] Error: {}", line, message);
        self.had_error = true;
    }
}
