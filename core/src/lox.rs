use std::{
    error::Error,
    fs::File,
    io::{self, BufRead, Read, Write},
};

use crate::{reporter::ConsoleReporter, scanner::Scanner};

pub type LoxResult = Result<(), Box<dyn Error>>;

#[derive(Default)]
pub struct Lox {
    reporter: ConsoleReporter,
}

impl Lox {
    pub fn run_file(&mut self, path: &str) -> LoxResult {
        let mut file = File::open(path)?;
        let mut source = String::new();

        file.read_to_string(&mut source)?;

        self.run(source);

        Ok(())
    }

    pub fn run_prompt(&mut self) -> LoxResult {
        print!("> ");
        io::stdout().flush()?;

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    self.run(line);
                    // An error on one line shouldn't poison the next
                    self.reporter.reset();
                }
                Err(_) => break,
            };

            print!("> ");
            io::stdout().flush()?;
        }

        Ok(())
    }

    pub fn had_error(&self) -> bool {
        self.reporter.had_error()
    }

    fn run(&mut self, source: String) {
        // Scan source into tokens
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens(&mut self.reporter);

        // For now just print the tokens
        for token in tokens {
            println!("{:?}", token);
        }
    }
}
