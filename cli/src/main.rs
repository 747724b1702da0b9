use std::{cmp::Ordering, process::exit};

use lox::Lox;

fn main() {
    let mut args = std::env::args();
    let mut lox = Lox::default();
    match args.len().cmp(&2) {
        Ordering::Greater => {
            println!("Usage: lox [script]");
            exit(64);
        }
        Ordering::Equal => {
            if let Err(err) = lox.run_file(&args.nth(1).unwrap()) {
                eprintln!("{}", err);
                exit(65);
            }
            if lox.had_error() {
                exit(65);
            }
        }
        _ => {
            let _ = lox.run_prompt();
        }
    }
}
