use std::path::PathBuf;
use std::process;

use reduction::{lifecycle, Config, Error, EXIT_NO_INPUT};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("usage: {} <input_file>", args[0]);
        process::exit(2);
    }

    let cfg = Config {
        session: format!("mercator_{}", process::id()),
        input: PathBuf::from(&args[1]),
    };

    match lifecycle::run(&cfg) {
        Ok(s) => {
            println!(
                "{} workers, {} terms, x = {}",
                s.workers, s.terms, s.input
            );
            println!("elapsed:   {:.6} s", s.elapsed.as_secs_f64());
            println!("result:    {:.12}", s.result);
            println!("ln(1+x):   {:.12} (reference)", s.reference);
        }
        Err(e @ Error::InputUnavailable { .. }) => {
            eprintln!("{}", e);
            process::exit(EXIT_NO_INPUT);
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
