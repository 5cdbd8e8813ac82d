use std::env;
use std::process;

use regfa::{Alphabet, Matcher};

fn usage() -> ! {
    eprintln!("usage: regfa [--alphabet SYMBOLS] REGEX [INPUT]...");
    process::exit(2)
}

fn main() {
    env_logger::init();

    let mut alphabet = None;
    let mut positional = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--alphabet" => {
                match args.next() {
                    Some(symbols) => alphabet = Some(Alphabet::new(symbols.chars())),
                    None => usage(),
                }
            }
            "-h" | "--help" => usage(),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let expression = positional.next().unwrap_or_else(|| usage());
    let matcher = match alphabet {
        Some(alphabet) => Matcher::with_alphabet(expression, alphabet),
        None => Matcher::new(expression),
    };
    let matcher = matcher.unwrap_or_else(|err| {
        eprintln!("regfa: {}", err);
        process::exit(2)
    });

    let inputs: Vec<String> = positional.collect();
    if inputs.is_empty() {
        match matcher.regex().postfix() {
            Ok(postfix) => println!("{}", postfix),
            Err(err) => {
                eprintln!("regfa: {}", err);
                process::exit(2)
            }
        }
        return;
    }

    let mut rejected = false;
    for input in &inputs {
        match matcher.is_match(input) {
            Ok(true) => println!("{:?} -> accept", input),
            Ok(false) => {
                println!("{:?} -> reject", input);
                rejected = true;
            }
            Err(err) => {
                eprintln!("regfa: {:?}: {}", input, err);
                process::exit(2)
            }
        }
    }
    if rejected {
        process::exit(1);
    }
}
