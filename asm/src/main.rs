//! `rasm` — assembles a source file into a `ravm` binary image and,
//! optionally, loads and runs it immediately, wiring stdin lines to the
//! machine's IN endpoint and printing OUT values taken from its OUT
//! endpoint to stdout.

use clap::Parser;
use ravm::{ExitCode, IoHandle, Machine};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;

#[derive(Parser, Debug)]
#[command(name = "rasm", about = "Assembles source into a ravm binary image")]
struct Cli {
    /// Source file to assemble.
    input: PathBuf,

    /// Output path for the binary image. Defaults to the input path with
    /// its extension replaced by `.bin`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Load and run the assembled image immediately: stdin lines feed the
    /// IN endpoint (one integer per line), OUT values print to stdout.
    #[arg(short, long)]
    run: bool,

    /// Word count of the VM's data memory, used only with `--run`.
    #[arg(long, default_value_t = 256)]
    data_words: usize,
}

#[derive(Debug)]
enum Error {
    Io(io::Error, &'static str, PathBuf),
    Assemble(rasm::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, action, path) => {
                write!(f, "{} \"{}\" failed: {}", action, path.display(), err)
            }
            Error::Assemble(err) => write!(f, "{}", err),
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let source = fs::read_to_string(&cli.input)
        .map_err(|err| Error::Io(err, "reading", cli.input.clone()))?;

    let image = rasm::assemble(&source).map_err(Error::Assemble)?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("bin"));
    fs::write(&output_path, &image).map_err(|err| Error::Io(err, "writing", output_path.clone()))?;

    if cli.run {
        run_image(&image, cli.data_words);
    }

    Ok(())
}

/// Loads `image` and drives it to completion. The VM always runs on a
/// thread distinct from whichever threads hold its `IoHandle` ends (spec
/// §9's "enrich from the rest of the pack" concurrency note): one thread
/// owns the `Machine`, one feeds stdin lines to IN, and the main thread
/// drains OUT to stdout.
fn run_image(image: &[u8], data_words: usize) {
    let (mut machine, IoHandle { input, output }) = Machine::new(data_words, image.len());
    machine.load_code(image);

    let vm_thread = thread::spawn(move || machine.run());

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let Ok(value) = line.trim().parse::<i32>() else { continue };
            if input.send(value).is_err() {
                break;
            }
        }
    });

    let stdout = io::stdout();
    for value in output.iter() {
        let mut out = stdout.lock();
        let _ = writeln!(out, "{}", value);
    }

    match vm_thread.join() {
        Ok(ExitCode::Halted) => {}
        Ok(exit) => eprintln!("machine stopped: {:?}", exit),
        Err(_) => eprintln!("machine thread panicked"),
    }
}
