//! CLI entry point for the riscvm emulator binary.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use riscvm_core::{
    disassemble, disassemble_image, load_image, run, CoreState, Fault, Host, Image, StdConsole,
    StepOutcome, TraceEvent, TraceSink, VmConfig,
};
use serde_json::json;
#[cfg(test)]
use tempfile as _;

const HALT_NOTICE: &str = "CPU Halt Requested";

/// Runs a raw RV32-subset program image.
#[derive(Parser, Debug, PartialEq, Eq)]
#[command(version, about, long_about = None)]
struct Args {
    /// Program image: a raw binary of exactly 2048 bytes
    image: PathBuf,

    /// Write one JSON trace event per line to stderr
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Fault once this many instructions have retired without a halt
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// Print a listing of the image instead of running it
    #[arg(long, default_value_t = false)]
    disassemble: bool,
}

/// Trace sink writing JSON lines.
///
/// The first write error stops further output and is reported by
/// [`JsonTrace::finish`].
struct JsonTrace<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonTrace<W> {
    const fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn finish(self) -> io::Result<W> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.out),
        }
    }
}

impl<W: Write> TraceSink for JsonTrace<W> {
    fn on_event(&mut self, event: TraceEvent) {
        if self.error.is_some() {
            return;
        }
        let mut line = json!({ "event": event });
        if let TraceEvent::InstructionStart { raw_word, .. } = event {
            line["disasm"] = json!(disassemble(raw_word));
        }
        if let Err(error) = writeln!(self.out, "{line}") {
            self.error = Some(error);
        }
    }
}

fn print_listing(image: &Image) {
    for row in disassemble_image(image.as_bytes()) {
        println!("{:08x}: {:08x}  {}", row.addr, row.raw_word, row.text);
    }
}

fn execute(args: &Args) -> Result<(), Fault> {
    let image = load_image(&args.image)?;
    if args.disassemble {
        print_listing(&image);
        return Ok(());
    }

    let config = VmConfig {
        step_limit: args.max_steps,
    };
    let mut state = CoreState::new(&image);
    let mut console = StdConsole::stdio();

    let outcome = if args.trace {
        let mut trace = JsonTrace::new(io::stderr().lock());
        let outcome = run(
            &mut state,
            &mut Host::traced(&mut console, &mut trace),
            &config,
        );
        if let Err(error) = trace.finish() {
            eprintln!("warning: trace output failed: {error}");
        }
        outcome
    } else {
        run(&mut state, &mut Host::new(&mut console), &config)
    };

    match outcome.final_step {
        StepOutcome::Fault { cause } => Err(cause),
        StepOutcome::Halted | StepOutcome::Retired { .. } => {
            eprintln!("{HALT_NOTICE}");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(fault) => {
            eprintln!("error: {fault}");
            ExitCode::from(fault.exit_code())
        }
    }
}
