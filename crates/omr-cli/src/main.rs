//! `omr` command line: calibrate a template from a reference scan dump and
//! decode/grade scanned sheets.
//!
//! Scan dumps are the JSON-serialized output of the external image
//! primitives (markers, barcode, contour regions, binarized bitmap); see
//! `omr_decode::SheetScan`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use omr_decode::{
    build_template, decode_sheet, AnswerKey, CalibrationError, CalibrationParams, ConflictPolicy,
    DecodeError, DecodeParams, KeyIoError, ParamsIoError, ScanIoError, SheetScan,
};
use omr_template::{FormLayout, Template, TemplateIoError};

#[derive(Parser)]
#[command(name = "omr", about = "OMR sheet decoding and grading", version)]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a calibration template from a blank reference scan dump.
    Calibrate {
        /// Reference scan dump (JSON).
        #[arg(long)]
        scan: PathBuf,
        /// Where to write the template JSON.
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Decode a scanned sheet, optionally template-guided, and grade it.
    Decode {
        /// Sheet scan dump (JSON).
        #[arg(long)]
        scan: PathBuf,
        /// Calibration template; without it the positional heuristic is
        /// used.
        #[arg(long)]
        template: Option<PathBuf>,
        /// Answer key JSON (question number to choice letter). Without it a
        /// demo key covering the form's questions is used.
        #[arg(long)]
        key: Option<PathBuf>,
        /// Decode parameter overrides (JSON); absent fields keep their
        /// production defaults.
        #[arg(long)]
        params: Option<PathBuf>,
        /// How to resolve multiple fills in one slot.
        #[arg(long, value_enum, default_value = "last-mark")]
        policy: PolicyArg,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PolicyArg {
    FirstMark,
    LastMark,
    Reject,
}

impl From<PolicyArg> for ConflictPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::FirstMark => ConflictPolicy::FirstMark,
            PolicyArg::LastMark => ConflictPolicy::LastMark,
            PolicyArg::Reject => ConflictPolicy::Reject,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanIoError),
    #[error(transparent)]
    Template(#[from] TemplateIoError),
    #[error(transparent)]
    Key(#[from] KeyIoError),
    #[error(transparent)]
    Params(#[from] ParamsIoError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = omr_core::init_with_level(level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Calibrate { scan, output } => {
            let scan = SheetScan::load_json(scan)?;
            let template =
                build_template(&scan, FormLayout::default(), &CalibrationParams::default())?;
            template.write_json(&output)?;
            println!("Saved to {}.", output.display());
            println!("{template}");
            Ok(())
        }
        Command::Decode {
            scan,
            template,
            key,
            params,
            policy,
        } => {
            let scan = SheetScan::load_json(scan)?;
            let template = template.map(Template::load_json).transpose()?;
            let layout = template
                .as_ref()
                .map(|t| t.layout)
                .unwrap_or_default();
            let key = match key {
                Some(path) => AnswerKey::load_json(path)?,
                None => AnswerKey::demo(layout.question_count() as u32),
            };
            let mut params = match params {
                Some(path) => DecodeParams::load_json(path)?,
                None => DecodeParams::default(),
            };
            params.policy = policy.into();
            let report = decode_sheet(&scan, template.as_ref(), Some(&key), &params)?;
            print!("{}", report.render());
            Ok(())
        }
    }
}
