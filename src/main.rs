use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use log::info;

use cnf_metrics::{
    analyzer::{Analyzer, METRICS_DOCUMENTATION},
    error::Result,
    io,
    ipasir::Facade,
    report::{self, Format, Writer},
};

#[derive(Parser)]
#[command(version, about = "Structural metrics for DIMACS CNF files")]
struct Args {
    /// DIMACS CNF files to analyze; none or '-' reads stdin
    dimacsfiles: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Do not check header counts or literal bounds
    #[arg(short = 'p', long = "ignore-header")]
    ignore_header: bool,

    /// Allow clauses to span multiple lines
    #[arg(short, long)]
    multiline: bool,

    /// Write reports to stdout instead of .stats files
    #[arg(long)]
    stdout: bool,

    /// Store the full source path in the report instead of the base name
    #[arg(long)]
    full_path: bool,

    /// Skip files whose .stats output already exists
    #[arg(long = "skip-existing")]
    skip_existing: bool,

    /// Print the metrics documentation and exit
    #[arg(long)]
    description: bool,
}

fn output_path(input: &Path, format: Format) -> PathBuf {
    let suffix = format!("stats.{}", format.extension());
    match input.extension() {
        Some(ext) if ext == "cnf" => input.with_extension(suffix),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(format!(".{suffix}"));
            PathBuf::from(name)
        }
    }
}

fn analyze(
    reader: &mut impl Read,
    writer: &mut Writer<impl std::io::Write>,
    source: Option<&Path>,
    args: &Args,
) -> Result<()> {
    let meta = report::source_meta(source, args.full_path);
    let mut facade = Facade::new(Analyzer::new(meta, !args.ignore_header));

    if args.multiline {
        io::read_dimacs_multiline(reader, &mut facade, args.ignore_header)?;
    } else {
        io::read_dimacs(reader, &mut facade, args.ignore_header)?;
    }
    facade.solve()?;
    facade.release()?;

    let report = facade.into_sink().into_report()?;
    writer.write(&report)?;
    writer.finish()
}

fn analyze_to_file(input: &Path, outfile: &Path, format: Format, args: &Args) -> Result<()> {
    let mut reader = fs::File::open(input)?;
    let mut writer = Writer::new(fs::File::create(outfile)?, format);
    analyze(&mut reader, &mut writer, Some(input), args)
}

fn run(args: &Args) -> Result<()> {
    let format: Format = args.format.parse()?;

    let files = if args.dimacsfiles.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        args.dimacsfiles.clone()
    };

    for input in &files {
        if input.as_os_str() == "-" {
            let mut writer = Writer::new(std::io::stdout().lock(), format);
            analyze(&mut std::io::stdin().lock(), &mut writer, None, args)?;
        } else if args.stdout {
            let mut reader = fs::File::open(input)?;
            let mut writer = Writer::new(std::io::stdout().lock(), format);
            analyze(&mut reader, &mut writer, Some(input), args)?;
        } else {
            let outfile = output_path(input, format);
            if args.skip_existing
                && fs::metadata(&outfile).map(|stat| stat.len() > 0).unwrap_or(false)
            {
                info!("{} already exists, skipping", outfile.display());
                continue;
            }

            if let Err(err) = analyze_to_file(input, &outfile, format, args) {
                // never leave a partially written report behind
                let _ = fs::remove_file(&outfile);
                return Err(err);
            }
            info!("{} written", outfile.display());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.description {
        print!("{METRICS_DOCUMENTATION}");
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
