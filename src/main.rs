use std::{path, process};

use clap::Parser;
use pre_wgsl::{Options, Preprocessor};

/// Expand #include, #define and #if directives in a WGSL shader.
#[derive(Debug, clap::Parser)]
#[command(version, about)]
struct Args {
	/// Root WGSL module.
	input: path::PathBuf,
	/// Directory `#include` paths are resolved against.
	#[arg(short = 'I', long, default_value = ".")]
	include_path: path::PathBuf,
	/// `NAME[=VALUE]`
	///
	/// Define `NAME` to `VALUE`, or as a flag macro if `=VALUE` is omitted. Takes precedence over
	/// `#define` in the sources.
	#[arg(short = 'D', long)]
	define: Vec<String>,
	/// Write the result to this file instead of standard output.
	#[arg(short = 'o', long)]
	output: Option<path::PathBuf>,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
	let options = Options {
		include_search_path: args.include_path,
		predefined_macros: args.define,
	};
	let source = Preprocessor::new(options)?.process_file(&args.input)?;
	match args.output {
		Some(output) => ex::fs::write(output, source)?,
		None => print!("{source}"),
	}
	Ok(())
}

fn main() {
	env_logger::init();
	let args = Args::parse();

	if let Err(error) = run(args) {
		eprintln!("pre-wgsl error: {error}");
		process::exit(1);
	}
}
