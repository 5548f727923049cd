//! Settings
//!
//! This module defines all settings and arguments and related functions

// External imports
use anyhow::{bail, Result};
use std::env;

/// Top-level settings
#[derive(Default)]
pub struct MainSettings {
    pub first_arg: Option<String>,
    pub input_file: Option<String>,
    pub output_file: Option<String>,
    pub overwrite: bool,
}

/// Decode-specific settings
#[derive(Default)]
pub struct DecodeSettings {
    pub verbose: bool,
}

/// A custom struct holding parsed command line arguments
#[derive(Default)]
pub struct ArgsType {
    pub first_arg: Option<String>,
    /// The file to decode
    pub input_file: Option<String>,
    /// The file to output decoded assembly to. Stdout if unset.
    pub output_file: Option<String>,
    pub help: bool,
    pub verbose: bool,
    /// If true, overwrite the output file. If false (default), append.
    pub overwrite: bool,
}

const USAGE: &str = "Usage: dis86rs <input> [<output>] [-h|--help] [OPTIONS]";
const HELP: &str = "
The dis86rs 8086 Decoder

Required Parameters:
<input> : The input binary file containing 8086 machine code.

Optional Parameters:
<output> : The output file to print decoded assembly to. If not given,
           assembly is printed to stdout.

Options:

-h|--help : Print this help message.

-v|--verbose : Increase verbosity of print to include debug information.

--overwrite : If specified, overwrite the output file instead of appending to
              it.
";

pub fn print_help() {
    println!("{USAGE}");
    println!("{HELP}");
}

/// Take a given arg and parse it as an optional argument. Modify parsed_args.
fn parse_optional(arg: String, parsed_args: &mut ArgsType) -> Result<()> {
    if arg.starts_with("-v") || arg.starts_with("--verbose") {
        parsed_args.verbose = true;
    } else if arg.starts_with("--overwrite") {
        parsed_args.overwrite = true;
    } else {
        bail!("Unexpected optional arg '{arg}'\n{USAGE}");
    }
    Ok(())
}

/// Take the given arg and parse it as a positional argument. Modify parsed_args
fn parse_positional(arg: String, parsed_args: &mut ArgsType) -> Result<()> {
    match (&parsed_args.input_file, &parsed_args.output_file) {
        (None, _) => {
            parsed_args.input_file = Some(arg);
        }
        (_, None) => {
            parsed_args.output_file = Some(arg);
        }
        _ => {
            bail!("Unexpected positional arg '{arg}'\n{USAGE}");
        }
    }

    Ok(())
}

/// Parse command line arguments.
/// Return an ArgsType struct
pub fn parse_args() -> Result<ArgsType> {
    let args: Vec<String> = env::args().collect();
    let mut parsed_args = ArgsType {
        ..Default::default()
    };

    // Do a quick scan for -h/--help before processing any other args
    for arg in &args[1..] {
        if arg.starts_with("-h") || arg.starts_with("--help") {
            parsed_args.help = true;
            return Ok(parsed_args);
        }
    }

    // Now parse args, with the first arg treated as the program name
    for arg in args {
        if parsed_args.first_arg.is_none() {
            parsed_args.first_arg = Some(arg);
        } else if arg.starts_with('-') {
            parse_optional(arg, &mut parsed_args)?;
        } else {
            parse_positional(arg, &mut parsed_args)?;
        }
    }

    // Check to make sure all required args exist
    if parsed_args.input_file.is_none() {
        bail!("Missing required positional arg <input>\n{USAGE}");
    }

    Ok(parsed_args)
}

/// Split up ArgsType into various settings structs
pub fn args_to_settings(args: ArgsType) -> (MainSettings, DecodeSettings) {
    let main_settings = MainSettings {
        first_arg: args.first_arg,
        input_file: args.input_file,
        output_file: args.output_file,
        overwrite: args.overwrite,
    };

    let decode_settings = DecodeSettings {
        verbose: args.verbose,
    };

    (main_settings, decode_settings)
}
