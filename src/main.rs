//! # dis86rs - 8086 Decoder Executable

// External imports
use anyhow::Result;
use std::io::Write;

// Internal imports
use dis86rs::decode::decode;
use dis86rs::settings::{args_to_settings, parse_args, print_help};
use dis86rs::{file_to_byte_vec, get_output_file_from_path};

fn main() -> Result<()> {
    // Parse args. Fail if incorrect args are given
    let args = parse_args()?;

    // Now, *process* parsed args
    if args.help {
        print_help();
        return Ok(());
    }

    let (main_settings, decode_settings) = args_to_settings(args);

    let program_bytes = file_to_byte_vec(&main_settings.input_file)?;
    if decode_settings.verbose {
        println!(
            "; decoding instructions from file '{}'...",
            main_settings.input_file.as_ref().unwrap()
        );
    }

    let insts = decode(&program_bytes, &decode_settings)?;

    // Print decoded assembly to the output file, or stdout if none given
    match &main_settings.output_file {
        Some(path) => {
            let mut output_file = get_output_file_from_path(path, main_settings.overwrite)?;
            writeln!(output_file, "bits 16")?;
            for inst in insts {
                writeln!(output_file, "{}", inst)?;
            }
        }
        None => {
            println!("bits 16");
            for inst in insts {
                println!("{}", inst);
            }
        }
    }

    Ok(())
}
