//! CLI front-end: builds a QUTD v1 transducer from a sorted
//! `key<TAB>value` file and writes it out, with optional self-test.

use std::io::Write;

use clap::Parser;
use qubiq_terms::cli::BuildTransducerArgs;
use qubiq_terms::TransducerManager;

fn main() {
    let args = BuildTransducerArgs::parse();
    qubiq_terms::tracing::init(&args.log_level);

    if let Err(message) = run(&args) {
        println!("ERROR building: {message}");
        std::process::exit(1);
    }
}

fn run(args: &BuildTransducerArgs) -> Result<(), String> {
    let manager = TransducerManager::new();

    let transducer = manager
        .build_with_progress(&args.input, |bytes_read, bytes_total| {
            let pct = if bytes_total == 0 {
                100.0
            } else {
                100.0 * bytes_read as f64 / bytes_total as f64
            };
            print!("Read: {pct:.1}% ({bytes_read} / {bytes_total})\r");
            let _ = std::io::stdout().flush();
        })
        .map_err(|e| e.to_string())?;

    println!("Read 100%                              ");
    println!("Successfully built");

    if args.self_test {
        println!("Started self-testing");
        let mismatches = manager
            .self_test(&transducer, &args.input)
            .map_err(|e| e.to_string())?;
        for m in &mismatches {
            println!("Not found on line: {}", m.line);
            println!("word                 = {}", m.marked_key());
            println!("is_transducer_ready  = {}", m.is_transducer_ready);
            println!("is_reached_pos_final = {}", m.is_reached_pos_final);
            println!("reached_pos          = {}", m.reached_pos);
            println!(
                "labels_at_failed     = {}",
                m.labels_at_failed.iter().collect::<String>()
            );
        }
        println!("Total not founds: {}", mismatches.len());
        if mismatches.is_empty() {
            println!("Successfully self-tested");
        } else {
            println!("WARNING: self-testing failed");
        }
    }

    manager
        .save_with_progress(&transducer, &args.output, |states_done, states_total| {
            print!("Saved: {states_done} / {states_total}\r");
            let _ = std::io::stdout().flush();
        })
        .map_err(|e| e.to_string())?;

    println!("Saved 100%                              ");
    println!("Successfully saved");

    Ok(())
}
