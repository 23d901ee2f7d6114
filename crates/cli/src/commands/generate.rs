use std::process;

use rulebook_codegen::{generate_module, PythonConfig};
use rulebook_core::compile_entities;

use crate::{load_or_exit, print_json, report_error, GenerateCommands, OutputFormat};

pub(crate) fn cmd_generate(command: GenerateCommands, output: OutputFormat, quiet: bool) {
    match command {
        GenerateCommands::Python {
            rulebook,
            out,
            no_dispatcher,
        } => {
            let doc = load_or_exit(&rulebook, output, quiet);
            let compiled = compile_entities(&doc.schemas());

            let source_name = rulebook
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| rulebook.display().to_string());
            let config = PythonConfig {
                source_name,
                emit_dispatcher: !no_dispatcher,
            };
            let module = generate_module(&compiled, &config);

            let Some(out) = out else {
                print!("{}", module.source);
                if !quiet {
                    for issue in &module.issues {
                        eprintln!("warning: {}", describe(issue));
                    }
                }
                return;
            };

            if let Err(e) = std::fs::write(&out, &module.source) {
                let msg = format!("error writing '{}': {}", out.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }

            if quiet {
                return;
            }
            match output {
                OutputFormat::Text => {
                    println!("Generated Python module {}", out.display());
                    for issue in &module.issues {
                        println!("  warning: {}", describe(issue));
                    }
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "output": out.display().to_string(),
                    "issues": module.issues,
                })),
            }
        }
    }
}

fn describe(issue: &rulebook_codegen::GenerationIssue) -> String {
    match &issue.field {
        Some(field) => format!("{}.{}: {}", issue.entity, field, issue.message),
        None => format!("{}: {}", issue.entity, issue.message),
    }
}
