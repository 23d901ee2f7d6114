use std::process;

use rulebook_core::parse_formula;
use rulebook_explain::{template_hash, to_graph, NodeDescriptor};

use crate::{print_json, report_error, OutputFormat};

pub(crate) fn cmd_graph(formula: &str, field: &str, output: OutputFormat, quiet: bool) {
    let ast = match parse_formula(formula) {
        Ok(ast) => ast,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    let graph = to_graph(&ast, field);

    match output {
        OutputFormat::Json => print_json(&graph.to_json(formula)),
        OutputFormat::Text => {
            for (id, node) in graph.ids.iter().zip(&graph.nodes) {
                let detail = match node {
                    NodeDescriptor::Const { value, datatype } => {
                        format!("const {} ({})", value, datatype)
                    }
                    NodeDescriptor::FieldRef { field, .. } => format!("field_ref {}", field),
                    NodeDescriptor::Fn { name, args } => {
                        format!("fn {}({})", name, args.join(", "))
                    }
                    NodeDescriptor::Op { name, args } => {
                        format!("op {}({})", name, args.join(", "))
                    }
                    NodeDescriptor::Result { field, inputs, .. } => {
                        format!("result {} <- {}", field, inputs.join(", "))
                    }
                };
                println!("{:<16} {}", id, detail);
            }
            if !quiet {
                println!("template_hash: {}", template_hash(&graph, formula));
            }
        }
    }
}
