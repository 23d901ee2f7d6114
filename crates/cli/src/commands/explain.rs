use std::path::Path;

use rulebook_explain::explain_spec;

use crate::{load_or_exit, print_json, OutputFormat};

pub(crate) fn cmd_explain(path: &Path, output: OutputFormat, quiet: bool) {
    let rulebook = load_or_exit(path, output, quiet);
    let spec = explain_spec(&rulebook);

    match output {
        OutputFormat::Json => print_json(&spec),
        OutputFormat::Text => {
            println!("{} ({})", spec.rulebook.name, spec.rulebook.rulebook_hash);
            for (name, entity) in &spec.entities {
                println!();
                println!("{}", name);
                for field in &entity.calc_order {
                    let Some(template) = entity.expr_templates.get(field) else {
                        continue;
                    };
                    match &template.error {
                        Some(e) => println!("  {}  error: {}", field, e),
                        None => println!("  {}  {}", field, template.template_hash),
                    }
                    if !quiet {
                        println!("    {}", template.formula_source.replace('\n', "\n    "));
                    }
                }
            }
        }
    }
}
