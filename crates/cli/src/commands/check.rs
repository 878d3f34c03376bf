//! `stanblocks check` — Show which fragment files exist for a model.

use stanblocks_config::GeneratorConfig;
use stanblocks_core::ModelAssembler;

pub fn run(model_name: &str, config: &GeneratorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let plan = ModelAssembler::new(model_name, config.assembler_options()).plan();

    println!("🩺 Fragments for {}", plan.model_name);
    println!("========================================\n");

    let mut missing = 0;
    for input in &plan.inputs {
        let present = input.path.is_file();
        let marker = match (present, input.required) {
            (true, _) => "✅",
            (false, true) => "❌",
            (false, false) => "➖",
        };
        let note = if input.required { "" } else { " (optional)" };
        println!("  {marker} {:<16} {}{note}", input.role, input.path.display());
        if !present && input.required {
            missing += 1;
        }
    }

    println!();
    for output in &plan.outputs {
        let state = if output.path.exists() { "overwrite" } else { "create" };
        println!("  → {:<16} {} ({state})", output.variant, output.path.display());
    }

    println!();
    if missing == 0 {
        println!("  🎉 All required fragments present");
        Ok(())
    } else {
        Err(format!("{missing} required fragment(s) missing").into())
    }
}
