//! Prints the JSON Schema of the YAML configuration file

// Only the configuration types of the runtime are used here
#![allow(unused_imports, dead_code)]

mod runtime;

fn main() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(runtime::Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
