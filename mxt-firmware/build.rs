//! Build script for mxt-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates touch.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Allowed keys per section with their inclusive value ranges
const SCHEMA: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "bus",
        &[("address", 0x08, 0x77), ("frequency_hz", 10_000, 1_000_000)],
    ),
    (
        "boot",
        &[("delay_ms", 0, 10_000), ("poll_interval_ms", 1, 1_000)],
    ),
    (
        "power",
        &[("t7_idle", 0, 255), ("t7_active", 0, 255), ("t9_ctrl", 0, 255)],
    ),
];

/// Validate touch.toml at compile time
///
/// The firmware parses the same file at runtime with a small no_std parser
/// and falls back to defaults on error, so mistakes are caught here instead.
fn validate_config() {
    println!("cargo:rerun-if-changed=touch.toml");

    let config_path = Path::new("touch.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: touch.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a touch.toml configuration file.          ║\n\
            ║  Please create one in the mxt-firmware directory.                ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read touch.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in touch.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let errors = validate_sections(&config);
    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid touch configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=touch.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check every section against [`SCHEMA`]
fn validate_sections(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(root) = config.as_table() else {
        errors.push("top level must be a table".to_string());
        return errors;
    };

    for (name, section) in root {
        let Some(keys) = SCHEMA.iter().find(|(s, _)| *s == name.as_str()).map(|(_, k)| *k) else {
            errors.push(format!("unknown section [{}]", name));
            continue;
        };
        let Some(table) = section.as_table() else {
            errors.push(format!("[{}] must be a table", name));
            continue;
        };

        for (key, value) in table {
            let Some(&(_, min, max)) = keys.iter().find(|(k, _, _)| *k == key.as_str()) else {
                // Extra keys are ignored by the runtime parser
                println!("cargo:warning=touch.toml: [{}] ignoring unknown key '{}'", name, key);
                continue;
            };
            match value.as_integer() {
                Some(v) if (min..=max).contains(&v) => {}
                Some(_) => errors.push(format!("[{}] {} must be {}-{}", name, key, min, max)),
                None => errors.push(format!("[{}] {} must be an integer", name, key)),
            }
        }
    }

    errors
}
