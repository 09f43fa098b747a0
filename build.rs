//! Generates `config.rs` (the `LINE` cache-line-size constant) from an
//! optional `rtalloc.toml` at the crate root, with env-var and
//! target-width fallbacks.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Default)]
struct ConfigSection {
    line_size: Option<usize>,
}

#[derive(Deserialize, Default)]
struct Config {
    #[serde(default)]
    config: ConfigSection,
}

fn default_line_size() -> usize {
    // 32-bit ARM targets historically use a 32-byte cache line; everything
    // else in practice (x86-64, AArch64, RISC-V) uses 64.
    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let pointer_width = env::var("CARGO_CFG_TARGET_POINTER_WIDTH").unwrap_or_default();
    if arch == "arm" && pointer_width == "32" {
        32
    } else {
        64
    }
}

fn main() {
    println!("cargo:rerun-if-changed=rtalloc.toml");
    println!("cargo:rerun-if-env-changed=RTALLOC_LINE_SIZE");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let config_path = Path::new(&manifest_dir).join("rtalloc.toml");

    let file_config: Config = fs::read_to_string(&config_path)
        .ok()
        .and_then(|text| toml::from_str(&text).ok())
        .unwrap_or_default();

    let line = env::var("RTALLOC_LINE_SIZE")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .or(file_config.config.line_size)
        .unwrap_or_else(default_line_size);

    assert!(
        line.is_power_of_two() && line > 0,
        "rtalloc: LINE (cache line size) must be a nonzero power of two, got {line}"
    );

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest = Path::new(&out_dir).join("config.rs");
    fs::write(
        &dest,
        format!(
            "/// Cache-line size in bytes. All user-visible allocations are \
             aligned to this value. Generated by build.rs from rtalloc.toml \
             / RTALLOC_LINE_SIZE / the target's pointer width.\n\
             pub const LINE: usize = {line};\n"
        ),
    )
    .expect("failed to write generated config.rs");
}
