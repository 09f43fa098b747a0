//! Build-generated configuration. See `build.rs`.

include!(concat!(env!("OUT_DIR"), "/config.rs"));
