use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

/// Build number: `SOURCE_DATE_EPOCH` when set, so reproducible builds stay
/// stable, otherwise the current time in milliseconds.
fn build_number() -> String {
    if let Ok(epoch) = env::var("SOURCE_DATE_EPOCH") {
        if !epoch.trim().is_empty() {
            return epoch.trim().to_string();
        }
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=TOEHOLD_BUILD_N={}", build_number());
    println!("cargo:rustc-env=TOEHOLD_DISPLAY_VERSION={version}");
    println!("cargo:rustc-env=TOEHOLD_BUILD_TARGET={target}");
}
