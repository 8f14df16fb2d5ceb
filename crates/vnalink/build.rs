// Build facts reported by `vnalink version --extended`.
fn main() {
    for (from, to) in [
        ("TARGET", "VNALINK_BUILD_TARGET"),
        ("PROFILE", "VNALINK_BUILD_PROFILE"),
    ] {
        if let Ok(value) = std::env::var(from) {
            println!("cargo:rustc-env={to}={value}");
        }
        println!("cargo:rerun-if-env-changed={from}");
    }
}
