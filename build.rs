fn main() {
    let ver = env!("CARGO_PKG_VERSION");
    let rev = std::process::Command::new("git")
        .args(&["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|r| r.status.success())
        .and_then(|r| String::from_utf8(r.stdout).ok());

    let version = match rev {
        Some(rev) if !rev.trim().is_empty() => format!("{} ({})", ver, rev.trim()),
        _ => format!("{} (unknown)", ver),
    };

    println!("cargo:rustc-env=KEYVIEW_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
}
