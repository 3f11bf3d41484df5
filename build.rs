use vergen::{BuildBuilder, Emitter};
use vergen_git2::Git2Builder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_date(true).build()?;
    let mut emitter = Emitter::default();
    emitter.add_instructions(&build)?;

    // Source tarballs have no repository; `--version` then reports "unknown".
    match Git2Builder::default().sha(true).build() {
        Ok(git2) if std::path::Path::new(".git").exists() => {
            emitter.add_instructions(&git2)?;
        }
        _ => println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown"),
    }

    emitter.emit()?;
    Ok(())
}
