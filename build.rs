fn main() {
    use vergen::{BuildBuilder, Emitter};

    let mut emitter = Emitter::default();

    // Only the build timestamp is surfaced (in `blogsearch --version` long output).
    if let Ok(build) = BuildBuilder::default().build_timestamp(true).build() {
        let _ = emitter.add_instructions(&build);
    }

    if let Err(e) = emitter.emit() {
        eprintln!("vergen emit skipped: {e}");
    }
}
