/// Bundling entry point, delegating to nih_plug_xtask:
///
///   cargo xtask bundle loveless-chorus-v1 --release
///
/// The packaged CLAP and VST3 bundles land in `target/bundled/`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
