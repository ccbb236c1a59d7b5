#![allow(dead_code)]

pub use log::info;

pub const DEFAULT_MAX_ITER: usize = 200;
pub const DEFAULT_TOL: f32 = 1e-5;

/// `--verbose` routes `info!` lines to stderr
pub fn setup_logging(verbose: bool) {
    if verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
}

/// cap the rayon pool; 0 keeps one thread per logical cpu
pub fn setup_threads(threads: usize) -> anyhow::Result<()> {
    let threads = if threads == 0 {
        num_cpus::get()
    } else {
        threads
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()?;
    Ok(())
}

///
/// Parse cutoff options shared by the score commands.
///
pub fn parse_cutoff(
    kind: &str,
    value: f32,
) -> anyhow::Result<xtalk_score::expression::CutoffKind> {
    use xtalk_score::expression::CutoffKind;
    match kind.to_ascii_lowercase().as_str() {
        "fixed" => Ok(CutoffKind::Fixed(value)),
        "global_quantile" => Ok(CutoffKind::GlobalQuantile(value)),
        "gene_quantile" => Ok(CutoffKind::GeneQuantile(value)),
        _ => Err(anyhow::anyhow!("unknown cutoff kind: {}", kind)),
    }
}
