//! Bounds and exact values for the minimum length synchronizing word (MLSW)
//! of a deterministic finite automaton (spec.md §1).
//!
//! Five independent algorithms (`algorithms::beam`, `::eppstein`, `::brute`,
//! `::reduce`, `::exact`) each tighten the `[lower, upper]` MLSW bracket;
//! `algorithms::run_pipeline` runs the subset the caller asks for and
//! reconciles the bounds (spec.md §4.J).

pub mod algorithms;
pub mod automaton;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod graph;
pub mod memory;
pub mod pairs_tree;
pub mod subset;
pub mod transition;
pub mod trie_implicit;
pub mod trie_packed;

/// Initialize structured logging: a colored terminal logger at `Info` and a
/// timestamped file logger at `Debug` under `logs/` (mirrors the teacher's
/// `init()` in `src/lib.rs`, minus the ctrl-c exit hook and the database
/// connection, which don't apply here).
#[cfg(feature = "logging")]
pub fn init_logging() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{time}.log")).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
