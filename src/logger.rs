//! Logging support.
use once_cell::sync::OnceCell;

static ROOT_LOGGER: OnceCell<slog::Logger> = OnceCell::new();

/// Install the process-wide root logger.
///
/// May be called at most once, before any module logger is created; the
/// rejected logger is handed back on subsequent calls.
pub fn init_logger(root: slog::Logger) -> Result<(), slog::Logger> {
    ROOT_LOGGER.set(root)
}

/// Get a logger for the given module, a child of the root logger annotated
/// with the module name. Until [`init_logger`] is called the root logger
/// discards all records.
pub fn get_logger(module: &'static str) -> slog::Logger {
    let root = ROOT_LOGGER.get_or_init(|| slog::Logger::root(slog::Discard, slog::o!()));
    root.new(slog::o!("module" => module))
}
