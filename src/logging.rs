use std::io::Write;

use log::LevelFilter;

/// Installs the global logger with `"{timestamp} - {level} - {message}"`
/// lines. `RUST_LOG`, when set, overrides `level`.
pub fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .parse_default_env()
        .init();
}
