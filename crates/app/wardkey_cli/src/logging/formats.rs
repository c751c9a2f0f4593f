use flexi_logger::{DeferredNow, style};
use log::{Level, Record};

/// `LEVEL message`, colored by level. Debug and trace lines carry the module path.
pub fn cli_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    write!(w, "{} ", style(level).paint(format!("{level:<5}")))?;
    if level >= Level::Debug {
        write!(w, "[{}] ", record.module_path().unwrap_or("<unnamed>"))?;
    }
    write!(w, "{}", record.args())
}
