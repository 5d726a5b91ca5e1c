use std::env;
use std::sync::LazyLock;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
}

impl Level {
    fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "info" => Self::Info,
            _ => Self::Error,
        }
    }
}

static CHESSCOM_LOG: LazyLock<Level> = LazyLock::new(|| {
    env::var("CHESSCOM_LOG")
        .map(|s| Level::from_str(&s))
        .unwrap_or(Level::Error)
});

macro_rules! log {
    ($level:expr, $prefix:expr, $msg:expr) => {
        if *CHESSCOM_LOG >= $level {
            eprintln!(concat!("chesscom ", $prefix, ": {}"), $msg.as_ref());
        }
    };
}

pub fn error(msg: impl AsRef<str>) {
    log!(Level::Error, "ERROR", msg);
}
pub fn warn(msg: impl AsRef<str>) {
    log!(Level::Warn, "WARN", msg);
}
pub fn info(msg: impl AsRef<str>) {
    log!(Level::Info, "INFO", msg);
}

#[cfg(test)]
mod tests {
    use super::Level;

    #[test]
    fn test_level_parsing_accepts_aliases() {
        assert!(Level::from_str("WARNING") == Level::Warn);
        assert!(Level::from_str(" info ") == Level::Info);
        assert!(Level::from_str("err") == Level::Error);
    }

    #[test]
    fn test_unknown_level_falls_back_to_error() {
        assert!(Level::from_str("verbose") == Level::Error);
    }
}
