use crate::domain::models::MessageSeverity;
use colored::{ColoredString, Colorize};

/// Terminal styling for status messages.
pub fn paint(severity: MessageSeverity, text: &str) -> ColoredString {
    match severity {
        MessageSeverity::Info => text.normal(),
        MessageSeverity::Success => text.green(),
        MessageSeverity::Warning => text.yellow(),
        MessageSeverity::Error => text.red(),
    }
}

pub const BANNER: &str = r#"
 ____   ____ __  __    ____  ___ ____  ____  _____ ____
| __ ) / ___|\ \/ /   |  _ \|_ _|  _ \|  _ \| ____|  _ \
|  _ \| |  _  \  /    | |_) || || |_) | |_) |  _| | |_) |
| |_) | |_| | /  \    |  _ < | ||  __/|  __/| |___|  _ <
|____/ \____|/_/\_\   |_| \_\___|_|   |_|   |_____|_| \_\

BGX RIPPER
 __________________________________________
|                                          |
|    BGX220S characteristic harvester      |
|__________________________________________|
"#;
