//! Layered configuration.
//!
//! Tiers, lowest to highest priority, merged field by field:
//! 1. **Defaults** - built in
//! 2. **Project** - `$CWD/task-quest/config.yaml`
//! 3. **User** - `~/.task-quest/config.yaml`
//! 4. **Explicit** - `--config <file>` or `TASK_QUEST_CONFIG_PATH`
//! 5. **Environment** - variables below
//!
//! Command-line flags are applied on top by the binary.
//!
//! ## Environment Variables
//! - `TASK_QUEST_CONFIG_PATH` - Explicit config file
//! - `TASK_QUEST_DATA_DIR` - Snapshot directory
//! - `TASK_QUEST_BACKEND` - `file` or `memory`
//! - `TASK_QUEST_FORMAT` - `text` or `json`
//! - `TASK_QUEST_USER_DIR` - User config dir (default: `~/.task-quest`)
//! - `TASK_QUEST_PROJECT_DIR` - Project config dir (default: `./task-quest`)

mod loader;
mod merge;
mod types;

pub use loader::{CONFIG_FILE, ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{merge_tier, merge_tiers};
pub use types::*;
