mod helpers;
mod log;
mod summary;
mod transfer;
mod trends;
mod weight;

use mealtrack_core::db::Database;
use mealtrack_core::service::TrackerService;

/// The CLI always works against the on-disk store.
pub(crate) type Tracker = TrackerService<Database>;

pub(crate) use log::{cmd_log, cmd_suggest};
pub(crate) use summary::{cmd_history, cmd_summary};
pub(crate) use transfer::{cmd_export, cmd_import};
pub(crate) use trends::{cmd_popular, cmd_trends};
pub(crate) use weight::{cmd_weight_history, cmd_weight_log, cmd_weight_recent, cmd_weight_show};
