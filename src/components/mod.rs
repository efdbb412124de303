//! Built-in pipeline components.
//!
//! | Name                    | Role     |
//! |-------------------------|----------|
//! | `SimpleParser`          | parser   |
//! | `NilNotifier`           | notifier |
//! | `SMTPNotifier`          | notifier |
//! | `SimpleFileSystemSaver` | saver    |
//! | `DatabaseSaver`         | saver    |

pub mod database;
pub mod filesystem;
pub mod notifier;
pub mod parser;

pub use database::DatabaseSaver;
pub use filesystem::{render_file_name, SimpleFileSystemSaver};
pub use notifier::{NilNotifier, SmtpNotifier};
pub use parser::SimpleParser;
