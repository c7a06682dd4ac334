pub mod email;
pub mod spreadsheet;

pub use email::{BodyKind, OutboundEmail};
pub use spreadsheet::{SheetTable, SpreadsheetRef, ToSheetRows};
