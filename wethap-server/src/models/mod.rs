mod info;
mod manual_info;
mod sender;

pub use info::{Info, InfoTable, NewInfo};
pub use manual_info::{ManualInfo, ManualInfoTable};
pub use sender::{Sender, SenderTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
