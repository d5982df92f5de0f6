pub mod balance;
pub mod earn_record;
pub mod operation;
pub mod receipt;

pub use balance::{BalanceRow, PayerBalance};
pub use earn_record::{EarnRecord, RecordMutation};
pub use operation::{OperationType, PointsOperation};
pub use receipt::DeductionReceiptLine;
