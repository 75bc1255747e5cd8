//! Document paths, grouped by month:
//!
//! ```text
//! receipts/2024-03/2024-03-15_order-3481.txt
//! closings/2024-03/closing_2024-03-15.txt
//! ```

use chrono::NaiveDate;

/// Path of the archived customer receipt. `date` is the local order date.
pub fn receipt_path(order_number: u64, date: NaiveDate) -> String {
    format!(
        "receipts/{}/{}_order-{}.txt",
        date.format("%Y-%m"),
        date.format("%Y-%m-%d"),
        order_number
    )
}

pub fn closing_path(date: NaiveDate) -> String {
    format!(
        "closings/{}/closing_{}.txt",
        date.format("%Y-%m"),
        date.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(receipt_path(3481, date), "receipts/2024-03/2024-03-05_order-3481.txt");
        assert_eq!(closing_path(date), "closings/2024-03/closing_2024-03-05.txt");
    }
}
