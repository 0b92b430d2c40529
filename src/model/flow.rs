use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The label written to the sheet for `Flow::Expense`.
pub const EXPENSE_LABEL: &str = "支出";

/// The label written to the sheet for `Flow::Income`.
pub const INCOME_LABEL: &str = "收入";

/// The catch-all category offered for both flows.
pub const OTHER_CATEGORY: &str = "其他";

const EXPENSE_CATEGORIES: &[&str] = &[
    "餐飲",
    "交通",
    "購物",
    "娛樂",
    "房租",
    "醫療",
    "美容",
    "寵物",
    "社交",
    OTHER_CATEGORY,
];

const INCOME_CATEGORIES: &[&str] = &["薪資", "獎金", "投資", "兼職", OTHER_CATEGORY];

/// The direction of a transaction: money going out or coming in.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Expense,
    Income,
}

impl Flow {
    /// The fixed label that represents this flow in the sheet.
    pub fn label(&self) -> &'static str {
        match self {
            Flow::Expense => EXPENSE_LABEL,
            Flow::Income => INCOME_LABEL,
        }
    }

    /// Parses a label found in the sheet. Besides the fixed labels, the English names are
    /// accepted in any case.
    pub fn from_label(label: &str) -> Option<Flow> {
        let label = label.trim();
        if label == EXPENSE_LABEL || label.eq_ignore_ascii_case("expense") {
            Some(Flow::Expense)
        } else if label == INCOME_LABEL || label.eq_ignore_ascii_case("income") {
            Some(Flow::Income)
        } else {
            None
        }
    }

    /// The built-in categories offered when recording a transaction of this flow.
    pub fn suggested_categories(&self) -> &'static [&'static str] {
        match self {
            Flow::Expense => EXPENSE_CATEGORIES,
            Flow::Income => INCOME_CATEGORIES,
        }
    }
}

impl Display for Flow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
