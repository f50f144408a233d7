use serde::{Deserialize, Serialize};

use crate::shared::numeric::{de_opt_i64, Numeric};

/// Таблица финансовых операций
pub const TABLE: &str = "finance_transactions";
/// Позиции (товары) финансовых операций
pub const ITEMS_TABLE: &str = "finance_transaction_items";

/// Операция доставки покупателю: продажа, комиссия и логистика в одной строке
pub const DELIVERED_TO_CUSTOMER: &str = "OperationAgentDeliveredToCustomer";

/// Строка финансовой операции
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub transaction_id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub operation_id: Option<i64>,
    #[serde(default)]
    pub operation_date: Option<String>,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub operation_type_name: Option<String>,
    #[serde(default)]
    pub posting_number: Option<String>,
    #[serde(default)]
    pub accruals_for_sale: Numeric,
    #[serde(default)]
    pub sale_commission: Numeric,
    #[serde(default)]
    pub amount: Numeric,
    #[serde(default)]
    pub delivery_charge: Numeric,
    #[serde(default)]
    pub return_delivery_charge: Numeric,
}

impl TransactionRow {
    pub fn operation_type(&self) -> &str {
        self.operation_type.as_deref().unwrap_or("")
    }

    pub fn category(&self) -> TransactionCategory {
        TransactionCategory::categorize(self.operation_type())
    }

    /// Идентификатор для отображения: transaction_id, затем id
    pub fn display_id(&self) -> i64 {
        self.transaction_id.or(self.id).unwrap_or(0)
    }
}

/// Операция, встроенная в позицию (`finance_transactions!inner(...)`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedTransaction {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub id: Option<i64>,
    #[serde(default)]
    pub operation_date: Option<String>,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub operation_type_name: Option<String>,
    #[serde(default)]
    pub accruals_for_sale: Numeric,
    #[serde(default)]
    pub amount: Numeric,
    #[serde(default)]
    pub posting_number: Option<String>,
}

/// Позиция финансовой операции с самой операцией
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionItemRow {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub sku: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub finance_transactions: Option<EmbeddedTransaction>,
}

/// Выборка позиций вместе с операцией (inner join средствами хранилища)
pub const ITEMS_WITH_TRANSACTION_SELECT: &str = "sku,name,finance_transactions!inner(id,operation_date,operation_type,operation_type_name,accruals_for_sale,amount,posting_number)";

/// Категория финансовой операции по её типу
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    /// Продажа, комиссия и доставка одной строкой
    SalesDeliveryCommission,
    Acquiring,
    Advertising,
    Returns,
    AgentServices,
    Other,
}

/// Условие на тип операции
#[derive(Debug, Clone, Copy)]
enum Matcher {
    Exact(&'static str),
    OneOf(&'static [&'static str]),
    Prefix(&'static str),
}

impl Matcher {
    fn matches(&self, operation_type: &str) -> bool {
        match self {
            Matcher::Exact(expected) => operation_type == *expected,
            Matcher::OneOf(list) => list.iter().any(|candidate| *candidate == operation_type),
            Matcher::Prefix(prefix) => operation_type.starts_with(prefix),
        }
    }
}

/// Правила категоризации. Порядок значим: срабатывает первое совпадение.
const RULES: &[(Matcher, TransactionCategory)] = &[
    (
        Matcher::Exact(DELIVERED_TO_CUSTOMER),
        TransactionCategory::SalesDeliveryCommission,
    ),
    (
        Matcher::Exact("MarketplaceRedistributionOfAcquiringOperation"),
        TransactionCategory::Acquiring,
    ),
    (
        Matcher::OneOf(&[
            "OperationMarketplaceMarketingActionCost",
            "OperationPromotionWithCostPerOrder",
            "OperationElectronicServiceStencil",
            "OperationGettingToTheTop",
        ]),
        TransactionCategory::Advertising,
    ),
    (
        Matcher::OneOf(&[
            "ClientReturnAgentOperation",
            "OperationItemReturn",
            "OperationReturnGoodsFBSofRMS",
        ]),
        TransactionCategory::Returns,
    ),
    (
        Matcher::Prefix("OperationAgent"),
        TransactionCategory::AgentServices,
    ),
    (
        Matcher::Exact("OperationMarketplaceServiceItemFBSDelivery"),
        TransactionCategory::AgentServices,
    ),
];

impl TransactionCategory {
    /// Категория по типу операции; неизвестные типы попадают в `Other`
    pub fn categorize(operation_type: &str) -> Self {
        let operation_type = operation_type.trim();
        RULES
            .iter()
            .find(|(matcher, _)| matcher.matches(operation_type))
            .map(|(_, category)| *category)
            .unwrap_or(TransactionCategory::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionCategory::SalesDeliveryCommission => "продажи/доставка/комиссия",
            TransactionCategory::Acquiring => "эквайринг",
            TransactionCategory::Advertising => "реклама",
            TransactionCategory::Returns => "возвраты",
            TransactionCategory::AgentServices => "агентские",
            TransactionCategory::Other => "прочее",
        }
    }

    /// Короткая подпись для бейджа в таблице
    pub fn badge(&self) -> &'static str {
        match self {
            TransactionCategory::SalesDeliveryCommission => "Продажи",
            TransactionCategory::Acquiring => "Эквайринг",
            TransactionCategory::Advertising => "Реклама",
            TransactionCategory::Returns => "Возвраты",
            TransactionCategory::AgentServices => "Агентские",
            TransactionCategory::Other => "Прочее",
        }
    }
}

/// Статья финансовой сводки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinanceBucket {
    Sales,
    Commissions,
    Delivery,
    Returns,
    Ads,
    Services,
}

impl FinanceBucket {
    pub const ALL: [FinanceBucket; 6] = [
        FinanceBucket::Sales,
        FinanceBucket::Commissions,
        FinanceBucket::Delivery,
        FinanceBucket::Returns,
        FinanceBucket::Ads,
        FinanceBucket::Services,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FinanceBucket::Sales => "Продажи",
            FinanceBucket::Commissions => "Комиссии",
            FinanceBucket::Delivery => "Доставка",
            FinanceBucket::Returns => "Возвраты",
            FinanceBucket::Ads => "Реклама",
            FinanceBucket::Services => "Услуги",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            FinanceBucket::Sales => "#10b981",
            FinanceBucket::Commissions => "#ef4444",
            FinanceBucket::Delivery => "#f59e0b",
            FinanceBucket::Returns => "#8b5cf6",
            FinanceBucket::Ads => "#06b6d4",
            FinanceBucket::Services => "#84cc16",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_categorize_known_types() {
        use TransactionCategory::*;
        let cases = [
            ("OperationAgentDeliveredToCustomer", SalesDeliveryCommission),
            ("MarketplaceRedistributionOfAcquiringOperation", Acquiring),
            ("OperationMarketplaceMarketingActionCost", Advertising),
            ("OperationPromotionWithCostPerOrder", Advertising),
            ("OperationElectronicServiceStencil", Advertising),
            ("OperationGettingToTheTop", Advertising),
            ("ClientReturnAgentOperation", Returns),
            ("OperationItemReturn", Returns),
            ("OperationReturnGoodsFBSofRMS", Returns),
            ("OperationAgentStornoDeliveredToCustomer", AgentServices),
            ("OperationMarketplaceServiceItemFBSDelivery", AgentServices),
            ("MarketplaceServiceStorage", Other),
            ("", Other),
        ];
        for (operation_type, expected) in cases {
            assert_eq!(
                TransactionCategory::categorize(operation_type),
                expected,
                "{}",
                operation_type
            );
        }
    }

    #[test]
    fn test_exact_match_wins_over_prefix() {
        // совпадает и с точным правилом, и с префиксом OperationAgent
        assert_eq!(
            TransactionCategory::categorize(DELIVERED_TO_CUSTOMER),
            TransactionCategory::SalesDeliveryCommission
        );
    }

    #[test]
    fn test_categorization_is_deterministic() {
        let types = [
            "OperationAgentX",
            "OperationItemReturn",
            "Unknown",
            "OperationGettingToTheTop",
        ];
        let first: Vec<_> = types.iter().map(|t| TransactionCategory::categorize(t)).collect();
        for _ in 0..3 {
            let again: Vec<_> = types.iter().map(|t| TransactionCategory::categorize(t)).collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_item_row_with_embedded_transaction() {
        let row: TransactionItemRow = serde_json::from_value(json!({
            "sku": 1001,
            "name": "Крем",
            "finance_transactions": {
                "operation_type": "OperationAgentDeliveredToCustomer",
                "accruals_for_sale": "1500",
                "amount": 1200,
                "posting_number": "0001-1"
            }
        }))
        .unwrap();
        let tx = row.finance_transactions.unwrap();
        assert_eq!(tx.accruals_for_sale.value(), 1500.0);
        assert_eq!(row.sku, Some(1001));
    }

    #[test]
    fn test_display_id_prefers_transaction_id() {
        let row: TransactionRow =
            serde_json::from_value(json!({"id": 5, "transaction_id": 77})).unwrap();
        assert_eq!(row.display_id(), 77);
        let row: TransactionRow = serde_json::from_value(json!({"id": 5})).unwrap();
        assert_eq!(row.display_id(), 5);
    }
}
