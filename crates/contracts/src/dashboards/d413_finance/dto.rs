use serde::{Deserialize, Serialize};

use crate::domain::a014_ozon_transactions::aggregate::{FinanceBucket, TransactionCategory};
use crate::shared::filters::ReportFilters;
use crate::shared::outcome::ReportOutcome;

/// Финансовая сводка за период (метод начисления по журналу операций).
///
/// Все статьи расходов хранятся положительными числами.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub sales: f64,
    pub commissions: f64,
    pub delivery: f64,
    pub returns: f64,
    pub ads: f64,
    /// Эквайринг и агентские услуги
    pub services: f64,
    pub other_income: f64,
    pub other_expenses: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub net_profit_after_tax: f64,
    /// Количество учтённых операций
    pub operations: usize,
}

impl FinanceSummary {
    pub fn bucket(&self, bucket: FinanceBucket) -> f64 {
        match bucket {
            FinanceBucket::Sales => self.sales,
            FinanceBucket::Commissions => self.commissions,
            FinanceBucket::Delivery => self.delivery,
            FinanceBucket::Returns => self.returns,
            FinanceBucket::Ads => self.ads,
            FinanceBucket::Services => self.services,
        }
    }
}

/// Статья для круговой диаграммы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceCategory {
    pub key: FinanceBucket,
    pub category: String,
    pub amount: f64,
    /// Доля от (доходы + расходы), целое число процентов
    pub percentage: i64,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceReport {
    pub summary: FinanceSummary,
    pub categories: Vec<FinanceCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceReportResponse {
    pub filters: ReportFilters,
    pub report: ReportOutcome<FinanceReport>,
}

/// Статьи за один день периода
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceBreakdownDay {
    pub date: String,
    pub sales: f64,
    pub commissions: f64,
    pub delivery: f64,
    pub returns: f64,
    pub ads: f64,
    pub services: f64,
    pub other: f64,
    pub net_profit: f64,
    pub operations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceBreakdownResponse {
    pub filters: ReportFilters,
    pub days: ReportOutcome<Vec<FinanceBreakdownDay>>,
}

/// Себестоимость проданных товаров по отправлениям
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub total_revenue: f64,
    pub total_cost_price: f64,
    pub net_profit_after_costs: f64,
    pub net_profit_after_costs_and_tax: f64,
    /// Позиции без введённой себестоимости (учтены с нулём)
    pub items_without_cost: usize,
}

/// Себестоимость по журналу финансовых операций
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerCostAnalysis {
    pub total_revenue: f64,
    pub total_cost_price: f64,
    pub net_profit_after_costs: f64,
    pub net_profit_after_costs_and_tax: f64,
    pub items_with_costs: usize,
    pub items_without_cost: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAnalysisResponse {
    pub filters: ReportFilters,
    pub analysis: ReportOutcome<CostAnalysis>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerCostAnalysisResponse {
    pub filters: ReportFilters,
    pub analysis: ReportOutcome<LedgerCostAnalysis>,
}

/// Диагностика: обороты по типам операций
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStat {
    pub operation_type: String,
    pub operation_type_name: String,
    pub category: TransactionCategory,
    pub count: usize,
    /// Сумма модулей amount
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationStatsResponse {
    pub filters: ReportFilters,
    pub operations: ReportOutcome<Vec<OperationStat>>,
}
