use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use contracts::dashboards::d413_finance::{
    CostAnalysis, FinanceBreakdownDay, FinanceCategory, FinanceReport, FinanceSummary,
    LedgerCostAnalysis, OperationStat,
};
use contracts::domain::a010_ozon_fbs_posting::aggregate::PostingRow;
use contracts::domain::a014_ozon_transactions::aggregate::{
    FinanceBucket, TransactionCategory, TransactionItemRow, TransactionRow,
};
use contracts::shared::numeric::{apply_tax, percentage};
use contracts::shared::time::{civil_date, format_date, CivilZone, DateRange};

use crate::domain::a025_product_cost::service::CostIndex;

/// Разносит одну операцию журнала по статьям.
///
/// Доставка покупателю несёт в одной строке выручку, комиссию и логистику:
/// `amount = accruals + sale_commission + логистика`. Расходные статьи
/// копятся положительными числами.
fn accumulate(summary: &mut FinanceSummary, row: &TransactionRow) {
    let amount = row.amount.value();
    match row.category() {
        TransactionCategory::SalesDeliveryCommission => {
            let accruals = row.accruals_for_sale.value();
            let commission = row.sale_commission.value();
            summary.sales += accruals;
            summary.commissions += -commission;
            summary.delivery += -(amount - accruals - commission);
        }
        TransactionCategory::Acquiring | TransactionCategory::AgentServices => {
            summary.services += -amount;
        }
        TransactionCategory::Advertising => summary.ads += -amount,
        TransactionCategory::Returns => summary.returns += -amount,
        TransactionCategory::Other => {
            if amount > 0.0 {
                summary.other_income += amount;
            } else {
                summary.other_expenses += -amount;
            }
        }
    }
}

/// Отрицательный расход (сторно, компенсация) переносится в прочие доходы,
/// отрицательные продажи в прочие расходы. Чистая прибыль не меняется.
fn normalize(summary: &mut FinanceSummary) {
    if summary.sales < 0.0 {
        summary.other_expenses += -summary.sales;
        summary.sales = 0.0;
    }
    for bucket in [
        &mut summary.commissions,
        &mut summary.delivery,
        &mut summary.returns,
        &mut summary.ads,
        &mut summary.services,
    ] {
        if *bucket < 0.0 {
            summary.other_income += -*bucket;
            *bucket = 0.0;
        }
    }
}

fn finish(summary: &mut FinanceSummary, tax_rate: f64) {
    summary.total_income = summary.sales + summary.other_income;
    summary.total_expenses = summary.commissions
        + summary.delivery
        + summary.returns
        + summary.ads
        + summary.services
        + summary.other_expenses;
    summary.net_profit = summary.total_income - summary.total_expenses;
    summary.net_profit_after_tax = apply_tax(summary.net_profit, tax_rate);
}

/// Финансовая сводка по методу начисления
pub fn finance_summary<'a, I>(rows: I, tax_rate: f64) -> FinanceSummary
where
    I: IntoIterator<Item = &'a TransactionRow>,
{
    let mut summary = FinanceSummary::default();
    for row in rows {
        accumulate(&mut summary, row);
        summary.operations += 1;
    }
    normalize(&mut summary);
    finish(&mut summary, tax_rate);
    summary
}

/// Статьи с положительной суммой, доля от (доходы + расходы), по убыванию
pub fn categories(summary: &FinanceSummary) -> Vec<FinanceCategory> {
    let total = summary.total_income + summary.total_expenses;
    let mut categories: Vec<FinanceCategory> = FinanceBucket::ALL
        .into_iter()
        .filter_map(|bucket| {
            let amount = summary.bucket(bucket);
            (amount > 0.0).then(|| FinanceCategory {
                key: bucket,
                category: bucket.label().to_string(),
                amount,
                percentage: percentage(amount, total),
                color: bucket.color().to_string(),
            })
        })
        .collect();
    categories.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    categories
}

pub fn finance_report(rows: &[TransactionRow], tax_rate: f64) -> FinanceReport {
    let summary = finance_summary(rows, tax_rate);
    FinanceReport {
        categories: categories(&summary),
        summary,
    }
}

/// Статьи по дням периода. Дни без операций присутствуют с нулями,
/// операции без даты или вне периода не учитываются.
pub fn daily_breakdown(
    rows: &[TransactionRow],
    range: &DateRange,
    zone: &CivilZone,
    tax_rate: f64,
) -> Vec<FinanceBreakdownDay> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&TransactionRow>> = BTreeMap::new();
    let mut day = range.from;
    while day <= range.to {
        by_day.insert(day, Vec::new());
        day = day.succ_opt().unwrap_or(range.to + chrono::Duration::days(1));
    }

    for row in rows {
        let Some(date) = row.operation_date.as_deref().and_then(|d| civil_date(zone, d)) else {
            continue;
        };
        if let Some(bucket) = by_day.get_mut(&date) {
            bucket.push(row);
        }
    }

    by_day
        .into_iter()
        .map(|(date, rows)| {
            let summary = finance_summary(rows, tax_rate);
            FinanceBreakdownDay {
                date: format_date(date),
                sales: summary.sales,
                commissions: summary.commissions,
                delivery: summary.delivery,
                returns: summary.returns,
                ads: summary.ads,
                services: summary.services,
                other: summary.other_income - summary.other_expenses,
                net_profit: summary.net_profit,
                operations: summary.operations,
            }
        })
        .collect()
}

/// Себестоимость проданных позиций отправлений.
///
/// Выручка: сумма payout. Себестоимость: цена из справочника по
/// (sku, offer_id) × количество; позиция без цены учитывается с нулём.
pub fn cost_analysis(rows: &[PostingRow], costs: &CostIndex, tax_rate: f64) -> CostAnalysis {
    let mut analysis = CostAnalysis::default();
    for row in rows {
        analysis.total_revenue += row.payout.value();
        let unit_cost = match (row.sku, row.offer_id.as_deref()) {
            (Some(sku), Some(offer_id)) => costs.cost_for(sku, offer_id),
            _ => None,
        };
        match unit_cost {
            Some(cost) => analysis.total_cost_price += cost * row.quantity.value(),
            None => analysis.items_without_cost += 1,
        }
    }
    analysis.net_profit_after_costs = analysis.total_revenue - analysis.total_cost_price;
    analysis.net_profit_after_costs_and_tax =
        apply_tax(analysis.net_profit_after_costs, tax_rate);
    analysis
}

/// Ключ операции для однократного учёта выручки
#[derive(Debug, PartialEq, Eq, Hash)]
enum TransactionKey {
    Id(i64),
    Posting(String, String),
}

/// Себестоимость по журналу: позиции операций доставки покупателю.
///
/// Выручка операции учитывается один раз, сколько бы позиций у неё ни было;
/// операции без положительного начисления пропускаются. Каждая позиция
/// считается одной единицей товара, цена ищется по SKU.
pub fn ledger_cost_analysis(
    items: &[TransactionItemRow],
    costs: &CostIndex,
    tax_rate: f64,
) -> LedgerCostAnalysis {
    let mut analysis = LedgerCostAnalysis::default();
    let mut counted: HashSet<TransactionKey> = HashSet::new();

    for item in items {
        let Some(tx) = &item.finance_transactions else {
            continue;
        };
        let accruals = tx.accruals_for_sale.value();
        if accruals <= 0.0 {
            continue;
        }

        let key = match tx.id {
            Some(id) => TransactionKey::Id(id),
            None => TransactionKey::Posting(
                tx.posting_number.clone().unwrap_or_default(),
                tx.operation_date.clone().unwrap_or_default(),
            ),
        };
        if counted.insert(key) {
            analysis.total_revenue += accruals;
        }

        match item.sku.and_then(|sku| costs.cost_for_sku(sku)) {
            Some(cost) => {
                analysis.total_cost_price += cost;
                analysis.items_with_costs += 1;
            }
            None => analysis.items_without_cost += 1,
        }
    }

    analysis.net_profit_after_costs = analysis.total_revenue - analysis.total_cost_price;
    analysis.net_profit_after_costs_and_tax =
        apply_tax(analysis.net_profit_after_costs, tax_rate);
    analysis
}

/// Обороты по типам операций, по убыванию суммы модулей
pub fn operation_stats(rows: &[TransactionRow]) -> Vec<OperationStat> {
    let mut stats: HashMap<String, OperationStat> = HashMap::new();
    for row in rows {
        let operation_type = row.operation_type().to_string();
        let stat = stats
            .entry(operation_type.clone())
            .or_insert_with(|| OperationStat {
                category: row.category(),
                operation_type,
                operation_type_name: String::new(),
                count: 0,
                total_amount: 0.0,
            });
        if stat.operation_type_name.is_empty() {
            if let Some(name) = row.operation_type_name.as_deref() {
                stat.operation_type_name = name.to_string();
            }
        }
        stat.count += 1;
        stat.total_amount += row.amount.value().abs();
    }

    let mut stats: Vec<OperationStat> = stats.into_values().collect();
    stats.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then_with(|| a.operation_type.cmp(&b.operation_type))
    });
    stats
}
