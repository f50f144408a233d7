use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::numeric::{de_opt_i64, Numeric};

/// Таблица себестоимости товаров
pub const TABLE: &str = "product_costs";

/// Ключ уникальности записи себестоимости
pub const CONFLICT_KEY: &str = "sku,offer_id";

/// Запись себестоимости в хранилище
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCostRow {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub sku: Option<i64>,
    #[serde(default)]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    /// `null`: себестоимость не введена
    #[serde(default)]
    pub cost_price: Option<Numeric>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ProductCostRow {
    pub fn cost(&self) -> Option<f64> {
        self.cost_price.map(Numeric::value)
    }
}

/// Ошибка ввода себестоимости
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostPriceError {
    #[error("Введите себестоимость")]
    Empty,
    #[error("Себестоимость должна быть числом: {0}")]
    NotANumber(String),
    #[error("Себестоимость не может быть отрицательной")]
    Negative,
    #[error("Некорректный товар: {0}")]
    InvalidProduct(&'static str),
}

/// Проверка введённой себестоимости. Допускается запятая как разделитель.
pub fn parse_cost_price(raw: &str) -> Result<f64, CostPriceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CostPriceError::Empty);
    }
    let normalized: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let value = normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CostPriceError::NotANumber(trimmed.to_string()))?;
    if value < 0.0 {
        return Err(CostPriceError::Negative);
    }
    Ok(value)
}

/// Форма создания/обновления себестоимости (как ввёл пользователь)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCostForm {
    pub sku: i64,
    pub offer_id: String,
    #[serde(default)]
    pub product_name: String,
    /// Строка из поля ввода; проверяется до записи
    pub cost_price: String,
}

/// Проверенные данные для upsert по (sku, offer_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCostInput {
    pub sku: i64,
    pub offer_id: String,
    pub product_name: String,
    pub cost_price: f64,
}

impl ProductCostForm {
    pub fn validate(&self) -> Result<ProductCostInput, CostPriceError> {
        if self.sku <= 0 {
            return Err(CostPriceError::InvalidProduct("sku"));
        }
        if self.offer_id.trim().is_empty() {
            return Err(CostPriceError::InvalidProduct("offer_id"));
        }
        let cost_price = parse_cost_price(&self.cost_price)?;
        Ok(ProductCostInput {
            sku: self.sku,
            offer_id: self.offer_id.trim().to_string(),
            product_name: self.product_name.trim().to_string(),
            cost_price,
        })
    }
}

/// Изменение себестоимости существующей записи
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCostUpdateForm {
    pub cost_price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCostPatch {
    pub cost_price: f64,
}

impl ProductCostUpdateForm {
    pub fn validate(&self) -> Result<ProductCostPatch, CostPriceError> {
        Ok(ProductCostPatch {
            cost_price: parse_cost_price(&self.cost_price)?,
        })
    }
}

/// Строка справочника: товар из каталога и его себестоимость (если введена)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCostView {
    /// `None`, пока себестоимость не сохранялась
    pub id: Option<i64>,
    pub sku: i64,
    pub offer_id: String,
    pub product_name: String,
    /// Цена за единицу из последнего отправления
    pub unit_price: f64,
    pub cost_price: Option<f64>,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
}

impl ProductCostView {
    /// Доля себестоимости в цене, %
    pub fn cost_share(&self) -> Option<f64> {
        match self.cost_price {
            Some(cost) if self.unit_price > 0.0 => Some(cost / self.unit_price * 100.0),
            _ => None,
        }
    }
}

/// Сводка по справочнику себестоимости
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCostStats {
    pub total_products: usize,
    pub products_with_costs: usize,
    pub products_without_costs: usize,
    pub average_cost_price: f64,
    pub total_cost_value: f64,
}

impl ProductCostStats {
    pub fn from_views(views: &[ProductCostView]) -> Self {
        let with_costs: Vec<f64> = views.iter().filter_map(|v| v.cost_price).collect();
        let total_cost_value: f64 = with_costs.iter().sum();
        let average_cost_price = if with_costs.is_empty() {
            0.0
        } else {
            total_cost_value / with_costs.len() as f64
        };
        Self {
            total_products: views.len(),
            products_with_costs: with_costs.len(),
            products_without_costs: views.len() - with_costs.len(),
            average_cost_price,
            total_cost_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cost_price() {
        assert_eq!(parse_cost_price("150"), Ok(150.0));
        assert_eq!(parse_cost_price(" 12,5 "), Ok(12.5));
        assert_eq!(parse_cost_price("1 200,50"), Ok(1200.5));
        assert_eq!(parse_cost_price("0"), Ok(0.0));
        assert_eq!(parse_cost_price(""), Err(CostPriceError::Empty));
        assert_eq!(parse_cost_price("-1"), Err(CostPriceError::Negative));
        assert_eq!(
            parse_cost_price("abc"),
            Err(CostPriceError::NotANumber("abc".into()))
        );
        assert!(matches!(parse_cost_price("NaN"), Err(CostPriceError::NotANumber(_))));
    }

    #[test]
    fn test_form_validation_rejects_before_mutation() {
        let form = ProductCostForm {
            sku: 100,
            offer_id: "ART-1".into(),
            product_name: "Крем".into(),
            cost_price: "-5".into(),
        };
        assert_eq!(form.validate(), Err(CostPriceError::Negative));

        let form = ProductCostForm {
            cost_price: "99.9".into(),
            ..form
        };
        let input = form.validate().unwrap();
        assert_eq!(input.cost_price, 99.9);
        assert_eq!(input.offer_id, "ART-1");

        let missing_offer = ProductCostForm {
            offer_id: " ".into(),
            ..form
        };
        assert_eq!(
            missing_offer.validate(),
            Err(CostPriceError::InvalidProduct("offer_id"))
        );
    }

    fn view(cost: Option<f64>) -> ProductCostView {
        ProductCostView {
            id: cost.map(|_| 1),
            sku: 1,
            offer_id: "A".into(),
            product_name: "Товар".into(),
            unit_price: 200.0,
            cost_price: cost,
            updated_at: None,
            created_at: None,
        }
    }

    #[test]
    fn test_stats() {
        let views = vec![view(Some(100.0)), view(None), view(Some(50.0))];
        let stats = ProductCostStats::from_views(&views);
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.products_with_costs, 2);
        assert_eq!(stats.products_without_costs, 1);
        assert_eq!(stats.total_cost_value, 150.0);
        assert_eq!(stats.average_cost_price, 75.0);

        assert_eq!(ProductCostStats::from_views(&[]), ProductCostStats::default());
        assert_eq!(view(Some(50.0)).cost_share(), Some(25.0));
        assert_eq!(view(None).cost_share(), None);
    }
}
