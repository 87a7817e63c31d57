// src/calc/pricing.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::margin::{self, Priced};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OtherCostType {
    #[default]
    Fixed,
    Percentage,
}

impl OtherCostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtherCostType::Fixed => "fixed",
            OtherCostType::Percentage => "percentage",
        }
    }
}

impl fmt::Display for OtherCostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtherCostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(OtherCostType::Fixed),
            "percentage" => Ok(OtherCostType::Percentage),
            other => Err(format!("unknown other cost type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineItem {
    pub quantity: i32,
    pub unit_price: f64,
}

impl LineItem {
    pub fn value(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostInputs {
    pub shipping_cost: f64,
    pub import_tax: f64,
    pub other_costs: f64,
    pub other_cost_type: OtherCostType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub base_cost: f64,
    pub shipping_cost: f64,
    pub import_tax: f64,
    pub other_costs_amount: f64,
    pub total_cost: f64,
}

impl CostBreakdown {
    /// Everything that is not the purchase price of the goods.
    pub fn extra_cost(&self) -> f64 {
        self.shipping_cost + self.import_tax + self.other_costs_amount
    }
}

pub fn base_cost(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::value).sum()
}

pub fn other_costs_amount(base_cost: f64, other_costs: f64, kind: OtherCostType) -> f64 {
    match kind {
        OtherCostType::Percentage => base_cost * (other_costs / 100.0),
        OtherCostType::Fixed => other_costs,
    }
}

pub fn calculate(items: &[LineItem], inputs: &CostInputs) -> CostBreakdown {
    let base_cost = base_cost(items);
    let other_costs_amount = other_costs_amount(base_cost, inputs.other_costs, inputs.other_cost_type);
    CostBreakdown {
        base_cost,
        shipping_cost: inputs.shipping_cost,
        import_tax: inputs.import_tax,
        other_costs_amount,
        total_cost: base_cost + inputs.shipping_cost + inputs.import_tax + other_costs_amount,
    }
}

/// One shipment line going into the allocation, with the price already stored on the product.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: i64,
    pub product_name: String,
    pub item: LineItem,
    pub listed_selling_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPricing {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub landed_unit_cost: f64,
    pub selling_price: f64,
    pub profit: f64,
    pub margin: f64,
}

impl Priced for ProductPricing {
    fn selling_price(&self) -> f64 {
        self.selling_price
    }
    fn profit(&self) -> f64 {
        self.profit
    }
}

/// Landed cost per unit of each line after spreading the extra costs over the goods.
///
/// Extra costs are shared in proportion to line value. With a zero-value shipment they fall
/// back to an even split per unit.
pub fn landed_unit_costs(items: &[LineItem], breakdown: &CostBreakdown) -> Vec<f64> {
    let units: i64 = items.iter().map(|i| i.quantity.max(0) as i64).sum();
    let extra = breakdown.extra_cost();

    items
        .iter()
        .map(|item| {
            if breakdown.base_cost > 0.0 {
                item.unit_price * (breakdown.total_cost / breakdown.base_cost)
            } else if units > 0 {
                item.unit_price + extra / units as f64
            } else {
                item.unit_price
            }
        })
        .collect()
}

pub fn allocate(lines: &[PricedLine], breakdown: &CostBreakdown, markup_percent: f64) -> Vec<ProductPricing> {
    let items: Vec<LineItem> = lines.iter().map(|l| l.item).collect();
    let landed = landed_unit_costs(&items, breakdown);

    lines
        .iter()
        .zip(landed)
        .map(|(line, landed_unit_cost)| {
            let selling_price = line
                .listed_selling_price
                .unwrap_or(landed_unit_cost * (1.0 + markup_percent / 100.0));
            let profit = selling_price - landed_unit_cost;
            ProductPricing {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.item.quantity,
                unit_price: line.item.unit_price,
                landed_unit_cost,
                selling_price,
                profit,
                margin: margin::margin(selling_price, profit),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sample_items() -> Vec<LineItem> {
        vec![
            LineItem { quantity: 2, unit_price: 10.0 },
            LineItem { quantity: 1, unit_price: 5.0 },
        ]
    }

    #[test]
    fn test_fixed_other_costs() {
        let inputs = CostInputs {
            shipping_cost: 3.0,
            import_tax: 2.0,
            other_costs: 10.0,
            other_cost_type: OtherCostType::Fixed,
        };
        let b = calculate(&sample_items(), &inputs);
        assert!(close(b.base_cost, 25.0));
        assert!(close(b.other_costs_amount, 10.0));
        assert!(close(b.total_cost, 40.0));
    }

    #[test]
    fn test_percentage_other_costs() {
        let inputs = CostInputs {
            shipping_cost: 3.0,
            import_tax: 2.0,
            other_costs: 10.0,
            other_cost_type: OtherCostType::Percentage,
        };
        let b = calculate(&sample_items(), &inputs);
        assert!(close(b.other_costs_amount, 2.5));
        assert!(close(b.total_cost, 32.5));
    }

    #[test]
    fn test_empty_items() {
        let inputs = CostInputs { shipping_cost: 5.0, ..Default::default() };
        let b = calculate(&[], &inputs);
        assert_eq!(b.base_cost, 0.0);
        assert!(close(b.total_cost, 5.0));

        let pct = CostInputs {
            shipping_cost: 5.0,
            other_costs: 50.0,
            other_cost_type: OtherCostType::Percentage,
            ..Default::default()
        };
        let b = calculate(&[], &pct);
        assert_eq!(b.other_costs_amount, 0.0);
        assert!(close(b.total_cost, 5.0));
    }

    #[test]
    fn test_landed_cost_is_proportional_and_sums_to_total() {
        let items = sample_items();
        let inputs = CostInputs {
            shipping_cost: 3.0,
            import_tax: 2.0,
            other_costs: 10.0,
            other_cost_type: OtherCostType::Fixed,
        };
        let b = calculate(&items, &inputs);
        let landed = landed_unit_costs(&items, &b);
        // total 40 over base 25 -> factor 1.6
        assert!(close(landed[0], 16.0));
        assert!(close(landed[1], 8.0));
        let spread: f64 = items.iter().zip(&landed).map(|(i, c)| i.quantity as f64 * c).sum();
        assert!(close(spread, b.total_cost));
    }

    #[test]
    fn test_zero_value_lines_split_extra_evenly() {
        let items = vec![
            LineItem { quantity: 3, unit_price: 0.0 },
            LineItem { quantity: 1, unit_price: 0.0 },
        ];
        let b = calculate(&items, &CostInputs { shipping_cost: 8.0, ..Default::default() });
        let landed = landed_unit_costs(&items, &b);
        assert!(close(landed[0], 2.0));
        assert!(close(landed[1], 2.0));
    }

    #[test]
    fn test_allocate_uses_listed_price_or_markup() {
        let lines = vec![
            PricedLine {
                product_id: 1,
                product_name: "Widget".into(),
                item: LineItem { quantity: 2, unit_price: 10.0 },
                listed_selling_price: None,
            },
            PricedLine {
                product_id: 2,
                product_name: "Gadget".into(),
                item: LineItem { quantity: 1, unit_price: 5.0 },
                listed_selling_price: Some(10.0),
            },
        ];
        let b = calculate(
            &lines.iter().map(|l| l.item).collect::<Vec<_>>(),
            &CostInputs { shipping_cost: 3.0, import_tax: 2.0, other_costs: 10.0, other_cost_type: OtherCostType::Fixed },
        );
        let priced = allocate(&lines, &b, 25.0);

        assert!(close(priced[0].landed_unit_cost, 16.0));
        assert!(close(priced[0].selling_price, 20.0));
        assert!(close(priced[0].profit, 4.0));
        assert!(close(priced[0].margin, 20.0));

        assert!(close(priced[1].selling_price, 10.0));
        assert!(close(priced[1].profit, 2.0));
        assert!(close(priced[1].margin(), 20.0));
    }

    #[test]
    fn test_other_cost_type_parse() {
        assert_eq!("percentage".parse::<OtherCostType>(), Ok(OtherCostType::Percentage));
        assert!("percent".parse::<OtherCostType>().is_err());
    }
}
